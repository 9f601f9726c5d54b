//! Registry configuration: loading, field groups, and validation.
//!
//! This crate handles:
//! - Reading YAML or JSON documents into a canonical, text-keyed tree
//! - Building typed field groups, including discovered OIDC providers
//! - Validating groups against their declared constraints
//! - Validating the raw document against a JSON Schema

pub mod config;
pub mod document;
pub mod error;
pub mod fieldgroups;
pub mod schema;

pub use config::{Config, FieldGroupConfig, GROUP_NAMES};
pub use document::{load_document, read_canonical};
pub use error::{ConfigError, ConfigResult};
pub use fieldgroups::FieldGroup;
pub use schema::{SchemaValidator, SchemaViolation, ValidationResponse, validate_files};
