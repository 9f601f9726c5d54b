//! Core building blocks for typed registry configuration.
//!
//! This crate contains:
//! - The dynamically typed document model ([`Value`], [`Mapping`])
//! - YAML to JSON canonicalization
//! - Field descriptors and the type coercion engine
//! - Declarative constraints and validation errors
//! - The `[name, arguments]` tuple codec

pub mod canonical;
pub mod coerce;
pub mod constraint;
pub mod error;
pub mod tuple;
pub mod value;

pub use canonical::canonicalize;
pub use coerce::{FieldDefault, FieldSpec, FieldValue, emit, emit_value, field, nested, nested_list};
pub use constraint::{
    Constraint, HOSTNAME_PATTERN, TIME_PATTERN, ValidationError, ValidationErrors, check_fields,
    is_duration, is_hostname,
};
pub use error::{ConstructError, ConstructResult, KeyCoercionError};
pub use tuple::{decode_tuple, encode_tuple};
pub use value::{Mapping, Value, ValueKind};
