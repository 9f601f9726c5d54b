//! Configuration loading and construction errors.

use quaycfg_core::{ConstructError, KeyCoercionError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config document {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config document parse error: {0}")]
    DocumentParse(#[from] serde_yaml::Error),

    #[error("config document JSON parse error: {0}")]
    DocumentJson(serde_json::Error),

    #[error("config document must be a mapping at the top level, found {0}")]
    DocumentShape(String),

    #[error("failed to read schema {path}: {source}")]
    SchemaRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),

    #[error("schema compile error: {0}")]
    SchemaCompile(String),

    #[error(transparent)]
    KeyCoercion(#[from] KeyCoercionError),

    #[error("field group {group}: {source}")]
    FieldGroup {
        group: &'static str,
        source: ConstructError,
    },
}

impl ConfigError {
    pub fn field_group(group: &'static str, source: ConstructError) -> Self {
        ConfigError::FieldGroup { group, source }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
