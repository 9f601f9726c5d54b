//! JSON Schema validation of the raw canonical document.
//!
//! Unlike field-group construction, schema validation never stops early:
//! every violated keyword is reported.

use jsonschema::{Draft, Validator};
use serde::Serialize;
use std::path::Path;

use crate::document::read_canonical;
use crate::error::{ConfigError, ConfigResult};

/// One failed schema keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// JSON pointer of the offending value. Empty means the document root.
    pub path: String,
    /// The keyword that failed, e.g. `required` or `pattern`.
    pub rule: String,
    pub message: String,
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResponse {
    pub is_valid: bool,
    pub errors: Vec<SchemaViolation>,
}

/// A compiled draft-07 schema.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    pub fn from_json(schema: &serde_json::Value) -> ConfigResult<Self> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft7)
            .build(schema)
            .map_err(|err| ConfigError::SchemaCompile(err.to_string()))?;
        Ok(Self { validator })
    }

    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::SchemaRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading schema");
        let schema: serde_json::Value = serde_json::from_str(&text)?;
        Self::from_json(&schema)
    }

    pub fn validate(&self, instance: &serde_json::Value) -> ValidationResponse {
        let mut errors: Vec<SchemaViolation> = self
            .validator
            .iter_errors(instance)
            .map(|err| {
                let schema_path = err.schema_path().to_string();
                let rule = schema_path.rsplit('/').next().unwrap_or_default().to_string();
                SchemaViolation {
                    path: err.instance_path().to_string(),
                    rule,
                    message: err.to_string(),
                }
            })
            .collect();
        errors.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));
        tracing::debug!(violations = errors.len(), "schema validation finished");
        ValidationResponse {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Read a document and a schema from disk and validate one against the other.
pub fn validate_files(config_path: &Path, schema_path: &Path) -> ConfigResult<ValidationResponse> {
    let document = read_canonical(config_path)?;
    let validator = SchemaValidator::from_path(schema_path)?;
    Ok(validator.validate(&document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_yaml;
    use serde_json::json;
    use std::io::Write;

    fn schema() -> serde_json::Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["SERVER_HOSTNAME", "PREFERRED_URL_SCHEME"],
            "properties": {
                "SERVER_HOSTNAME": {"type": "string"},
                "PREFERRED_URL_SCHEME": {"type": "string", "enum": ["http", "https"]},
                "REPO_MIRROR_INTERVAL": {"type": "integer", "minimum": 0},
                "FRESH_LOGIN_TIMEOUT": {"type": "string", "pattern": "^[0-9]+(w|m|d|h|s)$"}
            }
        })
    }

    #[test]
    fn test_conformant_document_is_valid() {
        let validator = SchemaValidator::from_json(&schema()).unwrap();
        let document = parse_yaml(
            "SERVER_HOSTNAME: quay.example.com\nPREFERRED_URL_SCHEME: https\n\
             REPO_MIRROR_INTERVAL: 30\n",
        )
        .unwrap();
        let response = validator.validate(&document);
        assert!(response.is_valid);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_missing_required_key_is_reported() {
        let validator = SchemaValidator::from_json(&schema()).unwrap();
        let response = validator.validate(&json!({"PREFERRED_URL_SCHEME": "https"}));
        assert!(!response.is_valid);
        let violation = response
            .errors
            .iter()
            .find(|v| v.message.contains("SERVER_HOSTNAME"))
            .unwrap();
        assert_eq!(violation.path, "");
        assert_eq!(violation.rule, "required");
    }

    #[test]
    fn test_every_violation_is_collected() {
        let validator = SchemaValidator::from_json(&schema()).unwrap();
        let response = validator.validate(&json!({
            "SERVER_HOSTNAME": 42,
            "PREFERRED_URL_SCHEME": "ftp",
            "REPO_MIRROR_INTERVAL": "30",
            "FRESH_LOGIN_TIMEOUT": "ten minutes"
        }));
        assert!(!response.is_valid);
        let paths: Vec<_> = response.errors.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/FRESH_LOGIN_TIMEOUT",
                "/PREFERRED_URL_SCHEME",
                "/REPO_MIRROR_INTERVAL",
                "/SERVER_HOSTNAME",
            ]
        );
        let rules: Vec<_> = response.errors.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["pattern", "enum", "type", "type"]);
    }

    #[test]
    fn test_malformed_schema_is_a_hard_error() {
        let err = SchemaValidator::from_json(&json!({"type": 12})).err().unwrap();
        assert!(matches!(err, ConfigError::SchemaCompile(_)));

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = SchemaValidator::from_path(file.path()).err().unwrap();
        assert!(matches!(err, ConfigError::SchemaParse(_)));
    }

    #[test]
    fn test_validate_files() {
        let mut config = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(config, "PREFERRED_URL_SCHEME: http").unwrap();
        let mut schema_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(schema_file, "{}", schema()).unwrap();

        let response = validate_files(config.path(), schema_file.path()).unwrap();
        assert!(!response.is_valid);
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.contains("SERVER_HOSTNAME"));

        let missing = validate_files(&config.path().with_extension("missing"), schema_file.path());
        assert!(matches!(missing, Err(ConfigError::DocumentRead { .. })));
    }
}
