//! Declarative field constraints and the violations they produce.
//!
//! Constraints run over a field group's wire form, after construction, and
//! accumulate every violation instead of stopping at the first one.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::coerce::FieldSpec;
use crate::value::{Mapping, Value};

/// Duration shorthand such as `30m` or `2w`.
pub const TIME_PATTERN: &str = "^[0-9]+(w|m|d|h|s)$";

/// Bare host name with an optional `:port`, e.g. `quay.io:443`.
pub const HOSTNAME_PATTERN: &str = "^[a-zA-Z0-9.-]+(:[0-9]+)?$";

static TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TIME_PATTERN).expect("time pattern is a valid regex"));

static HOSTNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HOSTNAME_PATTERN).expect("hostname pattern is a valid regex"));

/// A declarative check attached to a field descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Must be present and non-empty.
    Required,
    /// Text (or every element of a text list) must be a duration like `30m`.
    TimePattern,
    /// Text must be a host name with an optional port, not a URL.
    Hostname,
    /// Text must be one of the listed values.
    OneOf(&'static [&'static str]),
    /// Integer bounds, both inclusive.
    Range { min: Option<i64>, max: Option<i64> },
    /// Text must parse as an absolute URL.
    Url,
}

/// One violated constraint, tagged with the group and keys involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field_group: String,
    pub tags: Vec<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(field_group: &str, tags: &[&str], message: impl Into<String>) -> Self {
        Self {
            field_group: field_group.to_string(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field_group, self.message)
    }
}

/// Ordered list of violations. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Run every constraint of every descriptor against a group's wire form.
pub fn check_fields(group: &str, specs: &[FieldSpec], wire: &Mapping) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for spec in specs {
        let value = wire.get(spec.key).filter(|v| !matches!(v, Value::Null));
        for constraint in spec.constraints {
            if let Some(message) = check(spec.key, constraint, value) {
                errors.push(ValidationError::new(group, &[spec.key], message));
            }
        }
    }
    errors
}

/// Check a single constraint. Absent values only fail `Required`.
pub fn check(key: &str, constraint: &Constraint, value: Option<&Value>) -> Option<String> {
    let value = match (constraint, value) {
        (Constraint::Required, None) => return Some(format!("{key} is required")),
        (Constraint::Required, Some(v)) => {
            let empty = matches!(v, Value::Text(_) | Value::List(_) | Value::Map(_)) && v.is_zero();
            return empty.then(|| format!("{key} is required"));
        }
        (_, None) => return None,
        (_, Some(v)) => v,
    };

    match constraint {
        Constraint::Required => None,
        Constraint::TimePattern => {
            let texts: Vec<&str> = match value {
                Value::Text(s) => vec![s.as_str()],
                Value::List(items) => items.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            texts
                .into_iter()
                .find(|text| !is_duration(text))
                .map(|_| format!("{key} must match pattern {TIME_PATTERN}"))
        }
        Constraint::Hostname => match value.as_str() {
            Some(text) if is_hostname(text) => None,
            _ => Some(format!("{key} must be of type Hostname")),
        },
        Constraint::OneOf(allowed) => match value.as_str() {
            Some(text) if allowed.contains(&text) => None,
            _ => Some(format!("{key} must be one of {}", allowed.join(", "))),
        },
        Constraint::Range { min, max } => {
            let n = value.as_int()?;
            if let Some(min) = min.filter(|min| n < *min) {
                return Some(format!("{key} must be at least {min}"));
            }
            max.filter(|max| n > *max)
                .map(|max| format!("{key} must be at most {max}"))
        }
        Constraint::Url => match value.as_str().map(Url::parse) {
            Some(Ok(_)) => None,
            _ => Some(format!("{key} must be a valid URL")),
        },
    }
}

/// Whether `text` is a duration such as `30m` or `2w`.
pub fn is_duration(text: &str) -> bool {
    TIME_REGEX.is_match(text)
}

/// Whether `text` is a host name with an optional port. Surrounding spaces are ignored.
pub fn is_hostname(text: &str) -> bool {
    HOSTNAME_REGEX.is_match(text.trim_matches(' '))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::FieldDefault;
    use crate::value::ValueKind;
    use serde_json::json;

    static SPECS: &[FieldSpec] = &[
        FieldSpec::new("SERVER_HOSTNAME", ValueKind::Text).constrained(&[Constraint::Required]),
        FieldSpec::new("PREFERRED_URL_SCHEME", ValueKind::Text)
            .default_to(FieldDefault::Text("http"))
            .constrained(&[Constraint::OneOf(&["http", "https"])]),
        FieldSpec::new("FRESH_LOGIN_TIMEOUT", ValueKind::Text)
            .constrained(&[Constraint::TimePattern]),
        FieldSpec::new("REPO_MIRROR_INTERVAL", ValueKind::Int)
            .constrained(&[Constraint::Range { min: Some(0), max: None }]),
        FieldSpec::new("JWT_VERIFY_ENDPOINT", ValueKind::Text).constrained(&[Constraint::Url]),
    ];

    fn wire(json: serde_json::Value) -> Mapping {
        match Value::from_json(json) {
            Value::Map(map) => map,
            _ => panic!("not a mapping"),
        }
    }

    #[test]
    fn test_valid_wire_form_has_no_errors() {
        let errors = check_fields(
            "HostSettings",
            SPECS,
            &wire(json!({
                "SERVER_HOSTNAME": "quay.example.com",
                "PREFERRED_URL_SCHEME": "https",
                "FRESH_LOGIN_TIMEOUT": "10m",
                "REPO_MIRROR_INTERVAL": 30,
                "JWT_VERIFY_ENDPOINT": "https://auth.example.com/verify"
            })),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_absent_optional_fields_pass() {
        let errors = check_fields(
            "HostSettings",
            SPECS,
            &wire(json!({"SERVER_HOSTNAME": "quay.example.com"})),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_every_violation_is_collected() {
        let errors = check_fields(
            "HostSettings",
            SPECS,
            &wire(json!({
                "SERVER_HOSTNAME": "",
                "PREFERRED_URL_SCHEME": "ftp",
                "FRESH_LOGIN_TIMEOUT": "10 minutes",
                "REPO_MIRROR_INTERVAL": -1,
                "JWT_VERIFY_ENDPOINT": "not a url"
            })),
        );
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "SERVER_HOSTNAME is required",
                "PREFERRED_URL_SCHEME must be one of http, https",
                "FRESH_LOGIN_TIMEOUT must match pattern ^[0-9]+(w|m|d|h|s)$",
                "REPO_MIRROR_INTERVAL must be at least 0",
                "JWT_VERIFY_ENDPOINT must be a valid URL",
            ]
        );
        assert_eq!(errors.iter().next().unwrap().tags, vec!["SERVER_HOSTNAME"]);
    }

    #[test]
    fn test_pattern_applies_to_each_list_element() {
        let value = Value::from_json(json!(["2w", "4 weeks"]));
        let message = check("TAG_EXPIRATION_OPTIONS", &Constraint::TimePattern, Some(&value));
        assert!(message.is_some());
    }

    #[test]
    fn test_hostname_accepts_host_and_port() {
        for host in ["quay.io", "quay.io:443", "localhost", "my-host.example.com", " quay.io "] {
            assert!(is_hostname(host), "{host}");
        }
    }

    #[test]
    fn test_hostname_rejects_urls() {
        for host in ["http://quay.io", "http://x/ y", "quay.io/path", "quay.io:port", ""] {
            assert!(!is_hostname(host), "{host}");
        }
        let value = Value::from("http://x/ y");
        assert_eq!(
            check("SERVER_HOSTNAME", &Constraint::Hostname, Some(&value)),
            Some("SERVER_HOSTNAME must be of type Hostname".to_string())
        );
    }

    #[test]
    fn test_display_tags_group() {
        let err = ValidationError::new("RepoMirror", &["REPO_MIRROR_INTERVAL"], "bad");
        assert_eq!(err.to_string(), "[RepoMirror] bad");
    }
}
