//! Repository mirroring worker settings.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationError,
    ValidationErrors, ValueKind, check_fields, emit, field, is_hostname,
};

use super::FieldGroup;

const FEATURE_REPO_MIRROR: FieldSpec = FieldSpec::new("FEATURE_REPO_MIRROR", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();
const REPO_MIRROR_INTERVAL: FieldSpec = FieldSpec::new("REPO_MIRROR_INTERVAL", ValueKind::Int)
    .default_to(FieldDefault::Int(30))
    .constrained(&[Constraint::Range { min: Some(0), max: None }])
    .always_emit();
const REPO_MIRROR_SERVER_HOSTNAME: FieldSpec =
    FieldSpec::new("REPO_MIRROR_SERVER_HOSTNAME", ValueKind::Text);
const REPO_MIRROR_TLS_VERIFY: FieldSpec =
    FieldSpec::new("REPO_MIRROR_TLS_VERIFY", ValueKind::Bool)
            .default_to(FieldDefault::Bool(true))
        .always_emit();
const REPO_MIRROR_ROLLBACK: FieldSpec = FieldSpec::new("REPO_MIRROR_ROLLBACK", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();

static FIELDS: &[FieldSpec] = &[
    FEATURE_REPO_MIRROR,
    REPO_MIRROR_INTERVAL,
    REPO_MIRROR_SERVER_HOSTNAME,
    REPO_MIRROR_TLS_VERIFY,
    REPO_MIRROR_ROLLBACK,
];

#[derive(Debug, Clone, PartialEq)]
pub struct RepoMirror {
    pub feature_repo_mirror: bool,
    /// Seconds between mirror runs.
    pub repo_mirror_interval: i64,
    pub repo_mirror_server_hostname: String,
    pub repo_mirror_tls_verify: bool,
    pub repo_mirror_rollback: bool,
}

impl FieldGroup for RepoMirror {
    const NAME: &'static str = "RepoMirror";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            feature_repo_mirror: field(doc, &FEATURE_REPO_MIRROR)?,
            repo_mirror_interval: field(doc, &REPO_MIRROR_INTERVAL)?,
            repo_mirror_server_hostname: field(doc, &REPO_MIRROR_SERVER_HOSTNAME)?,
            repo_mirror_tls_verify: field(doc, &REPO_MIRROR_TLS_VERIFY)?,
            repo_mirror_rollback: field(doc, &REPO_MIRROR_ROLLBACK)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &FEATURE_REPO_MIRROR, &self.feature_repo_mirror);
        emit(&mut out, &REPO_MIRROR_INTERVAL, &self.repo_mirror_interval);
        emit(&mut out, &REPO_MIRROR_SERVER_HOSTNAME, &self.repo_mirror_server_hostname);
        emit(&mut out, &REPO_MIRROR_TLS_VERIFY, &self.repo_mirror_tls_verify);
        emit(&mut out, &REPO_MIRROR_ROLLBACK, &self.repo_mirror_rollback);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        let hostname = &self.repo_mirror_server_hostname;
        // The mirror hostname only matters while mirroring is on.
        if self.feature_repo_mirror && !hostname.is_empty() && !is_hostname(hostname) {
            errors.push(ValidationError::new(
                Self::NAME,
                &[REPO_MIRROR_SERVER_HOSTNAME.key],
                "REPO_MIRROR_SERVER_HOSTNAME must be of type Hostname",
            ));
        }
        errors
    }
}

wire_serde!(RepoMirror);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{into_document, parse_yaml};
    use quaycfg_core::ConstructError;

    fn doc(yaml: &str) -> Mapping {
        into_document(parse_yaml(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let mirror = RepoMirror::from_document(&Mapping::new()).unwrap();
        assert_eq!(
            mirror,
            RepoMirror {
                feature_repo_mirror: false,
                repo_mirror_interval: 30,
                repo_mirror_server_hostname: String::new(),
                repo_mirror_tls_verify: true,
                repo_mirror_rollback: false,
            }
        );
    }

    #[test]
    fn test_text_interval_is_a_type_mismatch() {
        let err = RepoMirror::from_document(&doc("REPO_MIRROR_INTERVAL: \"30\"\n")).unwrap_err();
        assert_eq!(err, ConstructError::type_mismatch("REPO_MIRROR_INTERVAL", ValueKind::Int));
        assert_eq!(err.to_string(), "REPO_MIRROR_INTERVAL must be of type integer");
    }

    #[test]
    fn test_negative_interval_is_reported() {
        let mirror = RepoMirror::from_document(&doc("REPO_MIRROR_INTERVAL: -5\n")).unwrap();
        let errors = mirror.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next().unwrap().message,
            "REPO_MIRROR_INTERVAL must be at least 0"
        );
    }

    #[test]
    fn test_url_mirror_hostname_is_rejected_when_enabled() {
        let yaml = "FEATURE_REPO_MIRROR: true\nREPO_MIRROR_SERVER_HOSTNAME: \"http://x/ y\"\n";
        let errors = RepoMirror::from_document(&doc(yaml)).unwrap().validate();
        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().unwrap();
        assert_eq!(error.tags, vec!["REPO_MIRROR_SERVER_HOSTNAME"]);
        assert_eq!(error.message, "REPO_MIRROR_SERVER_HOSTNAME must be of type Hostname");
    }

    #[test]
    fn test_mirror_hostname_is_ignored_when_disabled() {
        let yaml = "REPO_MIRROR_SERVER_HOSTNAME: \"http://x/ y\"\n";
        let mirror = RepoMirror::from_document(&doc(yaml)).unwrap();
        assert!(mirror.validate().is_empty());
        let enabled = doc("FEATURE_REPO_MIRROR: true\nREPO_MIRROR_SERVER_HOSTNAME: mirror:8080\n");
        assert!(RepoMirror::from_document(&enabled).unwrap().validate().is_empty());
    }

    #[test]
    fn test_disabled_tls_verify_is_kept() {
        let mirror = RepoMirror::from_document(&doc("REPO_MIRROR_TLS_VERIFY: false\n")).unwrap();
        let wire = mirror.to_document();
        assert_eq!(wire["REPO_MIRROR_TLS_VERIFY"], quaycfg_core::Value::Bool(false));
        assert_eq!(RepoMirror::from_document(&wire).unwrap(), mirror);
    }
}
