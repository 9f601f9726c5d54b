//! Outgoing mail server used for notifications and account recovery.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationErrors, ValueKind,
    check_fields, emit, field,
};

use super::{FieldGroup, require_text};

const FEATURE_MAILING: FieldSpec = FieldSpec::new("FEATURE_MAILING", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();
const MAIL_SERVER: FieldSpec = FieldSpec::new("MAIL_SERVER", ValueKind::Text);
const MAIL_PORT: FieldSpec = FieldSpec::new("MAIL_PORT", ValueKind::Int)
    .default_to(FieldDefault::Int(587))
    .constrained(&[Constraint::Range { min: Some(1), max: Some(65535) }])
    .always_emit();
const MAIL_USE_TLS: FieldSpec = FieldSpec::new("MAIL_USE_TLS", ValueKind::Bool)
    .default_to(FieldDefault::Bool(true))
    .always_emit();
const MAIL_USE_AUTH: FieldSpec = FieldSpec::new("MAIL_USE_AUTH", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();
const MAIL_USERNAME: FieldSpec = FieldSpec::new("MAIL_USERNAME", ValueKind::Text);
const MAIL_PASSWORD: FieldSpec = FieldSpec::new("MAIL_PASSWORD", ValueKind::Text);
const MAIL_DEFAULT_SENDER: FieldSpec = FieldSpec::new("MAIL_DEFAULT_SENDER", ValueKind::Text)
    .default_to(FieldDefault::Text("admin@example.com"))
    .always_emit();

static FIELDS: &[FieldSpec] = &[
    FEATURE_MAILING,
    MAIL_SERVER,
    MAIL_PORT,
    MAIL_USE_TLS,
    MAIL_USE_AUTH,
    MAIL_USERNAME,
    MAIL_PASSWORD,
    MAIL_DEFAULT_SENDER,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub feature_mailing: bool,
    pub mail_server: String,
    pub mail_port: i64,
    pub mail_use_tls: bool,
    pub mail_use_auth: bool,
    pub mail_username: String,
    pub mail_password: String,
    pub mail_default_sender: String,
}

impl FieldGroup for Email {
    const NAME: &'static str = "Email";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            feature_mailing: field(doc, &FEATURE_MAILING)?,
            mail_server: field(doc, &MAIL_SERVER)?,
            mail_port: field(doc, &MAIL_PORT)?,
            mail_use_tls: field(doc, &MAIL_USE_TLS)?,
            mail_use_auth: field(doc, &MAIL_USE_AUTH)?,
            mail_username: field(doc, &MAIL_USERNAME)?,
            mail_password: field(doc, &MAIL_PASSWORD)?,
            mail_default_sender: field(doc, &MAIL_DEFAULT_SENDER)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &FEATURE_MAILING, &self.feature_mailing);
        emit(&mut out, &MAIL_SERVER, &self.mail_server);
        emit(&mut out, &MAIL_PORT, &self.mail_port);
        emit(&mut out, &MAIL_USE_TLS, &self.mail_use_tls);
        emit(&mut out, &MAIL_USE_AUTH, &self.mail_use_auth);
        emit(&mut out, &MAIL_USERNAME, &self.mail_username);
        emit(&mut out, &MAIL_PASSWORD, &self.mail_password);
        emit(&mut out, &MAIL_DEFAULT_SENDER, &self.mail_default_sender);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if !self.feature_mailing {
            return errors;
        }

        require_text(&mut errors, Self::NAME, MAIL_SERVER.key, &self.mail_server);
        errors.extend(check_fields(Self::NAME, FIELDS, &self.to_document()));
        if self.mail_use_auth {
            require_text(&mut errors, Self::NAME, MAIL_USERNAME.key, &self.mail_username);
            require_text(&mut errors, Self::NAME, MAIL_PASSWORD.key, &self.mail_password);
        }
        errors
    }
}

wire_serde!(Email);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{into_document, parse_yaml};
    use quaycfg_core::ConstructError;

    fn doc(yaml: &str) -> Mapping {
        into_document(parse_yaml(yaml).unwrap()).unwrap()
    }

    fn messages(yaml: &str) -> Vec<String> {
        let email = Email::from_document(&doc(yaml)).unwrap();
        email.validate().into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_defaults() {
        let email = Email::from_document(&Mapping::new()).unwrap();
        assert!(!email.feature_mailing);
        assert_eq!(email.mail_port, 587);
        assert!(email.mail_use_tls);
        assert!(!email.mail_use_auth);
        assert_eq!(email.mail_default_sender, "admin@example.com");
    }

    #[test]
    fn test_disabled_mailing_skips_checks() {
        assert!(messages("MAIL_PORT: 0\nMAIL_USE_AUTH: true\n").is_empty());
    }

    #[test]
    fn test_enabled_mailing_requires_server() {
        assert_eq!(messages("FEATURE_MAILING: true\n"), vec!["MAIL_SERVER is required"]);
        let ok = "FEATURE_MAILING: true\nMAIL_SERVER: smtp.example.com\n";
        assert!(messages(ok).is_empty());
    }

    #[test]
    fn test_port_must_be_in_range() {
        let yaml = "FEATURE_MAILING: true\nMAIL_SERVER: smtp.example.com\nMAIL_PORT: 0\n";
        assert_eq!(messages(yaml), vec!["MAIL_PORT must be at least 1"]);
    }

    #[test]
    fn test_auth_requires_credentials() {
        let yaml = r#"
FEATURE_MAILING: true
MAIL_SERVER: smtp.example.com
MAIL_USE_AUTH: true
MAIL_USERNAME: quay
"#;
        assert_eq!(messages(yaml), vec!["MAIL_PASSWORD is required"]);
    }

    #[test]
    fn test_text_flag_is_a_type_mismatch() {
        let err = Email::from_document(&doc("MAIL_USE_TLS: \"yes\"\n")).unwrap_err();
        assert_eq!(err, ConstructError::type_mismatch("MAIL_USE_TLS", ValueKind::Bool));
    }
}
