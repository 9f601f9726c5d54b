//! Clair v4 security scanner integration.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationErrors, ValueKind,
    check_fields, emit, field,
};

use super::{FieldGroup, require_text};

const FEATURE_SECURITY_SCANNER: FieldSpec =
    FieldSpec::new("FEATURE_SECURITY_SCANNER", ValueKind::Bool)
        .default_to(FieldDefault::Bool(false))
        .always_emit();
const FEATURE_SECURITY_NOTIFICATIONS: FieldSpec =
    FieldSpec::new("FEATURE_SECURITY_NOTIFICATIONS", ValueKind::Bool)
        .default_to(FieldDefault::Bool(false))
        .always_emit();
const SECURITY_SCANNER_V4_ENDPOINT: FieldSpec =
    FieldSpec::new("SECURITY_SCANNER_V4_ENDPOINT", ValueKind::Text)
        .constrained(&[Constraint::Url]);
const SECURITY_SCANNER_V4_PSK: FieldSpec =
    FieldSpec::new("SECURITY_SCANNER_V4_PSK", ValueKind::Text);
const SECURITY_SCANNER_INDEXING_INTERVAL: FieldSpec =
    FieldSpec::new("SECURITY_SCANNER_INDEXING_INTERVAL", ValueKind::Int)
        .default_to(FieldDefault::Int(30))
        .constrained(&[Constraint::Range { min: Some(0), max: None }])
        .always_emit();

static FIELDS: &[FieldSpec] = &[
    FEATURE_SECURITY_SCANNER,
    FEATURE_SECURITY_NOTIFICATIONS,
    SECURITY_SCANNER_V4_ENDPOINT,
    SECURITY_SCANNER_V4_PSK,
    SECURITY_SCANNER_INDEXING_INTERVAL,
];

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityScanner {
    pub feature_security_scanner: bool,
    pub feature_security_notifications: bool,
    pub security_scanner_v4_endpoint: String,
    /// Base64 key used to sign requests to the scanner. Empty disables signing.
    pub security_scanner_v4_psk: String,
    /// Seconds between indexing runs.
    pub security_scanner_indexing_interval: i64,
}

impl FieldGroup for SecurityScanner {
    const NAME: &'static str = "SecurityScanner";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            feature_security_scanner: field(doc, &FEATURE_SECURITY_SCANNER)?,
            feature_security_notifications: field(doc, &FEATURE_SECURITY_NOTIFICATIONS)?,
            security_scanner_v4_endpoint: field(doc, &SECURITY_SCANNER_V4_ENDPOINT)?,
            security_scanner_v4_psk: field(doc, &SECURITY_SCANNER_V4_PSK)?,
            security_scanner_indexing_interval: field(doc, &SECURITY_SCANNER_INDEXING_INTERVAL)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &FEATURE_SECURITY_SCANNER, &self.feature_security_scanner);
        emit(&mut out, &FEATURE_SECURITY_NOTIFICATIONS, &self.feature_security_notifications);
        emit(&mut out, &SECURITY_SCANNER_V4_ENDPOINT, &self.security_scanner_v4_endpoint);
        emit(&mut out, &SECURITY_SCANNER_V4_PSK, &self.security_scanner_v4_psk);
        emit(
            &mut out,
            &SECURITY_SCANNER_INDEXING_INTERVAL,
            &self.security_scanner_indexing_interval,
        );
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if !self.feature_security_scanner {
            return errors;
        }

        let endpoint = &self.security_scanner_v4_endpoint;
        require_text(&mut errors, Self::NAME, SECURITY_SCANNER_V4_ENDPOINT.key, endpoint);
        errors.extend(check_fields(Self::NAME, FIELDS, &self.to_document()));
        errors
    }
}

wire_serde!(SecurityScanner);
