//! Hostname and URL scheme the registry is served under.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValueKind, emit, field,
};

use super::FieldGroup;

const SERVER_HOSTNAME: FieldSpec = FieldSpec::new("SERVER_HOSTNAME", ValueKind::Text)
    .constrained(&[Constraint::Required, Constraint::Hostname]);
const PREFERRED_URL_SCHEME: FieldSpec =
    FieldSpec::new("PREFERRED_URL_SCHEME", ValueKind::Text)
        .default_to(FieldDefault::Text("http"))
        .constrained(&[Constraint::OneOf(&["http", "https"])]);
const EXTERNAL_TLS_TERMINATION: FieldSpec =
    FieldSpec::new("EXTERNAL_TLS_TERMINATION", ValueKind::Bool).always_emit();

static FIELDS: &[FieldSpec] = &[SERVER_HOSTNAME, PREFERRED_URL_SCHEME, EXTERNAL_TLS_TERMINATION];

#[derive(Debug, Clone, PartialEq)]
pub struct HostSettings {
    pub server_hostname: String,
    pub preferred_url_scheme: String,
    pub external_tls_termination: bool,
}

impl FieldGroup for HostSettings {
    const NAME: &'static str = "HostSettings";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            server_hostname: field(doc, &SERVER_HOSTNAME)?,
            preferred_url_scheme: field(doc, &PREFERRED_URL_SCHEME)?,
            external_tls_termination: field(doc, &EXTERNAL_TLS_TERMINATION)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &SERVER_HOSTNAME, &self.server_hostname);
        emit(&mut out, &PREFERRED_URL_SCHEME, &self.preferred_url_scheme);
        emit(&mut out, &EXTERNAL_TLS_TERMINATION, &self.external_tls_termination);
        out
    }
}

wire_serde!(HostSettings);
