//! Delegating user authentication to an external JWT service.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationErrors, ValueKind,
    check_fields, emit, field,
};

use super::access_settings::AUTHENTICATION_TYPES;
use super::{FieldGroup, require_text};

const AUTHENTICATION_TYPE: FieldSpec = FieldSpec::new("AUTHENTICATION_TYPE", ValueKind::Text)
    .default_to(FieldDefault::Text("Database"))
    .constrained(&[Constraint::OneOf(AUTHENTICATION_TYPES)]);
const FEATURE_MAILING: FieldSpec = FieldSpec::new("FEATURE_MAILING", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();
/// Compared against the token's `iss` claim, so any string is accepted.
const JWT_AUTH_ISSUER: FieldSpec = FieldSpec::new("JWT_AUTH_ISSUER", ValueKind::Text);
const JWT_GETUSER_ENDPOINT: FieldSpec =
    FieldSpec::new("JWT_GETUSER_ENDPOINT", ValueKind::Text).constrained(&[Constraint::Url]);
const JWT_QUERY_ENDPOINT: FieldSpec =
    FieldSpec::new("JWT_QUERY_ENDPOINT", ValueKind::Text).constrained(&[Constraint::Url]);
const JWT_VERIFY_ENDPOINT: FieldSpec =
    FieldSpec::new("JWT_VERIFY_ENDPOINT", ValueKind::Text).constrained(&[Constraint::Url]);

static FIELDS: &[FieldSpec] = &[
    AUTHENTICATION_TYPE,
    FEATURE_MAILING,
    JWT_AUTH_ISSUER,
    JWT_GETUSER_ENDPOINT,
    JWT_QUERY_ENDPOINT,
    JWT_VERIFY_ENDPOINT,
];

#[derive(Debug, Clone, PartialEq)]
pub struct JwtAuthentication {
    pub authentication_type: String,
    pub feature_mailing: bool,
    pub jwt_auth_issuer: String,
    pub jwt_getuser_endpoint: String,
    pub jwt_query_endpoint: String,
    pub jwt_verify_endpoint: String,
}

impl FieldGroup for JwtAuthentication {
    const NAME: &'static str = "JWTAuthentication";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            authentication_type: field(doc, &AUTHENTICATION_TYPE)?,
            feature_mailing: field(doc, &FEATURE_MAILING)?,
            jwt_auth_issuer: field(doc, &JWT_AUTH_ISSUER)?,
            jwt_getuser_endpoint: field(doc, &JWT_GETUSER_ENDPOINT)?,
            jwt_query_endpoint: field(doc, &JWT_QUERY_ENDPOINT)?,
            jwt_verify_endpoint: field(doc, &JWT_VERIFY_ENDPOINT)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &AUTHENTICATION_TYPE, &self.authentication_type);
        emit(&mut out, &FEATURE_MAILING, &self.feature_mailing);
        emit(&mut out, &JWT_AUTH_ISSUER, &self.jwt_auth_issuer);
        emit(&mut out, &JWT_GETUSER_ENDPOINT, &self.jwt_getuser_endpoint);
        emit(&mut out, &JWT_QUERY_ENDPOINT, &self.jwt_query_endpoint);
        emit(&mut out, &JWT_VERIFY_ENDPOINT, &self.jwt_verify_endpoint);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        if self.authentication_type != "JWT" {
            return errors;
        }

        require_text(&mut errors, Self::NAME, JWT_VERIFY_ENDPOINT.key, &self.jwt_verify_endpoint);
        require_text(&mut errors, Self::NAME, JWT_AUTH_ISSUER.key, &self.jwt_auth_issuer);
        if self.feature_mailing {
            require_text(
                &mut errors,
                Self::NAME,
                JWT_GETUSER_ENDPOINT.key,
                &self.jwt_getuser_endpoint,
            );
        }
        errors
    }
}

wire_serde!(JwtAuthentication);
