//! OpenID Connect login providers.
//!
//! Providers have no fixed key. Any top-level `<PREFIX>_LOGIN_CONFIG` mapping
//! declares one, except the GitHub and Google blocks, which belong to their
//! own fixed groups. Discovery is a pure predicate and extractor over the
//! document's keys; the result is ordered by key text.

use derive_more::Display;
use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationError,
    ValidationErrors, Value, ValueKind, check_fields, emit, field,
};

use super::{FieldGroup, unclaimed};

/// Suffix that marks a provider block.
pub const LOGIN_CONFIG_SUFFIX: &str = "_LOGIN_CONFIG";

/// Login blocks handled by other groups.
pub const RESERVED_LOGIN_CONFIGS: &[&str] = &["GOOGLE_LOGIN_CONFIG", "GITHUB_LOGIN_CONFIG"];

const SERVER_HOSTNAME: FieldSpec = FieldSpec::new("SERVER_HOSTNAME", ValueKind::Text);
const PREFERRED_URL_SCHEME: FieldSpec = FieldSpec::new("PREFERRED_URL_SCHEME", ValueKind::Text)
    .default_to(FieldDefault::Text("http"))
    .constrained(&[Constraint::OneOf(&["http", "https"])]);

static FIELDS: &[FieldSpec] = &[SERVER_HOSTNAME, PREFERRED_URL_SCHEME];

const OIDC_SERVER: FieldSpec = FieldSpec::new("OIDC_SERVER", ValueKind::Text)
    .constrained(&[Constraint::Required, Constraint::Url]);
const CLIENT_ID: FieldSpec =
    FieldSpec::new("CLIENT_ID", ValueKind::Text).constrained(&[Constraint::Required]);
const CLIENT_SECRET: FieldSpec =
    FieldSpec::new("CLIENT_SECRET", ValueKind::Text).constrained(&[Constraint::Required]);
const SERVICE_NAME: FieldSpec =
    FieldSpec::new("SERVICE_NAME", ValueKind::Text).constrained(&[Constraint::Required]);
const SERVICE_ICON: FieldSpec = FieldSpec::new("SERVICE_ICON", ValueKind::Text);
const VERIFIED_EMAIL_CLAIM_NAME: FieldSpec =
    FieldSpec::new("VERIFIED_EMAIL_CLAIM_NAME", ValueKind::Text);
const PREFERRED_USERNAME_CLAIM_NAME: FieldSpec =
    FieldSpec::new("PREFERRED_USERNAME_CLAIM_NAME", ValueKind::Text);
const PREFERRED_GROUP_CLAIM_NAME: FieldSpec =
    FieldSpec::new("PREFERRED_GROUP_CLAIM_NAME", ValueKind::Text);
const LOGIN_SCOPES: FieldSpec = FieldSpec::new("LOGIN_SCOPES", ValueKind::TextList);
const DEBUGGING: FieldSpec = FieldSpec::new("DEBUGGING", ValueKind::Bool);

static PROVIDER_FIELDS: &[FieldSpec] = &[
    OIDC_SERVER,
    CLIENT_ID,
    CLIENT_SECRET,
    SERVICE_NAME,
    SERVICE_ICON,
    VERIFIED_EMAIL_CLAIM_NAME,
    PREFERRED_USERNAME_CLAIM_NAME,
    PREFERRED_GROUP_CLAIM_NAME,
    LOGIN_SCOPES,
    DEBUGGING,
];

/// Short provider identifier used in callback URLs, e.g. `auth0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct ServiceId(String);

impl ServiceId {
    /// Lowercase of the prefix text before its first underscore.
    pub fn from_prefix(prefix: &str) -> Self {
        let head = prefix.split('_').next().unwrap_or(prefix);
        Self(head.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One discovered OIDC login provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OidcProvider {
    /// Key text before `_LOGIN_CONFIG`, e.g. `AUTH0`.
    pub prefix: String,
    pub oidc_server: String,
    pub client_id: String,
    pub client_secret: String,
    pub service_name: String,
    pub service_icon: String,
    pub verified_email_claim_name: String,
    pub preferred_username_claim_name: String,
    pub preferred_group_claim_name: String,
    pub login_scopes: Vec<String>,
    pub debugging: bool,
    pub extra: Mapping,
}

impl OidcProvider {
    fn from_mapping(prefix: &str, doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            prefix: prefix.to_string(),
            oidc_server: field(doc, &OIDC_SERVER)?,
            client_id: field(doc, &CLIENT_ID)?,
            client_secret: field(doc, &CLIENT_SECRET)?,
            service_name: field(doc, &SERVICE_NAME)?,
            service_icon: field(doc, &SERVICE_ICON)?,
            verified_email_claim_name: field(doc, &VERIFIED_EMAIL_CLAIM_NAME)?,
            preferred_username_claim_name: field(doc, &PREFERRED_USERNAME_CLAIM_NAME)?,
            preferred_group_claim_name: field(doc, &PREFERRED_GROUP_CLAIM_NAME)?,
            login_scopes: field(doc, &LOGIN_SCOPES)?,
            debugging: field(doc, &DEBUGGING)?,
            extra: unclaimed(doc, PROVIDER_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &OIDC_SERVER, &self.oidc_server);
        emit(&mut out, &CLIENT_ID, &self.client_id);
        emit(&mut out, &CLIENT_SECRET, &self.client_secret);
        emit(&mut out, &SERVICE_NAME, &self.service_name);
        emit(&mut out, &SERVICE_ICON, &self.service_icon);
        emit(&mut out, &VERIFIED_EMAIL_CLAIM_NAME, &self.verified_email_claim_name);
        emit(&mut out, &PREFERRED_USERNAME_CLAIM_NAME, &self.preferred_username_claim_name);
        emit(&mut out, &PREFERRED_GROUP_CLAIM_NAME, &self.preferred_group_claim_name);
        emit(&mut out, &LOGIN_SCOPES, &self.login_scopes);
        emit(&mut out, &DEBUGGING, &self.debugging);
        out
    }

    /// Document key this provider was read from.
    pub fn config_key(&self) -> String {
        format!("{}{LOGIN_CONFIG_SUFFIX}", self.prefix)
    }

    pub fn service_id(&self) -> ServiceId {
        ServiceId::from_prefix(&self.prefix)
    }
}

/// Prefix of a provider key, or `None` if the key does not declare a provider.
pub fn provider_prefix(key: &str) -> Option<&str> {
    if RESERVED_LOGIN_CONFIGS.contains(&key) {
        return None;
    }
    key.strip_suffix(LOGIN_CONFIG_SUFFIX).filter(|prefix| !prefix.is_empty())
}

/// Build one provider per `<PREFIX>_LOGIN_CONFIG` mapping in the document.
///
/// Keys whose value is not a mapping are skipped. A sub-field of the wrong
/// type aborts discovery with an error keyed under the provider's key.
pub fn discover_providers(doc: &Mapping) -> ConstructResult<Vec<OidcProvider>> {
    let mut providers = Vec::new();
    for (key, value) in doc {
        let (Some(prefix), Value::Map(block)) = (provider_prefix(key), value) else {
            continue;
        };
        let provider = OidcProvider::from_mapping(prefix, block).map_err(|err| err.within(key))?;
        tracing::debug!(prefix, "discovered OIDC provider");
        providers.push(provider);
    }
    Ok(providers)
}

/// The `OIDC` field group.
#[derive(Debug, Clone, PartialEq)]
pub struct OidcFieldGroup {
    pub server_hostname: String,
    pub preferred_url_scheme: String,
    pub providers: Vec<OidcProvider>,
}

impl OidcFieldGroup {
    /// Callback URL registered with `provider`.
    ///
    /// Empty when no hostname is configured. An empty scheme means `https`.
    pub fn redirect_url(&self, provider: &OidcProvider) -> String {
        redirect_url(&self.server_hostname, &self.preferred_url_scheme, &provider.prefix)
    }
}

pub fn redirect_url(hostname: &str, scheme: &str, prefix: &str) -> String {
    if hostname.is_empty() {
        return String::new();
    }
    let scheme = if scheme.is_empty() { "https" } else { scheme };
    format!("{scheme}://{hostname}/oauth2/{}/callback", ServiceId::from_prefix(prefix))
}

impl FieldGroup for OidcFieldGroup {
    const NAME: &'static str = "OIDC";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            server_hostname: field(doc, &SERVER_HOSTNAME)?,
            preferred_url_scheme: field(doc, &PREFERRED_URL_SCHEME)?,
            providers: discover_providers(doc)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &SERVER_HOSTNAME, &self.server_hostname);
        emit(&mut out, &PREFERRED_URL_SCHEME, &self.preferred_url_scheme);
        for provider in &self.providers {
            out.insert(provider.config_key(), Value::Map(provider.to_mapping()));
        }
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        for provider in &self.providers {
            let config_key = provider.config_key();
            for error in check_fields(Self::NAME, PROVIDER_FIELDS, &provider.to_mapping()) {
                let tags: Vec<String> =
                    error.tags.iter().map(|tag| format!("{config_key}.{tag}")).collect();
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                errors.push(ValidationError::new(
                    Self::NAME,
                    &tags,
                    format!("{config_key}.{}", error.message),
                ));
            }
        }
        errors
    }
}

wire_serde!(OidcFieldGroup);
