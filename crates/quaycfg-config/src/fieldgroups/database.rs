//! Database connection URI and driver arguments.

use quaycfg_core::{
    Constraint, ConstructResult, FieldSpec, Mapping, ValidationError, ValidationErrors, Value,
    ValueKind, check_fields, emit, emit_value, field, nested,
};
use url::Url;

use super::{FieldGroup, nested_errors, unclaimed};

const SSL_PROTOCOL_VERSIONS: &[&str] = &["TLSv1", "TLSv1.1", "TLSv1.2", "TLSv1.3"];
const SSL_MODES: &[&str] = &["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

const DB_URI: FieldSpec = FieldSpec::new("DB_URI", ValueKind::Text)
    .constrained(&[Constraint::Required, Constraint::Url]);
const DB_CONNECTION_ARGS: FieldSpec = FieldSpec::new("DB_CONNECTION_ARGS", ValueKind::Map);

static FIELDS: &[FieldSpec] = &[DB_URI, DB_CONNECTION_ARGS];

// MySQL arguments.
const SSL: FieldSpec = FieldSpec::new("ssl", ValueKind::Map);
const SSL_CA: FieldSpec = FieldSpec::new("ca", ValueKind::Text);
const THREADLOCALS: FieldSpec = FieldSpec::new("threadlocals", ValueKind::Bool);
const AUTOROLLBACK: FieldSpec = FieldSpec::new("autorollback", ValueKind::Bool);

// Postgres arguments.
const SSLMODE: FieldSpec =
    FieldSpec::new("sslmode", ValueKind::Text).constrained(&[Constraint::OneOf(SSL_MODES)]);
const SSLROOTCERT: FieldSpec = FieldSpec::new("sslrootcert", ValueKind::Text);
const SSLCERT: FieldSpec = FieldSpec::new("sslcert", ValueKind::Text);
const SSLKEY: FieldSpec = FieldSpec::new("sslkey", ValueKind::Text);
const SSLSNI: FieldSpec = FieldSpec::new("sslsni", ValueKind::Text);
const SSL_MIN_PROTOCOL_VERSION: FieldSpec =
    FieldSpec::new("ssl_min_protocol_version", ValueKind::Text)
        .constrained(&[Constraint::OneOf(SSL_PROTOCOL_VERSIONS)]);
const SSL_MAX_PROTOCOL_VERSION: FieldSpec =
    FieldSpec::new("ssl_max_protocol_version", ValueKind::Text)
        .constrained(&[Constraint::OneOf(SSL_PROTOCOL_VERSIONS)]);
const SSLCRL: FieldSpec = FieldSpec::new("sslcrl", ValueKind::Text);
const SSLCRLDIR: FieldSpec = FieldSpec::new("sslcrldir", ValueKind::Text);
const SSLCOMPRESSION: FieldSpec = FieldSpec::new("sslcompression", ValueKind::Int).always_emit();

// Network arguments.
const KEEPALIVES: FieldSpec = FieldSpec::new("keepalives", ValueKind::Int).always_emit();
const KEEPALIVES_IDLE: FieldSpec =
    FieldSpec::new("keepalives_idle", ValueKind::Int).always_emit();
const KEEPALIVES_INTERVAL: FieldSpec =
    FieldSpec::new("keepalives_interval", ValueKind::Int).always_emit();
const KEEPALIVES_COUNT: FieldSpec =
    FieldSpec::new("keepalives_count", ValueKind::Int).always_emit();
const TCP_USER_TIMEOUT: FieldSpec =
    FieldSpec::new("tcp_user_timeout", ValueKind::Int).always_emit();

static ARG_FIELDS: &[FieldSpec] = &[
    SSL,
    THREADLOCALS,
    AUTOROLLBACK,
    SSLMODE,
    SSLROOTCERT,
    SSLCERT,
    SSLKEY,
    SSLSNI,
    SSL_MIN_PROTOCOL_VERSION,
    SSL_MAX_PROTOCOL_VERSION,
    SSLCRL,
    SSLCRLDIR,
    SSLCOMPRESSION,
    KEEPALIVES,
    KEEPALIVES_IDLE,
    KEEPALIVES_INTERVAL,
    KEEPALIVES_COUNT,
    TCP_USER_TIMEOUT,
];

/// Driver arguments under `DB_CONNECTION_ARGS`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbConnectionArgs {
    /// `ssl.ca` for MySQL.
    pub ssl_ca: Option<String>,
    pub threadlocals: bool,
    pub autorollback: bool,
    pub sslmode: String,
    pub sslrootcert: String,
    pub sslcert: String,
    pub sslkey: String,
    pub sslsni: String,
    pub ssl_min_protocol_version: String,
    pub ssl_max_protocol_version: String,
    pub sslcrl: String,
    pub sslcrldir: String,
    pub sslcompression: Option<i64>,
    pub keepalives: Option<i64>,
    pub keepalives_idle: Option<i64>,
    pub keepalives_interval: Option<i64>,
    pub keepalives_count: Option<i64>,
    pub tcp_user_timeout: Option<i64>,
    pub extra: Mapping,
}

impl DbConnectionArgs {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            ssl_ca: nested(doc, &SSL, |ssl| field::<String>(ssl, &SSL_CA))?,
            threadlocals: field(doc, &THREADLOCALS)?,
            autorollback: field(doc, &AUTOROLLBACK)?,
            sslmode: field(doc, &SSLMODE)?,
            sslrootcert: field(doc, &SSLROOTCERT)?,
            sslcert: field(doc, &SSLCERT)?,
            sslkey: field(doc, &SSLKEY)?,
            sslsni: field(doc, &SSLSNI)?,
            ssl_min_protocol_version: field(doc, &SSL_MIN_PROTOCOL_VERSION)?,
            ssl_max_protocol_version: field(doc, &SSL_MAX_PROTOCOL_VERSION)?,
            sslcrl: field(doc, &SSLCRL)?,
            sslcrldir: field(doc, &SSLCRLDIR)?,
            sslcompression: field(doc, &SSLCOMPRESSION)?,
            keepalives: field(doc, &KEEPALIVES)?,
            keepalives_idle: field(doc, &KEEPALIVES_IDLE)?,
            keepalives_interval: field(doc, &KEEPALIVES_INTERVAL)?,
            keepalives_count: field(doc, &KEEPALIVES_COUNT)?,
            tcp_user_timeout: field(doc, &TCP_USER_TIMEOUT)?,
            extra: unclaimed(doc, ARG_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        if let Some(ca) = &self.ssl_ca {
            let mut ssl = Mapping::new();
            emit(&mut ssl, &SSL_CA, ca);
            out.insert(SSL.key.to_string(), Value::Map(ssl));
        }
        emit(&mut out, &THREADLOCALS, &self.threadlocals);
        emit(&mut out, &AUTOROLLBACK, &self.autorollback);
        emit(&mut out, &SSLMODE, &self.sslmode);
        emit(&mut out, &SSLROOTCERT, &self.sslrootcert);
        emit(&mut out, &SSLCERT, &self.sslcert);
        emit(&mut out, &SSLKEY, &self.sslkey);
        emit(&mut out, &SSLSNI, &self.sslsni);
        emit(&mut out, &SSL_MIN_PROTOCOL_VERSION, &self.ssl_min_protocol_version);
        emit(&mut out, &SSL_MAX_PROTOCOL_VERSION, &self.ssl_max_protocol_version);
        emit(&mut out, &SSLCRL, &self.sslcrl);
        emit(&mut out, &SSLCRLDIR, &self.sslcrldir);
        emit(&mut out, &SSLCOMPRESSION, &self.sslcompression);
        emit(&mut out, &KEEPALIVES, &self.keepalives);
        emit(&mut out, &KEEPALIVES_IDLE, &self.keepalives_idle);
        emit(&mut out, &KEEPALIVES_INTERVAL, &self.keepalives_interval);
        emit(&mut out, &KEEPALIVES_COUNT, &self.keepalives_count);
        emit(&mut out, &TCP_USER_TIMEOUT, &self.tcp_user_timeout);
        out
    }
}

/// The `Database` field group.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub db_uri: String,
    pub db_connection_args: DbConnectionArgs,
}

impl FieldGroup for Database {
    const NAME: &'static str = "Database";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            db_uri: field(doc, &DB_URI)?,
            db_connection_args: nested(doc, &DB_CONNECTION_ARGS, DbConnectionArgs::from_mapping)?
                .unwrap_or_default(),
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &DB_URI, &self.db_uri);
        let args = Value::Map(self.db_connection_args.to_mapping());
        emit_value(&mut out, &DB_CONNECTION_ARGS, args);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());

        if let Ok(uri) = Url::parse(&self.db_uri) {
            let scheme = uri.scheme();
            let engine = scheme.split('+').next().unwrap_or(scheme);
            if !matches!(engine, "postgresql" | "postgres" | "mysql") {
                errors.push(ValidationError::new(
                    Self::NAME,
                    &[DB_URI.key],
                    format!("DB_URI must use a postgresql or mysql scheme, found {scheme}"),
                ));
            }
        }

        let args = check_fields(Self::NAME, ARG_FIELDS, &self.db_connection_args.to_mapping());
        errors.extend(nested_errors(Self::NAME, DB_CONNECTION_ARGS.key, args));
        errors
    }
}

wire_serde!(Database);
