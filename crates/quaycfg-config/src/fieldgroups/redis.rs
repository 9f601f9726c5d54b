//! Redis connections for build logs, user events and pull metrics.

use quaycfg_core::{
    Constraint, ConstructResult, FieldSpec, Mapping, ValidationErrors, Value, ValueKind,
    check_fields, emit, emit_value, field, nested,
};

use super::{FieldGroup, nested_errors, unclaimed};

const BUILDLOGS_REDIS: FieldSpec =
    FieldSpec::new("BUILDLOGS_REDIS", ValueKind::Map).constrained(&[Constraint::Required]);
const USER_EVENTS_REDIS: FieldSpec =
    FieldSpec::new("USER_EVENTS_REDIS", ValueKind::Map).constrained(&[Constraint::Required]);
const PULL_METRICS_REDIS: FieldSpec = FieldSpec::new("PULL_METRICS_REDIS", ValueKind::Map);

static FIELDS: &[FieldSpec] = &[BUILDLOGS_REDIS, USER_EVENTS_REDIS, PULL_METRICS_REDIS];

const HOST: FieldSpec =
    FieldSpec::new("host", ValueKind::Text).constrained(&[Constraint::Required]);
const PORT: FieldSpec = FieldSpec::new("port", ValueKind::Int)
    .constrained(&[Constraint::Range { min: Some(1), max: Some(65535) }])
    .always_emit();
const PASSWORD: FieldSpec = FieldSpec::new("password", ValueKind::Text);
const SSL: FieldSpec = FieldSpec::new("ssl", ValueKind::Bool).always_emit();

static CONNECTION_FIELDS: &[FieldSpec] = &[HOST, PORT, PASSWORD, SSL];

/// One Redis connection block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedisConfig {
    pub host: String,
    pub port: Option<i64>,
    pub password: String,
    pub ssl: Option<bool>,
    /// Client options passed through untouched, e.g. `db` or `socket_timeout`.
    pub extra: Mapping,
}

impl RedisConfig {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            host: field(doc, &HOST)?,
            port: field(doc, &PORT)?,
            password: field(doc, &PASSWORD)?,
            ssl: field(doc, &SSL)?,
            extra: unclaimed(doc, CONNECTION_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &HOST, &self.host);
        emit(&mut out, &PORT, &self.port);
        emit(&mut out, &PASSWORD, &self.password);
        emit(&mut out, &SSL, &self.ssl);
        out
    }
}

/// The `Redis` field group.
#[derive(Debug, Clone, PartialEq)]
pub struct Redis {
    pub buildlogs_redis: Option<RedisConfig>,
    pub user_events_redis: Option<RedisConfig>,
    pub pull_metrics_redis: Option<RedisConfig>,
}

impl Redis {
    fn connections(&self) -> [(&'static FieldSpec, Option<&RedisConfig>); 3] {
        [
            (&BUILDLOGS_REDIS, self.buildlogs_redis.as_ref()),
            (&USER_EVENTS_REDIS, self.user_events_redis.as_ref()),
            (&PULL_METRICS_REDIS, self.pull_metrics_redis.as_ref()),
        ]
    }
}

impl FieldGroup for Redis {
    const NAME: &'static str = "Redis";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            buildlogs_redis: nested(doc, &BUILDLOGS_REDIS, RedisConfig::from_mapping)?,
            user_events_redis: nested(doc, &USER_EVENTS_REDIS, RedisConfig::from_mapping)?,
            pull_metrics_redis: nested(doc, &PULL_METRICS_REDIS, RedisConfig::from_mapping)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        for (spec, connection) in self.connections() {
            if let Some(connection) = connection {
                emit_value(&mut out, spec, Value::Map(connection.to_mapping()));
            }
        }
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        for (spec, connection) in self.connections() {
            // An empty block already failed as a whole.
            let Some(wire) = connection.map(RedisConfig::to_mapping).filter(|w| !w.is_empty())
            else {
                continue;
            };
            let inner = check_fields(Self::NAME, CONNECTION_FIELDS, &wire);
            errors.extend(nested_errors(Self::NAME, spec.key, inner));
        }
        errors
    }
}

wire_serde!(Redis);
