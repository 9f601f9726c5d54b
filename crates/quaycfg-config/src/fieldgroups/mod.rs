//! Field groups: typed, independently validated projections of the document.
//!
//! Every group reads its own keys from the same flat document, applies its
//! declared defaults, and fails on the first value with the wrong type.
//! Validation runs afterwards over the constructed group and collects every
//! violated constraint.

use quaycfg_core::{
    ConstructResult, FieldSpec, Mapping, ValidationError, ValidationErrors, check_fields,
};

/// Serialize and deserialize a group through its wire mapping.
macro_rules! wire_serde {
    ($group:ty) => {
        impl serde::Serialize for $group {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let wire = $crate::fieldgroups::FieldGroup::to_document(self);
                serde::Serialize::serialize(&wire, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $group {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let doc = <quaycfg_core::Mapping as serde::Deserialize>::deserialize(deserializer)?;
                <$group as $crate::fieldgroups::FieldGroup>::from_document(&doc)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod access_settings;
pub mod action_log_archiving;
pub mod build_manager;
pub mod database;
pub mod distributed_storage;
pub mod elasticsearch;
pub mod email;
pub mod host_settings;
pub mod jwt_authentication;
pub mod oidc;
pub mod redis;
pub mod repo_mirror;
pub mod security_scanner;
pub mod team_syncing;
pub mod time_machine;

pub use access_settings::AccessSettings;
pub use action_log_archiving::ActionLogArchiving;
pub use build_manager::{
    BuildManager, BuildManagerArgs, BuildManagerDefinition, Executor, Orchestrator,
};
pub use database::{Database, DbConnectionArgs};
pub use distributed_storage::{DistributedStorage, StorageArgs, StorageConfig, StorageDefinition};
pub use elasticsearch::{
    Elasticsearch, ElasticsearchConfig, KafkaConfig, KinesisStreamConfig, LogsModelConfig,
};
pub use email::Email;
pub use host_settings::HostSettings;
pub use jwt_authentication::JwtAuthentication;
pub use oidc::{OidcFieldGroup, OidcProvider, ServiceId};
pub use redis::{Redis, RedisConfig};
pub use repo_mirror::RepoMirror;
pub use security_scanner::SecurityScanner;
pub use team_syncing::TeamSyncing;
pub use time_machine::TimeMachine;

/// A named section of the configuration.
pub trait FieldGroup: Sized {
    /// Group name used to tag construction errors and violations.
    const NAME: &'static str;

    /// Descriptors for the group's top-level keys.
    fn fields() -> &'static [FieldSpec];

    /// Build the group from the full document.
    fn from_document(doc: &Mapping) -> ConstructResult<Self>;

    /// Wire form, using the document's keys and omitting empty values.
    fn to_document(&self) -> Mapping;

    /// Check every declared constraint. Groups with cross-field rules extend this.
    fn validate(&self) -> ValidationErrors {
        check_fields(Self::NAME, Self::fields(), &self.to_document())
    }
}

/// Entries of `doc` whose keys no descriptor in `specs` claims.
pub(crate) fn unclaimed(doc: &Mapping, specs: &[FieldSpec]) -> Mapping {
    doc.iter()
        .filter(|(key, _)| !specs.iter().any(|spec| spec.key == key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Re-tag violations of a nested structure under its parent key.
pub(crate) fn nested_errors(group: &str, key: &str, inner: ValidationErrors) -> ValidationErrors {
    inner
        .into_iter()
        .map(|error| {
            let tag = format!("{key}.{}", error.tags.join(","));
            ValidationError::new(group, &[tag.as_str()], format!("{key}.{}", error.message))
        })
        .collect()
}

/// Push a `{key} is required` violation when `value` is empty.
pub(crate) fn require_text(errors: &mut ValidationErrors, group: &str, key: &str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError::new(group, &[key], format!("{key} is required")));
    }
}
