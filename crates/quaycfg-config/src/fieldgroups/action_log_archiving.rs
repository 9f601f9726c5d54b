//! Rotation of action logs into a configured storage location.

use quaycfg_core::{
    ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationError, ValidationErrors, ValueKind,
    check_fields, emit, field,
};

use super::distributed_storage::{
    DISTRIBUTED_STORAGE_CONFIG, StorageConfig, emit_storage_config, storage_config,
};
use super::{FieldGroup, require_text};

const FEATURE_ACTION_LOG_ROTATION: FieldSpec =
    FieldSpec::new("FEATURE_ACTION_LOG_ROTATION", ValueKind::Bool)
        .default_to(FieldDefault::Bool(false))
        .always_emit();
const ACTION_LOG_ARCHIVE_LOCATION: FieldSpec =
    FieldSpec::new("ACTION_LOG_ARCHIVE_LOCATION", ValueKind::Text);
const ACTION_LOG_ARCHIVE_PATH: FieldSpec =
    FieldSpec::new("ACTION_LOG_ARCHIVE_PATH", ValueKind::Text);

static FIELDS: &[FieldSpec] = &[
    FEATURE_ACTION_LOG_ROTATION,
    ACTION_LOG_ARCHIVE_LOCATION,
    ACTION_LOG_ARCHIVE_PATH,
    DISTRIBUTED_STORAGE_CONFIG,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ActionLogArchiving {
    pub feature_action_log_rotation: bool,
    pub action_log_archive_location: String,
    pub action_log_archive_path: String,
    /// Embedded copy of the storage locations, built the same way as in
    /// the `DistributedStorage` group.
    pub distributed_storage_config: StorageConfig,
}

impl FieldGroup for ActionLogArchiving {
    const NAME: &'static str = "ActionLogArchiving";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            feature_action_log_rotation: field(doc, &FEATURE_ACTION_LOG_ROTATION)?,
            action_log_archive_location: field(doc, &ACTION_LOG_ARCHIVE_LOCATION)?,
            action_log_archive_path: field(doc, &ACTION_LOG_ARCHIVE_PATH)?,
            distributed_storage_config: storage_config(doc)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &FEATURE_ACTION_LOG_ROTATION, &self.feature_action_log_rotation);
        emit(&mut out, &ACTION_LOG_ARCHIVE_LOCATION, &self.action_log_archive_location);
        emit(&mut out, &ACTION_LOG_ARCHIVE_PATH, &self.action_log_archive_path);
        emit_storage_config(&mut out, &self.distributed_storage_config);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        if !self.feature_action_log_rotation {
            return errors;
        }

        let location = &self.action_log_archive_location;
        require_text(&mut errors, Self::NAME, ACTION_LOG_ARCHIVE_LOCATION.key, location);
        let path = &self.action_log_archive_path;
        require_text(&mut errors, Self::NAME, ACTION_LOG_ARCHIVE_PATH.key, path);

        let location = &self.action_log_archive_location;
        if !location.is_empty() && !self.distributed_storage_config.contains_key(location) {
            errors.push(ValidationError::new(
                Self::NAME,
                &[ACTION_LOG_ARCHIVE_LOCATION.key],
                format!(
                    "ACTION_LOG_ARCHIVE_LOCATION {location} is not a location in {}",
                    DISTRIBUTED_STORAGE_CONFIG.key
                ),
            ));
        }
        errors
    }
}

wire_serde!(ActionLogArchiving);
