//! Synchronising team membership from an external directory.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationErrors,
    ValueKind, check_fields, emit, field,
};

use super::{FieldGroup, require_text};

const FEATURE_TEAM_SYNCING: FieldSpec = FieldSpec::new("FEATURE_TEAM_SYNCING", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();
const FEATURE_NONSUPERUSER_TEAM_SYNCING_SETUP: FieldSpec =
    FieldSpec::new("FEATURE_NONSUPERUSER_TEAM_SYNCING_SETUP", ValueKind::Bool)
        .default_to(FieldDefault::Bool(false))
        .always_emit();
const TEAM_RESYNC_STALE_TIME: FieldSpec = FieldSpec::new("TEAM_RESYNC_STALE_TIME", ValueKind::Text)
    .default_to(FieldDefault::Text("30m"))
    .constrained(&[Constraint::TimePattern]);

static FIELDS: &[FieldSpec] = &[
    FEATURE_TEAM_SYNCING,
    FEATURE_NONSUPERUSER_TEAM_SYNCING_SETUP,
    TEAM_RESYNC_STALE_TIME,
];

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSyncing {
    pub feature_team_syncing: bool,
    pub feature_nonsuperuser_team_syncing_setup: bool,
    pub team_resync_stale_time: String,
}

impl FieldGroup for TeamSyncing {
    const NAME: &'static str = "TeamSyncing";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            feature_team_syncing: field(doc, &FEATURE_TEAM_SYNCING)?,
            feature_nonsuperuser_team_syncing_setup: field(
                doc,
                &FEATURE_NONSUPERUSER_TEAM_SYNCING_SETUP,
            )?,
            team_resync_stale_time: field(doc, &TEAM_RESYNC_STALE_TIME)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &FEATURE_TEAM_SYNCING, &self.feature_team_syncing);
        emit(
            &mut out,
            &FEATURE_NONSUPERUSER_TEAM_SYNCING_SETUP,
            &self.feature_nonsuperuser_team_syncing_setup,
        );
        emit(&mut out, &TEAM_RESYNC_STALE_TIME, &self.team_resync_stale_time);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        if self.feature_team_syncing {
            let stale_time = &self.team_resync_stale_time;
            require_text(&mut errors, Self::NAME, TEAM_RESYNC_STALE_TIME.key, stale_time);
        }
        errors
    }
}

wire_serde!(TeamSyncing);
