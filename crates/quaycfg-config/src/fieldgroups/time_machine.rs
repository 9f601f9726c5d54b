//! Tag expiration defaults and the choices offered to users.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, TIME_PATTERN, ValidationError,
    ValidationErrors, ValueKind, check_fields, emit, field, is_duration,
};

use super::FieldGroup;

const DEFAULT_EXPIRATION_OPTIONS: &[&str] = &["0s", "1d", "1w", "2w", "4w"];

const FEATURE_CHANGE_TAG_EXPIRATION: FieldSpec =
    FieldSpec::new("FEATURE_CHANGE_TAG_EXPIRATION", ValueKind::Bool)
        .default_to(FieldDefault::Bool(true))
        .always_emit();
const DEFAULT_TAG_EXPIRATION: FieldSpec = FieldSpec::new("DEFAULT_TAG_EXPIRATION", ValueKind::Text)
    .default_to(FieldDefault::Text("2w"))
    .constrained(&[Constraint::TimePattern])
    .always_emit();
const TAG_EXPIRATION_OPTIONS: FieldSpec =
    FieldSpec::new("TAG_EXPIRATION_OPTIONS", ValueKind::TextList).always_emit();

static FIELDS: &[FieldSpec] =
    &[FEATURE_CHANGE_TAG_EXPIRATION, DEFAULT_TAG_EXPIRATION, TAG_EXPIRATION_OPTIONS];

#[derive(Debug, Clone, PartialEq)]
pub struct TimeMachine {
    pub feature_change_tag_expiration: bool,
    pub default_tag_expiration: String,
    pub tag_expiration_options: Vec<String>,
}

impl FieldGroup for TimeMachine {
    const NAME: &'static str = "TimeMachine";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        let options: Option<Vec<String>> = field(doc, &TAG_EXPIRATION_OPTIONS)?;
        Ok(Self {
            feature_change_tag_expiration: field(doc, &FEATURE_CHANGE_TAG_EXPIRATION)?,
            default_tag_expiration: field(doc, &DEFAULT_TAG_EXPIRATION)?,
            tag_expiration_options: options.unwrap_or_else(|| {
                DEFAULT_EXPIRATION_OPTIONS.iter().map(|o| (*o).to_string()).collect()
            }),
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &FEATURE_CHANGE_TAG_EXPIRATION, &self.feature_change_tag_expiration);
        emit(&mut out, &DEFAULT_TAG_EXPIRATION, &self.default_tag_expiration);
        emit(&mut out, &TAG_EXPIRATION_OPTIONS, &self.tag_expiration_options);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());

        for (i, option) in self.tag_expiration_options.iter().enumerate() {
            if !is_duration(option) {
                let tag = format!("{}[{i}]", TAG_EXPIRATION_OPTIONS.key);
                errors.push(ValidationError::new(
                    Self::NAME,
                    &[tag.as_str()],
                    format!("{tag} must match pattern {TIME_PATTERN}"),
                ));
            }
        }

        let default = &self.default_tag_expiration;
        if !default.is_empty() && !self.tag_expiration_options.contains(default) {
            errors.push(ValidationError::new(
                Self::NAME,
                &[DEFAULT_TAG_EXPIRATION.key, TAG_EXPIRATION_OPTIONS.key],
                "DEFAULT_TAG_EXPIRATION must be one of TAG_EXPIRATION_OPTIONS",
            ));
        }
        errors
    }
}

wire_serde!(TimeMachine);
