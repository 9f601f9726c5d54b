//! Who may sign in, how accounts are created, and who holds superuser rights.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationError,
    ValidationErrors, ValueKind, check_fields, emit, field,
};

use super::FieldGroup;

pub const AUTHENTICATION_TYPES: &[&str] =
    &["Database", "LDAP", "JWT", "Keystone", "OIDC", "AppToken"];

const fn flag(key: &'static str, default: bool) -> FieldSpec {
    FieldSpec::new(key, ValueKind::Bool)
        .default_to(FieldDefault::Bool(default))
        .always_emit()
}

const fn duration(key: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec::new(key, ValueKind::Text)
        .default_to(FieldDefault::Text(default))
        .constrained(&[Constraint::TimePattern])
}

const AUTHENTICATION_TYPE: FieldSpec = FieldSpec::new("AUTHENTICATION_TYPE", ValueKind::Text)
    .default_to(FieldDefault::Text("Database"))
    .constrained(&[Constraint::OneOf(AUTHENTICATION_TYPES)]);
const FEATURE_ANONYMOUS_ACCESS: FieldSpec = flag("FEATURE_ANONYMOUS_ACCESS", true);
const FEATURE_DIRECT_LOGIN: FieldSpec = flag("FEATURE_DIRECT_LOGIN", true);
const FEATURE_GITHUB_LOGIN: FieldSpec = flag("FEATURE_GITHUB_LOGIN", false);
const FEATURE_GOOGLE_LOGIN: FieldSpec = flag("FEATURE_GOOGLE_LOGIN", false);
const FEATURE_INVITE_ONLY_USER_CREATION: FieldSpec =
    flag("FEATURE_INVITE_ONLY_USER_CREATION", false);
const FEATURE_PARTIAL_USER_AUTOCOMPLETE: FieldSpec =
    flag("FEATURE_PARTIAL_USER_AUTOCOMPLETE", true);
const FEATURE_USERNAME_CONFIRMATION: FieldSpec = flag("FEATURE_USERNAME_CONFIRMATION", true);
const FEATURE_USER_CREATION: FieldSpec = flag("FEATURE_USER_CREATION", true);
const FEATURE_USER_LAST_ACCESSED: FieldSpec = flag("FEATURE_USER_LAST_ACCESSED", true);
const FEATURE_USER_LOG_ACCESS: FieldSpec = flag("FEATURE_USER_LOG_ACCESS", false);
const FEATURE_USER_METADATA: FieldSpec = flag("FEATURE_USER_METADATA", false);
const FEATURE_USER_RENAME: FieldSpec = flag("FEATURE_USER_RENAME", false);
const FRESH_LOGIN_TIMEOUT: FieldSpec = duration("FRESH_LOGIN_TIMEOUT", "10m");
const USER_RECOVERY_TOKEN_LIFETIME: FieldSpec = duration("USER_RECOVERY_TOKEN_LIFETIME", "30m");
const FEATURE_RESTRICTED_USERS: FieldSpec = flag("FEATURE_RESTRICTED_USERS", false);
const RESTRICTED_USERS_WHITELIST: FieldSpec =
    FieldSpec::new("RESTRICTED_USERS_WHITELIST", ValueKind::TextList);
const FEATURE_SUPERUSERS_FULL_ACCESS: FieldSpec = flag("FEATURE_SUPERUSERS_FULL_ACCESS", false);
const SUPER_USERS: FieldSpec = FieldSpec::new("SUPER_USERS", ValueKind::TextList);

static FIELDS: &[FieldSpec] = &[
    AUTHENTICATION_TYPE,
    FEATURE_ANONYMOUS_ACCESS,
    FEATURE_DIRECT_LOGIN,
    FEATURE_GITHUB_LOGIN,
    FEATURE_GOOGLE_LOGIN,
    FEATURE_INVITE_ONLY_USER_CREATION,
    FEATURE_PARTIAL_USER_AUTOCOMPLETE,
    FEATURE_USERNAME_CONFIRMATION,
    FEATURE_USER_CREATION,
    FEATURE_USER_LAST_ACCESSED,
    FEATURE_USER_LOG_ACCESS,
    FEATURE_USER_METADATA,
    FEATURE_USER_RENAME,
    FRESH_LOGIN_TIMEOUT,
    USER_RECOVERY_TOKEN_LIFETIME,
    FEATURE_RESTRICTED_USERS,
    RESTRICTED_USERS_WHITELIST,
    FEATURE_SUPERUSERS_FULL_ACCESS,
    SUPER_USERS,
];

#[derive(Debug, Clone, PartialEq)]
pub struct AccessSettings {
    pub authentication_type: String,
    pub feature_anonymous_access: bool,
    pub feature_direct_login: bool,
    pub feature_github_login: bool,
    pub feature_google_login: bool,
    pub feature_invite_only_user_creation: bool,
    pub feature_partial_user_autocomplete: bool,
    pub feature_username_confirmation: bool,
    pub feature_user_creation: bool,
    pub feature_user_last_accessed: bool,
    pub feature_user_log_access: bool,
    pub feature_user_metadata: bool,
    pub feature_user_rename: bool,
    pub fresh_login_timeout: String,
    pub user_recovery_token_lifetime: String,
    pub feature_restricted_users: bool,
    pub restricted_users_whitelist: Vec<String>,
    pub feature_superusers_full_access: bool,
    pub super_users: Vec<String>,
}

impl FieldGroup for AccessSettings {
    const NAME: &'static str = "AccessSettings";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            authentication_type: field(doc, &AUTHENTICATION_TYPE)?,
            feature_anonymous_access: field(doc, &FEATURE_ANONYMOUS_ACCESS)?,
            feature_direct_login: field(doc, &FEATURE_DIRECT_LOGIN)?,
            feature_github_login: field(doc, &FEATURE_GITHUB_LOGIN)?,
            feature_google_login: field(doc, &FEATURE_GOOGLE_LOGIN)?,
            feature_invite_only_user_creation: field(doc, &FEATURE_INVITE_ONLY_USER_CREATION)?,
            feature_partial_user_autocomplete: field(doc, &FEATURE_PARTIAL_USER_AUTOCOMPLETE)?,
            feature_username_confirmation: field(doc, &FEATURE_USERNAME_CONFIRMATION)?,
            feature_user_creation: field(doc, &FEATURE_USER_CREATION)?,
            feature_user_last_accessed: field(doc, &FEATURE_USER_LAST_ACCESSED)?,
            feature_user_log_access: field(doc, &FEATURE_USER_LOG_ACCESS)?,
            feature_user_metadata: field(doc, &FEATURE_USER_METADATA)?,
            feature_user_rename: field(doc, &FEATURE_USER_RENAME)?,
            fresh_login_timeout: field(doc, &FRESH_LOGIN_TIMEOUT)?,
            user_recovery_token_lifetime: field(doc, &USER_RECOVERY_TOKEN_LIFETIME)?,
            feature_restricted_users: field(doc, &FEATURE_RESTRICTED_USERS)?,
            restricted_users_whitelist: field(doc, &RESTRICTED_USERS_WHITELIST)?,
            feature_superusers_full_access: field(doc, &FEATURE_SUPERUSERS_FULL_ACCESS)?,
            super_users: field(doc, &SUPER_USERS)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &AUTHENTICATION_TYPE, &self.authentication_type);
        emit(&mut out, &FEATURE_ANONYMOUS_ACCESS, &self.feature_anonymous_access);
        emit(&mut out, &FEATURE_DIRECT_LOGIN, &self.feature_direct_login);
        emit(&mut out, &FEATURE_GITHUB_LOGIN, &self.feature_github_login);
        emit(&mut out, &FEATURE_GOOGLE_LOGIN, &self.feature_google_login);
        emit(&mut out, &FEATURE_INVITE_ONLY_USER_CREATION, &self.feature_invite_only_user_creation);
        emit(&mut out, &FEATURE_PARTIAL_USER_AUTOCOMPLETE, &self.feature_partial_user_autocomplete);
        emit(&mut out, &FEATURE_USERNAME_CONFIRMATION, &self.feature_username_confirmation);
        emit(&mut out, &FEATURE_USER_CREATION, &self.feature_user_creation);
        emit(&mut out, &FEATURE_USER_LAST_ACCESSED, &self.feature_user_last_accessed);
        emit(&mut out, &FEATURE_USER_LOG_ACCESS, &self.feature_user_log_access);
        emit(&mut out, &FEATURE_USER_METADATA, &self.feature_user_metadata);
        emit(&mut out, &FEATURE_USER_RENAME, &self.feature_user_rename);
        emit(&mut out, &FRESH_LOGIN_TIMEOUT, &self.fresh_login_timeout);
        emit(&mut out, &USER_RECOVERY_TOKEN_LIFETIME, &self.user_recovery_token_lifetime);
        emit(&mut out, &FEATURE_RESTRICTED_USERS, &self.feature_restricted_users);
        emit(&mut out, &RESTRICTED_USERS_WHITELIST, &self.restricted_users_whitelist);
        emit(&mut out, &FEATURE_SUPERUSERS_FULL_ACCESS, &self.feature_superusers_full_access);
        emit(&mut out, &SUPER_USERS, &self.super_users);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());

        if !(self.feature_direct_login || self.feature_github_login || self.feature_google_login) {
            let keys = [
                FEATURE_DIRECT_LOGIN.key,
                FEATURE_GITHUB_LOGIN.key,
                FEATURE_GOOGLE_LOGIN.key,
            ];
            errors.push(ValidationError::new(
                Self::NAME,
                &keys,
                format!("At least one of {} must be enabled", keys.join(",")),
            ));
        }

        if self.feature_invite_only_user_creation && !self.feature_user_creation {
            errors.push(ValidationError::new(
                Self::NAME,
                &[FEATURE_INVITE_ONLY_USER_CREATION.key, FEATURE_USER_CREATION.key],
                "FEATURE_INVITE_ONLY_USER_CREATION requires FEATURE_USER_CREATION to be enabled",
            ));
        }

        errors
    }
}

wire_serde!(AccessSettings);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{into_document, parse_yaml};
    use quaycfg_core::ConstructError;

    fn doc(yaml: &str) -> Mapping {
        into_document(parse_yaml(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = AccessSettings::from_document(&Mapping::new()).unwrap();
        assert_eq!(settings.authentication_type, "Database");
        assert!(settings.feature_direct_login);
        assert_eq!(settings.fresh_login_timeout, "10m");
        assert!(settings.super_users.is_empty());
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_no_login_method_enabled() {
        let settings =
            AccessSettings::from_document(&doc("FEATURE_DIRECT_LOGIN: false\n")).unwrap();
        let errors = settings.validate();
        assert_eq!(errors.len(), 1);
        let err = errors.iter().next().unwrap();
        assert_eq!(
            err.message,
            "At least one of FEATURE_DIRECT_LOGIN,FEATURE_GITHUB_LOGIN,FEATURE_GOOGLE_LOGIN \
             must be enabled"
        );
        assert_eq!(err.tags.len(), 3);
    }

    #[test]
    fn test_invite_only_requires_user_creation() {
        let settings = AccessSettings::from_document(&doc(
            "FEATURE_INVITE_ONLY_USER_CREATION: true\nFEATURE_USER_CREATION: false\n",
        ))
        .unwrap();
        assert_eq!(settings.validate().len(), 1);
    }

    #[test]
    fn test_bad_duration_and_auth_type() {
        let settings = AccessSettings::from_document(&doc(
            "FRESH_LOGIN_TIMEOUT: ten minutes\nAUTHENTICATION_TYPE: Kerberos\n",
        ))
        .unwrap();
        let tags: Vec<_> = settings.validate().into_iter().flat_map(|e| e.tags).collect();
        assert_eq!(tags, vec!["AUTHENTICATION_TYPE", "FRESH_LOGIN_TIMEOUT"]);
    }

    #[test]
    fn test_super_users_must_be_strings() {
        let err = AccessSettings::from_document(&doc("SUPER_USERS: [admin, 7]\n")).unwrap_err();
        assert_eq!(err, ConstructError::type_mismatch("SUPER_USERS", ValueKind::TextList));
    }

    #[test]
    fn test_false_flags_survive_round_trip() {
        let settings = AccessSettings::from_document(&doc(
            "FEATURE_ANONYMOUS_ACCESS: false\nSUPER_USERS: [admin]\n",
        ))
        .unwrap();
        let back = AccessSettings::from_document(&settings.to_document()).unwrap();
        assert_eq!(back, settings);
    }
}
