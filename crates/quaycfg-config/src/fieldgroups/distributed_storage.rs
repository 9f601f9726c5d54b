//! Storage backends for image layers.
//!
//! `DISTRIBUTED_STORAGE_CONFIG` maps a location name to a `[driver, args]`
//! tuple, the same shape the build manager uses.

use quaycfg_core::{
    ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationError,
    ValidationErrors, Value, ValueKind, check_fields, decode_tuple, emit, emit_value, encode_tuple,
    field,
};
use std::collections::BTreeMap;

use super::{FieldGroup, require_text, unclaimed};

/// Storage drivers and the arguments each one cannot do without.
const DRIVERS: &[(&str, &[&str])] = &[
    ("LocalStorage", &["storage_path"]),
    ("S3Storage", &["s3_bucket", "storage_path"]),
    ("RadosGWStorage", &["access_key", "secret_key", "hostname", "bucket_name"]),
    ("RHOCSStorage", &["access_key", "secret_key", "hostname", "bucket_name"]),
    ("IBMCloudStorage", &["access_key", "secret_key", "hostname", "bucket_name"]),
    ("AzureStorage", &["azure_container", "azure_account_name"]),
    ("SwiftStorage", &["auth_url", "swift_container", "swift_user", "swift_password"]),
    ("GoogleCloudStorage", &["access_key", "secret_key", "bucket_name"]),
    (
        "CloudFrontedS3Storage",
        &["s3_bucket", "cloudfront_distribution_domain", "cloudfront_key_id"],
    ),
    ("CloudFlareStorage", &["s3_access_key", "s3_secret_key", "s3_bucket", "cloudflare_domain"]),
    ("MultiCDNStorage", &["providers", "default_provider", "storage_config"]),
];

pub(crate) const DISTRIBUTED_STORAGE_CONFIG: FieldSpec =
    FieldSpec::new("DISTRIBUTED_STORAGE_CONFIG", ValueKind::Map);
const DISTRIBUTED_STORAGE_PREFERENCE: FieldSpec =
    FieldSpec::new("DISTRIBUTED_STORAGE_PREFERENCE", ValueKind::TextList);
const DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS: FieldSpec =
    FieldSpec::new("DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS", ValueKind::TextList);
const FEATURE_STORAGE_REPLICATION: FieldSpec =
    FieldSpec::new("FEATURE_STORAGE_REPLICATION", ValueKind::Bool)
        .default_to(FieldDefault::Bool(false))
        .always_emit();
const FEATURE_PROXY_STORAGE: FieldSpec = FieldSpec::new("FEATURE_PROXY_STORAGE", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();

static FIELDS: &[FieldSpec] = &[
    DISTRIBUTED_STORAGE_CONFIG,
    DISTRIBUTED_STORAGE_PREFERENCE,
    DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS,
    FEATURE_STORAGE_REPLICATION,
    FEATURE_PROXY_STORAGE,
];

const fn text(key: &'static str) -> FieldSpec {
    FieldSpec::new(key, ValueKind::Text)
}

const ACCESS_KEY: FieldSpec = text("access_key");
const SECRET_KEY: FieldSpec = text("secret_key");
const HOSTNAME: FieldSpec = text("hostname");
const IS_SECURE: FieldSpec = FieldSpec::new("is_secure", ValueKind::Bool);
const PORT: FieldSpec = FieldSpec::new("port", ValueKind::Int).always_emit();
const BUCKET_NAME: FieldSpec = text("bucket_name");
const STORAGE_PATH: FieldSpec = text("storage_path");
const S3_BUCKET: FieldSpec = text("s3_bucket");
const S3_ACCESS_KEY: FieldSpec = text("s3_access_key");
const S3_SECRET_KEY: FieldSpec = text("s3_secret_key");
const S3_REGION: FieldSpec = text("s3_region");
const HOST: FieldSpec = text("host");
const AZURE_CONTAINER: FieldSpec = text("azure_container");
const AZURE_ACCOUNT_NAME: FieldSpec = text("azure_account_name");
const AZURE_ACCOUNT_KEY: FieldSpec = text("azure_account_key");
const SAS_TOKEN: FieldSpec = text("sas_token");
const ENDPOINT_URL: FieldSpec = text("endpoint_url");
const CLOUDFRONT_DISTRIBUTION_DOMAIN: FieldSpec = text("cloudfront_distribution_domain");
const CLOUDFRONT_KEY_ID: FieldSpec = text("cloudfront_key_id");
const CLOUDFLARE_DOMAIN: FieldSpec = text("cloudflare_domain");
const STORAGE_CONFIG: FieldSpec = FieldSpec::new("storage_config", ValueKind::Map);
const PROVIDERS: FieldSpec = FieldSpec::new("providers", ValueKind::Map);
const DEFAULT_PROVIDER: FieldSpec = text("default_provider");
const AUTH_VERSION: FieldSpec = FieldSpec::new("auth_version", ValueKind::Int).always_emit();
const AUTH_URL: FieldSpec = text("auth_url");
const SWIFT_CONTAINER: FieldSpec = text("swift_container");
const SWIFT_USER: FieldSpec = text("swift_user");
const SWIFT_PASSWORD: FieldSpec = text("swift_password");
const CA_CERT_PATH: FieldSpec = text("ca_cert_path");
const TEMP_URL_KEY: FieldSpec = text("temp_url_key");
const OS_OPTIONS: FieldSpec = FieldSpec::new("os_options", ValueKind::Map);
const STS_ROLE_ARN: FieldSpec = text("sts_role_arn");
const STS_USER_ACCESS_KEY: FieldSpec = text("sts_user_access_key");
const STS_USER_SECRET_KEY: FieldSpec = text("sts_user_secret_key");

static ARG_FIELDS: &[FieldSpec] = &[
    ACCESS_KEY,
    SECRET_KEY,
    HOSTNAME,
    IS_SECURE,
    PORT,
    BUCKET_NAME,
    STORAGE_PATH,
    S3_BUCKET,
    S3_ACCESS_KEY,
    S3_SECRET_KEY,
    S3_REGION,
    HOST,
    AZURE_CONTAINER,
    AZURE_ACCOUNT_NAME,
    AZURE_ACCOUNT_KEY,
    SAS_TOKEN,
    ENDPOINT_URL,
    CLOUDFRONT_DISTRIBUTION_DOMAIN,
    CLOUDFRONT_KEY_ID,
    CLOUDFLARE_DOMAIN,
    STORAGE_CONFIG,
    PROVIDERS,
    DEFAULT_PROVIDER,
    AUTH_VERSION,
    AUTH_URL,
    SWIFT_CONTAINER,
    SWIFT_USER,
    SWIFT_PASSWORD,
    CA_CERT_PATH,
    TEMP_URL_KEY,
    OS_OPTIONS,
    STS_ROLE_ARN,
    STS_USER_ACCESS_KEY,
    STS_USER_SECRET_KEY,
];

/// Arguments of one storage location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageArgs {
    pub access_key: String,
    pub secret_key: String,
    pub hostname: String,
    pub is_secure: bool,
    pub port: Option<i64>,
    pub bucket_name: String,
    pub storage_path: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_region: String,
    pub host: String,
    pub azure_container: String,
    pub azure_account_name: String,
    pub azure_account_key: String,
    pub sas_token: String,
    pub endpoint_url: String,
    pub cloudfront_distribution_domain: String,
    pub cloudfront_key_id: String,
    pub cloudflare_domain: String,
    pub storage_config: Mapping,
    pub providers: Mapping,
    pub default_provider: String,
    pub auth_version: Option<i64>,
    pub auth_url: String,
    pub swift_container: String,
    pub swift_user: String,
    pub swift_password: String,
    pub ca_cert_path: String,
    pub temp_url_key: String,
    pub os_options: Mapping,
    pub sts_role_arn: String,
    pub sts_user_access_key: String,
    pub sts_user_secret_key: String,
    pub extra: Mapping,
}

impl StorageArgs {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            access_key: field(doc, &ACCESS_KEY)?,
            secret_key: field(doc, &SECRET_KEY)?,
            hostname: field(doc, &HOSTNAME)?,
            is_secure: field(doc, &IS_SECURE)?,
            port: field(doc, &PORT)?,
            bucket_name: field(doc, &BUCKET_NAME)?,
            storage_path: field(doc, &STORAGE_PATH)?,
            s3_bucket: field(doc, &S3_BUCKET)?,
            s3_access_key: field(doc, &S3_ACCESS_KEY)?,
            s3_secret_key: field(doc, &S3_SECRET_KEY)?,
            s3_region: field(doc, &S3_REGION)?,
            host: field(doc, &HOST)?,
            azure_container: field(doc, &AZURE_CONTAINER)?,
            azure_account_name: field(doc, &AZURE_ACCOUNT_NAME)?,
            azure_account_key: field(doc, &AZURE_ACCOUNT_KEY)?,
            sas_token: field(doc, &SAS_TOKEN)?,
            endpoint_url: field(doc, &ENDPOINT_URL)?,
            cloudfront_distribution_domain: field(doc, &CLOUDFRONT_DISTRIBUTION_DOMAIN)?,
            cloudfront_key_id: field(doc, &CLOUDFRONT_KEY_ID)?,
            cloudflare_domain: field(doc, &CLOUDFLARE_DOMAIN)?,
            storage_config: field(doc, &STORAGE_CONFIG)?,
            providers: field(doc, &PROVIDERS)?,
            default_provider: field(doc, &DEFAULT_PROVIDER)?,
            auth_version: field(doc, &AUTH_VERSION)?,
            auth_url: field(doc, &AUTH_URL)?,
            swift_container: field(doc, &SWIFT_CONTAINER)?,
            swift_user: field(doc, &SWIFT_USER)?,
            swift_password: field(doc, &SWIFT_PASSWORD)?,
            ca_cert_path: field(doc, &CA_CERT_PATH)?,
            temp_url_key: field(doc, &TEMP_URL_KEY)?,
            os_options: field(doc, &OS_OPTIONS)?,
            sts_role_arn: field(doc, &STS_ROLE_ARN)?,
            sts_user_access_key: field(doc, &STS_USER_ACCESS_KEY)?,
            sts_user_secret_key: field(doc, &STS_USER_SECRET_KEY)?,
            extra: unclaimed(doc, ARG_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &ACCESS_KEY, &self.access_key);
        emit(&mut out, &SECRET_KEY, &self.secret_key);
        emit(&mut out, &HOSTNAME, &self.hostname);
        emit(&mut out, &IS_SECURE, &self.is_secure);
        emit(&mut out, &PORT, &self.port);
        emit(&mut out, &BUCKET_NAME, &self.bucket_name);
        emit(&mut out, &STORAGE_PATH, &self.storage_path);
        emit(&mut out, &S3_BUCKET, &self.s3_bucket);
        emit(&mut out, &S3_ACCESS_KEY, &self.s3_access_key);
        emit(&mut out, &S3_SECRET_KEY, &self.s3_secret_key);
        emit(&mut out, &S3_REGION, &self.s3_region);
        emit(&mut out, &HOST, &self.host);
        emit(&mut out, &AZURE_CONTAINER, &self.azure_container);
        emit(&mut out, &AZURE_ACCOUNT_NAME, &self.azure_account_name);
        emit(&mut out, &AZURE_ACCOUNT_KEY, &self.azure_account_key);
        emit(&mut out, &SAS_TOKEN, &self.sas_token);
        emit(&mut out, &ENDPOINT_URL, &self.endpoint_url);
        emit(&mut out, &CLOUDFRONT_DISTRIBUTION_DOMAIN, &self.cloudfront_distribution_domain);
        emit(&mut out, &CLOUDFRONT_KEY_ID, &self.cloudfront_key_id);
        emit(&mut out, &CLOUDFLARE_DOMAIN, &self.cloudflare_domain);
        emit(&mut out, &STORAGE_CONFIG, &self.storage_config);
        emit(&mut out, &PROVIDERS, &self.providers);
        emit(&mut out, &DEFAULT_PROVIDER, &self.default_provider);
        emit(&mut out, &AUTH_VERSION, &self.auth_version);
        emit(&mut out, &AUTH_URL, &self.auth_url);
        emit(&mut out, &SWIFT_CONTAINER, &self.swift_container);
        emit(&mut out, &SWIFT_USER, &self.swift_user);
        emit(&mut out, &SWIFT_PASSWORD, &self.swift_password);
        emit(&mut out, &CA_CERT_PATH, &self.ca_cert_path);
        emit(&mut out, &TEMP_URL_KEY, &self.temp_url_key);
        emit(&mut out, &OS_OPTIONS, &self.os_options);
        emit(&mut out, &STS_ROLE_ARN, &self.sts_role_arn);
        emit(&mut out, &STS_USER_ACCESS_KEY, &self.sts_user_access_key);
        emit(&mut out, &STS_USER_SECRET_KEY, &self.sts_user_secret_key);
        out
    }

    fn text_arg(&self, key: &str) -> Option<&str> {
        let value = match key {
            "access_key" => &self.access_key,
            "secret_key" => &self.secret_key,
            "hostname" => &self.hostname,
            "bucket_name" => &self.bucket_name,
            "storage_path" => &self.storage_path,
            "s3_bucket" => &self.s3_bucket,
            "s3_access_key" => &self.s3_access_key,
            "s3_secret_key" => &self.s3_secret_key,
            "azure_container" => &self.azure_container,
            "azure_account_name" => &self.azure_account_name,
            "cloudfront_distribution_domain" => &self.cloudfront_distribution_domain,
            "cloudfront_key_id" => &self.cloudfront_key_id,
            "cloudflare_domain" => &self.cloudflare_domain,
            "default_provider" => &self.default_provider,
            "auth_url" => &self.auth_url,
            "swift_container" => &self.swift_container,
            "swift_user" => &self.swift_user,
            "swift_password" => &self.swift_password,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn has_arg(&self, key: &str) -> bool {
        match key {
            "providers" => !self.providers.is_empty(),
            "storage_config" => !self.storage_config.is_empty(),
            other => self.text_arg(other).is_some_and(|v| !v.is_empty()),
        }
    }
}

/// One `[driver, args]` storage location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageDefinition {
    pub driver: String,
    pub args: StorageArgs,
}

impl StorageDefinition {
    pub fn decode(key: &str, value: &Value) -> ConstructResult<Self> {
        let (driver, args) = decode_tuple(key, value)?;
        let args = StorageArgs::from_mapping(args).map_err(|err| err.within(key))?;
        Ok(Self {
            driver: driver.to_string(),
            args,
        })
    }

    pub fn encode(&self) -> Value {
        encode_tuple(&self.driver, self.args.to_mapping())
    }

    /// Per-driver argument checks for the location called `name`.
    pub fn validate(&self, group: &str, name: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let prefix = format!("{}.{name}", DISTRIBUTED_STORAGE_CONFIG.key);

        let Some((_, required)) = DRIVERS.iter().find(|(driver, _)| *driver == self.driver) else {
            errors.push(ValidationError::new(
                group,
                &[DISTRIBUTED_STORAGE_CONFIG.key],
                format!("{} is not a valid storage type.", self.driver),
            ));
            return errors;
        };

        for arg in required.iter() {
            if !self.args.has_arg(arg) {
                let key = format!("{prefix}.{arg}");
                let message = format!("{key} is required");
                errors.push(ValidationError::new(group, &[key.as_str()], message));
            }
        }

        if self.driver == "SwiftStorage" {
            if let Some(version) = self.args.auth_version.filter(|v| !(1..=3).contains(v)) {
                errors.push(ValidationError::new(
                    group,
                    &[DISTRIBUTED_STORAGE_CONFIG.key],
                    format!("{version} must be either 1, 2, or 3."),
                ));
            }
        }

        errors
    }
}

/// Location name to storage definition.
pub type StorageConfig = BTreeMap<String, StorageDefinition>;

/// Read `DISTRIBUTED_STORAGE_CONFIG` from a document.
pub fn storage_config(doc: &Mapping) -> ConstructResult<StorageConfig> {
    let key = DISTRIBUTED_STORAGE_CONFIG.key;
    let entries: Mapping = field(doc, &DISTRIBUTED_STORAGE_CONFIG)?;
    entries
        .iter()
        .map(|(name, value)| {
            StorageDefinition::decode(name, value)
                .map(|definition| (name.clone(), definition))
                .map_err(|err| err.within(key))
        })
        .collect()
}

/// Write a storage config back into its wire mapping.
pub fn emit_storage_config(out: &mut Mapping, config: &StorageConfig) {
    let entries: Mapping = config
        .iter()
        .map(|(name, definition)| (name.clone(), definition.encode()))
        .collect();
    emit_value(out, &DISTRIBUTED_STORAGE_CONFIG, Value::Map(entries));
}

/// Flag every name in `names` that is not a configured location.
pub(crate) fn check_locations(
    errors: &mut ValidationErrors,
    group: &str,
    key: &str,
    names: &[String],
    config: &StorageConfig,
) {
    for name in names.iter().filter(|name| !config.contains_key(name.as_str())) {
        errors.push(ValidationError::new(
            group,
            &[key],
            format!("{key} refers to {name}, which is not in {}", DISTRIBUTED_STORAGE_CONFIG.key),
        ));
    }
}

/// The `DistributedStorage` field group.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedStorage {
    pub distributed_storage_config: StorageConfig,
    pub distributed_storage_preference: Vec<String>,
    pub distributed_storage_default_locations: Vec<String>,
    pub feature_storage_replication: bool,
    pub feature_proxy_storage: bool,
}

impl FieldGroup for DistributedStorage {
    const NAME: &'static str = "DistributedStorage";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            distributed_storage_config: storage_config(doc)?,
            distributed_storage_preference: field(doc, &DISTRIBUTED_STORAGE_PREFERENCE)?,
            distributed_storage_default_locations: field(
                doc,
                &DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS,
            )?,
            feature_storage_replication: field(doc, &FEATURE_STORAGE_REPLICATION)?,
            feature_proxy_storage: field(doc, &FEATURE_PROXY_STORAGE)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit_storage_config(&mut out, &self.distributed_storage_config);
        emit(&mut out, &DISTRIBUTED_STORAGE_PREFERENCE, &self.distributed_storage_preference);
        emit(
            &mut out,
            &DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS,
            &self.distributed_storage_default_locations,
        );
        emit(&mut out, &FEATURE_STORAGE_REPLICATION, &self.feature_storage_replication);
        emit(&mut out, &FEATURE_PROXY_STORAGE, &self.feature_proxy_storage);
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        let config = &self.distributed_storage_config;

        if config.is_empty() {
            require_text(&mut errors, Self::NAME, DISTRIBUTED_STORAGE_CONFIG.key, "");
        }
        for (name, definition) in config {
            errors.extend(definition.validate(Self::NAME, name));
        }

        check_locations(
            &mut errors,
            Self::NAME,
            DISTRIBUTED_STORAGE_PREFERENCE.key,
            &self.distributed_storage_preference,
            config,
        );
        check_locations(
            &mut errors,
            Self::NAME,
            DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS.key,
            &self.distributed_storage_default_locations,
            config,
        );

        let has_defaults = !self.distributed_storage_default_locations.is_empty();
        if self.feature_storage_replication && !has_defaults {
            errors.push(ValidationError::new(
                Self::NAME,
                &[FEATURE_STORAGE_REPLICATION.key, DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS.key],
                "FEATURE_STORAGE_REPLICATION requires DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS",
            ));
        }

        errors
    }
}

wire_serde!(DistributedStorage);
