//! Build workers and the `BUILD_MANAGER` tuple.
//!
//! On disk the build manager is `[name, arguments]`:
//!
//! ```yaml
//! BUILD_MANAGER:
//!   - ephemeral
//!   - ALLOWED_WORKER_COUNT: 1
//!     ORCHESTRATOR:
//!       REDIS_HOST: redis.example.com
//!     EXECUTORS:
//!       - EXECUTOR: kubernetes
//!         BUILDER_NAMESPACE: builder
//! ```
//!
//! In memory it is a [`BuildManagerDefinition`] with named fields, and it is
//! written back as the same two-element sequence.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationError,
    ValidationErrors, Value, ValueKind, check_fields, decode_tuple, emit, emit_value, encode_tuple,
    field, nested, nested_list,
};

use super::{FieldGroup, require_text, unclaimed};

/// Executor kinds the build manager knows how to start.
pub const EXECUTOR_KINDS: &[&str] = &["popen", "kubernetes", "kubernetesPodman", "ec2"];

const FEATURE_BUILD_SUPPORT: FieldSpec = FieldSpec::new("FEATURE_BUILD_SUPPORT", ValueKind::Bool)
    .default_to(FieldDefault::Bool(false))
    .always_emit();
const BUILDMAN_HOSTNAME: FieldSpec = FieldSpec::new("BUILDMAN_HOSTNAME", ValueKind::Text);
const BUILD_MANAGER: FieldSpec = FieldSpec::new("BUILD_MANAGER", ValueKind::List);

static FIELDS: &[FieldSpec] = &[FEATURE_BUILD_SUPPORT, BUILDMAN_HOSTNAME, BUILD_MANAGER];

// Arguments of the tuple.
const ALLOWED_WORKER_COUNT: FieldSpec =
    FieldSpec::new("ALLOWED_WORKER_COUNT", ValueKind::Int).always_emit();
const ORCHESTRATOR_PREFIX: FieldSpec = FieldSpec::new("ORCHESTRATOR_PREFIX", ValueKind::Text);
const ORCHESTRATOR: FieldSpec = FieldSpec::new("ORCHESTRATOR", ValueKind::Map).always_emit();
const EXECUTORS: FieldSpec = FieldSpec::new("EXECUTORS", ValueKind::List);

static ARG_FIELDS: &[FieldSpec] = &[
    ALLOWED_WORKER_COUNT,
    ORCHESTRATOR_PREFIX,
    ORCHESTRATOR,
    EXECUTORS,
];

const REDIS_HOST: FieldSpec = FieldSpec::new("REDIS_HOST", ValueKind::Text);
const REDIS_PORT: FieldSpec = FieldSpec::new("REDIS_PORT", ValueKind::Int).always_emit();
const REDIS_PASSWORD: FieldSpec = FieldSpec::new("REDIS_PASSWORD", ValueKind::Text);
const REDIS_SSL: FieldSpec = FieldSpec::new("REDIS_SSL", ValueKind::Bool);
const REDIS_SKIP_KEYSPACE_EVENT_SETUP: FieldSpec =
    FieldSpec::new("REDIS_SKIP_KEYSPACE_EVENT_SETUP", ValueKind::Bool);

static ORCHESTRATOR_FIELDS: &[FieldSpec] = &[
    REDIS_HOST,
    REDIS_PORT,
    REDIS_PASSWORD,
    REDIS_SSL,
    REDIS_SKIP_KEYSPACE_EVENT_SETUP,
];

const EXECUTOR: FieldSpec = FieldSpec::new("EXECUTOR", ValueKind::Text)
    .constrained(&[Constraint::Required, Constraint::OneOf(EXECUTOR_KINDS)]);
const NAME: FieldSpec = FieldSpec::new("NAME", ValueKind::Text);
const BUILDER_NAMESPACE: FieldSpec = FieldSpec::new("BUILDER_NAMESPACE", ValueKind::Text);
const K8S_API_SERVER: FieldSpec = FieldSpec::new("K8S_API_SERVER", ValueKind::Text);
const K8S_API_TLS_CA: FieldSpec = FieldSpec::new("K8S_API_TLS_CA", ValueKind::Text);
const KUBERNETES_DISTRIBUTION: FieldSpec =
    FieldSpec::new("KUBERNETES_DISTRIBUTION", ValueKind::Text);
const VOLUME_SIZE: FieldSpec = FieldSpec::new("VOLUME_SIZE", ValueKind::Text);
const CONTAINER_MEMORY_LIMITS: FieldSpec =
    FieldSpec::new("CONTAINER_MEMORY_LIMITS", ValueKind::Text);
const CONTAINER_CPU_LIMITS: FieldSpec = FieldSpec::new("CONTAINER_CPU_LIMITS", ValueKind::Text);
const CONTAINER_MEMORY_REQUEST: FieldSpec =
    FieldSpec::new("CONTAINER_MEMORY_REQUEST", ValueKind::Text);
const CONTAINER_CPU_REQUEST: FieldSpec = FieldSpec::new("CONTAINER_CPU_REQUEST", ValueKind::Text);
const NODE_SELECTOR_LABEL_KEY: FieldSpec =
    FieldSpec::new("NODE_SELECTOR_LABEL_KEY", ValueKind::Text);
const NODE_SELECTOR_LABEL_VALUE: FieldSpec =
    FieldSpec::new("NODE_SELECTOR_LABEL_VALUE", ValueKind::Text);
const SERVICE_ACCOUNT_NAME: FieldSpec = FieldSpec::new("SERVICE_ACCOUNT_NAME", ValueKind::Text);
const WORKER_IMAGE: FieldSpec = FieldSpec::new("WORKER_IMAGE", ValueKind::Text);
const WORKER_TAG: FieldSpec = FieldSpec::new("WORKER_TAG", ValueKind::Text);
const SETUP_TIME: FieldSpec = FieldSpec::new("SETUP_TIME", ValueKind::Int)
    .constrained(&[Constraint::Range { min: Some(0), max: None }])
    .always_emit();
const MINIMUM_RETRY_THRESHOLD: FieldSpec = FieldSpec::new("MINIMUM_RETRY_THRESHOLD", ValueKind::Int)
    .constrained(&[Constraint::Range { min: Some(0), max: None }])
    .always_emit();
const MAX_LIFETIME_S: FieldSpec = FieldSpec::new("MAX_LIFETIME_S", ValueKind::Int)
    .constrained(&[Constraint::Range { min: Some(0), max: None }])
    .always_emit();
const EC2_REGION: FieldSpec = FieldSpec::new("EC2_REGION", ValueKind::Text);
const COREOS_AMI: FieldSpec = FieldSpec::new("COREOS_AMI", ValueKind::Text);
const EC2_INSTANCE_TYPE: FieldSpec = FieldSpec::new("EC2_INSTANCE_TYPE", ValueKind::Text);
const EC2_VPC_SUBNET_ID: FieldSpec = FieldSpec::new("EC2_VPC_SUBNET_ID", ValueKind::Text);
const EC2_SECURITY_GROUP_IDS: FieldSpec =
    FieldSpec::new("EC2_SECURITY_GROUP_IDS", ValueKind::TextList);
const SSH_AUTHORIZED_KEYS: FieldSpec = FieldSpec::new("SSH_AUTHORIZED_KEYS", ValueKind::TextList);
const DEBUG: FieldSpec = FieldSpec::new("DEBUG", ValueKind::Bool);

static EXECUTOR_FIELDS: &[FieldSpec] = &[
    EXECUTOR,
    NAME,
    BUILDER_NAMESPACE,
    K8S_API_SERVER,
    K8S_API_TLS_CA,
    KUBERNETES_DISTRIBUTION,
    VOLUME_SIZE,
    CONTAINER_MEMORY_LIMITS,
    CONTAINER_CPU_LIMITS,
    CONTAINER_MEMORY_REQUEST,
    CONTAINER_CPU_REQUEST,
    NODE_SELECTOR_LABEL_KEY,
    NODE_SELECTOR_LABEL_VALUE,
    SERVICE_ACCOUNT_NAME,
    WORKER_IMAGE,
    WORKER_TAG,
    SETUP_TIME,
    MINIMUM_RETRY_THRESHOLD,
    MAX_LIFETIME_S,
    EC2_REGION,
    COREOS_AMI,
    EC2_INSTANCE_TYPE,
    EC2_VPC_SUBNET_ID,
    EC2_SECURITY_GROUP_IDS,
    SSH_AUTHORIZED_KEYS,
    DEBUG,
];

/// Redis connection used to coordinate build workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Orchestrator {
    pub redis_host: String,
    pub redis_port: Option<i64>,
    pub redis_password: String,
    pub redis_ssl: bool,
    pub redis_skip_keyspace_event_setup: bool,
    /// Keys this model does not name, kept for the round trip.
    pub extra: Mapping,
}

impl Orchestrator {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            redis_host: field(doc, &REDIS_HOST)?,
            redis_port: field(doc, &REDIS_PORT)?,
            redis_password: field(doc, &REDIS_PASSWORD)?,
            redis_ssl: field(doc, &REDIS_SSL)?,
            redis_skip_keyspace_event_setup: field(doc, &REDIS_SKIP_KEYSPACE_EVENT_SETUP)?,
            extra: unclaimed(doc, ORCHESTRATOR_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &REDIS_HOST, &self.redis_host);
        emit(&mut out, &REDIS_PORT, &self.redis_port);
        emit(&mut out, &REDIS_PASSWORD, &self.redis_password);
        emit(&mut out, &REDIS_SSL, &self.redis_ssl);
        emit(&mut out, &REDIS_SKIP_KEYSPACE_EVENT_SETUP, &self.redis_skip_keyspace_event_setup);
        out
    }
}

/// One way of starting build workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Executor {
    pub executor: String,
    pub name: String,
    pub builder_namespace: String,
    pub k8s_api_server: String,
    pub k8s_api_tls_ca: String,
    pub kubernetes_distribution: String,
    pub volume_size: String,
    pub container_memory_limits: String,
    pub container_cpu_limits: String,
    pub container_memory_request: String,
    pub container_cpu_request: String,
    pub node_selector_label_key: String,
    pub node_selector_label_value: String,
    pub service_account_name: String,
    pub worker_image: String,
    pub worker_tag: String,
    pub setup_time: Option<i64>,
    pub minimum_retry_threshold: Option<i64>,
    pub max_lifetime_s: Option<i64>,
    pub ec2_region: String,
    pub coreos_ami: String,
    pub ec2_instance_type: String,
    pub ec2_vpc_subnet_id: String,
    pub ec2_security_group_ids: Vec<String>,
    pub ssh_authorized_keys: Vec<String>,
    pub debug: bool,
    pub extra: Mapping,
}

impl Executor {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            executor: field(doc, &EXECUTOR)?,
            name: field(doc, &NAME)?,
            builder_namespace: field(doc, &BUILDER_NAMESPACE)?,
            k8s_api_server: field(doc, &K8S_API_SERVER)?,
            k8s_api_tls_ca: field(doc, &K8S_API_TLS_CA)?,
            kubernetes_distribution: field(doc, &KUBERNETES_DISTRIBUTION)?,
            volume_size: field(doc, &VOLUME_SIZE)?,
            container_memory_limits: field(doc, &CONTAINER_MEMORY_LIMITS)?,
            container_cpu_limits: field(doc, &CONTAINER_CPU_LIMITS)?,
            container_memory_request: field(doc, &CONTAINER_MEMORY_REQUEST)?,
            container_cpu_request: field(doc, &CONTAINER_CPU_REQUEST)?,
            node_selector_label_key: field(doc, &NODE_SELECTOR_LABEL_KEY)?,
            node_selector_label_value: field(doc, &NODE_SELECTOR_LABEL_VALUE)?,
            service_account_name: field(doc, &SERVICE_ACCOUNT_NAME)?,
            worker_image: field(doc, &WORKER_IMAGE)?,
            worker_tag: field(doc, &WORKER_TAG)?,
            setup_time: field(doc, &SETUP_TIME)?,
            minimum_retry_threshold: field(doc, &MINIMUM_RETRY_THRESHOLD)?,
            max_lifetime_s: field(doc, &MAX_LIFETIME_S)?,
            ec2_region: field(doc, &EC2_REGION)?,
            coreos_ami: field(doc, &COREOS_AMI)?,
            ec2_instance_type: field(doc, &EC2_INSTANCE_TYPE)?,
            ec2_vpc_subnet_id: field(doc, &EC2_VPC_SUBNET_ID)?,
            ec2_security_group_ids: field(doc, &EC2_SECURITY_GROUP_IDS)?,
            ssh_authorized_keys: field(doc, &SSH_AUTHORIZED_KEYS)?,
            debug: field(doc, &DEBUG)?,
            extra: unclaimed(doc, EXECUTOR_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &EXECUTOR, &self.executor);
        emit(&mut out, &NAME, &self.name);
        emit(&mut out, &BUILDER_NAMESPACE, &self.builder_namespace);
        emit(&mut out, &K8S_API_SERVER, &self.k8s_api_server);
        emit(&mut out, &K8S_API_TLS_CA, &self.k8s_api_tls_ca);
        emit(&mut out, &KUBERNETES_DISTRIBUTION, &self.kubernetes_distribution);
        emit(&mut out, &VOLUME_SIZE, &self.volume_size);
        emit(&mut out, &CONTAINER_MEMORY_LIMITS, &self.container_memory_limits);
        emit(&mut out, &CONTAINER_CPU_LIMITS, &self.container_cpu_limits);
        emit(&mut out, &CONTAINER_MEMORY_REQUEST, &self.container_memory_request);
        emit(&mut out, &CONTAINER_CPU_REQUEST, &self.container_cpu_request);
        emit(&mut out, &NODE_SELECTOR_LABEL_KEY, &self.node_selector_label_key);
        emit(&mut out, &NODE_SELECTOR_LABEL_VALUE, &self.node_selector_label_value);
        emit(&mut out, &SERVICE_ACCOUNT_NAME, &self.service_account_name);
        emit(&mut out, &WORKER_IMAGE, &self.worker_image);
        emit(&mut out, &WORKER_TAG, &self.worker_tag);
        emit(&mut out, &SETUP_TIME, &self.setup_time);
        emit(&mut out, &MINIMUM_RETRY_THRESHOLD, &self.minimum_retry_threshold);
        emit(&mut out, &MAX_LIFETIME_S, &self.max_lifetime_s);
        emit(&mut out, &EC2_REGION, &self.ec2_region);
        emit(&mut out, &COREOS_AMI, &self.coreos_ami);
        emit(&mut out, &EC2_INSTANCE_TYPE, &self.ec2_instance_type);
        emit(&mut out, &EC2_VPC_SUBNET_ID, &self.ec2_vpc_subnet_id);
        emit(&mut out, &EC2_SECURITY_GROUP_IDS, &self.ec2_security_group_ids);
        emit(&mut out, &SSH_AUTHORIZED_KEYS, &self.ssh_authorized_keys);
        emit(&mut out, &DEBUG, &self.debug);
        out
    }
}

/// Arguments half of the build manager tuple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildManagerArgs {
    pub allowed_worker_count: Option<i64>,
    pub orchestrator_prefix: String,
    pub orchestrator: Option<Orchestrator>,
    pub executors: Vec<Executor>,
    pub extra: Mapping,
}

impl BuildManagerArgs {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            allowed_worker_count: field(doc, &ALLOWED_WORKER_COUNT)?,
            orchestrator_prefix: field(doc, &ORCHESTRATOR_PREFIX)?,
            orchestrator: nested(doc, &ORCHESTRATOR, Orchestrator::from_mapping)?,
            executors: nested_list(doc, &EXECUTORS, Executor::from_mapping)?,
            extra: unclaimed(doc, ARG_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &ALLOWED_WORKER_COUNT, &self.allowed_worker_count);
        emit(&mut out, &ORCHESTRATOR_PREFIX, &self.orchestrator_prefix);
        if let Some(orchestrator) = &self.orchestrator {
            emit_value(&mut out, &ORCHESTRATOR, Value::Map(orchestrator.to_mapping()));
        }
        let executors = self.executors.iter().map(|e| Value::Map(e.to_mapping())).collect();
        emit_value(&mut out, &EXECUTORS, Value::List(executors));
        out
    }
}

/// The decoded `[name, arguments]` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildManagerDefinition {
    pub name: String,
    pub args: BuildManagerArgs,
}

impl BuildManagerDefinition {
    /// Decode the tuple form. Errors inside the arguments are keyed under `key`.
    pub fn decode(key: &str, value: &Value) -> ConstructResult<Self> {
        let (name, args) = decode_tuple(key, value)?;
        let args = BuildManagerArgs::from_mapping(args).map_err(|err| err.within(key))?;
        Ok(Self {
            name: name.to_string(),
            args,
        })
    }

    /// Encode back into the two-element sequence.
    pub fn encode(&self) -> Value {
        encode_tuple(&self.name, self.args.to_mapping())
    }
}

/// The `BuildManager` field group.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildManager {
    pub feature_build_support: bool,
    pub buildman_hostname: String,
    pub build_manager: Option<BuildManagerDefinition>,
}

impl FieldGroup for BuildManager {
    const NAME: &'static str = "BuildManager";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        let build_manager = match doc.get(BUILD_MANAGER.key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(BuildManagerDefinition::decode(BUILD_MANAGER.key, value)?),
        };
        Ok(Self {
            feature_build_support: field(doc, &FEATURE_BUILD_SUPPORT)?,
            buildman_hostname: field(doc, &BUILDMAN_HOSTNAME)?,
            build_manager,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &FEATURE_BUILD_SUPPORT, &self.feature_build_support);
        emit(&mut out, &BUILDMAN_HOSTNAME, &self.buildman_hostname);
        if let Some(definition) = &self.build_manager {
            emit_value(&mut out, &BUILD_MANAGER, definition.encode());
        }
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        if !self.feature_build_support {
            return errors;
        }

        require_text(&mut errors, Self::NAME, BUILDMAN_HOSTNAME.key, &self.buildman_hostname);
        match &self.build_manager {
            Some(definition) => errors.extend(validate_definition(definition)),
            None => errors.push(ValidationError::new(
                Self::NAME,
                &[BUILD_MANAGER.key],
                "BUILD_MANAGER is required",
            )),
        }
        errors
    }
}

fn validate_definition(definition: &BuildManagerDefinition) -> ValidationErrors {
    let group = BuildManager::NAME;
    let mut errors = ValidationErrors::new();

    if definition.name != "ephemeral" {
        errors.push(ValidationError::new(
            group,
            &[BUILD_MANAGER.key],
            format!("BUILD_MANAGER must use the ephemeral manager, found {:?}", definition.name),
        ));
    }

    let redis_host = definition
        .args
        .orchestrator
        .as_ref()
        .map(|o| o.redis_host.as_str())
        .unwrap_or_default();
    require_text(&mut errors, group, "BUILD_MANAGER.ORCHESTRATOR.REDIS_HOST", redis_host);

    if definition.args.executors.is_empty() {
        errors.push(ValidationError::new(
            group,
            &["BUILD_MANAGER.EXECUTORS"],
            "BUILD_MANAGER.EXECUTORS must contain at least one executor",
        ));
    }

    for (i, executor) in definition.args.executors.iter().enumerate() {
        let prefix = format!("BUILD_MANAGER.EXECUTORS[{i}]");
        for error in check_fields(group, EXECUTOR_FIELDS, &executor.to_mapping()) {
            let tag = format!("{prefix}.{}", error.tags.join(","));
            errors.push(ValidationError::new(
                group,
                &[tag.as_str()],
                format!("{prefix}.{}", error.message),
            ));
        }

        let mut need = |key: &str, value: &str| {
            require_text(&mut errors, group, &format!("{prefix}.{key}"), value);
        };
        match executor.executor.as_str() {
            "kubernetes" | "kubernetesPodman" => {
                need(BUILDER_NAMESPACE.key, &executor.builder_namespace);
            }
            "ec2" => {
                need(EC2_REGION.key, &executor.ec2_region);
                need(COREOS_AMI.key, &executor.coreos_ami);
            }
            _ => {}
        }
    }

    errors
}

wire_serde!(BuildManager);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{into_document, parse_yaml};
    use proptest::prelude::*;
    use quaycfg_core::ConstructError;

    fn doc(yaml: &str) -> Mapping {
        into_document(parse_yaml(yaml).unwrap()).unwrap()
    }

    const ENABLED: &str = r#"
FEATURE_BUILD_SUPPORT: true
BUILDMAN_HOSTNAME: builds.example.com:8443
BUILD_MANAGER:
  - ephemeral
  - ALLOWED_WORKER_COUNT: 1
    ORCHESTRATOR_PREFIX: buildman/production/
    ORCHESTRATOR:
      REDIS_HOST: redis.example.com
      REDIS_PASSWORD: secret
      REDIS_SSL: true
    EXECUTORS:
      - EXECUTOR: kubernetesPodman
        NAME: openshift
        BUILDER_NAMESPACE: builder
        SETUP_TIME: 180
        MINIMUM_RETRY_THRESHOLD: 0
        CPU_LIMITS_EXTRA: keep-me
"#;

    #[test]
    fn test_decodes_tuple() {
        let group = BuildManager::from_document(&doc(ENABLED)).unwrap();
        let definition = group.build_manager.as_ref().unwrap();
        assert_eq!(definition.name, "ephemeral");
        assert_eq!(definition.args.allowed_worker_count, Some(1));
        assert_eq!(definition.args.orchestrator.as_ref().unwrap().redis_host, "redis.example.com");
        let executor = &definition.args.executors[0];
        assert_eq!(executor.executor, "kubernetesPodman");
        assert_eq!(executor.setup_time, Some(180));
        assert_eq!(executor.minimum_retry_threshold, Some(0));
        assert_eq!(executor.extra["CPU_LIMITS_EXTRA"], Value::from("keep-me"));
        assert!(group.validate().is_empty());
    }

    #[test]
    fn test_wire_form_is_a_tuple() {
        let group = BuildManager::from_document(&doc(ENABLED)).unwrap();
        let wire = group.to_document();
        let tuple = wire["BUILD_MANAGER"].as_list().unwrap();
        assert_eq!(tuple.len(), 2);
        assert_eq!(tuple[0], Value::from("ephemeral"));
        let args = tuple[1].as_map().unwrap();
        assert_eq!(args["EXECUTORS"].as_list().unwrap().len(), 1);

        assert_eq!(BuildManager::from_document(&wire).unwrap(), group);
    }

    #[test]
    fn test_keyed_object_is_malformed() {
        let err = BuildManager::from_document(&doc(
            "BUILD_MANAGER:\n  name: ephemeral\n  args: {}\n",
        ))
        .unwrap_err();
        assert!(matches!(err, ConstructError::MalformedTuple { .. }));
        assert_eq!(err.field(), "BUILD_MANAGER");
    }

    #[test]
    fn test_three_elements_are_malformed() {
        let err =
            BuildManager::from_document(&doc("BUILD_MANAGER: [ephemeral, {}, {}]\n")).unwrap_err();
        assert_eq!(
            err,
            ConstructError::malformed_tuple("BUILD_MANAGER", "expected 2 elements, found 3")
        );
    }

    #[test]
    fn test_nested_type_error_names_path() {
        let err = BuildManager::from_document(&doc(
            r#"
BUILD_MANAGER:
  - ephemeral
  - EXECUTORS:
      - EXECUTOR: popen
      - SETUP_TIME: '180'
"#,
        ))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "BUILD_MANAGER.EXECUTORS[1].SETUP_TIME must be of type integer"
        );
    }

    #[test]
    fn test_disabled_builds_skip_cross_checks() {
        let group = BuildManager::from_document(&Mapping::new()).unwrap();
        assert!(!group.feature_build_support);
        assert!(group.validate().is_empty());
    }

    #[test]
    fn test_enabled_builds_require_manager() {
        let group = BuildManager::from_document(&doc("FEATURE_BUILD_SUPPORT: true\n")).unwrap();
        let messages: Vec<_> = group.validate().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["BUILDMAN_HOSTNAME is required", "BUILD_MANAGER is required"]);
    }

    #[test]
    fn test_executor_rules() {
        let group = BuildManager::from_document(&doc(
            r#"
FEATURE_BUILD_SUPPORT: true
BUILDMAN_HOSTNAME: builds.example.com
BUILD_MANAGER:
  - enterprise
  - EXECUTORS:
      - EXECUTOR: kubernetes
      - EXECUTOR: ec2
        EC2_REGION: us-east-1
      - EXECUTOR: docker
"#,
        ))
        .unwrap();
        let messages: Vec<_> = group.validate().into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            vec![
                r#"BUILD_MANAGER must use the ephemeral manager, found "enterprise""#,
                "BUILD_MANAGER.ORCHESTRATOR.REDIS_HOST is required",
                "BUILD_MANAGER.EXECUTORS[0].BUILDER_NAMESPACE is required",
                "BUILD_MANAGER.EXECUTORS[1].COREOS_AMI is required",
                "BUILD_MANAGER.EXECUTORS[2].EXECUTOR must be one of popen, kubernetes, \
                 kubernetesPodman, ec2",
            ]
        );
    }

    fn arb_text() -> impl Strategy<Value = String> {
        "[a-z0-9./-]{0,12}"
    }

    /// Unclaimed keys are lowercase, so they never collide with a descriptor.
    fn arb_extra(size: std::ops::Range<usize>) -> impl Strategy<Value = Mapping> {
        let value = prop_oneof![
            arb_text().prop_map(Value::Text),
            any::<i64>().prop_map(Value::Int),
            any::<bool>().prop_map(Value::Bool),
            prop::collection::vec(arb_text().prop_map(Value::Text), 0..3).prop_map(Value::List),
        ];
        prop::collection::btree_map("x_[a-z_]{1,10}", value, size)
    }

    fn arb_executor() -> impl Strategy<Value = Executor> {
        let kind = prop_oneof![
            prop::sample::select(EXECUTOR_KINDS).prop_map(str::to_string),
            arb_text(),
        ];
        let kubernetes = (arb_text(), arb_text(), arb_text(), arb_text(), arb_text());
        let ec2 = (arb_text(), arb_text(), arb_text(), prop::collection::vec(arb_text(), 0..3));
        let timing = (
            prop::option::of(0..3600_i64),
            prop::option::of(0..10_i64),
            prop::option::of(0..86_400_i64),
        );
        (
            kind,
            arb_text(),
            kubernetes,
            ec2,
            timing,
            prop::collection::vec(arb_text(), 0..3),
            any::<bool>(),
            arb_extra(0..3),
        )
            .prop_map(
                |(
                    executor,
                    name,
                    (builder_namespace, kubernetes_distribution, volume_size, memory, cpu),
                    (ec2_region, coreos_ami, ec2_instance_type, ec2_security_group_ids),
                    (setup_time, minimum_retry_threshold, max_lifetime_s),
                    ssh_authorized_keys,
                    debug,
                    extra,
                )| Executor {
                    executor,
                    name,
                    builder_namespace,
                    kubernetes_distribution,
                    volume_size,
                    container_memory_limits: memory,
                    container_cpu_limits: cpu,
                    setup_time,
                    minimum_retry_threshold,
                    max_lifetime_s,
                    ec2_region,
                    coreos_ami,
                    ec2_instance_type,
                    ec2_security_group_ids,
                    ssh_authorized_keys,
                    debug,
                    extra,
                    ..Executor::default()
                },
            )
    }

    fn arb_orchestrator() -> impl Strategy<Value = Orchestrator> {
        (
            arb_text(),
            prop::option::of(0..65536_i64),
            arb_text(),
            any::<bool>(),
            any::<bool>(),
            arb_extra(0..2),
        )
            .prop_map(
                |(redis_host, redis_port, redis_password, redis_ssl, skip_setup, extra)| {
                    Orchestrator {
                        redis_host,
                        redis_port,
                        redis_password,
                        redis_ssl,
                        redis_skip_keyspace_event_setup: skip_setup,
                        extra,
                    }
                },
            )
    }

    fn arb_definition() -> impl Strategy<Value = BuildManagerDefinition> {
        (
            arb_text(),
            prop::option::of(0..16_i64),
            arb_text(),
            prop::option::of(arb_orchestrator()),
            prop::collection::vec(arb_executor(), 0..4),
            arb_extra(1..4),
        )
            .prop_map(
                |(name, allowed_worker_count, prefix, orchestrator, executors, extra)| {
                    BuildManagerDefinition {
                        name,
                        args: BuildManagerArgs {
                            allowed_worker_count,
                            orchestrator_prefix: prefix,
                            orchestrator,
                            executors,
                            extra,
                        },
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn test_tuple_round_trip(definition in arb_definition()) {
            let encoded = definition.encode();
            let decoded = BuildManagerDefinition::decode("BUILD_MANAGER", &encoded).unwrap();
            prop_assert!(!decoded.args.extra.is_empty());
            prop_assert_eq!(decoded, definition);
        }
    }
}
