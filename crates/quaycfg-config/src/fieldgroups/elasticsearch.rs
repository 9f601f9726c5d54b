//! Action log storage model and its Elasticsearch, Kafka and Kinesis settings.

use quaycfg_core::{
    Constraint, ConstructResult, FieldDefault, FieldSpec, Mapping, ValidationError,
    ValidationErrors, Value, ValueKind, check_fields, emit, emit_value, field, nested,
};

use super::{FieldGroup, nested_errors, unclaimed};

const LOGS_MODELS: &[&str] =
    &["database", "transition_reads_both_writes_es", "elasticsearch", "splunk"];
const PRODUCERS: &[&str] = &["kafka", "elasticsearch", "kinesis_stream", "splunk", "splunk_hec"];

/// Models that keep action logs in an Elasticsearch cluster.
const DOCUMENT_MODELS: &[&str] = &["elasticsearch", "transition_reads_both_writes_es"];

const PORT_RANGE: Constraint = Constraint::Range { min: Some(1), max: Some(65535) };

const LOGS_MODEL: FieldSpec = FieldSpec::new("LOGS_MODEL", ValueKind::Text)
    .default_to(FieldDefault::Text("database"))
    .constrained(&[Constraint::OneOf(LOGS_MODELS)])
    .always_emit();
const LOGS_MODEL_CONFIG: FieldSpec =
    FieldSpec::new("LOGS_MODEL_CONFIG", ValueKind::Map).always_emit();

static FIELDS: &[FieldSpec] = &[LOGS_MODEL, LOGS_MODEL_CONFIG];

const KAFKA_CONFIG: FieldSpec = FieldSpec::new("kafka_config", ValueKind::Map).always_emit();
const ELASTICSEARCH_CONFIG: FieldSpec =
    FieldSpec::new("elasticsearch_config", ValueKind::Map).always_emit();
const KINESIS_STREAM_CONFIG: FieldSpec =
    FieldSpec::new("kinesis_stream_config", ValueKind::Map).always_emit();
const PRODUCER: FieldSpec =
    FieldSpec::new("producer", ValueKind::Text).constrained(&[Constraint::OneOf(PRODUCERS)]);

static CONFIG_FIELDS: &[FieldSpec] =
    &[KAFKA_CONFIG, ELASTICSEARCH_CONFIG, KINESIS_STREAM_CONFIG, PRODUCER];

// kafka_config
const TOPIC: FieldSpec = FieldSpec::new("topic", ValueKind::Text);
const BOOTSTRAP_SERVERS: FieldSpec = FieldSpec::new("bootstrap_servers", ValueKind::List);
const MAX_BLOCK_SECONDS: FieldSpec =
    FieldSpec::new("max_block_seconds", ValueKind::Int).always_emit();

static KAFKA_FIELDS: &[FieldSpec] = &[TOPIC, BOOTSTRAP_SERVERS, MAX_BLOCK_SECONDS];

// elasticsearch_config
const HOST: FieldSpec = FieldSpec::new("host", ValueKind::Text);
const PORT: FieldSpec =
    FieldSpec::new("port", ValueKind::Int).constrained(&[PORT_RANGE]).always_emit();
const AWS_REGION: FieldSpec = FieldSpec::new("aws_region", ValueKind::Text);
const ACCESS_KEY: FieldSpec = FieldSpec::new("access_key", ValueKind::Text);
const SECRET_KEY: FieldSpec = FieldSpec::new("secret_key", ValueKind::Text);
const INDEX_PREFIX: FieldSpec = FieldSpec::new("index_prefix", ValueKind::Text)
    .default_to(FieldDefault::Text("logentry_"))
    .always_emit();
const INDEX_SETTINGS: FieldSpec = FieldSpec::new("index_settings", ValueKind::Map);
const USE_SSL: FieldSpec = FieldSpec::new("use_ssl", ValueKind::Bool)
    .default_to(FieldDefault::Bool(true))
    .always_emit();

static ELASTICSEARCH_FIELDS: &[FieldSpec] = &[
    HOST,
    PORT,
    AWS_REGION,
    ACCESS_KEY,
    SECRET_KEY,
    INDEX_PREFIX,
    INDEX_SETTINGS,
    USE_SSL,
];

// kinesis_stream_config
const STREAM_NAME: FieldSpec = FieldSpec::new("stream_name", ValueKind::Text);
const KINESIS_AWS_REGION: FieldSpec = FieldSpec::new("aws_region", ValueKind::Text);
const AWS_ACCESS_KEY: FieldSpec = FieldSpec::new("aws_access_key", ValueKind::Text);
const AWS_SECRET_KEY: FieldSpec = FieldSpec::new("aws_secret_key", ValueKind::Text);
const RETRIES: FieldSpec = FieldSpec::new("retries", ValueKind::Int).always_emit();
const READ_TIMEOUT: FieldSpec = FieldSpec::new("read_timeout", ValueKind::Int).always_emit();
const CONNECT_TIMEOUT: FieldSpec = FieldSpec::new("connect_timeout", ValueKind::Int).always_emit();
const MAX_POOL_CONNECTIONS: FieldSpec =
    FieldSpec::new("max_pool_connections", ValueKind::Int).always_emit();

static KINESIS_FIELDS: &[FieldSpec] = &[
    STREAM_NAME,
    KINESIS_AWS_REGION,
    AWS_ACCESS_KEY,
    AWS_SECRET_KEY,
    RETRIES,
    READ_TIMEOUT,
    CONNECT_TIMEOUT,
    MAX_POOL_CONNECTIONS,
];

/// Kafka producer settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KafkaConfig {
    pub topic: String,
    /// `host:port` strings, kept as written.
    pub bootstrap_servers: Vec<Value>,
    pub max_block_seconds: Option<i64>,
    pub extra: Mapping,
}

impl KafkaConfig {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            topic: field(doc, &TOPIC)?,
            bootstrap_servers: field(doc, &BOOTSTRAP_SERVERS)?,
            max_block_seconds: field(doc, &MAX_BLOCK_SECONDS)?,
            extra: unclaimed(doc, KAFKA_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &TOPIC, &self.topic);
        emit(&mut out, &BOOTSTRAP_SERVERS, &self.bootstrap_servers);
        emit(&mut out, &MAX_BLOCK_SECONDS, &self.max_block_seconds);
        out
    }
}

/// Connection to the Elasticsearch cluster that stores the logs.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticsearchConfig {
    pub host: String,
    pub port: Option<i64>,
    pub aws_region: String,
    pub access_key: String,
    pub secret_key: String,
    pub index_prefix: String,
    pub index_settings: Mapping,
    pub use_ssl: bool,
    pub extra: Mapping,
}

impl ElasticsearchConfig {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            host: field(doc, &HOST)?,
            port: field(doc, &PORT)?,
            aws_region: field(doc, &AWS_REGION)?,
            access_key: field(doc, &ACCESS_KEY)?,
            secret_key: field(doc, &SECRET_KEY)?,
            index_prefix: field(doc, &INDEX_PREFIX)?,
            index_settings: field(doc, &INDEX_SETTINGS)?,
            use_ssl: field(doc, &USE_SSL)?,
            extra: unclaimed(doc, ELASTICSEARCH_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &HOST, &self.host);
        emit(&mut out, &PORT, &self.port);
        emit(&mut out, &AWS_REGION, &self.aws_region);
        emit(&mut out, &ACCESS_KEY, &self.access_key);
        emit(&mut out, &SECRET_KEY, &self.secret_key);
        emit(&mut out, &INDEX_PREFIX, &self.index_prefix);
        emit(&mut out, &INDEX_SETTINGS, &self.index_settings);
        emit(&mut out, &USE_SSL, &self.use_ssl);
        out
    }
}

/// Kinesis stream producer settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KinesisStreamConfig {
    pub stream_name: String,
    pub aws_region: String,
    pub aws_access_key: String,
    pub aws_secret_key: String,
    pub retries: Option<i64>,
    pub read_timeout: Option<i64>,
    pub connect_timeout: Option<i64>,
    pub max_pool_connections: Option<i64>,
    pub extra: Mapping,
}

impl KinesisStreamConfig {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            stream_name: field(doc, &STREAM_NAME)?,
            aws_region: field(doc, &KINESIS_AWS_REGION)?,
            aws_access_key: field(doc, &AWS_ACCESS_KEY)?,
            aws_secret_key: field(doc, &AWS_SECRET_KEY)?,
            retries: field(doc, &RETRIES)?,
            read_timeout: field(doc, &READ_TIMEOUT)?,
            connect_timeout: field(doc, &CONNECT_TIMEOUT)?,
            max_pool_connections: field(doc, &MAX_POOL_CONNECTIONS)?,
            extra: unclaimed(doc, KINESIS_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        emit(&mut out, &STREAM_NAME, &self.stream_name);
        emit(&mut out, &KINESIS_AWS_REGION, &self.aws_region);
        emit(&mut out, &AWS_ACCESS_KEY, &self.aws_access_key);
        emit(&mut out, &AWS_SECRET_KEY, &self.aws_secret_key);
        emit(&mut out, &RETRIES, &self.retries);
        emit(&mut out, &READ_TIMEOUT, &self.read_timeout);
        emit(&mut out, &CONNECT_TIMEOUT, &self.connect_timeout);
        emit(&mut out, &MAX_POOL_CONNECTIONS, &self.max_pool_connections);
        out
    }
}

/// Everything under `LOGS_MODEL_CONFIG`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogsModelConfig {
    pub kafka_config: Option<KafkaConfig>,
    pub elasticsearch_config: Option<ElasticsearchConfig>,
    pub kinesis_stream_config: Option<KinesisStreamConfig>,
    pub producer: String,
    pub extra: Mapping,
}

impl LogsModelConfig {
    fn from_mapping(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            kafka_config: nested(doc, &KAFKA_CONFIG, KafkaConfig::from_mapping)?,
            elasticsearch_config: nested(
                doc,
                &ELASTICSEARCH_CONFIG,
                ElasticsearchConfig::from_mapping,
            )?,
            kinesis_stream_config: nested(
                doc,
                &KINESIS_STREAM_CONFIG,
                KinesisStreamConfig::from_mapping,
            )?,
            producer: field(doc, &PRODUCER)?,
            extra: unclaimed(doc, CONFIG_FIELDS),
        })
    }

    fn to_mapping(&self) -> Mapping {
        let mut out = self.extra.clone();
        if let Some(kafka) = &self.kafka_config {
            emit_value(&mut out, &KAFKA_CONFIG, Value::Map(kafka.to_mapping()));
        }
        if let Some(elasticsearch) = &self.elasticsearch_config {
            emit_value(&mut out, &ELASTICSEARCH_CONFIG, Value::Map(elasticsearch.to_mapping()));
        }
        if let Some(kinesis) = &self.kinesis_stream_config {
            emit_value(&mut out, &KINESIS_STREAM_CONFIG, Value::Map(kinesis.to_mapping()));
        }
        emit(&mut out, &PRODUCER, &self.producer);
        out
    }

    fn validate(&self, group: &str) -> ValidationErrors {
        let mut errors = check_fields(group, CONFIG_FIELDS, &self.to_mapping());
        if let Some(kafka) = &self.kafka_config {
            let inner = check_fields(group, KAFKA_FIELDS, &kafka.to_mapping());
            errors.extend(nested_errors(group, KAFKA_CONFIG.key, inner));
        }
        if let Some(elasticsearch) = &self.elasticsearch_config {
            let inner = check_fields(group, ELASTICSEARCH_FIELDS, &elasticsearch.to_mapping());
            errors.extend(nested_errors(group, ELASTICSEARCH_CONFIG.key, inner));
        }
        if let Some(kinesis) = &self.kinesis_stream_config {
            let inner = check_fields(group, KINESIS_FIELDS, &kinesis.to_mapping());
            errors.extend(nested_errors(group, KINESIS_STREAM_CONFIG.key, inner));
        }
        errors
    }

    /// Blocks an Elasticsearch-backed model cannot start without.
    fn missing_for_documents(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.elasticsearch_config.is_none() {
            missing.push(ELASTICSEARCH_CONFIG.key);
        }
        match self.producer.as_str() {
            "" => missing.push(PRODUCER.key),
            "kafka" if self.kafka_config.is_none() => missing.push(KAFKA_CONFIG.key),
            "kinesis_stream" if self.kinesis_stream_config.is_none() => {
                missing.push(KINESIS_STREAM_CONFIG.key)
            }
            _ => {}
        }
        missing
    }
}

/// The `Elasticsearch` field group.
#[derive(Debug, Clone, PartialEq)]
pub struct Elasticsearch {
    pub logs_model: String,
    pub logs_model_config: Option<LogsModelConfig>,
}

impl FieldGroup for Elasticsearch {
    const NAME: &'static str = "Elasticsearch";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_document(doc: &Mapping) -> ConstructResult<Self> {
        Ok(Self {
            logs_model: field(doc, &LOGS_MODEL)?,
            logs_model_config: nested(doc, &LOGS_MODEL_CONFIG, LogsModelConfig::from_mapping)?,
        })
    }

    fn to_document(&self) -> Mapping {
        let mut out = Mapping::new();
        emit(&mut out, &LOGS_MODEL, &self.logs_model);
        if let Some(config) = &self.logs_model_config {
            emit_value(&mut out, &LOGS_MODEL_CONFIG, Value::Map(config.to_mapping()));
        }
        out
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = check_fields(Self::NAME, FIELDS, &self.to_document());
        if let Some(config) = &self.logs_model_config {
            let inner = config.validate(Self::NAME);
            errors.extend(nested_errors(Self::NAME, LOGS_MODEL_CONFIG.key, inner));
        }

        if DOCUMENT_MODELS.contains(&self.logs_model.as_str()) {
            let missing = match &self.logs_model_config {
                Some(config) => config.missing_for_documents(),
                None => vec![LOGS_MODEL_CONFIG.key],
            };
            for key in missing {
                let tag = if key == LOGS_MODEL_CONFIG.key {
                    key.to_string()
                } else {
                    format!("{}.{key}", LOGS_MODEL_CONFIG.key)
                };
                errors.push(ValidationError::new(
                    Self::NAME,
                    &[tag.as_str()],
                    format!("{tag} is required when LOGS_MODEL is {}", self.logs_model),
                ));
            }
        }
        errors
    }
}

wire_serde!(Elasticsearch);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{into_document, parse_yaml};

    fn doc(yaml: &str) -> Mapping {
        into_document(parse_yaml(yaml).unwrap()).unwrap()
    }

    fn messages(yaml: &str) -> Vec<String> {
        let group = Elasticsearch::from_document(&doc(yaml)).unwrap();
        group.validate().into_iter().map(|e| e.message).collect()
    }

    const KAFKA_LOGS: &str = r#"
LOGS_MODEL: elasticsearch
LOGS_MODEL_CONFIG:
  producer: kafka
  kafka_config:
    topic: quay-logs
    bootstrap_servers: ["kafka-0:9092", "kafka-1:9092"]
    max_block_seconds: 0
    compression_type: gzip
  elasticsearch_config:
    host: es.example.com
    port: 9200
    use_ssl: false
    index_settings:
      number_of_shards: 3
"#;

    #[test]
    fn test_defaults() {
        let group = Elasticsearch::from_document(&Mapping::new()).unwrap();
        assert_eq!(group.logs_model, "database");
        assert!(group.logs_model_config.is_none());
        assert!(group.validate().is_empty());
        assert_eq!(group.to_document()["LOGS_MODEL"], Value::from("database"));
    }

    #[test]
    fn test_nested_producer_configs() {
        let group = Elasticsearch::from_document(&doc(KAFKA_LOGS)).unwrap();
        let config = group.logs_model_config.as_ref().unwrap();
        assert_eq!(config.producer, "kafka");

        let kafka = config.kafka_config.as_ref().unwrap();
        assert_eq!(kafka.topic, "quay-logs");
        assert_eq!(kafka.bootstrap_servers.len(), 2);
        assert_eq!(kafka.max_block_seconds, Some(0));
        assert_eq!(kafka.extra["compression_type"], Value::from("gzip"));

        let elasticsearch = config.elasticsearch_config.as_ref().unwrap();
        assert_eq!(elasticsearch.port, Some(9200));
        assert_eq!(elasticsearch.index_prefix, "logentry_");
        assert!(!elasticsearch.use_ssl);
        assert_eq!(elasticsearch.index_settings["number_of_shards"], Value::Int(3));

        assert!(config.kinesis_stream_config.is_none());
        assert!(group.validate().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let group = Elasticsearch::from_document(&doc(KAFKA_LOGS)).unwrap();
        let wire = group.to_document();
        assert_eq!(Elasticsearch::from_document(&wire).unwrap(), group);

        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["LOGS_MODEL_CONFIG"]["elasticsearch_config"]["use_ssl"], false);
        assert_eq!(
            json["LOGS_MODEL_CONFIG"]["elasticsearch_config"]["index_prefix"],
            "logentry_"
        );
        assert_eq!(json["LOGS_MODEL_CONFIG"]["kafka_config"]["max_block_seconds"], 0);
        let back: Elasticsearch = serde_json::from_value(json).unwrap();
        assert_eq!(back, group);
    }

    #[test]
    fn test_kinesis_round_trip() {
        let group = Elasticsearch::from_document(&doc(
            r#"
LOGS_MODEL: transition_reads_both_writes_es
LOGS_MODEL_CONFIG:
  producer: kinesis_stream
  elasticsearch_config: {}
  kinesis_stream_config:
    stream_name: quay-logs
    aws_region: us-east-1
    retries: 3
    connect_timeout: 5
"#,
        ))
        .unwrap();
        let config = group.logs_model_config.as_ref().unwrap();
        let kinesis = config.kinesis_stream_config.as_ref().unwrap();
        assert_eq!(kinesis.retries, Some(3));
        assert_eq!(kinesis.read_timeout, None);
        assert!(config.elasticsearch_config.as_ref().unwrap().use_ssl);
        assert!(group.validate().is_empty());
        assert_eq!(Elasticsearch::from_document(&group.to_document()).unwrap(), group);
    }

    #[test]
    fn test_unknown_model_and_producer() {
        let yaml = "LOGS_MODEL: cloudwatch\nLOGS_MODEL_CONFIG:\n  producer: fluentd\n";
        assert_eq!(
            messages(yaml),
            vec![
                "LOGS_MODEL must be one of database, transition_reads_both_writes_es, \
                 elasticsearch, splunk",
                "LOGS_MODEL_CONFIG.producer must be one of kafka, elasticsearch, \
                 kinesis_stream, splunk, splunk_hec",
            ]
        );
    }

    #[test]
    fn test_document_model_requires_config() {
        assert_eq!(
            messages("LOGS_MODEL: elasticsearch\n"),
            vec!["LOGS_MODEL_CONFIG is required when LOGS_MODEL is elasticsearch"]
        );
        let yaml = "LOGS_MODEL: elasticsearch\nLOGS_MODEL_CONFIG:\n  producer: kafka\n";
        assert_eq!(
            messages(yaml),
            vec![
                "LOGS_MODEL_CONFIG.elasticsearch_config is required when LOGS_MODEL is \
                 elasticsearch",
                "LOGS_MODEL_CONFIG.kafka_config is required when LOGS_MODEL is elasticsearch",
            ]
        );
    }

    #[test]
    fn test_nested_port_is_checked() {
        let yaml = "LOGS_MODEL_CONFIG:\n  elasticsearch_config:\n    port: 0\n";
        assert_eq!(
            messages(yaml),
            vec!["LOGS_MODEL_CONFIG.elasticsearch_config.port must be at least 1"]
        );
    }

    #[test]
    fn test_nested_type_error_is_keyed() {
        let yaml = "LOGS_MODEL_CONFIG:\n  elasticsearch_config:\n    port: \"9200\"\n";
        let err = Elasticsearch::from_document(&doc(yaml)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "LOGS_MODEL_CONFIG.elasticsearch_config.port must be of type integer"
        );
    }
}
