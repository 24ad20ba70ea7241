//! `SyslogNGOutput` of the logging operator: a namespaced syslog-ng
//! destination flows can send their logs to.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{destination_attributes, disk_buffer, secret, tls};
use super::common::{Destination, DiskBuffer, Secret, Tls};
use crate::model::common_attributes;
use crate::resource::ManifestResource;
use crate::schema::{attrs, Attribute, Attributes, ElementType, Schema, Validator};

/// Exactly one output is expected to be set.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "logging.banzaicloud.io",
    version = "v1beta1",
    kind = "SyslogNGOutput",
    namespaced,
    status = "SyslogNGOutputStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct SyslogNGOutputSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<ElasticsearchOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loggly: Option<LogglyOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loki: Option<LokiOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqtt: Option<MqttOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisOutput>,
    #[serde(rename = "sumologic-http", default, skip_serializing_if = "Option::is_none")]
    pub sumologic_http: Option<SumologicHttpOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog: Option<SyslogOutput>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyslogNGOutputStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems_count: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ElasticsearchOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_dirs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_perm: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HttpOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogglyOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LokiOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MqttOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RedisOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SumologicHttpOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_reopen: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(flatten)]
    pub destination: Destination,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SyslogOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_on_input: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub so_keepalive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_escape: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_format: Option<String>,
    #[serde(flatten)]
    pub destination: Destination,
}

/// A destination schema: the output's own attributes plus the ones every
/// destination shares.
fn output(description: &str, attributes: Attributes) -> Attribute {
    let mut attributes = attributes;
    attributes.extend(destination_attributes());
    Attribute::single_nested(description, attributes)
}

fn batching() -> Attributes {
    attrs([
        (
            "batch_bytes",
            Attribute::int64("Maximum size of a batch in bytes."),
        ),
        (
            "batch_lines",
            Attribute::int64("Maximum number of messages in a batch."),
        ),
        (
            "batch_timeout",
            Attribute::int64("Milliseconds to wait for a batch to fill."),
        ),
        (
            "workers",
            Attribute::int64("Number of workers sending messages."),
        ),
    ])
}

fn http_attributes() -> Attributes {
    let mut attributes = batching();
    attributes.extend(attrs([
        ("disk_buffer", disk_buffer()),
        (
            "headers",
            Attribute::list(ElementType::String, "Extra HTTP headers."),
        ),
        ("password", secret("Password for basic authentication.")),
        ("timeout", Attribute::int64("Seconds to wait for a response.")),
        ("tls", tls()),
        ("url", Attribute::string("URL of the server.")),
        ("user", Attribute::string("User for basic authentication.")),
    ]));
    attributes
}

fn spec_attribute() -> Attribute {
    let mut elasticsearch = http_attributes();
    elasticsearch.extend(attrs([
        (
            "custom_id",
            Attribute::string("Template of the document id."),
        ),
        ("index", Attribute::string("Name of the index.")),
        ("type", Attribute::string("Type of the document.")),
    ]));

    let mut http = http_attributes();
    http.extend(attrs([
        ("body", Attribute::string("Template of the request body.")),
        ("body_prefix", Attribute::string("Text before the batch of messages.")),
        ("body_suffix", Attribute::string("Text after the batch of messages.")),
        ("delimiter", Attribute::string("Text between messages of a batch.")),
        (
            "method",
            Attribute::string("HTTP method.").validator(Validator::one_of(["POST", "PUT"])),
        ),
        ("user_agent", Attribute::string("User agent of the requests.")),
    ]));

    let mut loki = batching();
    loki.remove("batch_bytes");
    loki.extend(attrs([
        ("disk_buffer", disk_buffer()),
        (
            "labels",
            Attribute::map(ElementType::String, "Labels added to every stream."),
        ),
        ("template", Attribute::string("Template of the message.")),
        (
            "timestamp",
            Attribute::string("Which timestamp to send.")
                .validator(Validator::one_of(["current", "received", "msg"])),
        ),
        ("url", Attribute::string("URL of the Loki server.")),
    ]));

    let mut redis = batching();
    redis.remove("batch_bytes");
    redis.extend(attrs([
        ("auth", secret("Password of the Redis server.")),
        ("command_name", Attribute::string("Redis command to run.")),
        ("disk_buffer", disk_buffer()),
        ("host", Attribute::string("Host of the Redis server.")),
        ("port", Attribute::int64("Port of the Redis server.")),
        ("retries", Attribute::int64("Times to retry a failed message.")),
    ]));

    let mut sumologic = batching();
    sumologic.extend(attrs([
        ("collector", secret("Token of the Sumo Logic HTTP collector.")),
        ("deployment", Attribute::string("Sumo Logic deployment, for instance us2.")),
        ("disk_buffer", disk_buffer()),
        (
            "headers",
            Attribute::list(ElementType::String, "Extra HTTP headers."),
        ),
        ("time_reopen", Attribute::int64("Seconds to wait before reconnecting.")),
        ("timeout", Attribute::int64("Seconds to wait for a response.")),
        ("tls", tls()),
        ("url", Attribute::string("URL of the collector.")),
    ]));

    Attribute::single_nested(
        "SyslogNGOutputSpec defines the desired state of SyslogNGOutput.",
        attrs([
            (
                "elasticsearch",
                output("Send messages to Elasticsearch.", elasticsearch),
            ),
            (
                "file",
                output(
                    "Write messages to a file.",
                    attrs([
                        ("create_dirs", Attribute::bool("Create missing directories.")),
                        ("dir_group", Attribute::string("Group of created directories.")),
                        ("dir_owner", Attribute::string("Owner of created directories.")),
                        ("dir_perm", Attribute::int64("Permissions of created directories.")),
                        ("disk_buffer", disk_buffer()),
                        ("path", Attribute::string("Path of the file.").required()),
                        ("template", Attribute::string("Template of the message.")),
                    ]),
                ),
            ),
            ("http", output("Send messages over HTTP.", http)),
            (
                "logging_ref",
                Attribute::string("Name of the Logging resource this output belongs to.")
                    .json("loggingRef"),
            ),
            (
                "loggly",
                output(
                    "Send messages to Loggly.",
                    attrs([
                        ("disk_buffer", disk_buffer()),
                        ("host", Attribute::string("Host of the Loggly server.")),
                        ("port", Attribute::int64("Port of the Loggly server.")),
                        ("tag", Attribute::string("Tag of the messages.")),
                        ("template", Attribute::string("Template of the message.")),
                        ("tls", tls()),
                        ("token", secret("Customer token.")),
                        (
                            "transport",
                            Attribute::string("Transport protocol.")
                                .validator(Validator::one_of(["tcp", "udp", "tls"])),
                        ),
                    ]),
                ),
            ),
            ("loki", output("Send messages to Grafana Loki.", loki)),
            (
                "mqtt",
                output(
                    "Publish messages to an MQTT broker.",
                    attrs([
                        ("address", Attribute::string("Address of the broker.")),
                        ("disk_buffer", disk_buffer()),
                        (
                            "fallback_topic",
                            Attribute::string("Topic for messages whose topic template fails."),
                        ),
                        (
                            "qos",
                            Attribute::int64("Quality of service level.")
                                .validator(Validator::Int64Between(0, 2)),
                        ),
                        ("template", Attribute::string("Template of the message.")),
                        ("topic", Attribute::string("Topic to publish to.")),
                    ]),
                ),
            ),
            ("redis", output("Send messages to Redis.", redis)),
            (
                "sumologic_http",
                output("Send messages to a Sumo Logic HTTP collector.", sumologic)
                    .json("sumologic-http"),
            ),
            (
                "syslog",
                output(
                    "Send messages to a remote syslog server.",
                    attrs([
                        (
                            "close_on_input",
                            Attribute::bool("Close the connection when the server sends data."),
                        ),
                        ("disk_buffer", disk_buffer()),
                        (
                            "flags",
                            Attribute::list(ElementType::String, "Destination flags."),
                        ),
                        ("flush_lines", Attribute::int64("Messages to send at once.")),
                        ("host", Attribute::string("Host of the syslog server.")),
                        ("port", Attribute::int64("Port of the syslog server.")),
                        ("so_keepalive", Attribute::bool("Enable TCP keepalive.")),
                        (
                            "suppress",
                            Attribute::int64("Seconds to suppress repeated messages."),
                        ),
                        ("template", Attribute::string("Template of the message.")),
                        ("template_escape", Attribute::bool("Escape quotes in macros.")),
                        ("tls", tls()),
                        (
                            "transport",
                            Attribute::string("Transport protocol.")
                                .validator(Validator::one_of(["tcp", "udp", "tls"])),
                        ),
                        (
                            "ts_format",
                            Attribute::string("Timestamp format.")
                                .validator(Validator::one_of(["rfc3164", "bsd", "rfc3339", "iso"])),
                        ),
                    ]),
                ),
            ),
        ]),
    )
}

/// Provider resource for `SyslogNGOutput` objects.
pub struct SyslogNgOutputV1Beta1;

impl ManifestResource for SyslogNgOutputV1Beta1 {
    type Object = SyslogNGOutput;
    type Spec = SyslogNGOutputSpec;

    const TYPE_NAME: &'static str = "logging_banzaicloud_io_syslog_ng_output_v1beta1";

    fn schema() -> Schema {
        let mut attributes = common_attributes("SyslogNGOutput", true);
        attributes.insert("spec".to_owned(), spec_attribute());
        Schema::new(
            "SyslogNGOutput is the Schema for the syslogngoutputs API",
            attributes,
        )
    }

    fn to_object(metadata: ObjectMeta, spec: SyslogNGOutputSpec) -> SyslogNGOutput {
        SyslogNGOutput {
            metadata,
            spec,
            status: None,
        }
    }

    fn into_parts(object: SyslogNGOutput) -> (ObjectMeta, SyslogNGOutputSpec) {
        (object.metadata, object.spec)
    }

    fn is_ready(object: &SyslogNGOutput) -> bool {
        object
            .status
            .as_ref()
            .and_then(|status| status.active)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;
    use kube::CustomResourceExt;
    use serde_json::json;

    use super::*;
    use crate::model::ResourceData;

    fn crd_spec() -> JSONSchemaProps {
        let crd = SyslogNGOutput::crd();
        let schema = crd.spec.versions[0]
            .schema
            .clone()
            .and_then(|validation| validation.open_api_v3_schema)
            .unwrap();
        schema.properties.unwrap()["spec"].clone()
    }

    fn json_keys(attributes: &Attributes) -> BTreeSet<String> {
        attributes
            .iter()
            .map(|(name, attribute)| attribute.json_key(name).to_owned())
            .collect()
    }

    #[test]
    fn crd_identity() {
        let crd = SyslogNGOutput::crd();
        assert_eq!(crd.spec.group, "logging.banzaicloud.io");
        assert_eq!(crd.spec.names.kind, "SyslogNGOutput");
        assert_eq!(crd.spec.names.plural, "syslogngoutputs");
    }

    #[test]
    fn schema_matches_crd() {
        let spec = crd_spec();
        let properties = spec.properties.unwrap();
        let schema = SyslogNgOutputV1Beta1::schema();
        let attributes = schema.attributes["spec"].nested().unwrap();
        assert_eq!(
            json_keys(attributes),
            properties.keys().cloned().collect::<BTreeSet<_>>()
        );

        for (name, attribute) in attributes {
            let Some(nested) = attribute.nested() else {
                continue;
            };
            let output = &properties[attribute.json_key(name)];
            let keys: BTreeSet<String> = output.properties.clone().unwrap().into_keys().collect();
            assert_eq!(json_keys(nested), keys, "attributes of {}", name);
        }
    }

    #[test]
    fn syslog_output_from_state() {
        let schema = SyslogNgOutputV1Beta1::schema();
        let state = schema.json_to_state(&json!({
            "metadata": {"name": "syslog", "namespace": "logging"},
            "spec": {
                "syslog": {
                    "host": "10.12.34.56",
                    "transport": "tls",
                    "tls": {
                        "ca_file": {"mountFrom": {"secretKeyRef": {"name": "tls", "key": "ca.crt"}}},
                        "use-system-cert-store": false,
                    },
                    "persist_name": "syslog-out",
                    "log-fifo-size": 10000,
                },
            }
        }));
        assert_eq!(state["spec"]["syslog"]["log_fifo_size"], json!(10000));
        assert_eq!(
            state["spec"]["syslog"]["tls"]["ca_file"]["mount_from"]["secret_key_ref"]["key"],
            json!("ca.crt")
        );
        assert!(schema.validate(&state).is_empty());

        let data: ResourceData<SyslogNGOutputSpec> =
            serde_json::from_value(schema.state_to_json(&state)).unwrap();
        let syslog = data.spec.unwrap().syslog.unwrap();
        assert_eq!(syslog.host.as_deref(), Some("10.12.34.56"));
        assert_eq!(syslog.destination.log_fifo_size, Some(10000));
        assert_eq!(syslog.destination.persist_name.as_deref(), Some("syslog-out"));
        let tls = syslog.tls.unwrap();
        assert_eq!(tls.use_system_cert_store, Some(false));
        let selector = tls.ca_file.unwrap().mount_from.unwrap().secret_key_ref.unwrap();
        assert_eq!(selector.name.as_deref(), Some("tls"));
    }

    #[test]
    fn sumologic_keeps_dashed_field() {
        let spec = SyslogNGOutputSpec {
            sumologic_http: Some(SumologicHttpOutput {
                deployment: Some("us2".to_owned()),
                ..SumologicHttpOutput::default()
            }),
            ..SyslogNGOutputSpec::default()
        };
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({"sumologic-http": {"deployment": "us2"}})
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let schema = SyslogNgOutputV1Beta1::schema();
        let diagnostics = schema.validate(&json!({
            "metadata": {"name": "out", "namespace": "logging"},
            "spec": {
                "mqtt": {"qos": 3},
                "syslog": {"transport": "http"},
                "file": {"create_dirs": true},
            }
        }));
        let paths: BTreeSet<String> = diagnostics
            .errors()
            .filter_map(|diagnostic| diagnostic.attribute.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(
            paths,
            BTreeSet::from([
                "spec.file.path".to_owned(),
                "spec.mqtt.qos".to_owned(),
                "spec.syslog.transport".to_owned(),
            ])
        );
    }

    #[test]
    fn disk_buffer_requires_size_and_reliability() {
        let schema = SyslogNgOutputV1Beta1::schema();
        let diagnostics = schema.validate(&json!({
            "metadata": {"name": "out", "namespace": "logging"},
            "spec": {"loki": {"url": "http://loki:3100", "disk_buffer": {"dir": "/buffers"}}},
        }));
        assert_eq!(diagnostics.errors().count(), 2);
    }
}
