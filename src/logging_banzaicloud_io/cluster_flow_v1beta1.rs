//! `ClusterFlow` of the logging operator: routes logs from all namespaces
//! through a chain of fluentd filters to cluster-wide outputs.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::common_attributes;
use crate::resource::ManifestResource;
use crate::schema::{attrs, Attribute, Attributes, ElementType, Schema, Validator};

#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "logging.banzaicloud.io",
    version = "v1beta1",
    kind = "ClusterFlow",
    namespaced,
    status = "ClusterFlowStatus",
    shortname = "logging-cf"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFlowSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_output_refs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_label_in_router: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_: Option<Vec<ClusterMatch>>,
    /// Deprecated in favor of `globalOutputRefs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_refs: Option<Vec<String>>,
    /// Deprecated in favor of `match`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFlowStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems_count: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<ClusterSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<ClusterSelector>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
}

/// One fluentd filter. Exactly one of the fields is expected to be set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concat: Option<Concat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedot: Option<DeDot>,
    #[serde(rename = "detectExceptions", default, skip_serializing_if = "Option::is_none")]
    pub detect_exceptions: Option<DetectExceptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch_genid: Option<ElasticsearchGenId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip: Option<GeoIp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grep: Option<Grep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_events_timestamp: Option<KubeEventsTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<Parser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus: Option<Prometheus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_modifier: Option<RecordModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_transformer: Option<RecordTransformer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<StdOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_normaliser: Option<TagNormaliser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<Throttle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub useragent: Option<UserAgent>,
}

/// Concatenates multiline log lines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Concat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuous_line_regexp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_partial_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_partial_metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline_end_regexp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline_start_regexp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_cri_logtag_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_cri_stream_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_metadata_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_identity_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_first_timestamp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_partial_cri_logtag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_partial_metadata: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeDot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de_dot_nested: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de_dot_separator: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectExceptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_line_breaks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline_flush_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_tag_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ElasticsearchGenId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_id_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tag_in_seed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_time_in_seed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_entire_record: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_record_as_seed: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoIp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_library: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip2_database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip_database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip_lookup_keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<BTreeMap<String, String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_adding_null_record: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GrepPattern {
    pub key: String,
    pub pattern: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Grep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<GrepPattern>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<Vec<GrepPattern>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KubeEventsTimestamp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_time_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_fields: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Parser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit_invalid_record_to_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_value_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_key_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_key_name_field: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_invalid_sequence: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_data: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_time: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParseSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate_current_event: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_firstline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_time_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_empty_string: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_value_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Prometheus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<MetricSection>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets: Option<String>,
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecordModifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<BTreeMap<String, String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<Vec<Replace>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist_keys: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Replace {
    pub expression: String,
    pub key: String,
    pub replace: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecordTransformer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_typecast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ruby: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<BTreeMap<String, String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_record: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_time_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StdOut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagNormaliser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_tag: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Throttle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_bucket_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_bucket_period_s: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_drop_logs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_reset_rate_s: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_warning_delay_s: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserAgent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flatten: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_key: Option<String>,
}

fn selector(description: &str) -> Attribute {
    Attribute::single_nested(
        description,
        attrs([
            (
                "container_names",
                Attribute::list(ElementType::String, "Names of the containers."),
            ),
            (
                "hosts",
                Attribute::list(ElementType::String, "Names of the nodes."),
            ),
            (
                "labels",
                Attribute::map(ElementType::String, "Labels of the pods."),
            ),
            (
                "namespace_labels",
                Attribute::map(ElementType::String, "Labels of the namespaces."),
            ),
            (
                "namespaces",
                Attribute::list(ElementType::String, "Names of the namespaces."),
            ),
        ]),
    )
}

fn grep_patterns(description: &str) -> Attribute {
    Attribute::list_nested(
        description,
        attrs([
            (
                "key",
                Attribute::string("Name of the field to match.").required(),
            ),
            (
                "pattern",
                Attribute::string("Regular expression the field is matched against.").required(),
            ),
        ]),
    )
}

fn records(description: &str) -> Attribute {
    Attribute::dynamic(format!("{} A list of string maps.", description))
}

fn filter_attributes() -> Attributes {
    attrs([
        (
            "concat",
            Attribute::single_nested(
                "Concatenates multiline logs.",
                attrs([
                    ("continuous_line_regexp", Attribute::string("Regexp matching continuous lines.")),
                    ("flush_interval", Attribute::int64("Seconds to wait for the next line.")),
                    ("keep_partial_key", Attribute::bool("Keep the partial key in the record.")),
                    ("keep_partial_metadata", Attribute::string("Keep partial metadata in the record.")),
                    ("key", Attribute::string("Key of the field holding the line.")),
                    ("multiline_end_regexp", Attribute::string("Regexp matching the last line.")),
                    ("multiline_start_regexp", Attribute::string("Regexp matching the first line.")),
                    ("n_lines", Attribute::int64("Number of lines to concatenate.")),
                    ("partial_cri_logtag_key", Attribute::string("Field holding the CRI log tag.")),
                    ("partial_cri_stream_key", Attribute::string("Field holding the CRI stream.")),
                    ("partial_key", Attribute::string("Field marking partial lines.")),
                    ("partial_metadata_format", Attribute::string("Format of partial metadata.")),
                    ("partial_value", Attribute::string("Value marking partial lines.")),
                    ("separator", Attribute::string("Separator between lines.")),
                    ("stream_identity_key", Attribute::string("Key identifying the stream.")),
                    ("timeout_label", Attribute::string("Label to route flushed events to.")),
                    ("use_first_timestamp", Attribute::bool("Use the timestamp of the first line.")),
                    ("use_partial_cri_logtag", Attribute::bool("Use the CRI log tag to detect partial lines.")),
                    ("use_partial_metadata", Attribute::string("Use partial metadata to detect partial lines.")),
                ]),
            ),
        ),
        (
            "dedot",
            Attribute::single_nested(
                "Replaces dots in field names.",
                attrs([
                    ("de_dot_nested", Attribute::bool("Also replace dots in nested fields.")),
                    ("de_dot_separator", Attribute::string("Replacement for dots.")),
                ]),
            ),
        ),
        (
            "detect_exceptions",
            Attribute::single_nested(
                "Groups exception stack traces into one record.",
                attrs([
                    ("force_line_breaks", Attribute::bool("Force line breaks between lines.")),
                    (
                        "languages",
                        Attribute::list(ElementType::String, "Programming languages to detect."),
                    ),
                    ("match_tag", Attribute::string("Tag to match.")),
                    ("max_bytes", Attribute::int64("Maximum bytes of a stack trace.")),
                    ("max_lines", Attribute::int64("Maximum lines of a stack trace.")),
                    ("message", Attribute::string("Field holding the message.")),
                    ("multiline_flush_interval", Attribute::string("Interval to flush buffered lines.")),
                    ("remove_tag_prefix", Attribute::string("Prefix removed from the tag.")),
                    ("stream", Attribute::string("Field identifying the stream.")),
                ]),
            )
            .json("detectExceptions"),
        ),
        (
            "elasticsearch_genid",
            Attribute::single_nested(
                "Generates a hash id for Elasticsearch.",
                attrs([
                    ("hash_id_key", Attribute::string("Field to store the hash in.")),
                    (
                        "hash_type",
                        Attribute::string("Hash algorithm.")
                            .validator(Validator::one_of(["md5", "sha1", "sha256", "sha512"])),
                    ),
                    ("include_tag_in_seed", Attribute::bool("Hash the tag too.")),
                    ("include_time_in_seed", Attribute::bool("Hash the time too.")),
                    ("record_keys", Attribute::string("Record keys to hash.")),
                    ("separator", Attribute::string("Separator between hashed keys.")),
                    ("use_entire_record", Attribute::bool("Hash the whole record.")),
                    ("use_record_as_seed", Attribute::bool("Hash record keys instead of a UUID.")),
                ]),
            ),
        ),
        (
            "geoip",
            Attribute::single_nested(
                "Adds geographic location from IP addresses.",
                attrs([
                    ("backend_library", Attribute::string("GeoIP backend library.")),
                    ("geoip2_database", Attribute::string("Path to the GeoIP2 database.")),
                    ("geoip_database", Attribute::string("Path to the GeoIP database.")),
                    ("geoip_lookup_keys", Attribute::string("Fields holding IP addresses.")),
                    ("records", records("Records to add.")),
                    ("skip_adding_null_record", Attribute::bool("Skip records without location.")),
                ]),
            ),
        ),
        (
            "grep",
            Attribute::single_nested(
                "Filters events by field values.",
                attrs([
                    ("exclude", grep_patterns("Drop events matching any pattern.")),
                    ("regexp", grep_patterns("Keep events matching every pattern.")),
                ]),
            ),
        ),
        (
            "kube_events_timestamp",
            Attribute::single_nested(
                "Derives the timestamp of Kubernetes events.",
                attrs([
                    ("mapped_time_key", Attribute::string("Field to store the timestamp in.")),
                    (
                        "timestamp_fields",
                        Attribute::list(ElementType::String, "Fields to read the timestamp from."),
                    ),
                ]),
            ),
        ),
        (
            "parser",
            Attribute::single_nested(
                "Parses a field of the event.",
                attrs([
                    ("emit_invalid_record_to_error", Attribute::bool("Emit unparsable records as errors.")),
                    ("hash_value_field", Attribute::string("Store parsed values under this field.")),
                    ("inject_key_prefix", Attribute::string("Prefix for parsed keys.")),
                    ("key_name", Attribute::string("Field to parse.")),
                    (
                        "parse",
                        Attribute::single_nested(
                            "Parser settings.",
                            attrs([
                                ("estimate_current_event", Attribute::bool("Use the current time when the time field is missing.")),
                                ("expression", Attribute::string("Regular expression for the regexp parser.")),
                                ("format_firstline", Attribute::string("Regexp matching the first line of a multiline event.")),
                                ("keep_time_key", Attribute::bool("Keep the time field in the record.")),
                                ("local_time", Attribute::bool("Use local time.")),
                                ("multiline", Attribute::list(ElementType::String, "Multiline format regexps.")),
                                ("null_empty_string", Attribute::bool("Treat empty strings as null.")),
                                ("null_value_pattern", Attribute::string("Pattern of null values.")),
                                ("time_format", Attribute::string("Format of the time field.")),
                                ("time_key", Attribute::string("Field holding the time.")),
                                (
                                    "time_type",
                                    Attribute::string("Type of the time field.")
                                        .validator(Validator::one_of(["float", "unixtime", "string", "mixed"])),
                                ),
                                ("timezone", Attribute::string("Timezone of the time field.")),
                                ("type", Attribute::string("Parser type, for instance json, regexp or nginx.")),
                                ("types", Attribute::string("Types of the parsed fields.")),
                                ("utc", Attribute::bool("Use UTC.")),
                            ]),
                        ),
                    ),
                    ("remove_key_name_field", Attribute::bool("Remove the parsed field.")),
                    ("replace_invalid_sequence", Attribute::bool("Replace invalid byte sequences.")),
                    ("reserve_data", Attribute::bool("Keep the original fields.")),
                    ("reserve_time", Attribute::bool("Keep the original time.")),
                ]),
            ),
        ),
        (
            "prometheus",
            Attribute::single_nested(
                "Exposes Prometheus metrics from events.",
                attrs([
                    ("labels", Attribute::map(ElementType::String, "Labels added to every metric.")),
                    (
                        "metrics",
                        Attribute::list_nested(
                            "Metrics to expose.",
                            attrs([
                                ("buckets", Attribute::string("Histogram buckets.")),
                                ("desc", Attribute::string("Description of the metric.").required()),
                                ("key", Attribute::string("Field holding the value.")),
                                ("labels", Attribute::map(ElementType::String, "Labels of the metric.")),
                                ("name", Attribute::string("Name of the metric.").required()),
                                (
                                    "type",
                                    Attribute::string("Type of the metric.")
                                        .required()
                                        .validator(Validator::one_of(["counter", "gauge", "summary", "histogram"])),
                                ),
                            ]),
                        ),
                    ),
                ]),
            ),
        ),
        (
            "record_modifier",
            Attribute::single_nested(
                "Modifies fields of the event.",
                attrs([
                    ("char_encoding", Attribute::string("Fix the character encoding.")),
                    ("prepare_value", Attribute::string("Ruby code run before the records are set.")),
                    ("records", records("Fields to add.")),
                    ("remove_keys", Attribute::string("Comma separated fields to remove.")),
                    (
                        "replaces",
                        Attribute::list_nested(
                            "Replace field values by regular expression.",
                            attrs([
                                ("expression", Attribute::string("Regular expression.").required()),
                                ("key", Attribute::string("Field to change.").required()),
                                ("replace", Attribute::string("Replacement.").required()),
                            ]),
                        ),
                    ),
                    ("whitelist_keys", Attribute::string("Comma separated fields to keep.")),
                ]),
            ),
        ),
        (
            "record_transformer",
            Attribute::single_nested(
                "Transforms the event.",
                attrs([
                    ("auto_typecast", Attribute::bool("Keep the type of values.")),
                    ("enable_ruby", Attribute::bool("Evaluate ruby expressions in records.")),
                    ("keep_keys", Attribute::string("Comma separated fields to keep.")),
                    ("records", records("Fields to add.")),
                    ("remove_keys", Attribute::string("Comma separated fields to remove.")),
                    ("renew_record", Attribute::bool("Build a new record instead of changing the event.")),
                    ("renew_time_key", Attribute::string("Field holding the new time.")),
                ]),
            ),
        ),
        (
            "stdout",
            Attribute::single_nested(
                "Prints events to stdout.",
                attrs([(
                    "output_type",
                    Attribute::string("Output format.").validator(Validator::one_of(["json", "hash"])),
                )]),
            ),
        ),
        (
            "tag_normaliser",
            Attribute::single_nested(
                "Rewrites tags using Kubernetes metadata.",
                attrs([
                    ("format", Attribute::string("Format of the new tag.")),
                    ("match_tag", Attribute::string("Tag to match.")),
                ]),
            ),
        ),
        (
            "throttle",
            Attribute::single_nested(
                "Rate limits events per group.",
                attrs([
                    ("group_bucket_limit", Attribute::int64("Maximum events per period.")),
                    ("group_bucket_period_s", Attribute::int64("Length of a period in seconds.")),
                    ("group_drop_logs", Attribute::bool("Drop events over the limit.")),
                    ("group_key", Attribute::string("Fields identifying the group.")),
                    ("group_reset_rate_s", Attribute::int64("Rate below which the limit is lifted.")),
                    ("group_warning_delay_s", Attribute::int64("Seconds between warnings.")),
                ]),
            ),
        ),
        (
            "useragent",
            Attribute::single_nested(
                "Parses user agent strings.",
                attrs([
                    ("delete_key", Attribute::bool("Delete the parsed field.")),
                    ("flatten", Attribute::bool("Flatten the parsed fields.")),
                    ("key_name", Attribute::string("Field holding the user agent.")),
                    ("out_key", Attribute::string("Field to store the result in.")),
                ]),
            ),
        ),
    ])
}

fn spec_attribute() -> Attribute {
    Attribute::single_nested(
        "ClusterFlowSpec is the Kubernetes spec for ClusterFlows.",
        attrs([
            (
                "filters",
                Attribute::list_nested("Filters applied in order.", filter_attributes()),
            ),
            (
                "flow_label",
                Attribute::string("Label used for routing inside fluentd.").json("flowLabel"),
            ),
            (
                "global_output_refs",
                Attribute::list(ElementType::String, "Names of the ClusterOutputs to send to.")
                    .json("globalOutputRefs"),
            ),
            (
                "include_label_in_router",
                Attribute::bool("Include the flow label in the router.")
                    .json("includeLabelInRouter"),
            ),
            (
                "logging_ref",
                Attribute::string("Name of the Logging resource this flow belongs to.")
                    .json("loggingRef"),
            ),
            (
                "match",
                Attribute::list_nested(
                    "Select and exclude rules, evaluated in order.",
                    attrs([
                        ("exclude", selector("Exclude matching logs.")),
                        ("select", selector("Select matching logs.")),
                    ]),
                ),
            ),
            (
                "output_refs",
                Attribute::list(ElementType::String, "Names of the outputs to send to.")
                    .json("outputRefs")
                    .deprecated("Use global_output_refs instead."),
            ),
            (
                "selectors",
                Attribute::map(ElementType::String, "Pod label selectors.")
                    .deprecated("Use match instead."),
            ),
        ]),
    )
}

/// Provider resource for `ClusterFlow` objects.
pub struct ClusterFlowV1Beta1;

impl ManifestResource for ClusterFlowV1Beta1 {
    type Object = ClusterFlow;
    type Spec = ClusterFlowSpec;

    const TYPE_NAME: &'static str = "logging_banzaicloud_io_cluster_flow_v1beta1";

    fn schema() -> Schema {
        let mut attributes = common_attributes("ClusterFlow", true);
        attributes.insert("spec".to_owned(), spec_attribute());
        Schema::new("ClusterFlow is the Schema for the clusterflows API", attributes)
    }

    fn to_object(metadata: ObjectMeta, spec: ClusterFlowSpec) -> ClusterFlow {
        ClusterFlow {
            metadata,
            spec,
            status: None,
        }
    }

    fn into_parts(object: ClusterFlow) -> (ObjectMeta, ClusterFlowSpec) {
        (object.metadata, object.spec)
    }

    fn is_ready(object: &ClusterFlow) -> bool {
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

    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
        JSONSchemaProps, JSONSchemaPropsOrArray,
    };
    use kube::CustomResourceExt;
    use serde_json::{json, Value};

    use super::*;
    use crate::model::ResourceData;

    fn crd_spec() -> JSONSchemaProps {
        let crd = ClusterFlow::crd();
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
        let crd = ClusterFlow::crd();
        assert_eq!(crd.spec.group, "logging.banzaicloud.io");
        assert_eq!(crd.spec.names.plural, "clusterflows");
        assert_eq!(crd.spec.scope, "Namespaced");
    }

    #[test]
    fn schema_matches_crd() {
        let spec = crd_spec();
        let properties: BTreeSet<String> = spec.properties.clone().unwrap().into_keys().collect();
        let schema = ClusterFlowV1Beta1::schema();
        let attributes = schema.attributes["spec"].nested().unwrap();
        assert_eq!(json_keys(attributes), properties);

        let filters = match spec.properties.unwrap()["filters"].items.clone().unwrap() {
            JSONSchemaPropsOrArray::Schema(items) => items.properties.unwrap(),
            JSONSchemaPropsOrArray::Schemas(_) => panic!("filters must have a single item schema"),
        };
        let filter_properties: BTreeSet<String> = filters.into_keys().collect();
        let filter_attributes = attributes["filters"].nested().unwrap();
        assert_eq!(json_keys(filter_attributes), filter_properties);
    }

    #[test]
    fn state_binds_to_spec() {
        let schema = ClusterFlowV1Beta1::schema();
        let state = schema.json_to_state(&json!({
            "metadata": {"name": "all", "namespace": "logging"},
            "spec": {
                "filters": [
                    {"tag_normaliser": {"format": "${namespace_name}.${pod_name}"}},
                    {"detectExceptions": {"languages": ["java", "python"]}},
                ],
                "globalOutputRefs": ["syslog-ng"],
                "match": [{"select": {"labels": {"app": "nginx"}}}],
            }
        }));
        assert_eq!(state["spec"]["global_output_refs"], json!(["syslog-ng"]));
        assert_eq!(
            state["spec"]["filters"][1]["detect_exceptions"]["languages"],
            json!(["java", "python"])
        );
        assert_eq!(state["spec"]["flow_label"], Value::Null);

        let data: ResourceData<ClusterFlowSpec> =
            serde_json::from_value(schema.state_to_json(&state)).unwrap();
        let spec = data.spec.unwrap();
        assert_eq!(spec.global_output_refs, Some(vec!["syslog-ng".to_owned()]));
        let filters = spec.filters.unwrap();
        assert_eq!(
            filters[0].tag_normaliser.as_ref().unwrap().format.as_deref(),
            Some("${namespace_name}.${pod_name}")
        );
        assert_eq!(
            filters[1].detect_exceptions.as_ref().unwrap().languages,
            Some(vec!["java".to_owned(), "python".to_owned()])
        );
        let select = spec.match_.unwrap()[0].select.clone().unwrap();
        assert_eq!(select.labels.unwrap()["app"], "nginx");
    }

    #[test]
    fn manifest_shape() {
        let spec = ClusterFlowSpec {
            global_output_refs: Some(vec!["syslog-ng".to_owned()]),
            filters: Some(vec![Filter {
                throttle: Some(Throttle {
                    group_key: Some("kubernetes.container_name".to_owned()),
                    group_bucket_limit: Some(3000),
                    ..Throttle::default()
                }),
                ..Filter::default()
            }]),
            ..ClusterFlowSpec::default()
        };
        let metadata = ObjectMeta {
            name: Some("all".to_owned()),
            namespace: Some("logging".to_owned()),
            ..ObjectMeta::default()
        };
        let object = ClusterFlowV1Beta1::to_object(metadata, spec);
        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({
                "apiVersion": "logging.banzaicloud.io/v1beta1",
                "kind": "ClusterFlow",
                "metadata": {"name": "all", "namespace": "logging"},
                "spec": {
                    "filters": [{"throttle": {
                        "group_bucket_limit": 3000,
                        "group_key": "kubernetes.container_name",
                    }}],
                    "globalOutputRefs": ["syslog-ng"],
                }
            })
        );
    }

    #[test]
    fn ready_when_operator_marks_active() {
        let mut flow = ClusterFlow::new("all", ClusterFlowSpec::default());
        assert!(!ClusterFlowV1Beta1::is_ready(&flow));
        flow.status = Some(ClusterFlowStatus {
            active: Some(true),
            ..ClusterFlowStatus::default()
        });
        assert!(ClusterFlowV1Beta1::is_ready(&flow));
    }

    #[test]
    fn deprecated_fields_warn() {
        let schema = ClusterFlowV1Beta1::schema();
        let diagnostics = schema.validate(&json!({
            "metadata": {"name": "all", "namespace": "logging"},
            "spec": {"selectors": {"app": "nginx"}},
        }));
        assert!(!diagnostics.has_error());
        assert_eq!(diagnostics.warnings().count(), 1);
    }
}
