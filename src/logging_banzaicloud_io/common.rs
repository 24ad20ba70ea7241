//! Types shared by several logging operator resources, together with their
//! schema fragments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{attrs, Attribute, Attributes, Validator};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecretKeySelector {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValueFrom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeySelector>,
}

/// A value given inline or read from a Kubernetes secret.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Read the value from a secret and pass it as an environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<ValueFrom>,
    /// Read the value from a secret and mount it as a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_from: Option<ValueFrom>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_dir: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_verify: Option<bool>,
    #[serde(
        rename = "use-system-cert-store",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub use_system_cert_store: Option<bool>,
    #[serde(rename = "cipher-suite", default, skip_serializing_if = "Option::is_none")]
    pub cipher_suite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<bool>,
}

/// Disk-based buffering of a syslog-ng destination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiskBuffer {
    pub disk_buf_size: i64,
    pub reliable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_buf_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_buf_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_out_size: Option<i64>,
}

/// Settings every syslog-ng destination accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_name: Option<String>,
    #[serde(rename = "log-fifo-size", default, skip_serializing_if = "Option::is_none")]
    pub log_fifo_size: Option<i64>,
}

fn secret_key_selector(description: &str) -> Attribute {
    Attribute::single_nested(
        description,
        attrs([
            (
                "key",
                Attribute::string("The key of the secret to select from.").required(),
            ),
            ("name", Attribute::string("Name of the referent.")),
            (
                "optional",
                Attribute::bool("Specify whether the Secret or its key must be defined."),
            ),
        ]),
    )
    .json("secretKeyRef")
}

fn value_from(description: &str) -> Attribute {
    Attribute::single_nested(
        description,
        attrs([(
            "secret_key_ref",
            secret_key_selector("Selects a key of a secret in the pod's namespace."),
        )]),
    )
}

/// Schema of a [`Secret`].
pub fn secret(description: &str) -> Attribute {
    Attribute::single_nested(
        description,
        attrs([
            ("value", Attribute::string("Inline value.").sensitive()),
            (
                "value_from",
                value_from("Read the value from a secret.").json("valueFrom"),
            ),
            (
                "mount_from",
                value_from("Mount the value from a secret as a file.").json("mountFrom"),
            ),
        ]),
    )
}

/// Schema of a [`Tls`].
pub fn tls() -> Attribute {
    Attribute::single_nested(
        "TLS settings of the destination.",
        attrs([
            ("ca_dir", secret("Directory of trusted CA certificates.")),
            ("ca_file", secret("File of trusted CA certificates.")),
            ("cert_file", secret("Client certificate.")),
            ("key_file", secret("Client private key.")),
            (
                "peer_verify",
                Attribute::bool("Verify the certificate of the peer."),
            ),
            (
                "use_system_cert_store",
                Attribute::bool("Use the certificate store of the system.")
                    .json("use-system-cert-store"),
            ),
            (
                "cipher_suite",
                Attribute::string("Cipher suite to use.").json("cipher-suite"),
            ),
            (
                "sni",
                Attribute::bool("Send the server name indication extension."),
            ),
        ]),
    )
}

/// Schema of a [`DiskBuffer`].
pub fn disk_buffer() -> Attribute {
    Attribute::single_nested(
        "Enables disk buffering for the destination.",
        attrs([
            (
                "disk_buf_size",
                Attribute::int64("Maximum size of the disk buffer in bytes.").required(),
            ),
            (
                "reliable",
                Attribute::bool("Use the reliable disk buffer.").required(),
            ),
            ("compaction", Attribute::bool("Prunes unused space in the buffer.")),
            ("dir", Attribute::string("Directory of the disk buffer files.")),
            (
                "mem_buf_length",
                Attribute::int64("Number of messages kept in memory."),
            ),
            ("mem_buf_size", Attribute::int64("Size of the memory buffer in bytes.")),
            ("q_out_size", Attribute::int64("Number of messages in the output queue.")),
        ]),
    )
}

/// Attributes of a [`Destination`].
pub fn destination_attributes() -> Attributes {
    attrs([
        (
            "persist_name",
            Attribute::string("Unique name for the persist file of the destination."),
        ),
        (
            "log_fifo_size",
            Attribute::int64("Number of messages the output queue can store.")
                .json("log-fifo-size")
                .validator(Validator::Int64Between(0, i64::from(u32::MAX))),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use super::secret as secret_attribute;
    use crate::schema::Schema;

    #[test]
    fn secret_uses_operator_field_names() {
        let secret: Secret = serde_json::from_value(json!({
            "valueFrom": {"secretKeyRef": {"name": "loggly", "key": "token"}}
        }))
        .unwrap();
        let selector = secret.value_from.unwrap().secret_key_ref.unwrap();
        assert_eq!(selector.name.as_deref(), Some("loggly"));
        assert_eq!(selector.key, "token");

        let state = json!({
            "value": null,
            "value_from": {"secret_key_ref": {"key": "token", "name": "loggly", "optional": null}},
            "mount_from": null,
        });
        let schema = Schema::new("test", attrs([("secret", secret_attribute("password"))]));
        let json = schema.state_to_json(&json!({ "secret": state }));
        assert_eq!(
            json,
            json!({"secret": {"valueFrom": {"secretKeyRef": {"key": "token", "name": "loggly"}}}})
        );
    }

    #[test]
    fn inline_secret_values_are_sensitive() {
        let attribute = secret("password");
        assert!(attribute.nested().unwrap()["value"].sensitive);
    }

    #[test]
    fn tls_keeps_dashed_names() {
        let tls: Tls = serde_json::from_value(json!({
            "use-system-cert-store": true,
            "cipher-suite": "ECDHE",
        }))
        .unwrap();
        assert_eq!(tls.use_system_cert_store, Some(true));
        assert_eq!(tls.cipher_suite.as_deref(), Some("ECDHE"));
        let out = serde_json::to_value(&tls).unwrap();
        assert_eq!(out, json!({"use-system-cert-store": true, "cipher-suite": "ECDHE"}));
    }

    #[test]
    fn fifo_size_must_not_be_negative() {
        let schema = Schema::new("test", destination_attributes());
        let diagnostics = schema.validate(&json!({"log_fifo_size": -1}));
        assert!(diagnostics.has_error());
        let json = schema.state_to_json(&json!({"persist_name": "out", "log_fifo_size": 1000}));
        let destination: Destination = serde_json::from_value(json).unwrap();
        assert_eq!(destination.log_fifo_size, Some(1000));
    }
}
