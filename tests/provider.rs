use k8s_provider::logging_banzaicloud_io::common::Destination;
use k8s_provider::logging_banzaicloud_io::syslog_ng_output_v1beta1::SyslogOutput;
use k8s_provider::logging_banzaicloud_io::{SyslogNGOutput, SyslogNGOutputSpec, SyslogNgOutputV1Beta1};
use k8s_provider::{ManifestResource, Provider};
use serde_json::json;

const SYSLOG_NG_OUTPUT: &str = "k8s_logging_banzaicloud_io_syslog_ng_output_v1beta1";

#[test]
fn schema_is_served_by_type_name() {
    let provider = Provider::new("1.2.3");
    assert_eq!(provider.metadata().version, "1.2.3");

    let schema = provider.resource_schema(SYSLOG_NG_OUTPUT).unwrap();
    let metadata = schema.attribute("metadata").unwrap().nested().unwrap();
    assert!(metadata["name"].required);
    assert!(metadata["namespace"].required);

    let rendered = serde_json::to_value(&schema).unwrap();
    assert_eq!(
        rendered["attributes"]["spec"]["kind"]["type"],
        json!("single_nested")
    );
}

#[test]
fn imported_state_validates_once_read() {
    let provider = Provider::default();
    let mut state = provider
        .import_state(SYSLOG_NG_OUTPUT, "logging/remote")
        .unwrap();
    assert_eq!(state["metadata"]["name"], json!("remote"));

    state["spec"] = json!({"syslog": {"host": "10.0.0.1", "transport": "udp"}});
    let diagnostics = provider.validate_resource_config(SYSLOG_NG_OUTPUT, &state);
    assert!(diagnostics.errors().all(|d| d.summary == "Invalid Configuration for Read-Only Attribute"));
}

#[test]
fn object_matches_operator_manifest() {
    let spec = SyslogNGOutputSpec {
        syslog: Some(SyslogOutput {
            host: Some("10.0.0.1".to_owned()),
            port: Some(601),
            transport: Some("tcp".to_owned()),
            destination: Destination {
                log_fifo_size: Some(1000),
                ..Destination::default()
            },
            ..SyslogOutput::default()
        }),
        ..SyslogNGOutputSpec::default()
    };
    let mut object: SyslogNGOutput = SyslogNgOutputV1Beta1::to_object(Default::default(), spec);
    object.metadata.name = Some("remote".to_owned());
    object.metadata.namespace = Some("logging".to_owned());

    assert_eq!(
        serde_json::to_value(&object).unwrap(),
        json!({
            "apiVersion": "logging.banzaicloud.io/v1beta1",
            "kind": "SyslogNGOutput",
            "metadata": {"name": "remote", "namespace": "logging"},
            "spec": {"syslog": {
                "host": "10.0.0.1",
                "log-fifo-size": 1000,
                "port": 601,
                "transport": "tcp",
            }},
        })
    );
}
