//! The provider: configuration plus a registry of resource handlers,
//! addressed by their full Terraform type names.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{event, Level};

use crate::config::{ProviderConfig, ProviderData};
use crate::error::{Diagnostics, Error, Result};
use crate::logging_banzaicloud_io::{ClusterFlowV1Beta1, SyslogNgOutputV1Beta1};
use crate::resource::{Handler, ManifestResource, ResourceHandler};
use crate::schema::Schema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    pub type_name: String,
    pub version: String,
}

pub struct Provider {
    version: String,
    data: Option<ProviderData>,
    resources: BTreeMap<String, Box<dyn ResourceHandler>>,
}

impl Provider {
    /// Prefix of every resource type name.
    pub const TYPE_NAME: &'static str = "k8s";

    /// Creates an unconfigured provider with every supported resource
    /// registered.
    pub fn new(version: impl Into<String>) -> Self {
        let mut provider = Self {
            version: version.into(),
            data: None,
            resources: BTreeMap::new(),
        };
        provider.register::<ClusterFlowV1Beta1>();
        provider.register::<SyslogNgOutputV1Beta1>();
        provider
    }

    /// Registers `R` under `<provider>_<R::TYPE_NAME>`, replacing any
    /// handler already registered under that name.
    pub fn register<R: ManifestResource>(&mut self) {
        let handler: Box<dyn ResourceHandler> = Box::new(Handler::<R>::new());
        self.resources.insert(full_type_name(handler.type_name()), handler);
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: Self::TYPE_NAME.to_owned(),
            version: self.version.clone(),
        }
    }

    pub fn schema(&self) -> Schema {
        ProviderConfig::schema()
    }

    pub fn is_configured(&self) -> bool {
        self.data.is_some()
    }

    /// Configures the provider from its configuration block, keyed by
    /// attribute name. On failure the provider stays unconfigured.
    pub async fn configure(&mut self, config: Value) -> Diagnostics {
        let schema = ProviderConfig::schema();
        let mut diagnostics = schema.validate(&config);
        if diagnostics.has_error() {
            return diagnostics;
        }
        let config: ProviderConfig = match serde_json::from_value(schema.state_to_json(&config)) {
            Ok(config) => config,
            Err(source) => {
                diagnostics.extend(
                    Error::State {
                        type_name: Self::TYPE_NAME.to_owned(),
                        source,
                    }
                    .into(),
                );
                return diagnostics;
            }
        };
        match config.provider_data().await {
            Ok(data) => {
                event!(
                    Level::INFO,
                    field_manager = %data.field_manager,
                    "Provider configured."
                );
                self.data = Some(data);
            }
            Err(err) => {
                event!(Level::ERROR, err = %err, "Provider configuration error.");
                diagnostics.extend(err.into());
            }
        }
        diagnostics
    }

    /// Configures the provider with an existing client.
    pub fn configure_with(&mut self, data: ProviderData) {
        self.data = Some(data);
    }

    /// Full type names of the registered resources, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn resource_schema(&self, type_name: &str) -> Result<Schema, Diagnostics> {
        Ok(self.handler(type_name)?.schema())
    }

    pub fn validate_resource_config(&self, type_name: &str, config: &Value) -> Diagnostics {
        match self.handler(type_name) {
            Ok(handler) => handler.schema().validate(config),
            Err(err) => err.into(),
        }
    }

    pub async fn create(&self, type_name: &str, plan: Value) -> Result<Value, Diagnostics> {
        let handler = self.handler(type_name)?;
        Ok(handler.create(self.data()?, plan).await?)
    }

    /// Returns `None` when the object no longer exists.
    pub async fn read(&self, type_name: &str, state: Value) -> Result<Option<Value>, Diagnostics> {
        let handler = self.handler(type_name)?;
        Ok(handler.read(self.data()?, state).await?)
    }

    pub async fn update(&self, type_name: &str, plan: Value) -> Result<Value, Diagnostics> {
        let handler = self.handler(type_name)?;
        Ok(handler.update(self.data()?, plan).await?)
    }

    pub async fn delete(&self, type_name: &str, state: Value) -> Result<(), Diagnostics> {
        let handler = self.handler(type_name)?;
        Ok(handler.delete(self.data()?, state).await?)
    }

    pub fn import_state(&self, type_name: &str, id: &str) -> Result<Value, Diagnostics> {
        Ok(self.handler(type_name)?.import_state(id)?)
    }

    fn handler(&self, type_name: &str) -> Result<&dyn ResourceHandler> {
        self.resources
            .get(type_name)
            .map(Box::as_ref)
            .ok_or_else(|| Error::UnknownResourceType(type_name.to_owned()))
    }

    fn data(&self) -> Result<&ProviderData> {
        self.data.as_ref().ok_or(Error::NotConfigured)
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

fn full_type_name(type_name: &str) -> String {
    format!("{}_{}", Provider::TYPE_NAME, type_name)
}

#[cfg(test)]
mod tests {
    use kube::{Client, Config};
    use serde_json::json;

    use super::*;

    const CLUSTER_FLOW: &str = "k8s_logging_banzaicloud_io_cluster_flow_v1beta1";
    const SYSLOG_NG_OUTPUT: &str = "k8s_logging_banzaicloud_io_syslog_ng_output_v1beta1";

    fn flow() -> Value {
        json!({
            "metadata": {"name": "all", "namespace": "logging"},
            "spec": {"global_output_refs": ["syslog"]},
        })
    }

    fn summaries(diagnostics: &Diagnostics) -> Vec<&str> {
        diagnostics.iter().map(|d| d.summary.as_str()).collect()
    }

    #[test]
    fn registers_logging_resources() {
        let provider = Provider::default();
        assert_eq!(provider.metadata().type_name, "k8s");
        assert_eq!(
            provider.resource_types().collect::<Vec<_>>(),
            vec![CLUSTER_FLOW, SYSLOG_NG_OUTPUT]
        );
        let schema = provider.resource_schema(SYSLOG_NG_OUTPUT).unwrap();
        assert!(schema.attribute("spec").is_some());
        assert!(schema.attribute("id").unwrap().computed);
    }

    #[test]
    fn unknown_resource_type() {
        let provider = Provider::default();
        let diagnostics = provider.resource_schema("k8s_widget_v1").unwrap_err();
        assert_eq!(summaries(&diagnostics), vec!["Unknown resource type"]);
    }

    #[test]
    fn validates_resource_config() {
        let provider = Provider::default();
        assert!(provider
            .validate_resource_config(CLUSTER_FLOW, &flow())
            .is_empty());

        let diagnostics = provider.validate_resource_config(
            CLUSTER_FLOW,
            &json!({"metadata": {"name": "All_Flows"}, "id": "x"}),
        );
        assert_eq!(diagnostics.errors().count(), 3);

        let long_name = format!("{}.example.com", "a".repeat(64));
        assert!(provider
            .validate_resource_config(
                CLUSTER_FLOW,
                &json!({"metadata": {"name": long_name, "namespace": "logging"}}),
            )
            .is_empty());
    }

    #[test]
    fn imports_without_configuration() {
        let provider = Provider::default();
        let state = provider.import_state(CLUSTER_FLOW, "logging/all").unwrap();
        assert_eq!(state["id"], json!("logging/all"));

        let diagnostics = provider.import_state(CLUSTER_FLOW, "all").unwrap_err();
        assert_eq!(summaries(&diagnostics), vec!["Unexpected Import Identifier"]);
    }

    #[tokio::test]
    async fn operations_require_configuration() {
        let provider = Provider::default();
        let diagnostics = provider.create(CLUSTER_FLOW, flow()).await.unwrap_err();
        assert_eq!(summaries(&diagnostics), vec!["Unexpected Resource Configure Type"]);
        let diagnostics = provider.delete(CLUSTER_FLOW, flow()).await.unwrap_err();
        assert!(diagnostics.has_error());
    }

    #[tokio::test]
    async fn configure_reports_bad_kubeconfig() {
        let mut provider = Provider::default();
        let diagnostics = provider
            .configure(json!({"kubeconfig": "/nonexistent/kubeconfig"}))
            .await;
        assert_eq!(summaries(&diagnostics), vec!["Unable to create Kubernetes client"]);
        assert!(!provider.is_configured());

        let diagnostics = provider.configure(json!({"field_manager": ""})).await;
        assert_eq!(summaries(&diagnostics), vec!["Invalid Attribute Value"]);
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn reports_api_errors() {
        let config = Config::new("http://127.0.0.1:1".parse().unwrap());
        let mut provider = Provider::default();
        provider.configure_with(ProviderData::new(Client::try_from(config).unwrap()));

        let diagnostics = provider.create(CLUSTER_FLOW, flow()).await.unwrap_err();
        assert_eq!(summaries(&diagnostics), vec!["Error patching resource"]);
        assert!(diagnostics.iter().next().unwrap().detail.contains("ClusterFlow all"));

        let diagnostics = provider.read(CLUSTER_FLOW, flow()).await.unwrap_err();
        assert_eq!(summaries(&diagnostics), vec!["Error reading resource"]);

        let diagnostics = provider.delete(CLUSTER_FLOW, flow()).await.unwrap_err();
        assert_eq!(summaries(&diagnostics), vec!["Error deleting resource"]);
    }
}
