use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::error::{Error, Result};
use crate::model::DEFAULT_FIELD_MANAGER;
use crate::schema::{attrs, Attribute, Schema, Validator};

/// Provider-level configuration. Every field is optional: with none set the
/// client is configured the way `kubectl` would be, from `KUBECONFIG`,
/// `~/.kube/config` or the in-cluster service account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Path to a kubeconfig file. A leading `~` is the home directory.
    pub kubeconfig: Option<PathBuf>,
    /// Context to use from the kubeconfig instead of its current context.
    pub context: Option<String>,
    pub cluster: Option<String>,
    pub user: Option<String>,
    /// Field manager for resources that do not set their own.
    pub field_manager: Option<String>,
}

impl ProviderConfig {
    pub fn schema() -> Schema {
        Schema::new(
            "Provider for Kubernetes custom resources of the logging operator.",
            attrs([
                (
                    "kubeconfig",
                    Attribute::string(
                        "Path to a kubeconfig file, a leading '~' is the home directory. Defaults \
                         to KUBECONFIG, ~/.kube/config or the in-cluster configuration.",
                    ),
                ),
                (
                    "context",
                    Attribute::string("Kubeconfig context to use instead of the current one."),
                ),
                ("cluster", Attribute::string("Kubeconfig cluster to use.")),
                ("user", Attribute::string("Kubeconfig user to use.")),
                (
                    "field_manager",
                    Attribute::string(format!(
                        "Default field manager for server-side apply. Defaults to '{}'.",
                        DEFAULT_FIELD_MANAGER
                    ))
                    .validator(Validator::LengthBetween(1, 128)),
                ),
            ]),
        )
    }

    pub fn field_manager(&self) -> &str {
        self.field_manager.as_deref().unwrap_or(DEFAULT_FIELD_MANAGER)
    }

    fn options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        }
    }

    fn has_overrides(&self) -> bool {
        self.context.is_some() || self.cluster.is_some() || self.user.is_some()
    }

    pub async fn kube_config(&self) -> Result<Config> {
        let config = match &self.kubeconfig {
            Some(path) => {
                let path = expand_home(path);
                event!(Level::DEBUG, kubeconfig = %path.display(), "Loading kubeconfig.");
                let kubeconfig = Kubeconfig::read_from(&path)?;
                Config::from_custom_kubeconfig(kubeconfig, &self.options()).await?
            }
            None if self.has_overrides() => Config::from_kubeconfig(&self.options()).await?,
            None => Config::infer().await?,
        };
        Ok(config)
    }

    pub async fn client(&self) -> Result<Client> {
        let config = self.kube_config().await?;
        event!(
            Level::INFO,
            cluster_url = %config.cluster_url,
            default_namespace = %config.default_namespace,
            "Configured Kubernetes client."
        );
        Client::try_from(config).map_err(Error::Client)
    }

    /// Builds the data handed to every resource.
    pub async fn provider_data(&self) -> Result<ProviderData> {
        Ok(ProviderData {
            client: self.client().await?,
            field_manager: self.field_manager().to_owned(),
        })
    }
}

/// Expands a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs_next::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_owned(),
    }
}

/// What a configured provider passes on to its resources.
#[derive(Clone)]
pub struct ProviderData {
    pub client: Client,
    pub field_manager: String,
}

impl ProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            field_manager: DEFAULT_FIELD_MANAGER.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
- name: dev
  cluster:
    server: https://dev.example.com:6443
- name: prod
  cluster:
    server: https://prod.example.com:6443
contexts:
- name: dev
  context:
    cluster: dev
    user: admin
    namespace: logging
- name: prod
  context:
    cluster: prod
    user: admin
users:
- name: admin
  user:
    token: secret
"#;

    fn write_kubeconfig() -> PathBuf {
        let path = std::env::temp_dir().join(format!("k8s-provider-{}.yaml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(KUBECONFIG.as_bytes()).unwrap();
        path
    }

    #[test]
    fn deserializes_from_provider_block() {
        let config: ProviderConfig = serde_json::from_value(json!({
            "kubeconfig": "/etc/kube/config",
            "context": "prod",
            "cluster": null,
        }))
        .unwrap();
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/etc/kube/config")));
        assert_eq!(config.context.as_deref(), Some("prod"));
        assert_eq!(config.field_manager(), DEFAULT_FIELD_MANAGER);
    }

    #[tokio::test]
    async fn loads_explicit_kubeconfig_with_context_override() {
        let path = write_kubeconfig();

        let config = ProviderConfig {
            kubeconfig: Some(path.clone()),
            ..ProviderConfig::default()
        };
        let kube_config = config.kube_config().await.unwrap();
        assert_eq!(kube_config.cluster_url.host(), Some("dev.example.com"));
        assert_eq!(kube_config.default_namespace, "logging");

        let config = ProviderConfig {
            kubeconfig: Some(path),
            context: Some("prod".to_owned()),
            ..ProviderConfig::default()
        };
        let kube_config = config.kube_config().await.unwrap();
        assert_eq!(kube_config.cluster_url.host(), Some("prod.example.com"));
        assert_eq!(kube_config.default_namespace, "default");
    }

    #[test]
    fn kubeconfig_path_expands_home() {
        let absolute = PathBuf::from("/etc/kube/config");
        assert_eq!(expand_home(&absolute), absolute);
        assert_eq!(expand_home(Path::new("~user/config")), PathBuf::from("~user/config"));
        if let Some(home) = dirs_next::home_dir() {
            assert_eq!(expand_home(Path::new("~/.kube/config")), home.join(".kube/config"));
            assert_eq!(expand_home(Path::new("~")), home);
        }
    }

    #[tokio::test]
    async fn missing_kubeconfig_is_an_error() {
        let config = ProviderConfig {
            kubeconfig: Some(PathBuf::from("/nonexistent/kubeconfig")),
            ..ProviderConfig::default()
        };
        let err = config.kube_config().await.unwrap_err();
        assert!(matches!(err, Error::Kubeconfig(_)));
        assert_eq!(err.summary(), "Unable to create Kubernetes client");
    }
}
