//! Log setup for the provider process.
//!
//! Terraform reads the plugin handshake from stdout, so logs always go to
//! stderr, where Terraform picks them up and applies its own `TF_LOG`
//! handling.

use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Maps a Terraform log level (`TF_LOG` style) to a filter directive.
fn terraform_level(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "JSON" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARN" => Some("warn"),
        "ERROR" => Some("error"),
        "OFF" => Some("off"),
        _ => None,
    }
}

fn directive(lookup: impl Fn(&str) -> Option<String>) -> String {
    for var in ["TF_LOG_PROVIDER", "TF_LOG"] {
        if let Some(level) = lookup(var).as_deref().and_then(terraform_level) {
            return level.to_owned();
        }
    }
    lookup("RUST_LOG")
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_owned())
}

/// Installs the global subscriber, failing if one is already set.
pub fn try_init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(directive(|var| env::var(var).ok()))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
}

/// Installs the global subscriber, keeping any subscriber already set.
pub fn init_logging() {
    let _ = try_init_logging();
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn provider_level_wins() {
        assert_eq!(
            directive(lookup(&[("TF_LOG_PROVIDER", "debug"), ("TF_LOG", "ERROR")])),
            "debug"
        );
        assert_eq!(directive(lookup(&[("TF_LOG", "JSON")])), "trace");
    }

    #[test]
    fn unknown_terraform_levels_fall_through() {
        assert_eq!(
            directive(lookup(&[("TF_LOG", "verbose"), ("RUST_LOG", "k8s_provider=trace")])),
            "k8s_provider=trace"
        );
        assert_eq!(directive(lookup(&[])), "info");
        assert_eq!(directive(lookup(&[("RUST_LOG", " ")])), "info");
    }
}
