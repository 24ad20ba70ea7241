use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Every failure the provider can report. Errors from the Kubernetes client
/// are carried through unchanged as the `source` of the matching variant.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("failed to infer kubernetes configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("failed to create kubernetes client: {0}")]
    Client(#[source] kube::Error),

    #[error("the provider has not been configured")]
    NotConfigured,

    #[error("unknown resource type {0}")]
    UnknownResourceType(String),

    #[error("invalid {type_name} value: {source}")]
    State {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to marshal {kind} {name}: {source}")]
    Marshal {
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to unmarshal {kind} {name}: {source}")]
    Unmarshal {
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to apply {kind} {name}: {source}")]
    Patch {
        kind: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to get {kind} {name}: {source}")]
    Get {
        kind: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to delete {kind} {name}: {source}")]
    Delete {
        kind: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to watch {kind} {name}: {source}")]
    Watch {
        kind: String,
        name: String,
        #[source]
        source: kube_runtime::wait::Error,
    },

    #[error("{kind} {name} was deleted while waiting for it to become ready")]
    Vanished { kind: String, name: String },

    #[error("timed out after {timeout:?} waiting for {kind} {name} to {what}")]
    Timeout {
        kind: String,
        name: String,
        timeout: Duration,
        what: &'static str,
    },

    #[error("unexpected import identifier {id:?}: {reason}")]
    ImportId { id: String, reason: &'static str },
}

impl Error {
    /// The one-line summary shown to users above the error detail.
    pub fn summary(&self) -> &'static str {
        match self {
            Error::Kubeconfig(_) | Error::InferConfig(_) | Error::Client(_) => {
                "Unable to create Kubernetes client"
            }
            Error::NotConfigured => "Unexpected Resource Configure Type",
            Error::UnknownResourceType(_) => "Unknown resource type",
            Error::State { .. } => "Error decoding resource state",
            Error::Marshal { .. } => "Error marshalling JSON",
            Error::Unmarshal { .. } => "Error unmarshalling JSON",
            Error::Patch { .. } => "Error patching resource",
            Error::Get { .. } => "Error reading resource",
            Error::Delete { .. } => "Error deleting resource",
            Error::Watch { .. } | Error::Vanished { .. } => "Error waiting for resource",
            Error::Timeout { .. } => "Timeout exceeded",
            Error::ImportId { .. } => "Unexpected Import Identifier",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathStep {
    Attribute(String),
    Index(usize),
}

/// Location of an attribute inside a configuration or state value, rendered
/// as `spec.filters[0].grep`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn attribute(&self, name: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Attribute(name.to_owned()));
        Self(steps)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index));
        Self(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attribute(name) => write!(f, ".{}", name)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// A single user-facing message produced by a provider operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    pub fn at(mut self, path: &AttributePath) -> Self {
        if !path.is_root() {
            self.attribute = Some(path.clone());
        }
        self
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let mut detail = err.to_string();
        let mut source = std::error::Error::source(err);
        // the top-level message already embeds the direct source
        if let Some(direct) = source {
            source = direct.source();
        }
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        Diagnostic::error(err.summary(), detail)
    }
}

/// Ordered collection of [`Diagnostic`]s. An operation failed when at least
/// one of them is an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }
}

impl From<Error> for Diagnostics {
    fn from(err: Error) -> Self {
        Self(vec![Diagnostic::from(&err)])
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
