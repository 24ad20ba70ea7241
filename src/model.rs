//! The state model shared by every custom resource the provider manages.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PropagationPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{attrs, Attribute, Attributes, ElementType, PlanModifier, Validator};

pub const DEFAULT_FIELD_MANAGER: &str = "terraform-provider-k8s";

const DEFAULT_DELETE_TIMEOUT: u64 = 30;
const DEFAULT_DELETE_POLL_INTERVAL: u64 = 5;
const DEFAULT_UPSERT_TIMEOUT: u64 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPropagation {
    Orphan,
    #[default]
    Background,
    Foreground,
}

impl From<DeletionPropagation> for PropagationPolicy {
    fn from(propagation: DeletionPropagation) -> Self {
        match propagation {
            DeletionPropagation::Orphan => PropagationPolicy::Orphan,
            DeletionPropagation::Background => PropagationPolicy::Background,
            DeletionPropagation::Foreground => PropagationPolicy::Foreground,
        }
    }
}

/// Whether, and for how long, to wait for an object to disappear after it
/// was deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForDelete {
    pub timeout_seconds: Option<u64>,
    pub poll_interval_seconds: Option<u64>,
}

impl WaitForDelete {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_DELETE_TIMEOUT))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_seconds
                .unwrap_or(DEFAULT_DELETE_POLL_INTERVAL)
                .max(1),
        )
    }
}

/// Wait after create and update until the operator reports the object as
/// ready.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForUpsert {
    pub timeout_seconds: Option<u64>,
}

impl WaitForUpsert {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_UPSERT_TIMEOUT))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: Option<String>,
    pub labels: Option<BTreeMap<String, String>>,
    pub annotations: Option<BTreeMap<String, String>>,
}

impl Metadata {
    pub fn to_object_meta(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            namespace: self.namespace.clone(),
            labels: self.labels.clone(),
            annotations: self.annotations.clone(),
            ..ObjectMeta::default()
        }
    }

    /// Takes the fields the provider manages from an object returned by the
    /// API server. Empty label and annotation maps are treated as unset.
    pub fn from_object_meta(meta: ObjectMeta) -> Self {
        Self {
            name: meta.name.unwrap_or_default(),
            namespace: meta.namespace,
            labels: meta.labels.filter(|labels| !labels.is_empty()),
            annotations: meta.annotations.filter(|annotations| !annotations.is_empty()),
        }
    }

    /// Like [`Metadata::from_object_meta`], but keeps a label or annotation
    /// map the plan set explicitly empty, since the API server never
    /// returns empty maps.
    pub fn absorb(&self, meta: ObjectMeta) -> Self {
        let metadata = Self::from_object_meta(meta);
        Self {
            labels: metadata.labels.or_else(|| planned_empty(&self.labels)),
            annotations: metadata
                .annotations
                .or_else(|| planned_empty(&self.annotations)),
            ..metadata
        }
    }

    pub fn id(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}/{}", namespace, self.name),
            None => self.name.clone(),
        }
    }
}

fn planned_empty(planned: &Option<BTreeMap<String, String>>) -> Option<BTreeMap<String, String>> {
    planned.as_ref().filter(|map| map.is_empty()).cloned()
}

/// Provider state of one custom resource: the settings controlling how the
/// provider talks to the API server, plus the object itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData<S> {
    pub id: Option<String>,
    pub force_conflicts: Option<bool>,
    pub field_manager: Option<String>,
    pub deletion_propagation: Option<DeletionPropagation>,
    pub wait_for_upsert: Option<WaitForUpsert>,
    pub wait_for_delete: Option<WaitForDelete>,
    pub api_version: Option<String>,
    pub kind: Option<String>,
    pub metadata: Metadata,
    pub spec: Option<S>,
}

impl<S> ResourceData<S> {
    pub fn force_conflicts(&self) -> bool {
        self.force_conflicts.unwrap_or(false)
    }

    /// The field manager for server-side apply, falling back to
    /// `default` when the resource does not set one.
    pub fn field_manager<'a>(&'a self, default: &'a str) -> &'a str {
        self.field_manager.as_deref().unwrap_or(default)
    }

    pub fn deletion_propagation(&self) -> DeletionPropagation {
        self.deletion_propagation.unwrap_or_default()
    }

    /// Seeds state from an import identifier. The object itself is filled
    /// in by the read that follows the import.
    pub fn from_import(id: &str, namespaced: bool) -> Result<Self> {
        let (namespace, name) = parse_import_id(id, namespaced)?;
        let metadata = Metadata {
            name,
            namespace,
            ..Metadata::default()
        };
        Ok(Self {
            id: Some(metadata.id()),
            force_conflicts: Some(false),
            field_manager: None,
            deletion_propagation: None,
            wait_for_upsert: None,
            wait_for_delete: None,
            api_version: None,
            kind: None,
            metadata,
            spec: None,
        })
    }

    /// Replaces the object part of the state with what the API server
    /// returned, keeping the provider settings.
    pub fn absorb(self, api_version: String, kind: String, meta: ObjectMeta, spec: S) -> Self {
        let metadata = self.metadata.absorb(meta);
        Self {
            id: Some(metadata.id()),
            api_version: Some(api_version),
            kind: Some(kind),
            metadata,
            spec: Some(spec),
            ..self
        }
    }
}

/// Splits an import identifier into namespace and name. Namespaced kinds
/// are imported as `<namespace>/<name>`, cluster-scoped ones as `<name>`.
pub fn parse_import_id(id: &str, namespaced: bool) -> Result<(Option<String>, String)> {
    let parts: Vec<&str> = id.split('/').collect();
    match (namespaced, parts.as_slice()) {
        (true, [namespace, name]) if !namespace.is_empty() && !name.is_empty() => {
            Ok((Some((*namespace).to_owned()), (*name).to_owned()))
        }
        (true, _) => Err(Error::ImportId {
            id: id.to_owned(),
            reason: "expected <namespace>/<name>",
        }),
        (false, [name]) if !name.is_empty() => Ok((None, (*name).to_owned())),
        (false, _) => Err(Error::ImportId {
            id: id.to_owned(),
            reason: "expected <name>",
        }),
    }
}

/// Attributes every resource schema starts with. `spec` is added by the
/// resource itself.
pub fn common_attributes(kind: &str, namespaced: bool) -> Attributes {
    let mut namespace = Attribute::string(format!(
        "Namespace defines the space within which the {} name must be unique.",
        kind
    ))
    .validator(Validator::Dns1123Label)
    .plan_modifier(PlanModifier::RequiresReplace);
    if namespaced {
        namespace = namespace.required();
    }
    attrs([
        (
            "id",
            Attribute::string("Contains the value 'metadata.namespace/metadata.name'.")
                .computed()
                .plan_modifier(PlanModifier::UseStateForUnknown),
        ),
        (
            "force_conflicts",
            Attribute::bool(
                "If 'true', server-side apply will force the changes against conflicts.",
            )
            .optional_computed()
            .default_value(false),
        ),
        (
            "field_manager",
            Attribute::string(format!(
                "The name of the manager used to track field ownership. Defaults to '{}'.",
                DEFAULT_FIELD_MANAGER
            ))
            .optional_computed()
            .validator(Validator::LengthBetween(1, 128)),
        ),
        (
            "deletion_propagation",
            Attribute::string(
                "Decides if a deletion will propagate to the dependents of the object, and how \
                 the garbage collector will handle the propagation.",
            )
            .validator(Validator::one_of(["Orphan", "Foreground", "Background"])),
        ),
        (
            "wait_for_upsert",
            Attribute::single_nested(
                format!("Wait until the operator reports the {} as active.", kind),
                attrs([(
                    "timeout_seconds",
                    Attribute::int64("How long to wait. Defaults to 60 seconds.")
                        .validator(Validator::Int64Between(1, 3600)),
                )]),
            ),
        ),
        (
            "wait_for_delete",
            Attribute::single_nested(
                format!("Wait until the {} is gone after deleting it.", kind),
                attrs([
                    (
                        "timeout_seconds",
                        Attribute::int64("How long to wait. Defaults to 30 seconds.")
                            .validator(Validator::Int64Between(1, 3600)),
                    ),
                    (
                        "poll_interval_seconds",
                        Attribute::int64("How often to check. Defaults to 5 seconds.")
                            .validator(Validator::Int64Between(1, 600)),
                    ),
                ]),
            ),
        ),
        (
            "api_version",
            Attribute::string("The API group and version of the object.").computed(),
        ),
        ("kind", Attribute::string("The kind of the object.").computed()),
        (
            "metadata",
            Attribute::single_nested(
                "Data that helps uniquely identify the object.",
                attrs([
                    (
                        "name",
                        Attribute::string(format!(
                            "Unique name of the {} within its namespace.",
                            kind
                        ))
                        .required()
                        .validator(Validator::Dns1123Subdomain)
                        .plan_modifier(PlanModifier::RequiresReplace),
                    ),
                    ("namespace", namespace),
                    (
                        "labels",
                        Attribute::map(
                            ElementType::String,
                            "Map of string keys and values used to organize and categorize objects.",
                        ),
                    ),
                    (
                        "annotations",
                        Attribute::map(
                            ElementType::String,
                            "Unstructured key value map stored with the object.",
                        ),
                    ),
                ]),
            )
            .required(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn import_ids() {
        assert_eq!(
            parse_import_id("logging/all", true).unwrap(),
            (Some("logging".to_owned()), "all".to_owned())
        );
        assert_eq!(parse_import_id("all", false).unwrap(), (None, "all".to_owned()));
        assert!(matches!(
            parse_import_id("all", true),
            Err(Error::ImportId { .. })
        ));
        assert!(parse_import_id("/all", true).is_err());
        assert!(parse_import_id("logging/", true).is_err());
        assert!(parse_import_id("a/b/c", true).is_err());
        assert!(parse_import_id("logging/all", false).is_err());
        assert!(parse_import_id("", false).is_err());
    }

    #[test]
    fn from_import_seeds_identity() {
        let data = ResourceData::<()>::from_import("logging/all", true).unwrap();
        assert_eq!(data.id.as_deref(), Some("logging/all"));
        assert_eq!(data.metadata.name, "all");
        assert_eq!(data.metadata.namespace.as_deref(), Some("logging"));
        assert_eq!(data.force_conflicts, Some(false));
        assert!(data.spec.is_none());
    }

    #[test]
    fn absorb_keeps_provider_settings() {
        let data = ResourceData {
            force_conflicts: Some(true),
            field_manager: Some("ci".to_owned()),
            wait_for_delete: Some(WaitForDelete::default()),
            metadata: Metadata {
                name: "all".to_owned(),
                namespace: Some("logging".to_owned()),
                ..Metadata::default()
            },
            spec: Some(1),
            ..ResourceData::default()
        };
        let meta = ObjectMeta {
            name: Some("all".to_owned()),
            namespace: Some("logging".to_owned()),
            labels: Some(BTreeMap::from([("team".to_owned(), "ops".to_owned())])),
            annotations: Some(BTreeMap::new()),
            uid: Some("1234".to_owned()),
            ..ObjectMeta::default()
        };
        let data = data.absorb(
            "logging.banzaicloud.io/v1beta1".to_owned(),
            "ClusterFlow".to_owned(),
            meta,
            2,
        );
        assert_eq!(data.id.as_deref(), Some("logging/all"));
        assert_eq!(data.kind.as_deref(), Some("ClusterFlow"));
        assert_eq!(data.spec, Some(2));
        assert!(data.force_conflicts());
        assert_eq!(data.field_manager(DEFAULT_FIELD_MANAGER), "ci");
        assert_eq!(data.metadata.labels.unwrap()["team"], "ops");
        assert_eq!(data.metadata.annotations, None);
    }

    #[test]
    fn absorb_keeps_planned_empty_maps() {
        let planned = Metadata {
            name: "all".to_owned(),
            namespace: Some("logging".to_owned()),
            labels: Some(BTreeMap::new()),
            annotations: None,
        };
        let meta = ObjectMeta {
            name: Some("all".to_owned()),
            namespace: Some("logging".to_owned()),
            annotations: Some(BTreeMap::new()),
            ..ObjectMeta::default()
        };
        let metadata = planned.absorb(meta.clone());
        assert_eq!(metadata.labels, Some(BTreeMap::new()));
        assert_eq!(metadata.annotations, None);

        let planned = Metadata {
            labels: Some(BTreeMap::from([("team".to_owned(), "ops".to_owned())])),
            ..planned
        };
        assert_eq!(planned.absorb(meta).labels, None);
    }

    #[test]
    fn defaults() {
        let data: ResourceData<()> = serde_json::from_value(json!({
            "metadata": {"name": "all", "namespace": "logging"},
            "wait_for_delete": {},
        }))
        .unwrap();
        assert!(!data.force_conflicts());
        assert_eq!(data.field_manager("fallback"), "fallback");
        assert_eq!(data.deletion_propagation(), DeletionPropagation::Background);
        let wait = data.wait_for_delete.unwrap();
        assert_eq!(wait.timeout(), Duration::from_secs(30));
        assert_eq!(wait.poll_interval(), Duration::from_secs(5));
        assert_eq!(WaitForUpsert::default().timeout(), Duration::from_secs(60));
    }

    #[test]
    fn deletion_propagation_parses_kubernetes_names() {
        let propagation: DeletionPropagation = serde_json::from_value(json!("Foreground")).unwrap();
        assert_eq!(propagation, DeletionPropagation::Foreground);
        assert!(serde_json::from_value::<DeletionPropagation>(json!("foreground")).is_err());
    }

    #[test]
    fn namespace_is_required_only_for_namespaced_kinds() {
        let namespaced = common_attributes("ClusterFlow", true);
        let metadata = namespaced["metadata"].nested().unwrap();
        assert!(metadata["namespace"].required);

        let cluster = common_attributes("Logging", false);
        let metadata = cluster["metadata"].nested().unwrap();
        assert!(!metadata["namespace"].required);
    }
}
