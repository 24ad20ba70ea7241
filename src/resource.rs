use std::fmt::Debug;
use std::marker::PhantomData;

use futures::future::FutureExt;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, ApiResource, DeleteParams, DynamicObject, Patch, PatchParams};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{event, Level};

use crate::config::ProviderData;
use crate::error::{Error, Result};
use crate::model::ResourceData;
use crate::schema::Schema;
use crate::wait::{self, PollError, ReadyError};

/// The [`ManifestResource`] trait describes one kind of custom resource the
/// provider manages. Implementations carry no behavior of their own: they
/// name the resource, describe its schema and convert between the typed
/// object and its parts. The lifecycle ([`create`], [`read`], [`update`],
/// [`delete`] and [`import_state`]) is shared by every kind.
pub trait ManifestResource: Send + Sync + 'static {
    /// The Kubernetes object, usually generated with
    /// `#[derive(kube::CustomResource)]`.
    type Object: Resource<DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    /// The `spec` of [`Self::Object`].
    type Spec: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// The resource type name without the provider prefix, for instance
    /// `logging_banzaicloud_io_cluster_flow_v1beta1`.
    const TYPE_NAME: &'static str;

    /// Whether objects of this kind live in a namespace.
    const NAMESPACED: bool = true;

    /// The full schema of the resource, including the common attributes.
    fn schema() -> Schema;

    fn to_object(metadata: ObjectMeta, spec: Self::Spec) -> Self::Object;

    fn into_parts(object: Self::Object) -> (ObjectMeta, Self::Spec);

    /// Whether the operator reports the object as ready. Only consulted
    /// when the resource asks to wait after create and update. The default
    /// implementation accepts every object.
    fn is_ready(object: &Self::Object) -> bool {
        // use a better name for the parameter name in the docs
        let _object = object;

        true
    }
}

fn kind<R: ManifestResource>() -> String {
    R::Object::kind(&()).into_owned()
}

fn api<R: ManifestResource>(client: kube::Client, namespace: Option<&str>) -> Api<DynamicObject> {
    let resource = ApiResource::erase::<R::Object>(&());
    match namespace {
        Some(namespace) if R::NAMESPACED => Api::namespaced_with(client, namespace, &resource),
        _ => Api::all_with(client, &resource),
    }
}

fn parse<R: ManifestResource>(object: &DynamicObject) -> Result<R::Object, serde_json::Error> {
    serde_json::to_value(object).and_then(serde_json::from_value)
}

fn absorb<R: ManifestResource>(
    data: ResourceData<R::Spec>,
    object: R::Object,
) -> ResourceData<R::Spec> {
    let (meta, spec) = R::into_parts(object);
    data.absorb(R::Object::api_version(&()).into_owned(), kind::<R>(), meta, spec)
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}

/// Creates the object with server-side apply and returns the state built
/// from the API server's response.
pub async fn create<R: ManifestResource>(
    provider: &ProviderData,
    data: ResourceData<R::Spec>,
) -> Result<ResourceData<R::Spec>> {
    apply::<R>(provider, data, "create").await
}

/// Updates the object. Server-side apply is idempotent, so this is the same
/// request as [`create`].
pub async fn update<R: ManifestResource>(
    provider: &ProviderData,
    data: ResourceData<R::Spec>,
) -> Result<ResourceData<R::Spec>> {
    apply::<R>(provider, data, "update").await
}

async fn apply<R: ManifestResource>(
    provider: &ProviderData,
    data: ResourceData<R::Spec>,
    operation: &'static str,
) -> Result<ResourceData<R::Spec>> {
    let kind = kind::<R>();
    let name = data.metadata.name.clone();
    let object = R::to_object(
        data.metadata.to_object_meta(),
        data.spec.clone().unwrap_or_default(),
    );
    let body = serde_json::to_value(&object).map_err(|source| Error::Marshal {
        kind: kind.clone(),
        name: name.clone(),
        source,
    })?;

    let field_manager = data.field_manager(&provider.field_manager);
    let mut params = PatchParams::apply(field_manager);
    if data.force_conflicts() {
        params = params.force();
    }
    event!(
        Level::INFO,
        resource_name = %name,
        resource_type = R::TYPE_NAME,
        field_manager = %field_manager,
        force = data.force_conflicts(),
        "Applying {} ({}).",
        kind,
        operation
    );

    let api = api::<R>(provider.client.clone(), data.metadata.namespace.as_deref());
    let mut response = api
        .patch(&name, &params, &Patch::Apply(&body))
        .await
        .map_err(|source| Error::Patch {
            kind: kind.clone(),
            name: name.clone(),
            source,
        })?;

    if let Some(wait_for) = &data.wait_for_upsert {
        let limit = wait_for.timeout();
        event!(
            Level::INFO,
            resource_name = %name,
            resource_type = R::TYPE_NAME,
            "Waiting up to {:?} for {} to become ready.",
            limit,
            kind
        );
        let ready = |object: &DynamicObject| parse::<R>(object).map_or(false, |o| R::is_ready(&o));
        response = wait::until_ready(api, &name, limit, ready)
            .await
            .map_err(|err| match err {
                ReadyError::TimedOut(timeout) => Error::Timeout {
                    kind: kind.clone(),
                    name: name.clone(),
                    timeout,
                    what: "become ready",
                },
                ReadyError::Vanished => Error::Vanished {
                    kind: kind.clone(),
                    name: name.clone(),
                },
                ReadyError::Watch(source) => Error::Watch {
                    kind: kind.clone(),
                    name: name.clone(),
                    source,
                },
            })?;
    }

    let object = parse::<R>(&response).map_err(|source| Error::Unmarshal {
        kind: kind.clone(),
        name: name.clone(),
        source,
    })?;
    Ok(absorb::<R>(data, object))
}

/// Refreshes the state from the API server. Returns `None` when the object
/// no longer exists, so that it is removed from state and planned for
/// creation again.
pub async fn read<R: ManifestResource>(
    provider: &ProviderData,
    data: ResourceData<R::Spec>,
) -> Result<Option<ResourceData<R::Spec>>> {
    let kind = kind::<R>();
    let name = data.metadata.name.clone();
    let api = api::<R>(provider.client.clone(), data.metadata.namespace.as_deref());
    event!(
        Level::DEBUG,
        resource_name = %name,
        resource_type = R::TYPE_NAME,
        "Reading {}.",
        kind
    );
    let response = api.get_opt(&name).await.map_err(|source| Error::Get {
        kind: kind.clone(),
        name: name.clone(),
        source,
    })?;
    let Some(response) = response else {
        event!(
            Level::WARN,
            resource_name = %name,
            resource_type = R::TYPE_NAME,
            "{} no longer exists, removing it from state.",
            kind
        );
        return Ok(None);
    };
    let object = parse::<R>(&response).map_err(|source| Error::Unmarshal { kind, name, source })?;
    Ok(Some(absorb::<R>(data, object)))
}

/// Deletes the object. An object that is already gone counts as deleted.
/// When the state asks for it, waits until the API server no longer returns
/// the object, which matters for foreground propagation and finalizers.
pub async fn delete<R: ManifestResource>(
    provider: &ProviderData,
    data: ResourceData<R::Spec>,
) -> Result<()> {
    let kind = kind::<R>();
    let name = data.metadata.name.clone();
    let api = api::<R>(provider.client.clone(), data.metadata.namespace.as_deref());
    let params = DeleteParams {
        propagation_policy: Some(data.deletion_propagation().into()),
        ..DeleteParams::default()
    };
    event!(
        Level::INFO,
        resource_name = %name,
        resource_type = R::TYPE_NAME,
        propagation = ?data.deletion_propagation(),
        "Deleting {}.",
        kind
    );
    match api.delete(&name, &params).await {
        Ok(_) => {}
        Err(err) if is_not_found(&err) => {
            event!(
                Level::INFO,
                resource_name = %name,
                resource_type = R::TYPE_NAME,
                "{} was already deleted.",
                kind
            );
            return Ok(());
        }
        Err(source) => return Err(Error::Delete { kind, name, source }),
    }

    let Some(wait_for) = &data.wait_for_delete else {
        return Ok(());
    };
    wait::until_absent(&api, &name, wait_for.timeout(), wait_for.poll_interval())
        .await
        .map_err(|err| match err {
            PollError::TimedOut(timeout) => Error::Timeout {
                kind: kind.clone(),
                name: name.clone(),
                timeout,
                what: "be deleted",
            },
            PollError::Check(source) => Error::Get {
                kind: kind.clone(),
                name: name.clone(),
                source,
            },
        })
}

/// Seeds state from an import identifier; the framework reads the object
/// right after.
pub fn import_state<R: ManifestResource>(id: &str) -> Result<ResourceData<R::Spec>> {
    ResourceData::from_import(id, R::NAMESPACED)
}

/// Object-safe view of a [`ManifestResource`], working on the untyped
/// values the provider protocol exchanges. Values are keyed by attribute
/// name and carry every attribute of the schema.
#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync {
    /// The resource type name without the provider prefix.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, provider: &ProviderData, plan: Value) -> Result<Value>;

    async fn read(&self, provider: &ProviderData, state: Value) -> Result<Option<Value>>;

    async fn update(&self, provider: &ProviderData, plan: Value) -> Result<Value>;

    async fn delete(&self, provider: &ProviderData, state: Value) -> Result<()>;

    fn import_state(&self, id: &str) -> Result<Value>;
}

/// [`ResourceHandler`] for any [`ManifestResource`].
pub struct Handler<R> {
    schema: Schema,
    _resource: PhantomData<fn() -> R>,
}

impl<R: ManifestResource> Handler<R> {
    pub fn new() -> Self {
        Self {
            schema: R::schema(),
            _resource: PhantomData,
        }
    }

    fn decode(&self, value: &Value) -> Result<ResourceData<R::Spec>> {
        serde_json::from_value(self.schema.state_to_json(value)).map_err(|source| Error::State {
            type_name: R::TYPE_NAME.to_owned(),
            source,
        })
    }

    fn encode(&self, data: &ResourceData<R::Spec>) -> Result<Value> {
        serde_json::to_value(data)
            .map(|json| self.schema.json_to_state(&json))
            .map_err(|source| Error::State {
                type_name: R::TYPE_NAME.to_owned(),
                source,
            })
    }
}

impl<R: ManifestResource> Default for Handler<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn log_outcome<T>(type_name: &'static str, operation: &'static str, result: &Result<T>) {
    match result {
        Ok(_) => event!(
            Level::DEBUG,
            resource_type = type_name,
            "{} successful.",
            operation
        ),
        Err(err) => event!(
            Level::ERROR,
            err = %err,
            source = std::error::Error::source(err),
            resource_type = type_name,
            "{} error.",
            operation
        ),
    }
}

#[async_trait::async_trait]
impl<R: ManifestResource> ResourceHandler for Handler<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    async fn create(&self, provider: &ProviderData, plan: Value) -> Result<Value> {
        let data = self.decode(&plan)?;
        let data = create::<R>(provider, data)
            .inspect(|result| log_outcome(R::TYPE_NAME, "create", result))
            .await?;
        self.encode(&data)
    }

    async fn read(&self, provider: &ProviderData, state: Value) -> Result<Option<Value>> {
        let data = self.decode(&state)?;
        let data = read::<R>(provider, data)
            .inspect(|result| log_outcome(R::TYPE_NAME, "read", result))
            .await?;
        data.map(|data| self.encode(&data)).transpose()
    }

    async fn update(&self, provider: &ProviderData, plan: Value) -> Result<Value> {
        let data = self.decode(&plan)?;
        let data = update::<R>(provider, data)
            .inspect(|result| log_outcome(R::TYPE_NAME, "update", result))
            .await?;
        self.encode(&data)
    }

    async fn delete(&self, provider: &ProviderData, state: Value) -> Result<()> {
        let data = self.decode(&state)?;
        delete::<R>(provider, data)
            .inspect(|result| log_outcome(R::TYPE_NAME, "delete", result))
            .await
    }

    fn import_state(&self, id: &str) -> Result<Value> {
        let data = import_state::<R>(id)?;
        self.encode(&data)
    }
}
