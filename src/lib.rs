#![allow(clippy::style)]
#![allow(clippy::complexity)]
#![allow(clippy::large_enum_variant)]
#![allow(clippy::mutable_key_type)]
#![allow(clippy::stable_sort_primitive)]
#![allow(clippy::map_entry)]
#![allow(clippy::box_default)]
#![warn(clippy::bool_comparison)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::no_effect)]
#![warn(clippy::unnecessary_unwrap)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::todo)]
#![warn(clippy::wildcard_dependencies)]
#![warn(clippy::zero_prefixed_literal)]
#![warn(clippy::borrowed_box)]
#![warn(clippy::deref_addrof)]
#![warn(clippy::double_must_use)]
#![warn(clippy::double_parens)]
#![warn(clippy::extra_unused_lifetimes)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_question_mark)]
#![warn(clippy::needless_return)]
#![warn(clippy::redundant_pattern)]
#![warn(clippy::redundant_slicing)]
#![warn(clippy::redundant_static_lifetimes)]
#![warn(clippy::single_component_path_imports)]
#![warn(clippy::unnecessary_cast)]
#![warn(clippy::useless_asref)]
#![warn(clippy::useless_conversion)]
#![warn(clippy::builtin_type_shadow)]
#![warn(clippy::duplicate_underscore_argument)]
#![warn(double_negations)]
#![warn(clippy::unnecessary_mut_passed)]
#![warn(clippy::wildcard_in_or_patterns)]
#![warn(clippy::crosspointer_transmute)]
#![warn(clippy::excessive_precision)]
#![warn(clippy::panicking_overflow_checks)]
#![warn(clippy::as_conversions)]
#![warn(clippy::match_overlapping_arm)]
#![warn(clippy::zero_divided_by_zero)]
#![warn(clippy::must_use_unit)]
#![warn(clippy::suspicious_assignment_formatting)]
#![warn(clippy::suspicious_else_formatting)]
#![warn(clippy::suspicious_unary_op_formatting)]
#![warn(clippy::mut_mutex_lock)]
#![warn(clippy::print_literal)]
#![warn(clippy::same_item_push)]
#![warn(clippy::useless_format)]
#![warn(clippy::write_literal)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::redundant_closure_call)]
#![warn(clippy::unnecessary_lazy_evaluations)]
#![warn(clippy::partialeq_ne_impl)]
#![warn(clippy::redundant_field_names)]
#![warn(clippy::transmutes_expressible_as_ptr_casts)]
#![warn(clippy::unused_async)]
#![warn(clippy::disallowed_methods)]
#![warn(clippy::disallowed_macros)]
#![warn(clippy::disallowed_types)]
#![warn(clippy::from_over_into)]

//! This crate exposes Kubernetes custom resources of the logging operator,
//! such as `ClusterFlow` and `SyslogNGOutput`, as Terraform-style managed
//! resources. Each kind is described once by implementing
//! [`ManifestResource`]; create, read, update, delete and import are
//! shared, and talk to the API server with server-side apply.
//!
//! Adding a kind means deriving the custom resource and describing its
//! schema:
//!
//! ```no_run
//! # use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
//! # use kube::CustomResource;
//! # use schemars::JsonSchema;
//! # use serde::{Deserialize, Serialize};
//! use k8s_provider::model::common_attributes;
//! use k8s_provider::schema::{attrs, Attribute};
//! use k8s_provider::{ManifestResource, Provider, Schema};
//!
//! #[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
//! #[kube(group = "logging.banzaicloud.io", version = "v1beta1", kind = "Output", namespaced)]
//! pub struct OutputSpec {
//!     #[serde(rename = "loggingRef")]
//!     pub logging_ref: Option<String>,
//! }
//!
//! struct OutputV1Beta1;
//!
//! impl ManifestResource for OutputV1Beta1 {
//!     type Object = Output;
//!     type Spec = OutputSpec;
//!
//!     const TYPE_NAME: &'static str = "logging_banzaicloud_io_output_v1beta1";
//!
//!     fn schema() -> Schema {
//!         let mut attributes = common_attributes("Output", true);
//!         attributes.insert(
//!             "spec".to_owned(),
//!             Attribute::single_nested(
//!                 "OutputSpec defines the desired state of Output.",
//!                 attrs([(
//!                     "logging_ref",
//!                     Attribute::string("Name of the Logging resource.").json("loggingRef"),
//!                 )]),
//!             ),
//!         );
//!         Schema::new("Output is the Schema for the outputs API", attributes)
//!     }
//!
//!     fn to_object(metadata: ObjectMeta, spec: OutputSpec) -> Output {
//!         Output { metadata, spec }
//!     }
//!
//!     fn into_parts(object: Output) -> (ObjectMeta, OutputSpec) {
//!         (object.metadata, object.spec)
//!     }
//! }
//!
//! # async fn run() {
//! k8s_provider::init_logging();
//! let mut provider = Provider::default();
//! provider.register::<OutputV1Beta1>();
//! let diagnostics = provider
//!     .configure(serde_json::json!({"context": "prod"}))
//!     .await;
//! assert!(!diagnostics.has_error());
//! let state = provider
//!     .create(
//!         "k8s_logging_banzaicloud_io_output_v1beta1",
//!         serde_json::json!({
//!             "metadata": {"name": "loki", "namespace": "logging"},
//!             "spec": {"logging_ref": "main"},
//!         }),
//!     )
//!     .await
//!     .unwrap();
//! println!("created {}", state["id"]);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod logging_banzaicloud_io;
pub mod model;
pub mod provider;
pub mod resource;
pub mod schema;
#[cfg(test)]
mod testing;
pub mod wait;

pub use config::{ProviderConfig, ProviderData};
pub use error::{Diagnostic, Diagnostics, Error, Result};
pub use logging::init_logging;
pub use provider::Provider;
pub use resource::{Handler, ManifestResource, ResourceHandler};
pub use schema::Schema;
