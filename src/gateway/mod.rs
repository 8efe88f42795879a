//! Resource gateway.
//!
//! A uniform create/get/delete/list/watch surface over named remote objects.
//! Built-in and custom kinds go through the same code path: the only thing
//! that varies between them is the [`KindDescriptor`] value. The gateway is a
//! pure translation layer; it never retries.

mod kind;
mod kube_gateway;
mod selector;

pub use kind::{BuiltinKind, CustomKind, KindDescriptor, LogicalKind, ResourceRef};
pub use kube_gateway::KubeGateway;
pub use selector::{JobSelector, JobType};

use std::future::Future;

use futures::stream::BoxStream;
use kube::api::DynamicObject;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GatewayError;

/// The remote object representation shared by every kind.
pub type Resource = DynamicObject;

/// CRUD and observation interface over one namespace of a remote API.
///
/// `NotFound` from [`delete`](Gateway::delete) means the object is already
/// gone; callers treat it as success.
pub trait Gateway: Sync {
    /// Namespace namespaced kinds are addressed in.
    fn namespace(&self) -> &str;

    /// Create `name` of `kind`. `body` holds the top-level fields other than
    /// `apiVersion`, `kind` and `metadata` (for example `{"spec": {...}}`).
    fn create(
        &self,
        kind: &KindDescriptor,
        name: &str,
        body: Value,
    ) -> impl Future<Output = Result<Resource, GatewayError>> + Send;

    fn get(
        &self,
        kind: &KindDescriptor,
        name: &str,
    ) -> impl Future<Output = Result<Resource, GatewayError>> + Send;

    fn delete(
        &self,
        kind: &KindDescriptor,
        name: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// List objects of `kind` matching a label selector (empty selects all).
    fn list(
        &self,
        kind: &KindDescriptor,
        label_selector: &str,
    ) -> impl Future<Output = Result<Vec<Resource>, GatewayError>> + Send;

    /// Stream objects of `kind` matching a label selector as they are
    /// observed, starting with the ones that already exist.
    fn watch(
        &self,
        kind: &KindDescriptor,
        label_selector: &str,
    ) -> BoxStream<'static, Result<Resource, GatewayError>>;
}

/// Build a create body carrying only a `spec`.
pub fn spec_body<S: serde::Serialize>(spec: &S) -> Result<Value, GatewayError> {
    Ok(serde_json::json!({ "spec": serde_json::to_value(spec)? }))
}

/// Reinterpret an observed object as a typed resource.
pub fn parse<K: DeserializeOwned>(obj: &Resource) -> Result<K, GatewayError> {
    Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
}

/// Name of an observed object (empty if the server omitted it).
pub fn name_of(obj: &Resource) -> &str {
    obj.metadata.name.as_deref().unwrap_or_default()
}
