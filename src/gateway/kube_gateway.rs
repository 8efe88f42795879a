//! Gateway backed by a live Kubernetes API server.

use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::runtime::{WatchStreamExt, watcher};
use kube::Client;
use serde_json::Value;
use tracing::debug;

use super::{Gateway, KindDescriptor, Resource};
use crate::error::GatewayError;

/// [`Gateway`] over `Api<DynamicObject>`, one instance per namespace.
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    namespace: String,
}

impl KubeGateway {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Create namespaced or cluster-wide API based on the kind's scope
    fn api(&self, kind: &KindDescriptor) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        if kind.is_namespaced() {
            Api::namespaced_with(self.client.clone(), &self.namespace, &ar)
        } else {
            Api::all_with(self.client.clone(), &ar)
        }
    }
}

impl Gateway for KubeGateway {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create(
        &self,
        kind: &KindDescriptor,
        name: &str,
        body: Value,
    ) -> Result<Resource, GatewayError> {
        let ar = kind.api_resource();
        let mut obj = DynamicObject::new(name, &ar);
        if kind.is_namespaced() {
            obj = obj.within(&self.namespace);
        }
        obj.data = body;

        debug!(kind = %kind, name = %name, "Creating resource");
        self.api(kind)
            .create(&PostParams::default(), &obj)
            .await
            .map_err(|e| GatewayError::from_kube(e, &ar.kind, name))
    }

    async fn get(&self, kind: &KindDescriptor, name: &str) -> Result<Resource, GatewayError> {
        self.api(kind)
            .get(name)
            .await
            .map_err(|e| GatewayError::from_kube(e, &kind.kind(), name))
    }

    async fn delete(&self, kind: &KindDescriptor, name: &str) -> Result<(), GatewayError> {
        debug!(kind = %kind, name = %name, "Deleting resource");
        self.api(kind)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| GatewayError::from_kube(e, &kind.kind(), name))
    }

    async fn list(
        &self,
        kind: &KindDescriptor,
        label_selector: &str,
    ) -> Result<Vec<Resource>, GatewayError> {
        let mut params = ListParams::default();
        if !label_selector.is_empty() {
            params = params.labels(label_selector);
        }
        self.api(kind)
            .list(&params)
            .await
            .map(|list| list.items)
            .map_err(|e| GatewayError::from_kube(e, &kind.kind(), label_selector))
    }

    fn watch(
        &self,
        kind: &KindDescriptor,
        label_selector: &str,
    ) -> BoxStream<'static, Result<Resource, GatewayError>> {
        let mut config = watcher::Config::default();
        if !label_selector.is_empty() {
            config = config.labels(label_selector);
        }
        let kind_name = kind.kind();
        let selector = label_selector.to_string();

        watcher(self.api(kind), config)
            .default_backoff()
            .applied_objects()
            .map_err(move |e| {
                GatewayError::RemoteUnavailable(format!(
                    "watch on {} {} failed: {}",
                    kind_name, selector, e
                ))
            })
            .boxed()
    }
}
