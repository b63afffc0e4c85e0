//! # Resource Store
//!
//! Access to the declarative store holding the custom resources: load by key, write the
//! status subresource and write finalizers. Both writes carry the object's
//! `resourceVersion`, so a stale write fails with [`StoreError::Conflict`] instead of
//! overwriting a newer object.

use crate::crd::ManagedResource;
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The object changed since it was read
    #[error("conflict writing {namespace}/{name}: the object has been modified")]
    Conflict { namespace: String, name: String },

    #[error("object {namespace}/{name} has no resourceVersion")]
    MissingVersion { namespace: String, name: String },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to serialize status: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait ResourceStore<K: ManagedResource>: Send + Sync {
    /// Load an object, `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError>;

    /// Write the status subresource, returning the stored object
    async fn update_status(&self, obj: &K) -> Result<K, StoreError>;

    /// Write `metadata.finalizers`, returning the stored object
    async fn update(&self, obj: &K) -> Result<K, StoreError>;
}

/// [`ResourceStore`] backed by the Kubernetes API
pub struct KubeStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

impl<K: ManagedResource> KubeStore<K> {
    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Namespace, name and resourceVersion a write is guarded with
fn write_target<K: ManagedResource>(obj: &K) -> Result<(String, String, String), StoreError> {
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();
    match obj.resource_version() {
        Some(version) => Ok((namespace, name, version)),
        None => Err(StoreError::MissingVersion { namespace, name }),
    }
}

fn map_write_error(err: kube::Error, namespace: &str, name: &str) -> StoreError {
    match err {
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => StoreError::Kube(other),
    }
}

#[async_trait]
impl<K: ManagedResource> ResourceStore<K> for KubeStore<K> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn update_status(&self, obj: &K) -> Result<K, StoreError> {
        let (namespace, name, version) = write_target(obj)?;
        let patch = json!({
            "metadata": { "resourceVersion": version },
            "status": obj.status_json()?,
        });
        debug!(
            resource.name = name.as_str(),
            resource.namespace = namespace.as_str(),
            resource.version = version.as_str(),
            "store.update_status"
        );
        self.api(&namespace)
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_write_error(e, &namespace, &name))
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        let (namespace, name, version) = write_target(obj)?;
        let patch = json!({
            "metadata": {
                "resourceVersion": version,
                "finalizers": obj.finalizers(),
            },
        });
        debug!(
            resource.name = name.as_str(),
            resource.namespace = namespace.as_str(),
            finalizers = ?obj.finalizers(),
            "store.update_finalizers"
        );
        self.api(&namespace)
            .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_write_error(e, &namespace, &name))
    }
}
