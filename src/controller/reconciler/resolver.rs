//! # Dependency Resolver
//!
//! Turns a [`ResourceReference`] into the remote identifier of the referenced object by
//! reading that object's status at resolution time. Nothing is cached: a reference that was
//! not ready on one pass is looked up again on the next.

use super::store::StoreError;
use crate::crd::{
    ArubaBlockStorage, ArubaKeyPair, ArubaNetworkElasticIp, ArubaProject, ArubaSecurityGroup,
    ArubaSubnet, ArubaVpc, ManagedResource, ResourceReference,
};
use crate::error::Error;
use async_trait::async_trait;
use kube::{Api, Client};
use tracing::debug;

/// Kinds a resource can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Project,
    Vpc,
    Subnet,
    SecurityGroup,
    KeyPair,
    ElasticIp,
    BlockStorage,
}

impl ReferenceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Project => "ArubaProject",
            ReferenceKind::Vpc => "ArubaVpc",
            ReferenceKind::Subnet => "ArubaSubnet",
            ReferenceKind::SecurityGroup => "ArubaSecurityGroup",
            ReferenceKind::KeyPair => "ArubaKeyPair",
            ReferenceKind::ElasticIp => "ArubaNetworkElasticIp",
            ReferenceKind::BlockStorage => "ArubaBlockStorage",
        }
    }
}

/// Reads the remote identifier recorded on a referenced object
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// `None` when the object does not exist, otherwise its `status.resourceID`
    /// (empty while it has not been created remotely)
    async fn resource_id(
        &self,
        kind: ReferenceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, StoreError>;
}

/// [`ReferenceLookup`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeLookup {
    client: Client,
}

impl KubeLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn read<K: ManagedResource>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, StoreError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let obj = api.get_opt(name).await?;
        Ok(obj.map(|obj| {
            obj.resource_status()
                .map(|status| status.resource_id.clone())
                .unwrap_or_default()
        }))
    }
}

#[async_trait]
impl ReferenceLookup for KubeLookup {
    async fn resource_id(
        &self,
        kind: ReferenceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, StoreError> {
        match kind {
            ReferenceKind::Project => self.read::<ArubaProject>(namespace, name).await,
            ReferenceKind::Vpc => self.read::<ArubaVpc>(namespace, name).await,
            ReferenceKind::Subnet => self.read::<ArubaSubnet>(namespace, name).await,
            ReferenceKind::SecurityGroup => self.read::<ArubaSecurityGroup>(namespace, name).await,
            ReferenceKind::KeyPair => self.read::<ArubaKeyPair>(namespace, name).await,
            ReferenceKind::ElasticIp => self.read::<ArubaNetworkElasticIp>(namespace, name).await,
            ReferenceKind::BlockStorage => self.read::<ArubaBlockStorage>(namespace, name).await,
        }
    }
}

/// Resolves references of one resource, defaulting to its namespace
pub struct DependencyResolver<'a> {
    lookup: &'a dyn ReferenceLookup,
    namespace: &'a str,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(lookup: &'a dyn ReferenceLookup, namespace: &'a str) -> Self {
        Self { lookup, namespace }
    }

    /// Remote identifier of the referenced object
    ///
    /// # Errors
    ///
    /// - [`Error::ReferenceNotFound`] if the object does not exist
    /// - [`Error::DependencyNotReady`] if it has no resource ID yet
    pub async fn resolve(
        &self,
        kind: ReferenceKind,
        reference: &ResourceReference,
    ) -> Result<String, Error> {
        let namespace = reference.namespace_or(self.namespace);
        let id = self
            .lookup
            .resource_id(kind, namespace, &reference.name)
            .await?;

        match id {
            None => Err(Error::reference_not_found(
                kind.as_str(),
                namespace,
                reference.name.as_str(),
            )),
            Some(id) if id.is_empty() => {
                debug!(
                    reference.kind = kind.as_str(),
                    reference.namespace = namespace,
                    reference.name = reference.name.as_str(),
                    "Referenced resource has no remote ID yet"
                );
                Err(Error::dependency_not_ready(
                    kind.as_str(),
                    namespace,
                    reference.name.as_str(),
                ))
            }
            Some(id) => Ok(id),
        }
    }

    /// Identifiers in reference order; fails on the first unresolvable reference
    pub async fn resolve_all(
        &self,
        kind: ReferenceKind,
        references: &[ResourceReference],
    ) -> Result<Vec<String>, Error> {
        let mut ids = Vec::with_capacity(references.len());
        for reference in references {
            ids.push(self.resolve(kind, reference).await?);
        }
        Ok(ids)
    }

    pub async fn resolve_optional(
        &self,
        kind: ReferenceKind,
        reference: Option<&ResourceReference>,
    ) -> Result<Option<String>, Error> {
        match reference {
            Some(reference) => self.resolve(kind, reference).await.map(Some),
            None => Ok(None),
        }
    }
}
