//! Cloud server strategy
//!
//! Data volumes are not part of the create request: they are attached once the server
//! exists. In Created the desired volumes are compared against `status.dataVolumeIDs`
//! every pass and any difference moves the server to Updating, which sends one
//! attach/detach call for the whole difference.

use super::{created, metadata, state};
use crate::client::{
    paths, AttachDetachDataVolumesRequest, CloudServerProperties, ResourceRequest,
    ResourceResponse, UriReference,
};
use crate::controller::reconciler::volumes::diff;
use crate::controller::reconciler::{
    Drift, ReferenceKind, Reconcilable, RemoteContext, RemoteCreated,
};
use crate::crd::{ArubaCloudServer, ArubaCloudServerStatus};
use crate::error::Error;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::info;

/// Network attachments resolved from the spec
struct Attachments {
    subnet_ids: Vec<String>,
    security_group_ids: Vec<String>,
    elastic_ip_id: Option<String>,
}

impl Attachments {
    async fn resolve(server: &ArubaCloudServer, remote: &RemoteContext<'_>) -> Result<Self, Error> {
        let resolver = remote.resolver;
        Ok(Self {
            subnet_ids: resolver
                .resolve_all(ReferenceKind::Subnet, &server.spec.subnet_references)
                .await?,
            security_group_ids: resolver
                .resolve_all(ReferenceKind::SecurityGroup, &server.spec.security_group_references)
                .await?,
            elastic_ip_id: resolver
                .resolve_optional(ReferenceKind::ElasticIp, server.spec.elastic_ip_reference.as_ref())
                .await?,
        })
    }

    /// Subnet, security group and elastic IP links of a server in `vpc_id`
    fn properties(&self, project_id: &str, vpc_id: &str) -> CloudServerProperties {
        CloudServerProperties {
            elastic_ip: self
                .elastic_ip_id
                .as_deref()
                .map(|id| UriReference::new(paths::elastic_ip(project_id, id))),
            subnets: self
                .subnet_ids
                .iter()
                .map(|id| UriReference::new(paths::subnet(project_id, vpc_id, id)))
                .collect(),
            security_groups: self
                .security_group_ids
                .iter()
                .map(|id| UriReference::new(paths::security_group(project_id, vpc_id, id)))
                .collect(),
            ..CloudServerProperties::default()
        }
    }

    fn record(self, status: &mut ArubaCloudServerStatus) {
        status.subnet_ids = self.subnet_ids;
        status.security_group_ids = self.security_group_ids;
        status.elastic_ip_id = self.elastic_ip_id.unwrap_or_default();
    }
}

impl ArubaCloudServer {
    fn current_status(&self) -> ArubaCloudServerStatus {
        self.status.clone().unwrap_or_default()
    }

    fn path(&self) -> String {
        let status = self.current_status();
        paths::cloud_server(&status.project_id, &status.resource.resource_id)
    }

    async fn desired_data_volumes(&self, remote: &RemoteContext<'_>) -> Result<Vec<String>, Error> {
        let ids = remote
            .resolver
            .resolve_all(ReferenceKind::BlockStorage, &self.spec.data_volume_references)
            .await?;
        let mut seen = HashSet::new();
        Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).collect())
    }

    /// Attach and detach until the server carries exactly the desired data volumes
    async fn sync_data_volumes(&mut self, remote: &RemoteContext<'_>) -> Result<(), Error> {
        let desired = self.desired_data_volumes(remote).await?;
        let status = self.current_status();
        let (to_attach, to_detach) = diff(&desired, &status.data_volume_ids);
        if to_attach.is_empty() && to_detach.is_empty() {
            return Ok(());
        }

        let volume_uri = |id: &String| UriReference::new(paths::block_storage(&status.project_id, id));
        let request = AttachDetachDataVolumesRequest {
            volumes_to_attach: to_attach.iter().map(volume_uri).collect(),
            volumes_to_detach: to_detach.iter().map(volume_uri).collect(),
        };
        remote
            .api
            .post_no_content(
                &paths::cloud_server_data_volumes(&status.project_id, &status.resource.resource_id),
                &request,
            )
            .await?;

        info!(
            attached = to_attach.len(),
            detached = to_detach.len(),
            "Data volumes updated"
        );
        self.status.get_or_insert_with(Default::default).data_volume_ids = desired;
        Ok(())
    }
}

#[async_trait]
impl Reconcilable for ArubaCloudServer {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let resolver = remote.resolver;
        let project_id = resolver
            .resolve(ReferenceKind::Project, &self.spec.project_reference)
            .await?;
        let vpc_id = resolver
            .resolve(ReferenceKind::Vpc, &self.spec.vpc_reference)
            .await?;
        let boot_volume_id = resolver
            .resolve(ReferenceKind::BlockStorage, &self.spec.boot_volume_reference)
            .await?;
        let key_pair_id = resolver
            .resolve(ReferenceKind::KeyPair, &self.spec.key_pair_reference)
            .await?;
        let attachments = Attachments::resolve(self, remote).await?;

        let properties = CloudServerProperties {
            data_center: self.spec.data_center.clone(),
            vpc: Some(UriReference::new(paths::vpc(&project_id, &vpc_id))),
            boot_volume: Some(UriReference::new(paths::block_storage(&project_id, &boot_volume_id))),
            vpc_preset: self.spec.vpc_preset,
            flavor_name: self.spec.flavor_name.clone(),
            key_pair: Some(UriReference::new(paths::key_pair(&project_id, &key_pair_id))),
            ..attachments.properties(&project_id, &vpc_id)
        };
        let request = ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            properties,
        );
        let response: ResourceResponse = remote
            .api
            .post(&paths::cloud_servers(&project_id), &request)
            .await?;

        let status = self.status.get_or_insert_with(Default::default);
        status.project_id = project_id;
        status.vpc_id = vpc_id;
        status.boot_volume_id = boot_volume_id;
        status.key_pair_id = key_pair_id;
        attachments.record(status);
        Ok(created(&response))
    }

    async fn remote_state(&self, remote: &RemoteContext<'_>) -> Result<Option<String>, Error> {
        let response: ResourceResponse = remote.api.get(&self.path()).await?;
        Ok(state(&response))
    }

    /// Network attachments are re-sent only when the spec changed; data volumes are
    /// always reconciled
    async fn update_remote(
        &mut self,
        remote: &RemoteContext<'_>,
        spec_changed: bool,
    ) -> Result<(), Error> {
        if spec_changed {
            let status = self.current_status();
            let attachments = Attachments::resolve(self, remote).await?;
            let request = ResourceRequest::new(
                metadata(self, &self.spec.tags, Some(&self.spec.location)),
                attachments.properties(&status.project_id, &status.vpc_id),
            );
            remote.api.put_no_content(&self.path(), &request).await?;
            attachments.record(self.status.get_or_insert_with(Default::default));
        }

        self.sync_data_volumes(remote).await
    }

    async fn delete_remote(&self, remote: &RemoteContext<'_>) -> Result<(), Error> {
        remote.api.delete(&self.path()).await
    }

    async fn detect_drift(&self, remote: &RemoteContext<'_>) -> Result<Option<Drift>, Error> {
        let desired = self.desired_data_volumes(remote).await?;
        let current = self.current_status().data_volume_ids;
        let (to_attach, to_detach) = diff(&desired, &current);
        if to_attach.is_empty() && to_detach.is_empty() {
            return Ok(None);
        }
        Ok(Some(Drift {
            reason: "UpdatingDataVolumes",
            message: "Data volumes need to be updated".to_string(),
        }))
    }
}
