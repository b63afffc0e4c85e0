use super::{created, metadata, state};
use crate::client::{paths, BlockStorageProperties, ResourceRequest, ResourceResponse};
use crate::controller::reconciler::{ReferenceKind, Reconcilable, RemoteContext, RemoteCreated};
use crate::crd::ArubaBlockStorage;
use crate::error::Error;
use async_trait::async_trait;

impl ArubaBlockStorage {
    fn path(&self) -> String {
        let status = self.status.clone().unwrap_or_default();
        paths::block_storage(&status.project_id, &status.resource.resource_id)
    }
}

#[async_trait]
impl Reconcilable for ArubaBlockStorage {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let project_id = remote
            .resolver
            .resolve(ReferenceKind::Project, &self.spec.project_reference)
            .await?;

        let request = ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            BlockStorageProperties {
                size_gb: self.spec.size_gb,
                billing_period: self.spec.billing_period.clone(),
                data_center: self.spec.data_center.clone(),
                volume_type: self.spec.r#type.clone(),
                bootable: self.spec.bootable,
                image: self.spec.image.clone(),
            },
        );
        let response: ResourceResponse = remote
            .api
            .post(&paths::block_storages(&project_id), &request)
            .await?;

        self.status.get_or_insert_with(Default::default).project_id = project_id;
        Ok(created(&response))
    }

    async fn remote_state(&self, remote: &RemoteContext<'_>) -> Result<Option<String>, Error> {
        let response: ResourceResponse = remote.api.get(&self.path()).await?;
        Ok(state(&response))
    }

    /// Type, bootability and image are fixed at creation and left out
    async fn update_remote(
        &mut self,
        remote: &RemoteContext<'_>,
        _spec_changed: bool,
    ) -> Result<(), Error> {
        let request = ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            BlockStorageProperties {
                size_gb: self.spec.size_gb,
                billing_period: self.spec.billing_period.clone(),
                data_center: self.spec.data_center.clone(),
                volume_type: String::new(),
                bootable: false,
                image: String::new(),
            },
        );
        remote.api.put_no_content(&self.path(), &request).await
    }

    async fn delete_remote(&self, remote: &RemoteContext<'_>) -> Result<(), Error> {
        remote.api.delete(&self.path()).await
    }
}
