use super::{created, metadata, state};
use crate::client::{paths, ResourceRequest, ResourceResponse, SecurityGroupProperties};
use crate::controller::reconciler::{ReferenceKind, Reconcilable, RemoteContext, RemoteCreated};
use crate::crd::ArubaSecurityGroup;
use crate::error::Error;
use async_trait::async_trait;

impl ArubaSecurityGroup {
    fn request(&self) -> ResourceRequest<SecurityGroupProperties> {
        ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            SecurityGroupProperties {
                default: self.spec.default,
            },
        )
    }

    fn path(&self) -> String {
        let status = self.status.clone().unwrap_or_default();
        paths::security_group(&status.project_id, &status.vpc_id, &status.resource.resource_id)
    }
}

#[async_trait]
impl Reconcilable for ArubaSecurityGroup {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let project_id = remote
            .resolver
            .resolve(ReferenceKind::Project, &self.spec.project_reference)
            .await?;
        let vpc_id = remote
            .resolver
            .resolve(ReferenceKind::Vpc, &self.spec.vpc_reference)
            .await?;

        let response: ResourceResponse = remote
            .api
            .post(&paths::security_groups(&project_id, &vpc_id), &self.request())
            .await?;

        let status = self.status.get_or_insert_with(Default::default);
        status.project_id = project_id;
        status.vpc_id = vpc_id;
        Ok(created(&response))
    }

    async fn remote_state(&self, remote: &RemoteContext<'_>) -> Result<Option<String>, Error> {
        let response: ResourceResponse = remote.api.get(&self.path()).await?;
        Ok(state(&response))
    }

    async fn update_remote(
        &mut self,
        remote: &RemoteContext<'_>,
        _spec_changed: bool,
    ) -> Result<(), Error> {
        remote.api.put_no_content(&self.path(), &self.request()).await
    }

    async fn delete_remote(&self, remote: &RemoteContext<'_>) -> Result<(), Error> {
        remote.api.delete(&self.path()).await
    }
}
