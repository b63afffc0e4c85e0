use super::{created, metadata, state};
use crate::client::{paths, ElasticIpProperties, ResourceRequest, ResourceResponse};
use crate::controller::reconciler::{ReferenceKind, Reconcilable, RemoteContext, RemoteCreated};
use crate::crd::ArubaNetworkElasticIp;
use crate::error::Error;
use async_trait::async_trait;

impl ArubaNetworkElasticIp {
    fn request(&self) -> ResourceRequest<ElasticIpProperties> {
        ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            ElasticIpProperties {
                billing_plan: self.spec.billing_plan.clone(),
            },
        )
    }

    fn path(&self) -> String {
        let status = self.status.clone().unwrap_or_default();
        paths::elastic_ip(&status.project_id, &status.resource.resource_id)
    }
}

#[async_trait]
impl Reconcilable for ArubaNetworkElasticIp {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let project_id = remote
            .resolver
            .resolve(ReferenceKind::Project, &self.spec.project_reference)
            .await?;

        let response: ResourceResponse = remote
            .api
            .post(&paths::elastic_ips(&project_id), &self.request())
            .await?;

        self.status.get_or_insert_with(Default::default).project_id = project_id;
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
