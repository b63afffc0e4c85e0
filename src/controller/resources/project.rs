use super::{created, metadata, state};
use crate::client::{paths, ProjectProperties, ResourceRequest, ResourceResponse};
use crate::controller::reconciler::{Reconcilable, RemoteContext, RemoteCreated};
use crate::crd::ArubaProject;
use crate::error::Error;
use async_trait::async_trait;

impl ArubaProject {
    fn request(&self) -> ResourceRequest<ProjectProperties> {
        ResourceRequest::new(
            metadata(self, &self.spec.tags, None),
            ProjectProperties {
                description: self.spec.description.clone(),
                default: self.spec.default,
            },
        )
    }

    fn remote_id(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.resource.resource_id.as_str())
    }
}

#[async_trait]
impl Reconcilable for ArubaProject {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let response: ResourceResponse = remote.api.post(&paths::projects(), &self.request()).await?;
        Ok(created(&response))
    }

    async fn remote_state(&self, remote: &RemoteContext<'_>) -> Result<Option<String>, Error> {
        let response: ResourceResponse = remote.api.get(&paths::project(self.remote_id())).await?;
        Ok(state(&response))
    }

    async fn update_remote(
        &mut self,
        remote: &RemoteContext<'_>,
        _spec_changed: bool,
    ) -> Result<(), Error> {
        remote
            .api
            .put_no_content(&paths::project(self.remote_id()), &self.request())
            .await
    }

    async fn delete_remote(&self, remote: &RemoteContext<'_>) -> Result<(), Error> {
        remote.api.delete(&paths::project(self.remote_id())).await
    }
}
