use super::{created, metadata, state};
use crate::client::{paths, ResourceRequest, ResourceResponse, VpcProperties};
use crate::controller::reconciler::{ReferenceKind, Reconcilable, RemoteContext, RemoteCreated};
use crate::crd::ArubaVpc;
use crate::error::Error;
use async_trait::async_trait;

impl ArubaVpc {
    /// Project and VPC identifiers recorded in status
    fn remote_ids(&self) -> (&str, &str) {
        self.status.as_ref().map_or(("", ""), |status| {
            (status.project_id.as_str(), status.resource.resource_id.as_str())
        })
    }
}

#[async_trait]
impl Reconcilable for ArubaVpc {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let project_id = remote
            .resolver
            .resolve(ReferenceKind::Project, &self.spec.project_reference)
            .await?;

        let request = ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            VpcProperties {
                default: self.spec.default,
                preset: self.spec.preset,
            },
        );
        let response: ResourceResponse = remote.api.post(&paths::vpcs(&project_id), &request).await?;

        self.status.get_or_insert_with(Default::default).project_id = project_id;
        Ok(created(&response))
    }

    async fn remote_state(&self, remote: &RemoteContext<'_>) -> Result<Option<String>, Error> {
        let (project_id, vpc_id) = self.remote_ids();
        let response: ResourceResponse = remote.api.get(&paths::vpc(project_id, vpc_id)).await?;
        Ok(state(&response))
    }

    /// Only metadata can change on an existing VPC
    async fn update_remote(
        &mut self,
        remote: &RemoteContext<'_>,
        _spec_changed: bool,
    ) -> Result<(), Error> {
        let (project_id, vpc_id) = self.remote_ids();
        let request = ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            VpcProperties::default(),
        );
        remote
            .api
            .put_no_content(&paths::vpc(project_id, vpc_id), &request)
            .await
    }

    async fn delete_remote(&self, remote: &RemoteContext<'_>) -> Result<(), Error> {
        let (project_id, vpc_id) = self.remote_ids();
        remote.api.delete(&paths::vpc(project_id, vpc_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;
    use crate::client::{ApiClient, Method};
    use crate::controller::reconciler::testing::{vpc, FakeLookup};
    use crate::controller::reconciler::DependencyResolver;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_sends_flags_and_records_project() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(
            Method::Post,
            &paths::vpcs("prj-1"),
            201,
            r#"{"metadata":{"id":"vpc-1"},"status":{"state":"Active"}}"#,
        );
        let lookup = FakeLookup::default().with(ReferenceKind::Project, "team-a", "payments", "prj-1");
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let mut obj = vpc("main", 1);
        obj.spec.preset = true;
        let created = obj.create_remote(&remote).await.unwrap();
        assert_eq!(created.id, "vpc-1");
        assert_eq!(created.state.as_deref(), Some("Active"));

        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["properties"]["preset"], true);
        assert_eq!(body["properties"]["default"], false);
        assert_eq!(body["metadata"]["location"]["value"], "ITBG-Bergamo");
        assert_eq!(obj.status.as_ref().unwrap().project_id, "prj-1");
    }

    #[tokio::test]
    async fn test_update_sends_metadata_only() {
        let transport = Arc::new(FakeTransport::new());
        let item = paths::vpc("prj-1", "vpc-1");
        transport.respond(Method::Put, &item, 200, "{}");
        let lookup = FakeLookup::default();
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let mut obj = vpc("main", 2);
        obj.spec.preset = true;
        obj.spec.tags = vec!["blue".to_string()];
        let status = obj.status.get_or_insert_with(Default::default);
        status.resource.resource_id = "vpc-1".to_string();
        status.project_id = "prj-1".to_string();

        obj.update_remote(&remote, true).await.unwrap();
        let body = transport.calls_to(Method::Put, &item)[0].body.clone().unwrap();
        assert_eq!(body["metadata"]["tags"][0], "blue");
        assert_eq!(body["properties"]["preset"], false);
    }

    #[tokio::test]
    async fn test_missing_project_fails_before_any_call() {
        let transport = Arc::new(FakeTransport::new());
        let lookup = FakeLookup::default();
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let err = vpc("main", 1).create_remote(&remote).await.unwrap_err();
        assert!(matches!(err, Error::ReferenceNotFound { .. }));
        assert!(transport.calls().is_empty());
    }
}
