use super::{created, metadata, state};
use crate::client::{paths, KeyPairProperties, ResourceRequest, ResourceResponse};
use crate::controller::reconciler::{ReferenceKind, Reconcilable, RemoteContext, RemoteCreated};
use crate::crd::ArubaKeyPair;
use crate::error::Error;
use async_trait::async_trait;

impl ArubaKeyPair {
    fn request(&self) -> ResourceRequest<KeyPairProperties> {
        ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            KeyPairProperties {
                value: self.spec.value.clone(),
            },
        )
    }

    fn path(&self) -> String {
        let status = self.status.clone().unwrap_or_default();
        paths::key_pair(&status.project_id, &status.resource.resource_id)
    }
}

#[async_trait]
impl Reconcilable for ArubaKeyPair {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let project_id = remote
            .resolver
            .resolve(ReferenceKind::Project, &self.spec.project_reference)
            .await?;

        let response: ResourceResponse = remote
            .api
            .post(&paths::key_pairs(&project_id), &self.request())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;
    use crate::client::{ApiClient, Method};
    use crate::controller::reconciler::testing::FakeLookup;
    use crate::controller::reconciler::DependencyResolver;
    use crate::crd::{ArubaKeyPairSpec, Location, ResourceReference};
    use std::sync::Arc;

    const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIOps ops@example";

    fn key_pair() -> ArubaKeyPair {
        let mut obj = ArubaKeyPair::new(
            "ops",
            ArubaKeyPairSpec {
                tenant: "ARU-1".to_string(),
                tags: Vec::new(),
                location: Location {
                    value: "ITBG-Bergamo".to_string(),
                },
                value: PUBLIC_KEY.to_string(),
                project_reference: ResourceReference::new("payments"),
            },
        );
        obj.metadata.namespace = Some("team-a".to_string());
        obj
    }

    #[tokio::test]
    async fn test_create_uploads_public_key() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(
            Method::Post,
            &paths::key_pairs("prj-1"),
            201,
            r#"{"metadata":{"id":"kp-1","name":"ops"}}"#,
        );
        let lookup = FakeLookup::default().with(ReferenceKind::Project, "team-a", "payments", "prj-1");
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let mut obj = key_pair();
        let created = obj.create_remote(&remote).await.unwrap();
        assert_eq!(created.id, "kp-1");

        let calls = transport.calls_to(Method::Post, "/projects/prj-1/providers/Aruba.Compute/keyPairs");
        assert_eq!(calls.len(), 1);
        let body = calls[0].body.clone().unwrap();
        assert_eq!(body["properties"]["value"], PUBLIC_KEY);
        assert_eq!(body["metadata"]["location"]["value"], "ITBG-Bergamo");
        assert_eq!(obj.status.as_ref().unwrap().project_id, "prj-1");
    }

    #[tokio::test]
    async fn test_rejected_create_leaves_status_untouched() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(
            Method::Post,
            &paths::key_pairs("prj-1"),
            400,
            r#"{"title":"Bad Request","detail":"invalid public key"}"#,
        );
        let lookup = FakeLookup::default().with(ReferenceKind::Project, "team-a", "payments", "prj-1");
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let mut obj = key_pair();
        let err = obj.create_remote(&remote).await.unwrap_err();
        assert_eq!(err.api().map(|api| api.status), Some(400));
        assert!(obj.status.is_none());
    }

    #[tokio::test]
    async fn test_update_puts_to_key_pair_item() {
        let transport = Arc::new(FakeTransport::new());
        let item = paths::key_pair("prj-1", "kp-1");
        transport.respond(Method::Put, &item, 200, "{}");
        let lookup = FakeLookup::default();
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let mut obj = key_pair();
        let status = obj.status.get_or_insert_with(Default::default);
        status.resource.resource_id = "kp-1".to_string();
        status.project_id = "prj-1".to_string();

        obj.update_remote(&remote, true).await.unwrap();
        assert_eq!(transport.calls_to(Method::Put, &item).len(), 1);
    }
}
