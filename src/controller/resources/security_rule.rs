use super::{created, metadata, state};
use crate::client::{paths, ResourceRequest, ResourceResponse, SecurityRuleProperties};
use crate::controller::reconciler::{ReferenceKind, Reconcilable, RemoteContext, RemoteCreated};
use crate::crd::ArubaSecurityRule;
use crate::error::Error;
use async_trait::async_trait;

impl ArubaSecurityRule {
    fn request(&self) -> ResourceRequest<SecurityRuleProperties> {
        ResourceRequest::new(
            metadata(self, &self.spec.tags, Some(&self.spec.location)),
            SecurityRuleProperties {
                protocol: self.spec.protocol.clone(),
                port: self.spec.port.clone(),
                direction: self.spec.direction.clone(),
                target: self.spec.target.clone(),
            },
        )
    }

    fn path(&self) -> String {
        let status = self.status.clone().unwrap_or_default();
        paths::security_rule(
            &status.project_id,
            &status.vpc_id,
            &status.security_group_id,
            &status.resource.resource_id,
        )
    }
}

#[async_trait]
impl Reconcilable for ArubaSecurityRule {
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error> {
        let resolver = remote.resolver;
        let project_id = resolver
            .resolve(ReferenceKind::Project, &self.spec.project_reference)
            .await?;
        let vpc_id = resolver
            .resolve(ReferenceKind::Vpc, &self.spec.vpc_reference)
            .await?;
        let security_group_id = resolver
            .resolve(ReferenceKind::SecurityGroup, &self.spec.security_group_reference)
            .await?;

        let response: ResourceResponse = remote
            .api
            .post(
                &paths::security_rules(&project_id, &vpc_id, &security_group_id),
                &self.request(),
            )
            .await?;

        let status = self.status.get_or_insert_with(Default::default);
        status.project_id = project_id;
        status.vpc_id = vpc_id;
        status.security_group_id = security_group_id;
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
    use crate::crd::{ArubaSecurityRuleSpec, Location, ResourceReference, SecurityRuleTarget};
    use std::sync::Arc;

    fn rule() -> ArubaSecurityRule {
        let mut obj = ArubaSecurityRule::new(
            "allow-https",
            ArubaSecurityRuleSpec {
                tenant: "ARU-1".to_string(),
                tags: Vec::new(),
                location: Location {
                    value: "ITBG-Bergamo".to_string(),
                },
                protocol: "TCP".to_string(),
                port: "443".to_string(),
                direction: "Ingress".to_string(),
                target: SecurityRuleTarget {
                    kind: "Ip".to_string(),
                    value: "0.0.0.0/0".to_string(),
                },
                security_group_reference: ResourceReference::new("web"),
                vpc_reference: ResourceReference::new("main"),
                project_reference: ResourceReference::new("payments"),
            },
        );
        obj.metadata.namespace = Some("team-a".to_string());
        obj
    }

    #[tokio::test]
    async fn test_create_resolves_whole_parent_chain() {
        let transport = Arc::new(FakeTransport::new());
        let collection = paths::security_rules("prj-1", "vpc-1", "sg-1");
        transport.respond(
            Method::Post,
            &collection,
            201,
            r#"{"metadata":{"id":"rule-1"},"status":{"state":"Active"}}"#,
        );
        let lookup = FakeLookup::default()
            .with(ReferenceKind::Project, "team-a", "payments", "prj-1")
            .with(ReferenceKind::Vpc, "team-a", "main", "vpc-1")
            .with(ReferenceKind::SecurityGroup, "team-a", "web", "sg-1");
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let mut obj = rule();
        let created = obj.create_remote(&remote).await.unwrap();
        assert_eq!(created.id, "rule-1");
        assert_eq!(created.state.as_deref(), Some("Active"));

        let status = obj.status.as_ref().unwrap();
        assert_eq!(status.security_group_id, "sg-1");
        let body = transport.calls_to(Method::Post, &collection)[0].body.clone().unwrap();
        assert_eq!(body["properties"]["target"]["value"], "0.0.0.0/0");
        assert_eq!(body["properties"]["port"], "443");
    }

    #[tokio::test]
    async fn test_create_without_ready_group_sends_nothing() {
        let transport = Arc::new(FakeTransport::new());
        let lookup = FakeLookup::default()
            .with(ReferenceKind::Project, "team-a", "payments", "prj-1")
            .with(ReferenceKind::Vpc, "team-a", "main", "vpc-1")
            .with(ReferenceKind::SecurityGroup, "team-a", "web", "");
        let api = ApiClient::new(transport.clone(), "bearer-1");
        let resolver = DependencyResolver::new(&lookup, "team-a");
        let remote = RemoteContext { api: &api, resolver: &resolver };

        let err = rule().create_remote(&remote).await.unwrap_err();
        assert!(matches!(err, Error::DependencyNotReady { .. }));
        assert!(transport.calls().is_empty());
    }
}
