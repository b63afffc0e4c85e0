//! Request and response payloads of the Aruba Cloud API
//!
//! Every resource is sent as `{ metadata, properties }` and returned with the remote
//! identifier in `metadata.id` and, for resources that provision asynchronously, the
//! lifecycle state in `status.state`.

use crate::crd::{BillingPlan, Location, SecurityRuleTarget, SubnetDhcp, SubnetNetwork};
use serde::{Deserialize, Serialize};

// ============================================================================
// Envelope
// ============================================================================

/// Create / update request body
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRequest<P> {
    pub metadata: RequestMetadata,
    pub properties: P,
}

impl<P> ResourceRequest<P> {
    pub fn new(metadata: RequestMetadata, properties: P) -> Self {
        Self {
            metadata,
            properties,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Omitted for projects, which are not bound to a location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl RequestMetadata {
    pub fn new(name: impl Into<String>, tags: &[String]) -> Self {
        Self {
            name: name.into(),
            tags: tags.to_vec(),
            location: None,
        }
    }

    #[must_use]
    pub fn located(mut self, location: &Location) -> Self {
        self.location = Some(location.clone());
        self
    }
}

/// Response body of create, get and update calls
///
/// Only the fields the engine acts on are read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceResponse {
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub status: Option<ResponseStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub state: String,
}

impl ResourceResponse {
    /// Remote lifecycle state (e.g., "InCreation", "Active"), `None` when not reported
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.status
            .as_ref()
            .map(|status| status.state.as_str())
            .filter(|state| !state.is_empty())
    }
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectProperties {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VpcProperties {
    pub default: bool,
    pub preset: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubnetProperties {
    #[serde(rename = "type")]
    pub subnet_type: String,
    pub default: bool,
    pub network: SubnetNetwork,
    pub dhcp: SubnetDhcp,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityGroupProperties {
    pub default: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityRuleProperties {
    pub protocol: String,
    pub port: String,
    pub direction: String,
    pub target: SecurityRuleTarget,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyPairProperties {
    /// Public key material
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticIpProperties {
    pub billing_plan: BillingPlan,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStorageProperties {
    pub size_gb: i32,
    pub billing_period: String,
    pub data_center: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub volume_type: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bootable: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
}

/// Link to another remote resource by its API path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UriReference {
    pub uri: String,
}

impl UriReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Cloud server properties
///
/// Creation sends everything; updates only send the network attachments, so the
/// immutable fields are optional.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudServerProperties {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data_center: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<UriReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_volume: Option<UriReference>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub vpc_preset: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flavor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pair: Option<UriReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_ip: Option<UriReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<UriReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<UriReference>,
}

/// Body of `POST .../cloudServers/{id}/dataVolumes`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachDetachDataVolumesRequest {
    pub volumes_to_attach: Vec<UriReference>,
    pub volumes_to_detach: Vec<UriReference>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_shape() {
        let request = ResourceRequest::new(
            RequestMetadata::new("main", &["env:prod".to_string()]).located(&Location {
                value: "ITBG-Bergamo".to_string(),
            }),
            VpcProperties {
                default: false,
                preset: true,
            },
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["metadata"]["name"], "main");
        assert_eq!(value["metadata"]["location"]["value"], "ITBG-Bergamo");
        assert_eq!(value["properties"]["preset"], true);
    }

    #[test]
    fn test_project_metadata_has_no_location() {
        let request = ResourceRequest::new(
            RequestMetadata::new("payments", &[]),
            ProjectProperties::default(),
        );
        let value = serde_json::to_value(&request).unwrap();
        assert!(value["metadata"].get("location").is_none());
        assert!(value["metadata"].get("tags").is_none());
        assert_eq!(value["properties"], serde_json::json!({}));
    }

    #[test]
    fn test_response_state_is_optional() {
        let created: ResourceResponse = serde_json::from_str(
            r#"{"metadata":{"id":"vpc-1","name":"main"},"status":{"state":"InCreation"}}"#,
        )
        .unwrap();
        assert_eq!(created.metadata.id, "vpc-1");
        assert_eq!(created.state(), Some("InCreation"));

        let project: ResourceResponse =
            serde_json::from_str(r#"{"metadata":{"id":"p-1"},"properties":{}}"#).unwrap();
        assert_eq!(project.state(), None);
    }

    #[test]
    fn test_attach_detach_body() {
        let body = AttachDetachDataVolumesRequest {
            volumes_to_attach: vec![UriReference::new("/a")],
            volumes_to_detach: vec![],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["volumesToAttach"][0]["uri"], "/a");
        assert_eq!(value["volumesToDetach"], serde_json::json!([]));
    }
}
