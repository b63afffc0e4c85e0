use super::ResourceStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaProject Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: cloud.aruba.it/v1alpha1
/// kind: ArubaProject
/// metadata:
///   name: payments
///   namespace: team-payments
/// spec:
///   tenant: ARU-123456
///   description: Payments platform
///   tags: ["payments", "prod"]
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaProject",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaProjectStatus",
    shortname = "aproj",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaProjectSpec {
    /// Owning account/tenant
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Mark as the tenant's default project
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaProjectStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
}

super::managed_resource!(ArubaProject, "arubaproject.cloud.aruba.it/finalizer");
