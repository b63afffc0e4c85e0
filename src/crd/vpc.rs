use super::{Location, ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaVpc Custom Resource Definition
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaVpc",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaVpcStatus",
    shortname = "avpc",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaVpcSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Location,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub preset: bool,
    pub project_reference: ResourceReference,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaVpcStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    /// Project the VPC was created in
    #[serde(rename = "projectID", default)]
    pub project_id: String,
}

super::managed_resource!(ArubaVpc, "arubavpc.cloud.aruba.it/finalizer");
