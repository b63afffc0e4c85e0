use super::{Location, ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaSecurityGroup Custom Resource Definition
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaSecurityGroup",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaSecurityGroupStatus",
    shortname = "asg",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaSecurityGroupSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Location,
    #[serde(default)]
    pub default: bool,
    pub vpc_reference: ResourceReference,
    pub project_reference: ResourceReference,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaSecurityGroupStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
    #[serde(rename = "vpcID", default)]
    pub vpc_id: String,
}

super::managed_resource!(
    ArubaSecurityGroup,
    "arubasecuritygroup.cloud.aruba.it/finalizer"
);
