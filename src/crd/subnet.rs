use super::{ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaSubnet Custom Resource Definition
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaSubnet",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaSubnetStatus",
    shortname = "asub",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Address", "type":"string", "jsonPath":".spec.network.address"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaSubnetSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Subnet type (Basic, Advanced)
    pub r#type: String,
    #[serde(default)]
    pub default: bool,
    pub network: SubnetNetwork,
    pub dhcp: SubnetDhcp,
    pub vpc_reference: ResourceReference,
    pub project_reference: ResourceReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct SubnetNetwork {
    /// CIDR address (e.g., "10.0.1.0/24")
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct SubnetDhcp {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaSubnetStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
    #[serde(rename = "vpcID", default)]
    pub vpc_id: String,
}

super::managed_resource!(ArubaSubnet, "arubasubnet.cloud.aruba.it/finalizer");
