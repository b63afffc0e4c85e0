use super::{Location, ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaCloudServer Custom Resource Definition
///
/// Wires a VPC, subnets, security groups, a boot volume, a key pair and optionally an
/// elastic IP into one server. Data volumes listed in `dataVolumeReferences` are attached
/// and detached in place as the list changes.
///
/// # Example
///
/// ```yaml
/// apiVersion: cloud.aruba.it/v1alpha1
/// kind: ArubaCloudServer
/// metadata:
///   name: api-1
/// spec:
///   tenant: ARU-123456
///   location:
///     value: ITBG-Bergamo
///   dataCenter: ITBG-1
///   flavorName: CSO4A8
///   projectReference: { name: payments }
///   vpcReference: { name: main }
///   bootVolumeReference: { name: api-1-boot }
///   keyPairReference: { name: ops }
///   subnetReferences: [{ name: backend }]
///   securityGroupReferences: [{ name: web }]
///   dataVolumeReferences: [{ name: api-1-data }]
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaCloudServer",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaCloudServerStatus",
    shortname = "acs",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Flavor", "type":"string", "jsonPath":".spec.flavorName"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaCloudServerSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Location,
    pub data_center: String,
    #[serde(default)]
    pub vpc_preset: bool,
    pub flavor_name: String,
    pub project_reference: ResourceReference,
    pub vpc_reference: ResourceReference,
    pub boot_volume_reference: ResourceReference,
    pub key_pair_reference: ResourceReference,
    #[serde(default)]
    pub subnet_references: Vec<ResourceReference>,
    #[serde(default)]
    pub security_group_references: Vec<ResourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_ip_reference: Option<ResourceReference>,
    #[serde(default)]
    pub data_volume_references: Vec<ResourceReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaCloudServerStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
    #[serde(rename = "vpcID", default)]
    pub vpc_id: String,
    #[serde(rename = "subnetIDs", default)]
    pub subnet_ids: Vec<String>,
    #[serde(rename = "securityGroupIDs", default)]
    pub security_group_ids: Vec<String>,
    #[serde(rename = "bootVolumeID", default)]
    pub boot_volume_id: String,
    #[serde(rename = "elasticIpID", default)]
    pub elastic_ip_id: String,
    #[serde(rename = "keyPairID", default)]
    pub key_pair_id: String,
    /// Data volumes currently attached, as last confirmed by the remote API
    #[serde(rename = "dataVolumeIDs", default)]
    pub data_volume_ids: Vec<String>,
}

super::managed_resource!(
    ArubaCloudServer,
    "arubacloudserver.cloud.aruba.it/finalizer"
);
