use super::{Location, ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaBlockStorage Custom Resource Definition
///
/// Used both as a cloud server boot volume (`bootable` with an `image`) and as a data volume.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaBlockStorage",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaBlockStorageStatus",
    shortname = "abs",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Size", "type":"integer", "jsonPath":".spec.sizeGb"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaBlockStorageSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Location,
    pub size_gb: i32,
    pub billing_period: String,
    pub data_center: String,
    /// Performance class (Standard, Performance)
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub bootable: bool,
    /// Image installed on a bootable volume
    #[serde(default)]
    pub image: String,
    pub project_reference: ResourceReference,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaBlockStorageStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
}

super::managed_resource!(
    ArubaBlockStorage,
    "arubablockstorage.cloud.aruba.it/finalizer"
);
