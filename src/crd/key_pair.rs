use super::{Location, ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaKeyPair Custom Resource Definition
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaKeyPair",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaKeyPairStatus",
    shortname = "akp",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaKeyPairSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Location,
    /// Public key material (OpenSSH format)
    pub value: String,
    pub project_reference: ResourceReference,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaKeyPairStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
}

super::managed_resource!(ArubaKeyPair, "arubakeypair.cloud.aruba.it/finalizer");
