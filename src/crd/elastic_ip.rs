use super::{Location, ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaNetworkElasticIp Custom Resource Definition
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaNetworkElasticIp",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaNetworkElasticIpStatus",
    shortname = "aeip",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaNetworkElasticIpSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Location,
    pub billing_plan: BillingPlan,
    pub project_reference: ResourceReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingPlan {
    /// Hour, Month or Year
    pub billing_period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaNetworkElasticIpStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
}

super::managed_resource!(
    ArubaNetworkElasticIp,
    "arubanetworkelasticip.cloud.aruba.it/finalizer"
);
