use super::{Location, ResourceReference, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ArubaSecurityRule Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: cloud.aruba.it/v1alpha1
/// kind: ArubaSecurityRule
/// metadata:
///   name: allow-https
/// spec:
///   tenant: ARU-123456
///   location:
///     value: ITBG-Bergamo
///   protocol: TCP
///   port: "443"
///   direction: Ingress
///   target:
///     kind: Ip
///     value: 0.0.0.0/0
///   securityGroupReference:
///     name: web
///   vpcReference:
///     name: main
///   projectReference:
///     name: payments
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ArubaSecurityRule",
    group = "cloud.aruba.it",
    version = "v1alpha1",
    namespaced,
    status = "ArubaSecurityRuleStatus",
    shortname = "asr",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Resource ID", "type":"string", "jsonPath":".status.resourceID"}, {"name":"Protocol", "type":"string", "jsonPath":".spec.protocol"}, {"name":"Direction", "type":"string", "jsonPath":".spec.direction"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ArubaSecurityRuleSpec {
    pub tenant: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Location,
    /// TCP, UDP, ICMP or ALL
    pub protocol: String,
    /// Port or range (e.g., "80", "80-90", "ALL")
    pub port: String,
    /// Ingress or Egress
    pub direction: String,
    pub target: SecurityRuleTarget,
    pub security_group_reference: ResourceReference,
    pub vpc_reference: ResourceReference,
    pub project_reference: ResourceReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct SecurityRuleTarget {
    /// Ip or SecurityGroup
    pub kind: String,
    /// CIDR or security group URI
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ArubaSecurityRuleStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
    #[serde(rename = "vpcID", default)]
    pub vpc_id: String,
    #[serde(rename = "securityGroupID", default)]
    pub security_group_id: String,
}

super::managed_resource!(
    ArubaSecurityRule,
    "arubasecurityrule.cloud.aruba.it/finalizer"
);
