//! # Custom Resource Definitions
//!
//! Aruba Cloud resources managed by the operator, all in the `cloud.aruba.it/v1alpha1` group.
//!
//! Every kind carries the same [`ResourceStatus`] flattened into its own status type, plus the
//! parent identifiers it resolved during creation so later calls do not resolve them again.
//!
//! ## Kinds
//!
//! - [`ArubaProject`] - Project, the root of every other resource
//! - [`ArubaVpc`] - Virtual private cloud inside a project
//! - [`ArubaSubnet`] - Subnet inside a VPC
//! - [`ArubaSecurityGroup`] - Security group inside a VPC
//! - [`ArubaSecurityRule`] - Rule inside a security group
//! - [`ArubaKeyPair`] - SSH key pair
//! - [`ArubaNetworkElasticIp`] - Public elastic IP
//! - [`ArubaBlockStorage`] - Block storage volume (boot or data)
//! - [`ArubaCloudServer`] - Cloud server wiring all of the above together

use chrono::{DateTime, Utc};
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

mod block_storage;
mod cloud_server;
mod elastic_ip;
mod key_pair;
mod project;
mod security_group;
mod security_rule;
mod subnet;
mod vpc;

pub use block_storage::{ArubaBlockStorage, ArubaBlockStorageSpec, ArubaBlockStorageStatus};
pub use cloud_server::{ArubaCloudServer, ArubaCloudServerSpec, ArubaCloudServerStatus};
pub use elastic_ip::{
    ArubaNetworkElasticIp, ArubaNetworkElasticIpSpec, ArubaNetworkElasticIpStatus, BillingPlan,
};
pub use key_pair::{ArubaKeyPair, ArubaKeyPairSpec, ArubaKeyPairStatus};
pub use project::{ArubaProject, ArubaProjectSpec, ArubaProjectStatus};
pub use security_group::{ArubaSecurityGroup, ArubaSecurityGroupSpec, ArubaSecurityGroupStatus};
pub use security_rule::{
    ArubaSecurityRule, ArubaSecurityRuleSpec, ArubaSecurityRuleStatus, SecurityRuleTarget,
};
pub use subnet::{ArubaSubnet, ArubaSubnetSpec, ArubaSubnetStatus, SubnetDhcp, SubnetNetwork};
pub use vpc::{ArubaVpc, ArubaVpcSpec, ArubaVpcStatus};

/// Reconciliation phase of a resource
///
/// An absent phase means the resource has not been initialized yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ResourcePhase {
    Creating,
    Provisioning,
    Created,
    Updating,
    Deleting,
    Failed,
}

impl ResourcePhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourcePhase::Creating => "Creating",
            ResourcePhase::Provisioning => "Provisioning",
            ResourcePhase::Created => "Created",
            ResourcePhase::Updating => "Updating",
            ResourcePhase::Deleting => "Deleting",
            ResourcePhase::Failed => "Failed",
        }
    }

    /// Phases bounded by the phase timeout
    #[must_use]
    pub fn is_transitioning(self) -> bool {
        matches!(
            self,
            ResourcePhase::Creating | ResourcePhase::Provisioning | ResourcePhase::Updating
        )
    }

    /// Label used in logs and metrics, `Initializing` for an absent phase
    #[must_use]
    pub fn label(phase: Option<Self>) -> &'static str {
        phase.map_or("Initializing", Self::as_str)
    }
}

impl fmt::Display for ResourcePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Status condition, keyed by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    /// RFC3339 timestamp of the last status or reason change
    pub last_transition_time: String,
}

/// Location of a remote resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    /// Location identifier (e.g., "ITBG-Bergamo")
    pub value: String,
}

/// Reference to another Aruba resource by name
///
/// Never carries the remote identifier: it is read from the referenced object's status
/// every time the reference is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceReference {
    pub name: String,
    /// Defaults to the namespace of the referencing resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Namespace to look the reference up in
    #[must_use]
    pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => default,
        }
    }
}

/// Status fields shared by every Aruba resource
///
/// Fields are always serialized (no `skip_serializing_if`) so a merge patch of the status
/// clears values that were reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default)]
    pub phase: Option<ResourcePhase>,
    #[serde(default)]
    pub message: String,
    /// Identifier of the resource on the Aruba Cloud side, empty until creation succeeds
    #[serde(rename = "resourceID", default)]
    pub resource_id: String,
    #[serde(default)]
    pub observed_generation: i64,
    /// RFC3339 timestamp of the last phase change
    #[serde(default)]
    pub phase_start_time: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ResourceStatus {
    /// Parsed `phaseStartTime`; an unparseable value counts as unset
    #[must_use]
    pub fn phase_started_at(&self) -> Option<DateTime<Utc>> {
        self.phase_start_time
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }
}

/// Capabilities the reconciliation engine needs from every Aruba kind
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Finalizer guarding remote cleanup
    const FINALIZER: &'static str;

    /// Tenant owning the resource, empty when not configured
    fn tenant(&self) -> &str;

    fn resource_status(&self) -> Option<&ResourceStatus>;

    /// Common status, created on first access
    fn resource_status_mut(&mut self) -> &mut ResourceStatus;

    /// Full kind-specific status as sent to the status subresource
    fn status_json(&self) -> Result<serde_json::Value, serde_json::Error>;
}

macro_rules! managed_resource {
    ($kind:ty, $finalizer:literal) => {
        impl $crate::crd::ManagedResource for $kind {
            const FINALIZER: &'static str = $finalizer;

            fn tenant(&self) -> &str {
                &self.spec.tenant
            }

            fn resource_status(&self) -> Option<&$crate::crd::ResourceStatus> {
                self.status.as_ref().map(|status| &status.resource)
            }

            fn resource_status_mut(&mut self) -> &mut $crate::crd::ResourceStatus {
                &mut self.status.get_or_insert_with(Default::default).resource
            }

            fn status_json(&self) -> Result<serde_json::Value, serde_json::Error> {
                serde_json::to_value(&self.status)
            }
        }
    };
}
pub(crate) use managed_resource;
