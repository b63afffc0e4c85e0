//! # Aruba Cloud API Client
//!
//! Thin REST mapping of the Aruba Cloud API used by the per-kind strategies.
//!
//! - `transport`: request execution seam and its `reqwest` implementation
//! - `api`: typed client carrying the tenant bearer token
//! - `models`: request/response payloads
//! - `paths`: endpoint builders

mod api;
mod models;
pub mod paths;
mod transport;

pub use api::ApiClient;
pub use models::{
    AttachDetachDataVolumesRequest, BlockStorageProperties, CloudServerProperties,
    ElasticIpProperties, KeyPairProperties, ProjectProperties, RequestMetadata, ResourceRequest,
    ResourceResponse, ResponseMetadata, ResponseStatus, SecurityGroupProperties,
    SecurityRuleProperties, SubnetProperties, UriReference, VpcProperties,
};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
