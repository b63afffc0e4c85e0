//! # Resource Strategies
//!
//! [`Reconcilable`](crate::controller::reconciler::Reconcilable) implementations, one per
//! Aruba kind. Each maps its spec onto the remote API; lifecycle handling is shared.
//!
//! - `project`: projects (no parent)
//! - `vpc`, `elastic_ip`, `key_pair`, `block_storage`: children of a project
//! - `subnet`, `security_group`: children of a VPC
//! - `security_rule`: child of a security group
//! - `cloud_server`: server wiring network, storage and key pair together

mod block_storage;
mod cloud_server;
mod elastic_ip;
mod key_pair;
mod project;
mod security_group;
mod security_rule;
mod subnet;
mod vpc;

use crate::client::{RequestMetadata, ResourceResponse};
use crate::controller::reconciler::RemoteCreated;
use crate::crd::Location;
use kube::ResourceExt;

/// Metadata block sent on create and update
fn metadata<K: ResourceExt>(obj: &K, tags: &[String], location: Option<&Location>) -> RequestMetadata {
    let metadata = RequestMetadata::new(obj.name_any(), tags);
    match location {
        Some(location) => metadata.located(location),
        None => metadata,
    }
}

fn created(response: &ResourceResponse) -> RemoteCreated {
    RemoteCreated {
        id: response.metadata.id.clone(),
        state: response.state().map(str::to_string),
    }
}

fn state(response: &ResourceResponse) -> Option<String> {
    response.state().map(str::to_string)
}
