//! # Aruba Resource Operator
//!
//! Kubernetes operator reconciling Aruba Cloud infrastructure from custom resources.
//!
//! Watches every Aruba kind (projects, VPCs, subnets, security groups and rules, key pairs,
//! elastic IPs, block storage, cloud servers) and drives each one through its lifecycle
//! against the Aruba Cloud API.

use anyhow::Result;
use aruba_resource_operator::runtime::{initialization, watch_loop};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialization::initialize().await?;

    watch_loop::run_watch_loop(init.reconciler, init.server_state).await?;

    info!("Operator stopped");
    Ok(())
}
