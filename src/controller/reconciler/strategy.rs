//! # Phase Strategy
//!
//! [`Reconcilable`] is the contract every Aruba kind implements. A kind supplies its remote
//! calls (create, read state, update, delete); the phase handlers have default
//! implementations that feed those outcomes into the [`PhaseManager`]. Kinds with extra
//! behavior override a handler, e.g. the cloud server checks its data volumes in Created.

use super::phase::{PhaseManager, RemoteCreated};
use super::resolver::DependencyResolver;
use super::types::{ReconcilerError, Requeue};
use crate::client::ApiClient;
use crate::crd::{ConditionStatus, ManagedResource, ResourcePhase};
use crate::error::Error;
use async_trait::async_trait;
use std::fmt;

/// Remote access for one reconciliation pass
pub struct RemoteContext<'a> {
    /// API client authenticated for the resource's tenant
    pub api: &'a ApiClient,
    pub resolver: &'a DependencyResolver<'a>,
}

impl fmt::Debug for RemoteContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteContext").finish_non_exhaustive()
    }
}

/// Out-of-band change that requires an update although the spec generation did not move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub reason: &'static str,
    pub message: String,
}

#[async_trait]
pub trait Reconcilable: ManagedResource {
    /// Resolve dependencies and create the remote resource
    ///
    /// Resolved parent identifiers are stored in the kind's status; the returned id becomes
    /// `status.resourceID`.
    async fn create_remote(&mut self, remote: &RemoteContext<'_>) -> Result<RemoteCreated, Error>;

    /// Current remote state, `None` when the API does not report one
    async fn remote_state(&self, remote: &RemoteContext<'_>) -> Result<Option<String>, Error>;

    /// Push the desired state; `spec_changed` is false when the update was triggered by drift
    async fn update_remote(
        &mut self,
        remote: &RemoteContext<'_>,
        spec_changed: bool,
    ) -> Result<(), Error>;

    async fn delete_remote(&self, remote: &RemoteContext<'_>) -> Result<(), Error>;

    async fn detect_drift(&self, _remote: &RemoteContext<'_>) -> Result<Option<Drift>, Error> {
        Ok(None)
    }

    async fn init(pm: &mut PhaseManager<'_, Self>) -> Result<Requeue, ReconcilerError> {
        pm.initialize().await
    }

    async fn creating(
        pm: &mut PhaseManager<'_, Self>,
        remote: &RemoteContext<'_>,
    ) -> Result<Requeue, ReconcilerError> {
        let result = pm.object_mut().create_remote(remote).await;
        pm.handle_creating(result).await
    }

    async fn provisioning(
        pm: &mut PhaseManager<'_, Self>,
        remote: &RemoteContext<'_>,
    ) -> Result<Requeue, ReconcilerError> {
        let result = pm.object().remote_state(remote).await;
        pm.handle_provisioning(result).await
    }

    async fn created(
        pm: &mut PhaseManager<'_, Self>,
        remote: &RemoteContext<'_>,
    ) -> Result<Requeue, ReconcilerError> {
        match pm.object().detect_drift(remote).await {
            Ok(Some(drift)) => {
                pm.next(
                    ResourcePhase::Updating,
                    ConditionStatus::False,
                    drift.reason,
                    drift.message,
                    true,
                )
                .await
            }
            Ok(None) => pm.check_for_updates().await,
            Err(e) => pm.fail_on_error(e).await,
        }
    }

    async fn updating(
        pm: &mut PhaseManager<'_, Self>,
        remote: &RemoteContext<'_>,
    ) -> Result<Requeue, ReconcilerError> {
        let spec_changed = pm.generation_changed();
        let result = pm.object_mut().update_remote(remote, spec_changed).await;
        pm.handle_updating(result).await
    }

    /// Delete remotely, skipped when nothing was ever created
    async fn deleting(
        pm: &mut PhaseManager<'_, Self>,
        remote: &RemoteContext<'_>,
    ) -> Result<Requeue, ReconcilerError> {
        let result = if pm.resource_id().is_empty() {
            Ok(())
        } else {
            pm.object().delete_remote(remote).await
        };
        pm.handle_deletion(result).await
    }
}
