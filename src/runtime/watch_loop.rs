//! # Watch Loop
//!
//! One controller per Aruba kind, all sharing the same [`Reconciler`] context.
//! Each controller watches its kind in every namespace and hands changed objects to the
//! phase engine.

use super::context::Reconciler;
use super::error_policy::handle_reconciliation_error;
use crate::controller::reconciler::phase::write_key;
use crate::controller::reconciler::{Reconcilable, ReconcilerError, Requeue};
use crate::controller::server::ServerState;
use crate::crd::{
    ArubaBlockStorage, ArubaCloudServer, ArubaKeyPair, ArubaNetworkElasticIp, ArubaProject,
    ArubaSecurityGroup, ArubaSecurityRule, ArubaSubnet, ArubaVpc,
};
use crate::observability::metrics;
use futures::StreamExt;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::{self, Action};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Run every controller until a shutdown signal arrives
///
/// # Errors
///
/// Currently never fails; the signature matches the other runtime entry points.
pub async fn run_watch_loop(
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loop...");

    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown_state.set_ready(false);
            info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
        }
    });

    futures::join!(
        run_controller::<ArubaProject>(Arc::clone(&reconciler)),
        run_controller::<ArubaVpc>(Arc::clone(&reconciler)),
        run_controller::<ArubaSubnet>(Arc::clone(&reconciler)),
        run_controller::<ArubaSecurityGroup>(Arc::clone(&reconciler)),
        run_controller::<ArubaSecurityRule>(Arc::clone(&reconciler)),
        run_controller::<ArubaKeyPair>(Arc::clone(&reconciler)),
        run_controller::<ArubaNetworkElasticIp>(Arc::clone(&reconciler)),
        run_controller::<ArubaBlockStorage>(Arc::clone(&reconciler)),
        run_controller::<ArubaCloudServer>(Arc::clone(&reconciler)),
    );

    info!("Controller stopped gracefully");
    Ok(())
}

async fn run_controller<K: Reconcilable>(reconciler: Arc<Reconciler>) {
    let kind = K::kind(&()).to_string();
    let api: Api<K> = Api::all(reconciler.client.clone());
    let config = controller::Config::default().concurrency(reconciler.max_concurrent_reconciliations);

    let watch_span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch",
        resource.kind = kind.as_str()
    );

    async move {
        info!("Watching {} resources in all namespaces", kind);

        Controller::new(api, watcher::Config::default().any_semantic())
            .with_config(config)
            .shutdown_on_signal()
            .run(reconcile::<K>, handle_reconciliation_error::<K>, reconciler)
            .for_each(|result| async move {
                match result {
                    Ok((obj, action)) => {
                        debug!(resource = %obj, action = ?action, "watch.event.reconciled");
                    }
                    Err(e) => warn!(error = %e, "watch.event.error"),
                }
            })
            .await;

        info!("Controller for {} stopped", kind);
    }
    .instrument(watch_span)
    .await;
}

async fn reconcile<K: Reconcilable>(
    obj: Arc<K>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let kind = K::kind(&());
    let key = write_key(obj.as_ref());
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();

    metrics::increment_reconciliations(&kind);
    let start = Instant::now();

    let dispatcher = ctx.dispatcher::<K>();
    let result = tokio::time::timeout(ctx.reconcile_timeout, dispatcher.reconcile(&namespace, &name))
        .await
        .unwrap_or_else(|_elapsed| Err(ReconcilerError::Timeout(ctx.reconcile_timeout)));

    metrics::observe_reconciliation_duration(&kind, start.elapsed().as_secs_f64());

    let requeue = result?;
    ctx.backoff.reset(&key);
    Ok(to_action(requeue, ctx.resync_interval))
}

/// Controller action for an engine requeue directive
///
/// A directive without requeue still comes back after `resync`, so external drift is
/// eventually noticed.
pub fn to_action(requeue: Requeue, resync: Duration) -> Action {
    if requeue.requeue {
        Action::requeue(requeue.after)
    } else {
        Action::requeue(resync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requeue_directive_uses_engine_delay() {
        let action = to_action(Requeue::after(Duration::from_secs(20)), Duration::from_secs(600));
        assert_eq!(action, Action::requeue(Duration::from_secs(20)));
    }

    #[test]
    fn test_done_falls_back_to_resync() {
        let action = to_action(Requeue::done(), Duration::from_secs(600));
        assert_eq!(action, Action::requeue(Duration::from_secs(600)));
    }
}
