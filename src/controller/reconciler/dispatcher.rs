//! # Dispatcher
//!
//! Entry point of one reconciliation pass for one resource:
//!
//! 1. Load the resource (gone means done)
//! 2. Check the tenant and authenticate for it
//! 3. Phase timeout, then deletion preemption
//! 4. Dispatch on the current phase to the kind's [`Reconcilable`] handler

use super::phase::{resource_key, PhaseManager, WriteTracker};
use super::resolver::{DependencyResolver, ReferenceLookup};
use super::store::ResourceStore;
use super::strategy::{Reconcilable, RemoteContext};
use super::types::{EngineSettings, ReconcilerError, Requeue, MISSING_TENANT_MESSAGE};
use crate::auth::TokenManager;
use crate::client::{ApiClient, Transport};
use crate::clock::Clock;
use crate::crd::ResourcePhase;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, field, Instrument, Level};

/// Services shared by the dispatchers of every kind
pub struct EngineContext {
    pub tokens: Arc<TokenManager>,
    pub transport: Arc<dyn Transport>,
    pub lookup: Arc<dyn ReferenceLookup>,
    pub clock: Arc<dyn Clock>,
    pub writes: WriteTracker,
    pub settings: EngineSettings,
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("tokens", &self.tokens)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl EngineContext {
    pub fn new(
        tokens: Arc<TokenManager>,
        transport: Arc<dyn Transport>,
        lookup: Arc<dyn ReferenceLookup>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            tokens,
            transport,
            lookup,
            clock,
            writes: WriteTracker::default(),
            settings,
        }
    }
}

/// Reconciles resources of kind `K`
pub struct Dispatcher<K: Reconcilable> {
    store: Arc<dyn ResourceStore<K>>,
    engine: Arc<EngineContext>,
}

impl<K: Reconcilable> fmt::Debug for Dispatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("kind", &K::kind(&()))
            .finish_non_exhaustive()
    }
}

impl<K: Reconcilable> Dispatcher<K> {
    pub fn new(store: Arc<dyn ResourceStore<K>>, engine: Arc<EngineContext>) -> Self {
        Self { store, engine }
    }

    /// Run one reconciliation pass for `namespace/name`
    ///
    /// # Errors
    ///
    /// - [`ReconcilerError::Configuration`] if the resource names no tenant
    /// - [`ReconcilerError::Authentication`] if no token could be obtained
    /// - [`ReconcilerError::Store`] / [`ReconcilerError::Persistence`] for store failures
    ///
    /// Remote API failures are recorded in the resource status, not returned.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<Requeue, ReconcilerError> {
        let kind = K::kind(&());
        let span = tracing::span!(
            Level::INFO,
            "reconcile",
            resource.kind = %kind,
            resource.namespace = namespace,
            resource.name = name,
            resource.phase = field::Empty,
        );
        self.run(namespace, name, &span).instrument(span.clone()).await
    }

    async fn run(
        &self,
        namespace: &str,
        name: &str,
        span: &tracing::Span,
    ) -> Result<Requeue, ReconcilerError> {
        let Some(obj) = self
            .store
            .get(namespace, name)
            .await
            .map_err(ReconcilerError::Store)?
        else {
            debug!("Resource not found, nothing to reconcile");
            self.engine.writes.forget(&resource_key::<K>(namespace, name));
            return Ok(Requeue::done());
        };

        let tenant = obj.tenant().trim().to_string();
        if tenant.is_empty() {
            error!("{MISSING_TENANT_MESSAGE}");
            return Err(ReconcilerError::Configuration(
                MISSING_TENANT_MESSAGE.to_string(),
            ));
        }

        let token = self.engine.tokens.authenticate(&tenant).await?;
        let api = ApiClient::new(Arc::clone(&self.engine.transport), token);
        let resolver = DependencyResolver::new(self.engine.lookup.as_ref(), namespace);
        let remote = RemoteContext {
            api: &api,
            resolver: &resolver,
        };

        let mut pm = PhaseManager::new(
            obj,
            self.store.as_ref(),
            self.engine.clock.as_ref(),
            &self.engine.writes,
            self.engine.settings,
        );
        let phase = pm.phase();
        span.record("resource.phase", ResourcePhase::label(phase));

        if let Some(requeue) = pm.handle_timeout().await? {
            return Ok(requeue);
        }
        if let Some(requeue) = pm.handle_to_delete().await? {
            return Ok(requeue);
        }

        match phase {
            None => K::init(&mut pm).await,
            Some(ResourcePhase::Creating) => K::creating(&mut pm, &remote).await,
            Some(ResourcePhase::Provisioning) => K::provisioning(&mut pm, &remote).await,
            Some(ResourcePhase::Created) => K::created(&mut pm, &remote).await,
            Some(ResourcePhase::Updating) => K::updating(&mut pm, &remote).await,
            Some(ResourcePhase::Deleting) => K::deleting(&mut pm, &remote).await,
            Some(ResourcePhase::Failed) => pm.handle_failed().await,
        }
    }
}
