//! # Phase Manager
//!
//! Owns the lifecycle state machine of one resource during one reconciliation pass.
//!
//! Every status change goes through [`PhaseManager::next`], which:
//! - debounces repeated writes to the same phase (at most one per requeue interval)
//! - moves `phaseStartTime` only when the phase changes
//! - records `observedGeneration` on transitions into Creating, Created, Deleting and Failed
//! - upserts the `Synchronized` condition
//! - persists the status with optimistic concurrency
//!
//! The `handle_*` methods implement the shared behavior of each phase. Per-kind code only
//! supplies the outcome of its remote call.

use super::classify::{classify, ErrorClass};
use super::conditions::upsert_condition;
use super::store::ResourceStore;
use super::types::{EngineSettings, Requeue, ReconcilerError};
use crate::clock::Clock;
use crate::constants::CONDITION_TYPE_SYNCHRONIZED;
use crate::crd::{ConditionStatus, ManagedResource, ResourcePhase, ResourceStatus};
use crate::error::{ApiError, Error};
use crate::observability::metrics;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use kube::ResourceExt;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Remote states meaning creation is still in progress
const CREATION_IN_PROGRESS_STATES: [&str; 2] = ["InCreation", "Provisioning"];
/// Remote states meaning the resource is usable
const READY_STATES: [&str; 4] = ["Available", "Active", "NotUsed", "Used"];
/// Remote states meaning provisioning will not complete
const FAILED_STATES: [&str; 2] = ["Failed", "Error"];

/// Outcome of a successful remote create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCreated {
    pub id: String,
    /// State reported in the create response, if any
    pub state: Option<String>,
}

/// Last status write per resource, for debouncing
///
/// `phaseStartTime` alone cannot tell whether a retry already wrote status in the current
/// interval, so successful writes are remembered in process. After a restart the debounce
/// falls back to `phaseStartTime`.
#[derive(Debug, Default)]
pub struct WriteTracker {
    writes: Mutex<HashMap<String, (ResourcePhase, DateTime<Utc>)>>,
}

impl WriteTracker {
    /// Time of the last write for `key`, if it was made in `phase`
    pub fn last_write(&self, key: &str, phase: ResourcePhase) -> Option<DateTime<Utc>> {
        let writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        writes
            .get(key)
            .filter(|(written_phase, _)| *written_phase == phase)
            .map(|(_, at)| *at)
    }

    pub fn record(&self, key: &str, phase: ResourcePhase, at: DateTime<Utc>) {
        let mut writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        writes.insert(key.to_string(), (phase, at));
    }

    pub fn forget(&self, key: &str) {
        let mut writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        writes.remove(key);
    }
}

/// Earliest time a same-phase status write may happen
///
/// Counts the whole requeue intervals elapsed since `anchor` (the last write in this
/// phase). Before the first boundary this is `anchor + interval`, in the future; once a
/// boundary has passed it is the latest boundary, which is not after `now`.
#[must_use]
pub fn next_allowed_time(
    anchor: DateTime<Utc>,
    interval: TimeDelta,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let interval_ms = interval.num_milliseconds();
    if interval_ms <= 0 {
        return now;
    }
    let elapsed = now - anchor;
    if elapsed < interval {
        return anchor + interval;
    }
    let whole_intervals = elapsed.num_milliseconds() / interval_ms;
    anchor + TimeDelta::milliseconds(whole_intervals * interval_ms)
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// "5m0s" style rendering of a timeout
fn format_timeout(timeout: Duration) -> String {
    let secs = timeout.as_secs();
    format!("{}m{}s", secs / 60, secs % 60)
}

/// Generation is recorded on transitions into these phases
fn records_generation(phase: ResourcePhase) -> bool {
    matches!(
        phase,
        ResourcePhase::Creating
            | ResourcePhase::Created
            | ResourcePhase::Deleting
            | ResourcePhase::Failed
    )
}

pub struct PhaseManager<'a, K: ManagedResource> {
    obj: K,
    key: String,
    store: &'a dyn ResourceStore<K>,
    clock: &'a dyn Clock,
    writes: &'a WriteTracker,
    settings: EngineSettings,
}

impl<K: ManagedResource> fmt::Debug for PhaseManager<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseManager")
            .field("key", &self.key)
            .field("phase", &self.phase())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a, K: ManagedResource> PhaseManager<'a, K> {
    pub fn new(
        obj: K,
        store: &'a dyn ResourceStore<K>,
        clock: &'a dyn Clock,
        writes: &'a WriteTracker,
        settings: EngineSettings,
    ) -> Self {
        let key = write_key(&obj);
        Self {
            obj,
            key,
            store,
            clock,
            writes,
            settings,
        }
    }

    pub fn object(&self) -> &K {
        &self.obj
    }

    pub fn object_mut(&mut self) -> &mut K {
        &mut self.obj
    }

    pub fn into_object(self) -> K {
        self.obj
    }

    #[must_use]
    pub fn phase(&self) -> Option<ResourcePhase> {
        self.obj.resource_status().and_then(|status| status.phase)
    }

    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.obj
            .resource_status()
            .map_or("", |status| status.resource_id.as_str())
    }

    #[must_use]
    pub fn generation(&self) -> i64 {
        self.obj.meta().generation.unwrap_or_default()
    }

    /// Spec changed since the last recorded generation
    #[must_use]
    pub fn generation_changed(&self) -> bool {
        let observed = self
            .obj
            .resource_status()
            .map_or(0, |status| status.observed_generation);
        observed != self.generation()
    }

    #[must_use]
    pub fn deletion_requested(&self) -> bool {
        self.obj.meta().deletion_timestamp.is_some()
    }

    #[must_use]
    pub fn has_finalizer(&self) -> bool {
        self.obj.finalizers().iter().any(|f| f == K::FINALIZER)
    }

    fn phase_started_at(&self) -> Option<DateTime<Utc>> {
        self.obj
            .resource_status()
            .and_then(ResourceStatus::phase_started_at)
    }

    fn adopt_version(&mut self, stored: &K) {
        self.obj.meta_mut().resource_version = stored.meta().resource_version.clone();
    }

    /// Move to `next_phase` and persist the status
    ///
    /// A same-phase call that wants a requeue is skipped until a requeue interval has
    /// passed since the last write in that phase; the returned delay then points at the
    /// next allowed write.
    ///
    /// # Errors
    ///
    /// [`ReconcilerError::Persistence`] if the status write fails.
    pub async fn next(
        &mut self,
        next_phase: ResourcePhase,
        condition_status: ConditionStatus,
        reason: &str,
        message: impl Into<String>,
        requeue: bool,
    ) -> Result<Requeue, ReconcilerError> {
        let message = message.into();
        let now = self.clock.now();
        let current = self.phase();
        let interval = self.settings.requeue_interval;

        if requeue && current == Some(next_phase) {
            if let Some(phase_start) = self.phase_started_at() {
                let anchor = self
                    .writes
                    .last_write(&self.key, next_phase)
                    .map_or(phase_start, |last| last.max(phase_start));
                let allowed_at = next_allowed_time(anchor, to_delta(interval), now);
                if allowed_at > now {
                    let remaining = (allowed_at - now)
                        .to_std()
                        .unwrap_or(interval)
                        .min(interval);
                    debug!(
                        phase = next_phase.as_str(),
                        reason,
                        remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                        "Status write debounced"
                    );
                    metrics::increment_debounced_writes(&K::kind(&()));
                    return Ok(Requeue::after(remaining));
                }
            }
        }

        let phase_changed = current != Some(next_phase);
        let generation = self.generation();
        let status = self.obj.resource_status_mut();
        if phase_changed || status.phase_start_time.is_none() {
            status.phase_start_time = Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        status.phase = Some(next_phase);
        status.message.clone_from(&message);
        if phase_changed && records_generation(next_phase) {
            status.observed_generation = generation;
        }
        upsert_condition(
            &mut status.conditions,
            CONDITION_TYPE_SYNCHRONIZED,
            condition_status,
            reason,
            &message,
            now,
        );

        match self.store.update_status(&self.obj).await {
            Ok(stored) => self.adopt_version(&stored),
            Err(e) => {
                error!(
                    phase = ResourcePhase::label(current),
                    next_phase = next_phase.as_str(),
                    error = %e,
                    "Failed to update status"
                );
                return Err(ReconcilerError::Persistence(e));
            }
        }
        self.writes.record(&self.key, next_phase, now);

        if phase_changed {
            metrics::increment_phase_transitions(&K::kind(&()), next_phase.as_str());
            info!(
                phase = ResourcePhase::label(current),
                next_phase = next_phase.as_str(),
                reason,
                "{message}"
            );
        } else {
            debug!(phase = next_phase.as_str(), reason, "{message}");
        }

        Ok(if requeue {
            Requeue::after(interval)
        } else {
            Requeue::done()
        })
    }

    /// Record a failed remote call according to its classification
    pub async fn fail_on_error(&mut self, err: Error) -> Result<Requeue, ReconcilerError> {
        // Only Init runs without a phase, and its failures are store writes that propagate
        let current = self.phase().unwrap_or(ResourcePhase::Creating);
        let class = classify(&err);
        metrics::increment_classified_errors(&K::kind(&()), class.as_str());

        match class {
            ErrorClass::RetrySamePhase => {
                debug!(phase = current.as_str(), error = %err, "Waiting for a resource to become ready");
                let (reason, message) = if err.api().is_some() {
                    (
                        "ResourceNotReady",
                        format!("Remote resource is not ready, will retry: {err}"),
                    )
                } else {
                    (
                        "DependencyNotReady",
                        format!("Dependency is not ready, will retry: {err}"),
                    )
                };
                self.next(current, ConditionStatus::False, reason, message, true)
                    .await
            }
            ErrorClass::FailTerminal => {
                warn!(phase = current.as_str(), error = %err, "Client error, giving up");
                self.next(
                    ResourcePhase::Failed,
                    ConditionStatus::False,
                    "ClientError",
                    format!("Client error encountered, transitioning to failed state: {err}"),
                    false,
                )
                .await
            }
            ErrorClass::RetryWithBackoff => {
                warn!(phase = current.as_str(), error = %err, "Transient error, will retry");
                let (reason, message) = if err.api().is_some() {
                    ("ServerError", format!("Server error encountered, will retry: {err}"))
                } else {
                    (
                        "ReconcileError",
                        format!("Reconcile error encountered, will retry: {err}"),
                    )
                };
                self.next(current, ConditionStatus::False, reason, message, true)
                    .await
            }
        }
    }

    /// Add the finalizer, then enter Creating
    pub async fn initialize(&mut self) -> Result<Requeue, ReconcilerError> {
        if !self.has_finalizer() {
            self.obj
                .meta_mut()
                .finalizers
                .get_or_insert_with(Vec::new)
                .push(K::FINALIZER.to_string());
            let stored = self
                .store
                .update(&self.obj)
                .await
                .map_err(ReconcilerError::Persistence)?;
            self.adopt_version(&stored);
            debug!(finalizer = K::FINALIZER, "Finalizer added");
        }

        self.next(
            ResourcePhase::Creating,
            ConditionStatus::False,
            "Initialized",
            "Resource initialized successfully",
            true,
        )
        .await
    }

    pub async fn handle_creating(
        &mut self,
        result: Result<RemoteCreated, Error>,
    ) -> Result<Requeue, ReconcilerError> {
        let created = match result {
            Ok(created) => created,
            Err(e) => return self.fail_on_error(e).await,
        };
        info!(resource.id = created.id.as_str(), state = ?created.state, "Remote resource created");
        self.obj.resource_status_mut().resource_id = created.id;

        if created
            .state
            .as_deref()
            .is_some_and(|state| CREATION_IN_PROGRESS_STATES.contains(&state))
        {
            self.next(
                ResourcePhase::Provisioning,
                ConditionStatus::False,
                "Provisioning",
                "Resource is being provisioned",
                true,
            )
            .await
        } else {
            self.next(
                ResourcePhase::Created,
                ConditionStatus::True,
                "Created",
                "Resource created successfully",
                true,
            )
            .await
        }
    }

    /// Map the polled remote state
    pub async fn handle_provisioning(
        &mut self,
        result: Result<Option<String>, Error>,
    ) -> Result<Requeue, ReconcilerError> {
        let state = match result {
            Ok(state) => state,
            Err(e) => return self.fail_on_error(e).await,
        };

        match state.as_deref() {
            Some(state) if READY_STATES.contains(&state) => {
                self.next(
                    ResourcePhase::Created,
                    ConditionStatus::True,
                    "Created",
                    "Resource created successfully",
                    true,
                )
                .await
            }
            Some(state) if FAILED_STATES.contains(&state) => {
                self.next(
                    ResourcePhase::Failed,
                    ConditionStatus::False,
                    "ProvisioningFailed",
                    format!("Remote provisioning failed with state {state}"),
                    false,
                )
                .await
            }
            _ => {
                self.next(
                    ResourcePhase::Provisioning,
                    ConditionStatus::False,
                    "Provisioning",
                    "Resource is being provisioned",
                    true,
                )
                .await
            }
        }
    }

    pub async fn handle_updating(
        &mut self,
        result: Result<(), Error>,
    ) -> Result<Requeue, ReconcilerError> {
        if let Err(e) = result {
            return self.fail_on_error(e).await;
        }
        self.next(
            ResourcePhase::Created,
            ConditionStatus::True,
            "Updated",
            "Resource updated successfully",
            true,
        )
        .await
    }

    /// Enter Updating when the spec changed since the last recorded generation
    pub async fn check_for_updates(&mut self) -> Result<Requeue, ReconcilerError> {
        if !self.generation_changed() {
            return Ok(Requeue::done());
        }
        self.next(
            ResourcePhase::Updating,
            ConditionStatus::False,
            "Updating",
            "Resource update initiated",
            true,
        )
        .await
    }

    /// Finish deletion once the remote side is gone
    ///
    /// A remote 404 counts as already deleted. The finalizer is released last, after which
    /// the resource disappears from the store.
    pub async fn handle_deletion(
        &mut self,
        result: Result<(), Error>,
    ) -> Result<Requeue, ReconcilerError> {
        match result {
            Ok(()) => {}
            Err(e) if e.api().is_some_and(ApiError::is_not_found) => {
                info!("Remote resource already gone");
            }
            Err(e) => return self.fail_on_error(e).await,
        }

        if self.has_finalizer() {
            if let Some(finalizers) = self.obj.meta_mut().finalizers.as_mut() {
                finalizers.retain(|f| f != K::FINALIZER);
            }
            let stored = self
                .store
                .update(&self.obj)
                .await
                .map_err(ReconcilerError::Persistence)?;
            self.adopt_version(&stored);
        }
        self.writes.forget(&self.key);
        info!("Resource deleted");
        Ok(Requeue::done())
    }

    /// Fail a transitioning phase that ran past the phase timeout
    ///
    /// `None` when the timeout does not apply.
    pub async fn handle_timeout(&mut self) -> Result<Option<Requeue>, ReconcilerError> {
        let Some(phase) = self.phase().filter(|phase| phase.is_transitioning()) else {
            return Ok(None);
        };
        let Some(started) = self.phase_started_at() else {
            return Ok(None);
        };
        let timeout = self.settings.phase_timeout;
        if self.clock.now() - started <= to_delta(timeout) {
            return Ok(None);
        }

        warn!(phase = phase.as_str(), timeout_secs = timeout.as_secs(), "Phase timed out");
        self.next(
            ResourcePhase::Failed,
            ConditionStatus::False,
            "ReconciliationTimeout",
            format!(
                "Reconciliation took too much time (timeout: {})",
                format_timeout(timeout)
            ),
            false,
        )
        .await
        .map(Some)
    }

    /// Enter Deleting when a deletion has been requested
    ///
    /// Deleting and Failed are left alone; Failed handles deletion itself.
    pub async fn handle_to_delete(&mut self) -> Result<Option<Requeue>, ReconcilerError> {
        if !self.deletion_requested()
            || matches!(
                self.phase(),
                Some(ResourcePhase::Deleting | ResourcePhase::Failed)
            )
        {
            return Ok(None);
        }
        self.enter_deleting().await.map(Some)
    }

    /// Failed only moves on when the user acts
    ///
    /// - deletion requested: back to Deleting, at most once per requeue interval so a
    ///   deletion the remote side keeps rejecting does not spin
    /// - spec changed: Creating if nothing exists remotely, Updating otherwise
    pub async fn handle_failed(&mut self) -> Result<Requeue, ReconcilerError> {
        if self.deletion_requested() {
            let interval = self.settings.requeue_interval;
            if let Some(started) = self.phase_started_at() {
                let retry_at = started + to_delta(interval);
                let now = self.clock.now();
                if retry_at > now {
                    let remaining = (retry_at - now).to_std().unwrap_or(interval).min(interval);
                    return Ok(Requeue::after(remaining));
                }
            }
            return self.enter_deleting().await;
        }

        if !self.generation_changed() {
            return Ok(Requeue::done());
        }

        if self.resource_id().is_empty() {
            self.next(
                ResourcePhase::Creating,
                ConditionStatus::False,
                "Retrying",
                "Specification changed, retrying creation",
                true,
            )
            .await
        } else {
            self.next(
                ResourcePhase::Updating,
                ConditionStatus::False,
                "Updating",
                "Resource update initiated",
                true,
            )
            .await
        }
    }

    async fn enter_deleting(&mut self) -> Result<Requeue, ReconcilerError> {
        self.next(
            ResourcePhase::Deleting,
            ConditionStatus::False,
            "ToBeDeleted",
            "deletion timestamp detected",
            true,
        )
        .await
    }
}

/// Key identifying a resource across kinds
pub(crate) fn write_key<K: ManagedResource>(obj: &K) -> String {
    resource_key::<K>(&obj.namespace().unwrap_or_default(), &obj.name_any())
}

pub(crate) fn resource_key<K: ManagedResource>(namespace: &str, name: &str) -> String {
    format!("{}/{namespace}/{name}", K::kind(&()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::controller::reconciler::testing::{project, InMemoryStore};
    use crate::crd::ArubaProject;
    use kube::Resource;

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    struct Harness {
        store: InMemoryStore<ArubaProject>,
        clock: ManualClock,
        writes: WriteTracker,
    }

    impl Harness {
        fn new(obj: ArubaProject) -> Self {
            Self {
                store: InMemoryStore::with(obj),
                clock: ManualClock::at("2025-03-01T10:00:00Z"),
                writes: WriteTracker::default(),
            }
        }

        fn manager(&self) -> PhaseManager<'_, ArubaProject> {
            let obj = self.store.get_stored("team-a", "payments");
            PhaseManager::new(
                obj,
                &self.store,
                &self.clock,
                &self.writes,
                EngineSettings::default(),
            )
        }

        fn stored(&self) -> ArubaProject {
            self.store.get_stored("team-a", "payments")
        }
    }

    fn status(obj: &ArubaProject) -> &ResourceStatus {
        obj.resource_status().unwrap()
    }

    #[test]
    fn test_next_allowed_time_counts_whole_intervals() {
        let anchor = at("2025-03-01T10:00:00Z");
        let interval = TimeDelta::seconds(20);

        assert_eq!(
            next_allowed_time(anchor, interval, anchor + TimeDelta::seconds(5)),
            at("2025-03-01T10:00:20Z")
        );
        assert_eq!(
            next_allowed_time(anchor, interval, anchor + TimeDelta::seconds(20)),
            at("2025-03-01T10:00:20Z")
        );
        assert_eq!(
            next_allowed_time(anchor, interval, anchor + TimeDelta::seconds(47)),
            at("2025-03-01T10:00:40Z")
        );
    }

    #[test]
    fn test_next_allowed_time_with_anchor_in_future() {
        let anchor = at("2025-03-01T10:00:30Z");
        let now = at("2025-03-01T10:00:00Z");
        assert!(next_allowed_time(anchor, TimeDelta::seconds(20), now) > now);
    }

    #[test]
    fn test_format_timeout() {
        assert_eq!(format_timeout(Duration::from_secs(300)), "5m0s");
        assert_eq!(format_timeout(Duration::from_secs(90)), "1m30s");
    }

    #[tokio::test]
    async fn test_initialize_adds_finalizer_and_enters_creating() {
        let h = Harness::new(project("payments", 1));
        let mut pm = h.manager();

        let requeue = pm.initialize().await.unwrap();
        assert_eq!(requeue, Requeue::after(Duration::from_secs(20)));

        let stored = h.stored();
        assert!(stored.finalizers().iter().any(|f| f == ArubaProject::FINALIZER));
        let status = status(&stored);
        assert_eq!(status.phase, Some(ResourcePhase::Creating));
        assert_eq!(status.observed_generation, 1);
        assert_eq!(status.phase_start_time.as_deref(), Some("2025-03-01T10:00:00Z"));
        let condition = status.condition(CONDITION_TYPE_SYNCHRONIZED).unwrap();
        assert_eq!(condition.reason, "Initialized");
        assert_eq!(condition.status, ConditionStatus::False);
    }

    #[tokio::test]
    async fn test_same_phase_writes_are_debounced() {
        let h = Harness::new(project("payments", 1));
        h.manager().initialize().await.unwrap();
        let writes_after_init = h.store.status_writes();

        // within the first interval: skipped, delay points at the boundary
        h.clock.advance(TimeDelta::seconds(5));
        let requeue = h
            .manager()
            .next(ResourcePhase::Creating, ConditionStatus::False, "ServerError", "boom", true)
            .await
            .unwrap();
        assert_eq!(requeue, Requeue::after(Duration::from_secs(15)));
        assert_eq!(h.store.status_writes(), writes_after_init);

        // a full interval later: persisted
        h.clock.advance(TimeDelta::seconds(15));
        let requeue = h
            .manager()
            .next(ResourcePhase::Creating, ConditionStatus::False, "ServerError", "boom", true)
            .await
            .unwrap();
        assert_eq!(requeue, Requeue::after(Duration::from_secs(20)));
        assert_eq!(h.store.status_writes(), writes_after_init + 1);

        // and the next one waits for a full interval again
        h.clock.advance(TimeDelta::seconds(3));
        let requeue = h
            .manager()
            .next(ResourcePhase::Creating, ConditionStatus::False, "ServerError", "boom", true)
            .await
            .unwrap();
        assert_eq!(requeue, Requeue::after(Duration::from_secs(17)));
        assert_eq!(h.store.status_writes(), writes_after_init + 1);

        // phase start is untouched by same-phase writes
        assert_eq!(
            status(&h.stored()).phase_start_time.as_deref(),
            Some("2025-03-01T10:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_phase_change_is_never_debounced() {
        let h = Harness::new(project("payments", 1));
        h.manager().initialize().await.unwrap();

        h.clock.advance(TimeDelta::seconds(2));
        let mut pm = h.manager();
        pm.handle_creating(Ok(RemoteCreated {
            id: "prj-1".to_string(),
            state: None,
        }))
        .await
        .unwrap();

        let stored = h.stored();
        let status = status(&stored);
        assert_eq!(status.phase, Some(ResourcePhase::Created));
        assert_eq!(status.resource_id, "prj-1");
        assert_eq!(status.phase_start_time.as_deref(), Some("2025-03-01T10:00:02Z"));
    }

    #[tokio::test]
    async fn test_observed_generation_not_recorded_on_updating() {
        let mut obj = project("payments", 3);
        obj.resource_status_mut().phase = Some(ResourcePhase::Created);
        obj.resource_status_mut().observed_generation = 2;
        obj.resource_status_mut().resource_id = "prj-1".to_string();
        let h = Harness::new(obj);

        h.manager().check_for_updates().await.unwrap();
        let stored = h.stored();
        assert_eq!(status(&stored).phase, Some(ResourcePhase::Updating));
        assert_eq!(status(&stored).observed_generation, 2);

        h.manager().handle_updating(Ok(())).await.unwrap();
        let stored = h.stored();
        assert_eq!(status(&stored).phase, Some(ResourcePhase::Created));
        assert_eq!(status(&stored).observed_generation, 3);
    }

    #[tokio::test]
    async fn test_same_phase_retry_keeps_pending_generation() {
        let mut obj = project("payments", 2);
        obj.resource_status_mut().phase = Some(ResourcePhase::Created);
        obj.resource_status_mut().observed_generation = 1;
        obj.resource_status_mut().resource_id = "prj-1".to_string();
        let h = Harness::new(obj);

        let err = Error::dependency_not_ready("ArubaBlockStorage", "team-a", "data-a");
        h.manager().fail_on_error(err).await.unwrap();
        let stored = h.stored();
        assert_eq!(status(&stored).phase, Some(ResourcePhase::Created));
        assert_eq!(
            status(&stored).condition(CONDITION_TYPE_SYNCHRONIZED).unwrap().reason,
            "DependencyNotReady"
        );
        assert_eq!(status(&stored).observed_generation, 1);

        // the spec change is still picked up on the next pass
        h.manager().check_for_updates().await.unwrap();
        assert_eq!(status(&h.stored()).phase, Some(ResourcePhase::Updating));
        assert!(h.manager().generation_changed());
    }

    #[tokio::test]
    async fn test_check_for_updates_without_changes_writes_nothing() {
        let mut obj = project("payments", 2);
        obj.resource_status_mut().phase = Some(ResourcePhase::Created);
        obj.resource_status_mut().observed_generation = 2;
        let h = Harness::new(obj);

        let requeue = h.manager().check_for_updates().await.unwrap();
        assert_eq!(requeue, Requeue::done());
        assert_eq!(h.store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_provisioning_state_mapping() {
        let mut obj = project("payments", 1);
        obj.resource_status_mut().phase = Some(ResourcePhase::Provisioning);
        obj.resource_status_mut().phase_start_time = Some("2025-03-01T10:00:00Z".to_string());
        let h = Harness::new(obj);

        h.manager()
            .handle_provisioning(Ok(Some("Error".to_string())))
            .await
            .unwrap();
        let stored = h.stored();
        assert_eq!(status(&stored).phase, Some(ResourcePhase::Failed));
        assert_eq!(
            status(&stored).condition(CONDITION_TYPE_SYNCHRONIZED).unwrap().reason,
            "ProvisioningFailed"
        );
    }

    #[tokio::test]
    async fn test_timeout_only_for_transitioning_phases() {
        let mut obj = project("payments", 1);
        obj.resource_status_mut().phase = Some(ResourcePhase::Creating);
        obj.resource_status_mut().phase_start_time = Some("2025-03-01T09:54:00Z".to_string());
        let h = Harness::new(obj);

        let requeue = h.manager().handle_timeout().await.unwrap();
        assert_eq!(requeue, Some(Requeue::done()));
        let stored = h.stored();
        assert_eq!(status(&stored).phase, Some(ResourcePhase::Failed));
        assert_eq!(
            status(&stored).message,
            "Reconciliation took too much time (timeout: 5m0s)"
        );

        // Failed is not transitioning: no second timeout
        assert_eq!(h.manager().handle_timeout().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_timeout_not_reached() {
        let mut obj = project("payments", 1);
        obj.resource_status_mut().phase = Some(ResourcePhase::Updating);
        obj.resource_status_mut().phase_start_time = Some("2025-03-01T09:56:00Z".to_string());
        let h = Harness::new(obj);

        assert_eq!(h.manager().handle_timeout().await.unwrap(), None);
        assert_eq!(h.store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_failed_with_changed_spec_retries_creation() {
        let mut obj = project("payments", 2);
        obj.resource_status_mut().phase = Some(ResourcePhase::Failed);
        obj.resource_status_mut().observed_generation = 1;
        let h = Harness::new(obj);

        h.manager().handle_failed().await.unwrap();
        let stored = h.stored();
        assert_eq!(status(&stored).phase, Some(ResourcePhase::Creating));
        assert_eq!(status(&stored).observed_generation, 2);
    }

    #[tokio::test]
    async fn test_failed_without_changes_stays_put() {
        let mut obj = project("payments", 2);
        obj.resource_status_mut().phase = Some(ResourcePhase::Failed);
        obj.resource_status_mut().observed_generation = 2;
        let h = Harness::new(obj);

        assert_eq!(h.manager().handle_failed().await.unwrap(), Requeue::done());
        assert_eq!(h.store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_deletion_of_missing_remote_releases_finalizer() {
        let mut obj = project("payments", 1);
        obj.meta_mut().finalizers = Some(vec![ArubaProject::FINALIZER.to_string()]);
        obj.resource_status_mut().phase = Some(ResourcePhase::Deleting);
        let h = Harness::new(obj);

        let result = Err(ApiError::new(404, "Not Found", "").into());
        let requeue = h.manager().handle_deletion(result).await.unwrap();
        assert_eq!(requeue, Requeue::done());
        assert!(h.stored().finalizers().is_empty());
    }

    #[tokio::test]
    async fn test_stale_write_is_a_persistence_error() {
        let h = Harness::new(project("payments", 1));
        let mut pm = h.manager();
        h.store.bump_version("team-a", "payments");

        let err = pm.initialize().await.unwrap_err();
        assert!(err.is_conflict());
    }
}
