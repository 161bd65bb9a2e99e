//! Decides which stored draft (if any) is offered for restore, and owns
//! every write to the two draft stores.
//!
//! ## States
//!
//! ```text
//! Init ──start──▶ PendingRestoreDecision ──accept──▶ Restored
//!   │                      │
//!   │                      └──decline──▶ Clean
//!   └──start (no usable draft)──▶ Clean
//!
//! any ──clear──▶ Cleared (terminal)
//! ```
//!
//! Autosave is allowed in `Init`, `Clean` and `Restored`. Manual save is
//! allowed in every state but `Cleared`.
//!
//! ## Ordering
//!
//! Every autosave request bumps a generation counter and replaces the
//! pending debounce task. A task only writes if, holding the write lock,
//! it still sees its own generation and a state that accepts autosave.
//! Start, manual save, clear and shutdown bump the generation before
//! taking the lock, so a superseded autosave can never land after them.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use time::{Duration, OffsetDateTime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use workhist_record::DraftRecord;
use workhist_storage::{
    DraftMetadata, LocalDraftStore, OriginFingerprint, PersistedDraft, RemoteDraftStore,
    StorageError,
};
use workhist_validate::ValidationEngine;

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::ReconcileError;

// ──────────────────────────────────────────────
// Results
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Init,
    PendingRestoreDecision,
    Clean,
    Restored,
    Cleared,
}

impl ReconcilerState {
    fn accepts_autosave(self) -> bool {
        matches!(
            self,
            ReconcilerState::Init | ReconcilerState::Clean | ReconcilerState::Restored
        )
    }
}

impl fmt::Display for ReconcilerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReconcilerState::Init => "initializing",
            ReconcilerState::PendingRestoreDecision => "awaiting a restore decision",
            ReconcilerState::Clean => "clean",
            ReconcilerState::Restored => "restored",
            ReconcilerState::Cleared => "cleared",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSource {
    Local,
    Remote,
}

/// A draft found at session start, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOffer {
    pub draft: PersistedDraft,
    pub source: DraftSource,
    pub completion_rate: u8,
    pub age: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestoreDecision {
    /// Nothing usable was stored.
    None,
    Offer(RestoreOffer),
}

/// What happened to one store during a save or clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Written,
    /// The store is not configured for this session.
    Disabled,
    Failed(String),
}

impl StoreOutcome {
    fn from_result(result: Result<(), StorageError>) -> Self {
        match result {
            Ok(()) => StoreOutcome::Written,
            Err(e) => StoreOutcome::Failed(e.to_string()),
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, StoreOutcome::Written)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StoreOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub local: StoreOutcome,
    pub remote: StoreOutcome,
    pub metadata: DraftMetadata,
}

impl SaveReport {
    /// At least one store holds the draft.
    pub fn saved(&self) -> bool {
        self.local.is_written() || self.remote.is_written()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub local: StoreOutcome,
    pub remote: StoreOutcome,
}

impl ClearReport {
    pub fn cleared(&self) -> bool {
        !self.local.is_failed() && !self.remote.is_failed()
    }
}

// ──────────────────────────────────────────────
// Reconciler
// ──────────────────────────────────────────────

/// The draft stores a reconciler writes to. Either may be absent.
#[derive(Clone, Default)]
pub struct DraftStores {
    pub local: Option<Arc<dyn LocalDraftStore>>,
    pub remote: Option<Arc<dyn RemoteDraftStore>>,
}

impl DraftStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(mut self, store: Arc<dyn LocalDraftStore>) -> Self {
        self.local = Some(store);
        self
    }

    pub fn remote(mut self, store: Arc<dyn RemoteDraftStore>) -> Self {
        self.remote = Some(store);
        self
    }
}

struct Inner {
    local: Option<Arc<dyn LocalDraftStore>>,
    remote: Option<Arc<dyn RemoteDraftStore>>,
    clock: Arc<dyn Clock>,
    engine: ValidationEngine,
    config: SessionConfig,
    origin: OriginFingerprint,
    state: Mutex<ReconcilerState>,
    offer: Mutex<Option<RestoreOffer>>,
    generation: AtomicU64,
    pending: Mutex<Option<JoinHandle<()>>>,
    write_lock: tokio::sync::Mutex<()>,
    last_modified: Mutex<Option<OffsetDateTime>>,
    torn_down: AtomicBool,
}

/// Cloneable handle; clones share state and the debounce timer.
#[derive(Clone)]
pub struct DraftReconciler {
    inner: Arc<Inner>,
}

impl fmt::Debug for DraftReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftReconciler")
            .field("state", &self.state())
            .field("local", &self.inner.local.is_some())
            .field("remote", &self.inner.remote.is_some())
            .finish()
    }
}

impl DraftReconciler {
    /// Stores disabled in `config` are dropped here.
    pub fn new(
        stores: DraftStores,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
        engine: ValidationEngine,
    ) -> Self {
        let local = stores.local.filter(|_| config.enable_local_drafts);
        let remote = stores.remote.filter(|_| config.enable_remote_drafts);
        DraftReconciler {
            inner: Arc::new(Inner {
                local,
                remote,
                clock,
                engine,
                origin: config.origin(),
                config,
                state: Mutex::new(ReconcilerState::Init),
                offer: Mutex::new(None),
                generation: AtomicU64::new(0),
                pending: Mutex::new(None),
                write_lock: tokio::sync::Mutex::new(()),
                last_modified: Mutex::new(None),
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> ReconcilerState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.inner.engine
    }

    /// The offer awaiting a decision, if any.
    pub fn pending_offer(&self) -> Option<RestoreOffer> {
        self.inner
            .offer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether a debounced autosave is waiting to fire.
    pub fn has_pending_autosave(&self) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    // ── Session start ────────────────────────────────────────────────────────

    /// Look for a resumable draft. The local draft wins when it is fresh
    /// and from this device; otherwise a fresh remote draft is offered.
    /// Unusable drafts are discarded without being offered.
    pub async fn start(&self) -> Result<RestoreDecision, ReconcileError> {
        self.ensure_live()?;
        self.expect_state("start", &[ReconcilerState::Init])?;
        // An edit made before start must not land on top of a draft that is
        // about to be offered.
        self.cancel_pending();

        let now = self.inner.clock.now();
        let candidate = match self.inner.local_candidate(now) {
            Some(draft) => Some((draft, DraftSource::Local)),
            None => self
                .inner
                .remote_candidate(now)
                .await
                .map(|d| (d, DraftSource::Remote)),
        };

        let Some((draft, source)) = candidate else {
            self.set_state(ReconcilerState::Clean);
            debug!("no resumable draft");
            return Ok(RestoreDecision::None);
        };

        let offer = RestoreOffer {
            completion_rate: self.inner.engine.completion_rate(&draft.record),
            age: draft.age(now),
            source,
            draft,
        };
        info!(
            source = ?offer.source,
            step = offer.draft.metadata.step,
            completion = offer.completion_rate,
            "offering draft for restore"
        );
        *self.inner.offer.lock().unwrap_or_else(|e| e.into_inner()) = Some(offer.clone());
        self.set_state(ReconcilerState::PendingRestoreDecision);
        Ok(RestoreDecision::Offer(offer))
    }

    /// Take the offered draft. The caller applies it to its session.
    pub fn accept_restore(&self) -> Result<PersistedDraft, ReconcileError> {
        self.ensure_live()?;
        self.expect_state("accept a restore", &[ReconcilerState::PendingRestoreDecision])?;
        let offer = self
            .inner
            .offer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(offer) = offer else {
            return Err(ReconcileError::InvalidTransition {
                action: "accept a restore",
                state: self.state(),
            });
        };
        self.inner.observe_timestamp(offer.draft.metadata.last_modified);
        self.set_state(ReconcilerState::Restored);
        info!(source = ?offer.source, "draft restored");
        Ok(offer.draft)
    }

    /// Refuse the offered draft and delete it from both stores.
    pub async fn decline_restore(&self) -> Result<ClearReport, ReconcileError> {
        self.ensure_live()?;
        self.expect_state("decline a restore", &[ReconcilerState::PendingRestoreDecision])?;
        self.inner
            .offer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let report = {
            let _guard = self.inner.write_lock.lock().await;
            self.inner.clear_both().await
        };
        self.set_state(ReconcilerState::Clean);
        info!("draft restore declined");
        Ok(report)
    }

    // ── Saving ───────────────────────────────────────────────────────────────

    /// (Re)start the debounce timer for an autosave of `record`. Only the
    /// last request within a quiet window is written. Returns whether a
    /// write was scheduled.
    ///
    /// Must be called from within a tokio runtime; outside one the request
    /// is logged and dropped.
    pub fn schedule_autosave(&self, record: DraftRecord, step: u32) -> bool {
        if self.inner.torn_down.load(Ordering::SeqCst) {
            return false;
        }
        let state = self.state();
        if !state.accepts_autosave() {
            debug!(%state, "autosave not scheduled");
            return false;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("no async runtime; autosave skipped");
                return false;
            }
        };

        // Bump and replace under the same lock so concurrent callers cannot
        // abort each other's newest task.
        let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let delay = inner.config.autosave_interval();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _guard = inner.write_lock.lock().await;
            if inner.generation.load(Ordering::SeqCst) != generation
                || inner.torn_down.load(Ordering::SeqCst)
            {
                return;
            }
            let state = *inner.state.lock().unwrap_or_else(|e| e.into_inner());
            if !state.accepts_autosave() {
                debug!(%state, "autosave dropped");
                return;
            }
            let report = inner.write_both(&record, step, true).await;
            if let StoreOutcome::Failed(reason) = &report.local {
                warn!(%reason, "autosave to local draft store failed");
            }
            if let StoreOutcome::Failed(reason) = &report.remote {
                warn!(%reason, "autosave to remote draft store failed");
            }
            debug!(step, saved = report.saved(), "autosave finished");
        });

        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
        true
    }

    /// Write `record` to both stores now, superseding any pending autosave.
    pub async fn manual_save(
        &self,
        record: &DraftRecord,
        step: u32,
    ) -> Result<SaveReport, ReconcileError> {
        self.ensure_live()?;
        if self.state() == ReconcilerState::Cleared {
            return Err(ReconcileError::InvalidTransition {
                action: "save a draft",
                state: ReconcilerState::Cleared,
            });
        }
        self.cancel_pending();
        let report = {
            let _guard = self.inner.write_lock.lock().await;
            self.inner.write_both(record, step, false).await
        };
        if self.state() == ReconcilerState::PendingRestoreDecision {
            // The saved draft replaced the one on offer.
            self.inner
                .offer
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take();
            self.set_state(ReconcilerState::Clean);
        }
        if report.saved() {
            info!(step, local = ?report.local, remote = ?report.remote, "draft saved");
        } else {
            warn!(local = ?report.local, remote = ?report.remote, "draft save failed");
        }
        Ok(report)
    }

    /// Delete the draft from both stores and enter the terminal `Cleared`
    /// state.
    pub async fn clear(&self) -> ClearReport {
        self.cancel_pending();
        let report = {
            let _guard = self.inner.write_lock.lock().await;
            self.inner.clear_both().await
        };
        self.inner
            .offer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.set_state(ReconcilerState::Cleared);
        info!(cleared = report.cleared(), "drafts cleared");
        report
    }

    /// Drop any pending autosave without writing it.
    pub fn cancel_pending(&self) {
        let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }

    /// Cancel pending work and refuse all further writes.
    pub fn shutdown(&self) {
        self.inner.torn_down.store(true, Ordering::SeqCst);
        self.cancel_pending();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: ReconcilerState) {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: &[ReconcilerState],
    ) -> Result<(), ReconcileError> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(ReconcileError::InvalidTransition { action, state })
        }
    }

    fn ensure_live(&self) -> Result<(), ReconcileError> {
        if self.is_shut_down() {
            Err(ReconcileError::ShutDown)
        } else {
            Ok(())
        }
    }
}

impl Inner {
    fn local_candidate(&self, now: OffsetDateTime) -> Option<PersistedDraft> {
        let store = self.local.as_ref()?;
        let draft = match store.load() {
            Ok(Some(draft)) => draft,
            Ok(None) => return None,
            Err(StorageError::Corrupt(reason)) => {
                info!(%reason, "discarding corrupt local draft");
                self.discard_local(store.as_ref());
                return None;
            }
            Err(e) => {
                warn!(error = %e, "local draft store unreadable");
                return None;
            }
        };
        if draft.is_stale(now, self.config.max_draft_age()) {
            info!(last_modified = %draft.metadata.last_modified, "discarding stale local draft");
            self.discard_local(store.as_ref());
            return None;
        }
        if draft.metadata.origin != self.origin {
            info!("discarding local draft from another device");
            self.discard_local(store.as_ref());
            return None;
        }
        Some(draft)
    }

    async fn remote_candidate(&self, now: OffsetDateTime) -> Option<PersistedDraft> {
        let store = self.remote.as_ref()?;
        let draft = match store.load().await {
            Ok(Some(draft)) => draft,
            Ok(None) => return None,
            Err(StorageError::Corrupt(reason)) => {
                info!(%reason, "discarding corrupt remote draft");
                self.discard_remote(store.as_ref()).await;
                return None;
            }
            Err(e) => {
                warn!(error = %e, "remote draft store unreadable; continuing local-only");
                return None;
            }
        };
        if draft.is_stale(now, self.config.max_draft_age()) {
            info!(last_modified = %draft.metadata.last_modified, "discarding stale remote draft");
            self.discard_remote(store.as_ref()).await;
            return None;
        }
        Some(draft)
    }

    fn discard_local(&self, store: &dyn LocalDraftStore) {
        if let Err(e) = store.clear() {
            warn!(error = %e, "could not remove local draft");
        }
    }

    async fn discard_remote(&self, store: &dyn RemoteDraftStore) {
        if let Err(e) = store.clear().await {
            warn!(error = %e, "could not remove remote draft");
        }
    }

    /// Timestamp for the next save: the clock, but never earlier than a
    /// timestamp already written or restored.
    fn next_timestamp(&self) -> OffsetDateTime {
        let now = self.clock.now();
        let mut last = self.last_modified.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }

    fn observe_timestamp(&self, seen: OffsetDateTime) {
        let mut last = self.last_modified.lock().unwrap_or_else(|e| e.into_inner());
        if last.map_or(true, |prev| seen > prev) {
            *last = Some(seen);
        }
    }

    /// Callers hold `write_lock`.
    async fn write_both(&self, record: &DraftRecord, step: u32, auto_saved: bool) -> SaveReport {
        let total_steps = self.config.steps();
        let metadata = DraftMetadata {
            step: step.clamp(1, total_steps),
            total_steps,
            last_modified: self.next_timestamp(),
            origin: self.origin.clone(),
            auto_saved,
        };
        let local = match &self.local {
            Some(store) => StoreOutcome::from_result(store.save(record, &metadata)),
            None => StoreOutcome::Disabled,
        };
        let remote = match &self.remote {
            Some(store) => StoreOutcome::from_result(store.save(record, &metadata).await),
            None => StoreOutcome::Disabled,
        };
        SaveReport {
            local,
            remote,
            metadata,
        }
    }

    /// Callers hold `write_lock`.
    async fn clear_both(&self) -> ClearReport {
        let local = match &self.local {
            Some(store) => StoreOutcome::from_result(store.clear()),
            None => StoreOutcome::Disabled,
        };
        let remote = match &self.remote {
            Some(store) => StoreOutcome::from_result(store.clear().await),
            None => StoreOutcome::Disabled,
        };
        if let StoreOutcome::Failed(reason) = &local {
            warn!(%reason, "could not clear local draft");
        }
        if let StoreOutcome::Failed(reason) = &remote {
            warn!(%reason, "could not clear remote draft");
        }
        ClearReport { local, remote }
    }
}
