//! The in-memory editing session for one work-history record.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};
use workhist_record::{DraftRecord, Field, FieldValue, RecordError, RecordPatch};
use workhist_storage::{CommittedRecord, RecordStore};
use workhist_validate::{
    ValidationContext, ValidationEngine, ValidationIssue, ValidationMode, ValidationReport,
};

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::{ReconcileError, SubmitError};
use crate::reconciler::{ClearReport, DraftReconciler, RestoreDecision, SaveReport};

/// Result of a submit attempt that did not fail at the record store.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The record has validation errors; nothing was committed.
    ValidationFailed(ValidationReport),
    Committed {
        record: CommittedRecord,
        drafts: ClearReport,
    },
}

/// Authoritative state of an open editor: the record, what the user has
/// touched, and where they are in the wizard.
///
/// Every edit revalidates synchronously and restarts the autosave
/// debounce. Dropping the session cancels a pending autosave.
pub struct FormSession {
    record: DraftRecord,
    original: DraftRecord,
    touched: BTreeSet<String>,
    current_step: u32,
    reached_step: u32,
    submit_attempted: bool,
    /// Set by an accepted restore until the next reset or commit.
    restored: bool,
    closed: bool,
    report: ValidationReport,
    engine: ValidationEngine,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    reconciler: DraftReconciler,
    records: Arc<dyn RecordStore>,
}

impl FormSession {
    /// A session over an empty record.
    pub fn new(reconciler: DraftReconciler, records: Arc<dyn RecordStore>) -> Self {
        let engine = reconciler.engine().clone();
        let clock = reconciler.clock();
        let config = reconciler.config().clone();
        let record = DraftRecord::new();
        let mut session = FormSession {
            original: record.clone(),
            record,
            touched: BTreeSet::new(),
            current_step: 1,
            reached_step: 1,
            submit_attempted: false,
            restored: false,
            closed: false,
            report: ValidationReport::from_issues(Vec::new(), 0, 0),
            engine,
            clock,
            config,
            reconciler,
            records,
        };
        session.revalidate();
        session
    }

    /// A session editing an existing record.
    pub fn with_seed(mut self, seed: DraftRecord) -> Self {
        self.original = seed.clone();
        self.record = seed;
        self.revalidate();
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn record(&self) -> &DraftRecord {
        &self.record
    }

    pub fn original(&self) -> &DraftRecord {
        &self.original
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn reached_step(&self) -> u32 {
        self.reached_step
    }

    pub fn total_steps(&self) -> u32 {
        self.config.steps()
    }

    /// The record differs from the original, or a stored draft was
    /// restored into this session and not yet committed.
    pub fn is_dirty(&self) -> bool {
        self.restored || self.record != self.original
    }

    pub fn touched_fields(&self) -> &BTreeSet<String> {
        &self.touched
    }

    pub fn submit_attempted(&self) -> bool {
        self.submit_attempted
    }

    pub fn reconciler(&self) -> &DraftReconciler {
        &self.reconciler
    }

    // ── Editing ──────────────────────────────────────────────────────────────

    pub fn update_field(&mut self, field: Field, value: FieldValue) -> Result<(), RecordError> {
        self.update_fields(&RecordPatch::new().set(field, value))
    }

    /// Apply a patch atomically, mark its fields (and the anchors that
    /// read them) touched, revalidate and restart the autosave timer.
    pub fn update_fields(&mut self, patch: &RecordPatch) -> Result<(), RecordError> {
        self.record.apply(patch)?;
        for field in patch.fields() {
            self.touch(field);
        }
        self.revalidate();
        if !self.closed {
            self.reconciler
                .schedule_autosave(self.record.clone(), self.current_step);
        }
        Ok(())
    }

    /// Start over from `seed` (or an empty record). Any pending autosave
    /// is dropped.
    pub fn reset_form(&mut self, seed: Option<DraftRecord>) {
        self.reconciler.cancel_pending();
        let seed = seed.unwrap_or_default();
        self.original = seed.clone();
        self.record = seed;
        self.touched.clear();
        self.submit_attempted = false;
        self.restored = false;
        self.current_step = 1;
        self.reached_step = 1;
        self.revalidate();
    }

    fn touch(&mut self, field: Field) {
        self.touched.insert(field.name().to_string());
        for anchor in self.engine.anchors_reading(field) {
            self.touched.insert(anchor.to_string());
        }
    }

    /// Mark every field and rule anchor touched.
    pub fn touch_all(&mut self) {
        for field in Field::ALL {
            self.touch(field);
        }
        for rule in &self.engine.rules().rules {
            self.touched.insert(rule.anchor.clone());
        }
    }

    // ── Validation ───────────────────────────────────────────────────────────

    fn context(&self) -> ValidationContext {
        ValidationContext {
            mode: self.config.validation_mode,
            today: self.clock.today(),
            reached_step: self.reached_step,
        }
    }

    fn revalidate(&mut self) {
        self.report = self.engine.validate(&self.record, &self.context());
    }

    /// Issues to show for `name`. Empty until the user has touched the
    /// field or attempted a submit.
    pub fn get_field_error(&self, name: &str) -> &[ValidationIssue] {
        if self.submit_attempted || self.touched.contains(name) {
            self.report.field_issues(name)
        } else {
            &[]
        }
    }

    /// No error-severity issue on any anchor shown at `step`.
    pub fn is_step_valid(&self, step: u32) -> bool {
        self.engine
            .anchors_for_step(step)
            .iter()
            .all(|anchor| !self.report.field_has_error(anchor))
    }

    /// Advance one step if the current step is valid.
    pub fn next_step(&mut self) -> bool {
        if self.current_step >= self.total_steps() || !self.is_step_valid(self.current_step) {
            return false;
        }
        self.current_step += 1;
        if self.current_step > self.reached_step {
            self.reached_step = self.current_step;
            self.revalidate();
        }
        true
    }

    /// Going back is never gated.
    pub fn previous_step(&mut self) -> bool {
        if self.current_step <= 1 {
            return false;
        }
        self.current_step -= 1;
        true
    }

    // ── Drafts ───────────────────────────────────────────────────────────────

    /// Look for a resumable draft.
    pub async fn begin(&mut self) -> Result<RestoreDecision, ReconcileError> {
        self.reconciler.start().await
    }

    /// Apply the offered draft. The session becomes dirty relative to its
    /// original and resumes at the draft's step.
    pub fn accept_restore(&mut self) -> Result<(), ReconcileError> {
        let draft = self.reconciler.accept_restore()?;
        self.record = draft.record;
        self.restored = true;
        self.current_step = draft.metadata.step.clamp(1, self.total_steps());
        self.reached_step = self.reached_step.max(self.current_step);
        self.revalidate();
        Ok(())
    }

    pub async fn decline_restore(&mut self) -> Result<ClearReport, ReconcileError> {
        self.reconciler.decline_restore().await
    }

    /// Manual save of the current record to both draft stores.
    pub async fn save_draft(&mut self) -> Result<SaveReport, ReconcileError> {
        self.reconciler
            .manual_save(&self.record, self.current_step)
            .await
    }

    /// Stop autosaving. Stored drafts are kept.
    pub fn close(&mut self) {
        self.closed = true;
        self.reconciler.shutdown();
    }

    /// Throw the edits away: clear both draft stores and return to the
    /// original record.
    pub async fn discard(&mut self) -> ClearReport {
        let report = self.reconciler.clear().await;
        self.record = self.original.clone();
        self.restored = false;
        self.touched.clear();
        self.revalidate();
        self.closed = true;
        report
    }

    // ── Submit ───────────────────────────────────────────────────────────────

    /// Validate the whole record and commit it.
    ///
    /// Validation failures come back as
    /// [`SubmitOutcome::ValidationFailed`]. A record store failure is the
    /// only error; the draft stays in place and an autosave is scheduled
    /// so the latest edits reach the draft stores.
    pub async fn submit(
        &mut self,
        is_update: bool,
        id: Option<&str>,
    ) -> Result<SubmitOutcome, SubmitError> {
        if self.closed {
            return Err(SubmitError::Closed);
        }
        self.submit_attempted = true;
        self.touch_all();

        let mode = match self.config.validation_mode {
            ValidationMode::Strict => ValidationMode::Strict,
            _ => ValidationMode::Normal,
        };
        let ctx = ValidationContext {
            mode,
            today: self.clock.today(),
            reached_step: self.total_steps(),
        };
        self.report = self.engine.validate(&self.record, &ctx);
        if !self.report.is_valid {
            info!(
                errors = self.report.errors().count(),
                "submit blocked by validation"
            );
            return Ok(SubmitOutcome::ValidationFailed(self.report.clone()));
        }

        self.reconciler.cancel_pending();
        let result = match (is_update, id) {
            (true, Some(id)) => self.records.update(id, &self.record).await,
            _ => self.records.create(&self.record).await,
        };
        match result {
            Ok(committed) => {
                let drafts = self.reconciler.clear().await;
                self.original = self.record.clone();
                self.restored = false;
                info!(id = %committed.id, "record committed");
                Ok(SubmitOutcome::Committed {
                    record: committed,
                    drafts,
                })
            }
            Err(e) => {
                warn!(error = %e, "commit failed; keeping draft");
                self.reconciler
                    .schedule_autosave(self.record.clone(), self.current_step);
                Err(SubmitError::RecordStore(e))
            }
        }
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        self.reconciler.cancel_pending();
    }
}
