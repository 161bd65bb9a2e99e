//! Editing-session state and draft reconciliation for work-history
//! records.
//!
//! A [`FormSession`] owns the record being edited and validates it on
//! every change. Its [`DraftReconciler`] keeps a local and a remote draft
//! store in step: it offers a stored draft for restore at session start,
//! autosaves after a quiet period, and clears both stores once the record
//! is committed.

pub mod clock;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::{ReconcileError, SubmitError};
pub use reconciler::{
    ClearReport, DraftReconciler, DraftSource, DraftStores, ReconcilerState, RestoreDecision,
    RestoreOffer, SaveReport, StoreOutcome,
};
pub use session::{FormSession, SubmitOutcome};
