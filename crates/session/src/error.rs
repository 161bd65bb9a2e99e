use workhist_storage::StorageError;

use crate::reconciler::ReconcilerState;

/// A reconciler operation was invoked in a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("cannot {action} while the draft reconciler is {state}")]
    InvalidTransition {
        action: &'static str,
        state: ReconcilerState,
    },

    #[error("the draft reconciler has been shut down")]
    ShutDown,
}

/// Failure of the final commit. The draft is left in place.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("record store rejected the commit: {0}")]
    RecordStore(#[from] StorageError),

    #[error("the form session is closed")]
    Closed,
}
