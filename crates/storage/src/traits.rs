use async_trait::async_trait;
use workhist_record::DraftRecord;

use crate::draft::{DraftMetadata, PersistedDraft};
use crate::error::StorageError;
use crate::record::CommittedRecord;

/// Client-local draft storage for one (user, slot).
///
/// Operations are synchronous. A store holds at most one draft; `save`
/// replaces whatever was there.
///
/// ## Failure Semantics
///
/// `load` returns `Ok(None)` when nothing is stored and
/// `Err(StorageError::Corrupt)` when something is stored but does not
/// decode. Callers treat a corrupt draft as absent.
pub trait LocalDraftStore: Send + Sync {
    fn save(&self, record: &DraftRecord, metadata: &DraftMetadata) -> Result<(), StorageError>;

    fn load(&self) -> Result<Option<PersistedDraft>, StorageError>;

    /// Remove the stored draft. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), StorageError>;

    fn exists(&self) -> bool;
}

/// Server-held draft storage for the same (user, slot).
#[async_trait]
pub trait RemoteDraftStore: Send + Sync {
    async fn save(&self, record: &DraftRecord, metadata: &DraftMetadata)
        -> Result<(), StorageError>;

    async fn load(&self) -> Result<Option<PersistedDraft>, StorageError>;

    /// Remove the stored draft. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// The final create/update API for committed (non-draft) records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, record: &DraftRecord) -> Result<CommittedRecord, StorageError>;

    /// Returns `Err(StorageError::RecordNotFound)` if `id` is unknown.
    async fn update(&self, id: &str, record: &DraftRecord)
        -> Result<CommittedRecord, StorageError>;
}
