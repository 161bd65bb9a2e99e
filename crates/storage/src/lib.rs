//! Draft and record storage for workhist.
//!
//! Two draft store contracts ([`LocalDraftStore`], synchronous, and
//! [`RemoteDraftStore`], async) hold at most one [`PersistedDraft`] each.
//! [`RecordStore`] accepts committed records. File and in-memory backends
//! are provided, and [`conformance`] checks any backend against the
//! contracts.

pub mod conformance;
mod draft;
mod error;
mod file;
mod memory;
mod record;
mod traits;

pub use draft::{decode_draft, encode_draft, DraftMetadata, OriginFingerprint, PersistedDraft};
pub use error::StorageError;
pub use file::{DraftKey, FileDraftStore, DEFAULT_MAX_DRAFT_BYTES, DEFAULT_SLOT};
pub use memory::{MemoryDraftStore, MemoryRecordStore, MemoryRemoteDraftStore};
pub use record::CommittedRecord;
pub use traits::{LocalDraftStore, RecordStore, RemoteDraftStore};
