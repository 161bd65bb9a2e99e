//! In-memory backends.
//!
//! Each store keeps the encoded wire payload, so loading goes through the
//! same codec as the file store. Every store can be switched unavailable
//! to exercise degradation paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use workhist_record::DraftRecord;

use crate::draft::{decode_draft, encode_draft, DraftMetadata, PersistedDraft};
use crate::error::StorageError;
use crate::file::DEFAULT_MAX_DRAFT_BYTES;
use crate::record::CommittedRecord;
use crate::traits::{LocalDraftStore, RecordStore, RemoteDraftStore};

/// Payload slot shared by the two in-memory draft stores.
#[derive(Debug)]
struct Slot {
    payload: Mutex<Option<String>>,
    available: AtomicBool,
    writes: AtomicUsize,
    max_bytes: usize,
}

impl Slot {
    fn new(max_bytes: usize) -> Self {
        Slot {
            payload: Mutex::new(None),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
            max_bytes,
        }
    }

    fn ensure_available(&self, what: &str) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!("{} store switched off", what)))
        }
    }

    fn save(
        &self,
        what: &str,
        record: &DraftRecord,
        metadata: &DraftMetadata,
    ) -> Result<(), StorageError> {
        self.ensure_available(what)?;
        let payload = encode_draft(record, metadata)?;
        if payload.len() > self.max_bytes {
            return Err(StorageError::QuotaExceeded {
                size: payload.len(),
                limit: self.max_bytes,
            });
        }
        *self.payload.lock().unwrap_or_else(|e| e.into_inner()) = Some(payload);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self, what: &str) -> Result<Option<PersistedDraft>, StorageError> {
        self.ensure_available(what)?;
        let payload = self.payload.lock().unwrap_or_else(|e| e.into_inner());
        payload.as_deref().map(decode_draft).transpose()
    }

    fn clear(&self, what: &str) -> Result<(), StorageError> {
        self.ensure_available(what)?;
        *self.payload.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn holds_payload(&self) -> bool {
        self.payload
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn put_raw(&self, payload: &str) {
        *self.payload.lock().unwrap_or_else(|e| e.into_inner()) = Some(payload.to_string());
    }
}

// ──────────────────────────────────────────────
// Local
// ──────────────────────────────────────────────

#[derive(Debug)]
pub struct MemoryDraftStore {
    slot: Slot,
}

impl Default for MemoryDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        MemoryDraftStore {
            slot: Slot::new(DEFAULT_MAX_DRAFT_BYTES),
        }
    }

    pub fn with_max_bytes(max_bytes: usize) -> Self {
        MemoryDraftStore {
            slot: Slot::new(max_bytes),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.slot.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> usize {
        self.slot.writes.load(Ordering::SeqCst)
    }

    /// Store a raw payload without encoding it.
    pub fn put_raw(&self, payload: &str) {
        self.slot.put_raw(payload);
    }
}

impl LocalDraftStore for MemoryDraftStore {
    fn save(&self, record: &DraftRecord, metadata: &DraftMetadata) -> Result<(), StorageError> {
        self.slot.save("local", record, metadata)
    }

    fn load(&self) -> Result<Option<PersistedDraft>, StorageError> {
        self.slot.load("local")
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.slot.clear("local")
    }

    fn exists(&self) -> bool {
        self.slot.available.load(Ordering::SeqCst) && self.slot.holds_payload()
    }
}

// ──────────────────────────────────────────────
// Remote
// ──────────────────────────────────────────────

/// Remote store stand-in. Each operation yields to the runtime once, so
/// callers see a real suspension point.
#[derive(Debug)]
pub struct MemoryRemoteDraftStore {
    slot: Slot,
}

impl Default for MemoryRemoteDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteDraftStore {
    pub fn new() -> Self {
        MemoryRemoteDraftStore {
            slot: Slot::new(usize::MAX),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.slot.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> usize {
        self.slot.writes.load(Ordering::SeqCst)
    }

    pub fn put_raw(&self, payload: &str) {
        self.slot.put_raw(payload);
    }

    /// Whether a payload is held, regardless of availability.
    pub fn holds_draft(&self) -> bool {
        self.slot.holds_payload()
    }
}

#[async_trait]
impl RemoteDraftStore for MemoryRemoteDraftStore {
    async fn save(
        &self,
        record: &DraftRecord,
        metadata: &DraftMetadata,
    ) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.slot.save("remote", record, metadata)
    }

    async fn load(&self) -> Result<Option<PersistedDraft>, StorageError> {
        tokio::task::yield_now().await;
        self.slot.load("remote")
    }

    async fn clear(&self) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.slot.clear("remote")
    }
}

// ──────────────────────────────────────────────
// Records
// ──────────────────────────────────────────────

#[derive(Debug)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, CommittedRecord>>,
    available: AtomicBool,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        MemoryRecordStore {
            records: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn get(&self, id: &str) -> Option<CommittedRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Backend("record store unavailable".into()))
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, record: &DraftRecord) -> Result<CommittedRecord, StorageError> {
        tokio::task::yield_now().await;
        self.ensure_available()?;
        let committed = CommittedRecord {
            id: uuid::Uuid::new_v4().to_string(),
            record: record.clone(),
            committed_at: OffsetDateTime::now_utc(),
        };
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(committed.id.clone(), committed.clone());
        Ok(committed)
    }

    async fn update(
        &self,
        id: &str,
        record: &DraftRecord,
    ) -> Result<CommittedRecord, StorageError> {
        tokio::task::yield_now().await;
        self.ensure_available()?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let entry = records
            .get_mut(id)
            .ok_or_else(|| StorageError::RecordNotFound { id: id.to_string() })?;
        entry.record = record.clone();
        entry.committed_at = OffsetDateTime::now_utc();
        Ok(entry.clone())
    }
}
