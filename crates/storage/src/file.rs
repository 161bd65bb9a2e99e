//! File-backed local draft store: one JSON file per (user, slot).

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use workhist_record::DraftRecord;

use crate::draft::{decode_draft, encode_draft, DraftMetadata, PersistedDraft};
use crate::error::StorageError;
use crate::traits::LocalDraftStore;

/// Largest payload the local store accepts by default (100 KiB).
pub const DEFAULT_MAX_DRAFT_BYTES: usize = 100 * 1024;

/// Slot used when the caller does not name one.
pub const DEFAULT_SLOT: &str = "work-history";

/// Scopes a draft to a user and a draft slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    user: String,
    slot: String,
}

impl DraftKey {
    /// Components are escaped into `[A-Za-z0-9_-]` so they are safe as
    /// path segments. Distinct inputs always give distinct segments.
    pub fn new(user: &str, slot: &str) -> Self {
        DraftKey {
            user: escape_segment(user),
            slot: escape_segment(slot),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }
}

/// ASCII letters, digits and `-` pass through; every other byte becomes
/// `_XX` (uppercase hex). `_` only ever starts an escape, so the mapping
/// is injective. The empty string maps to a lone `_`, which no escape
/// produces.
fn escape_segment(component: &str) -> String {
    if component.is_empty() {
        return "_".to_string();
    }
    let mut out = String::with_capacity(component.len());
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{:02X}", byte));
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct FileDraftStore {
    root: PathBuf,
    key: DraftKey,
    max_bytes: usize,
}

impl FileDraftStore {
    pub fn new(root: impl Into<PathBuf>, key: DraftKey) -> Self {
        FileDraftStore {
            root: root.into(),
            key,
            max_bytes: DEFAULT_MAX_DRAFT_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn key(&self) -> &DraftKey {
        &self.key
    }

    /// `<root>/<user>/<slot>.json`
    pub fn path(&self) -> PathBuf {
        self.root
            .join(&self.key.user)
            .join(format!("{}.json", self.key.slot))
    }

    fn write_atomically(&self, path: &Path, payload: &str) -> Result<(), StorageError> {
        let dir = path
            .parent()
            .ok_or_else(|| StorageError::Unavailable(format!("no parent for {}", path.display())))?;
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(payload.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

impl LocalDraftStore for FileDraftStore {
    fn save(&self, record: &DraftRecord, metadata: &DraftMetadata) -> Result<(), StorageError> {
        let payload = encode_draft(record, metadata)?;
        if payload.len() > self.max_bytes {
            return Err(StorageError::QuotaExceeded {
                size: payload.len(),
                limit: self.max_bytes,
            });
        }
        let path = self.path();
        self.write_atomically(&path, &payload)?;
        debug!(path = %path.display(), bytes = payload.len(), "wrote local draft");
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedDraft>, StorageError> {
        match fs::read_to_string(self.path()) {
            Ok(payload) => decode_draft(&payload).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed local draft");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self) -> bool {
        self.path().is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::OriginFingerprint;
    use time::macros::datetime;
    use workhist_record::{Field, FieldValue};

    fn metadata() -> DraftMetadata {
        DraftMetadata {
            step: 1,
            total_steps: 4,
            last_modified: datetime!(2024-06-15 09:30:00 UTC),
            origin: OriginFingerprint::from_descriptor("test"),
            auto_saved: false,
        }
    }

    #[test]
    fn key_components_are_escaped() {
        let key = DraftKey::new("../alice@example.com", "");
        assert_eq!(key.user(), "_2E_2E_2Falice_40example_2Ecom");
        assert_eq!(key.slot(), "_");
        assert_eq!(DraftKey::new("bob-1", DEFAULT_SLOT).slot(), "work-history");
    }

    #[test]
    fn distinct_users_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let users = [
            "alice@example.com",
            "alice.example.com",
            "alice_example_com",
            "alice_40example_2Ecom",
            "_",
            "",
            "山田",
        ];
        let paths: std::collections::BTreeSet<PathBuf> = users
            .iter()
            .map(|u| FileDraftStore::new(dir.path(), DraftKey::new(u, "s")).path())
            .collect();
        assert_eq!(paths.len(), users.len());

        let a = FileDraftStore::new(dir.path(), DraftKey::new("alice@example.com", "s"));
        let b = FileDraftStore::new(dir.path(), DraftKey::new("alice.example.com", "s"));
        a.save(&DraftRecord::new(), &metadata()).unwrap();
        assert!(!b.exists());
        b.clear().unwrap();
        assert!(a.exists());
    }

    #[test]
    fn save_writes_under_user_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::new(dir.path(), DraftKey::new("u1", DEFAULT_SLOT));
        store.save(&DraftRecord::new(), &metadata()).unwrap();
        assert!(dir.path().join("u1").join("work-history.json").is_file());
        assert!(store.exists());
    }

    #[test]
    fn oversized_payload_is_refused_and_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            FileDraftStore::new(dir.path(), DraftKey::new("u1", "s")).with_max_bytes(64);
        let record = DraftRecord::new()
            .with(Field::Notes, FieldValue::text("x".repeat(200)))
            .unwrap();
        let err = store.save(&record, &metadata()).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 64, .. }));
        assert!(!store.exists());
    }

    #[test]
    fn corrupt_file_loads_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::new(dir.path(), DraftKey::new("u1", "s"));
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ truncated").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
