//! The persisted draft unit and its wire codec.
//!
//! Wire shape:
//!
//! ```json
//! { "data": { "projectName": "..." },
//!   "metadata": { "step": 2, "totalSteps": 4,
//!                 "lastModified": "2024-06-15T09:30:00Z",
//!                 "deviceInfo": "<sha256 hex>", "autoSaved": true } }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use workhist_record::DraftRecord;

use crate::error::StorageError;

/// Identifies the browsing context (device) that wrote a draft.
///
/// Derived from a device descriptor by SHA-256 so the descriptor itself
/// is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginFingerprint(String);

impl OriginFingerprint {
    pub fn from_descriptor(descriptor: &str) -> Self {
        let digest = Sha256::digest(descriptor.as_bytes());
        OriginFingerprint(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Metadata stored alongside a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMetadata {
    /// Wizard step the user was on (1-based).
    pub step: u32,
    pub total_steps: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    #[serde(rename = "deviceInfo")]
    pub origin: OriginFingerprint,
    pub auto_saved: bool,
}

/// A draft record together with its metadata, the unit a draft store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDraft {
    #[serde(rename = "data")]
    pub record: DraftRecord,
    pub metadata: DraftMetadata,
}

impl PersistedDraft {
    pub fn new(record: DraftRecord, metadata: DraftMetadata) -> Self {
        PersistedDraft { record, metadata }
    }

    /// Time since the draft was last modified. Negative when the stored
    /// timestamp is ahead of `now`.
    pub fn age(&self, now: OffsetDateTime) -> Duration {
        now - self.metadata.last_modified
    }

    pub fn is_stale(&self, now: OffsetDateTime, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

#[derive(Serialize)]
struct WireDraft<'a> {
    data: &'a DraftRecord,
    metadata: &'a DraftMetadata,
}

/// Encode a draft into its JSON wire form.
pub fn encode_draft(
    record: &DraftRecord,
    metadata: &DraftMetadata,
) -> Result<String, StorageError> {
    check_metadata(metadata).map_err(StorageError::Serialization)?;
    serde_json::to_string(&WireDraft {
        data: record,
        metadata,
    })
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Decode a stored payload. Anything that does not match the wire shape
/// is reported as [`StorageError::Corrupt`].
pub fn decode_draft(payload: &str) -> Result<PersistedDraft, StorageError> {
    let draft: PersistedDraft =
        serde_json::from_str(payload).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    check_metadata(&draft.metadata).map_err(StorageError::Corrupt)?;
    Ok(draft)
}

fn check_metadata(metadata: &DraftMetadata) -> Result<(), String> {
    if metadata.step < 1 {
        return Err("metadata.step must be at least 1".into());
    }
    if metadata.total_steps < 1 {
        return Err("metadata.totalSteps must be at least 1".into());
    }
    if metadata.step > metadata.total_steps {
        return Err(format!(
            "metadata.step {} exceeds totalSteps {}",
            metadata.step, metadata.total_steps
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use workhist_record::{Field, FieldValue};

    fn metadata() -> DraftMetadata {
        DraftMetadata {
            step: 2,
            total_steps: 4,
            last_modified: datetime!(2024-06-15 09:30:00 UTC),
            origin: OriginFingerprint::from_descriptor("laptop/firefox"),
            auto_saved: true,
        }
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        let fp = OriginFingerprint::from_descriptor("abc");
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(fp, OriginFingerprint::from_descriptor("abd"));
    }

    #[test]
    fn wire_shape_uses_data_and_device_info() {
        let record = DraftRecord::new()
            .with(Field::ProjectName, FieldValue::text("Ledger"))
            .unwrap();
        let text = encode_draft(&record, &metadata()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["data"]["projectName"], "Ledger");
        assert_eq!(v["metadata"]["totalSteps"], 4);
        assert_eq!(v["metadata"]["autoSaved"], true);
        assert_eq!(v["metadata"]["lastModified"], "2024-06-15T09:30:00Z");
        assert!(v["metadata"]["deviceInfo"].is_string());

        let back = decode_draft(&text).unwrap();
        assert_eq!(back.record, record);
        assert_eq!(back.metadata, metadata());
    }

    fn raw_payload(data: &str, step: u32) -> String {
        format!(
            r#"{{"data": {}, "metadata": {{"step":{},"totalSteps":4,"lastModified":"{}","deviceInfo":"x","autoSaved":false}}}}"#,
            data, step, "2024-06-15T09:30:00Z"
        )
    }

    #[test]
    fn decode_rejects_bad_shapes() {
        let payloads = [
            "not json".to_string(),
            r#"{"data": {}}"#.to_string(),
            raw_payload("[]", 1),
            raw_payload("{}", 5),
            raw_payload("{}", 0),
            raw_payload(r#"{"teamSize":"big"}"#, 1),
        ];
        for payload in &payloads {
            assert!(
                matches!(decode_draft(payload), Err(StorageError::Corrupt(_))),
                "accepted {}",
                payload
            );
        }
        assert!(decode_draft(&raw_payload("{}", 4)).is_ok());
    }

    #[test]
    fn encode_refuses_impossible_metadata() {
        let mut meta = metadata();
        meta.step = 9;
        assert!(matches!(
            encode_draft(&DraftRecord::new(), &meta),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn staleness_is_strictly_greater_than_max_age() {
        let draft = PersistedDraft::new(DraftRecord::new(), metadata());
        let max_age = Duration::hours(24);
        assert!(!draft.is_stale(datetime!(2024-06-16 09:30:00 UTC), max_age));
        assert!(draft.is_stale(datetime!(2024-06-16 09:30:01 UTC), max_age));
        // clock skew: a future timestamp is not stale
        assert!(!draft.is_stale(datetime!(2024-06-14 00:00:00 UTC), max_age));
    }
}
