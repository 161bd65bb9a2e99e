use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use workhist_record::DraftRecord;

/// A work-history record accepted by a [`RecordStore`](crate::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedRecord {
    pub id: String,
    pub record: DraftRecord,
    #[serde(with = "time::serde::rfc3339")]
    pub committed_at: OffsetDateTime,
}
