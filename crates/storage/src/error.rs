/// All errors that can be returned by a draft or record store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store cannot be used at all (storage disabled, backend down).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The encoded draft is larger than the store accepts.
    #[error("draft payload of {size} bytes exceeds the {limit} byte limit")]
    QuotaExceeded { size: usize, limit: usize },

    /// A stored draft failed to decode or failed its shape checks.
    #[error("stored draft is corrupt: {0}")]
    Corrupt(String),

    #[error("could not serialize draft: {0}")]
    Serialization(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Committed record not found for update.
    #[error("record not found: {id}")]
    RecordNotFound { id: String },

    /// A backend-specific storage error (network, server rejection, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
