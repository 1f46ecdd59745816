use thiserror::Error;

/// Errors raised by the storage backends.
///
/// Store failures are fatal for the operation that hit them: a store that
/// cannot be reached invalidates the idempotence assumptions of the rest of
/// the pass, so they are surfaced immediately rather than skipped.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQL backend failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Key-value backend failure.
    #[error("Key-value store error: {0}")]
    Kv(#[from] redb::Error),

    /// A stored value could not be interpreted.
    #[error("Corrupt record: {message}")]
    Corrupt { message: String },

    /// The database URL scheme is not recognized.
    #[error("Unsupported database URL (expected sqlite://, postgres:// or redb://): {url}")]
    UnsupportedUrl { url: String },

    /// A blocking storage task failed to complete.
    #[error("Storage task failed: {message}")]
    Task { message: String },
}

impl StoreError {
    /// Create a corrupt-record error.
    #[inline]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        Self::Kv(e.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Kv(e.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        Self::Kv(e.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        Self::Kv(e.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        Self::Kv(e.into())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task {
            message: e.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_url_names_the_offending_url() {
        let err = StoreError::UnsupportedUrl {
            url: "ftp://example".to_string(),
        };
        assert!(err.to_string().contains("ftp://example"));
        assert!(err.to_string().contains("redb://"));
    }

    #[test]
    fn corrupt_constructor_carries_message() {
        let err = StoreError::corrupt("bad timestamp");
        assert!(err.to_string().contains("bad timestamp"));
    }

    #[test]
    fn db_err_converts_to_database_variant() {
        let err: StoreError = sea_orm::DbErr::RecordNotFound("x".to_string()).into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
