pub mod memory;
pub mod submissions;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewSubmission, SubmissionRecord, SubmissionStatus};

pub use memory::MemorySubmissionStore;
pub use submissions::PgSubmissionStore;

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Corrupt(String),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {err}"),
            StoreError::Corrupt(msg) => write!(f, "Corrupt record: {msg}"),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            err => StoreError::Database(err),
        }
    }
}

/// Persistence for submission records.
///
/// Status writes are conditional so that a record can only move forward along
/// `pending -> processing -> {completed, failed, error}`, whatever the caller does.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create(&self, new: NewSubmission) -> Result<SubmissionRecord, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError>;

    /// Newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>, StoreError>;

    /// Atomically claim a `pending` record for relay. Returns `None` when the
    /// record is missing or no longer pending.
    async fn mark_processing(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError>;

    /// Move a `processing` record to a terminal status. Returns `false` when
    /// nothing was written (record missing or not in `processing`).
    async fn update_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        external_reference: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Record counts per status; statuses without records may be omitted.
    async fn count_by_status(&self) -> Result<Vec<(SubmissionStatus, i64)>, StoreError>;
}
