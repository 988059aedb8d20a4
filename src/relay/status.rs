use serde::Serialize;

use crate::db::{StoreError, SubmissionStore};
use crate::models::SubmissionStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub error: i64,
}

/// Count records per status straight from the store. Nothing is cached.
pub async fn summarize(store: &dyn SubmissionStore) -> Result<StatusSummary, StoreError> {
    let mut summary = StatusSummary::default();
    for (status, count) in store.count_by_status().await? {
        let slot = match status {
            SubmissionStatus::Pending => &mut summary.pending,
            SubmissionStatus::Processing => &mut summary.processing,
            SubmissionStatus::Completed => &mut summary.completed,
            SubmissionStatus::Failed => &mut summary.failed,
            SubmissionStatus::Error => &mut summary.error,
        };
        *slot += count;
        summary.total += count;
    }
    Ok(summary)
}
