use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{NewSubmission, SubmissionRecord, SubmissionStatus};

use super::{StoreError, SubmissionStore};

/// Process-local store. Used when no database is configured and by tests.
#[derive(Default)]
pub struct MemorySubmissionStore {
    records: DashMap<Uuid, SubmissionRecord>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is, bypassing the lifecycle rules. For seeding fixtures.
    pub fn insert(&self, record: SubmissionRecord) {
        self.records.insert(record.id, record);
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn create(&self, new: NewSubmission) -> Result<SubmissionRecord, StoreError> {
        let now = Utc::now();
        let record = SubmissionRecord {
            id: Uuid::now_v7(),
            fields: new.fields,
            resume_ref: new.resume_ref,
            status: SubmissionStatus::Pending,
            external_reference: None,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>, StoreError> {
        let mut all: Vec<SubmissionRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn mark_processing(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError> {
        let Some(mut entry) = self.records.get_mut(&id) else {
            return Ok(None);
        };
        let record = entry.value_mut();
        if record.status != SubmissionStatus::Pending {
            return Ok(None);
        }
        record.status = SubmissionStatus::Processing;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        external_reference: Option<&str>,
    ) -> Result<bool, StoreError> {
        let Some(mut entry) = self.records.get_mut(&id) else {
            return Ok(false);
        };
        let record = entry.value_mut();
        if record.status != SubmissionStatus::Processing
            || !record.status.can_transition_to(status)
        {
            return Ok(false);
        }
        record.status = status;
        record.external_reference = external_reference.map(str::to_string);
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn count_by_status(&self) -> Result<Vec<(SubmissionStatus, i64)>, StoreError> {
        Ok(SubmissionStatus::ALL
            .iter()
            .map(|status| {
                let count = self
                    .records
                    .iter()
                    .filter(|r| r.value().status == *status)
                    .count() as i64;
                (*status, count)
            })
            .collect())
    }
}
