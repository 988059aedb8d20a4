use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ApplicantFields, NewSubmission, SubmissionRecord, SubmissionStatus};

use super::{StoreError, SubmissionStore};

#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    country: String,
    city: String,
    address: String,
    position: String,
    additional_info: String,
    resume_ref: Option<String>,
    status: String,
    external_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for SubmissionRecord {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = SubmissionStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!("submission {} has status '{}'", row.id, row.status))
        })?;
        Ok(SubmissionRecord {
            id: row.id,
            fields: ApplicantFields {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
                country: row.country,
                city: row.city,
                address: row.address,
                position: row.position,
                additional_info: row.additional_info,
            },
            resume_ref: row.resume_ref,
            status,
            external_reference: row.external_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn create(&self, new: NewSubmission) -> Result<SubmissionRecord, StoreError> {
        let f = &new.fields;
        let row = sqlx::query_as::<_, SubmissionRow>(
            "INSERT INTO submissions (id, first_name, last_name, email, phone, country, city,
                                      address, position, additional_info, resume_ref)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&f.first_name)
        .bind(&f.last_name)
        .bind(&f.email)
        .bind(&f.phone)
        .bind(&f.country)
        .bind(&f.city)
        .bind(&f.address)
        .bind(&f.position)
        .bind(&f.additional_info)
        .bind(&new.resume_ref)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError> {
        sqlx::query_as::<_, SubmissionRow>("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(SubmissionRecord::try_from)
            .transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>, StoreError> {
        sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(SubmissionRecord::try_from)
        .collect()
    }

    async fn mark_processing(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError> {
        sqlx::query_as::<_, SubmissionRow>(
            "UPDATE submissions SET status = 'processing', updated_at = now()
             WHERE id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(SubmissionRecord::try_from)
        .transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        external_reference: Option<&str>,
    ) -> Result<bool, StoreError> {
        if !SubmissionStatus::Processing.can_transition_to(status) {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE submissions
             SET status = $2, external_reference = $3, updated_at = now()
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(external_reference)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self) -> Result<Vec<(SubmissionStatus, i64)>, StoreError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM submissions GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(status, count)| {
                SubmissionStatus::parse(&status)
                    .map(|s| (s, count))
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{status}'")))
            })
            .collect()
    }
}
