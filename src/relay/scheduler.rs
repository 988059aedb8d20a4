use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::SubmissionStore;
use crate::models::{SubmissionStatus, TrackingParams};

use super::client::RelayClient;
use super::timing::TimingModel;
use super::{RelayError, RelayMode, RelayOutcome};

/// What `relay` did with a request.
#[derive(Debug)]
pub enum RelayTicket {
    /// A background task was started; it resolves to the record's final status.
    Spawned(JoinHandle<SubmissionStatus>),
    /// A task for this record is already running.
    InFlight,
    /// The record is past `pending`; nothing was started.
    NotPending(SubmissionStatus),
    NotFound,
}

impl RelayTicket {
    pub fn is_spawned(&self) -> bool {
        matches!(self, RelayTicket::Spawned(_))
    }
}

/// Starts one detached relay task per pending record and drives it to a terminal status.
#[derive(Clone)]
pub struct RelayScheduler {
    store: Arc<dyn SubmissionStore>,
    client: Arc<dyn RelayClient>,
    timing: TimingModel,
    in_flight: Arc<DashSet<Uuid>>,
    seed: Option<u64>,
}

/// Removes a record from the in-flight set however its task ends.
struct InFlightGuard {
    set: Arc<DashSet<Uuid>>,
    id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

impl RelayScheduler {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        client: Arc<dyn RelayClient>,
        timing: TimingModel,
    ) -> Self {
        Self {
            store,
            client,
            timing,
            in_flight: Arc::new(DashSet::new()),
            seed: None,
        }
    }

    /// Draw every timing plan from a fixed seed instead of OS entropy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, id: Uuid) -> bool {
        self.in_flight.contains(&id)
    }

    /// Accept a record for relay. Only `pending` records with no running task are
    /// relayed; everything else is a no-op reported through the ticket.
    ///
    /// Returns as soon as the task is spawned. An `Err` means the store could not
    /// be read and nothing was started.
    pub async fn relay(
        &self,
        id: Uuid,
        tracking: TrackingParams,
        mode: RelayMode,
    ) -> Result<RelayTicket, RelayError> {
        if self.in_flight.contains(&id) {
            return Ok(RelayTicket::InFlight);
        }

        let Some(record) = self.store.get(id).await? else {
            return Ok(RelayTicket::NotFound);
        };
        if record.status != SubmissionStatus::Pending {
            return Ok(RelayTicket::NotPending(record.status));
        }

        if !self.in_flight.insert(id) {
            return Ok(RelayTicket::InFlight);
        }
        let guard = InFlightGuard {
            set: self.in_flight.clone(),
            id,
        };

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            this.run(id, tracking, mode).await
        });

        Ok(RelayTicket::Spawned(handle))
    }

    async fn run(&self, id: Uuid, tracking: TrackingParams, mode: RelayMode) -> SubmissionStatus {
        let record = match self.store.mark_processing(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!("Submission {id} was no longer pending when its relay started");
                return self.current_status(id).await;
            }
            Err(e) => {
                tracing::error!("Failed to mark submission {id} as processing: {e}");
                return self.fall_back_to_error(id).await;
            }
        };

        let plan = {
            let shape = self.timing.shape_for(&record);
            let mut rng = self.rng();
            self.timing.plan(&shape, mode, &mut rng)
        };

        tracing::info!(
            "Relaying submission {id} ({mode:?}, {} phases, {:.1}s)",
            plan.steps.len(),
            plan.total().as_secs_f64()
        );

        for step in &plan.steps {
            tracing::trace!("Submission {id}: {:?} for {:?}", step.phase, step.delay);
            tokio::time::sleep(step.delay).await;
        }

        let (status, reference) = match self.client.send(&record, &tracking).await {
            Ok(RelayOutcome::Success { status_code }) => {
                tracing::info!("Submission {id} accepted by endpoint ({status_code})");
                (
                    SubmissionStatus::Completed,
                    Some(external_reference(id, Utc::now())),
                )
            }
            Ok(outcome @ RelayOutcome::Failure { .. }) => {
                if let Some(e) = outcome.error() {
                    tracing::warn!("Submission {id} relay failed: {e}");
                }
                (SubmissionStatus::Failed, None)
            }
            Ok(outcome @ RelayOutcome::TransportError { .. }) => {
                if let Some(e) = outcome.error() {
                    tracing::warn!("Submission {id} relay errored: {e}");
                }
                (SubmissionStatus::Error, None)
            }
            Err(e) => {
                tracing::error!("Submission {id} relay could not be prepared: {e}");
                (SubmissionStatus::Error, None)
            }
        };

        self.commit(id, status, reference.as_deref()).await
    }

    /// Write the terminal status; on a store failure, try once to leave `error` behind.
    async fn commit(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        reference: Option<&str>,
    ) -> SubmissionStatus {
        match self.store.update_status(id, status, reference).await {
            Ok(true) => status,
            Ok(false) => {
                tracing::warn!("Submission {id} left processing before {status} could be written");
                self.current_status(id).await
            }
            Err(e) => {
                tracing::error!("Failed to mark submission {id} as {status}: {e}");
                self.fall_back_to_error(id).await
            }
        }
    }

    async fn fall_back_to_error(&self, id: Uuid) -> SubmissionStatus {
        match self
            .store
            .update_status(id, SubmissionStatus::Error, None)
            .await
        {
            Ok(true) => SubmissionStatus::Error,
            Ok(false) => self.current_status(id).await,
            Err(e) => {
                tracing::error!("Dropping error status for submission {id}: {e}");
                self.current_status(id).await
            }
        }
    }

    async fn current_status(&self, id: Uuid) -> SubmissionStatus {
        match self.store.get(id).await {
            Ok(Some(record)) => record.status,
            Ok(None) => SubmissionStatus::Error,
            Err(e) => {
                tracing::error!("Failed to read back submission {id}: {e}");
                SubmissionStatus::Error
            }
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Audit reference stored on completion: `relay_<id>_<unix seconds>`.
pub fn external_reference(id: Uuid, at: DateTime<Utc>) -> String {
    format!("relay_{id}_{}", at.timestamp())
}
