use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::files::FileStore;
use crate::models::{SubmissionRecord, TrackingParams};

use super::{payload, RelayError, RelayOutcome};

/// Part name the partner form expects the résumé under.
pub const RESUME_PART: &str = "resume";

/// Transfers one record to the external endpoint.
///
/// `Err` means the request could not be prepared (e.g. the stored file is gone);
/// anything that happens on the wire is reported through [`RelayOutcome`].
/// Implementations never retry.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn send(
        &self,
        record: &SubmissionRecord,
        tracking: &TrackingParams,
    ) -> Result<RelayOutcome, RelayError>;
}

pub struct HttpRelayClient {
    client: reqwest::Client,
    target_url: String,
    files: FileStore,
}

impl HttpRelayClient {
    pub fn new(target_url: impl Into<String>, timeout: Duration, files: FileStore) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to build reqwest client"),
            target_url: target_url.into(),
            files,
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn send(
        &self,
        record: &SubmissionRecord,
        tracking: &TrackingParams,
    ) -> Result<RelayOutcome, RelayError> {
        let body = payload::build(&record.fields, tracking);

        let request = match record.resume_ref.as_deref() {
            Some(reference) => {
                // The handle moves into the request body and is dropped with it.
                let opened = self.files.open(reference).await?;
                let part = Part::stream_with_length(reqwest::Body::from(opened.file), opened.len)
                    .file_name(opened.file_name);

                let form = body
                    .into_iter()
                    .fold(Form::new(), |form, (k, v)| form.text(k, v))
                    .part(RESUME_PART, part);

                self.client.post(&self.target_url).multipart(form)
            }
            None => self.client.post(&self.target_url).form(&body),
        };

        let outcome = match request.send().await {
            Ok(resp) => RelayOutcome::from_status(resp.status().as_u16()),
            Err(e) => RelayOutcome::TransportError {
                cause: e.to_string(),
            },
        };

        tracing::debug!("Relay of submission {} finished: {outcome:?}", record.id);
        Ok(outcome)
    }
}
