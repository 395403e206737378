//! Autosave through the HTTP API.

use async_trait::async_trait;
use harmolyze_editor::{SinkError, TuneSink, TuneUpdate};

use crate::api::{ApiClient, ClientError};

/// [`TuneSink`] that `PUT`s every update to the server.
///
/// Any 2xx answer counts as saved.
pub struct HttpTuneSink {
    api: ApiClient,
}

impl HttpTuneSink {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TuneSink for HttpTuneSink {
    async fn save(&self, update: &TuneUpdate) -> Result<(), SinkError> {
        self.api.update_tune(update).await.map_err(|e| match e {
            ClientError::ApiError { status: 404, .. } => SinkError::NotFound(update.tune_id),
            ClientError::ApiError {
                status, message, ..
            } => SinkError::Rejected { status, message },
            ClientError::SigninRequired { location } => SinkError::Rejected {
                status: 303,
                message: format!("redirected to {location}"),
            },
            ClientError::Request(e) => SinkError::Transport(e.to_string()),
        })
    }
}
