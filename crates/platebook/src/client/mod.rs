//! Client side of the record API.
//!
//! [`RecordApi`] is the seam between the table state in [`table`] and the
//! transport. [`HttpClient`] talks to a running server; [`LocalClient`]
//! calls a [`RecordService`] in-process.

pub mod cache;
pub mod table;

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::http::{ErrorResponse, ListResponse};
use crate::record::{NewRecord, Record};
use crate::service::{Ack, Created, RecordRequest, RecordService};

pub use cache::{RecordCache, Undo};
pub use table::{EditSession, Feedback, RecordTable, Severity};

/// Errors seen by API clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("request rejected with status {status}: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the response envelope, if one was sent.
        message: Option<String>,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// A success response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The action's local preconditions were not met; nothing was sent.
    #[error("{0}")]
    Refused(&'static str),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// The reason reported by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of a rejected request.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the request failed before reaching the server.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<crate::error::Error> for ClientError {
    fn from(err: crate::error::Error) -> Self {
        Self::Rejected {
            status: err.status_code(),
            message: Some(err.public_message()),
        }
    }
}

/// The four record API operations as seen by a client.
#[async_trait::async_trait]
pub trait RecordApi: Send + Sync {
    /// Fetch every record.
    async fn list(&self) -> Result<Vec<Record>>;

    /// Register a new plate.
    async fn create(&self, record: &NewRecord) -> Result<Created>;

    /// Replace a plate's details.
    async fn update(&self, plate: &str, details: &str) -> Result<Ack>;

    /// Remove a plate.
    async fn delete(&self, plate: &str) -> Result<Ack>;
}

/// [`RecordApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client from the `client` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url(), config.client_timeout())
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn records_url(&self) -> String {
        format!("{}/records", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()));
        }

        let message = response.json::<ErrorResponse>().await.ok().map(|b| b.error);
        debug!("Request rejected with {status}: {message:?}");
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl RecordApi for HttpClient {
    async fn list(&self) -> Result<Vec<Record>> {
        let body: ListResponse = self.send(self.client.get(self.records_url())).await?;
        Ok(body.data)
    }

    async fn create(&self, record: &NewRecord) -> Result<Created> {
        self.send(self.client.post(self.records_url()).json(record))
            .await
    }

    async fn update(&self, plate: &str, details: &str) -> Result<Ack> {
        let body = RecordRequest::new(plate, details);
        self.send(self.client.put(self.records_url()).json(&body))
            .await
    }

    async fn delete(&self, plate: &str) -> Result<Ack> {
        let body = RecordRequest::plate(plate);
        self.send(self.client.delete(self.records_url()).json(&body))
            .await
    }
}

/// [`RecordApi`] that calls a [`RecordService`] directly.
#[derive(Debug, Clone)]
pub struct LocalClient {
    service: RecordService,
}

impl LocalClient {
    /// Wrap a service.
    #[must_use]
    pub fn new(service: RecordService) -> Self {
        Self { service }
    }

    /// The wrapped service.
    #[must_use]
    pub fn service(&self) -> &RecordService {
        &self.service
    }
}

#[async_trait::async_trait]
impl RecordApi for LocalClient {
    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.service.list().await?)
    }

    async fn create(&self, record: &NewRecord) -> Result<Created> {
        let request = RecordRequest::new(record.plate.clone(), record.details.clone());
        Ok(self.service.create(&request).await?)
    }

    async fn update(&self, plate: &str, details: &str) -> Result<Ack> {
        Ok(self
            .service
            .update(&RecordRequest::new(plate, details))
            .await?)
    }

    async fn delete(&self, plate: &str) -> Result<Ack> {
        Ok(self.service.delete(&RecordRequest::plate(plate)).await?)
    }
}
