//! HTTP transport for the record API.
//!
//! ## Routes
//!
//! - `GET /records`: `200 {"data": [...]}`
//! - `POST /records`: body `{plate, details}`, `201 {"message", "id"}`
//! - `PUT /records`: body `{plate, details}`, `200 {"message"}`
//! - `DELETE /records`: body `{plate}`, `200 {"message"}`
//! - `GET /health`: `200 {"ok": true, "records": <count>}`
//!
//! Every failure is answered with `{"error": "..."}` and the status from
//! [`Error::status_code`].

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::service::{RecordRequest, RecordService};
use crate::storage::Connector;

/// Reported when the request body is not a JSON object.
pub const INVALID_BODY: &str = "invalid request body";

/// Envelope for `GET /records`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Every stored record.
    pub data: Vec<Record>,
}

/// Envelope for every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Caller-facing reason.
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        (status, Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

/// Build the axum `Router` for the record API.
pub fn router(service: RecordService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/records",
            get(list_handler)
                .post(create_handler)
                .put(update_handler)
                .delete(delete_handler),
        )
        .with_state(service)
}

/// Open storage, serve the record API on `server.bind` until Ctrl-C or
/// SIGTERM, then close storage.
///
/// # Errors
///
/// Returns an error if storage cannot be opened, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let connector = Connector::open(config).await?;
    let service = RecordService::new(connector.clone(), config.records.plate_policy);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "Record API listening on {} (plate policy: {})",
        listener.local_addr()?,
        config.records.plate_policy
    );

    let served = serve_with(
        listener,
        service,
        shutdown_signal(),
        config.shutdown_timeout(),
    )
    .await;

    connector.shutdown().await?;
    served
}

/// Serve the record API on an already bound listener until `shutdown`
/// resolves.
///
/// In-flight requests get `grace` to finish once `shutdown` fires.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve_with<F>(
    listener: TcpListener,
    service: RecordService,
    shutdown: F,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let triggered = Arc::new(Notify::new());
    let notifier = Arc::clone(&triggered);

    let server = axum::serve(listener, router(service))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown requested, draining connections");
            notifier.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        served = &mut server => served?,
        () = async {
            triggered.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("Connections still open after {:?}; stopping anyway", grace);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Unwrap a JSON body or answer 400.
fn request_body(
    payload: std::result::Result<Json<RecordRequest>, JsonRejection>,
) -> std::result::Result<RecordRequest, Response> {
    payload.map(|Json(request)| request).map_err(|rejection| {
        debug!("Rejected request body: {rejection}");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(INVALID_BODY)),
        )
            .into_response()
    })
}

/// `GET /health`
async fn health_handler(State(service): State<RecordService>) -> Response {
    match service.count().await {
        Ok(records) => Json(json!({ "ok": true, "records": records })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /records`
async fn list_handler(State(service): State<RecordService>) -> Response {
    match service.list().await {
        Ok(data) => (StatusCode::OK, Json(ListResponse { data })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `POST /records`
async fn create_handler(
    State(service): State<RecordService>,
    payload: std::result::Result<Json<RecordRequest>, JsonRejection>,
) -> Response {
    let request = match request_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match service.create(&request).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `PUT /records`
async fn update_handler(
    State(service): State<RecordService>,
    payload: std::result::Result<Json<RecordRequest>, JsonRejection>,
) -> Response {
    let request = match request_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match service.update(&request).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `DELETE /records`
async fn delete_handler(
    State(service): State<RecordService>,
    payload: std::result::Result<Json<RecordRequest>, JsonRejection>,
) -> Response {
    let request = match request_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match service.delete(&request).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}
