//! HTTP dispatcher - thin axum surface over the relay pipelines.
//!
//! Routes:
//! - `GET /` - liveness probe
//! - `GET /webhook` - storage subscription verification (challenge echo)
//! - `POST /webhook` - storage change notifications
//! - `POST /callback` - signed messaging platform events

pub mod callback;
pub mod storage_webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::ai::{LlmClient, SummarizeOptions};
use crate::buffer::SummaryBuffer;
use crate::core::config::AppConfig;
use crate::dedup::DuplicateFilter;
use crate::errors::RelayError;
use crate::messaging::MessagingClient;
use crate::storage::StorageClient;

pub const LIVENESS_MESSAGE: &str = "recap relay is running";

/// Everything a request handler needs, shared across concurrent requests.
///
/// The dedup set and the summary buffer are the only mutable members; both
/// guard their state internally so handlers never take a lock directly.
pub struct AppState {
    pub config: AppConfig,
    pub llm: LlmClient,
    pub storage: StorageClient,
    pub messenger: MessagingClient,
    pub dedup: DuplicateFilter,
    pub buffer: SummaryBuffer,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self, RelayError> {
        let llm = LlmClient::new(
            config.openai_api_key.clone(),
            SummarizeOptions::from_config(&config),
        )?;
        let storage = StorageClient::new(
            config.storage_client_id.clone(),
            config.storage_client_secret.clone(),
            config.storage_refresh_token.clone(),
            config.storage_folder_path.clone(),
        )?;
        let messenger = MessagingClient::new(
            config.messaging_access_token.clone(),
            config.messaging_recipient_id.clone(),
        )?;

        Ok(Self {
            config,
            llm,
            storage,
            messenger,
            dedup: DuplicateFilter::new(),
            buffer: SummaryBuffer::new(),
        })
    }
}

/// Build the dispatcher router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route(
            "/webhook",
            get(storage_webhook::verify).post(storage_webhook::notify),
        )
        .route("/callback", post(callback::handle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}
