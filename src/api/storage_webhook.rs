//! Storage-change webhook handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::AppState;
use crate::relay;
use crate::storage::StorageNotification;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    challenge: Option<String>,
}

/// Subscription verification: echo the challenge back verbatim.
pub async fn verify(Query(params): Query<VerifyParams>) -> Response {
    match params.challenge {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => (StatusCode::BAD_REQUEST, "missing challenge").into_response(),
    }
}

/// Storage change notification: run the fetch → filter → summarize → push
/// chain inline, holding the request open until it completes.
pub async fn notify(State(state): State<Arc<AppState>>, body: String) -> Response {
    let notification: StorageNotification = match serde_json::from_str(&body) {
        Ok(n) => n,
        Err(e) => {
            warn!("Malformed storage notification: {}", e);
            return (StatusCode::BAD_REQUEST, "invalid payload").into_response();
        }
    };

    if !notification.has_changes() {
        info!("Storage notification with no change entries");
        return (StatusCode::OK, "no change").into_response();
    }

    match relay::handle_storage_change(&state.storage, &state.dedup, &state.llm, &state.messenger)
        .await
    {
        Ok(outcome) => {
            info!("Storage pipeline finished: {:?}", outcome);
            (StatusCode::OK, "ok").into_response()
        }
        Err(e) => {
            error!("Storage pipeline failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}
