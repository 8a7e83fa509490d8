//! Messaging platform callback handler.
//!
//! The signature check runs before anything else; a request that fails it
//! is rejected with no side effects on shared state.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use super::AppState;
use crate::messaging::events::parse_callback_events;
use crate::messaging::signature::verify_callback_signature;
use crate::messaging::CallbackEvent;
use crate::relay;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

pub async fn handle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        warn!("Callback without signature header");
        return (StatusCode::BAD_REQUEST, "missing signature").into_response();
    };

    if !verify_callback_signature(&state.config.messaging_channel_secret, &body, signature) {
        warn!("Callback signature verification failed");
        return (StatusCode::BAD_REQUEST, "invalid signature").into_response();
    }

    let events = match parse_callback_events(&body) {
        Ok(events) => events,
        Err(e) => {
            warn!("Malformed callback body: {}", e);
            return (StatusCode::BAD_REQUEST, "invalid payload").into_response();
        }
    };

    for event in events {
        match event {
            CallbackEvent::Image { message_id, .. } => {
                relay::handle_image_event(&state.messenger, &state.llm, &state.buffer, &message_id)
                    .await;
            }
            CallbackEvent::Text { text, reply_token } => {
                // Any text message triggers the flush; the content only
                // matters for the log trail.
                info!(
                    "Digest flush triggered by text message ({} chars)",
                    text.chars().count()
                );
                relay::handle_text_event(&state.messenger, &state.buffer, &reply_token).await;
            }
            CallbackEvent::Unsupported => {
                debug!("Ignoring unsupported callback event");
            }
        }
    }

    (StatusCode::OK, "OK").into_response()
}
