//! recap - a webhook relay that summarizes freshly arrived content with an
//! LLM and delivers the result to a messaging platform.
//!
//! The service exposes a small HTTP surface:
//! 1. A storage-change webhook that fetches the most recently modified text
//!    file, runs it through duplicate suppression and summarization, and
//!    pushes the summary to a configured recipient
//! 2. A messaging callback that OCRs incoming images into buffered summaries
//!    and flushes the buffer as one combined digest when the user sends a
//!    text message
//!
//! # Architecture
//!
//! The system uses:
//! - axum for the HTTP dispatcher
//! - reqwest for all outbound vendor calls (storage, messaging, LLM)
//! - hmac/sha2 for callback signature verification and content fingerprints
//! - Tokio for the async runtime
//!
//! All shared state (the seen-content fingerprint set and the summary
//! buffer) lives in [`api::AppState`] and is guarded by short, await-free
//! mutex sections so concurrent webhook deliveries cannot double-process
//! content or lose buffered records.

// Module declarations
pub mod ai;
pub mod api;
pub mod buffer;
pub mod core;
pub mod dedup;
pub mod errors;
pub mod messaging;
pub mod relay;
pub mod storage;

/// Configure structured logging with an `RUST_LOG`-style environment filter.
///
/// Call once at process start, before any request is served.
///
/// # Example
///
/// ```
/// recap::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
