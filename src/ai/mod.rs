//! LLM (`OpenAI`) API integration: summarization and image text extraction.

pub mod client;

pub use client::{LlmClient, SummarizeOptions};

use crate::errors::RelayError;
use tracing::warn;

/// Substituted for image content when text extraction yields nothing.
///
/// The placeholder is itself summarized so the user still gets a visible
/// response instead of silence.
pub const NO_TEXT_PLACEHOLDER: &str = "(no text extracted)";

/// Maps an OCR outcome onto the text handed to the summarizer.
///
/// Failures and empty extractions both degrade to [`NO_TEXT_PLACEHOLDER`];
/// OCR errors never propagate past this boundary.
pub fn text_or_placeholder(extracted: Result<String, RelayError>) -> String {
    match extracted {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => NO_TEXT_PLACEHOLDER.to_string(),
        Err(e) => {
            warn!("Image text extraction failed: {}", e);
            NO_TEXT_PLACEHOLDER.to_string()
        }
    }
}
