//! Pipeline composition.
//!
//! Each function here chains the components for one notification kind and
//! owns the error policy: upstream failures become sentinel text or log
//! lines at the component boundary and never abort the dispatcher.
//!
//! The pipelines take their collaborators through the seam traits below so
//! the branch logic is exercisable without live vendor endpoints; the
//! concrete clients implement the traits by delegation.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::ai::text_or_placeholder;
use crate::buffer::SummaryBuffer;
use crate::core::models::{ContentItem, SummaryRecord};
use crate::dedup::DuplicateFilter;
use crate::errors::RelayError;

/// Reply sent when a flush trigger arrives and the buffer is empty.
pub const EMPTY_BUFFER_ACK: &str = "No summaries waiting right now.";

/// Source of new content items (the storage provider in production).
#[async_trait]
pub trait ContentSource {
    async fn fetch_latest_document(&self) -> Result<Option<ContentItem>, RelayError>;
}

/// Summarization and image text extraction (the LLM API in production).
#[async_trait]
pub trait Summarizer {
    async fn summarize(&self, text: &str) -> String;
    async fn extract_image_text(&self, image: &[u8], mime: &str) -> Result<String, RelayError>;
}

/// Outbound delivery and message-content retrieval (the messaging platform
/// in production).
#[async_trait]
pub trait Messenger {
    async fn push_text(&self, text: &str) -> Result<(), RelayError>;
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), RelayError>;
    async fn message_content(&self, message_id: &str) -> Result<(Vec<u8>, String), RelayError>;
}

/// What the storage-change pipeline did with a notification.
#[derive(Debug, PartialEq, Eq)]
pub enum StorageOutcome {
    /// The watched folder held no matching file.
    NoNewContent,
    /// The latest file's content was already processed this lifetime.
    Duplicate(String),
    /// A summary was generated and handed to the notifier.
    Summarized(String),
}

/// Storage-change pipeline: fetch latest → duplicate filter → summarize →
/// push.
///
/// Storage errors propagate (the provider sees a 500 and may redeliver);
/// summarizer errors become sentinel text; notifier errors are logged and
/// swallowed so they cannot corrupt pipeline state.
pub async fn handle_storage_change(
    storage: &impl ContentSource,
    dedup: &DuplicateFilter,
    llm: &impl Summarizer,
    messenger: &impl Messenger,
) -> Result<StorageOutcome, RelayError> {
    let Some(item) = storage.fetch_latest_document().await? else {
        info!("Change notification but no matching document found");
        return Ok(StorageOutcome::NoNewContent);
    };

    if dedup.check_and_record(&item.bytes) {
        info!("Skipping already-processed content from {}", item.source_id);
        return Ok(StorageOutcome::Duplicate(item.source_id));
    }

    let summary = llm.summarize(&item.text()).await;
    let message = format!("📄 {}\n{}", item.source_id, summary);

    if let Err(e) = messenger.push_text(&message).await {
        error!("Failed to deliver summary for {}: {}", item.source_id, e);
    }

    Ok(StorageOutcome::Summarized(item.source_id))
}

/// Image-event pipeline: fetch content → OCR → summarize → buffer.
///
/// The summary is buffered rather than delivered; the user pulls the digest
/// with a text message. All upstream failures are absorbed here.
pub async fn handle_image_event(
    messenger: &impl Messenger,
    llm: &impl Summarizer,
    buffer: &SummaryBuffer,
    message_id: &str,
) {
    let (bytes, mime) = match messenger.message_content(message_id).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not fetch image content for {}: {}", message_id, e);
            return;
        }
    };

    let extracted = llm.extract_image_text(&bytes, &mime).await;
    let text = text_or_placeholder(extracted);
    let summary = llm.summarize(&text).await;

    buffer.append(SummaryRecord::now(summary));
    info!("Buffered image summary ({} pending)", buffer.len());
}

/// Text-trigger pipeline: flush the buffer and reply with the combined
/// digest, or a generic acknowledgment when nothing is buffered.
pub async fn handle_text_event(
    messenger: &impl Messenger,
    buffer: &SummaryBuffer,
    reply_token: &str,
) {
    let records = buffer.flush_and_get();

    let reply = if records.is_empty() {
        EMPTY_BUFFER_ACK.to_string()
    } else {
        format_digest(&records)
    };

    if let Err(e) = messenger.reply_text(reply_token, &reply).await {
        error!("Failed to deliver digest reply: {}", e);
    }
}

/// Join flushed records into one message, oldest first, each labeled with
/// its capture time.
pub fn format_digest(records: &[SummaryRecord]) -> String {
    records
        .iter()
        .map(|r| format!("[{}] {}", r.noted_at.format("%H:%M"), r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::NO_TEXT_PLACEHOLDER;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct FixedSource(Option<ContentItem>);

    #[async_trait]
    impl ContentSource for FixedSource {
        async fn fetch_latest_document(&self) -> Result<Option<ContentItem>, RelayError> {
            Ok(self.0.clone())
        }
    }

    /// Summarizer that records what it was asked to summarize.
    struct ScriptedSummarizer {
        ocr: Option<String>,
        inputs: Mutex<Vec<String>>,
    }

    impl ScriptedSummarizer {
        fn new(ocr: Option<&str>) -> Self {
            Self {
                ocr: ocr.map(ToString::to_string),
                inputs: Mutex::new(Vec::new()),
            }
        }

        fn inputs(&self) -> Vec<String> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn summarize(&self, text: &str) -> String {
            self.inputs.lock().unwrap().push(text.to_string());
            format!("summary of: {text}")
        }

        async fn extract_image_text(
            &self,
            _image: &[u8],
            _mime: &str,
        ) -> Result<String, RelayError> {
            self.ocr
                .clone()
                .ok_or_else(|| RelayError::OpenAIError("ocr unavailable".to_string()))
        }
    }

    /// Messenger that records deliveries instead of making them.
    #[derive(Default)]
    struct RecordingMessenger {
        pushes: Mutex<Vec<String>>,
        replies: Mutex<Vec<(String, String)>>,
        content: Option<(Vec<u8>, String)>,
        fail_push: bool,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn push_text(&self, text: &str) -> Result<(), RelayError> {
            if self.fail_push {
                return Err(RelayError::MessagingError("push rejected".to_string()));
            }
            self.pushes.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), RelayError> {
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.to_string(), text.to_string()));
            Ok(())
        }

        async fn message_content(&self, message_id: &str) -> Result<(Vec<u8>, String), RelayError> {
            self.content.clone().ok_or_else(|| {
                RelayError::MessagingError(format!("no content for {message_id}"))
            })
        }
    }

    fn item(text: &str, path: &str) -> ContentItem {
        ContentItem::new(text.as_bytes().to_vec(), path)
    }

    #[tokio::test]
    async fn test_storage_change_summarizes_and_pushes_new_content() {
        let source = FixedSource(Some(item("hello world", "/notes.txt")));
        let dedup = DuplicateFilter::new();
        let llm = ScriptedSummarizer::new(None);
        let messenger = RecordingMessenger::default();

        let outcome = handle_storage_change(&source, &dedup, &llm, &messenger)
            .await
            .unwrap();

        assert_eq!(outcome, StorageOutcome::Summarized("/notes.txt".to_string()));
        assert_eq!(llm.inputs(), vec!["hello world".to_string()]);
        assert_eq!(dedup.len(), 1);

        let pushes = messenger.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert!(pushes[0].contains("/notes.txt"));
        assert!(pushes[0].contains("summary of: hello world"));
    }

    #[tokio::test]
    async fn test_storage_change_skips_duplicate_content() {
        let source = FixedSource(Some(item("same content", "/daily.txt")));
        let dedup = DuplicateFilter::new();
        let llm = ScriptedSummarizer::new(None);
        let messenger = RecordingMessenger::default();

        let first = handle_storage_change(&source, &dedup, &llm, &messenger)
            .await
            .unwrap();
        let second = handle_storage_change(&source, &dedup, &llm, &messenger)
            .await
            .unwrap();

        assert_eq!(first, StorageOutcome::Summarized("/daily.txt".to_string()));
        assert_eq!(second, StorageOutcome::Duplicate("/daily.txt".to_string()));
        // Summarized and pushed exactly once.
        assert_eq!(llm.inputs().len(), 1);
        assert_eq!(messenger.pushes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_change_with_no_matching_file() {
        let source = FixedSource(None);
        let dedup = DuplicateFilter::new();
        let llm = ScriptedSummarizer::new(None);
        let messenger = RecordingMessenger::default();

        let outcome = handle_storage_change(&source, &dedup, &llm, &messenger)
            .await
            .unwrap();

        assert_eq!(outcome, StorageOutcome::NoNewContent);
        assert!(llm.inputs().is_empty());
        assert!(messenger.pushes.lock().unwrap().is_empty());
        assert!(dedup.is_empty());
    }

    #[tokio::test]
    async fn test_storage_change_delivery_failure_does_not_propagate() {
        let source = FixedSource(Some(item("content", "/notes.txt")));
        let dedup = DuplicateFilter::new();
        let llm = ScriptedSummarizer::new(None);
        let messenger = RecordingMessenger {
            fail_push: true,
            ..Default::default()
        };

        let outcome = handle_storage_change(&source, &dedup, &llm, &messenger)
            .await
            .unwrap();

        // The pipeline completes and the content stays recorded even though
        // delivery failed.
        assert_eq!(outcome, StorageOutcome::Summarized("/notes.txt".to_string()));
        assert_eq!(dedup.len(), 1);
    }

    #[tokio::test]
    async fn test_image_event_buffers_summary() {
        let llm = ScriptedSummarizer::new(Some("receipt total 42"));
        let messenger = RecordingMessenger {
            content: Some((vec![0xFF, 0xD8], "image/jpeg".to_string())),
            ..Default::default()
        };
        let buffer = SummaryBuffer::new();

        handle_image_event(&messenger, &llm, &buffer, "m-1").await;

        let records = buffer.flush_and_get();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "summary of: receipt total 42");
    }

    #[tokio::test]
    async fn test_image_event_with_empty_ocr_summarizes_placeholder() {
        let llm = ScriptedSummarizer::new(Some(""));
        let messenger = RecordingMessenger {
            content: Some((vec![0xFF, 0xD8], "image/jpeg".to_string())),
            ..Default::default()
        };
        let buffer = SummaryBuffer::new();

        handle_image_event(&messenger, &llm, &buffer, "m-2").await;

        // The summarizer sees the placeholder, never the empty string.
        assert_eq!(llm.inputs(), vec![NO_TEXT_PLACEHOLDER.to_string()]);
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_image_event_fetch_failure_buffers_nothing() {
        let llm = ScriptedSummarizer::new(Some("unused"));
        let messenger = RecordingMessenger::default(); // no content available
        let buffer = SummaryBuffer::new();

        handle_image_event(&messenger, &llm, &buffer, "m-3").await;

        assert!(llm.inputs().is_empty());
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_text_event_replies_with_digest_and_drains_buffer() {
        let messenger = RecordingMessenger::default();
        let buffer = SummaryBuffer::new();
        buffer.append(SummaryRecord::now("first image summary"));
        buffer.append(SummaryRecord::now("second image summary"));

        handle_text_event(&messenger, &buffer, "r-1").await;

        let replies = messenger.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "r-1");
        assert!(replies[0].1.contains("first image summary"));
        assert!(replies[0].1.contains("second image summary"));
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_text_event_on_empty_buffer_acks() {
        let messenger = RecordingMessenger::default();
        let buffer = SummaryBuffer::new();

        handle_text_event(&messenger, &buffer, "r-2").await;

        let replies = messenger.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].1, EMPTY_BUFFER_ACK);
    }

    #[test]
    fn test_format_digest_preserves_order_and_labels_times() {
        let records = vec![
            SummaryRecord {
                noted_at: chrono::Utc.with_ymd_and_hms(2024, 6, 1, 9, 5, 0).unwrap(),
                text: "first image summary".to_string(),
            },
            SummaryRecord {
                noted_at: chrono::Utc.with_ymd_and_hms(2024, 6, 1, 10, 42, 0).unwrap(),
                text: "second image summary".to_string(),
            },
        ];

        let digest = format_digest(&records);
        assert_eq!(
            digest,
            "[09:05] first image summary\n\n[10:42] second image summary"
        );
    }

    #[test]
    fn test_format_digest_of_single_record_has_no_separator() {
        let records = vec![SummaryRecord::now("only one")];
        assert!(!format_digest(&records).contains("\n\n"));
    }
}
