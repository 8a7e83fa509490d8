use chrono::{DateTime, Utc};

/// A unit of work flowing through the relay: content pulled from a
/// notification source, consumed exactly once by the summarizer.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Raw content bytes (file download or decoded message payload).
    pub bytes: Vec<u8>,
    /// Where the content came from: a storage path or a message id.
    pub source_id: String,
    /// When the relay first saw this item.
    pub discovered_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(bytes: Vec<u8>, source_id: impl Into<String>) -> Self {
        Self {
            bytes,
            source_id: source_id.into(),
            discovered_at: Utc::now(),
        }
    }

    /// Content as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// One completed summary waiting in the aggregation buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub noted_at: DateTime<Utc>,
    pub text: String,
}

impl SummaryRecord {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            noted_at: Utc::now(),
            text: text.into(),
        }
    }
}
