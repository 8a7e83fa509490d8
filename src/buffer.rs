//! In-memory aggregation of completed summaries.
//!
//! Image summaries arrive asynchronously relative to the user's request to
//! see them, so they are buffered here instead of pushed immediately. An
//! inbound text message triggers a flush, and the flushed records are
//! joined into one combined digest message.

use std::sync::Mutex;

use crate::core::models::SummaryRecord;

/// Ordered, process-lifetime buffer of summary records.
///
/// Append and flush+clear each happen under a single lock acquisition, so a
/// record appended concurrently with a flush lands in either the flushed
/// batch or the next one, never nowhere.
#[derive(Debug, Default)]
pub struct SummaryBuffer {
    records: Mutex<Vec<SummaryRecord>>,
}

impl SummaryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: SummaryRecord) {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record);
    }

    /// Drains the buffer, returning the records in insertion order.
    pub fn flush_and_get(&self) -> Vec<SummaryRecord> {
        std::mem::take(
            &mut *self
                .records
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
