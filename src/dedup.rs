//! Duplicate suppression for relayed content.
//!
//! Every piece of content is reduced to a SHA-256 fingerprint and checked
//! against a process-lifetime set. The set grows without bound and is lost
//! on restart; both are accepted limitations of the reference behavior.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Mutex;

/// Fixed-length digest of content bytes, used as the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        Self(digest.into())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Process-wide set of content fingerprints seen so far.
///
/// The membership test and insert happen under a single lock acquisition so
/// that two concurrent deliveries of the same content cannot both pass the
/// duplicate check.
#[derive(Debug, Default)]
pub struct DuplicateFilter {
    seen: Mutex<HashSet<Fingerprint>>,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this exact content was already seen; otherwise
    /// records it as seen and returns `false`.
    pub fn check_and_record(&self, content: &[u8]) -> bool {
        let fingerprint = Fingerprint::of(content);
        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        !seen.insert(fingerprint)
    }

    /// Number of distinct fingerprints recorded so far.
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
