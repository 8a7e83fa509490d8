//! Storage provider (Dropbox-style) integration: change-notification
//! payloads and the content-fetching client.

pub mod client;

pub use client::StorageClient;

use serde::Deserialize;

/// Provider-defined change-notification payload.
///
/// Only the account list matters to the dispatcher: an empty list means
/// nothing changed and the pipeline must not run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageNotification {
    #[serde(default)]
    pub list_folder: ListFolderNotice,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFolderNotice {
    #[serde(default)]
    pub accounts: Vec<String>,
}

impl StorageNotification {
    pub fn has_changes(&self) -> bool {
        !self.list_folder.accounts.is_empty()
    }
}
