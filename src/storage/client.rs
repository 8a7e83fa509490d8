//! Storage provider client.
//!
//! Talks to the provider over its HTTP API using the OAuth2 refresh-token
//! flow: short-lived access tokens are minted from the long-lived refresh
//! token and cached until shortly before expiry.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::models::ContentItem;
use crate::errors::RelayError;

const TOKEN_URL: &str = "https://api.dropbox.com/oauth2/token";
const LIST_FOLDER_URL: &str = "https://api.dropboxapi.com/2/files/list_folder";
const DOWNLOAD_URL: &str = "https://content.dropboxapi.com/2/files/download";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Refresh the access token this long before the provider-reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A file entry from a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path_lower: String,
    pub server_modified: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    #[serde(default)]
    path_lower: Option<String>,
    #[serde(default)]
    server_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Storage provider client with OAuth2 refresh-token credentials.
#[derive(Debug)]
pub struct StorageClient {
    http: Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    folder_path: String,
    cached_token: Mutex<Option<CachedToken>>,
}

impl StorageClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        refresh_token: String,
        folder_path: String,
    ) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::HttpError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            client_id,
            client_secret,
            refresh_token,
            folder_path,
            cached_token: Mutex::new(None),
        })
    }

    /// Fetch the most recently modified `.txt` file in the watched folder.
    ///
    /// Only the single latest file per notification is processed; the rest
    /// of the batch is intentionally left for subsequent notifications (the
    /// reference behavior).
    pub async fn fetch_latest_document(&self) -> Result<Option<ContentItem>, RelayError> {
        let Some(entry) = self.latest_text_entry().await? else {
            return Ok(None);
        };

        info!("Fetching latest document: {}", entry.path_lower);
        let bytes = self.download(&entry.path_lower).await?;
        Ok(Some(ContentItem::new(bytes, entry.path_lower)))
    }

    async fn latest_text_entry(&self) -> Result<Option<FileEntry>, RelayError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(LIST_FOLDER_URL)
            .bearer_auth(&token)
            .json(&json!({ "path": self.folder_path, "recursive": false }))
            .send()
            .await
            .map_err(|e| RelayError::HttpError(format!("Folder listing failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::StorageError(format!(
                "Folder listing error (status {status}): {error_text}"
            )));
        }

        let listing: ListFolderResponse = response
            .json()
            .await
            .map_err(|e| RelayError::StorageError(format!("Failed to parse listing: {e}")))?;

        let candidates = text_file_entries(listing.entries);
        if candidates.len() > 1 {
            debug!(
                "{} text files changed; processing only the most recent",
                candidates.len()
            );
        }

        Ok(pick_latest(candidates))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, RelayError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(DOWNLOAD_URL)
            .bearer_auth(&token)
            .header("Dropbox-API-Arg", json!({ "path": path }).to_string())
            .send()
            .await
            .map_err(|e| RelayError::HttpError(format!("Download request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::StorageError(format!(
                "Download error (status {status}) for {path}: {error_text}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::HttpError(format!("Failed to read download body: {e}")))?;

        Ok(bytes.to_vec())
    }

    /// Returns a valid access token, minting a fresh one from the refresh
    /// token when the cached one is missing or about to expire.
    async fn access_token(&self) -> Result<String, RelayError> {
        {
            let cached = self
                .cached_token
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(t) = cached.as_ref() {
                if t.expires_at > Instant::now() {
                    return Ok(t.token.clone());
                }
            }
        }

        debug!("Refreshing storage access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &self.refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .send()
            .await
            .map_err(|e| RelayError::HttpError(format!("Token refresh failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::StorageError(format!(
                "Token refresh error (status {status}): {error_text}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RelayError::StorageError(format!("Failed to parse token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let mut cached = self
            .cached_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

#[async_trait::async_trait]
impl crate::relay::ContentSource for StorageClient {
    async fn fetch_latest_document(&self) -> Result<Option<ContentItem>, RelayError> {
        StorageClient::fetch_latest_document(self).await
    }
}

/// Keep only regular `.txt` files that carry a usable path and timestamp.
fn text_file_entries(entries: Vec<RawEntry>) -> Vec<FileEntry> {
    entries
        .into_iter()
        .filter_map(|e| {
            if e.tag != "file" || !e.name.to_lowercase().ends_with(".txt") {
                return None;
            }
            Some(FileEntry {
                name: e.name,
                path_lower: e.path_lower?,
                server_modified: e.server_modified?,
            })
        })
        .collect()
}

/// The single most recently modified entry, if any.
fn pick_latest(entries: Vec<FileEntry>) -> Option<FileEntry> {
    entries.into_iter().max_by_key(|e| e.server_modified)
}
