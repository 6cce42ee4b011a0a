//! Doccle client: lists, downloads and archives documents over HTTP.
//!
//! Every request carries Basic Auth and is bounded by the configured timeout.
//! None of the operations return errors; failures are logged and reported as
//! "nothing happened" so the pipeline can move on to the next document.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::SourceConfig;
use crate::contract::{ArchiveOutcome, Document, DocumentSource};
use crate::error::ConfigError;

/// Body of the listing endpoints. Each record stays raw JSON; see [`Document`].
#[derive(Debug, Deserialize)]
struct DocumentPage {
    #[serde(default)]
    documents: Option<Vec<Document>>,
}

pub struct DoccleClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl DoccleClient {
    pub fn new(config: &SourceConfig) -> Result<Self, ConfigError> {
        if config.username.trim().is_empty() {
            return Err(ConfigError::Missing("DOCCLE_USERNAME"));
        }
        if config.password.is_empty() {
            return Err(ConfigError::Missing("DOCCLE_PASSWORD"));
        }
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("DOCCLE_BASE_URL"));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        info!(
            base_url = %config.base_url,
            username = %config.username,
            timeout_secs = config.timeout.as_secs(),
            "Initialized DoccleClient"
        );
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Listing endpoint for the requested filter.
    pub fn listing_url(&self, only_new: bool) -> String {
        if only_new {
            format!("{}/documents/new", self.base_url)
        } else {
            format!("{}/documents", self.base_url)
        }
    }
}

/// Query parameters of the listing call. `pageSize` is only sent for a
/// positive cap.
pub fn listing_query(max_count: Option<u32>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("lang", "en".to_string()),
        ("order", "DESC".to_string()),
        ("page", "1".to_string()),
        ("sort", "date".to_string()),
    ];
    if let Some(n) = max_count.filter(|n| *n > 0) {
        query.push(("pageSize", n.to_string()));
    }
    query
}

#[async_trait]
impl DocumentSource for DoccleClient {
    async fn list_documents(
        &self,
        only_new: bool,
        max_count: Option<u32>,
    ) -> Option<Vec<Document>> {
        let url = self.listing_url(only_new);
        info!(url = %url, only_new, ?max_count, "Listing Doccle documents");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&listing_query(max_count))
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to reach Doccle listing endpoint");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, url = %url, body = %body, "Doccle listing returned an error status");
            return None;
        }

        match response.json::<DocumentPage>().await {
            Ok(page) => {
                let documents = page.documents.unwrap_or_default();
                info!(count = documents.len(), "Doccle listing succeeded");
                Some(documents)
            }
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to decode Doccle listing body");
                None
            }
        }
    }

    async fn download_document(&self, content_url: &str) -> Option<Vec<u8>> {
        debug!(url = %content_url, "Downloading document content");
        let response = match self
            .http
            .get(content_url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, url = %content_url, "An error occurred while downloading the document");
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or("unknown"),
                url = %content_url,
                "Failed to download document"
            );
            return None;
        }

        match response.bytes().await {
            Ok(bytes) => {
                debug!(url = %content_url, size = bytes.len(), "Downloaded document content");
                Some(bytes.to_vec())
            }
            Err(e) => {
                warn!(error = %e, url = %content_url, "Failed to read document body");
                None
            }
        }
    }

    async fn archive_document(&self, doc: &Document) -> ArchiveOutcome {
        let Some(action) = doc.archive_action() else {
            info!(document = %doc.label(), "No ARCHIVE action found in document actions");
            return ArchiveOutcome::NoArchiveAction;
        };

        debug!(document = %doc.label(), url = %action.url, "Archiving document");
        let response = self
            .http
            .put(&action.url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await;

        match response {
            Ok(resp) if matches!(resp.status(), StatusCode::OK | StatusCode::NO_CONTENT) => {
                info!(document = %doc.label(), "Document archived successfully");
                ArchiveOutcome::Archived
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                error!(document = %doc.label(), status = %status, body = %body, "Failed to archive document");
                ArchiveOutcome::Failed(format!("HTTP {}: {}", status.as_u16(), body))
            }
            Err(e) => {
                error!(document = %doc.label(), error = %e, "Archive request failed");
                ArchiveOutcome::Failed(e.to_string())
            }
        }
    }
}
