use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SOURCE_BASE_URL: &str = "https://secure.doccle.be/doccle-euui/rest/v2/";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the Doccle document-delivery service.
#[derive(Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Connection settings for the Paperless ingestion endpoint.
#[derive(Clone)]
pub struct IngestionConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for IngestionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// What a single pipeline run needs besides its two clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynchroniseConfig {
    pub download_dir: PathBuf,
    /// Page size passed to the listing call; `None` lists without a limit.
    pub max_documents: Option<u32>,
}

impl SynchroniseConfig {
    pub fn trace_loaded(&self) {
        info!(
            download_dir = %self.download_dir.display(),
            max_documents = ?self.max_documents,
            "Loaded SynchroniseConfig"
        );
        debug!(?self, "SynchroniseConfig loaded (full debug)");
    }
}
