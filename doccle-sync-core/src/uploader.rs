//! Paperless ingestion client.
//!
//! Uploads a local file as multipart field `document` to
//! `{base_url}/api/documents/post_document/` with `Authorization: Token <token>`.
//! Any 2xx response is success; everything else becomes an [`IngestionError`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use tracing::{error, info};

use crate::config::IngestionConfig;
use crate::contract::Ingestor;
use crate::error::{ConfigError, IngestionError};

pub struct PaperlessClient {
    http: Client,
    post_url: String,
    token: String,
}

impl PaperlessClient {
    /// Fails fast when the endpoint or the token is absent.
    pub fn new(config: &IngestionConfig) -> Result<Self, ConfigError> {
        if config.base_url.trim().is_empty() {
            error!("Paperless URL is not set");
            return Err(ConfigError::Missing("PAPERLESS_URL"));
        }
        if config.token.trim().is_empty() {
            error!("Paperless token is not set");
            return Err(ConfigError::Missing("PAPERLESS_TOKEN"));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let post_url = post_document_url(&config.base_url);
        info!(
            post_url = %post_url,
            token_set = !config.token.is_empty(),
            "Initialized PaperlessClient"
        );
        Ok(Self {
            http,
            post_url,
            token: config.token.clone(),
        })
    }

    pub fn post_url(&self) -> &str {
        &self.post_url
    }
}

pub fn post_document_url(base_url: &str) -> String {
    format!(
        "{}/api/documents/post_document/",
        base_url.trim().trim_end_matches('/')
    )
}

#[async_trait]
impl Ingestor for PaperlessClient {
    async fn ingest(&self, file_path: &Path) -> Result<(), IngestionError> {
        let content = tokio::fs::read(file_path).await.map_err(|e| {
            let message = match e.kind() {
                std::io::ErrorKind::NotFound => {
                    format!("File not found: {}. Error: {e}", file_path.display())
                }
                _ => format!("Error reading file: {}. Error: {e}", file_path.display()),
            };
            error!(file = %file_path.display(), error = %e, "Cannot read file for ingestion");
            IngestionError::new(message)
        })?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let part = Part::bytes(content)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| IngestionError::new(format!("Invalid multipart content type: {e}")))?;
        let form = Form::new().part("document", part);

        let response = self
            .http
            .post(&self.post_url)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(file = %file_path.display(), error = %e, "Error posting document to Paperless");
                IngestionError::new(format!(
                    "Error posting document to Paperless: {}. Error: {e}",
                    file_path.display()
                ))
            })?;

        let status = response.status();
        if status.is_success() {
            info!(file = %file_path.display(), status = status.as_u16(), "Document posted successfully");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(file = %file_path.display(), status = status.as_u16(), body = %body, "Paperless rejected document");
        Err(IngestionError::new(format!(
            "Failed to post document: {} - {}",
            status.as_u16(),
            body
        )))
    }
}
