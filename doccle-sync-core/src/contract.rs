#![allow(unused)]

//! # contract: data records and client seams of the pipeline
//!
//! This module defines the document record as delivered by the source service
//! and the two traits the pipeline is written against:
//!
//! - [`DocumentSource`]: list, download and archive documents on the source side.
//! - [`Ingestor`]: push a local file into the document-management system.
//!
//! ## Failure contract
//! - Source operations never return errors. Listing and downloading degrade to
//!   `None` and archiving reports an [`ArchiveOutcome`]; the implementor logs the
//!   cause. One document's trouble must never abort the run for the others.
//! - Ingestion normalises every failure into a single [`IngestionError`].
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; `MockDocumentSource` and
//!   `MockIngestor` are exported with the default `test-export-mocks` feature.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use mockall::{automock, predicate::*};

use crate::error::IngestionError;

/// A server-side action advertised on a document (e.g. archive).
///
/// Read leniently from the raw record: a field that is missing or not a
/// string reads as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAction {
    pub label: String,
    pub method: String,
    pub url: String,
}

impl DocumentAction {
    fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            label: text("label"),
            method: text("method"),
            url: text("url"),
        })
    }

    /// True for the action that archives the document: label `ARCHIVE` and
    /// method `PUT`, compared after trimming and upper-casing.
    pub fn is_archive(&self) -> bool {
        self.label.trim().eq_ignore_ascii_case("ARCHIVE")
            && self.method.trim().eq_ignore_ascii_case("PUT")
    }
}

/// A document record as listed by the source service.
///
/// The record is kept exactly as received, so the sidecar written for it is
/// the upstream JSON. The accessors read the fields the pipeline needs and
/// return `None` for anything missing or of an unexpected type; a single odd
/// record therefore never fails the decoding of a whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl From<Value> for Document {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

impl Document {
    pub fn raw(&self) -> &Value {
        &self.0
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// The id as text; numeric ids are rendered as numbers.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn publish_date(&self) -> Option<&str> {
        self.text("publishDate")
    }

    pub fn content_url(&self) -> Option<&str> {
        self.text("contentUrl").filter(|url| !url.trim().is_empty())
    }

    /// Actions that are JSON objects; anything else in the array is ignored.
    pub fn actions(&self) -> Vec<DocumentAction> {
        self.0
            .get("actions")
            .and_then(Value::as_array)
            .map(|actions| actions.iter().filter_map(DocumentAction::from_value).collect())
            .unwrap_or_default()
    }

    /// Human-readable identification for log lines.
    pub fn label(&self) -> String {
        if let Some(name) = self.name().filter(|name| !name.is_empty()) {
            name.to_string()
        } else if let Some(id) = self.id().filter(|id| !id.is_empty()) {
            id
        } else {
            "Unknown document".to_string()
        }
    }

    /// The first action that archives this document, if the service offers one.
    pub fn archive_action(&self) -> Option<DocumentAction> {
        self.actions().into_iter().find(DocumentAction::is_archive)
    }
}

/// Result of the best-effort archive call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ArchiveOutcome {
    /// The service acknowledged the archive request (HTTP 200 or 204).
    Archived,
    /// The document advertises no archive action; no request was made.
    NoArchiveAction,
    /// The request was made and failed.
    Failed(String),
}

impl ArchiveOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ArchiveOutcome::Failed(_))
    }
}

/// Trait for the document-delivery service.
/// Implemented by the HTTP client and by mocks in testing.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// List documents, optionally only the new ones, optionally capped to a page size.
    /// `None` means "nothing this cycle", whatever the reason.
    async fn list_documents(&self, only_new: bool, max_count: Option<u32>)
        -> Option<Vec<Document>>;

    /// Fetch the raw bytes behind a fully-qualified content URL.
    async fn download_document(&self, content_url: &str) -> Option<Vec<u8>>;

    /// Trigger the server-side archive action of a document, if it has one.
    async fn archive_document(&self, doc: &Document) -> ArchiveOutcome;
}

/// Trait for the document-management ingestion endpoint.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Upload the file at `file_path`.
    async fn ingest(&self, file_path: &Path) -> Result<(), IngestionError>;
}
