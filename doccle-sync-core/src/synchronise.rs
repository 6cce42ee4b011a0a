//! High-level pipeline: list → download → validate → persist → ingest → archive.
//!
//! One call to [`synchronise`] is one run. Documents are processed strictly
//! one after the other, in listing order, and every document ends in exactly
//! one [`DocumentOutcome`]. Nothing a single document does can abort the run;
//! the only run-level failure is an unusable download directory.
//!
//! # Ordering contract per document
//! 1. Download. No bytes: `DownloadFailed`.
//! 2. Validate the `%PDF-` signature. Mismatch: `InvalidContent`, nothing written.
//! 3. Build the filename. Unparseable publish date: `InvalidMetadata`.
//! 4. Persist the PDF, then its JSON sidecar, as one unit. Failure: `PersistFailed`.
//! 5. Ingest the PDF. Failure is recorded but does not skip step 6.
//! 6. Archive on the source side. Archiving is best-effort and never changes
//!    the outcome; failures are counted separately on the report.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Artifact writing: [`write_artifact`]

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::SynchroniseConfig;
use crate::contract::{ArchiveOutcome, Document, DocumentSource, Ingestor};
use crate::error::{PersistError, SyncError};
use crate::naming::{build_filename, is_valid_pdf, sidecar_name};

/// Terminal classification of one document within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentOutcome {
    /// Downloaded, stored and accepted by the ingestion service.
    Forwarded,
    DownloadFailed,
    InvalidContent,
    InvalidMetadata,
    PersistFailed,
    /// Stored locally but rejected (or unreachable) downstream.
    IngestionFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub name: String,
    /// Name of the stored PDF, once one was built.
    pub filename: Option<String>,
    pub outcome: DocumentOutcome,
    /// Only set when the archive step was reached.
    pub archive: Option<ArchiveOutcome>,
}

/// Per-document results of one run, in listing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SynchroniseReport {
    pub documents: Vec<DocumentReport>,
}

impl SynchroniseReport {
    pub fn count(&self, outcome: DocumentOutcome) -> usize {
        self.documents
            .iter()
            .filter(|d| d.outcome == outcome)
            .count()
    }

    pub fn forwarded(&self) -> usize {
        self.count(DocumentOutcome::Forwarded)
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.forwarded()
    }

    pub fn archive_failures(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| d.archive.as_ref().is_some_and(ArchiveOutcome::is_failure))
            .count()
    }

    fn trace_summary(&self) {
        info!(
            documents = self.documents.len(),
            forwarded = self.forwarded(),
            download_failed = self.count(DocumentOutcome::DownloadFailed),
            invalid_content = self.count(DocumentOutcome::InvalidContent),
            invalid_metadata = self.count(DocumentOutcome::InvalidMetadata),
            persist_failed = self.count(DocumentOutcome::PersistFailed),
            ingestion_failed = self.count(DocumentOutcome::IngestionFailed),
            archive_failures = self.archive_failures(),
            "[SYNC] Run finished"
        );
    }
}

/// Run the pipeline once against the given clients.
pub async fn synchronise<S, I>(
    config: &SynchroniseConfig,
    source: &S,
    ingestor: &I,
) -> Result<SynchroniseReport, SyncError>
where
    S: DocumentSource + ?Sized,
    I: Ingestor + ?Sized,
{
    info!("[SYNC] Starting synchronisation run");

    let documents = match source.list_documents(true, config.max_documents).await {
        Some(docs) if !docs.is_empty() => docs,
        _ => {
            info!("[SYNC] No new documents to download.");
            return Ok(SynchroniseReport::default());
        }
    };
    info!(count = documents.len(), "[SYNC] New documents listed");

    tokio::fs::create_dir_all(&config.download_dir).await.map_err(|source| {
        error!(path = %config.download_dir.display(), error = %source, "[SYNC][ERROR] Cannot create download directory");
        SyncError::DownloadDir {
            path: config.download_dir.clone(),
            source,
        }
    })?;

    let mut report = SynchroniseReport::default();
    for doc in &documents {
        let entry = process_document(&config.download_dir, doc, source, ingestor).await;
        debug!(document = %entry.name, outcome = ?entry.outcome, "[SYNC] Document finished");
        report.documents.push(entry);
    }

    report.trace_summary();
    Ok(report)
}

async fn process_document<S, I>(
    download_dir: &Path,
    doc: &Document,
    source: &S,
    ingestor: &I,
) -> DocumentReport
where
    S: DocumentSource + ?Sized,
    I: Ingestor + ?Sized,
{
    let name = doc.label();
    let finish = |filename: Option<String>,
                  outcome: DocumentOutcome,
                  archive: Option<ArchiveOutcome>| DocumentReport {
        name: name.clone(),
        filename,
        outcome,
        archive,
    };

    let Some(content_url) = doc.content_url() else {
        error!(document = %name, "[SYNC][ERROR] Document has no content URL");
        return finish(None, DocumentOutcome::DownloadFailed, None);
    };
    let Some(content) = source.download_document(content_url).await else {
        error!(document = %name, url = %content_url, "[SYNC][ERROR] Failed to download document");
        return finish(None, DocumentOutcome::DownloadFailed, None);
    };

    if !is_valid_pdf(&content) {
        error!(document = %name, size = content.len(), "[SYNC][ERROR] Downloaded content is not a PDF");
        return finish(None, DocumentOutcome::InvalidContent, None);
    }

    let filename = match build_filename(doc) {
        Ok(f) => f,
        Err(e) => {
            error!(document = %name, error = %e, "[SYNC][ERROR] Skipping document with invalid metadata");
            return finish(None, DocumentOutcome::InvalidMetadata, None);
        }
    };

    let persisted = {
        let dir = download_dir.to_path_buf();
        let target = filename.clone();
        let record = doc.clone();
        tokio::task::spawn_blocking(move || write_artifact(&dir, &target, &content, &record)).await
    };
    let pdf_path = match persisted {
        Ok(Ok(path)) => path,
        Ok(Err(e)) => {
            error!(document = %name, file = %filename, error = %e, "[SYNC][ERROR] Failed to store document");
            return finish(Some(filename), DocumentOutcome::PersistFailed, None);
        }
        Err(e) => {
            error!(document = %name, file = %filename, error = %e, "[SYNC][ERROR] Store task did not finish");
            return finish(Some(filename), DocumentOutcome::PersistFailed, None);
        }
    };

    let outcome = match ingestor.ingest(&pdf_path).await {
        Ok(()) => {
            info!(document = %name, file = %filename, "[SYNC][UPLOAD] Document posted to Paperless");
            DocumentOutcome::Forwarded
        }
        Err(e) => {
            error!(document = %name, file = %filename, error = %e, "[SYNC][ERROR][UPLOAD] Failed to post document to Paperless");
            DocumentOutcome::IngestionFailed
        }
    };

    let archive = source.archive_document(doc).await;
    match &archive {
        ArchiveOutcome::Archived => info!(document = %name, "[SYNC] Document archived"),
        ArchiveOutcome::NoArchiveAction => {
            warn!(document = %name, "[SYNC] Document offers no archive action")
        }
        ArchiveOutcome::Failed(reason) => {
            warn!(document = %name, reason = %reason, "[SYNC] Archiving failed")
        }
    }

    finish(Some(filename), outcome, Some(archive))
}

/// Store `content` as `{dir}/{filename}` and the document record as its JSON
/// sidecar. Both files are written through a temp file and renamed into
/// place; if the sidecar cannot be stored the PDF is removed again.
pub fn write_artifact(
    dir: &Path,
    filename: &str,
    content: &[u8],
    doc: &Document,
) -> Result<PathBuf, PersistError> {
    let pdf_path = dir.join(filename);
    let json_path = dir.join(sidecar_name(filename));

    let record = sidecar_json(doc)?;

    write_atomically(dir, &pdf_path, content)?;
    let digest = format!("{:x}", Sha256::digest(content));
    info!(file = %pdf_path.display(), size = content.len(), sha256 = %digest, "Downloaded PDF");

    if let Err(e) = write_atomically(dir, &json_path, &record) {
        if let Err(cleanup) = std::fs::remove_file(&pdf_path) {
            error!(file = %pdf_path.display(), error = %cleanup, "Failed to remove PDF after sidecar write failure");
        }
        return Err(e);
    }
    info!(file = %json_path.display(), "Saved document data as JSON");

    Ok(pdf_path)
}

/// The record as received, pretty-printed with four-space indentation;
/// non-ASCII text is kept as is.
pub fn sidecar_json(doc: &Document) -> Result<Vec<u8>, PersistError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    Ok(buf)
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: target.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(target).map_err(|e| io_err(e.error))?;
    Ok(())
}
