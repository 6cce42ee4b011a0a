//! Retry sweep: re-submit every PDF in a directory to the ingestion service.
//!
//! The sweep never deletes or moves files, so it is safe to run repeatedly.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::contract::Ingestor;

#[derive(Debug, Default)]
pub struct SweepReport {
    pub ingested: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Case-insensitive `.pdf` suffix check on a file name.
pub fn has_pdf_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Regular files in `directory` with a `.pdf` name, sorted by file name.
pub fn pdf_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if has_pdf_extension(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Ingest every PDF in `directory`, one at a time, logging each result.
/// Only a directory that cannot be read is an error.
pub async fn sweep<I>(directory: &Path, ingestor: &I) -> std::io::Result<SweepReport>
where
    I: Ingestor + ?Sized,
{
    let files = pdf_files(directory).map_err(|e| {
        error!(path = %directory.display(), error = %e, "Cannot read sweep directory");
        e
    })?;
    info!(path = %directory.display(), count = files.len(), "Starting retry sweep");

    let mut report = SweepReport::default();
    for file in files {
        let display_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match ingestor.ingest(&file).await {
            Ok(()) => {
                info!(file = %display_name, "Document posted successfully");
                report.ingested.push(file);
            }
            Err(e) => {
                error!(file = %display_name, error = %e, "Failed to post document");
                report.failed.push((file, e.to_string()));
            }
        }
    }

    info!(
        ingested = report.ingested.len(),
        failed = report.failed.len(),
        "Retry sweep finished"
    );
    Ok(report)
}
