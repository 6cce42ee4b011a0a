//! Deterministic, filesystem-safe names for downloaded documents.
//!
//! The base name is a pure function of the document's display name and
//! publish date, so re-running over the same document overwrites its artifacts
//! instead of duplicating them.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

use crate::contract::Document;
use crate::error::NamingError;

/// Timestamp layout of `publishDate` as sent by the source service.
pub const PUBLISH_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Extension used for the stored PDF. The service only delivers PDFs.
pub const PDF_EXTENSION: &str = "PDF";

const PDF_SIGNATURE: &[u8] = b"%PDF-";
const MAX_NAME_CHARS: usize = 180;
const FALLBACK_NAME: &str = "document";

fn unsafe_runs() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}._-]+").expect("static pattern compiles"))
}

/// Replace every run of characters outside letters, digits, `.`, `_` and `-`
/// with a single `_`, trim separators at both ends and cap the length.
pub fn sanitize_name(name: &str) -> String {
    let replaced = unsafe_runs().replace_all(name, "_");
    let trimmed = replaced.trim_matches(|c| c == '_' || c == '.');
    let capped: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
    let capped = capped.trim_end_matches(|c| c == '_' || c == '.');
    if capped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        capped.to_string()
    }
}

/// `publishDate` reformatted as `YYYY-MM-DD`.
pub fn publish_day(publish_date: &str) -> Result<String, NamingError> {
    NaiveDateTime::parse_from_str(publish_date, PUBLISH_DATE_FORMAT)
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .map_err(|source| NamingError::PublishDate {
            value: publish_date.to_string(),
            source,
        })
}

/// `{sanitized_name}_{YYYY-MM-DD}.PDF`
pub fn build_filename(doc: &Document) -> Result<String, NamingError> {
    let publish_date = doc
        .publish_date()
        .ok_or(NamingError::MissingField("publishDate"))?;
    let day = publish_day(publish_date)?;
    Ok(format!(
        "{}_{}.{}",
        sanitize_name(doc.name().unwrap_or_default()),
        day,
        PDF_EXTENSION
    ))
}

/// Name of the JSON sidecar belonging to a PDF filename.
pub fn sidecar_name(pdf_filename: &str) -> String {
    let stem = match pdf_filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => pdf_filename,
    };
    format!("{stem}.json")
}

pub fn is_valid_pdf(content: &[u8]) -> bool {
    content.starts_with(PDF_SIGNATURE)
}
