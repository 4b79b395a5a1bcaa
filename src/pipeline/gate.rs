//! Document gate: bound the input before any expensive work happens.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. size (file length, or UTF-8 byte length for raw text)
//! 2. page count (files only, when the extractor can read it)
//! 3. emptiness (no text, or an extraction sentinel)
//!
//! A document that passes comes out as its raw, unmodified text.

use crate::config::MatchConfig;
use crate::output::{PipelineOutcome, RejectionCode};
use crate::pipeline::extract::{extractor_for, is_failed_extraction, TextExtractor};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// User-facing message for documents without readable text.
pub const FILE_TEXT_EMPTY_MESSAGE: &str = "We couldn't read any text from this file. \
     Please upload a text-based resume (not a scanned image) or use OCR first.";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What the caller handed us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// A resume file on disk.
    Path(PathBuf),
    /// Resume text that was already extracted.
    Text(String),
}

impl DocumentSource {
    /// Treat `input` as a path when it names an existing `.pdf`, `.txt` or
    /// `.md` file; otherwise it is raw resume text.
    pub fn detect(input: &str) -> Self {
        let path = Path::new(input.trim());
        let known_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| ["pdf", "txt", "md"].iter().any(|k| e.eq_ignore_ascii_case(k)));

        if known_extension && path.is_file() {
            DocumentSource::Path(path.to_path_buf())
        } else {
            DocumentSource::Text(input.to_string())
        }
    }
}

/// A refused document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
}

impl Rejection {
    fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<Rejection> for PipelineOutcome {
    fn from(r: Rejection) -> Self {
        PipelineOutcome::rejected(r.code, r.message)
    }
}

/// Run the gate. `Ok` carries the raw document text.
pub async fn admit(source: &DocumentSource, config: &MatchConfig) -> Result<String, Rejection> {
    match source {
        DocumentSource::Text(text) => {
            check_size(text.len() as u64, config.max_document_bytes)?;
            check_text(text.clone())
        }
        DocumentSource::Path(path) => {
            let extractor: &dyn TextExtractor = match &config.extractor {
                Some(custom) => custom.as_ref(),
                None => extractor_for(path),
            };

            // An unreadable file has no size; extraction reports it below.
            if let Ok(meta) = tokio::fs::metadata(path).await {
                check_size(meta.len(), config.max_document_bytes)?;
            }

            match extractor.page_count(path).await {
                Some(pages) => check_pages(pages, config.max_pages)?,
                None => debug!("Page count unavailable for {}", path.display()),
            }

            let text = extractor.extract(path).await;
            info!("Gate read {} characters from {}", text.len(), path.display());
            check_text(text)
        }
    }
}

fn check_size(bytes: u64, limit: u64) -> Result<(), Rejection> {
    if bytes <= limit {
        return Ok(());
    }
    Err(Rejection::new(
        RejectionCode::PdfTooLarge,
        format!(
            "This file is {:.1} MB, larger than the {:.1} MB limit. Please upload a shorter resume.",
            bytes as f64 / BYTES_PER_MB,
            limit as f64 / BYTES_PER_MB
        ),
    ))
}

fn check_pages(pages: usize, limit: usize) -> Result<(), Rejection> {
    if pages <= limit {
        return Ok(());
    }
    Err(Rejection::new(
        RejectionCode::PdfTooLong,
        format!("This document has {pages} pages; at most {limit} pages are supported."),
    ))
}

fn check_text(text: String) -> Result<String, Rejection> {
    if is_failed_extraction(&text) {
        debug!("Extraction produced no usable text: {:?}", text.trim());
        return Err(Rejection::new(
            RejectionCode::FileTextEmpty,
            FILE_TEXT_EMPTY_MESSAGE,
        ));
    }
    Ok(text)
}
