//! Text extraction: turn a resume file into raw text.
//!
//! Extraction never fails loudly. A document that cannot be read produces
//! one of the sentinel strings below, and the gate turns any sentinel into a
//! `FILE_TEXT_EMPTY` rejection. This keeps "the PDF is scanned", "the path is
//! wrong" and "pdfium choked" on the same user-facing path.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not safe to call
//! from async contexts. All pdfium work runs on the blocking thread pool.

use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Sentinel prefix: the path does not name a readable PDF.
pub const INVALID_PATH_PREFIX: &str = "Error: The provided path";
/// Sentinel: the PDF opened but contained no text layer.
pub const EMPTY_EXTRACTION_WARNING: &str = "Warning: No text content was extracted from the PDF.";
/// Sentinel prefix: pdfium (or the file system) failed.
pub const EXTRACTION_FAILED_PREFIX: &str = "PDF parsing failed";

/// Build the invalid-path sentinel for `path`.
pub fn invalid_path_message(path: &Path) -> String {
    format!(
        "{INVALID_PATH_PREFIX} '{}' is not a valid PDF file.",
        path.display()
    )
}

/// `true` when `text` is empty or one of the extraction sentinels.
pub fn is_failed_extraction(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    normalized.is_empty()
        || normalized.starts_with(&EMPTY_EXTRACTION_WARNING.to_lowercase())
        || normalized.starts_with(&INVALID_PATH_PREFIX.to_lowercase())
        || normalized.starts_with(&EXTRACTION_FAILED_PREFIX.to_lowercase())
}

/// A black-box text extractor for one document format.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Page count from document metadata, if the format has pages and the
    /// metadata is readable.
    async fn page_count(&self, path: &Path) -> Option<usize>;

    /// Full document text, or a sentinel string on failure.
    async fn extract(&self, path: &Path) -> String;
}

/// PDF extraction through pdfium.
///
/// Non-empty pages are emitted as `--- Page N ---` blocks separated by a
/// blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumExtractor;

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn page_count(&self, path: &Path) -> Option<usize> {
        let path = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || page_count_blocking(&path)).await;
        match result {
            Ok(Ok(count)) => Some(count),
            Ok(Err(detail)) => {
                warn!("Could not read page count: {}", detail);
                None
            }
            Err(e) => {
                warn!("Page count task panicked: {}", e);
                None
            }
        }
    }

    async fn extract(&self, path: &Path) -> String {
        if !is_pdf_path(path) || !path.exists() {
            return invalid_path_message(path);
        }

        let owned = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || extract_text_blocking(&owned)).await;
        let text = match result {
            Ok(Ok(text)) => text,
            Ok(Err(detail)) => return format!("{EXTRACTION_FAILED_PREFIX}: {detail}"),
            Err(e) => return format!("{EXTRACTION_FAILED_PREFIX}: extraction task panicked: {e}"),
        };

        if text.is_empty() {
            return EMPTY_EXTRACTION_WARNING.to_string();
        }
        info!("Extracted {} characters from {}", text.len(), path.display());
        text
    }
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn bind() -> Result<Pdfium, String> {
    pdfium_auto::bind_pdfium_silent().map_err(|e| e.to_string())
}

/// Blocking implementation of page counting.
fn page_count_blocking(path: &Path) -> Result<usize, String> {
    let pdfium = bind()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| format!("{:?}", e))?;
    Ok(document.pages().len() as usize)
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(path: &Path) -> Result<String, String> {
    let pdfium = bind()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| format!("{:?}", e))?;

    let mut blocks = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let page_text = match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                warn!("Skipping page {}: {:?}", idx + 1, e);
                continue;
            }
        };
        if page_text.trim().is_empty() {
            debug!("Page {} has no text layer", idx + 1);
            continue;
        }
        blocks.push(format!("--- Page {} ---\n{}", idx + 1, page_text));
    }

    Ok(blocks.join("\n\n"))
}

/// Plain-text and Markdown resumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn page_count(&self, _path: &Path) -> Option<usize> {
        None
    }

    async fn extract(&self, path: &Path) -> String {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => invalid_path_message(path),
            Err(e) => format!("{EXTRACTION_FAILED_PREFIX}: {e}"),
        }
    }
}

/// Pick the builtin extractor for a file by extension.
pub fn extractor_for(path: &Path) -> &'static dyn TextExtractor {
    if is_pdf_path(path) {
        &PdfiumExtractor
    } else {
        &PlainTextExtractor
    }
}
