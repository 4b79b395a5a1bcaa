//! Result types produced by the pipeline and serialised at the boundary.
//!
//! [`PipelineOutcome`] is the single value every invocation produces. The
//! HTTP or CLI layer pattern-matches on it (or serialises it directly) instead
//! of sniffing at dictionaries and strings.

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use std::fmt;

/// Maximum number of internships in any result set.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// One recommended internship.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct InternshipRecord {
    /// 1-based rank. Taken verbatim from the LLM numbering on the success
    /// path, assigned by position on the fallback path.
    pub id: u32,
    pub company: String,
    pub position: String,
    pub url: String,
}

/// Why a document was refused before any LLM call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    PdfTooLarge,
    PdfTooLong,
    FileTextEmpty,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::PdfTooLarge => "PDF_TOO_LARGE",
            RejectionCode::PdfTooLong => "PDF_TOO_LONG",
            RejectionCode::FileTextEmpty => "FILE_TEXT_EMPTY",
        }
    }
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the internships in an outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
pub enum ResultSource {
    #[serde(rename = "llm")]
    Llm,
    #[serde(rename = "local-fallback")]
    LocalFallback,
}

/// The outcome of processing one document. Exactly one variant per call.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The agent pipeline produced at least one parseable internship.
    Success {
        internships: Vec<InternshipRecord>,
        raw_output: String,
    },
    /// The agent pipeline failed transiently or produced nothing usable;
    /// internships come from the local keyword recommender.
    Fallback {
        internships: Vec<InternshipRecord>,
        reason: String,
        keywords: Vec<String>,
        raw_output: String,
    },
    /// The document failed validation.
    Rejected {
        error_code: RejectionCode,
        message: String,
    },
}

impl PipelineOutcome {
    pub fn rejected(error_code: RejectionCode, message: impl Into<String>) -> Self {
        PipelineOutcome::Rejected {
            error_code,
            message: message.into(),
        }
    }

    /// `true` for `Success` and `Fallback`.
    pub fn is_success(&self) -> bool {
        !matches!(self, PipelineOutcome::Rejected { .. })
    }

    pub fn fallback_used(&self) -> bool {
        matches!(self, PipelineOutcome::Fallback { .. })
    }

    /// Recommended internships; empty for `Rejected`.
    pub fn internships(&self) -> &[InternshipRecord] {
        match self {
            PipelineOutcome::Success { internships, .. }
            | PipelineOutcome::Fallback { internships, .. } => internships,
            PipelineOutcome::Rejected { .. } => &[],
        }
    }

    pub fn source(&self) -> Option<ResultSource> {
        match self {
            PipelineOutcome::Success { .. } => Some(ResultSource::Llm),
            PipelineOutcome::Fallback { .. } => Some(ResultSource::LocalFallback),
            PipelineOutcome::Rejected { .. } => None,
        }
    }

    pub fn rejection_code(&self) -> Option<RejectionCode> {
        match self {
            PipelineOutcome::Rejected { error_code, .. } => Some(*error_code),
            _ => None,
        }
    }
}

// Wire shape:
//   success  → {"success", "internships", "fallback_used", "raw_output", "source"}
//   fallback → the above + {"fallback_reason", "keywords"}
//   rejected → {"success": false, "error", "message"}
#[derive(serde::Serialize)]
#[serde(untagged)]
enum OutcomeBody<'a> {
    Matched {
        success: bool,
        internships: &'a [InternshipRecord],
        fallback_used: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        fallback_reason: Option<&'a str>,
        raw_output: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        keywords: Option<&'a [String]>,
        source: ResultSource,
    },
    Rejected {
        success: bool,
        error: RejectionCode,
        message: &'a str,
    },
}

impl Serialize for PipelineOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            PipelineOutcome::Success {
                internships,
                raw_output,
            } => OutcomeBody::Matched {
                success: true,
                internships,
                fallback_used: false,
                fallback_reason: None,
                raw_output,
                keywords: None,
                source: ResultSource::Llm,
            },
            PipelineOutcome::Fallback {
                internships,
                reason,
                keywords,
                raw_output,
            } => OutcomeBody::Matched {
                success: true,
                internships,
                fallback_used: true,
                fallback_reason: Some(reason.as_str()),
                raw_output,
                keywords: Some(keywords.as_slice()),
                source: ResultSource::LocalFallback,
            },
            PipelineOutcome::Rejected {
                error_code,
                message,
            } => OutcomeBody::Rejected {
                success: false,
                error: *error_code,
                message,
            },
        };
        body.serialize(serializer)
    }
}
