//! Result parsing: numbered agent text → [`InternshipRecord`]s, and back.
//!
//! The agents are asked for blocks of the shape
//!
//! ```text
//! 1- Acme Corp
//! Backend Intern
//! link: https://acme.example/jobs/42
//! ```
//!
//! separated by blank lines. Parsing is deliberately lossy: a block that does
//! not match the three-line shape is skipped rather than failing the whole
//! document, and an empty result is the orchestrator's cue to fall back.

use crate::output::InternshipRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d+)-[ \t]+([^\n]+)\n([^\n]+)\nlink:[ \t]*([^\n]*)").unwrap()
});

/// Extract every well-formed entry, in text order.
///
/// Ids are taken from the numeric prefix as written. Duplicate or skipped
/// numbers are passed through untouched.
pub fn parse_internships(text: &str) -> Vec<InternshipRecord> {
    let text = text.replace("\r\n", "\n");

    RE_ENTRY
        .captures_iter(&text)
        .filter_map(|caps| {
            let id = caps[1].parse::<u32>().ok()?;
            let company = caps[2].trim();
            let position = caps[3].trim();
            let url = caps[4].trim();
            if company.is_empty() || position.is_empty() || url.is_empty() {
                return None;
            }
            Some(InternshipRecord {
                id,
                company: company.to_string(),
                position: position.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Serialise records in the numbered block format.
///
/// The displayed number is the 1-based position in `records`, not the
/// stored `id`.
pub fn format_internships(records: &[InternshipRecord]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(idx, r)| format!("{}- {}\n{}\nlink: {}", idx + 1, r.company, r.position, r.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}
