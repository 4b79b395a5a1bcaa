//! Content normalisation: chunk raw resume text and clean each chunk.
//!
//! Extracted PDF text is noisy: page markers, CRLF line endings, zero-width
//! characters and ragged whitespace. The text is split into fixed-size
//! character chunks, every chunk is cleaned on its own, and the cleaned
//! chunks are joined with a single space in their original order.
//!
//! ## Cleaning rules (per chunk, in order)
//!
//! 1. Normalise line endings (CRLF / CR → LF)
//! 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
//! 3. Drop `--- Page N ---` markers inserted by the extractor
//! 4. Collapse every whitespace run to one space and trim

use once_cell::sync::Lazy;
use regex::Regex;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Split `text` into chunks of `chunk_size` characters.
///
/// Consecutive chunks share `overlap` characters; the final chunk may be
/// shorter. Empty input yields no chunks. `overlap` must be smaller than
/// `chunk_size` (enforced by the config builder); larger values are clamped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let step = chunk_size - overlap.min(chunk_size - 1);
    let chars: Vec<char> = text.chars().collect();

    let mut chunks = Vec::with_capacity(chars.len() / step + 1);
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Chunk, clean and re-join `text`.
pub fn normalize_content(text: &str, chunk_size: usize, overlap: usize) -> String {
    chunk_text(text, chunk_size, overlap)
        .iter()
        .map(|chunk| clean_chunk(chunk))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply every cleaning rule to one chunk.
pub fn clean_chunk(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = remove_page_markers(&s);
    collapse_whitespace(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Remove extractor page markers ───────────────────────────────────

static RE_PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{3}\s*Page\s+\d+\s*-{3}").unwrap());

fn remove_page_markers(input: &str) -> String {
    RE_PAGE_MARKER.replace_all(input, " ").to_string()
}

// ── Rule 4: Collapse whitespace ─────────────────────────────────────────────

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("hello", 1000, 0), vec!["hello"]);
    }

    #[test]
    fn keeps_trailing_partial_chunk() {
        assert_eq!(chunk_text("abcdefg", 3, 0), vec!["abc", "def", "g"]);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        assert_eq!(chunk_text("abcdef", 3, 0), vec!["abc", "def"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 10, 0).is_empty());
    }

    #[test]
    fn chunks_count_characters_not_bytes() {
        let chunks = chunk_text("ééé€€", 2, 0);
        assert_eq!(chunks, vec!["éé", "é€", "€"]);
    }

    #[test]
    fn overlap_repeats_characters() {
        assert_eq!(chunk_text("abcdefg", 4, 2), vec!["abcd", "cdef", "efg"]);
    }

    #[test]
    fn oversized_overlap_is_clamped() {
        assert_eq!(chunk_text("abc", 2, 5), vec!["ab", "bc"]);
    }

    #[test]
    fn clean_chunk_rules() {
        let input = "--- Page 1 ---\r\nJane\u{200B} Doe\r\n\r\n  Rust\tdeveloper  ";
        assert_eq!(clean_chunk(input), "Jane Doe Rust developer");
    }

    #[test]
    fn normalize_joins_cleaned_chunks_with_space() {
        let text = "ab  cd\nef";
        // chunks: "ab ", " cd", "\nef"
        assert_eq!(normalize_content(text, 3, 0), "ab cd ef");
    }

    #[test]
    fn normalize_is_pure() {
        let text = "--- Page 1 ---\nPython backend\n\n--- Page 2 ---\nCloud";
        let a = normalize_content(text, DEFAULT_CHUNK_SIZE, 0);
        let b = normalize_content(text, DEFAULT_CHUNK_SIZE, 0);
        assert_eq!(a, b);
        assert_eq!(a, "Python backend Cloud");
    }
}
