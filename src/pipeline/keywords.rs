//! Keyword extraction for the local fallback recommender.
//!
//! Tokens are maximal runs of three or more ASCII letters in the lower-cased
//! text. Stopwords are dropped, the rest are ranked by frequency with ties
//! broken by first appearance.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Default number of keywords returned by [`extract_keywords`].
pub const DEFAULT_KEYWORD_LIMIT: usize = 5;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]{3,}").unwrap());

/// Resume boilerplate plus common English function words.
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // resume boilerplate
        "experience", "skills", "internship", "project", "team", "role",
        // function words
        "and", "the", "with", "for", "your", "have", "from", "that", "this",
        "are", "was", "were", "been", "but", "not", "you", "our", "has", "had",
        "all", "can", "will", "into", "about", "over", "also", "such", "than",
        "then", "there", "their", "they", "them", "its", "which", "who", "what",
        "when", "where", "how", "any", "each", "other", "more", "most", "some",
        "out", "per", "via", "etc",
    ]
    .into_iter()
    .collect()
});

/// Top `limit` keywords of `text`, most frequent first.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();

    // (token, count) in first-appearance order
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for m in RE_TOKEN.find_iter(&lowered) {
        let token = m.as_str();
        if STOPWORDS.contains(token) {
            continue;
        }
        match index.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // stable: equal counts keep first-appearance order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(limit)
        .map(|(token, _)| token.to_string())
        .collect()
}
