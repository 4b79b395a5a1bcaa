//! Local fallback recommender.
//!
//! Scores each catalog entry by how many resume keywords appear in its tags
//! and returns the best [`MAX_RECOMMENDATIONS`]. No randomness and a stable
//! sort: the same keywords over the same catalog always give the same list.

use crate::output::{InternshipRecord, MAX_RECOMMENDATIONS};
use crate::source::Opportunity;
use std::collections::BTreeSet;

/// Number of distinct keywords found in `opportunity.tags`.
pub fn match_score(keywords: &BTreeSet<&str>, opportunity: &Opportunity) -> usize {
    keywords
        .iter()
        .filter(|k| opportunity.tags.contains(**k))
        .count()
}

/// Rank `catalog` against `keywords` and keep the top entries.
///
/// With no keywords the catalog's own order is the ranking. Otherwise
/// entries are ordered by descending score, ties keeping catalog order.
/// Ids are 1-based ranks.
pub fn recommend(keywords: &[String], catalog: &[Opportunity]) -> Vec<InternshipRecord> {
    let mut ranked: Vec<&Opportunity> = catalog.iter().collect();

    if !keywords.is_empty() {
        let wanted: BTreeSet<&str> = keywords.iter().map(String::as_str).collect();
        let mut scored: Vec<(usize, &Opportunity)> = ranked
            .into_iter()
            .map(|o| (match_score(&wanted, o), o))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        ranked = scored.into_iter().map(|(_, o)| o).collect();
    }

    ranked
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .zip(1..)
        .map(|(o, id)| o.to_record(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BUILTIN_CATALOG;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn companies(records: &[InternshipRecord]) -> Vec<&str> {
        records.iter().map(|r| r.company.as_str()).collect()
    }

    #[test]
    fn empty_keywords_keep_catalog_order() {
        let records = recommend(&[], &BUILTIN_CATALOG);
        assert_eq!(companies(&records), vec!["Google", "Microsoft", "Amazon"]);
        assert_eq!(
            records.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn ranks_by_tag_overlap() {
        let records = recommend(&keywords(&["design", "research", "embedded"]), &BUILTIN_CATALOG);
        assert_eq!(companies(&records), vec!["Spotify", "Tesla", "Google"]);
    }

    #[test]
    fn ties_keep_declaration_order() {
        // python scores Google and Microsoft equally
        let records = recommend(&keywords(&["python"]), &BUILTIN_CATALOG);
        assert_eq!(companies(&records), vec!["Google", "Microsoft", "Amazon"]);
    }

    #[test]
    fn backend_keywords_prefer_google_then_microsoft() {
        let records = recommend(
            &keywords(&["experienced", "python", "backend", "developer", "cloud"]),
            &BUILTIN_CATALOG,
        );
        assert_eq!(companies(&records)[..2], ["Google", "Microsoft"]);
        assert!(!companies(&records).contains(&"Tesla"));
        assert!(!companies(&records).contains(&"Spotify"));
    }

    #[test]
    fn deterministic() {
        let kw = keywords(&["data", "product", "ux"]);
        let first = recommend(&kw, &BUILTIN_CATALOG);
        let second = recommend(&kw, &BUILTIN_CATALOG);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn never_more_than_three_and_urls_present() {
        let records = recommend(&keywords(&["python"]), &BUILTIN_CATALOG);
        assert_eq!(records.len(), MAX_RECOMMENDATIONS);
        assert!(records.iter().all(|r| !r.url.is_empty()));
    }

    #[test]
    fn small_catalog_returns_what_it_has() {
        let records = recommend(&keywords(&["rust"]), &BUILTIN_CATALOG[..1]);
        assert_eq!(records.len(), 1);
        assert!(recommend(&[], &[]).is_empty());
    }

    #[test]
    fn match_score_counts_distinct_hits() {
        let wanted: BTreeSet<&str> = ["python", "cloud", "golf"].into_iter().collect();
        assert_eq!(match_score(&wanted, &BUILTIN_CATALOG[0]), 2);
        assert_eq!(match_score(&wanted, &BUILTIN_CATALOG[3]), 0);
    }
}
