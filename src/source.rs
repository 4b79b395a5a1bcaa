//! Opportunity sources: where candidate internships come from when the
//! pipeline needs a listing of its own.
//!
//! Two consumers read a source: the optional web-scrape stage (which shows
//! the listing to the agent) and the local fallback recommender (which
//! scores it against resume keywords). The default is the fixed five-entry
//! [`StaticCatalog`]; [`RemoteCatalog`] fetches the same
//! JSON shape over HTTP so a real job feed can be plugged in without touching
//! the scoring logic.

use crate::error::MatchError;
use crate::output::InternshipRecord;
use crate::pipeline::parse::format_internships;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub company: String,
    pub position: String,
    pub url: String,
    /// Lower-cased skill tags scored against resume keywords.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Opportunity {
    pub fn new(company: &str, position: &str, url: &str, tags: &[&str]) -> Self {
        Self {
            company: company.to_string(),
            position: position.to_string(),
            url: url.to_string(),
            tags: tags.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// Project onto the public record shape with the given rank.
    pub fn to_record(&self, id: u32) -> InternshipRecord {
        InternshipRecord {
            id,
            company: self.company.clone(),
            position: self.position.clone(),
            url: self.url.clone(),
        }
    }
}

/// The builtin catalog, in declaration order.
pub static BUILTIN_CATALOG: Lazy<Vec<Opportunity>> = Lazy::new(|| {
    vec![
        Opportunity::new(
            "Google",
            "Software Engineering Intern (Cloud Platforms)",
            "https://careers.google.com/jobs/results/software-engineering-intern/",
            &["python", "cloud", "backend", "distributed", "software"],
        ),
        Opportunity::new(
            "Microsoft",
            "Data Science Intern",
            "https://careers.microsoft.com/students/us/en/job/DA123456",
            &["data", "analytics", "python", "machine", "learning"],
        ),
        Opportunity::new(
            "Amazon",
            "Product Management Intern",
            "https://www.amazon.jobs/en/jobs/PMINT2025",
            &["product", "management", "business"],
        ),
        Opportunity::new(
            "Tesla",
            "Electrical Engineering Intern",
            "https://www.tesla.com/careers/internships",
            &["hardware", "electronics", "embedded"],
        ),
        Opportunity::new(
            "Spotify",
            "UX Research Intern",
            "https://www.spotifyjobs.com/student-opportunities/",
            &["design", "research", "ux", "ui"],
        ),
    ]
});

/// A provider of candidate opportunities.
#[async_trait]
pub trait OpportunitySource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Current opportunities, in the source's preferred order.
    async fn opportunities(&self) -> Result<Vec<Opportunity>, MatchError>;
}

/// The fixed builtin catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

#[async_trait]
impl OpportunitySource for StaticCatalog {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn opportunities(&self) -> Result<Vec<Opportunity>, MatchError> {
        Ok(BUILTIN_CATALOG.clone())
    }
}

/// A catalog served as a JSON array of [`Opportunity`] objects.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    url: String,
    timeout_secs: u64,
}

impl RemoteCatalog {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl OpportunitySource for RemoteCatalog {
    fn name(&self) -> &str {
        &self.url
    }

    async fn opportunities(&self) -> Result<Vec<Opportunity>, MatchError> {
        info!("Fetching opportunity catalog from: {}", self.url);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| MatchError::CatalogFetchFailed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let response = client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                MatchError::CatalogTimeout {
                    url: self.url.clone(),
                    secs: self.timeout_secs,
                }
            } else {
                MatchError::CatalogFetchFailed {
                    url: self.url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(MatchError::CatalogFetchFailed {
                url: self.url.clone(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MatchError::CatalogFetchFailed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        parse_catalog(&body).map_err(|reason| MatchError::CatalogFetchFailed {
            url: self.url.clone(),
            reason,
        })
    }
}

/// Decode a JSON catalog, normalising tags and dropping entries without a url.
pub fn parse_catalog(json: &str) -> Result<Vec<Opportunity>, String> {
    let raw: Vec<Opportunity> =
        serde_json::from_str(json).map_err(|e| format!("invalid catalog JSON: {e}"))?;

    let total = raw.len();
    let entries: Vec<Opportunity> = raw
        .into_iter()
        .filter(|o| !o.url.trim().is_empty())
        .map(|o| Opportunity {
            company: o.company.trim().to_string(),
            position: o.position.trim().to_string(),
            url: o.url.trim().to_string(),
            tags: o.tags.iter().map(|t| t.trim().to_lowercase()).collect(),
        })
        .collect();

    if entries.len() < total {
        warn!(
            "Dropped {} catalog entries without an application url",
            total - entries.len()
        );
    }
    debug!("Catalog decoded: {} entries", entries.len());
    Ok(entries)
}

/// Render opportunities in the numbered block format for an agent prompt.
pub fn render_listing(opportunities: &[Opportunity]) -> String {
    let records: Vec<InternshipRecord> = opportunities
        .iter()
        .zip(1..)
        .map(|(o, id)| o.to_record(id))
        .collect();
    format_internships(&records)
}
