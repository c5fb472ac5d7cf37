use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single open issue returned by the issue search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    title: String,
    created_at: DateTime<Utc>,
}

/// Parses a `/search/issues` response body into issue records, keeping the
/// order the API returned them in.
///
/// Items without a `title` or `created_at` make the whole response invalid.
pub fn parse_search_response(json: &str) -> Result<Vec<IssueRecord>> {
    let response: SearchResponse =
        serde_json::from_str(json).context("Failed to parse search response")?;

    Ok(response
        .items
        .into_iter()
        .map(|item| IssueRecord {
            title: item.title,
            created_at: item.created_at,
        })
        .collect())
}
