use crate::github::Repository;
use crate::github::issues::{IssueRecord, parse_search_response};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::VecDeque;
use std::future::Future;

/// Page size requested from the search API. A shorter page marks the end of results.
pub const SEARCH_PER_PAGE: usize = 100;

/// Issue labels an issue must carry to count as an open postmortem follow-up.
pub const POSTMORTEM_LABELS: [&str; 2] = ["Postmortem", "SRE"];

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "postmortem-exporter";

/// One page request against the issue search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub sort: &'static str,
    pub order: &'static str,
    pub page: u32,
    pub per_page: usize,
}

impl SearchRequest {
    /// Requests the first page of `query`, oldest issues first.
    pub fn first_page(query: String) -> Self {
        SearchRequest {
            query,
            sort: "created",
            order: "asc",
            page: 1,
            per_page: SEARCH_PER_PAGE,
        }
    }
}

/// Builds the search qualifier string for open issues in `repo` carrying every
/// label in `labels`, optionally restricted to issues created strictly after
/// `created_after`.
pub fn build_query(
    repo: &Repository,
    labels: &[String],
    created_after: Option<&DateTime<Utc>>,
) -> String {
    let mut query = format!("repo:{} is:open", repo.full_name());
    for label in labels {
        if label.contains(char::is_whitespace) {
            query.push_str(&format!(" label:\"{label}\""));
        } else {
            query.push_str(&format!(" label:{label}"));
        }
    }
    if let Some(cursor) = created_after {
        query.push_str(" created:>");
        query.push_str(&cursor.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    query
}

/// Remote issue search, one page per call.
pub trait IssueSearcher {
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Vec<IssueRecord>>> + Send;
}

/// [`IssueSearcher`] backed by the GitHub REST API.
pub struct HttpIssueSearcher {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpIssueSearcher {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(HttpIssueSearcher {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

impl IssueSearcher for HttpIssueSearcher {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<IssueRecord>> {
        let page = request.page.to_string();
        let per_page = request.per_page.to_string();
        let mut builder = self
            .client
            .get(format!("{}/search/issues", self.api_url))
            .query(&[
                ("q", request.query.as_str()),
                ("sort", request.sort),
                ("order", request.order),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .context("Failed to fetch search result")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Failed to fetch search result: HTTP {status}: {body}"
            ));
        }

        let text = response
            .text()
            .await
            .context("Failed to read search response")?;
        parse_search_response(&text)
    }
}

/// Lazily walks every open issue matching the labels, oldest first.
///
/// Each page request asks for page 1 of a query bounded by the creation time of
/// the last issue handed out, so the cursor rather than a page number advances
/// through the results. Issues sharing a creation timestamp across a page
/// boundary can be skipped.
pub struct IssueScanner<'a, S> {
    searcher: &'a S,
    repo: &'a Repository,
    labels: &'a [String],
    cursor: Option<DateTime<Utc>>,
    buffer: VecDeque<IssueRecord>,
    exhausted: bool,
}

/// Starts a fresh scan with no cursor.
pub fn scan<'a, S: IssueSearcher>(
    searcher: &'a S,
    repo: &'a Repository,
    labels: &'a [String],
) -> IssueScanner<'a, S> {
    IssueScanner {
        searcher,
        repo,
        labels,
        cursor: None,
        buffer: VecDeque::new(),
        exhausted: false,
    }
}

impl<S: IssueSearcher> IssueScanner<'_, S> {
    /// Returns the next issue, `Ok(None)` once the results are exhausted, or the
    /// first remote error.
    pub async fn next(&mut self) -> Result<Option<IssueRecord>> {
        loop {
            if let Some(issue) = self.buffer.pop_front() {
                self.cursor = Some(issue.created_at);
                return Ok(Some(issue));
            }
            if self.exhausted {
                return Ok(None);
            }

            let request = SearchRequest::first_page(build_query(
                self.repo,
                self.labels,
                self.cursor.as_ref(),
            ));
            tracing::debug!(query = %request.query, "requesting search page");

            let page = match self.searcher.search(&request).await {
                Ok(page) => page,
                Err(err) => {
                    self.exhausted = true;
                    return Err(err);
                }
            };
            if page.len() < request.per_page {
                self.exhausted = true;
            }
            self.buffer.extend(page);
        }
    }

    /// Creation time of the last issue handed out.
    #[cfg(test)]
    pub(crate) fn cursor(&self) -> Option<&DateTime<Utc>> {
        self.cursor.as_ref()
    }
}
