use crate::github::Repository;
use crate::github::search::{IssueSearcher, scan};
use crate::metrics::OpenIssuesGauge;
use anyhow::{Context, Result};
use std::convert::Infallible;
use std::time::Duration;

/// Default pause between two collection cycles.
pub const COLLECT_INTERVAL: Duration = Duration::from_secs(300);

/// Republishes the open issues of one repository into [`OpenIssuesGauge`].
#[derive(Debug)]
pub struct Collector<S> {
    searcher: S,
    repo: Repository,
    labels: Vec<String>,
    gauge: OpenIssuesGauge,
}

impl<S: IssueSearcher> Collector<S> {
    pub fn new(searcher: S, repo: Repository, labels: Vec<String>, gauge: OpenIssuesGauge) -> Self {
        Collector {
            searcher,
            repo,
            labels,
            gauge,
        }
    }

    /// Runs one cycle: drops every series, then sets one series per open issue.
    ///
    /// A search failure aborts the cycle and leaves whatever was set before it
    /// visible to scrapes. Returns the number of issues seen.
    pub async fn collect(&self) -> Result<usize> {
        tracing::info!(repository = %self.repo.full_name(), "collecting open issues");
        self.gauge.reset();

        let mut issues = scan(&self.searcher, &self.repo, &self.labels);
        let mut count = 0;
        while let Some(issue) = issues.next().await? {
            self.gauge.set_open(&issue.title);
            count += 1;
        }

        tracing::info!(repository = %self.repo.full_name(), issues = count, "collection finished");
        Ok(count)
    }

    /// Collects, sleeps for `interval`, and repeats until a cycle fails.
    pub async fn run_forever(&self, interval: Duration) -> Result<Infallible> {
        loop {
            self.collect()
                .await
                .context("Failed to collect open issues")?;
            tokio::time::sleep(interval).await;
        }
    }
}
