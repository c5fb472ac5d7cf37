use crate::collector::Collector;
use crate::config::Config;
use crate::github::search::{HttpIssueSearcher, POSTMORTEM_LABELS};
use crate::metrics::OpenIssuesGauge;
use crate::server;
use anyhow::Context;

/// Starts the collection loop in the background and serves the metrics endpoint.
///
/// Returns only with the first fatal error from either side.
pub async fn run(config: Config) -> anyhow::Result<()> {
    if config.token.is_none() {
        tracing::warn!("GITHUB_TOKEN is not set, searching without authentication");
    }

    let gauge = OpenIssuesGauge::new(&config.repository)?;
    let searcher = HttpIssueSearcher::new(&config.api_url, config.token.clone())?;
    let labels = POSTMORTEM_LABELS.iter().map(|l| l.to_string()).collect();
    let collector = Collector::new(searcher, config.repository.clone(), labels, gauge.clone());

    let interval = config.collect_interval;
    let collection = tokio::spawn(async move { collector.run_forever(interval).await });

    let listener = server::bind(config.listen_addr).await?;
    tokio::select! {
        result = server::serve(listener, gauge) => result,
        joined = collection => match joined.context("Collection task panicked")? {
            Ok(never) => match never {},
            Err(err) => Err(err),
        },
    }
}
