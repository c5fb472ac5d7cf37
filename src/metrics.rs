use crate::github::Repository;
use anyhow::{Context, Result};
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};
use std::fmt;

pub const NAMESPACE: &str = "github_postmortem";
pub const OPEN_ISSUES_NAME: &str = "open_issues";

/// Gauge value for an issue that is currently open.
const OPEN: f64 = 1.0;

/// Open postmortem issues of one repository, one gauge series per issue title.
///
/// Cloning shares the underlying series, so the collector and the exposition
/// endpoint can hold their own handles.
#[derive(Clone)]
pub struct OpenIssuesGauge {
    registry: Registry,
    gauge: GaugeVec,
}

impl OpenIssuesGauge {
    /// Creates the gauge with the repository's constant labels and registers it,
    /// together with the process collector where available, in a fresh registry.
    pub fn new(repo: &Repository) -> Result<Self> {
        let full_name = repo.full_name();
        let opts = Opts::new(OPEN_ISSUES_NAME, "Open Postmortem issue")
            .namespace(NAMESPACE)
            .const_label("username", repo.owner.as_str())
            .const_label("reponame", repo.name.as_str())
            .const_label("full_reponame", full_name.as_str());
        let gauge = GaugeVec::new(opts, &["title"]).context("Failed to create open issues gauge")?;

        let registry = Registry::new();
        registry
            .register(Box::new(gauge.clone()))
            .context("Failed to register open issues gauge")?;
        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .context("Failed to register process collector")?;

        Ok(OpenIssuesGauge { registry, gauge })
    }

    /// Drops every series.
    pub fn reset(&self) {
        self.gauge.reset();
    }

    pub fn set_open(&self, title: &str) {
        self.gauge.with_label_values(&[title]).set(OPEN);
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .context("Failed to encode metrics")
    }
}

impl fmt::Debug for OpenIssuesGauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenIssuesGauge").finish_non_exhaustive()
    }
}

/// Lines of `exposition` belonging to the open issues gauge series.
#[cfg(test)]
pub(crate) fn open_issue_series(exposition: &str) -> Vec<&str> {
    let prefix = format!("{NAMESPACE}_{OPEN_ISSUES_NAME}{{");
    exposition
        .lines()
        .filter(|line| line.starts_with(&prefix))
        .collect()
}
