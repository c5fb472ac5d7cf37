use crate::collector::COLLECT_INTERVAL;
use crate::github::Repository;
use crate::github::search::DEFAULT_API_URL;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Environment variables read at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Username,
    Reponame,
    Token,
    ApiUrl,
    ListenAddr,
    CollectIntervalSeconds,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Username => "GITHUB_USERNAME",
            ConfigKey::Reponame => "GITHUB_REPONAME",
            ConfigKey::Token => "GITHUB_TOKEN",
            ConfigKey::ApiUrl => "GITHUB_API_URL",
            ConfigKey::ListenAddr => "LISTEN_ADDR",
            ConfigKey::CollectIntervalSeconds => "COLLECT_INTERVAL_SECONDS",
        }
    }

    /// Get all config keys
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::Username,
            ConfigKey::Reponame,
            ConfigKey::Token,
            ConfigKey::ApiUrl,
            ConfigKey::ListenAddr,
            ConfigKey::CollectIntervalSeconds,
        ]
    }
}

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repository: Repository,
    pub token: Option<String>,
    pub api_url: String,
    pub listen_addr: SocketAddr,
    pub collect_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        parse_config(|key| std::env::var(key.as_str()).ok())
    }
}

/// Builds a [`Config`] from `lookup`, which returns the raw value of a key if set.
///
/// - Returns an `Err` if `GITHUB_USERNAME` or `GITHUB_REPONAME` is missing or empty.
/// - Returns an `Err` if an optional key holds a value that cannot be parsed.
/// - Empty values are treated as unset.
pub fn parse_config<F>(lookup: F) -> Result<Config>
where
    F: Fn(ConfigKey) -> Option<String>,
{
    let values: HashMap<ConfigKey, String> = ConfigKey::all()
        .iter()
        .filter_map(|key| {
            lookup(*key)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (*key, value))
        })
        .collect();
    let get = |key: ConfigKey| values.get(&key).cloned();
    let require = |key: ConfigKey| {
        get(key).ok_or_else(|| anyhow::anyhow!("{} is not set", key.as_str()))
    };

    let repository = Repository::new(require(ConfigKey::Username)?, require(ConfigKey::Reponame)?);

    let listen_addr = match get(ConfigKey::ListenAddr) {
        Some(addr) => addr
            .parse()
            .with_context(|| format!("{} is not a socket address: {addr}", ConfigKey::ListenAddr.as_str()))?,
        None => DEFAULT_LISTEN_ADDR.parse()?,
    };

    let collect_interval = match get(ConfigKey::CollectIntervalSeconds) {
        Some(seconds) => {
            let seconds: u64 = seconds.trim().parse().with_context(|| {
                format!(
                    "{} is not a number of seconds: {seconds}",
                    ConfigKey::CollectIntervalSeconds.as_str()
                )
            })?;
            if seconds == 0 {
                return Err(anyhow::anyhow!(
                    "{} must be greater than zero",
                    ConfigKey::CollectIntervalSeconds.as_str()
                ));
            }
            Duration::from_secs(seconds)
        }
        None => COLLECT_INTERVAL,
    };

    Ok(Config {
        repository,
        token: get(ConfigKey::Token),
        api_url: get(ConfigKey::ApiUrl).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        listen_addr,
        collect_interval,
    })
}
