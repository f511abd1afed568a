//! Configuration for the poller.
//!
//! All configuration is loaded from environment variables. The poller only
//! needs to know where the dashboard API lives and how often to poll it.

use std::num::ParseIntError;
use std::time::Duration;

use crate::error::PollerError;

/// Default API base URL, matching the server's default port.
const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Default poll period in milliseconds.
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Complete poller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Base URL of the dashboard API, without a trailing slash.
    pub api_url: String,
    /// Time between poll cycles.
    pub poll_interval: Duration,
}

impl PollerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `BINWATCH_API_URL` -- API base URL (default `http://127.0.0.1:5000`)
    /// - `POLL_INTERVAL_MS` -- poll period in milliseconds (default 2000)
    pub fn from_env() -> Result<Self, PollerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using `lookup` in place of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PollerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BINWATCH_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        if api_url.is_empty() {
            return Err(PollerError::Config("BINWATCH_API_URL is empty".to_owned()));
        }

        let poll_interval_ms = match lookup("POLL_INTERVAL_MS") {
            Some(raw) => raw.trim().parse().map_err(|e: ParseIntError| {
                PollerError::Config(format!("invalid POLL_INTERVAL_MS {raw:?}: {e}"))
            })?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };
        if poll_interval_ms == 0 {
            return Err(PollerError::Config(
                "POLL_INTERVAL_MS must be positive".to_owned(),
            ));
        }

        Ok(Self {
            api_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults_without_environment() {
        let config = PollerConfig::from_lookup(|_| None).ok();
        assert_eq!(
            config,
            Some(PollerConfig {
                api_url: "http://127.0.0.1:5000".to_owned(),
                poll_interval: Duration::from_millis(2000),
            })
        );
    }

    #[test]
    fn overrides_are_applied_and_trimmed() {
        let config = PollerConfig::from_lookup(lookup_from(&[
            ("BINWATCH_API_URL", "https://bins.example.com/ "),
            ("POLL_INTERVAL_MS", "500"),
        ]))
        .ok();
        let config = config.as_ref();
        assert_eq!(config.map(|c| c.api_url.as_str()), Some("https://bins.example.com"));
        assert_eq!(config.map(|c| c.poll_interval), Some(Duration::from_millis(500)));
    }

    #[test]
    fn rejects_bad_interval() {
        let garbage = PollerConfig::from_lookup(lookup_from(&[("POLL_INTERVAL_MS", "soon")]));
        assert!(matches!(garbage, Err(PollerError::Config(_))));

        let zero = PollerConfig::from_lookup(lookup_from(&[("POLL_INTERVAL_MS", "0")]));
        assert!(matches!(zero, Err(PollerError::Config(_))));
    }
}
