use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "codeboard.db";
pub const DEFAULT_GFG_API_URL: &str = "https://geeks-for-geeks-api.vercel.app";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_LEETCODE_API_URL: &str = "https://leetcode.com/graphql";

/// Runtime knobs for the refresh pipeline. Read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,

    pub batch_size: usize,
    pub batch_delay: Duration,
    pub fetch_timeout: Duration,
    pub lock_ttl: Duration,
    pub refresh_interval: Duration,

    pub leetcode_api_url: String,
    pub gfg_api_url: String,
    pub github_api_url: String,
    pub github_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: String::from(DEFAULT_DB_PATH),
            batch_size: 10,
            batch_delay: Duration::from_secs(2),
            fetch_timeout: Duration::from_secs(30),
            lock_ttl: Duration::from_secs(6 * 60 * 60),
            refresh_interval: Duration::from_secs(6 * 60 * 60),
            leetcode_api_url: String::from(DEFAULT_LEETCODE_API_URL),
            gfg_api_url: String::from(DEFAULT_GFG_API_URL),
            github_api_url: String::from(DEFAULT_GITHUB_API_URL),
            github_token: None,
        }
    }
}

impl Config {
    /// Loads `.env` (if present) and overlays any set variables on the defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let batch_size = parse_or(&lookup, "BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            anyhow::bail!("BATCH_SIZE must be at least 1.");
        }

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            parse_or(&lookup, key, default.as_secs()).map(Duration::from_secs)
        };
        let nonzero_secs = |key: &str, default: Duration| -> Result<Duration> {
            let value = secs(key, default)?;
            if value.is_zero() {
                anyhow::bail!("{key} must be at least 1.");
            }
            Ok(value)
        };

        let refresh_hours: u64 = parse_or(&lookup, "REFRESH_INTERVAL_HOURS", 6)?;
        if refresh_hours == 0 {
            anyhow::bail!("REFRESH_INTERVAL_HOURS must be at least 1.");
        }

        Ok(Self {
            db_path: lookup("CODEBOARD_DB").unwrap_or(defaults.db_path),
            batch_size,
            batch_delay: secs("BATCH_DELAY_SECS", defaults.batch_delay)?,
            fetch_timeout: nonzero_secs("FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            lock_ttl: nonzero_secs("LOCK_TTL_SECS", defaults.lock_ttl)?,
            refresh_interval: Duration::from_secs(refresh_hours.saturating_mul(60 * 60)),
            leetcode_api_url: lookup("LEETCODE_API_URL").unwrap_or(defaults.leetcode_api_url),
            gfg_api_url: lookup("GFG_API_URL").unwrap_or(defaults.gfg_api_url),
            github_api_url: lookup("GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            github_token: lookup("GITHUB_TOKEN").filter(|token| !token.is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_delay, Duration::from_secs(2));
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert!(config.github_token.is_none());
    }

    #[test]
    fn overrides_from_environment() {
        let config = Config::from_lookup(lookup_from(&[
            ("BATCH_SIZE", "25"),
            ("BATCH_DELAY_SECS", "0"),
            ("REFRESH_INTERVAL_HOURS", "1"),
            ("GITHUB_TOKEN", "abc"),
        ]))
        .unwrap();

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.batch_delay, Duration::ZERO);
        assert_eq!(config.refresh_interval, Duration::from_secs(3600));
        assert_eq!(config.github_token.as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_garbage() {
        let err = Config::from_lookup(lookup_from(&[("BATCH_SIZE", "ten")])).unwrap_err();
        assert!(err.to_string().contains("BATCH_SIZE"));

        assert!(Config::from_lookup(lookup_from(&[("BATCH_SIZE", "0")])).is_err());
    }

    #[test]
    fn zero_timeouts_and_intervals_are_rejected() {
        for key in ["FETCH_TIMEOUT_SECS", "LOCK_TTL_SECS", "REFRESH_INTERVAL_HOURS"] {
            let err = Config::from_lookup(lookup_from(&[(key, "0")])).unwrap_err();
            assert!(err.to_string().contains(key), "{key}");
        }

        // no pause between batches is fine
        let config = Config::from_lookup(lookup_from(&[("BATCH_DELAY_SECS", "0")])).unwrap();
        assert!(config.batch_delay.is_zero());
    }
}
