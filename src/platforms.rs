use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::config::Config;
use crate::models::{Counters, MAX_STORED};

pub mod gfg;
pub mod github;
pub mod leetcode;

pub use gfg::GfgClient;
pub use github::GitHubClient;
pub use leetcode::LeetCodeClient;

static HANDLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9_.\-]{0,63}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LeetCode,
    Gfg,
    GitHub,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Platform::LeetCode => "leetcode",
            Platform::Gfg => "gfg",
            Platform::GitHub => "github",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeetCodeStats {
    pub easy_solved: u64,
    pub medium_solved: u64,
    pub hard_solved: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GfgStats {
    pub solved: u64,
    pub coding_score: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitHubStats {
    pub repos: u64,
}

/// A payload fetched from one platform, which owns a fixed subset of the counters.
pub trait PlatformStats {
    const PLATFORM: Platform;

    /// Overwrites this platform's counters, leaving the others untouched.
    fn apply(&self, counters: &mut Counters);

    /// Fails if any value is too large to be stored.
    fn check_range(&self) -> Result<()> {
        let mut counters = Counters::default();
        self.apply(&mut counters);

        match counters.values().into_iter().find(|value| *value > MAX_STORED) {
            Some(value) => Err(anyhow!("{} returned an out-of-range counter: {value}", Self::PLATFORM)),
            None => Ok(()),
        }
    }
}

impl PlatformStats for LeetCodeStats {
    const PLATFORM: Platform = Platform::LeetCode;

    fn apply(&self, counters: &mut Counters) {
        counters.easy_solved = self.easy_solved;
        counters.medium_solved = self.medium_solved;
        counters.hard_solved = self.hard_solved;
    }
}

impl PlatformStats for GfgStats {
    const PLATFORM: Platform = Platform::Gfg;

    fn apply(&self, counters: &mut Counters) {
        counters.gfg_solved = self.solved;
        counters.gfg_coding_score = self.coding_score;
    }
}

impl PlatformStats for GitHubStats {
    const PLATFORM: Platform = Platform::GitHub;

    fn apply(&self, counters: &mut Counters) {
        counters.github_repos = self.repos;
    }
}

/// Fetches one platform's stats for a handle.
#[async_trait]
pub trait PlatformClient<T>: Send + Sync {
    async fn fetch(&self, handle: &str) -> Result<T>;
}

/// The three adapters the refresh fans out to.
#[derive(Clone)]
pub struct Platforms {
    pub leetcode: Arc<dyn PlatformClient<LeetCodeStats>>,
    pub gfg: Arc<dyn PlatformClient<GfgStats>>,
    pub github: Arc<dyn PlatformClient<GitHubStats>>,
}

impl Platforms {
    /// Builds the HTTP-backed adapters sharing one connection pool.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("codeboard/", env!("CARGO_PKG_VERSION")))
            .timeout(config.fetch_timeout)
            .build()
            .context("Could not build HTTP client.")?;

        Ok(Self {
            leetcode: Arc::new(LeetCodeClient::new(http.clone(), &config.leetcode_api_url)),
            gfg: Arc::new(GfgClient::new(http.clone(), &config.gfg_api_url)),
            github: Arc::new(GitHubClient::new(
                http,
                &config.github_api_url,
                config.github_token.clone(),
            )),
        })
    }
}

/// Runs a single adapter call for an optional handle, bounded by `timeout`.
///
/// A missing handle is reported like any other fetch failure.
pub async fn fetch_bounded<T: PlatformStats>(
    client: &dyn PlatformClient<T>,
    handle: Option<&str>,
    timeout: Duration,
) -> Result<T> {
    let handle = handle
        .map(str::trim)
        .filter(|handle| !handle.is_empty())
        .context("handle not set")?;

    let stats = tokio::time::timeout(timeout, client.fetch(handle))
        .await
        .map_err(|_| anyhow!("timed out after {}s", timeout.as_secs_f32()))??;

    stats.check_range()?;
    Ok(stats)
}

/// Rejects handles that could escape the URL path they get spliced into.
pub(crate) fn validate_handle(handle: &str) -> Result<&str> {
    if HANDLE_REGEX.is_match(handle) {
        Ok(handle)
    } else {
        Err(anyhow!("Invalid handle: {handle:?}"))
    }
}

fn checked_counter(number: f64, raw: &dyn std::fmt::Display) -> Result<u64> {
    if number <= 0.0 {
        return Ok(0);
    }
    if !number.is_finite() || number.round() >= MAX_STORED as f64 {
        return Err(anyhow!("Counter out of range: {raw}"));
    }
    Ok(number.round() as u64)
}

/// Reads a counter out of loosely-typed JSON. Numbers, numeric strings and floats are
/// accepted; negatives and non-numeric values count as zero. Numbers too large to
/// store (or infinite) are an error.
pub(crate) fn lenient_u64(value: Option<&Value>) -> Result<u64> {
    match value {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(whole) if whole > MAX_STORED => Err(anyhow!("Counter out of range: {whole}")),
            Some(whole) => Ok(whole),
            None => n.as_f64().map_or(Ok(0), |f| checked_counter(f, n)),
        },
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) if !f.is_nan() => checked_counter(f, s),
            _ => Ok(0),
        },
        _ => Ok(0),
    }
}
