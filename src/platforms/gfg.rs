use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use crate::platforms::{self, GfgStats, PlatformClient};

/// Platform B: problems solved and coding score from a GeeksforGeeks profile API.
///
/// The API answers `GET {base}/{handle}` with `{ "info": { "totalProblemsSolved", "codingScore", .. } }`
/// or `{ "error": ".." }` for unknown profiles.
pub struct GfgClient {
    http: reqwest::Client,
    base_url: String,
}

impl GfgClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl PlatformClient<GfgStats> for GfgClient {
    async fn fetch(&self, handle: &str) -> Result<GfgStats> {
        let handle = platforms::validate_handle(handle)?;

        let profile = self.http
            .get(format!("{}/{}", self.base_url, handle))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .with_context(|| format!("Malformed GFG profile for {handle}"))?;

        parse_profile(&profile, handle)
    }
}

pub(crate) fn parse_profile(profile: &Value, handle: &str) -> Result<GfgStats> {
    if let Some(error) = profile.get("error").filter(|e| !e.is_null()) {
        return Err(anyhow!("GFG lookup for {handle} failed: {error}"));
    }

    let info = profile
        .get("info")
        .filter(|info| info.is_object())
        .with_context(|| format!("Could not find GFG profile: {handle}"))?;

    let counter = |field: &str| {
        platforms::lenient_u64(info.get(field))
            .with_context(|| format!("Malformed {field} in GFG profile for {handle}"))
    };

    Ok(GfgStats {
        solved: counter("totalProblemsSolved")?,
        coding_score: counter("codingScore")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_profile_info() {
        let profile = json!({
            "info": { "userName": "geek", "totalProblemsSolved": 120, "codingScore": "345" }
        });

        let stats = parse_profile(&profile, "geek").unwrap();
        assert_eq!(stats, GfgStats { solved: 120, coding_score: 345 });
    }

    #[test]
    fn non_numeric_fields_read_zero() {
        let profile = json!({ "info": { "totalProblemsSolved": "__", "codingScore": null } });
        assert_eq!(parse_profile(&profile, "geek").unwrap(), GfgStats::default());
    }

    #[test]
    fn oversized_coding_score_is_a_failure() {
        let profile = json!({ "info": { "totalProblemsSolved": 10, "codingScore": "1e30" } });

        let err = parse_profile(&profile, "geek").unwrap_err();
        assert!(err.to_string().contains("codingScore"));
    }

    #[test]
    fn error_payload_is_a_failure() {
        let err = parse_profile(&json!({ "error": "Profile not found" }), "nobody").unwrap_err();
        assert!(err.to_string().contains("nobody"));

        assert!(parse_profile(&json!({}), "nobody").is_err());
    }
}
