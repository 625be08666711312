use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};
use serde::Deserialize;

use crate::models::MAX_STORED;
use crate::platforms::{self, GitHubStats, PlatformClient};

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    public_repos: u64,
}

/// Platform C: public repository count from the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string(), token }
    }
}

#[async_trait]
impl PlatformClient<GitHubStats> for GitHubClient {
    async fn fetch(&self, handle: &str) -> Result<GitHubStats> {
        let handle = platforms::validate_handle(handle)?;

        let mut request = self.http
            .get(format!("{}/users/{}", self.base_url, handle))
            .header(header::ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let user = request
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Could not find github user: {handle}"))?
            .json::<UserResponse>()
            .await
            .with_context(|| format!("Malformed github profile for {handle}"))?;

        user_stats(&user, handle)
    }
}

fn user_stats(user: &UserResponse, handle: &str) -> Result<GitHubStats> {
    if user.public_repos > MAX_STORED {
        bail!("Repository count out of range for {handle}: {}", user.public_repos);
    }
    Ok(GitHubStats { repos: user.public_repos })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_public_repos() {
        let user: UserResponse =
            serde_json::from_str(r#"{ "login": "octo", "public_repos": 8, "followers": 2 }"#)
                .unwrap();
        assert_eq!(user.public_repos, 8);
    }

    #[test]
    fn oversized_repo_count_is_rejected() {
        let user: UserResponse =
            serde_json::from_str(r#"{ "public_repos": 18446744073709551615 }"#).unwrap();
        assert!(user_stats(&user, "octo").is_err());

        let user = UserResponse { public_repos: 12 };
        assert_eq!(user_stats(&user, "octo").unwrap(), GitHubStats { repos: 12 });
    }

    #[test]
    fn missing_repo_count_reads_zero() {
        let user: UserResponse = serde_json::from_str(r#"{ "login": "octo" }"#).unwrap();
        assert_eq!(user.public_repos, 0);
    }
}
