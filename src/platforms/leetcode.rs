use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platforms::{self, LeetCodeStats, PlatformClient};

const USER_QUERY: &str = include_str!("leetcode.graphql");

#[derive(Serialize)]
struct RequestBody {
    query: &'static str,
    variables: Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    data: Option<Value>,
}

/// Returns an error message for when a JSON attribute can't be obtained.
fn err_cant_get(attribute: &str, username: &str) -> String {
    format!("Couldn't get {} for {}", attribute, username)
}

/// Platform A: solved-problem counts by difficulty from the LeetCode GraphQL API.
pub struct LeetCodeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl LeetCodeClient {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Self {
        Self { http, endpoint: endpoint.to_string() }
    }

    /// Runs the user-stats GraphQL query on the leetcode servers for `username`.
    async fn query_user(&self, username: &str) -> Result<QueryResponse> {
        let variables = serde_json::json!({ "username": username });
        let body = RequestBody { query: USER_QUERY, variables };
        let headers = HeaderMap::from_iter([
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (HeaderName::from_static("referer"), HeaderValue::from_static("https://leetcode.com")),
        ]);

        Ok(self.http
            .post(&self.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse>()
            .await?)
    }
}

#[async_trait]
impl PlatformClient<LeetCodeStats> for LeetCodeClient {
    async fn fetch(&self, handle: &str) -> Result<LeetCodeStats> {
        let username = platforms::validate_handle(handle)?;
        let response = self.query_user(username).await?;
        let data = response.data.context("No data found in the response.")?;

        parse_user_stats(&data, username)
    }
}

/// Pulls the easy/medium/hard accepted counts out of a `matchedUser` payload.
/// A difficulty missing from the payload counts as zero.
pub(crate) fn parse_user_stats(data: &Value, username: &str) -> Result<LeetCodeStats> {
    // Retrieve user, or raise error if it doesn't exist
    let user = data
        .get("matchedUser")
        .filter(|user| !user.is_null())
        .with_context(|| format!("Could not find leetcode user: {}", username))?;

    let num_solved_array = user
        .get("submitStats").context(err_cant_get("submission statistics", username))?
        .get("acSubmissionNum").context("Couldn't retrieve submission statistics.")?
        .as_array().context("Malformed submission data; check JSON schema.")?;

    let count_for = |difficulty: &str| -> Result<u64> {
        num_solved_array
            .iter()
            .find(|entry| entry.get("difficulty").and_then(Value::as_str) == Some(difficulty))
            .map_or(Ok(0), |entry| platforms::lenient_u64(entry.get("count")))
            .with_context(|| format!("Malformed {difficulty} count for {username}"))
    };

    Ok(LeetCodeStats {
        easy_solved: count_for("Easy")?,
        medium_solved: count_for("Medium")?,
        hard_solved: count_for("Hard")?,
    })
}
