//! Wire types for the forge endpoints starsweep consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository owner as embedded in a repository summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// One entry of `GET /user/starred`.
///
/// Timestamps stay in the string form the API sent; they are written to the
/// record store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub owner: RepoOwner,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The subset of `GET /repos/{owner}/{name}` we read.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoDetail {
    #[serde(default)]
    pub description: Option<String>,
}

/// The subset of `GET /repos/{owner}/{name}/readme` we read.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadmePayload {
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// A single rate limit resource entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResource {
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub used: usize,
    pub remaining: usize,
    /// Unix timestamp when the window resets.
    pub reset: i64,
}

impl RateLimitResource {
    /// Reset time as a DateTime; falls back to now for out-of-range values.
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResources {
    /// Core REST quota, the one every call made here draws from.
    pub core: RateLimitResource,
}

/// Response body of `GET /rate_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_parses_starred_entry_with_nulls() {
        let json = r#"{
            "id": 1,
            "owner": {"login": "octo", "id": 9},
            "name": "cat",
            "full_name": "octo/cat",
            "description": null,
            "html_url": "https://github.com/octo/cat",
            "stargazers_count": 12,
            "language": null,
            "created_at": "2020-01-02T03:04:05Z",
            "updated_at": "2024-05-06T07:08:09Z",
            "topics": ["x"]
        }"#;

        let summary: RepoSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.owner.login, "octo");
        assert_eq!(summary.full_name, "octo/cat");
        assert_eq!(summary.description, None);
        assert_eq!(summary.language, None);
        assert_eq!(summary.stargazers_count, 12);
        assert_eq!(summary.created_at.as_deref(), Some("2020-01-02T03:04:05Z"));
    }

    #[test]
    fn rate_limit_response_reads_core_resource() {
        let json = r#"{
            "resources": {
                "core": {"limit": 5000, "used": 4950, "remaining": 50, "reset": 2000000000},
                "search": {"limit": 30, "used": 0, "remaining": 30, "reset": 2000000000}
            },
            "rate": {"limit": 5000, "used": 4950, "remaining": 50, "reset": 2000000000}
        }"#;

        let response: RateLimitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.resources.core.remaining, 50);
        assert_eq!(response.resources.core.reset_at().timestamp(), 2_000_000_000);
    }

    #[test]
    fn readme_payload_tolerates_missing_encoding() {
        let payload: ReadmePayload = serde_json::from_str(r#"{"content": "aGk="}"#).unwrap();
        assert_eq!(payload.content, "aGk=");
        assert!(payload.encoding.is_none());
    }
}
