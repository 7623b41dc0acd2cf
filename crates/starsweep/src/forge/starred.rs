//! Page-at-a-time access to `GET /user/starred`.

use super::client::ForgeClient;
use super::error::ForgeError;
use super::types::RepoSummary;

/// Largest page size the API honours.
pub const MAX_PER_PAGE: u32 = 100;

/// Fetches single pages of the authenticated user's starred repositories.
#[derive(Debug, Clone, Copy)]
pub struct PageFetcher<'a> {
    client: &'a ForgeClient,
}

impl<'a> PageFetcher<'a> {
    pub fn new(client: &'a ForgeClient) -> Self {
        Self { client }
    }

    /// Route for one page, with `per_page` clamped to `1..=MAX_PER_PAGE`.
    pub fn route(page: u32, per_page: u32) -> String {
        format!(
            "/user/starred?page={}&per_page={}",
            page,
            per_page.clamp(1, MAX_PER_PAGE)
        )
    }

    /// Fetch one page in API order. An empty page means the listing is
    /// exhausted.
    pub async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<RepoSummary>, ForgeError> {
        let route = Self::route(page, per_page);
        let repos: Vec<RepoSummary> = self.client.get_json(&route).await?;
        tracing::debug!(page, count = repos.len(), "fetched starred page");
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http::MockTransport;

    fn summary(full_name: &str) -> serde_json::Value {
        let (owner, name) = full_name.split_once('/').unwrap();
        serde_json::json!({
            "owner": {"login": owner},
            "name": name,
            "full_name": full_name,
            "description": "d",
            "html_url": format!("https://github.com/{full_name}"),
            "stargazers_count": 3,
            "language": "Rust",
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2021-01-01T00:00:00Z"
        })
    }

    #[test]
    fn route_clamps_page_size() {
        assert_eq!(PageFetcher::route(1, 500), "/user/starred?page=1&per_page=100");
        assert_eq!(PageFetcher::route(3, 0), "/user/starred?page=3&per_page=1");
        assert_eq!(PageFetcher::route(2, 30), "/user/starred?page=2&per_page=30");
    }

    #[tokio::test]
    async fn fetch_page_preserves_api_order() {
        let transport = MockTransport::new();
        transport.push_json(
            "https://api.github.com/user/starred?page=1&per_page=100",
            200,
            serde_json::json!([summary("b/two"), summary("a/one")]),
        );
        let client = ForgeClient::new("t", Arc::new(transport.clone())).unwrap();

        let repos = PageFetcher::new(&client).fetch_page(1, 100).await.unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["b/two", "a/one"]);
    }

    #[tokio::test]
    async fn empty_page_signals_exhaustion() {
        let transport = MockTransport::new();
        transport.push_json(
            "https://api.github.com/user/starred?page=4&per_page=100",
            200,
            serde_json::json!([]),
        );
        let client = ForgeClient::new("t", Arc::new(transport.clone())).unwrap();

        let repos = PageFetcher::new(&client).fetch_page(4, 100).await.unwrap();
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn non_success_is_a_status_error() {
        let transport = MockTransport::new();
        transport.push_json(
            "https://api.github.com/user/starred?page=1&per_page=100",
            502,
            serde_json::json!({"message": "Bad Gateway"}),
        );
        let client = ForgeClient::new("t", Arc::new(transport.clone())).unwrap();

        let err = PageFetcher::new(&client).fetch_page(1, 100).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
    }
}
