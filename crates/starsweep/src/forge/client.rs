//! Credential-bound forge API client.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::error::ForgeError;
use super::types::{RateLimitResource, RateLimitResponse};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type sent on every request.
pub const ACCEPT_HEADER: &str = "application/vnd.github+json";

/// REST API version pinned on every request.
pub const API_VERSION: &str = "2022-11-28";

const USER_AGENT: &str = "starsweep";

/// Default per-request timeout for the reqwest transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A forge API client bound to one bearer token.
///
/// The client is an ordinary value: construct it once at the edge of the
/// program and pass it by reference to the harvest and revocation passes.
#[derive(Clone)]
pub struct ForgeClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    token: Arc<String>,
}

impl std::fmt::Debug for ForgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgeClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ForgeClient {
    /// Create a client over the given transport.
    ///
    /// Fails with [`ForgeError::Config`] when the token is empty, before any
    /// request is made.
    pub fn new(token: &str, transport: Arc<dyn HttpTransport>) -> Result<Self, ForgeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ForgeError::Config(
                "GitHub token is missing or empty".to_string(),
            ));
        }

        Ok(Self {
            transport,
            base_url: DEFAULT_API_URL.to_string(),
            token: Arc::new(token.to_string()),
        })
    }

    /// Create a client backed by reqwest with [`DEFAULT_TIMEOUT`].
    pub fn with_reqwest(token: &str) -> Result<Self, ForgeError> {
        let transport = ReqwestTransport::with_timeout(DEFAULT_TIMEOUT)?;
        Self::new(token, Arc::new(transport))
    }

    /// Point the client at another API root (GitHub Enterprise, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API route.
    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn request(&self, method: HttpMethod, route: &str) -> HttpRequest {
        HttpRequest::new(method, self.url(route))
            .with_header("Authorization", format!("Bearer {}", self.token.as_str()))
            .with_header("Accept", ACCEPT_HEADER)
            .with_header("X-GitHub-Api-Version", API_VERSION)
            .with_header("User-Agent", USER_AGENT)
    }

    /// Send a request and return the raw response, whatever its status.
    pub async fn send(&self, method: HttpMethod, route: &str) -> Result<HttpResponse, ForgeError> {
        tracing::debug!(method = method.as_str(), route, "forge request");
        let response = self.transport.send(self.request(method, route)).await?;
        tracing::debug!(status = response.status, route, "forge response");
        Ok(response)
    }

    /// GET a route and decode a 2xx JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, ForgeError> {
        let response = self.send(HttpMethod::Get, route).await?;
        if !response.is_success() {
            return Err(ForgeError::Status {
                status: response.status,
                route: route.to_string(),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| ForgeError::decode(route, e))
    }

    /// Current core quota from `GET /rate_limit`.
    ///
    /// Querying this endpoint does not count against the quota.
    pub async fn rate_limit(&self) -> Result<RateLimitResource, ForgeError> {
        let response: RateLimitResponse = self.get_json("/rate_limit").await?;
        Ok(response.resources.core)
    }

    /// Remove the authenticated user's star from `full_name`.
    ///
    /// Only `204 No Content` counts as success.
    pub async fn unstar(&self, full_name: &str) -> Result<(), ForgeError> {
        let route = format!("/user/starred/{}", full_name);
        let response = self.send(HttpMethod::Delete, &route).await?;

        match response.status {
            204 => Ok(()),
            status => Err(ForgeError::Status { status, route }),
        }
    }
}
