//! Per-repository detail lookups used to fill the description column.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::client::ForgeClient;
use super::error::ForgeError;
use super::types::{ReadmePayload, RepoDetail};

/// Value recorded when a repository's detail cannot be retrieved.
pub const DETAIL_UNAVAILABLE: &str = "";

/// Where the description column comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailSource {
    /// The description embedded in the starred listing; no extra request.
    Summary,
    /// `GET /repos/{owner}/{name}` description.
    #[default]
    Description,
    /// Decoded text of `GET /repos/{owner}/{name}/readme`.
    Readme,
}

impl DetailSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Description => "description",
            Self::Readme => "readme",
        }
    }

    /// Whether this source costs one API call per repository.
    pub fn needs_request(self) -> bool {
        !matches!(self, Self::Summary)
    }
}

impl fmt::Display for DetailSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "description" => Ok(Self::Description),
            "readme" => Ok(Self::Readme),
            other => Err(format!("unknown detail source: {other}")),
        }
    }
}

/// Result of one detail lookup.
#[derive(Debug)]
pub enum Enrichment {
    Found(String),
    Unavailable(ForgeError),
}

impl Enrichment {
    /// The detail text, or [`DETAIL_UNAVAILABLE`] if the lookup failed.
    pub fn into_text(self) -> String {
        match self {
            Self::Found(text) => text,
            Self::Unavailable(_) => DETAIL_UNAVAILABLE.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Looks up supplementary text for a repository.
///
/// Failures never escape: they come back as [`Enrichment::Unavailable`] so a
/// single broken repository cannot stop a harvest.
#[derive(Debug, Clone, Copy)]
pub struct DetailEnricher<'a> {
    client: &'a ForgeClient,
    source: DetailSource,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(client: &'a ForgeClient, source: DetailSource) -> Self {
        Self { client, source }
    }

    pub fn source(&self) -> DetailSource {
        self.source
    }

    /// Fetch the detail for `owner/name`.
    ///
    /// `fallback` is the description carried by the starred listing; it is
    /// returned as-is for [`DetailSource::Summary`].
    pub async fn enrich(&self, owner: &str, name: &str, fallback: Option<&str>) -> Enrichment {
        let result = match self.source {
            DetailSource::Summary => Ok(fallback.unwrap_or_default().to_string()),
            DetailSource::Description => self.description(owner, name).await,
            DetailSource::Readme => self.readme(owner, name).await,
        };

        match result {
            Ok(text) => Enrichment::Found(text),
            Err(e) => {
                tracing::warn!(
                    repo = %format!("{}/{}", owner, name),
                    source = %self.source,
                    error = %e,
                    "detail unavailable"
                );
                Enrichment::Unavailable(e)
            }
        }
    }

    async fn description(&self, owner: &str, name: &str) -> Result<String, ForgeError> {
        let route = format!("/repos/{}/{}", owner, name);
        let detail: RepoDetail = self.client.get_json(&route).await?;
        Ok(detail.description.unwrap_or_default())
    }

    async fn readme(&self, owner: &str, name: &str) -> Result<String, ForgeError> {
        let route = format!("/repos/{}/{}/readme", owner, name);
        let payload: ReadmePayload = self.client.get_json(&route).await?;

        if let Some(encoding) = payload.encoding.as_deref()
            && !encoding.eq_ignore_ascii_case("base64")
        {
            return Err(ForgeError::decode(
                route,
                format!("unsupported content encoding {encoding}"),
            ));
        }

        decode_readme(&payload.content).map_err(|message| ForgeError::decode(route, message))
    }
}

/// Decode base64 README content as served by the API.
///
/// The API wraps the payload at 60 columns, so embedded whitespace is
/// dropped before decoding. The bytes must be valid UTF-8.
pub fn decode_readme(content: &str) -> Result<String, String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))
}
