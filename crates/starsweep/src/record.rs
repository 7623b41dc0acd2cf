//! The flat record kept for every starred repository.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::forge::RepoSummary;

/// What the revocation pass should do with a star.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Leave the star in place.
    #[default]
    Keep,
    /// Operator asked for the star to be removed.
    Revoke,
    /// The star has been removed.
    Revoked,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Revoke => "revoke",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = String;

    /// Accepts the canonical tokens in any case, a blank cell (keep), and the
    /// older `0`/`1` unstar flags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "keep" | "0" => Ok(Self::Keep),
            "revoke" | "1" => Ok(Self::Revoke),
            "revoked" => Ok(Self::Revoked),
            other => Err(format!(
                "invalid disposition {other:?}, expected keep, revoke or revoked"
            )),
        }
    }
}

impl Serialize for Disposition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Disposition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Star counts in hand-edited stores are sometimes left blank.
fn blank_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(serde::de::Error::custom)
}

/// One starred repository as stored on disk.
///
/// Field order is the column order of the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "html_url")]
    pub url: String,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub stars: u64,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(alias = "unstar")]
    pub disposition: Disposition,
}

impl StarRecord {
    /// Build a freshly harvested record with `description` as its detail.
    pub fn from_summary(summary: &RepoSummary, description: String) -> Self {
        Self {
            full_name: summary.full_name.clone(),
            description,
            url: summary.html_url.clone(),
            stars: summary.stargazers_count,
            language: summary.language.clone().unwrap_or_default(),
            created_at: summary.created_at.clone().unwrap_or_default(),
            updated_at: summary.updated_at.clone().unwrap_or_default(),
            disposition: Disposition::Keep,
        }
    }
}
