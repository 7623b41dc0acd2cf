pub(crate) mod harvest;
pub(crate) mod limits;
pub(crate) mod revoke;

use starsweep::{ForgeClient, ForgeError};

use crate::config::Config;

/// How a command finished, when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    /// Everything the command set out to do was done.
    Complete,
    /// Work was saved, but some of it is left for another run.
    Partial,
}

/// Build the forge client from configuration.
///
/// A missing token fails here, before any request is made.
pub(crate) fn forge_client(config: &Config) -> Result<ForgeClient, ForgeError> {
    let token = config.github_token().ok_or_else(|| {
        ForgeError::Config(
            "no GitHub token; set STARSWEEP_GITHUB_TOKEN or [github] token in the config file"
                .to_string(),
        )
    })?;

    Ok(ForgeClient::with_reqwest(token)?.with_base_url(config.github.api_url.as_str()))
}
