//! Configuration for Git forge platform connections.
use secrecy::SecretString;
use url::Url;

use crate::{error::UpdatebotError, result::Result};

/// Server used when none is configured or discovered.
pub const DEFAULT_GIT_SERVER: &str = "https://github.com";
/// Sentinel label marking pull requests created by updatebot. Open pull
/// requests carrying it are reused when auto merge is enabled.
pub const UPDATEBOT_LABEL: &str = "updatebot";
/// Default color for labels created by updatebot, in hex format.
pub const DEFAULT_LABEL_COLOR: &str = "1d76db";
/// Branch name prefix for pull request branches.
pub const DEFAULT_BRANCH_PREFIX: &str = "updatebot";
/// Default page size for paginated queries.
pub const DEFAULT_PAGE_SIZE: u8 = 100;

/// Remote forge connection configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote forge host (e.g., "github.com").
    pub host: String,
    /// URL scheme (http or https).
    pub scheme: String,
    /// User the token belongs to. Used for git authentication.
    pub username: String,
    /// Access token for authentication.
    pub token: SecretString,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            scheme: "".to_string(),
            username: "".to_string(),
            token: SecretString::from("".to_string()),
        }
    }
}

impl RemoteConfig {
    /// Build a config from a server URL such as `https://github.com`.
    pub fn from_server_url(
        server_url: &str,
        username: &str,
        token: SecretString,
    ) -> Result<Self> {
        let parsed = Url::parse(server_url).map_err(|e| {
            UpdatebotError::invalid_config(format!(
                "invalid git server {server_url}: {e}"
            ))
        })?;

        let host = parsed.host_str().ok_or_else(|| {
            UpdatebotError::invalid_config(format!(
                "git server {server_url} has no host"
            ))
        })?;

        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            host,
            scheme: parsed.scheme().to_string(),
            username: username.to_string(),
            token,
        })
    }
}
