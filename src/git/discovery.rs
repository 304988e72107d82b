//! Discovers the git server URL and token when they are not given
//! explicitly, using the `origin` remote of a local checkout and the
//! environment.
use git_url_parse::{GitUrl, Scheme};
use log::*;
use std::{env, path::Path};

use crate::{
    error::UpdatebotError, forge::config::DEFAULT_GIT_SERVER, result::Result,
};

/// Environment variables consulted for a token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GIT_TOKEN", "GITHUB_TOKEN"];

/// Git server connection details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScmDetails {
    pub server_url: String,
    pub token: String,
    /// User embedded in the remote URL, if any.
    pub username: String,
}

/// URL of the `origin` remote of the repository containing `dir`.
pub fn origin_url(dir: &Path) -> Option<String> {
    let repo = git2::Repository::discover(dir).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(|u| u.to_string())
}

/// Server URL (`scheme://host`) hosting the given git URL. SSH remotes map
/// to https.
pub fn server_url_from_git_url(git_url: &str) -> Result<String> {
    let parsed = GitUrl::parse(git_url)
        .map_err(|_| UpdatebotError::InvalidGitUrl(git_url.into()))?;

    let host = parsed
        .host
        .ok_or_else(|| UpdatebotError::InvalidGitUrl(git_url.into()))?;

    let host = match parsed.port {
        Some(port) if parsed.scheme != Scheme::Ssh => format!("{host}:{port}"),
        _ => host,
    };

    let scheme = match parsed.scheme {
        Scheme::Http => "http",
        _ => "https",
    };

    Ok(format!("{scheme}://{host}"))
}

fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|v| !v.is_empty())
}

/// Resolve the server and token.
///
/// An explicit token with no server uses the default server. Without a
/// token, an unset server is discovered from the `origin` remote of `dir`,
/// then the token comes from the remote URL or `GIT_TOKEN`/`GITHUB_TOKEN`.
pub fn discover_scm(
    dir: &Path,
    git_server: &str,
    git_token: &str,
) -> Result<ScmDetails> {
    let mut details = ScmDetails {
        server_url: git_server.trim_end_matches('/').to_string(),
        token: git_token.to_string(),
        username: String::new(),
    };

    if !details.token.is_empty() {
        if details.server_url.is_empty() {
            details.server_url = DEFAULT_GIT_SERVER.to_string();
        }
        return Ok(details);
    }

    if details.server_url.is_empty()
        && let Some(origin) = origin_url(dir)
    {
        debug!("discovering git server from origin remote {origin}");
        details.server_url = server_url_from_git_url(&origin)?;

        if let Ok(parsed) = GitUrl::parse(&origin) {
            details.token = parsed.token.unwrap_or_default();
            details.username = parsed
                .user
                .filter(|u| parsed.scheme != Scheme::Ssh && u != "git")
                .unwrap_or_default();
        }
    }

    if details.server_url.is_empty() {
        return Err(UpdatebotError::MissingGitServer.into());
    }

    if details.token.is_empty() {
        details.token =
            token_from_env().ok_or(UpdatebotError::MissingGitToken)?;
    }

    Ok(details)
}
