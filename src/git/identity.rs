//! Commit author identity.
use color_eyre::eyre::WrapErr;
use log::*;
use std::path::Path;

use crate::result::Result;

/// Name used when no identity is configured anywhere.
pub const DEFAULT_GIT_USER_NAME: &str = "updatebot";
/// Email used when no identity is configured anywhere.
pub const DEFAULT_GIT_USER_EMAIL: &str = "updatebot@users.noreply.github.com";

/// Author and committer of the commits created by updatebot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl Default for GitIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_GIT_USER_NAME.into(),
            email: DEFAULT_GIT_USER_EMAIL.into(),
        }
    }
}

/// Work out the commit identity and make sure the repository containing
/// `dir` (if any) has `user.name` and `user.email` configured.
///
/// Explicit values win. Otherwise existing git configuration is used, then
/// the defaults. Values are only written to the repository's local config,
/// never to the global one.
pub fn ensure_user_and_email_setup(
    dir: &Path,
    username: &str,
    email: &str,
) -> Result<GitIdentity> {
    let repo = git2::Repository::discover(dir).ok();

    let config = match &repo {
        Some(repo) => repo.config().ok(),
        None => git2::Config::open_default().ok(),
    };

    let configured = |key: &str| -> Option<String> {
        config
            .as_ref()
            .and_then(|c| c.get_string(key).ok())
            .filter(|v| !v.trim().is_empty())
    };

    let identity = GitIdentity {
        name: non_empty(username)
            .or_else(|| configured("user.name"))
            .unwrap_or_else(|| DEFAULT_GIT_USER_NAME.into()),
        email: non_empty(email)
            .or_else(|| configured("user.email"))
            .unwrap_or_else(|| DEFAULT_GIT_USER_EMAIL.into()),
    };

    if let Some(repo) = repo {
        let mut local = repo
            .config()
            .and_then(|c| c.open_level(git2::ConfigLevel::Local))
            .wrap_err("failed to open repository git config")?;

        if configured("user.name").as_deref() != Some(identity.name.as_str()) {
            debug!("setting git user.name to {}", identity.name);
            local.set_str("user.name", &identity.name)?;
        }

        if configured("user.email").as_deref() != Some(identity.email.as_str())
        {
            debug!("setting git user.email to {}", identity.email);
            local.set_str("user.email", &identity.email)?;
        }
    }

    Ok(identity)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
