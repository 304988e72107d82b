//! Typed errors for updatebot operations that callers need to tell apart.

use thiserror::Error;

/// Main error type for updatebot operations.
#[derive(Error, Debug)]
pub enum UpdatebotError {
    // Validation errors
    #[error("missing option: --{0}")]
    MissingOption(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no git-server could be found")]
    MissingGitServer,

    #[error(
        "missing git token environment variable. Try setting GIT_TOKEN or GITHUB_TOKEN"
    )]
    MissingGitToken,

    // Repository discovery errors
    #[error("failed to discover repositories: {0}")]
    Discovery(String),

    // Change application errors
    #[error("command `{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Invalid git URL: {0}")]
    InvalidGitUrl(String),

    // Forge/Git errors
    #[error("Forge operation failed: {0}")]
    Forge(String),
}

impl UpdatebotError {
    /// Create a missing option error for the given flag name
    pub fn missing_option(name: impl Into<String>) -> Self {
        Self::MissingOption(name.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a forge error with context
    pub fn forge(msg: impl Into<String>) -> Self {
        Self::Forge(msg.into())
    }
}
