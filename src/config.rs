//! Configuration loading and parsing for `.jx/updatebot.yaml` files.
//!
//! The file describes an ordered list of rules. Each rule names the
//! downstream repositories to update (or changes that discover them) and the
//! ordered changes to apply to every one of them.
use color_eyre::eyre::WrapErr;
use log::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::result::Result;

pub mod change;
pub mod filter;

pub use change::{
    Change, CommandChange, EnvVar, GoChange, RegexChange, VersionStreamChange,
};
pub use filter::PatternFilter;

/// Directory (relative to `--dir`) holding the default configuration file.
pub const DEFAULT_CONFIG_DIR: &str = ".jx";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "updatebot.yaml";
/// API version written by the tooling that generates these files.
pub const API_VERSION: &str = "updatebot.jenkins-x.io/v1alpha1";
/// Kind of the root configuration document.
pub const CONFIG_KIND: &str = "UpdateConfig";

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateConfig {
    pub api_version: String,
    pub kind: String,
    pub spec: UpdateConfigSpec,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.into(),
            kind: CONFIG_KIND.into(),
            spec: UpdateConfigSpec::default(),
        }
    }
}

/// The rules to process, in order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdateConfigSpec {
    pub rules: Vec<Rule>,
}

/// A set of target repositories and the changes to apply to each of them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Rule {
    /// Push to a fork of each repository instead of the repository itself.
    pub fork: bool,
    /// Git URLs of the repositories to update. Discovery appends to this list.
    pub urls: Vec<String>,
    /// Changes applied in order to every repository of the rule.
    pub changes: Vec<Change>,
}

/// Default location of the configuration file for a directory.
pub fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE)
}

/// Load the configuration file at `path`. A missing file is not an error: it
/// produces an empty configuration so the run creates no pull requests.
pub fn load_update_config(path: &Path) -> Result<UpdateConfig> {
    if !path.exists() {
        warn!(
            "file {} does not exist so cannot create any updatebot Pull Requests",
            path.display()
        );
        return Ok(UpdateConfig::default());
    }

    let content = std::fs::read_to_string(path).wrap_err_with(|| {
        format!("failed to read config file {}", path.display())
    })?;

    parse_update_config(&content).wrap_err_with(|| {
        format!("failed to load config file {}", path.display())
    })
}

/// Parse configuration from YAML content.
pub fn parse_update_config(content: &str) -> Result<UpdateConfig> {
    if content.trim().is_empty() {
        return Ok(UpdateConfig::default());
    }

    let config: UpdateConfig = serde_yaml::from_str(content)?;

    debug!("loaded {} rules", config.spec.rules.len());

    Ok(config)
}
