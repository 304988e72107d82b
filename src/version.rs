//! Resolution of the version being propagated.
//!
//! Precedence: explicit `--version`, then the version file (`--version-file`
//! or `<dir>/VERSION`), then the `VERSION` environment variable.
use color_eyre::eyre::WrapErr;
use log::*;
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{error::UpdatebotError, result::Result};

/// Environment variable consulted last.
pub const VERSION_ENV_VAR: &str = "VERSION";
/// Default version file name inside `--dir`.
pub const DEFAULT_VERSION_FILE: &str = "VERSION";

/// Inputs for resolving the version.
#[derive(Debug, Clone, Default)]
pub struct VersionSource {
    /// Value of `--version`.
    pub explicit: Option<String>,
    /// Value of `--version-file`.
    pub version_file: Option<PathBuf>,
    /// Directory containing the default `VERSION` file.
    pub dir: PathBuf,
    /// `--no-version`: allow running without any version.
    pub no_version: bool,
}

impl VersionSource {
    /// Path of the version file that will be consulted.
    pub fn version_file_path(&self) -> PathBuf {
        self.version_file
            .clone()
            .unwrap_or_else(|| self.dir.join(DEFAULT_VERSION_FILE))
    }

    /// Resolve the version. Returns an empty string only when `no_version`
    /// is set and no source provides a value.
    pub fn resolve(&self) -> Result<String> {
        if let Some(version) = non_empty(self.explicit.as_deref()) {
            return Ok(version);
        }

        let version_file = self.version_file_path();

        if let Some(version) = read_version_file(&version_file)? {
            return Ok(version);
        }

        if let Some(version) =
            non_empty(env::var(VERSION_ENV_VAR).ok().as_deref())
        {
            debug!("using version from ${VERSION_ENV_VAR}");
            return Ok(version);
        }

        if self.no_version {
            return Ok(String::new());
        }

        Err(UpdatebotError::missing_option("version").into())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn read_version_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        info!("version file {} does not exist", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).wrap_err_with(|| {
        format!("failed to read version file {}", path.display())
    })?;

    Ok(non_empty(Some(&content)))
}
