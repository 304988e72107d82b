//! Go module change: bumps `require` directives in every `go.mod`.
use async_trait::async_trait;
use color_eyre::eyre::WrapErr;
use log::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{
    change::{ChangeContext, go_mod, traits::ApplyChange},
    config::GoChange,
    error::UpdatebotError,
    result::Result,
};

const GO_MOD_FILE: &str = "go.mod";
const SKIPPED_DIRS: [&str; 3] = [".git", "vendor", "node_modules"];

/// Go module versions always carry a `v` prefix.
pub fn go_version(version: &str) -> String {
    if version.is_empty() || version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// All `go.mod` files under `dir`, skipping vendored code.
pub fn find_go_mod_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && SKIPPED_DIRS.iter().any(|s| e.file_name() == *s))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == GO_MOD_FILE)
        .map(|e| e.into_path())
        .collect()
}

#[async_trait]
impl ApplyChange for GoChange {
    async fn apply(&self, ctx: &ChangeContext<'_>) -> Result<()> {
        if self.package.is_empty() {
            return Err(UpdatebotError::invalid_config(
                "go change has no package",
            )
            .into());
        }

        let version = go_version(ctx.version);
        let upgrade_packages = if self.upgrade_packages.is_empty() {
            None
        } else {
            Some(self.upgrade_packages.compile()?)
        };

        let should_update = |module: &str| {
            module == self.package
                || upgrade_packages
                    .as_ref()
                    .map(|f| f.matches(module))
                    .unwrap_or(false)
        };

        let files = find_go_mod_files(ctx.dir);

        if files.is_empty() {
            warn!("no go.mod files found in {}", ctx.git_url);
            return Ok(());
        }

        for file in files {
            let content = std::fs::read_to_string(&file).wrap_err_with(|| {
                format!("failed to read {}", file.display())
            })?;

            let (updated, changed) =
                go_mod::update_requirements(&content, &version, should_update);

            if changed {
                info!(
                    "upgrading {} to {version} in {}",
                    self.package,
                    file.display()
                );
                std::fs::write(&file, updated).wrap_err_with(|| {
                    format!("failed to write {}", file.display())
                })?;
            } else {
                debug!("no requirements to upgrade in {}", file.display());
            }
        }

        Ok(())
    }
}
