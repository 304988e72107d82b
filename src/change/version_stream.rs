//! Version stream change: updates pinned versions under
//! `versionStream/<kind>/`.
//!
//! Each YAML file in the kind directory pins one entry. The entry name is
//! the file path relative to the kind directory without its extension
//! (`acme/widgets.yml` is `acme/widgets`); a `defaults.yaml` names its
//! parent directory.
use async_trait::async_trait;
use color_eyre::eyre::WrapErr;
use log::*;
use regex::{NoExpand, Regex};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};
use walkdir::WalkDir;

use crate::{
    change::{ChangeContext, traits::ApplyChange},
    config::{PatternFilter, VersionStreamChange},
    error::UpdatebotError,
    result::Result,
};

/// Directory holding the version stream inside a repository.
pub const VERSION_STREAM_DIR: &str = "versionStream";
const DEFAULTS_FILE_STEM: &str = "defaults";

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^version:[ \t]*(?:"[^"\n]*"|'[^'\n]*'|[^\s#]*)"#).unwrap()
});

/// Entry name for a YAML file relative to the kind directory, or None for
/// non YAML files.
pub fn entry_name(relative: &Path) -> Option<String> {
    let ext = relative.extension()?.to_str()?;
    if ext != "yml" && ext != "yaml" {
        return None;
    }

    let stem = relative.file_stem()?.to_str()?;
    let parent = relative
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    if stem == DEFAULTS_FILE_STEM {
        return (!parent.is_empty()).then_some(parent);
    }

    if parent.is_empty() {
        Some(stem.to_string())
    } else {
        Some(format!("{parent}/{stem}"))
    }
}

/// Set the top level `version:` entry, appending one when missing.
pub fn set_version(content: &str, version: &str) -> String {
    if VERSION_LINE.is_match(content) {
        let replacement = format!("version: {version}");
        return VERSION_LINE
            .replace_all(content, NoExpand(&replacement))
            .to_string();
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&format!("version: {version}\n"));
    updated
}

fn version_files(kind_dir: &Path) -> Vec<(String, PathBuf)> {
    let mut files = WalkDir::new(kind_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let relative = e.path().strip_prefix(kind_dir).ok()?;
            let name = entry_name(relative)?;
            Some((name, e.into_path()))
        })
        .collect::<Vec<(String, PathBuf)>>();

    files.sort();
    files
}

#[async_trait]
impl ApplyChange for VersionStreamChange {
    async fn apply(&self, ctx: &ChangeContext<'_>) -> Result<()> {
        if self.kind.is_empty() {
            return Err(UpdatebotError::invalid_config(
                "versionStream change has no kind",
            )
            .into());
        }

        let kind_dir = ctx.dir.join(VERSION_STREAM_DIR).join(&self.kind);

        if !kind_dir.is_dir() {
            warn!(
                "no version stream directory {VERSION_STREAM_DIR}/{} in {}",
                self.kind, ctx.git_url
            );
            return Ok(());
        }

        let filter = PatternFilter {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
        .compile()?;

        for (name, path) in version_files(&kind_dir) {
            if !filter.matches(&name) {
                continue;
            }

            let content = std::fs::read_to_string(&path).wrap_err_with(|| {
                format!("failed to read {}", path.display())
            })?;

            let updated = set_version(&content, ctx.version);

            if updated != content {
                info!("updating {} {name} to {}", self.kind, ctx.version);
                std::fs::write(&path, updated).wrap_err_with(|| {
                    format!("failed to write {}", path.display())
                })?;
            }
        }

        Ok(())
    }
}
