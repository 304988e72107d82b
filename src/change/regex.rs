//! Regex change: writes the version into capture groups of matching files.
use async_trait::async_trait;
use color_eyre::eyre::WrapErr;
use log::*;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{
    change::{ChangeContext, traits::ApplyChange},
    config::{RegexChange, filter::build_glob_set},
    error::UpdatebotError,
    result::Result,
};

/// Replace every participating capture group of every match with
/// `version`. Patterns without groups replace the whole match.
pub fn replace_captures(regex: &Regex, content: &str, version: &str) -> String {
    regex
        .replace_all(content, |caps: &Captures| {
            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

            if caps.len() == 1 {
                return version.to_string();
            }

            let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
            let mut replaced = String::with_capacity(whole.len());
            let mut last = 0;

            // groups are visited in order of their opening parenthesis, skip
            // any nested inside one already replaced
            for group in caps.iter().skip(1).flatten() {
                let group_start = group.start() - start;
                let group_end = group.end() - start;

                if group_start < last {
                    continue;
                }

                replaced.push_str(&whole[last..group_start]);
                replaced.push_str(version);
                last = group_end;
            }

            replaced.push_str(&whole[last..]);
            replaced
        })
        .to_string()
}

/// Files under `dir` whose repository-relative path matches one of `globs`.
fn matching_files(dir: &Path, globs: &[String]) -> Result<Vec<PathBuf>> {
    let Some(glob_set) = build_glob_set(globs)? else {
        return Ok(vec![]);
    };

    Ok(WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .strip_prefix(dir)
                .map(|rel| glob_set.is_match(rel))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect())
}

#[async_trait]
impl ApplyChange for RegexChange {
    async fn apply(&self, ctx: &ChangeContext<'_>) -> Result<()> {
        let regex = Regex::new(&self.pattern).map_err(|e| {
            UpdatebotError::invalid_config(format!(
                "invalid regex pattern {}: {e}",
                self.pattern
            ))
        })?;

        let files = matching_files(ctx.dir, &self.files)?;

        if files.is_empty() {
            warn!(
                "no files matching {:?} found in {}",
                self.files, ctx.git_url
            );
            return Ok(());
        }

        for file in files {
            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    warn!("skipping {} as it is not valid UTF-8", file.display());
                    continue;
                }
                Err(e) => {
                    return Err(e).wrap_err_with(|| {
                        format!("failed to read {}", file.display())
                    });
                }
            };

            let updated = replace_captures(&regex, &content, ctx.version);

            if updated != content {
                info!("updated {} to version {}", file.display(), ctx.version);
                std::fs::write(&file, updated).wrap_err_with(|| {
                    format!("failed to write {}", file.display())
                })?;
            }
        }

        Ok(())
    }
}
