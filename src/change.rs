//! Application of configured changes to a checked out repository.
//!
//! [`ChangeApplier`] dispatches a single [`Change`] to its implementation.
//! [`ChangeSet`] bundles the ordered changes of a rule for one repository so
//! the reconciler can apply them once a working copy exists.
use color_eyre::eyre::WrapErr;
use log::*;
use std::{fmt, path::Path, sync::Arc};

use crate::{
    change::{runner::CommandRunner, template::TemplateData, traits::ApplyChange},
    config::Change,
    error::UpdatebotError,
    forge::request::RepoRef,
    result::Result,
};

pub mod command;
pub mod go;
pub mod go_mod;
pub mod regex;
pub mod runner;
pub mod template;
pub mod traits;
pub mod version_stream;

/// Everything a change needs to know about the repository it edits.
pub struct ChangeContext<'a> {
    /// Root of the working copy.
    pub dir: &'a Path,
    pub git_url: &'a str,
    pub version: &'a str,
    pub template_data: &'a TemplateData,
    pub runner: &'a dyn CommandRunner,
}

/// Applies individual changes for a fixed version.
pub struct ChangeApplier {
    version: String,
    template_data: TemplateData,
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for ChangeApplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeApplier")
            .field("version", &self.version)
            .field("template_data", &self.template_data)
            .finish_non_exhaustive()
    }
}

impl ChangeApplier {
    pub fn new(
        version: impl Into<String>,
        template_data: TemplateData,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            version: version.into(),
            template_data,
            runner,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Apply `change` to the working copy at `dir`. Unknown changes are
    /// logged and skipped.
    pub async fn apply(
        &self,
        dir: &Path,
        git_url: &str,
        change: &Change,
    ) -> Result<()> {
        let ctx = ChangeContext {
            dir,
            git_url,
            version: &self.version,
            template_data: &self.template_data,
            runner: self.runner.as_ref(),
        };

        debug!("applying {} change to {git_url}", change.kind());

        // only commands and unknown changes can run without a version
        if self.version.is_empty()
            && matches!(
                change,
                Change::GoModule(_)
                    | Change::Regex(_)
                    | Change::VersionStream(_)
            )
        {
            return Err(UpdatebotError::missing_option("version")).wrap_err(
                format!("{} change needs a version", change.kind()),
            );
        }

        match change {
            Change::Command(command) => command.apply(&ctx).await,
            Change::GoModule(go) => go.apply(&ctx).await,
            Change::Regex(regex) => regex.apply(&ctx).await,
            Change::VersionStream(stream) => stream.apply(&ctx).await,
            Change::Unknown => {
                info!("ignoring unknown change for {git_url}");
                Ok(())
            }
        }
    }
}

/// Title used when none is configured:
/// `chore(deps): upgrade <owner>/<repo> to version <version>`.
pub fn default_pull_request_title(git_url: &str, version: &str) -> String {
    let repository = RepoRef::from_git_url(git_url)
        .map(|r| r.to_string())
        .unwrap_or_else(|_| git_url.trim_end_matches(".git").to_string());

    format!("chore(deps): upgrade {repository} to version {version}")
}

/// Titles to use for the commit and pull request after a change set was
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDetails {
    pub pull_request_title: String,
    pub commit_title: String,
}

/// The ordered changes of a rule bound to one repository.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub git_url: String,
    pub changes: Vec<Change>,
    /// Configured pull request title, empty to derive one.
    pub pull_request_title: String,
    /// Configured commit title, empty to use the pull request title.
    pub commit_title: String,
    applier: Arc<ChangeApplier>,
}

impl ChangeSet {
    pub fn new(
        git_url: impl Into<String>,
        changes: Vec<Change>,
        applier: Arc<ChangeApplier>,
    ) -> Self {
        Self {
            git_url: git_url.into(),
            changes,
            pull_request_title: String::new(),
            commit_title: String::new(),
            applier,
        }
    }

    pub fn with_titles(
        mut self,
        pull_request_title: impl Into<String>,
        commit_title: impl Into<String>,
    ) -> Self {
        self.pull_request_title = pull_request_title.into();
        self.commit_title = commit_title.into();
        self
    }

    pub fn version(&self) -> &str {
        self.applier.version()
    }

    /// Apply every change in order to the working copy at `dir`, stopping at
    /// the first failure. Nothing is rolled back.
    pub async fn apply(&self, dir: &Path) -> Result<CommitDetails> {
        for change in self.changes.iter() {
            self.applier
                .apply(dir, &self.git_url, change)
                .await
                .wrap_err_with(|| {
                    format!("failed to apply {} change", change.kind())
                })?;
        }

        let pull_request_title = if self.pull_request_title.is_empty() {
            default_pull_request_title(&self.git_url, self.version())
        } else {
            self.pull_request_title.clone()
        };

        let commit_title = if self.commit_title.is_empty() {
            pull_request_title.clone()
        } else {
            self.commit_title.clone()
        };

        Ok(CommitDetails {
            pull_request_title,
            commit_title,
        })
    }
}
