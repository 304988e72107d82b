//! Git repository operations used while preparing pull requests.
//!
//! Repositories are cloned into disposable directories, changes are applied
//! to the working tree, then committed and force pushed to a branch:
//!
//! ```rust,ignore
//! let repo = Repository::clone(git_url, dir.path(), 0, Some(&auth))?;
//! repo.create_branch("updatebot-1.2.3-abc")?;
//! repo.switch_branch("updatebot-1.2.3-abc")?;
//! // apply changes...
//! repo.add_all()?;
//! let sha = repo.commit("chore(deps): ...", &identity)?;
//! repo.push_branch(UPSTREAM_REMOTE, "updatebot-1.2.3-abc")?;
//! ```
use color_eyre::eyre::{OptionExt, eyre};
use git2::RemoteCallbacks;
use log::*;
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;

use crate::{
    error::UpdatebotError, git::identity::GitIdentity, result::Result,
};

/// Name given to the cloned repository's remote. "origin" is renamed so a
/// fork can be added as an additional remote.
pub const UPSTREAM_REMOTE: &str = "upstream";
/// Remote name used for a fork of the upstream repository.
pub const FORK_REMOTE: &str = "fork";

/// Username and token used for authenticated network operations.
#[derive(Debug, Clone)]
pub struct GitAuth {
    pub username: String,
    pub token: SecretString,
}

fn get_auth_callbacks<'r>(auth: Option<&GitAuth>) -> RemoteCallbacks<'r> {
    let mut callbacks = git2::RemoteCallbacks::new();

    if let Some(auth) = auth {
        let user = auth.username.clone();
        let token = auth.token.expose_secret().to_string();
        callbacks.credentials(move |_url, _username, _allowed| {
            git2::Cred::userpass_plaintext(&user, &token)
        });
    }

    callbacks
}

/// Wrapper around `git2::Repository` for a cloned downstream repository.
pub struct Repository {
    /// Branch checked out after cloning.
    pub default_branch: String,
    auth: Option<GitAuth>,
    repo: git2::Repository,
}

impl Repository {
    /// Clone `url` into `local_path`. A `clone_depth` of zero fetches the
    /// full history.
    pub fn clone(
        url: &str,
        local_path: &Path,
        clone_depth: u64,
        auth: Option<&GitAuth>,
    ) -> Result<Self> {
        info!("cloning {url} into {}", local_path.display());

        let mut fetch_options = git2::FetchOptions::new();
        if clone_depth > 0 {
            let depth = i32::try_from(clone_depth).map_err(|_| {
                UpdatebotError::invalid_config(format!(
                    "clone depth {clone_depth} is too large"
                ))
            })?;
            fetch_options.depth(depth);
        }
        fetch_options.remote_callbacks(get_auth_callbacks(auth));

        let mut builder = git2::build::RepoBuilder::new();
        let repo = builder.fetch_options(fetch_options).clone(url, local_path)?;

        repo.remote_rename("origin", UPSTREAM_REMOTE)?;

        let default_branch = repo
            .head()?
            .shorthand()
            .ok_or_eyre("failed to get default branch")?
            .to_string();

        debug!("default branch of {url} is {default_branch}");

        Ok(Self {
            default_branch,
            auth: auth.cloned(),
            repo,
        })
    }

    /// Create a branch from the current HEAD, replacing any existing branch
    /// with the same name.
    pub fn create_branch(&self, branch: &str) -> Result<()> {
        info!("creating branch: {branch}");
        let head = self.repo.head()?;
        let commit = head.peel_to_commit()?;
        self.repo.branch(branch, &commit, true)?;
        Ok(())
    }

    pub fn switch_branch(&self, branch: &str) -> Result<()> {
        info!("switching to branch: {branch}");
        let ref_name = format!("refs/heads/{}", branch);
        let target_obj = self.repo.revparse_single(&ref_name)?;
        self.repo.checkout_tree(&target_obj, None)?;
        self.repo.set_head(&ref_name)?;
        Ok(())
    }

    /// Whether the working tree has modified, deleted or untracked files.
    pub fn has_changes(&self) -> Result<bool> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        Ok(!statuses.is_empty())
    }

    /// Stage every change in the working tree, including deletions.
    pub fn add_all(&self) -> Result<()> {
        debug!("adding changed files to index");
        let mut index = self.repo.index()?;
        index.add_all(["."], git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["."], None)?;
        index.write()?;
        Ok(())
    }

    /// Commit the index on top of HEAD and return the new commit SHA.
    pub fn commit(&self, msg: &str, identity: &GitIdentity) -> Result<String> {
        debug!(
            "committing changes as {} <{}> with msg: {msg}",
            identity.name, identity.email
        );
        let mut index = self.repo.index()?;
        let oid = index.write_tree()?;
        let tree = self.repo.find_tree(oid)?;
        let parent_commit = self.repo.head()?.peel_to_commit()?;
        let committer = git2::Signature::now(&identity.name, &identity.email)?;
        let commit = self.repo.commit(
            Some("HEAD"),
            &committer,
            &committer,
            msg,
            &tree,
            &[&parent_commit],
        )?;
        Ok(commit.to_string())
    }

    pub fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        debug!("adding remote {name}: {url}");
        self.repo.remote(name, url)?;
        Ok(())
    }

    /// Force push `branch` to `remote`.
    pub fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        info!("pushing branch {branch} to {remote}");
        let mut push_opts = git2::PushOptions::default();
        push_opts.remote_callbacks(get_auth_callbacks(self.auth.as_ref()));

        let mut remote = self.repo.find_remote(remote)?;

        // + indicates "force" push
        let ref_spec = format!("+refs/heads/{branch}:refs/heads/{branch}");
        remote.push(&[ref_spec], Some(&mut push_opts))?;

        Ok(())
    }

    pub fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| eyre!("Repository has no working directory"))
    }
}
