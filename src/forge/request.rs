use std::fmt;

use crate::{error::UpdatebotError, result::Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Owner and name of a repository on the forge.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Derive owner and name from the last two path segments of a git URL.
    ///
    /// Works for `https://host/owner/repo.git`, `git@host:owner/repo.git`
    /// and plain filesystem paths.
    pub fn from_git_url(git_url: &str) -> Result<Self> {
        let trimmed = git_url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        // scp-like syntax: git@host:owner/repo
        let normalized = if !trimmed.contains("://") {
            trimmed.replacen(':', "/", 1)
        } else {
            trimmed.to_string()
        };

        let segments = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<&str>>();

        if segments.len() < 2 {
            return Err(UpdatebotError::InvalidGitUrl(git_url.into()).into());
        }

        let name = segments[segments.len() - 1];
        let owner = segments[segments.len() - 2];

        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Repository returned when listing an owner's repositories.
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
    pub clone_url: String,
    pub archived: bool,
}

impl RepositoryInfo {
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Pull request label. Labels created by updatebot use the name as the
/// description.
pub struct Label {
    pub name: String,
    pub description: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Pull request information.
pub struct PullRequest {
    pub number: u64,
    /// Head commit of the pull request branch.
    pub sha: String,
    pub head_branch: String,
    pub title: String,
    pub link: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
/// Request to read a file from a repository's default branch.
pub struct GetFileContentRequest {
    pub repo: RepoRef,
    pub path: String,
}

#[derive(Debug, Clone)]
/// Request to find open pull requests carrying all of the given labels.
pub struct FindPrRequest {
    pub repo: RepoRef,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
/// Request to create a new pull request.
pub struct CreatePrRequest {
    pub repo: RepoRef,
    /// Branch name, or `owner:branch` when the branch lives on a fork.
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
    pub draft: bool,
}

#[derive(Debug, Clone)]
/// Request to update existing pull request.
pub struct UpdatePrRequest {
    pub repo: RepoRef,
    pub pr_number: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
/// Request to add labels to a pull request.
pub struct PrLabelsRequest {
    pub repo: RepoRef,
    pub pr_number: u64,
    pub labels: Vec<Label>,
}
