//! Decides whether a repository gets a new pull request, an update to an
//! existing one, or nothing at all.
use async_trait::async_trait;

use crate::{
    change::ChangeSet,
    forge::request::{Label, PullRequest},
    result::Result,
};

/// Pull request reconciliation through a forge and local git clones.
pub mod forge;

/// Labels an existing open pull request must carry to be reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestFilter {
    pub labels: Vec<String>,
}

impl PullRequestFilter {
    /// Add `label` unless it is already present.
    pub fn ensure_label(&mut self, label: &str) {
        if !self.labels.iter().any(|l| l == label) {
            self.labels.push(label.to_string());
        }
    }
}

/// Pull request fields for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestDetails {
    /// Empty to use the title derived when the changes are applied.
    pub title: String,
    pub body: String,
    /// Branch to push to. None creates a fresh branch.
    pub branch_name: Option<String>,
    pub draft: bool,
    pub labels: Vec<Label>,
}

/// Everything needed to reconcile the pull request of one repository.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub git_url: String,
    /// Target branch, None for the repository's default branch.
    pub base_branch: Option<String>,
    pub details: PullRequestDetails,
    pub commit_message: String,
    pub auto_merge: bool,
    /// Push to a fork instead of the repository itself.
    pub fork: bool,
    pub filter: Option<PullRequestFilter>,
    pub change_set: ChangeSet,
}

#[async_trait]
pub trait PullRequestReconciler: Send + Sync {
    /// Apply the change set and create or reuse a pull request. Returns None
    /// when the changes produced no difference.
    async fn create(&self, req: ReconcileRequest) -> Result<Option<PullRequest>>;
}
