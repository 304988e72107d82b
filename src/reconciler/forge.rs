//! Reconciles pull requests by cloning the repository, applying the change
//! set, pushing a branch and driving the forge API.
use async_trait::async_trait;
use color_eyre::eyre::WrapErr;
use derive_builder::Builder;
use log::*;
use nanoid::nanoid;
use std::sync::Arc;
use tempfile::TempDir;

use crate::{
    error::UpdatebotError,
    forge::{
        config::{DEFAULT_BRANCH_PREFIX, UPDATEBOT_LABEL},
        request::{
            CreatePrRequest, FindPrRequest, Label, PrLabelsRequest,
            PullRequest, RepoRef, UpdatePrRequest,
        },
        traits::Forge,
    },
    git::{
        identity::GitIdentity,
        repo::{FORK_REMOTE, GitAuth, Repository, UPSTREAM_REMOTE},
    },
    reconciler::{PullRequestReconciler, ReconcileRequest},
    result::Result,
};

const BRANCH_ID_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3',
    '4', '5', '6', '7', '8', '9',
];

/// New branch name for a version: `updatebot-<version>-<random>`.
pub fn new_branch_name(version: &str) -> String {
    let id = nanoid!(8, &BRANCH_ID_ALPHABET);
    if version.is_empty() {
        format!("{DEFAULT_BRANCH_PREFIX}-{id}")
    } else {
        format!("{DEFAULT_BRANCH_PREFIX}-{version}-{id}")
    }
}

/// Full commit message: the title, then the optional message body.
pub fn commit_message(title: &str, message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        title.to_string()
    } else {
        format!("{title}\n\n{message}")
    }
}

#[derive(Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct ForgeReconcilerParams {
    pub forge: Arc<dyn Forge>,
    #[builder(default)]
    pub auth: Option<GitAuth>,
    pub identity: GitIdentity,
    #[builder(default)]
    pub clone_depth: u64,
    #[builder(default)]
    pub dry_run: bool,
}

impl ForgeReconcilerParamsBuilder {
    pub fn build(&self) -> Result<ForgeReconciler> {
        let params = self._build().map_err(|e| {
            UpdatebotError::invalid_config(format!(
                "Failed to build pull request reconciler: {}",
                e
            ))
        })?;
        Ok(ForgeReconciler::new(params))
    }
}

/// Production [`PullRequestReconciler`] backed by git clones and a forge.
pub struct ForgeReconciler {
    forge: Arc<dyn Forge>,
    auth: Option<GitAuth>,
    identity: GitIdentity,
    clone_depth: u64,
    dry_run: bool,
}

impl ForgeReconciler {
    pub fn builder() -> ForgeReconcilerParamsBuilder {
        ForgeReconcilerParamsBuilder::default()
    }

    pub fn new(params: ForgeReconcilerParams) -> Self {
        Self {
            forge: params.forge,
            auth: params.auth,
            identity: params.identity,
            clone_depth: params.clone_depth,
            dry_run: params.dry_run,
        }
    }

    /// Open pull request to reuse under auto merge.
    async fn find_existing(
        &self,
        repo: &RepoRef,
        req: &ReconcileRequest,
    ) -> Result<Option<PullRequest>> {
        if !req.auto_merge {
            return Ok(None);
        }

        let Some(filter) = &req.filter else {
            return Ok(None);
        };

        let prs = self
            .forge
            .find_open_pull_requests(FindPrRequest {
                repo: repo.clone(),
                labels: filter.labels.clone(),
            })
            .await?;

        let existing = prs.into_iter().next();

        if let Some(pr) = &existing {
            info!(
                "reusing pull request #{} on branch {} for {repo}",
                pr.number, pr.head_branch
            );
        }

        Ok(existing)
    }

    fn labels(req: &ReconcileRequest) -> Vec<Label> {
        let mut labels = req.details.labels.clone();

        if req.auto_merge && !labels.iter().any(|l| l.name == UPDATEBOT_LABEL)
        {
            labels.push(Label::new(UPDATEBOT_LABEL));
        }

        labels
    }
}

#[async_trait]
impl PullRequestReconciler for ForgeReconciler {
    async fn create(&self, req: ReconcileRequest) -> Result<Option<PullRequest>> {
        let repo = RepoRef::from_git_url(&req.git_url)?;
        let existing = self.find_existing(&repo, &req).await?;

        let tmp = TempDir::new().wrap_err("failed to create temp directory")?;
        let repository = Repository::clone(
            &req.git_url,
            tmp.path(),
            self.clone_depth,
            self.auth.as_ref(),
        )
        .wrap_err_with(|| format!("failed to clone {}", req.git_url))?;

        let base_branch = req
            .base_branch
            .clone()
            .unwrap_or_else(|| repository.default_branch.clone());

        let branch = existing
            .as_ref()
            .map(|pr| pr.head_branch.clone())
            .or_else(|| req.details.branch_name.clone())
            .unwrap_or_else(|| new_branch_name(req.change_set.version()));

        repository.create_branch(&branch)?;
        repository.switch_branch(&branch)?;

        let workdir = repository.workdir()?.to_path_buf();
        let commit = req.change_set.apply(&workdir).await?;

        if !repository.has_changes()? {
            info!("no changes to commit for {}", req.git_url);
            return Ok(None);
        }

        let title = if req.details.title.is_empty() {
            commit.pull_request_title.clone()
        } else {
            req.details.title.clone()
        };

        repository.add_all()?;
        let sha = repository.commit(
            &commit_message(&commit.commit_title, &req.commit_message),
            &self.identity,
        )?;

        let labels = Self::labels(&req);

        if self.dry_run {
            warn!(
                "dry_run: would push branch {branch} and open pull request \"{title}\" on {repo}"
            );
            return Ok(Some(PullRequest {
                number: existing.as_ref().map(|pr| pr.number).unwrap_or(0),
                sha,
                head_branch: branch,
                title,
                link: existing.map(|pr| pr.link).unwrap_or_default(),
                labels: labels.into_iter().map(|l| l.name).collect(),
            }));
        }

        // git2::Repository is not Sync, never hold a borrow of it across an
        // await
        let (remote, head) = if req.fork {
            let forked = self.forge.fork_repository(&repo).await?;
            repository.add_remote(FORK_REMOTE, &forked.clone_url)?;
            (FORK_REMOTE, format!("{}:{branch}", forked.owner))
        } else {
            (UPSTREAM_REMOTE, branch.clone())
        };

        repository
            .push_branch(remote, &branch)
            .wrap_err_with(|| format!("failed to push branch {branch}"))?;

        let mut pr = match existing {
            Some(pr) => {
                self.forge
                    .update_pr(UpdatePrRequest {
                        repo: repo.clone(),
                        pr_number: pr.number,
                        title: title.clone(),
                        body: req.details.body.clone(),
                    })
                    .await?;
                PullRequest { title, ..pr }
            }
            None => {
                self.forge
                    .create_pr(CreatePrRequest {
                        repo: repo.clone(),
                        head_branch: head,
                        base_branch,
                        title,
                        body: req.details.body.clone(),
                        draft: req.details.draft,
                    })
                    .await?
            }
        };

        pr.sha = sha;

        if !labels.is_empty() {
            self.forge
                .add_pr_labels(PrLabelsRequest {
                    repo: repo.clone(),
                    pr_number: pr.number,
                    labels: labels.clone(),
                })
                .await?;

            for label in labels {
                if !pr.labels.contains(&label.name) {
                    pr.labels.push(label.name);
                }
            }
        }

        info!("pull request #{} for {repo}: {}", pr.number, pr.link);

        Ok(Some(pr))
    }
}
