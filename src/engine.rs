//! Drives a run: resolves each rule's repositories, binds the rule's changes
//! to every repository and hands them to the pull request reconciler.
use color_eyre::eyre::WrapErr;
use derive_builder::Builder;
use log::*;
use std::{collections::HashMap, sync::Arc};

use crate::{
    change::{ChangeApplier, ChangeSet},
    config::{Change, UpdateConfig},
    error::UpdatebotError,
    forge::{
        config::UPDATEBOT_LABEL,
        request::{Label, PullRequest},
    },
    reconciler::{
        PullRequestDetails, PullRequestFilter, PullRequestReconciler,
        ReconcileRequest,
    },
    resolver::UrlResolver,
    result::Result,
};

/// Pull request and commit settings shared by every repository of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub pull_request_title: String,
    pub pull_request_body: String,
    pub commit_title: String,
    pub commit_message: String,
    pub labels: Vec<String>,
    pub auto_merge: bool,
    /// Base filter for reusable pull requests. The sentinel label is added
    /// when auto merge is on.
    pub pull_request_filter: Option<PullRequestFilter>,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// Head commit of the pull request created or reused per repository URL.
    pub pull_request_shas: HashMap<String, String>,
    pub pull_requests: Vec<PullRequest>,
}

impl RunState {
    fn add_pull_request(&mut self, git_url: &str, pr: PullRequest) {
        self.pull_request_shas
            .insert(git_url.to_string(), pr.sha.clone());
        self.pull_requests.push(pr);
    }
}

#[derive(Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct RuleEngineParams {
    pub resolver: Arc<UrlResolver>,
    pub applier: Arc<ChangeApplier>,
    pub reconciler: Arc<dyn PullRequestReconciler>,
    #[builder(default)]
    pub config: EngineConfig,
}

impl RuleEngineParamsBuilder {
    pub fn build(&self) -> Result<RuleEngine> {
        let params = self._build().map_err(|e| {
            UpdatebotError::invalid_config(format!(
                "Failed to build rule engine: {}",
                e
            ))
        })?;
        Ok(RuleEngine::new(params))
    }
}

pub struct RuleEngine {
    resolver: Arc<UrlResolver>,
    applier: Arc<ChangeApplier>,
    reconciler: Arc<dyn PullRequestReconciler>,
    config: EngineConfig,
}

impl RuleEngine {
    pub fn builder() -> RuleEngineParamsBuilder {
        RuleEngineParamsBuilder::default()
    }

    pub fn new(params: RuleEngineParams) -> Self {
        Self {
            resolver: params.resolver,
            applier: params.applier,
            reconciler: params.reconciler,
            config: params.config,
        }
    }

    /// Process every rule in order. The first error stops the run.
    pub async fn run(&self, config: UpdateConfig) -> Result<RunState> {
        let mut state = RunState::default();

        for (i, mut rule) in config.spec.rules.into_iter().enumerate() {
            self.resolver
                .resolve(&mut rule)
                .await
                .wrap_err("failed to find URLs")?;

            let fork = rule.fork;

            if rule.urls.is_empty() {
                warn!("no URLs to process for rule {i}");
                continue;
            }

            for git_url in rule.urls.iter() {
                if git_url.is_empty() {
                    warn!("missing out repository {i} as it has no git URL");
                    continue;
                }

                let pr = self
                    .process_url(git_url, &rule.changes, fork)
                    .await
                    .wrap_err_with(|| {
                        format!(
                            "failed to create Pull Request on repository {git_url}"
                        )
                    })?;

                match pr {
                    Some(pr) => state.add_pull_request(git_url, pr),
                    None => info!("no Pull Request created"),
                }
            }
        }

        Ok(state)
    }

    fn details(&self) -> PullRequestDetails {
        PullRequestDetails {
            title: self.config.pull_request_title.clone(),
            body: self.config.pull_request_body.clone(),
            branch_name: None,
            draft: false,
            labels: self
                .config
                .labels
                .iter()
                .map(|l| Label::new(l.as_str()))
                .collect(),
        }
    }

    fn filter(&self) -> Option<PullRequestFilter> {
        if !self.config.auto_merge {
            return self.config.pull_request_filter.clone();
        }

        let mut filter =
            self.config.pull_request_filter.clone().unwrap_or_default();
        filter.ensure_label(UPDATEBOT_LABEL);

        Some(filter)
    }

    async fn process_url(
        &self,
        git_url: &str,
        changes: &[Change],
        fork: bool,
    ) -> Result<Option<PullRequest>> {
        info!("processing {git_url}");

        let change_set =
            ChangeSet::new(git_url, changes.to_vec(), self.applier.clone())
                .with_titles(
                    self.config.pull_request_title.as_str(),
                    self.config.commit_title.as_str(),
                );

        let request = ReconcileRequest {
            git_url: git_url.to_string(),
            base_branch: None,
            details: self.details(),
            commit_message: self.config.commit_message.clone(),
            auto_merge: self.config.auto_merge,
            fork,
            filter: self.filter(),
            change_set,
        };

        self.reconciler.create(request).await
    }
}
