//! Common test utilities for rule engine tests.
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

use crate::{
    change::{
        ChangeApplier, CommitDetails, runner::MockCommandRunner,
        template::TemplateData,
    },
    config::{Change, RegexChange, Rule, UpdateConfig, UpdateConfigSpec},
    engine::{EngineConfig, RuleEngine},
    forge::{
        config::UPDATEBOT_LABEL,
        request::PullRequest,
        traits::{Forge, MockForge},
    },
    reconciler::{
        PullRequestDetails, PullRequestFilter, PullRequestReconciler,
        ReconcileRequest,
    },
    resolver::UrlResolver,
    result::Result,
};

pub const VERSION: &str = "1.2.3";
pub const WIDGETS_URL: &str = "https://github.com/acme/widgets.git";
pub const GADGETS_URL: &str = "https://github.com/acme/gadgets.git";

/// File seeded into every working copy created by [`RecordingReconciler`].
pub const SETTINGS_FILE: &str = "settings.txt";
pub const SETTINGS_CONTENT: &str = "version=1.0.0\n";

/// Arguments and outcome of one reconcile call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub git_url: String,
    pub details: PullRequestDetails,
    pub commit_message: String,
    pub auto_merge: bool,
    pub fork: bool,
    pub filter: Option<PullRequestFilter>,
    /// None when applying the change set failed.
    pub commit: Option<CommitDetails>,
    /// Content of the seeded file after the change set ran.
    pub settings: String,
    pub reused: bool,
}

/// Fake reconciler that applies change sets in scratch directories and
/// keeps open sentinel-labelled pull requests per URL for reuse.
#[derive(Default)]
pub struct RecordingReconciler {
    pub calls: Mutex<Vec<RecordedCall>>,
    open: Mutex<HashMap<String, PullRequest>>,
    next_number: Mutex<u64>,
}

impl RecordingReconciler {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, req: &ReconcileRequest, call: RecordedCallOutcome) {
        self.calls.lock().unwrap().push(RecordedCall {
            git_url: req.git_url.clone(),
            details: req.details.clone(),
            commit_message: req.commit_message.clone(),
            auto_merge: req.auto_merge,
            fork: req.fork,
            filter: req.filter.clone(),
            commit: call.commit,
            settings: call.settings,
            reused: call.reused,
        });
    }

    fn reusable(&self, req: &ReconcileRequest) -> Option<PullRequest> {
        let filter = req.filter.as_ref()?;

        if !req.auto_merge || !filter.labels.iter().any(|l| l == UPDATEBOT_LABEL)
        {
            return None;
        }

        self.open.lock().unwrap().get(&req.git_url).cloned()
    }

    fn open_new(&self, req: &ReconcileRequest, title: String) -> PullRequest {
        let mut next = self.next_number.lock().unwrap();
        *next += 1;

        let mut labels = req
            .details
            .labels
            .iter()
            .map(|l| l.name.clone())
            .collect::<Vec<String>>();

        if req.auto_merge {
            labels.push(UPDATEBOT_LABEL.into());
        }

        let pr = PullRequest {
            number: *next,
            sha: format!("sha-{}", *next),
            head_branch: format!("updatebot-{VERSION}-{}", *next),
            title,
            link: format!("{}/pull/{}", req.git_url, *next),
            labels,
        };

        if req.auto_merge {
            self.open
                .lock()
                .unwrap()
                .insert(req.git_url.clone(), pr.clone());
        }

        pr
    }
}

struct RecordedCallOutcome {
    commit: Option<CommitDetails>,
    settings: String,
    reused: bool,
}

#[async_trait]
impl PullRequestReconciler for RecordingReconciler {
    async fn create(&self, req: ReconcileRequest) -> Result<Option<PullRequest>> {
        let tmp = TempDir::new()?;
        let settings_path = tmp.path().join(SETTINGS_FILE);
        std::fs::write(&settings_path, SETTINGS_CONTENT)?;

        let result = req.change_set.apply(tmp.path()).await;
        let settings = std::fs::read_to_string(&settings_path)?;

        let commit = match result {
            Ok(commit) => commit,
            Err(e) => {
                self.record(
                    &req,
                    RecordedCallOutcome {
                        commit: None,
                        settings,
                        reused: false,
                    },
                );
                return Err(e);
            }
        };

        let changed = settings != SETTINGS_CONTENT;

        let title = if req.details.title.is_empty() {
            commit.pull_request_title.clone()
        } else {
            req.details.title.clone()
        };

        let reusable = if changed { self.reusable(&req) } else { None };
        let reused = reusable.is_some();

        self.record(
            &req,
            RecordedCallOutcome {
                commit: Some(commit),
                settings,
                reused,
            },
        );

        if !changed {
            return Ok(None);
        }

        Ok(Some(match reusable {
            Some(pr) => PullRequest {
                sha: format!("{}-updated", pr.sha),
                title,
                ..pr
            },
            None => self.open_new(&req, title),
        }))
    }
}

pub fn applier(runner: MockCommandRunner) -> Arc<ChangeApplier> {
    Arc::new(ChangeApplier::new(
        VERSION,
        TemplateData::new(),
        Arc::new(runner),
    ))
}

/// Builds an engine around a recording reconciler.
///
/// # Example
/// ```ignore
/// let reconciler = Arc::new(RecordingReconciler::default());
/// let engine = create_test_engine(&reconciler, MockForge::new(), config);
/// ```
pub fn create_test_engine_with_runner(
    reconciler: &Arc<RecordingReconciler>,
    forge: MockForge,
    runner: MockCommandRunner,
    config: EngineConfig,
) -> RuleEngine {
    RuleEngine::builder()
        .resolver(Arc::new(UrlResolver::new(
            Arc::new(forge) as Arc<dyn Forge>
        )))
        .applier(applier(runner))
        .reconciler(reconciler.clone() as Arc<dyn PullRequestReconciler>)
        .config(config)
        .build()
        .unwrap()
}

pub fn create_test_engine(
    reconciler: &Arc<RecordingReconciler>,
    forge: MockForge,
    config: EngineConfig,
) -> RuleEngine {
    create_test_engine_with_runner(
        reconciler,
        forge,
        MockCommandRunner::new(),
        config,
    )
}

pub fn auto_merge_config() -> EngineConfig {
    EngineConfig {
        auto_merge: true,
        labels: vec!["dependencies".into()],
        commit_message: "from: https://github.com/acme/lib\n".into(),
        pull_request_body: "from: https://github.com/acme/lib\n".into(),
        ..EngineConfig::default()
    }
}

/// Change rewriting the seeded settings file to the run's version.
pub fn settings_change() -> Change {
    Change::Regex(RegexChange {
        pattern: r"version=(\S+)".into(),
        files: vec![SETTINGS_FILE.into()],
    })
}

pub fn rule(urls: Vec<&str>, changes: Vec<Change>) -> Rule {
    Rule {
        fork: false,
        urls: urls.into_iter().map(String::from).collect(),
        changes,
    }
}

pub fn update_config(rules: Vec<Rule>) -> UpdateConfig {
    UpdateConfig {
        spec: UpdateConfigSpec { rules },
        ..UpdateConfig::default()
    }
}
