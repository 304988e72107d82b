//! Pull request creation command implementation.
use color_eyre::eyre::WrapErr;
use log::*;
use secrecy::SecretString;
use std::sync::Arc;

use crate::{
    change::{ChangeApplier, runner::ProcessRunner},
    cli::PrArgs,
    engine::{RuleEngine, RunState},
    forge::{config::RemoteConfig, github::Github, traits::Forge},
    git::repo::GitAuth,
    options::PrOptions,
    reconciler::{PullRequestReconciler, forge::ForgeReconciler},
    resolver::UrlResolver,
    result::Result,
};

/// Validate the arguments, then create or update a pull request on every
/// repository the configuration targets.
pub async fn execute(args: &PrArgs) -> Result<()> {
    let opts = PrOptions::validate(args).wrap_err("failed to validate")?;

    let remote = RemoteConfig::from_server_url(
        &opts.scm.server_url,
        &opts.git_username,
        SecretString::from(opts.scm.token.clone()),
    )?;

    let forge: Arc<dyn Forge> = Arc::new(Github::new(remote)?);
    let engine = build_engine(&opts, forge)?;

    if opts.dry_run {
        warn!("dry_run: no branches will be pushed and no pull requests created");
    }

    let state = engine.run(opts.update_config.clone()).await?;

    log_summary(&state);

    Ok(())
}

/// Wire the resolver, applier and reconciler for a validated run.
pub fn build_engine(
    opts: &PrOptions,
    forge: Arc<dyn Forge>,
) -> Result<RuleEngine> {
    let applier = ChangeApplier::new(
        opts.version.as_str(),
        opts.template_data.clone(),
        Arc::new(ProcessRunner),
    );

    let reconciler = ForgeReconciler::builder()
        .forge(forge.clone())
        .auth(GitAuth {
            username: opts.git_username.clone(),
            token: SecretString::from(opts.scm.token.clone()),
        })
        .identity(opts.identity.clone())
        .clone_depth(opts.clone_depth)
        .dry_run(opts.dry_run)
        .build()?;

    RuleEngine::builder()
        .resolver(Arc::new(UrlResolver::new(forge)))
        .applier(Arc::new(applier))
        .reconciler(Arc::new(reconciler) as Arc<dyn PullRequestReconciler>)
        .config(opts.engine.clone())
        .build()
}

fn log_summary(state: &RunState) {
    if state.pull_requests.is_empty() {
        info!("no pull requests created");
        return;
    }

    info!("created or updated {} pull requests", state.pull_requests.len());

    for pr in state.pull_requests.iter() {
        info!("{} ({}) at {}", pr.link, pr.head_branch, pr.sha);
    }
}
