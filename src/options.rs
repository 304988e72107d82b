//! Validation of the `pr` command arguments into everything a run needs.
use color_eyre::eyre::WrapErr;
use log::*;
use secrecy::SecretString;
use std::env;

use crate::{
    change::template::TemplateData,
    cli::PrArgs,
    config::{UpdateConfig, default_config_path, load_update_config},
    engine::EngineConfig,
    error::UpdatebotError,
    git::{
        credentials::setup_git_credentials,
        discovery::{ScmDetails, discover_scm, origin_url},
        identity::{
            DEFAULT_GIT_USER_NAME, GitIdentity, ensure_user_and_email_setup,
        },
    },
    result::Result,
    version::VersionSource,
};

/// Environment variable consulted for the git username.
pub const GIT_USERNAME_ENV_VAR: &str = "GIT_USERNAME";

/// Validated options of a `pr` run.
#[derive(Debug, Clone)]
pub struct PrOptions {
    pub version: String,
    pub update_config: UpdateConfig,
    pub engine: EngineConfig,
    /// Values made available to command templates.
    pub template_data: TemplateData,
    pub scm: ScmDetails,
    /// User the git token authenticates as.
    pub git_username: String,
    pub identity: GitIdentity,
    pub dry_run: bool,
    pub clone_depth: u64,
}

impl PrOptions {
    /// Resolve the version, load the configuration and set up git. Fails
    /// before anything is cloned or pushed.
    pub fn validate(args: &PrArgs) -> Result<Self> {
        let version = VersionSource {
            explicit: args.version.clone(),
            version_file: args.version_file.clone(),
            dir: args.dir.clone(),
            no_version: args.no_version,
        }
        .resolve()?;

        let config_file = args
            .config_file
            .clone()
            .unwrap_or_else(|| default_config_path(&args.dir));

        let update_config = load_update_config(&config_file)?;

        let template_data = parse_template_data(&args.template_data)?;

        let identity = ensure_user_and_email_setup(
            &args.dir,
            &args.git_user_name,
            &args.git_user_email,
        )
        .wrap_err("failed to setup git user and email")?;

        let scm = discover_scm(&args.dir, &args.git_server, &args.git_token)
            .wrap_err("failed to discover repository details")?;

        let git_username = git_username(&args.git_username, &scm);

        if args.git_credentials {
            if scm.token.is_empty() {
                return Err(UpdatebotError::MissingGitToken.into());
            }

            let path = setup_git_credentials(
                &scm.server_url,
                &git_username,
                &SecretString::from(scm.token.clone()),
            )
            .wrap_err("failed to setup git credentials file")?;

            info!(
                "setup git credentials file {} for user {git_username}",
                path.display()
            );
        }

        let mut engine = EngineConfig {
            pull_request_title: args.pull_request_title.clone(),
            pull_request_body: args.pull_request_body.clone(),
            commit_title: args.commit_title.clone(),
            commit_message: args.commit_message.clone(),
            labels: args
                .labels
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            auto_merge: args.auto_merge,
            pull_request_filter: None,
        };

        if engine.pull_request_body.is_empty()
            || engine.commit_message.is_empty()
        {
            match origin_url(&args.dir) {
                Some(url) => {
                    let message = format!("from: {url}\n");
                    if engine.pull_request_body.is_empty() {
                        engine.pull_request_body = message.clone();
                    }
                    if engine.commit_message.is_empty() {
                        engine.commit_message = message;
                    }
                }
                None => warn!(
                    "failed to find git URL of {}",
                    args.dir.display()
                ),
            }
        }

        Ok(Self {
            version,
            update_config,
            engine,
            template_data,
            scm,
            git_username,
            identity,
            dry_run: args.dry_run,
            clone_depth: args.clone_depth,
        })
    }
}

/// Parse `KEY=VALUE` pairs. Values are kept as strings; later keys win.
fn parse_template_data(values: &[String]) -> Result<TemplateData> {
    let mut data = TemplateData::new();

    for value in values {
        let (key, val) = value
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| {
                UpdatebotError::invalid_config(format!(
                    "template data `{value}` is not of the form KEY=VALUE"
                ))
            })?;

        data.insert(
            key.trim().to_string(),
            serde_json::Value::String(val.to_string()),
        );
    }

    Ok(data)
}

/// Flag, then the user of the discovered remote, then `$GIT_USERNAME`.
fn git_username(flag: &str, scm: &ScmDetails) -> String {
    [
        Some(flag.to_string()),
        Some(scm.username.clone()),
        env::var(GIT_USERNAME_ENV_VAR).ok(),
    ]
    .into_iter()
    .flatten()
    .find(|u| !u.is_empty())
    .unwrap_or_else(|| DEFAULT_GIT_USER_NAME.to_string())
}
