//! CLI argument parsing.
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Default clone depth. Use 0 for full history.
pub const DEFAULT_CLONE_DEPTH: u64 = 0;

/// Global CLI arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Updatebot subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create pull requests that propagate a version to downstream
    /// repositories.
    Pr(PrArgs),
}

/// Arguments of the `pr` subcommand.
#[derive(ClapArgs, Debug, Clone)]
pub struct PrArgs {
    #[arg(short, long, default_value = ".")]
    /// Directory holding the configuration and version file.
    pub dir: PathBuf,

    #[arg(short, long)]
    /// Configuration file. Defaults to <dir>/.jx/updatebot.yaml.
    pub config_file: Option<PathBuf>,

    #[arg(long)]
    /// Version to propagate. Falls back to the version file, then $VERSION.
    pub version: Option<String>,

    #[arg(long)]
    /// File containing the version. Defaults to <dir>/VERSION.
    pub version_file: Option<PathBuf>,

    #[arg(long, default_value = "")]
    /// Pull request title. Derived from each repository when empty.
    pub pull_request_title: String,

    #[arg(long, default_value = "")]
    /// Pull request body. Defaults to "from: <source git URL>".
    pub pull_request_body: String,

    #[arg(long, default_value = "")]
    /// Commit author name.
    pub git_user_name: String,

    #[arg(long, default_value = "")]
    /// Commit author email.
    pub git_user_email: String,

    #[arg(long, value_delimiter = ',')]
    /// Labels added to every pull request. Comma separated or repeated.
    pub labels: Vec<String>,

    #[arg(
        long,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    /// Label pull requests for auto merge and reuse open ones.
    pub auto_merge: bool,

    #[arg(long, default_value_t = false)]
    /// Run without a version.
    pub no_version: bool,

    #[arg(long, default_value_t = false)]
    /// Write a git credentials file for the git server.
    pub git_credentials: bool,

    #[arg(long, default_value = "")]
    /// Commit title. Defaults to the pull request title.
    pub commit_title: String,

    #[arg(long, default_value = "")]
    /// Commit message body. Defaults to "from: <source git URL>".
    pub commit_message: String,

    #[arg(long, default_value = "")]
    /// Git server URL. Discovered from the origin remote of --dir when empty.
    pub git_server: String,

    #[arg(long, default_value = "")]
    /// Git token. Falls back to GIT_TOKEN or GITHUB_TOKEN env vars.
    pub git_token: String,

    #[arg(long, default_value = "")]
    /// User the git token belongs to.
    pub git_username: String,

    #[arg(long, default_value_t = false)]
    /// Apply changes locally but do not push or create pull requests.
    pub dry_run: bool,

    #[arg(long = "template-data", value_name = "KEY=VALUE")]
    /// Value made available to command templates. Repeatable.
    pub template_data: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_CLONE_DEPTH)]
    /// Clone depth of downstream repositories. Use 0 for full history.
    pub clone_depth: u64,
}
