//! Typed change operations configured on a rule.
use serde::{Deserialize, Serialize};

use crate::config::filter::PatternFilter;

/// One mutation applied to a checked out repository.
///
/// In YAML a change is a map with exactly one of `command`, `go`, `regex` or
/// `versionStream`. Entries with none of them become [`Change::Unknown`] and
/// are skipped at apply time, which keeps older binaries working with newer
/// configuration files.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "ChangeSpec", into = "ChangeSpec")]
pub enum Change {
    Command(CommandChange),
    GoModule(GoChange),
    Regex(RegexChange),
    VersionStream(VersionStreamChange),
    Unknown,
}

impl Change {
    /// Short name of the variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Command(_) => "command",
            Change::GoModule(_) => "go",
            Change::Regex(_) => "regex",
            Change::VersionStream(_) => "versionStream",
            Change::Unknown => "unknown",
        }
    }
}

/// Wire representation of a [`Change`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct ChangeSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<CommandChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    go: Option<GoChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regex: Option<RegexChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_stream: Option<VersionStreamChange>,
}

impl From<ChangeSpec> for Change {
    fn from(spec: ChangeSpec) -> Self {
        if let Some(command) = spec.command {
            return Change::Command(command);
        }
        if let Some(go) = spec.go {
            return Change::GoModule(go);
        }
        if let Some(regex) = spec.regex {
            return Change::Regex(regex);
        }
        if let Some(version_stream) = spec.version_stream {
            return Change::VersionStream(version_stream);
        }
        Change::Unknown
    }
}

impl From<Change> for ChangeSpec {
    fn from(change: Change) -> Self {
        match change {
            Change::Command(command) => ChangeSpec {
                command: Some(command),
                ..Default::default()
            },
            Change::GoModule(go) => ChangeSpec {
                go: Some(go),
                ..Default::default()
            },
            Change::Regex(regex) => ChangeSpec {
                regex: Some(regex),
                ..Default::default()
            },
            Change::VersionStream(version_stream) => ChangeSpec {
                version_stream: Some(version_stream),
                ..Default::default()
            },
            Change::Unknown => ChangeSpec::default(),
        }
    }
}

/// Runs a program inside the checked out repository.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandChange {
    /// Program to execute.
    pub name: String,
    /// Arguments, rendered as templates before execution.
    pub args: Vec<String>,
    /// Extra environment variables, values rendered as templates.
    pub env: Vec<EnvVar>,
}

/// Environment variable passed to a command change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Upgrades a Go module requirement in every `go.mod` of the repository.
///
/// The `owners` and `repositories` fields drive discovery of the
/// repositories that depend on `package`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoChange {
    /// Organisations or users whose repositories are searched.
    pub owners: Vec<String>,
    /// Repository name filter applied during discovery.
    pub repositories: PatternFilter,
    /// Module path of the dependency being upgraded.
    pub package: String,
    /// Other module paths upgraded to the same version.
    pub upgrade_packages: PatternFilter,
}

/// Replaces capture groups of a pattern with the version in matching files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegexChange {
    /// Regular expression; each capture group is replaced with the version.
    pub pattern: String,
    /// Globs, relative to the repository root, selecting files to edit.
    #[serde(alias = "globs")]
    pub files: Vec<String>,
}

/// Updates pinned versions in a version stream directory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VersionStreamChange {
    /// Sub directory of `versionStream/`, for example `charts` or `git`.
    pub kind: String,
    /// Globs matched against entry names such as `acme/widgets`.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}
