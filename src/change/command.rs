//! Command change: runs a program inside the repository.
use async_trait::async_trait;
use color_eyre::eyre::{Report, WrapErr};
use log::*;

use crate::{
    change::{
        ChangeContext,
        runner::CommandSpec,
        template::{render, template_context},
        traits::ApplyChange,
    },
    config::CommandChange,
    error::UpdatebotError,
    result::Result,
    version::VERSION_ENV_VAR,
};

impl CommandChange {
    /// Render args and env for a repository. `VERSION` is always set and
    /// cannot be overridden by the configured env.
    pub fn to_spec(&self, ctx: &ChangeContext<'_>) -> Result<CommandSpec> {
        let context =
            template_context(ctx.version, ctx.git_url, ctx.template_data)?;

        let args = self
            .args
            .iter()
            .map(|a| render(a, &context))
            .collect::<Result<Vec<String>>>()?;

        let mut env = self
            .env
            .iter()
            .filter(|e| e.name != VERSION_ENV_VAR)
            .map(|e| Ok((e.name.clone(), render(&e.value, &context)?)))
            .collect::<Result<Vec<(String, String)>>>()?;

        env.push((VERSION_ENV_VAR.to_string(), ctx.version.to_string()));

        Ok(CommandSpec {
            name: self.name.clone(),
            args,
            env,
            dir: ctx.dir.to_path_buf(),
        })
    }
}

#[async_trait]
impl ApplyChange for CommandChange {
    async fn apply(&self, ctx: &ChangeContext<'_>) -> Result<()> {
        if self.name.is_empty() {
            return Err(UpdatebotError::invalid_config(
                "command change has no name",
            )
            .into());
        }

        let spec = self.to_spec(ctx)?;
        let command = spec.command_line();

        let output = ctx.runner.run(spec).await.wrap_err_with(|| {
            format!("failed to run command {command} for {}", ctx.git_url)
        })?;

        if !output.success() {
            let err = UpdatebotError::CommandFailed {
                command: command.clone(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            };
            return Err(Report::new(err).wrap_err(format!(
                "failed to run command {command} for repository {}",
                ctx.git_url
            )));
        }

        info!("ran command {command} for {}", ctx.git_url);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        change::{
            runner::{CommandOutput, MockCommandRunner},
            template::TemplateData,
        },
        config::EnvVar,
    };
    use serde_json::json;
    use std::path::Path;

    const GIT_URL: &str = "https://github.com/acme/widgets.git";

    fn change() -> CommandChange {
        CommandChange {
            name: "make".into(),
            args: vec!["bump".into(), "{{ repository }}={{ version }}".into()],
            env: vec![
                EnvVar {
                    name: "CHART".into(),
                    value: "{{ chart }}".into(),
                },
                EnvVar {
                    name: "VERSION".into(),
                    value: "ignored".into(),
                },
            ],
        }
    }

    fn template_data() -> TemplateData {
        let mut data = TemplateData::new();
        data.insert("chart".into(), json!("widgets"));
        data
    }

    #[tokio::test]
    async fn renders_args_and_env() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|spec| {
                spec.name == "make"
                    && spec.args
                        == vec!["bump".to_string(), "acme/widgets=1.2.3".into()]
                    && spec.env
                        == vec![
                            ("CHART".to_string(), "widgets".to_string()),
                            ("VERSION".to_string(), "1.2.3".to_string()),
                        ]
                    && spec.dir == Path::new("/work")
            })
            .times(1)
            .returning(|_| Ok(CommandOutput::default()));

        let data = template_data();
        let ctx = ChangeContext {
            dir: Path::new("/work"),
            git_url: GIT_URL,
            version: "1.2.3",
            template_data: &data,
            runner: &runner,
        };

        change().apply(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn non_zero_exit_is_command_failed() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Ok(CommandOutput {
                status: 2,
                stdout: "".into(),
                stderr: "no rule to make target\n".into(),
            })
        });

        let data = template_data();
        let ctx = ChangeContext {
            dir: Path::new("/work"),
            git_url: GIT_URL,
            version: "1.2.3",
            template_data: &data,
            runner: &runner,
        };

        let err = change().apply(&ctx).await.unwrap_err();

        assert!(err.to_string().contains(GIT_URL));
        assert!(matches!(
            err.downcast_ref::<UpdatebotError>(),
            Some(UpdatebotError::CommandFailed { status: 2, stderr, .. })
                if stderr == "no rule to make target"
        ));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_without_running() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let data = TemplateData::new();
        let ctx = ChangeContext {
            dir: Path::new("/work"),
            git_url: GIT_URL,
            version: "1.2.3",
            template_data: &data,
            runner: &runner,
        };

        let result = CommandChange::default().apply(&ctx).await;
        assert!(result.is_err());
    }
}
