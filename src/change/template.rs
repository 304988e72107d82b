//! Template rendering for command arguments and environment values.
use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::{error::UpdatebotError, forge::request::RepoRef, result::Result};

/// Free-form values made available to templates.
pub type TemplateData = Map<String, Value>;

/// Build the context for a repository. `version`, `git_url` and
/// `repository` (`owner/name`) are always present and shadow template data
/// with the same keys.
pub fn template_context(
    version: &str,
    git_url: &str,
    data: &TemplateData,
) -> Result<Context> {
    let mut context = Context::from_value(Value::Object(data.clone()))
        .map_err(|e| UpdatebotError::invalid_config(e.to_string()))?;

    let repository = RepoRef::from_git_url(git_url)
        .map(|r| r.to_string())
        .unwrap_or_else(|_| git_url.to_string());

    context.insert("version", version);
    context.insert("git_url", git_url);
    context.insert("repository", &repository);

    Ok(context)
}

/// Render `template`. Strings without template markers are returned as is.
pub fn render(template: &str, context: &Context) -> Result<String> {
    if !template.contains("{{") && !template.contains("{%") {
        return Ok(template.to_string());
    }

    Tera::one_off(template, context, false).map_err(|e| {
        UpdatebotError::invalid_config(format!(
            "failed to render template `{template}`: {e}"
        ))
        .into()
    })
}
