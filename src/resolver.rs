//! Expands the target repositories of a rule.
//!
//! Go module changes discover the repositories that depend on their package
//! by listing each owner's repositories and reading their `go.mod`.
use color_eyre::eyre::WrapErr;
use log::*;
use std::sync::Arc;

use crate::{
    change::go_mod,
    config::{Change, GoChange, Rule},
    error::UpdatebotError,
    forge::{
        request::{GetFileContentRequest, RepositoryInfo},
        traits::Forge,
    },
    result::Result,
};

const GO_MOD_PATH: &str = "go.mod";

/// Resolves the URLs of a rule through the forge.
pub struct UrlResolver {
    forge: Arc<dyn Forge>,
}

impl UrlResolver {
    pub fn new(forge: Arc<dyn Forge>) -> Self {
        Self { forge }
    }

    /// Append discovered repository URLs to `rule.urls`. Duplicates are kept
    /// and each occurrence is processed.
    pub async fn resolve(&self, rule: &mut Rule) -> Result<()> {
        let mut discovered = vec![];

        for change in rule.changes.iter() {
            if let Change::GoModule(go) = change {
                let urls = self.go_find_urls(go).await.wrap_err_with(|| {
                    UpdatebotError::discovery(format!(
                        "failed to find go repositories depending on {}",
                        go.package
                    ))
                })?;
                discovered.extend(urls);
            }
        }

        if !discovered.is_empty() {
            info!("discovered {} repositories to update", discovered.len());
        }

        rule.urls.extend(discovered);

        Ok(())
    }

    async fn go_find_urls(&self, change: &GoChange) -> Result<Vec<String>> {
        let repositories = change.repositories.compile()?;
        let mut urls = vec![];

        for owner in change.owners.iter() {
            let repos = self.forge.list_repositories(owner).await?;

            for repo in repos {
                if repo.archived || !repositories.matches(&repo.name) {
                    continue;
                }

                if self.requires_package(&repo, &change.package).await? {
                    debug!(
                        "{}/{} requires {}",
                        repo.owner, repo.name, change.package
                    );
                    urls.push(repo.clone_url);
                }
            }
        }

        Ok(urls)
    }

    async fn requires_package(
        &self,
        repo: &RepositoryInfo,
        package: &str,
    ) -> Result<bool> {
        let content = self
            .forge
            .get_file_content(GetFileContentRequest {
                repo: repo.repo_ref(),
                path: GO_MOD_PATH.into(),
            })
            .await?;

        Ok(content
            .map(|c| go_mod::requires(&c, package))
            .unwrap_or(false))
    }
}
