//! Traits related to remote git forges
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    forge::request::{
        CreatePrRequest, FindPrRequest, GetFileContentRequest, PrLabelsRequest,
        PullRequest, RepoRef, RepositoryInfo, UpdatePrRequest,
    },
    result::Result,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    async fn list_repositories(
        &self,
        owner: &str,
    ) -> Result<Vec<RepositoryInfo>>;
    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<String>>;
    async fn find_open_pull_requests(
        &self,
        req: FindPrRequest,
    ) -> Result<Vec<PullRequest>>;
    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest>;
    async fn update_pr(&self, req: UpdatePrRequest) -> Result<()>;
    async fn add_pr_labels(&self, req: PrLabelsRequest) -> Result<()>;
    async fn fork_repository(&self, repo: &RepoRef) -> Result<RepositoryInfo>;
}
