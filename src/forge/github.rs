//! Implements the Forge trait for Github
use async_trait::async_trait;
use color_eyre::eyre::{OptionExt, eyre};
use log::*;
use octocrab::{Octocrab, models::Repository, params};
use reqwest::StatusCode;

use crate::{
    forge::{
        config::{DEFAULT_LABEL_COLOR, DEFAULT_PAGE_SIZE, RemoteConfig},
        request::{
            CreatePrRequest, FindPrRequest, GetFileContentRequest,
            PrLabelsRequest, PullRequest, RepoRef, RepositoryInfo,
            UpdatePrRequest,
        },
        traits::Forge,
    },
    result::Result,
};

/// GitHub forge implementation using Octocrab for repository discovery,
/// file lookups and pull request management.
pub struct Github {
    base_uri: String,
    instance: Octocrab,
}

impl Github {
    /// Create GitHub client with personal access token authentication and API
    /// base URL configuration.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_uri = format!("{}://api.{}", config.scheme, config.host);
        let builder = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(base_uri.clone())?;
        let instance = builder.build()?;

        Ok(Self { base_uri, instance })
    }

    /// Fetch one page of repositories from `/orgs/{owner}/repos` or
    /// `/users/{owner}/repos`. Returns None when the endpoint 404s.
    async fn list_repositories_page(
        &self,
        kind: &str,
        owner: &str,
        page: u32,
    ) -> Result<Option<Vec<Repository>>> {
        let endpoint = format!("{}/{kind}/{owner}/repos", self.base_uri);
        let per_page = DEFAULT_PAGE_SIZE.to_string();
        let page = page.to_string();
        let query = [("per_page", per_page.as_str()), ("page", page.as_str())];

        let result: std::result::Result<Vec<Repository>, octocrab::Error> =
            self.instance.get(endpoint, Some(&query)).await;

        match result {
            Ok(repos) => Ok(Some(repos)),
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code == StatusCode::NOT_FOUND =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_all(
        &self,
        kind: &str,
        owner: &str,
    ) -> Result<Option<Vec<Repository>>> {
        let mut all = vec![];
        let mut page = 1;

        loop {
            let Some(repos) =
                self.list_repositories_page(kind, owner, page).await?
            else {
                return Ok(None);
            };

            let count = repos.len();
            all.extend(repos);

            if count < DEFAULT_PAGE_SIZE as usize {
                break;
            }

            page += 1;
        }

        Ok(Some(all))
    }

    async fn ensure_labels(
        &self,
        repo: &RepoRef,
        req: &PrLabelsRequest,
    ) -> Result<Vec<String>> {
        let all_labels = self
            .instance
            .issues(&repo.owner, &repo.name)
            .list_labels_for_repo()
            .per_page(DEFAULT_PAGE_SIZE)
            .send()
            .await?;

        let mut labels = vec![];

        for label in req.labels.iter() {
            if let Some(existing) =
                all_labels.items.iter().find(|l| l.name == label.name)
            {
                labels.push(existing.name.clone());
            } else {
                debug!("creating label {} in {repo}", label.name);
                let created = self
                    .instance
                    .issues(&repo.owner, &repo.name)
                    .create_label(
                        &label.name,
                        DEFAULT_LABEL_COLOR,
                        &label.description,
                    )
                    .await?;
                labels.push(created.name);
            }
        }

        Ok(labels)
    }
}

fn to_repository_info(
    requested_owner: &str,
    repo: Repository,
) -> Result<RepositoryInfo> {
    let clone_url = repo
        .clone_url
        .map(|u| u.to_string())
        .ok_or_eyre(format!("repository {} has no clone url", repo.name))?;

    Ok(RepositoryInfo {
        owner: repo
            .owner
            .map(|o| o.login)
            .unwrap_or_else(|| requested_owner.to_string()),
        name: repo.name,
        clone_url,
        archived: repo.archived.unwrap_or_default(),
    })
}

fn to_pull_request(pr: octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        sha: pr.head.sha,
        head_branch: pr.head.ref_field,
        title: pr.title.unwrap_or_default(),
        link: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
        labels: pr
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|l| l.name)
            .collect(),
    }
}

#[async_trait]
impl Forge for Github {
    async fn list_repositories(
        &self,
        owner: &str,
    ) -> Result<Vec<RepositoryInfo>> {
        let repos = match self.list_all("orgs", owner).await? {
            Some(repos) => repos,
            None => {
                debug!("{owner} is not an organisation: listing user repos");
                self.list_all("users", owner).await?.ok_or_eyre(format!(
                    "no organisation or user found for owner: {owner}"
                ))?
            }
        };

        repos
            .into_iter()
            .map(|r| to_repository_info(owner, r))
            .collect()
    }

    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<String>> {
        let path = req.path.as_str();
        let result = self
            .instance
            .repos(&req.repo.owner, &req.repo.name)
            .get_content()
            .path(path)
            .send()
            .await;

        match result {
            Err(octocrab::Error::GitHub { source, backtrace }) => {
                if source.status_code == StatusCode::NOT_FOUND {
                    debug!("no file found for path: {path} in {}", req.repo);
                    Ok(None)
                } else {
                    let msg = format!(
                        "error getting contents for path: {path}, status: {}, backtrace: {backtrace}",
                        source.status_code
                    );
                    error!("{msg}");
                    Err(eyre!(msg))
                }
            }
            Err(err) => {
                let msg = format!(
                    "encountered error getting file contents for path: {path}: {err}"
                );
                error!("{msg}");
                Err(eyre!(msg))
            }
            Ok(mut data) => {
                let items = data.take_items();

                if items.is_empty() {
                    debug!("no file found for path: {path} in {}", req.repo);
                    return Ok(None);
                }

                if let Some(content) = items[0].decoded_content() {
                    Ok(Some(content))
                } else {
                    Err(eyre!("failed to decode file content for path: {path}"))
                }
            }
        }
    }

    async fn find_open_pull_requests(
        &self,
        req: FindPrRequest,
    ) -> Result<Vec<PullRequest>> {
        let prs = self
            .instance
            .pulls(&req.repo.owner, &req.repo.name)
            .list()
            .state(params::State::Open)
            .per_page(DEFAULT_PAGE_SIZE)
            .send()
            .await?;

        Ok(prs
            .into_iter()
            .map(to_pull_request)
            .filter(|pr| req.labels.iter().all(|l| pr.labels.contains(l)))
            .collect())
    }

    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest> {
        let pr = self
            .instance
            .pulls(&req.repo.owner, &req.repo.name)
            .create(req.title, req.head_branch, req.base_branch)
            .body(req.body)
            .draft(req.draft)
            .send()
            .await?;

        Ok(to_pull_request(pr))
    }

    async fn update_pr(&self, req: UpdatePrRequest) -> Result<()> {
        self.instance
            .pulls(&req.repo.owner, &req.repo.name)
            .update(req.pr_number)
            .title(req.title)
            .body(req.body)
            .send()
            .await?;

        Ok(())
    }

    async fn add_pr_labels(&self, req: PrLabelsRequest) -> Result<()> {
        if req.labels.is_empty() {
            return Ok(());
        }

        let repo = req.repo.clone();
        let labels = self.ensure_labels(&repo, &req).await?;

        self.instance
            .issues(&repo.owner, &repo.name)
            .add_labels(req.pr_number, &labels)
            .await?;

        Ok(())
    }

    async fn fork_repository(&self, repo: &RepoRef) -> Result<RepositoryInfo> {
        info!("forking repository {repo}");
        let fork = self
            .instance
            .repos(&repo.owner, &repo.name)
            .create_fork()
            .send()
            .await?;

        to_repository_info(&repo.owner, fork)
    }
}
