//! GitHub REST release listing (`GET /repos/{owner}/{repo}/releases`).

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::http;
use super::{Release, ReleaseSource};
use crate::config::RepoConfig;
use crate::retry::{run_with_retry, FetchError, RetryPolicy};

const PER_PAGE: usize = 100;
/// Hard stop for pagination so a misbehaving server cannot loop us forever.
const MAX_PAGES: u32 = 50;

pub struct GithubReleases {
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GithubReleases {
    pub fn new(repo: &RepoConfig, api_base: &str, retry: RetryPolicy) -> Self {
        Self {
            api_base: api_base.to_string(),
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            token: repo.token.clone().filter(|t| !t.trim().is_empty()),
            retry,
        }
    }

    fn page_url(&self, page: u32) -> Result<String, FetchError> {
        let mut url =
            Url::parse(&self.api_base).map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str(), "releases"]);
        url.query_pairs_mut()
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());
        Ok(url.into())
    }

    fn request_headers(&self) -> Vec<String> {
        let mut headers = vec![
            "Accept: application/vnd.github+json".to_string(),
            "X-GitHub-Api-Version: 2022-11-28".to_string(),
        ];
        if let Some(token) = &self.token {
            headers.push(format!("Authorization: Bearer {}", token.trim()));
        }
        headers
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<Release>, FetchError> {
        let url = self.page_url(page)?;
        let headers = self.request_headers();
        let (body, header_lines) = run_with_retry(&self.retry, "list releases", || {
            let url = url.clone();
            let headers = headers.clone();
            async move { tokio::task::spawn_blocking(move || http::get_bytes(&url, &headers)).await? }
        })
        .await?;

        if let Some(remaining) = http::header_value(&header_lines, "x-ratelimit-remaining") {
            debug!(quota = remaining, page, "GitHub API rate limit remaining");
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ReleaseSource for GithubReleases {
    async fn list_releases(&self) -> Result<Vec<Release>, FetchError> {
        let mut releases = Vec::new();
        for page in 1..=MAX_PAGES {
            let batch = self.fetch_page(page).await?;
            let n = batch.len();
            releases.extend(batch);
            if n < PER_PAGE {
                break;
            }
        }
        debug!(
            repo = %format!("{}/{}", self.owner, self.repo),
            count = releases.len(),
            "listed releases"
        );
        Ok(releases)
    }
}
