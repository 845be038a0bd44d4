pub mod types;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use types::{
    ApiErrorBody, ApiIssueComment, ApiPullRequest, ApiPullRequestFile, ApiRepository, ApiReview,
    NewIssueComment, NewReview,
};

/// Public GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// User-Agent sent when none is configured. GitHub rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = "pr-review-tools";

const API_VERSION: &str = "2022-11-28";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const FILES_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Unexpected response from GitHub: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("File content is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid GitHub API URL: {0}")]
    InvalidUrl(String),

    #[error("GitHub token contains characters that cannot be sent in a header")]
    InvalidToken,
}

/// Where requests go and how they identify themselves.
///
/// Holds no credential: every session is opened with the token the caller
/// passes for that one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    api_url: String,
    user_agent: String,
}

impl Endpoint {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// An authenticated client for a single operation.
///
/// Sessions are cheap to build and are never shared between operations.
#[derive(Debug)]
pub struct Session {
    client: reqwest::Client,
    api_url: Url,
}

impl Session {
    /// Build a client that sends `token` as a bearer credential on every request.
    ///
    /// Nothing is sent to GitHub here; a bad token surfaces on the first call.
    pub fn connect(endpoint: &Endpoint, token: &str) -> Result<Self, GitHubError> {
        let api_url = Url::parse(endpoint.api_url())
            .map_err(|_| GitHubError::InvalidUrl(endpoint.api_url().to_string()))?;
        if api_url.cannot_be_a_base() {
            return Err(GitHubError::InvalidUrl(endpoint.api_url().to_string()));
        }

        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::InvalidToken)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .user_agent(endpoint.user_agent())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, api_url })
    }

    /// GET /repos/{owner}/{repo}
    #[instrument(skip(self))]
    pub async fn repository(&self, owner: &str, repo: &str) -> Result<ApiRepository, GitHubError> {
        debug!("resolving repository");
        self.get_json(self.url(&["repos", owner, repo])).await
    }

    /// GET /repos/{owner}/{repo}/pulls/{number}
    #[instrument(skip(self))]
    pub async fn pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<ApiPullRequest, GitHubError> {
        debug!("resolving pull request");
        let number = number.to_string();
        self.get_json(self.url(&["repos", owner, repo, "pulls", &number]))
            .await
    }

    /// Every changed-file entry of a pull request, following `Link: rel="next"`
    /// until the last page.
    #[instrument(skip(self))]
    pub async fn pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<ApiPullRequestFile>, GitHubError> {
        let number = number.to_string();
        let mut url = self.url(&["repos", owner, repo, "pulls", &number, "files"]);
        url.query_pairs_mut()
            .append_pair("per_page", &FILES_PER_PAGE.to_string())
            .append_pair("page", "1");

        let mut files = Vec::new();
        let mut next = Some(url);
        while let Some(page_url) = next.take() {
            debug!(url = %page_url, "fetching changed-file page");
            let response = check_status(self.client.get(page_url).send().await?).await?;
            next = next_page_url(response.headers());
            let bytes = response.bytes().await?;
            let page: Vec<ApiPullRequestFile> = serde_json::from_slice(&bytes)?;
            debug!(entries = page.len(), more = next.is_some(), "received changed-file page");
            files.extend(page);
        }
        Ok(files)
    }

    /// Raw bytes of `path` at `git_ref`, decoded as UTF-8.
    #[instrument(skip(self))]
    pub async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<String, GitHubError> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        let mut url = self.url(&segments);
        url.query_pairs_mut().append_pair("ref", git_ref);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await?;
        let bytes = check_status(response).await?.bytes().await?;
        debug!(bytes = bytes.len(), "received file content");
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// POST /repos/{owner}/{repo}/pulls/{number}/reviews
    #[instrument(skip(self, review), fields(event = review.event, comments = review.comments.len()))]
    pub async fn create_review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        review: &NewReview<'_>,
    ) -> Result<ApiReview, GitHubError> {
        debug!("creating review");
        let number = number.to_string();
        self.post_json(self.url(&["repos", owner, repo, "pulls", &number, "reviews"]), review)
            .await
    }

    /// POST /repos/{owner}/{repo}/issues/{number}/comments
    #[instrument(skip(self, body))]
    pub async fn create_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<ApiIssueComment, GitHubError> {
        debug!("creating issue comment");
        let number = number.to_string();
        self.post_json(
            self.url(&["repos", owner, repo, "issues", &number, "comments"]),
            &NewIssueComment { body },
        )
        .await
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // connect() rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitHubError> {
        let response = check_status(self.client.get(url).send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, GitHubError> {
        let response = check_status(self.client.post(url).json(body).send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a non-2xx response into [`GitHubError::Api`], keeping GitHub's own
/// `message` when the body carries one.
async fn check_status(response: Response) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => body.describe(),
        Err(_) if !text.trim().is_empty() => text.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
    };
    debug!(%status, %message, "GitHub returned an error status");
    Err(GitHubError::Api { status, message })
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .filter_map(|param| param.trim().strip_prefix("rel="))
            .any(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"));
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}
