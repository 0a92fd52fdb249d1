use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const MINIMIZE_COMMENT: &str = "mutation($id: ID!) { \
    minimizeComment(input: {subjectId: $id, classifier: OUTDATED}) { \
    minimizedComment { isMinimized } } }";

const PAGE_SIZE: usize = 100;
/// Upper bound on pages fetched per listing
const MAX_PAGES: u32 = 30;

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// `owner/name` of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(GitHubError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An issue or pull-request comment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub node_id: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

/// Minimal GitHub REST + GraphQL client for pull-request comments
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    graphql_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(
        token: impl Into<String>,
        api_url: &str,
        graphql_url: &str,
    ) -> Result<Self, GitHubError> {
        // Validate both endpoints up front; requests are built by formatting.
        url::Url::parse(api_url)?;
        url::Url::parse(graphql_url)?;

        let timeout_secs = env::var("PREVIEW_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("preview-cloudrun/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
            token: token.into(),
        })
    }

    fn comments_url(&self, repo: &Repository, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, repo.owner, repo.name, number
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", "2022-11-28")
    }

    /// Post a comment on issue / pull request `number`
    pub async fn create_comment(
        &self,
        repo: &Repository,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, GitHubError> {
        let url = self.comments_url(repo, number);
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&json!({ "body": body }))
            .send()
            .await?;
        let comment = check(response).await?.json().await?;
        Ok(comment)
    }

    /// Comments on issue / pull request `number`, oldest first, at most
    /// `MAX_PAGES` pages of them
    pub async fn list_comments(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        let url = self.comments_url(repo, number);
        let mut comments = Vec::new();
        let mut page = 1u32;
        loop {
            let response = self
                .request(reqwest::Method::GET, &url)
                .query(&[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())])
                .send()
                .await?;
            let batch: Vec<IssueComment> = check(response).await?.json().await?;
            let done = batch.len() < PAGE_SIZE;
            comments.extend(batch);
            if done {
                break;
            }
            if page >= MAX_PAGES {
                warn!(repo = %repo, number, pages = MAX_PAGES, "comment listing truncated");
                break;
            }
            page += 1;
        }
        debug!(repo = %repo, number, count = comments.len(), "listed comments");
        Ok(comments)
    }

    /// Collapse a comment as outdated
    pub async fn minimize_comment(&self, node_id: &str) -> Result<(), GitHubError> {
        let response = self
            .request(reqwest::Method::POST, &self.graphql_url)
            .json(&json!({
                "query": MINIMIZE_COMMENT,
                "variables": { "id": node_id },
            }))
            .send()
            .await?;
        let body: GraphQlResponse = check(response).await?.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(GitHubError::GraphQl(messages.join("; ")));
        }
        Ok(())
    }
}

/// Map a non-2xx response to [`GitHubError::Api`], preferring GitHub's
/// `message` field over the raw body.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text);
    Err(GitHubError::Api {
        status: status.as_u16(),
        message,
    })
}
