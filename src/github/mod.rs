pub mod link;
pub mod types;

pub use types::{Comment, Issue, ListOptions, Page, RepoId};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK, USER_AGENT};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid Link header: {0}")]
    InvalidLink(String),
}

/// Source of issue and comment pages.
/// Sources must be Send + Sync so per-issue tasks can share one.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch one page of issues.
    async fn list_issues(&self, opts: &ListOptions) -> Result<Page<Issue>, FetchError>;

    /// Fetch one page of comments of issue `number`.
    async fn list_comments(
        &self,
        number: u64,
        opts: &ListOptions,
    ) -> Result<Page<Comment>, FetchError>;
}

/// GitHub REST client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    repo: RepoId,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>, repo: RepoId) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        GitHubClient {
            http: reqwest::Client::new(),
            api_url,
            token: token.into(),
            repo,
        }
    }

    /// Client for jekyll/jekyll with the configured API base and token.
    /// An empty token is still sent; GitHub decides.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url(), config.github_token(), RepoId::jekyll())
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: &ListOptions,
    ) -> Result<Page<T>, FetchError> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, "issue-mirror")
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(&self.token)
            .query(&opts.query())
            .send()
            .await?
            .error_for_status()?;

        let next_page = match response.headers().get(LINK) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| FetchError::InvalidLink(format!("{value:?}")))?;
                link::parse_next_page(value)?
            }
            None => None,
        };

        let items = response.json::<Vec<T>>().await?;
        debug!(items = items.len(), ?next_page, "received page");
        Ok(Page::new(items, next_page))
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    #[instrument(skip(self, opts), fields(page = opts.page))]
    async fn list_issues(&self, opts: &ListOptions) -> Result<Page<Issue>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/issues",
            self.api_url, self.repo.owner, self.repo.repo
        );
        debug!(?opts, "client.Issues.ListByRepo");
        self.get_page(&url, opts).await
    }

    #[instrument(skip(self, opts), fields(page = opts.page))]
    async fn list_comments(
        &self,
        number: u64,
        opts: &ListOptions,
    ) -> Result<Page<Comment>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.repo.owner, self.repo.repo, number
        );
        debug!(?opts, "client.Issues.ListComments");
        self.get_page(&url, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: &str) -> GitHubClient {
        GitHubClient::new(server.uri(), token, RepoId::jekyll())
    }

    #[tokio::test]
    async fn test_list_issues_sends_filters_and_reads_next_page() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/repositories/1/issues?page=2&per_page=100>; rel=\"next\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/repos/jekyll/jekyll/issues"))
            .and(query_param("state", "open"))
            .and(query_param("sort", "created"))
            .and(query_param("direction", "asc"))
            .and(query_param("page", "0"))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_json(json!([
                        {"number": 1, "comments": 0, "title": "one"},
                        {"number": 2, "comments": 3, "title": "two"}
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, "secret");
        let page = client.list_issues(&ListOptions::open_issues()).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].number, 2);
        assert_eq!(page.items[1].comments, 3);
        assert_eq!(page.next_page, Some(2));
    }

    #[tokio::test]
    async fn test_list_comments_last_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/jekyll/jekyll/issues/7/comments"))
            .and(query_param("page", "3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 70, "body": "hi"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, "");
        let opts = ListOptions {
            page: 3,
            ..ListOptions::comments()
        };
        let page = client.list_comments(7, &opts).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 70);
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_error_status_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/jekyll/jekyll/issues"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, "bad");
        let result = client.list_issues(&ListOptions::open_issues()).await;
        assert!(matches!(result, Err(FetchError::ApiRequest(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
            .mount(&server)
            .await;

        let client = client_for(&server, "");
        let result = client.list_issues(&ListOptions::open_issues()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = GitHubClient::new("https://api.github.com/", "", RepoId::jekyll());
        assert_eq!(client.api_url, "https://api.github.com");
        assert_eq!(client.repo(), &RepoId::jekyll());
    }

    #[tokio::test]
    async fn test_missing_token_still_sends_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/jekyll/jekyll/issues"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            github: crate::config::GitHubConfig {
                token: None,
                api_url: Some(server.uri()),
            },
            ..Config::default()
        };
        let client = GitHubClient::from_config(&config);
        let result = client.list_issues(&ListOptions::open_issues()).await;
        assert!(matches!(result, Err(FetchError::ApiRequest(_))));
    }
}
