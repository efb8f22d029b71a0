//! Read-only GitHub REST client.

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::auth::CredentialResolver;
use crate::{Config, Error, Result};

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("copilot-webhook/", env!("CARGO_PKG_VERSION"));

/// Result of a lookup that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// HTTP 200 with a decoded body
    Found(T),
    /// Any other status. Absence, redirects and auth failures all land here.
    Miss { status: u16 },
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Miss { .. } => None,
        }
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /users/{name}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub login: String,
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub public_repos: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub followers: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub following: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
}

/// `GET /repos/{owner}/{name}` and search items.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepoRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stargazers_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub forks_count: u64,
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
}

/// `GET /search/repositories`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    #[serde(deserialize_with = "null_as_default")]
    pub total_count: u64,
    pub items: Option<Vec<RepoRecord>>,
}

/// Client for the three lookups the assistant supports.
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialResolver,
    permits: Semaphore,
    search_limit: u32,
}

impl GitHubClient {
    /// Create a new client with the configured timeout and concurrency limit.
    pub fn new(config: &Config, credentials: CredentialResolver) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            credentials,
            permits: Semaphore::new(config.max_concurrent_requests.max(1)),
            search_limit: config.search_limit,
        })
    }

    pub async fn fetch_user(&self, username: &str) -> Result<Lookup<UserRecord>> {
        let path = format!("/users/{}", urlencoding::encode(username));
        self.get(&path, &[]).await
    }

    pub async fn fetch_repo(&self, owner: &str, repo: &str) -> Result<Lookup<RepoRecord>> {
        let path = format!(
            "/repos/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        self.get(&path, &[]).await
    }

    /// Search repositories using the configured page size.
    pub async fn search_repos(&self, query: &str) -> Result<Lookup<SearchResults>> {
        self.search_repos_limited(query, self.search_limit).await
    }

    pub async fn search_repos_limited(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Lookup<SearchResults>> {
        let per_page = limit.to_string();
        self.get("/search/repositories", &[("q", query), ("per_page", &per_page)])
            .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Lookup<T>> {
        let url = format!("{}{}", self.base_url, path);

        let credential = self.credentials.resolve().await;
        if let Some(reason) = credential.failure() {
            warn!("Calling GitHub anonymously: {}", reason);
        }

        let mut request = self
            .http
            .get(&url)
            .header(ACCEPT, ACCEPT_V3)
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(authorization) = credential.authorization() {
            request = request.header(AUTHORIZATION, authorization);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Internal(format!("Outbound limiter closed: {}", e)))?;

        let response = request.send().await?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), "GitHub responded");

        if status != StatusCode::OK {
            return Ok(Lookup::Miss {
                status: status.as_u16(),
            });
        }

        // Body read failures are transport errors, undecodable bodies are not.
        let body = response.bytes().await?;
        Ok(Lookup::Found(serde_json::from_slice::<T>(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn client_for(base_url: &str, token: Option<&str>) -> GitHubClient {
        let config = Config {
            api_base_url: base_url.to_string(),
            token: token.map(String::from),
            request_timeout: Duration::from_secs(2),
            ..Config::default()
        };
        let credentials = CredentialResolver::new(&config, None);
        GitHubClient::new(&config, credentials).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_user_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/octocat")
            .match_header("accept", ACCEPT_V3)
            .match_header("authorization", "token ghp_test")
            .match_header("user-agent", Matcher::Regex("^copilot-webhook/".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"login":"octocat","name":"The Octocat","public_repos":8,"followers":9000,"following":9,"html_url":"https://github.com/octocat"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("ghp_test"));
        let user = client.fetch_user("octocat").await.unwrap().found().unwrap();

        assert_eq!(user.login, "octocat");
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
        assert_eq!(user.location, None);
        assert_eq!(user.followers, 9000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anonymous_calls_send_no_authorization() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/octocat")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"login":"octocat"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        assert!(client.fetch_user("octocat").await.unwrap().found().is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_is_a_miss() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/microsoft/nope")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/microsoft/moved")
            .with_status(301)
            .with_header("location", "/repos/microsoft/elsewhere")
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        assert_eq!(
            client.fetch_repo("microsoft", "nope").await.unwrap(),
            Lookup::Miss { status: 404 }
        );
        assert_eq!(
            client.fetch_repo("microsoft", "moved").await.unwrap(),
            Lookup::Miss { status: 301 }
        );
    }

    #[tokio::test]
    async fn test_search_sends_query_and_page_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "python web framework".into()),
                Matcher::UrlEncoded("per_page".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"total_count":1,"items":[{"full_name":"pallets/flask","stargazers_count":65000}]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let results = client
            .search_repos("python web framework")
            .await
            .unwrap()
            .found()
            .unwrap();

        let items = results.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].full_name, "pallets/flask");
        assert_eq!(items[0].description, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_path_segments_are_encoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/a%20b")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let lookup = client.fetch_user("a b").await.unwrap();
        assert_eq!(lookup, Lookup::Miss { status: 404 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let client = client_for("http://127.0.0.1:1", None);
        let result = client.fetch_user("octocat").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_serialization_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/octocat")
            .with_status(200)
            .with_body("<html>rate limited</html>")
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let result = client.fetch_user("octocat").await;
        assert!(matches!(result, Err(Error::Serialization(_))), "{:?}", result);
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let user: UserRecord = serde_json::from_str(
            r#"{"login":"octocat","name":null,"public_repos":null,"followers":3,"following":null,"html_url":null}"#,
        )
        .unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.public_repos, 0);
        assert_eq!(user.followers, 3);
        assert_eq!(user.html_url, "");

        let results: SearchResults = serde_json::from_str(
            r#"{"total_count":null,"items":[{"full_name":null,"stargazers_count":null,"forks_count":2,"html_url":null}]}"#,
        )
        .unwrap();
        let items = results.items.unwrap();
        assert_eq!(items[0].full_name, "");
        assert_eq!(items[0].stargazers_count, 0);
        assert_eq!(items[0].forks_count, 2);
    }

    #[test]
    fn test_partial_records_decode() {
        let repo: RepoRecord = serde_json::from_str(r#"{"full_name":"a/b","description":null}"#).unwrap();
        assert_eq!(repo.full_name, "a/b");
        assert_eq!(repo.stargazers_count, 0);
        assert_eq!(repo.updated_at, None);
    }
}
