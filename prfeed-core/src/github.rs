use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::{GitHubConfig, RepositoryRef};
use crate::error::FetchError;

const USER_AGENT: &str = concat!("prfeed/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub merged_at: Option<String>,
    pub user: User,
    pub base: Base,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Base {
    pub repo: BaseRepo,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BaseRepo {
    pub name: String,
    pub owner: User,
}

/// Client for the closed-pulls listing endpoint.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    /// `token` is attached as a bearer credential when present; without one
    /// requests go out unauthenticated.
    pub fn new(
        api_base: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &GitHubConfig, token: Option<String>) -> Result<Self, FetchError> {
        Self::new(&config.api_url, token, config.request_timeout())
    }

    pub fn pulls_url(&self, repo: &RepositoryRef, max_prs: u32) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!(
            "{}/repos/{}/{}/pulls",
            self.api_base, repo.owner, repo.name
        ))?;
        url.query_pairs_mut()
            .append_pair("state", "closed")
            .append_pair("sort", "updated")
            .append_pair("direction", "desc")
            .append_pair("per_page", &max_prs.to_string());
        Ok(url)
    }

    /// Fetches the `max_prs` most recently updated closed pull requests of
    /// `repo` and keeps only the merged ones.
    pub async fn fetch_merged(
        &self,
        repo: &RepositoryRef,
        max_prs: u32,
    ) -> Result<Vec<PullRequest>, FetchError> {
        let url = self.pulls_url(repo, max_prs)?;
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let pulls: Vec<PullRequest> = serde_json::from_slice(&bytes)?;
        let total = pulls.len();
        let merged = retain_merged(pulls);
        debug!(
            repository = %repo.full_name(),
            closed = total,
            merged = merged.len(),
            "fetched closed pull requests"
        );
        Ok(merged)
    }
}

/// Drops closed-but-unmerged pull requests.
pub fn retain_merged(pulls: Vec<PullRequest>) -> Vec<PullRequest> {
    pulls
        .into_iter()
        .filter(|pr| pr.merged_at.is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryRef {
        RepositoryRef {
            owner: "acme".into(),
            name: "widget".into(),
            description: String::new(),
        }
    }

    #[test]
    fn pulls_url_has_listing_query() {
        let client =
            GitHubClient::new("https://api.github.com/", None, Duration::from_secs(30)).unwrap();
        let url = client.pulls_url(&repo(), 15).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/widget/pulls?state=closed&sort=updated&direction=desc&per_page=15"
        );
    }

    #[test]
    fn deserializes_api_payload_and_drops_unmerged() {
        let body = r#"[
            {"number": 2, "title": "Add thing", "html_url": "https://github.com/acme/widget/pull/2",
             "merged_at": "2024-10-21T08:00:00Z", "state": "closed",
             "user": {"login": "alice", "id": 1},
             "base": {"ref": "main", "repo": {"name": "widget", "owner": {"login": "acme"}}}},
            {"number": 1, "title": "Abandoned", "html_url": "https://github.com/acme/widget/pull/1",
             "merged_at": null,
             "user": {"login": "bob"},
             "base": {"repo": {"name": "widget", "owner": {"login": "acme"}}}}
        ]"#;
        let pulls: Vec<PullRequest> = serde_json::from_str(body).unwrap();
        assert_eq!(pulls.len(), 2);
        assert_eq!(pulls[0].base.repo.owner.login, "acme");

        let merged = retain_merged(pulls);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].number, 2);
        assert!(merged.iter().all(|pr| pr.merged_at.is_some()));
    }

    #[test]
    fn empty_token_is_treated_as_absent() {
        let client =
            GitHubClient::new("https://api.github.com", Some(String::new()), Duration::from_secs(1))
                .unwrap();
        assert!(client.token.is_none());
    }
}
