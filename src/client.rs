//! Upstream client: build the request URL, call the Rick and Morty API, classify the outcome.

use crate::error::{ProxyError, ProxyResult};
use crate::resource::{Resource, ResourceQuery};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

/// Public Rick and Morty API root.
pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

#[derive(Debug, Clone)]
pub struct RickMortyClient {
    http: Client,
    base_url: String,
}

impl RickMortyClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// `GET {base}/{resource}` with optional page and filters.
    pub async fn list_resource(
        &self,
        resource: Resource,
        query: &ResourceQuery,
    ) -> ProxyResult<Value> {
        let url = self.list_url(resource, query)?;
        self.fetch(url).await
    }

    /// `GET {base}/{resource}/{id}`.
    pub async fn get_resource(&self, resource: Resource, id: u64) -> ProxyResult<Value> {
        let url = self.item_url(resource, &id.to_string())?;
        self.fetch(url).await
    }

    /// `GET {base}/{resource}/{id1,id2,...}`, ids kept in the given order.
    pub async fn get_multiple_resources(
        &self,
        resource: Resource,
        ids: &[i64],
    ) -> ProxyResult<Value> {
        let url = self.multiple_url(resource, ids)?;
        self.fetch(url).await
    }

    pub async fn get_characters(&self, query: &ResourceQuery) -> ProxyResult<Value> {
        self.list_resource(Resource::Character, query).await
    }

    pub async fn get_character(&self, id: u64) -> ProxyResult<Value> {
        self.get_resource(Resource::Character, id).await
    }

    pub async fn get_multiple_characters(&self, ids: &[i64]) -> ProxyResult<Value> {
        self.get_multiple_resources(Resource::Character, ids).await
    }

    pub async fn get_locations(&self, query: &ResourceQuery) -> ProxyResult<Value> {
        self.list_resource(Resource::Location, query).await
    }

    pub async fn get_location(&self, id: u64) -> ProxyResult<Value> {
        self.get_resource(Resource::Location, id).await
    }

    pub async fn get_multiple_locations(&self, ids: &[i64]) -> ProxyResult<Value> {
        self.get_multiple_resources(Resource::Location, ids).await
    }

    pub async fn get_episodes(&self, query: &ResourceQuery) -> ProxyResult<Value> {
        self.list_resource(Resource::Episode, query).await
    }

    pub async fn get_episode(&self, id: u64) -> ProxyResult<Value> {
        self.get_resource(Resource::Episode, id).await
    }

    pub async fn get_multiple_episodes(&self, ids: &[i64]) -> ProxyResult<Value> {
        self.get_multiple_resources(Resource::Episode, ids).await
    }

    pub fn list_url(&self, resource: Resource, query: &ResourceQuery) -> ProxyResult<Url> {
        let mut url = self.parse(&format!("{}/{}", self.base_url, resource.upstream_path()))?;
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub fn multiple_url(&self, resource: Resource, ids: &[i64]) -> ProxyResult<Url> {
        let joined = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.item_url(resource, &joined)
    }

    fn item_url(&self, resource: Resource, suffix: &str) -> ProxyResult<Url> {
        self.parse(&format!(
            "{}/{}/{}",
            self.base_url,
            resource.upstream_path(),
            suffix
        ))
    }

    fn parse(&self, raw: &str) -> ProxyResult<Url> {
        Url::parse(raw).map_err(|e| ProxyError::Config(format!("invalid upstream URL {raw}: {e}")))
    }

    async fn fetch(&self, url: Url) -> ProxyResult<Value> {
        tracing::debug!("Upstream request GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| {
                tracing::error!("Upstream unreachable ({}): {}", url, source);
                ProxyError::UpstreamUnavailable {
                    url: url.to_string(),
                    source,
                }
            })?;

        let response = require_success(response)?;
        let body = response.bytes().await.map_err(|source| ProxyError::UpstreamUnavailable {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("Malformed upstream payload from {}: {}", url, e);
            ProxyError::Upstream {
                status: None,
                message: format!("upstream API returned a malformed payload: {e}"),
            }
        })
    }
}

/// Classify a received response: 404 is not-found, other non-2xx is an upstream error.
fn require_success(response: reqwest::Response) -> ProxyResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        tracing::debug!("Upstream 404 for {}", response.url());
        return Err(ProxyError::not_found("Resource not found"));
    }
    tracing::warn!("Upstream error ({}) for {}", status, response.url());
    Err(ProxyError::Upstream {
        status: Some(status.as_u16()),
        message: format!("upstream API returned status code {}", status.as_u16()),
    })
}
