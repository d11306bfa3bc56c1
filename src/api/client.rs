//! VK API client
//!
//! Every method call goes through [`VkApi::call`], which attaches the access
//! token and API version, unwraps the `response` envelope and turns `error`
//! envelopes into [`Error::Api`]. VK reports quota overruns as API error 6
//! inside an HTTP 200, so those are retried here rather than by the
//! transport.

use super::execute::{RawBatch, WallScript};
use crate::engine::{BatchSource, LookupSource, PageSource, PagedResource};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{BatchPage, Page};
use crate::types::{Group, JsonValue, OwnerId, User};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Public VK API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.vk.com/method";

/// API version sent with every call
pub const DEFAULT_API_VERSION: &str = "5.131";

/// Paged collection envelope (`count` + `items`)
#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default)]
    count: u64,
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// Profile of the token owner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub screen_name: Option<String>,
}

/// Client for the VK method API
pub struct VkApi {
    http: HttpClient,
    access_token: String,
    version: String,
    script: WallScript,
}

impl VkApi {
    /// Create a client over `http`, which must carry the API base URL
    pub fn new(http: HttpClient, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            version: DEFAULT_API_VERSION.to_string(),
            script: WallScript::default(),
        }
    }

    /// Override the API version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Override the fields collected by batch walks
    #[must_use]
    pub fn with_script(mut self, script: WallScript) -> Self {
        self.script = script;
        self
    }

    /// API version in use
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Call `method` with query parameters
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut request = RequestConfig::new()
            .query("access_token", &self.access_token)
            .query("v", &self.version);
        for (key, value) in params {
            request = request.query(*key, value);
        }
        self.dispatch(Method::GET, method, request).await
    }

    /// Call `method` with a form body
    pub async fn call_form<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut request = RequestConfig::new()
            .form("access_token", &self.access_token)
            .form("v", &self.version);
        for (key, value) in params {
            request = request.form(*key, value);
        }
        self.dispatch(Method::POST, method, request).await
    }

    /// Check that the access token is accepted
    pub async fn verify(&self) -> Result<Profile> {
        let profile: Profile = self.call("account.getProfileInfo", &[]).await?;
        debug!(
            "authorized as {} {}",
            profile.first_name, profile.last_name
        );
        Ok(profile)
    }

    /// Send one call, retrying VK quota and internal errors with backoff
    async fn dispatch<T: DeserializeOwned>(
        &self,
        verb: Method,
        method: &str,
        request: RequestConfig,
    ) -> Result<T> {
        let max_retries = self.http.config().max_retries;
        let mut attempt = 0;

        loop {
            let body: JsonValue = self
                .http
                .request_json(verb.clone(), method, request.clone())
                .await?;

            match unwrap_envelope(method, body) {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = self.http.calculate_backoff(attempt);
                    warn!(
                        "{e}, attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl std::fmt::Debug for VkApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VkApi")
            .field("http", &self.http)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Extract `response`, or convert `error` into [`Error::Api`]
fn unwrap_envelope<T: DeserializeOwned>(method: &str, mut body: JsonValue) -> Result<T> {
    if let Some(error) = body.get_mut("error").map(JsonValue::take) {
        let error: ApiError = serde_json::from_value(error)
            .map_err(|e| Error::unexpected(method, format!("unreadable error envelope: {e}")))?;
        return Err(Error::api(method, error.error_code, error.error_msg));
    }

    let response = body
        .get_mut("response")
        .map(JsonValue::take)
        .ok_or_else(|| Error::unexpected(method, "no 'response' in envelope"))?;

    serde_json::from_value(response).map_err(|e| Error::unexpected(method, e.to_string()))
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl<R> PageSource<R> for VkApi
where
    R: PagedResource + 'static,
{
    async fn fetch_page(&self, resource: &R, offset: u64, count: u64) -> Result<Page<R::Record>> {
        let mut params = resource.params();
        params.push(("offset", offset.to_string()));
        params.push(("count", count.to_string()));

        let page: Items<R::Record> = self.call(resource.method(), &params).await?;
        Ok(Page::new(page.count, page.items))
    }
}

#[async_trait]
impl BatchSource for VkApi {
    async fn fetch_batch(&self, owner: OwnerId, offset: u64) -> Result<BatchPage> {
        let params = [
            ("code", self.script.code()),
            ("ownerId", owner.to_string()),
            ("offset", offset.to_string()),
        ];
        let response: JsonValue = self.call_form("execute", &params).await?;
        RawBatch::from_value(response)?.into_batch_page(self.script)
    }
}

#[async_trait]
impl LookupSource for VkApi {
    async fn groups_by_id(&self, ids: &[i64]) -> Result<Vec<Group>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| OwnerId::community(*id).entity_id()).collect();
        self.call("groups.getById", &[("group_ids", join_ids(&ids))])
            .await
    }

    async fn users_by_id(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.call(
            "users.get",
            &[("user_ids", join_ids(ids)), ("fields", "domain".to_string())],
        )
        .await
    }
}
