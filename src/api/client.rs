//! Authenticated HTTP client for the chat service REST API
//!
//! Wraps reqwest::Client with base URL handling and bearer token injection.

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::StoreError;

/// Client for the chat service. All paths are relative to `{server}/api/`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ChatClient {
    pub fn new(server_url: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: server_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Build from config, carrying the stored token if there is one.
    pub fn from_config(config: &Config) -> Self {
        let token = config.access_token.as_ref().map(|t| t.token.clone());
        Self::new(&config.server_url, token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// GET with bearer auth.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, StoreError> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let resp = self
            .authorized(self.http.get(&url))
            .header("Accept", "application/json")
            .send()
            .await?;

        check_response(resp, &url).await
    }

    /// POST a JSON body with bearer auth.
    pub async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, StoreError> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let resp = self.authorized(self.http.post(&url)).json(body).send().await?;

        check_response(resp, &url).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, StoreError> {
        let resp = self.post(path, body).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let resp = self.get(path).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Map HTTP status codes to a clear error.
async fn check_response(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        tracing::debug!("401 for {}", url);
        return Err(StoreError::Unauthorized);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        tracing::debug!("404 for {}", url);
        return Err(StoreError::NotFound);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}
