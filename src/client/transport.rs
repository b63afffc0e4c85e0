//! # Transport
//!
//! The seam between the typed [`ApiClient`](super::ApiClient) and the network. Production
//! uses [`HttpTransport`] over `reqwest`; tests substitute an in-memory fake.

use crate::error::Error;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::fmt;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against the remote API, path relative to the gateway
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Zeroizing<String>,
    pub body: Option<Value>,
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("bearer", &"***")
            .field("body", &self.body)
            .finish()
    }
}

/// Raw response; status interpretation is left to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request; only connection-level failures are errors here
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, Error>;
}

/// `reqwest` transport against the API gateway
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.as_reqwest(), &url)
            .bearer_auth(request.bearer.as_str())
            .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            Error::transport(format!("{} {} failed: {e}", request.method, request.path))
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            Error::transport(format!(
                "reading response of {} {} failed: {e}",
                request.method, request.path
            ))
        })?;

        Ok(ApiResponse { status, body })
    }
}
