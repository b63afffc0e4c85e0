use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::{ApiError, Error};
use crate::observability::metrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Typed Aruba Cloud API client bound to one tenant's bearer token
///
/// Non-2xx answers become [`ApiError`]s built from the response body so the classifier can
/// see the status code and the invalid-status marker.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Zeroizing<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, token: impl Into<String>) -> Self {
        Self {
            transport,
            token: Zeroizing::new(token.into()),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let body = self.send(Method::Get, path, None).await?;
        decode(Method::Get, path, &body)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .send(Method::Post, path, Some(serde_json::to_value(body)?))
            .await?;
        decode(Method::Post, path, &body)
    }

    /// POST whose response body is ignored
    pub async fn post_no_content<B>(&self, path: &str, body: &B) -> Result<(), Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send(Method::Post, path, Some(serde_json::to_value(body)?))
            .await
            .map(drop)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .send(Method::Put, path, Some(serde_json::to_value(body)?))
            .await?;
        decode(Method::Put, path, &body)
    }

    /// PUT whose response body is ignored
    pub async fn put_no_content<B>(&self, path: &str, body: &B) -> Result<(), Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send(Method::Put, path, Some(serde_json::to_value(body)?))
            .await
            .map(drop)
    }

    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.send(Method::Delete, path, None).await.map(drop)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, Error> {
        debug!(method = %method, path = path, "api.request");
        let start = Instant::now();
        let result = self
            .transport
            .execute(ApiRequest {
                method,
                path: path.to_string(),
                bearer: self.token.clone(),
                body,
            })
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        let ApiResponse { status, body } = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_api_request(method.as_str(), "error", elapsed);
                warn!(method = %method, path = path, error = %e, "api.request.failed");
                return Err(e);
            }
        };
        metrics::record_api_request(method.as_str(), status_class(status), elapsed);

        if (200..300).contains(&status) {
            return Ok(body);
        }

        let err = ApiError::from_body(status, &body);
        debug!(
            method = %method,
            path = path,
            status = status,
            invalid_status = err.is_invalid_status(),
            "api.request.rejected"
        );
        Err(err.into())
    }
}

fn decode<T: DeserializeOwned>(method: Method, path: &str, body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        Error::transport(format!("decoding response of {method} {path} failed: {e}"))
    })
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
