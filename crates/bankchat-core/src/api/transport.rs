//! HTTP transport seam.
//!
//! `BankingClient` builds `ApiRequest`s and hands them to a `Transport`.
//! `HttpTransport` is the reqwest-backed implementation; tests swap in a
//! recording double.

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use tracing::debug;

use super::ApiError;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Unencoded path segments, joined under the base URL
    pub segments: Vec<String>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(segments: &[&str]) -> Self {
        Self {
            method: Method::GET,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn post(segments: &[&str], body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    /// Human-readable path, for logs and error messages
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Sends one request and returns whatever status the server answered with.
///
/// Implementations report connection-level failures as `ApiError::Network`
/// and leave status interpretation to the caller.
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>>;
}

/// reqwest-backed transport bound to a single origin.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot hold a path: {}", base_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded segments to the base URL's path
    fn url_for(&self, segments: &[String]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("Base URL cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>> {
        async move {
            let path = request.path();
            let url = self.url_for(&request.segments)?;
            debug!(method = %request.method, path = %path, "Sending request");

            let mut builder = self
                .client
                .request(request.method.clone(), url)
                .headers(request.headers);
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Network(format!("{} {}: {}", request.method, path, e)))?;

            let status = response.status();
            let body = response.text().await?;
            debug!(status = %status, path = %path, "Received response");
            Ok(ApiResponse { status, body })
        }
        .boxed()
    }
}
