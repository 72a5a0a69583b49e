//! Network seam for the request pipeline.
//!
//! The pipeline only sees [`Transport`]; production wires [`ReqwestTransport`],
//! tests substitute an in-process fake.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;

use docgate_core::error::{DocGateError, Result};

use crate::config::RemoteSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Only reads are eligible for caching.
    pub fn is_read(self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Path below the remote base URL, kept as raw segments so doctype and
/// document names are percent-encoded once, by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    /// `/api/resource/{doctype}`
    pub fn resource(doctype: &str) -> Self {
        Self {
            segments: vec!["api".into(), "resource".into(), doctype.into()],
        }
    }

    /// `/api/resource/{doctype}/{name}`
    pub fn document(doctype: &str, name: &str) -> Self {
        Self {
            segments: vec![
                "api".into(),
                "resource".into(),
                doctype.into(),
                name.into(),
            ],
        }
    }

    /// `/api/method/{method}`
    pub fn method(method: &str) -> Self {
        Self {
            segments: vec!["api".into(), "method".into(), method.into()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.segments {
            write!(f, "/{s}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
    /// Query parameters for GET, JSON body for POST/PUT, ignored for DELETE.
    pub payload: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RemoteRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// HTTP transport with token auth and a fixed overall timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl ReqwestTransport {
    pub fn new(remote: &RemoteSection) -> Result<Self> {
        let base = reqwest::Url::parse(remote.url.trim_end_matches('/'))
            .map_err(|e| DocGateError::Validation(format!("invalid remote.url: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(DocGateError::Validation(
                "remote.url cannot be used as a base url".into(),
            ));
        }

        let mut auth = HeaderValue::from_str(&format!(
            "token {}:{}",
            remote.api_key, remote.api_secret
        ))
        .map_err(|e| DocGateError::Validation(format!("invalid api credentials: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(remote.timeout_secs))
            .build()
            .map_err(|e| DocGateError::Internal(format!("http client build failed: {e}")))?;

        Ok(Self { client, base })
    }

    fn url_for(&self, endpoint: &Endpoint) -> std::result::Result<reqwest::Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Other("remote url cannot be a base".into()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }
}

/// Flatten a params object into query pairs; non-string values are sent as JSON.
fn query_pairs(params: &Value) -> Vec<(String, String)> {
    match params {
        Value::Object(m) => m
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RemoteRequest) -> std::result::Result<RawResponse, TransportError> {
        let url = self.url_for(&request.endpoint)?;
        let mut builder = self.client.request(request.method.into(), url);

        match (request.method, &request.payload) {
            (HttpMethod::Get, Some(p)) => builder = builder.query(&query_pairs(p)),
            (HttpMethod::Post | HttpMethod::Put, Some(p)) => builder = builder.json(p),
            _ => {}
        }

        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify)?;
        Ok(RawResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
