//! Request pipeline: rate limit -> cache lookup -> network -> cache store.
//!
//! Every failure leaving this module is either `Remote` (non-2xx, with status
//! and body) or `RequestFailed` (transport or decode). No retries happen here.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use docgate_core::error::{DocGateError, Result};

use super::cache::{cache_key, ResponseCache};
use super::limiter::RateLimiter;
use super::transport::{Endpoint, HttpMethod, RemoteRequest, Transport};

/// One pipeline per remote endpoint; it owns that endpoint's limiter and cache.
#[derive(Clone)]
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    limiter: Option<Arc<RateLimiter>>,
    cache: Option<Arc<ResponseCache>>,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Option<Arc<RateLimiter>>,
        cache: Option<Arc<ResponseCache>>,
    ) -> Self {
        Self {
            transport,
            limiter,
            cache,
        }
    }

    /// Execute one remote call. `use_cache` only has an effect for reads.
    pub async fn execute(
        &self,
        method: HttpMethod,
        endpoint: Endpoint,
        payload: Option<Value>,
        use_cache: bool,
    ) -> Result<Value> {
        if let Some(lim) = &self.limiter {
            lim.acquire().await;
        }

        let start = Instant::now();
        let path = endpoint.to_string();
        let cache = self.cache.as_ref().filter(|_| use_cache && method.is_read());
        let key = cache.map(|_| cache_key(method, &path, payload.as_ref()));

        if let (Some(c), Some(k)) = (cache, &key) {
            if let Some(hit) = c.get(k) {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                tracing::debug!(%method, endpoint = %path, elapsed_ms, "cache hit");
                return Ok(hit);
            }
        }

        let request = RemoteRequest {
            method,
            endpoint,
            payload,
        };

        let resp = match self.transport.send(&request).await {
            Ok(r) => r,
            Err(e) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                tracing::error!(%method, endpoint = %path, elapsed_ms, error = %e, "request failed");
                return Err(DocGateError::RequestFailed(e.to_string()));
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !resp.is_success() {
            tracing::error!(
                %method,
                endpoint = %path,
                status = resp.status,
                elapsed_ms,
                body = %resp.body,
                "remote returned error status"
            );
            return Err(DocGateError::Remote {
                status: resp.status,
                body: resp.body,
            });
        }

        let value: Value = if resp.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&resp.body).map_err(|e| {
                tracing::error!(%method, endpoint = %path, status = resp.status, elapsed_ms, error = %e, "malformed response body");
                DocGateError::RequestFailed(format!("malformed response body: {e}"))
            })?
        };

        if let (Some(c), Some(k)) = (cache, key) {
            c.set(k, value.clone());
        }

        tracing::info!(%method, endpoint = %path, status = resp.status, elapsed_ms, "remote call");
        Ok(value)
    }
}
