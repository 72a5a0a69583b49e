//! Shared application state for the docgate gateway.
//!
//! Wires the policy engine, the remote pipeline (one limiter and one cache per
//! remote endpoint), and the dispatcher with its built-in services.
//! Startup errors are returned, never panicked on.

use std::sync::Arc;
use std::time::Duration;

use docgate_core::error::Result;

use crate::config::{AuditSinkKind, GatewayConfig};
use crate::dispatch::{build_routes, Args, Dispatcher, OperationOutput};
use crate::policy::{AuditSink, JsonLinesAuditSink, NoopAuditSink, PolicyEngine, TracingAuditSink};
use crate::remote::{
    DocumentClient, RateLimiter, ReqwestTransport, RequestPipeline, ResponseCache, Transport,
};
use crate::services::{DocumentService, SystemService};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    policy: Arc<PolicyEngine>,
    client: DocumentClient,
    dispatcher: Arc<Dispatcher>,
}

struct AppStateInner {
    cfg: GatewayConfig,
}

impl AppState {
    /// Build application state against the configured remote over HTTP.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&cfg.remote)?);
        let audit = audit_sink_from_config(&cfg)?;
        Self::with_parts(cfg, transport, audit)
    }

    /// Build application state with an explicit transport and audit sink.
    pub fn with_parts(
        cfg: GatewayConfig,
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        // 1) Compile policy
        let policy = Arc::new(PolicyEngine::new(
            &cfg.permissions,
            audit,
            cfg.audit.enabled,
        )?);

        // 2) Remote pipeline
        let limiter = cfg.rate_limiting.enabled.then(|| {
            Arc::new(RateLimiter::new(
                cfg.rate_limiting.requests_per_minute,
                cfg.rate_limiting.requests_per_hour,
            ))
        });
        let cache = cfg.cache.enabled.then(|| {
            Arc::new(ResponseCache::new(
                Duration::from_secs(cfg.cache.ttl_secs),
                cfg.cache.max_size,
            ))
        });
        let client = DocumentClient::new(RequestPipeline::new(transport, limiter, cache));

        // 3) Dispatcher + built-in services
        let dispatcher = Dispatcher::new();
        dispatcher.register_service(Arc::new(DocumentService::new(
            Arc::clone(&policy),
            client.clone(),
        )));
        dispatcher.register_service(Arc::new(SystemService::new(
            Arc::clone(&policy),
            client.clone(),
        )));
        for entry in build_routes(&policy) {
            dispatcher.register_route(entry);
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            policy,
            client,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn policy(&self) -> Arc<PolicyEngine> {
        Arc::clone(&self.policy)
    }

    pub fn client(&self) -> &DocumentClient {
        &self.client
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub async fn call(&self, operation: &str, args: Args) -> Result<OperationOutput> {
        self.dispatcher.dispatch(operation, args).await
    }
}

fn audit_sink_from_config(cfg: &GatewayConfig) -> Result<Arc<dyn AuditSink>> {
    if !cfg.audit.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    Ok(match cfg.audit.sink {
        AuditSinkKind::Tracing => Arc::new(TracingAuditSink),
        AuditSinkKind::File => Arc::new(JsonLinesAuditSink::open(&cfg.audit.log_file)?),
    })
}
