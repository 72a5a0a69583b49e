use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;

use docgate_core::error::{DocGateError, Result};
use docgate_core::ToolDescriptor;

use super::args::Args;
use super::registry::{Route, RouteEntry};

/// One resolved call handed to a service.
#[derive(Debug, Clone)]
pub struct OperationCall {
    pub name: String,
    pub route: Route,
    pub args: Args,
}

/// Successful operation result.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutput {
    pub message: String,
    pub data: Value,
}

impl OperationOutput {
    pub fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Services handle one route family each.
#[async_trait]
pub trait OperationService: Send + Sync {
    fn family(&self) -> &'static str;
    async fn handle(&self, call: OperationCall) -> Result<OperationOutput>;
}

/// Route registry and dispatcher.
#[derive(Default)]
pub struct Dispatcher {
    routes: DashMap<String, RouteEntry>,
    services: DashMap<&'static str, Arc<dyn OperationService>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
            services: DashMap::new(),
        }
    }

    pub fn register_service(&self, svc: Arc<dyn OperationService>) {
        self.services.insert(svc.family(), svc);
    }

    /// First registration wins; a clashing identifier is logged and ignored.
    pub fn register_route(&self, entry: RouteEntry) {
        match self.routes.entry(entry.name.clone()) {
            Entry::Occupied(e) => {
                tracing::warn!(operation = %e.key(), existing = ?e.get().route, ignored = ?entry.route, "duplicate operation identifier");
            }
            Entry::Vacant(v) => {
                v.insert(entry);
            }
        }
    }

    /// Listed identifiers, sorted.
    pub fn operations(&self) -> Vec<(String, Route)> {
        let mut out: Vec<(String, Route)> = self
            .routes
            .iter()
            .filter(|e| e.value().listed)
            .map(|e| (e.key().clone(), e.value().route.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Registered route, or the identifier parsed as `<kind>_<doctype>_<suffix>`.
    pub fn resolve(&self, name: &str) -> Result<Route> {
        if let Some(r) = self.routes.get(name) {
            return Ok(r.value().route.clone());
        }
        Ok(Route::Document(ToolDescriptor::parse(name)?))
    }

    pub async fn dispatch(&self, name: &str, args: Args) -> Result<OperationOutput> {
        let route = self.resolve(name)?;
        let family = route.family();
        let handler = self
            .services
            .get(family)
            .ok_or_else(|| DocGateError::Internal(format!("no service for {family} operations")))?
            .value()
            .clone();

        let result = handler
            .handle(OperationCall {
                name: name.to_string(),
                route,
                args,
            })
            .await;

        match &result {
            Ok(_) => tracing::debug!(operation = %name, "operation completed"),
            Err(e) if e.is_local() => {
                tracing::warn!(operation = %name, code = e.client_code().as_str(), error = %e, "operation rejected")
            }
            Err(e) => {
                tracing::error!(operation = %name, code = e.client_code().as_str(), error = %e, "operation failed")
            }
        }
        result
    }
}
