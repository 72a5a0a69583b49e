//! Shared fixtures: an in-process transport and a baseline config.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docgate_gateway::app_state::AppState;
use docgate_gateway::config::{self, GatewayConfig};
use docgate_gateway::policy::MemoryAuditSink;
use docgate_gateway::remote::{RawResponse, RemoteRequest, Transport, TransportError};

/// Records every request; answers from a queue, then with a fixed default.
pub struct FakeTransport {
    calls: Mutex<Vec<RemoteRequest>>,
    queued: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    default_body: String,
}

impl FakeTransport {
    pub fn new(default_body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            queued: Mutex::new(VecDeque::new()),
            default_body: default_body.to_string(),
        })
    }

    pub fn push(&self, r: Result<RawResponse, TransportError>) {
        self.queued.lock().unwrap().push_back(r);
    }

    pub fn push_ok(&self, body: &str) {
        self.push(Ok(RawResponse {
            status: 200,
            body: body.to_string(),
        }));
    }

    pub fn calls(&self) -> Vec<RemoteRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &RemoteRequest) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        match self.queued.lock().unwrap().pop_front() {
            Some(r) => r,
            None => Ok(RawResponse {
                status: 200,
                body: self.default_body.clone(),
            }),
        }
    }
}

pub const BASE_CONFIG: &str = r#"
version: 1
remote:
  url: "https://erp.example.com"
  api_key: "key"
  api_secret: "secret"
rate_limiting:
  enabled: false
cache:
  enabled: true
  ttl_secs: 300
  max_size: 100
permissions:
  default:
    read: true
  doctypes:
    Item:
      read: true
      create: true
      update: true
      delete: false
      allowed_fields: [item_code, item_name, stock_uom, item_group, standard_rate]
      restricted_fields: [valuation_rate]
      conditions:
        create:
          item_group: ["Products", "Services"]
          standard_rate: { min: 0, max: 1000 }
        update:
          standard_rate: { max: 1000 }
    Customer:
      read: true
      delete: true
      restricted_fields: [credit_limit]
    Sales Invoice:
      read: false
"#;

pub fn base_config() -> GatewayConfig {
    config::load_from_str(BASE_CONFIG).expect("base config must parse")
}

pub struct Harness {
    pub state: AppState,
    pub transport: Arc<FakeTransport>,
    pub audit: Arc<MemoryAuditSink>,
}

pub fn harness(default_body: &str) -> Harness {
    harness_with(base_config(), default_body)
}

pub fn harness_with(cfg: GatewayConfig, default_body: &str) -> Harness {
    let transport = FakeTransport::new(default_body);
    let audit = Arc::new(MemoryAuditSink::new());
    let state = AppState::with_parts(cfg, transport.clone(), audit.clone()).expect("state");
    Harness {
        state,
        transport,
        audit,
    }
}
