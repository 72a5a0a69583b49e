use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use docgate_core::error::{DocGateError, Result};
use docgate_core::Capability;

use crate::dispatch::{OperationCall, OperationOutput, OperationService, Route, SystemOp};
use crate::policy::PolicyEngine;
use crate::remote::DocumentClient;

/// Connection probes, permission introspection, schema and linked-document reads.
pub struct SystemService {
    policy: Arc<PolicyEngine>,
    client: DocumentClient,
}

impl SystemService {
    pub fn new(policy: Arc<PolicyEngine>, client: DocumentClient) -> Self {
        Self { policy, client }
    }

    fn to_value<T: serde::Serialize>(v: &T) -> Result<Value> {
        serde_json::to_value(v).map_err(|e| DocGateError::Internal(format!("serialize failed: {e}")))
    }
}

#[async_trait]
impl OperationService for SystemService {
    fn family(&self) -> &'static str {
        "system"
    }

    async fn handle(&self, call: OperationCall) -> Result<OperationOutput> {
        let Route::System(op) = call.route else {
            return Err(DocGateError::Internal(format!(
                "document operation routed to system service: {}",
                call.name
            )));
        };
        let args = &call.args;

        match op {
            SystemOp::TestConnection => {
                let connected = self.client.test_connection().await;
                let msg = if connected { "connected" } else { "failed" };
                Ok(OperationOutput::new(
                    format!("Remote connection: {msg}"),
                    json!({ "connected": connected }),
                ))
            }
            SystemOp::SystemInfo => {
                let info = self.client.system_info().await?;
                Ok(OperationOutput::new("Remote system info", info))
            }
            SystemOp::ListDoctypes => {
                let summaries: Vec<_> = self
                    .policy
                    .configured_doctypes()
                    .iter()
                    .map(|d| self.policy.doctype_summary(d))
                    .collect();
                Ok(OperationOutput::new(
                    format!("Configured doctypes: {}", summaries.len()),
                    Self::to_value(&summaries)?,
                ))
            }
            SystemOp::DoctypePermissions => {
                let doctype = args.require_str("doctype")?;
                let summary = self.policy.doctype_summary(doctype);
                Ok(OperationOutput::new(
                    format!("Permissions for {doctype}"),
                    Self::to_value(&summary)?,
                ))
            }
            SystemOp::DoctypeSchema => {
                let doctype = args.require_str("doctype")?;
                self.policy
                    .authorize(Capability::Read, doctype, None, None)
                    .into_result()?;
                let schema = self.client.meta(doctype).await?;
                Ok(OperationOutput::new(format!("Schema for {doctype}"), schema))
            }
            SystemOp::LinkedDocuments => {
                let doctype = args.require_str("doctype")?;
                let name = args.require_str("name")?;
                let link_doctype = args.require_str("link_doctype")?;
                self.policy
                    .authorize(Capability::Read, link_doctype, None, Some(name))
                    .into_result()?;

                let mut result = self.client.linked(doctype, name, link_doctype).await?;
                if let Some(data) = result.get_mut("data") {
                    let taken = std::mem::take(data);
                    *data = self.policy.filter_value(taken, link_doctype);
                }
                Ok(OperationOutput::new(
                    format!("{link_doctype} documents linked to {doctype} '{name}'"),
                    result,
                ))
            }
        }
    }
}
