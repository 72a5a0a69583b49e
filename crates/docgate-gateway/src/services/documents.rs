use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use docgate_core::error::{DocGateError, Result};
use docgate_core::{Capability, OperationKind};

use crate::dispatch::{Args, OperationCall, OperationOutput, OperationService, Route};
use crate::policy::PolicyEngine;
use crate::remote::DocumentClient;

const LIST_LIMIT: (u32, u32, u32) = (20, 1, 100);
const SEARCH_LIMIT: (u32, u32, u32) = (10, 1, 50);

/// list/get/search/create/update/delete on one doctype.
///
/// Required arguments are checked first, then the policy engine, and only
/// then is the remote called.
pub struct DocumentService {
    policy: Arc<PolicyEngine>,
    client: DocumentClient,
}

impl DocumentService {
    pub fn new(policy: Arc<PolicyEngine>, client: DocumentClient) -> Self {
        Self { policy, client }
    }

    async fn list(&self, doctype: &str, args: &Args) -> Result<OperationOutput> {
        let filters = args.get("filters").filter(|f| !f.is_null()).cloned();
        let limit = args.limit("limit", LIST_LIMIT.0, LIST_LIMIT.1, LIST_LIMIT.2);

        self.policy
            .authorize(Capability::Read, doctype, None, None)
            .into_result()?;

        // Projection is narrowed before the read so hidden fields are never requested.
        let fields = args.string_list("fields").map(|fields| {
            fields
                .into_iter()
                .filter(|f| self.policy.check_field_permission(doctype, f))
                .collect::<Vec<_>>()
        });

        let mut result = self
            .client
            .list(doctype, filters.as_ref(), fields.as_deref(), limit)
            .await?;
        self.filter_data(&mut result, doctype);

        let count = result
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        Ok(OperationOutput::new(
            format!("Found {count} {doctype} documents"),
            result,
        ))
    }

    async fn get(&self, doctype: &str, args: &Args) -> Result<OperationOutput> {
        let name = args.require_str("name")?;

        self.policy
            .authorize(Capability::Read, doctype, None, Some(name))
            .into_result()?;

        let mut result = self.client.get(doctype, name).await?;
        self.filter_data(&mut result, doctype);
        Ok(OperationOutput::new(
            format!("{doctype} document '{name}'"),
            result,
        ))
    }

    async fn search(&self, doctype: &str, args: &Args) -> Result<OperationOutput> {
        let term = args.require_str("search_term")?;
        let limit = args.limit("limit", SEARCH_LIMIT.0, SEARCH_LIMIT.1, SEARCH_LIMIT.2);

        self.policy
            .authorize(Capability::Read, doctype, None, None)
            .into_result()?;

        let mut result = self.client.search(doctype, term, limit).await?;
        self.filter_data(&mut result, doctype);
        Ok(OperationOutput::new(
            format!("Search results for '{term}' in {doctype}"),
            result,
        ))
    }

    async fn create(&self, doctype: &str, args: &Args) -> Result<OperationOutput> {
        let data = args.require_object("data")?;

        self.policy
            .authorize(Capability::Create, doctype, Some(data), None)
            .into_result()?;

        let filtered = self.policy.filter_fields(data, doctype);
        let result = self.client.create(doctype, filtered).await?;
        Ok(OperationOutput::new(
            format!("{doctype} document created successfully"),
            result,
        ))
    }

    async fn update(&self, doctype: &str, args: &Args) -> Result<OperationOutput> {
        let name = args.require_str("name")?;
        let data = args.require_object("data")?;

        self.policy
            .authorize(Capability::Update, doctype, Some(data), Some(name))
            .into_result()?;

        let filtered = self.policy.filter_fields(data, doctype);
        let result = self.client.update(doctype, name, filtered).await?;
        Ok(OperationOutput::new(
            format!("{doctype} document '{name}' updated successfully"),
            result,
        ))
    }

    async fn delete(&self, doctype: &str, args: &Args) -> Result<OperationOutput> {
        let name = args.str("name");
        let (Some(name), true) = (name, args.truthy("confirm")) else {
            return Err(DocGateError::Validation(
                "Document name and confirmation required for deletion".into(),
            ));
        };

        self.policy
            .authorize(Capability::Delete, doctype, None, Some(name))
            .into_result()?;

        let result = self.client.delete(doctype, name).await?;
        Ok(OperationOutput::new(
            format!("{doctype} document '{name}' deleted successfully"),
            result,
        ))
    }

    /// Field-filter the `data` member of a read result in place.
    fn filter_data(&self, result: &mut Value, doctype: &str) {
        if let Some(data) = result.get_mut("data") {
            let taken = std::mem::take(data);
            *data = self.policy.filter_value(taken, doctype);
        }
    }
}

#[async_trait]
impl OperationService for DocumentService {
    fn family(&self) -> &'static str {
        "documents"
    }

    async fn handle(&self, call: OperationCall) -> Result<OperationOutput> {
        let (kind, doctype) = match &call.route {
            Route::Document(d) => (d.kind, d.doctype.clone()),
            Route::Generic(kind) => (*kind, call.args.require_str("doctype")?.to_string()),
            Route::System(_) => {
                return Err(DocGateError::Internal(format!(
                    "system operation routed to document service: {}",
                    call.name
                )))
            }
        };

        let args = &call.args;
        match kind {
            OperationKind::List => self.list(&doctype, args).await,
            OperationKind::Get => self.get(&doctype, args).await,
            OperationKind::Search => self.search(&doctype, args).await,
            OperationKind::Create => self.create(&doctype, args).await,
            OperationKind::Update => self.update(&doctype, args).await,
            OperationKind::Delete => self.delete(&doctype, args).await,
        }
    }
}
