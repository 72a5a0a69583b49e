//! Document-level operations on top of the request pipeline.

use serde_json::{json, Map, Value};

use docgate_core::error::Result;
use docgate_core::operation::snake_case;

use super::pipeline::RequestPipeline;
use super::transport::{Endpoint, HttpMethod};

const LOGGED_USER_METHOD: &str = "frappe.auth.get_logged_user";
const SYSTEM_INFO_METHOD: &str = "frappe.utils.get_system_info";
const LINKED_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct DocumentClient {
    pipeline: RequestPipeline,
}

impl DocumentClient {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn list(
        &self,
        doctype: &str,
        filters: Option<&Value>,
        fields: Option<&[String]>,
        limit: u32,
    ) -> Result<Value> {
        let mut params = Map::new();
        params.insert("limit_page_length".into(), json!(limit));
        if let Some(f) = filters {
            params.insert("filters".into(), f.clone());
        }
        if let Some(f) = fields.filter(|f| !f.is_empty()) {
            params.insert("fields".into(), json!(f));
        }
        self.pipeline
            .execute(
                HttpMethod::Get,
                Endpoint::resource(doctype),
                Some(Value::Object(params)),
                true,
            )
            .await
    }

    pub async fn get(&self, doctype: &str, name: &str) -> Result<Value> {
        self.pipeline
            .execute(HttpMethod::Get, Endpoint::document(doctype, name), None, true)
            .await
    }

    pub async fn create(&self, doctype: &str, data: Map<String, Value>) -> Result<Value> {
        self.pipeline
            .execute(
                HttpMethod::Post,
                Endpoint::resource(doctype),
                Some(Value::Object(data)),
                false,
            )
            .await
    }

    pub async fn update(&self, doctype: &str, name: &str, data: Map<String, Value>) -> Result<Value> {
        self.pipeline
            .execute(
                HttpMethod::Put,
                Endpoint::document(doctype, name),
                Some(Value::Object(data)),
                false,
            )
            .await
    }

    pub async fn delete(&self, doctype: &str, name: &str) -> Result<Value> {
        self.pipeline
            .execute(HttpMethod::Delete, Endpoint::document(doctype, name), None, false)
            .await
    }

    /// The DocType record describing `doctype`'s fields.
    pub async fn meta(&self, doctype: &str) -> Result<Value> {
        self.get("DocType", doctype).await
    }

    /// Documents whose name contains `term`.
    pub async fn search(&self, doctype: &str, term: &str, limit: u32) -> Result<Value> {
        let filters = json!([["name", "like", format!("%{term}%")]]);
        self.pipeline
            .execute(
                HttpMethod::Get,
                Endpoint::resource(doctype),
                Some(json!({ "limit_page_length": limit, "filters": filters })),
                true,
            )
            .await
    }

    /// Documents of `link_doctype` pointing at `doctype`/`name` through the
    /// snake-cased link field.
    pub async fn linked(&self, doctype: &str, name: &str, link_doctype: &str) -> Result<Value> {
        let mut filters = Map::new();
        filters.insert(snake_case(doctype), Value::String(name.to_string()));
        self.pipeline
            .execute(
                HttpMethod::Get,
                Endpoint::resource(link_doctype),
                Some(json!({ "limit_page_length": LINKED_LIMIT, "filters": filters })),
                true,
            )
            .await
    }

    /// Authenticated probe; any failure reads as "not connected".
    pub async fn test_connection(&self) -> bool {
        self.pipeline
            .execute(HttpMethod::Get, Endpoint::method(LOGGED_USER_METHOD), None, false)
            .await
            .is_ok()
    }

    pub async fn system_info(&self) -> Result<Value> {
        self.pipeline
            .execute(HttpMethod::Get, Endpoint::method(SYSTEM_INFO_METHOD), None, false)
            .await
    }
}
