use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use docgate_core::error::{DocGateError, Result};
use docgate_core::Capability;

use crate::config::schema::{DoctypePermissionPolicy, FieldRules, PermissionsSection};

use super::audit::{AuditRecord, AuditSink};
use super::conditions::check_conditions;

const ALLOWED_REASON: &str = "Operation allowed";

/// Decision from policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny { reason: String },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }

    pub fn reason(&self) -> &str {
        match self {
            PolicyDecision::Allow => ALLOWED_REASON,
            PolicyDecision::Deny { reason } => reason,
        }
    }

    /// `Deny` becomes `PolicyDenied`.
    pub fn into_result(self) -> Result<()> {
        match self {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny { reason } => Err(DocGateError::PolicyDenied(reason)),
        }
    }
}

/// Compiled per-doctype policy.
#[derive(Debug)]
struct DoctypePolicy {
    raw: DoctypePermissionPolicy,
    allowed: HashSet<String>,
    restricted: HashSet<String>,
    conditions: HashMap<Capability, FieldRules>,
}

impl DoctypePolicy {
    fn compile(raw: &DoctypePermissionPolicy, doctype: &str) -> Result<Self> {
        let mut conditions = HashMap::new();
        for (op, rules) in &raw.conditions {
            let cap = Capability::parse(op).ok_or_else(|| {
                DocGateError::Validation(format!(
                    "permissions.{doctype}.conditions: unknown operation '{op}'"
                ))
            })?;
            conditions.insert(cap, rules.clone());
        }
        Ok(Self {
            raw: raw.clone(),
            allowed: raw.allowed_fields.iter().cloned().collect(),
            restricted: raw.restricted_fields.iter().cloned().collect(),
            conditions,
        })
    }

    fn can(&self, cap: Capability) -> bool {
        match cap {
            Capability::Read => self.raw.read,
            Capability::Create => self.raw.create,
            Capability::Update => self.raw.update,
            Capability::Delete => self.raw.delete,
        }
    }

    fn field_permitted(&self, field: &str) -> bool {
        if self.restricted.contains(field) {
            return false;
        }
        self.allowed.is_empty() || self.allowed.contains(field)
    }
}

/// Snapshot of what a doctype permits.
#[derive(Debug, Clone, Serialize)]
pub struct DoctypeSummary {
    pub doctype: String,
    pub operations: Vec<Capability>,
    pub allowed_fields: Vec<String>,
    pub restricted_fields: Vec<String>,
    pub conditions: BTreeMap<String, FieldRules>,
    pub field_count: usize,
}

/// Full permission configuration as seen by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionsExport {
    pub timestamp: DateTime<Utc>,
    pub permissions: PermissionsSection,
    pub audit_enabled: bool,
    pub configured_doctypes: Vec<String>,
}

/// Doctype-scoped permission runtime.
/// Construct once at startup, then share via Arc.
pub struct PolicyEngine {
    permissions: PermissionsSection,
    default: DoctypePolicy,
    doctypes: BTreeMap<String, DoctypePolicy>,
    audit: Arc<dyn AuditSink>,
    audit_enabled: bool,
}

impl PolicyEngine {
    pub fn new(
        permissions: &PermissionsSection,
        audit: Arc<dyn AuditSink>,
        audit_enabled: bool,
    ) -> Result<Self> {
        let default = DoctypePolicy::compile(&permissions.default, "default")?;
        let mut doctypes = BTreeMap::new();
        for (name, raw) in &permissions.doctypes {
            doctypes.insert(name.clone(), DoctypePolicy::compile(raw, name)?);
        }
        Ok(Self {
            permissions: permissions.clone(),
            default,
            doctypes,
            audit,
            audit_enabled,
        })
    }

    /// Configured policy, or the default one for unconfigured doctypes.
    fn policy(&self, doctype: &str) -> &DoctypePolicy {
        self.doctypes.get(doctype).unwrap_or(&self.default)
    }

    pub fn can(&self, cap: Capability, doctype: &str) -> bool {
        self.policy(doctype).can(cap)
    }

    /// Authorize `op` (a capability name, case-insensitive) on `doctype`.
    /// Unknown operation names are denied without an audit record.
    pub fn authorize_named(
        &self,
        op: &str,
        doctype: &str,
        data: Option<&Map<String, Value>>,
        document_name: Option<&str>,
    ) -> PolicyDecision {
        match Capability::parse(op) {
            Some(cap) => self.authorize(cap, doctype, data, document_name),
            None => PolicyDecision::Deny {
                reason: format!("Unknown operation: {op}"),
            },
        }
    }

    /// Capability check, then value conditions for every submitted field.
    /// Exactly one audit record is emitted per call.
    pub fn authorize(
        &self,
        cap: Capability,
        doctype: &str,
        data: Option<&Map<String, Value>>,
        document_name: Option<&str>,
    ) -> PolicyDecision {
        let policy = self.policy(doctype);

        let decision = if !policy.can(cap) {
            PolicyDecision::Deny {
                reason: format!("Operation '{cap}' not allowed for doctype '{doctype}'"),
            }
        } else {
            match (data, policy.conditions.get(&cap)) {
                (Some(d), Some(rules)) => match check_conditions(rules, d) {
                    Ok(()) => PolicyDecision::Allow,
                    Err(reason) => PolicyDecision::Deny { reason },
                },
                _ => PolicyDecision::Allow,
            }
        };

        self.emit(cap, doctype, &decision, data, document_name);
        decision
    }

    fn emit(
        &self,
        cap: Capability,
        doctype: &str,
        decision: &PolicyDecision,
        data: Option<&Map<String, Value>>,
        document_name: Option<&str>,
    ) {
        if !self.audit_enabled {
            return;
        }
        let data = data.filter(|d| !d.is_empty());
        let record = AuditRecord {
            timestamp: Utc::now(),
            operation: cap.as_str().to_uppercase(),
            doctype: doctype.to_string(),
            allowed: decision.is_allowed(),
            reason: decision.reason().to_string(),
            document_name: document_name.map(str::to_string),
            data_keys: data.map(|d| d.keys().cloned().collect()),
            field_count: data.map(Map::len).unwrap_or(0),
        };
        self.audit.record(&record);
    }

    /// Drop restricted fields, and anything outside the allow-list if one is set.
    pub fn filter_fields(&self, data: &Map<String, Value>, doctype: &str) -> Map<String, Value> {
        let policy = self.policy(doctype);
        data.iter()
            .filter(|(k, _)| policy.field_permitted(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Apply [`PolicyEngine::filter_fields`] to a read result: an object, or
    /// an array whose object elements are filtered individually.
    pub fn filter_value(&self, value: Value, doctype: &str) -> Value {
        match value {
            Value::Object(m) => Value::Object(self.filter_fields(&m, doctype)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(m) => Value::Object(self.filter_fields(&m, doctype)),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    pub fn check_field_permission(&self, doctype: &str, field: &str) -> bool {
        self.policy(doctype).field_permitted(field)
    }

    pub fn allowed_operations(&self, doctype: &str) -> Vec<Capability> {
        let policy = self.policy(doctype);
        Capability::ALL.into_iter().filter(|c| policy.can(*c)).collect()
    }

    /// Allow-list minus restrict-list, in configured order.
    pub fn allowed_fields(&self, doctype: &str) -> Vec<String> {
        let policy = self.policy(doctype);
        policy
            .raw
            .allowed_fields
            .iter()
            .filter(|f| !policy.restricted.contains(f.as_str()))
            .cloned()
            .collect()
    }

    pub fn doctype_summary(&self, doctype: &str) -> DoctypeSummary {
        let policy = self.policy(doctype);
        let allowed_fields = self.allowed_fields(doctype);
        DoctypeSummary {
            doctype: doctype.to_string(),
            operations: self.allowed_operations(doctype),
            field_count: allowed_fields.len(),
            allowed_fields,
            restricted_fields: policy.raw.restricted_fields.clone(),
            conditions: policy.raw.conditions.clone(),
        }
    }

    pub fn configured_doctypes(&self) -> Vec<String> {
        self.doctypes.keys().cloned().collect()
    }

    pub fn export(&self) -> PermissionsExport {
        PermissionsExport {
            timestamp: Utc::now(),
            permissions: self.permissions.clone(),
            audit_enabled: self.audit_enabled,
            configured_doctypes: self.configured_doctypes(),
        }
    }
}
