use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use docgate_core::error::{DocGateError, Result};
use docgate_core::Capability;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    pub remote: RemoteSection,

    #[serde(default)]
    pub rate_limiting: RateLimitSection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub audit: AuditSection,

    #[serde(default)]
    pub permissions: PermissionsSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(DocGateError::UnsupportedVersion);
        }

        self.remote.validate()?;
        self.rate_limiting.validate()?;
        self.cache.validate()?;
        self.permissions.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RemoteSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(DocGateError::Validation(
                "remote.url must start with http:// or https://".into(),
            ));
        }
        if self.api_key.trim().is_empty() || self.api_secret.trim().is_empty() {
            return Err(DocGateError::Validation(
                "remote.api_key and remote.api_secret must not be empty".into(),
            ));
        }
        if !(1..=300).contains(&self.timeout_secs) {
            return Err(DocGateError::Validation(
                "remote.timeout_secs must be between 1 and 300".into(),
            ));
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: u32,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: default_requests_per_minute(),
            requests_per_hour: default_requests_per_hour(),
        }
    }
}

impl RateLimitSection {
    pub fn validate(&self) -> Result<()> {
        if self.requests_per_minute == 0 || self.requests_per_hour == 0 {
            return Err(DocGateError::Validation(
                "rate_limiting limits must be at least 1".into(),
            ));
        }
        if self.requests_per_hour < self.requests_per_minute {
            return Err(DocGateError::Validation(
                "rate_limiting.requests_per_hour must be >= requests_per_minute".into(),
            ));
        }
        Ok(())
    }
}

fn default_requests_per_minute() -> u32 {
    60
}
fn default_requests_per_hour() -> u32 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            max_size: default_max_size(),
        }
    }
}

impl CacheSection {
    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(DocGateError::Validation("cache.ttl_secs must be at least 1".into()));
        }
        if self.max_size == 0 {
            return Err(DocGateError::Validation("cache.max_size must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_ttl_secs() -> u64 {
    300
}
fn default_max_size() -> usize {
    1000
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSinkKind {
    #[default]
    Tracing,
    File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub sink: AuditSinkKind,

    #[serde(default = "default_audit_log_file")]
    pub log_file: String,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: true,
            sink: AuditSinkKind::default(),
            log_file: default_audit_log_file(),
        }
    }
}

fn default_audit_log_file() -> String {
    "logs/audit.jsonl".into()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionsSection {
    #[serde(default)]
    pub default: DoctypePermissionPolicy,

    #[serde(default)]
    pub doctypes: BTreeMap<String, DoctypePermissionPolicy>,
}

impl PermissionsSection {
    pub fn validate(&self) -> Result<()> {
        self.default.validate("default")?;
        for (name, policy) in &self.doctypes {
            if name.trim().is_empty() {
                return Err(DocGateError::Validation(
                    "permissions.doctypes keys must not be empty".into(),
                ));
            }
            policy.validate(name)?;
        }
        Ok(())
    }
}

/// Per-doctype permission block as written in the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DoctypePermissionPolicy {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,

    /// Empty means no allow-list.
    #[serde(default)]
    pub allowed_fields: Vec<String>,

    #[serde(default)]
    pub restricted_fields: Vec<String>,

    /// operation -> field -> rule, fields kept in file order
    #[serde(default)]
    pub conditions: BTreeMap<String, FieldRules>,
}

impl DoctypePermissionPolicy {
    pub fn validate(&self, doctype: &str) -> Result<()> {
        for (op, rules) in &self.conditions {
            if Capability::parse(op).is_none() {
                return Err(DocGateError::Validation(format!(
                    "permissions.{doctype}.conditions: unknown operation '{op}'"
                )));
            }
            for (field, rule) in rules {
                if let ConditionRule::Bounds(b) = rule {
                    if b.is_empty() {
                        return Err(DocGateError::Validation(format!(
                            "permissions.{doctype}.conditions.{op}.{field}: at least one of in/not_in/min/max is required"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Field rules of one operation. Evaluated in the order they are written.
pub type FieldRules = IndexMap<String, ConditionRule>;

/// Constraint on a single submitted field.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConditionRule {
    /// Explicit enumeration of permitted values.
    Values(Vec<Value>),
    Bounds(ConditionBounds),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionBounds {
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub in_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
}

impl ConditionBounds {
    pub fn is_empty(&self) -> bool {
        self.in_values.is_none() && self.not_in.is_none() && self.min.is_none() && self.max.is_none()
    }
}

fn default_true() -> bool {
    true
}
