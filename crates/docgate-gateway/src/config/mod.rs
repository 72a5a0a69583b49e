//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use docgate_core::error::{DocGateError, Result};

pub use schema::{
    AuditSection, AuditSinkKind, CacheSection, ConditionBounds, ConditionRule,
    DoctypePermissionPolicy, FieldRules, GatewayConfig, PermissionsSection, RateLimitSection, RemoteSection,
};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| DocGateError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| DocGateError::Validation(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
