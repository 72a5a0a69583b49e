//! Argument bag handed to operation services.

use serde_json::{Map, Value};

use docgate_core::error::{DocGateError, Result};

#[derive(Debug, Clone, Default)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Accepts an object or null; anything else is a validation error.
    pub fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Object(m) => Ok(Self(m)),
            Value::Null => Ok(Self::default()),
            other => Err(DocGateError::Validation(format!(
                "arguments must be an object, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Non-empty string argument.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.str(key)
            .ok_or_else(|| DocGateError::Validation(format!("{key} is required")))
    }

    /// Non-empty object argument. A present value of another type is an error.
    pub fn object(&self, key: &str) -> Result<Option<&Map<String, Value>>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(m)) if m.is_empty() => Ok(None),
            Some(Value::Object(m)) => Ok(Some(m)),
            Some(_) => Err(DocGateError::Validation(format!("{key} must be an object"))),
        }
    }

    pub fn require_object(&self, key: &str) -> Result<&Map<String, Value>> {
        self.object(key)?
            .ok_or_else(|| DocGateError::Validation(format!("{key} is required")))
    }

    /// List of strings; non-string items are skipped.
    pub fn string_list(&self, key: &str) -> Option<Vec<String>> {
        self.0.get(key).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    }

    /// Integer argument clamped to `min..=max`, `default` when absent or not a number.
    pub fn limit(&self, key: &str, default: u32, min: u32, max: u32) -> u32 {
        let raw = self
            .0
            .get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
        match raw {
            Some(n) => n.clamp(min as i64, max as i64) as u32,
            None => default,
        }
    }

    /// Loose truthiness: `true`, non-zero numbers, non-empty strings/arrays/objects.
    pub fn truthy(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }
}
