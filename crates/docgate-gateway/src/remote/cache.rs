//! TTL response cache bounded by entry count.
//!
//! Entries are never updated in place. When the store is full, the entry with
//! the oldest creation time is evicted (least recently created, not least
//! recently used). Expired entries read as absent and are dropped on lookup.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use super::transport::HttpMethod;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    // Breaks ties between entries created at the same instant.
    seq: u64,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    max_size: usize,
    entries: Mutex<Store>,
}

#[derive(Debug, Default)]
struct Store {
    map: HashMap<String, CacheEntry>,
    next_seq: u64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl,
            max_size: max_size.max(1),
            entries: Mutex::new(Store::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut store = self.entries.lock().ok()?;
        let fresh = now.duration_since(store.map.get(key)?.created_at) < self.ttl;
        if fresh {
            return store.map.get(key).map(|e| e.value.clone());
        }
        store.map.remove(key);
        None
    }

    pub fn set(&self, key: String, value: Value) {
        let Ok(mut store) = self.entries.lock() else {
            return;
        };
        if !store.map.contains_key(&key) && store.map.len() >= self.max_size {
            let oldest = store
                .map
                .iter()
                .min_by_key(|(_, e)| (e.created_at, e.seq))
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                store.map.remove(&k);
            }
        }
        let seq = store.next_seq;
        store.next_seq += 1;
        store.map.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                seq,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|s| s.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deterministic signature of (method, endpoint, params).
///
/// Object keys are sorted recursively, so parameter maps that differ only in
/// insertion order produce the same key.
pub fn cache_key(method: HttpMethod, endpoint: &str, params: Option<&Value>) -> String {
    let mut key = format!("{}:{}:", method.as_str(), endpoint);
    if let Some(p) = params {
        write_canonical(p, &mut key);
    }
    key
}

fn write_canonical(v: &Value, out: &mut String) {
    match v {
        Value::Object(m) => {
            let mut keys: Vec<&String> = m.keys().collect();
            keys.sort();
            out.push('{');
            for (i, k) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                if let Some(inner) = m.get(k) {
                    write_canonical(inner, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
