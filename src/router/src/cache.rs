/* src/router/src/cache.rs */

use std::collections::HashMap;
use std::sync::RwLock;

/// Cache for statically-produced loader results, keyed by the fully-resolved
/// request path plus the owning route id. Entries are written once per key
/// and read many times; a registry rebuild clears the whole cache.
#[derive(Default)]
pub struct StaticCache {
  entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl StaticCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn key(path: &str, route_id: &str) -> String {
    format!("{path}::{route_id}")
  }

  pub fn get(&self, key: &str) -> Option<serde_json::Value> {
    self.entries.read().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
  }

  /// First write wins; later writes for the same key are ignored.
  pub fn insert(&self, key: String, value: serde_json::Value) {
    self.entries.write().unwrap_or_else(|e| e.into_inner()).entry(key).or_insert(value);
  }

  pub fn clear(&self) {
    self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
  }

  pub fn len(&self) -> usize {
    self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
