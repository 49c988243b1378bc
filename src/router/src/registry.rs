/* src/router/src/registry.rs */

use std::sync::{Arc, RwLock};

use crate::errors::RouteError;
use crate::tree::RouteTree;

/// Holds the currently-served route tree behind a cheap clone point.
///
/// Rebuilds are atomic: a new tree replaces the old one in a single swap, and
/// a rebuild that fails leaves the previous tree serving. The most recent
/// build error is retained so callers can surface it without blocking
/// traffic.
pub struct RouteRegistry {
  current: RwLock<Arc<RouteTree>>,
  last_error: RwLock<Option<RouteError>>,
}

impl RouteRegistry {
  pub fn new(tree: RouteTree) -> Self {
    Self { current: RwLock::new(Arc::new(tree)), last_error: RwLock::new(None) }
  }

  /// Snapshot of the tree serving right now. Requests in flight keep the
  /// snapshot they started with across a swap.
  pub fn current(&self) -> Arc<RouteTree> {
    Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
  }

  pub fn swap(&self, tree: RouteTree) {
    *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(tree);
    *self.last_error.write().unwrap_or_else(|e| e.into_inner()) = None;
  }

  pub fn record_error(&self, err: RouteError) {
    *self.last_error.write().unwrap_or_else(|e| e.into_inner()) = Some(err);
  }

  pub fn last_error(&self) -> Option<RouteError> {
    self.last_error.read().unwrap_or_else(|e| e.into_inner()).clone()
  }
}
