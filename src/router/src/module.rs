/* src/router/src/module.rs */

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::LoaderError;
use crate::loader::{LoaderInput, LoaderOutcome};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Data-loading function attached to a route node.
pub type LoaderFn = Arc<dyn Fn(LoaderInput) -> BoxFuture<LoaderOutcome> + Send + Sync>;

/// Request handler attached to an API endpoint node.
pub type ApiHandlerFn =
  Arc<dyn Fn(LoaderInput) -> BoxFuture<Result<serde_json::Value, LoaderError>> + Send + Sync>;

/// Callable surface of the module a route file exports. The discovery
/// collaborator owns module loading; the core only needs the callable parts.
#[derive(Clone, Default)]
pub struct ModuleRef {
  pub loader: Option<LoaderFn>,
  pub handler: Option<ApiHandlerFn>,
  /// Whether the module exports a view producer. The renderer is an external
  /// collaborator, so the core only records that one exists.
  pub has_view: bool,
}

impl ModuleRef {
  pub fn view() -> Self {
    Self { loader: None, handler: None, has_view: true }
  }

  pub fn with_loader<F, Fut>(loader: F) -> Self
  where
    F: Fn(LoaderInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoaderOutcome> + Send + 'static,
  {
    Self {
      loader: Some(Arc::new(move |input| Box::pin(loader(input)))),
      handler: None,
      has_view: true,
    }
  }

  pub fn with_handler<F, Fut>(handler: F) -> Self
  where
    F: Fn(LoaderInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, LoaderError>> + Send + 'static,
  {
    Self {
      loader: None,
      handler: Some(Arc::new(move |input| Box::pin(handler(input)))),
      has_view: false,
    }
  }
}

impl std::fmt::Debug for ModuleRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ModuleRef")
      .field("loader", &self.loader.is_some())
      .field("handler", &self.handler.is_some())
      .field("has_view", &self.has_view)
      .finish()
  }
}
