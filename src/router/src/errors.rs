/* src/router/src/errors.rs */

use std::fmt;

/// Fatal route-compilation errors. Both conflicting file paths are carried so
/// build output can point at the exact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
  /// Two sibling segments bind the same position with incompatible dynamic or
  /// catch-all names, so no tie-break can order them.
  AmbiguousRoute { position: String, first: String, second: String },
  /// Two files produce the same effective URL path.
  DuplicateRoute { route: String, first: String, second: String },
  /// Tree inconsistency detected at match time. Anything reaching this point
  /// should have been rejected when the tree was built.
  Internal(String),
}

impl fmt::Display for RouteError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::AmbiguousRoute { position, first, second } => write!(
        f,
        "The route files \"{first}\" and \"{second}\" are ambiguous at \"{position}\". Please remove or rename one of these files."
      ),
      Self::DuplicateRoute { route, first, second } => write!(
        f,
        "The route files \"{first}\" and \"{second}\" conflict on the route \"{route}\". Please remove or rename one of these files."
      ),
      Self::Internal(msg) => write!(f, "Internal route tree inconsistency: {msg}"),
    }
  }
}

impl std::error::Error for RouteError {}

/// Request-scoped failure raised by a loader or handler. Carries an error
/// code, a human-readable message and the HTTP status the serving layer
/// should answer with.
#[derive(Debug, Clone)]
pub struct LoaderError {
  code: String,
  message: String,
  status: u16,
  route: Option<String>,
}

fn default_status(code: &str) -> u16 {
  match code {
    "BAD_REQUEST" => 400,
    "NOT_FOUND" => 404,
    "CLIENT_ABORT" => 499,
    "LOADER_FAILED" => 500,
    "INTERNAL_ERROR" => 500,
    _ => 500,
  }
}

impl LoaderError {
  pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
    Self { code: code.into(), message: message.into(), status, route: None }
  }

  pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
    let code = code.into();
    let status = default_status(&code);
    Self { code, message: message.into(), status, route: None }
  }

  pub fn failed(msg: impl Into<String>) -> Self {
    Self::with_code("LOADER_FAILED", msg)
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::with_code("INTERNAL_ERROR", msg)
  }

  pub fn bad_request(msg: impl Into<String>) -> Self {
    Self::with_code("BAD_REQUEST", msg)
  }

  pub fn aborted() -> Self {
    Self::with_code("CLIENT_ABORT", "request aborted before the loader chain completed")
  }

  /// Attach the route id of the node whose loader failed.
  pub fn at_route(mut self, route: impl Into<String>) -> Self {
    self.route = Some(route.into());
    self
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn status(&self) -> u16 {
    self.status
  }

  pub fn route(&self) -> Option<&str> {
    self.route.as_deref()
  }
}

impl fmt::Display for LoaderError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.route {
      Some(route) => write!(f, "{}: {} (route {route})", self.code, self.message),
      None => write!(f, "{}: {}", self.code, self.message),
    }
  }
}

impl std::error::Error for LoaderError {}

impl From<RouteError> for LoaderError {
  fn from(err: RouteError) -> Self {
    Self::internal(err.to_string())
  }
}
