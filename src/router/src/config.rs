/* src/router/src/config.rs */

use serde::Deserialize;

use crate::mode::RenderMode;

fn default_routes_root() -> String {
  "app".to_string()
}

fn default_mode() -> RenderMode {
  RenderMode::Static
}

/// Process-wide routing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
  /// Directory the discovered file paths are relative to. A leading
  /// `<routes_root>/` on a discovered path is stripped before parsing.
  #[serde(default = "default_routes_root")]
  pub routes_root: String,
  /// Mode used when neither a node nor any of its ancestors declares one.
  #[serde(default = "default_mode")]
  pub default_mode: RenderMode,
}

impl Default for RouterConfig {
  fn default() -> Self {
    Self { routes_root: default_routes_root(), default_mode: default_mode() }
  }
}
