/* src/router/src/loader.rs */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cache::StaticCache;
use crate::errors::LoaderError;
use crate::matcher::{MatchedChain, Params};
use crate::mode::{RenderMode, ResolvedChain};

/// Per-node loader outcome. Redirect and not-found are control flow carried
/// as data; `Failure` is reserved for true errors.
pub enum LoaderOutcome {
  Data(serde_json::Value),
  Redirect { location: String, status: u16 },
  NotFound,
  Failure(LoaderError),
}

impl LoaderOutcome {
  pub fn data(value: serde_json::Value) -> Self {
    Self::Data(value)
  }

  pub fn redirect(location: impl Into<String>, status: u16) -> Self {
    Self::Redirect { location: location.into(), status }
  }
}

/// Request-time facts handed to per-request loaders. Static loaders never
/// see this; their output must not depend on request-time data.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
  pub method: String,
  pub uri: String,
  pub query: Option<String>,
  pub headers: Vec<(String, String)>,
}

impl RequestInfo {
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

/// Request-scoped response-header accumulator, shared by every loader in a
/// chain and flushed once by the serving layer after the chain completes or
/// short-circuits.
#[derive(Clone, Default)]
pub struct HeaderAccumulator(Arc<Mutex<Vec<(String, String)>>>);

impl HeaderAccumulator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace any previous value for `name`.
  pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let mut headers = self.0.lock().unwrap_or_else(|e| e.into_inner());
    headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
    headers.push((name, value.into()));
  }

  /// Add a value without replacing earlier ones (e.g. Set-Cookie).
  pub fn append(&self, name: impl Into<String>, value: impl Into<String>) {
    self.0.lock().unwrap_or_else(|e| e.into_inner()).push((name.into(), value.into()));
  }

  pub fn get(&self, name: &str) -> Option<String> {
    self
      .0
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.clone())
  }

  pub fn snapshot(&self) -> Vec<(String, String)> {
    self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

/// The only shape external route-file authors need to conform to.
pub struct LoaderInput {
  pub path: String,
  pub params: Params,
  /// Present for per-request nodes only.
  pub request: Option<Arc<RequestInfo>>,
  pub headers: HeaderAccumulator,
}

/// Everything a loader chain needs for one request.
pub struct RequestContext {
  pub path: String,
  pub request: Option<Arc<RequestInfo>>,
  pub headers: HeaderAccumulator,
  aborted: Arc<AtomicBool>,
}

impl RequestContext {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      request: None,
      headers: HeaderAccumulator::new(),
      aborted: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn with_request(mut self, request: RequestInfo) -> Self {
    self.request = Some(Arc::new(request));
    self
  }

  /// Handle the serving layer flips when the client goes away. A set flag
  /// stops further loader issuance and suppresses the header flush.
  pub fn abort_handle(&self) -> Arc<AtomicBool> {
    Arc::clone(&self.aborted)
  }

  pub fn is_aborted(&self) -> bool {
    self.aborted.load(Ordering::Relaxed)
  }
}

/// Loader data slot in the `matches[]` output.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderData {
  Data(serde_json::Value),
  /// Client-only sentinel: the loader runs once the view mounts on the
  /// consumer side; until then the slot is pending.
  Pending,
  None,
}

impl Serialize for LoaderData {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Data(value) => value.serialize(serializer),
      Self::Pending => serde_json::json!({ "$pending": true }).serialize(serializer),
      Self::None => serializer.serialize_none(),
    }
  }
}

/// One row of the `matches[]` array consumed by the external renderer.
#[derive(Debug, Clone, Serialize)]
pub struct MatchEntry {
  #[serde(rename = "routeId")]
  pub route_id: String,
  #[serde(rename = "loaderData")]
  pub data: LoaderData,
  pub params: Params,
  pub mode: RenderMode,
}

#[derive(Debug)]
pub enum PipelineResult {
  Matches(Vec<MatchEntry>),
  Redirect { location: String, status: u16 },
  /// Element index (root-first) whose loader signaled not-found.
  NotFound { at: usize, matches: Vec<MatchEntry> },
  Aborted,
}

/// Execute the chain's loaders sequentially, root-first.
///
/// A descendant's loader may depend on header mutations applied by an
/// ancestor, and redirect/not-found must observe completed-so-far state, so
/// loaders are awaited one at a time. `seed` carries entries already computed
/// for a chain prefix (not re-run), used when a not-found chain reuses
/// ancestor results.
pub async fn run_loaders(
  chain: &MatchedChain,
  modes: &ResolvedChain,
  ctx: &RequestContext,
  cache: Option<&StaticCache>,
  seed: Vec<MatchEntry>,
) -> Result<PipelineResult, LoaderError> {
  let mut matches = seed;

  for index in matches.len()..chain.elements.len() {
    if ctx.is_aborted() {
      return Ok(PipelineResult::Aborted);
    }

    let element = &chain.elements[index];
    let own = modes.own.get(index).copied().unwrap_or(RenderMode::Static);

    let Some(loader) = element.module.loader.clone() else {
      matches.push(entry(element, LoaderData::None, own));
      continue;
    };

    if own == RenderMode::ClientOnly {
      matches.push(entry(element, LoaderData::Pending, own));
      continue;
    }

    let cache_key = if own == RenderMode::Static {
      let key = StaticCache::key(&ctx.path, &element.route_id);
      if let Some(hit) = cache.and_then(|c| c.get(&key)) {
        matches.push(entry(element, LoaderData::Data(hit), own));
        continue;
      }
      Some(key)
    } else {
      None
    };

    let input = LoaderInput {
      path: ctx.path.clone(),
      params: element.params.clone(),
      request: if own == RenderMode::PerRequest { ctx.request.clone() } else { None },
      headers: ctx.headers.clone(),
    };

    match loader(input).await {
      LoaderOutcome::Data(value) => {
        if let (Some(key), Some(cache)) = (cache_key, cache) {
          cache.insert(key, value.clone());
        }
        matches.push(entry(element, LoaderData::Data(value), own));
      }
      LoaderOutcome::Redirect { location, status } => {
        return Ok(PipelineResult::Redirect { location, status });
      }
      LoaderOutcome::NotFound => {
        return Ok(PipelineResult::NotFound { at: index, matches });
      }
      LoaderOutcome::Failure(err) => {
        return Err(err.at_route(element.route_id.as_str()));
      }
    }
  }

  Ok(PipelineResult::Matches(matches))
}

fn entry(element: &crate::matcher::Matched, data: LoaderData, mode: RenderMode) -> MatchEntry {
  MatchEntry { route_id: element.route_id.clone(), data, params: element.params.clone(), mode }
}
