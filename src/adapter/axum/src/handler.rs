/* src/adapter/axum/src/handler.rs */

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header::{HeaderName, HeaderValue, LOCATION};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use lattice_router::{FileRouter, RequestInfo, ResponseKind, RouteResponse};

use crate::error::AxumError;

pub(crate) fn build_router(router: Arc<FileRouter>) -> Router {
  // One catch-all GET surface: route resolution happens in the core, not in
  // Axum's own routing table.
  Router::new().fallback(get(handle_request)).with_state(router)
}

/// Browser noise that should never reach route resolution.
const IGNORED_PREFIXES: &[&str] = &["/favicon.ico", "/.well-known/", "/_lattice/"];

fn is_ignored(path: &str) -> bool {
  IGNORED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Collapse duplicate slashes and strip the trailing slash. `/` stays `/`.
fn normalize_path(raw: &str) -> String {
  let mut path = String::with_capacity(raw.len() + 1);
  path.push('/');
  for part in raw.split('/').filter(|p| !p.is_empty()) {
    if !path.ends_with('/') {
      path.push('/');
    }
    path.push_str(part);
  }
  path
}

async fn handle_request(
  State(router): State<Arc<FileRouter>>,
  method: Method,
  uri: Uri,
  headers: HeaderMap,
) -> Result<Response, AxumError> {
  let path = normalize_path(uri.path());
  if is_ignored(&path) {
    return Ok(StatusCode::NOT_FOUND.into_response());
  }
  let request = RequestInfo {
    method: method.to_string(),
    uri: uri.to_string(),
    query: uri.query().map(str::to_string),
    headers: headers
      .iter()
      .filter_map(|(name, value)| {
        value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
      })
      .collect(),
  };

  let response = router.respond(&path, Some(request)).await?;
  Ok(into_axum(response))
}

fn into_axum(route: RouteResponse) -> Response {
  let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  let mut response = match route.kind {
    ResponseKind::Page { matches, mode } => {
      (status, axum::Json(serde_json::json!({ "mode": mode, "matches": matches })))
        .into_response()
    }
    ResponseKind::Api { body } => {
      (status, axum::Json(serde_json::json!({ "ok": true, "data": body }))).into_response()
    }
    ResponseKind::Redirect { location } => {
      let mut response = status.into_response();
      if let Ok(value) = HeaderValue::try_from(location.as_str()) {
        response.headers_mut().insert(LOCATION, value);
      }
      response
    }
    ResponseKind::NotFound { matches, default_view } => (
      status,
      axum::Json(serde_json::json!({ "matches": matches, "defaultView": default_view })),
    )
      .into_response(),
  };

  for (name, value) in &route.headers {
    if let (Ok(name), Ok(value)) =
      (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str()))
    {
      response.headers_mut().append(name, value);
    }
  }
  response
}
