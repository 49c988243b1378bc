/* src/adapter/axum/src/error.rs */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lattice_router::LoaderError;

/// Newtype so the router core's error crosses into Axum's response world.
pub(crate) struct AxumError(LoaderError);

impl From<LoaderError> for AxumError {
  fn from(err: LoaderError) -> Self {
    Self(err)
  }
}

impl IntoResponse for AxumError {
  fn into_response(self) -> Response {
    let status =
      StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
      "ok": false,
      "error": {
        "code": self.0.code(),
        "message": self.0.message(),
        "route": self.0.route(),
      },
    });
    (status, axum::Json(body)).into_response()
  }
}
