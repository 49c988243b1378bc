/* src/adapter/axum/src/lib.rs */

mod error;
mod handler;

use std::sync::Arc;

use lattice_router::FileRouter;

/// Re-export the router core for convenience
pub use lattice_router;

/// Extension trait that mounts a `FileRouter` behind an Axum router.
pub trait IntoAxumRouter {
  fn into_axum_router(self) -> axum::Router;
  fn serve(
    self,
    addr: &str,
  ) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error>>> + Send;
}

impl IntoAxumRouter for FileRouter {
  fn into_axum_router(self) -> axum::Router {
    handler::build_router(Arc::new(self))
  }

  async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = self.into_axum_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    println!("Lattice backend running on http://localhost:{}", local_addr.port());
    axum::serve(listener, router).await?;
    Ok(())
  }
}
