/* src/router/src/router.rs */

use std::sync::Arc;

use crate::cache::StaticCache;
use crate::config::RouterConfig;
use crate::errors::{LoaderError, RouteError};
use crate::loader::{
  MatchEntry, PipelineResult, RequestContext, RequestInfo, run_loaders,
};
use crate::matcher::{MatchResult, MatchedChain, MatchedRole, match_path};
use crate::mode::{RenderMode, resolve_modes};
use crate::not_found::{NotFoundChain, resolve_not_found};
use crate::registry::RouteRegistry;
use crate::tree::{RouteFile, RouteTree, build_tree};

/// What a resolved request turns into. The adapter decides how each variant
/// goes on the wire; the router only decides which one it is.
#[derive(Debug)]
pub enum ResponseKind {
  Page { matches: Vec<MatchEntry>, mode: RenderMode },
  Api { body: serde_json::Value },
  Redirect { location: String },
  NotFound { matches: Vec<MatchEntry>, default_view: bool },
}

#[derive(Debug)]
pub struct RouteResponse {
  pub status: u16,
  pub kind: ResponseKind,
  /// Headers accumulated by the loader chain, in application order.
  pub headers: Vec<(String, String)>,
}

/// Front door: owns the registry, the static cache, and the configuration,
/// and turns request paths into responses.
pub struct FileRouter {
  registry: RouteRegistry,
  config: RouterConfig,
  cache: StaticCache,
}

impl FileRouter {
  pub fn new(files: Vec<RouteFile>, config: RouterConfig) -> Result<Self, RouteError> {
    let tree = build_tree(files, &config)?;
    Ok(Self { registry: RouteRegistry::new(tree), config, cache: StaticCache::new() })
  }

  /// Replace the route tree from a fresh file listing. On failure the
  /// previous tree keeps serving and the error is retained; on success the
  /// static cache is dropped wholesale since any cached page may now be
  /// stale.
  pub fn rebuild(&self, files: Vec<RouteFile>) -> Result<(), RouteError> {
    match build_tree(files, &self.config) {
      Ok(tree) => {
        self.registry.swap(tree);
        self.cache.clear();
        Ok(())
      }
      Err(err) => {
        self.registry.record_error(err.clone());
        Err(err)
      }
    }
  }

  pub fn tree(&self) -> Arc<RouteTree> {
    self.registry.current()
  }

  pub fn last_build_error(&self) -> Option<RouteError> {
    self.registry.last_error()
  }

  pub fn cache(&self) -> &StaticCache {
    &self.cache
  }

  /// Resolve a request path end to end: match, assign modes, run the loader
  /// chain, and fold control-flow outcomes into a response.
  pub async fn respond(
    &self,
    path: &str,
    request: Option<RequestInfo>,
  ) -> Result<RouteResponse, LoaderError> {
    let mut ctx = RequestContext::new(path);
    if let Some(request) = request {
      ctx = ctx.with_request(request);
    }
    self.respond_ctx(ctx).await
  }

  /// Like [`respond`](Self::respond) but with a caller-owned context, so the
  /// caller can hold the abort handle while the chain runs.
  pub async fn respond_ctx(&self, ctx: RequestContext) -> Result<RouteResponse, LoaderError> {
    let tree = self.registry.current();

    match match_path(&tree, &ctx.path)? {
      MatchResult::Matched(chain) => {
        if chain.leaf().is_some_and(|leaf| leaf.role == MatchedRole::ApiEndpoint) {
          return self.respond_api(&chain, &ctx).await;
        }
        self.respond_page(&tree, chain, &ctx).await
      }
      MatchResult::NotFound(not_found) => {
        self.respond_not_found(&tree, not_found, &ctx, Vec::new()).await
      }
    }
  }

  async fn respond_page(
    &self,
    tree: &RouteTree,
    chain: MatchedChain,
    ctx: &RequestContext,
  ) -> Result<RouteResponse, LoaderError> {
    let modes = resolve_modes(tree, &chain, self.config.default_mode);
    let result = run_loaders(&chain, &modes, ctx, Some(&self.cache), Vec::new()).await?;

    match result {
      PipelineResult::Matches(matches) => Ok(RouteResponse {
        status: 200,
        kind: ResponseKind::Page { matches, mode: modes.effective_outer },
        headers: ctx.headers.snapshot(),
      }),
      PipelineResult::Redirect { location, status } => Ok(RouteResponse {
        status,
        kind: ResponseKind::Redirect { location },
        headers: ctx.headers.snapshot(),
      }),
      PipelineResult::NotFound { at, matches } => {
        let signalled = chain.elements[at].level;
        let not_found = resolve_not_found(tree, signalled);
        self.respond_not_found(tree, not_found, ctx, matches).await
      }
      PipelineResult::Aborted => Err(LoaderError::aborted()),
    }
  }

  /// Serve a not-found boundary chain. `computed` carries entries already
  /// produced for the original chain; the shared ancestor prefix is reused
  /// rather than re-run.
  async fn respond_not_found(
    &self,
    tree: &RouteTree,
    not_found: NotFoundChain,
    ctx: &RequestContext,
    computed: Vec<MatchEntry>,
  ) -> Result<RouteResponse, LoaderError> {
    let chain = not_found.chain;
    let mut seed = Vec::new();
    for (entry, element) in computed.into_iter().zip(chain.elements.iter()) {
      if entry.route_id != element.route_id {
        break;
      }
      seed.push(entry);
    }

    let modes = resolve_modes(tree, &chain, self.config.default_mode);
    let result = run_loaders(&chain, &modes, ctx, Some(&self.cache), seed).await?;

    match result {
      PipelineResult::Matches(matches) => Ok(RouteResponse {
        status: 404,
        kind: ResponseKind::NotFound { matches, default_view: not_found.default_view },
        headers: ctx.headers.snapshot(),
      }),
      PipelineResult::Redirect { location, status } => Ok(RouteResponse {
        status,
        kind: ResponseKind::Redirect { location },
        headers: ctx.headers.snapshot(),
      }),
      // A not-found loader signalling not-found again does not recurse;
      // whatever was computed renders with the boundary's view.
      PipelineResult::NotFound { matches, .. } => Ok(RouteResponse {
        status: 404,
        kind: ResponseKind::NotFound { matches, default_view: not_found.default_view },
        headers: ctx.headers.snapshot(),
      }),
      PipelineResult::Aborted => Err(LoaderError::aborted()),
    }
  }

  async fn respond_api(
    &self,
    chain: &MatchedChain,
    ctx: &RequestContext,
  ) -> Result<RouteResponse, LoaderError> {
    let leaf = chain
      .leaf()
      .ok_or_else(|| LoaderError::internal("api chain without a leaf"))?;
    let handler = leaf
      .module
      .handler
      .clone()
      .ok_or_else(|| LoaderError::internal("api endpoint without a handler").at_route(leaf.route_id.as_str()))?;

    let input = crate::loader::LoaderInput {
      path: ctx.path.clone(),
      params: leaf.params.clone(),
      request: ctx.request.clone(),
      headers: ctx.headers.clone(),
    };
    let body = handler(input).await.map_err(|e| e.at_route(leaf.route_id.as_str()))?;

    Ok(RouteResponse {
      status: 200,
      kind: ResponseKind::Api { body },
      headers: ctx.headers.snapshot(),
    })
  }
}

#[cfg(test)]
mod tests;
