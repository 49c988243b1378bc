/* src/router/src/lib.rs */

pub mod cache;
pub mod config;
pub mod errors;
pub mod loader;
pub mod matcher;
pub mod mode;
pub mod module;
pub mod not_found;
pub mod registry;
pub mod router;
pub mod segment;
pub mod tree;

// Re-exports for ergonomic use
pub use cache::StaticCache;
pub use config::RouterConfig;
pub use errors::{LoaderError, RouteError};
pub use loader::{
  HeaderAccumulator, LoaderData, LoaderInput, LoaderOutcome, MatchEntry, PipelineResult,
  RequestContext, RequestInfo, run_loaders,
};
pub use matcher::{MatchResult, Matched, MatchedChain, MatchedRole, ParamValue, Params, match_path};
pub use mode::{RenderMode, ResolvedChain, resolve_modes};
pub use module::{ApiHandlerFn, BoxFuture, LoaderFn, ModuleRef};
pub use not_found::{NotFoundChain, resolve_not_found};
pub use registry::RouteRegistry;
pub use router::{FileRouter, ResponseKind, RouteResponse};
pub use segment::{Segment, SegmentKind, parse_segment};
pub use tree::{NodeId, NodeKind, RouteFile, RouteNode, RouteTree, build_tree};
