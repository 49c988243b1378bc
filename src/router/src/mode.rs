/* src/router/src/mode.rs */

use serde::{Deserialize, Serialize};

use crate::matcher::MatchedChain;
use crate::tree::RouteTree;

/// How a route node's output is produced. Wire names follow the file-name
/// suffixes: `+ssg`, `+ssr`, `+spa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
  /// Produced ahead of time, served from a cache keyed by the resolved path.
  #[serde(rename = "ssg")]
  Static,
  /// Loader and view run fresh on every request.
  #[serde(rename = "ssr")]
  PerRequest,
  /// No server-side loader execution; deferred until the view mounts.
  #[serde(rename = "spa")]
  ClientOnly,
}

impl RenderMode {
  pub fn from_suffix(suffix: &str) -> Option<Self> {
    match suffix {
      "ssg" => Some(Self::Static),
      "ssr" => Some(Self::PerRequest),
      "spa" => Some(Self::ClientOnly),
      _ => None,
    }
  }

  pub fn suffix(self) -> &'static str {
    match self {
      Self::Static => "ssg",
      Self::PerRequest => "ssr",
      Self::ClientOnly => "spa",
    }
  }
}

/// Per-chain mode assignment. `own` is aligned with the chain's elements;
/// `effective_outer` is chain-wide: once any node is per-request the shell
/// can no longer be served from the static cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChain {
  pub own: Vec<RenderMode>,
  pub effective_outer: RenderMode,
}

/// Assign a mode to every element of a matched chain.
///
/// Two passes. The first walks the level path root to leaf carrying the
/// nearest declared mode downward (directory suffixes declare on levels,
/// file suffixes declare on entries; an entry declaration wins at its level
/// and propagates below it). The second pass derives the effective outer
/// mode, which cannot be known until the whole chain has been seen: a leaf
/// declared `+ssr` forces the shell of every ancestor to be per-request.
pub fn resolve_modes(tree: &RouteTree, chain: &MatchedChain, default: RenderMode) -> ResolvedChain {
  let mut own = Vec::with_capacity(chain.elements.len());
  let mut carry: Option<RenderMode> = None;
  let mut next = 0usize;

  for &level in &chain.levels {
    if let Some(mode) = tree.node(level).declared_mode {
      carry = Some(mode);
    }
    while next < chain.elements.len() && chain.elements[next].level == level {
      let element = &chain.elements[next];
      let resolved = element.declared_mode.or(carry).unwrap_or(default);
      if element.declared_mode.is_some() {
        carry = element.declared_mode;
      }
      own.push(resolved);
      next += 1;
    }
  }

  // Elements always sit on the level path; anything left over is a bug in
  // chain construction, resolve it with the inherited carry.
  while next < chain.elements.len() {
    own.push(chain.elements[next].declared_mode.or(carry).unwrap_or(default));
    next += 1;
  }

  let effective_outer = if own.contains(&RenderMode::PerRequest) {
    RenderMode::PerRequest
  } else if !own.is_empty() && own.iter().all(|m| *m == RenderMode::ClientOnly) {
    RenderMode::ClientOnly
  } else {
    RenderMode::Static
  };

  ResolvedChain { own, effective_outer }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::matcher::{MatchResult, match_path};
  use crate::module::ModuleRef;
  use crate::tree::{RouteFile, build_tree};

  fn file(path: &str) -> RouteFile {
    RouteFile { path: path.into(), module: ModuleRef::default() }
  }

  fn chain_for(files: &[&str], path: &str) -> (crate::tree::RouteTree, MatchedChain) {
    let tree =
      build_tree(files.iter().map(|f| file(f)).collect(), &crate::config::RouterConfig::default())
        .expect("tree");
    let result = match_path(&tree, path).expect("match");
    match result {
      MatchResult::Matched(chain) => (tree, chain),
      MatchResult::NotFound(_) => panic!("expected a match for {path}"),
    }
  }

  #[test]
  fn default_mode_applies_when_nothing_declares() {
    let (tree, chain) = chain_for(&["blog/_layout.tsx", "blog/post.tsx"], "/blog/post");
    let resolved = resolve_modes(&tree, &chain, RenderMode::Static);
    assert_eq!(resolved.own, vec![RenderMode::Static, RenderMode::Static]);
    assert_eq!(resolved.effective_outer, RenderMode::Static);
  }

  #[test]
  fn per_request_ancestor_forces_effective_outer() {
    // Layout declared +ssr wrapping a page declared +ssg: the shell becomes
    // per-request, the page keeps its own static caching policy.
    let (tree, chain) = chain_for(&["blog/_layout+ssr.tsx", "blog/post+ssg.tsx"], "/blog/post");
    let resolved = resolve_modes(&tree, &chain, RenderMode::Static);
    assert_eq!(resolved.own, vec![RenderMode::PerRequest, RenderMode::Static]);
    assert_eq!(resolved.effective_outer, RenderMode::PerRequest);
  }

  #[test]
  fn per_request_leaf_forces_effective_outer() {
    let (tree, chain) = chain_for(&["blog/_layout+ssg.tsx", "blog/post+ssr.tsx"], "/blog/post");
    let resolved = resolve_modes(&tree, &chain, RenderMode::Static);
    assert_eq!(resolved.own, vec![RenderMode::Static, RenderMode::PerRequest]);
    assert_eq!(resolved.effective_outer, RenderMode::PerRequest);
  }

  #[test]
  fn descendants_inherit_nearest_declared_ancestor() {
    let (tree, chain) =
      chain_for(&["admin/_layout+ssr.tsx", "admin/users/_layout.tsx", "admin/users/list.tsx"], "/admin/users/list");
    let resolved = resolve_modes(&tree, &chain, RenderMode::Static);
    assert_eq!(
      resolved.own,
      vec![RenderMode::PerRequest, RenderMode::PerRequest, RenderMode::PerRequest]
    );
  }

  #[test]
  fn directory_suffix_declares_for_the_subtree() {
    let (tree, chain) = chain_for(&["admin+spa/panel.tsx"], "/admin/panel");
    let resolved = resolve_modes(&tree, &chain, RenderMode::Static);
    assert_eq!(resolved.own, vec![RenderMode::ClientOnly]);
    assert_eq!(resolved.effective_outer, RenderMode::ClientOnly);
  }

  #[test]
  fn client_only_mix_keeps_static_shell() {
    let (tree, chain) = chain_for(&["shop/_layout+ssg.tsx", "shop/cart+spa.tsx"], "/shop/cart");
    let resolved = resolve_modes(&tree, &chain, RenderMode::Static);
    assert_eq!(resolved.own, vec![RenderMode::Static, RenderMode::ClientOnly]);
    assert_eq!(resolved.effective_outer, RenderMode::Static);
  }

  #[test]
  fn suffix_round_trip() {
    for mode in [RenderMode::Static, RenderMode::PerRequest, RenderMode::ClientOnly] {
      assert_eq!(RenderMode::from_suffix(mode.suffix()), Some(mode));
    }
    assert_eq!(RenderMode::from_suffix("api"), None);
  }
}
