/* src/router/src/matcher.rs */

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::RouteError;
use crate::mode::RenderMode;
use crate::module::ModuleRef;
use crate::not_found::{NotFoundChain, resolve_not_found};
use crate::segment::SegmentKind;
use crate::tree::{NodeId, NodeKind, RouteTree, effective_path};

/// Extracted route parameter: one segment for dynamic, the remainder in path
/// order for catch-alls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
  Single(String),
  List(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
  pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
    self.0.insert(name.into(), value);
  }

  pub fn get(&self, name: &str) -> Option<&ParamValue> {
    self.0.get(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
    self.0.iter()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedRole {
  Layout,
  Page,
  ApiEndpoint,
  NotFound,
}

/// One node of a matched chain: a layout, the leaf, or a not-found boundary.
#[derive(Debug, Clone)]
pub struct Matched {
  pub level: NodeId,
  pub role: MatchedRole,
  pub route_id: String,
  pub declared_mode: Option<RenderMode>,
  pub module: ModuleRef,
  /// Params visible to this node: ancestors' merged with its own. Deeper
  /// bindings are not visible upward.
  pub params: Params,
}

/// Root-first ordered chain for one request path.
#[derive(Debug, Clone)]
pub struct MatchedChain {
  /// Full level path root to leaf, group levels included.
  pub levels: Vec<NodeId>,
  /// Layouts in nesting order followed by the leaf.
  pub elements: Vec<Matched>,
  /// Fully merged params.
  pub params: Params,
}

impl MatchedChain {
  pub fn leaf(&self) -> Option<&Matched> {
    self.elements.last()
  }
}

#[derive(Debug)]
pub enum MatchResult {
  Matched(MatchedChain),
  NotFound(NotFoundChain),
}

type Binding = (NodeId, String, ParamValue);

struct Hit {
  levels: Vec<NodeId>,
  bindings: Vec<Binding>,
}

/// Match a normalized request path against the tree.
///
/// Walks level by level preferring, in order: exact static text, a dynamic
/// segment, a catch-all. Groups are traversed transparently; if two group
/// subtrees produce a full match at the same specificity the tree is
/// inconsistent (the build should have rejected it) and an internal error is
/// returned. A failed walk falls back to the not-found resolver.
pub fn match_path(tree: &RouteTree, path: &str) -> Result<MatchResult, RouteError> {
  let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
  let mut deepest = (1usize, tree.root);
  let hit = descend(tree, tree.root, &segments, vec![tree.root], Vec::new(), &mut deepest)?;
  match hit {
    Some(hit) => Ok(MatchResult::Matched(build_chain(tree, &hit)?)),
    None => Ok(MatchResult::NotFound(resolve_not_found(tree, deepest.1))),
  }
}

fn descend(
  tree: &RouteTree,
  node: NodeId,
  remaining: &[&str],
  trail: Vec<NodeId>,
  bindings: Vec<Binding>,
  deepest: &mut (usize, NodeId),
) -> Result<Option<Hit>, RouteError> {
  if trail.len() > deepest.0 {
    *deepest = (trail.len(), node);
  }

  if remaining.is_empty() {
    return terminal(tree, node, &trail, &bindings);
  }

  let next = remaining[0];
  let children = tree.effective_children(node);

  // Static specificity wins over dynamic wins over catch-all.
  let mut wins = Vec::new();
  for (child, via) in &children {
    let segment = &tree.node(*child).segment;
    if segment.kind == SegmentKind::Static && segment.literal.as_deref() == Some(next) {
      let extended = extend_trail(&trail, via, *child);
      if let Some(hit) = descend(tree, *child, &remaining[1..], extended, bindings.clone(), deepest)? {
        wins.push(hit);
      }
    }
  }
  if let Some(hit) = single_winner(tree, wins)? {
    return Ok(Some(hit));
  }

  let mut wins = Vec::new();
  for (child, via) in &children {
    let segment = &tree.node(*child).segment;
    if segment.kind == SegmentKind::Dynamic {
      let Some(name) = segment.param.clone() else { continue };
      let extended = extend_trail(&trail, via, *child);
      let mut bound = bindings.clone();
      bound.push((*child, name, ParamValue::Single(next.to_string())));
      if let Some(hit) = descend(tree, *child, &remaining[1..], extended, bound, deepest)? {
        wins.push(hit);
      }
    }
  }
  if let Some(hit) = single_winner(tree, wins)? {
    return Ok(Some(hit));
  }

  let mut wins = Vec::new();
  for (child, via) in &children {
    let segment = &tree.node(*child).segment;
    if matches!(segment.kind, SegmentKind::CatchAll | SegmentKind::OptionalCatchAll) {
      let Some(name) = segment.param.clone() else { continue };
      let extended = extend_trail(&trail, via, *child);
      let mut bound = bindings.clone();
      let rest = remaining.iter().map(|s| (*s).to_string()).collect();
      bound.push((*child, name, ParamValue::List(rest)));
      if let Some(hit) = descend(tree, *child, &[], extended, bound, deepest)? {
        wins.push(hit);
      }
    }
  }
  single_winner(tree, wins)
}

/// Resolve a fully-consumed path at `node`: a page at this level, a page at a
/// transparent group descendant, or an optional catch-all matching the empty
/// remainder.
fn terminal(
  tree: &RouteTree,
  node: NodeId,
  trail: &[NodeId],
  bindings: &[Binding],
) -> Result<Option<Hit>, RouteError> {
  let mut wins = Vec::new();
  terminal_pages(tree, node, trail, bindings, &mut wins);
  if let Some(hit) = single_winner(tree, wins)? {
    return Ok(Some(hit));
  }

  let mut wins = Vec::new();
  for (child, via) in tree.effective_children(node) {
    let segment = &tree.node(child).segment;
    if segment.kind == SegmentKind::OptionalCatchAll && tree.node(child).page.is_some() {
      let Some(name) = segment.param.clone() else { continue };
      let mut bound = bindings.to_vec();
      bound.push((child, name, ParamValue::List(Vec::new())));
      wins.push(Hit { levels: extend_trail(trail, &via, child), bindings: bound });
    }
  }
  single_winner(tree, wins)
}

fn terminal_pages(
  tree: &RouteTree,
  node: NodeId,
  trail: &[NodeId],
  bindings: &[Binding],
  wins: &mut Vec<Hit>,
) {
  if tree.node(node).page.is_some() {
    wins.push(Hit { levels: trail.to_vec(), bindings: bindings.to_vec() });
  }
  for group in tree.group_children(node) {
    let mut extended = trail.to_vec();
    extended.push(group);
    terminal_pages(tree, group, &extended, bindings, wins);
  }
}

fn extend_trail(trail: &[NodeId], via: &[NodeId], child: NodeId) -> Vec<NodeId> {
  let mut extended = trail.to_vec();
  extended.extend(via.iter().copied());
  extended.push(child);
  extended
}

fn single_winner(tree: &RouteTree, mut wins: Vec<Hit>) -> Result<Option<Hit>, RouteError> {
  if wins.len() > 1 {
    let first = wins[0].levels.last().map_or_else(String::new, |&l| tree.effective_path(l));
    let second = wins[1].levels.last().map_or_else(String::new, |&l| tree.effective_path(l));
    return Err(RouteError::Internal(format!(
      "multiple routes match at the same specificity: \"{first}\" and \"{second}\""
    )));
  }
  Ok(wins.pop())
}

fn build_chain(tree: &RouteTree, hit: &Hit) -> Result<MatchedChain, RouteError> {
  let mut merged = Params::default();
  let mut elements = Vec::new();

  for (index, &level) in hit.levels.iter().enumerate() {
    for (bound_at, name, value) in &hit.bindings {
      if *bound_at == level {
        merged.insert(name.clone(), value.clone());
      }
    }

    let node = tree.node(level);
    if let Some(layout) = &node.layout {
      elements.push(Matched {
        level,
        role: MatchedRole::Layout,
        route_id: layout.route_id.clone(),
        declared_mode: layout.declared_mode,
        module: layout.module.clone(),
        params: merged.clone(),
      });
    }

    if index + 1 == hit.levels.len() {
      let Some(page) = &node.page else {
        return Err(RouteError::Internal(format!(
          "matched leaf \"{}\" has no page entry",
          effective_path(&node.segments)
        )));
      };
      let role = match page.kind {
        NodeKind::ApiEndpoint => MatchedRole::ApiEndpoint,
        _ => MatchedRole::Page,
      };
      elements.push(Matched {
        level,
        role,
        route_id: page.route_id.clone(),
        declared_mode: page.declared_mode,
        module: page.module.clone(),
        params: merged.clone(),
      });
    }
  }

  Ok(MatchedChain { levels: hit.levels.clone(), elements, params: merged })
}
