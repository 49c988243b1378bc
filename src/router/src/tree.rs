/* src/router/src/tree.rs */

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::RouterConfig;
use crate::errors::RouteError;
use crate::mode::RenderMode;
use crate::module::ModuleRef;
use crate::segment::{FileClass, RouteFileMeta, Segment, SegmentKind, classify_file};

/// Index into the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
  Layout,
  Page,
  ApiEndpoint,
  NotFound,
  Middleware,
}

/// One route file attached to a tree level.
#[derive(Debug, Clone)]
pub struct RouteEntry {
  pub route_id: String,
  pub file: String,
  pub kind: NodeKind,
  pub declared_mode: Option<RenderMode>,
  pub module: ModuleRef,
}

/// One level of the route tree. Levels mirror the path components under the
/// routes root; group levels nest layouts but are erased from the matchable
/// path.
#[derive(Debug)]
pub struct RouteNode {
  pub id: NodeId,
  pub parent: Option<NodeId>,
  pub segment: Segment,
  /// Segments from the root to this level, groups included.
  pub segments: Vec<Segment>,
  pub children: Vec<NodeId>,
  pub layout: Option<RouteEntry>,
  pub middleware: Option<RouteEntry>,
  /// Page or API endpoint terminating exactly at this level.
  pub page: Option<RouteEntry>,
  pub not_found: Option<RouteEntry>,
  /// Nearest self-or-ancestor level with a not-found boundary.
  pub boundary: Option<NodeId>,
  /// Render mode declared by a directory suffix on this level.
  pub declared_mode: Option<RenderMode>,
  /// File that first introduced this level, for conflict messages.
  origin: String,
}

/// Input to the builder: one discovered virtual file path plus the module it
/// exports. Discovery itself is owned by an external collaborator.
#[derive(Clone)]
pub struct RouteFile {
  pub path: String,
  pub module: ModuleRef,
}

/// The compiled route tree. Immutable after build; file-watch edits build a
/// replacement tree which is swapped in behind the registry.
#[derive(Debug)]
pub struct RouteTree {
  nodes: Vec<RouteNode>,
  pub root: NodeId,
  pub warnings: Vec<String>,
}

impl RouteTree {
  pub fn node(&self, id: NodeId) -> &RouteNode {
    &self.nodes[id.0]
  }

  fn node_mut(&mut self, id: NodeId) -> &mut RouteNode {
    &mut self.nodes[id.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// URL-facing path of a level: segments minus groups.
  pub fn effective_path(&self, id: NodeId) -> String {
    effective_path(&self.node(id).segments)
  }

  /// Whether `ancestor` lies on the parent path of `id` (or is `id` itself).
  pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
    let mut cursor = Some(id);
    while let Some(current) = cursor {
      if current == ancestor {
        return true;
      }
      cursor = self.node(current).parent;
    }
    false
  }

  /// Non-group children reachable at a level, flattening group levels
  /// transparently. Each entry carries the group levels traversed to reach
  /// it, in order, so chain construction can collect their layouts.
  pub(crate) fn effective_children(&self, id: NodeId) -> Vec<(NodeId, Vec<NodeId>)> {
    let mut out = Vec::new();
    let mut via = Vec::new();
    self.collect_effective(id, &mut via, &mut out);
    out
  }

  fn collect_effective(&self, id: NodeId, via: &mut Vec<NodeId>, out: &mut Vec<(NodeId, Vec<NodeId>)>) {
    for &child in &self.node(id).children {
      if self.node(child).segment.kind == SegmentKind::Group {
        via.push(child);
        self.collect_effective(child, via, out);
        via.pop();
      } else {
        out.push((child, via.clone()));
      }
    }
  }

  /// Group children of a level (direct and nested), for terminal matching.
  pub(crate) fn group_children(&self, id: NodeId) -> Vec<NodeId> {
    self
      .node(id)
      .children
      .iter()
      .copied()
      .filter(|&c| self.node(c).segment.kind == SegmentKind::Group)
      .collect()
  }

  /// Stable diagnostic view of every attached entry, keyed by route id.
  pub fn manifest(&self) -> RouteManifest {
    let mut routes = BTreeMap::new();
    for node in &self.nodes {
      let path = effective_path(&node.segments);
      for entry in
        [&node.layout, &node.middleware, &node.page, &node.not_found].into_iter().flatten()
      {
        routes.insert(
          entry.route_id.clone(),
          RouteManifestEntry {
            file: entry.file.clone(),
            kind: entry.kind,
            mode: entry.declared_mode.map(RenderMode::suffix),
            path: path.clone(),
          },
        );
      }
    }
    RouteManifest { routes, warnings: self.warnings.clone() }
  }
}

#[derive(Serialize)]
pub struct RouteManifest {
  pub routes: BTreeMap<String, RouteManifestEntry>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct RouteManifestEntry {
  pub file: String,
  pub kind: NodeKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mode: Option<&'static str>,
  pub path: String,
}

pub(crate) fn effective_path(segments: &[Segment]) -> String {
  let parts: Vec<&str> = segments
    .iter()
    .filter(|s| s.kind != SegmentKind::Group)
    .map(|s| s.raw.as_str())
    .collect();
  format!("/{}", parts.join("/"))
}

/// Fold the discovered file set into a route tree.
///
/// Files are sorted by depth then lexicographically so conflict messages and
/// tie-breaks are deterministic, and rebuilding an unchanged set yields a
/// structurally identical tree.
pub fn build_tree(files: Vec<RouteFile>, config: &RouterConfig) -> Result<RouteTree, RouteError> {
  let mut warnings = Vec::new();
  let mut metas: Vec<(RouteFileMeta, ModuleRef)> = Vec::with_capacity(files.len());

  for file in files {
    match classify_file(&file.path, &config.routes_root) {
      FileClass::Route(meta) => metas.push((*meta, file.module)),
      FileClass::Ignored { file, reason } => {
        warnings.push(format!("ignoring \"{file}\": {reason}"));
      }
    }
  }

  metas.sort_by(|(a, _), (b, _)| {
    let depth_a = a.segments.len() + usize::from(a.leaf.is_some());
    let depth_b = b.segments.len() + usize::from(b.leaf.is_some());
    depth_a.cmp(&depth_b).then_with(|| a.file.cmp(&b.file))
  });

  let root = RouteNode {
    id: NodeId(0),
    parent: None,
    segment: Segment::root(),
    segments: Vec::new(),
    children: Vec::new(),
    layout: None,
    middleware: None,
    page: None,
    not_found: None,
    boundary: None,
    declared_mode: None,
    origin: String::new(),
  };
  let mut tree = RouteTree { nodes: vec![root], root: NodeId(0), warnings };

  for (meta, module) in metas {
    attach(&mut tree, meta, module)?;
  }

  finalize(&mut tree)?;
  Ok(tree)
}

fn attach(tree: &mut RouteTree, meta: RouteFileMeta, module: ModuleRef) -> Result<(), RouteError> {
  tree.warnings.extend(meta.warnings.iter().cloned());

  let mut cursor = tree.root;
  for classified in &meta.segments {
    cursor = descend_or_create(tree, cursor, &classified.segment, &meta.file);
    if let Some(mode) = classified.mode {
      match tree.node(cursor).declared_mode {
        None => tree.node_mut(cursor).declared_mode = Some(mode),
        Some(existing) if existing != mode => {
          let path = tree.effective_path(cursor);
          tree.warnings.push(format!(
            "conflicting render-mode suffixes on \"{path}\" (\"{}\" vs \"{}\"), keeping +{}",
            tree.node(cursor).origin,
            meta.file,
            existing.suffix()
          ));
        }
        Some(_) => {}
      }
    }
  }
  if let Some(leaf) = &meta.leaf {
    cursor = descend_or_create(tree, cursor, leaf, &meta.file);
  }

  let entry = RouteEntry {
    route_id: meta.route_id,
    file: meta.file,
    kind: meta.kind,
    declared_mode: meta.mode,
    module,
  };
  let route = tree.effective_path(cursor);
  let node = tree.node_mut(cursor);
  let slot = match meta.kind {
    NodeKind::Layout => &mut node.layout,
    NodeKind::Middleware => &mut node.middleware,
    NodeKind::Page | NodeKind::ApiEndpoint => &mut node.page,
    NodeKind::NotFound => &mut node.not_found,
  };
  if let Some(existing) = slot {
    return Err(RouteError::DuplicateRoute {
      route,
      first: existing.file.clone(),
      second: entry.file,
    });
  }
  *slot = Some(entry);
  Ok(())
}

fn descend_or_create(tree: &mut RouteTree, parent: NodeId, segment: &Segment, file: &str) -> NodeId {
  if let Some(&existing) =
    tree.node(parent).children.iter().find(|&&c| tree.node(c).segment == *segment)
  {
    return existing;
  }
  let id = NodeId(tree.nodes.len());
  let mut segments = tree.node(parent).segments.clone();
  segments.push(segment.clone());
  tree.nodes.push(RouteNode {
    id,
    parent: Some(parent),
    segment: segment.clone(),
    segments,
    children: Vec::new(),
    layout: None,
    middleware: None,
    page: None,
    not_found: None,
    boundary: None,
    declared_mode: None,
    origin: file.to_string(),
  });
  tree.node_mut(parent).children.push(id);
  id
}

/// Post-fold passes: sibling ambiguity, cross-group duplicates, not-found
/// boundaries, dead-branch warnings.
fn finalize(tree: &mut RouteTree) -> Result<(), RouteError> {
  // Boundaries: parents always precede children in the arena, so one forward
  // pass suffices. Groups are erased from the URL, so a boundary held by a
  // group level also guards its nearest non-group ancestor.
  for index in 0..tree.nodes.len() {
    let id = NodeId(index);
    let inherited = tree.node(id).parent.and_then(|p| tree.node(p).boundary);
    let own = if tree.node(id).not_found.is_some() {
      Some(id)
    } else {
      group_held_boundary(tree, id)
    };
    tree.node_mut(id).boundary = own.or(inherited);
  }

  let mut duplicates: BTreeMap<String, String> = BTreeMap::new();
  let mut boundary_duplicates: BTreeMap<String, String> = BTreeMap::new();
  let mut new_warnings = Vec::new();

  for index in 0..tree.nodes.len() {
    let id = NodeId(index);
    check_sibling_ambiguity(tree, id)?;

    let node = tree.node(id);
    if let Some(page) = &node.page {
      let key = effective_path(&node.segments);
      if let Some(first) = duplicates.get(&key) {
        return Err(RouteError::DuplicateRoute {
          route: key,
          first: first.clone(),
          second: page.file.clone(),
        });
      }
      duplicates.insert(key, page.file.clone());
    }

    if let Some(not_found) = &node.not_found {
      let key = effective_path(&node.segments);
      if let Some(first) = boundary_duplicates.get(&key) {
        return Err(RouteError::DuplicateRoute {
          route: key,
          first: first.clone(),
          second: not_found.file.clone(),
        });
      }
      boundary_duplicates.insert(key, not_found.file.clone());
    }

    if matches!(node.segment.kind, SegmentKind::CatchAll | SegmentKind::OptionalCatchAll)
      && !node.children.is_empty()
    {
      new_warnings.push(format!(
        "routes nested beneath the catch-all \"{}\" can never match",
        effective_path(&node.segments)
      ));
    }

    if node.layout.is_some() && !has_routable_descendant(tree, id) {
      new_warnings.push(format!(
        "the layout \"{}\" has no routable descendant",
        node.layout.as_ref().map_or("", |l| l.file.as_str())
      ));
    }
  }

  tree.warnings.extend(new_warnings);
  Ok(())
}

fn check_sibling_ambiguity(tree: &RouteTree, id: NodeId) -> Result<(), RouteError> {
  let children = tree.effective_children(id);
  let mut dynamic: Option<&RouteNode> = None;
  let mut catch_all: Option<&RouteNode> = None;

  for (child, _) in children {
    let node = tree.node(child);
    match node.segment.kind {
      SegmentKind::Dynamic => {
        if let Some(existing) = dynamic {
          if existing.segment.param != node.segment.param {
            return Err(RouteError::AmbiguousRoute {
              position: effective_path(&tree.node(id).segments),
              first: existing.origin.clone(),
              second: node.origin.clone(),
            });
          }
        } else {
          dynamic = Some(node);
        }
      }
      SegmentKind::CatchAll | SegmentKind::OptionalCatchAll => {
        if let Some(existing) = catch_all {
          return Err(RouteError::AmbiguousRoute {
            position: effective_path(&tree.node(id).segments),
            first: existing.origin.clone(),
            second: node.origin.clone(),
          });
        }
        catch_all = Some(node);
      }
      _ => {}
    }
  }

  // A dynamic segment and a catch-all at the same position cannot be ordered
  // by the tie-break, the build rejects the pair outright.
  if let (Some(dyn_node), Some(catch_node)) = (dynamic, catch_all) {
    return Err(RouteError::AmbiguousRoute {
      position: effective_path(&tree.node(id).segments),
      first: dyn_node.origin.clone(),
      second: catch_node.origin.clone(),
    });
  }

  Ok(())
}

/// Nearest not-found boundary reachable from `id` through group levels only.
fn group_held_boundary(tree: &RouteTree, id: NodeId) -> Option<NodeId> {
  for &child in &tree.node(id).children {
    if tree.node(child).segment.kind != SegmentKind::Group {
      continue;
    }
    if tree.node(child).not_found.is_some() {
      return Some(child);
    }
    if let Some(found) = group_held_boundary(tree, child) {
      return Some(found);
    }
  }
  None
}

fn has_routable_descendant(tree: &RouteTree, id: NodeId) -> bool {
  let node = tree.node(id);
  if node.page.is_some() || node.not_found.is_some() {
    return true;
  }
  node.children.iter().any(|&c| has_routable_descendant(tree, c))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file(path: &str) -> RouteFile {
    RouteFile { path: path.into(), module: ModuleRef::default() }
  }

  fn build(paths: &[&str]) -> Result<RouteTree, RouteError> {
    build_tree(paths.iter().map(|p| file(p)).collect(), &RouterConfig::default())
  }

  #[test]
  fn builds_nested_levels() {
    let tree = build(&["index.tsx", "blog/_layout.tsx", "blog/[slug].tsx"]).expect("tree");
    assert_eq!(tree.node(tree.root).page.as_ref().map(|p| p.route_id.as_str()), Some("/index"));
    let blog = tree.node(tree.root).children[0];
    assert!(tree.node(blog).layout.is_some());
    let slug = tree.node(blog).children[0];
    assert_eq!(tree.node(slug).segment.kind, SegmentKind::Dynamic);
    assert!(tree.node(slug).page.is_some());
  }

  #[test]
  fn index_and_named_file_share_a_level_only_on_conflict() {
    // blog.tsx and blog/index.tsx resolve to the same level, which is a
    // duplicate route.
    let err = build(&["blog.tsx", "blog/index.tsx"]).expect_err("duplicate");
    match err {
      RouteError::DuplicateRoute { route, first, second } => {
        assert_eq!(route, "/blog");
        assert_eq!(first, "blog.tsx");
        assert_eq!(second, "blog/index.tsx");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn groups_conflict_on_same_effective_path() {
    let err = build(&["(a)/settings.tsx", "(b)/settings.tsx"]).expect_err("duplicate");
    match err {
      RouteError::DuplicateRoute { route, first, second } => {
        assert_eq!(route, "/settings");
        assert!(first.contains("(a)"));
        assert!(second.contains("(b)"));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn group_boundaries_conflict_on_same_effective_path() {
    let err = build(&["(a)/+not-found.tsx", "(b)/+not-found.tsx"]).expect_err("duplicate");
    match err {
      RouteError::DuplicateRoute { route, first, second } => {
        assert_eq!(route, "/");
        assert!(first.contains("(a)"));
        assert!(second.contains("(b)"));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn sibling_dynamics_with_different_names_are_ambiguous() {
    let err = build(&["blog/[a].tsx", "blog/[b].tsx"]).expect_err("ambiguous");
    assert!(matches!(err, RouteError::AmbiguousRoute { .. }));
  }

  #[test]
  fn sibling_catch_alls_are_ambiguous() {
    let err = build(&["docs/[...a].tsx", "docs/[...b].tsx"]).expect_err("ambiguous");
    assert!(matches!(err, RouteError::AmbiguousRoute { .. }));
  }

  #[test]
  fn dynamic_beside_catch_all_is_ambiguous() {
    let err = build(&["docs/[page].tsx", "docs/[...rest].tsx"]).expect_err("ambiguous");
    assert!(matches!(err, RouteError::AmbiguousRoute { .. }));
  }

  #[test]
  fn cross_group_dynamics_are_ambiguous() {
    let err = build(&["(a)/[x].tsx", "(b)/[y].tsx"]).expect_err("ambiguous");
    assert!(matches!(err, RouteError::AmbiguousRoute { .. }));
  }

  #[test]
  fn not_found_boundary_is_recorded_and_inherited() {
    let tree =
      build(&["blog/_layout.tsx", "blog/+not-found.tsx", "blog/deep/page.tsx"]).expect("tree");
    let blog = tree.node(tree.root).children[0];
    assert_eq!(tree.node(blog).boundary, Some(blog));
    let deep = tree
      .node(blog)
      .children
      .iter()
      .copied()
      .find(|&c| tree.node(c).segment.raw == "deep")
      .expect("deep level");
    assert_eq!(tree.node(deep).boundary, Some(blog));
    assert_eq!(tree.node(tree.root).boundary, None);
  }

  #[test]
  fn dead_layout_warns_but_builds() {
    let tree = build(&["empty/_layout.tsx", "index.tsx"]).expect("tree");
    assert!(tree.warnings.iter().any(|w| w.contains("no routable descendant")));
  }

  #[test]
  fn routes_beneath_catch_all_warn() {
    let tree = build(&["docs/[...rest]/extra.tsx", "docs/[...rest]/index.tsx"]).expect("tree");
    assert!(tree.warnings.iter().any(|w| w.contains("can never match")));
  }

  #[test]
  fn rebuild_is_idempotent() {
    let paths = [
      "index.tsx",
      "blog/_layout.tsx",
      "blog/[slug].tsx",
      "blog/+not-found.tsx",
      "(shop)/cart.tsx",
      "docs/[[...path]].tsx",
    ];
    let first = build(&paths).expect("first");
    let second = build(&paths).expect("second");
    let a = serde_json::to_value(first.manifest()).expect("manifest a");
    let b = serde_json::to_value(second.manifest()).expect("manifest b");
    assert_eq!(a, b);
    assert_eq!(first.len(), second.len());
  }

  #[test]
  fn manifest_lists_entries_by_route_id() {
    let tree = build(&["blog/_layout+ssr.tsx", "blog/[slug]+ssg.tsx"]).expect("tree");
    let manifest = tree.manifest();
    let layout = manifest.routes.get("/blog/_layout").expect("layout entry");
    assert_eq!(layout.kind, NodeKind::Layout);
    assert_eq!(layout.mode, Some("ssr"));
    let page = manifest.routes.get("/blog/[slug]").expect("page entry");
    assert_eq!(page.mode, Some("ssg"));
    assert_eq!(page.path, "/blog/[slug]");
  }

  #[test]
  fn ignored_files_become_warnings() {
    let tree = build(&["index.tsx", "blog/+html.tsx"]).expect("tree");
    assert!(tree.warnings.iter().any(|w| w.contains("+html")));
  }
}
