/* src/router/src/not_found.rs */

use crate::matcher::{Matched, MatchedChain, MatchedRole, Params};
use crate::tree::{NodeId, RouteTree};

/// Chain rendered when no leaf matches: root → … → boundary ancestor →
/// not-found node.
#[derive(Debug, Clone)]
pub struct NotFoundChain {
  pub chain: MatchedChain,
  /// True when no boundary exists up to the root; the serving layer falls
  /// back to its process-wide default not-found view.
  pub default_view: bool,
}

/// Walk upward from the deepest level reached until a level with a recorded
/// not-found boundary is found. Boundaries are recorded at build time, so
/// this is a single lookup plus a parent walk and always terminates within
/// the tree depth.
pub fn resolve_not_found(tree: &RouteTree, deepest: NodeId) -> NotFoundChain {
  let Some(boundary) = tree.node(deepest).boundary else {
    let mut elements = Vec::new();
    push_layout(tree, tree.root, &mut elements);
    return NotFoundChain {
      chain: MatchedChain { levels: vec![tree.root], elements, params: Params::default() },
      default_view: true,
    };
  };

  let mut levels = Vec::new();
  let mut cursor = Some(boundary);
  while let Some(level) = cursor {
    levels.push(level);
    cursor = tree.node(level).parent;
  }
  levels.reverse();

  let mut elements = Vec::new();
  for &level in &levels {
    push_layout(tree, level, &mut elements);
  }
  if let Some(not_found) = &tree.node(boundary).not_found {
    elements.push(Matched {
      level: boundary,
      role: MatchedRole::NotFound,
      route_id: not_found.route_id.clone(),
      declared_mode: not_found.declared_mode,
      module: not_found.module.clone(),
      params: Params::default(),
    });
  }

  NotFoundChain {
    chain: MatchedChain { levels, elements, params: Params::default() },
    default_view: false,
  }
}

fn push_layout(tree: &RouteTree, level: NodeId, elements: &mut Vec<Matched>) {
  if let Some(layout) = &tree.node(level).layout {
    elements.push(Matched {
      level,
      role: MatchedRole::Layout,
      route_id: layout.route_id.clone(),
      declared_mode: layout.declared_mode,
      module: layout.module.clone(),
      params: Params::default(),
    });
  }
}
