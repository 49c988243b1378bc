/* src/router/src/segment.rs */

use std::sync::LazyLock;

use regex::Regex;

use crate::mode::RenderMode;
use crate::tree::NodeKind;

static OPTIONAL_CATCH_ALL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\[\[\.\.\.([^\[\]/]+)\]\]$").expect("optional catch-all regex"));
static DYNAMIC_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\[([^\[\]/]+)\]$").expect("dynamic regex"));
static GROUP_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\(([^/()]+)\)$").expect("group regex"));
static MODE_SUFFIX_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(.+)\+(ssg|ssr|spa|api)$").expect("mode suffix regex"));
static EXTENSION_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\.[jt]sx?$").expect("extension regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
  Static,
  Dynamic,
  CatchAll,
  OptionalCatchAll,
  Group,
}

/// One slash-delimited component of a route's file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
  pub raw: String,
  pub kind: SegmentKind,
  /// Param name for dynamic and catch-all segments, group name for groups.
  pub param: Option<String>,
  /// Literal text for static segments.
  pub literal: Option<String>,
}

impl Segment {
  /// Synthetic segment for the routes root.
  pub(crate) fn root() -> Self {
    Self { raw: String::new(), kind: SegmentKind::Static, param: None, literal: Some(String::new()) }
  }
}

/// Parse one path component into a segment descriptor.
///
/// `[name]` -> dynamic, `[...name]` -> catch-all, `[[...name]]` -> optional
/// catch-all, `(name)` -> group, anything else -> static.
pub fn parse_segment(raw: &str) -> Segment {
  if let Some(caps) = OPTIONAL_CATCH_ALL_RE.captures(raw) {
    return Segment {
      raw: raw.to_string(),
      kind: SegmentKind::OptionalCatchAll,
      param: caps.get(1).map(|m| m.as_str().to_string()),
      literal: None,
    };
  }
  if let Some(caps) = DYNAMIC_RE.captures(raw) {
    let inner = caps.get(1).map_or("", |m| m.as_str());
    if let Some(name) = inner.strip_prefix("...") {
      return Segment {
        raw: raw.to_string(),
        kind: SegmentKind::CatchAll,
        param: Some(name.to_string()),
        literal: None,
      };
    }
    return Segment {
      raw: raw.to_string(),
      kind: SegmentKind::Dynamic,
      param: Some(inner.to_string()),
      literal: None,
    };
  }
  if let Some(caps) = GROUP_RE.captures(raw) {
    return Segment {
      raw: raw.to_string(),
      kind: SegmentKind::Group,
      param: caps.get(1).map(|m| m.as_str().to_string()),
      literal: None,
    };
  }
  Segment {
    raw: raw.to_string(),
    kind: SegmentKind::Static,
    param: None,
    literal: Some(raw.to_string()),
  }
}

/// Split `name+ssg` / `dashboard+ssr` / `users+api` into the bare name and
/// its suffix. Returns `None` when the component carries no suffix;
/// `+not-found` never matches because `not-found` is not a mode.
pub(crate) fn split_mode_suffix(component: &str) -> Option<(&str, &str)> {
  let caps = MODE_SUFFIX_RE.captures(component)?;
  let name = caps.get(1)?.as_str();
  let suffix = caps.get(2)?.as_str();
  Some((name, suffix))
}

/// A directory component of a classified route file: the parsed segment plus
/// a render mode declared by a directory suffix (`admin+spa/`).
#[derive(Debug, Clone)]
pub(crate) struct ClassifiedSegment {
  pub segment: Segment,
  pub mode: Option<RenderMode>,
}

#[derive(Debug, Clone)]
pub(crate) struct RouteFileMeta {
  /// Path exactly as the discovery collaborator supplied it.
  pub file: String,
  /// Canonical id: suffix-stripped path with groups kept, e.g.
  /// "/blog/_layout" or "/(a)/settings/index".
  pub route_id: String,
  /// Directory components, routes root excluded.
  pub segments: Vec<ClassifiedSegment>,
  pub kind: NodeKind,
  /// Terminal segment contributed by the file's base name. `None` for
  /// layouts, not-found boundaries, middleware and `index` files.
  pub leaf: Option<Segment>,
  /// Render mode declared by a suffix on the base name.
  pub mode: Option<RenderMode>,
  pub warnings: Vec<String>,
}

pub(crate) enum FileClass {
  Route(Box<RouteFileMeta>),
  Ignored { file: String, reason: String },
}

fn ignored(file: &str, reason: impl Into<String>) -> FileClass {
  FileClass::Ignored { file: file.to_string(), reason: reason.into() }
}

/// Classify one discovered file path into its tree position and node kind.
pub(crate) fn classify_file(raw_path: &str, routes_root: &str) -> FileClass {
  let mut path = raw_path.trim_start_matches("./");
  if let Some(stripped) = path.strip_prefix(&format!("{routes_root}/")) {
    path = stripped;
  }
  let path = path.trim_start_matches('/');
  let stripped = EXTENSION_RE.replace(path, "");

  let mut components: Vec<&str> = stripped.split('/').filter(|c| !c.is_empty()).collect();
  let Some(base) = components.pop() else {
    return ignored(raw_path, "empty route path");
  };

  let mut warnings = Vec::new();
  let mut segments = Vec::with_capacity(components.len());
  for component in components {
    let (name, mode) = match split_mode_suffix(component) {
      Some((name, "api")) => {
        warnings.push(format!(
          "\"{raw_path}\": the +api suffix only applies to file names, ignoring it on directory \"{component}\""
        ));
        (name, None)
      }
      Some((name, suffix)) => (name, RenderMode::from_suffix(suffix)),
      None => (component, None),
    };
    segments.push(ClassifiedSegment { segment: parse_segment(name), mode });
  }

  let (base, suffix) = match split_mode_suffix(base) {
    Some((name, suffix)) => (name, Some(suffix)),
    None => (base, None),
  };
  let mode = suffix.and_then(RenderMode::from_suffix);
  let is_api = suffix == Some("api");

  let (kind, leaf) = match base {
    "_layout" => {
      if is_api {
        return ignored(raw_path, "a layout cannot be an API endpoint");
      }
      (NodeKind::Layout, None)
    }
    "+not-found" => (NodeKind::NotFound, None),
    "_middleware" => (NodeKind::Middleware, None),
    "index" => (if is_api { NodeKind::ApiEndpoint } else { NodeKind::Page }, None),
    _ if base.starts_with('+') => {
      return ignored(raw_path, "route names cannot start with '+', except for +not-found");
    }
    _ if base.starts_with('_') => {
      return ignored(raw_path, "files starting with '_' are not routable");
    }
    _ => {
      let segment = parse_segment(base);
      if segment.kind == SegmentKind::Group {
        return ignored(raw_path, "group segments must be directories");
      }
      (if is_api { NodeKind::ApiEndpoint } else { NodeKind::Page }, Some(segment))
    }
  };

  let mut id_parts: Vec<&str> =
    segments.iter().map(|c| c.segment.raw.as_str()).collect();
  id_parts.push(base);
  let route_id = format!("/{}", id_parts.join("/"));

  FileClass::Route(Box::new(RouteFileMeta {
    file: raw_path.to_string(),
    route_id,
    segments,
    kind,
    leaf,
    mode,
    warnings,
  }))
}
