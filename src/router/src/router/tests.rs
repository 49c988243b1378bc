/* src/router/src/router/tests.rs */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::loader::{LoaderInput, LoaderOutcome};
use crate::module::ModuleRef;

fn file(path: &str, module: ModuleRef) -> RouteFile {
  RouteFile { path: path.into(), module }
}

fn counting(counter: Arc<AtomicUsize>, value: serde_json::Value) -> ModuleRef {
  ModuleRef::with_loader(move |_input| {
    let counter = Arc::clone(&counter);
    let value = value.clone();
    async move {
      counter.fetch_add(1, Ordering::SeqCst);
      LoaderOutcome::Data(value)
    }
  })
}

fn router(files: Vec<RouteFile>) -> FileRouter {
  FileRouter::new(files, RouterConfig::default()).expect("router")
}

#[tokio::test]
async fn serves_a_page_with_its_layout_chain() {
  let app = router(vec![
    file("blog/_layout.tsx", ModuleRef::with_loader(|_input| async {
      LoaderOutcome::Data(serde_json::json!({ "nav": ["home"] }))
    })),
    file("blog/[slug].tsx", ModuleRef::with_loader(|input: LoaderInput| async move {
      LoaderOutcome::Data(serde_json::json!({ "slug": input.params.get("slug") }))
    })),
  ]);

  let response = app.respond("/blog/hello", None).await.expect("response");
  assert_eq!(response.status, 200);
  let ResponseKind::Page { matches, mode } = response.kind else { panic!("expected page") };
  assert_eq!(mode, RenderMode::Static);
  assert_eq!(matches.len(), 2);
  assert_eq!(matches[0].route_id, "/blog/_layout");
  assert_eq!(matches[1].route_id, "/blog/[slug]");
  assert_eq!(
    serde_json::to_value(&matches[1].data).expect("json"),
    serde_json::json!({ "slug": "hello" })
  );
}

#[tokio::test]
async fn redirect_becomes_a_redirect_response_with_headers() {
  let app = router(vec![file("account.tsx", ModuleRef::with_loader(|input: LoaderInput| async move {
    input.headers.set("set-cookie", "flash=denied");
    LoaderOutcome::redirect("/login", 307)
  }))]);

  let response = app.respond("/account", None).await.expect("response");
  assert_eq!(response.status, 307);
  let ResponseKind::Redirect { location } = response.kind else { panic!("expected redirect") };
  assert_eq!(location, "/login");
  assert_eq!(response.headers, vec![("set-cookie".to_string(), "flash=denied".to_string())]);
}

#[tokio::test]
async fn unmatched_path_renders_the_nearest_boundary() {
  let app = router(vec![
    file("blog/_layout.tsx", ModuleRef::view()),
    file("blog/+not-found.tsx", ModuleRef::view()),
    file("blog/first-post.tsx", ModuleRef::view()),
  ]);

  let response = app.respond("/blog/missing", None).await.expect("response");
  assert_eq!(response.status, 404);
  let ResponseKind::NotFound { matches, default_view } = response.kind else {
    panic!("expected not-found")
  };
  assert!(!default_view);
  let ids: Vec<&str> = matches.iter().map(|m| m.route_id.as_str()).collect();
  assert_eq!(ids, vec!["/blog/_layout", "/blog/+not-found"]);
}

#[tokio::test]
async fn loader_not_found_reuses_ancestor_results() {
  let layout_calls = Arc::new(AtomicUsize::new(0));
  let app = router(vec![
    file("docs/_layout.tsx", counting(Arc::clone(&layout_calls), serde_json::json!({ "nav": true }))),
    file("docs/+not-found.tsx", ModuleRef::view()),
    file("docs/[page]+ssr.tsx", ModuleRef::with_loader(|_input| async { LoaderOutcome::NotFound })),
  ]);

  let response = app.respond("/docs/ghost", None).await.expect("response");
  assert_eq!(response.status, 404);
  let ResponseKind::NotFound { matches, default_view } = response.kind else {
    panic!("expected not-found")
  };
  assert!(!default_view);
  assert_eq!(matches[0].route_id, "/docs/_layout");
  assert_eq!(matches[1].route_id, "/docs/+not-found");
  // The layout loader ran for the original chain and was reused, not re-run.
  assert_eq!(layout_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_boundary_falls_back_to_the_default_view() {
  let app = router(vec![file("about.tsx", ModuleRef::view())]);

  let response = app.respond("/nope", None).await.expect("response");
  assert_eq!(response.status, 404);
  let ResponseKind::NotFound { default_view, .. } = response.kind else {
    panic!("expected not-found")
  };
  assert!(default_view);
}

#[tokio::test]
async fn api_endpoint_invokes_its_handler() {
  let app = router(vec![file(
    "api/users/[id]+api.tsx",
    ModuleRef::with_handler(|input: LoaderInput| async move {
      Ok(serde_json::json!({ "id": input.params.get("id"), "name": "ada" }))
    }),
  )]);

  let response = app.respond("/api/users/7", None).await.expect("response");
  assert_eq!(response.status, 200);
  let ResponseKind::Api { body } = response.kind else { panic!("expected api") };
  assert_eq!(body, serde_json::json!({ "id": "7", "name": "ada" }));
}

#[tokio::test]
async fn rebuild_swaps_the_tree_and_clears_the_cache() {
  let calls = Arc::new(AtomicUsize::new(0));
  let files = |calls: &Arc<AtomicUsize>| {
    vec![file("home+ssg.tsx", counting(Arc::clone(calls), serde_json::json!("v1")))]
  };

  let app = router(files(&calls));
  app.respond("/home", None).await.expect("first");
  app.respond("/home", None).await.expect("cached");
  assert_eq!(calls.load(Ordering::SeqCst), 1);

  app.rebuild(files(&calls)).expect("rebuild");
  app.respond("/home", None).await.expect("after rebuild");
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_rebuild_keeps_the_previous_tree() {
  let app = router(vec![file("a.tsx", ModuleRef::view())]);
  let err = app
    .rebuild(vec![
      file("x/[id].tsx", ModuleRef::view()),
      file("x/[slug].tsx", ModuleRef::view()),
    ])
    .expect_err("ambiguous siblings");
  assert!(matches!(err, RouteError::AmbiguousRoute { .. }));
  assert!(app.last_build_error().is_some());

  // The old tree still serves.
  let response = app.respond("/a", None).await.expect("response");
  assert_eq!(response.status, 200);

  app.rebuild(vec![file("a.tsx", ModuleRef::view())]).expect("recover");
  assert!(app.last_build_error().is_none());
}

#[tokio::test]
async fn aborted_context_surfaces_a_client_abort() {
  let app = router(vec![file("slow.tsx", ModuleRef::with_loader(|_input| async {
    LoaderOutcome::Data(serde_json::json!(null))
  }))]);

  let ctx = RequestContext::new("/slow");
  ctx.abort_handle().store(true, std::sync::atomic::Ordering::SeqCst);
  let err = app.respond_ctx(ctx).await.expect_err("abort");
  assert_eq!(err.code(), "CLIENT_ABORT");
  assert_eq!(err.status(), 499);
}
