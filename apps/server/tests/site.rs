use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use masonry::composition::PartDefinition;
use masonry::domain::config::AppConfig;
use masonry::kernel::extensibility::{ExtensionModule, ModuleRegistry, PartLoadError};
use masonry::kernel::mvc::MvcError;
use masonry::vfs::AggregateVirtualPathProvider;
use masonry_server::Server;
use masonry_server::view::{ViewEngine, ViewRequest};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const LAYOUT: &str = "<title>@ViewBag.Brand</title>\
<nav>@Html.HeaderActions()</nav>\
<menu>@Html.HeaderActionGroups()</menu>\
<aside>@Html.SidebarActions()</aside>\
<main>@RenderBody()</main>\
<footer>@ViewBag.Copyright</footer>";

fn site_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public");
    fs::create_dir_all(public.join("Views/Shared")).unwrap();
    fs::create_dir_all(public.join("Content")).unwrap();
    fs::write(public.join("Views/Shared/_Layout.cshtml"), LAYOUT).unwrap();
    fs::write(public.join("Content/site.css"), "body { margin: 0; }").unwrap();

    let extensions = dir.path().join("extensions");
    fs::create_dir_all(&extensions).unwrap();
    fs::write(extensions.join("help.extension.toml"), "module = \"Masonry.Help\"\n").unwrap();
    dir
}

fn config(dir: &TempDir) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.server.content_root = dir.path().join("public");
    cfg.extensibility.directory = dir.path().join("extensions");
    cfg.ui.brand = "Test Brand".to_owned();
    cfg.ui.copyright = "Test Co".to_owned();
    cfg
}

fn app(dir: &TempDir) -> Router {
    Server::builder().config(config(dir)).build().unwrap().router()
}

async fn get(router: &Router, uri: &str) -> Response {
    router.clone().oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap()
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn help_index_renders_inside_the_site_layout() {
    let dir = site_dir();
    let router = app(&dir);

    let response = get(&router, "/help").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");

    let html = text(response).await;
    assert!(html.starts_with("<title>Test Brand</title>"), "{html}");
    assert!(html.contains("<nav><a href=\"/help\">Help</a></nav><menu></menu>"), "{html}");
    assert!(
        html.contains("<aside><nav class=\"sidebar-actions\"><a href=\"/help\">Help</a></nav></aside>"),
        "{html}"
    );
    assert!(html.contains("<section class=\"help\">"), "{html}");
    assert!(html.contains("<pre># Help"), "{html}");
    assert!(html.ends_with("<footer>Test Co</footer>"), "{html}");
    assert!(!html.contains("@inherits"), "{html}");
}

#[tokio::test]
async fn help_pages_resolve_from_the_route_or_the_query() {
    let dir = site_dir();
    let router = app(&dir);

    for uri in ["/help/page/Extensions", "/Help/Page?page=Extensions"] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let html = text(response).await;
        assert!(html.contains("data-page=\"Extensions\""), "{uri}: {html}");
        assert!(html.contains("<pre># Writing extensions"), "{uri}: {html}");
    }

    let html = text(get(&router, "/help/page/Unknown").await).await;
    assert!(html.contains("<pre># Help"), "{html}");
}

#[tokio::test]
async fn static_files_carry_an_etag() {
    let dir = site_dir();
    let router = app(&dir);

    let response = get(&router, "/Content/site.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    let etag = response.headers()[header::ETAG].clone();
    assert_eq!(text(response).await, "body { margin: 0; }");

    let request = Request::get("/Content/site.css")
        .header(header::IF_NONE_MATCH, etag)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn embedded_content_is_served_but_templates_are_not() {
    let dir = site_dir();
    let router = app(&dir);

    let response = get(&router, "/Content/help.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains(".help"));

    for uri in ["/Views/Help/Index.cshtml", "/Views/Shared/_Layout.cshtml"] {
        assert_eq!(get(&router, uri).await.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let dir = site_dir();
    let router = app(&dir);

    for uri in ["/", "/nowhere", "/help/delete", "/help/page/a/b"] {
        assert_eq!(get(&router, uri).await.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn modules_without_a_manifest_stay_dormant() {
    let dir = site_dir();
    fs::remove_file(dir.path().join("extensions/help.extension.toml")).unwrap();
    let router = app(&dir);

    assert_eq!(get(&router, "/help").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/Content/help.css").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manifests_naming_unlinked_modules_are_skipped() {
    let dir = site_dir();
    let server = Server::builder()
        .config(config(&dir))
        .modules(ModuleRegistry::new())
        .build()
        .unwrap();

    assert!(server.state().extensions.loader().assemblies().is_empty());
    assert_eq!(get(&server.router(), "/help").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&server.router(), "/health").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_content_root_still_serves_extensions() {
    let dir = site_dir();
    fs::remove_dir_all(dir.path().join("public")).unwrap();
    let mut cfg = config(&dir);
    cfg.views.layout = None;
    let router = Server::builder().config(cfg).build().unwrap().router();

    let response = get(&router, "/help").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = text(response).await;
    assert!(html.starts_with("<section class=\"help\">"), "{html}");
}

#[derive(Debug)]
struct OutlineEngine;

impl ViewEngine for OutlineEngine {
    fn render(&self, vfs: &AggregateVirtualPathProvider, request: &ViewRequest<'_>) -> Result<String, MvcError> {
        let found = vfs.file_exists(request.path);
        Ok(format!("outline {} {found} {}", request.path, request.model.unwrap_or_default()))
    }
}

#[derive(Debug)]
struct OutlineModule;

impl ExtensionModule for OutlineModule {
    fn name(&self) -> &'static str {
        "Sample.Outline"
    }

    fn parts(&self) -> Vec<Result<PartDefinition, PartLoadError>> {
        vec![Ok(PartDefinition::instance::<dyn ViewEngine>(Arc::new(OutlineEngine)).build())]
    }
}

#[tokio::test]
async fn an_extension_view_engine_replaces_the_default() {
    let dir = site_dir();
    fs::write(dir.path().join("extensions/outline.extension.toml"), "module = \"Sample.Outline\"\n").unwrap();
    let server = Server::builder()
        .config(config(&dir))
        .modules(masonry::modules().with(Arc::new(OutlineModule)))
        .build()
        .unwrap();

    let html = text(get(&server.router(), "/help/page/Extensions").await).await;
    assert!(html.starts_with("outline /Views/Help/Index.cshtml true # Writing extensions"), "{html}");
    assert!(!html.contains("<title>"), "{html}");
}
