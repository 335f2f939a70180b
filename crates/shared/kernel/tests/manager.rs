use masonry_composition::{CompositionProvider, PartDefinition};
use masonry_domain::config::{AppConfig, ExtensionEntry};
use masonry_kernel::extensibility::{
    ExtensionLoader, ExtensionManager, ExtensionModule, ManifestModuleLoader, ModuleRegistry,
    PartLoadError, ReferencedModules,
};
use masonry_vfs::{
    AggregateVirtualPathProvider, EmbeddedResource, NullFileProvider, VirtualFileProvider, VirtualPath,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;

static RESOURCES: [EmbeddedResource; 3] = [
    EmbeddedResource::new(
        "Sample.Greeting.Views.Greeting.Index.cshtml",
        b"\n@model Sample.Greeting.Card\n<h1>@Model.Text</h1>\n",
    ),
    EmbeddedResource::new("Sample.Greeting.Views.Greeting._Card.cshtml", b"<div></div>"),
    EmbeddedResource::new("Sample.Greeting.Content.greeting.css", b"h1 { color: teal }"),
];

#[derive(Debug)]
struct GreetingModule;

impl ExtensionModule for GreetingModule {
    fn name(&self) -> &'static str {
        "Sample.Greeting"
    }

    fn parts(&self) -> Vec<Result<PartDefinition, PartLoadError>> {
        Vec::new()
    }

    fn resources(&self) -> &'static [EmbeddedResource] {
        &RESOURCES
    }
}

fn register(dir: &Path, config: &AppConfig) -> (ExtensionManager, AggregateVirtualPathProvider) {
    let registry = ModuleRegistry::new().with(Arc::new(GreetingModule));
    let loader = ExtensionLoader::new(
        dir,
        Arc::new(ManifestModuleLoader::new(registry)),
        Arc::new(CompositionProvider::default()),
        Arc::new(ReferencedModules::new()),
    );
    let vfs = AggregateVirtualPathProvider::new(NullFileProvider);
    let manager = ExtensionManager::register(config, loader, &vfs).unwrap();
    (manager, vfs)
}

fn read(vfs: &AggregateVirtualPathProvider, path: &str) -> String {
    String::from_utf8(vfs.get_file(path).unwrap().read_to_end().unwrap()).unwrap()
}

#[test]
fn discovered_views_are_rewritten_and_content_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("greeting.extension.toml"), "module = \"Sample.Greeting\"\n").unwrap();

    let (manager, vfs) = register(dir.path(), &AppConfig::default());
    assert_eq!(manager.loader().assemblies().len(), 1);
    assert_eq!(vfs.len(), 2);

    let view = read(&vfs, "~/Views/Greeting/Index.cshtml");
    assert_eq!(
        view,
        "@using Masonry.Views\n\
         @using Masonry.Views.Html\n\
         @using Masonry.Extensibility\n\
         @inherits Masonry.Views.ViewPage<Sample.Greeting.Card>\n\
         @{ Layout = \"~/Views/Shared/_Layout.cshtml\"; }\n\
         <h1>@Model.Text</h1>\n"
    );

    let partial = read(&vfs, "/Views/Greeting/_Card.cshtml");
    assert!(partial.contains("@inherits Masonry.Views.ViewPage\n"));
    assert!(!partial.contains("Layout"));

    assert_eq!(read(&vfs, "/Content/greeting.css"), "h1 { color: teal }");
    assert!(manager.content().file_exists(&VirtualPath::parse("/Content/greeting.css").unwrap()));
}

#[test]
fn explicit_list_is_deduplicated_and_uses_its_namespace() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("greeting.extension.toml"), "module = \"Sample.Greeting\"\n").unwrap();

    let mut config = AppConfig::default();
    config.extensibility.automatic_discovery = false;
    config.extensibility.extensions = vec![
        ExtensionEntry { name: "greeting.extension.toml".into(), namespace: "Sample.Greeting.Views".into() },
        ExtensionEntry { name: "GREETING.extension.toml".into(), namespace: "Sample.Greeting".into() },
        ExtensionEntry { name: "missing.extension.toml".into(), namespace: "Missing".into() },
    ];

    let (manager, vfs) = register(dir.path(), &config);

    assert_eq!(manager.loader().assemblies().len(), 1);
    assert_eq!(manager.views().mappings().len(), 1);
    assert!(vfs.file_exists("/Greeting/Index.cshtml"));
    assert!(!vfs.file_exists("/Views/Greeting/Index.cshtml"));
}

#[test]
fn invalid_site_root_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.views.site_root = "/../outside".into();

    let registry = ModuleRegistry::new();
    let loader = ExtensionLoader::new(
        dir.path(),
        Arc::new(ManifestModuleLoader::new(registry)),
        Arc::new(CompositionProvider::default()),
        Arc::new(ReferencedModules::new()),
    );
    let vfs = AggregateVirtualPathProvider::new(NullFileProvider);
    let err = ExtensionManager::register(&config, loader, &vfs).unwrap_err();
    assert_eq!(err.kind(), "Vfs");
}
