use crate::cache::CacheLookup;
use crate::file::VirtualFile;
use crate::path::VirtualPath;
use crate::provider::VirtualFileProvider;
use crate::view::ViewGenerator;
use chrono::{DateTime, Utc};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A file compiled into an extension module, addressed by its qualified name
/// (`Masonry.Help.Views.Help.Index.cshtml`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedResource {
    name: &'static str,
    data: &'static [u8],
}

impl EmbeddedResource {
    #[must_use]
    pub const fn new(name: &'static str, data: &'static [u8]) -> Self {
        Self { name, data }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn data(&self) -> &'static [u8] {
        self.data
    }
}

impl fmt::Debug for EmbeddedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedResource")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Binds the resources of one assembly to the site root: a resource named
/// `{namespace}.Views.Home.Index.cshtml` is served at `/Views/Home/Index.cshtml`.
#[derive(Debug, Clone)]
pub struct NamespaceMapping {
    assembly: Cow<'static, str>,
    namespace: Cow<'static, str>,
    resources: &'static [EmbeddedResource],
}

impl NamespaceMapping {
    pub fn new(
        assembly: impl Into<Cow<'static, str>>,
        namespace: impl Into<Cow<'static, str>>,
        resources: &'static [EmbeddedResource],
    ) -> Self {
        Self { assembly: assembly.into(), namespace: namespace.into(), resources }
    }

    #[must_use]
    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resource names relative to the namespace, lower-cased and dot-separated.
    fn relative_names(&self) -> impl Iterator<Item = (String, &'static EmbeddedResource)> + '_ {
        let prefix = format!("{}.", self.namespace);
        self.resources.iter().filter_map(move |resource| {
            let name = resource.name;
            let head = name.get(..prefix.len())?;
            head.eq_ignore_ascii_case(&prefix)
                .then(|| (name[prefix.len()..].to_ascii_lowercase(), resource))
        })
    }
}

#[derive(Debug, Clone)]
struct Located {
    assembly: Arc<str>,
    resource: &'static EmbeddedResource,
}

/// Serves [`EmbeddedResource`]s registered through [`NamespaceMapping`]s.
///
/// The earliest mapping wins when two expose the same path. An optional extension whitelist
/// restricts what is served; when a [`ViewGenerator`] is set, whitelisted files are rewritten
/// on open. Owned files opt out of file-change cache invalidation.
pub struct EmbeddedFileProvider {
    site_root: VirtualPath,
    allowed_extensions: Vec<String>,
    generator: Option<Arc<dyn ViewGenerator>>,
    index: RwLock<FxHashMap<String, Located>>,
    mappings: RwLock<Vec<NamespaceMapping>>,
}

impl EmbeddedFileProvider {
    #[must_use]
    pub fn new(site_root: VirtualPath) -> Self {
        Self {
            site_root,
            allowed_extensions: Vec::new(),
            generator: None,
            index: RwLock::new(FxHashMap::default()),
            mappings: RwLock::new(Vec::new()),
        }
    }

    /// The provider for embedded templates: only `extensions` are served and `generator`
    /// rewrites them.
    pub fn views<S: Into<String>>(
        site_root: VirtualPath,
        extensions: impl IntoIterator<Item = S>,
        generator: Option<Arc<dyn ViewGenerator>>,
    ) -> Self {
        let mut provider = Self::new(site_root).with_extensions(extensions);
        provider.generator = generator;
        provider
    }

    /// The provider for embedded static content: every resource is served verbatim.
    #[must_use]
    pub fn content(site_root: VirtualPath) -> Self {
        Self::new(site_root)
    }

    #[must_use]
    pub fn with_extensions<S: Into<String>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Registers the resources of one assembly. Paths already served keep their first owner.
    pub fn add(&self, mapping: NamespaceMapping) {
        let assembly: Arc<str> = Arc::from(mapping.assembly());
        let mut added = 0_usize;
        {
            let mut index = self.index.write();
            for (key, resource) in mapping.relative_names() {
                if !index.contains_key(&key) {
                    index.insert(key, Located { assembly: Arc::clone(&assembly), resource });
                    added += 1;
                }
            }
        }
        debug!(
            assembly = mapping.assembly(),
            namespace = mapping.namespace(),
            resources = added,
            "Namespace mapped to site root"
        );
        self.mappings.write().push(mapping);
    }

    #[must_use]
    pub fn mappings(&self) -> Vec<NamespaceMapping> {
        self.mappings.read().clone()
    }

    fn locate(&self, path: &VirtualPath) -> Option<Located> {
        if !self.allowed_extensions.is_empty() && !path.has_extension(&self.allowed_extensions) {
            return None;
        }
        let relative = path.relative_to(&self.site_root).filter(|r| !r.is_empty())?;
        let key = relative.replace('/', ".").to_ascii_lowercase();
        self.index.read().get(&key).cloned()
    }

    fn generator_for(&self, path: &VirtualPath) -> Option<Arc<dyn ViewGenerator>> {
        let generator = self.generator.as_ref()?;
        path.has_extension(&self.allowed_extensions).then(|| Arc::clone(generator))
    }
}

impl VirtualFileProvider for EmbeddedFileProvider {
    fn file_exists(&self, path: &VirtualPath) -> bool {
        self.locate(path).is_some()
    }

    fn get_file(&self, path: &VirtualPath) -> Option<VirtualFile> {
        let located = self.locate(path)?;
        Some(VirtualFile::embedded(
            path.clone(),
            located.resource.name,
            located.resource.data,
            self.generator_for(path),
        ))
    }

    fn get_cache_key(&self, path: &VirtualPath) -> Option<String> {
        let located = self.locate(path)?;
        Some(format!("embedded:{}:{}", located.assembly, located.resource.name))
    }

    fn get_file_hash(&self, path: &VirtualPath, _dependencies: &[VirtualPath]) -> Option<String> {
        let located = self.locate(path)?;
        Some(hex::encode(fxhash::hash64(located.resource.data).to_be_bytes()))
    }

    fn get_cache_dependency(
        &self,
        path: &VirtualPath,
        _dependencies: &[VirtualPath],
        _utc_start: DateTime<Utc>,
    ) -> CacheLookup {
        if self.locate(path).is_some() { CacheLookup::NoCacheDependency } else { CacheLookup::NotFound }
    }
}

impl fmt::Debug for EmbeddedFileProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFileProvider")
            .field("site_root", &self.site_root)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("generator", &self.generator.is_some())
            .field("files", &self.index.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::EmbeddedViewGenerator;

    static HELP: [EmbeddedResource; 3] = [
        EmbeddedResource::new("Masonry.Help.Views.Help.Index.cshtml", b"@model Foo\n<h1>Help</h1>"),
        EmbeddedResource::new("Masonry.Help.Content.help.css", b".help{}"),
        EmbeddedResource::new("Other.Views.Stray.cshtml", b"stray"),
    ];
    static SHADOW: [EmbeddedResource; 1] =
        [EmbeddedResource::new("Shadow.Views.Help.Index.cshtml", b"shadow")];

    fn path(raw: &str) -> VirtualPath {
        VirtualPath::parse(raw).unwrap()
    }

    #[test]
    fn maps_qualified_names_to_site_paths() {
        let provider = EmbeddedFileProvider::content(VirtualPath::root());
        provider.add(NamespaceMapping::new("Masonry.Help", "Masonry.Help", &HELP));

        assert!(provider.file_exists(&path("~/Views/Help/Index.cshtml")));
        assert!(provider.file_exists(&path("/content/HELP.css")));
        assert!(!provider.file_exists(&path("/Views/Stray.cshtml")));
        assert_eq!(
            provider.get_cache_key(&path("/Content/help.css")).as_deref(),
            Some("embedded:Masonry.Help:Masonry.Help.Content.help.css")
        );
        assert_eq!(
            provider.get_cache_dependency(&path("/Content/help.css"), &[], Utc::now()),
            CacheLookup::NoCacheDependency
        );
        assert_eq!(
            provider.get_cache_dependency(&path("/Content/missing.css"), &[], Utc::now()),
            CacheLookup::NotFound
        );
    }

    #[test]
    fn first_mapping_keeps_the_path() {
        let provider = EmbeddedFileProvider::content(VirtualPath::root());
        provider.add(NamespaceMapping::new("Masonry.Help", "Masonry.Help", &HELP));
        provider.add(NamespaceMapping::new("Shadow", "Shadow", &SHADOW));

        let file = provider.get_file(&path("/Views/Help/Index.cshtml")).unwrap();
        assert_eq!(file.read_to_end().unwrap(), b"@model Foo\n<h1>Help</h1>");
        assert_eq!(provider.mappings().len(), 2);
    }

    #[test]
    fn views_are_whitelisted_and_rewritten() {
        let generator: Arc<dyn ViewGenerator> = Arc::new(EmbeddedViewGenerator::default());
        let provider = EmbeddedFileProvider::views(VirtualPath::root(), ["cshtml"], Some(generator));
        provider.add(NamespaceMapping::new("Masonry.Help", "Masonry.Help", &HELP));

        assert!(provider.get_file(&path("/Content/help.css")).is_none());
        let view = provider.get_file(&path("/Views/Help/Index.cshtml")).unwrap();
        let text = String::from_utf8(view.read_to_end().unwrap()).unwrap();
        assert!(text.starts_with("@using Masonry.Views\n"), "{text}");
        assert!(text.ends_with("@inherits Masonry.Views.ViewPage<Foo>\n<h1>Help</h1>"), "{text}");
    }

    #[test]
    fn file_hash_tracks_content() {
        let provider = EmbeddedFileProvider::content(VirtualPath::root());
        provider.add(NamespaceMapping::new("Masonry.Help", "Masonry.Help", &HELP));
        let a = provider.get_file_hash(&path("/Content/help.css"), &[]).unwrap();
        let b = provider.get_file_hash(&path("/Views/Help/Index.cshtml"), &[]).unwrap();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn site_root_prefix_is_honoured() {
        let provider = EmbeddedFileProvider::content(path("/app"));
        provider.add(NamespaceMapping::new("Masonry.Help", "Masonry.Help", &HELP));
        assert!(provider.file_exists(&path("/app/Content/help.css")));
        assert!(!provider.file_exists(&path("/Content/help.css")));
    }
}
