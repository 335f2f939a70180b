use chrono::{DateTime, Utc};
use masonry_vfs::{
    AggregateVirtualPathProvider, CacheDependency, CacheLookup, EmbeddedFileProvider,
    EmbeddedResource, NamespaceMapping, NullFileProvider, PhysicalFileProvider, VirtualFile,
    VirtualFileProvider, VirtualPath,
};
use proptest::prelude::*;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Answers every query with a fixed outcome and counts how often it was asked.
#[derive(Debug)]
struct Scripted {
    id: usize,
    hit: bool,
    cache: CacheLookup,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(id: usize, hit: bool, cache: CacheLookup) -> Arc<Self> {
        Arc::new(Self { id, hit, cache, calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T>(&self, value: impl FnOnce() -> T) -> Option<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hit.then(value)
    }
}

impl VirtualFileProvider for Scripted {
    fn file_exists(&self, _path: &VirtualPath) -> bool {
        self.answer(|| ()).is_some()
    }

    fn get_file(&self, _path: &VirtualPath) -> Option<VirtualFile> {
        None
    }

    fn get_cache_key(&self, _path: &VirtualPath) -> Option<String> {
        self.answer(|| format!("source-{}", self.id))
    }

    fn get_file_hash(&self, _path: &VirtualPath, _dependencies: &[VirtualPath]) -> Option<String> {
        self.answer(|| format!("hash-{}", self.id))
    }

    fn get_cache_dependency(
        &self,
        _path: &VirtualPath,
        _dependencies: &[VirtualPath],
        _utc_start: DateTime<Utc>,
    ) -> CacheLookup {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cache.clone()
    }
}

fn dependency(id: usize) -> CacheDependency {
    CacheDependency::new(vec![format!("/tmp/{id}").into()], DateTime::<Utc>::UNIX_EPOCH)
}

#[test]
fn no_cache_short_circuits_later_sources() {
    let first = Scripted::new(0, false, CacheLookup::NotFound);
    let opt_out = Scripted::new(1, true, CacheLookup::NoCacheDependency);
    let later = Scripted::new(2, true, CacheLookup::Dependency(dependency(2)));

    let vfs = AggregateVirtualPathProvider::new(NullFileProvider);
    vfs.add(first.clone());
    vfs.add(opt_out.clone());
    vfs.add(later.clone());

    assert_eq!(vfs.get_cache_dependency("/Views/Help/Index.cshtml", &[], Utc::now()), None);
    assert_eq!(first.calls(), 1);
    assert_eq!(opt_out.calls(), 1);
    assert_eq!(later.calls(), 0);
}

#[test]
fn default_answers_when_no_source_does() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();
    let disk = PhysicalFileProvider::new(dir.path(), VirtualPath::root()).unwrap();

    let vfs = AggregateVirtualPathProvider::new(disk);
    vfs.add(Scripted::new(0, false, CacheLookup::NotFound));

    assert!(vfs.file_exists("/robots.txt"));
    assert!(vfs.get_cache_key("/robots.txt").unwrap().starts_with("physical:"));
    assert!(vfs.get_cache_dependency("/robots.txt", &[], Utc::now()).is_some());
    assert!(!vfs.file_exists("/missing.txt"));
    assert!(vfs.get_file("/missing.txt").is_none());
}

#[test]
fn escaping_paths_are_misses() {
    let vfs = AggregateVirtualPathProvider::new(NullFileProvider);
    let always = Scripted::new(0, true, CacheLookup::Dependency(dependency(0)));
    vfs.add(always.clone());

    assert!(!vfs.file_exists("~/../../etc/passwd"));
    assert!(vfs.get_cache_key("/../x").is_none());
    assert_eq!(always.calls(), 0);
}

static EMBEDDED: [EmbeddedResource; 1] =
    [EmbeddedResource::new("Masonry.Help.Content.site.css", b"embedded")];

#[test]
fn registration_order_decides_shadowing() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Content")).unwrap();
    fs::write(dir.path().join("Content/site.css"), "disk").unwrap();

    let embedded = || {
        let provider = EmbeddedFileProvider::content(VirtualPath::root());
        provider.add(NamespaceMapping::new("Masonry.Help", "Masonry.Help", &EMBEDDED));
        Arc::new(provider)
    };
    let disk = || Arc::new(PhysicalFileProvider::new(dir.path(), VirtualPath::root()).unwrap());

    let embedded_first = AggregateVirtualPathProvider::new(NullFileProvider);
    embedded_first.add(embedded());
    embedded_first.add(disk());
    let file = embedded_first.get_file("/Content/site.css").unwrap();
    assert_eq!(file.read_to_end().unwrap(), b"embedded");
    assert_eq!(embedded_first.get_cache_dependency("/Content/site.css", &[], Utc::now()), None);

    let disk_first = AggregateVirtualPathProvider::new(NullFileProvider);
    disk_first.add(disk());
    disk_first.add(embedded());
    let file = disk_first.get_file("/Content/site.css").unwrap();
    assert_eq!(file.read_to_end().unwrap(), b"disk");
    assert!(disk_first.get_cache_dependency("/Content/site.css", &[], Utc::now()).is_some());
}

proptest! {
    #[test]
    fn first_answering_source_wins(hits in prop::collection::vec(any::<bool>(), 0..8)) {
        let vfs = AggregateVirtualPathProvider::new(NullFileProvider);
        let sources: Vec<_> = hits
            .iter()
            .enumerate()
            .map(|(id, &hit)| Scripted::new(id, hit, CacheLookup::NotFound))
            .collect();
        for source in &sources {
            vfs.add(source.clone());
        }

        let winner = hits.iter().position(|&hit| hit);
        prop_assert_eq!(vfs.get_cache_key("/a.css"), winner.map(|id| format!("source-{id}")));
        prop_assert_eq!(vfs.get_file_hash("/a.css", &["/b.css"]), winner.map(|id| format!("hash-{id}")));
        prop_assert_eq!(vfs.file_exists("/a.css"), winner.is_some());

        let last_consulted = winner.unwrap_or(hits.len().saturating_sub(1));
        for (id, source) in sources.iter().enumerate() {
            let expected = if hits.is_empty() || id > last_consulted { 0 } else { 3 };
            prop_assert_eq!(source.calls(), expected);
        }
    }
}
