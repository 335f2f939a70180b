use crate::constants::{
    DEFAULT_LAYOUT, DEFAULT_START_PAGE, DEFAULT_VIEW_IMPORTS, DEFAULT_VIEW_PAGE,
    EXTENSION_DIRECTORY, EXTENSION_SEARCH_PATTERN, VIEW_TEMPLATE_EXTENSION,
};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level application configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub server: ServerConfig,
    pub extensibility: ExtensibilityConfig,
    pub views: ViewsConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    /// Physical site directory served through the virtual file system.
    pub content_root: PathBuf,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Extension discovery settings.
///
/// With `automatic_discovery` every manifest matching `search_pattern` inside `directory` is
/// loaded; otherwise only the listed `extensions` are.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtensibilityConfig {
    pub directory: PathBuf,
    pub search_pattern: String,
    pub automatic_discovery: bool,
    pub extensions: Vec<ExtensionEntry>,
}

impl ExtensibilityConfig {
    /// Configured extensions, first occurrence wins for names that differ only by case.
    pub fn distinct_extensions(&self) -> impl Iterator<Item = &ExtensionEntry> {
        self.extensions.iter().enumerate().filter_map(|(i, entry)| {
            let seen = self.extensions[..i].iter().any(|e| e.name.eq_ignore_ascii_case(&entry.name));
            (!seen).then_some(entry)
        })
    }
}

/// One explicitly configured extension: the manifest file name and the resource namespace that
/// maps onto the site root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionEntry {
    pub name: String,
    pub namespace: String,
}

/// Embedded view rewriting settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    /// Virtual directory the extension resource namespaces map onto.
    pub site_root: String,
    pub base_page: String,
    pub start_page: String,
    /// Layout applied to non-partial embedded views; `None` disables the layout line.
    pub layout: Option<String>,
    pub imports: Vec<String>,
    pub template_extensions: Vec<String>,
}

/// Logger settings for the server binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directives: Vec<String>,
    pub console: bool,
    pub directory: Option<PathBuf>,
    pub json: bool,
    pub max_files: usize,
}

/// Branding values exposed to every view.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub brand: String,
    pub copyright: String,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            ssl: None,
            content_root: PathBuf::from("public"),
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for ExtensibilityConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(EXTENSION_DIRECTORY),
            search_pattern: EXTENSION_SEARCH_PATTERN.to_owned(),
            automatic_discovery: true,
            extensions: Vec::new(),
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            site_root: "/".to_owned(),
            base_page: DEFAULT_VIEW_PAGE.to_owned(),
            start_page: DEFAULT_START_PAGE.to_owned(),
            layout: Some(DEFAULT_LAYOUT.to_owned()),
            imports: DEFAULT_VIEW_IMPORTS.iter().map(|&s| s.to_owned()).collect(),
            template_extensions: vec![VIEW_TEMPLATE_EXTENSION.to_owned()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            directives: Vec::new(),
            console: true,
            directory: None,
            json: false,
            max_files: 10,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { brand: "Masonry".to_owned(), copyright: "Masonry".to_owned() }
    }
}
