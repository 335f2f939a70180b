/// Base name of the configuration file loaded by the server (`server.toml`).
pub const CONFIG_FILE: &str = "server";
/// Prefix of environment overrides (`MASONRY__SERVER__PORT=8080`).
pub const ENV_PREFIX: &str = "MASONRY";

/// Default wildcard used to discover extension manifests.
pub const EXTENSION_SEARCH_PATTERN: &str = "*.extension.toml";
/// Default directory scanned for extension manifests, relative to the working directory.
pub const EXTENSION_DIRECTORY: &str = "extensions";

/// Template file extension rewritten for embedded views.
pub const VIEW_TEMPLATE_EXTENSION: &str = "cshtml";
pub const DEFAULT_LAYOUT: &str = "~/Views/Shared/_Layout.cshtml";
pub const DEFAULT_VIEW_PAGE: &str = "Masonry.Views.ViewPage";
pub const DEFAULT_START_PAGE: &str = "Masonry.Views.StartPage";
pub const DEFAULT_VIEW_IMPORTS: &[&str] =
    &["Masonry.Views", "Masonry.Views.Html", "Masonry.Extensibility"];

pub const VIEW_DATA_BRAND: &str = "Brand";
pub const VIEW_DATA_COPYRIGHT: &str = "Copyright";

pub const SYSTEM_TAG: &str = "System";
