use config::{Config, Environment, File, FileFormat};
use masonry_domain::constants::{CONFIG_FILE, ENV_PREFIX};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

#[masonry_derive::masonry_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads `T` from a TOML file overlaid with `MASONRY__*` environment variables.
///
/// Nested keys use double underscores: `MASONRY__SERVER__PORT=9090` sets `server.port`.
/// Without a path the `server` file in the working directory is used; a missing file is not an
/// error, so a bare environment (or the type's defaults) is enough to start.
///
/// # Errors
/// Returns [`ConfigError::Config`] when a source cannot be parsed or does not match `T`.
///
/// # Example
/// ```rust
/// use masonry_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// #[serde(default)]
/// struct Settings {
///     port: u16,
/// }
///
/// let settings: Settings = load_config(Some("does/not/exist")).unwrap();
/// assert_eq!(settings.port, 0);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::new(&effective_path.to_string_lossy(), FileFormat::Toml).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__"));

    info!(path = %effective_path.display(), "Loading configuration");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
