//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [archive]
//! storage_dir = "pages"
//! cache_dir = "${FOLIO_CACHE:-pages/.cache}"
//! cache_enabled = true
//! cache_ttl = 43200
//! extension = "md"
//! skip_invalid = false
//! ```
//!
//! Overrides can be applied during load via [`Overrides`].
//!
//! ## Environment Variable Expansion
//!
//! `archive.storage_dir` and `archive.cache_dir` support environment variable
//! expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Default cache lifetime: 12 hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 12);

/// Default document extension.
pub const DEFAULT_EXTENSION: &str = "md";

/// Settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Override document directory.
    pub storage_dir: Option<PathBuf>,
    /// Override cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override cache lifetime.
    pub cache_ttl: Option<Duration>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive configuration (paths are relative strings from TOML).
    archive: ArchiveConfigRaw,

    /// Resolved archive configuration (set after loading).
    #[serde(skip)]
    pub archive_resolved: ArchiveConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw archive configuration as parsed from TOML (paths as strings).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArchiveConfigRaw {
    storage_dir: Option<String>,
    cache_dir: Option<String>,
    cache_enabled: Option<bool>,
    /// Cache lifetime in seconds.
    cache_ttl: Option<u64>,
    extension: Option<String>,
    skip_invalid: Option<bool>,
}

/// Resolved archive configuration with absolute paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Directory containing the source documents.
    pub storage_dir: PathBuf,
    /// Directory for the index snapshot and page artifacts.
    pub cache_dir: PathBuf,
    /// Whether the index snapshot and page artifacts are used.
    pub cache_enabled: bool,
    /// How long cache entries stay fresh.
    pub cache_ttl: Duration,
    /// Extension of source documents, without the leading dot.
    pub extension: String,
    /// Skip invalid documents during a scan instead of failing it.
    pub skip_invalid: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::for_storage(PathBuf::from("pages"))
    }
}

impl ArchiveConfig {
    /// Default configuration for a document directory.
    ///
    /// The cache lives in `{storage_dir}/.cache`.
    #[must_use]
    pub fn for_storage(storage_dir: PathBuf) -> Self {
        Self {
            cache_dir: storage_dir.join(".cache"),
            storage_dir,
            cache_enabled: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            extension: DEFAULT_EXTENSION.to_owned(),
            skip_invalid: false,
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the extension is empty or starts
    /// with a dot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.is_empty() {
            return Err(ConfigError::Validation(
                "archive.extension cannot be empty".to_owned(),
            ));
        }
        if self.extension.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "archive.extension must not start with a dot (got {:?})",
                self.extension
            )));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`archive.cache_dir`").
        field: String,
        /// Error message (e.g., "${`FOLIO_CACHE`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional overrides.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// Overrides are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        overrides: Option<&Overrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(overrides) = overrides {
            config.apply_overrides(overrides);
            config.archive_resolved.validate()?;
        }

        Ok(config)
    }

    /// Apply overrides to the resolved configuration.
    fn apply_overrides(&mut self, overrides: &Overrides) {
        let resolved = &mut self.archive_resolved;
        if let Some(storage_dir) = &overrides.storage_dir {
            // A cache dir that followed the old storage dir follows the new one.
            if resolved.cache_dir == resolved.storage_dir.join(".cache")
                && overrides.cache_dir.is_none()
            {
                resolved.cache_dir = storage_dir.join(".cache");
            }
            resolved.storage_dir.clone_from(storage_dir);
        }
        if let Some(cache_dir) = &overrides.cache_dir {
            resolved.cache_dir.clone_from(cache_dir);
        }
        if let Some(cache_enabled) = overrides.cache_enabled {
            resolved.cache_enabled = cache_enabled;
        }
        if let Some(cache_ttl) = overrides.cache_ttl {
            resolved.cache_ttl = cache_ttl;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            archive: ArchiveConfigRaw::default(),
            archive_resolved: ArchiveConfig::for_storage(base.join("pages")),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.archive_resolved.validate()?;

        Ok(config)
    }

    /// Expand environment variable references in path fields.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.archive.storage_dir {
            self.archive.storage_dir = Some(expand::expand_env(dir, "archive.storage_dir")?);
        }
        if let Some(ref dir) = self.archive.cache_dir {
            self.archive.cache_dir = Some(expand::expand_env(dir, "archive.cache_dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let raw = &self.archive;
        let storage_dir = config_dir.join(raw.storage_dir.as_deref().unwrap_or("pages"));
        let cache_dir = raw
            .cache_dir
            .as_deref()
            .map_or_else(|| storage_dir.join(".cache"), |dir| config_dir.join(dir));

        self.archive_resolved = ArchiveConfig {
            storage_dir,
            cache_dir,
            cache_enabled: raw.cache_enabled.unwrap_or(true),
            cache_ttl: raw
                .cache_ttl
                .map_or(DEFAULT_CACHE_TTL, Duration::from_secs),
            extension: raw
                .extension
                .clone()
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned()),
            skip_invalid: raw.skip_invalid.unwrap_or(false),
        };
    }
}
