//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Main config file (`bavi.toml`), searched in the current directory and
//!    the user config directory, or an explicit file
//! 3. Environment variables (`BAVI_*`)
//! 4. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `BAVI_` prefix with `__` as
//! separator:
//!
//! - `BAVI_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `BAVI_IRC__CHANNELS=["#a","#b"]` → `irc.channels = ["#a", "#b"]`
//! - `BAVI_PLUGINS__URL__MAX_URLS=3` → `plugins.url.max_urls = 3`
//!
//! # Example
//!
//! ```rust,ignore
//! use bavi_runtime::config::ConfigLoader;
//!
//! // Simple loading from default locations
//! let config = ConfigLoader::new().load()?;
//!
//! // Load from specific file with env overrides
//! let config = ConfigLoader::new()
//!     .file("./config/bavi.toml")
//!     .with_env()
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::BaviConfig;
use super::validation::validate_config;

/// File name searched for in each search path.
pub const CONFIG_FILE_NAME: &str = "bavi.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "BAVI_";

/// Configuration loader with figment-based multi-source support.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(config_dir) => self.search_path(config_dir.join("bavi")),
            None => self,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically, above every other
    /// source.
    pub fn merge(mut self, config: BaviConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<BaviConfig> {
        let figment = self.build_figment()?;
        let config: BaviConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            host = %config.irc.host,
            nickname = %config.irc.nickname,
            logging_level = %config.logging.level,
            plugin_sections = config.plugins.len(),
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BaviConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(path));
        } else {
            match self.find_config_file() {
                Some(path) => {
                    info!(path = %path.display(), "Loading configuration file");
                    figment = figment.merge(Toml::file(path));
                }
                None => warn!("No configuration file found, using defaults"),
            }
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bavi"));
        }
        paths
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        self.resolve_search_paths()
            .into_iter()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.exists())
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<BaviConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<BaviConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    use crate::config::schema::{LogFormat, LogLevel};

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.logging.level, LogLevel::Info);
            assert_eq!(config.irc.nickname, "bavi");
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r##"
                    [irc]
                    host = "irc.example.org"
                    tls = true
                    nickname = "filebot"
                    channels = ["#one", "#two"]

                    [bot]
                    command_prefix = "!"
                    disabled_plugins = ["url"]

                    [logging]
                    level = "debug"
                    format = "pretty"

                    [plugins.url]
                    max_urls = 2
                "##,
            )?;
            jail.set_env("BAVI_IRC__NICKNAME", "envbot");
            jail.set_env("BAVI_PLUGINS__TZ__DEFAULT", "UTC");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();
            assert_eq!(config.irc.host, "irc.example.org");
            assert_eq!(config.irc.nickname, "envbot");
            assert_eq!(config.irc.channels, ["#one", "#two"]);
            assert_eq!(config.irc.port, 6667);
            assert!(config.irc.tls);
            assert_eq!(config.bot.command_prefix, "!");
            assert_eq!(config.bot.disabled_plugins, ["url"]);
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.logging.format, LogFormat::Pretty);
            assert_eq!(config.plugins["url"]["max_urls"], 2);
            assert_eq!(config.plugins["tz"]["default"], "UTC");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        Jail::expect_with(|jail| {
            let missing = jail.directory().join("missing.toml");
            let err = ConfigLoader::new().file(&missing).without_env().load();
            assert!(matches!(err, Err(ConfigError::FileNotFound(_))));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[logging]\nlevel = \"loud\"\n")?;
            let err = ConfigLoader::new().file("custom.toml").without_env().load();
            assert!(matches!(err, Err(ConfigError::ParseError(_))));

            jail.create_file("custom.toml", "[irc]\nport = 0\n")?;
            let err = ConfigLoader::new().file("custom.toml").without_env().load();
            assert!(matches!(err, Err(ConfigError::InvalidPort(0))));
            Ok(())
        });
    }

    #[test]
    fn test_overrides_win() {
        Jail::expect_with(|jail| {
            jail.set_env("BAVI_BOT__COMMAND_PREFIX", "?");
            let mut overrides = BaviConfig::default();
            overrides.bot.command_prefix = "~".into();

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(overrides)
                .load()
                .unwrap();
            assert_eq!(config.bot.command_prefix, "~");
            Ok(())
        });
    }
}
