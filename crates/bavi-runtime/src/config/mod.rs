//! Configuration for the bavi runtime.
//!
//! Layered with figment: built-in defaults, then `bavi.toml`, then `BAVI_*`
//! environment variables. See [`ConfigLoader`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BaviConfig, BotSection, IrcSection, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig, StorageSection,
};
pub use validation::validate_config;
