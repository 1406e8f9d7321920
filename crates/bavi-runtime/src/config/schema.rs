//! Configuration schema definitions.
//!
//! ```toml
//! [irc]
//! host = "irc.libera.chat"
//! port = 6697
//! tls = true
//! nickname = "bavi"
//! channels = ["#bavi"]
//!
//! [bot]
//! command_prefix = "."
//! disabled_plugins = ["url"]
//!
//! [storage]
//! path = "bavi.db"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [plugins.url]
//! max_urls = 3
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bavi_transport::{IrcConfig, ReconnectConfig};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BaviConfig {
    /// IRC connection settings.
    #[serde(default)]
    pub irc: IrcSection,

    /// Dispatch settings.
    #[serde(default)]
    pub bot: BotSection,

    /// Database settings.
    #[serde(default)]
    pub storage: StorageSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Free-form per-plugin tables, keyed by plugin name.
    #[serde(default)]
    pub plugins: HashMap<String, serde_json::Value>,
}

// =============================================================================
// [irc]
// =============================================================================

/// `[irc]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcSection {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connect over TLS.
    pub tls: bool,
    /// Server password.
    pub password: Option<String>,
    /// Nickname to register with.
    pub nickname: String,
    /// User name; defaults to the nickname.
    pub username: Option<String>,
    /// Real name; defaults to the nickname.
    pub realname: Option<String>,
    /// Channels to join.
    pub channels: Vec<String>,
    /// Message sent with `QUIT` on shutdown.
    pub quit_message: String,
    /// Whether to reconnect after losing the server.
    pub auto_reconnect: bool,
    /// Delay before the first reconnection attempt, in seconds.
    pub reconnect_delay_secs: u64,
    /// Upper bound for the reconnection delay, in seconds.
    pub max_reconnect_delay_secs: u64,
    /// Give up after this many consecutive failed attempts.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for IrcSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6667,
            tls: false,
            password: None,
            nickname: "bavi".to_string(),
            username: None,
            realname: None,
            channels: Vec::new(),
            quit_message: "Shutting down".to_string(),
            auto_reconnect: true,
            reconnect_delay_secs: 5,
            max_reconnect_delay_secs: 300,
            max_reconnect_attempts: None,
        }
    }
}

impl IrcSection {
    /// Converts to the transport's connection settings.
    pub fn to_transport(&self) -> IrcConfig {
        let mut config = IrcConfig::new(&self.host, self.port, &self.nickname)
            .with_tls(self.tls)
            .with_channels(self.channels.iter().cloned())
            .with_quit_message(&self.quit_message)
            .with_reconnect(ReconnectConfig {
                auto_reconnect: self.auto_reconnect,
                max_retries: self.max_reconnect_attempts,
                initial_delay: Duration::from_secs(self.reconnect_delay_secs),
                max_delay: Duration::from_secs(self.max_reconnect_delay_secs),
                ..Default::default()
            });
        config.password.clone_from(&self.password);
        if let Some(username) = &self.username {
            config.username.clone_from(username);
        }
        if let Some(realname) = &self.realname {
            config.realname.clone_from(realname);
        }
        config
    }
}

// =============================================================================
// [bot] and [storage]
// =============================================================================

/// `[bot]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSection {
    /// Prefix that marks a command.
    pub command_prefix: String,
    /// Plugins that are linked in but must not be loaded.
    pub disabled_plugins: Vec<String>,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            command_prefix: bavi_framework::DEFAULT_COMMAND_PREFIX.to_string(),
            disabled_plugins: Vec::new(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageSection {
    /// SQLite database file; an in-memory database is used when unset.
    pub path: Option<PathBuf>,
}

// =============================================================================
// [logging]
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Debugging detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl LogLevel {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One short line per event.
    #[default]
    Compact,
    /// One full line per event.
    Full,
    /// Multi-line, human-oriented.
    Pretty,
    /// Newline-delimited JSON.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// The file at `file_path`.
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpanEventConfig {
    /// Span created.
    pub new: bool,
    /// Span entered.
    pub enter: bool,
    /// Span exited.
    pub exit: bool,
    /// Span closed.
    pub close: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` overrides it.
    pub level: LogLevel,
    /// Line layout.
    pub format: LogFormat,
    /// Destination.
    pub output: LogOutput,
    /// File used when `output = "file"`.
    pub file_path: Option<PathBuf>,
    /// Per-target levels, e.g. `bavi_transport = "debug"`.
    pub filters: HashMap<String, LogLevel>,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include source file and line.
    pub file_location: bool,
    /// Span lifecycle events.
    pub span_events: SpanEventConfig,
}
