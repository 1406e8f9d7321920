//! The bavi event loop.
//!
//! ```rust,ignore
//! use bavi_runtime::BaviRuntime;
//!
//! let runtime = BaviRuntime::builder().config_file("bavi.toml").build()?;
//! runtime.init_logging()?;
//! runtime.run().await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{BaviConfig, ConfigLoader, ConfigResult};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging::LoggingBuilder;
use bavi_core::{BoxedConnection, InboundMessage};
use bavi_framework::{Bot, Dispatcher, LoadReport, PluginLoader, Storage};
use bavi_transport::{CancellationToken, IrcClient};

/// Owns the configuration and the shutdown token, and drives the bot.
///
/// Messages are dispatched one at a time: the next message is not taken from
/// the transport until the previous handler has finished.
#[derive(Debug)]
pub struct BaviRuntime {
    config: BaviConfig,
    shutdown: CancellationToken,
}

impl BaviRuntime {
    /// Creates a runtime from an already loaded configuration.
    pub fn new(config: BaviConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a builder that loads the configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// The configuration.
    pub fn config(&self) -> &BaviConfig {
        &self.config
    }

    /// The token that stops [`run`](Self::run) and [`serve`](Self::serve).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Installs the logging subscriber described by `[logging]`.
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init_logging(&self) -> RuntimeResult<()> {
        LoggingBuilder::from_config(&self.config.logging)
            .try_init()
            .map_err(|e| RuntimeError::Logging(e.to_string()))?;
        info!(
            log_level = %self.config.logging.level,
            log_format = ?self.config.logging.format,
            "Logging initialized"
        );
        Ok(())
    }

    /// Opens `[storage].path`, or an in-memory database when unset.
    pub fn open_storage(&self) -> RuntimeResult<Storage> {
        let storage = match &self.config.storage.path {
            Some(path) => {
                info!(path = %path.display(), "Opening storage");
                Storage::open(path)?
            }
            None => {
                warn!("No storage path configured, using an in-memory database");
                Storage::in_memory()?
            }
        };
        Ok(storage)
    }

    /// Builds the bot over `connection` and loads every enabled plugin into it.
    pub fn build_bot(&self, connection: BoxedConnection, storage: Storage) -> (Bot, LoadReport) {
        let mut bot = Bot::new(connection)
            .with_command_prefix(&self.config.bot.command_prefix)
            .with_storage(storage);

        let report = PluginLoader::new()
            .with_configs(self.config.plugins.clone())
            .disable(self.config.bot.disabled_plugins.iter().cloned())
            .load_all(&mut bot);

        info!(
            loaded = ?report.loaded(),
            failed = ?report.failed(),
            "Plugins loaded"
        );
        (bot, report)
    }

    /// Dispatches messages from `inbound` until it closes or shutdown is
    /// requested.
    pub async fn serve(&self, dispatcher: &Dispatcher, inbound: &mut mpsc::Receiver<InboundMessage>) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("Shutdown requested, leaving dispatch loop");
                    break;
                }
                message = inbound.recv() => match message {
                    Some(message) => {
                        let outcome = dispatcher.dispatch(message).await;
                        debug!(?outcome, "Message dispatched");
                    }
                    None => {
                        debug!("Inbound stream closed");
                        break;
                    }
                },
            }
        }
    }

    /// Connects, loads plugins, and runs until Ctrl+C or SIGTERM.
    ///
    /// On shutdown the transport sends `QUIT` with the configured message.
    pub async fn run(&self) -> RuntimeResult<()> {
        let storage = self.open_storage()?;

        let irc = self.config.irc.to_transport();
        info!(address = %irc.address(), nickname = %irc.nickname, "Connecting");
        let client = IrcClient::connect(irc, self.shutdown.clone()).await?;
        let (handle, mut inbound, task) = client.into_parts();

        let (bot, _) = self.build_bot(Arc::new(handle), storage);
        let dispatcher = Dispatcher::new(bot);

        tokio::spawn(wait_for_shutdown(self.shutdown.clone()));
        info!("bavi is now running. Press Ctrl+C to stop.");

        self.serve(&dispatcher, &mut inbound).await;

        self.shutdown.cancel();
        if let Err(e) = task.await {
            error!(error = %e, "Client task ended abnormally");
        }
        info!("Runtime stopped");
        Ok(())
    }
}

/// Cancels `token` on Ctrl+C or SIGTERM.
async fn wait_for_shutdown(token: CancellationToken) {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                    _ = token.cancelled() => return,
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = token.cancelled() => return,
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            _ = token.cancelled() => return,
        }
    }

    token.cancel();
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Loads the configuration and creates a [`BaviRuntime`].
///
/// Searches the current directory and the user config directory unless an
/// explicit file is given.
#[derive(Debug)]
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder with the default search paths.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir().with_user_config_dir(),
        }
    }

    /// Loads exactly this file, which must exist.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Adds a directory to search for `bavi.toml`.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Ignores `BAVI_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration on top of every other source.
    pub fn merge(mut self, config: BaviConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads and validates the configuration.
    pub fn build(self) -> ConfigResult<BaviRuntime> {
        let config = self.config_loader.load()?;
        Ok(BaviRuntime::new(config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
