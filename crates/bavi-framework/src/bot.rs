//! The dispatch core handle.
//!
//! [`Bot`] owns both registries, the outbound connection, and the storage
//! handle. Plugins receive `&mut Bot` during init to register commands and
//! matchers; handlers receive an `Arc<Bot>` afterwards, when the registries
//! are frozen and only the outbound operations remain useful.

use tracing::{debug, trace, warn};

use bavi_core::{BoxedConnection, Source, sanitize};

use crate::command::CommandRegistry;
use crate::error::{RegistrationError, SendError};
use crate::handler::{CommandHandler, MatcherHandler};
use crate::matcher::{IntoPattern, MatcherRegistry, Priority};
use crate::storage::Storage;

/// Default command prefix.
pub const DEFAULT_COMMAND_PREFIX: &str = ".";

/// Registry positions to restore when a plugin fails to load.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    commands: usize,
    matchers: u64,
}

/// The dispatch core.
pub struct Bot {
    connection: BoxedConnection,
    command_prefix: String,
    commands: CommandRegistry,
    matchers: MatcherRegistry,
    storage: Option<Storage>,
}

impl Bot {
    /// Creates a bot with empty registries talking over `connection`.
    pub fn new(connection: BoxedConnection) -> Self {
        Self {
            connection,
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            commands: CommandRegistry::new(),
            matchers: MatcherRegistry::new(),
            storage: None,
        }
    }

    /// Sets the command prefix (builder pattern).
    ///
    /// A blank prefix would turn every message into a command, so it is
    /// ignored and the current prefix is kept.
    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            warn!(prefix = ?prefix, kept = %self.command_prefix, "Ignoring blank command prefix");
            return self;
        }
        self.command_prefix = prefix;
        self
    }

    /// Attaches a storage handle (builder pattern).
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a command under `trigger` and `aliases`.
    ///
    /// See [`CommandRegistry::register`].
    pub fn add_command<H: CommandHandler>(
        &mut self,
        trigger: &str,
        handler: H,
        aliases: &[&str],
    ) -> Result<(), RegistrationError> {
        self.commands.register(trigger, handler, aliases)
    }

    /// Registers a matcher.
    ///
    /// See [`MatcherRegistry::register`].
    pub fn add_matcher<P, H>(
        &mut self,
        pattern: P,
        handler: H,
        priority: Priority,
    ) -> Result<(), RegistrationError>
    where
        P: IntoPattern,
        H: MatcherHandler,
    {
        self.matchers.register(pattern, handler, priority)
    }

    pub(crate) fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub(crate) fn matchers(&self) -> &MatcherRegistry {
        &self.matchers
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            commands: self.commands.checkpoint(),
            matchers: self.matchers.checkpoint(),
        }
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.commands.rollback(checkpoint.commands);
        self.matchers.rollback(checkpoint.matchers);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The bot's current nickname, as reported by the connection.
    pub fn nickname(&self) -> String {
        self.connection.nickname()
    }

    /// The command prefix.
    pub fn command_prefix(&self) -> &str {
        &self.command_prefix
    }

    /// The storage handle, if one was attached.
    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    /// Returns `true` if the bot currently occupies `destination`.
    pub fn is_joined(&self, destination: &str) -> bool {
        self.connection.is_joined(destination)
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Sends `text` to `destination`.
    ///
    /// `\r`, `\n` and `\0` are removed first. Fails with
    /// [`SendError::DestinationNotJoined`] without transmitting anything if
    /// the bot is not in `destination`.
    pub async fn say(&self, destination: &str, text: &str) -> Result<(), SendError> {
        self.ensure_joined(destination)?;
        let line = sanitize(text);
        trace!(destination, text = %line, "say");
        self.connection.send_privmsg(destination, &line).await?;
        Ok(())
    }

    /// Sends `"<source nick>: <text>"` to `destination`.
    ///
    /// Same sanitization and destination check as [`say`](Self::say).
    pub async fn reply_to(
        &self,
        source: &Source,
        destination: &str,
        text: &str,
    ) -> Result<(), SendError> {
        self.ensure_joined(destination)?;
        let line = sanitize(&format!("{}: {}", source.nick, text));
        trace!(destination, text = %line, "reply");
        self.connection.send_privmsg(destination, &line).await?;
        Ok(())
    }

    fn ensure_joined(&self, destination: &str) -> Result<(), SendError> {
        if self.connection.is_joined(destination) {
            Ok(())
        } else {
            debug!(destination, "Refusing to send to a destination not joined");
            Err(SendError::DestinationNotJoined(destination.to_string()))
        }
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("command_prefix", &self.command_prefix)
            .field("commands", &self.commands.len())
            .field("matchers", &self.matchers.len())
            .field("storage", &self.storage.is_some())
            .finish()
    }
}
