//! Error types for the dispatch engine.
//!
//! Every error that can surface in a chat channel carries a stable *kind*
//! string. The dispatcher reports failures as `"<kind>: <message>"`, so the
//! kind is part of the user-visible contract and must not change casually.

use std::any::Any;
use std::borrow::Cow;
use std::fmt::Display;

use thiserror::Error;

use bavi_core::TransportError;

/// A boxed, thread-safe error returned by plugin initialisation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while registering commands or matchers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The trigger (or one of its aliases) is already registered.
    #[error("command \"{0}\" is already registered")]
    DuplicateTrigger(String),

    /// The trigger could never be typed as the first word of a message.
    #[error("invalid trigger {0:?}: triggers must be non-empty and contain no whitespace")]
    InvalidTrigger(String),

    /// The priority is not one of `low`, `medium` or `high`.
    #[error("priority must be low, medium, or high, got \"{0}\"")]
    InvalidPriority(String),

    /// A raw string was passed where a compiled pattern was expected.
    #[error("pattern must be a compiled regex, got {0}")]
    InvalidPatternType(&'static str),
}

impl RegistrationError {
    /// Stable kind discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateTrigger(_) => "DuplicateTriggerError",
            Self::InvalidTrigger(_) => "InvalidTriggerError",
            Self::InvalidPriority(_) => "InvalidPriorityError",
            Self::InvalidPatternType(_) => "InvalidPatternTypeError",
        }
    }
}

/// Errors raised by [`Bot::say`](crate::Bot::say) and
/// [`Bot::reply_to`](crate::Bot::reply_to).
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// The bot is not present in the destination.
    ///
    /// This points at a bug in the calling plugin, so it is always returned
    /// to the caller and never swallowed.
    #[error("not joined to {0}")]
    DestinationNotJoined(String),

    /// The transport refused the line.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SendError {
    /// Stable kind discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DestinationNotJoined(_) => "DestinationNotJoinedError",
            Self::Transport(_) => "TransportError",
        }
    }
}

/// Errors raised by the [`Storage`](crate::Storage) handle.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A table or column name is not a plain identifier.
    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Errors raised while loading a plugin.
#[derive(Debug, Error)]
pub enum PluginLoadError {
    /// The plugin's init entrypoint returned an error.
    #[error("plugin '{plugin}' failed to initialise: {source}")]
    Init {
        /// Plugin name.
        plugin: &'static str,
        /// Error returned by init.
        #[source]
        source: BoxError,
    },

    /// The plugin's init entrypoint panicked.
    #[error("plugin '{plugin}' panicked during initialisation: {message}")]
    Panicked {
        /// Plugin name.
        plugin: &'static str,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// A plugin with the same name was already loaded in this run.
    #[error("plugin '{0}' is already loaded")]
    AlreadyLoaded(&'static str),
}

/// The failure a command or matcher handler reports back to the dispatcher.
///
/// The dispatcher says `"<kind>: <message>"` to the channel the triggering
/// message came from.
///
/// ```rust,ignore
/// async fn lookup(ctx: CommandContext) -> HandlerResult {
///     let row = table.get(&ctx.args)
///         .ok_or_else(|| HandlerError::new("KeyError", format!("'{}'", ctx.args)))?;
///     ctx.say(row).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    kind: Cow<'static, str>,
    message: String,
}

impl HandlerError {
    /// Creates a handler error with an explicit kind.
    pub fn new(kind: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Returns a `map_err` adapter that tags any displayable error with `kind`.
    ///
    /// ```rust,ignore
    /// let n: u32 = ctx.args.parse().map_err(HandlerError::tagged("ValueError"))?;
    /// ```
    pub fn tagged<E: Display>(kind: &'static str) -> impl FnOnce(E) -> Self {
        move |err| Self::new(kind, err.to_string())
    }

    /// Builds an error from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new("Panic", panic_message(payload.as_ref()))
    }

    /// The stable kind discriminator.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<SendError> for HandlerError {
    fn from(err: SendError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<RegistrationError> for HandlerError {
    fn from(err: RegistrationError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<StorageError> for HandlerError {
    fn from(err: StorageError) -> Self {
        Self::new("StorageError", err.to_string())
    }
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Result type returned by command and matcher handlers.
pub type HandlerResult = Result<(), HandlerError>;
