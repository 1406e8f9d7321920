//! # bavi framework
//!
//! The message dispatch engine of the bavi chat bot.
//!
//! - **Command registry**: trigger words (and aliases) mapped to handlers,
//!   write-once and case-sensitive.
//! - **Matcher registry**: an ordered pipeline of compiled patterns with
//!   priority-based insertion.
//! - **Plugins**: build-time registered init functions that populate both
//!   registries once at startup.
//! - **Dispatcher**: classifies each inbound message, routes it to exactly
//!   one handler, and isolates handler failures.
//!
//! ```text
//!            startup                               every message
//! ┌──────────────┐  init(&mut Bot)  ┌──────┐  ┌────────────┐  lookup / match_first
//! │ PluginLoader │─────────────────▶│ Bot  │◀─│ Dispatcher │◀──── InboundMessage
//! └──────────────┘                  └──┬───┘  └────────────┘
//!                                      │ say / reply_to
//!                                      ▼
//!                                 Connection
//! ```

pub mod bot;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod plugin;
pub mod storage;

pub use bot::{Bot, DEFAULT_COMMAND_PREFIX};
pub use command::CommandRegistry;
pub use dispatcher::{Classification, DispatchOutcome, Dispatcher, UNKNOWN_COMMAND_REPLY, classify};
pub use error::{
    BoxError, HandlerError, HandlerResult, PluginLoadError, RegistrationError, SendError,
    StorageError,
};
pub use handler::{
    BoxedCommandHandler, BoxedMatcherHandler, CommandContext, CommandHandler, MatchContext,
    MatcherHandler,
};
pub use matcher::{IntoPattern, MatchResult, MatcherRegistry, Priority};
pub use plugin::{LoadReport, PluginConfig, PluginDescriptor, PluginLoadState, PluginLoader};
pub use storage::Storage;

pub use regex;
pub use rusqlite;

/// Everything a plugin usually needs.
pub mod prelude {
    pub use crate::register_plugin;
    pub use crate::{
        BoxError, Bot, CommandContext, HandlerError, HandlerResult, MatchContext, PluginConfig,
        PluginDescriptor, Priority, SendError, Storage,
    };
    pub use bavi_core::Source;
    pub use regex::Regex;
}

#[doc(hidden)]
pub mod __private {
    pub use linkme;
}
