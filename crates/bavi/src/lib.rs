//! # bavi
//!
//! A general-purpose IRC chat bot built around a small dispatch core.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  InboundMessage  ┌────────────┐  lookup / match_first  ┌──────────┐
//! │ IrcClient  │─────────────────▶│ Dispatcher │───────────────────────▶│ handlers │
//! │ (transport)│◀─────────────────│   (Bot)    │◀───────────────────────│ (plugins)│
//! └────────────┘   PRIVMSG lines  └────────────┘      say / reply_to    └──────────┘
//! ```
//!
//! - **Commands**: `.trigger args` or `bavi: trigger args` runs the handler
//!   registered for `trigger`.
//! - **Matchers**: any other message is tested against an ordered list of
//!   patterns; the first match runs its handler.
//! - **Plugins**: declared with [`register_plugin!`](prelude::register_plugin)
//!   and loaded once at startup.
//!
//! ## Writing a plugin
//!
//! ```rust,ignore
//! use bavi::prelude::*;
//!
//! register_plugin! {
//!     pub static EXAMPLE = PluginDescriptor::new("example", init);
//! }
//!
//! fn init(bot: &mut Bot, _config: &PluginConfig) -> Result<(), BoxError> {
//!     bot.add_command("example", example, &["ex"])?;
//!     bot.add_matcher(Regex::new(r"(?i)\bhello\b")?, hello, Priority::Low)?;
//!     Ok(())
//! }
//!
//! async fn example(ctx: CommandContext) -> HandlerResult {
//!     ctx.say("This is an example").await?;
//!     Ok(())
//! }
//!
//! async fn hello(ctx: MatchContext) -> HandlerResult {
//!     ctx.reply("hello!").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `json-log`: JSON log lines (`[logging] format = "json"`)

pub use bavi_core as core;
pub use bavi_framework as framework;
pub use bavi_plugins as plugins;
pub use bavi_runtime as runtime;
pub use bavi_transport as transport;

/// Everything needed to write plugins and run the bot.
///
/// ```rust,ignore
/// use bavi::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use bavi_runtime::BaviRuntime;

    // Plugins and handlers
    pub use bavi_framework::prelude::*;
    pub use bavi_framework::{DispatchOutcome, Dispatcher, PluginLoader};

    // Transport-facing types
    pub use bavi_core::{Connection, InboundMessage};
}
