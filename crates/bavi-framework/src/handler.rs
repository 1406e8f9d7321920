//! Handler traits and the contexts handed to them.
//!
//! A command handler receives a [`CommandContext`]; a matcher handler receives
//! a [`MatchContext`]. Both traits are implemented for any
//! `Fn(Context) -> impl Future<Output = HandlerResult>`, so plain `async fn`s
//! and closures returning `async move` blocks can be registered directly:
//!
//! ```rust,ignore
//! async fn example(ctx: CommandContext) -> HandlerResult {
//!     ctx.say("This is an example").await?;
//!     Ok(())
//! }
//!
//! bot.add_command("example", example, &[])?;
//! bot.add_command("echo", |ctx: CommandContext| async move {
//!     ctx.say(&ctx.args).await?;
//!     Ok(())
//! }, &["say"])?;
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use bavi_core::Source;

use crate::bot::Bot;
use crate::error::{HandlerResult, SendError};
use crate::matcher::MatchResult;

// =============================================================================
// Contexts
// =============================================================================

/// Everything a command handler is invoked with.
#[derive(Clone)]
pub struct CommandContext {
    /// Handle to the dispatch core.
    pub bot: Arc<Bot>,
    /// Who sent the message.
    pub source: Source,
    /// Where the message was sent.
    pub destination: String,
    /// Text after the trigger, possibly empty.
    pub args: String,
    /// The trigger word that selected this handler (an alias if one was used).
    pub trigger: String,
}

impl CommandContext {
    /// Says `text` in the destination the command came from.
    pub async fn say(&self, text: &str) -> Result<(), SendError> {
        self.bot.say(&self.destination, text).await
    }

    /// Replies to the sender, prefixing their nick.
    pub async fn reply(&self, text: &str) -> Result<(), SendError> {
        self.bot.reply_to(&self.source, &self.destination, text).await
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("trigger", &self.trigger)
            .field("args", &self.args)
            .finish()
    }
}

/// Everything a matcher handler is invoked with.
#[derive(Clone)]
pub struct MatchContext {
    /// Handle to the dispatch core.
    pub bot: Arc<Bot>,
    /// Who sent the message.
    pub source: Source,
    /// Where the message was sent.
    pub destination: String,
    /// The full, trimmed message text.
    pub text: String,
    /// The match that selected this handler.
    pub matched: MatchResult,
}

impl MatchContext {
    /// Says `text` in the destination the message came from.
    pub async fn say(&self, text: &str) -> Result<(), SendError> {
        self.bot.say(&self.destination, text).await
    }

    /// Replies to the sender, prefixing their nick.
    pub async fn reply(&self, text: &str) -> Result<(), SendError> {
        self.bot.reply_to(&self.source, &self.destination, text).await
    }
}

impl std::fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("text", &self.text)
            .field("matched", &self.matched.as_str())
            .finish()
    }
}

// =============================================================================
// Handler traits
// =============================================================================

/// Logic bound to a command trigger.
pub trait CommandHandler: Send + Sync + 'static {
    /// Runs the command.
    fn call(&self, ctx: CommandContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: CommandContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx))
    }
}

/// Logic bound to a text pattern.
pub trait MatcherHandler: Send + Sync + 'static {
    /// Runs the matcher.
    fn call(&self, ctx: MatchContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> MatcherHandler for F
where
    F: Fn(MatchContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: MatchContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx))
    }
}

/// A shared command handler.
pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

/// A shared matcher handler.
pub type BoxedMatcherHandler = Arc<dyn MatcherHandler>;
