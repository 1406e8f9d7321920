//! Message dispatcher.
//!
//! Every inbound message goes through [`Dispatcher::dispatch`], one at a time:
//!
//! ```text
//!  Received ──▶ classify ──┬─ Command ──▶ lookup ──┬─ found ────▶ handler
//!                          │                       └─ unknown ──▶ "I don't know about that command."
//!                          └─ Text ────▶ match_first ─┬─ match ──▶ handler
//!                                                     └─ none ───▶ ignored
//! ```
//!
//! Classification, on the trimmed text:
//!
//! 1. `<prefix><trigger> [args]` is a command.
//! 2. `<nick>: <trigger> [args]` or `<nick>, <trigger> [args]` is an
//!    addressed command.
//! 3. Anything else is free text for the matcher pipeline.
//!
//! A handler that returns an error or panics never takes the dispatcher down:
//! the failure is said to the destination as `"<kind>: <message>"` and
//! dispatch returns normally.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{Instrument, debug, debug_span, error, warn};

use bavi_core::InboundMessage;

use crate::bot::Bot;
use crate::error::{HandlerError, HandlerResult};
use crate::handler::{CommandContext, MatchContext};

/// Reply sent when a command trigger is not registered.
pub const UNKNOWN_COMMAND_REPLY: &str = "I don't know about that command.";

/// How a message was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// An explicit or addressed command.
    Command {
        /// The trigger word.
        trigger: &'a str,
        /// Everything after the trigger, possibly empty.
        args: &'a str,
    },
    /// Free text for the matcher pipeline.
    Text(&'a str),
}

/// Classifies a message for dispatch.
///
/// An empty `prefix` disables prefixed commands; addressing still works.
pub fn classify<'a>(text: &'a str, prefix: &str, nickname: &str) -> Classification<'a> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix(prefix).filter(|_| !prefix.is_empty()) {
        let (trigger, args) = split_first_word(rest);
        return Classification::Command { trigger, args };
    }

    if is_addressed(text, nickname) {
        let rest = text.split_once(' ').map(|(_, rest)| rest).unwrap_or_default();
        let (trigger, args) = split_first_word(rest);
        return Classification::Command { trigger, args };
    }

    Classification::Text(text)
}

fn is_addressed(text: &str, nickname: &str) -> bool {
    !nickname.is_empty()
        && text
            .strip_prefix(nickname)
            .is_some_and(|rest| rest.starts_with(": ") || rest.starts_with(", "))
}

fn split_first_word(text: &str) -> (&str, &str) {
    text.split_once(char::is_whitespace).unwrap_or((text, ""))
}

/// What happened to a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A command handler ran to completion.
    Command,
    /// The trigger was not registered and the sender was told so.
    UnknownCommand,
    /// A matcher handler ran to completion.
    Matched,
    /// A handler failed and the failure was reported.
    HandlerFailed,
    /// Free text matched no pattern.
    Ignored,
}

/// Routes inbound messages to the handlers registered on a [`Bot`].
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync` and cheap to clone; the bot it wraps is
/// frozen once the dispatcher is built.
#[derive(Clone)]
pub struct Dispatcher {
    bot: Arc<Bot>,
}

impl Dispatcher {
    /// Freezes `bot` and creates a dispatcher over it.
    pub fn new(bot: Bot) -> Self {
        Self { bot: Arc::new(bot) }
    }

    /// The frozen bot.
    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// Dispatches one message to completion.
    pub async fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        let span = debug_span!(
            "dispatch",
            destination = %message.destination,
            source = %message.source.nick
        );
        self.dispatch_inner(&message).instrument(span).await
    }

    async fn dispatch_inner(&self, message: &InboundMessage) -> DispatchOutcome {
        let nickname = self.bot.nickname();
        match classify(&message.text, self.bot.command_prefix(), &nickname) {
            Classification::Command { trigger, args } => {
                self.dispatch_command(message, trigger, args).await
            }
            Classification::Text(text) => self.dispatch_text(message, text).await,
        }
    }

    async fn dispatch_command(
        &self,
        message: &InboundMessage,
        trigger: &str,
        args: &str,
    ) -> DispatchOutcome {
        let Some(handler) = self.bot.commands().lookup(trigger) else {
            debug!(trigger, "Unknown command");
            if let Err(e) = self
                .bot
                .reply_to(&message.source, &message.destination, UNKNOWN_COMMAND_REPLY)
                .await
            {
                warn!(trigger, error = %e, "Failed to send unknown-command reply");
            }
            return DispatchOutcome::UnknownCommand;
        };

        debug!(trigger, "Dispatching command");
        let ctx = CommandContext {
            bot: Arc::clone(&self.bot),
            source: message.source.clone(),
            destination: message.destination.clone(),
            args: args.to_string(),
            trigger: trigger.to_string(),
        };

        match guarded(|| handler.call(ctx)).await {
            Ok(()) => DispatchOutcome::Command,
            Err(e) => {
                error!(trigger, kind = e.kind(), error = %e.message(), "Command failed");
                self.report_failure(&message.destination, &e).await;
                DispatchOutcome::HandlerFailed
            }
        }
    }

    async fn dispatch_text(&self, message: &InboundMessage, text: &str) -> DispatchOutcome {
        let Some((handler, matched)) = self.bot.matchers().match_first(text) else {
            return DispatchOutcome::Ignored;
        };

        debug!(matched = matched.as_str(), "Dispatching matcher");
        let ctx = MatchContext {
            bot: Arc::clone(&self.bot),
            source: message.source.clone(),
            destination: message.destination.clone(),
            text: text.to_string(),
            matched,
        };

        match guarded(|| handler.call(ctx)).await {
            Ok(()) => DispatchOutcome::Matched,
            Err(e) => {
                error!(kind = e.kind(), error = %e.message(), "Matcher failed");
                self.report_failure(&message.destination, &e).await;
                DispatchOutcome::HandlerFailed
            }
        }
    }

    async fn report_failure(&self, destination: &str, failure: &HandlerError) {
        if let Err(e) = self.bot.say(destination, &failure.to_string()).await {
            warn!(error = %e, "Failed to report handler failure");
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("bot", &self.bot).finish()
    }
}

/// Runs a handler, turning panics into [`HandlerError`]s.
///
/// Covers both a panic while building the future and a panic while polling it.
async fn guarded<F>(call: F) -> HandlerResult
where
    F: FnOnce() -> BoxFuture<'static, HandlerResult>,
{
    let future = match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(future) => future,
        Err(payload) => return Err(HandlerError::from_panic(payload)),
    };

    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(HandlerError::from_panic(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixed() {
        assert_eq!(
            classify(".choose a, b", ".", "bavi"),
            Classification::Command {
                trigger: "choose",
                args: "a, b"
            }
        );
        assert_eq!(
            classify("  .time  ", ".", "bavi"),
            Classification::Command {
                trigger: "time",
                args: ""
            }
        );
        assert_eq!(
            classify("!test x", "!", "bavi"),
            Classification::Command {
                trigger: "test",
                args: "x"
            }
        );
    }

    #[test]
    fn test_classify_addressed() {
        assert_eq!(
            classify("bavi: example2 foo bar", ".", "bavi"),
            Classification::Command {
                trigger: "example2",
                args: "foo bar"
            }
        );
        assert_eq!(
            classify("bavi, time", ".", "bavi"),
            Classification::Command {
                trigger: "time",
                args: ""
            }
        );
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(
            classify("bavi is great", ".", "bavi"),
            Classification::Text("bavi is great")
        );
        assert_eq!(
            classify("bavi:no space", ".", "bavi"),
            Classification::Text("bavi:no space")
        );
        assert_eq!(
            classify("  hello world \r\n", ".", "bavi"),
            Classification::Text("hello world")
        );
        assert_eq!(classify("anything", ".", ""), Classification::Text("anything"));
    }

    #[test]
    fn test_classify_empty_prefix_is_text() {
        assert_eq!(
            classify("hello world", "", "bavi"),
            Classification::Text("hello world")
        );
        assert_eq!(
            classify("bavi: time", "", "bavi"),
            Classification::Command {
                trigger: "time",
                args: ""
            }
        );
    }

    #[test]
    fn test_bare_prefix_is_empty_trigger() {
        assert_eq!(
            classify(".", ".", "bavi"),
            Classification::Command {
                trigger: "",
                args: ""
            }
        );
    }

    async fn panics_while_polling() -> HandlerResult {
        panic!("while polling")
    }

    async fn succeeds() -> HandlerResult {
        Ok(())
    }

    #[tokio::test]
    async fn test_guarded_catches_panics() {
        let err = guarded(|| panic!("before the future")).await.unwrap_err();
        assert_eq!(err.to_string(), "Panic: before the future");

        let err = guarded(|| Box::pin(panics_while_polling())).await.unwrap_err();
        assert_eq!(err.to_string(), "Panic: while polling");

        assert!(guarded(|| Box::pin(succeeds())).await.is_ok());
    }
}
