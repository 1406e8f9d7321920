//! The transport boundary seen by the dispatch core.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;

/// A live connection to the chat network.
///
/// This is everything the dispatch core needs from a transport. Connection
/// setup, authentication, joining channels and reconnecting all happen behind
/// this trait.
///
/// Implementations receive text that has already been sanitized and checked
/// against [`is_joined`](Connection::is_joined); they only have to frame and
/// transmit it.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Returns the nickname the bot is currently using.
    fn nickname(&self) -> String;

    /// Returns `true` if the bot currently occupies `destination`.
    fn is_joined(&self, destination: &str) -> bool;

    /// Sends one line of text to `target`.
    async fn send_privmsg(&self, target: &str, text: &str) -> TransportResult<()>;

    /// Leaves the network.
    ///
    /// The default implementation does nothing.
    async fn quit(&self, _reason: &str) -> TransportResult<()> {
        Ok(())
    }
}

/// A shared connection trait object.
pub type BoxedConnection = Arc<dyn Connection>;
