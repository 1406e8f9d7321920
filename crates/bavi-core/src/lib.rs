//! # bavi core
//!
//! Foundation types shared by every layer of the bavi chat bot.
//!
//! - **Messages**: who sent a line ([`Source`]), where it was sent and what it
//!   said ([`InboundMessage`]).
//! - **Connection**: the thin transport boundary the dispatch core talks to
//!   ([`Connection`]). The dispatch core never sees sockets or protocol lines;
//!   it only sends text to a destination, asks whether a destination is
//!   joined, and reads its own nickname.
//! - **Line safety**: [`sanitize`] strips the characters that would break
//!   line-oriented framing.
//! - **Case mapping**: RFC 1459 comparisons for channel and nick names.
//!
//! ```text
//! ┌─────────────┐  InboundMessage  ┌────────────┐   say / reply_to   ┌─────────────┐
//! │  Transport  │─────────────────▶│ Dispatcher │───────────────────▶│ Connection  │
//! └─────────────┘                  └────────────┘                    └─────────────┘
//! ```

pub mod casemap;
pub mod connection;
pub mod error;
pub mod message;
pub mod sanitize;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use casemap::{irc_eq, irc_to_lower};
pub use connection::{BoxedConnection, Connection};
pub use error::{TransportError, TransportResult};
pub use message::{InboundMessage, Source};
pub use sanitize::sanitize;
