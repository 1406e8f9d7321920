//! # bavi transport
//!
//! IRC client transport for the bavi chat bot.
//!
//! ```text
//! ┌─────────────────────┐
//! │  bavi-runtime       │  (dispatch loop)
//! ├─────────────────────┤
//! │  bavi-core          │  (Connection trait)
//! ├─────────────────────┤
//! │  bavi-transport     │  <- This crate (IRC over TCP)
//! ├─────────────────────┤
//! │  Network (TCP)      │
//! └─────────────────────┘
//! ```
//!
//! [`IrcClient`] owns the socket in a background task and exposes an
//! [`IrcHandle`] implementing [`Connection`](bavi_core::Connection) plus a
//! stream of channel messages. Lines are read leniently: invalid UTF-8 is
//! replaced rather than treated as an error.
//!
//! ```rust,ignore
//! let shutdown = CancellationToken::new();
//! let client = IrcClient::connect(config, shutdown.clone()).await?;
//! let (handle, mut inbound, task) = client.into_parts();
//!
//! while let Some(message) = inbound.recv().await {
//!     dispatcher.dispatch(message).await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod line;

pub use client::{IrcClient, IrcHandle};
pub use config::{IrcConfig, ReconnectConfig};
pub use line::{IrcLine, is_channel};

pub use tokio_util::sync::CancellationToken;
