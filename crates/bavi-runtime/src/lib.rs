//! # bavi runtime
//!
//! Wires the pieces of the bot together:
//!
//! - **Configuration**: layered `bavi.toml` + `BAVI_*` environment loading
//!   ([`config`]).
//! - **Logging**: a `tracing-subscriber` setup driven by `[logging]`
//!   ([`logging`]).
//! - **Event loop**: [`BaviRuntime`] opens storage, connects the IRC
//!   transport, loads the linked plugins, and dispatches messages one at a
//!   time until shutdown.
//!
//! ```ignore
//! use bavi_runtime::BaviRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BaviRuntime::builder().build()?;
//!     runtime.init_logging()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{BaviConfig, ConfigError, ConfigLoader, ConfigResult};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{BaviRuntime, RuntimeBuilder};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
