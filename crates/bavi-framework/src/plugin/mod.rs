//! Plugin system.
//!
//! A plugin is a named init function. Declaring one with
//! [`register_plugin!`](crate::register_plugin) links it into the binary;
//! [`PluginLoader`] runs every linked plugin once at startup.
//!
//! ```rust,ignore
//! use bavi_framework::prelude::*;
//!
//! register_plugin! {
//!     pub static TEST_PLUGIN = PluginDescriptor::new("test", init)
//!         .with_desc("Says the first word back");
//! }
//!
//! fn init(bot: &mut Bot, _config: &PluginConfig) -> Result<(), BoxError> {
//!     bot.add_command("test", test, &[])?;
//!     Ok(())
//! }
//! ```

mod config;
mod descriptor;
mod loader;
mod registry;

pub use config::PluginConfig;
pub use descriptor::{InitFn, PluginDescriptor};
pub use loader::{LoadReport, PluginLoadState, PluginLoader};
pub use registry::PLUGINS;

/// Declares a plugin descriptor and adds it to the build-time registry.
///
/// The static must be of type [`PluginDescriptor`]; the macro supplies the
/// type annotation.
#[macro_export]
macro_rules! register_plugin {
    ($(#[$meta:meta])* $vis:vis static $name:ident = $descriptor:expr $(;)?) => {
        $(#[$meta])*
        #[$crate::__private::linkme::distributed_slice($crate::plugin::PLUGINS)]
        #[linkme(crate = $crate::__private::linkme)]
        $vis static $name: $crate::plugin::PluginDescriptor = $descriptor;
    };
}
