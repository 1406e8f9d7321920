//! Plugin descriptor: the static handle to a plugin.

use std::fmt;

use crate::bot::Bot;
use crate::error::BoxError;

use super::config::PluginConfig;

/// A plugin's init entrypoint.
///
/// Called exactly once at startup with the bot being assembled and the
/// plugin's own configuration section.
pub type InitFn = fn(&mut Bot, &PluginConfig) -> Result<(), BoxError>;

/// A static, `Copy` descriptor that names a plugin and its init entrypoint.
///
/// Descriptors are usually declared with [`register_plugin!`], which also
/// adds them to the build-time plugin registry.
///
/// [`register_plugin!`]: crate::register_plugin
#[derive(Clone, Copy)]
pub struct PluginDescriptor {
    /// Unique plugin name, also the key of its `[plugins.<name>]` config table.
    pub name: &'static str,
    /// Short human-readable description.
    pub desc: &'static str,
    /// Plugin version.
    pub version: &'static str,
    /// Init entrypoint.
    pub init: InitFn,
}

impl PluginDescriptor {
    /// Creates a descriptor with no description and version `0.0.0`.
    pub const fn new(name: &'static str, init: InitFn) -> Self {
        Self {
            name,
            desc: "",
            version: "0.0.0",
            init,
        }
    }

    /// Sets the description.
    pub const fn with_desc(mut self, desc: &'static str) -> Self {
        self.desc = desc;
        self
    }

    /// Sets the version.
    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}
