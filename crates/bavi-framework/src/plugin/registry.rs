//! Build-time plugin registry.
//!
//! Every crate that defines plugins contributes its descriptors to
//! [`PLUGINS`] through [`register_plugin!`](crate::register_plugin). The
//! slice is assembled by the linker; there is no filesystem scanning and no
//! runtime registration.

use linkme::distributed_slice;

use super::descriptor::PluginDescriptor;

/// Every plugin linked into the binary, in unspecified order.
#[distributed_slice]
pub static PLUGINS: [PluginDescriptor];
