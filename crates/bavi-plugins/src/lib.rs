//! # bavi plugins
//!
//! The stock plugins shipped with bavi. Each module declares its plugin with
//! [`register_plugin!`](bavi_framework::register_plugin); linking this crate
//! into a binary is enough for the loader to find them.
//!
//! | plugin   | commands                | matchers            |
//! |----------|-------------------------|---------------------|
//! | `test`   | `test`                  |                     |
//! | `random` | `choose`, `pick`        |                     |
//! | `tz`     | `settz`, `time`         |                     |
//! | `url`    | `title`                 | web URLs, IPv4 URLs |

pub mod random;
pub mod tz;
pub mod url;

use bavi_framework::PluginDescriptor;

/// The descriptors of every stock plugin.
///
/// Referencing this from a binary keeps the plugins' registrations linked.
pub fn all() -> [&'static PluginDescriptor; 4] {
    [&random::RANDOM, &test::TEST, &tz::TZ, &url::URL]
}

#[cfg(test)]
mod tests {
    use bavi_framework::PluginLoader;

    #[test]
    fn test_all_plugins_linked() {
        let names: Vec<_> = PluginLoader::discover().iter().map(|p| p.name).collect();
        assert_eq!(names, ["random", "test", "tz", "url"]);
    }

    #[test]
    fn test_all_matches_discovery() {
        let names: Vec<_> = super::all().iter().map(|p| p.name).collect();
        assert_eq!(names, ["random", "test", "tz", "url"]);
    }
}
