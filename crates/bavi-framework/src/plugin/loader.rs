//! Plugin loader.
//!
//! Runs every plugin's init once, in name order, against the bot being
//! assembled. A plugin that returns an error or panics is logged and skipped;
//! anything it registered before failing is rolled back, and the remaining
//! plugins load as usual.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, error, info};

use crate::bot::Bot;
use crate::error::{PluginLoadError, panic_message};

use super::config::PluginConfig;
use super::descriptor::PluginDescriptor;
use super::registry::PLUGINS;

/// What happened to one plugin during loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginLoadState {
    /// Init succeeded.
    Loaded,
    /// Init failed or panicked; nothing it registered was kept.
    Failed,
    /// Skipped because it is listed in `disabled_plugins`.
    Disabled,
}

/// Per-plugin outcome of a [`PluginLoader::load_all`] run.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    entries: Vec<(&'static str, PluginLoadState)>,
}

impl LoadReport {
    /// The state of `plugin`, if it was seen.
    pub fn state(&self, plugin: &str) -> Option<PluginLoadState> {
        self.entries
            .iter()
            .find(|(name, _)| *name == plugin)
            .map(|(_, state)| *state)
    }

    /// Names of the plugins that loaded.
    pub fn loaded(&self) -> Vec<&'static str> {
        self.with_state(PluginLoadState::Loaded)
    }

    /// Names of the plugins that failed.
    pub fn failed(&self) -> Vec<&'static str> {
        self.with_state(PluginLoadState::Failed)
    }

    fn with_state(&self, wanted: PluginLoadState) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, state)| *state == wanted)
            .map(|(name, _)| *name)
            .collect()
    }

    fn push(&mut self, name: &'static str, state: PluginLoadState) {
        self.entries.push((name, state));
    }
}

/// Loads plugins into a [`Bot`].
#[derive(Debug, Clone, Default)]
pub struct PluginLoader {
    configs: HashMap<String, Value>,
    disabled: HashSet<String>,
}

impl PluginLoader {
    /// Creates a loader with no plugin configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-plugin config tables, keyed by plugin name.
    pub fn with_configs(mut self, configs: HashMap<String, Value>) -> Self {
        self.configs = configs;
        self
    }

    /// Skips the named plugins.
    pub fn disable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
        self
    }

    /// Every plugin linked into the binary, sorted by name.
    pub fn discover() -> Vec<&'static PluginDescriptor> {
        let mut plugins: Vec<&'static PluginDescriptor> = PLUGINS.iter().collect();
        plugins.sort_by_key(|p| p.name);
        plugins
    }

    /// Loads every linked plugin.
    pub fn load_all(&self, bot: &mut Bot) -> LoadReport {
        self.load_from(bot, Self::discover())
    }

    /// Loads the given plugins in order.
    pub fn load_from<'a, I>(&self, bot: &mut Bot, plugins: I) -> LoadReport
    where
        I: IntoIterator<Item = &'a PluginDescriptor>,
    {
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();

        for descriptor in plugins {
            let name = descriptor.name;

            if self.disabled.contains(name) {
                info!(plugin = %name, "Plugin disabled, skipping");
                report.push(name, PluginLoadState::Disabled);
                continue;
            }

            let result = if seen.insert(name) {
                self.load_one(bot, descriptor)
            } else {
                Err(PluginLoadError::AlreadyLoaded(name))
            };

            match result {
                Ok(()) => report.push(name, PluginLoadState::Loaded),
                Err(e) => {
                    error!(plugin = %name, error = %e, "Failed to load plugin");
                    report.push(name, PluginLoadState::Failed);
                }
            }
        }

        info!(
            loaded = report.loaded().len(),
            failed = report.failed().len(),
            "Plugin loading finished"
        );
        report
    }

    /// Runs one plugin's init.
    ///
    /// On failure the bot's registries are restored to what they were before
    /// the call.
    pub fn load_one(&self, bot: &mut Bot, descriptor: &PluginDescriptor) -> Result<(), PluginLoadError> {
        let name = descriptor.name;
        let config = PluginConfig::new(self.configs.get(name).cloned().unwrap_or(Value::Null));
        debug!(plugin = %name, version = descriptor.version, "Loading plugin");

        let checkpoint = bot.checkpoint();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (descriptor.init)(bot, &config)));

        let err = match outcome {
            Ok(Ok(())) => {
                info!(plugin = %name, "Plugin loaded");
                return Ok(());
            }
            Ok(Err(source)) => PluginLoadError::Init {
                plugin: name,
                source,
            },
            Err(payload) => PluginLoadError::Panicked {
                plugin: name,
                message: panic_message(payload.as_ref()),
            },
        };

        bot.rollback(checkpoint);
        Err(err)
    }
}
