//! Per-plugin configuration.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// The raw `[plugins.<name>]` table handed to a plugin's init.
///
/// A missing table is presented as an empty one, so config structs that are
/// `#[serde(default)]` deserialize to their defaults.
///
/// ```rust,ignore
/// #[derive(Deserialize)]
/// #[serde(default)]
/// struct UrlConfig { max_urls: usize }
///
/// fn init(bot: &mut Bot, config: &PluginConfig) -> Result<(), BoxError> {
///     let config: UrlConfig = config.parse()?;
///     ...
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    value: Value,
}

impl PluginConfig {
    /// Wraps a raw config value.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The raw value; `Null` when no table was configured.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Deserializes the table into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let value = match &self.value {
            Value::Null => Value::Object(Map::new()),
            value => value.clone(),
        };
        serde_json::from_value(value)
    }
}
