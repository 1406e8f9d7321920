//! Configuration validation.
//!
//! Runs after extraction and catches values that parse but could never work.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BaviConfig, BotSection, IrcSection, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &BaviConfig) -> ConfigResult<()> {
    validate_irc(&config.irc)?;
    validate_bot(&config.bot)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_irc(irc: &IrcSection) -> ConfigResult<()> {
    if irc.host.trim().is_empty() {
        return Err(ConfigError::missing_field("irc.host"));
    }

    if irc.port == 0 {
        return Err(ConfigError::InvalidPort(irc.port));
    }

    if irc.nickname.is_empty() {
        return Err(ConfigError::missing_field("irc.nickname"));
    }
    if irc.nickname.contains([' ', ',', '*', '?', '!', '@']) || irc.nickname.starts_with(['#', ':', '&']) {
        return Err(ConfigError::validation(format!(
            "Invalid nickname: {:?}",
            irc.nickname
        )));
    }

    for channel in &irc.channels {
        if !bavi_transport::is_channel(channel) || channel.contains([' ', ',', '\x07']) {
            return Err(ConfigError::validation(format!(
                "Invalid channel name: {channel:?}. Channel names start with one of # & + !"
            )));
        }
    }

    if irc.reconnect_delay_secs == 0 {
        return Err(ConfigError::validation(
            "Reconnect delay must be greater than 0",
        ));
    }
    if irc.max_reconnect_delay_secs < irc.reconnect_delay_secs {
        return Err(ConfigError::validation(
            "Max reconnect delay must be greater than or equal to the reconnect delay",
        ));
    }

    Ok(())
}

fn validate_bot(bot: &BotSection) -> ConfigResult<()> {
    if bot.command_prefix.is_empty() {
        return Err(ConfigError::missing_field("bot.command_prefix"));
    }
    if bot.command_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(
            "Command prefix cannot contain whitespace",
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    if let Some(target) = logging.filters.keys().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter target: {target:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;

    fn valid() -> BaviConfig {
        let mut config = BaviConfig::default();
        config.irc.channels = vec!["#bavi".into(), "&local".into()];
        config
    }

    #[test]
    fn test_default_is_valid() {
        validate_config(&BaviConfig::default()).unwrap();
        validate_config(&valid()).unwrap();
    }

    #[test]
    fn test_rejects_bad_irc() {
        let mut config = valid();
        config.irc.port = 0;
        assert!(matches!(validate_config(&config), Err(ConfigError::InvalidPort(0))));

        let mut config = valid();
        config.irc.nickname = String::new();
        assert!(matches!(validate_config(&config), Err(ConfigError::MissingField { .. })));

        let mut config = valid();
        config.irc.nickname = "two words".into();
        assert!(matches!(validate_config(&config), Err(ConfigError::ValidationError { .. })));

        let mut config = valid();
        config.irc.channels.push("bavi".into());
        assert!(matches!(validate_config(&config), Err(ConfigError::ValidationError { .. })));

        let mut config = valid();
        config.irc.max_reconnect_delay_secs = 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_prefix() {
        let mut config = valid();
        config.bot.command_prefix = String::new();
        assert!(validate_config(&config).is_err());

        config.bot.command_prefix = "! ".into();
        assert!(validate_config(&config).is_err());

        config.bot.command_prefix = "!!".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_file_output_without_path() {
        let mut config = valid();
        config.logging.output = LogOutput::File;
        assert!(matches!(validate_config(&config), Err(ConfigError::MissingField { ref field }) if field == "logging.file_path"));

        config.logging.file_path = Some("bavi.log".into());
        config.logging.filters.insert(" ".into(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }
}
