//! Connection settings for the IRC client.

use std::time::Duration;

/// How the client reconnects after losing the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Whether to reconnect at all.
    pub auto_reconnect: bool,
    /// Maximum number of consecutive failed attempts (`None` = infinite).
    pub max_retries: Option<u32>,
    /// Delay before the first attempt.
    pub initial_delay: Duration,
    /// Upper bound for the delay.
    pub max_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_retries: None,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Never reconnect.
    pub fn disabled() -> Self {
        Self {
            auto_reconnect: false,
            ..Default::default()
        }
    }

    pub(crate) fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_multiplier).min(self.max_delay)
    }
}

/// Everything needed to connect and register with an IRC server.
#[derive(Debug, Clone, PartialEq)]
pub struct IrcConfig {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Whether to wrap the connection in TLS.
    pub tls: bool,
    /// Server password, sent as `PASS`.
    pub password: Option<String>,
    /// Desired nickname.
    pub nickname: String,
    /// User name sent in `USER`.
    pub username: String,
    /// Real name sent in `USER`.
    pub realname: String,
    /// Channels to join after registration.
    pub channels: Vec<String>,
    /// Message sent with `QUIT` when the client is shut down.
    pub quit_message: String,
    /// Reconnection policy.
    pub reconnect: ReconnectConfig,
}

impl IrcConfig {
    /// Creates a config with the nickname doubling as user and real name.
    pub fn new(host: impl Into<String>, port: u16, nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        Self {
            host: host.into(),
            port,
            tls: false,
            password: None,
            username: nickname.clone(),
            realname: nickname.clone(),
            nickname,
            channels: Vec::new(),
            quit_message: "Shutting down".to_string(),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Sets the channels to join (builder pattern).
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the server password (builder pattern).
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enables or disables TLS (builder pattern).
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the shutdown `QUIT` message (builder pattern).
    pub fn with_quit_message(mut self, message: impl Into<String>) -> Self {
        self.quit_message = message.into();
        self
    }

    /// Sets the reconnection policy (builder pattern).
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// `host:port`, for dialing and logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(30),
            ..Default::default()
        };
        let d1 = config.next_delay(config.initial_delay);
        let d2 = config.next_delay(d1);
        assert_eq!(d1, Duration::from_secs(20));
        assert_eq!(d2, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = IrcConfig::new("irc.example.org", 6667, "bavi")
            .with_channels(["#a", "#b"])
            .with_password("hunter2");
        assert_eq!(config.address(), "irc.example.org:6667");
        assert_eq!(config.username, "bavi");
        assert_eq!(config.channels, ["#a", "#b"]);
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert!(!config.tls);
        assert!(config.with_tls(true).tls);
    }
}
