//! Inbound message types.

use std::fmt;

/// The participant who sent a message.
///
/// Parsed from an IRC prefix of the form `nick!ident@host`. Only the nick is
/// guaranteed; servers may omit the ident and host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Display name of the sender.
    pub nick: String,
    /// Ident (user name), if the server supplied one.
    pub ident: Option<String>,
    /// Host name, if the server supplied one.
    pub host: Option<String>,
}

impl Source {
    /// Creates a source with only a nick.
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            ident: None,
            host: None,
        }
    }

    /// Parses a `nick!ident@host` mask.
    ///
    /// Missing parts are left as `None`; a bare `nick` is valid.
    pub fn parse(mask: &str) -> Self {
        let (rest, host) = match mask.split_once('@') {
            Some((rest, host)) => (rest, Some(host.to_string())),
            None => (mask, None),
        };
        let (nick, ident) = match rest.split_once('!') {
            Some((nick, ident)) => (nick, Some(ident.to_string())),
            None => (rest, None),
        };

        Self {
            nick: nick.to_string(),
            ident,
            host,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nick)?;
        if let Some(ident) = &self.ident {
            write!(f, "!{ident}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}

/// One line of chat delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Who sent the message.
    pub source: Source,
    /// The channel the message was sent to.
    pub destination: String,
    /// Raw message text.
    pub text: String,
}

impl InboundMessage {
    /// Creates a new inbound message.
    pub fn new(source: Source, destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source,
            destination: destination.into(),
            text: text.into(),
        }
    }
}
