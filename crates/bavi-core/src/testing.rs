//! Test doubles for code that talks to a [`Connection`].
//!
//! Enabled by the `testing` feature so dependent crates can use it from their
//! own tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::casemap::irc_to_lower;
use crate::connection::Connection;
use crate::error::{TransportError, TransportResult};

/// A [`Connection`] that records every line instead of transmitting it.
///
/// ```rust,ignore
/// let conn = Arc::new(RecordingConnection::new("TestBot", ["#test"]));
/// conn.send_privmsg("#test", "hello").await?;
/// assert_eq!(conn.last(), Some(("#test".into(), "hello".into())));
/// ```
#[derive(Debug)]
pub struct RecordingConnection {
    nickname: String,
    channels: HashSet<String>,
    sent: Mutex<Vec<(String, String)>>,
    fail_sends: bool,
}

impl RecordingConnection {
    /// Creates a connection that appears joined to `channels`.
    pub fn new<I, S>(nickname: impl Into<String>, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            nickname: nickname.into(),
            channels: channels
                .into_iter()
                .map(|c| irc_to_lower(c.as_ref()))
                .collect(),
            sent: Mutex::new(Vec::new()),
            fail_sends: false,
        }
    }

    /// Makes every send fail with [`TransportError::ConnectionClosed`].
    pub fn failing(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Returns every `(target, text)` pair sent so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    /// Returns the most recent `(target, text)` pair.
    pub fn last(&self) -> Option<(String, String)> {
        self.sent.lock().last().cloned()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn nickname(&self) -> String {
        self.nickname.clone()
    }

    fn is_joined(&self, destination: &str) -> bool {
        self.channels.contains(&irc_to_lower(destination))
    }

    async fn send_privmsg(&self, target: &str, text: &str) -> TransportResult<()> {
        if self.fail_sends {
            return Err(TransportError::ConnectionClosed {
                reason: "recording connection set to fail".into(),
            });
        }
        self.sent.lock().push((target.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_lines_in_order() {
        let conn = RecordingConnection::new("TestBot", ["#Test"]);
        conn.send_privmsg("#test", "one").await.unwrap();
        conn.send_privmsg("#test", "two").await.unwrap();

        assert!(conn.is_joined("#TEST"));
        assert_eq!(conn.sent().len(), 2);
        assert_eq!(conn.last(), Some(("#test".into(), "two".into())));

        conn.clear();
        assert!(conn.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failing_connection() {
        let conn = RecordingConnection::new("TestBot", ["#test"]).failing();
        assert!(conn.send_privmsg("#test", "x").await.is_err());
        assert!(conn.sent().is_empty());
    }
}
