//! IRC client.
//!
//! [`IrcClient::connect`] dials the server, registers, and spawns a task that
//! owns the socket for the rest of the process:
//!
//! ```text
//!                        ┌──────────────────────────┐
//!  IrcHandle ──Outbound─▶│                          │──lines──▶ server
//!  (Connection)          │     run_client_loop      │
//!  InboundMessage ◀──────│  (reconnects on failure) │◀─lines─── server
//!                        └──────────────────────────┘
//! ```
//!
//! The task answers `PING`, joins the configured channels after the welcome
//! numeric, tracks which channels the bot is in and what its nick is, and
//! forwards channel `PRIVMSG`s. Private messages are dropped.
//!
//! With [`IrcConfig::tls`] set, the TCP stream is wrapped in TLS before
//! registration, verified against the platform's root certificates.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Framed};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use bavi_core::{
    Connection, InboundMessage, Source, TransportError, TransportResult, irc_eq, irc_to_lower,
};

use crate::config::IrcConfig;
use crate::line::{IrcLine, is_channel};

/// Longest line accepted from the server.
const MAX_LINE_LENGTH: usize = 8192;

const CHANNEL_BUFFER: usize = 256;

/// A byte stream the client can speak IRC over: plain TCP or TLS.
trait IrcStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> IrcStream for T {}

type IrcFramed = Framed<Box<dyn IrcStream>, AnyDelimiterCodec>;

// =============================================================================
// Shared state and handle
// =============================================================================

#[derive(Debug)]
struct Shared {
    nickname: RwLock<String>,
    /// Joined channels, case-mapped.
    channels: RwLock<HashSet<String>>,
}

impl Shared {
    fn new(nickname: &str) -> Self {
        Self {
            nickname: RwLock::new(nickname.to_string()),
            channels: RwLock::new(HashSet::new()),
        }
    }

    fn nickname(&self) -> String {
        self.nickname.read().clone()
    }

    fn set_nickname(&self, nickname: &str) {
        *self.nickname.write() = nickname.to_string();
    }
}

enum Outbound {
    Line(String),
    Quit(String),
}

/// Cloneable sending side of an [`IrcClient`].
#[derive(Clone)]
pub struct IrcHandle {
    shared: Arc<Shared>,
    outbound: mpsc::Sender<Outbound>,
}

impl IrcHandle {
    async fn enqueue(&self, outbound: Outbound) -> TransportResult<()> {
        self.outbound
            .send(outbound)
            .await
            .map_err(|_| TransportError::ConnectionClosed {
                reason: "IRC client task has stopped".into(),
            })
    }
}

impl std::fmt::Debug for IrcHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrcHandle")
            .field("nickname", &self.shared.nickname())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for IrcHandle {
    fn nickname(&self) -> String {
        self.shared.nickname()
    }

    fn is_joined(&self, destination: &str) -> bool {
        self.shared
            .channels
            .read()
            .contains(&irc_to_lower(destination))
    }

    async fn send_privmsg(&self, target: &str, text: &str) -> TransportResult<()> {
        let line = IrcLine::new("PRIVMSG", [target, text]).to_string();
        self.enqueue(Outbound::Line(line)).await
    }

    async fn quit(&self, reason: &str) -> TransportResult<()> {
        self.enqueue(Outbound::Quit(reason.to_string())).await
    }
}

// =============================================================================
// Client
// =============================================================================

/// A connected IRC client.
pub struct IrcClient {
    handle: IrcHandle,
    inbound: mpsc::Receiver<InboundMessage>,
    task: JoinHandle<()>,
}

impl IrcClient {
    /// Connects, registers, and starts the client task.
    ///
    /// Fails if the first connection attempt fails; later disconnects are
    /// handled by the task according to `config.reconnect`. Cancelling
    /// `shutdown` stops the task.
    pub async fn connect(config: IrcConfig, shutdown: CancellationToken) -> TransportResult<Self> {
        let session = Session::new(config);
        let framed = dial(&session).await?;

        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_BUFFER);
        let handle = IrcHandle {
            shared: Arc::clone(&session.shared),
            outbound: outbound_tx,
        };

        let task = tokio::spawn(run_client_loop(
            framed,
            session,
            outbound_rx,
            inbound_tx,
            shutdown,
        ));

        Ok(Self {
            handle,
            inbound: inbound_rx,
            task,
        })
    }

    /// A handle for sending.
    pub fn handle(&self) -> IrcHandle {
        self.handle.clone()
    }

    /// Splits into the sending handle, the inbound message stream, and the
    /// client task.
    pub fn into_parts(self) -> (IrcHandle, mpsc::Receiver<InboundMessage>, JoinHandle<()>) {
        (self.handle, self.inbound, self.task)
    }
}

impl std::fmt::Debug for IrcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrcClient")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Protocol state
// =============================================================================

#[derive(Debug, PartialEq)]
enum Reaction {
    Nothing,
    Send(Vec<IrcLine>),
    Deliver(InboundMessage),
}

/// Per-connection protocol handling, independent of the socket.
struct Session {
    config: IrcConfig,
    shared: Arc<Shared>,
}

impl Session {
    fn new(config: IrcConfig) -> Self {
        let shared = Arc::new(Shared::new(&config.nickname));
        Self { config, shared }
    }

    /// Lines that register a fresh connection. Resets nick and channels.
    fn registration(&self) -> Vec<IrcLine> {
        self.shared.set_nickname(&self.config.nickname);
        self.shared.channels.write().clear();

        let mut lines = Vec::with_capacity(3);
        if let Some(password) = &self.config.password {
            lines.push(IrcLine::new("PASS", [password.as_str()]));
        }
        lines.push(IrcLine::new("NICK", [self.config.nickname.as_str()]));
        lines.push(IrcLine::new(
            "USER",
            [
                self.config.username.as_str(),
                "0",
                "*",
                self.config.realname.as_str(),
            ],
        ));
        lines
    }

    fn is_own(&self, nick: Option<&str>) -> bool {
        let own = self.shared.nickname();
        nick.is_some_and(|n| irc_eq(n, &own))
    }

    fn handle(&self, line: &IrcLine) -> Reaction {
        match line.command.as_str() {
            "PING" => Reaction::Send(vec![IrcLine::new("PONG", line.params.last().cloned())]),
            "001" => {
                if let Some(nick) = line.param(0) {
                    self.shared.set_nickname(nick);
                }
                info!(nickname = %self.shared.nickname(), "Registered with server");
                Reaction::Send(
                    self.config
                        .channels
                        .iter()
                        .map(|channel| IrcLine::new("JOIN", [channel.as_str()]))
                        .collect(),
                )
            }
            "433" => {
                let nick = format!("{}_", self.shared.nickname());
                warn!(nickname = %nick, "Nickname in use, retrying");
                self.shared.set_nickname(&nick);
                Reaction::Send(vec![IrcLine::new("NICK", [nick])])
            }
            "JOIN" if self.is_own(line.source_nick()) => {
                if let Some(channel) = line.param(0) {
                    info!(channel, "Joined channel");
                    self.shared.channels.write().insert(irc_to_lower(channel));
                }
                Reaction::Nothing
            }
            "PART" if self.is_own(line.source_nick()) => {
                if let Some(channel) = line.param(0) {
                    info!(channel, "Left channel");
                    self.shared.channels.write().remove(&irc_to_lower(channel));
                }
                Reaction::Nothing
            }
            "KICK" if self.is_own(line.param(1)) => {
                if let Some(channel) = line.param(0) {
                    warn!(channel, by = line.source_nick().unwrap_or("?"), "Kicked from channel");
                    self.shared.channels.write().remove(&irc_to_lower(channel));
                }
                Reaction::Nothing
            }
            "NICK" if self.is_own(line.source_nick()) => {
                if let Some(nick) = line.param(0) {
                    info!(nickname = nick, "Nickname changed");
                    self.shared.set_nickname(nick);
                }
                Reaction::Nothing
            }
            "PRIVMSG" => self.privmsg(line),
            "ERROR" => {
                warn!(reason = line.param(0).unwrap_or(""), "Server sent ERROR");
                Reaction::Nothing
            }
            _ => Reaction::Nothing,
        }
    }

    fn privmsg(&self, line: &IrcLine) -> Reaction {
        let (Some(prefix), Some(target), Some(text)) =
            (line.prefix.as_deref(), line.param(0), line.param(1))
        else {
            return Reaction::Nothing;
        };

        if !is_channel(target) {
            debug!(from = prefix, "Ignoring private message");
            return Reaction::Nothing;
        }

        Reaction::Deliver(InboundMessage::new(Source::parse(prefix), target, text))
    }
}

// =============================================================================
// Socket loop
// =============================================================================

enum SessionEnd {
    Shutdown,
    Quit,
    Disconnected(String),
}

fn codec_error(addr: &str, err: AnyDelimiterCodecError) -> TransportError {
    match err {
        AnyDelimiterCodecError::Io(e) => e.into(),
        AnyDelimiterCodecError::MaxChunkLengthExceeded => TransportError::ConnectionClosed {
            reason: format!("{addr} sent a line longer than {MAX_LINE_LENGTH} bytes"),
        },
    }
}

/// Opens a connection and sends the registration lines.
async fn dial(session: &Session) -> TransportResult<IrcFramed> {
    let addr = session.config.address();
    info!(addr = %addr, "Connecting to IRC server");

    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| TransportError::ConnectionFailed {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

    let stream: Box<dyn IrcStream> = if session.config.tls {
        let tls = upgrade_to_tls(stream, &session.config.host)
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                addr: addr.clone(),
                reason: format!("TLS handshake failed: {e}"),
            })?;
        Box::new(tls)
    } else {
        Box::new(stream)
    };

    let codec = AnyDelimiterCodec::new_with_max_length(
        b"\n".to_vec(),
        b"\r\n".to_vec(),
        MAX_LINE_LENGTH,
    );
    let mut framed = Framed::new(stream, codec);

    for line in session.registration() {
        framed
            .send(line.to_string())
            .await
            .map_err(|e| codec_error(&addr, e))?;
    }

    info!(addr = %addr, "Connected to IRC server");
    Ok(framed)
}

/// Performs the client side of a TLS handshake over `stream`.
async fn upgrade_to_tls(
    stream: TcpStream,
    host: &str,
) -> Result<TlsStream<TcpStream>, Box<dyn std::error::Error + Send + Sync>> {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!(error = %err, "Failed to load a native root certificate");
    }
    for cert in native.certs {
        if let Err(e) = roots.add(cert) {
            warn!(error = %e, "Skipping invalid native root certificate");
        }
    }

    // Explicit provider; other crates in the binary may enable a second one.
    let provider = Arc::new(tokio_rustls::rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_string())?;
    debug!(host, "Starting TLS handshake");
    Ok(connector.connect(server_name, stream).await?)
}

/// Runs sessions until shutdown, quit, or reconnection gives up.
async fn run_client_loop(
    mut framed: IrcFramed,
    session: Session,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    shutdown: CancellationToken,
) {
    loop {
        let end = run_session(
            &mut framed,
            &session,
            &mut outbound_rx,
            &inbound_tx,
            &shutdown,
        )
        .await;
        session.shared.channels.write().clear();

        match end {
            SessionEnd::Shutdown => {
                info!("IRC client shutting down");
                break;
            }
            SessionEnd::Quit => {
                info!("Quit IRC server");
                break;
            }
            SessionEnd::Disconnected(reason) => {
                warn!(reason = %reason, "Disconnected from IRC server");
                if !session.config.reconnect.auto_reconnect {
                    break;
                }
                match reconnect(&session, &shutdown).await {
                    Some(new_framed) => framed = new_framed,
                    None => break,
                }
            }
        }
    }
}

async fn run_session(
    framed: &mut IrcFramed,
    session: &Session,
    outbound_rx: &mut mpsc::Receiver<Outbound>,
    inbound_tx: &mpsc::Sender<InboundMessage>,
    shutdown: &CancellationToken,
) -> SessionEnd {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let quit = IrcLine::new("QUIT", [session.config.quit_message.as_str()]);
                let _ = framed.send(quit.to_string()).await;
                return SessionEnd::Shutdown;
            }

            outbound = outbound_rx.recv() => match outbound {
                Some(Outbound::Line(line)) => {
                    trace!(line = %line, "Sending line");
                    if let Err(e) = framed.send(line).await {
                        return SessionEnd::Disconnected(e.to_string());
                    }
                }
                Some(Outbound::Quit(reason)) => {
                    let _ = framed.send(IrcLine::new("QUIT", [reason]).to_string()).await;
                    return SessionEnd::Quit;
                }
                None => return SessionEnd::Quit,
            },

            frame = framed.next() => {
                let bytes = match frame {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(e)) => return SessionEnd::Disconnected(e.to_string()),
                    None => return SessionEnd::Disconnected("connection closed by server".into()),
                };

                let text = String::from_utf8_lossy(&bytes);
                let Some(line) = IrcLine::parse(&text) else {
                    continue;
                };
                trace!(line = %text.trim_end(), "Received line");

                match session.handle(&line) {
                    Reaction::Nothing => {}
                    Reaction::Send(lines) => {
                        for line in lines {
                            if let Err(e) = framed.send(line.to_string()).await {
                                return SessionEnd::Disconnected(e.to_string());
                            }
                        }
                    }
                    Reaction::Deliver(message) => {
                        if inbound_tx.send(message).await.is_err() {
                            debug!("Inbound receiver dropped");
                            return SessionEnd::Shutdown;
                        }
                    }
                }
            }
        }
    }
}

/// Redials with exponential backoff. Returns `None` when giving up.
async fn reconnect(session: &Session, shutdown: &CancellationToken) -> Option<IrcFramed> {
    let policy = &session.config.reconnect;
    let mut delay = policy.initial_delay;
    let mut attempts = 0u32;

    loop {
        if policy.max_retries.is_some_and(|max| attempts >= max) {
            error!(attempts, "Max reconnection attempts reached, giving up");
            return None;
        }

        warn!(delay = ?delay, "Reconnecting...");
        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        match dial(session).await {
            Ok(framed) => {
                info!("Reconnected successfully");
                return Some(framed);
            }
            Err(e) => {
                warn!(error = %e, "Reconnection failed");
                attempts += 1;
                delay = policy.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use crate::config::ReconnectConfig;

    fn session() -> Session {
        Session::new(IrcConfig::new("localhost", 6667, "bavi").with_channels(["#Test", "#other"]))
    }

    fn line(raw: &str) -> IrcLine {
        IrcLine::parse(raw).unwrap()
    }

    #[test]
    fn test_registration_lines() {
        let session = Session::new(IrcConfig::new("h", 1, "bavi").with_password("pw"));
        let lines: Vec<String> = session.registration().iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["PASS pw", "NICK bavi", "USER bavi 0 * bavi"]);
    }

    #[test]
    fn test_ping() {
        assert_eq!(
            session().handle(&line("PING :irc.example.org")),
            Reaction::Send(vec![IrcLine::new("PONG", ["irc.example.org"])])
        );
    }

    #[test]
    fn test_welcome_joins_channels() {
        let session = session();
        let reaction = session.handle(&line(":srv 001 bavi_ :Welcome"));
        assert_eq!(
            reaction,
            Reaction::Send(vec![
                IrcLine::new("JOIN", ["#Test"]),
                IrcLine::new("JOIN", ["#other"]),
            ])
        );
        assert_eq!(session.shared.nickname(), "bavi_");
    }

    #[test]
    fn test_nick_in_use_appends_underscore() {
        let session = session();
        assert_eq!(
            session.handle(&line(":srv 433 * bavi :Nickname is already in use")),
            Reaction::Send(vec![IrcLine::new("NICK", ["bavi_"])])
        );
        assert_eq!(session.shared.nickname(), "bavi_");
    }

    #[test]
    fn test_membership_tracking() {
        let session = session();
        let joined = |c: &str| session.shared.channels.read().contains(&irc_to_lower(c));

        session.handle(&line(":someone!u@h JOIN #test"));
        assert!(!joined("#test"));

        session.handle(&line(":Bavi!u@h JOIN #Test"));
        assert!(joined("#test"));
        session.handle(&line(":bavi!u@h JOIN :#other"));
        assert!(joined("#OTHER"));

        session.handle(&line(":bavi!u@h PART #test :bye"));
        assert!(!joined("#test"));

        session.handle(&line(":op!u@h KICK #other bavi :out"));
        assert!(!joined("#other"));
    }

    #[test]
    fn test_own_nick_change() {
        let session = session();
        session.handle(&line(":bavi!u@h NICK :bavi2"));
        assert_eq!(session.shared.nickname(), "bavi2");
        session.handle(&line(":other!u@h NICK :bavi3"));
        assert_eq!(session.shared.nickname(), "bavi2");
    }

    #[test]
    fn test_privmsg_routing() {
        let session = session();
        assert_eq!(
            session.handle(&line(":alice!a@host PRIVMSG #test :.choose a, b")),
            Reaction::Deliver(InboundMessage::new(
                Source::parse("alice!a@host"),
                "#test",
                ".choose a, b"
            ))
        );
        assert_eq!(
            session.handle(&line(":alice!a@host PRIVMSG bavi :psst")),
            Reaction::Nothing
        );
    }

    struct FakeServer {
        lines: tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
        writer: tokio::net::tcp::OwnedWriteHalf,
    }

    impl FakeServer {
        async fn expect(&mut self, expected: &str) {
            let got = timeout(Duration::from_secs(5), self.lines.next_line())
                .await
                .expect("timed out waiting for a line")
                .unwrap()
                .expect("client closed the connection");
            assert_eq!(got.trim_end_matches('\r'), expected);
        }

        async fn write(&mut self, raw: &str) {
            self.writer.write_all(raw.as_bytes()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_client_session_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = IrcConfig::new("127.0.0.1", port, "TestBot")
            .with_channels(["#test"])
            .with_reconnect(ReconnectConfig::disabled());

        let (client, accepted) = tokio::join!(
            IrcClient::connect(config, CancellationToken::new()),
            listener.accept()
        );
        let (handle, mut inbound, task) = client.unwrap().into_parts();
        let (reader, writer) = accepted.unwrap().0.into_split();
        let mut server = FakeServer {
            lines: BufReader::new(reader).lines(),
            writer,
        };

        server.expect("NICK TestBot").await;
        server.expect("USER TestBot 0 * TestBot").await;

        server.write(":srv 001 TestBot :Welcome\r\n").await;
        server.expect("JOIN #test").await;

        server
            .write(concat!(
                ":TestBot!u@h JOIN #test\r\n",
                ":alice!a@h PRIVMSG TestBot :secret\r\n",
                ":alice!a@h PRIVMSG #test :hello bot\n",
                "PING :srv\r\n",
            ))
            .await;

        let message = timeout(Duration::from_secs(5), inbound.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.source.nick, "alice");
        assert_eq!(message.destination, "#test");
        assert_eq!(message.text, "hello bot");
        assert!(handle.is_joined("#TEST"));
        assert!(!handle.is_joined("#elsewhere"));

        server.expect("PONG srv").await;

        handle.send_privmsg("#test", "hi there").await.unwrap();
        server.expect("PRIVMSG #test :hi there").await;

        handle.quit("bye now").await.unwrap();
        server.expect("QUIT :bye now").await;

        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(inbound.recv().await.is_none());
        assert!(handle.send_privmsg("#test", "late").await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_sends_quit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = IrcConfig::new("127.0.0.1", port, "TestBot").with_quit_message("later");
        let shutdown = CancellationToken::new();

        let (client, accepted) = tokio::join!(
            IrcClient::connect(config, shutdown.clone()),
            listener.accept()
        );
        let (_handle, _inbound, task) = client.unwrap().into_parts();
        let (reader, writer) = accepted.unwrap().0.into_split();
        let mut server = FakeServer {
            lines: BufReader::new(reader).lines(),
            writer,
        };
        server.expect("NICK TestBot").await;
        server.expect("USER TestBot 0 * TestBot").await;

        shutdown.cancel();
        server.expect("QUIT later").await;
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = IrcClient::connect(IrcConfig::new("127.0.0.1", port, "x"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_tls_dial_starts_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = IrcConfig::new("127.0.0.1", port, "TestBot")
            .with_tls(true)
            .with_reconnect(ReconnectConfig::disabled());

        let server = async {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut first = [0u8; 1];
            timeout(Duration::from_secs(5), socket.read_exact(&mut first))
                .await
                .unwrap()
                .unwrap();
            // Hang up instead of answering the ClientHello.
            first[0]
        };

        let (client, record_type) = tokio::join!(
            IrcClient::connect(config, CancellationToken::new()),
            server
        );
        // 0x16 opens a TLS handshake record; a plain session would send `N` of NICK.
        assert_eq!(record_type, 0x16);
        let err = client.map(|_| ()).unwrap_err();
        assert!(
            matches!(&err, TransportError::ConnectionFailed { reason, .. } if reason.starts_with("TLS handshake failed")),
            "unexpected error: {err}"
        );
    }
}
