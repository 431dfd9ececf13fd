//! Connection loop: login, join, read lines, forward chat, write queued replies.

use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

use tcb_core::domain::IncomingMessage;

use crate::{chat::OutboundLines, irc::IrcMessage};

pub const TWITCH_IRC_HOST: &str = "irc.chat.twitch.tv";
pub const TWITCH_IRC_PORT: u16 = 6667;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct TwitchLogin {
    pub nick: String,
    pub token: String,
    pub channels: Vec<String>,
}

impl TwitchLogin {
    /// Registration lines sent right after connecting.
    pub fn handshake(&self) -> Vec<String> {
        let token = self.token.trim_start_matches("oauth:");
        let mut lines = vec![
            "CAP REQ :twitch.tv/membership twitch.tv/tags twitch.tv/commands\r\n".to_string(),
            format!("PASS oauth:{token}\r\n"),
            format!("NICK {}\r\n", self.nick.to_lowercase()),
        ];
        for channel in &self.channels {
            lines.push(format!("JOIN #{}\r\n", channel.trim_start_matches('#')));
        }
        lines
    }
}

/// Why a single session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Cancelled,
    /// Server closed or asked us to reconnect.
    Closed { authenticated: bool },
}

/// Capped exponential reconnect delay.
#[derive(Debug)]
struct Backoff {
    next: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            next: INITIAL_BACKOFF,
        }
    }

    /// Delay before the next attempt. A session that got past login starts the
    /// sequence over.
    fn delay(&mut self, authenticated: bool) -> Duration {
        if authenticated {
            self.next = INITIAL_BACKOFF;
        }
        let delay = self.next;
        self.next = (self.next * 2).min(MAX_BACKOFF);
        delay
    }
}

pub struct TwitchConnection {
    login: TwitchLogin,
    outbound: OutboundLines,
    /// A line whose write failed; sent first on the next session.
    pending: Option<String>,
}

impl TwitchConnection {
    pub fn new(login: TwitchLogin, outbound: OutboundLines) -> Self {
        Self {
            login,
            outbound,
            pending: None,
        }
    }

    /// Run until `cancel` fires, reconnecting with capped exponential backoff.
    ///
    /// Chat messages are forwarded to `inbound`; the router consumes them on
    /// its own task. Returns an error once that receiver is gone.
    pub async fn run(
        mut self,
        inbound: mpsc::UnboundedSender<IncomingMessage>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut backoff = Backoff::new();

        loop {
            let authenticated = match self.session(&inbound, &cancel).await {
                Ok(SessionEnd::Cancelled) => return Ok(()),
                Ok(SessionEnd::Closed { authenticated }) => {
                    tracing::warn!("twitch connection closed; reconnecting");
                    authenticated
                }
                Err(e) => {
                    tracing::error!("twitch connection failed: {e:#}");
                    false
                }
            };
            if inbound.is_closed() {
                return Err(anyhow!("router stopped; closing twitch connection"));
            }

            let delay = backoff.delay(authenticated);
            tracing::info!("reconnecting to twitch in {}s", delay.as_secs());
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = sleep(delay) => {}
            }
        }
    }

    async fn session(
        &mut self,
        inbound: &mpsc::UnboundedSender<IncomingMessage>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<SessionEnd> {
        let addr = format!("{TWITCH_IRC_HOST}:{TWITCH_IRC_PORT}");
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|_| anyhow!("timed out connecting to {addr}"))?
            .with_context(|| format!("connecting to {addr}"))?;
        let (reader, mut writer) = stream.into_split();

        for line in self.login.handshake() {
            writer.write_all(line.as_bytes()).await?;
        }
        writer.flush().await?;
        tracing::info!(
            nick = %self.login.nick,
            channels = ?self.login.channels,
            "connected to twitch chat"
        );

        self.pump(BufReader::new(reader), writer, inbound, cancel).await
    }

    /// Read server lines and write queued lines until the session ends.
    async fn pump<R, W>(
        &mut self,
        reader: R,
        mut writer: W,
        inbound: &mpsc::UnboundedSender<IncomingMessage>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut authenticated = false;

        if let Some(line) = self.pending.take() {
            self.write_queued(&mut writer, line).await?;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = writer.shutdown().await;
                    return Ok(SessionEnd::Cancelled);
                }
                Some(out) = self.outbound.recv() => {
                    self.write_queued(&mut writer, out).await?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(SessionEnd::Closed { authenticated });
                    };
                    let Some(msg) = IrcMessage::parse(&line) else {
                        continue;
                    };

                    match msg.command {
                        "PING" => {
                            let target = msg.trailing.unwrap_or("tmi.twitch.tv");
                            write_line(&mut writer, &format!("PONG :{target}\r\n")).await?;
                        }
                        "001" => {
                            authenticated = true;
                            tracing::info!("twitch login accepted");
                        }
                        "RECONNECT" => {
                            tracing::info!("twitch requested a reconnect");
                            return Ok(SessionEnd::Closed { authenticated });
                        }
                        "NOTICE" => {
                            let text = msg.trailing.unwrap_or_default();
                            if text.contains("Login authentication failed")
                                || text.contains("Improperly formatted auth")
                            {
                                return Err(anyhow!("twitch login rejected: {text}"));
                            }
                            tracing::info!("twitch notice: {text}");
                        }
                        "PRIVMSG" => {
                            let Some(incoming) = msg.to_incoming(&self.login.nick) else {
                                continue;
                            };
                            if inbound.send(incoming).is_err() {
                                return Err(anyhow!("router is no longer receiving chat"));
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Write one queued line, keeping it for the next session if the write fails.
    async fn write_queued<W>(&mut self, writer: &mut W, line: String) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if let Err(e) = write_line(writer, &line).await {
            self.pending = Some(line);
            return Err(e).context("writing queued chat line");
        }
        Ok(())
    }
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::{
        io::{duplex, split, DuplexStream, Lines, ReadHalf, WriteHalf},
        task::JoinHandle,
        time::Instant,
    };

    use tcb_core::messaging::{
        port::ChatPort,
        throttled::{ThrottleConfig, ThrottledChat},
    };

    use super::*;
    use crate::chat::TwitchChat;

    type ServerLines = Lines<BufReader<ReadHalf<DuplexStream>>>;
    type Session = JoinHandle<(TwitchConnection, anyhow::Result<SessionEnd>)>;

    fn login() -> TwitchLogin {
        TwitchLogin {
            nick: "gusbot".to_string(),
            token: "oauth:secret".to_string(),
            channels: vec!["streamer".to_string()],
        }
    }

    /// Fake Twitch server end: lines the bot wrote, and a writer for server lines.
    struct Server {
        lines: ServerLines,
        tx: WriteHalf<DuplexStream>,
    }

    impl Server {
        async fn say(&mut self, line: &str) {
            self.tx.write_all(line.as_bytes()).await.unwrap();
        }

        async fn next(&mut self) -> String {
            self.lines.next_line().await.unwrap().unwrap()
        }
    }

    fn start(
        mut conn: TwitchConnection,
        inbound: mpsc::UnboundedSender<IncomingMessage>,
        cancel: CancellationToken,
    ) -> (Session, Server) {
        let (bot_side, server_side) = duplex(4096);
        let (bot_rx, bot_tx) = split(bot_side);
        let (server_rx, server_tx) = split(server_side);
        let session = tokio::spawn(async move {
            let end = conn
                .pump(BufReader::new(bot_rx), bot_tx, &inbound, &cancel)
                .await;
            (conn, end)
        });
        let server = Server {
            lines: BufReader::new(server_rx).lines(),
            tx: server_tx,
        };
        (session, server)
    }

    #[tokio::test]
    async fn answers_ping_and_writes_queued_lines() {
        let (chat, outbound) = TwitchChat::new();
        let (inbound, _inbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let (session, mut server) =
            start(TwitchConnection::new(login(), outbound), inbound, cancel.clone());

        server.say("PING :tmi.twitch.tv\r\n").await;
        assert_eq!(server.next().await, "PONG :tmi.twitch.tv");

        chat.send("streamer", "hello chat").await.unwrap();
        assert_eq!(server.next().await, "PRIVMSG #streamer :hello chat");

        cancel.cancel();
        let (_, end) = session.await.unwrap();
        assert_eq!(end.unwrap(), SessionEnd::Cancelled);
    }

    #[tokio::test]
    async fn forwards_chat_and_ends_on_reconnect() {
        let (_chat, outbound) = TwitchChat::new();
        let (inbound, mut inbound_rx) = mpsc::unbounded_channel();
        let (session, mut server) = start(
            TwitchConnection::new(login(), outbound),
            inbound,
            CancellationToken::new(),
        );

        server.say(":tmi.twitch.tv 001 gusbot :Welcome, GLHF!\r\n").await;
        server
            .say(
                "@display-name=Viewer;id=abc-1 \
                 :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #streamer :!lurk\r\n",
            )
            .await;
        server.say(":tmi.twitch.tv RECONNECT\r\n").await;

        let (_, end) = session.await.unwrap();
        assert_eq!(end.unwrap(), SessionEnd::Closed { authenticated: true });

        let msg = inbound_rx.try_recv().unwrap();
        assert_eq!(msg.text, "!lurk");
        assert_eq!(msg.channel, "streamer");
        assert_eq!(msg.id.as_deref(), Some("abc-1"));
    }

    #[tokio::test]
    async fn rejected_login_is_an_error() {
        let (_chat, outbound) = TwitchChat::new();
        let (inbound, _inbound_rx) = mpsc::unbounded_channel();
        let (session, mut server) = start(
            TwitchConnection::new(login(), outbound),
            inbound,
            CancellationToken::new(),
        );

        server
            .say(":tmi.twitch.tv NOTICE * :Login authentication failed\r\n")
            .await;

        let (_, end) = session.await.unwrap();
        assert!(end.unwrap_err().to_string().contains("login rejected"));
    }

    #[tokio::test]
    async fn server_hangup_before_welcome_is_unauthenticated() {
        let (_chat, outbound) = TwitchChat::new();
        let (inbound, _inbound_rx) = mpsc::unbounded_channel();
        let (session, server) = start(
            TwitchConnection::new(login(), outbound),
            inbound,
            CancellationToken::new(),
        );

        drop(server);

        let (_, end) = session.await.unwrap();
        assert_eq!(end.unwrap(), SessionEnd::Closed { authenticated: false });
    }

    #[tokio::test]
    async fn failed_write_is_retried_on_the_next_session() {
        let (chat, outbound) = TwitchChat::new();
        let (inbound, _inbound_rx) = mpsc::unbounded_channel();
        let mut conn = TwitchConnection::new(login(), outbound);

        // Reads stay open; the write side has no peer.
        let (bot_rx, _server_writer) = duplex(64);
        let (bot_tx, server_reader) = duplex(64);
        drop(server_reader);

        chat.send("streamer", "first try").await.unwrap();
        let end = conn
            .pump(BufReader::new(bot_rx), bot_tx, &inbound, &CancellationToken::new())
            .await;
        assert!(end.is_err());
        assert_eq!(
            conn.pending.as_deref(),
            Some("PRIVMSG #streamer :first try\r\n")
        );

        let cancel = CancellationToken::new();
        let (session, mut server) = start(conn, inbound, cancel.clone());
        assert_eq!(server.next().await, "PRIVMSG #streamer :first try");

        cancel.cancel();
        let (conn, _) = session.await.unwrap();
        assert!(conn.pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_replies_reach_the_socket_spaced_out() {
        let (twitch, outbound) = TwitchChat::new();
        let config = ThrottleConfig::default();
        let chat = ThrottledChat::new(Arc::new(twitch), config);
        let (inbound, _inbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let (session, mut server) =
            start(TwitchConnection::new(login(), outbound), inbound, cancel.clone());

        // A handler sending a burst, on its own task like the router.
        let burst = tokio::spawn(async move {
            for text in ["one", "two", "three"] {
                chat.send("streamer", text).await.unwrap();
            }
        });
        server.say("PING :tmi.twitch.tv\r\n").await;

        let t0 = Instant::now();
        let mut privmsg_times = Vec::new();
        let mut pong_at = None;
        while privmsg_times.len() < 3 {
            let line = server.next().await;
            if line.starts_with("PONG") {
                pong_at = Some(t0.elapsed());
            } else {
                privmsg_times.push(t0.elapsed());
            }
        }
        burst.await.unwrap();

        assert!(pong_at.unwrap() < config.global_min_interval);
        for pair in privmsg_times.windows(2) {
            assert!(pair[1] - pair[0] >= config.global_min_interval);
        }

        cancel.cancel();
        session.await.unwrap();
    }

    #[test]
    fn backoff_doubles_to_the_cap_and_resets_after_login() {
        let mut backoff = Backoff::new();
        let delays: Vec<u64> = (0..8).map(|_| backoff.delay(false).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60]);

        assert_eq!(backoff.delay(true), Duration::from_secs(1));
        assert_eq!(backoff.delay(false), Duration::from_secs(2));
    }

    #[test]
    fn handshake_requests_caps_then_logs_in_and_joins() {
        let login = TwitchLogin {
            nick: "GusBot".to_string(),
            token: "oauth:secret".to_string(),
            channels: vec!["streamer".to_string(), "#other".to_string()],
        };
        assert_eq!(
            login.handshake(),
            vec![
                "CAP REQ :twitch.tv/membership twitch.tv/tags twitch.tv/commands\r\n",
                "PASS oauth:secret\r\n",
                "NICK gusbot\r\n",
                "JOIN #streamer\r\n",
                "JOIN #other\r\n",
            ]
        );
    }
}
