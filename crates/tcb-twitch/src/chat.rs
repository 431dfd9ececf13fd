use async_trait::async_trait;
use tokio::sync::mpsc;

use tcb_core::{
    domain::IncomingMessage,
    errors::Error,
    messaging::port::{ChatCapabilities, ChatPort},
    Result,
};

use crate::irc::privmsg;

/// Twitch rejects messages longer than this.
pub const TWITCH_MESSAGE_LIMIT: usize = 500;

/// Raw IRC lines waiting to be written by the connection loop.
pub type OutboundLines = mpsc::UnboundedReceiver<String>;

/// `ChatPort` over the Twitch IRC connection.
///
/// Sends are queued and written by [`crate::connection::TwitchConnection`].
/// Lines still queued during a reconnect, plus one whose write failed, go out
/// on the next session.
#[derive(Clone)]
pub struct TwitchChat {
    tx: mpsc::UnboundedSender<String>,
}

impl TwitchChat {
    pub fn new() -> (Self, OutboundLines) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, line: String) -> Result<()> {
        self.tx
            .send(line)
            .map_err(|_| Error::External("twitch connection is closed".to_string()))
    }
}

#[async_trait]
impl ChatPort for TwitchChat {
    fn capabilities(&self) -> ChatCapabilities {
        ChatCapabilities {
            max_message_len: TWITCH_MESSAGE_LIMIT,
        }
    }

    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        self.push(privmsg(channel, text, None))
    }

    async fn reply(&self, to: &IncomingMessage, text: &str) -> Result<()> {
        self.push(privmsg(&to.channel, text, to.id.as_deref()))
    }
}
