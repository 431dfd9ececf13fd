use async_trait::async_trait;

use crate::{domain::IncomingMessage, Result};

/// Capabilities of a chat transport.
#[derive(Clone, Copy, Debug)]
pub struct ChatCapabilities {
    /// Hard per-message ceiling enforced by the platform, in characters.
    pub max_message_len: usize,
}

/// Outbound side of the chat transport.
///
/// The router and handlers only ever talk to chat through this trait.
#[async_trait]
pub trait ChatPort: Send + Sync {
    fn capabilities(&self) -> ChatCapabilities;

    async fn send(&self, channel: &str, text: &str) -> Result<()>;

    async fn reply(&self, to: &IncomingMessage, text: &str) -> Result<()>;
}
