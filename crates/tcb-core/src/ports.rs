//! Hexagonal ports for the external services handlers call into.
//!
//! Chat itself lives in [`crate::messaging`]; these are the request/response
//! collaborators (LLM, weather, music) implemented by adapter crates.

use async_trait::async_trait;

use crate::Result;

// ============== LLM completion ==============

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// Run a chat completion and return the assistant's text.
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String>;
}

// ============== Weather ==============

/// Current conditions for a location, already resolved by the provider.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReport {
    pub location_name: String,
    pub region: String,
    pub local_time: String,
    pub temp_f: f64,
    pub temp_c: f64,
    pub condition: String,
    pub humidity: u32,
    pub last_updated: String,
}

#[async_trait]
pub trait WeatherPort: Send + Sync {
    async fn current(&self, location: &str) -> Result<WeatherReport>;
}

// ============== Music ==============

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    /// Public web link.
    pub url: String,
    /// `spotify:track:<id>` style URI.
    pub uri: String,
    pub artwork_url: Option<String>,
}

impl Track {
    pub fn artists_joined(&self, sep: &str) -> String {
        self.artists.join(sep)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStart {
    Started,
    /// The configured playback device is not available.
    NoDevice,
}

#[async_trait]
pub trait MusicPort: Send + Sync {
    /// Currently playing track, `None` when nothing is playing.
    async fn now_playing(&self) -> Result<Option<Track>>;

    /// Upcoming tracks, in play order.
    async fn queue(&self) -> Result<Vec<Track>>;

    async fn add_to_queue(&self, uri: &str) -> Result<()>;

    /// Start playing `uri` on the configured device.
    async fn start_playback(&self, uri: &str) -> Result<PlaybackStart>;
}
