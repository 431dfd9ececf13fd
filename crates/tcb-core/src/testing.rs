//! Test doubles shared by the unit tests in this crate.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;

use crate::{
    config::Config,
    domain::{Author, IncomingMessage},
    messaging::port::{ChatCapabilities, ChatPort},
    ports::{ChatTurn, CompletionPort, MusicPort, PlaybackStart, Track, WeatherPort, WeatherReport},
    store::{CounterRecord, CounterStore},
    Error, Result,
};

/// Unique path under `/tmp` (not created).
pub fn tmp_path(prefix: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_nanos();
    let pid = std::process::id();
    PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}"))
}

/// Counter store seeded with zeroed counters in a fresh tmp dir.
pub fn tmp_store(prefix: &str) -> CounterStore {
    let dir = tmp_path(prefix);
    let store = CounterStore::new(dir.join("total_stats.json"), dir.join("overlay"));
    store.save(&CounterRecord::zeroed()).unwrap();
    store
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "TWITCH_TOKEN" => Some("oauth:test".to_string()),
        "TWITCH_NICK" => Some("gusbot".to_string()),
        "TWITCH_CHANNELS" => Some("streamer".to_string()),
        "DISCORD_INVITE_URL" => Some("https://discord.gg/example".to_string()),
        "TWITTER_URL" => Some("https://twitter.com/example".to_string()),
        "YOUTUBE_URL" => Some("https://youtube.com/@example".to_string()),
        "COMMANDS_URL" => Some("https://example.com/commands".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn message(login: &str, text: &str) -> IncomingMessage {
    let mut msg = IncomingMessage::new("streamer", Author::new(login), text);
    msg.id = Some("msg-1".to_string());
    msg
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Send { channel: String, text: String },
    Reply { to: String, text: String },
}

impl Sent {
    pub fn text(&self) -> &str {
        match self {
            Sent::Send { text, .. } | Sent::Reply { text, .. } => text,
        }
    }
}

/// Chat fake that records everything sent through it.
#[derive(Default)]
pub struct RecordingChat {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingChat {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.text().to_string())
            .collect()
    }
}

#[async_trait]
impl ChatPort for RecordingChat {
    fn capabilities(&self) -> ChatCapabilities {
        ChatCapabilities {
            max_message_len: 500,
        }
    }

    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Send {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn reply(&self, to: &IncomingMessage, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Reply {
            to: to.author.login.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// LLM fake returning a canned answer and recording prompts.
pub struct CannedCompletion {
    pub answer: Result<String>,
    pub prompts: Mutex<Vec<Vec<ChatTurn>>>,
}

impl CannedCompletion {
    pub fn ok(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: Err(Error::External("llm down".to_string())),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionPort for CannedCompletion {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String> {
        self.prompts.lock().unwrap().push(turns.to_vec());
        match &self.answer {
            Ok(s) => Ok(s.clone()),
            Err(e) => Err(Error::External(e.to_string())),
        }
    }
}

pub struct CannedWeather(pub Option<WeatherReport>);

#[async_trait]
impl WeatherPort for CannedWeather {
    async fn current(&self, _location: &str) -> Result<WeatherReport> {
        self.0
            .clone()
            .ok_or_else(|| Error::External("weather down".to_string()))
    }
}

pub fn track(id: &str, title: &str, artists: &[&str]) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
        artists: artists.iter().map(|a| a.to_string()).collect(),
        url: format!("https://open.spotify.com/track/{id}"),
        uri: format!("spotify:track:{id}"),
        artwork_url: None,
    }
}

/// Scriptable music fake.
#[derive(Default)]
pub struct FakeMusic {
    pub playing: Mutex<Option<Track>>,
    pub queued: Mutex<Vec<Track>>,
    pub queue_fails: bool,
    pub add_fails: bool,
    pub no_device: bool,
    pub start_fails: bool,
    pub added: Mutex<Vec<String>>,
    pub started: Mutex<Vec<String>>,
}

#[async_trait]
impl MusicPort for FakeMusic {
    async fn now_playing(&self) -> Result<Option<Track>> {
        Ok(self.playing.lock().unwrap().clone())
    }

    async fn queue(&self) -> Result<Vec<Track>> {
        if self.queue_fails {
            return Err(Error::External("queue unavailable".to_string()));
        }
        Ok(self.queued.lock().unwrap().clone())
    }

    async fn add_to_queue(&self, uri: &str) -> Result<()> {
        if self.add_fails {
            return Err(Error::External("add failed".to_string()));
        }
        self.added.lock().unwrap().push(uri.to_string());
        Ok(())
    }

    async fn start_playback(&self, uri: &str) -> Result<PlaybackStart> {
        if self.no_device {
            return Ok(PlaybackStart::NoDevice);
        }
        if self.start_fails {
            return Err(Error::External("start failed".to_string()));
        }
        self.started.lock().unwrap().push(uri.to_string());
        Ok(PlaybackStart::Started)
    }
}
