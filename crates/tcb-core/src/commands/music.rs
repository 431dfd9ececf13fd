use std::fmt;

use async_trait::async_trait;
use regex::Regex;

use crate::{
    ports::{MusicPort, PlaybackStart},
    router::{CommandContext, CommandHandler},
    Result,
};

/// Result of a song request. Codes are stable and shown to viewers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SongRequestStatus {
    Success,
    Failed,
    NotATrack,
    AlreadyQueued,
    FailedToEstablishConnection,
    FailedToAddToQueue,
    FailedToBeginPlayback,
    NoPlaybackDevice,
}

impl SongRequestStatus {
    pub fn code(self) -> u8 {
        match self {
            SongRequestStatus::Success => 0,
            SongRequestStatus::Failed => 1,
            SongRequestStatus::NotATrack => 2,
            SongRequestStatus::AlreadyQueued => 3,
            SongRequestStatus::FailedToEstablishConnection => 4,
            SongRequestStatus::FailedToAddToQueue => 5,
            SongRequestStatus::FailedToBeginPlayback => 6,
            SongRequestStatus::NoPlaybackDevice => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SongRequestStatus::Success => "SUCCESS",
            SongRequestStatus::Failed => "FAILED",
            SongRequestStatus::NotATrack => "REQUEST_IS_NOT_A_TRACK",
            SongRequestStatus::AlreadyQueued => "REQUEST_ALREADY_IN_QUEUE",
            SongRequestStatus::FailedToEstablishConnection => "FAILED_TO_ESTABLISH_CONNECTION",
            SongRequestStatus::FailedToAddToQueue => "FAILED_TO_ADD_TO_QUEUE",
            SongRequestStatus::FailedToBeginPlayback => "FAILED_TO_BEGIN_PLAYBACK",
            SongRequestStatus::NoPlaybackDevice => "NO_PLAYBACK_DEVICE",
        }
    }
}

impl fmt::Display for SongRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} code: {}", self.name(), self.code())
    }
}

/// Extract the track id from a Spotify track link or `spotify:track:` URI.
///
/// Query strings (`?si=...`) are ignored.
pub fn parse_track_id(request: &str) -> Option<String> {
    let re = Regex::new(
        r"^(?:https?://open\.spotify\.com/(?:intl-[A-Za-z-]+/)?track/|spotify:track:)([A-Za-z0-9]+)(?:[?#].*)?$",
    )
    .ok()?;
    let caps = re.captures(request.trim())?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Validate a request and queue it (or start playback when idle).
pub async fn request_song(music: &dyn MusicPort, request: &str) -> SongRequestStatus {
    let Some(id) = parse_track_id(request) else {
        return SongRequestStatus::NotATrack;
    };
    let uri = format!("spotify:track:{id}");

    let queue = match music.queue().await {
        Ok(q) => q,
        Err(e) => {
            tracing::warn!("queue lookup failed: {e}");
            return SongRequestStatus::Failed;
        }
    };
    let playing = match music.now_playing().await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("playback lookup failed: {e}");
            return SongRequestStatus::Failed;
        }
    };

    let already = playing.iter().chain(queue.iter()).any(|t| t.id == id);
    if already {
        return SongRequestStatus::AlreadyQueued;
    }

    if playing.is_some() {
        return match music.add_to_queue(&uri).await {
            Ok(()) => SongRequestStatus::Success,
            Err(e) => {
                tracing::warn!(%uri, "add to queue failed: {e}");
                SongRequestStatus::FailedToAddToQueue
            }
        };
    }

    match music.start_playback(&uri).await {
        Ok(PlaybackStart::Started) => SongRequestStatus::Success,
        Ok(PlaybackStart::NoDevice) => SongRequestStatus::NoPlaybackDevice,
        Err(e) => {
            tracing::warn!(%uri, "start playback failed: {e}");
            SongRequestStatus::FailedToBeginPlayback
        }
    }
}

/// `!songrequest <spotify link>`
pub struct SongRequest;

#[async_trait]
impl CommandHandler for SongRequest {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let Some(request) = ctx.args().split_whitespace().last() else {
            let usage = format!(
                "Usage: {} <spotify track link>",
                super::prefixed(ctx, "sr")
            );
            return ctx.reply(&usage).await;
        };

        let status = match ctx.services.music.clone() {
            Some(music) => request_song(music.as_ref(), request).await,
            None => SongRequestStatus::FailedToEstablishConnection,
        };

        let text = if status == SongRequestStatus::Success {
            "Request added! 🎶".to_string()
        } else {
            format!("❗ Failed to add request. Reason: {status} 😔")
        };
        ctx.reply(&text).await
    }
}

/// `!song`: current track with a link.
pub struct NowPlaying;

#[async_trait]
impl CommandHandler for NowPlaying {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let Some(music) = ctx.services.music.clone() else {
            return ctx.reply("Nothing is playing right now.").await;
        };

        let text = match music.now_playing().await {
            Ok(Some(track)) => format!(
                "{} by {} - Link: {}",
                track.title,
                track.artists_joined(" | "),
                track.url
            ),
            Ok(None) => "Nothing is playing right now.".to_string(),
            Err(e) => {
                tracing::warn!("now playing lookup failed: {e}");
                "Sorry, I couldn't reach the music player.".to_string()
            }
        };
        ctx.reply(&text).await
    }
}

/// `!queue`: next three tracks.
pub struct Queue;

#[async_trait]
impl CommandHandler for Queue {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let Some(music) = ctx.services.music.clone() else {
            return ctx.reply("Nothing is playing right now.").await;
        };

        let text = match music.queue().await {
            Ok(tracks) if tracks.is_empty() => "The queue is empty.".to_string(),
            Ok(tracks) => tracks
                .iter()
                .take(3)
                .enumerate()
                .map(|(i, t)| format!("{}. {} by {}", i + 1, t.title, t.artists_joined(", ")))
                .collect::<Vec<_>>()
                .join(" | "),
            Err(e) => {
                tracing::warn!("queue lookup failed: {e}");
                "Sorry, I couldn't reach the music player.".to_string()
            }
        };
        ctx.reply(&text).await
    }
}
