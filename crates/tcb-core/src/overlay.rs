//! Now-playing overlay files for the stream scene.
//!
//! Writes `song_title.txt`, `song_artist.txt` and `album_artwork.png` into a
//! directory the broadcast software watches. Files are only rewritten when the
//! track changes.

use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    errors::Error,
    ports::{MusicPort, Track},
    Result,
};

const TITLE_FILE: &str = "song_title.txt";
const ARTIST_FILE: &str = "song_artist.txt";
const ARTWORK_FILE: &str = "album_artwork.png";

// Trailing padding keeps scrolling text from butting into itself.
const TITLE_PADDING: usize = 10;
const ARTIST_PADDING: usize = 5;

pub struct NowPlayingOverlay {
    dir: PathBuf,
    http: reqwest::Client,
    last_track_id: Option<String>,
}

impl NowPlayingOverlay {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::External(format!("artwork client build error: {e}")))?;
        Ok(Self {
            dir: dir.into(),
            http,
            last_track_id: None,
        })
    }

    /// Poll the player once. Returns true when the overlay was rewritten.
    pub async fn refresh(&mut self, music: &dyn MusicPort) -> Result<bool> {
        let Some(track) = music.now_playing().await? else {
            return Ok(false);
        };
        if self.last_track_id.as_deref() == Some(track.id.as_str()) {
            return Ok(false);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        if let Err(e) = self.download_artwork(&track).await {
            tracing::warn!(title = %track.title, "could not download album artwork: {e}");
        }
        self.write_text(&track).await?;

        tracing::info!(title = %track.title, "now playing overlay updated");
        self.last_track_id = Some(track.id);
        Ok(true)
    }

    async fn write_text(&self, track: &Track) -> Result<()> {
        let title = format!("{}{}", track.title, " ".repeat(TITLE_PADDING));
        let artists = format!("{}{}", track.artists_joined(" | "), " ".repeat(ARTIST_PADDING));
        tokio::fs::write(self.dir.join(TITLE_FILE), title).await?;
        tokio::fs::write(self.dir.join(ARTIST_FILE), artists).await?;
        Ok(())
    }

    async fn download_artwork(&self, track: &Track) -> Result<()> {
        let Some(url) = &track.artwork_url else {
            return Ok(());
        };

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::External(format!("artwork request error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::External(format!("artwork request failed: HTTP {status}")));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::External(format!("artwork read error: {e}")))?;

        tokio::fs::write(self.dir.join(ARTWORK_FILE), &bytes).await?;
        Ok(())
    }
}

/// Keep the overlay in sync until `cancel` fires. Errors are logged and retried next tick.
pub async fn run_overlay_loop(
    mut overlay: NowPlayingOverlay,
    music: Arc<dyn MusicPort>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        if let Err(e) = overlay.refresh(music.as_ref()).await {
            tracing::warn!("now playing overlay refresh failed: {e}");
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::testing::{tmp_path, track, FakeMusic};

    #[tokio::test]
    async fn rewrites_files_only_on_track_change() {
        let dir = tmp_path("tcb-overlay");
        let music = FakeMusic {
            playing: Mutex::new(Some(track("a", "First", &["X", "Y"]))),
            ..FakeMusic::default()
        };
        let mut overlay = NowPlayingOverlay::new(&dir).unwrap();

        assert!(overlay.refresh(&music).await.unwrap());
        assert_eq!(
            std::fs::read_to_string(dir.join(TITLE_FILE)).unwrap(),
            format!("First{}", " ".repeat(10))
        );
        assert_eq!(
            std::fs::read_to_string(dir.join(ARTIST_FILE)).unwrap(),
            "X | Y     "
        );
        assert!(!overlay.refresh(&music).await.unwrap());

        *music.playing.lock().unwrap() = Some(track("b", "Second", &["Z"]));
        assert!(overlay.refresh(&music).await.unwrap());
        assert!(std::fs::read_to_string(dir.join(TITLE_FILE))
            .unwrap()
            .starts_with("Second"));
    }

    #[tokio::test]
    async fn nothing_playing_leaves_files_alone() {
        let dir = tmp_path("tcb-overlay-idle");
        let mut overlay = NowPlayingOverlay::new(&dir).unwrap();
        assert!(!overlay.refresh(&FakeMusic::default()).await.unwrap());
        assert!(!dir.exists());
    }
}
