//! Spotify Web API adapter.
//!
//! Implements the core `MusicPort` with a long-lived refresh token: access
//! tokens are minted on demand and cached until shortly before they expire.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};

use tcb_core::{
    config::SpotifyConfig,
    errors::Error,
    ports::{MusicPort, PlaybackStart, Track},
    Result,
};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Refresh this long before the token actually expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    cfg: SpotifyConfig,
    http: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(cfg: SpotifyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::External(format!("spotify client build error: {e}")))?;
        Ok(Self {
            cfg,
            http,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(tok) = guard.as_ref() {
            if Instant::now() + TOKEN_SLACK < tok.expires_at {
                return Ok(tok.value.clone());
            }
        }

        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.cfg.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::External(format!("spotify token request error: {e}")))?;
        let resp = check_status(resp, "token refresh").await?;

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("spotify token json error: {e}")))?;
        tracing::debug!(expires_in = body.expires_in, "spotify access token refreshed");

        let value = body.access_token;
        *guard = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(value)
    }

    async fn api(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(self
            .http
            .request(method, format!("{API_BASE}{path}"))
            .bearer_auth(token))
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::External(format!("spotify {what} request error: {e}")))?;
        check_status(resp, what).await
    }

    async fn device_id(&self) -> Result<Option<String>> {
        let req = self.api(Method::GET, "/me/player/devices").await?;
        let devices: DevicesResponse = self
            .send(req, "devices")
            .await?
            .json()
            .await
            .map_err(|e| Error::External(format!("spotify devices json error: {e}")))?;
        Ok(find_device(&devices.devices, &self.cfg.device_name))
    }
}

async fn check_status(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::External(format!(
        "spotify {what} failed: {status} {}",
        body.chars().take(200).collect::<String>()
    )))
}

#[async_trait]
impl MusicPort for SpotifyClient {
    async fn now_playing(&self) -> Result<Option<Track>> {
        let req = self.api(Method::GET, "/me/player/currently-playing").await?;
        let resp = self.send(req, "currently playing").await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body: CurrentlyPlaying = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("spotify playback json error: {e}")))?;
        if !body.is_playing {
            return Ok(None);
        }
        Ok(body.item.map(TrackObject::into_track))
    }

    async fn queue(&self) -> Result<Vec<Track>> {
        let req = self.api(Method::GET, "/me/player/queue").await?;
        let body: QueueResponse = self
            .send(req, "queue")
            .await?
            .json()
            .await
            .map_err(|e| Error::External(format!("spotify queue json error: {e}")))?;
        Ok(body.queue.into_iter().map(TrackObject::into_track).collect())
    }

    async fn add_to_queue(&self, uri: &str) -> Result<()> {
        let req = self
            .api(Method::POST, "/me/player/queue")
            .await?
            .query(&[("uri", uri)]);
        self.send(req, "add to queue").await?;
        tracing::info!(%uri, "queued track");
        Ok(())
    }

    async fn start_playback(&self, uri: &str) -> Result<PlaybackStart> {
        let Some(device_id) = self.device_id().await? else {
            tracing::warn!(device = %self.cfg.device_name, "spotify playback device not found");
            return Ok(PlaybackStart::NoDevice);
        };

        let req = self
            .api(Method::PUT, "/me/player/play")
            .await?
            .query(&[("device_id", device_id.as_str())])
            .json(&serde_json::json!({ "uris": [uri] }));
        self.send(req, "start playback").await?;
        tracing::info!(%uri, "started playback");
        Ok(PlaybackStart::Started)
    }
}

// ============== Wire types ==============

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    item: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    queue: Vec<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<NamedObject>,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct NamedObject {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    id: Option<String>,
    name: String,
}

impl TrackObject {
    fn into_track(self) -> Track {
        // Images come largest first; the second one is the ~300px variant.
        let artwork_url = self.album.and_then(|a| {
            let mut images = a.images.into_iter();
            let first = images.next();
            images.next().or(first).map(|i| i.url)
        });
        Track {
            id: self.id.unwrap_or_default(),
            title: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            url: self.external_urls.spotify,
            uri: self.uri,
            artwork_url,
        }
    }
}

fn find_device(devices: &[Device], name: &str) -> Option<String> {
    devices
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(name))
        .and_then(|d| d.id.clone())
}
