use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration for the bot, read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Twitch
    pub twitch_token: String,
    pub twitch_nick: String,
    /// Channels to join, lowercase without `#`. The first one is the home channel.
    pub twitch_channels: Vec<String>,

    // Router
    pub command_prefix: String,
    pub greeting_words: Vec<String>,
    pub alert_hashtag: String,
    pub reply_soft_limit: usize,

    // Raffle
    pub raffle_cooldown_minutes: u64,
    pub raffle_command: String,

    // Counters
    pub stats_file: PathBuf,
    pub overlay_dir: PathBuf,

    // Session log
    pub session_log_enabled: bool,
    pub session_log_dir: PathBuf,

    // Optional providers
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub weather_api_key: Option<String>,
    pub spotify: Option<SpotifyConfig>,
    pub discord: Option<DiscordConfig>,

    // Now-playing overlay
    pub player_overlay_dir: PathBuf,
    pub player_poll_interval: Duration,

    // Socials + promo routines
    pub socials: Socials,
    pub twitter_routine_interval: Duration,
    pub discord_routine_interval: Duration,
}

#[derive(Clone, Debug)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub device_name: String,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub token: String,
    pub notifications_channel_id: Option<u64>,
    pub owner_id: Option<u64>,
    pub brand_logo: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Socials {
    pub twitter_url: String,
    pub youtube_url: String,
    pub discord_invite_url: String,
    pub commands_url: String,
}

impl Config {
    /// Load from the process environment, after applying an optional `.env` file.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Lookup(&lookup);

        let twitch_token = env.required("TWITCH_TOKEN")?;
        let twitch_nick = env.required("TWITCH_NICK")?.to_lowercase();
        let twitch_channels = parse_channels(env.str("TWITCH_CHANNELS"));
        if twitch_channels.is_empty() {
            return Err(Error::Config(
                "TWITCH_CHANNELS environment variable is required".to_string(),
            ));
        }

        let command_prefix = env
            .str("COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "!".to_string());
        let greeting_words = parse_csv_lower(
            env.str("GREETING_WORDS")
                .or_else(|| Some("hello,hi,yo".to_string())),
        );
        let alert_hashtag = env
            .str("ALERT_HASHTAG")
            .and_then(non_empty)
            .unwrap_or_else(|| "#treatsforgus".to_string())
            .to_lowercase();
        let reply_soft_limit = env.usize("REPLY_SOFT_LIMIT").unwrap_or(450).max(1);

        let raffle_cooldown_minutes = env.u64("RAFFLE_COOLDOWN_MINUTES").unwrap_or(15);
        let raffle_command = env
            .str("RAFFLE_COMMAND")
            .and_then(non_empty)
            .unwrap_or_else(|| "!raffle".to_string());

        let stats_file = env
            .path("STATS_FILE")
            .unwrap_or_else(|| PathBuf::from("./data/total_stats.json"));
        let overlay_dir = env
            .path("OVERLAY_DIR")
            .unwrap_or_else(|| PathBuf::from("./data"));

        let session_log_enabled = env.bool("SESSION_LOG").unwrap_or(false);
        let session_log_dir = env
            .path("SESSION_LOG_DIR")
            .unwrap_or_else(|| PathBuf::from("./.logs"));

        let openai_api_key = env.str("OPENAI_API_KEY").and_then(non_empty);
        let openai_model = env
            .str("OPENAI_MODEL")
            .and_then(non_empty)
            .unwrap_or_else(|| "gpt-3.5-turbo".to_string());
        let weather_api_key = env.str("WEATHER_API_KEY").and_then(non_empty);

        // Spotify needs every credential; a partial set disables it.
        let spotify = match (
            env.str("SPOTIFY_CLIENT_ID").and_then(non_empty),
            env.str("SPOTIFY_CLIENT_SECRET").and_then(non_empty),
            env.str("SPOTIFY_REFRESH_TOKEN").and_then(non_empty),
            env.str("SPOTIFY_DEVICE_NAME").and_then(non_empty),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token), Some(device_name)) => {
                Some(SpotifyConfig {
                    client_id,
                    client_secret,
                    refresh_token,
                    device_name,
                })
            }
            _ => None,
        };

        let discord = env
            .str("DISCORD_TOKEN")
            .and_then(non_empty)
            .map(|token| DiscordConfig {
                token,
                notifications_channel_id: env.snowflake("DISCORD_NOTIFICATIONS_CHANNEL_ID"),
                owner_id: env.snowflake("DISCORD_OWNER_ID"),
                brand_logo: env.str("DISCORD_BRAND_LOGO").and_then(non_empty),
            });

        let player_overlay_dir = env
            .path("PLAYER_OVERLAY_DIR")
            .unwrap_or_else(|| PathBuf::from("./overlay"));
        let player_poll_interval =
            Duration::from_secs(env.u64("PLAYER_POLL_SECONDS").unwrap_or(5).max(1));

        let socials = Socials {
            twitter_url: env.str("TWITTER_URL").unwrap_or_default(),
            youtube_url: env.str("YOUTUBE_URL").unwrap_or_default(),
            discord_invite_url: env.str("DISCORD_INVITE_URL").unwrap_or_default(),
            commands_url: env.str("COMMANDS_URL").unwrap_or_default(),
        };
        let twitter_routine_interval =
            minutes(env.u64("TWITTER_ROUTINE_MINUTES").unwrap_or(45));
        let discord_routine_interval =
            minutes(env.u64("DISCORD_ROUTINE_MINUTES").unwrap_or(60));

        Ok(Self {
            twitch_token,
            twitch_nick,
            twitch_channels,
            command_prefix,
            greeting_words,
            alert_hashtag,
            reply_soft_limit,
            raffle_cooldown_minutes,
            raffle_command,
            stats_file,
            overlay_dir,
            session_log_enabled,
            session_log_dir,
            openai_api_key,
            openai_model,
            weather_api_key,
            spotify,
            discord,
            player_overlay_dir,
            player_poll_interval,
            socials,
            twitter_routine_interval,
            discord_routine_interval,
        })
    }

    /// The channel routines and announcements post to.
    pub fn home_channel(&self) -> &str {
        self.twitch_channels
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

struct Lookup<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    fn str(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn required(&self, key: &str) -> Result<String> {
        self.str(key).and_then(non_empty).ok_or_else(|| {
            Error::Config(format!("{key} environment variable is required"))
        })
    }

    fn bool(&self, key: &str) -> Option<bool> {
        self.str(key).map(|s| {
            matches!(
                s.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    fn u64(&self, key: &str) -> Option<u64> {
        self.str(key).and_then(|s| s.trim().parse::<u64>().ok())
    }

    /// Discord ids are never zero.
    fn snowflake(&self, key: &str) -> Option<u64> {
        self.u64(key).filter(|id| *id != 0)
    }

    fn usize(&self, key: &str) -> Option<usize> {
        self.str(key).and_then(|s| s.trim().parse::<usize>().ok())
    }

    fn path(&self, key: &str) -> Option<PathBuf> {
        self.str(key).and_then(non_empty).map(PathBuf::from)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue; // existing env wins
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.max(1) * 60)
}

fn parse_channels(v: Option<String>) -> Vec<String> {
    parse_csv_lower(v)
        .into_iter()
        .map(|c| c.trim_start_matches('#').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn parse_csv_lower(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
