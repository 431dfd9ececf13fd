use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tcb_core::{
    commands::default_registry,
    config::Config,
    messaging::{
        port::ChatPort,
        throttled::{ThrottleConfig, ThrottledChat},
    },
    overlay::{run_overlay_loop, NowPlayingOverlay},
    ports::{CompletionPort, MusicPort, WeatherPort},
    router::{Router, Services},
    routines::{promo_routines, spawn_routine},
    state::SessionState,
    store::CounterStore,
    utils::SessionLog,
    weather::WeatherApiClient,
};
use tcb_openai::OpenAiClient;
use tcb_spotify::SpotifyClient;
use tcb_twitch::{TwitchChat, TwitchConnection, TwitchLogin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tcb_core::logging::init("tcb")?;

    let cfg = Arc::new(Config::load()?);

    // Refuse to start on a missing or damaged counter file.
    let store = CounterStore::new(cfg.stats_file.clone(), cfg.overlay_dir.clone());
    let lifetime = store.load()?;
    let state = SessionState::new(lifetime, cfg.raffle_cooldown_minutes);

    let services = build_services(&cfg)?;

    let (twitch_chat, outbound) = TwitchChat::new();
    let chat: Arc<dyn ChatPort> = Arc::new(ThrottledChat::new(
        Arc::new(twitch_chat),
        ThrottleConfig::default(),
    ));

    let mut router = Router::new(
        cfg.clone(),
        default_registry()?,
        chat.clone(),
        services.clone(),
        store,
        state,
    );
    if cfg.session_log_enabled {
        let log = SessionLog::create_in(&cfg.session_log_dir)?;
        tracing::info!(path = %log.path().display(), "session log enabled");
        router = router.with_session_log(log);
    }

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    for routine in promo_routines(&cfg) {
        tasks.push(spawn_routine(routine, chat.clone(), cancel.clone()));
    }

    if let Some(music) = services.music.clone() {
        let overlay = NowPlayingOverlay::new(cfg.player_overlay_dir.clone())?;
        tasks.push(tokio::spawn(run_overlay_loop(
            overlay,
            music,
            cfg.player_poll_interval,
            cancel.clone(),
        )));
    }

    if let Some(discord) = cfg.discord.clone() {
        let channel = cfg.home_channel().to_string();
        let commands_url = cfg.socials.commands_url.clone();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = tcb_discord::run(discord, channel, commands_url, cancel).await {
                tracing::error!("discord bot failed: {e:#}");
            }
        }));
    }

    tracing::info!(
        nick = %cfg.twitch_nick,
        channels = ?cfg.twitch_channels,
        commands = router.registry().len(),
        "starting twitch bot"
    );
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    tasks.push(tokio::spawn(router.run(inbound_rx, cancel.clone())));

    let connection = TwitchConnection::new(
        TwitchLogin {
            nick: cfg.twitch_nick.clone(),
            token: cfg.twitch_token.clone(),
            channels: cfg.twitch_channels.clone(),
        },
        outbound,
    );

    let result = tokio::select! {
        res = connection.run(inbound_tx, cancel.clone()) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("ctrl-c received, shutting down");
            Ok(())
        }
    };

    cancel.cancel();
    for task in tasks {
        let _ = task.await;
    }

    result
}

fn build_services(cfg: &Config) -> anyhow::Result<Services> {
    let completion = match &cfg.openai_api_key {
        Some(key) => {
            let client = OpenAiClient::new(key.clone(), cfg.openai_model.clone())?;
            tracing::info!(model = %client.model(), "openai enabled");
            Some(Arc::new(client) as Arc<dyn CompletionPort>)
        }
        None => {
            tracing::info!("OPENAI_API_KEY not set; LLM commands will apologise");
            None
        }
    };

    let weather = match &cfg.weather_api_key {
        Some(key) => Some(Arc::new(WeatherApiClient::new(key.clone())?) as Arc<dyn WeatherPort>),
        None => None,
    };

    let music = match &cfg.spotify {
        Some(spotify) => {
            tracing::info!(device = %spotify.device_name, "spotify enabled");
            Some(Arc::new(SpotifyClient::new(spotify.clone())?) as Arc<dyn MusicPort>)
        }
        None => None,
    };

    Ok(Services {
        completion,
        weather,
        music,
    })
}
