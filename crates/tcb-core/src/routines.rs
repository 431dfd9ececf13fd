//! Fixed-interval promotional posts.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{config::Config, messaging::port::ChatPort};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Routine {
    pub name: String,
    pub interval: Duration,
    pub channel: String,
    pub message: String,
}

/// Promo routines for the home channel. Links that are not configured are skipped.
pub fn promo_routines(cfg: &Config) -> Vec<Routine> {
    let channel = cfg.home_channel().to_string();
    let mut out = Vec::new();

    let twitter = &cfg.socials.twitter_url;
    if !twitter.is_empty() {
        out.push(Routine {
            name: "twitter".to_string(),
            interval: cfg.twitter_routine_interval,
            channel: channel.clone(),
            message: format!(
                "Follow {channel} on 🐦 Twitter! Posts, MEMES, live notifications and more {twitter}"
            ),
        });
    }

    let discord = &cfg.socials.discord_invite_url;
    if !discord.is_empty() {
        out.push(Routine {
            name: "discord".to_string(),
            interval: cfg.discord_routine_interval,
            channel: channel.clone(),
            message: format!(
                "Board the spaceship and join fellow Astronauts 🧑‍🚀👩‍🚀👨‍🚀 on this adventure! Join the Discord for livestream notifications, contests, memes and more! {discord}"
            ),
        });
    }

    out
}

/// Run `routine` on its own task until `cancel` fires.
///
/// The first post goes out one full interval after start.
pub fn spawn_routine(
    routine: Routine,
    chat: Arc<dyn ChatPort>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            routine = %routine.name,
            every_secs = routine.interval.as_secs(),
            "routine started"
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(routine.interval) => {
                    if let Err(e) = chat.send(&routine.channel, &routine.message).await {
                        tracing::warn!(routine = %routine.name, "routine post failed: {e}");
                    }
                }
            }
        }
        tracing::info!(routine = %routine.name, "routine stopped");
    })
}
