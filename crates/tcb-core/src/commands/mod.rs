//! Built-in chat commands and the default registration table.

pub mod fun;
pub mod info;
pub mod music;
pub mod raffle;
pub mod stats;
pub mod weather;

use crate::{
    router::{CommandContext, CommandRegistry, ALERT_COMMAND, GREETING_COMMAND, MENTION_COMMAND},
    Result,
};

/// Registry with every built-in command.
pub fn default_registry() -> Result<CommandRegistry> {
    let mut reg = CommandRegistry::new();

    // Rewrite targets
    reg.register(GREETING_COMMAND, &[], fun::Hello)?;
    reg.register(MENTION_COMMAND, &[], fun::Ai)?;
    reg.register(ALERT_COMMAND, &[], fun::Alert)?;

    // Stream stats
    reg.register("died", &["dead"], stats::Tally(stats::Event::Died))?;
    reg.register("chalked", &[], stats::Tally(stats::Event::Chalked))?;
    reg.register("win", &["dub"], stats::Tally(stats::Event::Won))?;
    reg.register("clearwins", &[], stats::ClearWins)?;
    reg.register("dmzpr", &[], stats::DmzPr)?;
    reg.register("raffle", &[], raffle::Raffle)?;

    // Fun
    reg.register("8ball", &[], fun::EightBall)?;
    reg.register("insultme", &[], fun::InsultMe)?;
    reg.register("lurk", &[], fun::Lurk)?;
    reg.register("guscam", &[], fun::GusCam)?;

    // Info
    reg.register("discord", &[], info::Discord)?;
    reg.register("commands", &["help"], info::Commands)?;
    reg.register("socials", &[], info::Socials)?;
    reg.register("weather", &[], weather::Weather)?;

    // Music
    reg.register("songrequest", &["sr", "request"], music::SongRequest)?;
    reg.register("song", &["nowplaying"], music::NowPlaying)?;
    reg.register("queue", &[], music::Queue)?;

    Ok(reg)
}

/// Reply used by LLM-backed commands when no completion service is configured.
pub(crate) fn no_llm_reply(ctx: &CommandContext<'_>) -> String {
    format!(
        "Sorry, {} does not have GPT implemented.",
        ctx.channel_mention()
    )
}

/// `!name` with the configured prefix.
pub(crate) fn prefixed(ctx: &CommandContext<'_>, name: &str) -> String {
    format!("{}{name}", ctx.config.command_prefix)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::{
        config::Config,
        domain::IncomingMessage,
        router::{DispatchOutcome, Router, Services},
        state::SessionState,
        store::CounterStore,
        testing::{message, test_config, tmp_store, RecordingChat},
    };

    use super::default_registry;

    pub struct Harness {
        pub router: Router,
        pub chat: Arc<RecordingChat>,
        pub store: CounterStore,
    }

    impl Harness {
        pub fn new(prefix: &str, services: Services) -> Self {
            Self::with_config(prefix, services, test_config())
        }

        pub fn with_config(prefix: &str, services: Services, config: Config) -> Self {
            let chat = Arc::new(RecordingChat::default());
            let store = tmp_store(prefix);
            let state = SessionState::new(store.load().unwrap(), 15);
            let router = Router::new(
                Arc::new(config),
                default_registry().unwrap(),
                chat.clone(),
                services,
                store.clone(),
                state,
            );
            Self {
                router,
                chat,
                store,
            }
        }

        pub async fn say(&mut self, login: &str, text: &str) -> DispatchOutcome {
            let msg: IncomingMessage = message(login, text);
            self.router.handle(&msg).await
        }

        pub fn texts(&self) -> Vec<String> {
            self.chat.texts()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_the_command_surface() {
        let reg = default_registry().unwrap();
        for name in [
            "hello", "ai", "alert", "raffle", "died", "dead", "chalked", "win", "dub",
            "clearwins", "dmzpr", "8ball", "discord", "commands", "help", "socials",
            "weather", "songrequest", "sr", "request", "lurk", "insultme", "guscam",
            "song", "nowplaying", "queue",
        ] {
            assert!(reg.resolve(name).is_some(), "missing {name}");
        }
        assert_eq!(reg.resolve("DEAD").unwrap().name, "died");
    }
}
