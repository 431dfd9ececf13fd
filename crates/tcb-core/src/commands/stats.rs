use async_trait::async_trait;

use crate::{
    router::{CommandContext, CommandHandler},
    state::Tally as Counts,
    store::Stat,
    Result,
};

/// Events counted by the tally commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Died,
    Chalked,
    Won,
}

impl Event {
    fn stat(self) -> Stat {
        match self {
            Event::Died => Stat::Deaths,
            Event::Chalked => Stat::Chalked,
            Event::Won => Stat::WzWins,
        }
    }

    fn message(self, channel: &str, c: Counts) -> String {
        match self {
            Event::Died => format!(
                "💀💀💀💀💀 {channel} has died {} time(s) this session and {} times in their career.",
                c.session, c.lifetime
            ),
            Event::Won => format!(
                "🏆🏆🏆🏆🏆🏆 {channel} has won {} time(s) this session and {} times in their career.",
                c.session, c.lifetime
            ),
            Event::Chalked => format!(
                "💬 {channel} said \"I'm chalked\" {} time(s) this session and {} times in their career.",
                c.session, c.lifetime
            ),
        }
    }
}

/// `!died` / `!chalked` / `!win`: count one event and announce the totals.
pub struct Tally(pub Event);

#[async_trait]
impl CommandHandler for Tally {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let counts = ctx.state.record_event(ctx.store, self.0.stat())?;
        let text = self.0.message(&ctx.channel_mention(), counts);
        ctx.send(&text).await
    }
}

pub struct ClearWins;

#[async_trait]
impl CommandHandler for ClearWins {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        ctx.state.clear_session(ctx.store, Stat::WzWins);
        ctx.send("Session wins have been reset :)").await
    }
}

/// `!dmzpr <kills>`: raise the squad kill record.
pub struct DmzPr;

#[async_trait]
impl CommandHandler for DmzPr {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let Ok(kills) = ctx.args().trim().parse::<u64>() else {
            let usage = format!("Usage: {} <kills>", super::prefixed(ctx, "dmzpr"));
            return ctx.reply(&usage).await;
        };

        let current = ctx.state.lifetime(Stat::DmzSquadPrKills);
        if kills <= current {
            let text = format!(
                "I am sorry, {}. That does not beat their current PR of ({current})",
                ctx.message.author.mention()
            );
            return ctx.reply(&text).await;
        }

        ctx.state
            .set_lifetime(ctx.store, Stat::DmzSquadPrKills, kills)?;
        let text = format!(
            "💀 {} and squad have beat their kill PR! WAS: {current} and is NOW: {kills}",
            ctx.channel_mention()
        );
        ctx.send(&text).await
    }
}
