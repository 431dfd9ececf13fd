use async_trait::async_trait;

use crate::{
    cooldown::GateDecision,
    router::{CommandContext, CommandHandler},
    Result,
};

pub const RAFFLE_ANNOUNCEMENT: &str = "Okay! Let's do a raffle! 🎟️";

/// `!raffle`: announce and hand off to the channel's raffle command, at most
/// once per cooldown window.
pub struct Raffle;

#[async_trait]
impl CommandHandler for Raffle {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        match ctx.state.raffle.try_trigger() {
            GateDecision::Fired => {
                tracing::info!(user = %ctx.message.author.login, "raffle triggered");
                ctx.send(RAFFLE_ANNOUNCEMENT).await?;
                ctx.send(&ctx.config.raffle_command).await
            }
            GateDecision::CoolingDown { remaining_minutes } => {
                let text = format!(
                    "I am sorry, {}, raffle is currently in cool down for another {remaining_minutes} minute(s).",
                    ctx.message.author.mention()
                );
                ctx.send(&text).await
            }
        }
    }
}
