use async_trait::async_trait;

use crate::{
    router::{CommandContext, CommandHandler},
    weather::format_report,
    Result,
};

/// `!weather <location>`
pub struct Weather;

#[async_trait]
impl CommandHandler for Weather {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let location = ctx.args().trim();
        if location.is_empty() {
            let usage = format!("Usage: {} <location>", super::prefixed(ctx, "weather"));
            return ctx.reply(&usage).await;
        }

        let Some(weather) = ctx.services.weather.clone() else {
            return ctx
                .reply("Sorry, weather lookups are not set up on this channel.")
                .await;
        };

        let text = match weather.current(location).await {
            Ok(report) => format_report(&report),
            Err(e) => {
                tracing::warn!(location, "weather lookup failed: {e}");
                format!("Sorry, I couldn't get the weather for {location} right now.")
            }
        };
        ctx.reply(&text).await
    }
}
