use async_trait::async_trait;

use crate::{
    router::{CommandContext, CommandHandler, ALERT_COMMAND, GREETING_COMMAND, MENTION_COMMAND},
    Result,
};

pub struct Discord;

#[async_trait]
impl CommandHandler for Discord {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let invite = &ctx.config.socials.discord_invite_url;
        if invite.is_empty() {
            return ctx.reply("There is no Discord link set up yet.").await;
        }
        let text = format!("Join {}'s discord! {invite}", ctx.message.channel);
        ctx.send(&text).await
    }
}

/// `!commands` / `!help`: link the command list, or list registered names.
pub struct Commands;

#[async_trait]
impl CommandHandler for Commands {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let url = &ctx.config.socials.commands_url;
        let text = if url.is_empty() {
            let prefix = &ctx.config.command_prefix;
            let names = ctx
                .registry
                .names()
                .into_iter()
                .filter(|n| ![GREETING_COMMAND, MENTION_COMMAND, ALERT_COMMAND].contains(n))
                .map(|n| format!("{prefix}{n}"))
                .collect::<Vec<_>>()
                .join(" ");
            format!("Commands: {names}")
        } else {
            format!("You can find the list of commands here! {url}")
        };
        ctx.send(&text).await
    }
}

pub struct Socials;

#[async_trait]
impl CommandHandler for Socials {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let s = &ctx.config.socials;
        let parts: Vec<String> = [
            ("📺 YouTube", &s.youtube_url),
            ("🐦 Twitter", &s.twitter_url),
            ("🤖 Discord", &s.discord_invite_url),
        ]
        .into_iter()
        .filter(|(_, url)| !url.is_empty())
        .map(|(label, url)| format!("{label}: {url}"))
        .collect();

        if parts.is_empty() {
            return ctx.reply("No socials are set up yet.").await;
        }
        ctx.send(&parts.join(" | ")).await
    }
}
