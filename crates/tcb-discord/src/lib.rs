//! Discord notifier: greets people, DMs help, and posts go-live announcements.
//!
//! Decisions come from `tcb_core::notifier`; this crate only talks to the
//! gateway.

use std::path::Path;

use anyhow::Context as _;
use serenity::{
    all::{
        ChannelId, Context, CreateAttachment, CreateEmbed, CreateMessage, EventHandler,
        GatewayIntents, Mentionable, Message, Ready,
    },
    Client,
};
use tokio_util::sync::CancellationToken;

use tcb_core::{
    config::DiscordConfig,
    notifier::{self, NotifierAction, NotifierRules},
};

struct Handler {
    rules: NotifierRules,
    notifications_channel: Option<ChannelId>,
    brand_logo: Option<String>,
    twitch_channel: String,
    commands_url: String,
}

impl Handler {
    async fn announce(
        &self,
        ctx: &Context,
        msg: &Message,
        description: &str,
    ) -> anyhow::Result<()> {
        let Some(channel) = self.notifications_channel else {
            tracing::warn!("!live received but DISCORD_NOTIFICATIONS_CHANNEL_ID is not set");
            return Ok(());
        };

        let post = notifier::build_announcement(
            &msg.author.mention().to_string(),
            &self.twitch_channel,
            description,
        );
        let mut embed = CreateEmbed::new()
            .title(&post.embed_title)
            .url(&post.embed_url)
            .description(&post.embed_description);
        let mut builder = CreateMessage::new().content(&post.content);

        if let Some(logo) = self.brand_logo.as_deref() {
            match CreateAttachment::path(logo).await {
                Ok(file) => {
                    let name = Path::new(logo)
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("logo.png");
                    embed = embed.thumbnail(format!("attachment://{name}"));
                    builder = builder.add_file(file);
                }
                Err(e) => tracing::warn!(path = %logo, error = %e, "brand logo unreadable"),
            }
        }

        channel
            .send_message(&ctx.http, builder.embed(embed))
            .await
            .context("post announcement")?;
        tracing::info!(channel = %channel, "posted go-live announcement");
        Ok(())
    }

    async fn act(&self, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
        let from_self = msg.author.id == ctx.cache.current_user().id;
        let action = notifier::classify(&self.rules, msg.author.id.get(), from_self, &msg.content);

        match action {
            NotifierAction::Ignore => {}
            NotifierAction::Greet => {
                let text = notifier::greeting_reply(&msg.author.mention().to_string());
                msg.channel_id.say(&ctx.http, text).await?;
            }
            NotifierAction::Help => {
                let text = notifier::help_reply(&self.commands_url);
                msg.author
                    .direct_message(ctx, CreateMessage::new().content(text))
                    .await?;
            }
            NotifierAction::Announce { description } => {
                self.announce(ctx, msg, &description).await?;
            }
            NotifierAction::Denied => {
                let text = notifier::denied_reply(&msg.author.mention().to_string());
                msg.reply(&ctx.http, text).await?;
            }
        }
        Ok(())
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, "discord connected");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if let Err(e) = self.act(&ctx, &msg).await {
            tracing::warn!(error = %e, author = %msg.author.name, "discord action failed");
        }
    }
}

/// Run the Discord client until `cancel` fires.
pub async fn run(
    cfg: DiscordConfig,
    twitch_channel: String,
    commands_url: String,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let handler = Handler {
        rules: NotifierRules {
            owner_id: cfg.owner_id,
        },
        notifications_channel: cfg.notifications_channel_id.map(ChannelId::new),
        brand_logo: cfg.brand_logo,
        twitch_channel,
        commands_url,
    };

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&cfg.token, intents)
        .event_handler(handler)
        .await
        .context("build discord client")?;
    let shards = client.shard_manager.clone();

    tokio::select! {
        res = client.start() => res.context("discord client stopped"),
        _ = cancel.cancelled() => {
            shards.shutdown_all().await;
            tracing::info!("discord client shut down");
            Ok(())
        }
    }
}
