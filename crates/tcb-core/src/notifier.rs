//! Decision logic for the Discord notifier bot.
//!
//! The Discord adapter feeds raw messages in and performs whatever action comes
//! back; nothing here touches the network.

const DISCORD_GREETINGS: [&str; 8] = [
    "hello",
    "hi",
    "sup",
    "what's up",
    "whats up",
    "what up",
    "wat up",
    "yo",
];

const LIVE_COMMAND: &str = "!live";
const HELP_COMMAND: &str = "!help";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifierAction {
    Ignore,
    /// Say hello back in the same channel.
    Greet,
    /// DM the author the command list.
    Help,
    /// Post a go-live announcement with the given description.
    Announce { description: String },
    /// `!live` from someone other than the owner.
    Denied,
}

#[derive(Clone, Debug)]
pub struct NotifierRules {
    pub owner_id: Option<u64>,
}

pub fn classify(
    rules: &NotifierRules,
    author_id: u64,
    from_self: bool,
    content: &str,
) -> NotifierAction {
    if from_self {
        return NotifierAction::Ignore;
    }

    let trimmed = content.trim();
    let lower = trimmed.to_lowercase();

    if DISCORD_GREETINGS.contains(&lower.as_str()) {
        return NotifierAction::Greet;
    }
    if lower == HELP_COMMAND {
        return NotifierAction::Help;
    }

    let is_live = lower == LIVE_COMMAND
        || lower
            .strip_prefix(LIVE_COMMAND)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace));
    if !is_live {
        return NotifierAction::Ignore;
    }

    if rules.owner_id != Some(author_id) {
        return NotifierAction::Denied;
    }

    let description = trimmed
        .get(LIVE_COMMAND.len()..)
        .unwrap_or_default()
        .trim()
        .to_string();
    NotifierAction::Announce { description }
}

pub fn greeting_reply(mention: &str) -> String {
    format!("Hello! {mention}")
}

pub fn help_reply(commands_url: &str) -> String {
    if commands_url.is_empty() {
        "Type `!live <message>` (owner only) to announce a stream, or just say hi!".to_string()
    } else {
        format!("You can find the list of commands here: {commands_url}")
    }
}

pub fn denied_reply(mention: &str) -> String {
    format!("{mention} you don't have permission for the '!live' command.")
}

/// A go-live post: plain content plus one link embed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub content: String,
    pub embed_title: String,
    pub embed_url: String,
    pub embed_description: String,
}

pub fn build_announcement(
    author_mention: &str,
    twitch_channel: &str,
    description: &str,
) -> Announcement {
    Announcement {
        content: format!(
            "@everyone\n\n**{author_mention} is LIVE on TWITCH! 📹 🔴 🎮**\n\n**WATCH 👀**\n\n"
        ),
        embed_title: twitch_channel.to_string(),
        embed_url: format!("https://twitch.tv/{twitch_channel}"),
        embed_description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: u64 = 42;

    fn rules() -> NotifierRules {
        NotifierRules {
            owner_id: Some(OWNER),
        }
    }

    #[test]
    fn greetings_match_whole_message_only() {
        assert_eq!(classify(&rules(), 1, false, "What's Up"), NotifierAction::Greet);
        assert_eq!(classify(&rules(), 1, false, " yo "), NotifierAction::Greet);
        assert_eq!(classify(&rules(), 1, false, "yo dude"), NotifierAction::Ignore);
    }

    #[test]
    fn own_messages_are_ignored() {
        assert_eq!(classify(&rules(), OWNER, true, "hello"), NotifierAction::Ignore);
    }

    #[test]
    fn live_is_owner_only() {
        assert_eq!(
            classify(&rules(), OWNER, false, "!LIVE   Ranked grind tonight"),
            NotifierAction::Announce {
                description: "Ranked grind tonight".to_string()
            }
        );
        assert_eq!(
            classify(&rules(), 7, false, "!live now"),
            NotifierAction::Denied
        );
        assert_eq!(classify(&rules(), OWNER, false, "!lively"), NotifierAction::Ignore);

        let nobody = NotifierRules { owner_id: None };
        assert_eq!(classify(&nobody, OWNER, false, "!live"), NotifierAction::Denied);
    }

    #[test]
    fn help_and_announcement_texts() {
        assert_eq!(classify(&rules(), 1, false, "!Help"), NotifierAction::Help);

        let a = build_announcement("<@42>", "streamer", "come hang");
        assert!(a.content.starts_with("@everyone"));
        assert!(a.content.contains("<@42> is LIVE on TWITCH!"));
        assert_eq!(a.embed_url, "https://twitch.tv/streamer");
        assert_eq!(a.embed_description, "come hang");
    }
}
