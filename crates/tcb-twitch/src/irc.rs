//! Minimal Twitch IRC line parser/formatter.
//!
//! Handles IRCv3 tags, the `nick!user@host` prefix, command + params and the
//! trailing parameter. Not a general RFC 1459 implementation.

use std::collections::BTreeMap;

use tcb_core::domain::{Author, IncomingMessage};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IrcMessage<'a> {
    pub tags: BTreeMap<&'a str, &'a str>,
    /// Raw prefix without the leading `:`.
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
    pub trailing: Option<&'a str>,
}

impl<'a> IrcMessage<'a> {
    /// Parse one line (without the trailing CRLF). Returns `None` for empty or truncated lines.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let mut rest = raw.trim_end_matches(['\r', '\n']);
        let mut msg = IrcMessage::default();

        if let Some(tagged) = rest.strip_prefix('@') {
            let (raw_tags, after) = tagged.split_once(' ')?;
            for pair in raw_tags.split(';').filter(|p| !p.is_empty()) {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                msg.tags.insert(k, v);
            }
            rest = after.trim_start();
        }

        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, after) = prefixed.split_once(' ')?;
            msg.prefix = Some(prefix);
            rest = after.trim_start();
        }

        let head = match rest.split_once(" :") {
            Some((head, trailing)) => {
                msg.trailing = Some(trailing);
                head
            }
            None => rest,
        };

        let mut parts = head.split(' ').filter(|p| !p.is_empty());
        msg.command = parts.next()?;
        msg.params = parts.collect();
        Some(msg)
    }

    /// Nick from a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&'a str> {
        let prefix = self.prefix?;
        let (nick, _) = prefix.split_once('!')?;
        Some(nick)
    }

    /// Tag value with IRCv3 escapes decoded. Empty values read as `None`.
    pub fn tag(&self, key: &str) -> Option<String> {
        let raw = self.tags.get(key)?;
        if raw.is_empty() {
            return None;
        }
        Some(unescape_tag(raw))
    }

    /// Convert a `PRIVMSG` into the core message type.
    pub fn to_incoming(&self, bot_nick: &str) -> Option<IncomingMessage> {
        if self.command != "PRIVMSG" {
            return None;
        }
        let channel = self.params.first()?.trim_start_matches('#').to_lowercase();
        let login = self.nick()?;
        let text = self.trailing.unwrap_or_default();

        let mut author = Author::new(login);
        if let Some(display) = self.tag("display-name") {
            author = author.with_display_name(display);
        }

        let mut msg = IncomingMessage::new(channel, author, text);
        msg.id = self.tag("id");
        msg.is_echo = msg.author.login.eq_ignore_ascii_case(bot_nick);
        Some(msg)
    }
}

fn unescape_tag(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Outbound `PRIVMSG` line (CRLF included). Line breaks in `text` become spaces.
pub fn privmsg(channel: &str, text: &str, reply_to: Option<&str>) -> String {
    let channel = channel.trim_start_matches('#');
    let text = text.replace(['\r', '\n'], " ");
    match reply_to {
        Some(id) => format!("@reply-parent-msg-id={id} PRIVMSG #{channel} :{text}\r\n"),
        None => format!("PRIVMSG #{channel} :{text}\r\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVMSG: &str = "@badge-info=;color=#1E90FF;display-name=Cool\\sViewer;id=b34ccfc7-4977-403a-8a94-33c6bac34fb8;mod=0 :coolviewer!coolviewer@coolviewer.tmi.twitch.tv PRIVMSG #Streamer :!DEAD again lol\r\n";

    #[test]
    fn parses_tagged_privmsg() {
        let msg = IrcMessage::parse(PRIVMSG).unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#Streamer"]);
        assert_eq!(msg.trailing, Some("!DEAD again lol"));
        assert_eq!(msg.nick(), Some("coolviewer"));
        assert_eq!(msg.tag("badge-info"), None);
        assert_eq!(msg.tag("display-name").as_deref(), Some("Cool Viewer"));
    }

    #[test]
    fn converts_privmsg_to_incoming() {
        let incoming = IrcMessage::parse(PRIVMSG)
            .unwrap()
            .to_incoming("gusbot")
            .unwrap();
        assert_eq!(incoming.channel, "streamer");
        assert_eq!(incoming.author.login, "coolviewer");
        assert_eq!(incoming.author.mention(), "@Cool Viewer");
        assert_eq!(
            incoming.id.as_deref(),
            Some("b34ccfc7-4977-403a-8a94-33c6bac34fb8")
        );
        assert_eq!(incoming.text, "!DEAD again lol");
        assert!(!incoming.is_echo);
    }

    #[test]
    fn own_privmsg_is_flagged_as_echo() {
        let line = ":GusBot!gusbot@gusbot.tmi.twitch.tv PRIVMSG #streamer :hello";
        let incoming = IrcMessage::parse(line).unwrap().to_incoming("gusbot").unwrap();
        assert!(incoming.is_echo);
    }

    #[test]
    fn parses_ping_and_numeric_replies() {
        let ping = IrcMessage::parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(ping.command, "PING");
        assert_eq!(ping.trailing, Some("tmi.twitch.tv"));
        assert!(ping.to_incoming("gusbot").is_none());

        let welcome = IrcMessage::parse(":tmi.twitch.tv 001 gusbot :Welcome, GLHF!").unwrap();
        assert_eq!(welcome.command, "001");
        assert_eq!(welcome.params, vec!["gusbot"]);
        assert_eq!(welcome.nick(), None);
    }

    #[test]
    fn rejects_empty_and_truncated_lines() {
        assert!(IrcMessage::parse("").is_none());
        assert!(IrcMessage::parse("@a=b").is_none());
        assert!(IrcMessage::parse(":prefix-only").is_none());
    }

    #[test]
    fn formats_privmsg_lines() {
        assert_eq!(
            privmsg("#streamer", "hi\nthere", None),
            "PRIVMSG #streamer :hi there\r\n"
        );
        assert_eq!(
            privmsg("streamer", "yo", Some("abc-123")),
            "@reply-parent-msg-id=abc-123 PRIVMSG #streamer :yo\r\n"
        );
    }
}
