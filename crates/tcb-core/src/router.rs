//! Command router: normalization, registry and dispatch.
//!
//! Inbound flow: self-filter -> session log -> normalize -> registry lookup ->
//! handler. Handler errors stop at [`Router::handle`] and never reach the
//! transport loop.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    domain::IncomingMessage,
    errors::Error,
    formatting::split_for_chat,
    messaging::port::ChatPort,
    ports::{CompletionPort, MusicPort, WeatherPort},
    state::SessionState,
    store::CounterStore,
    utils::SessionLog,
    Result,
};

// ============== Normalization ==============

/// A message resolved to a command name plus its argument text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Lowercase command or alias name, without the prefix.
    pub command: String,
    /// Remaining text, original casing, trimmed.
    pub args: String,
}

impl Invocation {
    pub fn new(command: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: args.into(),
        }
    }
}

/// Commands that free-form chat can be rewritten into.
pub const GREETING_COMMAND: &str = "hello";
pub const MENTION_COMMAND: &str = "ai";
pub const ALERT_COMMAND: &str = "alert";

/// Inputs to [`normalize`], derived from config once.
#[derive(Clone, Debug)]
pub struct NormalizeRules {
    pub prefix: String,
    pub greetings: Vec<String>,
    pub alert_hashtag: String,
    pub bot_nick: String,
}

impl NormalizeRules {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            prefix: cfg.command_prefix.clone(),
            greetings: cfg.greeting_words.clone(),
            alert_hashtag: cfg.alert_hashtag.to_lowercase(),
            bot_nick: cfg.twitch_nick.to_lowercase(),
        }
    }
}

/// Turn raw chat text into an invocation, if it denotes one.
///
/// Checked in order: greeting word, `@bot` mention, alert hashtag, prefixed
/// command. Only the first whitespace-delimited token is inspected.
pub fn normalize(raw: &str, rules: &NormalizeRules) -> Option<Invocation> {
    let text = raw.trim();
    let (first, rest) = split_first_token(text);
    if first.is_empty() {
        return None;
    }
    let first_lower = first.to_lowercase();
    let bare = first_lower.trim_end_matches(|c: char| matches!(c, ',' | '.' | '!' | '?' | ':'));

    if rules.greetings.iter().any(|g| g == bare) {
        return Some(Invocation::new(GREETING_COMMAND, text));
    }

    if !rules.bot_nick.is_empty() && bare.strip_prefix('@') == Some(rules.bot_nick.as_str()) {
        return Some(Invocation::new(MENTION_COMMAND, rest));
    }

    if !rules.alert_hashtag.is_empty() && bare == rules.alert_hashtag {
        return Some(Invocation::new(ALERT_COMMAND, rest));
    }

    let name = first_lower.strip_prefix(rules.prefix.as_str())?;
    if name.is_empty() {
        return None;
    }
    Some(Invocation::new(name, rest))
}

fn split_first_token(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (text, ""),
    }
}

// ============== Handlers + Registry ==============

/// External collaborators a handler may call. Each one is optional.
#[derive(Clone, Default)]
pub struct Services {
    pub completion: Option<Arc<dyn CompletionPort>>,
    pub weather: Option<Arc<dyn WeatherPort>>,
    pub music: Option<Arc<dyn MusicPort>>,
}

/// Everything a handler sees for one invocation.
pub struct CommandContext<'a> {
    pub message: &'a IncomingMessage,
    pub invocation: &'a Invocation,
    pub chat: &'a dyn ChatPort,
    pub services: &'a Services,
    pub config: &'a Config,
    pub state: &'a mut SessionState,
    pub store: &'a CounterStore,
    pub registry: &'a CommandRegistry,
}

impl CommandContext<'_> {
    pub fn args(&self) -> &str {
        &self.invocation.args
    }

    /// `@channel`, the streamer the message was sent to.
    pub fn channel_mention(&self) -> String {
        format!("@{}", self.message.channel)
    }

    /// Reply to the invoking message. Text over the transport ceiling goes out
    /// as several `(i/N)` chunks.
    pub async fn reply(&self, text: &str) -> Result<()> {
        for chunk in self.split(text) {
            self.chat.reply(self.message, &chunk).await?;
        }
        Ok(())
    }

    /// Post to the channel, chunked like [`CommandContext::reply`].
    pub async fn send(&self, text: &str) -> Result<()> {
        for chunk in self.split(text) {
            self.chat.send(&self.message.channel, &chunk).await?;
        }
        Ok(())
    }

    fn split(&self, text: &str) -> Vec<String> {
        let ceiling = self.chat.capabilities().max_message_len;
        split_for_chat(text, ceiling, self.config.reply_soft_limit)
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()>;
}

pub struct RegisteredCommand {
    pub name: String,
    pub aliases: Vec<String>,
    handler: Arc<dyn CommandHandler>,
}

/// Append-only table of commands, with an index over names and aliases.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<RegisteredCommand>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. Names and aliases are case-insensitive and must be unique.
    pub fn register(
        &mut self,
        name: &str,
        aliases: &[&str],
        handler: impl CommandHandler + 'static,
    ) -> Result<()> {
        let name = name.trim().to_lowercase();
        let aliases: Vec<String> = aliases.iter().map(|a| a.trim().to_lowercase()).collect();

        for key in std::iter::once(&name).chain(aliases.iter()) {
            if key.is_empty() || key.chars().any(char::is_whitespace) {
                return Err(Error::Registry(format!("invalid command name {key:?}")));
            }
            if self.index.contains_key(key) {
                return Err(Error::Registry(format!("command {key:?} registered twice")));
            }
        }
        if let Some(dup) = aliases
            .iter()
            .enumerate()
            .find(|(i, a)| **a == name || aliases[..*i].contains(*a))
        {
            return Err(Error::Registry(format!(
                "command {:?} registered twice",
                dup.1
            )));
        }

        let slot = self.commands.len();
        self.index.insert(name.clone(), slot);
        for alias in &aliases {
            self.index.insert(alias.clone(), slot);
        }
        self.commands.push(RegisteredCommand {
            name,
            aliases,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<&RegisteredCommand> {
        let slot = self.index.get(&name.to_lowercase())?;
        self.commands.get(*slot)
    }

    /// Primary names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// ============== Router ==============

#[derive(Debug)]
pub enum DispatchOutcome {
    /// Sent by the bot itself; dropped before anything else.
    SelfMessage,
    NotACommand,
    UnknownCommand { command: String },
    Handled { command: String },
    Failed { command: String, error: Error },
}

/// Owns the session state and runs one handler per inbound message.
pub struct Router {
    config: Arc<Config>,
    rules: NormalizeRules,
    registry: CommandRegistry,
    chat: Arc<dyn ChatPort>,
    services: Services,
    store: CounterStore,
    state: SessionState,
    session_log: Option<SessionLog>,
}

impl Router {
    pub fn new(
        config: Arc<Config>,
        registry: CommandRegistry,
        chat: Arc<dyn ChatPort>,
        services: Services,
        store: CounterStore,
        state: SessionState,
    ) -> Self {
        Self {
            rules: NormalizeRules::from_config(&config),
            config,
            registry,
            chat,
            services,
            store,
            state,
            session_log: None,
        }
    }

    pub fn with_session_log(mut self, log: SessionLog) -> Self {
        self.session_log = Some(log);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    fn is_self(&self, msg: &IncomingMessage) -> bool {
        msg.is_echo || msg.author.login.eq_ignore_ascii_case(&self.rules.bot_nick)
    }

    /// Process one inbound message to completion.
    pub async fn handle(&mut self, msg: &IncomingMessage) -> DispatchOutcome {
        if self.is_self(msg) {
            return DispatchOutcome::SelfMessage;
        }

        if let Some(log) = &self.session_log {
            if let Err(e) = log.append(&msg.author.login, &msg.text) {
                tracing::warn!("session log write failed: {e}");
            }
        }

        let Some(invocation) = normalize(&msg.text, &self.rules) else {
            return DispatchOutcome::NotACommand;
        };

        let Some(command) = self.registry.resolve(&invocation.command) else {
            tracing::debug!(command = %invocation.command, "unknown command");
            return DispatchOutcome::UnknownCommand {
                command: invocation.command,
            };
        };
        let name = command.name.clone();
        let handler = Arc::clone(&command.handler);

        tracing::info!(
            command = %name,
            user = %msg.author.login,
            channel = %msg.channel,
            "dispatching"
        );

        let mut ctx = CommandContext {
            message: msg,
            invocation: &invocation,
            chat: self.chat.as_ref(),
            services: &self.services,
            config: &self.config,
            state: &mut self.state,
            store: &self.store,
            registry: &self.registry,
        };

        match handler.handle(&mut ctx).await {
            Ok(()) => DispatchOutcome::Handled { command: name },
            Err(error) => {
                tracing::error!(command = %name, "command failed: {error}");
                DispatchOutcome::Failed {
                    command: name,
                    error,
                }
            }
        }
    }

    /// Consume inbound messages one at a time until `cancel` fires or every
    /// sender is gone. Meant to own a task of its own; transports only forward
    /// messages into `inbound`.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<IncomingMessage>,
        cancel: CancellationToken,
    ) {
        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                msg = inbound.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };
            if let DispatchOutcome::Handled { command } = self.handle(&msg).await {
                tracing::debug!(%command, "command handled");
            }
        }
        tracing::info!("router stopped");
    }
}
