/// Chat user who authored a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    /// Lowercase login name.
    pub login: String,
    pub display_name: String,
}

impl Author {
    pub fn new(login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            display_name: login.clone(),
            login: login.to_lowercase(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        if !display_name.trim().is_empty() {
            self.display_name = display_name;
        }
        self
    }

    /// `@DisplayName`, the way chat highlights a user.
    pub fn mention(&self) -> String {
        format!("@{}", self.display_name)
    }
}

/// Inbound chat message, as delivered by the transport.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    /// Transport message id (used for threaded replies when available).
    pub id: Option<String>,
    /// Channel login, lowercase without `#`.
    pub channel: String,
    pub author: Author,
    pub text: String,
    /// True when the transport knows the bot itself sent this message.
    pub is_echo: bool,
}

impl IncomingMessage {
    pub fn new(channel: impl Into<String>, author: Author, text: impl Into<String>) -> Self {
        Self {
            id: None,
            channel: channel.into(),
            author,
            text: text.into(),
            is_echo: false,
        }
    }
}
