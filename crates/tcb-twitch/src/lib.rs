//! Twitch chat adapter (IRC over TCP).
//!
//! Implements the `tcb-core` `ChatPort` and drives the core router from the
//! chat connection.

pub mod chat;
pub mod connection;
pub mod irc;

pub use chat::TwitchChat;
pub use connection::{TwitchConnection, TwitchLogin};
