//! Core domain + application logic for the Twitch chat bot.
//!
//! This crate is framework-agnostic. Twitch / OpenAI / Spotify / Discord live
//! behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod cooldown;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod notifier;
pub mod overlay;
pub mod ports;
pub mod router;
pub mod routines;
pub mod state;
pub mod store;
pub mod utils;
pub mod weather;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
