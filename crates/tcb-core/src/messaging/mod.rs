//! Outbound chat abstractions (Twitch today, anything line-based later).

pub mod port;
pub mod throttled;
