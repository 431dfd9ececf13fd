use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::IncomingMessage,
    messaging::port::{ChatCapabilities, ChatPort},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between any two outbound messages.
    pub global_min_interval: Duration,
    /// Minimum spacing between messages to the same channel.
    pub per_channel_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        // Twitch allows 20 messages / 30s for a non-moderator account.
        Self {
            global_min_interval: Duration::from_millis(1500),
            per_channel_min_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return how long to wait before using it.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// `ChatPort` decorator that spaces outbound messages.
pub struct ThrottledChat {
    inner: Arc<dyn ChatPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_channel: Mutex<HashMap<String, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledChat {
    pub fn new(inner: Arc<dyn ChatPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_channel: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_channel(&self, channel: &str) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_channel.lock().await;
        map.entry(channel.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_channel_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle(&self, channel: &str) {
        let global_wait = { self.global.lock().await.reserve() };
        let channel_wait = {
            let lim = self.limiter_for_channel(channel).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(channel_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl ChatPort for ThrottledChat {
    fn capabilities(&self) -> ChatCapabilities {
        self.inner.capabilities()
    }

    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        self.throttle(channel).await;
        self.inner.send(channel, text).await
    }

    async fn reply(&self, to: &IncomingMessage, text: &str) -> Result<()> {
        self.throttle(&to.channel).await;
        self.inner.reply(to, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingChat;

    #[tokio::test(start_paused = true)]
    async fn spaces_messages_to_the_same_channel() {
        let rec = Arc::new(RecordingChat::default());
        let chat = ThrottledChat::new(
            rec.clone(),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(10),
                per_channel_min_interval: Duration::from_secs(1),
            },
        );

        let start = Instant::now();
        chat.send("chan", "one").await.unwrap();
        chat.send("chan", "two").await.unwrap();
        chat.send("chan", "three").await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(rec.texts(), vec!["one", "two", "three"]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_message_is_not_delayed() {
        let rec = Arc::new(RecordingChat::default());
        let chat = ThrottledChat::new(rec.clone(), ThrottleConfig::default());

        let start = Instant::now();
        chat.send("chan", "hi").await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(1));
    }
}
