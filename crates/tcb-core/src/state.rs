use std::collections::HashMap;

use crate::{
    cooldown::RaffleGate,
    store::{CounterRecord, CounterStore, Stat},
    Result,
};

/// Session and lifetime values after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tally {
    pub session: u64,
    pub lifetime: u64,
}

/// In-memory state for one bot run.
///
/// Owned by the router and lent to handlers one at a time.
#[derive(Debug)]
pub struct SessionState {
    session: HashMap<Stat, u64>,
    lifetime: CounterRecord,
    pub raffle: RaffleGate,
}

impl SessionState {
    /// Fresh session counters on top of the lifetime values loaded at startup.
    pub fn new(lifetime: CounterRecord, raffle_cooldown_minutes: u64) -> Self {
        Self {
            session: HashMap::new(),
            lifetime,
            raffle: RaffleGate::new(raffle_cooldown_minutes),
        }
    }

    pub fn session(&self, stat: Stat) -> u64 {
        self.session.get(&stat).copied().unwrap_or(0)
    }

    pub fn lifetime(&self, stat: Stat) -> u64 {
        self.lifetime.get(stat)
    }

    /// Count one occurrence of `stat`.
    ///
    /// The lifetime value is written through to the store first; the session
    /// tally only moves once that write succeeded.
    pub fn record_event(&mut self, store: &CounterStore, stat: Stat) -> Result<Tally> {
        let lifetime = store.increment(stat, 1)?;
        self.lifetime.set(stat, lifetime);

        let session = self.session.entry(stat).or_insert(0);
        *session += 1;
        let session = *session;

        store.write_companion(stat, session);
        tracing::debug!(stat = stat.key(), session, lifetime, "recorded event");
        Ok(Tally { session, lifetime })
    }

    /// Reset the session tally for `stat`. Lifetime values are untouched.
    pub fn clear_session(&mut self, store: &CounterStore, stat: Stat) {
        self.session.insert(stat, 0);
        store.write_companion(stat, 0);
    }

    /// Overwrite a record-style stat (e.g. a personal best) and persist it.
    pub fn set_lifetime(&mut self, store: &CounterStore, stat: Stat, value: u64) -> Result<()> {
        store.set(stat, value)?;
        self.lifetime.set(stat, value);
        Ok(())
    }
}
