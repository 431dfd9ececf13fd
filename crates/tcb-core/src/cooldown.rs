use std::time::Instant;

/// Outcome of a raffle attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Fired,
    CoolingDown { remaining_minutes: u64 },
}

/// Cooldown gate for the raffle trigger.
///
/// Idle until the first trigger, then cooling down for `cooldown_minutes`.
/// Elapsed time is counted in whole minutes (floored). A rejected attempt does
/// not move the timer.
#[derive(Clone, Debug)]
pub struct RaffleGate {
    cooldown_minutes: u64,
    last_triggered_at: Option<Instant>,
}

impl RaffleGate {
    pub fn new(cooldown_minutes: u64) -> Self {
        Self {
            cooldown_minutes,
            last_triggered_at: None,
        }
    }

    pub fn cooldown_minutes(&self) -> u64 {
        self.cooldown_minutes
    }

    pub fn is_active(&self) -> bool {
        self.last_triggered_at.is_some()
    }

    pub fn try_trigger(&mut self) -> GateDecision {
        self.try_trigger_at(Instant::now())
    }

    pub fn try_trigger_at(&mut self, now: Instant) -> GateDecision {
        if let Some(last) = self.last_triggered_at {
            let elapsed_minutes = now.saturating_duration_since(last).as_secs() / 60;
            if elapsed_minutes < self.cooldown_minutes {
                return GateDecision::CoolingDown {
                    remaining_minutes: self.cooldown_minutes - elapsed_minutes,
                };
            }
        }

        self.last_triggered_at = Some(now);
        GateDecision::Fired
    }
}
