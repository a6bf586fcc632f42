use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Gap after which a chain of reveals no longer counts as consecutive.
pub const COMBO_WINDOW: Duration = Duration::from_secs(1);

/// Combo values that yield a milestone when the counter lands on them.
pub const COMBO_MILESTONES: [u32; 3] = [10, 25, 50];

/// Live combo counter rewarding rapid successive reveals. Fed once per
/// revealed cell, so flood fills and chords pump the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboTracker {
    current: u32,
    best: u32,
    last_reveal: Option<Duration>,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Highest combo reached this session.
    pub const fn best(&self) -> u32 {
        self.best
    }

    /// Called once per revealed cell. Returns the milestone value when the
    /// counter lands exactly on one.
    pub fn on_reveal(&mut self, now: Duration) -> Option<u32> {
        self.current = match self.last_reveal {
            Some(last) if now.saturating_sub(last) <= COMBO_WINDOW => self.current + 1,
            _ => 1,
        };
        self.last_reveal = Some(now);
        self.best = self.best.max(self.current);
        COMBO_MILESTONES
            .contains(&self.current)
            .then_some(self.current)
    }

    /// Frame-driven decay: a full quiet window clears the live counter.
    pub fn on_idle_tick(&mut self, now: Duration) {
        if self.current == 0 {
            return;
        }
        if let Some(last) = self.last_reveal {
            if now.saturating_sub(last) > COMBO_WINDOW {
                log::trace!("combo of {} decayed", self.current);
                self.current = 0;
            }
        }
    }
}
