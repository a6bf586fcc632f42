use core::time::Duration;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{GameError, Result};

/// Charges granted per kind at session start. Charges only ever go down.
pub const STARTING_CHARGES: u8 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    RevealArea,
    TimeFreeze,
    SafetyNet,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [Self::RevealArea, Self::TimeFreeze, Self::SafetyNet];

    /// Effect window length; `None` for instantaneous effects.
    pub const fn duration(self) -> Option<Duration> {
        match self {
            Self::RevealArea => None,
            Self::TimeFreeze => Some(Duration::from_secs(5)),
            Self::SafetyNet => Some(Duration::from_secs(10)),
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Charge pool and effect window for one power-up kind. The window is a
/// plain timestamp compared against the session clock, never a callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpState {
    charges: u8,
    active_until: Option<Duration>,
}

impl Default for PowerUpState {
    fn default() -> Self {
        Self {
            charges: STARTING_CHARGES,
            active_until: None,
        }
    }
}

impl PowerUpState {
    pub const fn charges(&self) -> u8 {
        self.charges
    }

    fn is_active(&self, now: Duration) -> bool {
        matches!(self.active_until, Some(until) if now < until)
    }
}

/// Arbitrates charges and effect windows for the three power-up kinds.
///
/// The controller holds no knowledge of what the effects do: the session
/// reads TimeFreeze for its timer-advance step and threads SafetyNet into
/// the reveal engine as the shield flag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpController {
    slots: [PowerUpState; 3],
}

impl PowerUpController {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn charges(&self, kind: PowerUpKind) -> u8 {
        self.slots[kind.slot()].charges
    }

    /// Pure query: true iff the kind's effect window is open at `now`.
    pub fn is_active(&self, kind: PowerUpKind, now: Duration) -> bool {
        self.slots[kind.slot()].is_active(now)
    }

    /// Spends a charge and, for timed kinds, opens the effect window.
    /// Kinds never stack with themselves; different kinds may overlap.
    pub fn activate(&mut self, kind: PowerUpKind, now: Duration) -> Result<()> {
        let state = &mut self.slots[kind.slot()];
        if state.charges == 0 {
            return Err(GameError::NoCharge);
        }
        if state.is_active(now) {
            return Err(GameError::AlreadyActive);
        }
        state.charges -= 1;
        if let Some(window) = kind.duration() {
            state.active_until = Some(now + window);
        }
        log::debug!("activated {:?}, {} charges left", kind, state.charges);
        Ok(())
    }

    /// Closes expired windows, reporting each kind exactly once; after the
    /// report the slot is idle again.
    pub fn tick(&mut self, now: Duration) -> SmallVec<[PowerUpKind; 3]> {
        let mut expired = SmallVec::new();
        for kind in PowerUpKind::ALL {
            let state = &mut self.slots[kind.slot()];
            if let Some(until) = state.active_until {
                if now >= until {
                    state.active_until = None;
                    expired.push(kind);
                    log::debug!("{:?} expired", kind);
                }
            }
        }
        expired
    }
}
