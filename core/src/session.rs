use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

/// The three fixed board presets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn config(self) -> GameConfig {
        match self {
            Self::Easy => GameConfig::new_unchecked((8, 8), 10),
            Self::Medium => GameConfig::new_unchecked((15, 15), 35),
            Self::Hard => GameConfig::new_unchecked((20, 20), 80),
        }
    }
}

/// One game from construction to win or loss. Owns every per-game moving
/// part (board, power-up windows, combo chain, timers); a restart replaces
/// the session wholesale instead of resetting it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    difficulty: Difficulty,
    engine: RevealEngine,
    power_ups: PowerUpController,
    combo: ComboTracker,
    /// Monotonic session clock; the power-up and combo timeline.
    clock: Duration,
    /// Play timer shown to the player. Pauses before the first reveal and
    /// while a TimeFreeze window is open.
    elapsed: Duration,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            engine: RevealEngine::new(difficulty.config(), seed),
            power_ups: PowerUpController::new(),
            combo: ComboTracker::new(),
            clock: Duration::ZERO,
            elapsed: Duration::ZERO,
            events: Vec::new(),
        }
    }

    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn status(&self) -> GameStatus {
        self.engine.status()
    }

    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn engine(&self) -> &RevealEngine {
        &self.engine
    }

    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub const fn power_up_charges(&self, kind: PowerUpKind) -> u8 {
        self.power_ups.charges(kind)
    }

    pub fn power_up_active(&self, kind: PowerUpKind) -> bool {
        self.power_ups.is_active(kind, self.clock)
    }

    /// Advances every timer by one frame delta. Runs once per host frame,
    /// before that frame's input actions are applied.
    pub fn tick(&mut self, delta: Duration) {
        self.clock += delta;
        for kind in self.power_ups.tick(self.clock) {
            self.events.push(GameEvent::PowerUpExpired(kind));
        }
        self.combo.on_idle_tick(self.clock);
        if self.status() == GameStatus::Active && !self.power_up_active(PowerUpKind::TimeFreeze) {
            self.elapsed += delta;
        }
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let shielded = self.power_up_active(PowerUpKind::SafetyNet);
        let was_ready = self.status() == GameStatus::Ready;
        let outcome = self.engine.reveal(coords, shielded)?;
        self.settle_reveal(was_ready, outcome);
        Ok(outcome)
    }

    pub fn chord(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let shielded = self.power_up_active(PowerUpKind::SafetyNet);
        let was_ready = self.status() == GameStatus::Ready;
        let outcome = self.engine.chord(coords, shielded)?;
        self.settle_reveal(was_ready, outcome);
        Ok(outcome)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        self.engine.toggle_flag(coords)
    }

    /// Spends a charge and applies the effect. `target` is the current
    /// selection, consumed by RevealArea only; it is validated before the
    /// charge is committed.
    pub fn activate_power_up(&mut self, kind: PowerUpKind, target: Coord2) -> Result<RevealOutcome> {
        if self.status().is_finished() {
            return Err(GameError::AlreadyEnded);
        }
        if kind == PowerUpKind::RevealArea {
            self.engine.validate_coords(target)?;
        }
        self.power_ups.activate(kind, self.clock)?;
        self.events.push(GameEvent::PowerUpActivated(kind));

        if kind == PowerUpKind::RevealArea {
            let was_ready = self.status() == GameStatus::Ready;
            let outcome = self.engine.reveal_area(target)?;
            self.settle_reveal(was_ready, outcome);
            Ok(outcome)
        } else {
            Ok(RevealOutcome::NoChange)
        }
    }

    /// Hands the buffered events to the caller, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        core::mem::take(&mut self.events)
    }

    /// Event and combo bookkeeping shared by every reveal-shaped action.
    fn settle_reveal(&mut self, was_ready: bool, outcome: RevealOutcome) {
        if was_ready && self.status() != GameStatus::Ready {
            self.events.push(GameEvent::GameStarted);
        }
        for &coords in self.engine.newly_revealed() {
            self.events.push(GameEvent::CellRevealed(coords));
            if let Some(milestone) = self.combo.on_reveal(self.clock) {
                self.events.push(GameEvent::ComboMilestone(milestone));
            }
        }
        match outcome {
            RevealOutcome::Won => {
                self.events.push(GameEvent::GameWon {
                    difficulty: self.difficulty,
                    elapsed: self.elapsed,
                    misflagged: self.engine.misflag_count(),
                });
            }
            RevealOutcome::HitMine => {
                let triggered = self
                    .engine
                    .triggered_mine()
                    .expect("a lost game records its triggered mine");
                self.events.push(GameEvent::GameLost { triggered });
            }
            _ => {}
        }
    }
}
