use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Difficulty, GameEvent, ProgressSnapshot};
use core::time::Duration;

/// Wins faster than this unlock [`AchievementId::SpeedDemon`].
pub const SPEED_DEMON_LIMIT: Duration = Duration::from_secs(30);

/// Combo value that unlocks [`AchievementId::ComboMaster`].
pub const COMBO_MASTER_TARGET: u32 = 10;

/// Distinct themes that exist; trying them all unlocks
/// [`AchievementId::ThemeExplorer`].
pub const THEME_UNIVERSE: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AchievementId {
    FirstWin,
    SpeedDemon,
    ComboMaster,
    Perfectionist,
    ThemeExplorer,
    HardVictory,
}

impl AchievementId {
    pub const ALL: [AchievementId; 6] = [
        Self::FirstWin,
        Self::SpeedDemon,
        Self::ComboMaster,
        Self::Perfectionist,
        Self::ThemeExplorer,
        Self::HardVictory,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::FirstWin => "First Victory",
            Self::SpeedDemon => "Speed Demon",
            Self::ComboMaster => "Combo Master",
            Self::Perfectionist => "Perfectionist",
            Self::ThemeExplorer => "Theme Explorer",
            Self::HardVictory => "Expert",
        }
    }

    pub const fn blurb(self) -> &'static str {
        match self {
            Self::FirstWin => "Win your first game",
            Self::SpeedDemon => "Win in under 30 seconds",
            Self::ComboMaster => "Get a 10x combo",
            Self::Perfectionist => "Win without misplacing any flags",
            Self::ThemeExplorer => "Try all themes",
            Self::HardVictory => "Win on hard difficulty",
        }
    }

    /// Pure qualification predicate over one event plus the persisted state.
    fn qualifies(self, event: &GameEvent, snapshot: &ProgressSnapshot) -> bool {
        use GameEvent::*;
        match (self, event) {
            (Self::FirstWin, GameWon { .. }) => true,
            (Self::SpeedDemon, GameWon { elapsed, .. }) => *elapsed < SPEED_DEMON_LIMIT,
            (Self::Perfectionist, GameWon { misflagged, .. }) => *misflagged == 0,
            (Self::HardVictory, GameWon { difficulty, .. }) => *difficulty == Difficulty::Hard,
            (Self::ComboMaster, ComboMilestone(value)) => *value >= COMBO_MASTER_TARGET,
            (Self::ThemeExplorer, ThemeChanged(_)) => snapshot.themes_tried.len() >= THEME_UNIVERSE,
            _ => false,
        }
    }
}

/// Per-achievement record carried in the persisted profile. Once unlocked
/// it stays unlocked.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Runs the fixed evaluator set against each observed event and flips
/// records in the snapshot. Re-observing an unlocked achievement is a no-op.
#[derive(Clone, Debug, Default)]
pub struct AchievementEngine {
    dirty: bool,
}

impl AchievementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an unlock is waiting for the next persistence flush.
    pub const fn needs_flush(&self) -> bool {
        self.dirty
    }

    pub fn mark_flushed(&mut self) {
        self.dirty = false;
    }

    /// Evaluates every achievement against `event`, unlocking the ones that
    /// qualify. Returns the freshly unlocked ids, in declaration order.
    pub fn observe(
        &mut self,
        event: &GameEvent,
        snapshot: &mut ProgressSnapshot,
    ) -> SmallVec<[AchievementId; 2]> {
        let mut unlocked = SmallVec::new();
        for id in AchievementId::ALL {
            if snapshot.achievement(id).unlocked {
                continue;
            }
            if id.qualifies(event, snapshot) {
                snapshot.unlock(id, Utc::now());
                self.dirty = true;
                unlocked.push(id);
                log::debug!("achievement unlocked: {}", id.title());
            }
        }
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn won(difficulty: Difficulty, elapsed_secs: u64, misflagged: u16) -> GameEvent {
        GameEvent::GameWon {
            difficulty,
            elapsed: Duration::from_secs(elapsed_secs),
            misflagged,
        }
    }

    #[test]
    fn a_clean_fast_win_unlocks_the_win_family() {
        let mut engine = AchievementEngine::new();
        let mut snapshot = ProgressSnapshot::default();

        let unlocked = engine.observe(&won(Difficulty::Easy, 12, 0), &mut snapshot);

        assert_eq!(
            unlocked.as_slice(),
            [
                AchievementId::FirstWin,
                AchievementId::SpeedDemon,
                AchievementId::Perfectionist,
            ]
        );
        assert!(engine.needs_flush());
        assert!(!snapshot.achievement(AchievementId::HardVictory).unlocked);
    }

    #[test]
    fn a_slow_sloppy_hard_win_unlocks_differently() {
        let mut engine = AchievementEngine::new();
        let mut snapshot = ProgressSnapshot::default();

        let unlocked = engine.observe(&won(Difficulty::Hard, 300, 2), &mut snapshot);

        assert_eq!(
            unlocked.as_slice(),
            [AchievementId::FirstWin, AchievementId::HardVictory]
        );
    }

    #[test]
    fn unlocks_are_idempotent_and_permanent() {
        let mut engine = AchievementEngine::new();
        let mut snapshot = ProgressSnapshot::default();

        engine.observe(&won(Difficulty::Easy, 12, 0), &mut snapshot);
        let first_stamp = snapshot
            .achievement(AchievementId::FirstWin)
            .unlocked_at
            .unwrap();

        let again = engine.observe(&won(Difficulty::Easy, 5, 0), &mut snapshot);
        assert!(again.is_empty());
        assert_eq!(
            snapshot.achievement(AchievementId::FirstWin).unlocked_at,
            Some(first_stamp)
        );
    }

    #[test]
    fn combo_master_listens_to_milestones_only() {
        let mut engine = AchievementEngine::new();
        let mut snapshot = ProgressSnapshot::default();

        assert!(engine
            .observe(&GameEvent::ComboMilestone(10), &mut snapshot)
            .contains(&AchievementId::ComboMaster));
        assert!(snapshot.achievement(AchievementId::ComboMaster).unlocked);
    }

    #[test]
    fn theme_explorer_needs_the_whole_universe() {
        let mut engine = AchievementEngine::new();
        let mut snapshot = ProgressSnapshot::default();

        for theme in 0..2u8 {
            snapshot.themes_tried.insert(theme);
            let unlocked = engine.observe(&GameEvent::ThemeChanged(theme), &mut snapshot);
            assert!(unlocked.is_empty());
        }

        snapshot.themes_tried.insert(2);
        let unlocked = engine.observe(&GameEvent::ThemeChanged(2), &mut snapshot);
        assert_eq!(unlocked.as_slice(), [AchievementId::ThemeExplorer]);
    }

    #[test]
    fn losses_and_reveals_unlock_nothing() {
        let mut engine = AchievementEngine::new();
        let mut snapshot = ProgressSnapshot::default();

        engine.observe(&GameEvent::GameLost { triggered: (1, 1) }, &mut snapshot);
        engine.observe(&GameEvent::CellRevealed((0, 0)), &mut snapshot);
        engine.observe(&GameEvent::ComboMilestone(5), &mut snapshot);

        assert!(!engine.needs_flush());
        assert!(AchievementId::ALL
            .iter()
            .all(|&id| !snapshot.achievement(id).unlocked));
    }
}
