use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::{AchievementId, CellCount, Coord2, Difficulty, PowerUpKind};

/// Opaque theme identity owned by the renderer; the engine only forwards it
/// as an achievement trigger.
pub type ThemeId = u8;

/// State transitions surfaced to the host (renderer, audio, achievement UI)
/// and consumed internally by the achievement evaluators. Buffered in order
/// and drained once per frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    CellRevealed(Coord2),
    GameStarted,
    GameWon {
        difficulty: Difficulty,
        elapsed: Duration,
        misflagged: CellCount,
    },
    GameLost {
        triggered: Coord2,
    },
    ComboMilestone(u32),
    PowerUpActivated(PowerUpKind),
    PowerUpExpired(PowerUpKind),
    ThemeChanged(ThemeId),
    DifficultySelected(Difficulty),
    AchievementUnlocked(AchievementId),
}
