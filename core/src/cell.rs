use serde::{Deserialize, Serialize};

/// Player-visible state of a single grid cell.
///
/// A revealed cell always carries its adjacent-mine count and is never a
/// mine; the one mine that ends a lost game is tracked by the engine as
/// `triggered_mine` instead of being encoded here.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Hidden,
    Revealed(u8),
    Flagged,
}

impl Cell {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }

    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Hidden
    }
}
