use core::ops::BitOr;
use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::*;

/// Lifecycle of a single board. `Ready` and `Active` are both in-progress
/// phases: `Ready` means the opening reveal has not happened yet, so mines
/// are not placed. The status only ever moves forward into `Won` or `Lost`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Ready,
    Active,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub const fn in_progress(self) -> bool {
        !self.is_finished()
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Ready
    }
}

/// Outcome of a flag toggle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Outcome of a reveal-shaped operation. `Shielded` is a mine hit absorbed
/// by an open Safety-Net window: the cell stays hidden and play continues.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Shielded,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Merges per-cell outcomes when an operation touches several cells.
impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (HitMine, _) | (_, HitMine) => HitMine,
            (Won, _) | (_, Won) => Won,
            (Revealed, _) | (_, Revealed) => Revealed,
            (Shielded, _) | (_, Shielded) => Shielded,
            (NoChange, NoChange) => NoChange,
        }
    }
}

/// Reveal, flag, and chord operations over a [`Board`].
///
/// Every operation that can open cells records them in order, so the caller
/// can emit per-cell events and feed the combo tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealEngine {
    board: Board,
    grid: Array2<Cell>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    status: GameStatus,
    triggered_mine: Option<Coord2>,
    misflags: CellCount,
    seed: u64,
    #[serde(skip)]
    newly_revealed: Vec<Coord2>,
}

impl RevealEngine {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self::with_board(Board::new(config), seed)
    }

    /// Engine over a pre-built board, placed or not. Tests and replays hand
    /// in fixed layouts this way.
    pub fn with_board(board: Board, seed: u64) -> Self {
        let size = board.size();
        Self {
            board,
            grid: Array2::default(size.to_nd_index()),
            revealed_count: 0,
            flagged_count: 0,
            status: Default::default(),
            triggered_mine: None,
            misflags: 0,
            seed,
            newly_revealed: Vec::new(),
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.board.mine_count()
    }

    pub fn mines_left(&self) -> isize {
        (self.board.mine_count() as isize) - (self.flagged_count as isize)
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.grid[coords.to_nd_index()]
    }

    pub const fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub const fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn has_mine_at(&self, coords: Coord2) -> bool {
        self.board.contains_mine(coords)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        self.board.validate_coords(coords)
    }

    /// Cells opened by the most recent operation, in reveal order.
    pub fn newly_revealed(&self) -> &[Coord2] {
        &self.newly_revealed
    }

    /// How many times a flag has landed on a non-mine cell this game.
    /// Removing the flag later does not take the mistake back.
    pub const fn misflag_count(&self) -> CellCount {
        self.misflags
    }

    /// Reveals one cell. The first reveal of the game places the mines,
    /// keeping the clicked neighborhood safe. `shielded` is the Safety-Net
    /// flag: with it set, hitting a mine is a safe no-op instead of a loss.
    pub fn reveal(&mut self, coords: Coord2, shielded: bool) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        self.check_not_finished()?;
        self.newly_revealed.clear();
        self.ensure_mines(coords)?;
        Ok(self.reveal_single(coords, shielded))
    }

    /// Reveals the remaining hidden, non-flagged neighbors of a revealed
    /// numbered cell whose flagged-neighbor count matches its number. A
    /// mismatched count is a strict no-op. An unflagged mine neighbor loses
    /// the game (unless shielded) and stops the sweep.
    pub fn chord(&mut self, coords: Coord2, shielded: bool) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        self.check_not_finished()?;
        self.newly_revealed.clear();

        let Cell::Revealed(count) = self.grid[coords.to_nd_index()] else {
            return Ok(RevealOutcome::NoChange);
        };
        if count == 0 || count != self.count_flagged_neighbors(coords) {
            return Ok(RevealOutcome::NoChange);
        }

        let bounds = self.board.size();
        let mut outcome = RevealOutcome::NoChange;
        for pos in neighbors(coords, bounds) {
            outcome = outcome | self.reveal_single(pos, shielded);
            if outcome == RevealOutcome::HitMine {
                break;
            }
        }
        Ok(outcome)
    }

    /// Flips a cell between hidden and flagged. Revealed cells are left alone.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use MarkOutcome::*;

        let coords = self.board.validate_coords(coords)?;
        self.check_not_finished()?;

        Ok(match self.grid[coords.to_nd_index()] {
            Cell::Hidden => {
                self.grid[coords.to_nd_index()] = Cell::Flagged;
                self.flagged_count += 1;
                if self.board.mines_placed() && !self.board.contains_mine(coords) {
                    self.misflags += 1;
                }
                Changed
            }
            Cell::Flagged => {
                self.grid[coords.to_nd_index()] = Cell::Hidden;
                self.flagged_count -= 1;
                Changed
            }
            Cell::Revealed(_) => NoChange,
        })
    }

    /// Power-up assisted reveal of the 5x5 block around `center`. Mines in
    /// the block are skipped outright, never revealed and never a loss, so
    /// the operation is safe under any layout. Flags are skipped too.
    pub fn reveal_area(&mut self, center: Coord2) -> Result<RevealOutcome> {
        let center = self.board.validate_coords(center)?;
        self.check_not_finished()?;
        self.newly_revealed.clear();
        self.ensure_mines(center)?;

        let bounds = self.board.size();
        let mut outcome = RevealOutcome::NoChange;
        for pos in block5(center, bounds) {
            if self.board.contains_mine(pos) {
                continue;
            }
            outcome = outcome | self.reveal_single(pos, false);
        }
        Ok(outcome)
    }

    fn ensure_mines(&mut self, first_click: Coord2) -> Result<()> {
        if !self.board.mines_placed() {
            self.board.place_mines(first_click, self.seed)?;
            // Flags planted before the layout existed are judged now.
            let early_misflags: CellCount = self
                .grid
                .indexed_iter()
                .filter(|&((x, y), &cell)| {
                    cell.is_flagged() && !self.board.contains_mine((x as Coord, y as Coord))
                })
                .count()
                .try_into()
                .unwrap();
            self.misflags += early_misflags;
        }
        Ok(())
    }

    fn reveal_single(&mut self, coords: Coord2, shielded: bool) -> RevealOutcome {
        match (self.grid[coords.to_nd_index()], self.board.contains_mine(coords)) {
            (Cell::Hidden, true) if shielded => {
                log::debug!("safety net absorbed a mine hit at {:?}", coords);
                RevealOutcome::Shielded
            }
            (Cell::Hidden, true) => {
                self.triggered_mine = Some(coords);
                self.finish(false);
                RevealOutcome::HitMine
            }
            (Cell::Hidden, false) => {
                self.open_cell(coords);
                if self.revealed_count == self.board.safe_cell_count() {
                    self.finish(true);
                    RevealOutcome::Won
                } else {
                    self.begin();
                    RevealOutcome::Revealed
                }
            }
            _ => RevealOutcome::NoChange,
        }
    }

    /// Opens one safe cell and flood-fills when its count is zero: breadth
    /// expansion through zero-count cells, opening their numbered border
    /// once. Flags block the fill; visited cells are never re-entered.
    fn open_cell(&mut self, coords: Coord2) {
        let count = self.board.adjacent_mine_count(coords);
        self.grid[coords.to_nd_index()] = Cell::Revealed(count);
        self.revealed_count += 1;
        self.newly_revealed.push(coords);
        log::debug!("opened {:?}, mine count: {}", coords, count);

        if count > 0 {
            return;
        }

        let bounds = self.board.size();
        let mut visited: HashSet<Coord2> = HashSet::new();
        visited.insert(coords);
        let mut frontier: VecDeque<Coord2> = neighbors(coords, bounds)
            .filter(|&pos| self.grid[pos.to_nd_index()].is_hidden())
            .collect();

        while let Some(pos) = frontier.pop_front() {
            if !visited.insert(pos) {
                continue;
            }
            if !self.grid[pos.to_nd_index()].is_hidden() {
                continue;
            }

            let pos_count = self.board.adjacent_mine_count(pos);
            self.grid[pos.to_nd_index()] = Cell::Revealed(pos_count);
            self.revealed_count += 1;
            self.newly_revealed.push(pos);
            log::trace!("flood fill opened {:?}, mine count: {}", pos, pos_count);

            if pos_count == 0 {
                frontier.extend(
                    neighbors(pos, bounds)
                        .filter(|&next| self.grid[next.to_nd_index()].is_hidden())
                        .filter(|next| !visited.contains(next)),
                );
            }
        }
    }

    fn begin(&mut self) {
        if matches!(self.status, GameStatus::Ready) {
            self.status = GameStatus::Active;
        }
    }

    fn finish(&mut self, won: bool) {
        if self.status.is_finished() {
            return;
        }
        self.status = if won { GameStatus::Won } else { GameStatus::Lost };
        if won {
            self.triggered_mine = None;
        }
        log::debug!("game over: {:?}", self.status);
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        neighbors(coords, self.board.size())
            .filter(|&pos| self.grid[pos.to_nd_index()].is_flagged())
            .count()
            .try_into()
            .unwrap()
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.status.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(size: Coord2, mines: &[Coord2]) -> RevealEngine {
        RevealEngine::with_board(Board::with_mines(size, mines).unwrap(), 0)
    }

    #[test]
    fn first_reveal_places_mines_away_from_the_click() {
        let mut engine = RevealEngine::new(GameConfig::try_new((8, 8), 10).unwrap(), 42);

        let outcome = engine.reveal((0, 0), false).unwrap();

        assert!(outcome.has_update());
        assert_ne!(outcome, RevealOutcome::HitMine);
        assert!(!engine.has_mine_at((0, 0)));
        assert!(!engine.has_mine_at((1, 1)));
        assert!(engine.cell_at((0, 0)).is_revealed());
    }

    #[test]
    fn reveal_hits_mine_and_records_the_triggered_cell() {
        let mut engine = engine((2, 2), &[(0, 0)]);

        let outcome = engine.reveal((0, 0), false).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(engine.status(), GameStatus::Lost);
        assert_eq!(engine.triggered_mine(), Some((0, 0)));
        assert_eq!(engine.reveal((1, 1), false), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn shielded_reveal_leaves_the_mine_hidden_and_play_open() {
        let mut engine = engine((2, 2), &[(0, 0)]);

        let outcome = engine.reveal((0, 0), true).unwrap();

        assert_eq!(outcome, RevealOutcome::Shielded);
        assert_eq!(engine.status(), GameStatus::Ready);
        assert_eq!(engine.cell_at((0, 0)), Cell::Hidden);
        assert_eq!(engine.triggered_mine(), None);
        assert!(engine.newly_revealed().is_empty());
    }

    #[test]
    fn flood_fill_opens_the_zero_region_and_its_border() {
        let mut engine = engine((4, 4), &[(3, 3)]);

        let outcome = engine.reveal((0, 0), false).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.cell_at((0, 0)), Cell::Revealed(0));
        assert_eq!(engine.cell_at((2, 2)), Cell::Revealed(1));
        assert_eq!(engine.cell_at((3, 3)), Cell::Hidden);
        assert_eq!(engine.newly_revealed().len(), 15);
    }

    #[test]
    fn flood_fill_stops_at_flags() {
        let mut engine = engine((4, 1), &[]);
        // 4x1 strip with no mines: flag in the middle blocks the cascade.
        engine.toggle_flag((2, 0)).unwrap();

        let outcome = engine.reveal((0, 0), false).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(engine.cell_at((1, 0)), Cell::Revealed(0));
        assert_eq!(engine.cell_at((2, 0)), Cell::Flagged);
        assert_eq!(engine.cell_at((3, 0)), Cell::Hidden);
    }

    #[test]
    fn reveal_is_a_noop_on_revealed_and_flagged_cells() {
        let mut engine = engine((3, 3), &[(2, 2)]);
        engine.toggle_flag((2, 1)).unwrap();

        assert_eq!(engine.reveal((2, 1), false).unwrap(), RevealOutcome::NoChange);

        engine.reveal((0, 0), false).unwrap();
        assert!(engine.cell_at((0, 0)).is_revealed());
        assert_eq!(engine.reveal((0, 0), false).unwrap(), RevealOutcome::NoChange);
    }

    #[test]
    fn chord_reveals_remaining_neighbors_when_flags_match() {
        let mut engine = engine((3, 3), &[(0, 1), (2, 1)]);

        engine.reveal((1, 1), false).unwrap();
        engine.toggle_flag((0, 1)).unwrap();
        engine.toggle_flag((2, 1)).unwrap();

        let outcome = engine.chord((1, 1), false).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.cell_at((1, 0)), Cell::Revealed(2));
        assert_eq!(engine.cell_at((1, 2)), Cell::Revealed(2));
    }

    #[test]
    fn chord_with_mismatched_flags_is_a_noop() {
        let mut engine = engine((3, 3), &[(0, 1), (2, 1)]);

        engine.reveal((1, 1), false).unwrap();
        engine.toggle_flag((0, 1)).unwrap();

        assert_eq!(engine.chord((1, 1), false).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.cell_at((1, 0)), Cell::Hidden);
    }

    #[test]
    fn chord_on_a_misflagged_number_loses_the_game() {
        // The flag sits on a safe cell; the real mine is unflagged.
        let mut engine = engine((3, 3), &[(0, 1), (2, 1)]);

        engine.reveal((1, 1), false).unwrap();
        engine.toggle_flag((0, 1)).unwrap();
        engine.toggle_flag((2, 0)).unwrap();

        let outcome = engine.chord((1, 1), false).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(engine.status(), GameStatus::Lost);
    }

    #[test]
    fn chording_twice_changes_nothing_the_second_time() {
        let mut engine = engine((4, 4), &[(0, 0), (2, 0), (3, 3)]);

        engine.reveal((1, 1), false).unwrap();
        engine.toggle_flag((0, 0)).unwrap();
        engine.toggle_flag((2, 0)).unwrap();

        assert!(engine.chord((1, 1), false).unwrap().has_update());
        assert_eq!(engine.status(), GameStatus::Active);
        assert_eq!(engine.chord((1, 1), false).unwrap(), RevealOutcome::NoChange);
    }

    #[test]
    fn toggle_flag_tracks_counts_and_skips_revealed_cells() {
        let mut engine = engine((3, 3), &[(2, 2)]);

        assert_eq!(engine.toggle_flag((0, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.flagged_count(), 1);
        assert_eq!(engine.mines_left(), 0);
        assert_eq!(engine.toggle_flag((0, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.flagged_count(), 0);

        engine.reveal((1, 1), false).unwrap();
        assert_eq!(engine.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
    }

    #[test]
    fn reveal_area_skips_mines_and_never_loses() {
        // The 5x5 block covers the whole board; the four mines are skipped,
        // every safe cell opens, and the game is won rather than lost.
        let mut engine = engine((5, 5), &[(2, 2), (0, 0), (4, 4), (1, 3)]);

        let outcome = engine.reveal_area((2, 2)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.status(), GameStatus::Won);
        assert_eq!(engine.cell_at((2, 2)), Cell::Hidden);
        assert_eq!(engine.cell_at((0, 0)), Cell::Hidden);
        assert_eq!(engine.revealed_count(), 21);
        assert_eq!(engine.triggered_mine(), None);
    }

    #[test]
    fn reveal_area_as_the_opening_action_places_mines_first() {
        let mut engine = RevealEngine::new(GameConfig::try_new((8, 8), 10).unwrap(), 7);

        let outcome = engine.reveal_area((4, 4)).unwrap();

        assert_ne!(outcome, RevealOutcome::HitMine);
        assert!(outcome.has_update());
        assert!(!engine.has_mine_at((4, 4)));
    }

    #[test]
    fn winning_on_the_last_safe_cell_happens_in_the_same_action() {
        let mut engine = engine((2, 1), &[(0, 0)]);

        assert_eq!(engine.reveal((1, 0), false).unwrap(), RevealOutcome::Won);
        assert_eq!(engine.status(), GameStatus::Won);
        assert_eq!(engine.triggered_mine(), None);
    }

    #[test]
    fn misflags_count_wrong_placements_and_are_never_taken_back() {
        let mut engine = engine((3, 3), &[(0, 0), (2, 2)]);

        engine.toggle_flag((0, 0)).unwrap();
        engine.toggle_flag((1, 1)).unwrap();
        engine.toggle_flag((2, 0)).unwrap();
        assert_eq!(engine.misflag_count(), 2);

        engine.toggle_flag((1, 1)).unwrap();
        assert_eq!(engine.misflag_count(), 2);
    }

    #[test]
    fn flags_planted_before_placement_are_judged_when_mines_land() {
        let mut engine = RevealEngine::new(GameConfig::try_new((8, 8), 10).unwrap(), 42);

        // Flagging is allowed before the opening reveal; the cell cannot be
        // judged until the layout exists.
        engine.toggle_flag((7, 7)).unwrap();
        assert_eq!(engine.misflag_count(), 0);

        engine.reveal((0, 0), false).unwrap();
        let expected = if engine.has_mine_at((7, 7)) { 0 } else { 1 };
        assert_eq!(engine.misflag_count(), expected);
    }
}
