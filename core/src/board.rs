use core::iter::once;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Validated board dimensions plus mine count.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Fails with `InvalidConfig` unless `0 < mines < width * height`.
    pub fn try_new(size: Coord2, mines: CellCount) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 || mines == 0 || mines >= mult(size.0, size.1) {
            return Err(GameError::InvalidConfig);
        }
        Ok(Self::new_unchecked(size, mines))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

/// Mine layout for one game. Created empty; mines are scattered exactly once,
/// on the first reveal, so the clicked cell can be kept safe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    mines: Array2<bool>,
    mine_count: CellCount,
    mines_placed: bool,
}

impl Board {
    pub fn new(config: GameConfig) -> Self {
        Self {
            mines: Array2::default(config.size.to_nd_index()),
            mine_count: config.mines,
            mines_placed: false,
        }
    }

    /// Board with a fixed, already-placed layout. Used by tests and replays.
    pub fn with_mines(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mines: Array2<bool> = Array2::default(size.to_nd_index());
        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mines[coords.to_nd_index()] = true;
        }
        let mine_count = mines
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();
        Ok(Self {
            mines,
            mine_count,
            mines_placed: true,
        })
    }

    pub fn size(&self) -> Coord2 {
        grid_bounds(&self.mines)
    }

    pub const fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub const fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        self.mines.len().try_into().unwrap()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    /// False until mines are placed; cells only become mines at placement.
    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self.mines_placed && self.mines[coords.to_nd_index()]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        neighbors(coords, self.size())
            .filter(|&pos| self.contains_mine(pos))
            .count()
            .try_into()
            .unwrap()
    }

    /// Scatters `mine_count` mines uniformly over every cell except `excluded`
    /// and its neighborhood. When the board is too dense to spare the full 3x3
    /// guard zone, only the clicked cell itself is kept safe.
    pub fn place_mines(&mut self, excluded: Coord2, seed: u64) -> Result<()> {
        use rand::prelude::*;

        if self.mines_placed {
            return Err(GameError::AlreadyPlaced);
        }
        let excluded = self.validate_coords(excluded)?;

        let size = self.size();
        let total = self.total_cells();
        let mut guard_zone: Vec<Coord2> = once(excluded).chain(neighbors(excluded, size)).collect();
        if self.mine_count + guard_zone.len() as CellCount > total {
            log::warn!(
                "board too dense for a safe neighborhood around {:?}, keeping only the clicked cell",
                excluded
            );
            guard_zone.truncate(1);
        }

        // Mask the guard zone as occupied, fill free slots, then clear it.
        for &coords in &guard_zone {
            self.mines[coords.to_nd_index()] = true;
        }
        let mut free = total - guard_zone.len() as CellCount;
        let mut placed = 0;
        let mut rng = SmallRng::seed_from_u64(seed);
        {
            let slots = self.mines.as_slice_mut().expect("grid layout is standard");
            while placed < self.mine_count && free > 0 {
                let mut target: CellCount = rng.random_range(0..free);
                for slot in slots.iter_mut() {
                    if *slot {
                        continue;
                    }
                    if target == 0 {
                        *slot = true;
                        placed += 1;
                        free -= 1;
                        break;
                    }
                    target -= 1;
                }
            }
        }
        for &coords in &guard_zone {
            self.mines[coords.to_nd_index()] = false;
        }
        self.mines_placed = true;

        debug_assert_eq!(
            self.mines.iter().filter(|&&is_mine| is_mine).count(),
            self.mine_count as usize
        );
        log::debug!(
            "placed {} mines, first click at {:?}",
            self.mine_count,
            excluded
        );
        Ok(())
    }
}
