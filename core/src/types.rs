use ndarray::Array2;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

pub fn grid_bounds<T>(grid: &Array2<T>) -> Coord2 {
    let dim = grid.dim();
    (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
}

/// Whether `b` is `a` itself or one of its up-to-8 neighbors.
pub const fn adjacent_or_same(a: Coord2, b: Coord2) -> bool {
    a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1
}

const RING: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `center`, returning a value only while it stays in bounds.
fn offset(center: Coord2, delta: (i8, i8), bounds: Coord2) -> Option<Coord2> {
    let x = center.0.checked_add_signed(delta.0)?;
    let y = center.1.checked_add_signed(delta.1)?;
    (x < bounds.0 && y < bounds.1).then_some((x, y))
}

/// The up-to-8 cells adjacent to `center`, clamped at grid edges. No wraparound.
pub fn neighbors(center: Coord2, bounds: Coord2) -> impl Iterator<Item = Coord2> {
    RING.into_iter()
        .filter_map(move |delta| offset(center, delta, bounds))
}

/// The 5x5 footprint around `center` (center included), clamped at grid edges.
pub fn block5(center: Coord2, bounds: Coord2) -> impl Iterator<Item = Coord2> {
    (-2i8..=2).flat_map(move |dx| (-2i8..=2).filter_map(move |dy| offset(center, (dx, dy), bounds)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_clamp_at_edges() {
        let corner: Vec<_> = neighbors((0, 0), (8, 8)).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1), (1, 1)]);

        assert_eq!(neighbors((4, 4), (8, 8)).count(), 8);
        assert_eq!(neighbors((7, 3), (8, 8)).count(), 5);
    }

    #[test]
    fn block5_covers_the_clamped_footprint() {
        assert_eq!(block5((0, 0), (8, 8)).count(), 9);
        assert_eq!(block5((4, 4), (8, 8)).count(), 25);
        assert_eq!(block5((1, 1), (8, 8)).count(), 16);
        assert!(block5((4, 4), (8, 8)).any(|pos| pos == (4, 4)));
    }

    #[test]
    fn adjacency_check_includes_center() {
        assert!(adjacent_or_same((3, 3), (3, 3)));
        assert!(adjacent_or_same((3, 3), (4, 2)));
        assert!(!adjacent_or_same((3, 3), (5, 3)));
    }
}
