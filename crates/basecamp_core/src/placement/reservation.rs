//! Per-tile reservation state for planned and existing structures.

use crate::error::Result;
use crate::grid::Grid;
use crate::tile::{TilePos, TileRect};

/// Boolean claim per tile.
///
/// Footprints are anchored the same way as in the legality checks and are
/// clipped at every map edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationGrid {
    cells: Grid<bool>,
}

impl ReservationGrid {
    /// Create a grid with nothing reserved.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is not positive.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Ok(Self {
            cells: Grid::new(width, height, false)?,
        })
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.cells.width()
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.cells.height()
    }

    /// Claim the footprint anchored at `anchor`.
    pub fn reserve(&mut self, anchor: TilePos, width: i32, height: i32) {
        self.cells
            .fill_rect(TileRect::footprint(anchor, width, height), true);
    }

    /// Release the footprint anchored at `anchor`.
    pub fn free(&mut self, anchor: TilePos, width: i32, height: i32) {
        self.cells
            .fill_rect(TileRect::footprint(anchor, width, height), false);
    }

    /// Release everything.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Out-of-range tiles are never reserved.
    #[must_use]
    pub fn is_reserved(&self, tile: TilePos) -> bool {
        self.cells.value(tile).unwrap_or(false)
    }

    /// Number of reserved tiles.
    #[must_use]
    pub fn reserved_count(&self) -> usize {
        self.cells.iter().filter(|(_, reserved)| **reserved).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reserve_uses_centered_footprint() {
        let mut grid = ReservationGrid::new(10, 10).unwrap();
        grid.reserve(TilePos::new(5, 5), 3, 2);

        // x in [4, 7), y in [4, 6)
        assert!(grid.is_reserved(TilePos::new(4, 4)));
        assert!(grid.is_reserved(TilePos::new(6, 5)));
        assert!(!grid.is_reserved(TilePos::new(7, 5)));
        assert!(!grid.is_reserved(TilePos::new(5, 6)));
        assert_eq!(grid.reserved_count(), 6);
    }

    #[test]
    fn test_reserve_clips_at_edges() {
        let mut grid = ReservationGrid::new(4, 4).unwrap();
        grid.reserve(TilePos::new(0, 0), 3, 3);
        grid.reserve(TilePos::new(3, 3), 5, 5);

        assert!(grid.is_reserved(TilePos::new(0, 0)));
        assert!(grid.is_reserved(TilePos::new(3, 3)));
        assert!(!grid.is_reserved(TilePos::new(-1, -1)));
        assert!(!grid.is_reserved(TilePos::new(4, 4)));
    }

    #[test]
    fn test_clear() {
        let mut grid = ReservationGrid::new(4, 4).unwrap();
        grid.reserve(TilePos::new(1, 1), 2, 2);
        grid.clear();
        assert_eq!(grid.reserved_count(), 0);
    }

    proptest! {
        #[test]
        fn reserve_then_free_restores_grid(
            x in -6i32..26,
            y in -6i32..26,
            w in 1i32..8,
            h in 1i32..8,
        ) {
            let mut grid = ReservationGrid::new(20, 20).unwrap();
            let anchor = TilePos::new(x, y);

            grid.reserve(anchor, w, h);
            grid.free(anchor, w, h);

            prop_assert_eq!(grid.reserved_count(), 0);
        }
    }
}
