//! Owned row-major tile arena.
//!
//! Every per-tile table in the crate (reservations, the tile→base lookup,
//! terrain, distance fields) is a [`Grid`] owned by the component that uses
//! it. Out-of-bounds reads return `None` and out-of-bounds writes are
//! ignored.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatialError};
use crate::tile::{TilePos, TileRect};

/// A `width × height` matrix of `T` indexed by [`TilePos`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidDimensions`] if either dimension is not positive.
    pub fn new(width: i32, height: i32, fill: T) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(SpatialError::InvalidDimensions { width, height });
        }
        let cell_count = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            cells: vec![fill; cell_count],
        })
    }

    /// Create a grid with the same dimensions as `other`.
    #[must_use]
    pub fn shaped_like<U>(other: &Grid<U>, fill: T) -> Self {
        Self {
            width: other.width,
            height: other.height,
            cells: vec![fill; other.cells.len()],
        }
    }

    /// Reset every cell to `value`.
    pub fn fill(&mut self, value: T) {
        for cell in &mut self.cells {
            *cell = value.clone();
        }
    }

    /// Set every in-bounds tile of `rect` to `value`; the rest is clipped.
    pub fn fill_rect(&mut self, rect: TileRect, value: T) {
        for tile in rect.clip(self.width, self.height).tiles() {
            let index = self.index(tile);
            self.cells[index] = value.clone();
        }
    }
}

impl<T> Grid<T> {
    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Check if a tile is within grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, tile: TilePos) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    #[inline]
    fn index(&self, tile: TilePos) -> usize {
        (tile.y as usize) * (self.width as usize) + (tile.x as usize)
    }

    /// Borrow the cell at `tile`.
    #[must_use]
    pub fn get(&self, tile: TilePos) -> Option<&T> {
        if self.in_bounds(tile) {
            Some(&self.cells[self.index(tile)])
        } else {
            None
        }
    }

    /// Set the cell at `tile`.
    /// Returns `false` if out of bounds.
    pub fn set(&mut self, tile: TilePos, value: T) -> bool {
        if self.in_bounds(tile) {
            let index = self.index(tile);
            self.cells[index] = value;
            true
        } else {
            false
        }
    }

    /// Iterate `(tile, cell)` pairs, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, &T)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            (
                TilePos::new((i % width) as i32, (i / width) as i32),
                cell,
            )
        })
    }
}

impl<T: Copy> Grid<T> {
    /// Copy of the cell at `tile`, `None` if out of bounds.
    #[must_use]
    pub fn value(&self, tile: TilePos) -> Option<T> {
        self.get(tile).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rejects_empty_dimensions() {
        assert!(Grid::new(0, 5, false).is_err());
        assert!(Grid::new(5, -1, false).is_err());
    }

    #[test]
    fn test_grid_set_get() {
        let mut grid = Grid::new(4, 3, 0u8).unwrap();
        assert!(grid.set(TilePos::new(3, 2), 7));
        assert_eq!(grid.value(TilePos::new(3, 2)), Some(7));
        assert_eq!(grid.value(TilePos::new(2, 3)), None);
        assert!(!grid.set(TilePos::new(-1, 0), 1));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        grid.fill_rect(TileRect::new(-2, -2, 2, 2), true);

        let marked: Vec<_> = grid.iter().filter(|(_, v)| **v).map(|(t, _)| t).collect();
        assert_eq!(
            marked,
            vec![
                TilePos::new(0, 0),
                TilePos::new(1, 0),
                TilePos::new(0, 1),
                TilePos::new(1, 1)
            ]
        );
    }

    #[test]
    fn test_iter_row_major() {
        let grid = Grid::new(2, 2, ()).unwrap();
        let tiles: Vec<_> = grid.iter().map(|(t, _)| t).collect();
        assert_eq!(
            tiles,
            vec![
                TilePos::new(0, 0),
                TilePos::new(1, 0),
                TilePos::new(0, 1),
                TilePos::new(1, 1)
            ]
        );
    }
}
