//! Tile coordinates and structure footprints.
//!
//! A tile `(x, y)` covers the world square `[x, x+1) × [y, y+1)`. Structure
//! footprints are anchored on their "center" tile: a footprint of width `w`
//! extends `ceil((w-1)/2)` tiles to the left of the anchor, so odd and even
//! sizes anchor consistently.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Integer tile coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile containing a world position.
    #[must_use]
    pub fn from_position(pos: Vec2Fixed) -> Self {
        Self {
            x: pos.x.floor().to_num::<i32>(),
            y: pos.y.floor().to_num::<i32>(),
        }
    }

    /// World position of the tile's center.
    #[must_use]
    pub fn center(self) -> Vec2Fixed {
        let half = Fixed::from_num(0.5);
        Vec2Fixed::new(
            Fixed::from_num(self.x) + half,
            Fixed::from_num(self.y) + half,
        )
    }

    /// Offset this tile by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for TilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Number of tiles a footprint of `dim` extends before its anchor tile.
#[inline]
#[must_use]
pub const fn anchor_offset(dim: i32) -> i32 {
    // ceil((dim - 1) / 2) for dim >= 1
    if dim <= 1 {
        0
    } else {
        dim / 2
    }
}

/// Half-open tile rectangle `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    /// Left column (inclusive).
    pub x0: i32,
    /// Top row (inclusive).
    pub y0: i32,
    /// Right column (exclusive).
    pub x1: i32,
    /// Bottom row (exclusive).
    pub y1: i32,
}

impl TileRect {
    /// Create a rectangle from its corners.
    #[must_use]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Footprint of a `width × height` structure anchored at `anchor`.
    #[must_use]
    pub const fn footprint(anchor: TilePos, width: i32, height: i32) -> Self {
        let x0 = anchor.x - anchor_offset(width);
        let y0 = anchor.y - anchor_offset(height);
        Self {
            x0,
            y0,
            x1: x0 + width,
            y1: y0 + height,
        }
    }

    /// Grow the rectangle by `margin` tiles on every side. Edges saturate
    /// at the `i32` range.
    #[must_use]
    pub const fn expand(self, margin: i32) -> Self {
        Self {
            x0: self.x0.saturating_sub(margin),
            y0: self.y0.saturating_sub(margin),
            x1: self.x1.saturating_add(margin),
            y1: self.y1.saturating_add(margin),
        }
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    /// Whether the rectangle covers no tiles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Check whether `tile` lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, tile: TilePos) -> bool {
        tile.x >= self.x0 && tile.x < self.x1 && tile.y >= self.y0 && tile.y < self.y1
    }

    /// Check whether the rectangle lies fully inside a `width × height` map.
    #[must_use]
    pub const fn fits_within(&self, width: i32, height: i32) -> bool {
        self.x0 >= 0 && self.y0 >= 0 && self.x1 <= width && self.y1 <= height
    }

    /// Overlap test that also counts rectangles sharing an edge.
    ///
    /// Structures placed next to a base's depot must keep one tile of
    /// clearance, so touching counts as overlapping.
    #[must_use]
    pub const fn touches_or_overlaps(&self, other: &Self) -> bool {
        !(self.x1 < other.x0 || self.x0 > other.x1 || self.y1 < other.y0 || self.y0 > other.y1)
    }

    /// Restrict the rectangle to `[0, width) × [0, height)`.
    #[must_use]
    pub fn clip(self, width: i32, height: i32) -> Self {
        Self {
            x0: self.x0.max(0),
            y0: self.y0.max(0),
            x1: self.x1.min(width),
            y1: self.y1.min(height),
        }
    }

    /// Iterate all tiles, row by row.
    pub fn tiles(self) -> impl Iterator<Item = TilePos> {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| TilePos::new(x, y)))
    }
}
