//! Map service contract and a grid-backed reference map.
//!
//! The registry and the placer only ever talk to the map through
//! [`MapService`]. A game client binding implements it over the real
//! terrain; [`GridMap`] implements it over an in-memory terrain grid for
//! tests, benchmarks and the headless runner.
//!
//! Ground distance is the 8-directional step count between tiles over
//! walkable terrain, without cutting corners past blocked tiles.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatialError};
use crate::grid::Grid;
use crate::math::Vec2Fixed;
use crate::tile::{TilePos, TileRect};
use crate::units::{ResourceKind, ResourceNode, StructureType};

/// Terrain queries the spatial core consumes.
pub trait MapService {
    /// Map width in tiles.
    fn width(&self) -> i32;

    /// Map height in tiles.
    fn height(&self) -> i32;

    /// Whether the tile lies on the map.
    fn is_valid_tile(&self, tile: TilePos) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width() && tile.y < self.height()
    }

    /// Whether the world position lies on the map.
    fn is_valid_position(&self, pos: Vec2Fixed) -> bool {
        self.is_valid_tile(TilePos::from_position(pos))
    }

    /// Whether ground units can stand on the tile.
    fn is_walkable(&self, tile: TilePos) -> bool;

    /// Whether terrain allows construction on the tile.
    fn is_buildable(&self, tile: TilePos) -> bool;

    /// Whether the tile has been seen at least once.
    fn is_explored(&self, tile: TilePos) -> bool;

    /// Type-specific placement rules the core does not model itself.
    fn can_build_type_at(&self, tile: TilePos, structure: &StructureType) -> bool;

    /// Ground distance in tiles; `None` when there is no connecting path.
    fn ground_distance(&self, from: TilePos, to: TilePos) -> Option<u32>;

    /// Reachable tiles ordered by increasing ground distance from `tile`.
    fn closest_tiles_to(&self, tile: TilePos) -> Rc<[TilePos]>;
}

/// Terrain of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainCell {
    /// Walkable and open to construction.
    #[default]
    Buildable,
    /// Walkable only (ramps, creep-less ground near cliffs, ...).
    Walkable,
    /// Cliffs, water, resource nodes.
    Blocked,
}

impl TerrainCell {
    /// Parse an ASCII terrain character.
    ///
    /// `.` buildable, `,` walkable only, `#` blocked.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Self::Buildable),
            ',' => Some(Self::Walkable),
            '#' => Some(Self::Blocked),
            _ => None,
        }
    }

    /// ASCII character for this cell.
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::Buildable => '.',
            Self::Walkable => ',',
            Self::Blocked => '#',
        }
    }

    /// Returns true if ground units can stand here.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

/// Footprint of a mineral field in tiles.
pub const MINERAL_FOOTPRINT: (i32, i32) = (2, 1);

/// Footprint of a geyser in tiles.
pub const GEYSER_FOOTPRINT: (i32, i32) = (3, 3);

/// Direction offsets for 8-directional movement.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// BFS result from one source tile.
#[derive(Debug)]
struct DistanceField {
    distances: Grid<Option<u32>>,
    sorted: Rc<[TilePos]>,
}

/// In-memory map with BFS ground distances cached per source tile.
#[derive(Debug, Clone)]
pub struct GridMap {
    terrain: Grid<TerrainCell>,
    explored: Grid<bool>,
    geysers: BTreeSet<TilePos>,
    fields: RefCell<HashMap<TilePos, Rc<DistanceField>>>,
}

impl GridMap {
    /// Create a fully buildable, unexplored map.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Ok(Self {
            terrain: Grid::new(width, height, TerrainCell::Buildable)?,
            explored: Grid::new(width, height, false)?,
            geysers: BTreeSet::new(),
            fields: RefCell::new(HashMap::new()),
        })
    }

    /// Parse terrain from ASCII rows; row `i` is `y = i`.
    ///
    /// Short rows are padded with blocked tiles.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let height = rows.len() as i32;
        let width = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0) as i32;

        let mut map = Self::new(width, height)?;
        map.terrain.fill(TerrainCell::Blocked);

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.as_ref().chars().enumerate() {
                let cell = TerrainCell::from_char(ch).ok_or(SpatialError::UnknownTerrain {
                    ch,
                    x: x as i32,
                    y: y as i32,
                })?;
                map.terrain.set(TilePos::new(x as i32, y as i32), cell);
            }
        }

        Ok(map)
    }

    /// Terrain at `tile`, `None` off the map.
    #[must_use]
    pub fn terrain(&self, tile: TilePos) -> Option<TerrainCell> {
        self.terrain.value(tile)
    }

    /// Overwrite terrain in a rectangle (clipped to the map).
    pub fn set_terrain(&mut self, rect: TileRect, cell: TerrainCell) {
        self.terrain.fill_rect(rect, cell);
        self.invalidate_distances();
    }

    /// Block the tiles under a resource node; geysers also become
    /// refinery anchors.
    pub fn place_resource(&mut self, node: &ResourceNode) {
        let anchor = TilePos::from_position(node.position);
        let (w, h) = match node.kind {
            ResourceKind::Mineral => MINERAL_FOOTPRINT,
            ResourceKind::Geyser => GEYSER_FOOTPRINT,
        };
        self.terrain
            .fill_rect(TileRect::footprint(anchor, w, h), TerrainCell::Blocked);
        if node.kind == ResourceKind::Geyser {
            self.geysers.insert(anchor);
        }
        self.invalidate_distances();
    }

    /// Mark a rectangle as seen.
    pub fn explore(&mut self, rect: TileRect) {
        self.explored.fill_rect(rect, true);
    }

    /// Mark the whole map as seen.
    pub fn explore_all(&mut self) {
        self.explored.fill(true);
    }

    /// Number of cached distance fields.
    #[must_use]
    pub fn cached_fields(&self) -> usize {
        self.fields.borrow().len()
    }

    fn invalidate_distances(&mut self) {
        self.fields.get_mut().clear();
    }

    fn walkable(&self, tile: TilePos) -> bool {
        self.terrain.value(tile).is_some_and(TerrainCell::is_walkable)
    }

    /// Distance field from `source`, computed on first use.
    fn field(&self, source: TilePos) -> Rc<DistanceField> {
        if let Some(field) = self.fields.borrow().get(&source) {
            return Rc::clone(field);
        }
        let field = Rc::new(self.compute_field(source));
        self.fields.borrow_mut().insert(source, Rc::clone(&field));
        field
    }

    fn compute_field(&self, source: TilePos) -> DistanceField {
        let mut distances = Grid::shaped_like(&self.terrain, None);
        let mut sorted = Vec::new();
        let mut queue = VecDeque::new();

        // The source may itself be blocked (a mineral, a geyser); it still
        // seeds the search.
        if distances.set(source, Some(0)) {
            sorted.push(source);
            queue.push_back((source, 0u32));
        }

        while let Some((current, dist)) = queue.pop_front() {
            for &(dx, dy) in &DIRECTIONS {
                let next = current.offset(dx, dy);
                if !self.walkable(next) || distances.value(next).flatten().is_some() {
                    continue;
                }
                // No corner cutting past blocked tiles.
                if dx != 0
                    && dy != 0
                    && !(self.walkable(current.offset(dx, 0)) && self.walkable(current.offset(0, dy)))
                {
                    continue;
                }
                distances.set(next, Some(dist + 1));
                sorted.push(next);
                queue.push_back((next, dist + 1));
            }
        }

        DistanceField {
            distances,
            sorted: sorted.into(),
        }
    }
}

impl MapService for GridMap {
    fn width(&self) -> i32 {
        self.terrain.width()
    }

    fn height(&self) -> i32 {
        self.terrain.height()
    }

    fn is_walkable(&self, tile: TilePos) -> bool {
        self.walkable(tile)
    }

    fn is_buildable(&self, tile: TilePos) -> bool {
        self.terrain.value(tile) == Some(TerrainCell::Buildable)
    }

    fn is_explored(&self, tile: TilePos) -> bool {
        self.explored.value(tile).unwrap_or(false)
    }

    fn can_build_type_at(&self, tile: TilePos, structure: &StructureType) -> bool {
        if structure.is_refinery() {
            return self.geysers.contains(&tile);
        }
        structure
            .footprint(tile)
            .tiles()
            .all(|t| self.is_buildable(t))
    }

    fn ground_distance(&self, from: TilePos, to: TilePos) -> Option<u32> {
        if !self.is_valid_tile(from) || !self.is_valid_tile(to) {
            return None;
        }
        self.field(from).distances.value(to).flatten()
    }

    fn closest_tiles_to(&self, tile: TilePos) -> Rc<[TilePos]> {
        if !self.is_valid_tile(tile) {
            return Rc::from(Vec::new());
        }
        Rc::clone(&self.field(tile).sorted)
    }
}
