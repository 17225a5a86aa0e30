//! Test fixtures and helpers.
//!
//! Map layouts, resource lines and observed structures for consistent
//! testing across crates.

use tracing::debug;

use basecamp_core::agent::SpatialAgent;
use basecamp_core::bases::BaseLocationRegistry;
use basecamp_core::config::SpatialConfig;
use basecamp_core::map::{GridMap, TerrainCell};
use basecamp_core::math::Vec2Fixed;
use basecamp_core::tile::{TilePos, TileRect};
use basecamp_core::units::{
    ObservedUnit, Player, ResourceKind, ResourceNode, StartLocations, StructureClass,
    StructureType, UnitId, WorldSnapshot,
};

/// World position at the center of a tile.
#[must_use]
pub fn center(x: i32, y: i32) -> Vec2Fixed {
    TilePos::new(x, y).center()
}

/// Mineral field on tile `(x, y)`.
#[must_use]
pub fn mineral(id: UnitId, x: i32, y: i32) -> ResourceNode {
    ResourceNode::new(id, ResourceKind::Mineral, center(x, y), 1500)
}

/// Geyser on tile `(x, y)`.
#[must_use]
pub fn geyser(id: UnitId, x: i32, y: i32) -> ResourceNode {
    ResourceNode::new(id, ResourceKind::Geyser, center(x, y), 2250)
}

/// `count` minerals every second tile along row `y`, starting at column `x`.
#[must_use]
pub fn mineral_line(first_id: UnitId, x: i32, y: i32, count: usize) -> Vec<ResourceNode> {
    (0..count)
        .map(|i| mineral(first_id + i as UnitId, x + 2 * i as i32, y))
        .collect()
}

/// Six minerals starting at `(x, y)` with a geyser below each end:
/// eight resources, enough for a base.
#[must_use]
pub fn standard_base(first_id: UnitId, x: i32, y: i32) -> Vec<ResourceNode> {
    let mut nodes = mineral_line(first_id, x, y, 6);
    nodes.push(geyser(first_id + 6, x - 3, y + 4));
    nodes.push(geyser(first_id + 7, x + 13, y + 4));
    nodes
}

/// A 3x3 production building.
#[must_use]
pub fn barracks() -> StructureType {
    StructureType::new("barracks", 3, 3, StructureClass::Building)
}

/// A 2x2 supply building.
#[must_use]
pub fn supply_depot() -> StructureType {
    StructureType::new("supply_depot", 2, 2, StructureClass::Building)
}

/// A grounded structure observed on `tile`.
#[must_use]
pub fn structure(id: UnitId, owner: Player, unit_type: StructureType, tile: TilePos) -> ObservedUnit {
    ObservedUnit {
        id,
        owner,
        unit_type,
        position: tile.center(),
        is_flying: false,
    }
}

/// Map, first snapshot and spawn points ready for discovery.
#[derive(Debug, Clone)]
pub struct TestWorld {
    /// Terrain with resources placed.
    pub map: GridMap,
    /// Visible resources, no units.
    pub snapshot: WorldSnapshot,
    /// Spawn points.
    pub starts: StartLocations,
}

impl TestWorld {
    /// Run discovery with the default config.
    ///
    /// # Panics
    ///
    /// Panics if the map has invalid dimensions.
    #[must_use]
    pub fn registry(&self) -> BaseLocationRegistry {
        BaseLocationRegistry::discover(
            &self.map,
            &self.snapshot.resources,
            &self.starts,
            &SpatialConfig::default(),
        )
        .expect("test map has valid dimensions")
    }

    /// Start an agent with `config`.
    ///
    /// # Panics
    ///
    /// Panics if the map has invalid dimensions.
    #[must_use]
    pub fn agent(&self, config: SpatialConfig) -> SpatialAgent {
        SpatialAgent::on_start(config, &self.map, &self.snapshot, self.starts.clone())
            .expect("test map has valid dimensions")
    }
}

/// Builder for [`TestWorld`].
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    width: i32,
    height: i32,
    resources: Vec<ResourceNode>,
    terrain: Vec<(TileRect, TerrainCell)>,
    own_start: Option<TilePos>,
    candidates: Vec<TilePos>,
}

impl WorldBuilder {
    /// Empty, fully buildable map.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            resources: Vec::new(),
            terrain: Vec::new(),
            own_start: None,
            candidates: Vec::new(),
        }
    }

    /// Add a [`standard_base`] at `(x, y)`. Resource ids continue from the
    /// ones already added.
    #[must_use]
    pub fn with_base(mut self, x: i32, y: i32) -> Self {
        let first = self.resources.len() as UnitId;
        self.resources.extend(standard_base(first, x, y));
        self
    }

    /// Add arbitrary resources.
    #[must_use]
    pub fn with_resources(mut self, resources: impl IntoIterator<Item = ResourceNode>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// Overwrite terrain in a rectangle before resources are placed.
    #[must_use]
    pub fn with_terrain(mut self, rect: TileRect, cell: TerrainCell) -> Self {
        self.terrain.push((rect, cell));
        self
    }

    /// Our spawn; also registered as a start candidate.
    #[must_use]
    pub fn own_start(mut self, x: i32, y: i32) -> Self {
        let tile = TilePos::new(x, y);
        self.own_start = Some(tile);
        self.candidates.push(tile);
        self
    }

    /// Another possible spawn.
    #[must_use]
    pub fn start_candidate(mut self, x: i32, y: i32) -> Self {
        self.candidates.push(TilePos::new(x, y));
        self
    }

    /// Build the world.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions are not positive.
    #[must_use]
    pub fn build(self) -> TestWorld {
        let mut map = GridMap::new(self.width, self.height).expect("positive test map dimensions");
        for &(rect, cell) in &self.terrain {
            map.set_terrain(rect, cell);
        }
        for resource in &self.resources {
            map.place_resource(resource);
        }

        debug!(
            width = self.width,
            height = self.height,
            resources = self.resources.len(),
            "Built test world"
        );

        TestWorld {
            map,
            snapshot: WorldSnapshot {
                resources: self.resources,
                ..WorldSnapshot::default()
            },
            starts: StartLocations {
                own: self.own_start.map_or(Vec2Fixed::ZERO, TilePos::center),
                candidates: self.candidates.into_iter().map(TilePos::center).collect(),
            },
        }
    }
}

/// Two start bases in opposite corners of a 128x128 map, one natural
/// expansion next to ours and a third start in the top-right.
///
/// Bases are discovered in this order: own start, enemy start, natural,
/// third start.
#[must_use]
pub fn four_base_world() -> TestWorld {
    WorldBuilder::new(128, 128)
        .with_base(10, 6)
        .with_base(100, 110)
        .with_base(40, 6)
        .with_base(100, 6)
        .own_start(15, 14)
        .start_candidate(105, 118)
        .start_candidate(105, 14)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_base_layout() {
        let nodes = standard_base(0, 10, 6);
        assert_eq!(nodes.len(), 8);
        assert_eq!(
            nodes.iter().filter(|n| n.kind == ResourceKind::Geyser).count(),
            2
        );
    }

    #[test]
    fn test_builder_places_resources() {
        let world = WorldBuilder::new(32, 32).with_base(10, 6).own_start(15, 14).build();
        assert!(!world.map.terrain(TilePos::new(10, 6)).is_some_and(|c| c.is_walkable()));
        assert_eq!(world.starts.candidates.len(), 1);
        assert_eq!(world.starts.own, center(15, 14));
    }

    #[test]
    fn test_four_base_world() {
        let registry = four_base_world().registry();
        assert_eq!(registry.base_locations().len(), 4);
        assert_eq!(registry.starting_base_locations().count(), 3);
    }
}
