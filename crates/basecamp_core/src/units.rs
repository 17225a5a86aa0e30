//! Observations fed in from the live world each tick.
//!
//! These are plain value types. The spatial core copies them per tick and
//! never mutates the world they describe.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;
use crate::tile::{TilePos, TileRect};

/// Unique identifier assigned by the world feed.
pub type UnitId = u64;

/// The two sides the core tracks occupancy for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    /// The agent's own side.
    Own,
    /// The opponent.
    Enemy,
}

impl Player {
    /// Every tracked player, in index order.
    pub const ALL: [Self; 2] = [Self::Own, Self::Enemy];

    /// Number of tracked players.
    pub const COUNT: usize = 2;

    /// Array index for per-player tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Own => 0,
            Self::Enemy => 1,
        }
    }
}

/// Category of a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Mineral field; founds clusters.
    Mineral,
    /// Gas geyser; only joins existing clusters.
    Geyser,
}

/// A resource node as seen this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Feed identifier.
    pub id: UnitId,
    /// Node category.
    pub kind: ResourceKind,
    /// Position in world space.
    pub position: Vec2Fixed,
    /// Remaining yield, passed through untouched.
    #[serde(default)]
    pub remaining: i32,
}

impl ResourceNode {
    /// Create a resource node.
    #[must_use]
    pub const fn new(id: UnitId, kind: ResourceKind, position: Vec2Fixed, remaining: i32) -> Self {
        Self {
            id,
            kind,
            position,
            remaining,
        }
    }

    /// Same node in a later observation: nodes never move, so position and
    /// category identify them.
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        self.kind == other.kind && self.position == other.position
    }
}

/// Broad class of a unit type, as far as placement and occupancy care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureClass {
    /// Not a building (workers, army).
    Unit,
    /// Ordinary building.
    Building,
    /// Town hall; where workers return resources.
    ResourceDepot,
    /// Gas extractor, built on top of a geyser.
    Refinery,
}

/// Type information the placer needs for a structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureType {
    /// Display name used in diagnostics.
    pub name: String,
    /// Footprint width in tiles.
    pub tile_width: i32,
    /// Footprint height in tiles.
    pub tile_height: i32,
    /// Broad class.
    pub class: StructureClass,
}

impl StructureType {
    /// Create a structure type.
    #[must_use]
    pub fn new(name: impl Into<String>, tile_width: i32, tile_height: i32, class: StructureClass) -> Self {
        Self {
            name: name.into(),
            tile_width,
            tile_height,
            class,
        }
    }

    /// Default town hall: a 5×5 resource depot.
    #[must_use]
    pub fn town_hall() -> Self {
        Self::new("town_hall", 5, 5, StructureClass::ResourceDepot)
    }

    /// Default refinery: 3×3, placed on a geyser.
    #[must_use]
    pub fn refinery() -> Self {
        Self::new("refinery", 3, 3, StructureClass::Refinery)
    }

    /// Whether this type is any kind of building.
    #[must_use]
    pub const fn is_building(&self) -> bool {
        !matches!(self.class, StructureClass::Unit)
    }

    /// Whether this type is a town hall.
    #[must_use]
    pub const fn is_resource_depot(&self) -> bool {
        matches!(self.class, StructureClass::ResourceDepot)
    }

    /// Whether this type must sit on a geyser.
    #[must_use]
    pub const fn is_refinery(&self) -> bool {
        matches!(self.class, StructureClass::Refinery)
    }

    /// Footprint when anchored at `anchor`.
    #[must_use]
    pub const fn footprint(&self, anchor: TilePos) -> TileRect {
        TileRect::footprint(anchor, self.tile_width, self.tile_height)
    }
}

/// A unit as reported by the world feed; enemy entries may be last-known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedUnit {
    /// Feed identifier.
    pub id: UnitId,
    /// Owning player.
    pub owner: Player,
    /// Unit type.
    pub unit_type: StructureType,
    /// Position in world space (structure center).
    pub position: Vec2Fixed,
    /// Lifted-off buildings do not occupy a base.
    #[serde(default)]
    pub is_flying: bool,
}

impl ObservedUnit {
    /// Tile the unit is anchored on.
    #[must_use]
    pub fn tile_position(&self) -> TilePos {
        TilePos::from_position(self.position)
    }

    /// Whether the unit is a grounded building.
    #[must_use]
    pub const fn is_grounded_building(&self) -> bool {
        self.unit_type.is_building() && !self.is_flying
    }
}

/// Everything the world feed reports for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Currently visible resource nodes.
    #[serde(default)]
    pub resources: Vec<ResourceNode>,
    /// Own units currently alive.
    #[serde(default)]
    pub own_units: Vec<ObservedUnit>,
    /// Enemy units at their last known positions.
    #[serde(default)]
    pub enemy_units: Vec<ObservedUnit>,
}

impl WorldSnapshot {
    /// Visible resources of one kind, in feed order.
    pub fn resources_of(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceNode> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }
}

/// Spawn points known when the game starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartLocations {
    /// Where the own side spawned.
    pub own: Vec2Fixed,
    /// Every candidate spawn on the map, own spawn included or not.
    pub candidates: Vec<Vec2Fixed>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_indices() {
        for (i, player) in Player::ALL.iter().enumerate() {
            assert_eq!(player.index(), i);
        }
    }

    #[test]
    fn test_same_node_ignores_id_and_yield() {
        let pos = Vec2Fixed::from_ints(4, 4);
        let a = ResourceNode::new(1, ResourceKind::Mineral, pos, 1500);
        let b = ResourceNode::new(99, ResourceKind::Mineral, pos, 900);
        let geyser = ResourceNode::new(1, ResourceKind::Geyser, pos, 1500);

        assert!(a.same_node(&b));
        assert!(!a.same_node(&geyser));
    }

    #[test]
    fn test_structure_classes() {
        let hall = StructureType::town_hall();
        assert!(hall.is_building() && hall.is_resource_depot() && !hall.is_refinery());

        let worker = StructureType::new("worker", 1, 1, StructureClass::Unit);
        assert!(!worker.is_building());
    }

    #[test]
    fn test_flying_building_is_not_grounded() {
        let mut unit = ObservedUnit {
            id: 1,
            owner: Player::Own,
            unit_type: StructureType::new("barracks", 3, 3, StructureClass::Building),
            position: Vec2Fixed::from_ints(10, 10),
            is_flying: false,
        };
        assert!(unit.is_grounded_building());
        unit.is_flying = true;
        assert!(!unit.is_grounded_building());
    }
}
