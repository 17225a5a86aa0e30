//! Scenario loading.
//!
//! A scenario describes a map in ASCII, the resources on it, the spawn
//! points, and a sequence of frames of observed structures to replay
//! through the spatial agent. Placement queries run after the last frame.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use basecamp_core::config::SpatialConfig;
use basecamp_core::error::SpatialError;
use basecamp_core::map::GridMap;
use basecamp_core::tile::{TilePos, TileRect};
use basecamp_core::units::{
    ObservedUnit, Player, ResourceKind, ResourceNode, StartLocations, StructureClass,
    StructureType, UnitId, WorldSnapshot,
};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Map or config rejected by the spatial core.
    #[error("Invalid scenario: {0}")]
    Spatial(#[from] SpatialError),
}

/// A resource node on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Mineral or geyser.
    pub kind: ResourceKind,
    /// Anchor tile column.
    pub x: i32,
    /// Anchor tile row.
    pub y: i32,
    /// Remaining yield.
    #[serde(default = "default_amount")]
    pub amount: i32,
}

fn default_amount() -> i32 {
    1500
}

/// A structure type, inline in the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSpec {
    /// Display name.
    pub name: String,
    /// Footprint width in tiles.
    pub width: i32,
    /// Footprint height in tiles.
    pub height: i32,
    /// Broad class.
    #[serde(default = "default_class")]
    pub class: StructureClass,
}

fn default_class() -> StructureClass {
    StructureClass::Building
}

impl StructureSpec {
    /// Convert to the core's structure type.
    #[must_use]
    pub fn to_type(&self) -> StructureType {
        StructureType::new(self.name.clone(), self.width, self.height, self.class)
    }
}

/// A structure observed at a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedStructure {
    /// Structure type.
    pub structure: StructureSpec,
    /// Anchor tile column.
    pub x: i32,
    /// Anchor tile row.
    pub y: i32,
    /// Lifted off the ground.
    #[serde(default)]
    pub flying: bool,
}

/// Observations for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Our structures.
    #[serde(default)]
    pub own: Vec<PlacedStructure>,
    /// Enemy structures, last known positions.
    #[serde(default)]
    pub enemy: Vec<PlacedStructure>,
    /// Rectangles `(x0, y0, x1, y1)` seen for the first time this tick.
    #[serde(default)]
    pub explore: Vec<(i32, i32, i32, i32)>,
}

/// A placement query run after the last frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementQuery {
    /// What to place.
    pub structure: StructureSpec,
    /// Search origin; defaults to where the agent would place it.
    #[serde(default)]
    pub near: Option<(i32, i32)>,
    /// Clearance; defaults to the config value.
    #[serde(default)]
    pub build_distance: Option<i32>,
    /// Candidate limit; defaults to the config value.
    #[serde(default)]
    pub search_limit: Option<usize>,
}

/// A complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Terrain rows, `y = 0` first: `.` buildable, `,` walkable, `#` blocked.
    pub terrain: Vec<String>,
    /// Resource nodes.
    pub resources: Vec<ResourceSpec>,
    /// Our spawn tile.
    pub own_start: (i32, i32),
    /// Other possible spawn tiles.
    #[serde(default)]
    pub enemy_starts: Vec<(i32, i32)>,
    /// Ticks to replay after discovery.
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Placement queries.
    #[serde(default)]
    pub queries: Vec<PlacementQuery>,
    /// Spatial configuration.
    #[serde(default)]
    pub config: SpatialConfig,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Parse the terrain and place every resource on it.
    pub fn build_map(&self) -> Result<GridMap, ScenarioError> {
        let mut map = GridMap::from_ascii(&self.terrain)?;
        for node in self.resource_nodes() {
            map.place_resource(&node);
        }
        Ok(map)
    }

    /// Resource nodes with ids assigned in listing order.
    #[must_use]
    pub fn resource_nodes(&self) -> Vec<ResourceNode> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                ResourceNode::new(
                    i as UnitId,
                    spec.kind,
                    TilePos::new(spec.x, spec.y).center(),
                    spec.amount,
                )
            })
            .collect()
    }

    /// Spawn points; our own spawn is also a candidate.
    #[must_use]
    pub fn start_locations(&self) -> StartLocations {
        let own = TilePos::new(self.own_start.0, self.own_start.1).center();
        let mut candidates = vec![own];
        candidates.extend(
            self.enemy_starts
                .iter()
                .map(|&(x, y)| TilePos::new(x, y).center()),
        );
        StartLocations { own, candidates }
    }

    /// Snapshot for `frame`, or resources only when `None`.
    #[must_use]
    pub fn snapshot(&self, frame: Option<&Frame>) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot {
            resources: self.resource_nodes(),
            ..WorldSnapshot::default()
        };
        let Some(frame) = frame else {
            return snapshot;
        };

        // Unit ids continue after resource ids.
        let mut next_id = self.resources.len() as UnitId;
        let mut observe = |placed: &PlacedStructure, owner: Player| {
            let unit = ObservedUnit {
                id: next_id,
                owner,
                unit_type: placed.structure.to_type(),
                position: TilePos::new(placed.x, placed.y).center(),
                is_flying: placed.flying,
            };
            next_id += 1;
            unit
        };

        snapshot.own_units = frame.own.iter().map(|p| observe(p, Player::Own)).collect();
        snapshot.enemy_units = frame
            .enemy
            .iter()
            .map(|p| observe(p, Player::Enemy))
            .collect();
        snapshot
    }
}

impl Frame {
    /// Explored rectangles as tile rects.
    pub fn explored_rects(&self) -> impl Iterator<Item = TileRect> + '_ {
        self.explore
            .iter()
            .map(|&(x0, y0, x1, y1)| TileRect::new(x0, y0, x1, y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"(
        name: "minimal",
        terrain: ["....", "..#.", "...."],
        resources: [(kind: Mineral, x: 0, y: 0), (kind: Geyser, x: 2, y: 2, amount: 100)],
        own_start: (3, 1),
    )"#;

    #[test]
    fn test_parse_minimal() {
        let scenario = Scenario::from_ron_str(MINIMAL).unwrap();
        assert_eq!(scenario.name, "minimal");
        assert_eq!(scenario.resources[0].amount, 1500);
        assert_eq!(scenario.resources[1].amount, 100);
        assert!(scenario.frames.is_empty());
        assert_eq!(scenario.config, SpatialConfig::default());
    }

    #[test]
    fn test_build_map_places_resources() {
        let scenario = Scenario::from_ron_str(MINIMAL).unwrap();
        let map = scenario.build_map().unwrap();

        use basecamp_core::map::MapService;
        assert_eq!((map.width(), map.height()), (4, 3));
        assert!(!map.is_walkable(TilePos::new(0, 0)));
        assert!(!map.is_walkable(TilePos::new(2, 1)));
        assert!(map.is_walkable(TilePos::new(3, 0)));
    }

    #[test]
    fn test_bad_terrain_is_rejected() {
        let ron = MINIMAL.replace("..#.", "..?.");
        let scenario = Scenario::from_ron_str(&ron).unwrap();
        assert!(matches!(
            scenario.build_map(),
            Err(ScenarioError::Spatial(SpatialError::UnknownTerrain { ch: '?', .. }))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let ron = MINIMAL.replace(
            "own_start: (3, 1),",
            "own_start: (3, 1), config: (cluster_distance_tiles: 0),",
        );
        assert!(matches!(
            Scenario::from_ron_str(&ron),
            Err(ScenarioError::Spatial(SpatialError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_snapshot_assigns_ids_after_resources() {
        let mut scenario = Scenario::from_ron_str(MINIMAL).unwrap();
        let depot = StructureSpec {
            name: "depot".into(),
            width: 2,
            height: 2,
            class: StructureClass::Building,
        };
        scenario.frames.push(Frame {
            own: vec![PlacedStructure {
                structure: depot.clone(),
                x: 1,
                y: 1,
                flying: false,
            }],
            enemy: vec![PlacedStructure {
                structure: depot,
                x: 3,
                y: 2,
                flying: true,
            }],
            explore: vec![],
        });

        let snapshot = scenario.snapshot(scenario.frames.first());

        assert_eq!(snapshot.resources.len(), 2);
        assert_eq!(snapshot.own_units[0].id, 2);
        assert_eq!(snapshot.enemy_units[0].id, 3);
        assert!(snapshot.enemy_units[0].is_flying);
        assert_eq!(snapshot.enemy_units[0].owner, Player::Enemy);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/nonexistent/scenario.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
