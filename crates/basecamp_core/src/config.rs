//! Tunable thresholds for base discovery and placement.
//!
//! Defaults reproduce the classic values: resources cluster within 12 tiles,
//! a base needs at least 5 resources, and a base "contains" anything within
//! 20 tiles of ground distance from its resources.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatialError};
use crate::units::StructureType;

/// Configuration shared by the registry and the placer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Resources closer than this (in tiles) to a cluster's centroid join it.
    pub cluster_distance_tiles: u32,
    /// Minimum number of resources for a cluster to become a base.
    pub min_base_resources: usize,
    /// Ground radius (in tiles) of a base's containment test.
    pub near_base_tile_distance: u32,
    /// Candidate tiles examined when choosing a depot tile.
    pub depot_search_limit: usize,
    /// Placement search limit for callers that do not supply one.
    pub default_search_limit: usize,
    /// Build distance for callers that do not supply one.
    pub default_build_distance: i32,
    /// Maximum distance (in tiles) from an own depot to a refinery geyser.
    pub refinery_depot_radius: u32,
    /// Town-hall-class structure used for depot tiles and expansions.
    pub town_hall: StructureType,
    /// Refinery-class structure used for geyser placement.
    pub refinery: StructureType,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cluster_distance_tiles: 12,
            min_base_resources: 5,
            near_base_tile_distance: 20,
            depot_search_limit: 1000,
            default_search_limit: 1000,
            default_build_distance: 2,
            refinery_depot_radius: 10,
            town_hall: StructureType::town_hall(),
            refinery: StructureType::refinery(),
        }
    }
}

impl SpatialConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SpatialError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make discovery or placement meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_distance_tiles == 0 {
            return Err(SpatialError::InvalidConfig(
                "cluster_distance_tiles must be positive".into(),
            ));
        }
        if self.min_base_resources == 0 {
            return Err(SpatialError::InvalidConfig(
                "min_base_resources must be positive".into(),
            ));
        }
        if self.near_base_tile_distance == 0 {
            return Err(SpatialError::InvalidConfig(
                "near_base_tile_distance must be positive".into(),
            ));
        }
        if self.default_build_distance < 0 {
            return Err(SpatialError::InvalidConfig(
                "default_build_distance must not be negative".into(),
            ));
        }
        for ty in [&self.town_hall, &self.refinery] {
            if ty.tile_width <= 0 || ty.tile_height <= 0 {
                return Err(SpatialError::InvalidConfig(format!(
                    "structure '{}' has non-positive footprint {}x{}",
                    ty.name, ty.tile_width, ty.tile_height
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SpatialConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SpatialConfig::from_ron_str("(cluster_distance_tiles: 8)").unwrap();
        assert_eq!(config.cluster_distance_tiles, 8);
        assert_eq!(config.min_base_resources, 5);
        assert_eq!(config.town_hall, StructureType::town_hall());
    }

    #[test]
    fn test_ron_round_trip() {
        let config = SpatialConfig {
            near_base_tile_distance: 16,
            ..SpatialConfig::default()
        };
        let text = ron::to_string(&config).unwrap();
        assert_eq!(SpatialConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let err = SpatialConfig::from_ron_str("(cluster_distance_tiles: 0)").unwrap_err();
        assert!(matches!(err, SpatialError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = SpatialConfig::from_ron_str("(cluster_distance_tiles: \"far\")").unwrap_err();
        assert!(matches!(err, SpatialError::RonParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SpatialConfig::load("/nonexistent/basecamp.ron").unwrap_err();
        assert!(matches!(err, SpatialError::ConfigRead { .. }));
    }
}
