//! # Basecamp Core
//!
//! Spatial reasoning for an RTS agent: where the bases are, who holds them,
//! and where the next building can legally go.
//!
//! This crate is deterministic and single-threaded:
//! - No rendering
//! - No IO beyond loading configuration
//! - No floating-point math in clustering (uses fixed-point)
//!
//! Terrain queries go through the [`map::MapService`] trait so the same code
//! runs against a live game client or the in-memory [`map::GridMap`].
//!
//! ## Crate Structure
//!
//! - [`bases`] - Resource clustering, base locations and occupancy
//! - [`placement`] - Reservation grid and building placement search
//! - [`agent`] - Per-tick facade tying both together
//! - [`map`] - Map service contract and reference grid map
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod bases;
pub mod config;
pub mod error;
pub mod grid;
pub mod map;
pub mod math;
pub mod placement;
pub mod tile;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::SpatialAgent;
    pub use crate::bases::{BaseId, BaseLocation, BaseLocationRegistry, ResourceBox};
    pub use crate::config::SpatialConfig;
    pub use crate::error::{Result, SpatialError};
    pub use crate::grid::Grid;
    pub use crate::map::{GridMap, MapService, TerrainCell};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::placement::{BuildingPlacer, ReservationGrid};
    pub use crate::tile::{TilePos, TileRect};
    pub use crate::units::{
        ObservedUnit, Player, ResourceKind, ResourceNode, StartLocations, StructureClass,
        StructureType, UnitId, WorldSnapshot,
    };
}
