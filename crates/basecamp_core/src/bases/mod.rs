//! Base discovery and occupancy tracking.
//!
//! Resources are clustered once at game start ([`cluster_resources`]),
//! clusters with enough members become [`BaseLocation`]s, and the
//! [`BaseLocationRegistry`] keeps their per-tick state in sync with what the
//! world feed reports.

mod base_location;
mod clustering;
mod registry;

pub use base_location::{BaseId, BaseLocation, ResourceBox};
pub use clustering::{cluster_resources, ResourceCluster};
pub use registry::BaseLocationRegistry;
