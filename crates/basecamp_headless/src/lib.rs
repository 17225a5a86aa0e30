//! Headless scenario runner for the basecamp spatial core.
//!
//! Loads a RON scenario (ASCII terrain, resources, spawn points and a list
//! of observation frames), replays it through [`SpatialAgent`], and reports
//! discovered bases and placement answers as JSON.
//!
//! # Example
//!
//! ```bash
//! cargo run -p basecamp_headless -- bases scenarios/two_bases.ron
//! cargo run -p basecamp_headless -- place scenarios/two_bases.ron
//! cargo run -p basecamp_headless -- render scenarios/two_bases.ron
//! ```
//!
//! [`SpatialAgent`]: basecamp_core::agent::SpatialAgent

pub mod ascii;
pub mod report;
pub mod runner;
pub mod scenario;

pub use ascii::{render_ascii, AsciiConfig};
pub use report::{BaseReport, BasesReport, PlacementReport};
pub use runner::{PlacementOutcome, ScenarioRun};
pub use scenario::{Frame, PlacementQuery, Scenario, ScenarioError, StructureSpec};

/// Three-base sample map shipped with the crate.
pub const SAMPLE_SCENARIO: &str = include_str!("../scenarios/two_bases.ron");
