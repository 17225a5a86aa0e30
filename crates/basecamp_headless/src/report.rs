//! JSON reports written to stdout.

use serde::Serialize;

use basecamp_core::bases::BaseLocation;
use basecamp_core::units::Player;

use crate::runner::{PlacementOutcome, ScenarioRun};

/// One discovered base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseReport {
    /// Base id.
    pub id: u32,
    /// Resource centroid in world units.
    pub centroid: (f64, f64),
    /// Depot tile.
    pub depot: (i32, i32),
    /// Minerals currently observed.
    pub minerals: usize,
    /// Geysers currently observed.
    pub geysers: usize,
    /// Contains a spawn point.
    pub start_location: bool,
    /// Depot tile has been seen.
    pub explored: bool,
    /// Players holding a building here.
    pub occupied_by: Vec<Player>,
}

impl BaseReport {
    fn new(base: &BaseLocation) -> Self {
        let centroid = base.position();
        let depot = base.depot_tile();
        Self {
            id: base.id().0,
            centroid: (centroid.x.to_num(), centroid.y.to_num()),
            depot: (depot.x, depot.y),
            minerals: base.minerals().len(),
            geysers: base.geysers().len(),
            start_location: base.is_start_location(),
            explored: base.is_explored(),
            occupied_by: Player::ALL
                .into_iter()
                .filter(|&p| base.is_occupied_by(p))
                .collect(),
        }
    }
}

/// Output of the `bases` subcommand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasesReport {
    /// Scenario name.
    pub scenario: String,
    /// Ticks replayed.
    pub ticks: u64,
    /// Every base, in id order.
    pub bases: Vec<BaseReport>,
    /// Our start base.
    pub own_start: Option<u32>,
    /// Enemy start base, if observed or inferred.
    pub enemy_start: Option<u32>,
    /// Next base to expand to.
    pub next_expansion: Option<u32>,
    /// Determinism fingerprint.
    pub state_hash: u64,
}

impl BasesReport {
    /// Summarise a finished run.
    #[must_use]
    pub fn new(run: &ScenarioRun) -> Self {
        let bases = run.agent.bases();
        let start = |player| bases.player_starting_base_location(player).map(|b| b.id().0);

        Self {
            scenario: run.scenario.name.clone(),
            ticks: run.agent.tick(),
            bases: bases.base_locations().iter().map(BaseReport::new).collect(),
            own_start: start(Player::Own),
            enemy_start: start(Player::Enemy),
            next_expansion: bases
                .next_expansion(&run.map, Player::Own)
                .map(|b| b.id().0),
            state_hash: run.agent.state_hash(),
        }
    }
}

/// One answered placement query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementReport {
    /// Structure name.
    pub structure: String,
    /// Footprint `(width, height)`.
    pub size: (i32, i32),
    /// Search origin, when one was given.
    pub near: Option<(i32, i32)>,
    /// Chosen tile; `null` when nothing was found.
    pub found: Option<(i32, i32)>,
}

impl From<&PlacementOutcome> for PlacementReport {
    fn from(outcome: &PlacementOutcome) -> Self {
        let spec = &outcome.query.structure;
        Self {
            structure: spec.name.clone(),
            size: (spec.width, spec.height),
            near: outcome.origin.map(|t| (t.x, t.y)),
            found: outcome.found.map(|t| (t.x, t.y)),
        }
    }
}
