//! Replays a scenario through the spatial agent.

use tracing::{debug, info};

use basecamp_core::agent::SpatialAgent;
use basecamp_core::config::SpatialConfig;
use basecamp_core::map::GridMap;
use basecamp_core::tile::TilePos;
use basecamp_core::units::WorldSnapshot;

use crate::scenario::{PlacementQuery, Scenario, ScenarioError};

/// Outcome of one placement query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOutcome {
    /// The query as posed.
    pub query: PlacementQuery,
    /// Search origin actually used, if any.
    pub origin: Option<TilePos>,
    /// Chosen tile.
    pub found: Option<TilePos>,
}

/// Agent state after replaying every frame.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    /// The scenario that was run.
    pub scenario: Scenario,
    /// Map with resources placed and exploration applied.
    pub map: GridMap,
    /// Agent after the last tick.
    pub agent: SpatialAgent,
    /// Observations of the last tick.
    pub snapshot: WorldSnapshot,
}

impl ScenarioRun {
    /// Discover bases, then tick once per frame.
    pub fn run(scenario: Scenario) -> Result<Self, ScenarioError> {
        Self::run_with_config(scenario.config.clone(), scenario)
    }

    /// Like [`ScenarioRun::run`] with `config` replacing the scenario's own.
    pub fn run_with_config(config: SpatialConfig, scenario: Scenario) -> Result<Self, ScenarioError> {
        config.validate()?;
        let mut map = scenario.build_map()?;
        let mut snapshot = scenario.snapshot(None);
        let mut agent = SpatialAgent::on_start(config, &map, &snapshot, scenario.start_locations())?;

        info!(
            scenario = %scenario.name,
            frames = scenario.frames.len(),
            bases = agent.bases().base_locations().len(),
            "Scenario loaded"
        );

        for frame in &scenario.frames {
            for rect in frame.explored_rects() {
                map.explore(rect);
            }
            snapshot = scenario.snapshot(Some(frame));
            agent.on_tick(&map, &snapshot);
            debug!(
                tick = agent.tick(),
                own = snapshot.own_units.len(),
                enemy = snapshot.enemy_units.len(),
                "Frame replayed"
            );
        }

        Ok(Self {
            scenario,
            map,
            agent,
            snapshot,
        })
    }

    /// Answer one placement query against the final state.
    ///
    /// Without an explicit origin the agent decides where to look, the same
    /// way it would in a game.
    #[must_use]
    pub fn place(&self, query: &PlacementQuery) -> PlacementOutcome {
        let structure = query.structure.to_type();
        let config = self.agent.config();

        let (origin, found) = match query.near {
            Some((x, y)) => {
                let origin = TilePos::new(x, y);
                let found = self.agent.placer().get_build_location_near(
                    &self.map,
                    self.agent.bases(),
                    origin,
                    &structure,
                    query.build_distance.unwrap_or(config.default_build_distance),
                    query.search_limit.unwrap_or(config.default_search_limit),
                );
                (Some(origin), found)
            }
            None => {
                let found = self.agent.find_position(&self.map, &self.snapshot, &structure);
                (None, found)
            }
        };

        PlacementOutcome {
            query: query.clone(),
            origin,
            found,
        }
    }

    /// Answer every query listed in the scenario, in order.
    #[must_use]
    pub fn place_all(&self) -> Vec<PlacementOutcome> {
        self.scenario.queries.iter().map(|q| self.place(q)).collect()
    }
}
