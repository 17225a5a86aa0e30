//! Per-tick facade over the base registry and the building placer.
//!
//! The host loop calls [`SpatialAgent::on_start`] once, then
//! [`SpatialAgent::on_tick`] every simulation step before issuing any
//! placement or expansion query. Nothing here blocks or spawns work; each
//! call runs to completion inside the host's tick callback.

use tracing::{debug, info};

use crate::bases::{BaseLocation, BaseLocationRegistry};
use crate::config::SpatialConfig;
use crate::error::Result;
use crate::map::MapService;
use crate::placement::BuildingPlacer;
use crate::tile::TilePos;
use crate::units::{Player, StartLocations, StructureType, WorldSnapshot};

/// Spatial reasoning for one player.
#[derive(Debug, Clone)]
pub struct SpatialAgent {
    config: SpatialConfig,
    starts: StartLocations,
    bases: BaseLocationRegistry,
    placer: BuildingPlacer,
    tick: u64,
}

impl SpatialAgent {
    /// Discover bases from the first snapshot and size the reservation grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the map reports non-positive dimensions.
    pub fn on_start<M>(
        config: SpatialConfig,
        map: &M,
        snapshot: &WorldSnapshot,
        starts: StartLocations,
    ) -> Result<Self>
    where
        M: MapService + ?Sized,
    {
        let bases = BaseLocationRegistry::discover(map, &snapshot.resources, &starts, &config)?;
        let placer = BuildingPlacer::new(map, &config)?;

        info!(
            width = map.width(),
            height = map.height(),
            bases = bases.base_locations().len(),
            "Spatial agent started"
        );

        let mut agent = Self {
            config,
            starts,
            bases,
            placer,
            tick: 0,
        };
        agent.refresh(map, snapshot);
        Ok(agent)
    }

    /// Refresh occupancy, then reservations, from this tick's snapshot.
    pub fn on_tick<M>(&mut self, map: &M, snapshot: &WorldSnapshot)
    where
        M: MapService + ?Sized,
    {
        self.tick += 1;
        self.refresh(map, snapshot);
        debug!(tick = self.tick, "Spatial state refreshed");
    }

    fn refresh<M>(&mut self, map: &M, snapshot: &WorldSnapshot)
    where
        M: MapService + ?Sized,
    {
        self.bases.update(map, snapshot);
        self.placer.update_reserved(
            snapshot
                .own_units
                .iter()
                .filter(|unit| unit.is_grounded_building()),
        );
    }

    /// Ticks processed since start.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Spawn points known at start.
    #[must_use]
    pub const fn start_locations(&self) -> &StartLocations {
        &self.starts
    }

    /// The base registry.
    #[must_use]
    pub const fn bases(&self) -> &BaseLocationRegistry {
        &self.bases
    }

    /// The building placer.
    #[must_use]
    pub const fn placer(&self) -> &BuildingPlacer {
        &self.placer
    }

    /// Mutable placer, for ad hoc reservations between refreshes.
    pub fn placer_mut(&mut self) -> &mut BuildingPlacer {
        &mut self.placer
    }

    /// Our start base, once discovered.
    #[must_use]
    pub fn home(&self) -> Option<&BaseLocation> {
        self.bases.player_starting_base_location(Player::Own)
    }

    /// Depot tile of the next base to expand to.
    #[must_use]
    pub fn next_expansion_depot<M>(&self, map: &M) -> Option<TilePos>
    where
        M: MapService + ?Sized,
    {
        self.bases
            .next_expansion(map, Player::Own)
            .map(BaseLocation::depot_tile)
    }

    /// Placement search with the configured clearance and search limit.
    #[must_use]
    pub fn build_location_near<M>(
        &self,
        map: &M,
        target: TilePos,
        structure: &StructureType,
    ) -> Option<TilePos>
    where
        M: MapService + ?Sized,
    {
        self.placer.get_build_location_near(
            map,
            &self.bases,
            target,
            structure,
            self.config.default_build_distance,
            self.config.default_search_limit,
        )
    }

    /// Where to put `structure`: refineries on a geyser next to one of our
    /// depots, town halls at the next expansion, everything else near home.
    #[must_use]
    pub fn find_position<M>(
        &self,
        map: &M,
        snapshot: &WorldSnapshot,
        structure: &StructureType,
    ) -> Option<TilePos>
    where
        M: MapService + ?Sized,
    {
        if structure.is_refinery() {
            return self.placer.refinery_position(map, snapshot, self.starts.own);
        }

        if structure.is_resource_depot() {
            return self.next_expansion_depot(map);
        }

        let target = self
            .home()
            .map_or_else(|| TilePos::from_position(self.starts.own), BaseLocation::depot_tile);
        self.build_location_near(map, target, structure)
    }

    /// Hash of bases, occupancy and reservations.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.bases.state_hash().hash(&mut hasher);
        self.placer.reservations().reserved_count().hash(&mut hasher);
        hasher.finish()
    }
}
