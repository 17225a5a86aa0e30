//! Discovery and per-tick reconciliation of base locations.
//!
//! The set of bases is fixed once [`BaseLocationRegistry::discover`] has run.
//! Each tick [`BaseLocationRegistry::update`] reconciles resource membership
//! and recomputes occupancy from scratch, so a destroyed structure stops
//! counting at the next refresh.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use tracing::{debug, info, trace};

use crate::bases::base_location::{BaseId, BaseLocation};
use crate::bases::clustering::cluster_resources;
use crate::config::SpatialConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::map::MapService;
use crate::math::Vec2Fixed;
use crate::tile::TilePos;
use crate::units::{Player, ResourceNode, StartLocations, StructureType, WorldSnapshot};

/// Owns every base plus the tile→base lookup table.
#[derive(Debug, Clone)]
pub struct BaseLocationRegistry {
    bases: Vec<BaseLocation>,
    tile_bases: Grid<Option<BaseId>>,
    starting: Vec<BaseId>,
    player_start: [Option<BaseId>; Player::COUNT],
    occupied: [BTreeSet<BaseId>; Player::COUNT],
    town_hall: StructureType,
}

impl BaseLocationRegistry {
    /// Cluster the visible resources into bases. Run once at game start.
    ///
    /// # Errors
    ///
    /// Returns an error if the map reports non-positive dimensions.
    pub fn discover<M>(
        map: &M,
        resources: &[ResourceNode],
        starts: &StartLocations,
        config: &SpatialConfig,
    ) -> Result<Self>
    where
        M: MapService + ?Sized,
    {
        let clusters = cluster_resources(map, resources, config);
        let cluster_count = clusters.len();

        let mut bases = Vec::new();
        for cluster in clusters {
            if cluster.len() < config.min_base_resources {
                trace!(size = cluster.len(), "Cluster too small for a base");
                continue;
            }
            let id = BaseId::new(bases.len() as u32);
            bases.push(BaseLocation::new(map, id, cluster.into_members(), starts, config));
        }

        let mut starting = Vec::new();
        let mut player_start = [None; Player::COUNT];
        for base in &bases {
            if base.is_start_location() {
                starting.push(base.id());
            }
            for player in Player::ALL {
                if base.is_player_start_location(player) {
                    player_start[player.index()] = Some(base.id());
                }
            }
            debug!(
                base = %base.id(),
                depot = %base.depot_tile(),
                minerals = base.minerals().len(),
                geysers = base.geysers().len(),
                start = base.is_start_location(),
                "Discovered base"
            );
        }

        // First match in storage order wins for tiles within reach of two bases.
        let mut tile_bases = Grid::new(map.width(), map.height(), None)?;
        for y in 0..map.height() {
            for x in 0..map.width() {
                let tile = TilePos::new(x, y);
                let owner = bases
                    .iter()
                    .find(|base| base.contains_position(map, tile.center()))
                    .map(BaseLocation::id);
                tile_bases.set(tile, owner);
            }
        }

        info!(
            clusters = cluster_count,
            bases = bases.len(),
            start_locations = starting.len(),
            "Base discovery complete"
        );

        Ok(Self {
            bases,
            tile_bases,
            starting,
            player_start,
            occupied: [BTreeSet::new(), BTreeSet::new()],
            town_hall: config.town_hall.clone(),
        })
    }

    /// Reconcile with this tick's observations.
    pub fn update<M>(&mut self, map: &M, snapshot: &WorldSnapshot)
    where
        M: MapService + ?Sized,
    {
        for base in &mut self.bases {
            base.refresh_resources(&snapshot.resources);
            base.refresh_explored(map);
            base.clear_occupancy();
        }

        for unit in snapshot.own_units.iter().filter(|u| u.is_grounded_building()) {
            if let Some(id) = self.base_id_at(unit.position) {
                self.bases[id.index()].set_player_occupying(unit.owner, true);
            }
        }

        // Enemy buildings count at their last known position.
        for unit in snapshot.enemy_units.iter().filter(|u| u.unit_type.is_building()) {
            if let Some(id) = self.base_id_at(unit.position) {
                self.bases[id.index()].set_player_occupying(Player::Enemy, true);
            }
        }

        self.infer_enemy_start();

        for player in Player::ALL {
            self.occupied[player.index()] = self
                .bases
                .iter()
                .filter(|base| base.is_occupied_by(player))
                .map(BaseLocation::id)
                .collect();
        }

        trace!(
            own = self.occupied[Player::Own.index()].len(),
            enemy = self.occupied[Player::Enemy.index()].len(),
            "Base occupancy refreshed"
        );
    }

    /// Either the enemy was seen at a start location, or every other start
    /// location has been scouted and found empty.
    fn infer_enemy_start(&mut self) {
        let enemy = Player::Enemy.index();
        if self.player_start[enemy].is_some() {
            return;
        }

        if let Some(base) = self
            .bases
            .iter()
            .find(|base| base.is_player_start_location(Player::Enemy))
        {
            info!(base = %base.id(), "Enemy start location observed");
            self.player_start[enemy] = Some(base.id());
            return;
        }

        // Our own start is never a candidate, scouted or not.
        let own = self.player_start[Player::Own.index()];
        let mut explored = 0;
        let mut unexplored = None;
        for &id in &self.starting {
            if Some(id) == own || self.bases[id.index()].is_explored() {
                explored += 1;
            } else {
                unexplored = Some(id);
            }
        }

        if let Some(id) = unexplored {
            if explored + 1 == self.starting.len() {
                info!(base = %id, "Enemy start location inferred by elimination");
                self.player_start[enemy] = Some(id);
                self.bases[id.index()].set_player_occupying(Player::Enemy, true);
            }
        }
    }

    fn base_id_at(&self, pos: Vec2Fixed) -> Option<BaseId> {
        self.tile_bases.value(TilePos::from_position(pos)).flatten()
    }

    /// Every base, in id order.
    #[must_use]
    pub fn base_locations(&self) -> &[BaseLocation] {
        &self.bases
    }

    /// Bases containing a spawn point, in id order.
    pub fn starting_base_locations(&self) -> impl Iterator<Item = &BaseLocation> + '_ {
        self.starting.iter().map(|id| &self.bases[id.index()])
    }

    /// Bases where `player` had a grounded building at the last refresh.
    pub fn occupied_base_locations(&self, player: Player) -> impl Iterator<Item = &BaseLocation> + '_ {
        self.occupied[player.index()]
            .iter()
            .map(|id| &self.bases[id.index()])
    }

    /// Where `player` spawned, if known.
    #[must_use]
    pub fn player_starting_base_location(&self, player: Player) -> Option<&BaseLocation> {
        self.player_start[player.index()].map(|id| &self.bases[id.index()])
    }

    /// Look up a base by id.
    #[must_use]
    pub fn base(&self, id: BaseId) -> Option<&BaseLocation> {
        self.bases.get(id.index())
    }

    /// The base whose area covers `pos`; `None` off the map or between bases.
    #[must_use]
    pub fn base_at(&self, pos: Vec2Fixed) -> Option<&BaseLocation> {
        self.base_id_at(pos).map(|id| &self.bases[id.index()])
    }

    /// Closest base (by ground distance from `player`'s home) that is free
    /// to expand to.
    ///
    /// Start locations and mineral-only bases are skipped, as are bases where
    /// a town hall cannot currently be built or that are unreachable. Equal
    /// distances keep the base with the lower id.
    #[must_use]
    pub fn next_expansion<M>(&self, map: &M, player: Player) -> Option<&BaseLocation>
    where
        M: MapService + ?Sized,
    {
        let home = self.player_starting_base_location(player)?;
        let mut closest: Option<(&BaseLocation, u32)> = None;

        for base in &self.bases {
            if base.id() == home.id() || base.is_mineral_only() || base.is_start_location() {
                continue;
            }

            let depot = base.depot_tile();
            if !map.can_build_type_at(depot, &self.town_hall) {
                continue;
            }

            let Some(distance) = home.ground_distance(map, depot) else {
                continue;
            };

            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((base, distance));
            }
        }

        closest.map(|(base, _)| base)
    }

    /// Hash of the registry state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.bases.len().hash(&mut hasher);
        for base in &self.bases {
            base.id().hash(&mut hasher);
            base.depot_tile().hash(&mut hasher);
            base.position().hash(&mut hasher);
            base.minerals().len().hash(&mut hasher);
            base.geysers().len().hash(&mut hasher);
            base.is_start_location().hash(&mut hasher);
            base.is_explored().hash(&mut hasher);
            for player in Player::ALL {
                base.is_occupied_by(player).hash(&mut hasher);
                base.is_player_start_location(player).hash(&mut hasher);
            }
        }

        self.player_start.hash(&mut hasher);
        for (tile, owner) in self.tile_bases.iter() {
            if owner.is_some() {
                tile.hash(&mut hasher);
                owner.hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}
