//! Legality checks and nearest-placement search.
//!
//! All checks are pure with respect to the map and the base registry; the
//! only state the placer owns is its [`ReservationGrid`], rebuilt every tick
//! from the known friendly structures via [`BuildingPlacer::update_reserved`].

use tracing::{trace, warn};

use crate::bases::BaseLocationRegistry;
use crate::config::SpatialConfig;
use crate::error::Result;
use crate::map::MapService;
use crate::math::{Fixed, Vec2Fixed};
use crate::placement::reservation::ReservationGrid;
use crate::tile::{TilePos, TileRect};
use crate::units::{ObservedUnit, Player, ResourceKind, StructureType, WorldSnapshot};

/// Building placement engine.
#[derive(Debug, Clone)]
pub struct BuildingPlacer {
    reserved: ReservationGrid,
    town_hall: StructureType,
    refinery: StructureType,
    refinery_depot_radius: u32,
}

impl BuildingPlacer {
    /// Create a placer sized to the map with nothing reserved.
    ///
    /// # Errors
    ///
    /// Returns an error if the map reports non-positive dimensions.
    pub fn new<M>(map: &M, config: &SpatialConfig) -> Result<Self>
    where
        M: MapService + ?Sized,
    {
        Ok(Self {
            reserved: ReservationGrid::new(map.width(), map.height())?,
            town_hall: config.town_hall.clone(),
            refinery: config.refinery.clone(),
            refinery_depot_radius: config.refinery_depot_radius,
        })
    }

    /// The reservation grid.
    #[must_use]
    pub const fn reservations(&self) -> &ReservationGrid {
        &self.reserved
    }

    // ------------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------------

    /// Clear the grid and reserve the footprint of every unit.
    ///
    /// Reservations made since the last refresh are discarded.
    pub fn update_reserved<'a, I>(&mut self, units: I)
    where
        I: IntoIterator<Item = &'a ObservedUnit>,
    {
        self.reserved.clear();
        for unit in units {
            self.reserved.reserve(
                unit.tile_position(),
                unit.unit_type.tile_width,
                unit.unit_type.tile_height,
            );
        }
        trace!(tiles = self.reserved.reserved_count(), "Reservations rebuilt");
    }

    /// Release every tile.
    pub fn free_all_tiles(&mut self) {
        self.reserved.clear();
    }

    /// Claim a footprint; off-map tiles are clipped.
    pub fn reserve_tiles(&mut self, anchor: TilePos, width: i32, height: i32) {
        self.reserved.reserve(anchor, width, height);
    }

    /// Release a footprint; off-map tiles are clipped.
    pub fn free_tiles(&mut self, anchor: TilePos, width: i32, height: i32) {
        self.reserved.free(anchor, width, height);
    }

    /// Whether the tile is reserved. Off-map tiles never are.
    #[must_use]
    pub fn is_reserved(&self, tile: TilePos) -> bool {
        self.reserved.is_reserved(tile)
    }

    // ------------------------------------------------------------------------
    // Legality
    // ------------------------------------------------------------------------

    /// Every tile on the map, walkable and unreserved.
    fn tiles_free<M>(&self, map: &M, rect: TileRect) -> bool
    where
        M: MapService + ?Sized,
    {
        rect.tiles()
            .all(|t| map.is_valid_tile(t) && map.is_walkable(t) && !self.reserved.is_reserved(t))
    }

    /// Only the own start base's resource box is consulted.
    fn in_home_resource_box(bases: &BaseLocationRegistry, anchor: TilePos) -> bool {
        bases
            .player_starting_base_location(Player::Own)
            .is_some_and(|home| home.is_in_resource_box(anchor))
    }

    fn overlaps_any_depot(&self, bases: &BaseLocationRegistry, rect: TileRect) -> bool {
        bases.base_locations().iter().any(|base| {
            rect.touches_or_overlaps(&self.town_hall.footprint(base.depot_tile()))
        })
    }

    /// Check whether `structure` may be placed at `anchor` right now.
    #[must_use]
    pub fn can_build_here<M>(
        &self,
        map: &M,
        bases: &BaseLocationRegistry,
        anchor: TilePos,
        structure: &StructureType,
    ) -> bool
    where
        M: MapService + ?Sized,
    {
        if Self::in_home_resource_box(bases, anchor) {
            return false;
        }

        if !self.tiles_free(map, structure.footprint(anchor)) {
            return false;
        }

        !self.tile_overlaps_base_location(bases, anchor, structure)
    }

    /// Like [`can_build_here`](Self::can_build_here) for a bare footprint.
    /// No structure class is known, so no base is exempt from the depot
    /// overlap check.
    #[must_use]
    pub fn can_build_here_with_size<M>(
        &self,
        map: &M,
        bases: &BaseLocationRegistry,
        anchor: TilePos,
        width: i32,
        height: i32,
    ) -> bool
    where
        M: MapService + ?Sized,
    {
        if Self::in_home_resource_box(bases, anchor) {
            return false;
        }

        let rect = TileRect::footprint(anchor, width, height);
        self.tiles_free(map, rect) && !self.overlaps_any_depot(bases, rect)
    }

    /// [`can_build_here`](Self::can_build_here) plus `build_distance` tiles of
    /// clearance around the footprint.
    ///
    /// The clearance rectangle must lie fully on the map and, except for
    /// refineries, every tile in it must be walkable and unreserved. The map
    /// service gets the final say through
    /// [`MapService::can_build_type_at`].
    #[must_use]
    pub fn can_build_here_with_space<M>(
        &self,
        map: &M,
        bases: &BaseLocationRegistry,
        anchor: TilePos,
        structure: &StructureType,
        build_distance: i32,
    ) -> bool
    where
        M: MapService + ?Sized,
    {
        if !self.can_build_here(map, bases, anchor, structure) {
            return false;
        }

        let margin = structure.footprint(anchor).expand(build_distance.max(0));
        if !margin.fits_within(map.width(), map.height()) {
            return false;
        }

        if !map.can_build_type_at(anchor, structure) {
            return false;
        }

        structure.is_refinery() || self.tiles_free(map, margin)
    }

    /// Check whether the footprint touches any base's depot footprint.
    /// Resource depots are exempt.
    #[must_use]
    pub fn tile_overlaps_base_location(
        &self,
        bases: &BaseLocationRegistry,
        anchor: TilePos,
        structure: &StructureType,
    ) -> bool {
        if structure.is_resource_depot() {
            return false;
        }
        self.overlaps_any_depot(bases, structure.footprint(anchor))
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// First tile, in ground-distance order from `target`, where `structure`
    /// fits with `build_distance` tiles of clearance.
    ///
    /// At most `search_limit` candidates are examined; `0` means no limit.
    /// Returns `None` (and logs a warning) when nothing qualifies.
    #[must_use]
    pub fn get_build_location_near<M>(
        &self,
        map: &M,
        bases: &BaseLocationRegistry,
        target: TilePos,
        structure: &StructureType,
        build_distance: i32,
        search_limit: usize,
    ) -> Option<TilePos>
    where
        M: MapService + ?Sized,
    {
        let limit = if search_limit == 0 {
            usize::MAX
        } else {
            search_limit
        };

        let found = map
            .closest_tiles_to(target)
            .iter()
            .take(limit)
            .copied()
            .find(|&tile| {
                self.can_build_here_with_space(map, bases, tile, structure, build_distance)
            });

        if found.is_none() {
            warn!(
                structure = %structure.name,
                target = %target,
                search_limit,
                "No valid placement found"
            );
        }
        found
    }

    /// Geyser closest to `home` that sits within reach of one of our
    /// resource depots and can still take a refinery.
    #[must_use]
    pub fn refinery_position<M>(
        &self,
        map: &M,
        snapshot: &WorldSnapshot,
        home: Vec2Fixed,
    ) -> Option<TilePos>
    where
        M: MapService + ?Sized,
    {
        let radius = Fixed::from_num(self.refinery_depot_radius);
        let mut closest: Option<(TilePos, Fixed)> = None;

        for geyser in snapshot.resources_of(ResourceKind::Geyser) {
            let tile = TilePos::from_position(geyser.position);
            if !map.can_build_type_at(tile, &self.refinery) || self.geyser_taken(snapshot, tile) {
                continue;
            }

            let near_depot = snapshot.own_units.iter().any(|unit| {
                unit.unit_type.is_resource_depot() && unit.position.is_within(geyser.position, radius)
            });
            if !near_depot {
                continue;
            }

            let dist_sq = geyser.position.distance_squared(home);
            if closest.map_or(true, |(_, best)| dist_sq < best) {
                closest = Some((tile, dist_sq));
            }
        }

        closest.map(|(tile, _)| tile)
    }

    /// A refinery already stands on the geyser, or its tile is reserved.
    fn geyser_taken(&self, snapshot: &WorldSnapshot, tile: TilePos) -> bool {
        self.is_reserved(tile)
            || snapshot
                .own_units
                .iter()
                .chain(&snapshot.enemy_units)
                .any(|unit| unit.unit_type.is_refinery() && unit.tile_position() == tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{GridMap, TerrainCell};
    use crate::units::{ResourceNode, StartLocations, StructureClass};

    fn barracks() -> StructureType {
        StructureType::new("barracks", 3, 3, StructureClass::Building)
    }

    fn pylon() -> StructureType {
        StructureType::new("pylon", 2, 2, StructureClass::Building)
    }

    fn no_bases(map: &GridMap) -> BaseLocationRegistry {
        BaseLocationRegistry::discover(map, &[], &StartLocations::default(), &SpatialConfig::default())
            .unwrap()
    }

    fn setup(width: i32, height: i32) -> (GridMap, BaseLocationRegistry, BuildingPlacer) {
        let map = GridMap::new(width, height).unwrap();
        let bases = no_bases(&map);
        let placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();
        (map, bases, placer)
    }

    fn unit(unit_type: StructureType, tile: TilePos) -> ObservedUnit {
        ObservedUnit {
            id: 1,
            owner: Player::Own,
            unit_type,
            position: tile.center(),
            is_flying: false,
        }
    }

    // ------------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------------

    #[test]
    fn test_reserved_footprint_blocks_overlapping_anchor() {
        let (map, bases, mut placer) = setup(20, 20);
        placer.reserve_tiles(TilePos::new(5, 5), 2, 2);

        assert!(!placer.can_build_here(&map, &bases, TilePos::new(5, 5), &pylon()));
        assert!(!placer.can_build_here(&map, &bases, TilePos::new(6, 6), &pylon()));
        assert!(placer.can_build_here(&map, &bases, TilePos::new(12, 12), &pylon()));

        placer.free_tiles(TilePos::new(5, 5), 2, 2);
        assert!(placer.can_build_here(&map, &bases, TilePos::new(5, 5), &pylon()));
    }

    #[test]
    fn test_update_reserved_discards_ad_hoc_reservations() {
        let (_, _, mut placer) = setup(20, 20);
        placer.reserve_tiles(TilePos::new(2, 2), 1, 1);

        placer.update_reserved(&[unit(barracks(), TilePos::new(10, 10))]);

        assert!(!placer.is_reserved(TilePos::new(2, 2)));
        assert!(placer.is_reserved(TilePos::new(9, 9)));
        assert!(placer.is_reserved(TilePos::new(11, 11)));
        assert_eq!(placer.reservations().reserved_count(), 9);

        placer.free_all_tiles();
        assert_eq!(placer.reservations().reserved_count(), 0);
    }

    // ------------------------------------------------------------------------
    // Legality
    // ------------------------------------------------------------------------

    #[test]
    fn test_footprint_must_be_on_map_and_walkable() {
        let (mut map, bases, placer) = setup(10, 10);
        map.set_terrain(TileRect::new(5, 0, 6, 10), TerrainCell::Blocked);

        assert!(!placer.can_build_here(&map, &bases, TilePos::new(0, 0), &barracks()));
        assert!(!placer.can_build_here(&map, &bases, TilePos::new(5, 5), &barracks()));
        assert!(placer.can_build_here(&map, &bases, TilePos::new(2, 2), &barracks()));
    }

    #[test]
    fn test_walkable_only_terrain_passes_tile_check() {
        let (mut map, bases, placer) = setup(10, 10);
        map.set_terrain(TileRect::new(0, 0, 10, 10), TerrainCell::Walkable);

        assert!(placer.can_build_here(&map, &bases, TilePos::new(4, 4), &barracks()));
        // the map service still refuses non-buildable terrain
        assert!(!placer.can_build_here_with_space(&map, &bases, TilePos::new(4, 4), &barracks(), 0));
    }

    #[test]
    fn test_with_size_checks_tiles() {
        let (map, bases, mut placer) = setup(10, 10);
        placer.reserve_tiles(TilePos::new(3, 3), 1, 1);

        assert!(!placer.can_build_here_with_size(&map, &bases, TilePos::new(3, 3), 3, 3));
        assert!(placer.can_build_here_with_size(&map, &bases, TilePos::new(7, 7), 3, 3));
        assert!(!placer.can_build_here_with_size(&map, &bases, TilePos::new(9, 9), 3, 3));
    }

    #[test]
    fn test_margin_must_fit_on_map() {
        let (map, bases, placer) = setup(10, 10);

        assert!(placer.can_build_here_with_space(&map, &bases, TilePos::new(1, 1), &barracks(), 0));
        assert!(!placer.can_build_here_with_space(&map, &bases, TilePos::new(1, 1), &barracks(), 1));
        assert!(placer.can_build_here_with_space(&map, &bases, TilePos::new(4, 4), &barracks(), 2));
        assert!(!placer.can_build_here_with_space(&map, &bases, TilePos::new(4, 4), &barracks(), 4));
    }

    #[test]
    fn test_huge_build_distance_is_rejected() {
        let (map, bases, placer) = setup(20, 20);
        let anchor = TilePos::new(10, 10);

        assert!(placer.can_build_here_with_space(&map, &bases, anchor, &barracks(), 0));
        for distance in [20, i32::MAX - 1, i32::MAX] {
            assert!(!placer.can_build_here_with_space(&map, &bases, anchor, &barracks(), distance));
        }
        assert_eq!(
            placer.get_build_location_near(&map, &bases, anchor, &barracks(), i32::MAX, 0),
            None
        );
    }

    #[test]
    fn test_margin_must_be_unreserved() {
        let (map, bases, mut placer) = setup(20, 20);
        placer.reserve_tiles(TilePos::new(8, 5), 1, 1);

        let anchor = TilePos::new(5, 5);
        assert!(placer.can_build_here_with_space(&map, &bases, anchor, &barracks(), 1));
        assert!(!placer.can_build_here_with_space(&map, &bases, anchor, &barracks(), 2));
    }

    #[test]
    fn test_refinery_exempt_from_margin_tiles() {
        let mut map = GridMap::new(20, 20).unwrap();
        let geyser = ResourceNode::new(1, ResourceKind::Geyser, TilePos::new(10, 10).center(), 2250);
        map.place_resource(&geyser);
        // geyser terrain is blocked; make it standable for the footprint check
        map.set_terrain(TileRect::footprint(TilePos::new(10, 10), 3, 3), TerrainCell::Walkable);
        let bases = no_bases(&map);
        let mut placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();
        placer.reserve_tiles(TilePos::new(12, 10), 1, 1);

        let refinery = StructureType::refinery();
        assert!(placer.can_build_here_with_space(&map, &bases, TilePos::new(10, 10), &refinery, 1));
        assert!(!placer.can_build_here_with_space(&map, &bases, TilePos::new(10, 10), &barracks(), 1));
        assert!(!placer.can_build_here_with_space(&map, &bases, TilePos::new(5, 5), &refinery, 1));
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// A single-row corridor so that the proximity order is the column order.
    fn corridor() -> (GridMap, BaseLocationRegistry, BuildingPlacer) {
        let map = GridMap::from_ascii(&[".........."]).unwrap();
        let bases = no_bases(&map);
        let mut placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();
        for x in 0..5 {
            placer.reserve_tiles(TilePos::new(x, 0), 1, 1);
        }
        (map, bases, placer)
    }

    #[test]
    fn test_search_limit_stops_before_sixth_candidate() {
        let (map, bases, placer) = corridor();
        let post = StructureType::new("post", 1, 1, StructureClass::Building);

        let near = |limit| placer.get_build_location_near(&map, &bases, TilePos::new(0, 0), &post, 0, limit);

        assert_eq!(near(5), None);
        assert_eq!(near(6), Some(TilePos::new(5, 0)));
        assert_eq!(near(0), Some(TilePos::new(5, 0)));
    }

    #[test]
    fn test_search_returns_nearest_legal_tile() {
        let (map, bases, mut placer) = setup(30, 30);
        placer.reserve_tiles(TilePos::new(15, 15), 3, 3);

        let found = placer
            .get_build_location_near(&map, &bases, TilePos::new(15, 15), &barracks(), 0, 0)
            .unwrap();

        assert!(placer.can_build_here_with_space(&map, &bases, found, &barracks(), 0));
        assert_eq!(map.ground_distance(TilePos::new(15, 15), found), Some(3));
    }

    #[test]
    fn test_search_off_map_target() {
        let (map, bases, placer) = setup(10, 10);
        let found = placer.get_build_location_near(&map, &bases, TilePos::new(50, 50), &pylon(), 0, 0);
        assert_eq!(found, None);
    }

    // ------------------------------------------------------------------------
    // Refinery
    // ------------------------------------------------------------------------

    #[test]
    fn test_refinery_position_prefers_geyser_near_home() {
        let mut map = GridMap::new(64, 64).unwrap();
        let near = ResourceNode::new(1, ResourceKind::Geyser, TilePos::new(12, 10).center(), 2250);
        let far = ResourceNode::new(2, ResourceKind::Geyser, TilePos::new(18, 10).center(), 2250);
        let lonely = ResourceNode::new(3, ResourceKind::Geyser, TilePos::new(50, 50).center(), 2250);
        for g in [&near, &far, &lonely] {
            map.place_resource(g);
        }
        let placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();
        let depot = unit(StructureType::town_hall(), TilePos::new(15, 16));
        let home = TilePos::new(10, 16).center();

        let snapshot = WorldSnapshot {
            resources: vec![far, lonely, near],
            own_units: vec![depot],
            enemy_units: vec![],
        };
        assert_eq!(
            placer.refinery_position(&map, &snapshot, home),
            Some(TilePos::new(12, 10))
        );

        // without a depot nothing qualifies
        let bare = WorldSnapshot {
            own_units: vec![],
            ..snapshot
        };
        assert_eq!(placer.refinery_position(&map, &bare, home), None);
    }

    #[test]
    fn test_refinery_position_skips_taken_geysers() {
        let mut map = GridMap::new(64, 64).unwrap();
        let first = ResourceNode::new(1, ResourceKind::Geyser, TilePos::new(12, 10).center(), 2250);
        let second = ResourceNode::new(2, ResourceKind::Geyser, TilePos::new(18, 10).center(), 2250);
        map.place_resource(&first);
        map.place_resource(&second);
        let mut placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();
        let home = TilePos::new(10, 16).center();

        let mut snapshot = WorldSnapshot {
            resources: vec![first, second],
            own_units: vec![
                unit(StructureType::town_hall(), TilePos::new(15, 16)),
                unit(StructureType::refinery(), TilePos::new(12, 10)),
            ],
            enemy_units: vec![],
        };

        // seen on the geyser, before any reservation refresh
        assert_eq!(
            placer.refinery_position(&map, &snapshot, home),
            Some(TilePos::new(18, 10))
        );

        // reserved after the refresh, even once the unit drops out of view
        placer.update_reserved(&snapshot.own_units);
        snapshot.own_units.truncate(1);
        assert_eq!(
            placer.refinery_position(&map, &snapshot, home),
            Some(TilePos::new(18, 10))
        );

        snapshot
            .own_units
            .push(unit(StructureType::refinery(), TilePos::new(18, 10)));
        assert_eq!(placer.refinery_position(&map, &snapshot, home), None);
    }
}
