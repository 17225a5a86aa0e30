//! Property tests for clustering and placement invariants.

use basecamp_core::prelude::*;
use basecamp_test_utils::determinism::strategies::{
    arb_blocked_tiles, arb_build_distance, arb_footprint_dim, arb_resources, arb_tile,
};
use basecamp_test_utils::fixtures::WorldBuilder;
use proptest::prelude::*;

const SIZE: i32 = 32;

fn empty_registry(map: &GridMap) -> BaseLocationRegistry {
    BaseLocationRegistry::discover(map, &[], &StartLocations::default(), &SpatialConfig::default())
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reserve_free_round_trip(
        anchor in arb_tile(SIZE, SIZE),
        w in arb_footprint_dim(),
        h in arb_footprint_dim(),
    ) {
        let map = GridMap::new(SIZE, SIZE).unwrap();
        let mut placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();

        placer.reserve_tiles(anchor, w, h);
        placer.free_tiles(anchor, w, h);

        prop_assert_eq!(placer.reservations().reserved_count(), 0);
    }

    #[test]
    fn clearance_only_adds_constraints(
        blocked in arb_blocked_tiles(SIZE, SIZE, 40),
        reserved in arb_blocked_tiles(SIZE, SIZE, 10),
        anchor in arb_tile(SIZE, SIZE),
        w in arb_footprint_dim(),
        h in arb_footprint_dim(),
        d in arb_build_distance(),
    ) {
        let mut map = GridMap::new(SIZE, SIZE).unwrap();
        for tile in &blocked {
            map.set_terrain(TileRect::footprint(*tile, 1, 1), TerrainCell::Blocked);
        }
        let bases = empty_registry(&map);
        let mut placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();
        for tile in &reserved {
            placer.reserve_tiles(*tile, 1, 1);
        }
        let structure = StructureType::new("probe", w, h, StructureClass::Building);

        let narrow = placer.can_build_here_with_space(&map, &bases, anchor, &structure, d);
        let wide = placer.can_build_here_with_space(&map, &bases, anchor, &structure, d + 1);

        prop_assert!(narrow || !wide, "fails at {} but holds at {}", d, d + 1);
    }

    #[test]
    fn bases_meet_minimum_size(resources in arb_resources(64, 64, 40)) {
        let world = WorldBuilder::new(64, 64).with_resources(resources).build();
        let registry = world.registry();

        for (index, base) in registry.base_locations().iter().enumerate() {
            prop_assert_eq!(base.id().index(), index);
            prop_assert!(base.minerals().len() + base.geysers().len() >= 5);
        }
    }

    #[test]
    fn found_location_is_legal(
        anchor in arb_tile(SIZE, SIZE),
        reserved in arb_blocked_tiles(SIZE, SIZE, 20),
        d in arb_build_distance(),
    ) {
        let map = GridMap::new(SIZE, SIZE).unwrap();
        let bases = empty_registry(&map);
        let mut placer = BuildingPlacer::new(&map, &SpatialConfig::default()).unwrap();
        for tile in &reserved {
            placer.reserve_tiles(*tile, 2, 2);
        }
        let structure = StructureType::new("probe", 2, 2, StructureClass::Building);

        if let Some(found) = placer.get_build_location_near(&map, &bases, anchor, &structure, d, 0) {
            prop_assert!(placer.can_build_here_with_space(&map, &bases, found, &structure, d));
        }
    }
}
