//! Determinism testing utilities.
//!
//! Discovery and placement must give identical answers for identical
//! observations, or an agent replayed from the same game log would make
//! different decisions. Sources of non-determinism to watch for:
//!
//! - **Floating-point math**: clustering uses [`basecamp_core::math::Fixed`].
//! - **HashMap iteration order**: registries iterate in id order only; the
//!   map's distance-field cache is keyed lookup, never iterated.
//! - **Tie-breaking**: first match in storage order everywhere.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use basecamp_core::agent::SpatialAgent;
use basecamp_core::config::SpatialConfig;

use crate::fixtures::TestWorld;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// All unique hashes (1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!(
                "Runs diverged!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Run a setup-step-hash cycle several times and compare the final hashes.
///
/// # Example
///
/// ```ignore
/// let result = verify_determinism(3, 10, || world.agent(config.clone()), |a| a.on_tick(&map, &snapshot), SpatialAgent::state_hash);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Start an agent on a fresh copy of `world` several times, tick it with the
/// initial snapshot and compare agent state hashes.
pub fn verify_agent_determinism<F>(world: F, config: &SpatialConfig, ticks: u64) -> DeterminismResult
where
    F: Fn() -> TestWorld,
{
    verify_determinism(
        3,
        ticks,
        || {
            let world = world();
            let agent = world.agent(config.clone());
            (world, agent)
        },
        |state: &mut (TestWorld, SpatialAgent)| state.1.on_tick(&state.0.map, &state.0.snapshot),
        |state: &(TestWorld, SpatialAgent)| state.1.state_hash(),
    )
}

/// Step two copies side by side and report the first tick at which their
/// hashes differ.
///
/// # Returns
///
/// `None` if the runs never diverge.
pub fn find_first_divergence<S, Setup, Step, HashFn>(
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> Option<u64>
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut a = setup();
    let mut b = setup();

    if hash(&a) != hash(&b) {
        return Some(0);
    }

    for tick in 1..=ticks {
        step(&mut a, tick);
        step(&mut b, tick);
        if hash(&a) != hash(&b) {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for spatial inputs.
pub mod strategies {
    use proptest::prelude::*;

    use basecamp_core::tile::TilePos;
    use basecamp_core::units::{ResourceNode, UnitId};

    use crate::fixtures::{geyser, mineral};

    /// Tile anywhere in (and a few tiles around) a `width × height` map.
    pub fn arb_tile(width: i32, height: i32) -> impl Strategy<Value = TilePos> {
        (-4..width + 4, -4..height + 4).prop_map(|(x, y)| TilePos::new(x, y))
    }

    /// Structure footprint dimension in tiles.
    pub fn arb_footprint_dim() -> impl Strategy<Value = i32> {
        1i32..6
    }

    /// Clearance around a placement.
    pub fn arb_build_distance() -> impl Strategy<Value = i32> {
        0i32..5
    }

    /// Resources scattered over a `width × height` map, about a fifth
    /// of them geysers. Ids are assigned in order.
    pub fn arb_resources(
        width: i32,
        height: i32,
        max: usize,
    ) -> impl Strategy<Value = Vec<ResourceNode>> {
        proptest::collection::vec((1..width - 1, 1..height - 1, 0u8..5), 0..max).prop_map(
            |spots| {
                spots
                    .into_iter()
                    .enumerate()
                    .map(|(i, (x, y, kind))| {
                        let id = i as UnitId;
                        if kind == 0 {
                            geyser(id, x, y)
                        } else {
                            mineral(id, x, y)
                        }
                    })
                    .collect()
            },
        )
    }

    /// Blocked tiles inside a `width × height` map.
    pub fn arb_blocked_tiles(
        width: i32,
        height: i32,
        max: usize,
    ) -> impl Strategy<Value = Vec<TilePos>> {
        proptest::collection::vec((0..width, 0..height), 0..max)
            .prop_map(|tiles| tiles.into_iter().map(|(x, y)| TilePos::new(x, y)).collect())
    }
}
