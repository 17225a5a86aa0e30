//! A discovered base: a resource cluster large enough to support an economy.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SpatialConfig;
use crate::map::MapService;
use crate::math::{centroid, Fixed, Vec2Fixed};
use crate::tile::TilePos;
use crate::units::{Player, ResourceKind, ResourceNode, StartLocations, StructureType};

/// Sequential identifier assigned in cluster-discovery order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BaseId(pub u32);

impl BaseId {
    /// Create a base identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position in the registry's storage.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base#{}", self.0)
    }
}

/// Bounding box of a base's resources, where nothing but the depot may go.
///
/// `bottom` is the smaller y, `top` the larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBox {
    /// Smallest x covered.
    #[serde(with = "crate::math::fixed_serde")]
    pub left: Fixed,
    /// Largest x covered (exclusive).
    #[serde(with = "crate::math::fixed_serde")]
    pub right: Fixed,
    /// Largest y covered (exclusive).
    #[serde(with = "crate::math::fixed_serde")]
    pub top: Fixed,
    /// Smallest y covered.
    #[serde(with = "crate::math::fixed_serde")]
    pub bottom: Fixed,
}

impl ResourceBox {
    /// Resource nodes are padded by one tile horizontally and half a tile
    /// vertically.
    fn around<'a, I>(resources: I) -> Self
    where
        I: IntoIterator<Item = &'a ResourceNode>,
    {
        let pad_x = Fixed::ONE;
        let pad_y = Fixed::from_num(0.5);
        let mut bounds = Self {
            left: Fixed::MAX,
            right: Fixed::MIN,
            top: Fixed::MIN,
            bottom: Fixed::MAX,
        };

        for resource in resources {
            let pos = resource.position;
            bounds.left = bounds.left.min(pos.x - pad_x);
            bounds.right = bounds.right.max(pos.x + pad_x);
            bounds.top = bounds.top.max(pos.y + pad_y);
            bounds.bottom = bounds.bottom.min(pos.y - pad_y);
        }

        bounds
    }

    /// Whether the tile's corner lies inside the box.
    #[must_use]
    pub fn contains_tile(&self, tile: TilePos) -> bool {
        let px = Fixed::from_num(tile.x);
        let py = Fixed::from_num(tile.y);
        px >= self.left && px < self.right && py < self.top && py >= self.bottom
    }
}

/// A base location with per-tick occupancy state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseLocation {
    id: BaseId,
    minerals: Vec<ResourceNode>,
    geysers: Vec<ResourceNode>,
    centroid: Vec2Fixed,
    depot_tile: TilePos,
    resource_box: ResourceBox,
    near_distance: u32,
    is_start_location: bool,
    player_start: [bool; Player::COUNT],
    occupied_by: [bool; Player::COUNT],
    explored: bool,
}

impl BaseLocation {
    /// Build a base from a promoted cluster.
    ///
    /// A base containing a spawn point takes the spawn tile as its depot tile;
    /// otherwise the depot goes on the closest tile to the resources where a
    /// town hall fits outside the resource box.
    pub fn new<M>(
        map: &M,
        id: BaseId,
        resources: Vec<ResourceNode>,
        starts: &StartLocations,
        config: &SpatialConfig,
    ) -> Self
    where
        M: MapService + ?Sized,
    {
        let (minerals, geysers): (Vec<_>, Vec<_>) = resources
            .into_iter()
            .partition(|r| r.kind == ResourceKind::Mineral);
        // Geysers count toward the centroid.
        let centroid =
            centroid(minerals.iter().chain(&geysers).map(|r| r.position)).unwrap_or_default();
        let resource_box = ResourceBox::around(minerals.iter().chain(&geysers));

        let mut base = Self {
            id,
            minerals,
            geysers,
            centroid,
            depot_tile: TilePos::from_position(centroid),
            resource_box,
            near_distance: config.near_base_tile_distance,
            is_start_location: false,
            player_start: [false; Player::COUNT],
            occupied_by: [false; Player::COUNT],
            explored: false,
        };

        for &candidate in &starts.candidates {
            if base.contains_position(map, candidate) {
                base.is_start_location = true;
                base.depot_tile = TilePos::from_position(candidate);
            }
        }

        if base.contains_position(map, starts.own) {
            base.is_start_location = true;
            base.player_start[Player::Own.index()] = true;
            base.depot_tile = TilePos::from_position(starts.own);
        }

        if !base.is_start_location {
            base.depot_tile = base.find_depot_tile(map, &config.town_hall, config.depot_search_limit);
        }

        base
    }

    fn find_depot_tile<M>(&self, map: &M, town_hall: &StructureType, limit: usize) -> TilePos
    where
        M: MapService + ?Sized,
    {
        let origin = self.centroid_tile();
        let found = map.closest_tiles_to(origin).iter().take(limit).copied().find(|&tile| {
            map.can_build_type_at(tile, town_hall)
                && !town_hall
                    .footprint(tile)
                    .tiles()
                    .any(|t| self.resource_box.contains_tile(t))
        });

        found.unwrap_or_else(|| {
            warn!(base = %self.id, tile = %origin, "No depot tile found, using resource centroid");
            origin
        })
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> BaseId {
        self.id
    }

    /// Mineral fields still observed at this base.
    #[must_use]
    pub fn minerals(&self) -> &[ResourceNode] {
        &self.minerals
    }

    /// Geysers still observed at this base.
    #[must_use]
    pub fn geysers(&self) -> &[ResourceNode] {
        &self.geysers
    }

    /// Mean position of the founding resources.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.centroid
    }

    /// Tile containing the centroid.
    #[must_use]
    pub fn centroid_tile(&self) -> TilePos {
        TilePos::from_position(self.centroid)
    }

    /// Where a town hall should go.
    #[must_use]
    pub const fn depot_tile(&self) -> TilePos {
        self.depot_tile
    }

    /// Protected resource envelope.
    #[must_use]
    pub const fn resource_box(&self) -> ResourceBox {
        self.resource_box
    }

    /// Whether any spawn point lies within this base.
    #[must_use]
    pub const fn is_start_location(&self) -> bool {
        self.is_start_location
    }

    /// Whether `player` is known to have spawned here.
    #[must_use]
    pub const fn is_player_start_location(&self, player: Player) -> bool {
        self.player_start[player.index()]
    }

    /// Whether `player` had a grounded building here at the last refresh.
    #[must_use]
    pub const fn is_occupied_by(&self, player: Player) -> bool {
        self.occupied_by[player.index()]
    }

    /// Whether the depot tile has ever been seen.
    #[must_use]
    pub const fn is_explored(&self) -> bool {
        self.explored
    }

    /// A base without geysers.
    #[must_use]
    pub fn is_mineral_only(&self) -> bool {
        self.geysers.is_empty()
    }

    /// Set occupancy for `player`. An enemy occupying a start location is
    /// taken to have spawned there.
    pub fn set_player_occupying(&mut self, player: Player, occupying: bool) {
        self.occupied_by[player.index()] = occupying;

        if occupying && player == Player::Enemy && self.is_start_location {
            self.player_start[player.index()] = true;
        }
    }

    /// Check whether a world position belongs to this base: on the map, not
    /// the origin, and within the containment radius by ground distance.
    #[must_use]
    pub fn contains_position<M>(&self, map: &M, pos: Vec2Fixed) -> bool
    where
        M: MapService + ?Sized,
    {
        if !map.is_valid_position(pos) || pos == Vec2Fixed::ZERO {
            return false;
        }

        self.ground_distance(map, TilePos::from_position(pos))
            .is_some_and(|d| d < self.near_distance)
    }

    /// Check whether a tile lies in the protected resource envelope.
    #[must_use]
    pub fn is_in_resource_box(&self, tile: TilePos) -> bool {
        self.resource_box.contains_tile(tile)
    }

    /// Ground distance from the resources to `tile`.
    #[must_use]
    pub fn ground_distance<M>(&self, map: &M, tile: TilePos) -> Option<u32>
    where
        M: MapService + ?Sized,
    {
        map.ground_distance(self.centroid_tile(), tile)
    }

    /// Keep only the resources still visible this tick.
    pub(crate) fn refresh_resources(&mut self, visible: &[ResourceNode]) {
        let refresh = |members: &[ResourceNode]| -> Vec<ResourceNode> {
            members
                .iter()
                .filter_map(|old| visible.iter().find(|new| old.same_node(new)).copied())
                .collect()
        };
        self.minerals = refresh(&self.minerals);
        self.geysers = refresh(&self.geysers);
    }

    pub(crate) fn refresh_explored<M>(&mut self, map: &M)
    where
        M: MapService + ?Sized,
    {
        self.explored = self.explored || map.is_explored(self.depot_tile);
    }

    pub(crate) fn clear_occupancy(&mut self) {
        self.occupied_by = [false; Player::COUNT];
    }
}
