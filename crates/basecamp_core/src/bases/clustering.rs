//! Greedy grouping of resource nodes into candidate bases.
//!
//! Minerals are visited in feed order and join the first cluster whose
//! current centroid is close enough, otherwise they found a new cluster.
//! Geysers are attached afterwards to the nearest existing cluster and
//! never found one. The result depends only on the input order, so the
//! same snapshot always clusters the same way.

use tracing::trace;

use crate::config::SpatialConfig;
use crate::map::MapService;
use crate::math::{centroid, Fixed, Vec2Fixed};
use crate::tile::TilePos;
use crate::units::{ResourceKind, ResourceNode};

/// Resources grouped together during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCluster {
    members: Vec<ResourceNode>,
}

impl ResourceCluster {
    fn new(first: ResourceNode) -> Self {
        Self {
            members: vec![first],
        }
    }

    /// Every member, in the order it joined.
    #[must_use]
    pub fn members(&self) -> &[ResourceNode] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean position of the current members.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        centroid(self.members.iter().map(|m| m.position)).unwrap_or_default()
    }

    /// Consume the cluster, returning its members.
    #[must_use]
    pub fn into_members(self) -> Vec<ResourceNode> {
        self.members
    }
}

/// Cluster every visible resource.
#[must_use]
pub fn cluster_resources<M>(
    map: &M,
    resources: &[ResourceNode],
    config: &SpatialConfig,
) -> Vec<ResourceCluster>
where
    M: MapService + ?Sized,
{
    let threshold = Fixed::from_num(config.cluster_distance_tiles);
    let mut clusters: Vec<ResourceCluster> = Vec::new();

    for mineral in resources.iter().filter(|r| r.kind == ResourceKind::Mineral) {
        let joined = clusters
            .iter_mut()
            .find(|cluster| joins_cluster(map, mineral.position, cluster.center(), threshold));

        match joined {
            Some(cluster) => cluster.members.push(*mineral),
            None => clusters.push(ResourceCluster::new(*mineral)),
        }
    }

    for geyser in resources.iter().filter(|r| r.kind == ResourceKind::Geyser) {
        let mut nearest: Option<(usize, Fixed)> = None;
        for (index, cluster) in clusters.iter().enumerate() {
            let dist_sq = geyser.position.distance_squared(cluster.center());
            if dist_sq >= threshold * threshold {
                continue;
            }
            if nearest.map_or(true, |(_, best)| dist_sq < best) {
                nearest = Some((index, dist_sq));
            }
        }

        match nearest {
            Some((index, _)) => clusters[index].members.push(*geyser),
            None => trace!(geyser = geyser.id, "Geyser too far from every mineral cluster"),
        }
    }

    clusters
}

/// Straight-line pre-check, then ground distance. Falls back to the
/// straight-line result when the map has no ground distance between the two
/// tiles (resource tiles themselves are usually unwalkable).
fn joins_cluster<M>(map: &M, position: Vec2Fixed, center: Vec2Fixed, threshold: Fixed) -> bool
where
    M: MapService + ?Sized,
{
    if !position.is_within(center, threshold) {
        return false;
    }

    match map.ground_distance(
        TilePos::from_position(position),
        TilePos::from_position(center),
    ) {
        Some(ground) => Fixed::from_num(ground) < threshold,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{GridMap, TerrainCell};
    use crate::tile::TileRect;

    fn node(id: u64, kind: ResourceKind, x: i32, y: i32) -> ResourceNode {
        ResourceNode::new(id, kind, TilePos::new(x, y).center(), 1000)
    }

    fn mineral(id: u64, x: i32, y: i32) -> ResourceNode {
        node(id, ResourceKind::Mineral, x, y)
    }

    #[test]
    fn test_nearby_minerals_share_cluster() {
        let map = GridMap::new(64, 64).unwrap();
        let resources = vec![mineral(1, 10, 10), mineral(2, 12, 10), mineral(3, 40, 40)];

        let clusters = cluster_resources(&map, &resources, &SpatialConfig::default());

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1].members()[0].id, 3);
    }

    #[test]
    fn test_clusters_created_in_encounter_order() {
        let map = GridMap::new(64, 64).unwrap();
        let resources = vec![mineral(1, 50, 50), mineral(2, 5, 5), mineral(3, 51, 50)];

        let clusters = cluster_resources(&map, &resources, &SpatialConfig::default());

        assert_eq!(clusters[0].members()[0].id, 1);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1].members()[0].id, 2);
    }

    #[test]
    fn test_geysers_never_found_clusters() {
        let map = GridMap::new(64, 64).unwrap();
        let resources = vec![
            node(1, ResourceKind::Geyser, 5, 5),
            mineral(2, 40, 40),
        ];

        let clusters = cluster_resources(&map, &resources, &SpatialConfig::default());

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 1);
    }

    #[test]
    fn test_geyser_joins_nearest_cluster() {
        let map = GridMap::new(64, 64).unwrap();
        let resources = vec![
            mineral(1, 10, 10),
            mineral(2, 26, 10),
            node(3, ResourceKind::Geyser, 20, 10),
        ];

        let clusters = cluster_resources(&map, &resources, &SpatialConfig::default());

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 1);
        assert_eq!(clusters[1].len(), 2);
    }

    #[test]
    fn test_ground_distance_splits_across_cliff() {
        let mut map = GridMap::new(64, 64).unwrap();
        // wall between x = 14 and the rest, open only far to the south
        map.set_terrain(TileRect::new(14, 0, 15, 60), TerrainCell::Blocked);
        let resources = vec![mineral(1, 10, 10), mineral(2, 18, 10)];

        let clusters = cluster_resources(&map, &resources, &SpatialConfig::default());

        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_clustering_is_repeatable() {
        let map = GridMap::new(64, 64).unwrap();
        let resources: Vec<_> = (0..12)
            .map(|i| mineral(i, 5 + (i as i32 * 5) % 50, 5 + (i as i32 * 7) % 50))
            .collect();
        let config = SpatialConfig::default();

        assert_eq!(
            cluster_resources(&map, &resources, &config),
            cluster_resources(&map, &resources, &config)
        );
    }
}
