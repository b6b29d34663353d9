// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point items for the k-d tree and tree-accelerated vertex welding

use super::aabb::Aabb;
use super::kdtree::{PlacementPolicy, SpatialTree};
use crate::config::TreeConfig;
use nalgebra::Point;
use tracing::{debug, instrument};

/// A point tagged with a caller-chosen id
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint<const N: usize> {
    pub id: usize,
    pub position: Point<f64, N>,
}

impl<const N: usize> IndexedPoint<N> {
    pub fn new(id: usize, position: Point<f64, N>) -> Self {
        Self { id, position }
    }
}

/// Placement for [`IndexedPoint`] items using Euclidean distance
#[derive(Debug, Clone, Copy, Default)]
pub struct PointPolicy;

impl<const N: usize> PlacementPolicy<N> for PointPolicy {
    type Item = IndexedPoint<N>;

    fn aabb(&self, item: &Self::Item) -> Aabb<N> {
        Aabb::from_point(&item.position)
    }

    fn coordinate(&self, item: &Self::Item, axis: usize) -> f64 {
        item.position.coords[axis]
    }

    fn distance(&self, item: &Self::Item, point: &Point<f64, N>) -> f64 {
        nalgebra::distance(&item.position, point)
    }
}

/// Result of [`weld_points`]
#[derive(Debug, Clone, PartialEq)]
pub struct WeldResult<const N: usize> {
    /// For each input point, the index of its representative in `points`
    pub map: Vec<usize>,
    /// Representatives in order of first appearance
    pub points: Vec<Point<f64, N>>,
}

impl<const N: usize> WeldResult<N> {
    pub fn merged_count(&self) -> usize {
        self.map.len() - self.points.len()
    }
}

/// Merge points closer than `epsilon`
///
/// Points are visited in input order; the first point not yet merged becomes
/// a representative and absorbs every unmerged point within `epsilon` of it.
#[instrument(skip(points, config), fields(count = points.len()))]
pub fn weld_points<const N: usize>(
    points: &[Point<f64, N>],
    epsilon: f64,
    config: &TreeConfig,
) -> WeldResult<N> {
    let tree: SpatialTree<PointPolicy, N> = SpatialTree::from_items(
        PointPolicy,
        points
            .iter()
            .enumerate()
            .map(|(id, position)| IndexedPoint::new(id, *position)),
        config,
    );

    let mut map: Vec<Option<usize>> = vec![None; points.len()];
    let mut welded = Vec::new();

    for (index, position) in points.iter().enumerate() {
        if map[index].is_some() {
            continue;
        }
        let representative = welded.len();
        welded.push(*position);
        map[index] = Some(representative);

        for neighbor in tree.within_radius(position, epsilon) {
            if map[neighbor.id].is_none() {
                map[neighbor.id] = Some(representative);
            }
        }
    }

    let map: Vec<usize> = map.into_iter().flatten().collect();
    debug!(
        welded = welded.len(),
        merged = map.len() - welded.len(),
        "vertex welding complete"
    );
    WeldResult {
        map,
        points: welded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Point3};

    #[test]
    fn test_weld_duplicates() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1e-12),
            Point3::new(1.0, 1e-12, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let result = weld_points(&points, 1e-9, &TreeConfig::default());

        assert_eq!(result.map, vec![0, 1, 0, 1, 2]);
        assert_eq!(result.points.len(), 3);
        assert_eq!(result.merged_count(), 2);
        assert_eq!(result.points[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_weld_keeps_distinct_points() {
        let points: Vec<Point2<f64>> = (0..100)
            .map(|i| Point2::new((i % 10) as f64, (i / 10) as f64))
            .collect();
        let result = weld_points(&points, 0.5, &TreeConfig::default());
        assert_eq!(result.points, points);
        assert_eq!(result.map, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_weld_many_identical_points() {
        let points = vec![Point3::new(2.0, 2.0, 2.0); 50];
        let result = weld_points(&points, 1e-6, &TreeConfig::default());
        assert_eq!(result.points.len(), 1);
        assert!(result.map.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_point_policy_routes_by_coordinate() {
        let item = IndexedPoint::new(0, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(PlacementPolicy::<3>::coordinate(&PointPolicy, &item, 2), 3.0);
        let distance = PlacementPolicy::<3>::distance(&PointPolicy, &item, &Point3::new(1.0, 2.0, 0.0));
        assert_eq!(distance, 3.0);
    }
}
