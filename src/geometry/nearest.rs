// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Incremental nearest-neighbor search over a [`SpatialTree`]
//!
//! The cursor starts in the leaf containing the query point and only widens
//! the search to a sibling subtree once nothing queued is closer than the
//! boundary of the cell searched so far.

use super::kdtree::{NodeId, PlacementPolicy, SpatialTree};
use nalgebra::Point;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Queued item, ordered by distance and then by enqueue order
struct Candidate<'a, T> {
    distance: f64,
    sequence: u64,
    item: &'a T,
}

impl<T> PartialEq for Candidate<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Candidate<'_, T> {}

impl<T> PartialOrd for Candidate<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Candidate<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Lazy iterator of `(distance, item)` pairs in non-decreasing distance order
///
/// Each stored item is yielded exactly once. Ties are broken by the order in
/// which items were queued, which only depends on the tree layout, so results
/// are reproducible.
pub struct NearestNeighbors<'a, P: PlacementPolicy<N>, const N: usize> {
    tree: &'a SpatialTree<P, N>,
    point: Point<f64, N>,
    queue: BinaryHeap<Reverse<Candidate<'a, P::Item>>>,
    current: NodeId,
    boundary_distance: f64,
    sequence: u64,
}

impl<'a, P: PlacementPolicy<N>, const N: usize> NearestNeighbors<'a, P, N> {
    pub fn new(tree: &'a SpatialTree<P, N>, point: Point<f64, N>) -> Self {
        let current = tree.leaf_for_point(&point);
        let mut cursor = Self {
            tree,
            point,
            queue: BinaryHeap::new(),
            current,
            boundary_distance: f64::INFINITY,
            sequence: 0,
        };
        cursor.enqueue_leaf(current);
        cursor.boundary_distance = cursor.distance_to_cell_boundary(current);
        cursor
    }

    pub fn query_point(&self) -> &Point<f64, N> {
        &self.point
    }

    /// Distance from the query point to the nearest ancestor split plane of
    /// `node`, which bounds everything outside `node`'s cell
    fn distance_to_cell_boundary(&self, node: NodeId) -> f64 {
        let policy = self.tree.policy();
        let mut distance = f64::INFINITY;
        let mut cursor = self.tree.parent(node);
        while let Some(ancestor) = cursor {
            if let Some(split) = self.tree.node(ancestor).split() {
                distance = distance.min(policy.split_distance(&split, &self.point));
            }
            cursor = self.tree.parent(ancestor);
        }
        distance
    }

    fn enqueue_leaf(&mut self, leaf: NodeId) {
        let tree = self.tree;
        for item in tree.node(leaf).items() {
            let distance = tree.policy().distance(item, &self.point);
            self.queue.push(Reverse(Candidate {
                distance,
                sequence: self.sequence,
                item,
            }));
            self.sequence += 1;
        }
    }

    fn at_root(&self) -> bool {
        self.current == self.tree.root()
    }
}

impl<'a, P: PlacementPolicy<N>, const N: usize> Iterator for NearestNeighbors<'a, P, N> {
    type Item = (f64, &'a P::Item);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(Reverse(closest)) = self.queue.peek() {
                if self.at_root() || closest.distance < self.boundary_distance {
                    let Reverse(closest) = self.queue.pop()?;
                    return Some((closest.distance, closest.item));
                }
            }

            if self.at_root() {
                return None;
            }

            if let Some(sibling) = self.tree.sibling(self.current) {
                for leaf in self.tree.leaves_under(sibling) {
                    self.enqueue_leaf(leaf);
                }
            }
            self.current = self.tree.parent(self.current)?;
            self.boundary_distance = self.distance_to_cell_boundary(self.current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::geometry::kdtree::SplitRequest;
    use crate::geometry::weld::{IndexedPoint, PointPolicy};
    use nalgebra::Point3;

    fn grid_tree() -> SpatialTree<PointPolicy, 3> {
        let mut points = Vec::new();
        for x in 0..5 {
            for y in 0..5 {
                points.push(IndexedPoint::new(points.len(), Point3::new(x as f64, y as f64, 0.0)));
            }
        }
        let config = TreeConfig {
            max_leaf_items: 2,
            ..TreeConfig::default()
        };
        SpatialTree::from_items(PointPolicy, points, &config)
    }

    #[test]
    fn test_empty_tree_yields_nothing() {
        let tree: SpatialTree<PointPolicy, 3> = SpatialTree::new(PointPolicy);
        assert!(tree.nearest(Point3::origin()).next().is_none());
    }

    #[test]
    fn test_first_result_is_closest() {
        let tree = grid_tree();
        let (distance, item) = tree.nearest(Point3::new(3.1, 1.2, 0.0)).next().unwrap();
        assert_eq!(item.position, Point3::new(3.0, 1.0, 0.0));
        assert!((distance - (0.01f64 + 0.04).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_enumerates_everything_in_order() {
        let tree = grid_tree();
        let results: Vec<_> = tree.nearest(Point3::new(-2.0, 7.5, 1.0)).collect();
        assert_eq!(results.len(), 25);
        assert!(results.windows(2).all(|w| w[0].0 <= w[1].0));

        let mut ids: Vec<usize> = results.iter().map(|(_, p)| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_nearest_on_unsplit_tree() {
        let mut tree: SpatialTree<PointPolicy, 3> = SpatialTree::new(PointPolicy);
        tree.insert(IndexedPoint::new(0, Point3::new(5.0, 0.0, 0.0)));
        tree.insert(IndexedPoint::new(1, Point3::new(1.0, 0.0, 0.0)));
        tree.insert(IndexedPoint::new(2, Point3::new(3.0, 0.0, 0.0)));

        let ids: Vec<usize> = tree
            .k_nearest(Point3::origin(), 2)
            .into_iter()
            .map(|(_, p)| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_equal_distances_follow_queue_order() {
        let mut tree: SpatialTree<PointPolicy, 3> = SpatialTree::new(PointPolicy);
        tree.insert(IndexedPoint::new(0, Point3::new(1.0, 0.0, 0.0)));
        tree.insert(IndexedPoint::new(1, Point3::new(-1.0, 0.0, 0.0)));
        let ids: Vec<usize> = tree.nearest(Point3::origin()).map(|(_, p)| p.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_query_near_root_plane_crosses_it_first() {
        let mut tree: SpatialTree<PointPolicy, 3> = SpatialTree::new(PointPolicy);
        let root = tree.root();
        assert!(tree.split(root, SplitRequest::at(0, 0.0)));
        let (negative, positive) = tree.children(root).unwrap();
        assert!(tree.split(negative, SplitRequest::at(1, 0.0)));
        assert!(tree.split(positive, SplitRequest::at(1, 0.0)));

        tree.insert(IndexedPoint::new(0, Point3::new(3.0, 5.0, 0.0)));
        tree.insert(IndexedPoint::new(1, Point3::new(-0.2, 5.0, 0.0)));
        tree.insert(IndexedPoint::new(2, Point3::new(3.0, -5.0, 0.0)));

        // Query leaf sits across the root plane from the true nearest point.
        let results: Vec<(f64, usize)> = tree
            .nearest(Point3::new(0.1, 5.0, 0.0))
            .map(|(d, p)| (d, p.id))
            .collect();
        assert_eq!(results.iter().map(|(_, id)| *id).collect::<Vec<_>>(), vec![1, 0, 2]);
        assert!((results[0].0 - 0.3).abs() < 1e-12);
        assert!(results.windows(2).all(|w| w[0].0 <= w[1].0));
    }
}
