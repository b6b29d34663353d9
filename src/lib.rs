// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spatial indexing and face-loop topology for mesh Boolean operations
//!
//! Provides a generic k-d tree with incremental nearest-neighbor search, and
//! the grouping stage that splits the face loops of two intersected meshes
//! into connected patches bounded by seam edges.

pub mod config;
pub mod error;
pub mod geometry;

pub use config::{CoreConfig, GroupingConfig, TreeConfig};
pub use error::TopologyError;
pub use geometry::{
    group_face_loops, Aabb, EdgeAdjacencyIndex, FaceLoop, FaceLoopGroup, FaceLoopList, Grouping,
    NearestNeighbors, PlacementPolicy, SeamEdgeSet, SeamMatch, SpatialTree, SplitRequest,
};

use tracing::{info, instrument};

/// Groups for both operands of a Boolean operation
#[derive(Debug, Clone)]
pub struct IntersectionGroups {
    pub seams: SeamEdgeSet,
    pub a: Grouping,
    pub b: Grouping,
}

/// Main entry point for grouping the face loops of two intersected meshes
///
/// Each mesh's loops are indexed and grouped on their own; the seam set is
/// the set of edges the two indexes share.
#[instrument(skip_all, fields(a = loops_a.len(), b = loops_b.len()))]
pub fn group_intersection_loops(
    loops_a: &FaceLoopList,
    loops_b: &FaceLoopList,
    config: &GroupingConfig,
) -> IntersectionGroups {
    let index_a = EdgeAdjacencyIndex::build(loops_a);
    let index_b = EdgeAdjacencyIndex::build(loops_b);
    let seams = SeamEdgeSet::between(&index_a, &index_b, config.seam_match);

    let a = group_face_loops(loops_a, &index_a, &seams);
    let b = group_face_loops(loops_b, &index_b, &seams);

    info!(
        seams = seams.len(),
        groups_a = a.len(),
        groups_b = b.len(),
        "intersection loops grouped"
    );
    IntersectionGroups { seams, a, b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_quads_split_by_shared_seam() {
        // Mesh A: two quads sharing edge 1-4. Mesh B walks 1->4 as well.
        let loops_a: FaceLoopList = [
            FaceLoop::from_indices(0, &[0, 1, 4, 3]),
            FaceLoop::from_indices(0, &[1, 2, 5, 4]),
        ]
        .into_iter()
        .collect();
        let loops_b: FaceLoopList = [FaceLoop::from_indices(1, &[1, 4, 9])].into_iter().collect();

        let result = group_intersection_loops(&loops_a, &loops_b, &GroupingConfig::default());
        assert_eq!(result.seams.len(), 1);
        assert_eq!(result.a.len(), 2);
        assert_eq!(result.b.len(), 1);
        assert_eq!(result.b.groups()[0].perimeter.len(), 1);
    }
}
