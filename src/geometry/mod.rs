// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - spatial indexing and face-loop topology

mod aabb;
mod edge_index;
mod face_loop;
mod grouping;
mod kdtree;
mod nearest;
mod report;
mod weld;

pub use aabb::Aabb;
pub use edge_index::{EdgeAdjacencyIndex, SeamEdgeSet, SeamMatch};
pub use face_loop::{DirectedEdge, Edge, FaceLoop, FaceLoopList, LoopId, SourceId, VertexId};
pub use grouping::{group_face_loops, FaceLoopGroup, GroupId, Grouping};
pub use kdtree::{
    Node, NodeId, NodeKind, PlacementPolicy, Side, SpatialTree, SplitPosition, SplitRequest,
};
pub use nearest::NearestNeighbors;
pub use report::{GroupSummary, GroupingReport};
pub use weld::{weld_points, IndexedPoint, PointPolicy, WeldResult};
