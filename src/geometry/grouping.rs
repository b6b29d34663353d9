// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Connected-component grouping of face loops
//!
//! Loops are flood-filled across shared edges. Seam edges stop the fill and
//! are recorded on the group's perimeter; loops from different source meshes
//! are never joined.

use super::edge_index::{EdgeAdjacencyIndex, SeamEdgeSet};
use super::face_loop::{Edge, FaceLoopList, LoopId, SourceId};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Index of a group inside a [`Grouping`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

/// Maximal set of loops connected without crossing a seam
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceLoopGroup {
    pub id: GroupId,
    /// Source mesh shared by every member
    pub source: SourceId,
    /// Members in the order they were reached
    pub members: Vec<LoopId>,
    /// Seam edges met on the group's boundary
    pub perimeter: BTreeSet<Edge>,
}

impl FaceLoopGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: LoopId) -> bool {
        self.members.contains(&id)
    }
}

/// Partition of a loop list into groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    groups: Vec<FaceLoopGroup>,
    assignment: Vec<GroupId>,
}

impl Grouping {
    pub fn groups(&self) -> &[FaceLoopGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<FaceLoopGroup> {
        self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&FaceLoopGroup> {
        self.groups.get(id.0)
    }

    /// Group holding `id`, or `None` for ids outside the grouped list
    pub fn group_of(&self, id: LoopId) -> Option<GroupId> {
        self.assignment.get(id.0).copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of loops that were grouped
    pub fn loop_count(&self) -> usize {
        self.assignment.len()
    }
}

/// Flood-fill `loops` into groups
///
/// Seeds are taken in list order and each fill expands depth-first over
/// non-seam edges, looking up both orientations of every edge in
/// `edge_index`. Loops without edges end up as singleton groups.
#[instrument(skip_all, fields(loops = loops.len(), seams = seam_edges.len()))]
pub fn group_face_loops(
    loops: &FaceLoopList,
    edge_index: &EdgeAdjacencyIndex,
    seam_edges: &SeamEdgeSet,
) -> Grouping {
    let mut group_of: Vec<Option<GroupId>> = vec![None; loops.len()];
    let mut groups = Vec::new();
    let mut frontier = Vec::new();

    for seed in loops.ids() {
        if group_of[seed.0].is_some() {
            continue;
        }

        let id = GroupId(groups.len());
        let source = loops[seed].source;
        let mut members = vec![seed];
        let mut perimeter = BTreeSet::new();
        group_of[seed.0] = Some(id);
        frontier.push(seed);

        while let Some(current) = frontier.pop() {
            for edge in loops[current].edges() {
                if seam_edges.contains(edge.undirected()) {
                    perimeter.insert(edge.undirected());
                    continue;
                }

                let forward = edge_index.loops_on(edge);
                let backward = edge_index.loops_on(edge.reversed());
                for &neighbor in forward.iter().chain(backward) {
                    let Some(slot) = group_of.get_mut(neighbor.0) else {
                        continue;
                    };
                    if slot.is_none() && loops[neighbor].source == source {
                        *slot = Some(id);
                        members.push(neighbor);
                        frontier.push(neighbor);
                    }
                }
            }
        }

        debug!(
            group = id.0,
            members = members.len(),
            perimeter = perimeter.len(),
            "face loop group complete"
        );
        groups.push(FaceLoopGroup {
            id,
            source,
            members,
            perimeter,
        });
    }

    let assignment: Vec<GroupId> = group_of.into_iter().flatten().collect();
    debug_assert_eq!(assignment.len(), loops.len());
    debug!(groups = groups.len(), "face loop grouping complete");
    Grouping { groups, assignment }
}
