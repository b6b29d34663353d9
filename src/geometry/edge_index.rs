// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge-to-loop adjacency and seam edge detection

use super::face_loop::{DirectedEdge, Edge, FaceLoopList, LoopId};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Map from each oriented edge to the loops that walk it
#[derive(Debug, Clone, Default)]
pub struct EdgeAdjacencyIndex {
    edges: AHashMap<DirectedEdge, Vec<LoopId>>,
}

impl EdgeAdjacencyIndex {
    /// Index every consecutive vertex pair of every loop, in winding order
    pub fn build(loops: &FaceLoopList) -> Self {
        let mut edges: AHashMap<DirectedEdge, Vec<LoopId>> = AHashMap::new();
        for (id, face_loop) in loops.iter() {
            for edge in face_loop.edges() {
                edges.entry(edge).or_default().push(id);
            }
        }
        Self { edges }
    }

    /// Loops walking `edge` in this direction, in loop order
    pub fn loops_on(&self, edge: DirectedEdge) -> &[LoopId] {
        self.edges.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, edge: DirectedEdge) -> bool {
        self.edges.contains_key(&edge)
    }

    /// Number of distinct directed edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn directed_edges(&self) -> impl Iterator<Item = DirectedEdge> + '_ {
        self.edges.keys().copied()
    }
}

/// How edges of one mesh are matched against the other's index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeamMatch {
    /// The same oriented edge must exist in both indexes
    #[default]
    Directed,
    /// Either orientation in the second index counts
    EitherDirection,
}

impl FromStr for SeamMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "directed" => Ok(Self::Directed),
            "either" | "either_direction" => Ok(Self::EitherDirection),
            other => Err(format!("unknown seam match mode '{other}'")),
        }
    }
}

/// Undirected edges shared by two meshes; grouping never crosses them
#[derive(Debug, Clone, Default)]
pub struct SeamEdgeSet {
    edges: AHashSet<Edge>,
}

impl SeamEdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edges present under the same orientation in both indexes
    pub fn shared(a: &EdgeAdjacencyIndex, b: &EdgeAdjacencyIndex) -> Self {
        Self::between(a, b, SeamMatch::Directed)
    }

    #[instrument(skip(a, b), fields(a_edges = a.len(), b_edges = b.len()))]
    pub fn between(a: &EdgeAdjacencyIndex, b: &EdgeAdjacencyIndex, mode: SeamMatch) -> Self {
        let edges: AHashSet<Edge> = a
            .directed_edges()
            .filter(|edge| match mode {
                SeamMatch::Directed => b.contains(*edge),
                SeamMatch::EitherDirection => b.contains(*edge) || b.contains(edge.reversed()),
            })
            .map(|edge| edge.undirected())
            .collect();
        debug!(seams = edges.len(), "seam edges computed");
        Self { edges }
    }

    pub fn from_edges<I: IntoIterator<Item = Edge>>(edges: I) -> Self {
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, edge: Edge) -> bool {
        self.edges.insert(edge)
    }

    pub fn contains(&self, edge: Edge) -> bool {
        self.edges.contains(&edge)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Seam edges in ascending order
    pub fn sorted(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edges.iter().copied().collect();
        edges.sort_unstable();
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::face_loop::{FaceLoop, VertexId};

    fn directed(a: usize, b: usize) -> DirectedEdge {
        DirectedEdge::new(VertexId(a), VertexId(b))
    }

    #[test]
    fn test_build_indexes_each_directed_edge() {
        let loops: FaceLoopList = [
            FaceLoop::from_indices(0, &[0, 1, 2]),
            FaceLoop::from_indices(0, &[2, 1, 3]),
        ]
        .into_iter()
        .collect();
        let index = EdgeAdjacencyIndex::build(&loops);

        assert_eq!(index.len(), 6);
        assert_eq!(index.loops_on(directed(1, 2)), &[LoopId(0)]);
        assert_eq!(index.loops_on(directed(2, 1)), &[LoopId(1)]);
        assert!(index.loops_on(directed(0, 3)).is_empty());
    }

    #[test]
    fn test_shared_requires_same_direction() {
        let a: FaceLoopList = [FaceLoop::from_indices(0, &[0, 1, 2])].into_iter().collect();
        let same: FaceLoopList = [FaceLoop::from_indices(1, &[1, 2, 7])].into_iter().collect();
        let reversed: FaceLoopList = [FaceLoop::from_indices(1, &[2, 1, 7])].into_iter().collect();

        let index_a = EdgeAdjacencyIndex::build(&a);
        let seams = SeamEdgeSet::shared(&index_a, &EdgeAdjacencyIndex::build(&same));
        assert_eq!(seams.sorted(), vec![Edge::from((1, 2))]);

        let index_reversed = EdgeAdjacencyIndex::build(&reversed);
        assert!(SeamEdgeSet::shared(&index_a, &index_reversed).is_empty());

        let either = SeamEdgeSet::between(&index_a, &index_reversed, SeamMatch::EitherDirection);
        assert!(either.contains(Edge::from((2, 1))));
    }

    #[test]
    fn test_seam_match_parses() {
        assert_eq!("directed".parse::<SeamMatch>(), Ok(SeamMatch::Directed));
        assert_eq!("Either".parse::<SeamMatch>(), Ok(SeamMatch::EitherDirection));
        assert!("sideways".parse::<SeamMatch>().is_err());
    }
}
