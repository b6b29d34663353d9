// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face loops produced by intersecting two meshes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mesh vertex index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub usize);

/// Identity of the mesh a loop came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub usize);

/// Position of a loop inside a [`FaceLoopList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopId(pub usize);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loop#{}", self.0)
    }
}

/// Oriented edge, as walked by a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectedEdge {
    pub from: VertexId,
    pub to: VertexId,
}

impl DirectedEdge {
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }

    pub fn undirected(&self) -> Edge {
        Edge::new(self.from, self.to)
    }
}

/// Unordered vertex pair; the smaller id is always stored first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Edge(VertexId, VertexId);

impl Edge {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn vertices(&self) -> (VertexId, VertexId) {
        (self.0, self.1)
    }
}

impl From<(usize, usize)> for Edge {
    fn from((a, b): (usize, usize)) -> Self {
        Self::new(VertexId(a), VertexId(b))
    }
}

/// Cyclic vertex sequence bounding one surface patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceLoop {
    pub source: SourceId,
    pub vertices: Vec<VertexId>,
}

impl FaceLoop {
    pub fn new(source: SourceId, vertices: Vec<VertexId>) -> Self {
        Self { source, vertices }
    }

    pub fn from_indices(source: usize, vertices: &[usize]) -> Self {
        Self::new(SourceId(source), vertices.iter().copied().map(VertexId).collect())
    }

    /// Consecutive vertex pairs in winding order, closing back to the start
    ///
    /// Loops with fewer than two vertices have no edges.
    pub fn edges(&self) -> impl Iterator<Item = DirectedEdge> + '_ {
        let n = if self.vertices.len() < 2 {
            0
        } else {
            self.vertices.len()
        };
        (0..n).map(move |i| DirectedEdge::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }
}

/// Append-only list of face loops addressed by [`LoopId`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLoopList {
    loops: Vec<FaceLoop>,
}

impl FaceLoopList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, face_loop: FaceLoop) -> LoopId {
        self.loops.push(face_loop);
        LoopId(self.loops.len() - 1)
    }

    pub fn get(&self, id: LoopId) -> Option<&FaceLoop> {
        self.loops.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = LoopId> {
        (0..self.loops.len()).map(LoopId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LoopId, &FaceLoop)> {
        self.loops.iter().enumerate().map(|(i, l)| (LoopId(i), l))
    }
}

impl std::ops::Index<LoopId> for FaceLoopList {
    type Output = FaceLoop;

    fn index(&self, id: LoopId) -> &FaceLoop {
        &self.loops[id.0]
    }
}

impl FromIterator<FaceLoop> for FaceLoopList {
    fn from_iter<I: IntoIterator<Item = FaceLoop>>(iter: I) -> Self {
        Self {
            loops: iter.into_iter().collect(),
        }
    }
}
