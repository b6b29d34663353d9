// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Generic n-dimensional k-d tree
//!
//! Nodes live in an arena owned by the tree. Each node records its parent as a
//! plain key, so upward traversal never needs shared ownership. Item placement
//! (bounding box, routing, distances) is delegated to a [`PlacementPolicy`]
//! supplied when the tree is created.

use super::aabb::Aabb;
use super::nearest::NearestNeighbors;
use crate::config::TreeConfig;
use crate::error::{Result, TopologyError};
use nalgebra::Point;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, instrument, trace, warn};

new_key_type! {
    /// Key of a node inside a [`SpatialTree`]
    pub struct NodeId;
}

/// Side of a split plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Negative,
    Positive,
}

/// Resolved split plane of an internal node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPosition {
    pub axis: usize,
    pub position: f64,
}

impl SplitPosition {
    pub fn new(axis: usize, position: f64) -> Self {
        Self { axis, position }
    }

    /// Coordinates strictly below the plane go negative, everything else positive
    pub fn side_of(&self, coordinate: f64) -> Side {
        if coordinate < self.position {
            Side::Negative
        } else {
            Side::Positive
        }
    }

    pub fn side_of_point<const N: usize>(&self, point: &Point<f64, N>) -> Side {
        self.side_of(point.coords[self.axis])
    }

    /// Signed offset of `point` from the plane along the split axis
    pub fn signed_distance<const N: usize>(&self, point: &Point<f64, N>) -> f64 {
        point.coords[self.axis] - self.position
    }
}

/// Caller-side split description; unset fields are chosen by [`SpatialTree::split`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SplitRequest {
    pub axis: Option<usize>,
    pub position: Option<f64>,
}

impl SplitRequest {
    /// Let the tree choose both axis and position
    pub fn auto() -> Self {
        Self::default()
    }

    /// Fixed axis, position at the node's bounding-box center
    pub fn on_axis(axis: usize) -> Self {
        Self {
            axis: Some(axis),
            position: None,
        }
    }

    pub fn at(axis: usize, position: f64) -> Self {
        Self {
            axis: Some(axis),
            position: Some(position),
        }
    }

    pub fn validate<const N: usize>(&self) -> Result<()> {
        if let Some(axis) = self.axis {
            if axis >= N {
                return Err(TopologyError::AxisOutOfRange { axis, dimension: N });
            }
        }
        if let Some(position) = self.position {
            if !position.is_finite() {
                return Err(TopologyError::NonFiniteSplit(position));
            }
        }
        Ok(())
    }
}

impl From<SplitPosition> for SplitRequest {
    fn from(split: SplitPosition) -> Self {
        Self::at(split.axis, split.position)
    }
}

/// Strategy describing how items are measured and routed
pub trait PlacementPolicy<const N: usize> {
    type Item: PartialEq;

    /// Bounding box of an item
    fn aabb(&self, item: &Self::Item) -> Aabb<N>;

    /// Representative coordinate of an item along `axis`
    fn coordinate(&self, item: &Self::Item, axis: usize) -> f64;

    /// Distance from an item to a query point
    fn distance(&self, item: &Self::Item, point: &Point<f64, N>) -> f64;

    fn side(&self, item: &Self::Item, split: &SplitPosition) -> Side {
        split.side_of(self.coordinate(item, split.axis))
    }

    /// Lower bound on the distance from `point` to anything across `split`
    fn split_distance(&self, split: &SplitPosition, point: &Point<f64, N>) -> f64 {
        split.signed_distance(point).abs()
    }
}

/// Leaf or internal payload of a node
#[derive(Debug, Clone)]
pub enum NodeKind<T> {
    Leaf {
        items: Vec<T>,
    },
    Internal {
        split: SplitPosition,
        negative: NodeId,
        positive: NodeId,
    },
}

/// Tree node
#[derive(Debug, Clone)]
pub struct Node<T> {
    parent: Option<NodeId>,
    kind: NodeKind<T>,
}

impl<T> Node<T> {
    fn leaf(parent: Option<NodeId>, items: Vec<T>) -> Self {
        Self {
            parent,
            kind: NodeKind::Leaf { items },
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind<T> {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Items held by a leaf; always empty for internal nodes
    pub fn items(&self) -> &[T] {
        match &self.kind {
            NodeKind::Leaf { items } => items,
            NodeKind::Internal { .. } => &[],
        }
    }

    pub fn split(&self) -> Option<SplitPosition> {
        match self.kind {
            NodeKind::Internal { split, .. } => Some(split),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// `(negative, positive)` children of an internal node
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Internal {
                negative, positive, ..
            } => Some((negative, positive)),
            NodeKind::Leaf { .. } => None,
        }
    }
}

/// Binary spatial partition over opaque items
///
/// Mutating the tree (insert, remove, split) while a [`NearestNeighbors`]
/// cursor borrows it is rejected by the borrow checker.
pub struct SpatialTree<P: PlacementPolicy<N>, const N: usize> {
    nodes: SlotMap<NodeId, Node<P::Item>>,
    root: NodeId,
    policy: P,
    len: usize,
}

impl<P: PlacementPolicy<N>, const N: usize> SpatialTree<P, N> {
    /// Create a tree consisting of a single empty leaf
    pub fn new(policy: P) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::leaf(None, Vec::new()));
        Self {
            nodes,
            root,
            policy,
            len: 0,
        }
    }

    /// Build a tree from `items` and subdivide it by leaf occupancy
    pub fn from_items<I>(policy: P, items: I, config: &TreeConfig) -> Self
    where
        I: IntoIterator<Item = P::Item>,
    {
        let mut tree = Self::new(policy);
        let root = tree.root;
        if let NodeKind::Leaf { items: leaf } = &mut tree.nodes[root].kind {
            leaf.extend(items);
            tree.len = leaf.len();
        }
        tree.split_by_occupancy(config);
        tree
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Panics if `id` does not belong to this tree
    pub fn node(&self, id: NodeId) -> &Node<P::Item> {
        &self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<P::Item>> {
        self.nodes.get(id)
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.values().filter(|node| node.is_leaf()).count()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].is_leaf()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.nodes[id].children()
    }

    /// The other child of `id`'s parent
    pub fn sibling(&self, id: NodeId) -> Option<NodeId> {
        let (negative, positive) = self.children(self.parent(id)?)?;
        Some(if negative == id { positive } else { negative })
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        std::iter::successors(self.parent(id), |p| self.parent(*p)).count()
    }

    /// Bounding box of everything stored below `id`
    ///
    /// Nodes without items yield [`Aabb::degenerate`].
    pub fn node_aabb(&self, id: NodeId) -> Aabb<N> {
        self.bounds(id).unwrap_or_default()
    }

    fn bounds(&self, id: NodeId) -> Option<Aabb<N>> {
        match &self.nodes[id].kind {
            NodeKind::Leaf { items } => items
                .iter()
                .map(|item| self.policy.aabb(item))
                .reduce(|acc, b| acc.union(&b)),
            NodeKind::Internal {
                negative, positive, ..
            } => match (self.bounds(*negative), self.bounds(*positive)) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            },
        }
    }

    /// Leaves below `id`, negative side first
    pub fn leaves_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.nodes[current].children() {
                Some((negative, positive)) => {
                    stack.push(positive);
                    stack.push(negative);
                }
                None => leaves.push(current),
            }
        }
        leaves
    }

    /// Every stored item, leaf by leaf
    pub fn items(&self) -> impl Iterator<Item = &P::Item> + '_ {
        self.leaves_under(self.root)
            .into_iter()
            .flat_map(move |leaf| self.nodes[leaf].items().iter())
    }

    /// Split the leaf `id`
    ///
    /// Returns `false` without touching the tree when `id` is already
    /// internal or the request is invalid. An unset axis becomes the largest
    /// extent of the leaf's bounding box, skipping the parent's axis when
    /// another axis has room; an unset position becomes the box center.
    pub fn split(&mut self, id: NodeId, request: SplitRequest) -> bool {
        if !self.nodes[id].is_leaf() {
            return false;
        }
        let validated = request.validate::<N>();
        debug_assert!(validated.is_ok(), "invalid split request: {validated:?}");
        if let Err(err) = validated {
            warn!(error = %err, "rejected split request");
            return false;
        }

        let aabb = if request.axis.is_none() || request.position.is_none() {
            self.node_aabb(id)
        } else {
            Aabb::degenerate()
        };
        let axis = request.axis.unwrap_or_else(|| self.choose_axis(id, &aabb));
        let split = SplitPosition::new(axis, request.position.unwrap_or(aabb.center[axis]));

        let items = match &mut self.nodes[id].kind {
            NodeKind::Leaf { items } => std::mem::take(items),
            NodeKind::Internal { .. } => return false,
        };
        let (negative_items, positive_items): (Vec<_>, Vec<_>) = items
            .into_iter()
            .partition(|item| self.policy.side(item, &split) == Side::Negative);

        trace!(
            axis = split.axis,
            position = split.position,
            negative = negative_items.len(),
            positive = positive_items.len(),
            "split leaf"
        );

        let negative = self.nodes.insert(Node::leaf(Some(id), negative_items));
        let positive = self.nodes.insert(Node::leaf(Some(id), positive_items));
        self.nodes[id].kind = NodeKind::Internal {
            split,
            negative,
            positive,
        };
        true
    }

    fn choose_axis(&self, id: NodeId, aabb: &Aabb<N>) -> usize {
        let largest = aabb.largest_axis();
        let parent_axis = self
            .parent(id)
            .and_then(|parent| self.nodes[parent].split())
            .map(|split| split.axis);

        match parent_axis {
            Some(parent_axis) if parent_axis == largest => {
                let only_axis_with_room = aabb.extent[parent_axis] > 0.0
                    && (0..N)
                        .filter(|axis| *axis != parent_axis)
                        .all(|axis| aabb.extent[axis] == 0.0);
                if only_axis_with_room {
                    parent_axis
                } else {
                    aabb.largest_axis_excluding(parent_axis)
                }
            }
            _ => largest,
        }
    }

    /// Split `id` and then each resulting child, `count` levels deep
    ///
    /// Nodes that are already internal stop the descent along their branch.
    #[instrument(skip(self), level = "debug")]
    pub fn split_n(&mut self, id: NodeId, count: usize) {
        let mut stack = vec![(id, count)];
        while let Some((current, remaining)) = stack.pop() {
            if remaining == 0 || !self.split(current, SplitRequest::auto()) {
                continue;
            }
            if let Some((negative, positive)) = self.children(current) {
                stack.push((positive, remaining - 1));
                stack.push((negative, remaining - 1));
            }
        }
        debug!(leaves = self.leaf_count(), "bulk subdivision complete");
    }

    /// Subdivide below `id` as directed by `predicate`
    ///
    /// The predicate is asked about every leaf reached, together with its
    /// depth relative to `id`; returning `None` leaves it alone. Children of
    /// internal nodes are always visited. The predicate must eventually
    /// return `None` (a depth bound such as [`TreeConfig::max_depth`] is the
    /// usual guard), otherwise subdivision never ends.
    #[instrument(skip(self, predicate), level = "debug")]
    pub fn split_by_predicate<F>(&mut self, id: NodeId, mut predicate: F)
    where
        F: FnMut(&Self, NodeId, usize) -> Option<SplitRequest>,
    {
        let mut stack = vec![(id, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            if self.is_leaf(current) {
                match predicate(&*self, current, depth) {
                    Some(request) => {
                        self.split(current, request);
                    }
                    None => continue,
                }
            }
            if let Some((negative, positive)) = self.children(current) {
                stack.push((positive, depth + 1));
                stack.push((negative, depth + 1));
            }
        }
    }

    /// Subdivide the whole tree until every leaf is small, flat, or deep enough
    pub fn split_by_occupancy(&mut self, config: &TreeConfig) {
        let max_items = config.max_leaf_items;
        let max_depth = config.max_depth;
        let root = self.root;
        self.split_by_predicate(root, |tree, node, depth| {
            let crowded = tree.node(node).items().len() > max_items;
            if crowded && depth < max_depth && !tree.node_aabb(node).is_degenerate() {
                Some(SplitRequest::auto())
            } else {
                None
            }
        });
        debug!(
            items = self.len,
            leaves = self.leaf_count(),
            "occupancy subdivision complete"
        );
    }

    /// Leaf that `item` routes to
    pub fn find_leaf(&self, item: &P::Item) -> NodeId {
        let mut current = self.root;
        while let NodeKind::Internal {
            split,
            negative,
            positive,
        } = &self.nodes[current].kind
        {
            current = match self.policy.side(item, split) {
                Side::Negative => *negative,
                Side::Positive => *positive,
            };
        }
        current
    }

    /// Leaf whose region contains `point`
    pub fn leaf_for_point(&self, point: &Point<f64, N>) -> NodeId {
        let mut current = self.root;
        while let NodeKind::Internal {
            split,
            negative,
            positive,
        } = &self.nodes[current].kind
        {
            current = match split.side_of_point(point) {
                Side::Negative => *negative,
                Side::Positive => *positive,
            };
        }
        current
    }

    /// Store `item` in the leaf it routes to and return that leaf
    pub fn insert(&mut self, item: P::Item) -> NodeId {
        let leaf = self.find_leaf(&item);
        if let NodeKind::Leaf { items } = &mut self.nodes[leaf].kind {
            items.push(item);
            self.len += 1;
        }
        leaf
    }

    /// Remove the first stored item equal to `item`
    ///
    /// Removing an item that was never inserted is a no-op returning `None`.
    pub fn remove(&mut self, item: &P::Item) -> Option<P::Item> {
        let leaf = self.find_leaf(item);
        let NodeKind::Leaf { items } = &mut self.nodes[leaf].kind else {
            return None;
        };
        let index = items.iter().position(|stored| stored == item)?;
        self.len -= 1;
        Some(items.remove(index))
    }

    pub fn contains(&self, item: &P::Item) -> bool {
        self.nodes[self.find_leaf(item)].items().contains(item)
    }

    /// Visit every leaf that may hold something within `radius` of `point`
    pub fn close_nodes<F>(&self, point: &Point<f64, N>, radius: f64, mut visit: F)
    where
        F: FnMut(NodeId, &[P::Item]),
    {
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            match &self.nodes[current].kind {
                NodeKind::Leaf { items } => visit(current, items),
                NodeKind::Internal {
                    split,
                    negative,
                    positive,
                } => {
                    let delta = split.signed_distance(point);
                    if delta >= -radius {
                        stack.push(*positive);
                    }
                    if delta <= radius {
                        stack.push(*negative);
                    }
                }
            }
        }
    }

    /// Items whose distance to `point` is at most `radius`
    pub fn within_radius(&self, point: &Point<f64, N>, radius: f64) -> Vec<&P::Item> {
        let mut found = Vec::new();
        self.close_nodes(point, radius, |leaf, _| {
            found.extend(
                self.nodes[leaf]
                    .items()
                    .iter()
                    .filter(|item| self.policy.distance(item, point) <= radius),
            );
        });
        found
    }

    /// Lazy cursor yielding items by increasing distance from `point`
    pub fn nearest(&self, point: Point<f64, N>) -> NearestNeighbors<'_, P, N> {
        NearestNeighbors::new(self, point)
    }

    pub fn k_nearest(&self, point: Point<f64, N>, k: usize) -> Vec<(f64, &P::Item)> {
        self.nearest(point).take(k).collect()
    }

    /// Check parent links and that every item sits in the leaf it routes to
    pub fn is_consistent(&self) -> bool {
        let mut counted = 0;
        for (id, node) in &self.nodes {
            if let Some((negative, positive)) = node.children() {
                if self.nodes[negative].parent != Some(id)
                    || self.nodes[positive].parent != Some(id)
                {
                    return false;
                }
            }
            for item in node.items() {
                if self.find_leaf(item) != id {
                    return false;
                }
                counted += 1;
            }
        }
        counted == self.len && self.nodes[self.root].parent.is_none()
    }
}
