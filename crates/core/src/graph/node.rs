//! Graph node: an ordered neighbor list with O(1) duplicate rejection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A directed edge `(distance, target id)`, also used as a search candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub distance: f32,
    pub id: u32,
}

impl Neighbor {
    #[inline]
    pub fn new(distance: f32, id: u32) -> Self {
        Self { distance, id }
    }

    /// Ascending by distance, ties broken by id so orderings are deterministic.
    #[inline]
    pub fn cmp_by_distance(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// Upper bound on edges accepted by unbounded-import insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegreeLimit {
    /// No limit: every non-duplicate edge is accepted.
    Unbounded,
    /// Accept edges while the node holds fewer than this many.
    AtMost(usize),
}

impl DegreeLimit {
    #[inline]
    pub fn admits(&self, current_len: usize) -> bool {
        match *self {
            DegreeLimit::Unbounded => true,
            DegreeLimit::AtMost(limit) => current_len < limit,
        }
    }
}

/// How [`GraphNode::add_neighbor`] treats a new edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPolicy {
    /// Keep at most `cap` edges sorted by distance; a full node accepts an edge
    /// only if it is strictly closer than its furthest one, which is evicted.
    Bounded(usize),
    /// Append in arrival order while the limit admits it.
    Import(DegreeLimit),
}

/// Whether a node's edge list is currently sorted by distance.
///
/// Import insertion keeps file arrival order, so "first edge = nearest" only
/// holds for `Sorted` lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOrder {
    Sorted,
    Arrival,
}

/// A vertex of the proximity graph.
///
/// The node's vector lives in the shared [`Dataset`](crate::Dataset) under the same id.
/// Invariants: no duplicate target, no self-edge. `members` always holds the
/// node's own id plus every current target.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: u32,
    neighbors: Vec<Neighbor>,
    members: HashSet<u32>,
    policy: InsertPolicy,
    order: EdgeOrder,
}

impl GraphNode {
    pub fn new(id: u32, policy: InsertPolicy) -> Self {
        let capacity = match policy {
            InsertPolicy::Bounded(cap) => cap + 1,
            InsertPolicy::Import(DegreeLimit::AtMost(limit)) => limit,
            InsertPolicy::Import(DegreeLimit::Unbounded) => 0,
        };
        let mut members = HashSet::with_capacity(capacity + 1);
        members.insert(id);
        Self {
            id,
            neighbors: Vec::with_capacity(capacity),
            members,
            policy,
            order: EdgeOrder::Sorted,
        }
    }

    /// Offer an edge under the node's insertion policy.
    ///
    /// Self-edges and targets already present are rejected without effect.
    /// Returns `true` if the edge was kept.
    pub fn add_neighbor(&mut self, distance: f32, id: u32) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        match self.policy {
            InsertPolicy::Bounded(cap) => self.insert_bounded(distance, id, cap),
            InsertPolicy::Import(limit) => {
                if limit.admits(self.neighbors.len()) {
                    self.push_unchecked(distance, id);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Append an edge ignoring any degree limit. Self and duplicate targets are
    /// still rejected. Used for reverse edges during bidirectionalization.
    pub fn push_edge(&mut self, distance: f32, id: u32) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        self.push_unchecked(distance, id);
        true
    }

    fn push_unchecked(&mut self, distance: f32, id: u32) {
        let edge = Neighbor::new(distance, id);
        if let Some(last) = self.neighbors.last() {
            if last.cmp_by_distance(&edge) == Ordering::Greater {
                self.order = EdgeOrder::Arrival;
            }
        }
        self.neighbors.push(edge);
        self.members.insert(id);
    }

    fn insert_bounded(&mut self, distance: f32, id: u32, cap: usize) -> bool {
        if cap == 0 {
            return false;
        }
        self.sort_neighbors();
        if self.neighbors.len() >= cap {
            // total order: a NaN distance never displaces a finite edge
            let furthest = self.neighbors[self.neighbors.len() - 1].distance;
            if distance.total_cmp(&furthest) != Ordering::Less {
                return false;
            }
        }
        let pos = self
            .neighbors
            .partition_point(|n| n.distance.total_cmp(&distance) != Ordering::Greater);
        self.neighbors.insert(pos, Neighbor::new(distance, id));
        self.members.insert(id);
        while self.neighbors.len() > cap {
            if let Some(evicted) = self.neighbors.pop() {
                self.members.remove(&evicted.id);
            }
        }
        true
    }

    /// Sort edges ascending by distance (no-op if already sorted).
    pub fn sort_neighbors(&mut self) {
        if self.order == EdgeOrder::Arrival {
            self.neighbors.sort_unstable_by(Neighbor::cmp_by_distance);
            self.order = EdgeOrder::Sorted;
        }
    }

    /// Replace the edge list wholesale. Dropped targets leave the membership set.
    /// Duplicate and self targets in `edges` are discarded.
    pub fn replace_neighbors(&mut self, edges: Vec<Neighbor>) {
        self.neighbors.clear();
        self.members.clear();
        self.members.insert(self.id);
        self.order = EdgeOrder::Sorted;
        for edge in edges {
            if !self.members.contains(&edge.id) {
                self.push_unchecked(edge.distance, edge.id);
            }
        }
    }

    #[inline]
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// Iterate target ids in list order.
    pub fn neighbor_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.neighbors.iter().map(|n| n.id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// `true` for the node's own id and for every current target.
    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.members.contains(&id)
    }

    pub fn is_sorted(&self) -> bool {
        self.order == EdgeOrder::Sorted
    }

    pub fn policy(&self) -> InsertPolicy {
        self.policy
    }
}
