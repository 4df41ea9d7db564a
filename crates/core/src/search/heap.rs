//! Heap wrappers used by beam search.
//!
//! `BinaryHeap` is a max-heap. The frontier stores negated distances to pop the
//! nearest candidate first; the best-pool keeps plain distances so the worst
//! entry sits on top and can be evicted in O(log n).

use crate::graph::node::Neighbor;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Frontier entry. Ordered so that the nearest (then lowest id) pops first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    neg_distance: OrderedFloat<f32>,
    id: u32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.neg_distance
            .cmp(&other.neg_distance)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-ordered expansion queue.
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<Candidate>,
}

impl Frontier {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, neighbor: Neighbor) {
        self.heap.push(Candidate {
            neg_distance: OrderedFloat(-neighbor.distance),
            id: neighbor.id,
        });
    }

    /// Remove and return the nearest candidate.
    pub fn pop(&mut self) -> Option<Neighbor> {
        self.heap
            .pop()
            .map(|c| Neighbor::new(-c.neg_distance.0, c.id))
    }
}

/// Best-pool entry. Ordered so that the furthest (then highest id) sits on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PoolEntry {
    distance: OrderedFloat<f32>,
    id: u32,
}

impl Ord for PoolEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for PoolEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fixed-capacity max-heap keeping the `capacity` nearest entries seen so far.
#[derive(Debug)]
pub struct BoundedMaxHeap {
    heap: BinaryHeap<PoolEntry>,
    capacity: usize,
}

impl BoundedMaxHeap {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity,
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Distance of the furthest kept entry.
    #[inline]
    pub fn worst(&self) -> Option<f32> {
        self.heap.peek().map(|e| e.distance.0)
    }

    /// `true` if `distance` would be kept: the heap has room or it beats the worst entry.
    #[inline]
    pub fn admits(&self, distance: f32) -> bool {
        !self.is_full() || self.worst().is_some_and(|worst| distance < worst)
    }

    /// Insert unconditionally, then evict the worst entry on overflow.
    /// Returns the evicted entry, which may be the one just inserted.
    pub fn push(&mut self, neighbor: Neighbor) -> Option<Neighbor> {
        self.heap.push(PoolEntry {
            distance: OrderedFloat(neighbor.distance),
            id: neighbor.id,
        });
        if self.heap.len() > self.capacity {
            self.heap
                .pop()
                .map(|e| Neighbor::new(e.distance.0, e.id))
        } else {
            None
        }
    }

    /// All kept entries, ascending by distance.
    pub fn into_sorted_vec(self) -> Vec<Neighbor> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| Neighbor::new(e.distance.0, e.id))
            .collect()
    }
}
