use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::huffman::Node;

struct HeapNode {
    freq: f64,
    seq: u64,
    node: Box<Node>,
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap.
        // Equal frequencies pop in insertion order.
        other
            .freq
            .total_cmp(&self.freq)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapNode {}

/// Frequency-ordered queue of tree nodes backing tree construction.
#[derive(Default)]
pub struct NodeQueue {
    heap: BinaryHeap<HeapNode>,
    next_seq: u64,
}

impl NodeQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        NodeQueue {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn push(&mut self, node: Box<Node>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapNode {
            freq: node.frequency(),
            seq,
            node,
        });
    }

    /// Removes the two lowest-frequency nodes, lowest first.
    /// Returns `None` (and leaves the queue untouched) with fewer than two entries.
    pub fn pop_two_lowest(&mut self) -> Option<(Box<Node>, Box<Node>)> {
        if self.heap.len() < 2 {
            return None;
        }
        let first = self.heap.pop()?;
        let second = self.heap.pop()?;
        Some((first.node, second.node))
    }

    /// The remaining node once merging is done.
    pub fn into_root(mut self) -> Option<Box<Node>> {
        if self.heap.len() != 1 {
            return None;
        }
        self.heap.pop().map(|n| n.node)
    }
}
