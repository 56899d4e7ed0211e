use log::{debug, trace};

use crate::code_table::MAX_CODE_LEN;
use crate::error::{HuffmanError, Result};
use crate::frequency::{FrequencyTable, Symbol, symbols};
use crate::queue::NodeQueue;

/// A node of a Huffman tree. Following a `left` edge appends bit 1 to a
/// code, following a `right` edge appends bit 0.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Symbol),
    /// Reserved leaf whose code announces a literal byte.
    Escape {
        freq: f64,
    },
    Internal {
        freq: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// A branch no code leads to. Only trees rebuilt from an incomplete
    /// [`CodeTable`](crate::CodeTable) contain these.
    Vacant,
}

impl Node {
    pub fn frequency(&self) -> f64 {
        match self {
            Node::Leaf(symbol) => symbol.frequency,
            Node::Escape { freq } => *freq,
            Node::Internal { freq, .. } => *freq,
            Node::Vacant => 0.0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_) | Node::Escape { .. })
    }

    pub(crate) fn merge(left: Box<Node>, right: Box<Node>) -> Node {
        Node::Internal {
            freq: left.frequency() + right.frequency(),
            left,
            right,
        }
    }
}

/// A binary tree whose leaves are no deeper than [`MAX_CODE_LEN`].
///
/// Trees from [`build_tree`] are strict binary (or a lone leaf). Trees rebuilt
/// from a table mark positions no code reaches as [`Node::Vacant`].
#[derive(Debug, Clone, PartialEq)]
pub struct HuffmanTree {
    root: Box<Node>,
}

impl HuffmanTree {
    /// Callers guarantee the tree is within the depth bound.
    pub(crate) fn from_root(root: Box<Node>) -> Self {
        HuffmanTree { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Length of the longest root-to-leaf path. A lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root.as_ref(), 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                Node::Internal { left, right, .. } => {
                    stack.push((&**left, depth + 1));
                    stack.push((&**right, depth + 1));
                }
                Node::Vacant => {}
                _ => max_depth = max_depth.max(depth),
            }
        }
        max_depth
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root.as_ref()];
        while let Some(node) = stack.pop() {
            match node {
                Node::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                Node::Vacant => {}
                _ => count += 1,
            }
        }
        count
    }

    pub fn has_escape(&self) -> bool {
        let mut stack = vec![self.root.as_ref()];
        while let Some(node) = stack.pop() {
            match node {
                Node::Escape { .. } => return true,
                Node::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                Node::Leaf(_) | Node::Vacant => {}
            }
        }
        false
    }
}

/// Builds a Huffman tree with one leaf per entry of `frequencies`.
pub fn build_tree(frequencies: &FrequencyTable) -> Result<HuffmanTree> {
    build(frequencies, false)
}

/// Like [`build_tree`], with an extra zero-frequency escape leaf so bytes
/// missing from `frequencies` can still be encoded as literals.
pub fn build_tree_with_escape(frequencies: &FrequencyTable) -> Result<HuffmanTree> {
    build(frequencies, true)
}

fn build(frequencies: &FrequencyTable, with_escape: bool) -> Result<HuffmanTree> {
    debug!(
        "Building Huffman tree from {} unique symbols (escape: {})",
        frequencies.len(),
        with_escape
    );

    if frequencies.is_empty() {
        return Err(HuffmanError::EmptyInput);
    }

    let mut queue = NodeQueue::with_capacity(frequencies.len() + 1);
    for symbol in symbols(frequencies) {
        if !symbol.frequency.is_finite() || symbol.frequency < 0.0 {
            return Err(HuffmanError::InvalidFrequency {
                byte: symbol.value,
                frequency: symbol.frequency,
            });
        }
        queue.push(Box::new(Node::Leaf(symbol)));
    }
    if with_escape {
        queue.push(Box::new(Node::Escape { freq: 0.0 }));
    }
    debug!("Initial queue size: {}", queue.len());

    // The first node extracted becomes the left (bit 1) child.
    while let Some((left, right)) = queue.pop_two_lowest() {
        let merged = Node::merge(left, right);
        trace!("Merged two nodes into weight {:.6}", merged.frequency());
        queue.push(Box::new(merged));
    }

    let root = queue.into_root().ok_or(HuffmanError::EmptyInput)?;
    let tree = HuffmanTree::from_root(root);

    let depth = tree.depth();
    if depth > MAX_CODE_LEN {
        return Err(HuffmanError::CodeTooLong { length: depth });
    }

    debug!(
        "Tree construction complete: {} leaves, depth {}",
        tree.leaf_count(),
        depth
    );
    Ok(tree)
}
