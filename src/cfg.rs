use alloc::{vec, vec::Vec};

use smallvec::SmallVec;

/// A basic block number.
///
/// Block numbers are 1-based. The value 0 is reserved to mean "no block";
/// it also appears in predecessor lists to denote an absent/virtual edge,
/// which the dominator computations skip.
pub type BlockNum = u32;

/// The entry block of a function always has this number.
pub const ENTRY_BLOCK: BlockNum = 1;

/// A read-only view of a control-flow graph, as consumed by the dominator
/// tree computations.
///
/// The graph is a fixed snapshot: implementations must not change while a
/// tree operation is running over them. Blocks are identified by 1-based
/// [BlockNum]s, with [ENTRY_BLOCK] as the entry of the function.
pub trait FlowGraph {
    /// The number of blocks in the graph, including unreachable ones.
    ///
    /// Valid block numbers are `1..=num_blocks()`.
    fn num_blocks(&self) -> usize;

    /// The predecessors of `block`, in a stable order.
    ///
    /// An entry of 0 denotes a virtual edge (e.g. entry into a catch
    /// handler); such entries are only permitted where a post-dominator
    /// traversal will consume them.
    fn preds(&self, block: BlockNum) -> &[BlockNum];

    /// The successors of `block`, in a stable order.
    fn succs(&self, block: BlockNum) -> &[BlockNum];
}

impl<G: FlowGraph + ?Sized> FlowGraph for &G {
    #[inline]
    fn num_blocks(&self) -> usize {
        (**self).num_blocks()
    }

    #[inline]
    fn preds(&self, block: BlockNum) -> &[BlockNum] {
        (**self).preds(block)
    }

    #[inline]
    fn succs(&self, block: BlockNum) -> &[BlockNum] {
        (**self).succs(block)
    }
}

#[derive(Debug, Default, Clone)]
struct BlockEdges {
    preds: SmallVec<[BlockNum; 2]>,
    succs: SmallVec<[BlockNum; 2]>,
}

/// A minimal adjacency-list [FlowGraph] implementation.
///
/// This type carries no policy of its own; it exists so that clients (and
/// the tests of this crate) have a concrete graph to hand to the tree
/// computations. Block 0 is reserved, so internal storage keeps a dummy
/// entry at index 0.
#[derive(Debug, Default, Clone)]
pub struct ControlFlowGraph {
    blocks: Vec<BlockEdges>,
}

impl ControlFlowGraph {
    /// Create a graph with `n_blocks` blocks and no edges.
    pub fn with_blocks(n_blocks: usize) -> Self {
        Self {
            blocks: vec![BlockEdges::default(); n_blocks + 1],
        }
    }

    /// Create a graph with `n_blocks` blocks and the given edges.
    pub fn from_edges(n_blocks: usize, edges: &[(BlockNum, BlockNum)]) -> Self {
        let mut graph = Self::with_blocks(n_blocks);
        for &(from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    /// Append a new block, returning its number.
    pub fn add_block(&mut self) -> BlockNum {
        if self.blocks.is_empty() {
            self.blocks.push(BlockEdges::default());
        }
        self.blocks.push(BlockEdges::default());
        (self.blocks.len() - 1) as BlockNum
    }

    /// Add an edge from `from` to `to`.
    ///
    /// A `from` of 0 records a virtual predecessor edge on `to`, without a
    /// corresponding successor entry anywhere.
    pub fn add_edge(&mut self, from: BlockNum, to: BlockNum) {
        assert!(
            to != 0 && (to as usize) < self.blocks.len(),
            "invalid destination block {to}"
        );
        if from == 0 {
            self.blocks[to as usize].preds.push(0);
            return;
        }
        self.blocks[from as usize].succs.push(to);
        self.blocks[to as usize].preds.push(from);
    }

    /// Remove one occurrence of the edge from `from` to `to`, if present.
    pub fn remove_edge(&mut self, from: BlockNum, to: BlockNum) {
        let succs = &mut self.blocks[from as usize].succs;
        if let Some(at) = succs.iter().position(|&b| b == to) {
            succs.remove(at);
        }
        let preds = &mut self.blocks[to as usize].preds;
        if let Some(at) = preds.iter().position(|&b| b == from) {
            preds.remove(at);
        }
    }
}

impl FlowGraph for ControlFlowGraph {
    fn num_blocks(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    fn preds(&self, block: BlockNum) -> &[BlockNum] {
        &self.blocks[block as usize].preds
    }

    fn succs(&self, block: BlockNum) -> &[BlockNum] {
        &self.blocks[block as usize].succs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_lists() {
        let mut graph = ControlFlowGraph::with_blocks(2);
        let b3 = graph.add_block();
        assert_eq!(b3, 3);
        assert_eq!(graph.num_blocks(), 3);

        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        graph.add_edge(2, 3);
        assert_eq!(graph.succs(1), &[2, 3]);
        assert_eq!(graph.preds(3), &[1, 2]);

        graph.remove_edge(1, 3);
        assert_eq!(graph.succs(1), &[2]);
        assert_eq!(graph.preds(3), &[2]);
    }

    #[test]
    fn virtual_predecessor() {
        let mut graph = ControlFlowGraph::with_blocks(2);
        graph.add_edge(1, 2);
        graph.add_edge(0, 2);
        assert_eq!(graph.preds(2), &[1, 0]);
        assert_eq!(graph.succs(1), &[2]);
    }
}
