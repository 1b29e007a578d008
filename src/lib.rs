//! Dominator and post-dominator trees for control-flow graphs.
//!
//! A block `a` dominates a block `b` when every path from the entry to
//! `b` passes through `a`; post-dominance is the same relation on the
//! reversed graph, taken from the exits. This crate computes both trees
//! over any CFG exposed through the [FlowGraph] trait, keeps a forward
//! tree up to date across single-edge insertions and deletions without
//! rebuilding it from scratch, and answers the dominance queries used by
//! SSA construction, code motion, and the other passes downstream of a
//! compiler's middle end.
//!
//! Construction uses the Semi-NCA algorithm (Georgiadis, "Linear-Time
//! Algorithms for Dominators and Related Problems", 2005); the
//! incremental updates classify each edge change against the DFS
//! numbering and recompute only the affected prefix of semidominators
//! (Georgiadis et al., "An Experimental Study of Dynamic Dominators",
//! 2016).
//!
//! ```
//! use domtree::{ControlFlowGraph, DomTree};
//!
//! let mut cfg = ControlFlowGraph::from_edges(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
//! let mut tree = DomTree::new(&cfg).unwrap();
//! assert!(tree.dominates(1, 4));
//! assert!(!tree.dominates(2, 4));
//!
//! cfg.add_edge(2, 3);
//! tree.insert_edge(&cfg, 2, 3);
//! assert_eq!(tree.idom(3), 1);
//! ```
#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod cfg;
mod dfs;
mod frontier;
mod naive;
mod snca;
mod tree;

pub use self::{
    cfg::{BlockNum, ControlFlowGraph, ENTRY_BLOCK, FlowGraph},
    dfs::{DfsTree, PostNum, PreNum},
    frontier::DominanceFrontier,
    naive::naive_idoms,
    tree::{
        DomTree, DomTreeError, DomTreeNode, DomTreeVerificationLevel, DominatedBlocks,
        GenericDomTree, PostDomTree,
    },
};
