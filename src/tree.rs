use alloc::{vec, vec::Vec};
use core::fmt;

use smallvec::{SmallVec, smallvec};

use crate::{
    cfg::{BlockNum, ENTRY_BLOCK, FlowGraph},
    dfs::{DfsTree, PostNum, PreNum},
    naive::naive_idoms,
    snca::SncaData,
};

#[derive(Debug, thiserror::Error)]
pub enum DomTreeError {
    /// Tried to compute a dominator tree for a CFG with no blocks
    #[error("unable to construct a dominator tree for an empty control-flow graph")]
    EmptyGraph,
}

/// The level of checking performed by [GenericDomTree::verify]
pub enum DomTreeVerificationLevel {
    /// Compares with a freshly constructed tree.
    Fast,
    /// Additionally checks the structural tree invariants: immediate
    /// dominators precede their blocks in preorder, levels increase by one
    /// along tree edges, and children lists agree with the immediate
    /// dominators and stay sorted.
    Basic,
    /// Additionally compares immediate dominators against the naive
    /// iterative-dataflow reference implementation. O(n^2) and up; meant
    /// for tests and debugging.
    Full,
}

/// A forward dominance tree
pub type DomTree = GenericDomTree<false>;

/// A post (backward) dominance tree
pub type PostDomTree = GenericDomTree<true>;

/// A node in a dominator tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DomTreeNode {
    level: u32,
    children: SmallVec<[BlockNum; 4]>,
}

impl DomTreeNode {
    /// The depth of this node in the tree; roots are at level 1.
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// The blocks immediately dominated by this node, in ascending order.
    #[inline]
    pub fn children(&self) -> &[BlockNum] {
        &self.children
    }
}

/// A dominator tree implementation that abstracts over the type of
/// dominance it represents.
///
/// The tree is stored as flat arrays indexed by block number and by DFS
/// preorder number, with slot 0 of every array reserved: `idoms_bb[b]` is
/// the immediate dominator of block `b` (0 for roots and unreachable
/// blocks), and `nodes[b]` carries the tree level and children of `b`.
/// All arrays are resized in place across updates, and queries never
/// allocate.
///
/// Forward trees have a single root, [ENTRY_BLOCK]. Post-dominator trees
/// are computed over the reversed CFG from a virtual exit, which exists
/// only during the traversal; every block whose immediate dominator is 0
/// (i.e. every exit, and the representatives of infinite loops reached by
/// no exit) is a root of the resulting forest.
pub struct GenericDomTree<const IS_POST_DOM: bool> {
    /// The DFS numbering of the CFG this tree was computed over.
    pub(crate) dfs: DfsTree,
    /// Preorder-indexed semidominator state, preserved across runs so
    /// partial recomputations can reuse it.
    pub(crate) snca: Vec<SncaData>,
    /// Scratch copy of the DFS parent table, shortcut by path compression.
    pub(crate) ancestors: Vec<PreNum>,
    /// Preorder-indexed immediate dominators.
    pub(crate) idoms_pre: Vec<PreNum>,
    /// Block-indexed immediate dominators; 0 for roots and unreachable
    /// blocks.
    pub(crate) idoms_bb: Vec<BlockNum>,
    /// Block-indexed tree nodes.
    pub(crate) nodes: Vec<DomTreeNode>,
}

impl<const IS_POST_DOM: bool> GenericDomTree<IS_POST_DOM> {
    /// Compute a dominator tree for `graph`.
    pub fn new<G: FlowGraph>(graph: &G) -> Result<Self, DomTreeError> {
        if graph.num_blocks() == 0 {
            return Err(DomTreeError::EmptyGraph);
        }
        let mut this = Self::empty();
        this.recompute(graph);
        Ok(this)
    }

    fn empty() -> Self {
        Self {
            dfs: DfsTree::default(),
            snca: Vec::new(),
            ancestors: Vec::new(),
            idoms_pre: Vec::new(),
            idoms_bb: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Recompute this tree from scratch over the current state of `graph`.
    pub fn recompute<G: FlowGraph>(&mut self, graph: &G) {
        log::trace!("computing {} from scratch", kind(IS_POST_DOM));
        self.update(graph, true, 0);
    }

    /// Rerun the construction passes: the DFS if `recompute_dfs` is set,
    /// then the Semi-NCA passes confined to `max_pre` (0 meaning "all of
    /// it"), then the tree nodes.
    pub(crate) fn update<G: FlowGraph>(&mut self, graph: &G, recompute_dfs: bool, max_pre: PreNum) {
        if recompute_dfs {
            self.dfs.recompute::<G, IS_POST_DOM>(graph);
        }
        let max_pre = if max_pre == 0 {
            self.dfs.num_reachable() as PreNum
        } else {
            max_pre
        };
        self.run_snca(graph, max_pre);
        self.rebuild_nodes();
    }

    /// Rebuild the per-block children lists and levels from `idoms_bb`.
    pub(crate) fn rebuild_nodes(&mut self) {
        let n_blocks = self.num_blocks();
        self.nodes.clear();
        self.nodes.resize(n_blocks + 1, DomTreeNode::default());

        // Blocks are appended in ascending order, keeping every children
        // list sorted.
        for block in 1..=n_blocks as BlockNum {
            let idom = self.idoms_bb[block as usize];
            if idom != 0 {
                self.nodes[idom as usize].children.push(block);
            }
        }

        // Levels, by an iterative walk down from the roots. Unreachable
        // blocks keep level 0.
        let mut worklist = SmallVec::<[(BlockNum, u32); 16]>::new();
        if IS_POST_DOM {
            for block in 1..=n_blocks as BlockNum {
                if self.idoms_bb[block as usize] == 0 && self.dfs.pre(block) != 0 {
                    worklist.push((block, 1));
                }
            }
        } else {
            worklist.push((ENTRY_BLOCK, 1));
        }
        while let Some((block, level)) = worklist.pop() {
            self.nodes[block as usize].level = level;
            for &child in self.nodes[block as usize].children.iter() {
                worklist.push((child, level + 1));
            }
        }
    }

    /// Returns true if this tree is a post-dominance tree.
    #[inline(always)]
    pub const fn is_post_dominator(&self) -> bool {
        IS_POST_DOM
    }

    /// The number of blocks this tree covers, including unreachable ones.
    pub fn num_blocks(&self) -> usize {
        self.idoms_bb.len().saturating_sub(1)
    }

    /// The number of blocks reached by the numbering DFS.
    pub fn num_reachable(&self) -> usize {
        self.dfs.num_reachable()
    }

    /// The immediate dominator of `block`, or 0 for roots and unreachable
    /// blocks.
    #[inline]
    pub fn idom(&self, block: BlockNum) -> BlockNum {
        self.idoms_bb[block as usize]
    }

    /// The depth of `block` in the tree; roots are at level 1. Meaningless
    /// for unreachable blocks.
    #[inline]
    pub fn level(&self, block: BlockNum) -> u32 {
        self.nodes[block as usize].level
    }

    /// The tree node of `block`.
    #[inline]
    pub fn node(&self, block: BlockNum) -> &DomTreeNode {
        &self.nodes[block as usize]
    }

    /// The DFS numbering underlying this tree.
    #[inline]
    pub fn dfs_tree(&self) -> &DfsTree {
        &self.dfs
    }

    /// The preorder number of `block`, 0 if unreachable.
    #[inline]
    pub fn preorder_number(&self, block: BlockNum) -> PreNum {
        self.dfs.pre(block)
    }

    /// The postorder number of `block`, 0 if unreachable.
    #[inline]
    pub fn postorder_number(&self, block: BlockNum) -> PostNum {
        self.dfs.post(block)
    }

    /// Returns true if `block` is not reachable: from the entry for
    /// forward trees, from any exit for post-dominator trees.
    pub fn is_unreachable(&self, block: BlockNum) -> bool {
        if IS_POST_DOM {
            self.dfs.pre(block) == 0
        } else {
            block != ENTRY_BLOCK && self.dfs.pre(block) == 0
        }
    }

    /// Shared dominance walk: `a` is an ancestor of `b` in the tree iff
    /// walking `b` up by the level difference lands on `a`.
    fn tree_dominates(&self, a: BlockNum, b: BlockNum) -> bool {
        if a == b {
            return true;
        }
        let a_level = self.nodes[a as usize].level;
        let b_level = self.nodes[b as usize].level;
        if a_level > b_level {
            return false;
        }
        let mut b = b;
        for _ in 0..(b_level - a_level) {
            b = self.idoms_bb[b as usize];
        }
        a == b
    }

    /// Find the deepest block that dominates both `a` and `b`.
    ///
    /// Returns 0 if either input is 0, or (for post-dominator forests) if
    /// the two blocks sit under different roots.
    pub fn nearest_common_dominator(&self, a: BlockNum, b: BlockNum) -> BlockNum {
        if a == 0 || b == 0 {
            return 0;
        }
        let (mut a, mut b) = (a, b);
        let mut a_level = self.nodes[a as usize].level;
        let mut b_level = self.nodes[b as usize].level;
        if a_level < b_level {
            core::mem::swap(&mut a, &mut b);
            core::mem::swap(&mut a_level, &mut b_level);
        }
        // Align the deeper block to the shallower one's level, then walk
        // both up in lockstep until they meet; they must, at the root.
        while a_level > b_level {
            a = self.idoms_bb[a as usize];
            a_level -= 1;
        }
        while a != b {
            debug_assert!(a != 0 && b != 0, "nearest common dominator walk must converge");
            a = self.idoms_bb[a as usize];
            b = self.idoms_bb[b as usize];
        }
        a
    }

    /// Iterate over every block dominated by `root`, including `root`
    /// itself. Each block is yielded exactly once, in an unspecified
    /// order.
    pub fn dominated(&self, root: BlockNum) -> DominatedBlocks<'_> {
        DominatedBlocks {
            nodes: &self.nodes,
            worklist: smallvec![root],
        }
    }

    /// Rewrite the block numbering of this tree after the client
    /// renumbered the CFG.
    ///
    /// `rename` must have one entry per block plus the reserved slot 0;
    /// `rename[old]` gives the new number of block `old`, with 0 marking a
    /// deleted block. Deleted blocks must not be reachable. Block-indexed
    /// state is compacted to the new numbering; preorder-indexed state is
    /// preserved, with block-number values rewritten in place.
    pub fn rename_blocks(&mut self, rename: &[BlockNum]) {
        assert_eq!(
            rename.len(),
            self.idoms_bb.len(),
            "the rename table must cover every block"
        );
        log::trace!("renaming the blocks of a {}", kind(IS_POST_DOM));

        let max_new = rename.iter().copied().max().unwrap_or(0) as usize;
        self.dfs.rename(rename, max_new);

        let mut new_idoms = vec![0 as BlockNum; max_new + 1];
        let mut new_nodes = vec![DomTreeNode::default(); max_new + 1];
        for old in 1..rename.len() {
            let new_block = rename[old];
            if new_block == 0 {
                continue;
            }
            let old_idom = self.idoms_bb[old];
            new_idoms[new_block as usize] = if old_idom == 0 {
                0
            } else {
                rename[old_idom as usize]
            };

            let node = &self.nodes[old];
            let mut children: SmallVec<[BlockNum; 4]> = node
                .children
                .iter()
                .map(|&child| rename[child as usize])
                .filter(|&child| child != 0)
                .collect();
            // The mapping need not be monotone, so re-establish the order.
            children.sort_unstable();
            new_nodes[new_block as usize] = DomTreeNode {
                level: node.level,
                children,
            };
        }
        self.idoms_bb = new_idoms;
        self.nodes = new_nodes;
    }

    /// Check this tree against `graph`, which must be the CFG snapshot the
    /// tree currently describes.
    pub fn verify<G: FlowGraph>(&self, graph: &G, level: DomTreeVerificationLevel) -> bool {
        if !self.is_same_as_fresh_tree(graph) {
            return false;
        }
        match level {
            DomTreeVerificationLevel::Fast => true,
            DomTreeVerificationLevel::Basic => self.verify_structure(),
            DomTreeVerificationLevel::Full => {
                self.verify_structure() && self.verify_against_naive(graph)
            }
        }
    }

    fn is_same_as_fresh_tree<G: FlowGraph>(&self, graph: &G) -> bool {
        let mut fresh = Self::empty();
        fresh.recompute(graph);
        let is_same = self.idoms_bb == fresh.idoms_bb && self.nodes == fresh.nodes;
        if !is_same {
            log::error!("{} is different than a freshly computed one!", kind(IS_POST_DOM));
            log::error!("current:\n{self}");
            log::error!("fresh:\n{fresh}");
        }
        is_same
    }

    fn verify_structure(&self) -> bool {
        let n_blocks = self.num_blocks();
        for block in 1..=n_blocks as BlockNum {
            let idom = self.idoms_bb[block as usize];
            if idom == 0 {
                if !self.is_unreachable(block) && self.nodes[block as usize].level != 1 {
                    log::error!("root {block} is not at level 1");
                    return false;
                }
                continue;
            }

            if self.dfs.pre(idom) == 0 || self.dfs.pre(idom) >= self.dfs.pre(block) {
                log::error!("the immediate dominator of {block} does not precede it in preorder");
                return false;
            }
            if self.nodes[block as usize].level != self.nodes[idom as usize].level + 1 {
                log::error!("{block} is not one level below its immediate dominator");
                return false;
            }

            let children = self.nodes[idom as usize].children();
            if !children.is_sorted() {
                log::error!("the children of {idom} are not sorted");
                return false;
            }
            if children.iter().filter(|&&child| child == block).count() != 1 {
                log::error!("{block} does not appear exactly once among the children of {idom}");
                return false;
            }
        }
        true
    }

    fn verify_against_naive<G: FlowGraph>(&self, graph: &G) -> bool {
        let naive = naive_idoms(graph, IS_POST_DOM);
        let is_same = naive == self.idoms_bb;
        if !is_same {
            log::error!(
                "{} disagrees with the naive reference implementation",
                kind(IS_POST_DOM)
            );
        }
        is_same
    }
}

impl DomTree {
    /// Returns true iff `a` dominates `b`: every path from the entry to
    /// `b` passes through `a`. Every block dominates itself.
    pub fn dominates(&self, a: BlockNum, b: BlockNum) -> bool {
        self.tree_dominates(a, b)
    }

    /// Returns true iff `a` dominates `b` and `a != b`.
    pub fn properly_dominates(&self, a: BlockNum, b: BlockNum) -> bool {
        a != b && self.tree_dominates(a, b)
    }
}

impl PostDomTree {
    /// Returns true iff `a` post-dominates `b`: every path from `b` to an
    /// exit passes through `a`. Every block post-dominates itself.
    pub fn postdominates(&self, a: BlockNum, b: BlockNum) -> bool {
        self.tree_dominates(a, b)
    }

    /// Returns true iff `a` post-dominates `b` and `a != b`.
    pub fn properly_postdominates(&self, a: BlockNum, b: BlockNum) -> bool {
        a != b && self.tree_dominates(a, b)
    }
}

/// An iterator over the blocks dominated by some block, driven by a
/// worklist over the children lists.
pub struct DominatedBlocks<'a> {
    nodes: &'a [DomTreeNode],
    worklist: SmallVec<[BlockNum; 16]>,
}

impl Iterator for DominatedBlocks<'_> {
    type Item = BlockNum;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.worklist.pop()?;
        self.worklist
            .extend_from_slice(&self.nodes[block as usize].children);
        Some(block)
    }
}

impl core::iter::FusedIterator for DominatedBlocks<'_> {}

const fn kind(is_post_dom: bool) -> &'static str {
    if is_post_dom {
        "post-dominator tree"
    } else {
        "dominator tree"
    }
}

impl<const IS_POST_DOM: bool> fmt::Display for GenericDomTree<IS_POST_DOM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", kind(IS_POST_DOM))?;

        let n_blocks = self.num_blocks();
        let mut roots = SmallVec::<[BlockNum; 4]>::new();
        if IS_POST_DOM {
            for block in 1..=n_blocks as BlockNum {
                if self.idoms_bb[block as usize] == 0 && !self.is_unreachable(block) {
                    roots.push(block);
                }
            }
        } else if n_blocks > 0 {
            roots.push(ENTRY_BLOCK);
        }

        let mut stack = SmallVec::<[BlockNum; 16]>::new();
        for &root in roots.iter().rev() {
            stack.push(root);
        }
        while let Some(block) = stack.pop() {
            let node = &self.nodes[block as usize];
            let indent = node.level as usize;
            writeln!(f, "{:indent$}[{}] block{block}", "", node.level)?;
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }

        write!(f, "roots: ")?;
        for (i, root) in roots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{root}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec::Vec};

    use proptest::prelude::*;

    use super::*;
    use crate::{cfg::ControlFlowGraph, naive::naive_idoms};

    fn graph(n_blocks: usize, edges: &[(BlockNum, BlockNum)]) -> ControlFlowGraph {
        ControlFlowGraph::from_edges(n_blocks, edges)
    }

    fn idoms<const P: bool>(tree: &GenericDomTree<P>) -> Vec<BlockNum> {
        (1..=tree.num_blocks() as BlockNum).map(|b| tree.idom(b)).collect()
    }

    fn levels<const P: bool>(tree: &GenericDomTree<P>) -> Vec<u32> {
        (1..=tree.num_blocks() as BlockNum).map(|b| tree.level(b)).collect()
    }

    #[test]
    fn diamond() {
        let graph = graph(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let tree = DomTree::new(&graph).unwrap();

        assert_eq!(idoms(&tree), [0, 1, 1, 1]);
        assert_eq!(levels(&tree), [1, 2, 2, 2]);
        assert!(tree.verify(&graph, DomTreeVerificationLevel::Full));
    }

    #[test]
    fn chain_with_side_branch() {
        // The interesting case for the semidominator computation: block 3
        // is reached both directly from 2 and around the side chain
        // through 6, so its immediate dominator is the entry, not either
        // of its predecessors.
        let graph = graph(6, &[(1, 2), (2, 3), (1, 4), (4, 5), (5, 6), (6, 3)]);
        let tree = DomTree::new(&graph).unwrap();

        assert_eq!(idoms(&tree), [0, 1, 1, 1, 4, 5]);
        assert!(tree.verify(&graph, DomTreeVerificationLevel::Full));
    }

    #[test]
    fn unreachable_block() {
        let graph = graph(3, &[(1, 2)]);
        let tree = DomTree::new(&graph).unwrap();

        assert_eq!(idoms(&tree), [0, 1, 0]);
        assert!(tree.is_unreachable(3));
        assert!(!tree.is_unreachable(1));
        assert!(!tree.dominates(1, 3));
        assert!(tree.dominates(3, 3));
    }

    #[test]
    fn empty_graph_is_rejected() {
        let graph = graph(0, &[]);
        assert!(matches!(DomTree::new(&graph), Err(DomTreeError::EmptyGraph)));
    }

    #[test]
    fn single_block() {
        let graph = graph(1, &[]);
        let tree = DomTree::new(&graph).unwrap();
        assert_eq!(idoms(&tree), [0]);
        assert_eq!(levels(&tree), [1]);
        assert!(tree.dominates(1, 1));
    }

    #[test]
    fn post_dominators_of_diamond() {
        let graph = graph(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let tree = PostDomTree::new(&graph).unwrap();

        assert_eq!(idoms(&tree), [4, 4, 4, 0]);
        assert_eq!(levels(&tree), [2, 2, 2, 1]);
        assert!(tree.postdominates(4, 1));
        assert!(tree.postdominates(4, 2));
        assert!(!tree.postdominates(2, 1));
        assert!(tree.verify(&graph, DomTreeVerificationLevel::Full));
    }

    #[test]
    fn post_dominators_with_infinite_loop() {
        // Blocks 2 and 3 spin forever and never reach the exit, so they
        // are unreachable in the reversed graph.
        let graph = graph(4, &[(1, 2), (2, 3), (3, 2), (1, 4)]);
        let tree = PostDomTree::new(&graph).unwrap();

        assert_eq!(idoms(&tree), [4, 0, 0, 0]);
        assert!(tree.is_unreachable(2));
        assert!(tree.is_unreachable(3));
        assert!(!tree.is_unreachable(4));
        assert!(tree.verify(&graph, DomTreeVerificationLevel::Full));
    }

    #[test]
    fn dominance_is_reflexive_and_rooted() {
        let graph = graph(6, &[(1, 2), (2, 3), (1, 4), (4, 5), (5, 6), (6, 3)]);
        let tree = DomTree::new(&graph).unwrap();

        for block in 1..=6 {
            assert!(tree.dominates(block, block));
            assert!(tree.dominates(1, block));
            assert!(!tree.properly_dominates(block, block));
        }
        assert!(tree.properly_dominates(4, 6));
        assert!(!tree.dominates(2, 3));
        assert!(!tree.dominates(6, 3));
    }

    #[test]
    fn nearest_common_dominator_queries() {
        let graph = graph(6, &[(1, 2), (2, 3), (1, 4), (4, 5), (5, 6), (6, 3)]);
        let tree = DomTree::new(&graph).unwrap();

        assert_eq!(tree.nearest_common_dominator(2, 6), 1);
        assert_eq!(tree.nearest_common_dominator(5, 6), 5);
        assert_eq!(tree.nearest_common_dominator(6, 5), 5);
        assert_eq!(tree.nearest_common_dominator(3, 3), 3);
        assert_eq!(tree.nearest_common_dominator(0, 5), 0);
        assert_eq!(tree.nearest_common_dominator(5, 0), 0);
    }

    #[test]
    fn dominated_enumerates_each_block_once() {
        let graph = graph(6, &[(1, 2), (2, 3), (1, 4), (4, 5), (5, 6), (6, 3)]);
        let tree = DomTree::new(&graph).unwrap();

        let mut dominated: Vec<BlockNum> = tree.dominated(4).collect();
        dominated.sort_unstable();
        assert_eq!(dominated, [4, 5, 6]);

        let mut all: Vec<BlockNum> = tree.dominated(1).collect();
        all.sort_unstable();
        assert_eq!(all, [1, 2, 3, 4, 5, 6]);

        // The enumeration agrees with the dominance query.
        for root in 1..=6u32 {
            let enumerated: Vec<BlockNum> = tree.dominated(root).collect();
            for block in 1..=6u32 {
                assert_eq!(
                    enumerated.contains(&block),
                    tree.dominates(root, block),
                    "dominated({root}) disagrees with dominates({root}, {block})"
                );
            }
        }
    }

    #[test]
    fn rename_preserves_dominance() {
        let cfg = graph(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let mut tree = DomTree::new(&cfg).unwrap();

        // Swap blocks 2 and 3.
        let rename: [BlockNum; 5] = [0, 1, 3, 2, 4];
        let before: Vec<(BlockNum, BlockNum, bool)> = (1..=4)
            .flat_map(|a| (1..=4).map(move |b| (a, b)))
            .map(|(a, b)| (a, b, tree.dominates(a, b)))
            .collect();

        tree.rename_blocks(&rename);

        assert_eq!(idoms(&tree), [0, 1, 1, 1]);
        for (a, b, dominated) in before {
            assert_eq!(
                tree.dominates(rename[a as usize], rename[b as usize]),
                dominated,
                "dominance of {a} over {b} was not preserved by renaming"
            );
        }
    }

    #[test]
    fn rename_deletes_unreachable_blocks() {
        let cfg = graph(3, &[(1, 2)]);
        let mut tree = DomTree::new(&cfg).unwrap();
        assert!(tree.is_unreachable(3));

        let rename: [BlockNum; 4] = [0, 1, 2, 0];
        tree.rename_blocks(&rename);

        assert_eq!(tree.num_blocks(), 2);
        assert_eq!(idoms(&tree), [0, 1]);
        assert!(tree.dominates(1, 2));
    }

    #[test]
    fn display_renders_the_tree() {
        let graph = graph(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let tree = DomTree::new(&graph).unwrap();
        let rendered = format!("{tree}");

        assert!(rendered.starts_with("dominator tree:"));
        assert!(rendered.contains("[1] block1"));
        assert!(rendered.contains("[2] block4"));
        assert!(rendered.ends_with("roots: 1"));
    }

    fn arb_cfg(
        max_blocks: u32,
        max_edges: usize,
    ) -> impl Strategy<Value = (u32, Vec<(BlockNum, BlockNum)>)> {
        (2..=max_blocks).prop_flat_map(move |n| {
            (
                Just(n),
                proptest::collection::vec((1..=n, 1..=n), 0..=max_edges),
            )
        })
    }

    proptest! {
        #[test]
        fn construction_matches_naive((n, edges) in arb_cfg(10, 24)) {
            let cfg = graph(n as usize, &edges);
            let tree = DomTree::new(&cfg).unwrap();
            prop_assert_eq!(&tree.idoms_bb, &naive_idoms(&cfg, false));
        }

        #[test]
        fn post_dominators_match_naive((n, edges) in arb_cfg(10, 24)) {
            let cfg = graph(n as usize, &edges);
            let tree = PostDomTree::new(&cfg).unwrap();
            prop_assert_eq!(&tree.idoms_bb, &naive_idoms(&cfg, true));
        }

        #[test]
        fn insertion_matches_rebuild(
            (n, edges) in arb_cfg(10, 20),
            from in 1u32..=10,
            to in 1u32..=10,
        ) {
            let from = 1 + (from - 1) % n;
            let to = 1 + (to - 1) % n;
            let mut cfg = graph(n as usize, &edges);
            let mut tree = DomTree::new(&cfg).unwrap();

            cfg.add_edge(from, to);
            tree.insert_edge(&cfg, from, to);

            let fresh = DomTree::new(&cfg).unwrap();
            prop_assert_eq!(&tree.idoms_bb, &fresh.idoms_bb);
            prop_assert_eq!(&tree.idoms_bb, &naive_idoms(&cfg, false));
        }

        #[test]
        fn deletion_matches_rebuild(
            (n, edges) in arb_cfg(10, 20),
            index in any::<prop::sample::Index>(),
        ) {
            prop_assume!(!edges.is_empty());
            let (from, to) = edges[index.index(edges.len())];
            let mut cfg = graph(n as usize, &edges);
            let mut tree = DomTree::new(&cfg).unwrap();

            cfg.remove_edge(from, to);
            tree.delete_edge(&cfg, from, to);

            let fresh = DomTree::new(&cfg).unwrap();
            prop_assert_eq!(&tree.idoms_bb, &fresh.idoms_bb);
            prop_assert_eq!(&tree.idoms_bb, &naive_idoms(&cfg, false));
        }
    }
}
