use alloc::{vec, vec::Vec};

use smallvec::SmallVec;

use crate::cfg::{BlockNum, ENTRY_BLOCK, FlowGraph};

/// A 1-based preorder number, densely assigned to reachable blocks only.
/// 0 means "not numbered", i.e. unreachable.
pub type PreNum = u32;

/// A 1-based postorder number, with the same density and sentinel as
/// [PreNum].
pub type PostNum = u32;

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// The block under visitation; `None` is the virtual exit used as the
    /// traversal root of post-dominator walks. It is never numbered.
    block: Option<BlockNum>,
    /// Preorder number of the block this one was discovered from.
    parent_pre: PreNum,
    /// Whether the first visit already pushed this block's neighbors.
    expanded: bool,
}

/// The result of a depth-first traversal of a CFG: dual preorder/postorder
/// numbers for every reachable block, and the parent table of the spanning
/// tree formed by the traversal.
///
/// For forward dominator trees the traversal follows successor edges from
/// [ENTRY_BLOCK]. For post-dominator trees it follows predecessor edges
/// from a virtual exit whose children are all blocks without successors.
///
/// Block-indexed tables (`to_pre`, `to_post`) cover every block; the
/// preorder-indexed tables (`from_pre`, `from_post`, `to_parent_pre`) cover
/// reachable blocks only. All tables reserve slot 0.
#[derive(Debug, Default, Clone)]
pub struct DfsTree {
    /// Preorder number of each block, 0 if unreachable.
    to_pre: Vec<PreNum>,
    /// Block carrying each preorder number.
    from_pre: Vec<BlockNum>,
    /// Postorder number of each block, 0 if unreachable.
    to_post: Vec<PostNum>,
    /// Block carrying each postorder number.
    from_post: Vec<BlockNum>,
    /// Preorder number of each node's parent in the spanning tree. The
    /// forward root records itself; children of the virtual exit record 0.
    to_parent_pre: Vec<PreNum>,
    /// Traversal scratch, reused across invocations.
    stack: SmallVec<[Frame; 32]>,
}

impl DfsTree {
    /// The number of blocks this tree was computed over, including
    /// unreachable ones.
    pub fn num_blocks(&self) -> usize {
        self.to_pre.len().saturating_sub(1)
    }

    /// The number of blocks reached by the traversal.
    pub fn num_reachable(&self) -> usize {
        self.from_pre.len().saturating_sub(1)
    }

    /// The preorder number of `block`, or 0 if it was not reached.
    #[inline]
    pub fn pre(&self, block: BlockNum) -> PreNum {
        self.to_pre[block as usize]
    }

    /// The postorder number of `block`, or 0 if it was not reached.
    #[inline]
    pub fn post(&self, block: BlockNum) -> PostNum {
        self.to_post[block as usize]
    }

    /// The block numbered `pre` in preorder.
    #[inline]
    pub fn block_at_pre(&self, pre: PreNum) -> BlockNum {
        self.from_pre[pre as usize]
    }

    /// The block numbered `post` in postorder.
    #[inline]
    pub fn block_at_post(&self, post: PostNum) -> BlockNum {
        self.from_post[post as usize]
    }

    /// The preorder number of the spanning-tree parent of the node numbered
    /// `pre`.
    #[inline]
    pub fn parent_pre(&self, pre: PreNum) -> PreNum {
        self.to_parent_pre[pre as usize]
    }

    /// Reached blocks, in preorder.
    pub fn preorder_blocks(&self) -> &[BlockNum] {
        if self.from_pre.is_empty() {
            &[]
        } else {
            &self.from_pre[1..]
        }
    }

    /// The full parent table, preorder-indexed with slot 0 reserved.
    pub(crate) fn parents(&self) -> &[PreNum] {
        &self.to_parent_pre
    }

    fn reset(&mut self, n_blocks: usize) {
        self.to_pre.clear();
        self.to_pre.resize(n_blocks + 1, 0);
        self.to_post.clear();
        self.to_post.resize(n_blocks + 1, 0);
        self.from_pre.clear();
        self.from_pre.push(0);
        self.from_post.clear();
        self.from_post.push(0);
        self.to_parent_pre.clear();
        self.to_parent_pre.push(0);
    }

    /// Rerun the traversal over the current state of `graph`.
    ///
    /// Iterative on an explicit stack; each node is visited twice, first to
    /// assign its preorder number and push its neighbors, then (once those
    /// have completed) to assign its postorder number. Nodes already
    /// numbered when popped are discarded, which covers cross and forward
    /// edges.
    pub(crate) fn recompute<G: FlowGraph, const IS_POST_DOM: bool>(&mut self, graph: &G) {
        let n_blocks = graph.num_blocks();
        self.reset(n_blocks);

        let mut stack = core::mem::take(&mut self.stack);
        stack.clear();
        if IS_POST_DOM {
            stack.push(Frame {
                block: None,
                parent_pre: 0,
                expanded: false,
            });
        } else {
            // The entry block is always assigned preorder number 1, so
            // recording its own number as its parent keeps the parent
            // table closed over valid preorder numbers.
            stack.push(Frame {
                block: Some(ENTRY_BLOCK),
                parent_pre: 1,
                expanded: false,
            });
        }

        let mut next_pre: PreNum = 1;
        let mut next_post: PostNum = 1;

        while let Some(frame) = stack.last().copied() {
            if frame.expanded {
                if let Some(block) = frame.block {
                    self.to_post[block as usize] = next_post;
                    self.from_post.push(block);
                    next_post += 1;
                }
                stack.pop();
                continue;
            }

            if let Some(block) = frame.block {
                if self.to_pre[block as usize] != 0 {
                    stack.pop();
                    continue;
                }
            }

            let top = stack.len() - 1;
            stack[top].expanded = true;

            let current_pre = match frame.block {
                Some(block) => {
                    let pre = next_pre;
                    next_pre += 1;
                    self.to_pre[block as usize] = pre;
                    self.from_pre.push(block);
                    self.to_parent_pre.push(frame.parent_pre);
                    pre
                }
                None => 0,
            };

            match frame.block {
                None => {
                    // Blocks without successors are the exits, and form the
                    // children of the virtual exit.
                    for block in 1..=n_blocks as BlockNum {
                        if graph.succs(block).is_empty() {
                            stack.push(Frame {
                                block: Some(block),
                                parent_pre: current_pre,
                                expanded: false,
                            });
                        }
                    }
                }
                Some(block) => {
                    let neighbors = if IS_POST_DOM {
                        graph.preds(block)
                    } else {
                        graph.succs(block)
                    };
                    for &next in neighbors {
                        if next == 0 {
                            assert!(
                                IS_POST_DOM,
                                "virtual edges are only valid in post-dominator traversals"
                            );
                            continue;
                        }
                        stack.push(Frame {
                            block: Some(next),
                            parent_pre: current_pre,
                            expanded: false,
                        });
                    }
                }
            }
        }

        self.stack = stack;
    }

    /// Rewrite the block numbering of the traversal result.
    ///
    /// `rename[old]` gives the new number of `old`, 0 if deleted. The
    /// block-indexed tables are rebuilt at the new size; the
    /// preorder-indexed tables keep their structure, with block-number
    /// values rewritten in place.
    pub(crate) fn rename(&mut self, rename: &[BlockNum], max_new: usize) {
        debug_assert_eq!(rename.len(), self.to_pre.len());

        let mut new_to_pre = vec![0 as PreNum; max_new + 1];
        let mut new_to_post = vec![0 as PostNum; max_new + 1];
        for old in 1..rename.len() {
            let new_block = rename[old];
            if new_block == 0 {
                continue;
            }
            let pre = self.to_pre[old];
            let post = self.to_post[old];
            if pre != 0 {
                self.from_pre[pre as usize] = new_block;
                self.from_post[post as usize] = new_block;
            }
            new_to_pre[new_block as usize] = pre;
            new_to_post[new_block as usize] = post;
        }
        self.to_pre = new_to_pre;
        self.to_post = new_to_post;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::ControlFlowGraph;

    fn diamond() -> ControlFlowGraph {
        ControlFlowGraph::from_edges(4, &[(1, 2), (1, 3), (2, 4), (3, 4)])
    }

    #[test]
    fn forward_numbering() {
        let graph = diamond();
        let mut dfs = DfsTree::default();
        dfs.recompute::<_, false>(&graph);

        // Neighbors are pushed in successor order and popped LIFO, so the
        // second successor of the entry is explored first.
        assert_eq!(dfs.num_reachable(), 4);
        assert_eq!(dfs.pre(1), 1);
        assert_eq!(dfs.pre(3), 2);
        assert_eq!(dfs.pre(4), 3);
        assert_eq!(dfs.pre(2), 4);
        assert_eq!(dfs.post(4), 1);
        assert_eq!(dfs.post(3), 2);
        assert_eq!(dfs.post(2), 3);
        assert_eq!(dfs.post(1), 4);

        // Parent table: the root records itself, 4 was discovered from 3,
        // and both 2 and 3 were discovered from the entry.
        assert_eq!(dfs.parent_pre(1), 1);
        assert_eq!(dfs.parent_pre(dfs.pre(3)), 1);
        assert_eq!(dfs.parent_pre(dfs.pre(4)), dfs.pre(3));
        assert_eq!(dfs.parent_pre(dfs.pre(2)), 1);

        assert_eq!(dfs.preorder_blocks(), &[1, 3, 4, 2]);
    }

    #[test]
    fn unreachable_blocks_are_not_numbered() {
        let graph = ControlFlowGraph::from_edges(3, &[(1, 2)]);
        let mut dfs = DfsTree::default();
        dfs.recompute::<_, false>(&graph);

        assert_eq!(dfs.num_blocks(), 3);
        assert_eq!(dfs.num_reachable(), 2);
        assert_eq!(dfs.pre(3), 0);
        assert_eq!(dfs.post(3), 0);
    }

    #[test]
    fn post_dominator_numbering() {
        let graph = diamond();
        let mut dfs = DfsTree::default();
        dfs.recompute::<_, true>(&graph);

        // The only exit is block 4; the walk follows predecessor edges.
        assert_eq!(dfs.num_reachable(), 4);
        assert_eq!(dfs.pre(4), 1);
        assert_eq!(dfs.pre(3), 2);
        assert_eq!(dfs.pre(1), 3);
        assert_eq!(dfs.pre(2), 4);

        // Children of the virtual exit record parent 0.
        assert_eq!(dfs.parent_pre(dfs.pre(4)), 0);
        assert_eq!(dfs.parent_pre(dfs.pre(3)), dfs.pre(4));
    }

    #[test]
    fn post_dominator_skips_virtual_edges() {
        let mut graph = ControlFlowGraph::from_edges(3, &[(1, 2), (2, 3)]);
        graph.add_edge(0, 2);
        let mut dfs = DfsTree::default();
        dfs.recompute::<_, true>(&graph);

        assert_eq!(dfs.num_reachable(), 3);
        assert_eq!(dfs.pre(3), 1);
        assert_eq!(dfs.pre(2), 2);
        assert_eq!(dfs.pre(1), 3);
    }

    #[test]
    #[should_panic(expected = "virtual edges are only valid in post-dominator traversals")]
    fn forward_rejects_virtual_edges() {
        struct RawGraph;
        impl FlowGraph for RawGraph {
            fn num_blocks(&self) -> usize {
                2
            }

            fn preds(&self, _block: BlockNum) -> &[BlockNum] {
                &[]
            }

            fn succs(&self, block: BlockNum) -> &[BlockNum] {
                if block == 1 { &[0, 2] } else { &[] }
            }
        }

        let mut dfs = DfsTree::default();
        dfs.recompute::<_, false>(&RawGraph);
    }

    #[test]
    fn recompute_reuses_scratch() {
        let graph = diamond();
        let mut dfs = DfsTree::default();
        dfs.recompute::<_, false>(&graph);
        let first: Vec<PreNum> = (1..=4).map(|b| dfs.pre(b)).collect();
        dfs.recompute::<_, false>(&graph);
        let second: Vec<PreNum> = (1..=4).map(|b| dfs.pre(b)).collect();
        assert_eq!(first, second);
    }
}
