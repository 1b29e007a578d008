use alloc::{collections::VecDeque, vec, vec::Vec};

use smallvec::SmallVec;

use crate::{
    cfg::{BlockNum, FlowGraph},
    tree::DomTree,
};

/// The dominance frontier of every block in a dominator tree.
///
/// The dominance frontier of a block `b` is the set of blocks `y` such
/// that `b` dominates some predecessor of `y` but does not strictly
/// dominate `y` itself: the points where control flow paths not passing
/// through `b` first rejoin the paths that do. Dominance frontiers drive
/// SSA construction (the iterated frontier of a variable's definition
/// sites is exactly where its phi nodes go) and control-dependence
/// analyses.
///
/// Computed by walking, for every join block, each predecessor's chain of
/// immediate dominators up to (but not including) the join block's own
/// immediate dominator, adding the join block to the frontier of every
/// block on the way.
#[derive(Debug, Default)]
pub struct DominanceFrontier {
    /// Block-indexed frontier sets, each sorted ascending.
    sets: Vec<SmallVec<[BlockNum; 2]>>,
}

impl DominanceFrontier {
    /// Compute the dominance frontier of every reachable block, given the
    /// finished dominator tree of `graph`.
    pub fn new<G: FlowGraph>(graph: &G, domtree: &DomTree) -> Self {
        let n_blocks = graph.num_blocks();
        let mut sets: Vec<SmallVec<[BlockNum; 2]>> = vec![SmallVec::new(); n_blocks + 1];

        for block in 1..=n_blocks as BlockNum {
            if domtree.is_unreachable(block) {
                continue;
            }
            let preds = graph.preds(block);
            // Only join points show up in anyone's frontier.
            if preds.iter().filter(|&&pred| pred != 0).count() < 2 {
                continue;
            }

            let idom = domtree.idom(block);
            for &pred in preds {
                if pred == 0 || domtree.is_unreachable(pred) {
                    continue;
                }
                let mut runner = pred;
                while runner != idom && runner != 0 {
                    let set = &mut sets[runner as usize];
                    if let Err(at) = set.binary_search(&block) {
                        set.insert(at, block);
                    }
                    runner = domtree.idom(runner);
                }
            }
        }

        Self { sets }
    }

    /// The dominance frontier of `block`, ascending.
    #[inline]
    pub fn get(&self, block: BlockNum) -> &[BlockNum] {
        &self.sets[block as usize]
    }

    /// Compute the iterated dominance frontier of a single block.
    pub fn iterate(&self, block: BlockNum) -> SmallVec<[BlockNum; 4]> {
        self.iterate_all([block])
    }

    /// Compute the iterated dominance frontier `DF+` of a set of blocks:
    /// the union of the frontiers of the blocks, of the frontiers of those
    /// frontiers, and so on to fixpoint.
    pub fn iterate_all<I>(&self, blocks: I) -> SmallVec<[BlockNum; 4]>
    where
        I: IntoIterator<Item = BlockNum>,
    {
        let mut queue: VecDeque<BlockNum> = blocks.into_iter().collect();
        let mut idf = SmallVec::<[BlockNum; 4]>::new();

        while let Some(block) = queue.pop_front() {
            for &frontier_block in self.get(block) {
                if let Err(at) = idf.binary_search(&frontier_block) {
                    idf.insert(at, frontier_block);
                    queue.push_back(frontier_block);
                }
            }
        }

        idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::ControlFlowGraph;

    #[test]
    fn diamond_frontiers() {
        let graph = ControlFlowGraph::from_edges(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let domtree = DomTree::new(&graph).unwrap();
        let frontier = DominanceFrontier::new(&graph, &domtree);

        assert!(frontier.get(1).is_empty());
        assert_eq!(frontier.get(2), &[4]);
        assert_eq!(frontier.get(3), &[4]);
        assert!(frontier.get(4).is_empty());

        assert_eq!(frontier.iterate_all([2, 3]).as_slice(), &[4]);
    }

    #[test]
    fn loop_frontiers_include_the_header() {
        // 2 is a loop header: the back edge from 3 puts 2 into its own
        // frontier, and the iterated frontier of the body reaches it.
        let graph = ControlFlowGraph::from_edges(4, &[(1, 2), (2, 3), (3, 2), (3, 4)]);
        let domtree = DomTree::new(&graph).unwrap();
        let frontier = DominanceFrontier::new(&graph, &domtree);

        assert_eq!(frontier.get(2), &[2]);
        assert_eq!(frontier.get(3), &[2]);
        assert!(frontier.get(4).is_empty());

        assert_eq!(frontier.iterate(3).as_slice(), &[2]);
    }

    #[test]
    fn unreachable_predecessors_are_ignored() {
        let graph = ControlFlowGraph::from_edges(4, &[(1, 2), (3, 2), (2, 4)]);
        let domtree = DomTree::new(&graph).unwrap();
        let frontier = DominanceFrontier::new(&graph, &domtree);

        assert!(frontier.get(1).is_empty());
        assert!(frontier.get(2).is_empty());
    }
}
