use alloc::{vec, vec::Vec};

use bitvec::prelude::*;

use crate::cfg::{BlockNum, ENTRY_BLOCK, FlowGraph};

/// Reference implementation of immediate dominators, by iterative
/// dataflow: `dom(n) = {n} ∪ ⋂ dom(p)` over the predecessors (successors,
/// for post-dominators) of `n`, with non-root sets initialized to the
/// universe, iterated to a fixpoint. The immediate dominator of `n` is
/// then the strict dominator of `n` that dominates no other strict
/// dominator of `n`.
///
/// Quadratic and up; exists to certify the Semi-NCA output in tests and
/// [crate::DomTreeVerificationLevel::Full] verification.
///
/// Returns a block-indexed vector (slot 0 reserved) of immediate
/// dominators, 0 for roots and unreachable blocks, exactly like the
/// `idom` accessor of the real trees.
pub fn naive_idoms<G: FlowGraph>(graph: &G, post_dom: bool) -> Vec<BlockNum> {
    let n_blocks = graph.num_blocks();
    let reachable = reachable_blocks(graph, post_dom);
    let is_root = |block: BlockNum| {
        if post_dom {
            graph.succs(block).is_empty()
        } else {
            block == ENTRY_BLOCK
        }
    };

    let mut doms: Vec<BitVec> = Vec::with_capacity(n_blocks + 1);
    doms.push(BitVec::new());
    for block in 1..=n_blocks as BlockNum {
        let set = if is_root(block) && reachable[block as usize] {
            let mut set = bitvec![0; n_blocks + 1];
            set.set(block as usize, true);
            set
        } else {
            bitvec![1; n_blocks + 1]
        };
        doms.push(set);
    }

    let mut changed = true;
    while changed {
        changed = false;
        for block in 1..=n_blocks as BlockNum {
            if !reachable[block as usize] || is_root(block) {
                continue;
            }
            let inputs = if post_dom {
                graph.succs(block)
            } else {
                graph.preds(block)
            };

            let mut new_doms = bitvec![1; n_blocks + 1];
            for &input in inputs {
                // Virtual and unreachable inputs contribute the universe.
                if input == 0 || !reachable[input as usize] {
                    continue;
                }
                for i in 1..=n_blocks {
                    if new_doms[i] && !doms[input as usize][i] {
                        new_doms.set(i, false);
                    }
                }
            }
            new_doms.set(block as usize, true);

            if new_doms != doms[block as usize] {
                doms[block as usize] = new_doms;
                changed = true;
            }
        }
    }

    let mut idoms = vec![0 as BlockNum; n_blocks + 1];
    for block in 1..=n_blocks as BlockNum {
        if !reachable[block as usize] || is_root(block) {
            continue;
        }
        let strict: Vec<BlockNum> = (1..=n_blocks as BlockNum)
            .filter(|&d| d != block && doms[block as usize][d as usize])
            .collect();
        for &d in &strict {
            let dominates_another = strict
                .iter()
                .any(|&other| other != d && doms[other as usize][d as usize]);
            if !dominates_another {
                idoms[block as usize] = d;
                break;
            }
        }
    }
    idoms
}

fn reachable_blocks<G: FlowGraph>(graph: &G, post_dom: bool) -> BitVec {
    let n_blocks = graph.num_blocks();
    let mut reachable = bitvec![0; n_blocks + 1];
    let mut worklist: Vec<BlockNum> = Vec::new();

    if post_dom {
        for block in 1..=n_blocks as BlockNum {
            if graph.succs(block).is_empty() {
                reachable.set(block as usize, true);
                worklist.push(block);
            }
        }
    } else if n_blocks > 0 {
        reachable.set(ENTRY_BLOCK as usize, true);
        worklist.push(ENTRY_BLOCK);
    }

    while let Some(block) = worklist.pop() {
        let next = if post_dom {
            graph.preds(block)
        } else {
            graph.succs(block)
        };
        for &neighbor in next {
            if neighbor == 0 {
                continue;
            }
            if !reachable[neighbor as usize] {
                reachable.set(neighbor as usize, true);
                worklist.push(neighbor);
            }
        }
    }
    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::ControlFlowGraph;

    #[test]
    fn diamond_idoms() {
        let graph = ControlFlowGraph::from_edges(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        assert_eq!(naive_idoms(&graph, false), [0, 0, 1, 1, 1]);
        assert_eq!(naive_idoms(&graph, true), [0, 4, 4, 4, 0]);
    }

    #[test]
    fn loop_idoms() {
        let graph = ControlFlowGraph::from_edges(4, &[(1, 2), (2, 3), (3, 2), (3, 4)]);
        assert_eq!(naive_idoms(&graph, false), [0, 0, 1, 2, 3]);
    }

    #[test]
    fn unreachable_blocks_have_no_idom() {
        let graph = ControlFlowGraph::from_edges(3, &[(1, 2)]);
        assert_eq!(naive_idoms(&graph, false), [0, 0, 1, 0]);
    }
}
