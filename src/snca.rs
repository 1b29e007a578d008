//! Semi-NCA dominator computation.
//!
//! The construction algorithm is the Semi-NCA variant described in
//!
//!   Linear-Time Algorithms for Dominators and Related Problems,
//!   Loukas Georgiadis, Princeton University, November 2005, pp. 21-23
//!
//! which computes semidominators with path compression and then derives
//! each immediate dominator as the nearest common ancestor, in the
//! partially built dominator tree, of a node's semidominator and its DFS
//! parent. Semi-NCA is O(n^2) in the worst case but usually beats simple
//! Lengauer-Tarjan in practice.
//!
//! Single-edge insertions and deletions are handled by classifying the
//! edge against the DFS numbering and rerunning the semidominator pass
//! over only the affected prefix of preorder numbers, following
//!
//!   An Experimental Study of Dynamic Dominators,
//!   Loukas Georgiadis, et al., April 12 2016, section 3.1

use smallvec::SmallVec;

use crate::{
    cfg::{BlockNum, ENTRY_BLOCK, FlowGraph},
    dfs::PreNum,
    tree::GenericDomTree,
};

/// Sentinel for a semidominator that has not been computed yet; strictly
/// greater than any valid preorder number. 0 would collide with
/// "unreachable".
const SEMI_UNDEF: PreNum = PreNum::MAX;

/// Per-node Semi-NCA state, indexed by preorder number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SncaData {
    /// Preorder number of the node's semidominator.
    pub semi: PreNum,
    /// The best candidate propagated by path compression: the minimum
    /// semidominator seen on the node's path through the link-eval forest.
    /// Starts as the node itself, finalized equal to `semi`.
    pub label: PreNum,
}

impl<const IS_POST_DOM: bool> GenericDomTree<IS_POST_DOM> {
    /// Recompute semidominators and immediate dominators over the current
    /// DFS numbering.
    ///
    /// With `max_pre` equal to the reachable-node count this is a full
    /// computation; smaller values confine the semidominator pass to
    /// preorder numbers `1..=max_pre`, which is the incremental-update
    /// fast path. The immediate-dominator pass and the translation to
    /// block numbers always run in full.
    pub(crate) fn run_snca<G: FlowGraph>(&mut self, graph: &G, max_pre: PreNum) {
        let n_reachable = self.dfs.num_reachable() as PreNum;
        debug_assert!(max_pre <= n_reachable);

        // Nodes up to `max_pre` are recomputed from scratch. Nodes past it
        // keep their semidominators, but have their labels reset to that
        // value: compressions performed by earlier runs may have left
        // labels that are unsound for the current processing order, and
        // the final semidominator is a safe floor that later compressions
        // improve when warranted.
        self.snca.resize(n_reachable as usize + 1, SncaData::default());
        for w in 1..=max_pre {
            self.snca[w as usize] = SncaData {
                semi: SEMI_UNDEF,
                label: w,
            };
        }
        for w in (max_pre + 1)..=n_reachable {
            let data = &mut self.snca[w as usize];
            data.label = data.semi;
        }

        // Mutable copy of the DFS parent table; path compression shortcuts
        // it as the pass proceeds.
        self.ancestors.clear();
        self.ancestors.extend_from_slice(self.dfs.parents());

        // The forward root needs no semidominator; post-dominator trees
        // have no numbered root, so every node is processed.
        let lowest: PreNum = if IS_POST_DOM { 1 } else { 2 };
        let use_recursion = self.ancestors.len() <= 32;
        let mut worklist = SmallVec::<[(PreNum, PreNum); 32]>::new();

        for w in (lowest..=max_pre).rev() {
            // Everything at or past `last_linked` has already been
            // processed by this pass and is linked into the forest.
            let last_linked = w + 1;
            let block = self.dfs.block_at_pre(w);
            let neighbors = if IS_POST_DOM {
                graph.succs(block)
            } else {
                graph.preds(block)
            };

            let mut semi_w = self.ancestors[w as usize];
            for &v in neighbors {
                // Skip virtual edges and unreachable neighbors.
                if v == 0 {
                    continue;
                }
                let v_pre = self.dfs.pre(v);
                if v_pre == 0 {
                    continue;
                }

                if v_pre >= last_linked {
                    if use_recursion {
                        compress(&mut self.snca, &mut self.ancestors, v_pre, last_linked);
                    } else {
                        compress_worklist(
                            &mut self.snca,
                            &mut self.ancestors,
                            &mut worklist,
                            v_pre,
                            last_linked,
                        );
                    }
                }
                semi_w = semi_w.min(self.snca[v_pre as usize].label);
            }

            self.snca[w as usize] = SncaData {
                semi: semi_w,
                label: semi_w,
            };
        }

        // Immediate dominators: starting from the DFS parent, walk up the
        // prefix of the table already finalized until at or below the
        // node's semidominator. This lands on the nearest common ancestor
        // of the semidominator and the parent.
        self.idoms_pre.clear();
        self.idoms_pre.extend_from_slice(self.dfs.parents());
        for v in lowest..=n_reachable {
            let semi = self.snca[v as usize].semi;
            let mut idom = self.idoms_pre[v as usize];
            while idom > semi {
                idom = self.idoms_pre[idom as usize];
            }
            self.idoms_pre[v as usize] = idom;
        }

        // Translate to block numbers. Roots and unreachable blocks get 0.
        let n_blocks = graph.num_blocks();
        self.idoms_bb.clear();
        self.idoms_bb.resize(n_blocks + 1, 0);
        for block in 1..=n_blocks as BlockNum {
            let pre = self.dfs.pre(block);
            if pre == 0 || (!IS_POST_DOM && block == ENTRY_BLOCK) {
                continue;
            }
            let idom_pre = self.idoms_pre[pre as usize];
            if idom_pre != 0 {
                self.idoms_bb[block as usize] = self.dfs.block_at_pre(idom_pre);
            }
        }
    }
}

/// Propagate the minimum label along the ancestor chain from `v` up to,
/// but not crossing, `last_linked`, shortcutting ancestor pointers along
/// the way.
///
/// Recursion depth is bounded by the ancestor array length; this variant
/// is only used when that length is at most 32.
fn compress(state: &mut [SncaData], ancestors: &mut [PreNum], v: PreNum, last_linked: PreNum) {
    let u = ancestors[v as usize];
    assert!(u < v, "DFS ancestors must have smaller preorder numbers");
    if u >= last_linked {
        compress(state, ancestors, u, last_linked);
        if state[u as usize].label < state[v as usize].label {
            state[v as usize].label = state[u as usize].label;
        }
        ancestors[v as usize] = ancestors[u as usize];
    }
}

/// Worklist form of [compress] for graphs too deep to recurse over.
///
/// Each `(u, v)` pair means "compress `u` first, then fold its label into
/// `v` and shortcut `v`'s ancestor". The stack grows up the ancestor chain
/// until a node whose parent is below `last_linked` is reached (its label
/// is final), then unwinds applying the updates, producing exactly the
/// state the recursive variant would.
fn compress_worklist(
    state: &mut [SncaData],
    ancestors: &mut [PreNum],
    worklist: &mut SmallVec<[(PreNum, PreNum); 32]>,
    v: PreNum,
    last_linked: PreNum,
) {
    debug_assert!(worklist.is_empty());
    worklist.push((ancestors[v as usize], v));
    while let Some(&(u, v)) = worklist.last() {
        assert!(u < v, "DFS ancestors must have smaller preorder numbers");
        if u >= last_linked {
            if ancestors[u as usize] >= last_linked {
                worklist.push((ancestors[u as usize], u));
                continue;
            }
            if state[u as usize].label < state[v as usize].label {
                state[v as usize].label = state[u as usize].label;
            }
            ancestors[v as usize] = ancestors[u as usize];
        }
        worklist.pop();
    }
}

/// Single-edge insertion and deletion.
///
/// Both operations expect the CFG to already reflect the change, classify
/// the edge against the DFS numbering, and then either rebuild everything
/// or rerun the semidominator pass over the affected preorder prefix.
/// Incremental updates apply to forward trees only; post-dominator trees
/// are refreshed with [GenericDomTree::recompute].
impl GenericDomTree<false> {
    /// Update the tree after the edge `from -> to` was added to `graph`.
    ///
    /// A no-op when `from` is unreachable: such edges cannot affect the
    /// dominance of any reachable block.
    pub fn insert_edge<G: FlowGraph>(&mut self, graph: &G, from: BlockNum, to: BlockNum) {
        if self.is_unreachable(from) {
            log::trace!("ignoring inserted edge {from} -> {to}: {from} is unreachable");
            return;
        }

        log::trace!("inserting edge {from} -> {to}");
        if self.insert_invalidates_dfs(from, to) {
            log::trace!("the DFS tree is invalidated, recomputing from scratch");
            self.update(graph, true, 0);
        } else {
            // Only semidominators of nodes numbered at or below `to` can
            // change.
            let max_pre = self.dfs.pre(to);
            log::trace!("the DFS tree remains valid, updating semidominators up to {max_pre}");
            self.update(graph, false, max_pre);
        }
    }

    /// Update the tree after the edge `from -> to` was removed from
    /// `graph`.
    ///
    /// A no-op when `from` is unreachable.
    pub fn delete_edge<G: FlowGraph>(&mut self, graph: &G, from: BlockNum, to: BlockNum) {
        if self.is_unreachable(from) {
            log::trace!("ignoring deleted edge {from} -> {to}: {from} is unreachable");
            return;
        }

        log::trace!("deleting edge {from} -> {to}");
        let from_pre = self.dfs.pre(from);
        let to_pre = self.dfs.pre(to);
        assert_ne!(to_pre, 0, "an edge out of a reachable block has a reachable destination");

        if self.dfs.parent_pre(to_pre) == from_pre {
            // A spanning-tree edge was removed, invalidating the DFS tree.
            log::trace!("the DFS tree is invalidated, recomputing from scratch");
            self.update(graph, true, 0);
        } else if self.on_semidominator_path(from_pre, to_pre) {
            log::trace!("the DFS tree remains valid, updating semidominators up to {to_pre}");
            self.update(graph, false, to_pre);
        } else {
            log::trace!("the edge does not affect the dominator tree");
        }
    }

    /// Whether an inserted edge `from -> to` invalidates the DFS tree.
    fn insert_invalidates_dfs(&self, from: BlockNum, to: BlockNum) -> bool {
        let to_pre = self.dfs.pre(to);
        if to_pre == 0 {
            // `to` becomes newly reachable.
            return true;
        }
        // A forward edge relative to the DFS tree can change how `to` is
        // numbered.
        let from_pre = self.dfs.pre(from);
        from_pre < to_pre && self.dfs.post(from) < self.dfs.post(to)
    }

    /// Whether the node numbered `from_pre` lies on a semidominator path
    /// to the node numbered `to_pre`.
    ///
    /// Preorder numbers decrease monotonically along semidominator chains,
    /// so dropping below `semi(to_pre)` proves non-membership.
    fn on_semidominator_path(&self, from_pre: PreNum, to_pre: PreNum) -> bool {
        let to_semi = self.snca[to_pre as usize].semi;
        let mut current = from_pre;
        while current >= to_semi {
            if current == to_semi {
                return true;
            }
            current = self.snca[current as usize].semi;
        }
        false
    }
}
