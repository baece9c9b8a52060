use std::sync::Arc;

use aviary_interner::Key;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::node::NodeIdx;

/// One line of a merge-sorted history, in the order `merge_sort` emits
/// them (tip first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSortedRevision {
    pub sequence_number: u32,
    /// `(n,)` on the mainline; `(m, branch, k, ...)` on a merged-in
    /// branch, extended by two components per nesting level.
    pub revno: Vec<u32>,
    pub merge_depth: u32,
    /// True for the last entry of a contiguous run at this `merge_depth`,
    /// i.e. the point where the walk pops back to a shallower branch.
    pub end_of_merge: bool,
    pub key: Arc<Key>,
}

struct WorkItem {
    idx: NodeIdx,
    prefix: Vec<u32>,
    merge_depth: u32,
}

/// Numbers the ancestry of `tip` the way a dirblock-free line-of-history
/// view does: the mainline gets `(n,)` counting up from the root, and
/// each merged-in branch is walked to completion — depth first, most
/// recently merged first — before the mainline continues. Delegates to
/// [`Graph::topo_sort`] to confirm the ancestry has no cycle before
/// numbering it.
pub fn merge_sort(graph: &Graph, tip: &Key) -> Result<Vec<MergeSortedRevision>, GraphError> {
    graph.topo_sort()?;
    let tip_idx = graph.resolve(tip)?;
    let depths = graph.depths_from_tail()?;

    let mut stack = vec![WorkItem { idx: tip_idx, prefix: Vec::new(), merge_depth: 0 }];
    let mut out = Vec::with_capacity(graph.node_count());
    let mut sequence_number = 0u32;

    while let Some(WorkItem { idx, prefix, merge_depth }) = stack.pop() {
        let mut revno = prefix.clone();
        revno.push(depths[idx.0 as usize]);

        out.push(MergeSortedRevision {
            sequence_number,
            revno: revno.clone(),
            merge_depth,
            end_of_merge: false,
            key: graph.node(idx).key.clone(),
        });
        sequence_number += 1;

        let parents = graph.node(idx).parents.clone();
        let mut branches = Vec::new();
        for (branch_number, parent) in parents.iter().skip(1).enumerate() {
            if let Some(p) = parent {
                let mut branch_prefix = revno.clone();
                branch_prefix.push((branch_number + 1) as u32);
                branches.push(WorkItem { idx: *p, prefix: branch_prefix, merge_depth: merge_depth + 1 });
            }
        }
        if let Some(Some(first_parent)) = parents.first() {
            stack.push(WorkItem { idx: *first_parent, prefix, merge_depth });
        }
        for item in branches.into_iter().rev() {
            stack.push(item);
        }
    }

    for i in 0..out.len() {
        let next_depth = out.get(i + 1).map(|r| r.merge_depth);
        out[i].end_of_merge = next_depth.map_or(true, |d| d < out[i].merge_depth);
    }

    Ok(out)
}
