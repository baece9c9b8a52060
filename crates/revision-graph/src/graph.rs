use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use aviary_interner::{Key, TupleSet};
use tracing::trace;

use crate::error::GraphError;
use crate::node::{Node, NodeIdx};

/// The raw bytes bzr-lineage code uses to mark the ultimate, implicit
/// ancestor of every root revision.
pub const NULL_REVISION: &[u8] = b"null:";

/// An arena-of-indices revision DAG: nodes live in a flat `Vec` and refer
/// to each other by [`NodeIdx`], so the structure has no `Rc`/`RefCell`
/// cycles to reason about.
///
/// Construction takes a parent map once; `gdfo` (greatest distance from
/// an origin) is computed eagerly so `heads` queries can prune by it.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<Arc<Key>, NodeIdx>,
    #[allow(dead_code)]
    interner: TupleSet<Key>,
    heads_cache: RefCell<HashMap<BTreeSet<NodeIdx>, Arc<BTreeSet<NodeIdx>>>>,
}

impl Graph {
    /// Builds a graph from `key -> parent_keys` entries. Parents that
    /// never appear as an entry's own key become ghosts: the edge is kept
    /// as a `None` slot rather than discarded.
    #[must_use]
    pub fn from_parent_map(parent_map: impl IntoIterator<Item = (Key, Vec<Key>)>) -> Self {
        let mut interner = TupleSet::default();
        let mut nodes: Vec<Node> = Vec::new();
        let mut index: HashMap<Arc<Key>, NodeIdx> = HashMap::new();

        let entries: Vec<(Arc<Key>, Vec<Arc<Key>>)> = parent_map
            .into_iter()
            .map(|(key, parents)| {
                let key = interner.add(key);
                let parents = parents.into_iter().map(|p| interner.add(p)).collect();
                (key, parents)
            })
            .collect();

        for (key, _) in &entries {
            index.entry(key.clone()).or_insert_with(|| {
                let idx = NodeIdx(nodes.len() as u32);
                nodes.push(Node { key: key.clone(), parents: Box::new([]), children: Vec::new(), gdfo: 0 });
                idx
            });
        }

        for (key, parent_keys) in &entries {
            let idx = index[key];
            let parents: Box<[Option<NodeIdx>]> = parent_keys.iter().map(|p| index.get(p).copied()).collect();
            for &parent_idx in parents.iter().flatten() {
                nodes[parent_idx.0 as usize].children.push(idx);
            }
            nodes[idx.0 as usize].parents = parents;
        }

        let mut graph = Self { nodes, index, interner, heads_cache: RefCell::new(HashMap::new()) };
        graph.compute_gdfo();
        graph
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn gdfo(&self, key: &Key) -> Option<u32> {
        self.index.get(key).map(|idx| self.nodes[idx.0 as usize].gdfo)
    }

    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0 as usize]
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn resolve(&self, key: &Key) -> Result<NodeIdx, GraphError> {
        self.index.get(key).copied().ok_or_else(|| GraphError::UnknownKey(Arc::new(key.clone())))
    }

    /// Greatest distance from an origin: tails start at 1, and every edge
    /// `parent -> child` requires `child.gdfo >= parent.gdfo + 1`. Walked
    /// with an explicit work stack (no host recursion); a child is pushed
    /// only once every one of its real parents has contributed, tracked
    /// with a per-node count that is dropped back to zero once it fires.
    fn compute_gdfo(&mut self) {
        let n = self.nodes.len();
        let mut seen_count = vec![0u32; n];
        let mut stack: Vec<NodeIdx> = Vec::new();

        for i in 0..n {
            if self.nodes[i].real_parent_count() == 0 {
                self.nodes[i].gdfo = 1;
                stack.push(NodeIdx(i as u32));
            }
        }

        while let Some(idx) = stack.pop() {
            let gdfo = self.nodes[idx.0 as usize].gdfo;
            let children = self.nodes[idx.0 as usize].children.clone();
            for child in children {
                let c = child.0 as usize;
                self.nodes[c].gdfo = self.nodes[c].gdfo.max(gdfo + 1);
                seen_count[c] += 1;
                if seen_count[c] == self.nodes[c].real_parent_count() {
                    stack.push(child);
                    seen_count[c] = 0;
                }
            }
        }
        trace!(nodes = n, "computed gdfo for graph");
    }

    pub(crate) fn topo_order_indices(&self) -> Result<Vec<NodeIdx>, GraphError> {
        let n = self.nodes.len();
        let has_tail = n == 0 || (0..n).any(|i| self.nodes[i].real_parent_count() == 0);
        if !has_tail {
            return Err(GraphError::Cycle { residual: self.nodes.iter().map(|node| node.key.clone()).collect() });
        }

        let mut seen_count = vec![0u32; n];
        let mut visited = vec![false; n];
        let mut stack: Vec<NodeIdx> =
            (0..n).filter(|&i| self.nodes[i].real_parent_count() == 0).map(|i| NodeIdx(i as u32)).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(idx) = stack.pop() {
            let i = idx.0 as usize;
            if visited[i] {
                continue;
            }
            visited[i] = true;
            order.push(idx);
            for &child in &self.nodes[i].children {
                let c = child.0 as usize;
                seen_count[c] += 1;
                if seen_count[c] == self.nodes[c].real_parent_count() {
                    stack.push(child);
                }
            }
        }

        if order.len() != n {
            let residual = (0..n).filter(|&i| !visited[i]).map(|i| self.nodes[i].key.clone()).collect();
            return Err(GraphError::Cycle { residual });
        }
        Ok(order)
    }

    /// A topological order of every node's key: parents always precede
    /// their children. Ghost parents never appear (they have no node).
    pub fn topo_sort(&self) -> Result<Vec<Arc<Key>>, GraphError> {
        Ok(self.topo_order_indices()?.into_iter().map(|idx| self.nodes[idx.0 as usize].key.clone()).collect())
    }

    pub(crate) fn depths_from_tail(&self) -> Result<Vec<u32>, GraphError> {
        let order = self.topo_order_indices()?;
        let mut depth = vec![0u32; self.nodes.len()];
        for idx in order {
            let i = idx.0 as usize;
            let first_parent = self.nodes[i].parents.first().copied().flatten();
            depth[i] = match first_parent {
                Some(p) => 1 + depth[p.0 as usize],
                None => 1,
            };
        }
        Ok(depth)
    }

    /// The heads of `candidates`: the subset not an ancestor of any other
    /// candidate. `NULL_REVISION` is dominated by any other candidate and
    /// is only a head when it is the sole candidate.
    pub fn heads(&self, candidates: &[Key]) -> Result<BTreeSet<Arc<Key>>, GraphError> {
        let is_null = |k: &Key| k.len() == 1 && k.components()[0].as_ref() == NULL_REVISION;

        if candidates.len() == 1 {
            if is_null(&candidates[0]) {
                return Ok(BTreeSet::from([Arc::new(candidates[0].clone())]));
            }
            let idx = self.resolve(&candidates[0])?;
            return Ok(BTreeSet::from([self.nodes[idx.0 as usize].key.clone()]));
        }

        let mut resolved: Vec<NodeIdx> = Vec::new();
        for k in candidates {
            if is_null(k) {
                continue;
            }
            resolved.push(self.resolve(k)?);
        }
        if resolved.is_empty() {
            // Every candidate is NULL_REVISION but there's more than one of
            // them, so none is the sole candidate: NULL is dominated.
            return Ok(BTreeSet::new());
        }
        if resolved.len() == 1 {
            return Ok(BTreeSet::from([self.nodes[resolved[0].0 as usize].key.clone()]));
        }

        let cache_key: BTreeSet<NodeIdx> = resolved.iter().copied().collect();
        if let Some(cached) = self.heads_cache.borrow().get(&cache_key) {
            return Ok(cached.iter().map(|idx| self.nodes[idx.0 as usize].key.clone()).collect());
        }

        let candidate_set: HashSet<NodeIdx> = resolved.iter().copied().collect();
        let min_gdfo = resolved.iter().map(|idx| self.nodes[idx.0 as usize].gdfo).min().unwrap_or(0);

        let mut excluded: HashSet<NodeIdx> = HashSet::new();
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeIdx> = Vec::new();
        for &idx in &resolved {
            for parent in self.nodes[idx.0 as usize].parents.iter().flatten() {
                stack.push(*parent);
            }
        }

        while let Some(idx) = stack.pop() {
            let i = idx.0 as usize;
            if seen[i] {
                continue;
            }
            seen[i] = true;
            if candidate_set.contains(&idx) {
                excluded.insert(idx);
            }
            if self.nodes[i].gdfo <= min_gdfo {
                continue;
            }
            for parent in self.nodes[i].parents.iter().flatten() {
                stack.push(*parent);
            }
        }

        let head_idxs: BTreeSet<NodeIdx> = resolved.iter().copied().filter(|idx| !excluded.contains(idx)).collect();
        let heads: BTreeSet<Arc<Key>> = head_idxs.iter().map(|idx| self.nodes[idx.0 as usize].key.clone()).collect();
        self.heads_cache.borrow_mut().insert(cache_key, Arc::new(head_idxs));
        Ok(heads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> Key {
        Key::single(id.as_bytes())
    }

    /// A -> B,C -> D (a diamond): B and C both descend from A, and D
    /// merges them back together.
    fn diamond() -> Graph {
        Graph::from_parent_map([
            (key("A"), vec![]),
            (key("B"), vec![key("A")]),
            (key("C"), vec![key("A")]),
            (key("D"), vec![key("B"), key("C")]),
        ])
    }

    #[test]
    fn gdfo_grows_by_one_per_generation_and_merges_take_the_max() {
        let g = diamond();
        assert_eq!(g.gdfo(&key("A")), Some(1));
        assert_eq!(g.gdfo(&key("B")), Some(2));
        assert_eq!(g.gdfo(&key("C")), Some(2));
        assert_eq!(g.gdfo(&key("D")), Some(3));
    }

    #[test]
    fn topo_sort_keeps_parents_before_children() {
        let g = diamond();
        let order = g.topo_sort().unwrap();
        let pos = |id: &str| order.iter().position(|k| **k == key(id)).unwrap();
        assert!(pos("A") < pos("B"));
        assert!(pos("A") < pos("C"));
        assert!(pos("B") < pos("D"));
        assert!(pos("C") < pos("D"));
    }

    #[test]
    fn topo_sort_reports_a_cycle_when_every_node_has_a_parent() {
        let g = Graph::from_parent_map([(key("A"), vec![key("B")]), (key("B"), vec![key("A")])]);
        let err = g.topo_sort().unwrap_err();
        assert!(matches!(err, GraphError::Cycle { residual } if residual.len() == 2));
    }

    #[test]
    fn ghost_parents_become_holes_not_missing_edges() {
        let g = Graph::from_parent_map([(key("A"), vec![key("ghost")])]);
        assert_eq!(g.gdfo(&key("A")), Some(1), "an unresolved parent must not block gdfo computation");
        assert!(!g.contains(&key("ghost")), "a ghost parent never gets its own node");
    }

    #[test]
    fn heads_of_the_full_diamond_is_just_the_tip() {
        let g = diamond();
        let heads = g.heads(&[key("A"), key("B"), key("C"), key("D")]).unwrap();
        assert_eq!(heads, BTreeSet::from([g.resolve(&key("D")).map(|i| g.node(i).key.clone()).unwrap()]));
    }

    #[test]
    fn heads_of_two_siblings_keeps_both() {
        let g = diamond();
        let heads = g.heads(&[key("B"), key("C")]).unwrap();
        let ids: BTreeSet<Vec<u8>> = heads.iter().map(|k| k.components()[0].to_vec()).collect();
        assert_eq!(ids, BTreeSet::from([b"B".to_vec(), b"C".to_vec()]));
    }

    #[test]
    fn heads_of_a_single_candidate_is_that_candidate() {
        let g = diamond();
        let heads = g.heads(&[key("A")]).unwrap();
        assert_eq!(heads.len(), 1);
    }

    #[test]
    fn null_revision_is_dominated_by_any_real_candidate() {
        let g = diamond();
        let null = Key::single(NULL_REVISION);
        let heads = g.heads(&[null, key("A")]).unwrap();
        assert_eq!(heads.iter().next().unwrap().components()[0].as_ref(), b"A");
    }

    #[test]
    fn heads_caches_repeated_queries() {
        let g = diamond();
        let first = g.heads(&[key("B"), key("C")]).unwrap();
        let second = g.heads(&[key("B"), key("C")]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn null_revision_alone_is_its_own_head() {
        let g = diamond();
        let null = Key::single(NULL_REVISION);
        let heads = g.heads(&[null]).unwrap();
        assert_eq!(heads.len(), 1);
        assert_eq!(heads.iter().next().unwrap().components()[0].as_ref(), NULL_REVISION);
    }

    #[test]
    fn null_revision_repeated_is_dominated() {
        let g = diamond();
        let null = Key::single(NULL_REVISION);
        let heads = g.heads(&[null.clone(), null]).unwrap();
        assert!(heads.is_empty());
    }
}
