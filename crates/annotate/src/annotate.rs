use std::collections::HashMap;
use std::sync::Arc;

use aviary_interner::Key;
use aviary_revision_graph::Graph;
use tracing::debug;

use crate::error::AnnotateError;
use crate::lines::split_lines;
use crate::merge::{merge_sorted_dedup, MergeCache};
use crate::progress::{ProgressScope, ProgressSink};
use crate::traits::{LineMatcher, VersionedFileStore};

/// Returns `(annotations, lines)` for `tip`'s text: `lines[i]` is the
/// i-th line of `tip`'s full text and `annotations[i]` is the sorted,
/// deduplicated tuple of revisions that independently introduced it.
///
/// Fails with [`AnnotateError::RevisionNotPresent`] if the store's own
/// ancestry walk never mentions `tip`.
pub fn annotate<S: VersionedFileStore + ?Sized>(
    store: &S,
    matcher: &dyn LineMatcher,
    tip: &Arc<Key>,
    progress: Option<&dyn ProgressSink>,
) -> Result<(Vec<Vec<Arc<Key>>>, Vec<Vec<u8>>), AnnotateError> {
    let _scope = ProgressScope::enter(progress, "annotate");

    let ancestry = store.iter_ancestry(std::slice::from_ref(tip))?;
    let mut parents_of: HashMap<Arc<Key>, Vec<Arc<Key>>> = HashMap::new();
    for (key, parents) in ancestry {
        parents_of.insert(key, parents.unwrap_or_default());
    }
    if !parents_of.contains_key(tip) {
        return Err(AnnotateError::RevisionNotPresent(tip.clone()));
    }
    debug!(ancestry_size = parents_of.len(), "discovered ancestry for annotate");

    // The target starts at 1 so it's never evicted by its own (nonexistent)
    // children; every other key's count is the number of ancestry entries
    // that name it as a parent.
    let mut num_needed_children: HashMap<Arc<Key>, usize> = parents_of.keys().map(|k| (k.clone(), 0)).collect();
    for parents in parents_of.values() {
        for parent in parents {
            *num_needed_children.entry(parent.clone()).or_insert(0) += 1;
        }
    }
    *num_needed_children.entry(tip.clone()).or_insert(0) += 1;

    let order = topo_order(&parents_of);
    let records = store.get_record_stream(&order)?;

    let mut lines_of: HashMap<Arc<Key>, Vec<Vec<u8>>> = HashMap::new();
    for record in records {
        lines_of.insert(record.key, split_lines(&record.chunks.concat()));
    }

    let mut annotations_of: HashMap<Arc<Key>, Vec<Vec<Arc<Key>>>> = HashMap::new();
    let mut merge_cache = MergeCache::new();

    for key in &order {
        let lines = lines_of.get(key).cloned().unwrap_or_default();
        let mut annotations: Vec<Vec<Arc<Key>>> = vec![vec![key.clone()]; lines.len()];

        let parents = parents_of.get(key).cloned().unwrap_or_default();
        for (parent_index, parent) in parents.iter().enumerate() {
            let parent_lines = lines_of.get(parent).cloned().unwrap_or_default();
            let parent_annotations = annotations_of.get(parent).cloned().unwrap_or_default();
            let blocks = matcher.matching_blocks(&parent_lines, &lines);

            for (a_idx, b_idx, len) in blocks {
                for offset in 0..len {
                    let (pa, pb) = (a_idx + offset, b_idx + offset);
                    if pa >= parent_annotations.len() || pb >= annotations.len() {
                        continue;
                    }
                    if parent_index == 0 {
                        annotations[pb] = parent_annotations[pa].clone();
                    } else if annotations[pb].len() == 1 && annotations[pb][0] == *key {
                        annotations[pb] = parent_annotations[pa].clone();
                    } else {
                        annotations[pb] = merge_sorted_dedup(&annotations[pb], &parent_annotations[pa], &mut merge_cache);
                    }
                }
            }
        }

        annotations_of.insert(key.clone(), annotations);

        for parent in &parents {
            if let Some(count) = num_needed_children.get_mut(parent) {
                *count -= 1;
                if *count == 0 {
                    annotations_of.remove(parent);
                    lines_of.remove(parent);
                }
            }
        }
    }

    let final_annotations = annotations_of.remove(tip).unwrap_or_default();
    let final_lines = lines_of.remove(tip).unwrap_or_default();
    Ok((final_annotations, final_lines))
}

/// Collapses each line's annotation tuple to a single "best" origin via
/// the known graph's heads query, tie-broken (by default) by taking the
/// smallest key when more than one head remains.
pub fn annotate_flat<S: VersionedFileStore + ?Sized>(
    store: &S,
    graph: &Graph,
    matcher: &dyn LineMatcher,
    tip: &Arc<Key>,
    progress: Option<&dyn ProgressSink>,
) -> Result<Vec<(Arc<Key>, Vec<u8>)>, AnnotateError> {
    let (annotations, lines) = annotate(store, matcher, tip, progress)?;
    annotations
        .into_iter()
        .zip(lines)
        .map(|(annotation, line)| Ok((resolve_origin(graph, &annotation)?, line)))
        .collect()
}

fn resolve_origin(graph: &Graph, annotation: &[Arc<Key>]) -> Result<Arc<Key>, AnnotateError> {
    if annotation.len() == 1 {
        return Ok(annotation[0].clone());
    }
    let candidates: Vec<Key> = annotation.iter().map(|k| (**k).clone()).collect();
    let heads = graph.heads(&candidates)?;
    if heads.len() == 1 {
        return Ok(heads.into_iter().next().expect("checked len == 1 above"));
    }
    Ok(heads.into_iter().min().expect("annotation is non-empty, so heads() is non-empty"))
}

/// Kahn's algorithm over the discovered ancestry: parents always precede
/// their children. Ties are broken by key bytes so the order (and thus
/// the merge cache's hit pattern) is reproducible run to run.
fn topo_order(parents_of: &HashMap<Arc<Key>, Vec<Arc<Key>>>) -> Vec<Arc<Key>> {
    let mut children_of: HashMap<Arc<Key>, Vec<Arc<Key>>> = HashMap::new();
    let mut remaining: HashMap<Arc<Key>, usize> = parents_of.keys().map(|k| (k.clone(), 0)).collect();
    for (key, parents) in parents_of {
        *remaining.entry(key.clone()).or_insert(0) += parents.len();
        for parent in parents {
            children_of.entry(parent.clone()).or_default().push(key.clone());
        }
    }

    let mut ready: Vec<Arc<Key>> = remaining.iter().filter(|(_, &c)| c == 0).map(|(k, _)| k.clone()).collect();
    ready.sort();
    let mut stack = ready;
    let mut order = Vec::with_capacity(parents_of.len());

    while let Some(key) = stack.pop() {
        order.push(key.clone());
        if let Some(children) = children_of.get(&key) {
            let mut newly_ready = Vec::new();
            for child in children {
                if let Some(count) = remaining.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        newly_ready.push(child.clone());
                    }
                }
            }
            newly_ready.sort();
            stack.extend(newly_ready.into_iter().rev());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeStore {
        parents: HashMap<Arc<Key>, Vec<Arc<Key>>>,
        texts: HashMap<Arc<Key>, Vec<u8>>,
    }

    impl VersionedFileStore for FakeStore {
        fn iter_ancestry(
            &self,
            _keys: &[Arc<Key>],
        ) -> Result<Vec<(Arc<Key>, Option<Vec<Arc<Key>>>)>, crate::error::StoreError> {
            Ok(self.parents.iter().map(|(k, p)| (k.clone(), Some(p.clone()))).collect())
        }

        fn get_record_stream(
            &self,
            keys: &[Arc<Key>],
        ) -> Result<Vec<crate::traits::FullTextRecord>, crate::error::StoreError> {
            Ok(keys
                .iter()
                .filter_map(|k| {
                    self.texts.get(k).map(|text| crate::traits::FullTextRecord { key: k.clone(), chunks: vec![text.clone()] })
                })
                .collect())
        }
    }

    /// A minimal matcher for fixed-width fixtures: pairs up lines that
    /// are byte-identical, in input order, with no gap collapsing.
    struct ExactLineMatcher;

    impl LineMatcher for ExactLineMatcher {
        fn matching_blocks(&self, a: &[Vec<u8>], b: &[Vec<u8>]) -> Vec<(usize, usize, usize)> {
            let mut blocks = Vec::new();
            let mut run_start: Option<(usize, usize)> = None;
            let mut run_len = 0usize;
            let (mut i, mut j) = (0, 0);
            while i < a.len() && j < b.len() {
                if a[i] == b[j] {
                    if run_start.is_none() {
                        run_start = Some((i, j));
                    }
                    run_len += 1;
                    i += 1;
                    j += 1;
                } else if let Some((ra, rb)) = run_start.take() {
                    blocks.push((ra, rb, run_len));
                    run_len = 0;
                    j += 1;
                } else {
                    j += 1;
                }
            }
            if let Some((ra, rb)) = run_start {
                blocks.push((ra, rb, run_len));
            }
            blocks.push((a.len(), b.len(), 0));
            blocks
        }
    }

    fn key(id: &str) -> Arc<Key> {
        Arc::new(Key::single(id.as_bytes()))
    }

    /// A -> B -> D (mainline) and A -> C -> D (one-line side branch),
    /// each revision appending exactly one new line.
    fn diamond_store() -> FakeStore {
        let mut parents = HashMap::new();
        parents.insert(key("A"), vec![]);
        parents.insert(key("B"), vec![key("A")]);
        parents.insert(key("C"), vec![key("A")]);
        parents.insert(key("D"), vec![key("B"), key("C")]);

        let mut texts = HashMap::new();
        texts.insert(key("A"), b"x\n".to_vec());
        texts.insert(key("B"), b"x\ny\n".to_vec());
        texts.insert(key("C"), b"x\nz\n".to_vec());
        texts.insert(key("D"), b"x\ny\nz\n".to_vec());

        FakeStore { parents, texts }
    }

    #[test]
    fn each_line_is_attributed_to_the_revision_that_introduced_it() {
        let store = diamond_store();
        let (annotations, lines) = annotate(&store, &ExactLineMatcher, &key("D"), None).unwrap();
        assert_eq!(lines, vec![b"x\n".to_vec(), b"y\n".to_vec(), b"z\n".to_vec()]);
        assert_eq!(annotations[0], vec![key("A")]);
        assert_eq!(annotations[1], vec![key("B")]);
        assert_eq!(annotations[2], vec![key("C")]);
    }

    #[test]
    fn annotate_flat_resolves_each_line_to_a_single_origin() {
        let store = diamond_store();
        let graph = Graph::from_parent_map([
            ((*key("A")).clone(), vec![]),
            ((*key("B")).clone(), vec![(*key("A")).clone()]),
            ((*key("C")).clone(), vec![(*key("A")).clone()]),
            ((*key("D")).clone(), vec![(*key("B")).clone(), (*key("C")).clone()]),
        ]);
        let flat = annotate_flat(&store, &graph, &ExactLineMatcher, &key("D"), None).unwrap();
        let origins: Vec<&[u8]> = flat.iter().map(|(origin, _)| origin.components()[0].as_ref()).collect();
        assert_eq!(origins, vec![b"A".as_slice(), b"B".as_slice(), b"C".as_slice()]);
    }

    #[test]
    fn annotate_rejects_a_tip_absent_from_the_store() {
        let store = FakeStore { parents: HashMap::new(), texts: HashMap::new() };
        let err = annotate(&store, &ExactLineMatcher, &key("missing"), None).unwrap_err();
        assert!(matches!(err, AnnotateError::RevisionNotPresent(k) if k == key("missing")));
    }

    #[test]
    fn a_line_kept_by_both_parents_merges_into_a_two_revision_tuple() {
        // A -> B, A -> C, both B and C keep line "x" verbatim from A and
        // add nothing; M merges B and C and should show x attributed to A
        // alone (not to all three), since the merge only widens a tuple
        // when the line's own history actually diverges.
        let mut parents = HashMap::new();
        parents.insert(key("A"), vec![]);
        parents.insert(key("B"), vec![key("A")]);
        parents.insert(key("C"), vec![key("A")]);
        parents.insert(key("M"), vec![key("B"), key("C")]);
        let mut texts = HashMap::new();
        texts.insert(key("A"), b"x\n".to_vec());
        texts.insert(key("B"), b"x\n".to_vec());
        texts.insert(key("C"), b"x\n".to_vec());
        texts.insert(key("M"), b"x\n".to_vec());
        let store = FakeStore { parents, texts };

        let (annotations, _) = annotate(&store, &ExactLineMatcher, &key("M"), None).unwrap();
        assert_eq!(annotations[0], vec![key("A")], "unchanged line must keep its original single attribution");
    }
}
