use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use aviary_interner::Key;

/// Memoizes [`merge_sorted_dedup`] results keyed by the ordered-min/max
/// pair of inputs, so `merge(a,b)` and `merge(b,a)` share one entry.
pub type MergeCache = HashMap<(Vec<Arc<Key>>, Vec<Arc<Key>>), Vec<Arc<Key>>>;

/// Merges two sorted, deduplicated annotation tuples into a new sorted,
/// deduplicated tuple, memoizing the result under the normalized pair.
pub fn merge_sorted_dedup(a: &[Arc<Key>], b: &[Arc<Key>], cache: &mut MergeCache) -> Vec<Arc<Key>> {
    let (lo, hi) = if a <= b { (a.to_vec(), b.to_vec()) } else { (b.to_vec(), a.to_vec()) };
    if let Some(cached) = cache.get(&(lo.clone(), hi.clone())) {
        return cached.clone();
    }
    let merged = two_pointer_merge(&lo, &hi);
    cache.insert((lo, hi), merged.clone());
    merged
}

/// Classical two-pointer sorted merge; an element equal in both inputs
/// is consumed once.
fn two_pointer_merge(a: &[Arc<Key>], b: &[Arc<Key>]) -> Vec<Arc<Key>> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
