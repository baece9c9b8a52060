use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

/// Tunable knobs for a [`TupleSet`], mirroring the ratios spec'd for the
/// open-addressing table: an initial capacity, the load factor that
/// triggers a doubling resize on insert, and the dummy-tombstone ratio
/// that triggers a cleanup resize on removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub initial_capacity: usize,
    pub max_load_num: u64,
    pub max_load_den: u64,
    pub dummy_cleanup_num: u64,
    pub dummy_cleanup_den: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_load_num: 2,
            max_load_den: 3,
            dummy_cleanup_num: 1,
            dummy_cleanup_den: 5,
        }
    }
}

/// Failure modes surfaced by [`TupleSet`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TupleSetError {
    /// An iterator observed the table change shape mid-traversal.
    #[error("tuple set was mutated while an iterator over it was live")]
    MutatedDuringIteration,
}

#[derive(Clone)]
enum Slot<T> {
    Empty,
    Dummy,
    Occupied(Arc<T>),
}

/// An open-addressing set whose live elements are shared, canonical
/// `Arc<T>` handles: at most one physical representative of an equal
/// value exists in the set at a time.
///
/// Probing follows the CPython-dict perturbation scheme so that clustering
/// behaves the same way under adversarial insert orders.
pub struct TupleSet<T> {
    slots: Vec<Slot<T>>,
    /// live + tombstoned slots
    fill: usize,
    /// live slots only
    used: usize,
    config: Config,
    /// bumped on every structural mutation; lets iterators fail fast.
    generation: u64,
}

impl<T> std::fmt::Debug for TupleSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TupleSet")
            .field("capacity", &self.slots.len())
            .field("used", &self.used)
            .field("fill", &self.fill)
            .finish()
    }
}

impl<T: Hash + Eq> Default for TupleSet<T> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<T: Hash + Eq> TupleSet<T> {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let capacity = config.initial_capacity.next_power_of_two();
        Self {
            slots: (0..capacity).map(|_| Slot::Empty).collect(),
            fill: 0,
            used: 0,
            config,
            generation: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.used
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    fn hash_of(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns the canonical handle for `key` if present.
    pub fn get(&self, key: &T) -> Option<Arc<T>> {
        let mask = self.mask();
        let hash = Self::hash_of(key);
        match self.probe(hash, key, mask) {
            ProbeResult::Found(idx) => match &self.slots[idx] {
                Slot::Occupied(existing) => Some(existing.clone()),
                _ => unreachable!("probe only returns Found for occupied slots"),
            },
            ProbeResult::Insert(_) => None,
        }
    }

    #[must_use]
    pub fn contains(&self, key: &T) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `key`, returning the canonical handle: the pre-existing one
    /// if an equal value was already present, else a freshly canonicalized
    /// handle wrapping `key` itself.
    pub fn add(&mut self, key: T) -> Arc<T> {
        self.maybe_grow();

        let mask = self.mask();
        let hash = Self::hash_of(&key);
        match self.probe(hash, &key, mask) {
            ProbeResult::Found(idx) => match &self.slots[idx] {
                Slot::Occupied(existing) => existing.clone(),
                _ => unreachable!("probe only returns Found for occupied slots"),
            },
            ProbeResult::Insert(idx) => {
                let was_empty = matches!(self.slots[idx], Slot::Empty);
                let interned = Arc::new(key);
                self.slots[idx] = Slot::Occupied(interned.clone());
                if was_empty {
                    self.fill += 1;
                }
                self.used += 1;
                self.generation += 1;
                trace!(used = self.used, fill = self.fill, "tuple set insert");
                interned
            }
        }
    }

    /// Removes `key` if present, turning its slot into a tombstone so
    /// probe chains through it remain intact. Returns whether anything was
    /// removed.
    pub fn discard(&mut self, key: &T) -> bool {
        let mask = self.mask();
        let hash = Self::hash_of(key);
        let removed = match self.probe(hash, key, mask) {
            ProbeResult::Found(idx) => {
                self.slots[idx] = Slot::Dummy;
                self.used -= 1;
                true
            }
            ProbeResult::Insert(_) => false,
        };
        if removed {
            self.generation += 1;
            self.maybe_cleanup();
        }
        removed
    }

    fn mask(&self) -> u64 {
        (self.slots.len() - 1) as u64
    }

    /// Probes using the dict-style perturbation sequence: `i := (i<<2) + i
    /// + perturb + 1; perturb >>= 5`, starting at `hash & mask`.
    fn probe(&self, hash: u64, key: &T, mask: u64) -> ProbeResult {
        let mut perturb = hash;
        let mut i = hash & mask;
        let mut first_dummy: Option<usize> = None;

        loop {
            match &self.slots[i as usize] {
                Slot::Empty => {
                    return ProbeResult::Insert(first_dummy.unwrap_or(i as usize));
                }
                Slot::Dummy => {
                    if first_dummy.is_none() {
                        first_dummy = Some(i as usize);
                    }
                }
                Slot::Occupied(existing) => {
                    if existing.as_ref() == key {
                        return ProbeResult::Found(i as usize);
                    }
                }
            }
            i = ((i << 2).wrapping_add(i).wrapping_add(perturb).wrapping_add(1)) & mask;
            perturb >>= 5;
        }
    }

    fn maybe_grow(&mut self) {
        if self.fill as u64 * self.config.max_load_den >= self.slots.len() as u64 * self.config.max_load_num {
            let new_capacity = self.slots.len() * 2;
            self.rehash(new_capacity);
        }
    }

    fn maybe_cleanup(&mut self) {
        let dummies = self.fill - self.used;
        if dummies as u64 * self.config.dummy_cleanup_den > self.slots.len() as u64 * self.config.dummy_cleanup_num {
            let capacity = self.slots.len();
            self.rehash(capacity);
        }
    }

    fn rehash(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(self.config.initial_capacity).next_power_of_two();
        let old_slots = std::mem::replace(
            &mut self.slots,
            (0..new_capacity).map(|_| Slot::Empty).collect(),
        );
        self.fill = 0;
        self.used = 0;
        let mask = self.mask();
        for slot in old_slots {
            if let Slot::Occupied(value) = slot {
                let hash = Self::hash_of(&value);
                let idx = match self.probe(hash, &value, mask) {
                    ProbeResult::Insert(idx) => idx,
                    ProbeResult::Found(_) => unreachable!("rehashing cannot find duplicates"),
                };
                self.slots[idx] = Slot::Occupied(value);
                self.fill += 1;
                self.used += 1;
            }
        }
        self.generation += 1;
        trace!(capacity = new_capacity, used = self.used, "tuple set rehashed");
    }

    /// Iterates live elements in slot order. The iterator detects
    /// concurrent mutation and yields a single `Err` before stopping.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            set: self,
            index: 0,
            generation: self.generation,
            poisoned: false,
        }
    }
}

enum ProbeResult {
    Found(usize),
    Insert(usize),
}

/// Fallible, mutation-sensitive iterator over a [`TupleSet`]'s live elements.
pub struct Iter<'a, T> {
    set: &'a TupleSet<T>,
    index: usize,
    generation: u64,
    poisoned: bool,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = Result<Arc<T>, TupleSetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        if self.generation != self.set.generation {
            self.poisoned = true;
            return Some(Err(TupleSetError::MutatedDuringIteration));
        }
        while self.index < self.set.slots.len() {
            let idx = self.index;
            self.index += 1;
            if let Slot::Occupied(value) = &self.set.slots[idx] {
                return Some(Ok(value.clone()));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_returns_canonical_representative() {
        let mut set: TupleSet<String> = TupleSet::default();
        let a = set.add("hello".to_string());
        let b = set.add("hello".to_string());
        assert!(Arc::ptr_eq(&a, &b), "equal inserts must return the same canonical handle");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn discard_turns_slot_into_dummy_not_empty() {
        let mut set: TupleSet<String> = TupleSet::default();
        set.add("a".to_string());
        assert!(set.discard(&"a".to_string()), "discard must report the key was present");
        assert!(!set.contains(&"a".to_string()), "discarded key must no longer be contained");
        assert_eq!(set.len(), 0);
        // re-adding after discard must still work (probing through dummies)
        let again = set.add("a".to_string());
        assert_eq!(*again, "a");
    }

    #[test]
    fn grows_under_load() {
        let mut set: TupleSet<u64> = TupleSet::new(Config {
            initial_capacity: 4,
            ..Config::default()
        });
        for i in 0..100 {
            set.add(i);
        }
        assert_eq!(set.len(), 100);
        for i in 0..100 {
            assert!(set.contains(&i), "key {i} must survive a grow");
        }
    }

    #[test]
    fn iteration_fails_fast_on_mutation() {
        let mut set: TupleSet<u32> = TupleSet::default();
        set.add(1);
        set.add(2);
        let mut iter = set.iter();
        let _first = iter.next();
        set.add(3);
        let next = iter.next();
        assert!(
            matches!(next, Some(Err(TupleSetError::MutatedDuringIteration))),
            "iterator must fail fast once the set was mutated mid-traversal"
        );
        assert!(iter.next().is_none(), "poisoned iterator must stay exhausted");
    }

    #[test]
    fn many_discards_trigger_cleanup_resize_without_losing_live_entries() {
        let mut set: TupleSet<u64> = TupleSet::new(Config {
            initial_capacity: 8,
            ..Config::default()
        });
        for i in 0..50 {
            set.add(i);
        }
        for i in 0..40 {
            assert!(set.discard(&i), "key {i} must still be present before its discard");
        }
        assert_eq!(set.len(), 10);
        for i in 40..50 {
            assert!(set.contains(&i), "key {i} must survive the cleanup resize");
        }
    }
}
