//! The chain's base key-value store and the copy-on-write [`ChangeSet`]
//! overlay transactions execute against (spec.md §3, "StorageChangeSet").
//!
//! Mirrors the teacher's `IReadOnlyStore`/`IWriteStore`/`IStoreSnapshot`
//! split (`neo-persistence::storage`): a plain store for the committed
//! state, and a snapshot-like overlay that batches writes until `commit`.

use std::collections::HashMap;

/// The chain's durable key-value space. Disk persistence is explicitly out
/// of scope (spec.md §1); this is the in-memory base every [`ChangeSet`]
/// forks from and commits back into.
#[derive(Clone, Debug, Default)]
pub struct Storage {
    data: HashMap<Vec<u8>, Vec<u8>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.data.insert(key, value);
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    /// Forks a copy-on-write overlay over the current state. Writes made to
    /// the returned [`ChangeSet`] are invisible to this `Storage` until
    /// [`Storage::commit`] is called with it.
    pub fn fork_change_set(&self) -> ChangeSet {
        ChangeSet {
            base: self.data.clone(),
            overlay: HashMap::new(),
        }
    }

    /// Atomically merges a forked [`ChangeSet`]'s writes into this store.
    pub fn commit(&mut self, change_set: ChangeSet) {
        for (key, value) in change_set.overlay {
            match value {
                Some(v) => {
                    self.data.insert(key, v);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
    }

    /// Iterates all keys with the given prefix, in unspecified order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.data.iter().filter(move |(k, _)| k.starts_with(prefix))
    }
}

/// A two-level overlay over a chain's base storage: reads check the
/// overlay first, then fall through to the forked base snapshot; writes
/// and deletes accumulate in the overlay and are only visible to readers
/// of this same `ChangeSet` until it is committed or discarded.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    base: HashMap<Vec<u8>, Vec<u8>>,
    overlay: HashMap<Vec<u8>, Option<Vec<u8>>>,
}

impl ChangeSet {
    /// An empty change set with no base (useful for read-only/throwaway
    /// invocations that discard their writes).
    pub fn empty() -> Self {
        Self {
            base: HashMap::new(),
            overlay: HashMap::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.overlay.get(key) {
            Some(Some(v)) => Some(v.clone()),
            Some(None) => None,
            None => self.base.get(key).cloned(),
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.overlay.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.overlay.insert(key.to_vec(), None);
    }

    /// Keys with the given prefix, reflecting both the base snapshot and
    /// this change set's own overlay writes/deletes.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut seen: HashMap<Vec<u8>, Option<Vec<u8>>> = HashMap::new();
        for (k, v) in self.base.iter().filter(|(k, _)| k.starts_with(prefix)) {
            seen.insert(k.clone(), Some(v.clone()));
        }
        for (k, v) in self.overlay.iter().filter(|(k, _)| k.starts_with(prefix)) {
            seen.insert(k.clone(), v.clone());
        }
        seen.into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect()
    }

    /// Folds another change set's writes into this one (used to aggregate
    /// per-transaction change sets into a single block-level delta).
    pub fn absorb(&mut self, other: ChangeSet) {
        for (key, value) in other.overlay {
            self.overlay.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_shadows_base_until_commit() {
        let mut storage = Storage::new();
        storage.set(b"a".to_vec(), b"1".to_vec());

        let mut cs = storage.fork_change_set();
        assert_eq!(cs.get(b"a"), Some(b"1".to_vec()));
        cs.set(b"a".to_vec(), b"2".to_vec());
        assert_eq!(cs.get(b"a"), Some(b"2".to_vec()));
        assert_eq!(storage.get(b"a"), Some(&b"1".to_vec()));

        storage.commit(cs);
        assert_eq!(storage.get(b"a"), Some(&b"2".to_vec()));
    }

    #[test]
    fn discarded_change_set_never_touches_base() {
        let mut storage = Storage::new();
        storage.set(b"a".to_vec(), b"1".to_vec());
        let mut cs = storage.fork_change_set();
        cs.delete(b"a");
        drop(cs);
        assert_eq!(storage.get(b"a"), Some(&b"1".to_vec()));
    }

    #[test]
    fn delete_then_read_returns_none() {
        let mut storage = Storage::new();
        storage.set(b"a".to_vec(), b"1".to_vec());
        let mut cs = storage.fork_change_set();
        cs.delete(b"a");
        assert_eq!(cs.get(b"a"), None);
    }
}
