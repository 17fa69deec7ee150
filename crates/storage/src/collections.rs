//! Structured collections built on [`ChangeSet`]: a hashed-key `Map` and an
//! integer-indexed `List`, as named in spec.md §3. Contracts own a
//! namespace prefix (typically their contract address plus a field tag)
//! and thread the transaction's `ChangeSet` through explicitly, matching
//! the context-passing design note in spec.md §9 (no global "current
//! storage").

use crate::change_set::ChangeSet;
use crate::error::{StorageError, StorageResult};
use vela_io::Serializable;

fn join(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

/// A hashed-key-to-value map scoped under a namespace prefix.
#[derive(Clone, Debug)]
pub struct StorageMap {
    prefix: Vec<u8>,
}

impl StorageMap {
    pub fn new(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: &[u8]) -> Vec<u8> {
        join(&self.prefix, key)
    }

    pub fn get_bytes(&self, cs: &ChangeSet, key: &[u8]) -> Option<Vec<u8>> {
        cs.get(&self.key(key))
    }

    pub fn set_bytes(&self, cs: &mut ChangeSet, key: &[u8], value: Vec<u8>) {
        cs.set(self.key(key), value);
    }

    pub fn delete(&self, cs: &mut ChangeSet, key: &[u8]) {
        cs.delete(&self.key(key));
    }

    pub fn contains(&self, cs: &ChangeSet, key: &[u8]) -> bool {
        cs.contains(&self.key(key))
    }

    /// All raw entries under this map's namespace, with the namespace
    /// prefix stripped from each key.
    pub fn all_bytes(&self, cs: &ChangeSet) -> Vec<(Vec<u8>, Vec<u8>)> {
        cs.scan_prefix(&self.prefix)
            .into_iter()
            .map(|(k, v)| (k[self.prefix.len()..].to_vec(), v))
            .collect()
    }

    pub fn get<T: Serializable>(&self, cs: &ChangeSet, key: &[u8]) -> StorageResult<Option<T>> {
        match self.get_bytes(cs, key) {
            Some(bytes) => Ok(Some(T::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serializable>(&self, cs: &mut ChangeSet, key: &[u8], value: &T) {
        self.set_bytes(cs, key, value.to_bytes());
    }
}

/// An integer-indexed sequence scoped under a namespace prefix, supporting
/// Count/Add/Replace/RemoveAt/Clear/Get/All as named in spec.md §3.
#[derive(Clone, Debug)]
pub struct StorageList {
    prefix: Vec<u8>,
}

impl StorageList {
    pub fn new(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn count_key(&self) -> Vec<u8> {
        join(&self.prefix, b":count")
    }

    fn item_key(&self, index: u64) -> Vec<u8> {
        join(&self.prefix, &[b":i".as_slice(), &index.to_le_bytes()].concat())
    }

    pub fn count(&self, cs: &ChangeSet) -> u64 {
        cs.get(&self.count_key())
            .map(|b| u64::from_le_bytes(b.try_into().unwrap_or([0; 8])))
            .unwrap_or(0)
    }

    fn set_count(&self, cs: &mut ChangeSet, count: u64) {
        cs.set(self.count_key(), count.to_le_bytes().to_vec());
    }

    pub fn get_bytes(&self, cs: &ChangeSet, index: u64) -> StorageResult<Vec<u8>> {
        cs.get(&self.item_key(index))
            .ok_or(StorageError::IndexOutOfBounds {
                index,
                len: self.count(cs),
            })
    }

    pub fn add_bytes(&self, cs: &mut ChangeSet, value: Vec<u8>) -> u64 {
        let index = self.count(cs);
        cs.set(self.item_key(index), value);
        self.set_count(cs, index + 1);
        index
    }

    pub fn replace_bytes(&self, cs: &mut ChangeSet, index: u64, value: Vec<u8>) -> StorageResult<()> {
        let len = self.count(cs);
        if index >= len {
            return Err(StorageError::IndexOutOfBounds { index, len });
        }
        cs.set(self.item_key(index), value);
        Ok(())
    }

    /// Removes the element at `index`, shifting later elements down by one
    /// to preserve order.
    pub fn remove_at(&self, cs: &mut ChangeSet, index: u64) -> StorageResult<()> {
        let len = self.count(cs);
        if index >= len {
            return Err(StorageError::IndexOutOfBounds { index, len });
        }
        for i in index..len - 1 {
            let next = self.get_bytes(cs, i + 1)?;
            cs.set(self.item_key(i), next);
        }
        cs.delete(&self.item_key(len - 1));
        self.set_count(cs, len - 1);
        Ok(())
    }

    pub fn clear(&self, cs: &mut ChangeSet) {
        let len = self.count(cs);
        for i in 0..len {
            cs.delete(&self.item_key(i));
        }
        cs.delete(&self.count_key());
    }

    pub fn all_bytes(&self, cs: &ChangeSet) -> Vec<Vec<u8>> {
        (0..self.count(cs))
            .map(|i| self.get_bytes(cs, i).expect("index within count must exist"))
            .collect()
    }

    pub fn get<T: Serializable>(&self, cs: &ChangeSet, index: u64) -> StorageResult<T> {
        Ok(T::from_bytes(&self.get_bytes(cs, index)?)?)
    }

    pub fn add<T: Serializable>(&self, cs: &mut ChangeSet, value: &T) -> u64 {
        self.add_bytes(cs, value.to_bytes())
    }

    pub fn all<T: Serializable>(&self, cs: &ChangeSet) -> StorageResult<Vec<T>> {
        self.all_bytes(cs)
            .into_iter()
            .map(|bytes| Ok(T::from_bytes(&bytes)?))
            .collect()
    }
}
