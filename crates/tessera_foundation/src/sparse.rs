//! Sparse set: a key-to-dense-slot map with swap-compaction.
//!
//! Keys are small integers (entity indices in practice). The sparse array is
//! indexed by key and holds the position of that key's value in the packed
//! dense arrays. Removal swaps the last dense slot into the hole, so every
//! operation is O(1) and the dense arrays never contain gaps. Dense order is
//! not preserved across removals.

const EMPTY: u32 = u32::MAX;

/// Sparse set mapping `u32` keys to values of type `T`.
#[derive(Clone, Debug)]
pub struct SparseSet<T> {
    /// Key -> dense position, `EMPTY` when absent.
    sparse: Vec<u32>,
    /// Dense position -> key.
    keys: Vec<u32>,
    /// Dense position -> value.
    values: Vec<T>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty sparse set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the dense position of `key`, if present.
    #[must_use]
    pub fn dense_index(&self, key: u32) -> Option<usize> {
        match self.sparse.get(key as usize) {
            Some(&slot) if slot != EMPTY => Some(slot as usize),
            _ => None,
        }
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: u32) -> bool {
        self.dense_index(key).is_some()
    }

    /// Inserts or overwrites the value for `key`.
    ///
    /// Returns the previous value when `key` was already present.
    ///
    /// # Panics
    ///
    /// Panics if `key` is `u32::MAX`, which is reserved as the empty marker.
    pub fn insert(&mut self, key: u32, value: T) -> Option<T> {
        assert_ne!(key, EMPTY, "u32::MAX is not a valid sparse key");

        if let Some(slot) = self.dense_index(key) {
            return Some(std::mem::replace(&mut self.values[slot], value));
        }

        let idx = key as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, EMPTY);
        }
        // Dense length is bounded by the number of distinct keys, all < u32::MAX.
        #[allow(clippy::cast_possible_truncation)]
        let slot = self.keys.len() as u32;
        self.sparse[idx] = slot;
        self.keys.push(key);
        self.values.push(value);
        None
    }

    /// Returns a reference to the value for `key`.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<&T> {
        self.dense_index(key).map(|slot| &self.values[slot])
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut(&mut self, key: u32) -> Option<&mut T> {
        let slot = self.dense_index(key)?;
        Some(&mut self.values[slot])
    }

    /// Removes `key`, returning its value.
    ///
    /// The last dense entry is moved into the vacated slot.
    #[allow(clippy::cast_possible_truncation)]
    pub fn remove(&mut self, key: u32) -> Option<T> {
        let slot = self.dense_index(key)?;
        self.sparse[key as usize] = EMPTY;

        let last = self.keys.len() - 1;
        if slot != last {
            let moved = self.keys[last];
            self.sparse[moved as usize] = slot as u32;
        }
        self.keys.swap_remove(slot);
        Some(self.values.swap_remove(slot))
    }

    /// Returns the key and value stored at dense position `slot`.
    #[must_use]
    pub fn get_dense(&self, slot: usize) -> Option<(u32, &T)> {
        Some((*self.keys.get(slot)?, self.values.get(slot)?))
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the set holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Removes every value, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.keys.clear();
        self.values.clear();
    }

    /// Keys in dense order.
    #[must_use]
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    /// Values in dense order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable values in dense order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Iterates `(key, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.keys.iter().copied().zip(self.values.iter())
    }
}
