//! Arena storage for simulation records.

use std::collections::HashMap;
use std::hash::Hash;

/// Storage for one kind of record, keyed by a typed ID.
///
/// Uses a `HashMap` for O(1) lookup by ID, with deterministic
/// iteration via sorted keys when processing systems. IDs are handed
/// out monotonically starting at 1 and never reused.
#[derive(Debug, Clone)]
pub struct Arena<K, T> {
    items: HashMap<K, T>,
    next_id: u32,
}

impl<K, T> Arena<K, T>
where
    K: Copy + Ord + Hash + From<u32>,
{
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a record built from its freshly assigned ID.
    pub fn insert_with(&mut self, build: impl FnOnce(K) -> T) -> K {
        let id = K::from(self.next_id);
        self.next_id += 1;
        self.items.insert(id, build(id));
        id
    }

    /// Remove a record by ID.
    pub fn remove(&mut self, id: K) -> Option<T> {
        self.items.remove(&id)
    }

    /// Get a record by ID.
    #[must_use]
    pub fn get(&self, id: K) -> Option<&T> {
        self.items.get(&id)
    }

    /// Get a mutable reference to a record by ID.
    pub fn get_mut(&mut self, id: K) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    /// Check if a record exists.
    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sorted IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<K> {
        let mut ids: Vec<_> = self.items.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Records in ascending ID order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.sorted_ids()
            .into_iter()
            .filter_map(move |id| self.items.get(&id).map(|item| (id, item)))
    }

    /// Iterate over all records (not in deterministic order).
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Iterate mutably over all records (not in deterministic order).
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }
}

impl<K, T> Default for Arena<K, T>
where
    K: Copy + Ord + Hash + From<u32>,
{
    fn default() -> Self {
        Self::new()
    }
}
