//! Ordered, keyed node containers.
//!
//! Two collection kinds share the [`KeyedCollection`] contract:
//! - [`UniqueCollection`] rejects a second item under an existing key.
//! - [`MultiCollection`] keeps every item, grouped per key in insertion order.
//!
//! Both take a key-extraction function and an optional guardian predicate at
//! construction. Items are stored once in a flat vector, so positional
//! access and iteration always follow global insertion order regardless of
//! how the keys interleave.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use thiserror::Error;

/// Extracts the key of an item.
pub type KeyFn<K, T> = fn(&T) -> K;

/// Predicate evaluated before every insertion; `false` rejects the item.
pub type Guardian<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Errors raised by keyed collections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// A unique collection already holds an item under this key.
    #[error("duplicate key: {key}")]
    DuplicateKey { key: String },

    /// The collection's guardian refused the item.
    #[error("item with key {key} rejected by collection guardian")]
    GuardianRejected { key: String },

    /// No item is stored under this key.
    #[error("no item with key {key}")]
    KeyNotFound { key: String },
}

/// Read access shared by both collection kinds.
pub trait KeyedCollection<K, T> {
    /// All items in global insertion order.
    fn as_slice(&self) -> &[T];

    fn contains_key(&self, key: &K) -> bool;

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Item at an insertion position.
    fn get_at(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Copies the items into a flat vector.
    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.as_slice().to_vec()
    }
}

fn admit<K: fmt::Debug, T>(
    guardian: &Option<Guardian<T>>,
    key: &K,
    item: &T,
) -> Result<(), CollectionError> {
    match guardian {
        Some(guard) if !guard(item) => Err(CollectionError::GuardianRejected {
            key: format!("{key:?}"),
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Unique collection
// ---------------------------------------------------------------------------

/// Keyed collection holding at most one item per key.
pub struct UniqueCollection<K, T> {
    items: Vec<T>,
    positions: IndexMap<K, usize>,
    key_of: KeyFn<K, T>,
    guardian: Option<Guardian<T>>,
}

impl<K: Hash + Eq + fmt::Debug, T> UniqueCollection<K, T> {
    pub fn new(key_of: KeyFn<K, T>) -> Self {
        UniqueCollection {
            items: Vec::new(),
            positions: IndexMap::new(),
            key_of,
            guardian: None,
        }
    }

    /// Installs a guardian checked before every insertion.
    pub fn with_guardian(mut self, guardian: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.guardian = Some(Arc::new(guardian));
        self
    }

    /// Adds an item under its extracted key.
    ///
    /// Fails with [`CollectionError::GuardianRejected`] if the guardian
    /// refuses the item, or [`CollectionError::DuplicateKey`] if the key is
    /// already present. The collection is unchanged on failure.
    pub fn add(&mut self, item: T) -> Result<(), CollectionError> {
        let key = (self.key_of)(&item);
        admit(&self.guardian, &key, &item)?;
        if self.positions.contains_key(&key) {
            return Err(CollectionError::DuplicateKey {
                key: format!("{key:?}"),
            });
        }
        self.positions.insert(key, self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// The item stored under `key`, or `None`.
    pub fn get(&self, key: &K) -> Option<&T> {
        self.positions.get(key).and_then(|&i| self.items.get(i))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.positions.keys()
    }
}

impl<K: Hash + Eq, T> KeyedCollection<K, T> for UniqueCollection<K, T> {
    fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn contains_key(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }
}

// ---------------------------------------------------------------------------
// Multi collection
// ---------------------------------------------------------------------------

/// Keyed collection holding any number of items per key.
pub struct MultiCollection<K, T> {
    items: Vec<T>,
    positions: IndexMap<K, SmallVec<[usize; 2]>>,
    key_of: KeyFn<K, T>,
    guardian: Option<Guardian<T>>,
}

impl<K: Hash + Eq + fmt::Debug, T> MultiCollection<K, T> {
    pub fn new(key_of: KeyFn<K, T>) -> Self {
        MultiCollection {
            items: Vec::new(),
            positions: IndexMap::new(),
            key_of,
            guardian: None,
        }
    }

    /// Installs a guardian checked before every insertion.
    pub fn with_guardian(mut self, guardian: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.guardian = Some(Arc::new(guardian));
        self
    }

    /// Adds an item. Only the guardian can refuse it.
    pub fn add(&mut self, item: T) -> Result<(), CollectionError> {
        let key = (self.key_of)(&item);
        admit(&self.guardian, &key, &item)?;
        self.positions.entry(key).or_default().push(self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Items stored under `key`, in insertion order. Empty for absent keys.
    pub fn get<'a>(&'a self, key: &K) -> impl Iterator<Item = &'a T> + 'a {
        let positions: &[usize] = self.positions.get(key).map(|p| p.as_slice()).unwrap_or(&[]);
        positions.iter().filter_map(move |&i| self.items.get(i))
    }

    /// The first item stored under `key`.
    pub fn first(&self, key: &K) -> Result<&T, CollectionError> {
        self.get(key).next().ok_or_else(|| CollectionError::KeyNotFound {
            key: format!("{key:?}"),
        })
    }

    /// Number of items stored under `key`.
    pub fn count(&self, key: &K) -> usize {
        self.positions.get(key).map_or(0, |p| p.len())
    }

    /// Distinct keys in order of first insertion.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.positions.keys()
    }
}

impl<K: Hash + Eq, T> KeyedCollection<K, T> for MultiCollection<K, T> {
    fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn contains_key(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }
}

// ---------------------------------------------------------------------------
// Shared trait impls
// ---------------------------------------------------------------------------

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for UniqueCollection<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for MultiCollection<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<K, T: Serialize> Serialize for UniqueCollection<K, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl<K, T: Serialize> Serialize for MultiCollection<K, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl<'a, K: Hash + Eq, T> IntoIterator for &'a UniqueCollection<K, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, K: Hash + Eq, T> IntoIterator for &'a MultiCollection<K, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
