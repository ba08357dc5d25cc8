//! Key, value, and entry views: stateless façades over the owning map.
//!
//! A view holds nothing but a borrow of its map; every operation delegates
//! straight through, so a view is always in sync with the table. Shared
//! views ([`KeyView`], [`ValueView`], [`EntryView`]) answer reads and mint
//! fail-fast cursors; exclusive views ([`KeyViewMut`], [`EntryViewMut`])
//! additionally remove entries, and removal through a view removes from
//! the map itself.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use crate::cursor::{EntryCursor, KeyCursor, ValueCursor};
use crate::map::{ChainHashMap, Iter, Keys, Values};

/// Read view over a map's keys.
pub struct KeyView<'a, K, V, S> {
    pub(crate) map: &'a ChainHashMap<K, V, S>,
}

impl<'a, K, V, S> KeyView<'a, K, V, S> {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates the keys in bucket-then-chain order.
    pub fn iter(&self) -> Keys<'a, K, V> {
        Keys {
            inner: self.map.iter(),
        }
    }

    /// Detached fail-fast cursor over the keys.
    pub fn cursor(&self) -> KeyCursor<K, V, S> {
        KeyCursor::new(self.map)
    }
}

impl<'a, K, V, S> KeyView<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }
}

impl<K, V, S> Clone for KeyView<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self { map: self.map }
    }
}

impl<K, V, S> Copy for KeyView<'_, K, V, S> {}

impl<'a, K, V, S> IntoIterator for KeyView<'a, K, V, S> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Key view with removal rights over the owning map.
pub struct KeyViewMut<'a, K, V, S> {
    pub(crate) map: &'a mut ChainHashMap<K, V, S>,
}

impl<K, V, S> KeyViewMut<'_, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Removes `key`'s entry from the map. True if an entry was removed.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove(key).is_some()
    }
}

/// Read view over a map's values.
pub struct ValueView<'a, K, V, S> {
    pub(crate) map: &'a ChainHashMap<K, V, S>,
}

impl<'a, K, V, S> ValueView<'a, K, V, S> {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Membership by value equality; a linear scan over every chain.
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.map.contains_value(value)
    }

    /// Iterates the values in bucket-then-chain order.
    pub fn iter(&self) -> Values<'a, K, V> {
        Values {
            inner: self.map.iter(),
        }
    }

    /// Detached fail-fast cursor over the values.
    pub fn cursor(&self) -> ValueCursor<K, V, S> {
        ValueCursor::new(self.map)
    }
}

impl<K, V, S> Clone for ValueView<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self { map: self.map }
    }
}

impl<K, V, S> Copy for ValueView<'_, K, V, S> {}

impl<'a, K, V, S> IntoIterator for ValueView<'a, K, V, S> {
    type Item = &'a V;
    type IntoIter = Values<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read view over a map's entry pairs.
pub struct EntryView<'a, K, V, S> {
    pub(crate) map: &'a ChainHashMap<K, V, S>,
}

impl<'a, K, V, S> EntryView<'a, K, V, S> {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates the entries in bucket-then-chain order.
    pub fn iter(&self) -> Iter<'a, K, V> {
        self.map.iter()
    }

    /// Detached fail-fast cursor over the entries.
    pub fn cursor(&self) -> EntryCursor<K, V, S> {
        EntryCursor::new(self.map)
    }
}

impl<'a, K, V, S> EntryView<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Membership test for an entry pair.
    ///
    /// Only the key participates; the value component is ignored, so any
    /// pair whose key is present tests true.
    pub fn contains<Q>(&self, entry: (&Q, &V)) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(entry.0)
    }
}

impl<K, V, S> Clone for EntryView<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self { map: self.map }
    }
}

impl<K, V, S> Copy for EntryView<'_, K, V, S> {}

impl<'a, K, V, S> IntoIterator for EntryView<'a, K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Entry view with removal rights over the owning map.
pub struct EntryViewMut<'a, K, V, S> {
    pub(crate) map: &'a mut ChainHashMap<K, V, S>,
}

impl<K, V, S> EntryViewMut<'_, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Same key-only membership rule as [`EntryView::contains`].
    pub fn contains<Q>(&self, entry: (&Q, &V)) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(entry.0)
    }

    /// Removes the entry whose key matches `entry.0`. The value component
    /// is ignored, mirroring [`EntryView::contains`]. True if an entry was
    /// removed.
    pub fn remove<Q>(&mut self, entry: (&Q, &V)) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove(entry.0).is_some()
    }
}
