//! ChainHashMap: the bucket array, chain nodes, and core operations.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

use crate::capacity::{
    default_threshold, grown, initial_threshold, normalize_capacity, validate_load_factor,
    ConfigError, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR,
};
use crate::view::{EntryView, EntryViewMut, KeyView, KeyViewMut, ValueView};

/// One key-value pair, threaded into its bucket's chain via `next`.
///
/// The key's spread hash is computed once at insertion and stored; neither
/// resize nor chain-based removal ever re-invokes `K: Hash`.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Option<DefaultKey>,
}

/// Spreads the hasher output so that the low bits used for bucket indexing
/// also depend on higher bits.
fn spread(raw: u64) -> u64 {
    raw ^ (raw >> 16)
}

/// A hash map built on separate chaining.
///
/// Buckets form an array of chain heads; each chain is a singly-linked list
/// of nodes stored in a generational slot arena, linked by slot key. The
/// bucket count is always a power of two and doubles once the entry count
/// exceeds the load-factor threshold.
///
/// The bucket array is not allocated until the first insertion, so an empty
/// map is a single arena header plus a few words.
///
/// A monotonic version stamp counts structural changes (insertion of a new
/// key, removal); replacing the value of an existing key does not count.
/// Detached cursors snapshot the stamp and fail fast when it moves under
/// them; see [`crate::KeyCursor`] and friends.
#[derive(Clone)]
pub struct ChainHashMap<K, V, S = RandomState> {
    hasher: S,
    buckets: Option<Box<[Option<DefaultKey>]>>,
    slots: SlotMap<DefaultKey, Node<K, V>>,
    capacity: usize,
    threshold: usize,
    version: u64,
}

impl<K, V> ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map with the default capacity (16) and load
    /// factor (0.75).
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Creates an empty map sized for `capacity` buckets (rounded up to a
    /// power of two) with the default load factor.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    /// Creates an empty map with the given capacity and load factor.
    ///
    /// The load factor must lie in `[0, 1]`; anything else (including NaN)
    /// is a [`ConfigError`].
    pub fn with_capacity_and_load_factor(
        capacity: usize,
        load_factor: f64,
    ) -> Result<Self, ConfigError> {
        Self::with_capacity_and_load_factor_and_hasher(capacity, load_factor, Default::default())
    }
}

impl<K, V, S> ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates an empty map using `hasher` to hash keys.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// Creates an empty map sized for `capacity` buckets using `hasher`.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_parts(capacity, DEFAULT_LOAD_FACTOR, hasher)
    }

    /// Fully parameterized constructor; validates the load factor.
    pub fn with_capacity_and_load_factor_and_hasher(
        capacity: usize,
        load_factor: f64,
        hasher: S,
    ) -> Result<Self, ConfigError> {
        validate_load_factor(load_factor)?;
        Ok(Self::with_parts(capacity, load_factor, hasher))
    }

    fn with_parts(capacity: usize, load_factor: f64, hasher: S) -> Self {
        Self {
            hasher,
            buckets: None,
            slots: SlotMap::with_key(),
            capacity: normalize_capacity(capacity),
            // Derived from the argument, not the normalized capacity; see
            // capacity::initial_threshold.
            threshold: initial_threshold(capacity, load_factor),
            version: 0,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        spread(self.hasher.hash_one(q))
    }

    /// Walks the chain for `q`'s bucket and returns the matching slot.
    fn find_slot<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let buckets = self.buckets.as_deref()?;
        let hash = self.make_hash(q);
        let mut cursor = buckets[(hash as usize) & (self.capacity - 1)];
        while let Some(slot) = cursor {
            let node = &self.slots[slot];
            if node.hash == hash && node.key.borrow() == q {
                return Some(slot);
            }
            cursor = node.next;
        }
        None
    }

    /// Inserts `key` → `value`.
    ///
    /// If the key was already present, its value is replaced in place and
    /// the old value returned; this is not a structural change, so the
    /// version stamp does not move and no resize check runs. A genuinely
    /// new key is appended at the tail of its chain and may trigger a
    /// doubling resize.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let capacity = self.capacity;
        if self.buckets.is_none() {
            self.buckets = Some(vec![None; capacity].into_boxed_slice());
        }
        let index = (hash as usize) & (capacity - 1);
        match self.bucket_head(index) {
            None => {
                let slot = self.slots.insert(Node {
                    hash,
                    key,
                    value,
                    next: None,
                });
                self.set_bucket_head(index, Some(slot));
            }
            Some(head) => {
                let mut tail = head;
                loop {
                    let node = &mut self.slots[tail];
                    if node.hash == hash && node.key == key {
                        return Some(mem::replace(&mut node.value, value));
                    }
                    match node.next {
                        Some(next) => tail = next,
                        None => break,
                    }
                }
                let slot = self.slots.insert(Node {
                    hash,
                    key,
                    value,
                    next: None,
                });
                self.slots[tail].next = Some(slot);
            }
        }
        self.version += 1;
        if self.slots.len() > self.threshold {
            self.grow();
        }
        None
    }

    /// Returns a reference to the value for `q`, if present.
    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_slot(q).map(|slot| &self.slots[slot].value)
    }

    /// Returns a mutable reference to the value for `q`, if present.
    ///
    /// In-place mutation through this reference is a value-only change and
    /// is invisible to active cursors.
    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find_slot(q)?;
        Some(&mut self.slots[slot].value)
    }

    /// True if the map holds an entry for `q`.
    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_slot(q).is_some()
    }

    /// Removes the entry for `q` and returns its value.
    ///
    /// Unlinks the node from its chain (head relink or interior splice) and
    /// frees its arena slot. Removal is a structural change: the version
    /// stamp moves. Removing an absent key changes nothing.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let index = (hash as usize) & (self.capacity - 1);
        let buckets = self.buckets.as_deref_mut()?;
        let mut prev: Option<DefaultKey> = None;
        let mut cursor = buckets[index];
        while let Some(slot) = cursor {
            let node = &self.slots[slot];
            let next = node.next;
            if node.hash == hash && node.key.borrow() == q {
                match prev {
                    None => buckets[index] = next,
                    Some(p) => self.slots[p].next = next,
                }
                let removed = self.slots.remove(slot).unwrap();
                self.version += 1;
                return Some(removed.value);
            }
            prev = Some(slot);
            cursor = next;
        }
        None
    }

    /// Copies every entry of `other` into `self`, in `other`'s
    /// bucket-then-chain order, replacing values for keys already present.
    ///
    /// Plain repeated `put`: if a key comparison panics partway through,
    /// the entries inserted so far stay inserted.
    pub fn put_all(&mut self, other: &ChainHashMap<K, V, S>)
    where
        K: Clone,
        V: Clone,
    {
        for (key, value) in other.iter() {
            self.put(key.clone(), value.clone());
        }
    }

    /// Order-independent fingerprint of the map's contents: the wrapping
    /// sum over all entries of `raw_value_hash XOR stored_key_hash`.
    ///
    /// Only meaningful for comparing maps that share a deterministic
    /// hasher.
    pub fn content_hash(&self) -> u64
    where
        V: Hash,
    {
        self.slots.values().fold(0u64, |acc, node| {
            acc.wrapping_add(self.hasher.hash_one(&node.value) ^ node.hash)
        })
    }

    /// Doubles the bucket array and relinks every node into its new chain.
    ///
    /// Nodes are moved by relinking slot keys, head-first per bucket, so
    /// each node is reachable from exactly one bucket at every step and no
    /// key is re-hashed.
    fn grow(&mut self) {
        let (new_capacity, new_threshold) = grown(self.capacity, self.threshold);
        let old = match self.buckets.take() {
            Some(old) => old,
            None => return,
        };
        let mut new_buckets = vec![None; new_capacity].into_boxed_slice();
        for head in old.iter().copied() {
            let mut cursor = head;
            while let Some(slot) = cursor {
                let node = &mut self.slots[slot];
                cursor = node.next;
                let index = (node.hash as usize) & (new_capacity - 1);
                node.next = new_buckets[index];
                new_buckets[index] = Some(slot);
            }
        }
        self.buckets = Some(new_buckets);
        self.capacity = new_capacity;
        self.threshold = new_threshold;
    }
}

impl<K, V, S> ChainHashMap<K, V, S> {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bucket count the map holds, or will allocate on first insertion.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True if some entry's value equals `value`. Linear scan.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, v)| v == value)
    }

    /// Drops every entry and returns the map to the unallocated empty
    /// state.
    ///
    /// Capacity and threshold are restored to the default-construction
    /// values (16 and 12), not to this instance's constructor arguments.
    pub fn clear(&mut self) {
        let structural = !self.slots.is_empty();
        self.buckets = None;
        self.slots.clear();
        self.capacity = DEFAULT_CAPACITY;
        self.threshold = default_threshold();
        if structural {
            self.version += 1;
        }
    }

    /// Iterates entries in bucket-then-chain order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.buckets_slice(), &self.slots)
    }

    /// Iterates entries with mutable value access, in arena order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }

    /// Read view over the keys.
    pub fn keys(&self) -> KeyView<'_, K, V, S> {
        KeyView { map: self }
    }

    /// Key view that can also remove entries through the map.
    pub fn keys_mut(&mut self) -> KeyViewMut<'_, K, V, S> {
        KeyViewMut { map: self }
    }

    /// Read view over the values.
    pub fn values(&self) -> ValueView<'_, K, V, S> {
        ValueView { map: self }
    }

    /// Read view over the entry pairs.
    pub fn entries(&self) -> EntryView<'_, K, V, S> {
        EntryView { map: self }
    }

    /// Entry view that can also remove entries through the map.
    pub fn entries_mut(&mut self) -> EntryViewMut<'_, K, V, S> {
        EntryViewMut { map: self }
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn buckets_slice(&self) -> &[Option<DefaultKey>] {
        self.buckets.as_deref().unwrap_or(&[])
    }

    pub(crate) fn node_next(&self, slot: DefaultKey) -> Option<DefaultKey> {
        self.slots[slot].next
    }

    pub(crate) fn node_ref(&self, slot: DefaultKey) -> (&K, &V) {
        let node = &self.slots[slot];
        (&node.key, &node.value)
    }

    /// Unlinks `slot` from its chain using the stored hash, without touching
    /// user `Eq`/`Hash`. Returns false if the slot is no longer live.
    ///
    /// This is the removal path cursors use for sanctioned
    /// removal-during-iteration.
    pub(crate) fn remove_slot(&mut self, slot: DefaultKey) -> bool {
        let hash = match self.slots.get(slot) {
            Some(node) => node.hash,
            None => return false,
        };
        let index = (hash as usize) & (self.capacity - 1);
        let buckets = match self.buckets.as_deref_mut() {
            Some(buckets) => buckets,
            None => return false,
        };
        let mut prev: Option<DefaultKey> = None;
        let mut cursor = buckets[index];
        while let Some(current) = cursor {
            let next = self.slots[current].next;
            if current == slot {
                match prev {
                    None => buckets[index] = next,
                    Some(p) => self.slots[p].next = next,
                }
                self.slots.remove(current);
                self.version += 1;
                return true;
            }
            prev = Some(current);
            cursor = next;
        }
        false
    }

    fn bucket_head(&self, index: usize) -> Option<DefaultKey> {
        self.buckets.as_deref().and_then(|buckets| buckets[index])
    }

    fn set_bucket_head(&mut self, index: usize, head: Option<DefaultKey>) {
        if let Some(buckets) = self.buckets.as_deref_mut() {
            buckets[index] = head;
        }
    }
}

impl<K, V, S> Default for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Two maps are equal when they have the same size and every entry of the
/// left map resolves, by key lookup, to a value-equal entry in the right.
impl<K, V, S> PartialEq for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

/// Multi-line dump, one `key = ... value = ...` line per entry, in
/// bucket-then-chain order (not insertion order).
impl<K, V, S> fmt::Debug for ChainHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        for (key, value) in self.iter() {
            writeln!(f, "\tkey = {:?}\t\tvalue = {:?}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

/// Borrowing iterator over entries in bucket-then-chain order.
pub struct Iter<'a, K, V> {
    buckets: &'a [Option<DefaultKey>],
    slots: &'a SlotMap<DefaultKey, Node<K, V>>,
    next: Option<DefaultKey>,
    bucket: usize,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn new(buckets: &'a [Option<DefaultKey>], slots: &'a SlotMap<DefaultKey, Node<K, V>>) -> Self {
        let mut next = None;
        let mut bucket = 0;
        while bucket < buckets.len() && next.is_none() {
            next = buckets[bucket];
            bucket += 1;
        }
        Self {
            buckets,
            slots,
            next,
            bucket,
            remaining: slots.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next?;
        let node = &self.slots[slot];
        self.next = node.next;
        while self.bucket < self.buckets.len() && self.next.is_none() {
            self.next = self.buckets[self.bucket];
            self.bucket += 1;
        }
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets,
            slots: self.slots,
            next: self.next,
            bucket: self.bucket,
            remaining: self.remaining,
        }
    }
}

/// Mutable-value iterator. Yields entries in arena order, which is not the
/// bucket order `iter` uses.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, node)| {
            let Node { key, value, .. } = node;
            (&*key, value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Iterator over keys, projected from [`Iter`].
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over values, projected from [`Iter`].
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Draining iterator produced by consuming the map; yields owned pairs in
/// bucket-then-chain order.
pub struct IntoIter<K, V, S> {
    map: ChainHashMap<K, V, S>,
    bucket: usize,
}

impl<K, V, S> Iterator for IntoIter<K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let buckets = self.map.buckets.as_deref_mut()?;
        while self.bucket < buckets.len() {
            if let Some(slot) = buckets[self.bucket] {
                let node = self.map.slots.remove(slot).unwrap();
                buckets[self.bucket] = node.next;
                return Some((node.key, node.value));
            }
            self.bucket += 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.map.slots.len();
        (remaining, Some(remaining))
    }
}

impl<K, V, S> ExactSizeIterator for IntoIter<K, V, S> {}
impl<K, V, S> FusedIterator for IntoIter<K, V, S> {}

impl<K, V, S> IntoIterator for ChainHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            map: self,
            bucket: 0,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
