//! Fail-fast cursors: detached chain traversal with sanctioned removal.
//!
//! A cursor holds no borrow of its map; it carries slot keys, a bucket
//! index, and a snapshot of the map's version stamp, and every operation
//! takes the map as an argument. That keeps the map fully usable between
//! cursor calls, which is exactly the window the version check guards: any
//! structural change made out-of-band (a new key inserted, an entry
//! removed) moves the stamp, and the cursor's next operation reports
//! [`CursorError::ConcurrentModification`] instead of walking a chain that
//! no longer matches its snapshot.
//!
//! [`remove_current`](KeyCursor::remove_current) is the one sanctioned way
//! to mutate the map mid-iteration: it unlinks the element last returned by
//! `advance`, using the node's stored hash and slot identity (user `Eq` and
//! `Hash` are never re-entered), and re-synchronizes the cursor's snapshot.
//!
//! A cursor must only be used with the map that created it. Misuse cannot
//! break memory safety (generational slot keys never resolve to a node
//! they did not name) and is almost always caught by the version check,
//! but it is not part of the contract.

use core::marker::PhantomData;

use slotmap::DefaultKey;

use crate::map::ChainHashMap;

/// Errors reported by cursor operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    /// The map was structurally modified out-of-band since the cursor's
    /// snapshot. The iteration is invalid; start over.
    ConcurrentModification,
    /// `advance` was called with no elements left. Check `has_next` first.
    Exhausted,
    /// `remove_current` was called before a successful `advance`, or twice
    /// without an intervening one.
    NoCurrent,
}

/// The traversal engine shared by all three projections.
#[derive(Debug, Clone)]
struct RawCursor {
    next: Option<DefaultKey>,
    current: Option<DefaultKey>,
    bucket: usize,
    expected_version: u64,
}

impl RawCursor {
    fn new<K, V, S>(map: &ChainHashMap<K, V, S>) -> Self {
        let buckets = map.buckets_slice();
        let mut next = None;
        let mut bucket = 0;
        while bucket < buckets.len() && next.is_none() {
            next = buckets[bucket];
            bucket += 1;
        }
        Self {
            next,
            current: None,
            bucket,
            expected_version: map.version(),
        }
    }

    fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn advance<K, V, S>(
        &mut self,
        map: &ChainHashMap<K, V, S>,
    ) -> Result<DefaultKey, CursorError> {
        if self.expected_version != map.version() {
            return Err(CursorError::ConcurrentModification);
        }
        let slot = self.next.ok_or(CursorError::Exhausted)?;
        self.current = Some(slot);
        self.next = map.node_next(slot);
        let buckets = map.buckets_slice();
        while self.bucket < buckets.len() && self.next.is_none() {
            self.next = buckets[self.bucket];
            self.bucket += 1;
        }
        Ok(slot)
    }

    fn remove_current<K, V, S>(
        &mut self,
        map: &mut ChainHashMap<K, V, S>,
    ) -> Result<(), CursorError> {
        let current = self.current.ok_or(CursorError::NoCurrent)?;
        if self.expected_version != map.version() {
            return Err(CursorError::ConcurrentModification);
        }
        self.current = None;
        let removed = map.remove_slot(current);
        debug_assert!(removed, "current slot must be live when versions match");
        self.expected_version = map.version();
        Ok(())
    }
}

macro_rules! cursor_common {
    () => {
        /// True if a subsequent `advance` has an element to return
        /// (assuming no out-of-band mutation).
        pub fn has_next(&self) -> bool {
            self.raw.has_next()
        }

        /// Removes the element last returned by `advance` from the map,
        /// through the map's own unlink path, and re-synchronizes this
        /// cursor with the new version stamp.
        ///
        /// This is the one mutation that does not invalidate the cursor.
        pub fn remove_current(
            &mut self,
            map: &mut ChainHashMap<K, V, S>,
        ) -> Result<(), CursorError> {
            self.raw.remove_current(map)
        }
    };
}

/// Fail-fast cursor over the map's keys.
#[derive(Debug, Clone)]
pub struct KeyCursor<K, V, S> {
    raw: RawCursor,
    _marker: PhantomData<fn(&ChainHashMap<K, V, S>)>,
}

impl<K, V, S> KeyCursor<K, V, S> {
    pub(crate) fn new(map: &ChainHashMap<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(map),
            _marker: PhantomData,
        }
    }

    /// Steps to the next key in bucket-then-chain order.
    pub fn advance<'m>(&mut self, map: &'m ChainHashMap<K, V, S>) -> Result<&'m K, CursorError> {
        self.raw.advance(map).map(|slot| map.node_ref(slot).0)
    }

    cursor_common!();
}

/// Fail-fast cursor over the map's values.
#[derive(Debug, Clone)]
pub struct ValueCursor<K, V, S> {
    raw: RawCursor,
    _marker: PhantomData<fn(&ChainHashMap<K, V, S>)>,
}

impl<K, V, S> ValueCursor<K, V, S> {
    pub(crate) fn new(map: &ChainHashMap<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(map),
            _marker: PhantomData,
        }
    }

    /// Steps to the next value in bucket-then-chain order.
    pub fn advance<'m>(&mut self, map: &'m ChainHashMap<K, V, S>) -> Result<&'m V, CursorError> {
        self.raw.advance(map).map(|slot| map.node_ref(slot).1)
    }

    cursor_common!();
}

/// Fail-fast cursor over the map's entry pairs.
#[derive(Debug, Clone)]
pub struct EntryCursor<K, V, S> {
    raw: RawCursor,
    _marker: PhantomData<fn(&ChainHashMap<K, V, S>)>,
}

impl<K, V, S> EntryCursor<K, V, S> {
    pub(crate) fn new(map: &ChainHashMap<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(map),
            _marker: PhantomData,
        }
    }

    /// Steps to the next entry in bucket-then-chain order.
    pub fn advance<'m>(
        &mut self,
        map: &'m ChainHashMap<K, V, S>,
    ) -> Result<(&'m K, &'m V), CursorError> {
        self.raw.advance(map).map(|slot| map.node_ref(slot))
    }

    cursor_common!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::BuildHasher;

    /// Hasher that sends every key to the same bucket, to force chains.
    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    fn sample_map() -> ChainHashMap<String, i32> {
        let mut map = ChainHashMap::new();
        for i in 0..6 {
            map.put(format!("k{i}"), i);
        }
        map
    }

    /// Invariant: a cursor visits each entry exactly once and then reports
    /// exhaustion.
    #[test]
    fn advance_visits_every_entry_once() {
        let map = sample_map();
        let mut cursor = map.entries().cursor();
        let mut seen = BTreeSet::new();
        while cursor.has_next() {
            let (k, v) = cursor.advance(&map).unwrap();
            assert_eq!(map.get(k), Some(v));
            assert!(seen.insert(k.clone()), "duplicate visit for {k}");
        }
        assert_eq!(seen.len(), map.len());
        assert_eq!(cursor.advance(&map), Err(CursorError::Exhausted));
    }

    /// Invariant: a cursor on an empty (unallocated) map has nothing and
    /// exhausts immediately without error states.
    #[test]
    fn empty_map_cursor() {
        let map: ChainHashMap<String, i32> = ChainHashMap::new();
        let mut cursor = map.keys().cursor();
        assert!(!cursor.has_next());
        assert_eq!(cursor.advance(&map), Err(CursorError::Exhausted));
    }

    /// Invariant: inserting a new key out-of-band fails the next advance;
    /// replacing an existing key's value does not.
    #[test]
    fn fail_fast_on_structural_change_only() {
        let mut map = sample_map();

        let mut cursor = map.keys().cursor();
        cursor.advance(&map).unwrap();
        map.put("k0".to_string(), 99); // value-only: invisible
        assert!(cursor.advance(&map).is_ok());

        map.put("new".to_string(), 7); // structural
        assert_eq!(
            cursor.advance(&map),
            Err(CursorError::ConcurrentModification)
        );
    }

    /// Invariant: out-of-band removal also trips the check, including for
    /// remove_current itself.
    #[test]
    fn fail_fast_on_out_of_band_removal() {
        let mut map = sample_map();
        let mut cursor = map.entries().cursor();
        cursor.advance(&map).unwrap();

        map.remove("k5");
        assert_eq!(
            cursor.advance(&map),
            Err(CursorError::ConcurrentModification)
        );
        assert_eq!(
            cursor.remove_current(&mut map),
            Err(CursorError::ConcurrentModification)
        );
    }

    /// Invariant: remove_current removes the element last returned, resyncs
    /// the cursor, and iteration continues over the remainder.
    #[test]
    fn sanctioned_removal_keeps_iterating() {
        let mut map = sample_map();
        let mut cursor = map.keys().cursor();
        let first = cursor.advance(&map).unwrap().clone();

        cursor.remove_current(&mut map).unwrap();
        assert!(!map.contains_key(first.as_str()));
        assert_eq!(map.len(), 5);

        let mut rest = 0;
        while cursor.has_next() {
            cursor.advance(&map).unwrap();
            rest += 1;
        }
        assert_eq!(rest, 5);
    }

    /// Invariant: draining every entry through remove_current empties the
    /// map without ever tripping the fail-fast check.
    #[test]
    fn drain_via_remove_current() {
        let mut map: ChainHashMap<u32, u32, ConstBuildHasher> =
            ChainHashMap::with_hasher(ConstBuildHasher);
        for i in 0..10u32 {
            map.put(i, i);
        }

        let mut cursor = map.entries().cursor();
        while cursor.has_next() {
            cursor.advance(&map).unwrap();
            cursor.remove_current(&mut map).unwrap();
        }
        assert!(map.is_empty());
    }

    /// Invariant: remove_current demands a current element: it fails before
    /// any advance and when called twice in a row.
    #[test]
    fn remove_current_requires_advance() {
        let mut map = sample_map();
        let mut cursor = map.values().cursor();
        assert_eq!(cursor.remove_current(&mut map), Err(CursorError::NoCurrent));

        cursor.advance(&map).unwrap();
        cursor.remove_current(&mut map).unwrap();
        assert_eq!(cursor.remove_current(&mut map), Err(CursorError::NoCurrent));
    }

    /// Invariant: after a sanctioned removal resyncs the cursor, a further
    /// out-of-band change is still detected.
    #[test]
    fn resync_does_not_mask_later_changes() {
        let mut map = sample_map();
        let mut cursor = map.keys().cursor();
        cursor.advance(&map).unwrap();
        cursor.remove_current(&mut map).unwrap();

        map.put("late".to_string(), 1);
        assert_eq!(
            cursor.advance(&map),
            Err(CursorError::ConcurrentModification)
        );
    }

    /// Invariant: value and key projections walk the same order as the
    /// entry projection.
    #[test]
    fn projections_share_order() {
        let map = sample_map();
        let mut keys = map.keys().cursor();
        let mut values = map.values().cursor();
        let mut entries = map.entries().cursor();

        while entries.has_next() {
            let (k, v) = entries.advance(&map).unwrap();
            assert_eq!(keys.advance(&map).unwrap(), k);
            assert_eq!(values.advance(&map).unwrap(), v);
        }
        assert!(!keys.has_next());
        assert!(!values.has_next());
    }

    /// Invariant: removing through a chain via the cursor keeps collided
    /// survivors reachable (head, interior, and tail positions).
    #[test]
    fn removal_in_collision_chain() {
        let mut map: ChainHashMap<u32, u32, ConstBuildHasher> =
            ChainHashMap::with_hasher(ConstBuildHasher);
        for i in 0..5u32 {
            map.put(i, i);
        }

        // Remove every even key through the cursor.
        let mut cursor = map.entries().cursor();
        while cursor.has_next() {
            let (&k, _) = cursor.advance(&map).unwrap();
            if k % 2 == 0 {
                cursor.remove_current(&mut map).unwrap();
            }
        }
        assert_eq!(map.len(), 2);
        for i in 0..5u32 {
            assert_eq!(map.contains_key(&i), i % 2 == 1);
        }
    }
}
