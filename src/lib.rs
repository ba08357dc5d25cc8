//! chain-hashmap: a single-threaded, separate-chaining hash map with live
//! views and fail-fast cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a from-scratch bucket-and-chain table with the classic map
//!   contract, built in safe, verifiable layers so each piece can be
//!   reasoned about independently.
//! - Layers:
//!   - capacity: power-of-two sizing, load-factor validation, threshold
//!     arithmetic. Pure functions, no state.
//!   - ChainHashMap<K, V, S>: the bucket array (lazily allocated), chain
//!     nodes in a generational slot arena, and the core operations
//!     (put/get/remove/clear/resize), plus borrowing iterators.
//!   - Views: KeyView/ValueView/EntryView façades that delegate every
//!     operation to the owning map; *Mut variants add remove-through-view.
//!   - Cursors: detached fail-fast traversal (key/value/entry projections
//!     over one engine) with a sanctioned removal path.
//!
//! Constraints
//! - Single-threaded: no locking, no atomics; all operations run to
//!   completion on the calling thread.
//! - Safe Rust throughout: chains are slot keys into a `SlotMap`, never
//!   raw pointers, so unlink/splice/resize are ordinary moves and a freed
//!   node's key can never resolve to a newer node.
//! - Buckets stay unallocated until the first insertion; `clear` returns
//!   to that state.
//! - Capacity is always a power of two in `[1, 2^30]`; bucket indexing is
//!   a mask of the stored hash.
//!
//! Mutation tracking and fail-fast iteration
//! - The map keeps a monotonic version stamp counting structural changes:
//!   insertion of a new key and removal. Replacing the value of an
//!   existing key is deliberately invisible to the stamp.
//! - Cursors hold no borrow; they snapshot the stamp at creation and take
//!   the map as an argument on every call, failing with
//!   `CursorError::ConcurrentModification` when the stamp has moved
//!   out-of-band. `remove_current` is the one sanctioned mutation during
//!   iteration: it unlinks via stored hash and slot identity and resyncs
//!   the snapshot.
//!
//! Hasher and rehashing invariants
//! - Each node stores a precomputed spread hash (`h ^ (h >> 16)`) and
//!   indexing always uses the stored hash; `K: Hash` is never invoked
//!   after insertion, so resize and cursor removal make no calls into
//!   user code.
//!
//! Notes and non-goals
//! - Not thread-safe and not `Send`-aware beyond what the field types
//!   derive; no internal synchronization.
//! - No persistence; no open addressing or alternative collision
//!   strategies.
//! - Views are constructed per call (a borrow, allocation-free) rather
//!   than cached on the map; delegation keeps them live by construction.
//! - Public surface is `ChainHashMap`, its views, cursors, iterators, and
//!   the two error enums; node layout and the slot arena are
//!   implementation details.

mod capacity;
mod cursor;
mod map;
mod map_proptest;
mod view;

// Public surface
pub use capacity::ConfigError;
pub use cursor::{CursorError, EntryCursor, KeyCursor, ValueCursor};
pub use map::{ChainHashMap, IntoIter, Iter, IterMut, Keys, Values};
pub use view::{EntryView, EntryViewMut, KeyView, KeyViewMut, ValueView};
