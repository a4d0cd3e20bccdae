#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Typed, capability-scoped open maps.
//!
//! # Purpose
//!
//! Long-lived objects (sessions, documents, requests) carry attachments whose types they
//! do not know about. An open map stores those attachments under [`Key`] tokens: each key
//! names the value type it holds and the [`Scope`] it may be used in, and the map only
//! accepts keys whose scope it [`Admits`].
//!
//! # Mental Model
//!
//! 1. **Keys:** [`Key::new`] mints a process-unique token. Identity is the token itself;
//!    there is no registry or string lookup.
//! 2. **Snapshots:** [`BoundedOpenMap`] is an immutable, structurally shared map. `assoc` and
//!    `dissoc` return new maps in O(log n) without touching the receiver.
//! 3. **Mutation:** [`MutableBoundedOpenMap`] holds a snapshot in an atomic cell and replaces it
//!    with compare-and-swap. `persistent()` hands out a snapshot that later writes never touch.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Key`] | Typed, scoped slot identifier. |
//! | [`KeyId`] | Untyped identity of a key, used for storage and diagnostics. |
//! | [`BoundedOpenMap`] | Immutable snapshot view. |
//! | [`MutableBoundedOpenMap`] | Concurrent view with atomic writes. |
//! | [`SlotValue`] | Object-safe bound for anything stored in a map. |
//!
//! # Concurrency
//!
//! - **Reads:** Wait-free (atomic load of the current snapshot).
//! - **Writes:** Lock-free with linearizability (CAS retry loop). Callbacks passed to
//!   [`MutableBoundedOpenMap::update`] and [`MutableBoundedOpenMap::get_or_init`] may run more
//!   than once under contention and must not have side effects.
//!
//! # Invariants
//!
//! - A value stored under `Key<T, _>` is always a `T`.
//!   - Enforced in: the typed API of both map views; checked once at `slot::downcast`.
//!   - Failure symptom: panic naming the key at the downcast boundary.
//!
//! - Snapshots never observe later mutation.
//!   - Enforced in: [`MutableBoundedOpenMap::persistent`], [`BoundedOpenMap::mutable`].
//!   - Tested by: `invariants::test_snapshot_isolation`, `invariants::test_mutable_independence`
//!
//! - Concurrent writers never lose updates.
//!   - Enforced in: [`MutableBoundedOpenMap`] CAS loop.
//!   - Tested by: `invariants::test_update_sees_latest`, `invariants::test_get_or_init_single_install`
//!
//! # Example
//!
//! ```
//! use satchel_map::{Key, MutableBoundedOpenMap, Scope};
//!
//! enum DocScope {}
//! impl Scope for DocScope {}
//!
//! let line_count: Key<i32, DocScope> = Key::new("line_count");
//! let map = MutableBoundedOpenMap::<DocScope>::new();
//! map.set(&line_count, 5);
//! let snap = map.persistent();
//! map.set(&line_count, 6);
//!
//! assert_eq!(snap.get(&line_count), Some(&5));
//! assert_eq!(map.get(&line_count).as_deref(), Some(&6));
//! ```

/// Typed slot tokens.
pub mod key;
/// Concurrent mutable view.
pub mod mutable;
/// Scope and value-bound markers.
pub mod scope;
/// Type-erased slot storage.
pub mod slot;
/// Immutable snapshot view.
pub mod snapshot;

#[cfg(test)]
mod invariants;

pub use key::{Key, KeyId};
pub use mutable::MutableBoundedOpenMap;
pub use scope::{Admits, Bound, Scope, Unbounded, Within};
pub use slot::SlotValue;
pub use snapshot::BoundedOpenMap;
