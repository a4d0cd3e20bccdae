//! Concurrent open maps with atomic publication.
//!
//! # Role
//!
//! [`MutableBoundedOpenMap`] keeps the current [`RawMap`] in an [`ArcSwap`]. Every write builds
//! a complete successor map from a loaded snapshot and publishes it with compare-and-swap,
//! retrying from a fresh load when another writer got there first.
//!
//! # Invariants
//!
//! - Readers only ever see fully formed snapshots.
//! - Concurrent writes are linearizable (see `invariants::test_update_sees_latest`).
//! - Callbacks may run once per attempt; only the result of the winning attempt is installed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rpds::HashTrieMapSync;

use crate::key::Key;
use crate::scope::{Admits, Bound, Scope, Unbounded, Within};
use crate::slot::{self, Slot};
use crate::snapshot::{BoundedOpenMap, RawMap, raw_eq, raw_fmt, raw_hash};

/// Outcome of one attempt inside [`MutableBoundedOpenMap::publish`].
enum Step<R> {
	/// Leave the current map in place and return.
	Keep(R),
	/// Publish the successor map, then return.
	Swap(RawMap, R),
}

/// Concurrent open map scoped to `S` and bounded by `B`.
///
/// Reads load the current snapshot; writes replace it atomically. Use
/// [`persistent`](Self::persistent) to hand a stable view to code that must not observe
/// further writes.
pub struct MutableBoundedOpenMap<S: Scope, B: Bound = Unbounded> {
	cell: ArcSwap<RawMap>,
	_marker: PhantomData<fn() -> (S, B)>,
}

impl<S: Scope, B: Bound> MutableBoundedOpenMap<S, B> {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::from_raw(HashTrieMapSync::new_sync())
	}

	pub(crate) fn from_raw(raw: RawMap) -> Self {
		Self {
			cell: ArcSwap::from_pointee(raw),
			_marker: PhantomData,
		}
	}

	/// Returns the value currently stored under `key`, if any.
	pub fn get<T, K>(&self, key: &Key<T, K>) -> Option<Arc<T>>
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		let id = key.id();
		let raw = self.cell.load();
		raw.get(&id).map(|entry| slot::downcast(id, entry))
	}

	/// Returns true if a value is currently stored under `key`.
	pub fn contains_key<T, K>(&self, key: &Key<T, K>) -> bool
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		self.cell.load().contains_key(&key.id())
	}

	/// Returns the number of slots in the current snapshot.
	pub fn len(&self) -> usize {
		self.cell.load().size()
	}

	/// Returns true if the current snapshot holds no slots.
	pub fn is_empty(&self) -> bool {
		self.cell.load().is_empty()
	}

	/// Stores `value` under `key`, replacing any previous value.
	pub fn set<T, K>(&self, key: &Key<T, K>, value: T)
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		let id = key.id();
		let slot = Slot::new(Arc::new(value));
		self.publish("set", |raw| Step::Swap(raw.insert(id, slot.clone()), ()));
	}

	/// Removes the slot for `key`.
	///
	/// Removing an absent key still publishes a (content-identical) successor map.
	pub fn remove<T, K>(&self, key: &Key<T, K>)
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		let id = key.id();
		self.publish("remove", |raw| Step::Swap(raw.remove(&id), ()));
	}

	/// Removes every slot.
	pub fn clear(&self) {
		self.cell.store(Arc::new(HashTrieMapSync::new_sync()));
	}

	/// Atomically replaces the value under `key` with `f(current)` and returns what was
	/// installed.
	///
	/// `f` sees the value present at the start of each attempt and may be called more than
	/// once under contention. It must be free of side effects.
	pub fn update<T, K, F>(&self, key: &Key<T, K>, f: F) -> Arc<T>
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
		F: Fn(Option<&T>) -> T,
	{
		let id = key.id();
		self.publish("update", |raw| {
			let current = raw.get(&id).map(|entry| slot::downcast_ref::<T>(id, entry));
			let next = Arc::new(f(current));
			Step::Swap(raw.insert(id, Slot::new(Arc::clone(&next))), next)
		})
	}

	/// Returns the value under `key`, installing `init()` first if the slot is empty.
	///
	/// `init` may run on several threads racing for the same empty slot; exactly one result
	/// is installed and returned to all of them, the rest are dropped.
	pub fn get_or_init<T, K, F>(&self, key: &Key<T, K>, init: F) -> Arc<T>
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
		F: Fn() -> T,
	{
		let id = key.id();
		self.publish("get_or_init", |raw| match raw.get(&id) {
			Some(entry) => Step::Keep(slot::downcast::<T>(id, entry)),
			None => {
				let value = Arc::new(init());
				Step::Swap(raw.insert(id, Slot::new(Arc::clone(&value))), value)
			}
		})
	}

	/// Stores `new` under `key` only if the current value equals `expected`.
	///
	/// `expected == None` means the slot must be empty. Returns whether the value was stored.
	pub fn replace<T, K>(&self, key: &Key<T, K>, expected: Option<&T>, new: T) -> bool
	where
		T: Within<B> + PartialEq,
		K: Scope,
		S: Admits<K>,
	{
		let id = key.id();
		let slot = Slot::new(Arc::new(new));
		self.publish("replace", |raw| {
			let current = raw.get(&id).map(|entry| slot::downcast_ref::<T>(id, entry));
			if current != expected {
				return Step::Keep(false);
			}
			Step::Swap(raw.insert(id, slot.clone()), true)
		})
	}

	/// Returns a snapshot of the current content with `value` stored under `key`.
	pub fn assoc<T, K>(&self, key: &Key<T, K>, value: T) -> BoundedOpenMap<S, B>
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		self.persistent().assoc(key, value)
	}

	/// Returns a snapshot of the current content without the slot for `key`.
	pub fn dissoc<T, K>(&self, key: &Key<T, K>) -> BoundedOpenMap<S, B>
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		self.persistent().dissoc(key)
	}

	/// Returns `self`; the map is already mutable.
	pub fn mutable(&self) -> &Self {
		self
	}

	/// Captures the current content as an immutable snapshot.
	///
	/// The snapshot shares structure with the cell but is never affected by later writes.
	pub fn persistent(&self) -> BoundedOpenMap<S, B> {
		BoundedOpenMap::from_raw(RawMap::clone(&self.cell.load()))
	}

	/// Runs `step` against the current map until its successor is published.
	fn publish<R>(&self, op: &'static str, mut step: impl FnMut(&RawMap) -> Step<R>) -> R {
		let mut retries = 0u32;
		loop {
			let old = self.cell.load_full();
			let (next, out) = match step(&*old) {
				Step::Keep(out) => return out,
				Step::Swap(next, out) => (next, out),
			};

			let prev = self.cell.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				if retries > 0 {
					tracing::trace!(op, retries, "open map write settled after contention");
				}
				return out;
			}
			// CAS failed, retry with updated snapshot
			retries += 1;
		}
	}
}

impl<S: Scope, B: Bound> Default for MutableBoundedOpenMap<S, B> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Scope, B: Bound> From<BoundedOpenMap<S, B>> for MutableBoundedOpenMap<S, B> {
	fn from(map: BoundedOpenMap<S, B>) -> Self {
		map.mutable()
	}
}

impl<S: Scope, B: Bound> PartialEq for MutableBoundedOpenMap<S, B> {
	fn eq(&self, other: &Self) -> bool {
		raw_eq(&self.cell.load(), &other.cell.load())
	}
}

impl<S: Scope, B: Bound> PartialEq<BoundedOpenMap<S, B>> for MutableBoundedOpenMap<S, B> {
	fn eq(&self, other: &BoundedOpenMap<S, B>) -> bool {
		raw_eq(&self.cell.load(), other.raw())
	}
}

impl<S: Scope, B: Bound> PartialEq<MutableBoundedOpenMap<S, B>> for BoundedOpenMap<S, B> {
	fn eq(&self, other: &MutableBoundedOpenMap<S, B>) -> bool {
		other == self
	}
}

impl<S: Scope, B: Bound> Hash for MutableBoundedOpenMap<S, B> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		raw_hash(&self.cell.load(), state);
	}
}

impl<S: Scope, B: Bound> fmt::Debug for MutableBoundedOpenMap<S, B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		raw_fmt(&self.cell.load(), f)
	}
}
