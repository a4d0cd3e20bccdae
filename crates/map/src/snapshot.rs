//! Immutable open map snapshots.
//!
//! # Role
//!
//! [`BoundedOpenMap`] is the pure view type: every operation either reads or returns a new map.
//! It contains no mutation logic; cloning shares the underlying trie.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use rpds::HashTrieMapSync;
use rustc_hash::FxHasher;

use crate::key::{Key, KeyId};
use crate::mutable::MutableBoundedOpenMap;
use crate::scope::{Admits, Bound, Scope, Unbounded, Within};
use crate::slot::{self, Slot};

/// Persistent storage shared by both map views.
pub(crate) type RawMap = HashTrieMapSync<KeyId, Slot>;

/// Immutable, structurally shared open map scoped to `S` and bounded by `B`.
///
/// Equality and hashing are structural: two maps holding the same key/value pairs are equal
/// regardless of how they were built.
pub struct BoundedOpenMap<S: Scope, B: Bound = Unbounded> {
	raw: RawMap,
	_marker: PhantomData<fn() -> (S, B)>,
}

impl<S: Scope, B: Bound> BoundedOpenMap<S, B> {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::from_raw(HashTrieMapSync::new_sync())
	}

	pub(crate) fn from_raw(raw: RawMap) -> Self {
		Self {
			raw,
			_marker: PhantomData,
		}
	}

	pub(crate) fn raw(&self) -> &RawMap {
		&self.raw
	}

	/// Returns the value stored under `key`, if any.
	pub fn get<T, K>(&self, key: &Key<T, K>) -> Option<&T>
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		let id = key.id();
		self.raw.get(&id).map(|entry| slot::downcast_ref(id, entry))
	}

	/// Returns true if a value is stored under `key`.
	pub fn contains_key<T, K>(&self, key: &Key<T, K>) -> bool
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		self.raw.contains_key(&key.id())
	}

	/// Returns the number of stored slots.
	pub fn len(&self) -> usize {
		self.raw.size()
	}

	/// Returns true if the map holds no slots.
	pub fn is_empty(&self) -> bool {
		self.raw.is_empty()
	}

	/// Returns the identities of all occupied slots, in unspecified order.
	pub fn keys(&self) -> impl Iterator<Item = KeyId> + '_ {
		self.raw.keys().copied()
	}

	/// Returns a new map with `value` stored under `key`.
	pub fn assoc<T, K>(&self, key: &Key<T, K>, value: T) -> Self
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		Self::from_raw(self.raw.insert(key.id(), Slot::new(Arc::new(value))))
	}

	/// Returns a new map without the slot for `key`.
	pub fn dissoc<T, K>(&self, key: &Key<T, K>) -> Self
	where
		T: Within<B>,
		K: Scope,
		S: Admits<K>,
	{
		Self::from_raw(self.raw.remove(&key.id()))
	}

	/// Returns a new mutable map seeded with this snapshot.
	///
	/// Each call allocates an independent cell; writes to it are invisible to `self` and to
	/// other cells.
	pub fn mutable(&self) -> MutableBoundedOpenMap<S, B> {
		MutableBoundedOpenMap::from_raw(self.raw.clone())
	}

	/// Returns this snapshot.
	pub fn persistent(&self) -> Self {
		self.clone()
	}
}

impl<S: Scope, B: Bound> Default for BoundedOpenMap<S, B> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Scope, B: Bound> Clone for BoundedOpenMap<S, B> {
	fn clone(&self) -> Self {
		Self::from_raw(self.raw.clone())
	}
}

impl<S: Scope, B: Bound> PartialEq for BoundedOpenMap<S, B> {
	fn eq(&self, other: &Self) -> bool {
		raw_eq(&self.raw, &other.raw)
	}
}

impl<S: Scope, B: Bound> Eq for BoundedOpenMap<S, B> {}

impl<S: Scope, B: Bound> Hash for BoundedOpenMap<S, B> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		raw_hash(&self.raw, state);
	}
}

impl<S: Scope, B: Bound> fmt::Debug for BoundedOpenMap<S, B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		raw_fmt(&self.raw, f)
	}
}

pub(crate) fn raw_eq(a: &RawMap, b: &RawMap) -> bool {
	a.size() == b.size()
		&& a
			.iter()
			.all(|(key, slot)| b.get(key).is_some_and(|other| slot == other))
}

/// Trie iteration order depends on history, so entries are hashed independently and summed.
pub(crate) fn raw_hash<H: Hasher>(raw: &RawMap, state: &mut H) {
	let mut sum = 0u64;
	for (key, slot) in raw.iter() {
		let mut entry = FxHasher::default();
		key.hash(&mut entry);
		slot.hash(&mut entry);
		sum = sum.wrapping_add(entry.finish());
	}
	state.write_usize(raw.size());
	state.write_u64(sum);
}

pub(crate) fn raw_fmt(raw: &RawMap, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	f.debug_map().entries(raw.iter()).finish()
}
