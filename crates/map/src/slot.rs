//! Type-erased slot values.
//!
//! # Role
//!
//! Maps store every value as `Arc<dyn SlotValue>` so one persistent map can hold unrelated
//! types. The typed API recovers `T` through [`downcast`] and [`downcast_ref`], which are the
//! only places erased values are turned back into concrete types.
//!
//! # Invariants
//!
//! - A slot reached through `Key<T, _>` always holds a `T`. A mismatch means a key id was
//!   reused across types, which [`crate::Key`] construction rules out; it panics rather than
//!   returning a wrong value.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::key::KeyId;

/// Requirements for values stored in an open map.
///
/// Blanket-implemented for every `Send + Sync + 'static` type with `Debug`, `Eq`, and `Hash`.
/// Equality and hashing are exposed dynamically so maps can compare and hash their content
/// structurally.
pub trait SlotValue: Any + Send + Sync + fmt::Debug {
	/// Borrows the value as [`Any`].
	fn as_any(&self) -> &dyn Any;

	/// Converts a shared value into a shared [`Any`].
	fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

	/// Compares against another erased value; values of different types are never equal.
	fn dyn_eq(&self, other: &dyn SlotValue) -> bool;

	/// Feeds the concrete type and content into `state`.
	fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> SlotValue for T
where
	T: Any + Send + Sync + fmt::Debug + Eq + Hash,
{
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}

	fn dyn_eq(&self, other: &dyn SlotValue) -> bool {
		other
			.as_any()
			.downcast_ref::<T>()
			.is_some_and(|other| self == other)
	}

	fn dyn_hash(&self, mut state: &mut dyn Hasher) {
		TypeId::of::<T>().hash(&mut state);
		self.hash(&mut state);
	}
}

/// A stored, type-erased value.
#[derive(Clone)]
pub(crate) struct Slot(Arc<dyn SlotValue>);

impl Slot {
	pub(crate) fn new<T: SlotValue>(value: Arc<T>) -> Self {
		Self(value)
	}
}

impl PartialEq for Slot {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(&*other.0)
	}
}

impl Eq for Slot {}

impl Hash for Slot {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.dyn_hash(state);
	}
}

impl fmt::Debug for Slot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

/// Recovers a shared `T` from the slot stored under `key`.
pub(crate) fn downcast<T: SlotValue>(key: KeyId, slot: &Slot) -> Arc<T> {
	match Arc::clone(&slot.0).into_any_arc().downcast::<T>() {
		Ok(value) => value,
		Err(_) => type_mismatch::<T>(key),
	}
}

/// Borrows the `T` stored under `key`.
pub(crate) fn downcast_ref<T: SlotValue>(key: KeyId, slot: &Slot) -> &T {
	match slot.0.as_any().downcast_ref::<T>() {
		Some(value) => value,
		None => type_mismatch::<T>(key),
	}
}

#[cold]
#[inline(never)]
fn type_mismatch<T>(key: KeyId) -> ! {
	panic!(
		"open map slot {key:?} does not hold a `{}`; keys must not be shared across value types",
		type_name::<T>()
	)
}
