use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::scope::Scope;
use crate::slot::SlotValue;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// Untyped identity of a [`Key`].
///
/// Compares and hashes by the allocated id only; the name is carried for diagnostics.
#[derive(Clone, Copy)]
pub struct KeyId {
	id: u64,
	name: &'static str,
}

impl KeyId {
	fn next(name: &'static str) -> Self {
		Self {
			id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
			name,
		}
	}

	/// Returns the diagnostic name given at construction.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the process-unique numeric id.
	pub fn as_u64(&self) -> u64 {
		self.id
	}
}

impl PartialEq for KeyId {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for KeyId {}

impl Hash for KeyId {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for KeyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.name, self.id)
	}
}

impl fmt::Display for KeyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Typed handle to a slot in an open map.
///
/// `T` is the value type stored under the key and `S` the scope the key is declared for.
/// Every call to [`Key::new`] mints a distinct slot, even with an identical name; copies of a
/// key share its identity.
///
/// Keys are usually declared once per process:
///
/// ```
/// use std::sync::LazyLock;
///
/// use satchel_map::{Key, Scope};
///
/// enum SessionScope {}
/// impl Scope for SessionScope {}
///
/// static USER_NAME: LazyLock<Key<String, SessionScope>> = LazyLock::new(|| Key::new("user_name"));
/// ```
pub struct Key<T, S> {
	id: KeyId,
	_marker: PhantomData<fn() -> (T, S)>,
}

impl<T, S> Clone for Key<T, S> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T, S> Copy for Key<T, S> {}

impl<T: SlotValue, S: Scope> Key<T, S> {
	/// Mints a new key with a diagnostic name.
	pub fn new(name: &'static str) -> Self {
		Self {
			id: KeyId::next(name),
			_marker: PhantomData,
		}
	}
}

impl<T, S> Key<T, S> {
	/// Returns the untyped identity of this key.
	pub fn id(&self) -> KeyId {
		self.id
	}

	/// Returns the diagnostic name of this key.
	pub fn name(&self) -> &'static str {
		self.id.name
	}
}

impl<T, S> PartialEq for Key<T, S> {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl<T, S> Eq for Key<T, S> {}

impl<T, S> Hash for Key<T, S> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl<T, S> fmt::Debug for Key<T, S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Key")
			.field("id", &self.id)
			.field("type", &std::any::type_name::<T>())
			.finish()
	}
}
