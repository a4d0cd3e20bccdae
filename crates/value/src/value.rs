//! The serialized/deserialized value cell.
//!
//! # Role
//!
//! [`SerializedValue`] holds one of two equivalent representations and converts lazily:
//!
//! - `Serialized(data)`: raw data, decoded on the first [`SerializedValue::get`].
//! - `Deserialized(value, codec)`: a typed value; its data is encoded on the first
//!   [`SerializedValue::data`] and cached for good.
//!
//! # Invariants
//!
//! - Content is fixed at construction; switching representation never changes it.
//! - The only transition is `Serialized -> Deserialized`, or re-decoding an existing
//!   `Deserialized` state for a different codec. Both go through compare-and-swap on the
//!   state cell, so concurrent first reads race benignly: one decode wins, the others adopt it.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::codec::Codec;
use crate::error::CodecError;

/// A value with a lazily materialized serialized form and a lazily decoded typed form.
///
/// Equality and hashing are defined over the serialized data, which is encoded on demand.
/// A value whose encoding fails is equal only to itself and its clones.
pub struct SerializedValue {
	state: ArcSwap<State>,
}

enum State {
	Serialized(Value),
	Deserialized(Decoded),
}

/// A decoded value with the codec that produced it and its cached data.
struct Decoded {
	repr: Box<dyn Representation>,
	data: OnceLock<Value>,
}

/// Type-erased `(value, codec)` pair.
trait Representation: Send + Sync {
	fn value(&self) -> Arc<dyn Any + Send + Sync>;

	fn codec_type(&self) -> TypeId;

	fn encode(&self) -> Result<Value, CodecError>;

	fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

struct Typed<T, C> {
	value: Arc<T>,
	codec: C,
}

impl<T, C> Representation for Typed<T, C>
where
	T: fmt::Debug + Send + Sync + 'static,
	C: Codec<T>,
{
	fn value(&self) -> Arc<dyn Any + Send + Sync> {
		self.value.clone()
	}

	fn codec_type(&self) -> TypeId {
		TypeId::of::<C>()
	}

	fn encode(&self) -> Result<Value, CodecError> {
		self.codec.encode(&self.value)
	}

	fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.value, f)
	}
}

impl Decoded {
	fn new<T, C>(value: Arc<T>, codec: C, data: Option<Value>) -> Self
	where
		T: fmt::Debug + Send + Sync + 'static,
		C: Codec<T>,
	{
		Self {
			repr: Box::new(Typed { value, codec }),
			data: data.map(OnceLock::from).unwrap_or_default(),
		}
	}

	/// Returns the cached data, encoding it on first use.
	fn data(&self) -> Result<&Value, CodecError> {
		if let Some(data) = self.data.get() {
			return Ok(data);
		}
		let encoded = self.repr.encode()?;
		Ok(self.data.get_or_init(|| encoded))
	}
}

impl fmt::Debug for Decoded {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.repr.fmt_value(f)
	}
}

impl SerializedValue {
	fn with_state(state: State) -> Self {
		Self {
			state: ArcSwap::from_pointee(state),
		}
	}

	/// Wraps a decoded value. Nothing is encoded until [`data`](Self::data) is requested.
	pub fn from_deserialized<T, C>(value: T, codec: C) -> Self
	where
		T: fmt::Debug + Send + Sync + 'static,
		C: Codec<T>,
	{
		Self::with_state(State::Deserialized(Decoded::new(Arc::new(value), codec, None)))
	}

	/// Wraps raw data. Nothing is decoded until [`get`](Self::get) is called.
	pub fn from_serialized(data: Value) -> Self {
		Self::with_state(State::Serialized(data))
	}

	/// Returns the serialized form.
	///
	/// A decoded value is encoded with its codec on the first call; the result is cached and
	/// later calls never encode again.
	pub fn data(&self) -> Result<Value, CodecError> {
		match &**self.state.load() {
			State::Serialized(data) => Ok(data.clone()),
			State::Deserialized(decoded) => decoded.data().cloned(),
		}
	}

	/// Returns the decoded form as `T`.
	///
	/// A cached value is reused only if it was produced by a codec of the same type as `codec`
	/// and is a `T`; otherwise the data is decoded with `codec` and the result replaces the
	/// cached value.
	pub fn get<T, C>(&self, codec: &C) -> Result<Arc<T>, CodecError>
	where
		T: fmt::Debug + Send + Sync + 'static,
		C: Codec<T>,
	{
		loop {
			let current = self.state.load_full();
			let data = match &*current {
				State::Serialized(data) => data.clone(),
				State::Deserialized(decoded) => {
					if decoded.repr.codec_type() == TypeId::of::<C>()
						&& let Ok(value) = decoded.repr.value().downcast::<T>()
					{
						return Ok(value);
					}
					tracing::debug!(
						requested = type_name::<T>(),
						codec = type_name::<C>(),
						"re-decoding serialized value for a different codec"
					);
					decoded.data()?.clone()
				}
			};

			let value = Arc::new(codec.decode(&data)?);
			let next = State::Deserialized(Decoded::new(
				Arc::clone(&value),
				codec.clone(),
				Some(data),
			));
			let prev = self.state.compare_and_swap(&current, Arc::new(next));
			if Arc::ptr_eq(&prev, &current) {
				return Ok(value);
			}
			// Another reader installed a state first; adopt it if it fits.
		}
	}

	/// Returns true if a decoded value is cached.
	pub fn is_deserialized(&self) -> bool {
		matches!(&**self.state.load(), State::Deserialized(_))
	}
}

impl From<Value> for SerializedValue {
	fn from(data: Value) -> Self {
		Self::from_serialized(data)
	}
}

impl Clone for SerializedValue {
	fn clone(&self) -> Self {
		Self {
			state: ArcSwap::new(self.state.load_full()),
		}
	}
}

impl PartialEq for SerializedValue {
	fn eq(&self, other: &Self) -> bool {
		if std::ptr::eq(self, other) || Arc::ptr_eq(&*self.state.load(), &*other.state.load()) {
			return true;
		}
		match (self.data(), other.data()) {
			(Ok(a), Ok(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for SerializedValue {}

impl Hash for SerializedValue {
	fn hash<H: Hasher>(&self, state: &mut H) {
		match self.data() {
			Ok(data) => data.hash(state),
			Err(_) => state.write_u8(0),
		}
	}
}

impl fmt::Debug for SerializedValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &**self.state.load() {
			State::Serialized(data) => f.debug_tuple("Serialized").field(data).finish(),
			State::Deserialized(decoded) => f.debug_tuple("Deserialized").field(decoded).finish(),
		}
	}
}

/// Renders the serialized data. Never fails on codec errors: an unencodable value is
/// rendered with the error and its decoded form instead.
impl fmt::Display for SerializedValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &**self.state.load() {
			State::Serialized(data) => write!(f, "{data}"),
			State::Deserialized(decoded) => match decoded.data() {
				Ok(data) => write!(f, "{data}"),
				Err(err) => {
					tracing::debug!(error = %err, "serialized value has no data form");
					write!(f, "<failed to serialize: {err}; value = {decoded:?}>")
				}
			},
		}
	}
}

impl Serialize for SerializedValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let data = self.data().map_err(<S::Error as serde::ser::Error>::custom)?;
		data.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for SerializedValue {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Value::deserialize(deserializer).map(Self::from_serialized)
	}
}

#[cfg(test)]
mod tests;
