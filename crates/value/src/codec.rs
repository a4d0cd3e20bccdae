use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;

/// Converts values of `T` to and from serialized data.
///
/// A [`crate::SerializedValue`] never inspects a codec beyond calling these two methods, and
/// remembers the codec's type to decide whether a cached decoded value can be reused.
pub trait Codec<T>: Clone + Send + Sync + 'static {
	/// Produces the data form of `value`.
	fn encode(&self, value: &T) -> Result<Value, CodecError>;

	/// Rebuilds a value from `data`.
	fn decode(&self, data: &Value) -> Result<T, CodecError>;
}

/// [`Codec`] backed by `serde_json`.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
	pub const fn new() -> Self {
		Self(PhantomData)
	}
}

impl<T> Default for JsonCodec<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for JsonCodec<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> Copy for JsonCodec<T> {}

impl<T> fmt::Debug for JsonCodec<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "JsonCodec<{}>", std::any::type_name::<T>())
	}
}

impl<T> Codec<T> for JsonCodec<T>
where
	T: Serialize + DeserializeOwned + 'static,
{
	fn encode(&self, value: &T) -> Result<Value, CodecError> {
		serde_json::to_value(value).map_err(CodecError::encode::<T>)
	}

	fn decode(&self, data: &Value) -> Result<T, CodecError> {
		T::deserialize(data).map_err(CodecError::decode::<T>)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Cursor {
		line: u32,
		column: u32,
	}

	#[test]
	fn json_codec_round_trips_struct() {
		let codec = JsonCodec::<Cursor>::new();
		let data = codec.encode(&Cursor { line: 3, column: 7 }).unwrap();
		assert_eq!(data, json!({ "line": 3, "column": 7 }));
		assert_eq!(codec.decode(&data).unwrap(), Cursor { line: 3, column: 7 });
	}

	#[test]
	fn json_codec_reports_type_on_decode_failure() {
		let codec = JsonCodec::<Cursor>::new();
		let err = codec.decode(&json!("not a cursor")).unwrap_err();
		assert!(matches!(err, CodecError::Decode { .. }));
		assert!(err.to_string().contains("Cursor"), "{err}");
	}
}
