//! Values that carry both a serialized and a decoded representation.
//!
//! A [`SerializedValue`] starts from either side: a decoded value plus the [`Codec`] that
//! encodes it, or raw [`serde_json::Value`] data received from elsewhere. Each side is
//! produced on demand and memoized, so values stored in long-lived maps pay for a conversion
//! at most once per representation.
//!
//! ```
//! use satchel_value::{JsonCodec, SerializedValue};
//!
//! let value = SerializedValue::from_serialized(serde_json::json!([1, 2, 3]));
//! let decoded = value.get(&JsonCodec::<Vec<u32>>::new()).unwrap();
//! assert_eq!(*decoded, vec![1, 2, 3]);
//! assert!(value.is_deserialized());
//! ```

/// Encoding and decoding between data and typed values.
pub mod codec;
/// Codec failures.
pub mod error;
/// The dual-representation cell.
pub mod value;

pub use codec::{Codec, JsonCodec};
pub use error::{BoxError, CodecError};
pub use value::SerializedValue;
