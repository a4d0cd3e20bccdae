use std::any::type_name;

/// Boxed error returned by codec implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure converting between serialized data and a decoded value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
	/// The decoded value could not be turned into data.
	#[error("failed to encode `{type_name}`: {source}")]
	Encode {
		type_name: &'static str,
		#[source]
		source: BoxError,
	},
	/// The data could not be turned into the requested type.
	#[error("failed to decode `{type_name}`: {source}")]
	Decode {
		type_name: &'static str,
		#[source]
		source: BoxError,
	},
}

impl CodecError {
	/// Builds an encode failure for `T`.
	pub fn encode<T: ?Sized>(source: impl Into<BoxError>) -> Self {
		Self::Encode {
			type_name: type_name::<T>(),
			source: source.into(),
		}
	}

	/// Builds a decode failure for `T`.
	pub fn decode<T: ?Sized>(source: impl Into<BoxError>) -> Self {
		Self::Decode {
			type_name: type_name::<T>(),
			source: source.into(),
		}
	}
}
