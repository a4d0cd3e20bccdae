use std::collections::hash_map::DefaultHasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::JsonCodec;

/// Codec over `u32` that counts how often it runs.
#[derive(Clone, Default)]
struct CountingCodec {
	encodes: Arc<AtomicUsize>,
	decodes: Arc<AtomicUsize>,
}

impl CountingCodec {
	fn encodes(&self) -> usize {
		self.encodes.load(Ordering::SeqCst)
	}

	fn decodes(&self) -> usize {
		self.decodes.load(Ordering::SeqCst)
	}
}

impl Codec<u32> for CountingCodec {
	fn encode(&self, value: &u32) -> Result<Value, CodecError> {
		self.encodes.fetch_add(1, Ordering::SeqCst);
		Ok(json!(value))
	}

	fn decode(&self, data: &Value) -> Result<u32, CodecError> {
		self.decodes.fetch_add(1, Ordering::SeqCst);
		data.as_u64()
			.and_then(|v| u32::try_from(v).ok())
			.ok_or_else(|| CodecError::decode::<u32>("expected a u32"))
	}
}

#[derive(Debug)]
struct Opaque(&'static str);

#[derive(Clone)]
struct FailingCodec;

impl Codec<Opaque> for FailingCodec {
	fn encode(&self, _: &Opaque) -> Result<Value, CodecError> {
		Err(CodecError::encode::<Opaque>("opaque values have no data form"))
	}

	fn decode(&self, _: &Value) -> Result<Opaque, CodecError> {
		Err(CodecError::decode::<Opaque>("opaque values have no data form"))
	}
}

fn hash_of(value: &SerializedValue) -> u64 {
	let mut hasher = DefaultHasher::new();
	value.hash(&mut hasher);
	hasher.finish()
}

#[test]
fn deserialized_get_returns_value_without_codec_calls() {
	let codec = CountingCodec::default();
	let value = SerializedValue::from_deserialized(42u32, codec.clone());

	assert_eq!(*value.get::<u32, _>(&codec).unwrap(), 42);
	assert_eq!(codec.encodes(), 0);
	assert_eq!(codec.decodes(), 0);
}

#[test]
fn serialized_data_is_returned_as_is() {
	let value = SerializedValue::from_serialized(json!({ "a": [1, 2] }));
	assert_eq!(value.data().unwrap(), json!({ "a": [1, 2] }));
	assert!(!value.is_deserialized());
}

#[test]
fn encoded_data_decodes_back_to_value() {
	let codec = JsonCodec::<Vec<String>>::new();
	let original = vec!["a".to_string(), "b".to_string()];
	let value = SerializedValue::from_deserialized(original.clone(), codec);

	let data = value.data().unwrap();
	assert_eq!(codec.decode(&data).unwrap(), original);
}

#[test]
fn data_is_encoded_once() {
	let codec = CountingCodec::default();
	let value = SerializedValue::from_deserialized(7u32, codec.clone());

	assert_eq!(value.data().unwrap(), json!(7));
	assert_eq!(value.data().unwrap(), json!(7));
	assert_eq!(codec.encodes(), 1);
}

#[test]
fn decode_is_memoized() {
	let codec = CountingCodec::default();
	let value = SerializedValue::from_serialized(json!(9));

	assert_eq!(*value.get::<u32, _>(&codec).unwrap(), 9);
	assert!(value.is_deserialized());
	assert_eq!(*value.get::<u32, _>(&codec).unwrap(), 9);
	assert_eq!(codec.decodes(), 1);
}

#[test]
fn decoded_state_keeps_original_data() {
	let codec = CountingCodec::default();
	let value = SerializedValue::from_serialized(json!(9));
	value.get::<u32, _>(&codec).unwrap();

	assert_eq!(value.data().unwrap(), json!(9));
	assert_eq!(codec.encodes(), 0);
}

#[test]
fn decode_failure_leaves_state_serialized() {
	let codec = CountingCodec::default();
	let value = SerializedValue::from_serialized(json!("nine"));

	let err = value.get::<u32, _>(&codec).unwrap_err();
	assert!(matches!(err, CodecError::Decode { .. }));
	assert!(!value.is_deserialized());
	assert_eq!(value.data().unwrap(), json!("nine"));
}

#[test]
fn different_codec_type_redecodes() {
	let counting = CountingCodec::default();
	let value = SerializedValue::from_serialized(json!(5));
	let first = value.get::<u32, _>(&counting).unwrap();
	assert_eq!(*first, 5u32);

	let wide = value.get(&JsonCodec::<u64>::new()).unwrap();
	assert_eq!(*wide, 5u64);

	let again = value.get::<u32, _>(&counting).unwrap();
	assert_eq!(*again, 5u32);
	assert_eq!(counting.decodes(), 2);
}

#[test]
fn display_never_fails() {
	let value = SerializedValue::from_deserialized(Opaque("secret"), FailingCodec);

	let rendered = value.to_string();
	assert!(rendered.contains("failed to serialize"), "{rendered}");
	assert!(rendered.contains("Opaque(\"secret\")"), "{rendered}");
	assert!(value.data().is_err());
}

#[test]
fn display_renders_data() {
	let value = SerializedValue::from_deserialized(3u32, CountingCodec::default());
	assert_eq!(value.to_string(), "3");
	assert_eq!(SerializedValue::from_serialized(json!("x")).to_string(), "\"x\"");
}

#[test]
fn debug_shows_current_representation() {
	let serialized = SerializedValue::from_serialized(json!(1));
	assert!(format!("{serialized:?}").starts_with("Serialized("));

	let decoded = SerializedValue::from_deserialized(1u32, CountingCodec::default());
	assert_eq!(format!("{decoded:?}"), "Deserialized(1)");
}

#[test]
fn equality_spans_representations() {
	let codec = CountingCodec::default();
	let decoded = SerializedValue::from_deserialized(11u32, codec);
	let raw = SerializedValue::from_serialized(json!(11));

	assert_eq!(decoded, raw);
	assert_eq!(hash_of(&decoded), hash_of(&raw));
	assert_ne!(decoded, SerializedValue::from_serialized(json!(12)));
}

#[test]
#[allow(clippy::eq_op)]
fn unencodable_value_equals_only_itself() {
	let value = SerializedValue::from_deserialized(Opaque("a"), FailingCodec);
	let other = SerializedValue::from_deserialized(Opaque("a"), FailingCodec);

	assert!(value == value);
	assert!(value != other);
}

#[test]
fn unencodable_value_equals_its_clone() {
	let value = SerializedValue::from_deserialized(Opaque("a"), FailingCodec);
	let copy = value.clone();

	assert!(value == copy);
	assert_eq!(hash_of(&value), hash_of(&copy));
}

#[test]
fn object_hash_ignores_insertion_order() {
	let mut forward = serde_json::Map::new();
	forward.insert("x".to_string(), json!(1));
	forward.insert("y".to_string(), json!(2));

	let mut backward = serde_json::Map::new();
	backward.insert("y".to_string(), json!(2));
	backward.insert("x".to_string(), json!(1));

	let a = SerializedValue::from_serialized(Value::Object(forward));
	let b = SerializedValue::from_serialized(Value::Object(backward));

	assert_eq!(a, b);
	assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn clone_shares_content() {
	let codec = CountingCodec::default();
	let value = SerializedValue::from_serialized(json!(4));
	let copy = value.clone();
	copy.get::<u32, _>(&codec).unwrap();

	assert!(copy.is_deserialized());
	assert!(!value.is_deserialized());
	assert_eq!(value, copy);
}

#[test]
fn serde_uses_data_form() {
	let value = SerializedValue::from_deserialized(
		vec![1u8, 2, 3],
		JsonCodec::<Vec<u8>>::new(),
	);
	let text = serde_json::to_string(&value).unwrap();
	assert_eq!(text, "[1,2,3]");

	let back: SerializedValue = serde_json::from_str(&text).unwrap();
	assert!(!back.is_deserialized());
	assert_eq!(back, value);
}

#[test]
fn serialize_reports_codec_failure() {
	let value = SerializedValue::from_deserialized(Opaque("a"), FailingCodec);
	let err = serde_json::to_string(&value).unwrap_err();
	assert!(err.to_string().contains("failed to encode"), "{err}");
}

#[test]
fn concurrent_first_reads_agree() {
	const THREADS: usize = 8;

	let codec = CountingCodec::default();
	let value = SerializedValue::from_serialized(json!(100));

	let results: Vec<Arc<u32>> = thread::scope(|scope| {
		let handles: Vec<_> = (0..THREADS)
			.map(|_| {
				let (value, codec) = (&value, &codec);
				scope.spawn(move || value.get::<u32, _>(codec).unwrap())
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	let installed = value.get::<u32, _>(&codec).unwrap();
	assert!(codec.decodes() >= 1);
	for result in &results {
		assert!(Arc::ptr_eq(result, &installed));
	}
}
