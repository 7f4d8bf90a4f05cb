use indexmap::IndexMap;

/// A decoded bencode value. Dictionaries keep their keys in the order they
/// appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
	ByteString(Vec<u8>), // raw bytes, not necessarily UTF-8
	Integer(i64),
	List(Vec<BValue>),
	Dict(IndexMap<Vec<u8>, BValue>)
}

impl BValue {
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			BValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			BValue::ByteString(b) => Some(b),
			_ => None,
		}
	}

	/// The byte string as UTF-8 text, if it is a byte string and decodes cleanly.
	pub fn as_str(&self) -> Option<&str> {
		self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
	}

	pub fn as_list(&self) -> Option<&[BValue]> {
		match self {
			BValue::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_dict(&self) -> Option<&IndexMap<Vec<u8>, BValue>> {
		match self {
			BValue::Dict(map) => Some(map),
			_ => None,
		}
	}

	/// Looks up `key` when this value is a dictionary.
	pub fn get(&self, key: &[u8]) -> Option<&BValue> {
		self.as_dict().and_then(|map| map.get(key))
	}

	/// True when the dictionary keys are in strictly ascending byte order,
	/// which is what conforming encoders emit. Non-dictionaries report true.
	pub fn has_sorted_keys(&self) -> bool {
		match self {
			BValue::Dict(map) => map
				.keys()
				.zip(map.keys().skip(1))
				.all(|(a, b)| a < b),
			_ => true,
		}
	}
}
