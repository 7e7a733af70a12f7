mod float;
mod fmt;

use std::{
	collections::BTreeMap,
	convert::TryFrom,
	sync::Arc,
};

pub use float::Float;


/// A value produced by a construction.
/// Values are immutable and cheap to copy, so that they can be stored in cache tiers
/// shared between threads.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
	Nil,
	Bool(bool),
	Int(i64),
	Float(Float),
	String(Arc<str>),
	Array(Arc<[Value]>),
	Table(Arc<BTreeMap<Value, Value>>),
}


impl Value {
	/// Truthiness, used by conditional host definitions.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Nil => false,
			Self::Bool(b) => *b,
			Self::Int(int) => *int != 0,
			Self::Float(float) => float.0 != 0.0,
			Self::String(string) => !string.is_empty(),
			Self::Array(array) => !array.is_empty(),
			Self::Table(table) => !table.is_empty(),
		}
	}


	/// Index a collection value. Arrays accept integer indexes, tables accept any key.
	pub fn index(&self, index: &Value) -> Option<Value> {
		match (self, index) {
			(Self::Array(array), Self::Int(ix)) => {
				let ix = usize::try_from(*ix).ok()?;
				array.get(ix).cloned()
			}

			(Self::Table(table), key) => table.get(key).cloned(),

			(Self::String(string), Self::Int(ix)) => {
				let ix = usize::try_from(*ix).ok()?;
				string
					.chars()
					.nth(ix)
					.map(|c| Value::from(c.to_string().as_str()))
			}

			_ => None,
		}
	}


	/// The length of collections and strings.
	pub fn len(&self) -> Option<usize> {
		match self {
			Self::String(string) => Some(string.chars().count()),
			Self::Array(array) => Some(array.len()),
			Self::Table(table) => Some(table.len()),
			_ => None,
		}
	}


	/// The elements to iterate over in a repeated construct. Tables yield their values, in
	/// key order. Nil yields nothing, and scalars yield themselves once.
	pub fn elements(&self) -> Vec<Value> {
		match self {
			Self::Nil => Vec::new(),
			Self::Array(array) => array.to_vec(),
			Self::Table(table) => table.values().cloned().collect(),
			other => vec![other.clone()],
		}
	}


	/// Join text fragments into a single string value.
	pub fn concat<I>(fragments: I) -> Self
	where
		I: IntoIterator<Item = Value>,
	{
		let mut text = String::new();

		for fragment in fragments {
			text.push_str(&fragment.to_string());
		}

		text.as_str().into()
	}
}


impl Default for Value {
	fn default() -> Self {
		Self::Nil
	}
}


impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}


impl From<i64> for Value {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}


impl From<f64> for Value {
	fn from(float: f64) -> Self {
		Self::Float(float.into())
	}
}


impl<'a> From<&'a str> for Value {
	fn from(string: &'a str) -> Self {
		Self::String(string.into())
	}
}


impl From<String> for Value {
	fn from(string: String) -> Self {
		Self::String(string.into())
	}
}


impl From<Vec<Value>> for Value {
	fn from(array: Vec<Value>) -> Self {
		Self::Array(array.into())
	}
}


impl From<BTreeMap<Value, Value>> for Value {
	fn from(table: BTreeMap<Value, Value>) -> Self {
		Self::Table(Arc::new(table))
	}
}


impl From<&serde_json::Value> for Value {
	fn from(json: &serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Self::Nil,
			serde_json::Value::Bool(b) => Self::Bool(*b),
			serde_json::Value::Number(number) => match number.as_i64() {
				Some(int) => Self::Int(int),
				None => Self::from(number.as_f64().unwrap_or(f64::NAN)),
			},
			serde_json::Value::String(string) => string.as_str().into(),
			serde_json::Value::Array(array) => array
				.iter()
				.map(Value::from)
				.collect::<Vec<_>>()
				.into(),
			serde_json::Value::Object(object) => object
				.iter()
				.map(|(key, value)| (Value::from(key.as_str()), Value::from(value)))
				.collect::<BTreeMap<_, _>>()
				.into(),
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;


	#[test]
	fn test_index() {
		let array: Value = vec![Value::from("a"), Value::from("b")].into();
		assert_eq!(array.index(&Value::Int(1)), Some(Value::from("b")));
		assert_eq!(array.index(&Value::Int(2)), None);
		assert_eq!(array.index(&Value::Int(-1)), None);

		let json = serde_json::json!({ "x": 1, "y": [true, null] });
		let table = Value::from(&json);
		assert_eq!(table.index(&"x".into()), Some(Value::Int(1)));
		assert_eq!(table.len(), Some(2));
	}


	#[test]
	fn test_concat() {
		let text = Value::concat(vec![Value::from("a = "), Value::Int(1), Value::Nil]);
		assert_eq!(text, Value::from("a = 1"));
	}


	#[test]
	fn test_float_ordering() {
		let nan = Float(f64::NAN);
		assert_ne!(nan, nan);
		assert!(nan < Float(0.0));
		assert!(Float(1.0) > Float(0.5));
	}
}
