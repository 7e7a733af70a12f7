use super::Value;


/// Values render as the text they contribute to a construction. Nil contributes nothing.
impl std::fmt::Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Nil => Ok(()),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Int(int) => write!(f, "{}", int),
			Self::Float(float) => write!(f, "{}", float),
			Self::String(string) => f.write_str(string),

			Self::Array(array) => {
				write!(f, "[")?;

				crate::fmt::sep_by(
					array.iter(),
					f,
					|item, f| write!(f, "{}", item),
					", "
				)?;

				write!(f, "]")
			}

			Self::Table(table) => {
				write!(f, "{{")?;

				crate::fmt::sep_by(
					table.iter(),
					f,
					|(key, value), f| write!(f, "{}: {}", key, value),
					", "
				)?;

				write!(f, "}}")
			}
		}
	}
}


#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use super::*;


	#[test]
	fn test_display() {
		assert_eq!(Value::Nil.to_string(), "");
		assert_eq!(Value::from(1.5).to_string(), "1.5");

		let array: Value = vec![Value::Int(1), Value::from("x")].into();
		assert_eq!(array.to_string(), "[1, x]");

		let mut table = BTreeMap::new();
		table.insert(Value::from("k"), Value::Bool(true));
		assert_eq!(Value::from(table).to_string(), "{k: true}");
	}
}
