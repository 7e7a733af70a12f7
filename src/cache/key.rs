//! Cache key construction: `name(args)[index]#loop`.

use std::{fmt::Write, sync::Arc};

use crate::value::Value;


pub type Key = Arc<str>;


/// The key for a name instantiated with arguments and indexes.
pub fn base(name: &str, args: &[Value], indexes: &[Value]) -> Key {
	let mut key = String::from(name);

	if !args.is_empty() {
		key.push('(');
		for (ix, arg) in args.iter().enumerate() {
			if ix > 0 {
				key.push_str(", ");
			}
			let _ = write!(key, "{}", arg);
		}
		key.push(')');
	}

	for index in indexes {
		let _ = write!(key, "[{}]", index);
	}

	key.into()
}


/// The key suffixed with a loop index.
pub fn looped(base: &str, index: i32) -> Key {
	format!("{}#{}", base, index).into()
}


/// The key qualified with a container name.
pub fn qualified(container: &str, key: &str) -> Key {
	format!("{}.{}", container, key).into()
}
