mod scenarios;

use std::{
	io,
	sync::Arc,
};

use crate::{
	definition::Source,
	runtime::{Runtime, Settings},
	signal::Signal,
	tests,
	value::Value,
};
use super::Context;


/// Load and construct the main definition of every fixture in a directory.
fn test_dir<F>(path: &str, mut check: F) -> io::Result<()>
where
	F: FnMut(&Result<Option<Value>, Signal>, &serde_json::Value) -> bool,
{
	tests::util::test_dir(
		path,
		move |path, file| {
			let source = Source::from_reader(path, file)?;
			let document: serde_json::Value = serde_json::from_slice(&source.contents)?;

			let table = source
				.load()
				.unwrap_or_else(|error| panic!("File {}: {}", path.display(), error));

			let main = table
				.main()
				.unwrap_or_else(|| panic!("File {}: missing main definition", path.display()));

			let mut context = Context::new(Runtime::new(Settings::default()), Arc::new(table));

			if let Some(limit) = document["limit"].as_u64() {
				context.set_size_limit(limit as usize);
			}

			let result = context.construct(main, Vec::new().into());

			if !check(&result, &document) {
				match result {
					Ok(value) => panic!(
						"File {}: unexpected value {}",
						path.display(),
						value.unwrap_or_default()
					),
					Err(signal) => panic!("File {}: {}", path.display(), signal),
				}
			}

			assert_eq!(context.size(), 0, "File {}: unbalanced stack", path.display());

			Ok(())
		}
	)
}


#[test]
fn test_positive() -> io::Result<()> {
	test_dir(
		"src/context/tests/data/positive",
		|result, document| match result {
			Ok(value) => value.clone().unwrap_or_default() == Value::from(&document["expect"]),
			Err(_) => false,
		}
	)
}


#[test]
fn test_negative() -> io::Result<()> {
	test_dir(
		"src/context/tests/data/negative",
		|result, document| match (result, &document["expect"]) {
			(Err(Signal::Redirection(redirection)), serde_json::Value::String(location)) => {
				&*redirection.location == location.as_str()
			}
			(Err(Signal::Overflow(_)), serde_json::Value::String(expect)) => expect == "overflow",
			(Err(_), serde_json::Value::Null) => true,
			_ => false,
		}
	)
}
