use std::{
	io,
	fs::{self, File},
	path::{Path, PathBuf},
};


/// Run a test for every JSON fixture under a directory, relative to the crate root.
/// Fixtures are visited in path order, recursing into subdirectories.
pub fn test_dir<P, F>(path: P, mut test: F) -> io::Result<()>
where
	P: AsRef<Path>,
	F: FnMut(&Path, File) -> io::Result<()>,
{
	let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
	dir.push(path);

	let mut fixtures = Vec::new();
	collect(&dir, &mut fixtures)?;
	fixtures.sort();

	assert!(!fixtures.is_empty(), "no fixtures in {}", dir.display());

	for fixture in fixtures {
		let file = File::open(&fixture)?;
		test(&fixture, file)?;
	}

	Ok(())
}


fn collect(dir: &Path, fixtures: &mut Vec<PathBuf>) -> io::Result<()> {
	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_dir() {
			collect(&path, fixtures)?;
		} else if path.extension().map_or(false, |extension| extension == "json") {
			fixtures.push(path);
		}
	}

	Ok(())
}
