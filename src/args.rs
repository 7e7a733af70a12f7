use std::{ffi::OsString, path::PathBuf};

use clap::{clap_app, crate_authors, crate_version, crate_description};

use strata::{runtime::DEFAULT_SIZE_LIMIT, Threshold};


#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
	Help(Box<str>),
	Version(Box<str>),
	Run(Args)
}


#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Args {
	/// The site source. Read from stdin if absent.
	pub path: Option<PathBuf>,
	/// Maximum construction stack depth.
	pub limit: usize,
	/// Which errors abort the construction.
	pub threshold: Threshold,
	/// Print frame statistics after constructing.
	pub stats: bool,
}


pub fn parse<A, T>(args: A) -> clap::Result<Command>
where
	A: IntoIterator<Item = T>,
	T: Into<OsString> + Clone
{
	let app = clap_app!(
		Strata =>
			(version: crate_version!())
			(author: crate_authors!())
			(about: crate_description!())
			(@arg limit: -l --limit +takes_value "Maximum construction stack depth")
			(@arg threshold: -t --threshold +takes_value
				"Error threshold: everything, ignorable, dubious or fatal")
			(@arg stats: --stats "Print frame statistics to stderr")
			(@arg FILE: "The site source, in JSON. Read from stdin if absent")
	);

	let matches = match app.get_matches_from_safe(args) {
		Ok(matches) => matches,

		Err(error) => return match error.kind {
			clap::ErrorKind::HelpDisplayed => Ok(
				Command::Help(error.message.into_boxed_str())
			),
			clap::ErrorKind::VersionDisplayed => Ok(
				Command::Version(error.message.into_boxed_str())
			),
			_ => Err(error)
		}
	};

	let limit = match matches.value_of("limit") {
		Some(limit) => limit
			.parse()
			.map_err(|_| invalid_value(format!("invalid stack limit '{}'", limit)))?,
		None => DEFAULT_SIZE_LIMIT,
	};

	let threshold = match matches.value_of("threshold") {
		Some(name) => Threshold::parse(name)
			.ok_or_else(|| invalid_value(format!("invalid error threshold '{}'", name)))?,
		None => Threshold::default(),
	};

	Ok(
		Command::Run(
			Args {
				path: matches.value_of_os("FILE").map(PathBuf::from),
				limit,
				threshold,
				stats: matches.is_present("stats"),
			}
		)
	)
}


fn invalid_value(message: String) -> clap::Error {
	clap::Error::with_description(&message, clap::ErrorKind::InvalidValue)
}
