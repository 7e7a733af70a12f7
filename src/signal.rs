use std::{
	fmt::{self, Display},
	sync::Arc,
};

use crate::{cache::Key, term::color};


/// The location used when an error is escalated to a redirection.
pub const ERROR_LOCATION: &str = "error";


/// A structured, recoverable signal, carrying a target location. Catch blocks intercept
/// redirections by location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
	pub location: Arc<str>,
	pub message: Option<Arc<str>>,
	pub status: u16,
}


impl Redirection {
	pub fn new(location: &str, message: Option<&str>, status: u16) -> Self {
		Self {
			location: location.into(),
			message: message.map(Into::into),
			status,
		}
	}


	/// An internal error escalated to a redirection.
	pub fn error(message: String) -> Self {
		Self {
			location: ERROR_LOCATION.into(),
			message: Some(message.into()),
			status: 500,
		}
	}
}


impl Display for Redirection {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "redirection to '{}' ({})", self.location, self.status)?;

		if let Some(message) = &self.message {
			write!(f, ": {}", message)?;
		}

		Ok(())
	}
}


/// Construction stack depth exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overflow {
	pub limit: usize,
}


impl Display for Overflow {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "stack overflow (limit {})", self.limit)
	}
}


impl std::error::Error for Overflow { }


/// A cache pointer chain did not terminate within the bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerChainExceeded {
	pub key: Key,
	pub hops: usize,
}


impl Display for PointerChainExceeded {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "cache pointer chain for '{}' exceeds {} hops", self.key, self.hops)
	}
}


impl std::error::Error for PointerChainExceeded { }


/// Everything that aborts a construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
	/// Recoverable, may be intercepted by a catch block.
	Redirection(Redirection),
	/// Runaway recursion. Fatal.
	Overflow(Overflow),
	/// Cache corruption. Fatal.
	PointerChain(PointerChainExceeded),
}


impl Signal {
	pub fn redirect(location: &str, message: Option<&str>, status: u16) -> Self {
		Self::Redirection(Redirection::new(location, message, status))
	}


	pub fn overflow(limit: usize) -> Self {
		Self::Overflow(Overflow { limit })
	}


	/// Whether the signal can't be intercepted.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Self::Redirection(_))
	}
}


impl From<Redirection> for Signal {
	fn from(redirection: Redirection) -> Self {
		Self::Redirection(redirection)
	}
}


impl From<Overflow> for Signal {
	fn from(overflow: Overflow) -> Self {
		Self::Overflow(overflow)
	}
}


impl From<PointerChainExceeded> for Signal {
	fn from(error: PointerChainExceeded) -> Self {
		Self::PointerChain(error)
	}
}


impl Display for Signal {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Redirection(redirection) => {
				write!(f, "{}: {}", color::Fg(color::Yellow, "Redirect"), redirection)
			}

			Self::Overflow(overflow) => {
				write!(f, "{}: {}", color::Fg(color::Red, "Fatal"), overflow)
			}

			Self::PointerChain(error) => {
				write!(f, "{}: {}", color::Fg(color::Red, "Fatal"), error)
			}
		}
	}
}


impl std::error::Error for Signal { }


/// How severe a condition must be to abort a construction.
/// Conditions at or below `Ignorable` abort when the threshold is at most `Ignorable`;
/// higher thresholds degrade them to absent values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Threshold {
	Everything,
	Ignorable,
	Dubious,
	FatalOnly,
}


impl Threshold {
	/// Parse a threshold name, as given on the command line.
	pub fn parse(name: &str) -> Option<Self> {
		match name {
			"everything" => Some(Self::Everything),
			"ignorable" => Some(Self::Ignorable),
			"dubious" => Some(Self::Dubious),
			"fatal" | "fatal-only" => Some(Self::FatalOnly),
			_ => None,
		}
	}


	/// Whether unresolvable references abort the construction.
	pub fn aborts_unresolvable(self) -> bool {
		self <= Self::Ignorable
	}
}


impl Default for Threshold {
	fn default() -> Self {
		Self::Ignorable
	}
}
