use std::{
	fmt::{self, Display},
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};

use crate::{cache::SharedTier, signal::Threshold};


/// The default bound on the construction stack depth.
pub const DEFAULT_SIZE_LIMIT: usize = 250;


/// Defaults for the contexts created from a runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Settings {
	pub size_limit: usize,
	pub threshold: Threshold,
}


impl Default for Settings {
	fn default() -> Self {
		Self {
			size_limit: DEFAULT_SIZE_LIMIT,
			threshold: Threshold::default(),
		}
	}
}


/// Diagnostic counters. Not part of any correctness contract.
#[derive(Debug, Default)]
struct Counters {
	frames_created: AtomicU64,
	frames_cloned: AtomicU64,
	frames_recycled: AtomicU64,
	contexts_cloned: AtomicU64,
}


/// A snapshot of the diagnostic counters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Stats {
	pub frames_created: u64,
	pub frames_cloned: u64,
	pub frames_recycled: u64,
	pub contexts_cloned: u64,
}


impl Display for Stats {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		writeln!(f, "frames created:  {}", self.frames_created)?;
		writeln!(f, "frames cloned:   {}", self.frames_cloned)?;
		writeln!(f, "frames recycled: {}", self.frames_recycled)?;
		write!(f, "contexts cloned: {}", self.contexts_cloned)
	}
}


/// The process-wide runtime handle. Every context is created from a runtime, and shares
/// its global tier. Runtimes are isolated from each other.
#[derive(Debug)]
pub struct Runtime {
	global: SharedTier,
	settings: Settings,
	state: AtomicU64,
	counters: Counters,
}


impl Runtime {
	pub fn new(settings: Settings) -> Arc<Self> {
		Arc::new(
			Self {
				global: SharedTier::new(),
				settings,
				state: AtomicU64::new(0),
				counters: Counters::default(),
			}
		)
	}


	/// The process-global cache tier.
	pub fn global(&self) -> &SharedTier {
		&self.global
	}


	pub fn settings(&self) -> Settings {
		self.settings
	}


	/// A fresh state id, used to tell frames apart across branches.
	pub(crate) fn next_state(&self) -> u64 {
		self.state.fetch_add(1, Ordering::Relaxed) + 1
	}


	pub(crate) fn frame_created(&self) {
		self.counters.frames_created.fetch_add(1, Ordering::Relaxed);
	}


	pub(crate) fn frame_cloned(&self) {
		self.counters.frames_cloned.fetch_add(1, Ordering::Relaxed);
	}


	pub(crate) fn frames_recycled(&self, count: usize) {
		self.counters.frames_recycled.fetch_add(count as u64, Ordering::Relaxed);
	}


	pub(crate) fn context_cloned(&self) {
		self.counters.contexts_cloned.fetch_add(1, Ordering::Relaxed);
	}


	pub fn stats(&self) -> Stats {
		let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

		Stats {
			frames_created: load(&self.counters.frames_created),
			frames_cloned: load(&self.counters.frames_cloned),
			frames_recycled: load(&self.counters.frames_recycled),
			contexts_cloned: load(&self.counters.contexts_cloned),
		}
	}
}
