/// Indexes below this value are issued only once per frame: after the counter wraps, it
/// restarts here.
pub const WRAP_FLOOR: i32 = 1024;


/// The loop index generator of a frame. Values produced by different passes of a repeated
/// construct are cached under keys suffixed with the active index.
///
/// Loops nest: each entered loop holds its own slot, and the innermost one is the active
/// index. Lookups fall back through the outer slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopIndex {
	counter: i32,
	active: Vec<i32>,
}


impl Default for LoopIndex {
	fn default() -> Self {
		Self { counter: -1, active: Vec::new() }
	}
}


impl LoopIndex {
	fn next(&mut self) -> i32 {
		self.counter = match self.counter {
			i32::MAX => WRAP_FLOOR,
			counter => counter + 1,
		};
		self.counter
	}


	/// Enter a loop, issuing its first index.
	pub fn enter(&mut self) -> i32 {
		let index = self.next();
		self.active.push(index);
		index
	}


	/// Issue the next index for the innermost loop, entering one if none is active.
	pub fn advance(&mut self) -> i32 {
		let index = self.next();
		match self.active.last_mut() {
			Some(slot) => *slot = index,
			None => self.active.push(index),
		}
		index
	}


	/// Leave the innermost loop, making the enclosing one active again.
	pub fn leave(&mut self) {
		self.active.pop();
	}


	/// Leave every loop.
	pub fn reset(&mut self) {
		self.active.clear();
	}


	/// The active index, if inside a loop.
	pub fn current(&self) -> Option<i32> {
		self.active.last().copied()
	}


	/// The indexes of all entered loops, innermost first.
	pub fn active(&self) -> impl Iterator<Item = i32> + '_ {
		self.active.iter().rev().copied()
	}
}


#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;


	#[test]
	fn test_advance_is_unique() {
		let mut index = LoopIndex::default();
		assert_eq!(index.current(), None);

		let issued: HashSet<i32> = (0 .. 500).map(|_| index.advance()).collect();
		assert_eq!(issued.len(), 500);
		assert_eq!(index.current(), Some(499));

		index.reset();
		assert_eq!(index.current(), None);
		assert_eq!(index.advance(), 500);
	}


	#[test]
	fn test_wraparound_skips_floor() {
		let mut index = LoopIndex { counter: i32::MAX - 1, active: Vec::new() };

		assert_eq!(index.advance(), i32::MAX);
		assert_eq!(index.advance(), WRAP_FLOOR);
		assert!(index.advance() > WRAP_FLOOR);
	}


	#[test]
	fn test_nesting() {
		let mut index = LoopIndex::default();
		let outer = index.enter();
		let inner = index.enter();
		assert_ne!(outer, inner);
		assert_eq!(index.active().collect::<Vec<_>>(), vec![inner, outer]);

		let next = index.advance();
		assert_eq!(index.active().collect::<Vec<_>>(), vec![next, outer]);

		index.leave();
		assert_eq!(index.current(), Some(outer));
		index.leave();
		assert_eq!(index.current(), None);
		assert_eq!(index.active().count(), 0);
	}
}
