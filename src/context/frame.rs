use std::sync::Arc;

use crate::{
	cache::SharedTier,
	definition::{Construction, DefId},
	symbol::Symbol,
};
use super::FrameId;


/// One level of the construction stack. Frames are immutable once stored in the arena;
/// branching copies the frame instead.
#[derive(Debug, Clone)]
pub struct Frame {
	/// The definition being constructed, after alias resolution.
	pub def: DefId,
	/// The definition as requested.
	pub nominal: DefId,
	/// When set, the frame continues the construction of the object in the previous frame,
	/// which has this definition, instead of starting a new scope.
	pub continuation: Option<DefId>,
	pub params: Arc<[Symbol]>,
	/// The argument constructions, evaluated lazily.
	pub args: Arc<[Construction]>,
	/// The frame in which the arguments are evaluated.
	pub arg_scope: Option<FrameId>,
	/// The local cache tier.
	pub tier: SharedTier,
	/// The tier of the innermost frame lexically owning the definition. Keeps are stored
	/// there.
	pub keep_tier: SharedTier,
	pub previous: Option<FrameId>,
	/// The number of frames below this one.
	pub depth: usize,
	pub state: u64,
}


impl Frame {
	/// Whether the frame starts a new object scope.
	pub fn is_new_scope(&self) -> bool {
		self.continuation.is_none()
	}
}
