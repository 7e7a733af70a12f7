mod arena;
mod construct;
mod data;
mod frame;
mod keep;
mod loops;

use std::{
	collections::HashMap,
	sync::Arc,
};

use parking_lot::Mutex;

use crate::{
	cache::{SharedTier, Sites},
	definition::{Construction, DefId, Table},
	fmt::Show,
	runtime::Runtime,
	signal::{Overflow, Redirection, Signal, Threshold},
	value::Value,
};
pub use arena::{Arena, FrameId};
pub use frame::Frame;
pub use loops::{LoopIndex, WRAP_FLOOR};


/// The construction context: a stack of frames, which may branch into a tree by cloning.
/// A context is driven by a single construction at a time, but the cache tiers it reaches
/// may be shared with other contexts and threads.
#[derive(Debug)]
pub struct Context {
	runtime: Arc<Runtime>,
	table: Arc<Table>,
	arena: Arc<Mutex<Arena>>,
	root: FrameId,
	top: FrameId,
	/// Frames temporarily removed from the top, to be restored in order.
	unpushed: Vec<FrameId>,
	size_limit: usize,
	threshold: Threshold,
	sites: Sites,
	global: SharedTier,
	loops: HashMap<FrameId, LoopIndex>,
}


impl Context {
	/// Create a context for a definition table, with a root frame for the site root.
	pub fn new(runtime: Arc<Runtime>, table: Arc<Table>) -> Self {
		let settings = runtime.settings();
		let tier = SharedTier::new();
		let root_def = table.root();

		let frame = Frame {
			def: root_def,
			nominal: root_def,
			continuation: None,
			params: Vec::new().into(),
			args: Vec::new().into(),
			arg_scope: None,
			tier: tier.clone(),
			keep_tier: tier,
			previous: None,
			depth: 0,
			state: runtime.next_state(),
		};

		let mut arena = Arena::default();
		let root = arena.alloc(frame);
		arena.retain(root);
		runtime.frame_created();

		Self {
			global: runtime.global().clone(),
			runtime,
			table,
			arena: Arc::new(Mutex::new(arena)),
			root,
			top: root,
			unpushed: Vec::new(),
			size_limit: settings.size_limit,
			threshold: settings.threshold,
			sites: Sites::default(),
			loops: HashMap::new(),
		}
	}


	pub fn runtime(&self) -> &Arc<Runtime> {
		&self.runtime
	}


	pub fn table(&self) -> &Table {
		&self.table
	}


	pub fn threshold(&self) -> Threshold {
		self.threshold
	}


	pub fn set_threshold(&mut self, threshold: Threshold) {
		self.threshold = threshold;
	}


	pub fn size_limit(&self) -> usize {
		self.size_limit
	}


	pub fn set_size_limit(&mut self, limit: usize) {
		self.size_limit = limit;
	}


	/// The current depth of the stack. The root frame has depth zero.
	pub fn size(&self) -> usize {
		self.peek().depth
	}


	/// The id of the top frame.
	pub fn top(&self) -> FrameId {
		self.top
	}


	/// The top frame.
	pub fn peek(&self) -> Arc<Frame> {
		self.frame(self.top)
	}


	/// The state id of the top frame.
	pub fn state(&self) -> u64 {
		self.peek().state
	}


	/// The per-namespace tier registry of this context tree.
	pub fn sites(&self) -> &Sites {
		&self.sites
	}


	/// The process-global tier.
	pub fn global(&self) -> &SharedTier {
		&self.global
	}


	pub(crate) fn frame(&self, id: FrameId) -> Arc<Frame> {
		self.arena.lock().get(id)
	}


	/// The frames from the top down to the root.
	pub(crate) fn frames(&self) -> Vec<(FrameId, Arc<Frame>)> {
		let arena = self.arena.lock();
		let mut frames = Vec::new();
		let mut current = Some(self.top);

		while let Some(id) = current {
			let frame = arena.get(id);
			current = frame.previous;
			frames.push((id, frame));
		}

		frames
	}


	/// Push a frame for a definition, with the arguments evaluated in the current top frame.
	/// When `new_scope` is false, the frame continues the construction of the object in the
	/// current top frame.
	pub fn push(&mut self, def: DefId, args: Arc<[Construction]>, new_scope: bool) -> Result<(), Overflow> {
		let scope = self.top;
		self.push_frame(def, args, Some(scope), new_scope)
	}


	pub(crate) fn push_frame(
		&mut self,
		def: DefId,
		args: Arc<[Construction]>,
		arg_scope: Option<FrameId>,
		new_scope: bool,
	) -> Result<(), Overflow> {
		let concrete = self.table.concrete(def);
		let top = self.peek();
		let depth = top.depth + 1;

		if depth > self.size_limit {
			log::debug!("stack overflow pushing {}", Show(concrete, self.table.as_ref()));
			return Err(Overflow { limit: self.size_limit });
		}

		let tier = SharedTier::new();
		let keep_tier = self
			.keep_tier_for(concrete)
			.unwrap_or_else(|| tier.clone());

		let frame = Frame {
			def: concrete,
			nominal: def,
			continuation: if new_scope { None } else { Some(top.def) },
			params: self.table.parameters_for(concrete, args.len()).into(),
			args,
			arg_scope,
			tier,
			keep_tier,
			previous: Some(self.top),
			depth,
			state: self.runtime.next_state(),
		};

		// The context's link to the previous top moves to the new frame.
		self.top = self.arena.lock().alloc(frame);
		self.runtime.frame_created();

		log::trace!(
			"push {} (depth {}{})",
			Show(concrete, self.table.as_ref()),
			depth,
			if new_scope { "" } else { ", continuation" },
		);

		self.bind_keeps(concrete, def);

		Ok(())
	}


	/// The tier of the innermost frame whose definition lexically owns `def`.
	fn keep_tier_for(&self, def: DefId) -> Option<SharedTier> {
		let owner = self.table.owning_scope(def)?;

		self.frames()
			.into_iter()
			.find(|(_, frame)| self.table.is_owned_by(owner, frame.def))
			.map(|(_, frame)| frame.tier.clone())
	}


	/// Pop the top frame. Entries computed by a continuation frame are merged into the
	/// frame of the object it continues.
	/// Panics if the top frame is the root.
	pub fn pop(&mut self) {
		let popped = self.top;
		let frame = self.peek();

		let previous = match frame.previous {
			Some(previous) => previous,
			None => panic!("attempt to pop the root frame"),
		};

		let below = self.frame(previous);

		if frame.continuation == Some(below.def) && !frame.tier.ptr_eq(&below.tier) {
			let entries = frame.tier.lock().entries.clone();
			below.tier.lock().merge(entries);
		}

		let reclaimed = {
			let mut arena = self.arena.lock();
			arena.retain(previous);
			arena.release(popped)
		};

		self.loops.remove(&popped);
		self.top = previous;
		self.runtime.frames_recycled(reclaimed);

		log::trace!("pop {} (depth {})", Show(frame.def, self.table.as_ref()), frame.depth);
	}


	/// Temporarily detach the top frame.
	/// Panics if the top frame is the root.
	pub fn unpush(&mut self) {
		let frame = self.peek();

		let previous = match frame.previous {
			Some(previous) => previous,
			None => panic!("attempt to unpush the root frame"),
		};

		self.arena.lock().retain(previous);
		self.unpushed.push(self.top);
		self.top = previous;

		log::trace!("unpush {}", Show(frame.def, self.table.as_ref()));
	}


	/// Restore the last detached frame.
	/// Panics if there is no detached frame, or if the top changed since it was detached.
	pub fn repush(&mut self) {
		let id = match self.unpushed.pop() {
			Some(id) => id,
			None => panic!("attempt to repush without a detached frame"),
		};

		let frame = self.frame(id);
		assert_eq!(frame.previous, Some(self.top), "repushed frame is not above the top");

		self.arena.lock().release(self.top);
		self.top = id;

		log::trace!("repush {}", Show(frame.def, self.table.as_ref()));
	}


	/// Run `f` with the given number of frames detached, restoring them afterwards.
	pub(crate) fn unpushed<T, F>(&mut self, count: usize, f: F) -> T
	where
		F: FnOnce(&mut Self) -> T,
	{
		for _ in 0 .. count {
			self.unpush();
		}

		let result = f(self);

		for _ in 0 .. count {
			self.repush();
		}

		result
	}


	/// How many frames lie above the given one, if it is in the current stack.
	pub(crate) fn hops_to(&self, id: FrameId) -> Option<usize> {
		self.frames()
			.iter()
			.position(|(frame, _)| *frame == id)
	}


	/// Create a sibling context.
	/// When `clear_cache` is set, the sibling starts from a new root frame with empty tiers,
	/// sharing only the process-global tier. Otherwise, it shares the frames below the top
	/// and every tier they reach, and gets a copy of the top frame and its local tier, along
	/// with the loop indexes active in the shared frames.
	pub fn clone(&self, clear_cache: bool) -> Self {
		self.runtime.context_cloned();

		if clear_cache {
			let mut context = Self::new(self.runtime.clone(), self.table.clone());
			context.size_limit = self.size_limit;
			context.threshold = self.threshold;
			return context;
		}

		let top = self.peek();
		let shared = self.frames();

		let (root, new_top) = {
			let mut arena = self.arena.lock();

			let tier = top.tier.snapshot();
			let keep_tier = if top.keep_tier.ptr_eq(&top.tier) {
				tier.clone()
			} else {
				top.keep_tier.clone()
			};

			let new_top = arena.alloc(Frame { tier, keep_tier, ..(*top).clone() });

			// At the root, the copy is also the clone's root.
			let root = match top.previous {
				None => new_top,
				Some(previous) => {
					arena.retain(previous);
					self.root
				}
			};
			arena.retain(root);

			(root, new_top)
		};

		self.runtime.frame_cloned();

		let loops = shared
			.iter()
			.filter_map(
				|(id, _)| {
					let index = self.loops.get(id)?.clone();
					let id = if *id == self.top { new_top } else { *id };
					Some((id, index))
				}
			)
			.collect();

		Self {
			runtime: self.runtime.clone(),
			table: self.table.clone(),
			arena: self.arena.clone(),
			root,
			top: new_top,
			unpushed: Vec::new(),
			size_limit: self.size_limit,
			threshold: self.threshold,
			sites: self.sites.clone(),
			global: self.global.clone(),
			loops,
		}
	}


	/// Contexts of one tree share the frame arena, even when their roots were copied apart.
	fn same_tree(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.arena, &other.arena)
	}


	/// Whether this context's state is an ancestor of, or the same as, the other's, on the
	/// same branch.
	pub fn equals_or_precedes(&self, other: &Self) -> bool {
		if !self.same_tree(other) {
			return false;
		}

		let state = self.state();

		other
			.frames()
			.iter()
			.any(|(_, frame)| frame.state == state)
	}


	/// The loop index generator of a frame.
	pub(crate) fn loop_of(&mut self, id: FrameId) -> &mut LoopIndex {
		self.loops.entry(id).or_default()
	}


	/// The active loop index of a frame.
	pub(crate) fn frame_loop(&self, id: FrameId) -> Option<i32> {
		self.loops.get(&id).and_then(LoopIndex::current)
	}


	/// The active loop index of the innermost repeated construct.
	pub fn loop_index(&self) -> Option<i32> {
		self.frames()
			.iter()
			.find_map(|(id, _)| self.frame_loop(*id))
	}


	/// Report an unresolvable reference. Depending on the error threshold, this is either
	/// escalated to a redirection or degraded to an absent value.
	pub fn unresolvable(&self, message: String) -> Result<Option<Value>, Signal> {
		if self.threshold.aborts_unresolvable() {
			Err(Redirection::error(message).into())
		} else {
			log::warn!("{}", message);
			Ok(None)
		}
	}
}


impl PartialEq for Context {
	fn eq(&self, other: &Self) -> bool {
		self.same_tree(other)
			&& self.state() == other.state()
			&& self.loops.get(&self.top).and_then(LoopIndex::current)
				== other.loops.get(&other.top).and_then(LoopIndex::current)
	}
}


impl Drop for Context {
	fn drop(&mut self) {
		let mut arena = self.arena.lock();
		let mut reclaimed = arena.release(self.top);

		for id in self.unpushed.drain(..) {
			reclaimed += arena.release(id);
		}

		reclaimed += arena.release(self.root);
		self.runtime.frames_recycled(reclaimed);
	}
}


#[cfg(test)]
mod tests;
