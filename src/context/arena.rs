use std::sync::Arc;

use super::Frame;


/// The index of a frame in its arena. The generation tells apart frames that reuse the same
/// slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameId {
	index: u32,
	generation: u32,
}


#[derive(Debug)]
struct Slot {
	generation: u32,
	/// How many contexts, side stacks and frames refer to this frame.
	links: u32,
	frame: Option<Arc<Frame>>,
}


/// The frames of a context tree. Frames link to their previous frame by id, and branches
/// created by cloning share the frames below their tops.
#[derive(Debug, Default)]
pub struct Arena {
	slots: Vec<Slot>,
	free: Vec<u32>,
	live: usize,
}


impl Arena {
	/// Store a new frame, with a single link. The link to the previous frame held by the
	/// caller is transferred to the new frame.
	pub fn alloc(&mut self, frame: Frame) -> FrameId {
		let frame = Some(Arc::new(frame));
		self.live += 1;

		match self.free.pop() {
			Some(index) => {
				let slot = &mut self.slots[index as usize];
				slot.links = 1;
				slot.frame = frame;
				FrameId { index, generation: slot.generation }
			}

			None => {
				let index = self.slots.len() as u32;
				self.slots.push(Slot { generation: 0, links: 1, frame });
				FrameId { index, generation: 0 }
			}
		}
	}


	fn slot_mut(&mut self, id: FrameId) -> &mut Slot {
		match self.slots.get_mut(id.index as usize) {
			Some(slot) if slot.generation == id.generation && slot.frame.is_some() => slot,
			_ => panic!("stale frame id {:?}", id),
		}
	}


	/// Get a frame.
	/// Panics if the frame was reclaimed.
	pub fn get(&self, id: FrameId) -> Arc<Frame> {
		match self.slots.get(id.index as usize) {
			Some(Slot { generation, frame: Some(frame), .. }) if *generation == id.generation => frame.clone(),
			_ => panic!("stale frame id {:?}", id),
		}
	}


	/// Whether the id refers to a live frame.
	pub fn contains(&self, id: FrameId) -> bool {
		matches!(
			self.slots.get(id.index as usize),
			Some(Slot { generation, frame: Some(_), .. }) if *generation == id.generation
		)
	}


	/// Add a link to a frame.
	pub fn retain(&mut self, id: FrameId) {
		self.slot_mut(id).links += 1;
	}


	/// Drop a link to a frame. Frames left without links are reclaimed, and so on down the
	/// chain. Returns how many frames were reclaimed.
	pub fn release(&mut self, id: FrameId) -> usize {
		let mut reclaimed = 0;
		let mut current = Some(id);

		while let Some(id) = current {
			let slot = self.slot_mut(id);
			slot.links -= 1;

			if slot.links > 0 {
				break;
			}

			current = slot.frame.take().and_then(|frame| frame.previous);
			slot.generation = slot.generation.wrapping_add(1);

			self.free.push(id.index);
			self.live -= 1;
			reclaimed += 1;
		}

		reclaimed
	}


	/// The number of live frames.
	pub fn live(&self) -> usize {
		self.live
	}
}
