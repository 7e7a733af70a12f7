use std::sync::Arc;

use crate::{
	cache::{self, key, Entry, Holder, Key, Lookup, Pointer},
	definition::{DefId, Durability},
	signal::Signal,
	symbol::Symbol,
	value::Value,
};
use super::{Context, Frame, FrameId, LoopIndex};


/// The outcome of a cache lookup along the frame chain.
#[derive(Debug)]
pub(crate) enum Found {
	/// A computed value.
	Held(Arc<Holder>),
	/// A keep binding without a value, found the given number of frames above the top.
	Pending { pointer: Pointer, depth: usize },
	Missing,
}


impl Context {
	/// The keys under which a name is looked up in a frame: suffixed with each of the frame's
	/// active loop indexes, innermost first, then bare.
	fn lookup_keys(&self, id: FrameId, base: &Key) -> Vec<Key> {
		let mut keys: Vec<Key> = self
			.loops
			.get(&id)
			.into_iter()
			.flat_map(LoopIndex::active)
			.map(|index| key::looped(base, index))
			.collect();

		keys.push(base.clone());
		keys
	}


	/// The key under which a value is stored in a frame. Names bound by keeps are never
	/// suffixed.
	fn store_key(&self, id: FrameId, frame: &Frame, base: &Key) -> Key {
		match self.frame_loop(id) {
			Some(index) if !frame.tier.lock().is_kept(base) => key::looped(base, index),
			_ => base.clone(),
		}
	}


	/// Look up a key from the top frame down. The search stops at the first frame whose
	/// definition declares the name, as values cached further down would be shadowed.
	pub(crate) fn lookup_data(&self, name: Option<Symbol>, base: &Key, local_only: bool) -> Result<Found, Signal> {
		for (depth, (id, frame)) in self.frames().into_iter().enumerate() {
			let mut pending = None;

			for key in self.lookup_keys(id, base) {
				match cache::resolve(&frame.tier, &key)? {
					Lookup::Held(holder) => {
						log::debug!("cache hit '{}' at depth {}", key, frame.depth);
						return Ok(Found::Held(holder));
					}

					Lookup::Vacant { via: Some(pointer) } if pending.is_none() => pending = Some(pointer),

					Lookup::Vacant { .. } => (),
				}
			}

			if let Some(pointer) = pending {
				return Ok(Found::Pending { pointer, depth });
			}

			if local_only {
				break;
			}

			if let Some(name) = name {
				if self.table.declares_child(frame.def, name) {
					break;
				}
			}
		}

		log::debug!("cache miss '{}'", base);

		Ok(Found::Missing)
	}


	/// Store a holder in the top frame, wherever its pointers lead. Then, for up to
	/// `max_levels` frames below (unbounded if negative), store it where the frame declares the
	/// name or keeps it.
	pub(crate) fn put(&self, name: Option<Symbol>, base: &Key, holder: Arc<Holder>, max_levels: isize) -> Result<(), Signal> {
		let mut frames = self.frames().into_iter();

		let (top_id, top) = match frames.next() {
			Some(top) => top,
			None => return Ok(()),
		};

		let key = self.store_key(top_id, &top, base);
		let (tier, location) = cache::store(&top.tier, &key, holder.clone())?;

		log::debug!("put '{}' at depth {}", key, top.depth);

		let mut levels = max_levels;

		for (id, frame) in frames {
			if levels == 0 {
				break;
			}

			let key = self.store_key(id, &frame, base);
			let kept = frame.tier.lock().is_kept(&key);
			let declared = name.map_or(false, |name| self.table.declares_child(frame.def, name));

			if kept || declared {
				let (target, target_key) = cache::locate(&frame.tier, &key)?;

				if !(target.ptr_eq(&tier) && target_key == location) {
					if kept {
						target.lock().entries.insert(target_key, Entry::Held(holder.clone()));
					} else {
						let pointer = Pointer::to(tier.clone(), location.clone());
						frame.tier.lock().entries.insert(key, Entry::Pointer(pointer));
					}

					log::debug!("propagated '{}' to depth {}", base, frame.depth);
				}
			}

			if levels > 0 {
				levels -= 1;
			}
		}

		Ok(())
	}


	/// How many frames a value constructed for `def` must be propagated: the distance to the
	/// frame of the scope owning the definition, or zero if that scope is not in the stack.
	/// A frame counts as the owner's when its definition is the owner or extends it.
	/// Definitions owned by a site root reach the outermost frame of that site instead.
	pub fn max_keep_levels(&self, def: DefId) -> usize {
		let owner = match self.table.owning_scope(def) {
			Some(owner) => owner,
			None => return 0,
		};

		let frames = self.frames();

		let levels = if self.table.is_site(owner) {
			frames
				.iter()
				.rposition(|(_, frame)| self.table.site_root(frame.def) == owner)
		} else {
			frames
				.iter()
				.position(|(_, frame)| self.table.equals_or_extends(frame.def, owner))
		};

		levels.unwrap_or(0)
	}


	/// The key of a definition in the global tier.
	pub(crate) fn global_key(&self, def: DefId, args: &[Value], indexes: &[Value]) -> Key {
		key::base(&self.table.qualified_name(def), args, indexes)
	}


	/// Look up a value in the top frame only.
	pub fn get_local_data(&self, name: &str, args: &[Value], indexes: &[Value]) -> Result<Option<Arc<Holder>>, Signal> {
		let base = key::base(name, args, indexes);

		match self.lookup_data(self.table.symbol(name), &base, true)? {
			Found::Held(holder) => Ok(Some(holder)),
			_ => Ok(None),
		}
	}


	/// Look up a value along the frame chain. When the definition is known and global, the
	/// global tier is consulted as well.
	pub fn get_data(
		&self,
		def: Option<DefId>,
		name: &str,
		args: &[Value],
		indexes: &[Value],
	) -> Result<Option<Arc<Holder>>, Signal> {
		let base = key::base(name, args, indexes);

		if let Found::Held(holder) = self.lookup_data(self.table.symbol(name), &base, false)? {
			return Ok(Some(holder));
		}

		match def {
			Some(def) if self.table.durability(def) == Durability::Global => {
				let key = self.global_key(def, args, indexes);

				match cache::resolve(&self.global, &key)? {
					Lookup::Held(holder) => Ok(Some(holder)),
					Lookup::Vacant { .. } => Ok(None),
				}
			}

			_ => Ok(None),
		}
	}


	/// Store a value in the top frame, propagating it `max_levels` frames down (unbounded if
	/// negative). Values of global definitions are stored in the global tier too.
	pub fn put_data(
		&mut self,
		def: Option<DefId>,
		name: &str,
		args: &[Value],
		indexes: &[Value],
		value: Option<Value>,
		max_levels: isize,
	) -> Result<(), Signal> {
		let base = key::base(name, args, indexes);
		let holder = Arc::new(Holder::computed(def, args.into(), value));

		if let Some(def) = def {
			if self.table.durability(def) == Durability::Global {
				let key = self.global_key(def, args, indexes);
				cache::store(&self.global, &key, holder.clone())?;
			}
		}

		self.put(self.table.symbol(name), &base, holder, max_levels)
	}
}
