mod holder;
pub mod key;
mod pointer;
mod tier;

use crate::signal::PointerChainExceeded;
pub use holder::{Holder, KeepHolder, KeepState, Slot};
pub use key::Key;
pub use pointer::Pointer;
pub use tier::{Entry, SharedTier, Sites, Tier};


/// Maximum number of pointers followed when resolving a key. Longer chains indicate a
/// corrupted cache.
pub const MAX_POINTER_HOPS: usize = 10;


/// The outcome of resolving a key in a tier.
#[derive(Debug, Clone)]
pub enum Lookup {
	/// A computed value.
	Held(std::sync::Arc<Holder>),
	/// No computed value. If the key is bound to a pointer, it is the first one found, which
	/// carries the definition to construct.
	Vacant { via: Option<Pointer> },
}


/// The first pointer bound to a key: the keep map is consulted before the entries.
fn first_pointer(tier: &SharedTier, key: &str) -> (Option<Pointer>, Option<Entry>) {
	let tier = tier.lock();

	match tier.keeps.get(key) {
		Some(pointer) => (Some(pointer.clone()), None),
		None => match tier.entries.get(key) {
			Some(Entry::Pointer(pointer)) => (Some(pointer.clone()), None),
			Some(entry) => (None, Some(entry.clone())),
			None => (None, None),
		},
	}
}


/// Resolve a key, following pointers. Only one tier is locked at a time.
pub fn resolve(tier: &SharedTier, key: &str) -> Result<Lookup, PointerChainExceeded> {
	let (mut pointer, entry) = first_pointer(tier, key);

	if let Some(Entry::Held(holder)) = entry {
		return Ok(
			if holder.is_computed() {
				Lookup::Held(holder)
			} else {
				Lookup::Vacant { via: None }
			}
		);
	}

	let via = pointer.clone();
	let mut hops = 0;

	while let Some(current) = pointer {
		if hops == MAX_POINTER_HOPS {
			return Err(PointerChainExceeded { key: key.into(), hops: MAX_POINTER_HOPS });
		}
		hops += 1;

		let entry = current.tier.lock().entries.get(&current.key).cloned();

		pointer = match entry {
			Some(Entry::Pointer(next)) => Some(next),
			Some(Entry::Held(holder)) if holder.is_computed() => return Ok(Lookup::Held(holder)),
			_ => None,
		};
	}

	Ok(Lookup::Vacant { via })
}


/// The location where a value for the key is actually stored: the end of the pointer
/// chain, or the key itself.
pub fn locate(tier: &SharedTier, key: &Key) -> Result<(SharedTier, Key), PointerChainExceeded> {
	let (mut pointer, _) = first_pointer(tier, key);
	let mut location = (tier.clone(), key.clone());
	let mut hops = 0;

	while let Some(current) = pointer {
		if hops == MAX_POINTER_HOPS {
			return Err(PointerChainExceeded { key: key.clone(), hops: MAX_POINTER_HOPS });
		}
		hops += 1;

		pointer = match current.tier.lock().entries.get(&current.key) {
			Some(Entry::Pointer(next)) => Some(next.clone()),
			_ => None,
		};

		location = (current.tier, current.key);
	}

	Ok(location)
}


/// Store a holder wherever the key's pointers lead.
pub fn store(tier: &SharedTier, key: &Key, holder: std::sync::Arc<Holder>) -> Result<(SharedTier, Key), PointerChainExceeded> {
	let (target, key) = locate(tier, key)?;
	target.lock().entries.insert(key.clone(), Entry::Held(holder));
	Ok((target, key))
}
