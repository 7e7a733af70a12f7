use std::{
	collections::HashMap,
	fmt::{self, Debug},
	sync::Arc,
};

use parking_lot::{Mutex, MutexGuard};

use super::{Holder, KeepHolder, Key, Pointer};


/// A cache entry: a value, or an indirection to where the value lives.
#[derive(Debug, Clone)]
pub enum Entry {
	Held(Arc<Holder>),
	Pointer(Pointer),
}


/// A key to value mapping, plus the keep map binding names to pointers.
#[derive(Debug, Clone, Default)]
pub struct Tier {
	pub entries: HashMap<Key, Entry>,
	pub keeps: HashMap<Key, Pointer>,
	/// Dynamic keep bindings declared by the frame owning this tier.
	pub dynamic: Vec<KeepHolder>,
}


impl Tier {
	/// Copy the entries missing in this tier from another one.
	pub fn merge(&mut self, entries: HashMap<Key, Entry>) {
		for (key, entry) in entries {
			self.entries.entry(key).or_insert(entry);
		}
	}


	/// Whether the key is bound in the keep map.
	pub fn is_kept(&self, key: &str) -> bool {
		self.keeps.contains_key(key)
	}
}


/// A tier shared between frames, contexts and threads. All operations lock the tier.
#[derive(Clone, Default)]
pub struct SharedTier(Arc<Mutex<Tier>>);


impl SharedTier {
	pub fn new() -> Self {
		Self::default()
	}


	pub fn lock(&self) -> MutexGuard<Tier> {
		self.0.lock()
	}


	/// Whether both handles refer to the same tier.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}


	/// A new tier with a copy of the current contents.
	pub fn snapshot(&self) -> Self {
		let tier = self.lock().clone();
		Self(Arc::new(Mutex::new(tier)))
	}
}


impl From<Tier> for SharedTier {
	fn from(tier: Tier) -> Self {
		Self(Arc::new(Mutex::new(tier)))
	}
}


// Tiers may point to themselves, so only the address is shown.
impl Debug for SharedTier {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "SharedTier({:p})", Arc::as_ptr(&self.0))
	}
}


/// The per-namespace tier registry. Site tiers and collection tiers are registered by
/// qualified name.
#[derive(Debug, Clone, Default)]
pub struct Sites(Arc<Mutex<HashMap<Key, SharedTier>>>);


impl Sites {
	/// Get the tier for a name, creating an empty one if missing.
	pub fn tier(&self, name: &str) -> SharedTier {
		self.tier_or_else(name, Tier::default)
	}


	/// Get the tier for a name, creating one with the given contents if missing.
	pub fn tier_or_else<F>(&self, name: &str, seed: F) -> SharedTier
	where
		F: FnOnce() -> Tier,
	{
		self.0
			.lock()
			.entry(name.into())
			.or_insert_with(|| seed().into())
			.clone()
	}


	/// The number of registered tiers.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}


	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
