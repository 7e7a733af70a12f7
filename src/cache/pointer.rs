use crate::{definition::DefId, symbol::Symbol};
use super::{Key, SharedTier};


/// A cache indirection: the value for a key lives under another key, in another tier.
#[derive(Debug, Clone)]
pub struct Pointer {
	/// The definition constructing the value, when known.
	pub def: Option<DefId>,
	/// The name the definition is looked up by, when the definition is not known.
	pub source: Option<Symbol>,
	pub key: Key,
	pub tier: SharedTier,
}


impl Pointer {
	/// A bare pointer to a location.
	pub fn to(tier: SharedTier, key: Key) -> Self {
		Self {
			def: None,
			source: None,
			key,
			tier,
		}
	}
}
