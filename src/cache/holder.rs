use std::sync::Arc;

use crate::{
	definition::{Construction, DefId},
	symbol::Symbol,
	value::Value,
};
use super::Key;


/// The value slot of a holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
	/// In the cache, but not yet instantiated.
	Uncomputed,
	/// A computed value. Nil stands for an absent result.
	Computed(Value),
}


/// A cached value, with the definitions and arguments that produced it.
#[derive(Debug, Clone)]
pub struct Holder {
	/// The definition as requested, before alias resolution.
	pub nominal: Option<DefId>,
	/// The definition actually constructed.
	pub def: Option<DefId>,
	pub args: Arc<[Value]>,
	pub slot: Slot,
}


impl Holder {
	/// A placeholder for a value being computed.
	pub fn uncomputed(def: Option<DefId>, args: Arc<[Value]>) -> Self {
		Self {
			nominal: def,
			def,
			args,
			slot: Slot::Uncomputed,
		}
	}


	pub fn computed(def: Option<DefId>, args: Arc<[Value]>, value: Option<Value>) -> Self {
		Self {
			slot: Slot::Computed(value.unwrap_or_default()),
			..Self::uncomputed(def, args)
		}
	}


	/// Set the nominal definition.
	pub fn nominal(self, nominal: DefId) -> Self {
		Self { nominal: Some(nominal), ..self }
	}


	pub fn is_computed(&self) -> bool {
		matches!(self.slot, Slot::Computed(_))
	}


	/// The computed value. Nil is reported as absent.
	pub fn value(&self) -> Option<Value> {
		match &self.slot {
			Slot::Computed(Value::Nil) | Slot::Uncomputed => None,
			Slot::Computed(value) => Some(value.clone()),
		}
	}
}


/// The state of a dynamic keep binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepState {
	/// Waiting for the first request of a matching name.
	Pending,
	/// The key expression is being evaluated.
	Resolving,
	/// Bound under the computed key.
	Resolved(Key),
}


/// A dynamic ("keep by") binding, created when the frame of the declaring definition is
/// pushed, and resolved the first time a matching name is requested.
#[derive(Debug, Clone)]
pub struct KeepHolder {
	/// The name under which the value is requested.
	pub keep_name: Symbol,
	/// The definition declaring the clause.
	pub owner: DefId,
	/// The kept names.
	pub sources: Vec<Symbol>,
	/// The key expression.
	pub by: Construction,
	pub table: Option<Symbol>,
	pub persist: bool,
	pub in_container: bool,
	pub state: KeepState,
}


impl KeepHolder {
	/// Whether a requested name refers to this binding: the same name, or a member of it.
	pub fn matches(&self, name: &str, keep_name: &str) -> bool {
		self.state == KeepState::Pending
			&& (
				name == keep_name
					|| (name.starts_with(keep_name) && name[keep_name.len() ..].starts_with('.'))
			)
	}
}
