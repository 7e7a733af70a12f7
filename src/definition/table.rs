use std::collections::HashMap;

use crate::{
	host::HostFun,
	symbol::{Interner, Symbol},
};
use super::{Construction, DefId, Definition, Durability, KeepClause, Kind, Supertype};


/// Bound to the alias chains followed by `concrete`, guarding against cyclic aliases.
const MAX_ALIAS_DEPTH: usize = 32;


/// The table of resolved definitions. Tables are immutable once built, and shared by every
/// context constructing from them.
#[derive(Debug)]
pub struct Table {
	pub(super) interner: Interner,
	pub(super) definitions: Vec<Definition>,
	pub(super) hosts: HashMap<Symbol, HostFun>,
	pub(super) root: DefId,
	pub(super) main: Option<DefId>,
}


impl Table {
	/// The symbol interner for the names in this table.
	pub fn interner(&self) -> &Interner {
		&self.interner
	}


	/// The site root.
	pub fn root(&self) -> DefId {
		self.root
	}


	/// The entry point, if one was declared.
	pub fn main(&self) -> Option<DefId> {
		self.main
	}


	/// Get a definition.
	/// Panics if the id belongs to another table.
	pub fn get(&self, id: DefId) -> &Definition {
		&self.definitions[id.index()]
	}


	/// Get a symbol for a name, if any definition or parameter uses it.
	pub fn symbol(&self, name: &str) -> Option<Symbol> {
		self.interner.get(name)
	}


	/// The plain name of a definition.
	pub fn name(&self, id: DefId) -> &str {
		self.interner.name(self.get(id).name)
	}


	/// The dotted name of a definition, from its site root.
	pub fn qualified_name(&self, id: DefId) -> String {
		let mut names = Vec::new();
		let mut current = Some(id);

		while let Some(def) = current {
			let definition = self.get(def);
			names.push(self.interner.name(definition.name));
			current = definition.owner;
		}

		names.reverse();
		names.join(".")
	}


	/// Get a host implementation.
	pub fn host(&self, name: Symbol) -> Option<&HostFun> {
		self.hosts.get(&name)
	}


	/// The lexical owner of a definition.
	pub fn owning_scope(&self, id: DefId) -> Option<DefId> {
		self.get(id).owner
	}


	/// Whether the definition is a site root.
	pub fn is_site(&self, id: DefId) -> bool {
		matches!(self.get(id).kind, Kind::Site)
	}


	/// The parameter names of a definition. Every definition has a single parameter list,
	/// regardless of the number of arguments.
	pub fn parameters_for(&self, id: DefId, _args: usize) -> &[Symbol] {
		&self.get(id).params
	}


	/// The body constructions.
	pub fn body_constructions(&self, id: DefId) -> &[Construction] {
		&self.get(id).body
	}


	/// The durability of a definition.
	pub fn durability(&self, id: DefId) -> Durability {
		self.get(id).durability
	}


	/// The keep clauses of a definition.
	pub fn keep_clauses(&self, id: DefId) -> &[KeepClause] {
		&self.get(id).keeps
	}


	/// Whether the body of the definition delegates to a subtype override.
	pub fn has_sub(&self, id: DefId) -> bool {
		fn contains_sub(constructions: &[Construction]) -> bool {
			constructions
				.iter()
				.any(
					|construction| match construction {
						Construction::Sub => true,
						Construction::Concat(items) => contains_sub(items),
						Construction::Each(each) => contains_sub(&each.body),
						_ => false,
					}
				)
		}

		contains_sub(&self.get(id).body)
	}


	/// The definition of the supertype, if the supertype is a definition and it can be
	/// resolved. Supertypes are looked up from the owner of the definition.
	pub fn superdefinition(&self, id: DefId) -> Option<DefId> {
		let definition = self.get(id);

		match &definition.supertype {
			Some(Supertype::Definition(instantiation)) => {
				let scope = definition.owner.unwrap_or(self.root);

				// A definition extending its own name extends the one it shadows.
				match self.lookup_path(scope, &instantiation.path)? {
					found if found == id => definition.next,
					found => Some(found),
				}
			}

			_ => None,
		}
	}


	/// Follow argument-less aliases to the definition actually being entered.
	pub fn concrete(&self, id: DefId) -> DefId {
		let mut current = id;

		for _ in 0 .. MAX_ALIAS_DEPTH {
			match &self.get(current).kind {
				Kind::Alias(target) if target.args.is_empty() && target.indexes.is_empty() => {
					let scope = self.get(current).owner.unwrap_or(self.root);
					match self.lookup_path(scope, &target.path) {
						Some(next) if next != current => current = next,
						_ => return current,
					}
				}

				_ => return current,
			}
		}

		current
	}


	/// A direct child of a definition. Later declarations shadow earlier ones.
	pub fn child(&self, id: DefId, name: Symbol) -> Option<DefId> {
		self.get(id)
			.children
			.iter()
			.rev()
			.copied()
			.find(|&child| self.get(child).name == name)
	}


	/// A child of a definition, or of any of its supertypes. Local children of supertypes are
	/// not visible.
	pub fn member(&self, id: DefId, name: Symbol) -> Option<DefId> {
		if let Some(child) = self.child(id, name) {
			return Some(child);
		}

		let mut current = self.superdefinition(id);
		let mut depth = 0;

		while let Some(def) = current {
			if depth == MAX_ALIAS_DEPTH {
				break;
			}

			let def = self.concrete(def);

			if let Some(child) = self.child(def, name) {
				if self.get(child).access == super::Access::Public {
					return Some(child);
				}
			}

			current = self.superdefinition(def);
			depth += 1;
		}

		None
	}


	/// Whether a definition declares a child with the given name.
	pub fn declares_child(&self, id: DefId, name: Symbol) -> bool {
		self.member(id, name).is_some()
	}


	/// Lexical lookup: the members of the scope, then the members of each enclosing owner.
	pub fn lookup(&self, scope: DefId, name: Symbol) -> Option<DefId> {
		let mut current = Some(scope);

		while let Some(def) = current {
			if let Some(found) = self.member(def, name) {
				return Some(found);
			}

			current = self.get(def).owner;
		}

		None
	}


	/// Lookup a qualified path: the head lexically, the rest as members.
	pub fn lookup_path(&self, scope: DefId, path: &[Symbol]) -> Option<DefId> {
		let (head, tail) = path.split_first()?;
		let mut found = self.lookup(scope, *head)?;

		for name in tail {
			found = self.member(self.concrete(found), *name)?;
		}

		Some(found)
	}


	/// Whether `id` is `other`, or reaches `other` through its supertype chain.
	pub fn equals_or_extends(&self, id: DefId, other: DefId) -> bool {
		let mut current = Some(id);
		let mut depth = 0;

		while let Some(def) = current {
			if depth > MAX_ALIAS_DEPTH {
				return false;
			}

			if def == other || self.concrete(def) == other {
				return true;
			}

			current = self.superdefinition(self.concrete(def));
			depth += 1;
		}

		false
	}


	/// Whether `scope` is `id` or one of its lexical owners.
	pub fn is_owned_by(&self, id: DefId, scope: DefId) -> bool {
		let mut current = Some(id);

		while let Some(def) = current {
			if def == scope {
				return true;
			}

			current = self.get(def).owner;
		}

		false
	}


	/// The site root owning a definition.
	pub fn site_root(&self, id: DefId) -> DefId {
		let mut current = id;

		while let Some(owner) = self.get(current).owner {
			current = owner;
		}

		current
	}
}
