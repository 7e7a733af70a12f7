use std::collections::HashMap;

use crate::{
	host::{self, HostFun},
	symbol::{Interner, Symbol},
	value::Value,
};
use super::{
	Access,
	Catch,
	Construction,
	DefId,
	Definition,
	Durability,
	Instantiation,
	KeepClause,
	Kind,
	Primitive,
	Supertype,
	Table,
};


/// Incremental construction of a definition table.
/// The builder is used by the source loader, and directly by hosts embedding the runtime.
#[derive(Debug)]
pub struct Builder {
	interner: Interner,
	definitions: Vec<Definition>,
	hosts: HashMap<Symbol, HostFun>,
	root: DefId,
	main: Option<DefId>,
}


impl Builder {
	/// Create a builder for a site. The built-in host definitions are registered.
	pub fn new(site: &str) -> Self {
		let mut interner = Interner::new();
		let site = interner.get_or_intern(site);

		let root = Definition {
			name: site,
			owner: None,
			site,
			kind: Kind::Site,
			supertype: None,
			params: Vec::new().into(),
			body: Vec::new().into(),
			keeps: Vec::new(),
			catches: Vec::new(),
			durability: Durability::Dynamic,
			access: Access::Public,
			children: Vec::new(),
			next: None,
		};

		let mut builder = Self {
			interner,
			definitions: vec![root],
			hosts: HashMap::new(),
			root: DefId(0),
			main: None,
		};

		for fun in host::builtins() {
			builder.host(fun.clone());
		}

		builder
	}


	/// The site root.
	pub fn root(&self) -> DefId {
		self.root
	}


	/// Intern a name.
	pub fn symbol(&mut self, name: &str) -> Symbol {
		self.interner.get_or_intern(name)
	}


	/// Register a host implementation, replacing any implementation with the same name.
	pub fn host(&mut self, fun: HostFun) -> Symbol {
		let name = self.interner.get_or_intern(fun.name());
		self.hosts.insert(name, fun);
		name
	}


	/// Whether a host implementation is registered under the name.
	pub fn has_host(&self, name: Symbol) -> bool {
		self.hosts.contains_key(&name)
	}


	/// Declare a definition of the given kind in `owner`. Declaring a name twice in the same
	/// owner stacks the definitions: the latest is found first, and links to the previous one.
	pub fn define_kind(&mut self, owner: DefId, name: &str, kind: Kind) -> DefId {
		let name = match name {
			"" => Symbol::default(),
			name => self.interner.get_or_intern(name),
		};

		let id = DefId(self.definitions.len() as u32);

		let next = if name.is_anonymous() {
			None
		} else {
			self.definitions[owner.index()]
				.children
				.iter()
				.rev()
				.copied()
				.find(|child| self.definitions[child.index()].name == name)
		};

		let site = self.definitions[owner.index()].site;

		self.definitions.push(
			Definition {
				name,
				owner: Some(owner),
				site,
				kind,
				supertype: None,
				params: Vec::new().into(),
				body: Vec::new().into(),
				keeps: Vec::new(),
				catches: Vec::new(),
				durability: Durability::Dynamic,
				access: Access::Public,
				children: Vec::new(),
				next,
			}
		);

		self.definitions[owner.index()].children.push(id);

		id
	}


	/// Declare a named definition in `owner`.
	pub fn define(&mut self, owner: DefId, name: &str) -> DefId {
		self.define_kind(owner, name, Kind::Named)
	}


	/// Declare an anonymous definition in `owner`.
	pub fn anonymous(&mut self, owner: DefId, body: Vec<Construction>) -> DefId {
		let id = self.define_kind(owner, "", Kind::Anonymous);
		self.body(id, body);
		id
	}


	/// Declare an alias.
	pub fn alias(&mut self, owner: DefId, name: &str, target: Instantiation) -> DefId {
		self.define_kind(owner, name, Kind::Alias(target))
	}


	/// Declare a host-bound definition.
	pub fn external(&mut self, owner: DefId, name: &str, host: &str) -> DefId {
		let host = self.interner.get_or_intern(host);
		self.define_kind(owner, name, Kind::External(host))
	}


	/// Set the body constructions.
	pub fn body(&mut self, id: DefId, body: Vec<Construction>) -> &mut Self {
		self.definitions[id.index()].body = body.into();
		self
	}


	/// Set the parameter names.
	pub fn params(&mut self, id: DefId, params: &[&str]) -> &mut Self {
		let params: Vec<Symbol> = params
			.iter()
			.map(|param| self.interner.get_or_intern(param))
			.collect();

		self.definitions[id.index()].params = params.into();
		self
	}


	/// Set the supertype. Primitive type names are recognized.
	pub fn extends(&mut self, id: DefId, name: &str, args: Vec<Construction>) -> &mut Self {
		let supertype = match Primitive::parse(name) {
			Some(primitive) if args.is_empty() => Supertype::Primitive(primitive),
			_ => Supertype::Definition(self.instantiation(name, args)),
		};

		self.definitions[id.index()].supertype = Some(supertype);
		self
	}


	/// Add a keep clause.
	pub fn keep(&mut self, id: DefId, clause: KeepClause) -> &mut Self {
		self.definitions[id.index()].keeps.push(clause);
		self
	}


	/// Add a catch block. An empty location catches every redirection.
	pub fn catch(&mut self, id: DefId, location: &str, body: Vec<Construction>) -> &mut Self {
		let location = match location {
			"" => Symbol::default(),
			location => self.interner.get_or_intern(location),
		};

		self.definitions[id.index()].catches.push(Catch { location, body: body.into() });
		self
	}


	/// Set the durability.
	pub fn durability(&mut self, id: DefId, durability: Durability) -> &mut Self {
		self.definitions[id.index()].durability = durability;
		self
	}


	/// Set the access level.
	pub fn access(&mut self, id: DefId, access: Access) -> &mut Self {
		self.definitions[id.index()].access = access;
		self
	}


	/// Set the entry point.
	pub fn main(&mut self, id: DefId) -> &mut Self {
		self.main = Some(id);
		self
	}


	/// Build an instantiation of a possibly qualified name.
	pub fn instantiation(&mut self, name: &str, args: Vec<Construction>) -> Instantiation {
		let path: Vec<Symbol> = name
			.split('.')
			.map(|part| self.interner.get_or_intern(part))
			.collect();

		Instantiation {
			path: path.into(),
			args: args.into(),
			indexes: Vec::new().into(),
		}
	}


	/// A construction instantiating a name without arguments.
	pub fn call(&mut self, name: &str) -> Construction {
		self.instantiation(name, Vec::new()).into()
	}


	/// A construction instantiating a name with arguments.
	pub fn call_with(&mut self, name: &str, args: Vec<Construction>) -> Construction {
		self.instantiation(name, args).into()
	}


	/// A literal construction.
	pub fn text(value: &str) -> Construction {
		Construction::Value(Value::from(value))
	}


	/// Finish the table.
	pub fn build(self) -> Table {
		Table {
			interner: self.interner,
			definitions: self.definitions,
			hosts: self.hosts,
			root: self.root,
			main: self.main,
		}
	}
}
