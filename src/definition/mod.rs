mod builder;
mod fmt;
mod load;
mod table;

use std::sync::Arc;

use serde::Deserialize;

use crate::{symbol::Symbol, value::Value};
pub use builder::Builder;
pub use load::{LoadError, Source};
pub use table::Table;


/// The index of a definition in its table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefId(pub(crate) u32);


impl DefId {
	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}
}


/// Primitive types. Definitions extending a primitive type never delegate construction to
/// their supertype.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
	String,
	Int,
	Float,
	Boolean,
	Char,
}


impl Primitive {
	/// Parse a primitive type name.
	pub fn parse(name: &str) -> Option<Self> {
		match name {
			"string" => Some(Self::String),
			"int" => Some(Self::Int),
			"float" | "double" => Some(Self::Float),
			"boolean" => Some(Self::Boolean),
			"char" => Some(Self::Char),
			_ => None,
		}
	}
}


/// The supertype of a definition.
#[derive(Debug, Clone)]
pub enum Supertype {
	Primitive(Primitive),
	Definition(Instantiation),
}


/// Whether the value of a definition may be cached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
	/// Recomputed every time it is instantiated.
	Dynamic,
	/// Cached after the first construction, in the frames of its lexical scope.
	Static,
	/// Cached in the process-global tier.
	Global,
}


impl Default for Durability {
	fn default() -> Self {
		Self::Dynamic
	}
}


/// Visibility of a definition to lookups through supertypes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
	Public,
	Local,
}


impl Default for Access {
	fn default() -> Self {
		Self::Public
	}
}


/// A reference to a definition by name, with argument constructions and element indexes.
/// Qualified names (`a.b.c`) are stored as a path.
#[derive(Debug, Clone)]
pub struct Instantiation {
	pub path: Arc<[Symbol]>,
	pub args: Arc<[Construction]>,
	pub indexes: Arc<[Construction]>,
}


impl Instantiation {
	/// A simple instantiation without arguments.
	pub fn named(name: Symbol) -> Self {
		Self {
			path: vec![name].into(),
			args: Vec::new().into(),
			indexes: Vec::new().into(),
		}
	}


	/// The last name in the path.
	pub fn name(&self) -> Symbol {
		*self.path.last().expect("empty instantiation path")
	}


	/// Whether the path has more than one name.
	pub fn is_qualified(&self) -> bool {
		self.path.len() > 1
	}
}


/// A redirection statement.
#[derive(Debug, Clone)]
pub struct Redirect {
	pub location: Construction,
	pub message: Option<Construction>,
	pub status: u16,
}


/// A repeated construct: the body is constructed once per element of `over`, with `var`
/// bound to the element.
#[derive(Debug, Clone)]
pub struct Each {
	pub var: Symbol,
	pub over: Construction,
	pub body: Arc<[Construction]>,
}


/// The constructions that make the body of a definition.
#[derive(Debug, Clone)]
pub enum Construction {
	/// A literal value.
	Value(Value),
	/// A name to be resolved and instantiated.
	Instance(Instantiation),
	/// Delegate to the supertype of the enclosing definition.
	Super,
	/// Delegate to the most derived override of the enclosing definition.
	Sub,
	/// Delegate to the next definition stacked under the same name.
	Next,
	/// Abort the construction with a redirection signal.
	Redirect(Box<Redirect>),
	/// A repeated construct.
	Each(Box<Each>),
	/// A group of constructions, concatenated.
	Concat(Arc<[Construction]>),
}


impl From<Value> for Construction {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}


impl From<Instantiation> for Construction {
	fn from(instantiation: Instantiation) -> Self {
		Self::Instance(instantiation)
	}
}


/// A keep directive, binding names to cache locations when a frame for the declaring
/// definition is pushed.
#[derive(Debug, Clone, Default)]
pub struct KeepClause {
	/// The kept names.
	pub names: Vec<Symbol>,
	/// The name under which the value is requested, if different from the kept name.
	pub alias: Option<Symbol>,
	/// The key expression of a dynamic keep.
	pub by: Option<Construction>,
	/// The table or collection holding the values.
	pub table: Option<Symbol>,
	/// Whether the value outlives the frame chain that computed it.
	pub persist: bool,
	/// Whether keys are qualified with the container's name.
	pub in_container: bool,
	/// Whether the clause keeps the value of the declaring definition itself.
	pub as_self: bool,
}


/// A catch block, intercepting redirections to the given location.
/// The anonymous location catches everything.
#[derive(Debug, Clone)]
pub struct Catch {
	pub location: Symbol,
	pub body: Arc<[Construction]>,
}


/// The variants of definitions.
#[derive(Debug, Clone)]
pub enum Kind {
	/// A namespace root.
	Site,
	/// A regular definition, constructed from its body.
	Named,
	/// A definition without a name.
	Anonymous,
	/// An array of constructions.
	Collection(Arc<[Construction]>),
	/// A keyed collection.
	Table(Arc<[(Value, Construction)]>),
	/// A definition standing for another one.
	Alias(Instantiation),
	/// A reference to an element of a collection.
	Element {
		collection: Instantiation,
		index: Construction,
	},
	/// A definition implemented by the host.
	External(Symbol),
}


/// A resolved definition.
#[derive(Debug, Clone)]
pub struct Definition {
	pub name: Symbol,
	pub owner: Option<DefId>,
	pub site: Symbol,
	pub kind: Kind,
	pub supertype: Option<Supertype>,
	pub params: Arc<[Symbol]>,
	pub body: Arc<[Construction]>,
	pub keeps: Vec<KeepClause>,
	pub catches: Vec<Catch>,
	pub durability: Durability,
	pub access: Access,
	pub children: Vec<DefId>,
	/// The definition stacked under this one with the same name.
	pub next: Option<DefId>,
}

