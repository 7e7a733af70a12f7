automod::dir!("src/host");

use std::{
	fmt::{self, Debug},
	sync::Arc,
};

use crate::{
	context::Context,
	definition::DefId,
	signal::Signal,
	value::Value,
};


/// The arguments of a host call.
pub struct Call<'a> {
	/// The calling context. The frame of the external definition is on top.
	pub context: &'a mut Context,
	/// The external definition being constructed.
	pub def: DefId,
	/// The evaluated arguments.
	pub args: Vec<Value>,
}


impl<'a> Call<'a> {
	/// Report invalid arguments. Whether this aborts the construction depends on the error
	/// threshold of the context.
	pub fn invalid(&self, message: String) -> Result<Option<Value>, Signal> {
		self.context.unresolvable(format!("{}: {}", self.context.table().qualified_name(self.def), message))
	}
}


/// A definition implemented by the host, rather than by constructions.
pub trait Host: Send + Sync + 'static {
	/// The name under which external definitions refer to this implementation.
	fn name(&self) -> &'static str;

	/// Produce the value.
	fn call(&self, call: Call) -> Result<Option<Value>, Signal>;
}


/// A shared host implementation.
#[derive(Clone)]
pub struct HostFun(Arc<dyn Host>);


impl HostFun {
	pub fn name(&self) -> &'static str {
		self.0.name()
	}


	pub fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		self.0.call(call)
	}
}


impl<H: Host> From<H> for HostFun {
	fn from(host: H) -> Self {
		Self(Arc::new(host))
	}
}


impl Debug for HostFun {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "<host {}>", self.name())
	}
}


inventory::collect!(HostFun);


/// The built-in host implementations.
pub fn builtins() -> impl Iterator<Item = &'static HostFun> {
	inventory::iter::<HostFun>.into_iter()
}
