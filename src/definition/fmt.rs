use std::fmt::Display as _;

use super::{DefId, Instantiation, Kind, Table};
use crate::{
	fmt::{self, Display},
	term::color,
};


impl<'a> Display<'a> for DefId {
	type Context = &'a Table;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		let definition = context.get(*self);

		if definition.name.is_anonymous() {
			color::Fg(color::Yellow, "<anonymous>").fmt(f)?;
			write!(f, "#{}", self.0)?;
		} else {
			color::Fg(color::Green, context.qualified_name(*self)).fmt(f)?;
		}

		match &definition.kind {
			Kind::Alias(target) => write!(f, " = {}", fmt::Show(target, context)),
			Kind::External(host) => write!(f, " = host {}", context.interner().name(*host)),
			_ => Ok(()),
		}
	}
}


impl<'a> Display<'a> for Instantiation {
	type Context = &'a Table;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		fmt::sep_by(
			self.path.iter(),
			f,
			|name, f| fmt::Show(name, context.interner()).fmt(f),
			".",
		)?;

		if !self.args.is_empty() {
			write!(f, "({} args)", self.args.len())?;
		}

		Ok(())
	}
}
