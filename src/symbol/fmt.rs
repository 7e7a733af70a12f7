use std::fmt::Display as _;

use super::{Interner, Symbol};
use crate::{
	fmt::Display,
	term::color,
};


impl<'a> Display<'a> for Symbol {
	type Context = &'a Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter<'_>, context: Self::Context) -> std::fmt::Result {
		if self.is_anonymous() {
			color::Fg(color::Yellow, "<anonymous>").fmt(f)
		} else {
			color::Fg(color::Green, context.name(*self)).fmt(f)
		}
	}
}
