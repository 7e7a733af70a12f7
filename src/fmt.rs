/// A Display-like trait that takes an additional context when formatting.
/// This is needed to have access to the definition table or the symbol interner when
/// formatting frames, definitions or names.
pub trait Display<'a> {
	/// The format context.
	type Context: 'a;

	fn fmt(&self, f: &mut std::fmt::Formatter<'_>, context: Self::Context) -> std::fmt::Result;
}


impl<'a, T> Display<'a> for &T
where
	T: Display<'a>,
{
	type Context = T::Context;

	fn fmt(&self, f: &mut std::fmt::Formatter<'_>, context: Self::Context) -> std::fmt::Result {
		(*self).fmt(f, context)
	}
}


/// An adapter to use std::fmt::Display with the contextual Display.
#[derive(Debug)]
pub struct Show<T, C>(pub T, pub C);


impl<'a, T, C> std::fmt::Display for Show<T, C>
where
	T: Display<'a, Context = C>,
	C: Copy,
{
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		self.0.fmt(f, self.1)
	}
}


/// Format a sequence of items with a separator.
pub fn sep_by<T, I, F, S>(
	mut iter: I,
	f: &mut std::fmt::Formatter,
	mut format: F,
	separator: S,
) -> std::fmt::Result
where
	I: Iterator<Item = T>,
	F: FnMut(T, &mut std::fmt::Formatter) -> std::fmt::Result,
	S: std::fmt::Display,
{
	if let Some(item) = iter.next() {
		format(item, f)?;
	}

	for item in iter {
		separator.fmt(f)?;
		format(item, f)?;
	}

	Ok(())
}

