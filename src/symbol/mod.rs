mod fmt;

use intaglio::{Symbol as SymbolInner, SymbolTable};


/// A symbol is a reference to a name stored in the symbol interner.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Symbol(SymbolInner);


/// The default symbol is a dummy symbol, which will yield "<anonymous>" when resolved.
/// Anonymous definitions are named with it.
impl Default for Symbol {
	fn default() -> Self {
		Self(SymbolInner::new(0))
	}
}


impl Symbol {
	/// Whether this is the dummy symbol.
	pub fn is_anonymous(self) -> bool {
		self == Self::default()
	}
}


/// A symbol interner, used to store definition, parameter and site names.
/// The interner is filled while loading a definition table, and is read-only afterwards,
/// which allows sharing it between threads.
#[derive(Debug)]
pub struct Interner(SymbolTable);


impl Interner {
	/// Create a new interner. Please note that this allocates memory even if no symbols are
	/// inserted.
	pub fn new() -> Self {
		let mut interner = SymbolTable::new();
		interner
			.intern("<anonymous>")
			.expect("failed to intern symbol");
		Self(interner)
	}


	/// Get the symbol for a name, if it was interned.
	pub fn get<T>(&self, value: T) -> Option<Symbol>
	where
		T: AsRef<str>,
	{
		self.0
			.check_interned(value.as_ref())
			.map(Symbol)
	}


	/// Get the symbol for a name. The name is interned if needed.
	pub fn get_or_intern<T>(&mut self, value: T) -> Symbol
	where
		T: AsRef<str>,
	{
		let value = value.as_ref().to_owned();

		Symbol(
			self.0
				.intern(value)
				.expect("failed to intern symbol")
		)
	}


	/// Resolve the string for a symbol.
	pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
		self.0.get(symbol.0)
	}


	/// Resolve the string for a symbol, falling back to a placeholder for foreign symbols.
	pub fn name(&self, symbol: Symbol) -> &str {
		self.resolve(symbol).unwrap_or("<invalid symbol>")
	}


	/// Get the number of interned strings.
	/// This does not include the dummy symbol.
	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.0.len() - 1
	}
}


impl Default for Interner {
	fn default() -> Self {
		Self::new()
	}
}


#[cfg(test)]
mod tests {
	use super::*;


	#[test]
	fn test_intern_resolve() {
		let mut interner = Interner::new();

		let page = interner.get_or_intern("page");
		let again = interner.get_or_intern("page");
		let title = interner.get_or_intern("title");

		assert_eq!(page, again);
		assert_ne!(page, title);
		assert_eq!(interner.len(), 2);
		assert_eq!(interner.resolve(title), Some("title"));
		assert_eq!(interner.get("page"), Some(page));
		assert_eq!(interner.get("missing"), None);
		assert!(Symbol::default().is_anonymous());
		assert_eq!(interner.name(Symbol::default()), "<anonymous>");
	}
}
