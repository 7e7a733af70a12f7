use std::{
	collections::BTreeMap,
	fmt::{self, Display},
	fs::File,
	io,
	path::Path,
};

use serde::Deserialize;

use crate::value::Value;
use super::{
	Access,
	Builder,
	Construction,
	DefId,
	Durability,
	Each,
	Instantiation,
	KeepClause,
	Kind,
	Redirect,
	Table,
};


/// A definition table source, in its JSON form.
#[derive(Debug)]
pub struct Source {
	/// The origin path, may be something fictional like `<stdin>`.
	pub path: Box<Path>,
	/// The source text.
	pub contents: Box<[u8]>,
}


impl Source {
	/// Load the source from a file path.
	pub fn from_path<P>(path: P) -> io::Result<Self>
	where
		P: Into<Box<Path>>,
	{
		let path = path.into();
		let file = File::open(&path)?;
		Self::from_reader(path, file)
	}


	/// Load the source from a std::io::Read.
	/// The path argument may be anything, including fictional paths like `<stdin>`.
	pub fn from_reader<P, R>(path: P, mut reader: R) -> io::Result<Self>
	where
		P: Into<Box<Path>>,
		R: io::Read,
	{
		let path = path.into();
		let mut contents = Vec::with_capacity(512);
		reader.read_to_end(&mut contents)?;

		Ok(
			Self {
				path,
				contents: contents.into_boxed_slice(),
			}
		)
	}


	/// Parse the source and build the definition table.
	pub fn load(&self) -> Result<Table, LoadError> {
		let site: SiteSource = serde_json::from_slice(&self.contents)
			.map_err(|error| LoadError::Json(self.path.clone(), error))?;

		log::debug!(
			"loading site '{}' from {} ({} definitions)",
			site.site,
			self.path.display(),
			site.definitions.len()
		);

		let mut builder = Builder::new(&site.site);
		let root = builder.root();

		for definition in &site.definitions {
			definition.declare(&mut builder, root)?;
		}

		if let Some(main) = &site.main {
			let table = builder.build();
			let main = table
				.symbol(main)
				.and_then(|symbol| table.child(root, symbol))
				.ok_or_else(|| LoadError::Invalid(format!("undefined main definition '{}'", main)))?;

			return Ok(Table { main: Some(main), ..table });
		}

		Ok(builder.build())
	}
}


/// Errors produced while loading a definition table.
#[derive(Debug)]
pub enum LoadError {
	Io(io::Error),
	Json(Box<Path>, serde_json::Error),
	Invalid(String),
}


impl From<io::Error> for LoadError {
	fn from(error: io::Error) -> Self {
		Self::Io(error)
	}
}


impl Display for LoadError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Io(error) => write!(f, "{}", error),
			Self::Json(path, error) => write!(f, "{}: {}", path.display(), error),
			Self::Invalid(message) => write!(f, "{}", message),
		}
	}
}


impl std::error::Error for LoadError { }


#[derive(Debug, Deserialize)]
struct SiteSource {
	site: String,
	#[serde(default)]
	main: Option<String>,
	#[serde(default)]
	definitions: Vec<DefinitionSource>,
}


#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionSource {
	#[serde(default)]
	name: String,
	#[serde(default)]
	params: Vec<String>,
	#[serde(default)]
	extends: Option<InstanceSource>,
	#[serde(default)]
	body: Vec<ConstructionSource>,
	#[serde(default)]
	children: Vec<DefinitionSource>,
	#[serde(default)]
	keep: Vec<KeepSource>,
	#[serde(default)]
	catch: Vec<CatchSource>,
	#[serde(default)]
	durability: Durability,
	#[serde(default)]
	access: Access,
	#[serde(default)]
	alias: Option<InstanceSource>,
	#[serde(default)]
	elements: Option<Vec<ConstructionSource>>,
	#[serde(default)]
	entries: Option<BTreeMap<String, ConstructionSource>>,
	#[serde(default)]
	element: Option<ElementSource>,
	#[serde(default)]
	host: Option<String>,
}


impl DefinitionSource {
	fn kind(&self, builder: &mut Builder) -> Result<Kind, LoadError> {
		let kinds = [
			self.alias.is_some(),
			self.elements.is_some(),
			self.entries.is_some(),
			self.element.is_some(),
			self.host.is_some(),
		];

		if kinds.iter().filter(|&&kind| kind).count() > 1 {
			return Err(
				LoadError::Invalid(format!("definition '{}' has more than one kind", self.name))
			);
		}

		if let Some(alias) = &self.alias {
			return Ok(Kind::Alias(alias.build(builder)));
		}

		if let Some(elements) = &self.elements {
			let elements: Vec<Construction> = elements
				.iter()
				.map(|element| element.build(builder))
				.collect();
			return Ok(Kind::Collection(elements.into()));
		}

		if let Some(entries) = &self.entries {
			let entries: Vec<(Value, Construction)> = entries
				.iter()
				.map(|(key, entry)| (Value::from(key.as_str()), entry.build(builder)))
				.collect();
			return Ok(Kind::Table(entries.into()));
		}

		if let Some(element) = &self.element {
			return Ok(
				Kind::Element {
					collection: element.collection.build(builder),
					index: element.index.build(builder),
				}
			);
		}

		if let Some(host) = &self.host {
			let host = builder.symbol(host);

			if !builder.has_host(host) {
				return Err(
					LoadError::Invalid(format!("definition '{}' uses an unknown host", self.name))
				);
			}

			return Ok(Kind::External(host));
		}

		if self.name.is_empty() {
			Ok(Kind::Anonymous)
		} else {
			Ok(Kind::Named)
		}
	}


	fn declare(&self, builder: &mut Builder, owner: DefId) -> Result<DefId, LoadError> {
		let kind = self.kind(builder)?;
		let id = builder.define_kind(owner, &self.name, kind);

		let params: Vec<&str> = self.params.iter().map(String::as_str).collect();
		builder.params(id, &params);

		let body: Vec<Construction> = self.body
			.iter()
			.map(|construction| construction.build(builder))
			.collect();
		builder
			.body(id, body)
			.durability(id, self.durability)
			.access(id, self.access);

		if let Some(extends) = &self.extends {
			let args = extends.args(builder);
			builder.extends(id, extends.name(), args);
		}

		for keep in &self.keep {
			let clause = keep.build(builder);
			builder.keep(id, clause);
		}

		for catch in &self.catch {
			let body = catch.body
				.iter()
				.map(|construction| construction.build(builder))
				.collect();
			builder.catch(id, &catch.location, body);
		}

		for child in &self.children {
			child.declare(builder, id)?;
		}

		Ok(id)
	}
}


#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstanceSource {
	Name(String),
	Full {
		name: String,
		#[serde(default)]
		args: Vec<ConstructionSource>,
		#[serde(default)]
		indexes: Vec<ConstructionSource>,
	},
}


impl InstanceSource {
	fn name(&self) -> &str {
		match self {
			Self::Name(name) => name,
			Self::Full { name, .. } => name,
		}
	}


	fn args(&self, builder: &mut Builder) -> Vec<Construction> {
		match self {
			Self::Name(_) => Vec::new(),
			Self::Full { args, .. } => args
				.iter()
				.map(|arg| arg.build(builder))
				.collect(),
		}
	}


	fn build(&self, builder: &mut Builder) -> Instantiation {
		let args = self.args(builder);
		let mut instantiation = builder.instantiation(self.name(), args);

		if let Self::Full { indexes, .. } = self {
			let indexes: Vec<Construction> = indexes
				.iter()
				.map(|index| index.build(builder))
				.collect();
			instantiation.indexes = indexes.into();
		}

		instantiation
	}
}


/// Plain strings are text, unless they name one of the unit statements. Use the `value`
/// form for text such as "super".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConstructionSource {
	Tagged(TaggedSource),
	Text(String),
	Number(serde_json::Number),
	Bool(bool),
}


#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedSource {
	Value(serde_json::Value),
	Call(InstanceSource),
	Super,
	Sub,
	Next,
	Redirect {
		location: Box<ConstructionSource>,
		#[serde(default)]
		message: Option<Box<ConstructionSource>>,
		#[serde(default = "default_status")]
		status: u16,
	},
	Each {
		var: String,
		over: Box<ConstructionSource>,
		body: Vec<ConstructionSource>,
	},
	Concat(Vec<ConstructionSource>),
}


fn default_status() -> u16 {
	302
}


impl ConstructionSource {
	fn build(&self, builder: &mut Builder) -> Construction {
		let tagged = match self {
			Self::Text(text) => return Construction::Value(Value::from(text.as_str())),
			Self::Number(number) => return Construction::Value(
				Value::from(&serde_json::Value::Number(number.clone()))
			),
			Self::Bool(b) => return Construction::Value(Value::Bool(*b)),
			Self::Tagged(tagged) => tagged,
		};

		match tagged {
			TaggedSource::Value(value) => Construction::Value(Value::from(value)),
			TaggedSource::Call(instance) => Construction::Instance(instance.build(builder)),
			TaggedSource::Super => Construction::Super,
			TaggedSource::Sub => Construction::Sub,
			TaggedSource::Next => Construction::Next,

			TaggedSource::Redirect { location, message, status } => Construction::Redirect(
				Box::new(
					Redirect {
						location: location.build(builder),
						message: message.as_ref().map(|message| message.build(builder)),
						status: *status,
					}
				)
			),

			TaggedSource::Each { var, over, body } => {
				let var = builder.symbol(var);
				let over = over.build(builder);
				let body: Vec<Construction> = body
					.iter()
					.map(|construction| construction.build(builder))
					.collect();

				Construction::Each(Box::new(Each { var, over, body: body.into() }))
			}

			TaggedSource::Concat(items) => {
				let items: Vec<Construction> = items
					.iter()
					.map(|item| item.build(builder))
					.collect();

				Construction::Concat(items.into())
			}
		}
	}
}


#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct KeepSource {
	names: Vec<String>,
	#[serde(rename = "as")]
	alias: Option<String>,
	by: Option<ConstructionSource>,
	#[serde(rename = "in")]
	table: Option<String>,
	persist: bool,
	in_container: bool,
	as_self: bool,
}


impl KeepSource {
	fn build(&self, builder: &mut Builder) -> KeepClause {
		KeepClause {
			names: self.names
				.iter()
				.map(|name| builder.symbol(name))
				.collect(),
			alias: self.alias.as_ref().map(|alias| builder.symbol(alias)),
			by: self.by.as_ref().map(|by| by.build(builder)),
			table: self.table.as_ref().map(|table| builder.symbol(table)),
			persist: self.persist,
			in_container: self.in_container,
			as_self: self.as_self,
		}
	}
}


#[derive(Debug, Deserialize)]
struct CatchSource {
	#[serde(default)]
	location: String,
	body: Vec<ConstructionSource>,
}


#[derive(Debug, Deserialize)]
struct ElementSource {
	collection: InstanceSource,
	index: ConstructionSource,
}
