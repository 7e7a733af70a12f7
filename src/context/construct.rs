use std::{collections::BTreeMap, sync::Arc};

use crate::{
	cache::{self, key, Holder, Lookup},
	definition::{Construction, DefId, Durability, Each, Instantiation, Kind, Redirect, Supertype},
	fmt::Show,
	host::Call,
	signal::{Redirection, Signal},
	symbol::Symbol,
	value::Value,
};
use super::{data::Found, Context, Frame, FrameId};


impl Context {
	/// Construct a definition, with the argument constructions evaluated in the current top
	/// frame. The frame pushed for the definition is always popped, even on failure.
	pub fn construct(&mut self, def: DefId, args: Arc<[Construction]>) -> Result<Option<Value>, Signal> {
		let scope = self.top;
		self.construct_scoped(def, args, Some(scope))
	}


	pub(crate) fn construct_scoped(
		&mut self,
		def: DefId,
		args: Arc<[Construction]>,
		arg_scope: Option<FrameId>,
	) -> Result<Option<Value>, Signal> {
		self.push_frame(def, args, arg_scope, true)?;
		let result = self.construct_pushed();
		self.pop();
		result
	}


	/// Construct the top frame. Redirections are intercepted by the catch blocks of its
	/// definition, with the frame still pushed.
	fn construct_pushed(&mut self) -> Result<Option<Value>, Signal> {
		match self.construct_frame() {
			Err(Signal::Redirection(redirection)) => self.catch(redirection),
			result => result,
		}
	}


	fn catch(&mut self, redirection: Redirection) -> Result<Option<Value>, Signal> {
		let table = self.table.clone();
		let frame = self.peek();

		let catch = [frame.def, frame.nominal]
			.iter()
			.flat_map(|&def| table.get(def).catches.iter())
			.find(
				|catch| catch.location.is_anonymous()
					|| table.interner().name(catch.location) == &*redirection.location
			);

		match catch {
			Some(catch) => {
				log::debug!("{} caught by {}", redirection, Show(frame.def, table.as_ref()));
				self.construct_sequence(&catch.body)
			}

			None => Err(redirection.into()),
		}
	}


	/// Dispatch on the kind of the definition in the top frame.
	fn construct_frame(&mut self) -> Result<Option<Value>, Signal> {
		let table = self.table.clone();
		let frame = self.peek();

		match &table.get(frame.def).kind {
			// Aliases without arguments of their own were resolved when pushing.
			Kind::Alias(target) => self.instantiate(target),

			Kind::External(host) => {
				let fun = match table.host(*host) {
					Some(fun) => fun.clone(),
					None => return self.unresolvable(
						format!("no host implementation for {}", Show(frame.def, table.as_ref()))
					),
				};

				let args = self.frame_args(&frame)?;

				fun.call(Call { context: self, def: frame.def, args })
			}

			Kind::Collection(elements) => {
				let values = self.evaluate_all(elements)?;
				Ok(Some(values.into()))
			}

			Kind::Table(entries) => {
				let mut map = BTreeMap::new();

				for (key, construction) in entries.iter() {
					let value = self.evaluate(construction)?.unwrap_or_default();
					map.insert(key.clone(), value);
				}

				Ok(Some(map.into()))
			}

			Kind::Element { collection, index } => {
				let collection = self.instantiate(collection)?;
				let index = self.evaluate(index)?.unwrap_or_default();

				Ok(collection.and_then(|collection| collection.index(&index)))
			}

			Kind::Site | Kind::Named | Kind::Anonymous => self.construct_body(frame.def),
		}
	}


	/// Evaluate the arguments of a frame, in the frame they were written in.
	fn frame_args(&mut self, frame: &Frame) -> Result<Vec<Value>, Signal> {
		let mut args = Vec::with_capacity(frame.args.len());

		for arg in frame.args.iter() {
			args.push(self.evaluate_in(frame.arg_scope, arg)?.unwrap_or_default());
		}

		Ok(args)
	}


	/// Evaluate a construction with the frames above `scope` detached.
	fn evaluate_in(&mut self, scope: Option<FrameId>, construction: &Construction) -> Result<Option<Value>, Signal> {
		match scope.and_then(|scope| self.hops_to(scope)) {
			Some(0) | None => self.evaluate(construction),
			Some(hops) => self.unpushed(hops, |context| context.evaluate(construction)),
		}
	}


	/// Delegate to the supertype when it has an override slot, or when the definition has no
	/// body of its own.
	fn construct_body(&mut self, def: DefId) -> Result<Option<Value>, Signal> {
		match self.table.superdefinition(def) {
			Some(sup) if self.table.has_sub(self.table.concrete(sup))
				|| self.table.body_constructions(def).is_empty() => self.construct_super(def),

			_ => self.construct_own(def),
		}
	}


	fn construct_own(&mut self, def: DefId) -> Result<Option<Value>, Signal> {
		let body = self.table.get(def).body.clone();
		self.construct_sequence(&body)
	}


	/// Evaluate constructions in order. More than one produced fragment are concatenated
	/// into text.
	fn construct_sequence(&mut self, constructions: &[Construction]) -> Result<Option<Value>, Signal> {
		let mut fragments = Vec::new();

		for construction in constructions {
			if let Some(value) = self.evaluate(construction)? {
				fragments.push(value);
			}
		}

		Ok(
			match fragments.len() {
				0 | 1 => fragments.pop(),
				_ => Some(Value::concat(fragments)),
			}
		)
	}


	/// Construct the supertype of `def` as a continuation of the top frame. When the
	/// supertype is stacked over other definitions of the same name, the first one producing
	/// a value wins.
	pub(crate) fn construct_super(&mut self, def: DefId) -> Result<Option<Value>, Signal> {
		let sup = match self.table.superdefinition(def) {
			Some(sup) => sup,
			None => return self.unresolvable(
				format!("{} has no supertype", Show(def, self.table.as_ref()))
			),
		};

		let frame = self.peek();

		let (args, arg_scope) = match &self.table.get(def).supertype {
			Some(Supertype::Definition(supertype)) if !supertype.args.is_empty() => {
				(supertype.args.clone(), Some(self.top))
			}

			_ => (frame.args.clone(), frame.arg_scope),
		};

		let mut candidate = Some(sup);

		while let Some(current) = candidate {
			self.push_frame(current, args.clone(), arg_scope, false)?;
			let result = self.construct_frame();
			self.pop();

			if let Some(value) = result? {
				return Ok(Some(value));
			}

			candidate = self.table.get(current).next;
		}

		Ok(None)
	}


	/// The most derived definition overriding `def` in the object being constructed, and how
	/// many frames above its frame are.
	fn find_override(&self, def: DefId) -> Option<(usize, DefId)> {
		let mut found = None;

		for (hops, (_, frame)) in self.frames().iter().enumerate() {
			if frame.def != def && self.table.equals_or_extends(frame.def, def) {
				found = Some((hops, frame.def));
			}

			if frame.is_new_scope() {
				break;
			}
		}

		found
	}


	/// Delegate to the override of `def`: the given instantiated definition, or the most
	/// derived one in the object being constructed. The override's own body is evaluated in
	/// its frame.
	pub fn construct_sub(&mut self, def: DefId, instantiated: Option<DefId>) -> Result<Option<Value>, Signal> {
		let found = match instantiated {
			Some(target) => self
				.frames()
				.iter()
				.position(|(_, frame)| frame.def == target)
				.map(|hops| (hops, target)),

			None => self.find_override(def),
		};

		match found {
			Some((hops, sub)) => self.unpushed(hops, |context| context.construct_own(sub)),

			None => self.unresolvable(
				format!("no override of {} to delegate to", Show(def, self.table.as_ref()))
			),
		}
	}


	/// Construct the next definition stacked under the same name as the top frame's.
	fn construct_next(&mut self) -> Result<Option<Value>, Signal> {
		let frame = self.peek();

		let next = self.table
			.get(frame.def)
			.next
			.or_else(|| self.table.get(frame.nominal).next);

		match next {
			Some(next) => {
				self.push_frame(next, frame.args.clone(), frame.arg_scope, false)?;
				let result = self.construct_frame();
				self.pop();
				result
			}

			None => self.unresolvable(
				format!("{} has no next definition", Show(frame.def, self.table.as_ref()))
			),
		}
	}


	fn redirect(&mut self, redirect: &Redirect) -> Result<Option<Value>, Signal> {
		let location = self.evaluate(&redirect.location)?.unwrap_or_default().to_string();

		let message = match &redirect.message {
			Some(message) => self.evaluate(message)?.map(|message| message.to_string()),
			None => None,
		};

		log::debug!("redirect to '{}' ({})", location, redirect.status);

		Err(Signal::redirect(&location, message.as_deref(), redirect.status))
	}


	/// Construct the body once per element, binding the variable in the top frame under the
	/// key of the current pass.
	fn construct_each(&mut self, each: &Each) -> Result<Option<Value>, Signal> {
		let elements = self
			.evaluate(&each.over)?
			.map(|over| over.elements())
			.unwrap_or_default();

		let top = self.top;
		let base = key::base(self.table.interner().name(each.var), &[], &[]);

		let mut fragments = Vec::new();
		let mut result = Ok(());
		let mut entered = false;

		for element in elements {
			let index = if entered {
				self.loop_of(top).advance()
			} else {
				entered = true;
				self.loop_of(top).enter()
			};
			log::trace!("loop pass {}", index);

			let holder = Arc::new(Holder::computed(None, Vec::new().into(), Some(element)));

			let pass = self
				.put(Some(each.var), &base, holder, 0)
				.and_then(|()| self.construct_sequence(&each.body));

			match pass {
				Ok(Some(value)) => fragments.push(value),
				Ok(None) => (),
				Err(error) => {
					result = Err(error);
					break;
				}
			}
		}

		if entered {
			self.loop_of(top).leave();
		}
		result?;

		Ok(
			if fragments.is_empty() {
				None
			} else {
				Some(Value::concat(fragments))
			}
		)
	}


	/// Evaluate a construction in the top frame.
	pub fn evaluate(&mut self, construction: &Construction) -> Result<Option<Value>, Signal> {
		match construction {
			Construction::Value(value) => Ok(Some(value.clone())),

			Construction::Instance(instantiation) => self.instantiate(instantiation),

			Construction::Super => {
				let def = self.peek().def;
				self.construct_super(def)
			}

			Construction::Sub => {
				let def = self.peek().def;
				self.construct_sub(def, None)
			}

			Construction::Next => self.construct_next(),

			Construction::Redirect(redirect) => self.redirect(redirect),

			Construction::Each(each) => self.construct_each(each),

			Construction::Concat(items) => self.construct_sequence(items),
		}
	}


	fn evaluate_all(&mut self, constructions: &[Construction]) -> Result<Vec<Value>, Signal> {
		let mut values = Vec::with_capacity(constructions.len());

		for construction in constructions {
			values.push(self.evaluate(construction)?.unwrap_or_default());
		}

		Ok(values)
	}


	/// Resolve and produce the value of a name, then apply its indexes.
	pub fn instantiate(&mut self, instantiation: &Instantiation) -> Result<Option<Value>, Signal> {
		let value = if instantiation.is_qualified() {
			self.instantiate_path(instantiation)?
		} else {
			self.instantiate_name(instantiation)?
		};

		if instantiation.indexes.is_empty() {
			return Ok(value);
		}

		let indexes = self.evaluate_all(&instantiation.indexes)?;

		Ok(
			value.and_then(
				|value| indexes
					.iter()
					.try_fold(value, |value, index| value.index(index))
			)
		)
	}


	fn instantiate_name(&mut self, instantiation: &Instantiation) -> Result<Option<Value>, Signal> {
		let table = self.table.clone();
		let name = instantiation.name();
		let text = table.interner().name(name);

		if instantiation.args.is_empty() {
			if let Some(value) = self.parameter(name)? {
				return Ok(value);
			}
		}

		self.update_dynamic_keeps(text)?;

		let args = self.evaluate_all(&instantiation.args)?;
		let base = key::base(text, &args, &[]);

		let (def, kept, depth) = match self.lookup_data(Some(name), &base, false)? {
			Found::Held(holder) => return Ok(holder.value()),

			Found::Pending { pointer, depth } => {
				let def = pointer.def.or_else(
					|| pointer.source.and_then(|source| self.resolve_definition(source))
				);
				(def, true, depth)
			}

			Found::Missing => (self.resolve_definition(name), false, 0),
		};

		let def = match def {
			Some(def) => def,
			None => return self.unresolvable(format!("unresolved name '{}'", text)),
		};

		let durability = table.durability(def);
		let global_key = self.global_key(def, &args, &[]);

		if durability == Durability::Global {
			if let Lookup::Held(holder) = cache::resolve(&self.global, &global_key)? {
				return Ok(holder.value());
			}
		}

		let cacheable = kept
			|| durability != Durability::Dynamic
			|| table.keep_clauses(def).iter().any(|clause| clause.as_self);

		if !cacheable {
			return self.construct(def, instantiation.args.clone());
		}

		let levels = depth.max(self.max_keep_levels(def)) as isize;
		let args: Arc<[Value]> = args.into();

		self.put(Some(name), &base, Arc::new(Holder::uncomputed(Some(def), args.clone())), levels)?;

		let value = self.construct(def, instantiation.args.clone())?;

		let holder = Arc::new(
			Holder::computed(Some(table.concrete(def)), args, value.clone()).nominal(def)
		);

		if durability == Durability::Global {
			cache::store(&self.global, &global_key, holder.clone())?;
		}

		self.put(Some(name), &base, holder, levels)?;

		Ok(value)
	}


	/// A qualified name: either members of a value, or members of a definition.
	fn instantiate_path(&mut self, instantiation: &Instantiation) -> Result<Option<Value>, Signal> {
		let (head, tail) = match instantiation.path.split_first() {
			Some(split) => split,
			None => return Ok(None),
		};

		let table = self.table.clone();

		let path = instantiation.path
			.iter()
			.map(|name| table.interner().name(*name))
			.collect::<Vec<_>>()
			.join(".");

		self.update_dynamic_keeps(&path)?;

		let value = match self.parameter(*head)? {
			Some(value) => Some(value),
			None => {
				let base = key::base(table.interner().name(*head), &[], &[]);
				match self.lookup_data(Some(*head), &base, false)? {
					Found::Held(holder) => Some(holder.value()),
					// A kept head is produced under its binding, then its members are taken.
					Found::Pending { .. } => Some(self.instantiate_name(&Instantiation::named(*head))?),
					Found::Missing => None,
				}
			}
		};

		if let Some(value) = value {
			return Ok(
				value.and_then(
					|value| tail
						.iter()
						.try_fold(value, |value, name| value.index(&table.interner().name(*name).into()))
				)
			);
		}

		let caller = self.top;
		let mut pushed = 0;
		let result = self.instantiate_member(instantiation, caller, &mut pushed);

		for _ in 0 .. pushed {
			self.pop();
		}

		result
	}


	/// Push a frame for each object in the path, and construct the last member with the
	/// arguments evaluated in the caller's frame.
	fn instantiate_member(
		&mut self,
		instantiation: &Instantiation,
		caller: FrameId,
		pushed: &mut usize,
	) -> Result<Option<Value>, Signal> {
		let table = self.table.clone();
		let mut scope: Option<DefId> = None;

		for &name in instantiation.path.iter() {
			let def = match scope {
				None => self.resolve_definition(name),
				Some(scope) => table.member(table.concrete(scope), name),
			};

			let def = match def {
				Some(def) => def,
				None => return self.unresolvable(
					format!("unresolved name '{}'", table.interner().name(name))
				),
			};

			if let Some(scope) = scope.replace(def) {
				self.push_frame(scope, Vec::new().into(), Some(caller), true)?;
				*pushed += 1;
			}
		}

		match scope {
			Some(def) => self.construct_scoped(def, instantiation.args.clone(), Some(caller)),
			None => Ok(None),
		}
	}


	/// The value of a parameter of the top frame, of its continuation frames, or of a
	/// lexically enclosing frame. A parameter without argument has no value.
	fn parameter(&mut self, name: Symbol) -> Result<Option<Option<Value>>, Signal> {
		let frames = self.frames();

		let top = match frames.first() {
			Some((_, frame)) => frame.def,
			None => return Ok(None),
		};

		let mut lineage = true;

		for (_, frame) in frames.iter() {
			if lineage || self.table.is_owned_by(top, frame.def) {
				if let Some(ix) = frame.params.iter().position(|&param| param == name) {
					let value = match frame.args.get(ix) {
						Some(arg) => self.evaluate_in(frame.arg_scope, arg)?,
						None => None,
					};

					return Ok(Some(value));
				}
			}

			if frame.is_new_scope() {
				lineage = false;
			}
		}

		Ok(None)
	}


	/// Find the definition for a name: a member of the object being constructed, so that
	/// derived definitions override their supertypes' children, or else a lexical lookup from
	/// each frame's definition.
	fn resolve_definition(&self, name: Symbol) -> Option<DefId> {
		let frames = self.frames();

		if let Some((_, object)) = frames.iter().find(|(_, frame)| frame.is_new_scope()) {
			if let Some(found) = self.table.member(object.def, name) {
				return Some(found);
			}
		}

		frames
			.iter()
			.find_map(
				|(_, frame)| self.table
					.lookup(frame.def, name)
					.or_else(
						|| if frame.nominal != frame.def {
							self.table.lookup(frame.nominal, name)
						} else {
							None
						}
					)
			)
	}
}
