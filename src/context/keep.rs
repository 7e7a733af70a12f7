use std::sync::Arc;

use crate::{
	cache::{key, Entry, Holder, KeepHolder, KeepState, Key, Pointer, SharedTier, Tier},
	definition::{Construction, DefId, KeepClause, Kind},
	fmt::Show,
	signal::Signal,
	symbol::Symbol,
	value::Value,
};
use super::{Context, Frame};


impl Context {
	/// Bind the keep clauses of a freshly pushed frame. Static clauses are bound right away,
	/// dynamic ones are deferred until a matching name is requested.
	pub(super) fn bind_keeps(&mut self, def: DefId, nominal: DefId) {
		let table = self.table.clone();
		let frame = self.peek();

		let mut owners = vec![def];
		if nominal != def {
			owners.push(nominal);
		}

		for owner in owners {
			for clause in table.keep_clauses(owner) {
				match &clause.by {
					Some(by) if !clause.as_self => self.defer_keep(&frame, owner, clause, by),
					_ => self.bind_static(&frame, owner, clause),
				}
			}
		}
	}


	/// The tier holding kept values: the container's when the values are kept in a
	/// collection, the site's when they persist, or else the given keep tier.
	fn keep_target(&self, owner: DefId, table: Option<Symbol>, persist: bool, keep_tier: &SharedTier) -> SharedTier {
		if let Some(name) = table {
			match self.table.lookup(owner, name) {
				Some(container) => {
					let container = self.table.concrete(container);
					let qualified = self.table.qualified_name(container);
					return self.sites.tier_or_else(&qualified, || self.seed(container));
				}

				None => log::warn!(
					"keep target '{}' not found from {}",
					self.table.interner().name(name),
					Show(owner, self.table.as_ref())
				),
			}
		}

		if persist {
			let site = self.table.get(owner).site;
			self.sites.tier(self.table.interner().name(site))
		} else {
			keep_tier.clone()
		}
	}


	/// The literal entries of a collection, as the initial contents of its tier.
	fn seed(&self, container: DefId) -> Tier {
		let mut tier = Tier::default();

		let literal = |value: &Value| {
			Entry::Held(Arc::new(Holder::computed(Some(container), Vec::new().into(), Some(value.clone()))))
		};

		match &self.table.get(container).kind {
			Kind::Table(entries) => {
				for (key, construction) in entries.iter() {
					if let Construction::Value(value) = construction {
						tier.entries.insert(key.to_string().into(), literal(value));
					}
				}
			}

			Kind::Collection(elements) => {
				for (index, construction) in elements.iter().enumerate() {
					if let Construction::Value(value) = construction {
						tier.entries.insert(index.to_string().into(), literal(value));
					}
				}
			}

			_ => (),
		}

		tier
	}


	/// The key of a kept value. Values kept in a collection are keyed by the plain key,
	/// unless qualified with the container. Other values are qualified with the definition
	/// declaring the keep.
	fn keep_key(&self, owner: DefId, in_table: bool, in_container: bool, raw: &str) -> Key {
		if in_table && !in_container {
			raw.into()
		} else {
			key::qualified(&self.table.qualified_name(owner), raw)
		}
	}


	fn bind_static(&self, frame: &Frame, owner: DefId, clause: &KeepClause) {
		let tier = self.keep_target(owner, clause.table, clause.persist, &frame.keep_tier);
		let interner = self.table.interner();

		if clause.as_self {
			let name = clause.alias.unwrap_or(self.table.get(owner).name);
			let key = if clause.table.is_some() && !clause.in_container {
				Key::from(interner.name(name))
			} else {
				Key::from(self.table.qualified_name(owner))
			};

			let pointer = Pointer {
				def: Some(owner),
				source: Some(self.table.get(owner).name),
				key,
				tier,
			};

			// The value is requested by the frame instantiating the definition.
			if let Some(previous) = frame.previous {
				self.frame(previous)
					.tier
					.lock()
					.keeps
					.insert(interner.name(name).into(), pointer);
			}

			log::debug!("keep {} as self", Show(owner, self.table.as_ref()));
			return;
		}

		let aliased = clause.names.len() == 1;

		for &source in &clause.names {
			let name = match clause.alias {
				Some(alias) if aliased => alias,
				_ => source,
			};
			let name = interner.name(name);

			let pointer = Pointer {
				def: self.table.lookup(owner, source),
				source: Some(source),
				key: self.keep_key(owner, clause.table.is_some(), clause.in_container, name),
				tier: tier.clone(),
			};

			log::debug!("keep '{}' in {} as '{}'", name, Show(owner, self.table.as_ref()), pointer.key);

			frame.tier.lock().keeps.insert(name.into(), pointer);
		}
	}


	fn defer_keep(&self, frame: &Frame, owner: DefId, clause: &KeepClause, by: &Construction) {
		let aliased = clause.names.len() == 1;
		let mut tier = frame.tier.lock();

		for &source in &clause.names {
			let keep_name = match clause.alias {
				Some(alias) if aliased => alias,
				_ => source,
			};

			tier.dynamic.push(
				KeepHolder {
					keep_name,
					owner,
					sources: vec![source],
					by: by.clone(),
					table: clause.table,
					persist: clause.persist,
					in_container: clause.in_container,
					state: KeepState::Pending,
				}
			);
		}
	}


	/// Resolve the pending dynamic keeps in the stack matching the requested name.
	pub(crate) fn update_dynamic_keeps(&mut self, name: &str) -> Result<(), Signal> {
		let table = self.table.clone();

		for (hops, (_, frame)) in self.frames().into_iter().enumerate() {
			loop {
				let holder = {
					let mut tier = frame.tier.lock();
					tier.dynamic
						.iter_mut()
						.find(|holder| holder.matches(name, table.interner().name(holder.keep_name)))
						.map(
							|holder| {
								holder.state = KeepState::Resolving;
								holder.clone()
							}
						)
				};

				let holder = match holder {
					Some(holder) => holder,
					None => break,
				};

				let result = self.resolve_dynamic_keep(hops, &frame, &holder);

				let state = match &result {
					Ok(key) => KeepState::Resolved(key.clone()),
					Err(_) => KeepState::Pending,
				};

				let mut tier = frame.tier.lock();
				let resolving = tier.dynamic
					.iter_mut()
					.filter(|other| other.keep_name == holder.keep_name && other.owner == holder.owner)
					.find(|other| other.state == KeepState::Resolving);

				if let Some(other) = resolving {
					other.state = state;
				}

				drop(tier);

				result?;
			}
		}

		Ok(())
	}


	/// Evaluate the key expression in the frame declaring the keep, and bind the name.
	fn resolve_dynamic_keep(&mut self, hops: usize, frame: &Frame, holder: &KeepHolder) -> Result<Key, Signal> {
		let by = self.unpushed(hops, |context| context.evaluate(&holder.by))?;
		let by = by.unwrap_or_default();

		let tier = self.keep_target(holder.owner, holder.table, holder.persist, &frame.keep_tier);
		let keep_name = self.table.interner().name(holder.keep_name);

		let key = if holder.table.is_some() {
			self.keep_key(holder.owner, true, holder.in_container, &by.to_string())
		} else {
			self.keep_key(holder.owner, false, holder.in_container, &key::base(keep_name, &[by], &[]))
		};

		let source = holder.sources.first().copied();

		let pointer = Pointer {
			def: source.and_then(|source| self.table.lookup(holder.owner, source)),
			source,
			key: key.clone(),
			tier,
		};

		log::debug!("keep '{}' by '{}'", keep_name, key);

		frame.tier.lock().keeps.insert(keep_name.into(), pointer);

		Ok(key)
	}
}
