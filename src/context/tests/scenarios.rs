use std::{
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	thread,
};

use assert_matches::assert_matches;

use crate::{
	definition::{Builder, Construction, Durability, Each, KeepClause, Kind, Redirect, Table},
	host::{Call, Host, HostFun},
	runtime::{Runtime, Settings},
	signal::{Overflow, Signal, Threshold, ERROR_LOCATION},
	value::Value,
};
use super::super::Context;


/// Counts how many times it is constructed, producing the count.
struct Counter(Arc<AtomicUsize>);

impl Host for Counter {
	fn name(&self) -> &'static str { "counter" }

	fn call(&self, _: Call) -> Result<Option<Value>, Signal> {
		let count = self.0.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(Some(Value::Int(count as i64)))
	}
}


fn counted(site: &str) -> (Builder, Arc<AtomicUsize>) {
	let count = Arc::new(AtomicUsize::new(0));
	let mut builder = Builder::new(site);
	builder.host(HostFun::from(Counter(count.clone())));
	(builder, count)
}


fn context(table: Table) -> Context {
	Context::new(Runtime::new(Settings::default()), Arc::new(table))
}


fn no_args() -> Arc<[Construction]> {
	Vec::new().into()
}


fn text(value: &str) -> Option<Value> {
	Some(Value::from(value))
}


#[test]
fn test_stack_symmetry() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let a = builder.define(root, "a");
	let b = builder.define(a, "b");
	let mut context = context(builder.build());

	let (top, size, state) = (context.top(), context.size(), context.state());

	context.push(a, no_args(), true).expect("push failed");
	context.push(b, no_args(), false).expect("push failed");
	context.push(a, no_args(), true).expect("push failed");
	assert_eq!(context.size(), 3);
	assert_eq!(context.peek().previous.map(|id| context.frame(id).def), Some(b));

	for _ in 0 .. 3 {
		context.pop();
	}

	assert_eq!(context.top(), top);
	assert_eq!(context.size(), size);
	assert_eq!(context.state(), state);
}


#[test]
fn test_unpush_repush_identity() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let a = builder.define(root, "a");
	let mut context = context(builder.build());

	context.push(a, no_args(), true).expect("push failed");
	context.push(a, no_args(), true).expect("push failed");
	context.put_data(None, "x", &[], &[], Some(Value::Int(1)), 0).expect("put failed");

	let top = context.top();
	let frame = context.peek();

	context.unpush();
	assert_eq!(context.size(), 1);
	assert_matches!(context.get_local_data("x", &[], &[]), Ok(None));

	context.repush();
	assert_eq!(context.top(), top);
	assert_eq!(context.size(), 2);
	assert!(Arc::ptr_eq(&frame, &context.peek()));
	assert_matches!(
		context.get_local_data("x", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(1))
	);
}


#[test]
#[should_panic]
fn test_unpush_root_panics() {
	let mut context = context(Builder::new("test").build());
	context.unpush();
}


#[test]
#[should_panic]
fn test_pop_root_panics() {
	let mut context = context(Builder::new("test").build());
	context.pop();
}


#[test]
#[should_panic]
fn test_repush_without_unpush_panics() {
	let mut context = context(Builder::new("test").build());
	context.repush();
}


#[test]
fn test_clone_isolation() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let a = builder.define(root, "a");
	let mut context = context(builder.build());

	context.push(a, no_args(), true).expect("push failed");
	context.put_data(None, "k", &[], &[], Some(Value::Int(1)), 0).expect("put failed");

	let cleared = context.clone(true);
	assert_matches!(cleared.get_data(None, "k", &[], &[]), Ok(None));
	assert_eq!(cleared.size(), 0);

	let mut branch = context.clone(false);
	assert_matches!(
		branch.get_data(None, "k", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(1))
	);

	// Local writes after branching are not shared.
	branch.put_data(None, "k", &[], &[], Some(Value::Int(2)), 0).expect("put failed");
	assert_matches!(
		context.get_data(None, "k", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(1))
	);
	assert_matches!(
		branch.get_data(None, "k", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(2))
	);

	// Writes to the shared frames are.
	context.unpush();
	context.put_data(None, "shared", &[], &[], Some(Value::Bool(true)), 0).expect("put failed");
	context.repush();
	assert_matches!(
		branch.get_data(None, "shared", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Bool(true))
	);
	assert_matches!(cleared.get_data(None, "shared", &[], &[]), Ok(None));

	branch.pop();
	context.pop();
	assert_eq!(context.size(), 0);
}


#[test]
fn test_clone_at_root() {
	let mut context = context(Builder::new("test").build());
	context.put_data(None, "k", &[], &[], Some(Value::Int(1)), 0).expect("put failed");

	let mut branch = context.clone(false);
	assert!(branch == context);
	assert_eq!(branch.size(), 0);
	assert_matches!(
		branch.get_data(None, "k", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(1))
	);

	branch.put_data(None, "k", &[], &[], Some(Value::Int(2)), 0).expect("put failed");
	assert_matches!(
		context.get_data(None, "k", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(1))
	);
	assert_matches!(
		branch.get_data(None, "k", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(2))
	);
	assert!(context.equals_or_precedes(&branch));
}


#[test]
fn test_clone_inside_loop() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let a = builder.define(root, "a");
	let mut context = context(builder.build());

	context.push(a, no_args(), true).expect("push failed");
	let outer = context.top();
	let index = context.loop_of(outer).enter();
	context.put_data(None, "x", &[], &[], Some(Value::Int(1)), 0).expect("put failed");
	context.push(a, no_args(), true).expect("push failed");

	let branch = context.clone(false);
	assert_eq!(branch.loop_index(), Some(index));
	assert_eq!(branch.loop_index(), context.loop_index());
	assert_matches!(
		branch.get_data(None, "x", &[], &[]),
		Ok(Some(holder)) if holder.value() == Some(Value::Int(1))
	);
}


#[test]
fn test_branch_equality() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let a = builder.define(root, "a");
	let mut context = context(builder.build());

	context.push(a, no_args(), true).expect("push failed");

	let mut branch = context.clone(false);
	assert!(branch == context);
	assert!(context.equals_or_precedes(&branch));

	branch.push(a, no_args(), true).expect("push failed");
	assert!(branch != context);
	assert!(context.equals_or_precedes(&branch));
	assert!(!branch.equals_or_precedes(&context));

	let cleared = context.clone(true);
	assert!(cleared != context);
	assert!(!context.equals_or_precedes(&cleared));
}


#[test]
fn test_overflow_guard() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let a = builder.define(root, "a");
	let mut context = context(builder.build());

	for _ in 0 .. crate::runtime::DEFAULT_SIZE_LIMIT {
		context.push(a, no_args(), true).expect("push failed");
	}

	let top = context.top();
	assert_matches!(context.push(a, no_args(), true), Err(Overflow { limit: 250 }));
	assert_eq!(context.top(), top);

	for _ in 0 .. crate::runtime::DEFAULT_SIZE_LIMIT {
		context.pop();
	}

	assert_eq!(context.size(), 0);
}


#[test]
fn test_runaway_recursion() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let again = builder.define(root, "again");
	let body = vec![builder.call("again")];
	builder.body(again, body);

	let runtime = Runtime::new(Settings { size_limit: 20, ..Settings::default() });
	let mut context = Context::new(runtime, Arc::new(builder.build()));

	assert_eq!(context.construct(again, no_args()), Err(Signal::overflow(20)));
	assert_eq!(context.size(), 0);
}


#[test]
fn test_scope_bounded_propagation() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let scope = builder.define(root, "scope");
	builder.define(scope, "x");
	let mut context = context(builder.build());

	for _ in 0 .. 5 {
		context.push(scope, no_args(), true).expect("push failed");
	}

	context.put_data(None, "x", &[], &[], Some(Value::Int(42)), 3).expect("put failed");

	for depth in (1 ..= 5).rev() {
		assert_eq!(context.size(), depth);

		let local = context
			.get_local_data("x", &[], &[])
			.expect("lookup failed")
			.and_then(|holder| holder.value());

		if depth >= 2 {
			assert_eq!(local, Some(Value::Int(42)), "missing at depth {}", depth);
		} else {
			assert_eq!(local, None, "leaked to depth {}", depth);
		}

		context.pop();
	}
}


#[test]
fn test_max_keep_levels() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let outer = builder.define(root, "outer");
	let x = builder.define(outer, "x");
	let middle = builder.define(outer, "middle");
	let inner = builder.define(middle, "inner");
	let elsewhere = builder.define(root, "elsewhere");
	let y = builder.define(elsewhere, "y");
	let top_level = builder.define(root, "top_level");
	let mut context = context(builder.build());

	context.push(outer, no_args(), true).expect("push failed");
	context.push(middle, no_args(), true).expect("push failed");
	context.push(inner, no_args(), true).expect("push failed");

	assert_eq!(context.max_keep_levels(x), 2);
	assert_eq!(context.max_keep_levels(y), 0);
	assert_eq!(context.max_keep_levels(top_level), 3);
}


#[test]
fn test_loop_keys_are_distinct() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let page = builder.define(root, "page");
	let cell = builder.define(page, "cell");
	builder.durability(cell, Durability::Static);
	let body = vec![builder.call("item")];
	builder.body(cell, body);
	builder.external(page, "index", "loop_index");

	let item = builder.symbol("item");
	let numbers: Value = vec![Value::Int(1), Value::Int(2), Value::Int(3)].into();
	let cells = vec![builder.call("cell"), builder.call("index")];

	builder.body(
		page,
		vec![
			Construction::Each(
				Box::new(
					Each {
						var: item,
						over: numbers.into(),
						body: cells.into(),
					}
				)
			),
		],
	);

	let mut context = context(builder.build());

	assert_eq!(context.construct(page, no_args()), Ok(text("102132")));
	assert_eq!(context.loop_index(), None);
}


#[test]
fn test_nested_loops() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let page = builder.define(root, "page");

	let (i, j) = (builder.symbol("i"), builder.symbol("j"));
	let numbers: Value = vec![Value::Int(1), Value::Int(2)].into();
	let letters: Value = vec![Value::from("a"), Value::from("b")].into();
	let cells = vec![builder.call("i"), builder.call("j")];

	let inner = Construction::Each(
		Box::new(
			Each {
				var: j,
				over: letters.into(),
				body: cells.into(),
			}
		)
	);

	builder.body(
		page,
		vec![
			Construction::Each(
				Box::new(
					Each {
						var: i,
						over: numbers.into(),
						body: vec![inner].into(),
					}
				)
			),
		],
	);

	let mut context = context(builder.build());

	assert_eq!(context.construct(page, no_args()), Ok(text("1a1b2a2b")));
	assert_eq!(context.loop_index(), None);
}


#[test]
fn test_basic_keep() {
	let (mut builder, count) = counted("test");
	let root = builder.root();
	builder.external(root, "B", "counter");
	let a = builder.define(root, "A");
	let clause = KeepClause {
		names: vec![builder.symbol("B")],
		alias: Some(builder.symbol("b")),
		..KeepClause::default()
	};
	builder.keep(a, clause);
	let request = builder.call("b");
	let mut context = context(builder.build());

	context.push(a, no_args(), true).expect("push failed");
	assert_eq!(context.evaluate(&request), Ok(Some(Value::Int(1))));
	assert_eq!(context.evaluate(&request), Ok(Some(Value::Int(1))));
	assert_eq!(count.load(Ordering::SeqCst), 1);

	// The kept value lives in the tier of the owning scope.
	context.pop();
	context.push(a, no_args(), true).expect("push failed");
	assert_eq!(context.evaluate(&request), Ok(Some(Value::Int(1))));
	assert_eq!(count.load(Ordering::SeqCst), 1);
}


#[test]
fn test_dynamic_keep() {
	let (mut builder, count) = counted("test");
	let root = builder.root();
	let page = builder.define(root, "page");
	builder.params(page, &["id"]);
	builder.external(page, "title", "counter");
	let clause = KeepClause {
		names: vec![builder.symbol("title")],
		by: Some(builder.call("id")),
		..KeepClause::default()
	};
	builder.keep(page, clause);
	let body = vec![builder.call("title")];
	builder.body(page, body);
	let mut context = context(builder.build());

	let args = |id: i64| -> Arc<[Construction]> { vec![Value::Int(id).into()].into() };

	assert_eq!(context.construct(page, args(1)), Ok(Some(Value::Int(1))));
	assert_eq!(context.construct(page, args(1)), Ok(Some(Value::Int(1))));
	assert_eq!(context.construct(page, args(2)), Ok(Some(Value::Int(2))));
	assert_eq!(count.load(Ordering::SeqCst), 2);
}


#[test]
fn test_dynamic_keep_by_member() {
	let (mut builder, count) = counted("test");
	let root = builder.root();
	builder.external(root, "tick", "counter");
	let page = builder.define(root, "page");
	builder.params(page, &["id"]);
	let entries = vec![(Value::from("x"), builder.call("tick"))];
	builder.define_kind(page, "title", Kind::Table(entries.into()));
	let clause = KeepClause {
		names: vec![builder.symbol("title")],
		by: Some(builder.call("id")),
		..KeepClause::default()
	};
	builder.keep(page, clause);
	let body = vec![builder.call("title.x")];
	builder.body(page, body);
	let mut context = context(builder.build());

	let args = |id: i64| -> Arc<[Construction]> { vec![Value::Int(id).into()].into() };

	assert_eq!(context.construct(page, args(1)), Ok(Some(Value::Int(1))));
	assert_eq!(context.construct(page, args(1)), Ok(Some(Value::Int(1))));
	assert_eq!(context.construct(page, args(2)), Ok(Some(Value::Int(2))));
	assert_eq!(count.load(Ordering::SeqCst), 2);
}


#[test]
fn test_keep_as_self() {
	let (mut builder, count) = counted("test");
	let root = builder.root();
	let banner = builder.external(root, "banner", "counter");
	builder.keep(banner, KeepClause { as_self: true, ..KeepClause::default() });
	let page = builder.define(root, "page");
	let body = vec![builder.call("banner"), builder.call("banner")];
	builder.body(page, body);
	let mut context = context(builder.build());

	assert_eq!(context.construct(page, no_args()), Ok(text("11")));
	assert_eq!(count.load(Ordering::SeqCst), 1);
}


#[test]
fn test_static_durability() {
	let (mut builder, count) = counted("test");
	let root = builder.root();
	let stamp = builder.external(root, "stamp", "counter");
	builder.durability(stamp, Durability::Static);
	let page = builder.define(root, "page");
	let body = vec![builder.call("stamp")];
	builder.body(page, body);
	let mut context = context(builder.build());

	assert_eq!(context.construct(page, no_args()), Ok(Some(Value::Int(1))));
	assert_eq!(context.construct(page, no_args()), Ok(Some(Value::Int(1))));
	assert_eq!(count.load(Ordering::SeqCst), 1);

	let mut cleared = context.clone(true);
	assert_eq!(cleared.construct(page, no_args()), Ok(Some(Value::Int(2))));
}


#[test]
fn test_global_durability() {
	let (mut builder, count) = counted("test");
	let root = builder.root();
	let clock = builder.external(root, "clock", "counter");
	builder.durability(clock, Durability::Global);
	let page = builder.define(root, "page");
	let body = vec![builder.call("clock")];
	builder.body(page, body);

	let table = Arc::new(builder.build());
	let runtime = Runtime::new(Settings::default());
	let mut context = Context::new(runtime.clone(), table.clone());

	assert_eq!(context.construct(page, no_args()), Ok(Some(Value::Int(1))));

	let mut cleared = context.clone(true);
	assert_eq!(cleared.construct(page, no_args()), Ok(Some(Value::Int(1))));

	let handles: Vec<_> = (0 .. 4)
		.map(
			|_| {
				let runtime = runtime.clone();
				let table = table.clone();
				thread::spawn(
					move || Context::new(runtime, table).construct(page, no_args())
				)
			}
		)
		.collect();

	for handle in handles {
		assert_eq!(handle.join().expect("thread panicked"), Ok(Some(Value::Int(1))));
	}

	assert_eq!(count.load(Ordering::SeqCst), 1);

	// Runtimes are isolated.
	let mut isolated = Context::new(Runtime::new(Settings::default()), table);
	assert_eq!(isolated.construct(page, no_args()), Ok(Some(Value::Int(2))));
}


#[test]
fn test_super_delegation() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let b = builder.define(root, "B");
	builder.body(b, vec![Builder::text("from B")]);
	let a = builder.define(root, "A");
	builder.extends(a, "B", Vec::new());
	let mut context = context(builder.build());

	assert_eq!(context.construct(a, no_args()), Ok(text("from B")));
	assert_eq!(context.size(), 0);
}


#[test]
fn test_continuation_merge() {
	let (mut builder, count) = counted("test");
	let root = builder.root();
	let base = builder.define(root, "base");
	let stamp = builder.external(base, "stamp", "counter");
	builder.durability(stamp, Durability::Static);
	let body = vec![builder.call("stamp")];
	builder.body(base, body);
	let page = builder.define(root, "page");
	builder.extends(page, "base", Vec::new());
	let body = vec![Construction::Super, builder.call("stamp")];
	builder.body(page, body);
	let mut context = context(builder.build());

	// The value computed in the continuation frame of base is found in the frame of page.
	assert_eq!(context.construct(page, no_args()), Ok(text("11")));
	assert_eq!(count.load(Ordering::SeqCst), 1);
}


#[test]
fn test_super_arguments() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let b = builder.define(root, "B");
	builder.params(b, &["p"]);
	let body = vec![Builder::text("<"), builder.call("p"), Builder::text(">")];
	builder.body(b, body);
	let a = builder.define(root, "A");
	builder.params(a, &["q"]);
	let arg = builder.call("q");
	builder.extends(a, "B", vec![arg]);
	let mut context = context(builder.build());

	assert_eq!(context.construct(a, vec![Builder::text("x")].into()), Ok(text("<x>")));
}


#[test]
fn test_sub_delegation() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let layout = builder.define(root, "layout");
	builder.body(layout, vec![Builder::text("<"), Construction::Sub, Builder::text(">")]);
	let page = builder.define(root, "page");
	builder.extends(page, "layout", Vec::new());
	builder.body(page, vec![Builder::text("content")]);
	let mut context = context(builder.build());

	assert_eq!(context.construct(page, no_args()), Ok(text("<content>")));
	assert_matches!(
		context.construct(layout, no_args()),
		Err(Signal::Redirection(redirection)) if &*redirection.location == ERROR_LOCATION
	);
}


#[test]
fn test_subtype_overrides_members() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let base = builder.define(root, "base");
	let title = builder.define(base, "title");
	builder.body(title, vec![Builder::text("base title")]);
	let body = vec![builder.call("title")];
	builder.body(base, body);
	let page = builder.define(root, "page");
	builder.extends(page, "base", Vec::new());
	let title = builder.define(page, "title");
	builder.body(title, vec![Builder::text("page title")]);
	let mut context = context(builder.build());

	assert_eq!(context.construct(page, no_args()), Ok(text("page title")));
	assert_eq!(context.construct(base, no_args()), Ok(text("base title")));
}


#[test]
fn test_next_list() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let first = builder.define(root, "greet");
	builder.body(first, vec![Builder::text("a")]);
	let second = builder.define(root, "greet");
	builder.body(second, vec![Builder::text("b"), Construction::Next]);
	let request = builder.call("greet");
	let mut context = context(builder.build());

	assert_eq!(context.evaluate(&request), Ok(text("ba")));
	assert_eq!(context.construct(first, no_args()).map(|_| ()), Ok(()));
	assert_matches!(context.evaluate(&Construction::Next), Err(Signal::Redirection(_)));
}


#[test]
fn test_redirection_catch() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let fail = builder.define(root, "fail");
	let redirect = Construction::Redirect(
		Box::new(
			Redirect {
				location: Builder::text("x"),
				message: Some(Builder::text("boom")),
				status: 302,
			}
		)
	);
	builder.body(fail, vec![Builder::text("lost"), redirect]);

	let guarded = builder.define(root, "guarded");
	let body = vec![builder.call("fail")];
	builder.body(guarded, body.clone());
	builder.catch(guarded, "x", vec![Builder::text("caught")]);

	let mismatched = builder.define(root, "mismatched");
	builder.body(mismatched, body.clone());
	builder.catch(mismatched, "y", vec![Builder::text("caught")]);

	let anything = builder.define(root, "anything");
	builder.body(anything, body);
	builder.catch(anything, "", vec![Builder::text("anything")]);

	let mut context = context(builder.build());

	assert_eq!(context.construct(guarded, no_args()), Ok(text("caught")));
	assert_eq!(context.construct(anything, no_args()), Ok(text("anything")));

	assert_matches!(
		context.construct(mismatched, no_args()),
		Err(Signal::Redirection(redirection))
			if &*redirection.location == "x"
				&& redirection.message.as_deref() == Some("boom")
				&& redirection.status == 302
	);
	assert_eq!(context.size(), 0);
}


#[test]
fn test_threshold_gating() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let lone = builder.define(root, "lone");
	builder.body(lone, vec![Construction::Super]);
	let missing = builder.define(root, "missing");
	let body = vec![builder.call("nowhere"), Builder::text("!")];
	builder.body(missing, body);
	let mut context = context(builder.build());

	assert_matches!(
		context.construct(lone, no_args()),
		Err(Signal::Redirection(redirection)) if &*redirection.location == ERROR_LOCATION
	);

	context.set_threshold(Threshold::Dubious);
	assert_eq!(context.construct(lone, no_args()), Ok(None));
	assert_eq!(context.construct(missing, no_args()), Ok(text("!")));
}


#[test]
fn test_lazy_arguments() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let greet = builder.define(root, "greet");
	builder.params(greet, &["name"]);
	let body = vec![Builder::text("hi "), builder.call("name")];
	builder.body(greet, body);

	let page = builder.define(root, "page");
	builder.params(page, &["who"]);
	let line = builder.define(page, "line");
	let body = vec![builder.call("who")];
	builder.body(line, body);
	let who = builder.call("who");
	let body = vec![builder.call_with("greet", vec![who]), Builder::text(", "), builder.call("line")];
	builder.body(page, body);
	let mut context = context(builder.build());

	assert_eq!(context.construct(page, vec![Builder::text("bob")].into()), Ok(text("hi bob, bob")));
}


#[test]
fn test_stats() {
	let mut builder = Builder::new("test");
	let root = builder.root();
	let a = builder.define(root, "a");
	let runtime = Runtime::new(Settings::default());
	let mut context = Context::new(runtime.clone(), Arc::new(builder.build()));

	context.push(a, no_args(), true).expect("push failed");
	let branch = context.clone(false);
	context.pop();
	drop(branch);

	let stats = runtime.stats();
	assert_eq!(stats.frames_created, 2);
	assert_eq!(stats.frames_cloned, 1);
	assert_eq!(stats.contexts_cloned, 1);
	assert_eq!(stats.frames_recycled, 2);
}
