use super::{Call, Host, HostFun, Signal, Value};


inventory::submit! { HostFun::from(LoopIndex) }

/// The active index of the innermost repeated construct.
struct LoopIndex;

impl Host for LoopIndex {
	fn name(&self) -> &'static str { "loop_index" }

	fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		if !call.args.is_empty() {
			return call.invalid(format!("expected no arguments, got {}", call.args.len()));
		}

		Ok(call.context.loop_index().map(|index| Value::Int(index as i64)))
	}
}
