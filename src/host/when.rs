use super::{Call, Host, HostFun, Signal, Value};


inventory::submit! { HostFun::from(When) }

/// Conditional: `when(condition, then, otherwise?)`.
struct When;

impl Host for When {
	fn name(&self) -> &'static str { "when" }

	fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		match call.args.as_slice() {
			[ condition, then ] => Ok(Some(then.clone()).filter(|_| condition.is_truthy())),

			[ condition, then, otherwise ] => Ok(
				Some(
					if condition.is_truthy() { then.clone() } else { otherwise.clone() }
				)
			),

			args => call.invalid(format!("expected 2 or 3 arguments, got {}", args.len())),
		}
	}
}
