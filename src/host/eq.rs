use super::{Call, Host, HostFun, Signal, Value};


inventory::submit! { HostFun::from(Equals) }

struct Equals;

impl Host for Equals {
	fn name(&self) -> &'static str { "eq" }

	fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		match call.args.as_slice() {
			[ left, right ] => Ok(Some((left == right).into())),
			args => call.invalid(format!("expected 2 arguments, got {}", args.len())),
		}
	}
}
