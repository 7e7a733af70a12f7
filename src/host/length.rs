use super::{Call, Host, HostFun, Signal, Value};


inventory::submit! { HostFun::from(Length) }

struct Length;

impl Host for Length {
	fn name(&self) -> &'static str { "len" }

	fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		match call.args.as_slice() {
			[ value ] => match value.len() {
				Some(len) => Ok(Some(Value::Int(len as i64))),
				None => call.invalid(format!("{} has no length", value)),
			},

			args => call.invalid(format!("expected 1 argument, got {}", args.len())),
		}
	}
}
