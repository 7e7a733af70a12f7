use super::{Call, Host, HostFun, Signal, Value};


inventory::submit! { HostFun::from(Upper) }

struct Upper;

impl Host for Upper {
	fn name(&self) -> &'static str { "upper" }

	fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		match call.args.as_slice() {
			[ Value::String(ref string) ] => Ok(Some(string.to_uppercase().into())),
			[ Value::Nil ] => Ok(None),
			[ other ] => Ok(Some(other.to_string().to_uppercase().into())),
			args => call.invalid(format!("expected 1 argument, got {}", args.len())),
		}
	}
}
