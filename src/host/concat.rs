use super::{Call, Host, HostFun, Signal, Value};


inventory::submit! { HostFun::from(Concat) }

struct Concat;

impl Host for Concat {
	fn name(&self) -> &'static str { "concat" }

	fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		Ok(Some(Value::concat(call.args)))
	}
}
