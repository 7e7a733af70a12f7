use super::{Call, Host, HostFun, Signal, Value};


inventory::submit! { HostFun::from(Add) }

struct Add;

impl Host for Add {
	fn name(&self) -> &'static str { "add" }

	fn call(&self, call: Call) -> Result<Option<Value>, Signal> {
		let mut int: i64 = 0;
		let mut float: Option<f64> = None;

		for arg in &call.args {
			match arg {
				Value::Int(value) => match float.as_mut() {
					Some(sum) => *sum += *value as f64,
					None => int = int.wrapping_add(*value),
				},

				Value::Float(value) => {
					let sum = float.get_or_insert(int as f64);
					*sum += value.0;
				}

				other => return call.invalid(format!("expected a number, got {}", other)),
			}
		}

		Ok(
			Some(
				match float {
					Some(sum) => sum.into(),
					None => int.into(),
				}
			)
		)
	}
}
