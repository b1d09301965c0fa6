//! The call capability shared by user functions, classes and built‑ins.

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::environment::Environment;
use crate::error::{IResult, RuntimeError};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Anything a call expression can invoke.
///
/// The interpreter checks `arity` against the argument count *before*
/// calling `call`, so implementations may index `arguments` freely.
pub trait Callable {
    fn arity(&self) -> usize;

    /// `paren` is the call's closing parenthesis, used to position faults.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value>;
}

/// Signature of a built‑in.  An `Err` message becomes a runtime fault at
/// the call site.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);

        let result = (self.func)(&arguments).map_err(|msg| RuntimeError::new(paren, msg))?;

        info!("Native function '{}' returned: {}", self.name, result);

        Ok(result)
    }
}

/// `clock()`: seconds since the Unix epoch, with sub‑second precision.
fn clock(_arguments: &[Value]) -> Result<Value, String> {
    let micros = Utc::now().timestamp_micros();

    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

/// Every built‑in the language ships with.
pub const NATIVES: &[NativeFunction] = &[NativeFunction {
    name: "clock",
    arity: 0,
    func: clock,
}];

/// Bind every built‑in into `globals`.
pub fn define_natives(globals: &mut Environment) {
    for native in NATIVES {
        debug!("Defining native function '{}'", native.name);

        globals.define(
            native.name,
            Value::Native(Rc::new(NativeFunction {
                name: native.name,
                arity: native.arity,
                func: native.func,
            })),
        );
    }
}
