//! Built‑in functions bound in the global scope at startup.

use std::io::Write;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::callable::Callable;
use crate::environment::Env;
use crate::function::{NativeFn, NativeFunction};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// `(name, arity, implementation)` of every built‑in.
const NATIVES: &[(&str, usize, NativeFn)] = &[
    ("clock", 0, clock),
    ("print", 1, print),
    ("read", 0, read),
    ("tonumber", 1, tonumber),
    ("tostring", 1, tostring),
    ("type", 1, type_of),
    ("sleep", 1, sleep),
];

pub fn define_globals(globals: &Env) {
    let mut globals = globals.borrow_mut();

    for &(name, arity, func) in NATIVES {
        debug!("Registering native '{}'", name);
        let native = NativeFunction { name, arity, func };
        globals.define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }
}

/// Seconds since the Unix epoch.
fn clock(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
    let now: Duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| e.to_string())?;

    Ok(Value::Number(now.as_millis() as f64 / 1000.0))
}

fn print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    writeln!(interpreter.output(), "{}", args[0]).map_err(|e| e.to_string())?;
    Ok(Value::Nil)
}

/// One line of input without its terminator, or `nil` at end of input.
fn read(interpreter: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
    interpreter.output().flush().map_err(|e| e.to_string())?;

    let mut line = String::new();
    let read: usize = interpreter
        .input()
        .read_line(&mut line)
        .map_err(|e| e.to_string())?;

    if read == 0 {
        return Ok(Value::Nil);
    }

    let trimmed_len: usize = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed_len);

    Ok(Value::String(line))
}

fn tonumber(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let number: Value = match &args[0] {
        Value::Number(n) => Value::Number(*n),
        other => other
            .to_string()
            .trim()
            .parse::<f64>()
            .map_or(Value::Nil, Value::Number),
    };

    Ok(number)
}

fn tostring(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(args[0].to_string()))
}

fn type_of(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(args[0].type_name().to_string()))
}

fn sleep(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let Value::Number(seconds) = args[0] else {
        return Err(format!(
            "sleep() expects a number of seconds, got {}.",
            args[0].type_name()
        ));
    };

    let duration: Duration = Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("Cannot sleep for {} seconds.", seconds))?;

    thread::sleep(duration);
    Ok(Value::Nil)
}
