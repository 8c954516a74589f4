use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::class::{LoxClass, LoxInstance};
use crate::error::{RResult, RuntimeError};
use crate::function::{LoxFunction, NativeFunction};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear before `( … )`.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Identity comparison.
    pub fn same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Invoke with already‑evaluated arguments. The caller has checked arity;
    /// `paren` positions errors raised by natives.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> RResult<Value> {
        match self {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(interpreter, &arguments)
                    .map_err(|message| RuntimeError::native(paren, message))
            }

            Callable::Function(function) => function.call(interpreter, arguments),

            Callable::Class(class) => {
                debug!("Instantiating class '{}'", class.name());
                let instance: Rc<LoxInstance> = Rc::new(LoxInstance::new(Rc::clone(class)));

                if let Some(init) = class.find_method("init") {
                    init.bind(Rc::clone(&instance))
                        .call(interpreter, arguments)?;
                }

                Ok(Value::Instance(instance))
            }
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "{}", native),
            Callable::Function(function) => write!(f, "{}", function),
            Callable::Class(class) => write!(f, "{}", class),
        }
    }
}
