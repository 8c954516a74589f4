use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::class::LoxInstance;
use crate::environment::{Env, Environment};
use crate::error::RResult;
use crate::expr::FunctionExpr;
use crate::interpreter::{Interpreter, Signal};
use crate::token::Token;
use crate::value::Value;

/// A user function or method: its declaration plus the environment it
/// closed over.
pub struct LoxFunction {
    name: Option<String>,
    declaration: Rc<FunctionExpr>,
    closure: Env,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        name: Option<String>,
        declaration: Rc<FunctionExpr>,
        closure: Env,
        is_initializer: bool,
    ) -> Self {
        Self {
            name,
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure additionally binds `this`.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let environment: Env = Environment::child(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction {
            name: self.name.clone(),
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// Run the body in a fresh frame whose parent is the closure.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> RResult<Value> {
        debug!(
            "Calling function '{}' with {} argument(s)",
            self.name().unwrap_or("<anonymous>"),
            arguments.len()
        );

        let environment: Env = Environment::child(&self.closure);
        {
            let mut frame = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument);
            }
        }

        let signal: Signal = interpreter.execute_block(&self.declaration.body, environment)?;

        // an initializer always hands back its instance, even after `return;`
        if self.is_initializer {
            return Environment::get_at(&self.closure, 0, &Token::synthetic("this"));
        }

        match signal {
            Signal::Return(value) => Ok(value),
            Signal::Normal | Signal::Break | Signal::Continue => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<fun {}>", name),
            None => write!(f, "<fun>"),
        }
    }
}

/// Signature of a built‑in. Errors are plain messages; the interpreter
/// attaches the call site's position.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, String>;

/// A function implemented in Rust and registered as a global.
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

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
