pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod runner;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

pub use diagnostics::Diagnostics;
pub use error::{LoxError, RuntimeError};
pub use interpreter::Interpreter;
pub use runner::{Lox, SharedBuffer};
pub use value::Value;
