//! The `Lox` driver: scan → parse → resolve → interpret, with every error
//! routed through one [`Diagnostics`] sink.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

pub struct Lox {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Self::from_interpreter(Interpreter::new())
    }

    /// A driver whose programs print to `output` and `read()` from `input`.
    pub fn with_io(output: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        Self::from_interpreter(Interpreter::with_io(output, input))
    }

    fn from_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Every global name, natives included, for REPL completion.
    pub fn variable_names(&self) -> Vec<String> {
        self.interpreter.globals().borrow().names()
    }

    /// Run a whole program. Nothing executes if a static error is found;
    /// the first runtime error ends the program.
    pub fn run_file(&mut self, source: &str) {
        info!("Running program of {} bytes", source.len());
        self.diagnostics.reset();

        let Some(statements) = self.front_end(source) else {
            return;
        };

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.diagnostics.runtime_error(e);
        }
    }

    /// Run one REPL entry. Each top‑level statement runs on its own, so a
    /// runtime error only abandons the statement that raised it; expression
    /// statements echo their value.
    pub fn run_prompt_line(&mut self, source: &str) {
        debug!("Running prompt line: {}", source);
        self.diagnostics.reset();

        let Some(statements) = self.front_end(source) else {
            return;
        };

        let globals = Rc::clone(self.interpreter.globals());

        for stmt in &statements {
            let result = match stmt {
                Stmt::Expression(expr) => self
                    .interpreter
                    .evaluate(expr, &globals)
                    .map(|value| writeln!(self.interpreter.output(), "{}", value)),
                other => self.interpreter.execute(other, &globals).map(|_| Ok(())),
            };

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.diagnostics.report(LoxError::Io(e)),
                Err(e) => self.diagnostics.runtime_error(e),
            }
        }
    }

    /// Scan, parse and resolve. `None` if any static error was reported.
    fn front_end(&mut self, source: &str) -> Option<Vec<Stmt>> {
        let mut tokens: Vec<Token> = Vec::new();
        for result in Scanner::new(source.as_bytes()) {
            match result {
                Ok(token) => tokens.push(token),
                Err(LoxError::Lex {
                    message,
                    line,
                    column,
                }) => self.diagnostics.scan_error(line, column, message),
                Err(e) => self.diagnostics.report(e),
            }
        }

        let statements: Vec<Stmt> = Parser::new(tokens, &mut self.diagnostics).parse();

        if self.diagnostics.had_error() {
            info!("Static errors found; not resolving");
            return None;
        }

        Resolver::new(&mut self.interpreter, &mut self.diagnostics).resolve(&statements);

        if self.diagnostics.had_error() {
            info!("Resolution failed; not executing");
            return None;
        }

        Some(statements)
    }
}

/// An in‑memory `Write` sink whose clones all append to the same buffer,
/// so output handed to an interpreter can still be read back afterwards.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
