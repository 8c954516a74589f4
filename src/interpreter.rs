//! Tree‑walking evaluator.
//!
//! The current environment is threaded through every `execute`/`evaluate`
//! call as an explicit argument rather than kept as interpreter state, so
//! entering a block or a call never has to be undone on the way out – on
//! success, on a `return`/`break`/`continue`, or on a runtime error.
//!
//! Non‑local exits travel as a [`Signal`] in the `Ok` channel; runtime
//! errors travel in the `Err` channel. The two never mix.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use log::{debug, info, trace};

use crate::callable::Callable;
use crate::class::LoxClass;
use crate::environment::{Env, Environment};
use crate::error::{RResult, RuntimeError};
use crate::expr::{Expr, ExprId};
use crate::function::LoxFunction;
use crate::natives;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Fell through to the next statement.
    Normal,
    /// `return` – unwinds to the enclosing call.
    Return(Value),
    /// `break` – unwinds to the enclosing loop, which stops.
    Break,
    /// `continue` – unwinds to the enclosing loop, which moves on to its
    /// increment / condition.
    Continue,
}

pub struct Interpreter {
    globals: Env,
    /// Resolver output: reference node → number of frames to skip. Entries
    /// are never evicted, so a long REPL session only adds to it.
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter wired to the process's stdout / stdin.
    pub fn new() -> Self {
        Self::with_io(
            Box::new(io::stdout()),
            Box::new(io::BufReader::new(io::stdin())),
        )
    }

    /// An interpreter whose `print` writes to `output` and whose `read`
    /// consumes `input`.
    pub fn with_io(output: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        info!("Initializing Interpreter");

        let globals: Env = Environment::global();
        natives::define_globals(&globals);

        Self {
            globals,
            locals: HashMap::new(),
            output,
            input,
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// Called by the resolver for every reference bound to a local scope.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        trace!("note_local {:?} at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        &mut *self.output
    }

    pub(crate) fn input(&mut self) -> &mut dyn BufRead {
        &mut *self.input
    }

    /// Run a whole program, stopping at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let globals: Env = Rc::clone(&self.globals);
        for stmt in statements {
            self.execute(stmt, &globals)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Execute `statements` in `environment`, stopping early on any signal.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Env) -> RResult<Signal> {
        for stmt in statements {
            let signal: Signal = self.execute(stmt, &environment)?;

            if !matches!(signal, Signal::Normal) {
                return Ok(signal);
            }
        }

        Ok(Signal::Normal)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt, env: &Env) -> RResult<Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr, env)?;
                Ok(Signal::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = self.evaluate(initializer, env)?;
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                env.borrow_mut().define(&name.lexeme, value);
                Ok(Signal::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = LoxFunction::new(
                    Some(decl.name.lexeme.clone()),
                    Rc::clone(&decl.function),
                    Rc::clone(env),
                    false,
                );
                env.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Signal::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods, env)?;
                Ok(Signal::Normal)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt, env)
                } else {
                    Ok(Signal::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.evaluate(condition, env)?.is_truthy() {
                    match self.execute(body, env)? {
                        Signal::Break => break,
                        Signal::Return(value) => return Ok(Signal::Return(value)),
                        Signal::Normal | Signal::Continue => {}
                    }
                }
                Ok(Signal::Normal)
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                debug!("Entering for loop");
                let loop_env: Env = Environment::child(env);

                if let Some(init) = initializer {
                    self.execute(init, &loop_env)?;
                }

                while self.evaluate(condition, &loop_env)?.is_truthy() {
                    match self.execute(body, &loop_env)? {
                        Signal::Break => break,
                        Signal::Return(value) => return Ok(Signal::Return(value)),
                        Signal::Normal | Signal::Continue => {}
                    }

                    if let Some(incr) = increment {
                        self.evaluate(incr, &loop_env)?;
                    }
                }
                Ok(Signal::Normal)
            }

            Stmt::Block(statements) => self.execute_block(statements, Environment::child(env)),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                trace!("Returning {}", value);
                Ok(Signal::Return(value))
            }

            Stmt::Break(_) => Ok(Signal::Break),

            Stmt::Continue(_) => Ok(Signal::Continue),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[FunctionDecl],
        env: &Env,
    ) -> RResult<()> {
        // bound first so the class can refer to itself
        env.borrow_mut().define(&name.lexeme, Value::Nil);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr, env)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => {
                    let token: Token = match expr {
                        Expr::Variable { name, .. } => name.clone(),
                        _ => name.clone(),
                    };
                    return Err(RuntimeError::type_error(
                        &token,
                        "Superclass must be a class.",
                    ));
                }
            },
            None => None,
        };

        // methods close over a frame holding `super` when there is one
        let method_env: Env = match &superclass {
            Some(class) => {
                let super_env: Env = Environment::child(env);
                super_env
                    .borrow_mut()
                    .define("super", Value::Callable(Callable::Class(Rc::clone(class))));
                super_env
            }
            None => Rc::clone(env),
        };

        let methods: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(
                    Some(method.name.lexeme.clone()),
                    Rc::clone(&method.function),
                    Rc::clone(&method_env),
                    method.name.lexeme == "init",
                );
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        debug!(
            "Declaring class '{}' with {} method(s)",
            name.lexeme,
            methods.len()
        );

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);
        env.borrow_mut()
            .assign(name, Value::Callable(Callable::Class(Rc::new(class))))
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr, env: &Env) -> RResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),

            Expr::Grouping(inner) => self.evaluate(inner, env),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right, env)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::type_error(
                            operator,
                            "Operands must be numbers.",
                        )),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => unreachable!("parser only builds '-' and '!' unary nodes"),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right, env),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left, env)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right, env)
                }
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.evaluate(then_branch, env)
                } else {
                    self.evaluate(else_branch, env)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name, env),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value, env)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(env, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee, env)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument, env)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(RuntimeError::type_error(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if args.len() != callable.arity() {
                    return Err(RuntimeError::arity(paren, callable.arity(), args.len()));
                }

                callable.call(self, args, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object, env)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(RuntimeError::type_error(
                    name,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object, env)? else {
                    return Err(RuntimeError::type_error(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value, env)?;
                instance.set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword, env),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method, env),

            Expr::Function(declaration) => {
                let function =
                    LoxFunction::new(None, Rc::clone(declaration), Rc::clone(env), false);
                Ok(Value::Callable(Callable::Function(Rc::new(function))))
            }
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
        env: &Env,
    ) -> RResult<Value> {
        let left: Value = self.evaluate(left, env)?;
        let right: Value = self.evaluate(right, env)?;

        trace!("Binary {} on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            // left is only evaluated for its side effects
            TokenType::COMMA => Ok(right),

            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), right) => Ok(Value::String(format!("{}{}", a, right))),
                _ => Err(RuntimeError::type_error(
                    operator,
                    "Operands must be two numbers or strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left, &right)?;
                if b == 0.0 {
                    return Err(RuntimeError::division_by_zero(operator));
                }
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => unreachable!("parser never builds a binary node for {:?}", operator),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token,
        method: &Token,
        env: &Env,
    ) -> RResult<Value> {
        let distance: usize = *self.locals.get(&id).unwrap_or_else(|| {
            panic!(
                "'super' on line {} was never resolved to a scope",
                keyword.line
            )
        });

        let superclass: Rc<LoxClass> = match Environment::get_at(env, distance, keyword)? {
            Value::Callable(Callable::Class(class)) => class,
            other => panic!("'super' bound to a non-class value: {}", other),
        };

        // `this` lives in the frame just inside the one holding `super`
        let instance = match Environment::get_at(env, distance - 1, &Token::synthetic("this"))? {
            Value::Instance(instance) => instance,
            other => panic!("'this' bound to a non-instance value: {}", other),
        };

        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::Callable(Callable::Function(Rc::new(
                function.bind(instance),
            )))),
            None => Err(RuntimeError::undefined_property(method)),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token, env: &Env) -> RResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(env, distance, name),
            None => self.globals.borrow().get(name),
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> RResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::type_error(
            operator,
            "Operands must be numbers.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::runner::SharedBuffer;
    use crate::scanner::Scanner;

    fn interpreter() -> (Interpreter, SharedBuffer) {
        let output = SharedBuffer::default();
        let interpreter = Interpreter::with_io(Box::new(output.clone()), Box::new(&b""[..]));
        (interpreter, output)
    }

    fn program(interpreter: &mut Interpreter, source: &str) -> Vec<Stmt> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(|r| r.ok())
            .collect();
        let mut diagnostics = Diagnostics::new();
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        Resolver::new(interpreter, &mut diagnostics).resolve(&statements);
        assert!(!diagnostics.had_error(), "{:?}", diagnostics.drain());

        statements
    }

    fn run(source: &str) -> (RResult<()>, String) {
        let (mut interpreter, output) = interpreter();
        let statements = program(&mut interpreter, source);
        let result = interpreter.interpret(&statements);
        (result, output.contents())
    }

    fn eval(source: &str) -> RResult<Value> {
        let (mut interpreter, _) = interpreter();
        let statements = program(&mut interpreter, source);
        let globals = Rc::clone(interpreter.globals());

        match statements.as_slice() {
            [Stmt::Expression(expr)] => interpreter.evaluate(expr, &globals),
            _ => panic!("expected a single expression statement"),
        }
    }

    #[test]
    fn evaluates_literals_and_arithmetic() {
        assert_eq!(eval("1 + 2 * 3;").unwrap(), Value::Number(7.0));
        assert_eq!(eval("1 / 2;").unwrap(), Value::Number(0.5));
        assert_eq!(eval("\"foo\" + 1;").unwrap(), Value::String("foo1".into()));
        assert_eq!(eval("!nil;").unwrap(), Value::Bool(true));
        assert_eq!(eval("3 >= 3;").unwrap(), Value::Bool(true));
    }

    #[test]
    fn multiplication_has_no_special_cases() {
        assert_eq!(eval("0 * 5;").unwrap(), Value::Number(0.0));
    }

    #[test]
    fn division_by_zero() {
        assert!(matches!(
            eval("1 / 0;"),
            Err(RuntimeError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn plus_with_number_on_the_left_and_string_on_the_right() {
        assert!(matches!(eval("1 + \"foo\";"), Err(RuntimeError::Type { .. })));
    }

    #[test]
    fn equality_without_coercion() {
        assert_eq!(eval("nil == nil;").unwrap(), Value::Bool(true));
        assert_eq!(eval("nil == false;").unwrap(), Value::Bool(false));
        assert_eq!(eval("0 == false;").unwrap(), Value::Bool(false));
        assert_eq!(eval("clock == clock;").unwrap(), Value::Bool(true));
    }

    #[test]
    fn logical_operators_return_operand_values() {
        assert_eq!(eval("nil or 3;").unwrap(), Value::Number(3.0));
        assert_eq!(eval("false and missing;").unwrap(), Value::Bool(false));
        assert_eq!(eval("1 or missing;").unwrap(), Value::Number(1.0));
        assert!(matches!(
            eval("true and missing;"),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn comma_and_conditional() {
        assert_eq!(eval("(1, 2, 3);").unwrap(), Value::Number(3.0));
        assert_eq!(eval("true ? 1 : missing;").unwrap(), Value::Number(1.0));
        assert_eq!(eval("false ? missing : 2;").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn execute_block_reports_the_first_signal() {
        let (mut interpreter, output) = interpreter();
        let statements = program(&mut interpreter, "while (true) { print(1); break; print(3); }");

        let Stmt::While { body, .. } = &statements[0] else {
            panic!("expected a while loop");
        };
        let Stmt::Block(body) = body.as_ref() else {
            panic!("expected a block body");
        };

        let env = Environment::child(interpreter.globals());
        let signal = interpreter.execute_block(body, env).unwrap();

        assert_eq!(signal, Signal::Break);
        assert_eq!(output.contents(), "1\n");
    }

    #[test]
    fn block_bindings_do_not_leak_even_after_an_error() {
        let (mut interpreter, _) = interpreter();
        let statements = program(&mut interpreter, "var x = \"outer\"; { var x = \"inner\"; missing; }");

        assert!(interpreter.interpret(&statements).is_err());
        assert_eq!(
            interpreter.globals().borrow().get(&Token::synthetic("x")).unwrap(),
            Value::String("outer".into())
        );
    }

    #[test]
    fn closures_observe_later_mutation() {
        let (result, output) = run(
            "var x = 1;
             fun show() { print(x); }
             x = 2;
             show();",
        );
        assert!(result.is_ok());
        assert_eq!(output, "2\n");
    }

    #[test]
    fn resolved_locals_use_distances() {
        let (result, output) = run(
            "fun outer() {
                 var v = \"outer\";
                 fun inner() { return v; }
                 { var v = \"shadow\"; print(inner()); }
             }
             outer();",
        );
        assert!(result.is_ok());
        assert_eq!(output, "outer\n");
    }

    #[test]
    fn for_loop_with_break_and_continue() {
        let (result, output) = run(
            "for (var i = 0; i < 10; i += 1) {
                 if (i == 1) continue;
                 if (i == 4) break;
                 print(i);
             }",
        );
        assert!(result.is_ok());
        assert_eq!(output, "0\n2\n3\n");
    }

    #[test]
    fn runtime_error_stops_interpretation() {
        let (result, output) = run("print(1); nil.x; print(2);");
        assert!(matches!(result, Err(RuntimeError::Type { .. })));
        assert_eq!(output, "1\n");
    }

    #[test]
    fn class_instances_and_super() {
        let (result, output) = run(
            "class A { hi() { return \"A\"; } }
             class B < A { hi() { return \"B\" + super.hi(); } }
             print(B().hi());",
        );
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(output, "BA\n");
    }

    #[test]
    fn undefined_super_method() {
        let (result, _) = run(
            "class A {}
             class B < A { m() { return super.missing; } }
             B().m();",
        );
        assert!(matches!(result, Err(RuntimeError::UndefinedProperty { name, .. }) if name == "missing"));
    }
}
