//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, forward‑read in initializer, invalid
//!    `return`, misplaced `this`/`super`, self‑inheritance).
//! 3. Tell the interpreter, for *each* variable occurrence, how many scopes out
//!    its binding lives – or nothing at all for a global – so the interpreter
//!    never falls back to dynamic lookup that would see a later shadowing local.
//!
//! Errors go to the [`Diagnostics`] sink and the walk carries on, so one
//! pass surfaces every static problem in the program.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::expr::{Expr, ExprId, FunctionExpr};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body are we in?  Used to validate `this` / `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances of locals by calling back into the interpreter.
pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a> Resolver<'a> {
    /// Create a new resolver bound to the given interpreter, reporting into
    /// `diagnostics`.
    pub fn new(interpreter: &'a mut Interpreter, diagnostics: &'a mut Diagnostics) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            diagnostics,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.diagnostics.resolve_error(token, message);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                debug!("Resolving block of {} statement(s)", statements.len());
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                self.resolve_expr(initializer);
                self.define(name);
            }

            Stmt::Function(decl) => {
                // name is visible *inside* its own body
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(&decl.function, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // one scope around the whole loop, mirroring the interpreter
                self.begin_scope();
                if let Some(init) = initializer {
                    self.resolve_stmt(init);
                }
                self.resolve_expr(condition);
                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }
                self.resolve_stmt(body);
                self.end_scope();
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }

            // loop placement is checked by the parser
            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: Option<&Expr>, methods: &[FunctionDecl]) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing: ClassType = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class cannot inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.mark_defined("super");
        }

        self.begin_scope();
        self.mark_defined("this");

        for method in methods {
            let kind: FunctionType = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(&method.function, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Cannot read local variable in its own initializer.");
                    }
                }
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Cannot use 'super' outside of a class.");
                        return;
                    }
                    ClassType::Class => {
                        self.error(keyword, "Cannot use 'super' in a class with no superclass.");
                        return;
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Function(function) => self.resolve_function(function, FunctionType::Function),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &Rc<FunctionExpr>, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return; // globals may be redeclared
        };

        if scope.contains_key(&name.lexeme) {
            let message: String =
                format!("Variable '{}' already declared in this scope.", name.lexeme);
            self.error(name, &message);
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        self.mark_defined(&name.lexeme);
    }

    fn mark_defined(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) if no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> Vec<String> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(|r| r.ok())
            .collect();
        let mut diagnostics = Diagnostics::new();
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        assert!(!diagnostics.had_error(), "{:?}", diagnostics.drain());

        let mut interpreter = Interpreter::with_io(Box::new(Vec::new()), Box::new(&b""[..]));
        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);

        diagnostics
            .drain()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    fn assert_single_error(source: &str, message: &str) {
        let errors = resolve(source);
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(errors[0].ends_with(message), "{:?}", errors);
    }

    #[test]
    fn valid_program_has_no_errors() {
        let errors = resolve(
            "var a = 1;
             fun f(x) { var y = x; { var y = a; } return y; }
             class A { init() { this.v = 1; } get() { return this.v; } }
             class B < A { get() { return super.get(); } }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn reading_local_in_own_initializer() {
        assert_single_error(
            "{ var a = a; }",
            "Cannot read local variable in its own initializer.",
        );
    }

    #[test]
    fn global_self_reference_in_initializer_is_allowed() {
        assert!(resolve("var a = 1; var a = a;").is_empty());
    }

    #[test]
    fn redeclaring_a_local() {
        assert_single_error(
            "fun f() { var a = 1; var a = 2; }",
            "Variable 'a' already declared in this scope.",
        );
    }

    #[test]
    fn duplicate_parameters() {
        assert_single_error(
            "fun f(a, a) {}",
            "Variable 'a' already declared in this scope.",
        );
    }

    #[test]
    fn return_at_top_level() {
        assert_single_error("return 1;", "Cannot return from top-level code.");
    }

    #[test]
    fn return_value_from_initializer() {
        assert_single_error(
            "class A { init() { return 1; } }",
            "Cannot return a value from an initializer.",
        );
        assert!(resolve("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn this_and_super_outside_classes() {
        assert_single_error("this;", "Cannot use 'this' outside of a class.");
        assert_single_error("fun f() { super.x(); }", "Cannot use 'super' outside of a class.");
        assert_single_error(
            "class A { m() { super.m(); } }",
            "Cannot use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn class_inheriting_from_itself() {
        assert_single_error("class A < A {}", "A class cannot inherit from itself.");
    }

    #[test]
    fn errors_do_not_stop_the_pass() {
        let errors = resolve("return 1; this; { var a = a; }");
        assert_eq!(errors.len(), 3, "{:?}", errors);
    }

    #[test]
    fn error_points_at_offending_token() {
        let errors = resolve("\n\nreturn 1;");
        assert_eq!(
            errors,
            vec!["[3:6] Error at 'return': Cannot return from top-level code.".to_string()]
        );
    }
}
