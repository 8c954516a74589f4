use std::rc::Rc;

use serde::Serialize;

use crate::expr::{Expr, FunctionExpr};
use crate::token::Token;

/// A named function: a `fun` declaration or a class method.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: Token,
    pub function: Rc<FunctionExpr>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Expression(Expr),

    // `var name = initializer;` (a missing initializer parses as `nil`)
    Var {
        name: Token,
        initializer: Expr,
    },

    Function(FunctionDecl),

    Class {
        name: Token,
        // always an `Expr::Variable` when present
        superclass: Option<Expr>,
        methods: Vec<FunctionDecl>,
    },

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    For {
        initializer: Option<Box<Stmt>>, // var or expression statement
        condition: Expr,                // `true` literal when omitted
        increment: Option<Expr>,
        body: Box<Stmt>,
    },

    Block(Vec<Stmt>),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Break(Token),

    Continue(Token),
}
