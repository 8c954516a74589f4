use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::stmt::Stmt;
use crate::token::Token;

/// Identity of a variable‑reference node. The resolver keys its distance
/// table by this id rather than by name, so two references to `x` in
/// different scopes resolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    /// Allocate an id that is unique for the lifetime of the process, so ids
    /// from successive REPL lines never collide in the interpreter's table.
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A literal constant copied out of its token at parse time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
}

/// Parameters and body of a function literal. Shared (`Rc`) between the AST
/// and every runtime function value created from it.
#[derive(Debug, Serialize)]
pub struct FunctionExpr {
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    // number, string, true, false, nil
    Literal(LiteralValue),

    // ( expr )
    Grouping(Box<Expr>),

    // ! or - applied to an operand
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    // arithmetic, comparison, equality and the comma operator
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // short‑circuiting `and` / `or`
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // cond ? then : else
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        // closing ')' kept for error positions
        paren: Token,
        arguments: Vec<Expr>,
    },

    // object.name
    Get {
        object: Box<Expr>,
        name: Token,
    },

    // object.name = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    // super.method
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    // anonymous `fun (params) { body }`
    Function(Rc<FunctionExpr>),
}

impl Expr {
    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            id: ExprId::fresh(),
            name,
        }
    }
}
