/*!
Recursive‑descent parser: token stream → statement list.

Time is Θ(n) in the number of tokens (each token is consumed once by
`advance()`; error recovery through `synchronize()` only discards tokens).
Call‑stack depth grows with syntactic nesting.

Errors never abort the pass. Fatal errors inside a declaration unwind to
`declaration()`, are recorded, and the parser synchronises to the next
statement boundary; recoverable ones (too many arguments, a misplaced
`break`, an invalid assignment target, …) are recorded in place and
parsing simply carries on. Every error goes to the [`Diagnostics`] sink
the parser was built with.

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------------------------------------------------------------------------

```text
program     → declaration* EOF ;
declaration → classDecl | funDecl | varDecl | statement ;
classDecl   → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
funDecl     → "fun" function ;
function    → IDENT "(" parameters? ")" block ;
varDecl     → "var" IDENT ( "=" expression )? ";" ;
statement   → exprStmt | forStmt | ifStmt | returnStmt | whileStmt
            | breakStmt | continueStmt | block ;
expression  → comma ;
comma       → assignment ( "," assignment )* ;
assignment  → ( call "." )? IDENT ( "=" | "+=" | "-=" | "*=" | "/=" ) assignment
            | conditional ;
conditional → logic_or ( "?" expression ":" conditional )? ;
logic_or    → logic_and ( "or" logic_and )* ;
logic_and   → equality ( "and" equality )* ;
equality    → comparison ( ( "!=" | "==" ) comparison )* ;
comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term        → factor ( ( "-" | "+" ) factor )* ;
factor      → unary ( ( "/" | "*" ) unary )* ;
unary       → ( "!" | "-" ) unary | call ;
call        → primary ( "(" arguments? ")" | "." IDENT )* ;
primary     → NUMBER | STRING | "true" | "false" | "nil" | "this"
            | "super" "." IDENT | IDENT | "fun" "(" parameters? ")" block
            | "(" expression ")" ;
```
*/

use std::rc::Rc;

use crate::diagnostics::Diagnostics;
use crate::expr::{Expr, ExprId, FunctionExpr, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// A fatal error on its way back up to `declaration()`.
#[derive(Debug)]
struct ParseError {
    token: Token,
    message: String,
}

impl ParseError {
    fn at(token: &Token, message: &str) -> Self {
        Self {
            token: token.clone(),
            message: message.to_string(),
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

/// Upper bound on parameters of a function and arguments of a call.
pub const MAX_ARGUMENTS: usize = 8;

/// Top‑level parser over an owned token buffer.
pub struct Parser<'diag> {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
    diagnostics: &'diag mut Diagnostics,
    errors: usize,
}

impl<'diag> Parser<'diag> {
    /// Construct a new parser reporting into `diagnostics`. An `EOF` token
    /// is appended if `tokens` lacks one.
    pub fn new(mut tokens: Vec<Token>, diagnostics: &'diag mut Diagnostics) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if !matches!(tokens.last(), Some(t) if t.token_type == TokenType::EOF) {
            let line: usize = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", line, 0));
        }

        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            diagnostics,
            errors: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return every statement that parsed
    /// cleanly. Check [`Diagnostics::had_error`] before executing the result.
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors
        );

        statements
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration");

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            self.function("function").map(Stmt::Function)
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!("Parse error, synchronizing: {}", e.message);
                self.error(&e.token, e.message);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected class name.")?;

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let superclass_name: Token =
                self.consume(TokenType::IDENTIFIER, "Expected superclass name.")?;
            Some(Expr::variable(superclass_name))
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body.")?;

        let mut methods: Vec<FunctionDecl> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body.")?;

        debug!(
            "Parsed class '{}' with {} method(s)",
            name.lexeme,
            methods.len()
        );

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> Result<FunctionDecl> {
        let name: Token = self.consume(TokenType::IDENTIFIER, &format!("Expected {} name.", kind))?;
        let function: Rc<FunctionExpr> = self.function_body(kind)?;

        Ok(FunctionDecl { name, function })
    }

    /// `"(" parameters? ")" block`, shared by declarations, methods and
    /// anonymous functions.
    fn function_body(&mut self, kind: &str) -> Result<Rc<FunctionExpr>> {
        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        if params.len() > MAX_ARGUMENTS {
            let token: Token = self.peek().clone();
            self.error(
                &token,
                format!("Cannot have more than {} parameters.", MAX_ARGUMENTS),
            );
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameter list.")?;
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body.", kind),
        )?;

        // a loop around a function does not make `break` legal inside it
        let enclosing_loop_depth: usize = self.loop_depth;
        self.loop_depth = 0;
        let body = self.block();
        self.loop_depth = enclosing_loop_depth;

        Ok(Rc::new(FunctionExpr { params, body: body? }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected variable name.")?;

        let initializer: Expr = if self.matches(TokenType::EQUAL) {
            self.expression()?
        } else {
            Expr::Literal(LiteralValue::Nil)
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::BREAK) {
            let keyword: Token = self.flow_statement("break")?;
            Ok(Stmt::Break(keyword))
        } else if self.matches(TokenType::CONTINUE) {
            let keyword: Token = self.flow_statement("continue")?;
            Ok(Stmt::Continue(keyword))
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'.")?;

        let initializer: Option<Box<Stmt>> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(Box::new(self.var_declaration()?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };

        let condition: Expr = if self.check(TokenType::SEMICOLON) {
            Expr::Literal(LiteralValue::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after for condition.")?;

        let increment: Option<Expr> = if self.check(TokenType::RIGHT_PAREN) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clause.")?;

        let body: Box<Stmt> = Box::new(self.loop_body()?);

        Ok(Stmt::For {
            initializer,
            condition,
            increment,
            body,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.loop_body()?);

        Ok(Stmt::While { condition, body })
    }

    /// Parse a loop body with the loop‑depth counter raised.
    fn loop_body(&mut self) -> Result<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        body
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return statement.")?;

        Ok(Stmt::Return { keyword, value })
    }

    /// `break ;` / `continue ;`: only legal inside a loop body.
    fn flow_statement(&mut self, kind: &str) -> Result<Token> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            self.error(
                &keyword,
                format!("'{}' can only be used inside loops.", kind),
            );
        }

        self.consume(
            TokenType::SEMICOLON,
            &format!("Expected ';' after '{}'.", kind),
        )?;

        Ok(keyword)
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' to end block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.assignment()?;

        while self.matches(TokenType::COMMA) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.assignment()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.conditional()?;

        if self.matches(TokenType::EQUAL)
            || self.matches(TokenType::PLUS_EQUAL)
            || self.matches(TokenType::MINUS_EQUAL)
            || self.matches(TokenType::STAR_EQUAL)
            || self.matches(TokenType::SLASH_EQUAL)
        {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            // `a op= b` is sugar for `a = a op b`
            let operator: Option<(TokenType, &str)> = match equals.token_type {
                TokenType::PLUS_EQUAL => Some((TokenType::PLUS, "+")),
                TokenType::MINUS_EQUAL => Some((TokenType::MINUS, "-")),
                TokenType::STAR_EQUAL => Some((TokenType::STAR, "*")),
                TokenType::SLASH_EQUAL => Some((TokenType::SLASH, "/")),
                _ => None,
            };

            let value: Expr = match operator {
                Some((token_type, lexeme)) => Expr::Binary {
                    left: Box::new(expr.clone()),
                    operator: Token::new(token_type, lexeme, equals.line, equals.column),
                    right: Box::new(value),
                },
                None => value,
            };

            match expr {
                Expr::Variable { name, .. } => {
                    return Ok(Expr::Assign {
                        id: ExprId::fresh(),
                        name,
                        value: Box::new(value),
                    });
                }

                Expr::Get { object, name } => {
                    return Ok(Expr::Set {
                        object,
                        name,
                        value: Box::new(value),
                    });
                }

                other => {
                    self.error(&equals, "Invalid assignment target.");
                    return Ok(other);
                }
            }
        }

        Ok(expr)
    }

    fn conditional(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_or()?;

        if self.matches(TokenType::QUESTION) {
            let then_branch: Expr = self.expression()?;
            self.consume(
                TokenType::COLON,
                "Expected ':' in conditional expression.",
            )?;
            let else_branch: Expr = self.conditional()?;

            expr = Expr::Conditional {
                condition: Box::new(expr),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Left‑associative binary level: `next ( op next )*`.
    fn binary(&mut self, next: fn(&mut Self) -> Result<Expr>, ops: &[TokenType]) -> Result<Expr> {
        let mut expr: Expr = next(self)?;

        while ops.iter().any(|op| self.check(op.clone())) {
            let operator: Token = self.advance().clone();
            let right: Expr = next(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary(
            Self::comparison,
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary(
            Self::term,
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary(Self::factor, &[TokenType::MINUS, TokenType::PLUS])
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary(Self::unary, &[TokenType::SLASH, TokenType::STAR])
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expected property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                arguments.push(self.assignment()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        if arguments.len() > MAX_ARGUMENTS {
            let token: Token = self.peek().clone();
            self.error(
                &token,
                format!("Cannot have more than {} arguments.", MAX_ARGUMENTS),
            );
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            let s: String = s.clone();
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s)));
        }

        if self.matches(TokenType::SUPER) {
            let keyword: Token = self.previous().clone();
            self.consume(TokenType::DOT, "Expected '.' after 'super'.")?;
            let method: Token =
                self.consume(TokenType::IDENTIFIER, "Expected superclass method name.")?;

            return Ok(Expr::Super {
                id: ExprId::fresh(),
                keyword,
                method,
            });
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: ExprId::fresh(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::variable(self.previous().clone()));
        }

        if self.matches(TokenType::FUN) {
            return Ok(Expr::Function(self.function_body("lambda")?));
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        // A binary operator with nothing on its left: report, then parse and
        // discard the right operand so the error does not cascade.
        let missing_left: Option<fn(&mut Self) -> Result<Expr>> = match self.peek().token_type {
            TokenType::BANG_EQUAL | TokenType::EQUAL_EQUAL => Some(Self::equality),
            TokenType::GREATER
            | TokenType::GREATER_EQUAL
            | TokenType::LESS
            | TokenType::LESS_EQUAL => Some(Self::comparison),
            TokenType::PLUS => Some(Self::term),
            TokenType::STAR | TokenType::SLASH => Some(Self::factor),
            _ => None,
        };

        if let Some(operand) = missing_left {
            let operator: Token = self.advance().clone();
            self.error(&operator, "Missing left-hand operand.");
            operand(self)?;

            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        Err(ParseError::at(self.peek(), "Expected expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Record a recoverable error without unwinding.
    fn error<S: Into<String>>(&mut self, token: &Token, message: S) {
        self.errors += 1;
        self.diagnostics.parse_error(token, message);
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        debug!("consume failed at '{}': {}", self.peek().lexeme, message);

        Err(ParseError::at(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(token) if token.token_type != TokenType::EOF => token.token_type == ttype,
            _ => false,
        }
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoxError;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(|r| r.ok())
            .collect();
        let mut diagnostics = Diagnostics::new();
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        (statements, diagnostics.drain())
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn parses_class_with_superclass_and_methods() {
        let (stmts, errors) = parse("class B < A { init(x) { this.x = x; } get() { return this.x; } }");
        assert!(errors.is_empty(), "{:?}", messages(&errors));

        match &stmts[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
                assert_eq!(methods.len(), 2);
                assert_eq!(methods[0].function.params.len(), 1);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn break_outside_loop_is_a_parse_error() {
        let (_, errors) = parse("break;");
        assert_eq!(
            messages(&errors),
            vec!["[1:5] Error at 'break': 'break' can only be used inside loops."]
        );

        let (_, errors) = parse("while (true) { if (x) continue; }");
        assert!(errors.is_empty());
    }

    #[test]
    fn loop_does_not_leak_into_nested_function() {
        let (_, errors) = parse("while (true) { fun f() { break; } }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn compound_assignment_desugars_to_binary() {
        let (stmts, errors) = parse("x += 2;");
        assert!(errors.is_empty());

        match &stmts[0] {
            Stmt::Expression(Expr::Assign { name, value, .. }) => {
                assert_eq!(name.lexeme, "x");
                assert!(matches!(
                    value.as_ref(),
                    Expr::Binary { operator, .. } if operator.token_type == TokenType::PLUS
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn invalid_assignment_target_is_reported() {
        let (_, errors) = parse("1 = 2;");
        assert_eq!(
            messages(&errors),
            vec!["[1:3] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn missing_left_operand_is_reported_once() {
        let (_, errors) = parse("== 1;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Missing left-hand operand."));
    }

    #[test]
    fn recovers_and_reports_every_error() {
        let (stmts, errors) = parse("var = 1; var y = 2; print(;");
        assert_eq!(errors.len(), 2);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn too_many_arguments_is_reported_without_aborting() {
        let (stmts, errors) = parse("f(1, 2, 3, 4, 5, 6, 7, 8, 9);");
        assert_eq!(stmts.len(), 1);
        assert!(errors[0].to_string().contains("Cannot have more than 8 arguments."));
    }

    #[test]
    fn fun_without_name_is_an_anonymous_function_expression() {
        let (stmts, errors) = parse("fun (a) { return a; };");
        assert!(errors.is_empty());
        assert!(matches!(&stmts[0], Stmt::Expression(Expr::Function(f)) if f.params.len() == 1));
    }

    #[test]
    fn conditional_and_comma_parse() {
        let (stmts, errors) = parse("a ? b : c, d;");
        assert!(errors.is_empty());
        assert!(matches!(
            &stmts[0],
            Stmt::Expression(Expr::Binary { operator, left, .. })
                if operator.token_type == TokenType::COMMA
                    && matches!(left.as_ref(), Expr::Conditional { .. })
        ));
    }

    #[test]
    fn omitted_for_clauses_get_defaults() {
        let (stmts, errors) = parse("for (;;) break;");
        assert!(errors.is_empty());
        assert!(matches!(
            &stmts[0],
            Stmt::For {
                initializer: None,
                condition: Expr::Literal(LiteralValue::Bool(true)),
                increment: None,
                ..
            }
        ));
    }
}
