use crate::expr::{Expr, FunctionExpr, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};

/// Renders the AST in parenthesised prefix form, e.g. `(+ 1.0 (group 2.0))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Var { name, initializer } => {
                format!("(var {} {})", name.lexeme, Self::print(initializer))
            }

            Stmt::Function(decl) => Self::function_decl(decl),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    s.push_str(&format!(" < {}", Self::print(superclass)));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::function_decl(method));
                }
                s.push(')');
                s
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => format!(
                "(for {} {} {} {})",
                initializer
                    .as_deref()
                    .map_or_else(|| "()".to_string(), Self::print_stmt),
                Self::print(condition),
                increment
                    .as_ref()
                    .map_or_else(|| "()".to_string(), Self::print),
                Self::print_stmt(body)
            ),

            Stmt::Block(statements) => Self::sequence("block", statements),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Break(_) => "(break)".into(),

            Stmt::Continue(_) => "(continue)".into(),
        }
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(cond {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Function(function) => Self::function("fun", function),
        }
    }

    fn function_decl(decl: &FunctionDecl) -> String {
        Self::function(&format!("fun {}", decl.name.lexeme), &decl.function)
    }

    fn function(head: &str, function: &FunctionExpr) -> String {
        let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();
        let head: String = format!("{} ({})", head, params.join(" "));
        Self::sequence(&head, &function.body)
    }

    fn sequence(head: &str, statements: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use crate::token::Token;

    fn print(source: &str) -> Vec<String> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(|r| r.ok())
            .collect();
        let mut diagnostics = Diagnostics::new();
        Parser::new(tokens, &mut diagnostics)
            .parse()
            .iter()
            .map(AstPrinter::print_stmt)
            .collect()
    }

    #[test]
    fn expressions_print_in_prefix_form() {
        assert_eq!(print("1 + (2);"), vec!["(; (+ 1.0 (group 2.0)))"]);
        assert_eq!(print("-a * 2.5;"), vec!["(; (* (- a) 2.5))"]);
        assert_eq!(print("a ? b : c;"), vec!["(; (cond a b c))"]);
        assert_eq!(print("a or b and c;"), vec!["(; (or a (and b c)))"]);
    }

    #[test]
    fn compound_assignment_prints_desugared() {
        assert_eq!(print("x += 1;"), vec!["(; (= x (+ x 1.0)))"]);
        assert_eq!(print("o.f = 2;"), vec!["(; (= (. o f) 2.0))"]);
    }

    #[test]
    fn statements_print_in_prefix_form() {
        assert_eq!(print("var x = 1;"), vec!["(var x 1.0)"]);
        assert_eq!(print("var y;"), vec!["(var y nil)"]);
        assert_eq!(
            print("fun add(a, b) { return a + b; }"),
            vec!["(fun add (a b) (return (+ a b)))"]
        );
        assert_eq!(
            print("while (true) { break; }"),
            vec!["(while true (block (break)))"]
        );
        assert_eq!(
            print("class B < A { m() { return super.m; } }"),
            vec!["(class B < A (fun m () (return (super m))))"]
        );
    }
}
