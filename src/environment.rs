use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::error::{RResult, RuntimeError};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to one frame of the scope chain. Closures, bound methods
/// and nested blocks may all hold the same frame; a write through any
/// handle is seen by every other.
///
/// Frames are reference counted with no cycle collection. A function
/// declared in a frame it also closes over (any local `fun`, or a class
/// whose methods capture its own scope) keeps that frame alive for the
/// rest of the process.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A fresh root frame behind a shared handle.
    pub fn global() -> Env {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// A fresh child frame of `enclosing` behind a shared handle.
    pub fn child(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this frame, replacing any earlier binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define {} = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame, then outward.
    pub fn get(&self, name: &Token) -> RResult<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::undefined_variable(name))
        }
    }

    /// Overwrite the nearest existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> RResult<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::undefined_variable(name))
        }
    }

    /// Local‑only lookup in the frame exactly `distance` links out.
    pub fn get_at(env: &Env, distance: usize, name: &Token) -> RResult<Value> {
        let frame: Env = Self::ancestor(env, distance);
        let frame = frame.borrow();

        frame
            .values
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }

    /// Local‑only assignment in the frame exactly `distance` links out.
    pub fn assign_at(env: &Env, distance: usize, name: &Token, value: Value) -> RResult<()> {
        let frame: Env = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::undefined_variable(name)),
        }
    }

    /// Walk `distance` parent links. The resolver computed `distance` from the
    /// same scope structure the interpreter builds, so running off the root
    /// means the two disagree and nothing sensible can continue.
    fn ancestor(env: &Env, distance: usize) -> Env {
        let mut frame: Env = Rc::clone(env);

        for hop in 0..distance {
            let parent: Env = frame.borrow().enclosing.clone().unwrap_or_else(|| {
                panic!(
                    "resolved distance {} overshoots the environment chain after {} hop(s)",
                    distance, hop
                )
            });
            frame = parent;
        }

        frame
    }

    /// Names bound anywhere in the chain, innermost first.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();

        if let Some(enclosing) = &self.enclosing {
            for name in enclosing.borrow().names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(lexeme: &str) -> Token {
        Token::synthetic(lexeme)
    }

    fn str_value(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn get_undeclared_fails() {
        let global = Environment::global();
        let err = global.borrow().get(&name("foo")).unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable { name, .. } if name == "foo"));
    }

    #[test]
    fn assign_undeclared_fails_and_does_not_create() {
        let global = Environment::global();
        assert!(global
            .borrow_mut()
            .assign(&name("foo"), Value::Number(42.0))
            .is_err());
        assert!(global.borrow().get(&name("foo")).is_err());
    }

    #[test]
    fn child_definition_is_not_visible_in_parent() {
        let global = Environment::global();
        let local = Environment::child(&global);
        local.borrow_mut().define("foo", str_value("bar"));
        assert!(global.borrow().get(&name("foo")).is_err());
    }

    #[test]
    fn child_define_shadows_without_touching_parent() {
        let global = Environment::global();
        let local = Environment::child(&global);
        global.borrow_mut().define("foo", str_value("bar"));
        local.borrow_mut().define("foo", str_value("baz"));

        assert_eq!(global.borrow().get(&name("foo")).unwrap(), str_value("bar"));
        assert_eq!(local.borrow().get(&name("foo")).unwrap(), str_value("baz"));
    }

    #[test]
    fn child_reads_parent_binding() {
        let global = Environment::global();
        let local = Environment::child(&global);
        global.borrow_mut().define("foo", Value::Bool(true));
        assert_eq!(local.borrow().get(&name("foo")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn redefine_replaces_value() {
        let global = Environment::global();
        global.borrow_mut().define("foo", Value::Number(42.0));
        global.borrow_mut().define("foo", Value::Nil);
        assert_eq!(global.borrow().get(&name("foo")).unwrap(), Value::Nil);
    }

    #[test]
    fn child_assign_mutates_parent_binding() {
        let global = Environment::global();
        let local = Environment::child(&global);
        global.borrow_mut().define("x", Value::Number(1.0));
        local
            .borrow_mut()
            .assign(&name("x"), Value::Number(2.0))
            .unwrap();

        assert_eq!(global.borrow().get(&name("x")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn get_at_and_assign_at_skip_exactly_distance_frames() {
        let global = Environment::global();
        let middle = Environment::child(&global);
        let inner = Environment::child(&middle);
        global.borrow_mut().define("x", Value::Number(1.0));
        middle.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(
            Environment::get_at(&inner, 2, &name("x")).unwrap(),
            Value::Number(1.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 1, &name("x")).unwrap(),
            Value::Number(2.0)
        );
        // local‑only: distance 0 does not fall back outward
        assert!(Environment::get_at(&inner, 0, &name("x")).is_err());

        Environment::assign_at(&inner, 2, &name("x"), Value::Number(3.0)).unwrap();
        assert_eq!(global.borrow().get(&name("x")).unwrap(), Value::Number(3.0));
        assert_eq!(middle.borrow().get(&name("x")).unwrap(), Value::Number(2.0));
    }

    #[test]
    #[should_panic(expected = "overshoots")]
    fn overshooting_the_root_panics() {
        let global = Environment::global();
        let _ = Environment::get_at(&global, 1, &name("x"));
    }

    #[test]
    fn mutation_is_visible_through_every_handle() {
        let global = Environment::global();
        let alias: Env = Rc::clone(&global);
        global.borrow_mut().define("x", Value::Number(1.0));
        alias
            .borrow_mut()
            .assign(&name("x"), Value::Number(5.0))
            .unwrap();
        assert_eq!(global.borrow().get(&name("x")).unwrap(), Value::Number(5.0));
    }
}
