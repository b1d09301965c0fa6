//! Runtime variable storage: a chain of scope frames.
//!
//! Frames are shared through `Rc<RefCell<_>>`: every closure that captured a
//! frame holds a handle to the *same* frame, so an assignment made through
//! one handle is seen through all of them, and the frame lives as long as its
//! longest holder.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{IResult, RuntimeError};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to one frame.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root (global) frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh shared frame whose parent is `enclosing`.
    pub fn enclosed_by(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Insert or overwrite `name` in *this* frame only.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up here, then in every enclosing frame.
    pub fn get(&self, name: &Token) -> IResult<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined_variable(name))
        }
    }

    /// Overwrite the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> IResult<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined_variable(name))
        }
    }

    /// Read `name` from exactly the frame `distance` hops out.  No search
    /// beyond that frame.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value> {
        if distance == 0 {
            return self.values.get(name).cloned();
        }

        self.enclosing
            .as_ref()
            .and_then(|enclosing| enclosing.borrow().get_at(distance - 1, name))
    }

    /// Write `name` in exactly the frame `distance` hops out.  Returns
    /// `false` if that frame does not exist or does not hold `name`.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) -> bool {
        if distance == 0 {
            return match self.values.get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            };
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
            None => false,
        }
    }
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::identifier(name, 1)
    }

    #[test]
    fn get_walks_enclosing_frames() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::enclosed_by(&globals);

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn missing_name_is_undefined_variable() {
        let env = Environment::new();
        let err = env.get(&ident("nope")).unwrap_err();

        assert_eq!(err.message, "Undefined variable 'nope'.");
    }

    #[test]
    fn assign_mutates_the_defining_frame() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::enclosed_by(&globals);
        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Number(2.0))
            .unwrap();

        assert_eq!(
            globals.borrow().get(&ident("a")).unwrap(),
            Value::Number(2.0)
        );
        assert!(inner.borrow().get_at(0, "a").is_none());
    }

    #[test]
    fn assign_to_unknown_name_fails() {
        let mut env = Environment::new();

        assert!(env.assign(&ident("x"), Value::Nil).is_err());
    }

    #[test]
    fn get_at_reads_only_the_target_frame() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::String("outer".into()));

        let middle = Environment::enclosed_by(&outer);
        middle
            .borrow_mut()
            .define("a", Value::String("middle".into()));

        let inner = Environment::enclosed_by(&middle);

        assert_eq!(
            inner.borrow().get_at(1, "a"),
            Some(Value::String("middle".into()))
        );
        assert_eq!(
            inner.borrow().get_at(2, "a"),
            Some(Value::String("outer".into()))
        );
        assert_eq!(inner.borrow().get_at(0, "a"), None);
        assert_eq!(inner.borrow().get_at(3, "a"), None);
    }

    #[test]
    fn assign_at_writes_only_the_target_frame() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::enclosed_by(&outer);
        inner.borrow_mut().define("a", Value::Number(10.0));

        assert!(inner.borrow_mut().assign_at(1, "a", Value::Number(2.0)));
        assert_eq!(outer.borrow().get_at(0, "a"), Some(Value::Number(2.0)));
        assert_eq!(inner.borrow().get_at(0, "a"), Some(Value::Number(10.0)));
        assert!(!inner.borrow_mut().assign_at(0, "b", Value::Nil));
    }

    #[test]
    fn shared_frame_mutation_is_visible_to_every_holder() {
        let shared: EnvRef = Rc::new(RefCell::new(Environment::new()));
        shared.borrow_mut().define("count", Value::Number(0.0));

        let alias = Rc::clone(&shared);
        alias
            .borrow_mut()
            .assign(&ident("count"), Value::Number(5.0))
            .unwrap();

        assert_eq!(shared.borrow().get_at(0, "count"), Some(Value::Number(5.0)));
    }
}
