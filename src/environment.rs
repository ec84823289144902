use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Closures keep their defining frame alive
/// through this, so a frame outlives its block whenever a function captured it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope frame.  A binding holding `None` was declared without an
/// initializer and has not been assigned yet; that is distinct from `nil`.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Option<Value>>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Convenience for the common `Rc::new(RefCell::new(..))` dance.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), Some(value));
    }

    /// Bind `name` without a value; reading it is an error until assigned.
    pub fn declare(&mut self, name: &str) {
        self.values.insert(name.to_string(), None);
    }

    /// Dynamic lookup walking outward through the chain.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        match self.values.get(&name.lexeme) {
            Some(slot) => read_slot(slot, name),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(RuntimeError::UndefinedVariable {
                    name: name.lexeme.clone(),
                    line: name.line,
                }),
            },
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = Some(value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.clone(),
                line: name.line,
            })
        }
    }

    /// The frame `distance` hops out from `env` (0 is `env` itself).
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing();
            match next {
                Some(next) => current = next,
                // The resolver only hands out distances that exist.
                None => {
                    debug!("Resolved distance {} ran past the global frame", distance);
                    break;
                }
            }
        }

        current
    }

    /// Lookup at a statically resolved distance; no chain walk.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value, RuntimeError> {
        let frame = Self::ancestor(env, distance);
        let frame = frame.borrow();

        match frame.values.get(&name.lexeme) {
            Some(slot) => read_slot(slot, name),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.clone(),
                line: name.line,
            }),
        }
    }

    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.clone(),
                line: name.line,
            }),
        }
    }
}

fn read_slot(slot: &Option<Value>, name: &Token) -> Result<Value, RuntimeError> {
    slot.clone().ok_or_else(|| RuntimeError::UnassignedVariable {
        name: name.lexeme.clone(),
        line: name.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn lookup_walks_outward() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::child_of(&globals);

        assert_eq!(inner.borrow().get(&ident("a")), Ok(Value::Number(1.0)));
    }

    #[test]
    fn assignment_reaches_declaring_frame() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Nil);

        let inner = Environment::child_of(&globals);
        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Bool(true))
            .unwrap();

        assert_eq!(globals.borrow().get(&ident("a")), Ok(Value::Bool(true)));
    }

    #[test]
    fn unassigned_is_not_undefined() {
        let mut env = Environment::new();
        env.declare("a");

        assert!(matches!(
            env.get(&ident("a")),
            Err(RuntimeError::UnassignedVariable { .. })
        ));
        assert!(matches!(
            env.get(&ident("b")),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn distance_lookup_skips_shadowing_frames() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Number(1.0));

        let inner = Environment::child_of(&outer);
        inner.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(
            Environment::get_at(&inner, 1, &ident("x")),
            Ok(Value::Number(1.0))
        );
        assert_eq!(
            Environment::get_at(&inner, 0, &ident("x")),
            Ok(Value::Number(2.0))
        );
    }
}
