use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::interpreter::{ControlFlow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything a call expression can invoke.
pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    /// Invoke with an argument count already known to match [`arity`].
    ///
    /// [`arity`]: Callable::arity
    fn call_unchecked(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError>;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let expected = self.arity();
        let got = args.len();

        if expected != got {
            return Err(RuntimeError::ArityMismatch {
                expected,
                got,
                line,
            });
        }

        self.call_unchecked(interpreter, args, line)
    }
}

/// Host function signature.  Errors are plain messages; the caller attaches
/// the line of the call site.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, String>;

#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn name(&self) -> &str {
        self.name
    }

    fn call_unchecked(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, &args).map_err(|message| RuntimeError::Native { message, line })
    }
}

/// A user-defined function or method together with the frame it closes over.
#[derive(Clone)]
pub struct Function(Rc<FunctionImpl>);

pub struct FunctionImpl {
    pub decl: Rc<FunctionDecl>,
    pub closure: EnvRef,
    /// `init` methods always hand back `this`.
    pub is_initializer: bool,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Function(Rc::new(FunctionImpl {
            decl,
            closure,
            is_initializer,
        }))
    }

    /// A copy of this method whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Value) -> Function {
        let env = Environment::child_of(&self.closure);
        env.borrow_mut().define("this", instance);

        Function::new(Rc::clone(&self.decl), env, self.is_initializer)
    }

    fn this_token(&self) -> Token {
        Token::synthetic("this", self.decl.name.line)
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn name(&self) -> &str {
        &self.decl.name.lexeme
    }

    fn call_unchecked(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        _line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling user-defined function '{}'", self.name());

        let env = Environment::child_of(&self.closure);

        for (param, arg) in self.decl.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        let flow = interpreter.execute_block(&self.decl.body, env)?;

        if self.is_initializer {
            return Environment::get_at(&self.closure, 0, &self.this_token());
        }

        Ok(match flow {
            ControlFlow::Return(value) => value,
            ControlFlow::Normal => Value::Nil,
        })
    }
}

impl Deref for Function {
    type Target = FunctionImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// The closure may contain this very function, so it is left out.
impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.decl.name.lexeme)
            .field("arity", &self.decl.params.len())
            .finish()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
