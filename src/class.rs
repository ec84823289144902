use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, Function};
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// A class value.  Calling it constructs an [`Instance`].
#[derive(Clone, Debug)]
pub struct Class(Rc<ClassImpl>);

#[derive(Debug)]
pub struct ClassImpl {
    pub name: String,
    pub superclass: Option<Class>,
    pub methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(name: &str, superclass: Option<Class>, methods: HashMap<String, Function>) -> Self {
        Class(Rc::new(ClassImpl {
            name: name.to_owned(),
            superclass,
            methods,
        }))
    }

    /// Look `name` up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<&Function> {
        match self.methods.get(name) {
            Some(method) => Some(method),
            None => self.superclass.as_ref()?.find_method(name),
        }
    }
}

impl Callable for Class {
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn call_unchecked(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Constructing instance of '{}'", self.name);

        let instance = Value::Instance(Instance::new(self));

        if let Some(init) = self.find_method("init") {
            init.bind(instance.clone())
                .call_unchecked(interpreter, args, line)?;
        }

        Ok(instance)
    }
}

impl Deref for Class {
    type Target = ClassImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An object created by calling a [`Class`].
#[derive(Clone)]
pub struct Instance(Rc<RefCell<InstanceImpl>>);

pub struct InstanceImpl {
    pub class: Class,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: &Class) -> Self {
        Instance(Rc::new(RefCell::new(InstanceImpl {
            class: class.clone(),
            fields: HashMap::new(),
        })))
    }

    pub fn class(&self) -> Class {
        self.0.borrow().class.clone()
    }

    /// Own fields shadow methods; a method comes back bound to `self`.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.0.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let class: Class = self.class();

        match class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(
                method.bind(Value::Instance(self.clone())),
            )),
            None => Err(RuntimeError::UndefinedProperty {
                name: name.lexeme.clone(),
                line: name.line,
            }),
        }
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.0
            .borrow_mut()
            .fields
            .insert(name.lexeme.clone(), value);
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Fields may point back at the instance, so only their names are shown.
impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        let mut fields: Vec<&String> = inner.fields.keys().collect();
        fields.sort();

        f.debug_struct("Instance")
            .field("class", &inner.class.name)
            .field("fields", &fields)
            .finish()
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.0.borrow().class.name)
    }
}
