//! Tree‑walking evaluator.
//!
//! Statements execute against a chain of [`Environment`] frames.  Variable
//! references the resolver bound to a local scope are read at their recorded
//! distance; everything else goes straight to the globals.
//!
//! `return` travels up as [`ControlFlow::Return`] in the `Ok` channel, runtime
//! failures as [`RuntimeError`] in the `Err` channel, so the two can never be
//! confused.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{Callable, Function};
use crate::class::Class;
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::natives;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    /// Unwinding to the nearest function call boundary.
    Return(Value),
}

/// Where `print` / `printLine` write to.
#[derive(Debug, Clone)]
pub enum Output {
    Stdout,
    /// Captured in memory, for embedding and tests.
    Buffer(Rc<RefCell<String>>),
}

/// Where `readLine` reads from.
pub enum Input {
    /// The process's stdin, locked per read so the REPL and `readLine`
    /// draw from one buffer.
    Stdin,
    Reader(Box<dyn BufRead>),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Output,
    input: Input,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter wired to the process's stdin / stdout.
    pub fn new() -> Self {
        Self::with_io(Input::Stdin, Output::Stdout)
    }

    /// Creates an Interpreter over the given I/O and defines the native functions.
    pub fn with_io(input: Input, output: Output) -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();
        natives::define_all(&mut globals);

        let globals: EnvRef = Rc::new(RefCell::new(globals));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            input,
        }
    }

    /// Record that the reference `id` lives `depth` scopes out.  Called by the
    /// resolver; ids not recorded here are globals.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Noting {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the rest.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let ControlFlow::Return(value) = self.execute(stmt)? {
                debug!("Top-level return of {} ignored", value);
                break;
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ───────────────────────────── I/O for natives ─────────────────────────

    pub fn write_output(&mut self, text: &str) -> Result<(), String> {
        match &self.output {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|e| format!("Failed to write output: {}", e))
            }

            Output::Buffer(buffer) => {
                buffer.borrow_mut().push_str(text);
                Ok(())
            }
        }
    }

    /// One line of input without its terminator, or `None` at end of input.
    pub fn read_input_line(&mut self) -> Result<Option<String>, String> {
        let mut line = String::new();

        let read = match &mut self.input {
            Input::Stdin => io::stdin().lock().read_line(&mut line),
            Input::Reader(reader) => reader.read_line(&mut line),
        }
        .map_err(|e| format!("Failed to read input: {}", e))?;

        if read == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);

        Ok(Some(line))
    }

    // ───────────────────────────── statements ──────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<ControlFlow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => {
                    let value = self.evaluate(expr)?;
                    debug!("Defining variable '{}' = {}", name.lexeme, value);
                    self.environment.borrow_mut().define(&name.lexeme, value);
                }
                None => {
                    debug!("Declaring unassigned variable '{}'", name.lexeme);
                    self.environment.borrow_mut().declare(&name.lexeme);
                }
            },

            Stmt::Block(statements) => {
                let env = Environment::child_of(&self.environment);
                return self.execute_block(statements, env);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ ControlFlow::Return(_) = self.execute(body)? {
                        return Ok(flow);
                    }
                }
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(function));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);

                return Ok(ControlFlow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass: Option<Class> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let line = match expr {
                                Expr::Variable { name, .. } => name.line,
                                _ => name.line,
                            };
                            return Err(RuntimeError::InvalidSuperclass { line });
                        }
                    },
                    None => None,
                };

                // Bound first so methods can refer to the class by name.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                // Methods of a subclass close over an extra frame holding `super`.
                let method_env: EnvRef = match &superclass {
                    Some(class) => {
                        let env = Environment::child_of(&self.environment);
                        env.borrow_mut()
                            .define("super", Value::Class(class.clone()));
                        env
                    }
                    None => Rc::clone(&self.environment),
                };

                let table: HashMap<String, Function> = methods
                    .iter()
                    .map(|decl| {
                        let is_init = decl.name.lexeme == "init";
                        let method = Function::new(Rc::clone(decl), Rc::clone(&method_env), is_init);
                        (decl.name.lexeme.clone(), method)
                    })
                    .collect();

                info!(
                    "Class '{}' defined with {} methods",
                    name.lexeme,
                    table.len()
                );

                let class = Class::new(&name.lexeme, superclass, table);
                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(class))?;
            }
        }

        Ok(ControlFlow::Normal)
    }

    /// Run `statements` inside `env`, then put the previous frame back on
    /// every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> IResult<ControlFlow> {
        let previous: EnvRef = mem::replace(&mut self.environment, env);

        let result = self.execute_all(statements);

        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<ControlFlow> {
        for stmt in statements {
            if let flow @ ControlFlow::Return(_) = self.execute(stmt)? {
                return Ok(flow);
            }
        }

        Ok(ControlFlow::Normal)
    }

    // ───────────────────────────── expressions ─────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                evaluate_binary(left, operator, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                match callee {
                    Value::Native(native) => native.call(self, args, paren.line),
                    Value::Function(function) => function.call(self, args, paren.line),
                    Value::Class(class) => class.call(self, args, paren.line),
                    _ => Err(RuntimeError::NotCallable { line: paren.line }),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(RuntimeError::NotAnInstance {
                    what: "properties",
                    line: name.line,
                }),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::NotAnInstance {
                        what: "fields",
                        line: name.line,
                    });
                };

                let value = self.evaluate(value)?;
                instance.set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::TypeMismatch {
                    message: "Operand must be a number.",
                    line: operator.line,
                }),
            },
            _ => Ok(Value::Bool(!right.is_truthy())),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// `super` sits at the resolved distance and `this` one frame nearer.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) => distance,
            None => {
                return Err(RuntimeError::UndefinedVariable {
                    name: keyword.lexeme.clone(),
                    line: keyword.line,
                })
            }
        };

        let superclass = Environment::get_at(&self.environment, distance, keyword)?;
        let this_token = Token::synthetic("this", keyword.line);
        let object = Environment::get_at(&self.environment, distance.saturating_sub(1), &this_token)?;

        let Value::Class(superclass) = superclass else {
            return Err(RuntimeError::InvalidSuperclass { line: keyword.line });
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(found.bind(object))),
            None => Err(RuntimeError::UndefinedProperty {
                name: method.lexeme.clone(),
                line: method.line,
            }),
        }
    }
}

fn numbers_required(line: usize) -> RuntimeError {
    RuntimeError::TypeMismatch {
        message: "Operands must be numbers.",
        line,
    }
}

/// Evaluates a binary operator over two already-evaluated operands.
fn evaluate_binary(left: Value, op: &Token, right: Value) -> IResult<Value> {
    let line = op.line;

    match op.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
        TokenType::PLUS => {
            return match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", a, b)))
                }
                (a, b) => {
                    debug!("Cannot add {} and {}", a.type_name(), b.type_name());
                    Err(RuntimeError::TypeMismatch {
                        message: "Operands must be two numbers or at least one string.",
                        line,
                    })
                }
            };
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(numbers_required(line));
    };

    match op.token_type {
        TokenType::MINUS => Ok(Value::Number(a - b)),
        TokenType::STAR => Ok(Value::Number(a * b)),
        TokenType::SLASH => {
            if b == 0.0 {
                Err(RuntimeError::DivisionByZero { line })
            } else {
                Ok(Value::Number(a / b))
            }
        }
        TokenType::GREATER => Ok(Value::Bool(a > b)),
        TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
        TokenType::LESS => Ok(Value::Bool(a < b)),
        TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
        _ => Err(numbers_required(line)),
    }
}
