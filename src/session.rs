//! The four-stage pipeline: scan → parse → resolve → interpret.
//!
//! A [`Session`] owns one [`Interpreter`] so globals survive between calls to
//! [`Session::run`] (the REPL relies on this) and one [`Diagnostics`] that
//! each stage reports into.  A static error stops the pipeline before the
//! interpreter sees anything.

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use log::{debug, info};

use crate::error::Diagnostics;
use crate::interpreter::{Input, Interpreter, Output};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Outcome of one run, mapped onto process exit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Lexical, syntax or resolution error.
    StaticError,
    RuntimeError,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::StaticError => 65,
            Status::RuntimeError => 70,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
    captured: Option<Rc<RefCell<String>>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session using the process's stdin / stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
            diagnostics: Diagnostics::new(),
            captured: None,
        }
    }

    /// Session whose program output is kept in memory (see [`Session::output`])
    /// and whose input comes from `input`.
    pub fn captured(input: &str) -> Self {
        let buffer: Rc<RefCell<String>> = Rc::new(RefCell::new(String::new()));
        let input = Input::Reader(Box::new(Cursor::new(input.to_owned())));

        Self {
            interpreter: Interpreter::with_io(input, Output::Buffer(Rc::clone(&buffer))),
            diagnostics: Diagnostics::new(),
            captured: Some(buffer),
        }
    }

    /// Run one unit of source text through the whole pipeline.  Reports and
    /// flags left over from the previous run are cleared first.
    pub fn run(&mut self, source: &str) -> Status {
        info!("Running {} bytes of source", source.len());

        self.diagnostics.reset();

        let tokens = Scanner::new(source).scan_tokens(&mut self.diagnostics);

        let statements = Parser::new(&tokens, &mut self.diagnostics).parse();

        if self.diagnostics.had_error() {
            debug!("Static errors after parsing, skipping resolution");
            return Status::StaticError;
        }

        Resolver::new(&mut self.interpreter, &mut self.diagnostics).resolve(&statements);

        if self.diagnostics.had_error() {
            debug!("Static errors after resolution, skipping execution");
            return Status::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Status::Ok,
            Err(e) => {
                debug!("Runtime error: {}", e);
                self.diagnostics.report_runtime(e);
                Status::RuntimeError
            }
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Everything the program wrote so far; empty unless built with
    /// [`Session::captured`].
    pub fn output(&self) -> String {
        self.captured
            .as_ref()
            .map(|buffer| buffer.borrow().clone())
            .unwrap_or_default()
    }
}
