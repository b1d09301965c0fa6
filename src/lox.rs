//! A driver session: one interpreter, one diagnostic sink, many runs.
//!
//! Globals, closures and the binding table outlive a single [`Lox::run`], so
//! the REPL can define a function on one line and call it on the next.  Node
//! ids keep counting across runs for the same reason.

use std::io::{self, BufRead, Write};

use log::{debug, info};

use crate::diagnostic::Diagnostics;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    StaticError,
    RuntimeError,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticError => 65,
            Outcome::RuntimeError => 70,
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
    next_expr_id: usize,
}

impl Lox {
    /// Program output on stdout, diagnostics on stderr.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_output(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        info!("Starting Lox session");

        Self {
            interpreter: Interpreter::with_output(out),
            diagnostics: Diagnostics::with_sink(err),
            next_expr_id: 0,
        }
    }

    /// Scan, parse, resolve and execute `source`.  Each phase only runs if
    /// every earlier one was clean.
    pub fn run(&mut self, source: &str) -> Outcome {
        debug!("Running {} bytes of source", source.len());

        let mut tokens: Vec<Token> = Vec::new();
        let mut lexed_cleanly = true;
        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => {
                    lexed_cleanly = false;
                    self.diagnostics.error(&e);
                }
            }
        }

        let mut parser = Parser::with_first_id(&tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.next_id();

        let statements = match parsed {
            Ok(statements) => statements,
            Err(errors) => {
                for e in &errors {
                    self.diagnostics.error(e);
                }
                return Outcome::StaticError;
            }
        };

        // Lex errors still let the parser run so its errors get reported too.
        if !lexed_cleanly {
            return Outcome::StaticError;
        }

        match Resolver::new().resolve(&statements) {
            Ok(locals) => self.interpreter.add_locals(locals),
            Err(errors) => {
                for e in &errors {
                    self.diagnostics.error(e);
                }
                return Outcome::StaticError;
            }
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => {
                info!("Run completed");
                Outcome::Success
            }
            Err(e) => {
                debug!("Runtime debug: {}", e);
                self.diagnostics.runtime_error(&e);
                Outcome::RuntimeError
            }
        }
    }

    /// Read-eval-print loop over `input`.  A bad line does not end the
    /// session; its error flags are cleared before the next one.
    pub fn run_prompt<R: BufRead>(&mut self, input: R, prompt: &mut dyn Write) -> io::Result<()> {
        info!("Entering REPL");

        let mut lines = input.lines();
        loop {
            write!(prompt, "> ")?;
            prompt.flush()?;

            let Some(line) = lines.next() else {
                break;
            };

            let outcome = self.run(&line?);
            debug!("REPL line finished: {:?}", outcome);

            self.reset_errors();
        }

        writeln!(prompt)?;
        info!("Leaving REPL");
        Ok(())
    }

    pub fn reset_errors(&mut self) {
        self.diagnostics.reset();
    }

    pub fn had_error(&self) -> bool {
        self.diagnostics.had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.diagnostics.had_runtime_error()
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
