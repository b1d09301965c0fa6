#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::lox::{Lox, Outcome};

/// A `Write` sink the test keeps a handle to after boxing it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose program output and diagnostics are captured.
pub fn session() -> (Lox, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let lox = Lox::with_output(Box::new(out.clone()), Box::new(err.clone()));

    (lox, out, err)
}

/// Run `source` in a fresh session; returns (stdout, stderr, outcome).
pub fn run(source: &str) -> (String, String, Outcome) {
    let (mut lox, out, err) = session();
    let outcome = lox.run(source);

    (out.contents(), err.contents(), outcome)
}

/// Run `source`, expect success, return printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let (out, err, outcome) = run(source);
    assert_eq!(outcome, Outcome::Success, "unexpected diagnostics: {}", err);

    out.lines().map(str::to_owned).collect()
}
