pub mod argfmt;
pub mod ast;
pub mod builtins;
pub mod check;
pub mod error;
pub mod func;
pub mod io_reader;
pub mod number;
pub mod reader;
pub mod runtime;
pub mod seq;
pub mod types;

use std::io::Cursor;

pub use ast::{Param, Sexpr, Value};
pub use error::AniseError;
pub use runtime::{Interpret, RunOptions, SharedBuffer};

/// Run a program with empty standard input and return everything it
/// printed.
pub fn run_source(source: &str) -> Result<String, AniseError> {
    run_source_with_options(source, "", RunOptions::default())
}

/// Run a program against the given standard-input text.
pub fn run_source_with_input(source: &str, stdin: &str) -> Result<String, AniseError> {
    run_source_with_options(source, stdin, RunOptions::default())
}

pub fn run_source_with_options(
    source: &str,
    stdin: &str,
    options: RunOptions,
) -> Result<String, AniseError> {
    let buffer = SharedBuffer::default();
    let interp = Interpret::with_options(Box::new(buffer.clone()), options);
    interp.load_program(source)?;
    interp.check()?;
    interp.run_with_input(Cursor::new(stdin.to_owned()))?;
    Ok(buffer.contents())
}
