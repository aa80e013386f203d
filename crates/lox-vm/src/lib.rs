//! lox-vm - The stack-based virtual machine.
//!
//! [`Vm`] owns every long-lived resource of a session: the value stack,
//! the heap (object arena plus intern table), and the table of global
//! bindings. [`Vm::interpret`] compiles a source string into a fresh chunk
//! and executes it; the chunk is discarded afterwards, the session state
//! persists, which is what makes the REPL accumulate definitions across
//! lines.
//!
//! Program output (`print`) goes to stdout. Diagnostics are returned as
//! values — [`InterpretError`] — and rendered to stderr by the driver.

mod error;
mod vm;

pub use error::{InterpretError, RuntimeError};
pub use vm::Vm;
