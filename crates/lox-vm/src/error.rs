//! VM error types.

use lox_compiler::CompileError;
use thiserror::Error;

/// A runtime failure, attributed to the line of the faulting instruction.
///
/// The `Display` form is the canonical two-line stderr report:
/// the message, then `[line N] in script`.
#[derive(Debug, Error)]
#[error("{message}\n[line {line}] in script")]
pub struct RuntimeError {
    pub message: String,
    pub line: u32,
}

/// Failure of [`crate::Vm::interpret`]: either compilation or execution.
///
/// The driver maps the variants to exit codes 65 and 70.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display() {
        let err = RuntimeError {
            message: "Operands must be numbers.".to_string(),
            line: 3,
        };
        assert_eq!(err.to_string(), "Operands must be numbers.\n[line 3] in script");
    }
}
