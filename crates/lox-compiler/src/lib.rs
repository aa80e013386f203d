//! lox-compiler - Single-pass bytecode compiler for Lox.
//!
//! There is no AST: the compiler is a Pratt parser whose rules emit
//! bytecode into a [`Chunk`] at the moment each token is consumed. Every
//! semantic decision — constant emission, line attribution, assignment
//! validity — happens at consumption time, which is what makes the
//! line-per-byte map exact.
//!
//! String literals and identifier names are interned into the [`Heap`]
//! passed by the caller, so compiled chunks and the running VM agree about
//! string identity.
//!
//! Errors never abort the parse. Diagnostics are collected while panic
//! mode suppresses the cascade, the parser resynchronizes at statement
//! boundaries, and [`compile`] fails if anything was recorded.
//!
//! # Example
//!
//! ```
//! use lox_bytecode::Chunk;
//! use lox_runtime::Heap;
//!
//! let mut chunk = Chunk::new();
//! let mut heap = Heap::new();
//! assert!(lox_compiler::compile("print 1 + 2;", &mut chunk, &mut heap).is_ok());
//! ```

mod diagnostics;
mod expr;
mod parser;
mod stmt;

pub use diagnostics::{CompileError, Diagnostic, ErrorLocation};

use lox_bytecode::Chunk;
use lox_lex::TokenKind;
use lox_runtime::Heap;
use parser::Parser;

/// Compiles `source` into `chunk`.
///
/// On success the chunk ends with a `RETURN` instruction. On failure the
/// returned [`CompileError`] carries every diagnostic recorded before the
/// end of input; the chunk contents are unspecified and should be
/// discarded.
pub fn compile(source: &str, chunk: &mut Chunk, heap: &mut Heap) -> Result<(), CompileError> {
    let mut parser = Parser::new(source, chunk, heap);

    parser.advance();
    while !parser.match_token(TokenKind::Eof) {
        parser.declaration();
    }
    parser.end_compiler();

    parser.into_result()
}
