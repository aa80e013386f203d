//! Parser state, token plumbing, and emission helpers.

use lox_bytecode::{Chunk, OpCode};
use lox_lex::{Lexer, Token, TokenKind};
use lox_runtime::{Heap, Value};

use crate::diagnostics::{CompileError, Diagnostic, ErrorLocation};

/// The compiler's parser state.
///
/// Owns the lexer and a two-token window (`previous`/`current`), and
/// writes into the chunk and heap lent by the caller. `had_error` records
/// that compilation must fail; `panic_mode` suppresses diagnostics until
/// the next statement boundary.
pub(crate) struct Parser<'src, 'ctx> {
    lexer: Lexer<'src>,
    pub(crate) previous: Token<'src>,
    pub(crate) current: Token<'src>,
    pub(crate) chunk: &'ctx mut Chunk,
    pub(crate) heap: &'ctx mut Heap,
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
    panic_mode: bool,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    pub(crate) fn new(source: &'src str, chunk: &'ctx mut Chunk, heap: &'ctx mut Heap) -> Self {
        Self {
            lexer: Lexer::new(source),
            previous: Token::placeholder(),
            current: Token::placeholder(),
            chunk,
            heap,
            diagnostics: Vec::new(),
            had_error: false,
            panic_mode: false,
        }
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    /// Shifts the token window forward, reporting and skipping any error
    /// tokens the lexer produces.
    pub(crate) fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.lexer.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            // The lexeme of an error token is its message.
            self.error_at(self.current, self.current.lexeme.to_string());
        }
    }

    /// Consumes the current token if it has the expected kind, otherwise
    /// reports `message` at it.
    pub(crate) fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consumes the current token if it matches.
    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------
    //
    // Bytes carry the previous token's line: emission always happens
    // right after the token driving it has been consumed.

    pub(crate) fn emit_byte(&mut self, byte: u8) {
        self.chunk.write(byte, self.previous.line);
    }

    pub(crate) fn emit_op(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.previous.line);
    }

    pub(crate) fn emit_ops(&mut self, first: OpCode, second: OpCode) {
        self.emit_op(first);
        self.emit_op(second);
    }

    pub(crate) fn emit_with_operand(&mut self, op: OpCode, operand: u8) {
        self.emit_op(op);
        self.emit_byte(operand);
    }

    pub(crate) fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_with_operand(OpCode::Constant, index);
    }

    /// Adds `value` to the constant pool, diagnosing overflow of the
    /// one-byte operand space.
    pub(crate) fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        if index >= usize::from(u8::MAX) {
            self.error("Too many constants in one chunk.");
            return 0;
        }
        index as u8
    }

    /// Interns an identifier and stores it in the constant pool.
    pub(crate) fn identifier_constant(&mut self, name: &str) -> u8 {
        let id = self.heap.intern(name);
        self.make_constant(Value::string(id))
    }

    pub(crate) fn end_compiler(&mut self) {
        self.emit_op(OpCode::Return);
    }

    // ------------------------------------------------------------------
    // Error handling
    // ------------------------------------------------------------------

    /// Reports an error at the previous token.
    pub(crate) fn error(&mut self, message: &str) {
        self.error_at(self.previous, message.to_string());
    }

    /// Reports an error at the current token.
    pub(crate) fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message.to_string());
    }

    fn error_at(&mut self, token: Token<'src>, message: String) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::Eof,
            TokenKind::Error => ErrorLocation::Plain,
            _ => ErrorLocation::Lexeme(token.lexeme.to_string()),
        };
        self.diagnostics.push(Diagnostic {
            line: token.line,
            location,
            message,
        });
    }

    /// Leaves panic mode by skipping to a statement boundary: just past a
    /// semicolon, or just before a statement-starting keyword.
    pub(crate) fn synchronize(&mut self) {
        self.panic_mode = false;

        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {},
            }
            self.advance();
        }
    }

    pub(crate) fn in_panic_mode(&self) -> bool {
        self.panic_mode
    }

    pub(crate) fn into_result(self) -> Result<(), CompileError> {
        if self.had_error {
            Err(CompileError {
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(())
        }
    }
}
