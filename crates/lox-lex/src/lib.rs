//! lox-lex - Lexical analyzer for the Lox language.
//!
//! The lexer transforms source text into a stream of [`Token`]s on demand.
//! It is a pure cursor over the source buffer: tokens borrow their lexemes
//! from the input and no heap allocation happens while scanning.
//!
//! Tokens are produced one at a time via [`Lexer::next_token`]; once the
//! end of input is reached every further call returns [`TokenKind::Eof`].
//! Lexical errors (an unexpected character, an unterminated string) are not
//! reported here: they surface as [`TokenKind::Error`] tokens whose lexeme
//! is the error message, and the consumer decides how to report them.
//!
//! # Example
//!
//! ```
//! use lox_lex::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("print 1 + 2;");
//! assert_eq!(lexer.next_token().kind, TokenKind::Print);
//! assert_eq!(lexer.next_token().kind, TokenKind::Number);
//! assert_eq!(lexer.next_token().kind, TokenKind::Plus);
//! ```

pub mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token, TokenKind};
