//! Core lexer implementation.

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token, TokenKind};

/// Lexer for Lox source code.
///
/// Transforms source text into a token stream. Whitespace and `//` line
/// comments are skipped; one- or two-character operators are resolved with
/// a single character of lookahead.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    cursor: Cursor<'a>,

    /// Starting byte offset of the current token.
    token_start: usize,

    /// Line number where the current token starts (1-based).
    token_start_line: u32,

    /// Whether `Eof` has already been produced (for the iterator).
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_start_line: 1,
            finished: false,
        }
    }

    /// Returns the next token from the source code.
    ///
    /// At end of input every call returns an `Eof` token.
    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();

        if self.cursor.is_at_end() {
            return self.make_token(TokenKind::Eof);
        }

        let c = self.cursor.current_char();
        self.cursor.advance();

        match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            '{' => self.make_token(TokenKind::LeftBrace),
            '}' => self.make_token(TokenKind::RightBrace),
            ',' => self.make_token(TokenKind::Comma),
            '.' => self.make_token(TokenKind::Dot),
            '-' => self.make_token(TokenKind::Minus),
            '+' => self.make_token(TokenKind::Plus),
            ';' => self.make_token(TokenKind::Semicolon),
            '/' => self.make_token(TokenKind::Slash),
            '*' => self.make_token(TokenKind::Star),
            '!' => {
                if self.cursor.match_char('=') {
                    self.make_token(TokenKind::BangEqual)
                } else {
                    self.make_token(TokenKind::Bang)
                }
            },
            '=' => {
                if self.cursor.match_char('=') {
                    self.make_token(TokenKind::EqualEqual)
                } else {
                    self.make_token(TokenKind::Equal)
                }
            },
            '<' => {
                if self.cursor.match_char('=') {
                    self.make_token(TokenKind::LessEqual)
                } else {
                    self.make_token(TokenKind::Less)
                }
            },
            '>' => {
                if self.cursor.match_char('=') {
                    self.make_token(TokenKind::GreaterEqual)
                } else {
                    self.make_token(TokenKind::Greater)
                }
            },
            '"' => self.lex_string(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if is_ident_start(c) => self.lex_identifier(),
            _ => self.error_token("Unexpected character."),
        }
    }

    /// Skips whitespace and `//` line comments, tracking newlines.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\r' | '\t' | '\n' => self.cursor.advance(),
                '/' if self.cursor.peek_char(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                },
                _ => return,
            }
        }
    }

    /// Lexes a string literal. The lexeme includes the surrounding quotes.
    ///
    /// Strings have no escape sequences and may span lines. An unterminated
    /// string produces an `Error` token.
    fn lex_string(&mut self) -> Token<'a> {
        while !self.cursor.is_at_end() && self.cursor.current_char() != '"' {
            self.cursor.advance();
        }

        if self.cursor.is_at_end() {
            return self.error_token("Unterminated string.");
        }

        // Closing quote.
        self.cursor.advance();
        self.make_token(TokenKind::String)
    }

    /// Lexes a number literal: `[0-9]+(\.[0-9]+)?`.
    ///
    /// A trailing `.` without a following digit is not part of the number.
    fn lex_number(&mut self) -> Token<'a> {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        self.make_token(TokenKind::Number)
    }

    /// Lexes an identifier or keyword.
    fn lex_identifier(&mut self) -> Token<'a> {
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        self.make_token(keyword_from_ident(text).unwrap_or(TokenKind::Identifier))
    }

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token {
            kind,
            lexeme: self.cursor.slice_from(self.token_start),
            line: self.token_start_line,
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'a> {
        Token {
            kind: TokenKind::Error,
            lexeme: message,
            line: self.token_start_line,
        }
    }
}

/// An iterator over the token stream, ending after the `Eof` token.
impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
