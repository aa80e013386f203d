//! Expression compilation: the Pratt rule table and its rules.
//!
//! Every token kind maps to a fixed `{prefix, infix, precedence}` entry.
//! `parse_precedence` drives the climb: consume a token, run its prefix
//! rule, then fold infix rules while the next operator binds at least as
//! tightly as the requested level. Assignment context (`can_assign`) is
//! threaded to prefix rules so a stray `=` after a non-assignable target
//! becomes a diagnostic instead of silently parsing.

use lox_bytecode::OpCode;
use lox_lex::{Token, TokenKind};
use lox_runtime::Value;

use crate::parser::Parser;

/// Operator precedence, lowest to highest. Each infix operator parses its
/// right operand one level above its own (left associativity).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// A prefix or infix rule: first-class, non-capturing.
type ParseFn<'src, 'ctx> = fn(&mut Parser<'src, 'ctx>, bool);

/// One row of the rule table.
pub(crate) struct ParseRule<'src, 'ctx> {
    prefix: Option<ParseFn<'src, 'ctx>>,
    infix: Option<ParseFn<'src, 'ctx>>,
    precedence: Precedence,
}

impl<'src, 'ctx> ParseRule<'src, 'ctx> {
    const fn new(
        prefix: Option<ParseFn<'src, 'ctx>>,
        infix: Option<ParseFn<'src, 'ctx>>,
        precedence: Precedence,
    ) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    /// The fixed rule lookup. Token kinds without expression rules get the
    /// all-`None` row.
    fn rule(kind: TokenKind) -> ParseRule<'src, 'ctx> {
        match kind {
            TokenKind::LeftParen => ParseRule::new(Some(Self::grouping), None, Precedence::None),
            TokenKind::Minus => {
                ParseRule::new(Some(Self::unary), Some(Self::binary), Precedence::Term)
            },
            TokenKind::Plus => ParseRule::new(None, Some(Self::binary), Precedence::Term),
            TokenKind::Slash | TokenKind::Star => {
                ParseRule::new(None, Some(Self::binary), Precedence::Factor)
            },
            TokenKind::Bang => ParseRule::new(Some(Self::unary), None, Precedence::None),
            TokenKind::BangEqual | TokenKind::EqualEqual => {
                ParseRule::new(None, Some(Self::binary), Precedence::Equality)
            },
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => {
                ParseRule::new(None, Some(Self::binary), Precedence::Comparison)
            },
            TokenKind::Identifier => ParseRule::new(Some(Self::variable), None, Precedence::None),
            TokenKind::String => ParseRule::new(Some(Self::string), None, Precedence::None),
            TokenKind::Number => ParseRule::new(Some(Self::number), None, Precedence::None),
            TokenKind::True | TokenKind::False | TokenKind::Nil => {
                ParseRule::new(Some(Self::literal), None, Precedence::None)
            },
            _ => ParseRule::new(None, None, Precedence::None),
        }
    }

    /// Compiles a full expression.
    pub(crate) fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    /// The precedence-climbing core.
    pub(crate) fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = Self::rule(self.previous.kind).prefix else {
            self.error("Expected expression.");
            return;
        };

        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= Self::rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = Self::rule(self.previous.kind).infix {
                infix(self, can_assign);
            }
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// `( expression )`
    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expected ')' after expression.");
    }

    /// Prefix `-` and `!`.
    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;

        // Compile the operand first; the opcode applies to its result.
        self.parse_precedence(Precedence::Unary);

        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("unary rule on non-unary token"),
        }
    }

    /// Left-associative binary operators. `!=`, `<=`, and `>=` compile to
    /// the complementary opcode followed by `NOT`.
    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        let rule = Self::rule(operator);
        self.parse_precedence(rule.precedence.next());

        match operator {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::BangEqual => self.emit_ops(OpCode::Equal, OpCode::Not),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_ops(OpCode::Greater, OpCode::Not),
            _ => unreachable!("binary rule on non-binary token"),
        }
    }

    /// Number literal, parsed with the host's `f64` semantics.
    fn number(&mut self, _can_assign: bool) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    /// String literal: the inner bytes are interned.
    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let id = self.heap.intern(contents);
        self.emit_constant(Value::string(id));
    }

    /// `true`, `false`, `nil`.
    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            _ => unreachable!("literal rule on non-literal token"),
        }
    }

    /// Identifier: a global read, or a global assignment when an `=`
    /// follows in assignment context.
    fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous, can_assign);
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let arg = self.identifier_constant(name.lexeme);

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_with_operand(OpCode::SetGlobal, arg);
        } else {
            self.emit_with_operand(OpCode::GetGlobal, arg);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;
    use lox_bytecode::{Chunk, OpCode};
    use lox_runtime::{Heap, Value};

    fn compile_ok(source: &str) -> (Chunk, Heap) {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        compile(source, &mut chunk, &mut heap).expect("compile failed");
        (chunk, heap)
    }

    fn compile_messages(source: &str) -> Vec<String> {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        compile(source, &mut chunk, &mut heap)
            .expect_err("compile should fail")
            .diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    const C: u8 = OpCode::Constant as u8;

    #[test]
    fn test_precedence_factor_over_term() {
        let (chunk, _) = compile_ok("1 + 2 * 3;");
        assert_eq!(
            chunk.code(),
            &[
                C, 0,
                C, 1,
                C, 2,
                OpCode::Multiply as u8,
                OpCode::Add as u8,
                OpCode::Pop as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        let (chunk, _) = compile_ok("(1 + 2) * 3;");
        assert_eq!(
            chunk.code(),
            &[
                C, 0,
                C, 1,
                OpCode::Add as u8,
                C, 2,
                OpCode::Multiply as u8,
                OpCode::Pop as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_left_associativity() {
        let (chunk, _) = compile_ok("1 - 2 - 3;");
        assert_eq!(
            chunk.code(),
            &[
                C, 0,
                C, 1,
                OpCode::Subtract as u8,
                C, 2,
                OpCode::Subtract as u8,
                OpCode::Pop as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_unary_negate() {
        let (chunk, _) = compile_ok("-4;");
        assert_eq!(
            chunk.code(),
            &[C, 0, OpCode::Negate as u8, OpCode::Pop as u8, OpCode::Return as u8]
        );
    }

    #[test]
    fn test_double_negation_nests() {
        let (chunk, _) = compile_ok("!!true;");
        assert_eq!(
            chunk.code(),
            &[
                OpCode::True as u8,
                OpCode::Not as u8,
                OpCode::Not as u8,
                OpCode::Pop as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_desugared_comparisons() {
        let (chunk, _) = compile_ok("1 != 2;");
        assert_eq!(chunk.code()[4..6], [OpCode::Equal as u8, OpCode::Not as u8]);

        let (chunk, _) = compile_ok("1 <= 2;");
        assert_eq!(chunk.code()[4..6], [OpCode::Greater as u8, OpCode::Not as u8]);

        let (chunk, _) = compile_ok("1 >= 2;");
        assert_eq!(chunk.code()[4..6], [OpCode::Less as u8, OpCode::Not as u8]);
    }

    #[test]
    fn test_literals() {
        let (chunk, _) = compile_ok("nil;");
        assert_eq!(chunk.code()[0], OpCode::Nil as u8);
        let (chunk, _) = compile_ok("true;");
        assert_eq!(chunk.code()[0], OpCode::True as u8);
        let (chunk, _) = compile_ok("false;");
        assert_eq!(chunk.code()[0], OpCode::False as u8);
    }

    #[test]
    fn test_number_constant_value() {
        let (chunk, _) = compile_ok("2.5;");
        assert_eq!(chunk.constant(0), Some(Value::Number(2.5)));
    }

    #[test]
    fn test_string_literal_interned_without_quotes() {
        let (chunk, heap) = compile_ok("\"hello\";");
        let id = chunk.constant(0).and_then(Value::as_string).expect("string constant");
        assert_eq!(heap.chars(id), "hello");
    }

    #[test]
    fn test_equal_string_literals_share_an_object() {
        let (chunk, _heap) = compile_ok("\"a\" == \"a\";");
        // Two constant slots (no pool deduplication), one interned object.
        assert_eq!(chunk.constant(0), chunk.constant(1));
        assert_eq!(chunk.constant_count(), 2);
    }

    #[test]
    fn test_get_global() {
        let (chunk, heap) = compile_ok("x;");
        assert_eq!(chunk.code()[0], OpCode::GetGlobal as u8);
        let id = chunk.constant(0).and_then(Value::as_string).expect("name constant");
        assert_eq!(heap.chars(id), "x");
    }

    #[test]
    fn test_assignment_leaves_value_expression() {
        let (chunk, _) = compile_ok("a = 1;");
        assert_eq!(
            chunk.code(),
            &[
                C, 1,
                OpCode::SetGlobal as u8,
                0,
                OpCode::Pop as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_assignment_is_right_associative_through_expression() {
        // `a = b = 1` is valid: the inner assignment is the value.
        let (chunk, _) = compile_ok("a = b = 1;");
        let set = OpCode::SetGlobal as u8;
        let code = chunk.code();
        assert_eq!(code.iter().filter(|&&b| b == set).count(), 2);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let messages = compile_messages("1 + 2 = 3;");
        assert!(messages[0].contains("Invalid assignment target."));
    }

    #[test]
    fn test_assignment_invalid_inside_grouping() {
        let messages = compile_messages("(a) = 3;");
        assert!(messages[0].contains("Invalid assignment target."));
    }

    #[test]
    fn test_missing_close_paren() {
        let messages = compile_messages("(1 + 2;");
        assert!(messages[0].contains("Expected ')' after expression."));
    }

    #[test]
    fn test_expected_expression_at_end() {
        let messages = compile_messages("1 +");
        assert!(messages[0].contains("at end"));
        assert!(messages[0].contains("Expected expression."));
    }

    #[test]
    fn test_bytes_carry_previous_token_line() {
        let (chunk, _) = compile_ok("1 +\n2;");
        // CONSTANT 1 on line 1; the ADD emitted after consuming `2` is
        // attributed to line 2.
        assert_eq!(chunk.get_line(0), 1);
        assert_eq!(chunk.get_line(4), 2);
    }
}
