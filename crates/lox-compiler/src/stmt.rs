//! Statement compilation.

use lox_bytecode::OpCode;
use lox_lex::TokenKind;

use crate::parser::Parser;

impl<'src, 'ctx> Parser<'src, 'ctx> {
    /// Compiles one declaration or statement, resynchronizing afterwards
    /// if the parser is panicking.
    pub(crate) fn declaration(&mut self) {
        if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.in_panic_mode() {
            self.synchronize();
        }
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else {
            self.expression_statement();
        }
    }

    /// `var name ( = initializer )? ;`
    ///
    /// Without an initializer the variable is bound to `nil`.
    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expected variable name.");

        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(TokenKind::Semicolon, "Expected ';' after variable declaration.");

        self.emit_with_operand(OpCode::DefineGlobal, global);
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expected ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expected ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    /// Consumes an identifier and stores its name in the constant pool.
    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);
        self.identifier_constant(self.previous.lexeme)
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
    fn test_print_statement() {
        let (chunk, _) = compile_ok("print 1;");
        assert_eq!(
            chunk.code(),
            &[C, 0, OpCode::Print as u8, OpCode::Return as u8]
        );
    }

    #[test]
    fn test_expression_statement_pops() {
        let (chunk, _) = compile_ok("1;");
        assert_eq!(chunk.code(), &[C, 0, OpCode::Pop as u8, OpCode::Return as u8]);
    }

    #[test]
    fn test_var_with_initializer() {
        let (chunk, heap) = compile_ok("var a = 7;");
        assert_eq!(
            chunk.code(),
            &[C, 1, OpCode::DefineGlobal as u8, 0, OpCode::Return as u8]
        );
        let name = chunk.constant(0).and_then(Value::as_string).expect("name constant");
        assert_eq!(heap.chars(name), "a");
        assert_eq!(chunk.constant(1), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_var_without_initializer_is_nil() {
        let (chunk, _) = compile_ok("var a;");
        assert_eq!(
            chunk.code(),
            &[OpCode::Nil as u8, OpCode::DefineGlobal as u8, 0, OpCode::Return as u8]
        );
    }

    #[test]
    fn test_var_requires_name() {
        let messages = compile_messages("var 1 = 2;");
        assert!(messages[0].contains("Expected variable name."));
    }

    #[test]
    fn test_missing_semicolon_after_value() {
        let messages = compile_messages("print 1");
        assert!(messages[0].contains("Expected ';' after value."));
    }

    #[test]
    fn test_missing_semicolon_after_expression() {
        let messages = compile_messages("1 + 2");
        assert!(messages[0].contains("Expected ';' after expression."));
    }

    #[test]
    fn test_synchronize_finds_later_errors() {
        // One diagnostic per statement: panic mode clears at the boundary.
        let messages = compile_messages("print ;\nvar 2;\nprint 3;");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("[Line 1]"));
        assert!(messages[1].contains("[Line 2]"));
    }

    #[test]
    fn test_panic_mode_suppresses_cascade() {
        // Everything after the first error in the statement is swallowed
        // until the boundary.
        let messages = compile_messages("print + + + ;");
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_keyword_boundary_resynchronizes() {
        // The statement keyword in operand position is the error; recovery
        // reaches the next boundary and nothing cascades.
        let messages = compile_messages("1 + print 2;");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Expected expression."));
    }

    #[test]
    fn test_statements_accumulate_in_one_chunk() {
        let (chunk, _) = compile_ok("var a = 1; print a;");
        let code = chunk.code();
        assert_eq!(code[2], OpCode::DefineGlobal as u8);
        assert!(code.contains(&(OpCode::GetGlobal as u8)));
        assert_eq!(code[code.len() - 1], OpCode::Return as u8);
    }

    #[test]
    fn test_lex_error_reported_via_compiler() {
        let messages = compile_messages("print \"unterminated;");
        assert!(messages[0].contains("Unterminated string."));
        // Lexical errors have no at-clause.
        assert!(!messages[0].contains("at '"));
    }

    #[test]
    fn test_unexpected_character_reported() {
        let messages = compile_messages("print 1 @ 2;");
        assert!(messages[0].contains("Unexpected character."));
    }
}
