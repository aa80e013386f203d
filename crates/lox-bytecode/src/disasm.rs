//! Chunk disassembler.
//!
//! Renders a chunk in a stable text format:
//!
//! ```text
//! == <name> ==
//! 0000    1 OP_CONSTANT         0 '7'
//! 0002    | OP_PRINT
//! 0003    | OP_RETURN
//! ```
//!
//! The line column repeats `   |` when the byte shares its source line
//! with the preceding offset. Constant operands are followed by the
//! constant's canonical value in quotes.

use lox_runtime::Heap;

use crate::chunk::Chunk;
use crate::opcode::OpCode;

/// Disassembles a whole chunk under a header naming it.
pub fn disassemble(chunk: &Chunk, name: &str, heap: &Heap) -> String {
    let mut out = format!("== {name} ==\n");

    let mut offset = 0;
    while offset < chunk.code().len() {
        let (text, next) = disassemble_instruction(chunk, offset, heap);
        out.push_str(&text);
        out.push('\n');
        offset = next;
    }

    out
}

/// Disassembles the single instruction at `offset`.
///
/// Returns the rendered line and the offset of the next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, heap: &Heap) -> (String, usize) {
    let mut text = format!("{offset:04} ");

    if offset > 0 && chunk.get_line(offset) == chunk.get_line(offset - 1) {
        text.push_str("   | ");
    } else {
        text.push_str(&format!("{:4} ", chunk.get_line(offset)));
    }

    let byte = chunk.code()[offset];
    let Some(op) = OpCode::from_byte(byte) else {
        text.push_str(&format!("Unknown opcode {byte}"));
        return (text, offset + 1);
    };

    if op.has_constant_operand() {
        match chunk.code().get(offset + 1) {
            Some(&index) => {
                text.push_str(&format!("{:<16} {index:4} '", op.name()));
                match chunk.constant(usize::from(index)) {
                    Some(value) => text.push_str(&format!("{}", heap.display(value))),
                    None => text.push_str("<bad constant>"),
                }
                text.push('\'');
                (text, offset + 2)
            },
            None => {
                text.push_str(&format!("{:<16} <truncated>", op.name()));
                (text, offset + 1)
            },
        }
    } else {
        text.push_str(op.name());
        (text, offset + 1)
    }
}
