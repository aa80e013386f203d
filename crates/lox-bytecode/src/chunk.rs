//! The bytecode chunk.

use lox_runtime::Value;

use crate::line::LineInfo;
use crate::opcode::OpCode;

/// A compiled bytecode chunk.
///
/// Holds the instruction bytes, the constant pool, and the line map. A
/// constant's index is its position at insertion time and never changes;
/// constants are not deduplicated. The one-byte operand limit on the pool
/// is enforced by the compiler, not here.
#[derive(Debug, Default)]
pub struct Chunk {
    code: Vec<u8>,
    constants: Vec<Value>,
    lines: LineInfo,
}

impl Chunk {
    /// Creates a new empty chunk.
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            constants: Vec::new(),
            lines: LineInfo::new(),
        }
    }

    /// Appends a raw byte attributed to `line`.
    #[inline]
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Appends an opcode byte attributed to `line`.
    #[inline]
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write(op as u8, line);
    }

    /// Adds a constant to the pool and returns its index.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// The instruction bytes.
    #[inline]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// The constant at `index`, if the pool is that large.
    #[inline]
    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    /// Number of constants in the pool.
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    /// The source line for the code byte at `offset`.
    ///
    /// Offsets past the end of the code yield 0.
    pub fn get_line(&self, offset: usize) -> u32 {
        self.lines.line_at(offset).unwrap_or(0)
    }
}
