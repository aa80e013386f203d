//! The virtual machine and its dispatch loop.

use lox_bytecode::{disasm, Chunk, OpCode};
use lox_runtime::{Heap, ObjRef, StrId, Table, Value};

use crate::error::{InterpretError, RuntimeError};

/// Value stack capacity reserved up front. The stack may grow past this,
/// but the core language never needs it to.
const STACK_RESERVE: usize = 256;

/// Pops two operands, applies a numeric operator, pushes the wrapped
/// result. Anything but two numbers is a runtime error.
macro_rules! binary_op {
    ($vm:ident, $chunk:ident, $ip:ident, $wrap:expr, $op:tt) => {{
        let b = $vm.pop();
        let a = $vm.pop();
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => $vm.push($wrap(a $op b)),
            _ => return Err(error_at($chunk, $ip, "Operands must be numbers.")),
        }
    }};
}

/// The Lox virtual machine.
///
/// Owns the value stack, the global bindings, and the heap. A single `Vm`
/// is constructed by the driver and reused for every `interpret` call of
/// the session.
pub struct Vm {
    stack: Vec<Value>,
    globals: Table,
    heap: Heap,
    trace: bool,
    dump: bool,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(STACK_RESERVE),
            globals: Table::new(),
            heap: Heap::new(),
            trace: false,
            dump: false,
        }
    }

    /// Enables per-instruction tracing: before each dispatch the stack
    /// contents and the disassembled instruction are printed to stderr.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Enables disassembling each successfully compiled chunk to stderr
    /// before it runs.
    pub fn set_dump(&mut self, dump: bool) {
        self.dump = dump;
    }

    /// Compiles and runs `source`.
    ///
    /// On a compile error the chunk is discarded and nothing executes. On
    /// a runtime error the stack is reset; globals and interned strings
    /// survive for the next call.
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpretError> {
        let mut chunk = Chunk::new();
        lox_compiler::compile(source, &mut chunk, &mut self.heap)?;

        if self.dump {
            eprint!("{}", disasm::disassemble(&chunk, "script", &self.heap));
        }

        self.run(&chunk).map_err(|err| {
            self.stack.clear();
            InterpretError::from(err)
        })
    }

    /// The dispatch loop: fetch, decode, execute until `RETURN`.
    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        let code = chunk.code();
        let mut ip = 0usize;

        loop {
            if self.trace {
                self.trace_instruction(chunk, ip);
            }

            let Some(&byte) = code.get(ip) else {
                return Err(error_at(chunk, code.len(), "Ran past the end of the chunk."));
            };
            ip += 1;

            let Some(op) = OpCode::from_byte(byte) else {
                return Err(error_at(chunk, ip, &format!("Unknown opcode {byte}.")));
            };

            match op {
                OpCode::Constant => {
                    let value = self.read_constant(chunk, &mut ip)?;
                    self.push(value);
                },
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.pop();
                },
                OpCode::DefineGlobal => {
                    let name = self.read_global_name(chunk, &mut ip)?;
                    let value = self.pop();
                    // Redefinition is allowed and overwrites.
                    self.globals.set(name, value, self.heap.objects());
                },
                OpCode::GetGlobal => {
                    let name = self.read_global_name(chunk, &mut ip)?;
                    match self.globals.get(name, self.heap.objects()) {
                        Some(value) => self.push(value),
                        None => {
                            let message =
                                format!("Undefined variable '{}'.", self.heap.chars(name));
                            return Err(error_at(chunk, ip, &message));
                        },
                    }
                },
                OpCode::SetGlobal => {
                    let name = self.read_global_name(chunk, &mut ip)?;
                    // Assignment is an expression: the value stays on the
                    // stack.
                    let value = self.peek();
                    if self.globals.set(name, value, self.heap.objects()) {
                        // The variable was never defined; undo the
                        // speculative insert so the binding does not leak.
                        self.globals.delete(name, self.heap.objects());
                        let message = format!("Undefined variable '{}'.", self.heap.chars(name));
                        return Err(error_at(chunk, ip, &message));
                    }
                },
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b));
                },
                OpCode::Greater => binary_op!(self, chunk, ip, Value::Bool, >),
                OpCode::Less => binary_op!(self, chunk, ip, Value::Bool, <),
                OpCode::Add => {
                    let b = self.pop();
                    let a = self.pop();
                    match (a, b) {
                        (Value::Number(a), Value::Number(b)) => self.push(Value::Number(a + b)),
                        (Value::Obj(ObjRef::String(a)), Value::Obj(ObjRef::String(b))) => {
                            let joined = self.heap.concat(a, b);
                            self.push(Value::string(joined));
                        },
                        _ => {
                            return Err(error_at(
                                chunk,
                                ip,
                                "Operands must be two numbers or two strings.",
                            ));
                        },
                    }
                },
                OpCode::Subtract => binary_op!(self, chunk, ip, Value::Number, -),
                OpCode::Multiply => binary_op!(self, chunk, ip, Value::Number, *),
                OpCode::Divide => binary_op!(self, chunk, ip, Value::Number, /),
                OpCode::Not => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsey()));
                },
                OpCode::Negate => match self.stack.last_mut() {
                    Some(Value::Number(n)) => *n = -*n,
                    _ => return Err(error_at(chunk, ip, "Operand must be a number.")),
                },
                OpCode::Print => {
                    let value = self.pop();
                    println!("{}", self.heap.display(value));
                },
                OpCode::Return => return Ok(()),
            }
        }
    }

    /// Reads the one-byte constant operand at `ip`.
    fn read_constant(&self, chunk: &Chunk, ip: &mut usize) -> Result<Value, RuntimeError> {
        let index = match chunk.code().get(*ip) {
            Some(&index) => usize::from(index),
            None => return Err(error_at(chunk, *ip, "Truncated instruction.")),
        };
        *ip += 1;

        chunk
            .constant(index)
            .ok_or_else(|| error_at(chunk, *ip, "Invalid constant index."))
    }

    /// Reads a constant operand that must name a global.
    fn read_global_name(&self, chunk: &Chunk, ip: &mut usize) -> Result<StrId, RuntimeError> {
        let value = self.read_constant(chunk, ip)?;
        value
            .as_string()
            .ok_or_else(|| error_at(chunk, *ip, "Global name is not a string."))
    }

    #[inline]
    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Compiler-emitted code never underflows the stack; a corrupt chunk
    /// reads `nil` rather than aborting the process.
    #[inline]
    fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or(Value::Nil)
    }

    #[inline]
    fn peek(&self) -> Value {
        self.stack.last().copied().unwrap_or(Value::Nil)
    }

    fn trace_instruction(&self, chunk: &Chunk, ip: usize) {
        let mut slots = String::from("          ");
        for value in &self.stack {
            slots.push_str(&format!("[ {} ]", self.heap.display(*value)));
        }
        eprintln!("{slots}");

        if ip < chunk.code().len() {
            let (text, _) = disasm::disassemble_instruction(chunk, ip, &self.heap);
            eprintln!("{text}");
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a runtime error attributed to the instruction ending at `ip`.
fn error_at(chunk: &Chunk, ip: usize, message: &str) -> RuntimeError {
    RuntimeError {
        message: message.to_string(),
        line: chunk.get_line(ip.saturating_sub(1)),
    }
}
