use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::word::Word;

/// Opcode of the Ede virtual machine.
///
/// The byte value of each opcode is its declaration order. Opcodes after
/// `HSTORE` are placeholders: they only appear in the IR and are rewritten
/// by the assembler before the stream can be executed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[repr(u8)]
pub enum OpCode {
    NOOP,
    PUSH,
    POP,
    IADD,
    ISUB,
    IMUL,
    IDIV,
    DADD,
    DSUB,
    DMUL,
    DDIV,
    SLOAD,
    SSTORE,
    EQ,
    NEQ,
    JUMP,
    JUMPZ,
    JUMPNZ,
    SYSCALL,
    SWAP,
    CALL,
    RET,
    PACK,
    SCAT,
    HLOAD,
    HSTORE,

    // Placeholders
    PUSHI,
    PUSHD,
    JUMPL,
    JUMPZL,
    JUMPNZL,
    CALLL,
}

impl OpCode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_uppercase().parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Undefined Op: {s}")),
        }
    }
}

/// Operand kind in an opcode signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Arg {
    Word,
    Int,
    Double,
    Slot,
    Count,
    Offset,
    Label,
    Syscall,
}

impl Arg {
    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Arg::Syscall => 1,
            _ => Word::SIZE,
        }
    }
}

impl OpCode {
    pub fn arg_field(&self) -> Vec<Arg> {
        use OpCode::*;
        match self {
            PUSH => vec![Arg::Word],
            SLOAD | SSTORE => vec![Arg::Slot],
            JUMP | JUMPZ | JUMPNZ => vec![Arg::Offset],
            SYSCALL => vec![Arg::Syscall],
            CALL => vec![Arg::Offset, Arg::Count],
            PACK => vec![Arg::Count],
            PUSHI => vec![Arg::Int],
            PUSHD => vec![Arg::Double],
            JUMPL | JUMPZL | JUMPNZL => vec![Arg::Label],
            CALLL => vec![Arg::Label, Arg::Count],
            NOOP | POP | IADD | ISUB | IMUL | IDIV | DADD | DSUB | DMUL | DDIV | EQ | NEQ
            | SWAP | RET | SCAT | HLOAD | HSTORE => vec![],
        }
    }

    /// Encoded size: one tag byte plus the operands.
    pub fn size(&self) -> usize {
        1 + self.arg_field().iter().map(Arg::size).sum::<usize>()
    }

    pub fn is_placeholder(&self) -> bool {
        self.concrete() != *self
    }

    /// The opcode a placeholder resolves to.
    pub fn concrete(&self) -> OpCode {
        use OpCode::*;
        match self {
            PUSHI | PUSHD => PUSH,
            JUMPL => JUMP,
            JUMPZL => JUMPZ,
            JUMPNZL => JUMPNZ,
            CALLL => CALL,
            op => *op,
        }
    }
}
