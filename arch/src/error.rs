use crate::op::OpCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Instruction pointer out of bounds: {0}")]
    IpOutOfBounds(usize),

    #[error("Instruction at {0} overflows the program")]
    IpOverflow(usize),

    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpCode(u8),

    #[error("Unresolved placeholder `{0}` in instruction stream")]
    Unresolved(OpCode),

    #[error("Unknown syscall code: 0x{0:02X}")]
    UnknownSyscallCode(u8),
}
