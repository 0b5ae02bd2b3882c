use arch::DecodeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VmError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Stack overflow (limit {0})")]
    StackOverflow(usize),

    #[error("Stack underflow")]
    StackUnderflow,

    #[error("Frame slot {0} is out of bounds")]
    SlotOutOfBounds(u64),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid heap handle: {0}")]
    InvalidHandle(i64),

    #[error("Heap exhausted (limit {0} words)")]
    HeapExhausted(usize),

    #[error("Heap index {1} out of bounds for block {0}")]
    HeapIndexOutOfBounds(i64, i64),

    #[error("RET without a matching CALL")]
    ReturnWithoutCall,
}

impl VmError {
    /// Execution exceptions are a normal halt of the program, the rest are
    /// faults of the bytecode itself.
    pub fn is_exception(&self) -> bool {
        matches!(self, VmError::DivisionByZero)
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Invalid dump config: {0}")]
    DumpConfig(String, #[source] serde_yaml::Error),
}
