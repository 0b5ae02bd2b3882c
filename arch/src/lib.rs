pub mod error;
pub mod inst;
pub mod op;
pub mod syscall;
pub mod word;

pub use error::DecodeError;
pub use inst::Inst;
pub use op::{Arg, OpCode};
pub use syscall::SyscallCode;
pub use word::Word;
