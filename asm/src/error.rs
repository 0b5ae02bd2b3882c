use arch::{Arg, OpCode};
use color_print::cprintln;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown operation: `{0}`")]
    UnknownOperation(String),

    #[error("Operands of `{0}` do not match its signature {1:?}")]
    SignatureMismatch(OpCode, Vec<Arg>),

    #[error("Malformed IR element: {0}")]
    Malformed(String),

    #[error("Undefined label: `{0}`")]
    UndefinedLabel(String),

    #[error("Re-defined label: `{0}`")]
    RedefinedLabel(String),

    #[error("Failed to parse IR: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),
}

impl Error {
    /// Print error with the offending file and, when known, the IR element index.
    pub fn print_diag(&self, file: &str, index: Option<usize>) {
        cprintln!("<red,bold>error</>: {}", self);
        match index {
            Some(idx) => cprintln!("     <blue>--></> <underline>{}[{}]</>", file, idx),
            None => cprintln!("     <blue>--></> <underline>{}</>", file),
        }
    }
}
