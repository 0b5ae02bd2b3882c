pub mod encode;
pub mod error;
pub mod ir;
pub mod label;
pub mod util;

pub use encode::{assemble, Binary};
pub use error::Error;
pub use ir::{Code, Element, Inst, Operand};
pub use label::Labels;
