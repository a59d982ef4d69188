//! Target instruction model and serialization
//!
//! Every construct the listing can contain is a closed variant here:
//! registers, special MMIO constants, labels with value identity, operand
//! values, memory locations, and lines. Serialization is one `Display`
//! impl per variant; the final listing is lines joined by newlines.

mod label;
mod lines;

pub use label::Label;
pub use lines::{Condition, Constant, Line, MemoryLocation, Register, SpecialConstant, Value};
