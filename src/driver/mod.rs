//! Compilation orchestration

mod pipeline;

pub use pipeline::{compile_source, CompileError};
