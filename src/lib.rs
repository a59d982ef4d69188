//! Braq_compiler: a whole-program compiler for a small statically typed,
//! bracket-delimited language targeting an ARM-like assembly listing
//!
//! # Architecture
//! - `types`: Cross-cutting type system used across all compilation phases
//! - `lexer`: Tokenization
//! - `ast`: Bracket tree (untyped)
//! - `parser`: Token stream → bracket tree
//! - `ir`: Type resolution and function registration
//! - `asm`: Target instruction model and serialization
//! - `codegen`: Expression-tree-directed code generation
//! - `driver`: Compilation orchestration

// Core compiler modules
pub mod types;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod ir;
pub mod asm;
pub mod codegen;
pub mod driver;
