//! Cross-cutting type system for the Braq compiler
//!
//! This module contains the type model and utilities used across all
//! compilation phases: the shared `Ty` handle, byte sizes and frame
//! padding, structural equality, and the seeded table of primitive types.

mod table;
mod ty;

// Re-export all public types
pub use table::TypeTable;
pub use ty::{word_bytes, Field, Ty, TyData, TyKind};
