//! Semantic middle end
//!
//! Builds the two tables code generation runs against: the name→type
//! table (declaration fixpoint plus pointer-target resolution) and the
//! name→function registry. Both are complete and immutable before the
//! first instruction is emitted.

mod functions;
mod type_resolver;
mod types;

pub use functions::{Function, FunctionRegistry};
pub use type_resolver::TypeResolver;
pub use types::{ResolveError, ResolveResult};
