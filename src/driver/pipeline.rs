//! Front-to-back pipeline: tokens, tree, tables, listing.

use thiserror::Error;

use crate::codegen::{AsmGenerator, CodegenError};
use crate::ir::{FunctionRegistry, ResolveError, TypeResolver};
use crate::lexer::{LexError, Lexer};
use crate::parser::{ParseError, Parser};

/// Any failure along the pipeline. The first error aborts the compile;
/// nothing is emitted on failure.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),
    #[error("program root must hold a type section and a function section")]
    MalformedProgram,
}

/// Compile one source file to the final assembly listing.
pub fn compile_source(source: &str) -> Result<String, CompileError> {
    let tokens = Lexer::new().lex(source)?;
    let root = Parser::new(tokens).parse_program()?;

    let sections = root.as_list().ok_or(CompileError::MalformedProgram)?;
    let (type_decls, func_decls) = match sections {
        [types, funcs] => (types, funcs),
        _ => return Err(CompileError::MalformedProgram),
    };

    let mut resolver = TypeResolver::new();
    resolver.resolve_declarations(type_decls)?;
    let funcs = FunctionRegistry::from_declarations(&resolver, func_decls)?;

    let generator = AsmGenerator::new(&resolver, &funcs);
    Ok(generator.compile_program()?)
}
