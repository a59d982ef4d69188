use thiserror::Error;

/// Errors from declaration processing, for both type and function
/// declarations. All are fatal; the first one aborts the compile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("type '{0}' is declared twice")]
    DuplicateType(String),
    #[error("function '{0}' is declared twice")]
    DuplicateFunction(String),
    #[error("too many type construction failures: {0} declarations did not resolve")]
    TooManyFailures(usize),
    #[error("malformed declaration: {0}")]
    MalformedDeclaration(String),
}

/// Result alias for declaration processing.
pub type ResolveResult<T> = Result<T, ResolveError>;
