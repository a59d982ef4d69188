//! Expression-tree-directed code generation
//!
//! Evaluation is stack-directed: every expression is compiled against a
//! byte offset into the current frame and must leave its result as the
//! first `size(result)` bytes at `[SP+offset]`. Sub-expression
//! temporaries sit at higher offsets and are dead once the operator has
//! consumed them, so the result may overwrite them.

mod binary_ops;
mod builtins;
mod expressions;
mod local_context;
mod memory_ops;
mod statements;

use thiserror::Error;

use crate::asm::{Condition, Constant, Label, Line, MemoryLocation, Register, Value};
use crate::ir::{Function, FunctionRegistry, TypeResolver};
use crate::types::Ty;

use local_context::LocalContext;

pub(crate) const R0: Register = Register::R(0);
pub(crate) const R1: Register = Register::R(1);
pub(crate) const R2: Register = Register::R(2);
pub(crate) const R3: Register = Register::R(3);

pub(crate) fn imm(value: i32) -> Value {
    Value::Const(Constant::Int(value))
}

pub(crate) fn reg(register: Register) -> Value {
    Value::Reg(register)
}

/// The frame slot at `[SP+offset]`.
pub(crate) fn sp_slot(offset: i32) -> MemoryLocation {
    MemoryLocation::RegImm(Register::Sp, offset)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("unknown operator or function '{0}'")]
    UnknownOperator(String),
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("'{form}' expects {expected} operands, found {found}")]
    ArityMismatch {
        form: String,
        expected: String,
        found: usize,
    },
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },
    #[error("operand of '{form}' must be a pointer, found {found}")]
    NotAPointer { form: String, found: String },
    #[error("field access through non-struct type {0}")]
    NotAStruct(String),
    #[error("type {0} has no field '{1}'")]
    UnknownField(String, String),
    #[error("operand of '@@' must point to an array, found {0}")]
    NotAnArrayPointer(String),
    #[error("cannot print a value of type {0}")]
    Unprintable(String),
    #[error("malformed expression: {0}")]
    MalformedExpression(String),
    #[error("floating-point code generation is not supported")]
    FloatUnsupported,
    #[error("no function named 'main'")]
    MissingMain,
    #[error(transparent)]
    Resolve(#[from] crate::ir::ResolveError),
}

/// Result alias for code generation.
pub type GenResult<T> = Result<T, CodegenError>;

pub struct AsmGenerator<'a> {
    resolver: &'a TypeResolver,
    funcs: &'a FunctionRegistry,
    /// Label + `.ASCIZ` pairs for string literals, appended after all code.
    data: Vec<Line>,
    copy_label: Label,
}

impl<'a> AsmGenerator<'a> {
    pub fn new(resolver: &'a TypeResolver, funcs: &'a FunctionRegistry) -> AsmGenerator<'a> {
        AsmGenerator {
            resolver,
            funcs,
            data: Vec::new(),
            copy_label: Label::fresh(),
        }
    }

    /// Assemble the whole listing: entry stub, copy subroutine, function
    /// bodies in declaration order, string data, stack label. Adjacent
    /// labels are then merged and every line serialized.
    pub fn compile_program(mut self) -> GenResult<String> {
        let funcs = self.funcs;
        let main = funcs.get("main").ok_or(CodegenError::MissingMain)?;
        let stack = Label::fresh();

        let mut lines = vec![
            Line::Mov(Register::Sp, Value::Const(Constant::Label(stack.clone()))),
            Line::BranchLink(main.entry.clone()),
            Line::Halt,
        ];
        lines.extend(self.copy_subroutine());
        for func in funcs.iter() {
            lines.extend(self.gen_function(func)?);
        }
        lines.append(&mut self.data);
        lines.push(Line::Align(4));
        lines.push(Line::Label(stack));

        coalesce_labels(&mut lines);
        let rendered: Vec<String> = lines.iter().map(ToString::to_string).collect();
        Ok(rendered.join("\n"))
    }

    /// Entry label, save LR past the return-value slot, then the body.
    /// Locals start past the parameter block; the body is responsible for
    /// ending in a `return` form.
    fn gen_function(&mut self, func: &Function) -> GenResult<Vec<Line>> {
        let ret_size = func.return_type.size();
        let mut lines = vec![
            Line::Label(func.entry.clone()),
            Line::Str(Register::Lr, sp_slot(ret_size)),
        ];
        let ctx = LocalContext::for_function(func);
        let memory_start = func.total_parameter_size() + ret_size + 4;
        let (code, _) = self.gen_expr(&ctx, &func.body, memory_start)?;
        lines.extend(code);
        Ok(lines)
    }

    /// Byte-copy helper reachable by BL: R0 source, R1 destination, R2
    /// count. Uses only R0–R3 and never nests a call, so LR survives.
    fn copy_subroutine(&self) -> Vec<Line> {
        let done = Label::fresh();
        vec![
            Line::Label(self.copy_label.clone()),
            Line::Cmp(R2, imm(0)),
            Line::Branch(Condition::Eq, done.clone()),
            Line::Ldrb(R3, MemoryLocation::Reg(R0)),
            Line::Strb(R3, MemoryLocation::Reg(R1)),
            Line::Add(R0, R0, imm(1)),
            Line::Add(R1, R1, imm(1)),
            Line::Sub(R2, R2, imm(1)),
            Line::Branch(Condition::Always, self.copy_label.clone()),
            Line::Label(done),
            Line::Ret,
        ]
    }

    pub(crate) fn void_ty(&self) -> Ty {
        self.resolver.types.void()
    }

    pub(crate) fn int_ty(&self) -> Ty {
        self.resolver.types.int()
    }

    pub(crate) fn char_ty(&self) -> Ty {
        self.resolver.types.char()
    }

    pub(crate) fn expect_int(&self, ty: &Ty, context: &str) -> GenResult<()> {
        if ty.equals(&self.int_ty()) {
            Ok(())
        } else {
            Err(CodegenError::TypeMismatch {
                context: context.to_string(),
                expected: "int".to_string(),
                found: ty.to_string(),
            })
        }
    }

    pub(crate) fn expect_arity(
        &self,
        form: &str,
        items: &[crate::ast::Element],
        operands: usize,
    ) -> GenResult<()> {
        if items.len() == operands + 1 {
            Ok(())
        } else {
            Err(CodegenError::ArityMismatch {
                form: form.to_string(),
                expected: operands.to_string(),
                found: items.len() - 1,
            })
        }
    }
}

/// Merge runs of adjacent label lines into one. The removed labels adopt
/// the survivor's id through their shared cells, so every reference keeps
/// pointing at a line that still exists. Index-based on purpose: the list
/// shrinks while it is scanned.
fn coalesce_labels(lines: &mut Vec<Line>) {
    let mut i = 0;
    while i + 1 < lines.len() {
        let adjacent = matches!(
            (&lines[i], &lines[i + 1]),
            (Line::Label(_), Line::Label(_))
        );
        if adjacent {
            if let (Line::Label(keep), Line::Label(dropped)) = (&lines[i], &lines[i + 1]) {
                dropped.adopt(keep);
            }
            lines.remove(i + 1);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_merges_runs_and_rewrites_references() {
        let a = Label::fresh();
        let b = Label::fresh();
        let c = Label::fresh();
        let jump = Line::Branch(Condition::Always, c.clone());
        let mut lines = vec![
            Line::Label(a.clone()),
            Line::Label(b.clone()),
            Line::Label(c.clone()),
            Line::Ret,
            jump,
        ];
        coalesce_labels(&mut lines);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], Line::Label(a.clone()));
        // the branch now targets the surviving label
        assert_eq!(lines[2], Line::Branch(Condition::Always, a));
    }

    #[test]
    fn coalesce_leaves_separated_labels_alone() {
        let a = Label::fresh();
        let b = Label::fresh();
        let mut lines = vec![Line::Label(a), Line::Ret, Line::Label(b)];
        coalesce_labels(&mut lines);
        assert_eq!(lines.len(), 3);
    }
}
