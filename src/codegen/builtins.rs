use crate::asm::{Line, MemoryLocation, Register, SpecialConstant};
use crate::ast::Element;
use crate::types::{Ty, TyKind};

use super::{imm, local_context::LocalContext, sp_slot, AsmGenerator, CodegenError, GenResult, R0};

fn is_char_array(ty: &Ty) -> bool {
    match &ty.data().kind {
        TyKind::Array { item, .. } => item.is_char(),
        _ => false,
    }
}

fn is_char_ptr(ty: &Ty) -> bool {
    match &ty.data().kind {
        TyKind::Ptr(target) => target.is_char(),
        _ => false,
    }
}

impl AsmGenerator<'_> {
    /// `[print x]`, dispatched on the operand type: ints and chars write
    /// their value to the signed-number and char ports, char buffers and
    /// char pointers write an address to the string port.
    pub(crate) fn gen_print(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("print", items, 1)?;
        let (mut code, ty) = self.gen_expr(ctx, &items[1], mem)?;
        if ty.is_int() {
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Str(
                R0,
                MemoryLocation::Special(SpecialConstant::WriteSignedNum),
            ));
        } else if ty.is_char() {
            code.push(Line::Ldrb(R0, sp_slot(mem)));
            code.push(Line::Strb(
                R0,
                MemoryLocation::Special(SpecialConstant::WriteChar),
            ));
        } else if is_char_array(&ty) {
            code.push(Line::Add(R0, Register::Sp, imm(mem)));
            code.push(Line::Str(
                R0,
                MemoryLocation::Special(SpecialConstant::WriteString),
            ));
        } else if is_char_ptr(&ty) {
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Str(
                R0,
                MemoryLocation::Special(SpecialConstant::WriteString),
            ));
        } else {
            return Err(CodegenError::Unprintable(ty.to_string()));
        }
        Ok((code, self.void_ty()))
    }

    /// `[size_of type]`: the type's byte size as an int constant.
    pub(crate) fn gen_size_of(
        &mut self,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("size_of", items, 1)?;
        let ty = self.resolver.construct(&items[1])?;
        let code = vec![
            Line::Mov(R0, imm(ty.size())),
            Line::Str(R0, sp_slot(mem)),
        ];
        Ok((code, self.int_ty()))
    }

    /// `[size_of_value expr]`: the expression still runs for its side
    /// effects, then its slot is overwritten with the size constant.
    pub(crate) fn gen_size_of_value(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("size_of_value", items, 1)?;
        let (mut code, ty) = self.gen_expr(ctx, &items[1], mem)?;
        code.push(Line::Mov(R0, imm(ty.size())));
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, self.int_ty()))
    }
}
