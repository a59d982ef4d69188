use crate::asm::{Condition, Label, Line, Register};
use crate::ast::Element;
use crate::types::{Ty, TyKind};

use super::{imm, local_context::LocalContext, sp_slot, AsmGenerator, CodegenError, GenResult, R0, R1, R2};

impl AsmGenerator<'_> {
    /// `[$ ptr]`: copy the pointed-at value into the result slot.
    pub(crate) fn gen_deref(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("$", items, 1)?;
        let (mut code, ty) = self.gen_expr(ctx, &items[1], mem)?;
        let value = ty.ptr_value().ok_or_else(|| CodegenError::NotAPointer {
            form: "$".to_string(),
            found: ty.to_string(),
        })?;
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Add(R1, Register::Sp, imm(mem)));
        code.push(Line::Mov(R2, imm(value.size())));
        code.push(Line::BranchLink(self.copy_label.clone()));
        Ok((code, value))
    }

    /// `[@ ptr index]` and `[@@ arrayPtr index]`: advance the pointer by
    /// `index` elements. The index is scaled by repeated addition of the
    /// element size; the target has no multiply.
    pub(crate) fn gen_offset(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        indexed: bool,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let form = if indexed { "@@" } else { "@" };
        self.expect_arity(form, items, 2)?;
        let (mut code, ptr_ty) = self.gen_expr(ctx, &items[1], mem)?;
        let (index_code, index_ty) = self.gen_expr(ctx, &items[2], mem + 4)?;
        self.expect_int(&index_ty, "'@' index")?;
        code.extend(index_code);
        let value = ptr_ty.ptr_value().ok_or_else(|| CodegenError::NotAPointer {
            form: form.to_string(),
            found: ptr_ty.to_string(),
        })?;

        let (stride, result_ty) = if indexed {
            let data = value.data();
            match &data.kind {
                TyKind::Array { item, .. } => {
                    (item.size(), Ty::new(TyKind::Ptr(item.clone())))
                }
                _ => return Err(CodegenError::NotAnArrayPointer(ptr_ty.to_string())),
            }
        } else {
            (value.size(), ptr_ty.clone())
        };

        let repeat = Label::fresh();
        let done = Label::fresh();
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Ldr(R1, sp_slot(mem + 4)));
        code.push(Line::Label(repeat.clone()));
        code.push(Line::Cmp(R1, imm(0)));
        code.push(Line::Branch(Condition::Eq, done.clone()));
        code.push(Line::Add(R0, R0, imm(stride)));
        code.push(Line::Sub(R1, R1, imm(1)));
        code.push(Line::Branch(Condition::Always, repeat));
        code.push(Line::Label(done));
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, result_ty))
    }

    /// `[. structPtr name...]`: add the field offset to the loaded
    /// pointer. The name is read from the first name slot on every step,
    /// so a multi-name chain only descends same-named nested fields.
    pub(crate) fn gen_field_access(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        if items.len() < 3 {
            return Err(CodegenError::ArityMismatch {
                form: ".".to_string(),
                expected: "at least 2".to_string(),
                found: items.len() - 1,
            });
        }
        let (mut code, ptr_ty) = self.gen_expr(ctx, &items[1], mem)?;
        let mut current = ptr_ty.ptr_value().ok_or_else(|| CodegenError::NotAPointer {
            form: ".".to_string(),
            found: ptr_ty.to_string(),
        })?;

        let mut offset = 0;
        for _ in 2..items.len() {
            let name = items[2].as_word().ok_or_else(|| {
                CodegenError::MalformedExpression(format!(
                    "field name must be a word, found {}",
                    items[2]
                ))
            })?;
            let field = {
                let data = current.data();
                match &data.kind {
                    TyKind::Struct { fields } => fields
                        .iter()
                        .find(|f| f.name == name)
                        .cloned()
                        .ok_or_else(|| {
                            CodegenError::UnknownField(current.to_string(), name.to_string())
                        })?,
                    _ => return Err(CodegenError::NotAStruct(current.to_string())),
                }
            };
            offset += field.position;
            current = field.ty;
        }

        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Add(R0, R0, imm(offset)));
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, Ty::new(TyKind::Ptr(current))))
    }
}
