use crate::asm::{Condition, Label, Line, MemoryLocation, Register, Value};
use crate::ast::Element;
use crate::types::{word_bytes, Field, Ty, TyKind};

use super::{imm, local_context::LocalContext, sp_slot, AsmGenerator, CodegenError, GenResult, R0, R1, R2};

impl AsmGenerator<'_> {
    /// `[do body]` or `[do [decls] body]`. Declared variables take slots
    /// starting at the current offset; the body expressions then all
    /// target the first offset past them.
    pub(crate) fn gen_do(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let (decls, body) = match items {
            [_, body] => (None, body),
            [_, decls, body] => (Some(decls), body),
            _ => {
                return Err(CodegenError::ArityMismatch {
                    form: "do".to_string(),
                    expected: "1 or 2".to_string(),
                    found: items.len() - 1,
                })
            }
        };

        let mut scope = ctx.clone();
        let mut offset = mem;
        if let Some(decl_list) = decls {
            let decl_items = decl_list.as_list().ok_or_else(|| {
                CodegenError::MalformedExpression(format!(
                    "variable declarations must be a list, found {decl_list}"
                ))
            })?;
            for decl in decl_items {
                let parts = decl.as_list().ok_or_else(|| {
                    CodegenError::MalformedExpression(format!(
                        "variable declaration must be a [type name] list, found {decl}"
                    ))
                })?;
                let (ty_expr, name) = match parts {
                    [ty_expr, name] => (ty_expr, name),
                    _ => {
                        return Err(CodegenError::MalformedExpression(format!(
                            "variable declaration must be a [type name] list, found {decl}"
                        )))
                    }
                };
                let ty = self.resolver.construct(ty_expr)?;
                let name = name.as_word().ok_or_else(|| {
                    CodegenError::MalformedExpression(format!(
                        "variable name must be a word, found {name}"
                    ))
                })?;
                let size = ty.size();
                scope.add(Field {
                    name: name.to_string(),
                    ty,
                    position: offset,
                });
                offset += word_bytes(size);
            }
        }

        let body_items = body.as_list().ok_or_else(|| {
            CodegenError::MalformedExpression(format!("do body must be a list, found {body}"))
        })?;
        let mut code = Vec::new();
        for expr in body_items {
            let (expr_code, _) = self.gen_expr(&scope, expr, offset)?;
            code.extend(expr_code);
        }
        Ok((code, self.void_ty()))
    }

    /// `[return]` or `[return value]`. The value is copied down to the
    /// frame's slot zero, then LR is reloaded from its save slot and the
    /// function returns.
    pub(crate) fn gen_return(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let return_type = ctx.return_type().clone();
        let code = match items {
            [_] => {
                if !return_type.is_void() {
                    return Err(CodegenError::TypeMismatch {
                        context: "return".to_string(),
                        expected: return_type.to_string(),
                        found: "void".to_string(),
                    });
                }
                vec![
                    Line::Ldr(Register::Lr, sp_slot(return_type.size())),
                    Line::Ret,
                ]
            }
            [_, value] => {
                let (mut code, value_ty) = self.gen_expr(ctx, value, mem)?;
                if !value_ty.equals(&return_type) {
                    return Err(CodegenError::TypeMismatch {
                        context: "return".to_string(),
                        expected: return_type.to_string(),
                        found: value_ty.to_string(),
                    });
                }
                code.push(Line::Add(R0, Register::Sp, imm(mem)));
                code.push(Line::Mov(R1, Value::Reg(Register::Sp)));
                code.push(Line::Mov(R2, imm(return_type.size())));
                code.push(Line::BranchLink(self.copy_label.clone()));
                code.push(Line::Ldr(Register::Lr, sp_slot(return_type.size())));
                code.push(Line::Ret);
                code
            }
            _ => {
                return Err(CodegenError::ArityMismatch {
                    form: "return".to_string(),
                    expected: "0 or 1".to_string(),
                    found: items.len() - 1,
                })
            }
        };
        Ok((code, self.void_ty()))
    }

    /// `[<- lhs value]`: the left side must be a pointer to the value's
    /// type. Word-sized values store straight through the pointer, every
    /// other size goes through the copy subroutine.
    pub(crate) fn gen_store(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("<-", items, 2)?;
        let (value_code, value_ty) = self.gen_expr(ctx, &items[2], mem)?;
        let lhs_offset = mem + word_bytes(value_ty.size());
        let (lhs_code, lhs_ty) = self.gen_expr(ctx, &items[1], lhs_offset)?;
        let target = lhs_ty.ptr_value().ok_or_else(|| CodegenError::NotAPointer {
            form: "<-".to_string(),
            found: lhs_ty.to_string(),
        })?;
        if !target.equals(&value_ty) {
            return Err(CodegenError::TypeMismatch {
                context: "'<-' store".to_string(),
                expected: target.to_string(),
                found: value_ty.to_string(),
            });
        }

        let mut code = value_code;
        code.extend(lhs_code);
        let direct = matches!(value_ty.data().kind, TyKind::Int | TyKind::Ptr(_));
        if direct {
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Ldr(R1, sp_slot(lhs_offset)));
            code.push(Line::Str(R0, MemoryLocation::Reg(R1)));
        } else {
            code.push(Line::Add(R0, Register::Sp, imm(mem)));
            code.push(Line::Ldr(R1, sp_slot(lhs_offset)));
            code.push(Line::Mov(R2, imm(value_ty.size())));
            code.push(Line::BranchLink(self.copy_label.clone()));
        }
        Ok((code, self.void_ty()))
    }

    /// `[if c1 e1 c2 e2 ... else?]`: condition/body pairs, with an
    /// optional trailing else expression.
    pub(crate) fn gen_if(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let end = Label::fresh();
        let mut code = Vec::new();
        let mut rest = &items[1..];
        while rest.len() >= 2 {
            let (cond_code, cond_ty) = self.gen_expr(ctx, &rest[0], mem)?;
            self.expect_int(&cond_ty, "'if' condition")?;
            let skip = Label::fresh();
            code.extend(cond_code);
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Cmp(R0, imm(0)));
            code.push(Line::Branch(Condition::Eq, skip.clone()));
            let (body_code, _) = self.gen_expr(ctx, &rest[1], mem)?;
            code.extend(body_code);
            code.push(Line::Branch(Condition::Always, end.clone()));
            code.push(Line::Label(skip));
            rest = &rest[2..];
        }
        if let [else_expr] = rest {
            let (else_code, _) = self.gen_expr(ctx, else_expr, mem)?;
            code.extend(else_code);
        }
        code.push(Line::Label(end));
        Ok((code, self.void_ty()))
    }

    /// `[while cond body]`.
    pub(crate) fn gen_while(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("while", items, 2)?;
        let repeat = Label::fresh();
        let skip = Label::fresh();
        let mut code = vec![Line::Label(repeat.clone())];
        let (cond_code, cond_ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&cond_ty, "'while' condition")?;
        code.extend(cond_code);
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Cmp(R0, imm(0)));
        code.push(Line::Branch(Condition::Eq, skip.clone()));
        let (body_code, _) = self.gen_expr(ctx, &items[2], mem)?;
        code.extend(body_code);
        code.push(Line::Branch(Condition::Always, repeat));
        code.push(Line::Label(skip));
        Ok((code, self.void_ty()))
    }
}
