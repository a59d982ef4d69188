use crate::asm::{Condition, Constant, Label, Line, Register, SpecialConstant, Value};
use crate::ast::Element;
use crate::types::{word_bytes, Ty, TyKind};

use super::{imm, local_context::LocalContext, sp_slot, AsmGenerator, CodegenError, GenResult, R0, R1, R2};

impl AsmGenerator<'_> {
    /// Compile one expression so its result occupies the first
    /// `size(result)` bytes at `[SP+mem]`. Returns the emitted code and
    /// the result type; string data accumulates on the generator.
    pub(crate) fn gen_expr(
        &mut self,
        ctx: &LocalContext,
        expr: &Element,
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        match expr {
            Element::Int(value) => Ok((
                vec![Line::Mov(R0, imm(*value)), Line::Str(R0, sp_slot(mem))],
                self.int_ty(),
            )),
            Element::Char(c) => Ok((
                vec![
                    Line::Mov(R0, imm(*c as i32)),
                    Line::Strb(R0, sp_slot(mem)),
                ],
                self.char_ty(),
            )),
            Element::Str(text) => Ok(self.gen_string_literal(text, mem)),
            Element::Float(_) => Err(CodegenError::FloatUnsupported),
            Element::Word(word) => self.gen_word(ctx, word, mem),
            Element::List(items) => self.gen_form(ctx, items, mem),
        }
    }

    /// Dispatch a bracketed form by its head word.
    fn gen_form(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let head = items.first().and_then(Element::as_word).ok_or_else(|| {
            CodegenError::MalformedExpression(format!(
                "operator position must be a word, found {}",
                Element::List(items.to_vec())
            ))
        })?;
        match head {
            "do" => self.gen_do(ctx, items, mem),
            "return" => self.gen_return(ctx, items, mem),
            "<-" => self.gen_store(ctx, items, mem),
            "if" => self.gen_if(ctx, items, mem),
            "while" => self.gen_while(ctx, items, mem),
            "print" => self.gen_print(ctx, items, mem),
            "cast" => self.gen_cast(ctx, items, mem),
            "$" => self.gen_deref(ctx, items, mem),
            "@" => self.gen_offset(ctx, items, mem, false),
            "@@" => self.gen_offset(ctx, items, mem, true),
            "?" => self.gen_ternary(ctx, items, mem),
            "." => self.gen_field_access(ctx, items, mem),
            "+" | "-" => self.gen_additive(ctx, items, mem, head),
            "*" => self.gen_multiply(ctx, items, mem),
            "/" | "%" => self.gen_divide(ctx, items, mem, head),
            "<" | ">" | "<=" | ">=" => self.gen_compare(ctx, items, mem, head),
            "==" | "!=" => self.gen_equality(ctx, items, mem, head),
            "&&" | "||" => self.gen_logical(ctx, items, mem, head),
            "&" | "|" | "^" => self.gen_bitwise(ctx, items, mem, head),
            "<<" | ">>" | ">>>" => self.gen_shift(ctx, items, mem, head),
            "!" => self.gen_not(ctx, items, mem),
            "size_of" => self.gen_size_of(items, mem),
            "size_of_value" => self.gen_size_of_value(ctx, items, mem),
            _ => {
                if self.funcs.get(head).is_some() {
                    self.gen_call(ctx, items, mem, head)
                } else {
                    Err(CodegenError::UnknownOperator(head.to_string()))
                }
            }
        }
    }

    /// A string literal becomes a fresh data label plus an `.ASCIZ` line;
    /// the expression value is the label address.
    fn gen_string_literal(&mut self, text: &str, mem: i32) -> (Vec<Line>, Ty) {
        let label = Label::fresh();
        self.data.push(Line::Label(label.clone()));
        self.data.push(Line::Asciz(text.to_string()));
        let code = vec![
            Line::Mov(R0, Value::Const(Constant::Label(label))),
            Line::Str(R0, sp_slot(mem)),
        ];
        (code, Ty::new(TyKind::Ptr(self.char_ty())))
    }

    /// Leaf words: `.name` is a special MMIO constant, `$name` reads the
    /// variable's value, a bare name takes the variable's address.
    fn gen_word(
        &mut self,
        ctx: &LocalContext,
        word: &str,
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        if let Some(name) = word.strip_prefix('.') {
            let special = SpecialConstant::from_name(name)
                .ok_or_else(|| CodegenError::UnknownOperator(word.to_string()))?;
            let code = vec![
                Line::Mov(R0, Value::Const(Constant::Special(special))),
                Line::Str(R0, sp_slot(mem)),
            ];
            return Ok((code, Ty::new(TyKind::Ptr(self.int_ty()))));
        }
        if let Some(name) = word.strip_prefix('$') {
            let field = ctx
                .get(name)
                .ok_or_else(|| CodegenError::UnknownVariable(name.to_string()))?
                .clone();
            let size = field.ty.size();
            let code = if size == 4 {
                vec![
                    Line::Ldr(R0, sp_slot(field.position)),
                    Line::Str(R0, sp_slot(mem)),
                ]
            } else {
                vec![
                    Line::Add(R0, Register::Sp, imm(field.position)),
                    Line::Add(R1, Register::Sp, imm(mem)),
                    Line::Mov(R2, imm(size)),
                    Line::BranchLink(self.copy_label.clone()),
                ]
            };
            return Ok((code, field.ty));
        }
        let field = ctx
            .get(word)
            .ok_or_else(|| CodegenError::UnknownVariable(word.to_string()))?;
        let code = vec![
            Line::Add(R0, Register::Sp, imm(field.position)),
            Line::Str(R0, sp_slot(mem)),
        ];
        Ok((code, Ty::new(TyKind::Ptr(field.ty.clone()))))
    }

    /// `[? cond then else]`: both branches target the same slot and must
    /// agree on their type.
    fn gen_ternary(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("?", items, 3)?;
        let (mut code, cond_ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&cond_ty, "'?' condition")?;
        let other = Label::fresh();
        let end = Label::fresh();
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Cmp(R0, imm(0)));
        code.push(Line::Branch(Condition::Eq, other.clone()));
        let (then_code, then_ty) = self.gen_expr(ctx, &items[2], mem)?;
        code.extend(then_code);
        code.push(Line::Branch(Condition::Always, end.clone()));
        code.push(Line::Label(other));
        let (else_code, else_ty) = self.gen_expr(ctx, &items[3], mem)?;
        code.extend(else_code);
        code.push(Line::Label(end));
        if !then_ty.equals(&else_ty) {
            return Err(CodegenError::TypeMismatch {
                context: "branches of '?'".to_string(),
                expected: then_ty.to_string(),
                found: else_ty.to_string(),
            });
        }
        Ok((code, then_ty))
    }

    /// `[cast type value]`: same bits, new type.
    fn gen_cast(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("cast", items, 2)?;
        let ty = self.resolver.construct(&items[1])?;
        let (code, _) = self.gen_expr(ctx, &items[2], mem)?;
        Ok((code, ty))
    }

    /// Call a declared function. Arguments land past the callee's return
    /// slot and saved-LR slot; SP advances over the live part of this
    /// frame around the branch, so the callee's frame starts at the
    /// result slot.
    fn gen_call(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        name: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let func = match self.funcs.get(name) {
            Some(func) => func.clone(),
            None => return Err(CodegenError::UnknownOperator(name.to_string())),
        };
        let args = &items[1..];
        if args.len() != func.params.len() {
            return Err(CodegenError::ArityMismatch {
                form: name.to_string(),
                expected: func.params.len().to_string(),
                found: args.len(),
            });
        }

        let mut code = Vec::new();
        let mut offset = mem + func.return_type.size() + 4;
        for (arg, param) in args.iter().zip(&func.params) {
            let (arg_code, arg_ty) = self.gen_expr(ctx, arg, offset)?;
            if !arg_ty.equals(&param.ty) {
                return Err(CodegenError::TypeMismatch {
                    context: format!("argument '{}' of '{}'", param.name, name),
                    expected: param.ty.to_string(),
                    found: arg_ty.to_string(),
                });
            }
            code.extend(arg_code);
            offset += word_bytes(param.ty.size());
        }
        code.push(Line::Add(Register::Sp, Register::Sp, imm(mem)));
        code.push(Line::BranchLink(func.entry.clone()));
        code.push(Line::Sub(Register::Sp, Register::Sp, imm(mem)));
        Ok((code, func.return_type))
    }
}
