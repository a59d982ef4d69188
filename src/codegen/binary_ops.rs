use crate::asm::{Condition, Label, Line, MemoryLocation, Register};
use crate::ast::Element;
use crate::types::{word_bytes, Ty};

use super::{imm, local_context::LocalContext, reg, sp_slot, AsmGenerator, CodegenError, GenResult, R0, R1, R2, R3};

impl AsmGenerator<'_> {
    /// Compile a chain's first operand at `mem` and each further operand
    /// at `mem+4`, checking that all are int.
    fn gen_int_chain(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
        mut step: impl FnMut(&mut Vec<Line>),
    ) -> GenResult<(Vec<Line>, Ty)> {
        if items.len() < 3 {
            return Err(CodegenError::ArityMismatch {
                form: form.to_string(),
                expected: "at least 2".to_string(),
                found: items.len() - 1,
            });
        }
        let context = format!("'{form}' operand");
        let (mut code, first_ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&first_ty, &context)?;
        for operand in &items[2..] {
            let (operand_code, operand_ty) = self.gen_expr(ctx, operand, mem + 4)?;
            self.expect_int(&operand_ty, &context)?;
            code.extend(operand_code);
            step(&mut code);
        }
        Ok((code, self.int_ty()))
    }

    /// Variadic `+` and `-`, folding left.
    pub(crate) fn gen_additive(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let subtract = form == "-";
        self.gen_int_chain(ctx, items, mem, form, |code| {
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Ldr(R1, sp_slot(mem + 4)));
            if subtract {
                code.push(Line::Sub(R0, R0, reg(R1)));
            } else {
                code.push(Line::Add(R0, R0, reg(R1)));
            }
            code.push(Line::Str(R0, sp_slot(mem)));
        })
    }

    /// Repeated-addition multiply; the target has no multiply instruction.
    /// When the counter operand is not positive, both operands are
    /// subtracted from zero before the loop.
    pub(crate) fn gen_multiply(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.gen_int_chain(ctx, items, mem, "*", |code| {
            let positive = Label::fresh();
            let repeat = Label::fresh();
            let done = Label::fresh();
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Ldr(R1, sp_slot(mem + 4)));
            code.push(Line::Cmp(R1, imm(0)));
            code.push(Line::Branch(Condition::Gt, positive.clone()));
            code.push(Line::Mov(R2, imm(0)));
            code.push(Line::Sub(R2, R2, reg(R0)));
            code.push(Line::Mov(R0, reg(R2)));
            code.push(Line::Mov(R2, imm(0)));
            code.push(Line::Sub(R2, R2, reg(R1)));
            code.push(Line::Mov(R1, reg(R2)));
            code.push(Line::Label(positive));
            code.push(Line::Mov(R2, imm(0)));
            code.push(Line::Label(repeat.clone()));
            code.push(Line::Cmp(R1, imm(0)));
            code.push(Line::Branch(Condition::Eq, done.clone()));
            code.push(Line::Add(R2, R2, reg(R0)));
            code.push(Line::Sub(R1, R1, imm(1)));
            code.push(Line::Branch(Condition::Always, repeat));
            code.push(Line::Label(done));
            code.push(Line::Str(R2, sp_slot(mem)));
        })
    }

    /// Repeated-subtraction divide and modulo. Operands are made positive
    /// first; R3 accumulates the xor of their signs and flips the result.
    /// A zero divisor never leaves the loop.
    pub(crate) fn gen_divide(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        let modulo = form == "%";
        self.gen_int_chain(ctx, items, mem, form, |code| {
            let num_pos = Label::fresh();
            let den_pos = Label::fresh();
            let repeat = Label::fresh();
            let done = Label::fresh();
            let keep = Label::fresh();
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Ldr(R1, sp_slot(mem + 4)));
            code.push(Line::Mov(R3, imm(0)));
            code.push(Line::Cmp(R0, imm(0)));
            code.push(Line::Branch(Condition::Gt, num_pos.clone()));
            code.push(Line::Mov(R2, imm(0)));
            code.push(Line::Sub(R2, R2, reg(R0)));
            code.push(Line::Mov(R0, reg(R2)));
            code.push(Line::Xor(R3, R3, imm(1)));
            code.push(Line::Label(num_pos));
            code.push(Line::Cmp(R1, imm(0)));
            code.push(Line::Branch(Condition::Gt, den_pos.clone()));
            code.push(Line::Mov(R2, imm(0)));
            code.push(Line::Sub(R2, R2, reg(R1)));
            code.push(Line::Mov(R1, reg(R2)));
            code.push(Line::Xor(R3, R3, imm(1)));
            code.push(Line::Label(den_pos));
            code.push(Line::Mov(R2, imm(0)));
            code.push(Line::Label(repeat.clone()));
            code.push(Line::Cmp(R0, reg(R1)));
            code.push(Line::Branch(Condition::Lt, done.clone()));
            code.push(Line::Sub(R0, R0, reg(R1)));
            code.push(Line::Add(R2, R2, imm(1)));
            code.push(Line::Branch(Condition::Always, repeat));
            code.push(Line::Label(done));
            // quotient in R2, remainder in R0
            let result = if modulo { R0 } else { R2 };
            code.push(Line::Cmp(R3, imm(0)));
            code.push(Line::Branch(Condition::Eq, keep.clone()));
            code.push(Line::Mov(R1, imm(0)));
            code.push(Line::Sub(R1, R1, reg(result)));
            code.push(Line::Mov(result, reg(R1)));
            code.push(Line::Label(keep));
            code.push(Line::Str(result, sp_slot(mem)));
        })
    }

    /// `<`, `>`, `<=`, `>=` over ints, materializing 0/1.
    pub(crate) fn gen_compare(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity(form, items, 2)?;
        let context = format!("'{form}' operand");
        let (mut code, lhs_ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&lhs_ty, &context)?;
        let (rhs_code, rhs_ty) = self.gen_expr(ctx, &items[2], mem + 4)?;
        self.expect_int(&rhs_ty, &context)?;
        code.extend(rhs_code);

        // The strict forms branch to 1 when taken; the inclusive forms
        // test the negated condition and branch to 0.
        let (condition, taken) = match form {
            "<" => (Condition::Lt, 1),
            ">" => (Condition::Gt, 1),
            "<=" => (Condition::Gt, 0),
            _ => (Condition::Lt, 0),
        };
        let on_taken = Label::fresh();
        let end = Label::fresh();
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Ldr(R1, sp_slot(mem + 4)));
        code.push(Line::Cmp(R0, reg(R1)));
        code.push(Line::Branch(condition, on_taken.clone()));
        code.push(Line::Mov(R0, imm(1 - taken)));
        code.push(Line::Branch(Condition::Always, end.clone()));
        code.push(Line::Label(on_taken));
        code.push(Line::Mov(R0, imm(taken)));
        code.push(Line::Label(end));
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, self.int_ty()))
    }

    /// `==` and `!=` over any matching non-void types. Word-sized values
    /// compare in one CMP; anything else compares byte by byte with an
    /// early exit, reading the second operand one aligned slot after the
    /// first.
    pub(crate) fn gen_equality(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity(form, items, 2)?;
        let (mut code, lhs_ty) = self.gen_expr(ctx, &items[1], mem)?;
        let stride = word_bytes(lhs_ty.size());
        let (rhs_code, rhs_ty) = self.gen_expr(ctx, &items[2], mem + stride)?;
        code.extend(rhs_code);
        if lhs_ty.is_void() {
            return Err(CodegenError::TypeMismatch {
                context: format!("'{form}' comparison"),
                expected: "a non-void type".to_string(),
                found: "void".to_string(),
            });
        }
        if !lhs_ty.equals(&rhs_ty) {
            return Err(CodegenError::TypeMismatch {
                context: format!("'{form}' comparison"),
                expected: lhs_ty.to_string(),
                found: rhs_ty.to_string(),
            });
        }

        let (eq_value, ne_value) = if form == "==" { (1, 0) } else { (0, 1) };
        let size = lhs_ty.size();
        if size == 0 {
            code.push(Line::Mov(R0, imm(eq_value)));
            code.push(Line::Str(R0, sp_slot(mem)));
            return Ok((code, self.int_ty()));
        }
        if size == 4 {
            let on_equal = Label::fresh();
            let end = Label::fresh();
            code.push(Line::Ldr(R0, sp_slot(mem)));
            code.push(Line::Ldr(R1, sp_slot(mem + stride)));
            code.push(Line::Cmp(R0, reg(R1)));
            code.push(Line::Branch(Condition::Eq, on_equal.clone()));
            code.push(Line::Mov(R0, imm(ne_value)));
            code.push(Line::Branch(Condition::Always, end.clone()));
            code.push(Line::Label(on_equal));
            code.push(Line::Mov(R0, imm(eq_value)));
            code.push(Line::Label(end));
            code.push(Line::Str(R0, sp_slot(mem)));
            return Ok((code, self.int_ty()));
        }

        let repeat = Label::fresh();
        let differ = Label::fresh();
        let all_equal = Label::fresh();
        let end = Label::fresh();
        code.push(Line::Add(R0, Register::Sp, imm(mem)));
        code.push(Line::Mov(R2, imm(size)));
        code.push(Line::Label(repeat.clone()));
        code.push(Line::Cmp(R2, imm(0)));
        code.push(Line::Branch(Condition::Eq, all_equal.clone()));
        code.push(Line::Ldrb(R1, MemoryLocation::Reg(R0)));
        code.push(Line::Ldrb(R3, MemoryLocation::RegImm(R0, stride)));
        code.push(Line::Cmp(R1, reg(R3)));
        code.push(Line::Branch(Condition::Ne, differ.clone()));
        code.push(Line::Add(R0, R0, imm(1)));
        code.push(Line::Sub(R2, R2, imm(1)));
        code.push(Line::Branch(Condition::Always, repeat));
        code.push(Line::Label(differ));
        code.push(Line::Mov(R0, imm(ne_value)));
        code.push(Line::Branch(Condition::Always, end.clone()));
        code.push(Line::Label(all_equal));
        code.push(Line::Mov(R0, imm(eq_value)));
        code.push(Line::Label(end));
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, self.int_ty()))
    }

    /// Short-circuit `&&` and `||`: the result is whichever operand was
    /// written last.
    pub(crate) fn gen_logical(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity(form, items, 2)?;
        let context = format!("'{form}' operand");
        let (mut code, lhs_ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&lhs_ty, &context)?;
        let skip = Label::fresh();
        let condition = if form == "&&" { Condition::Eq } else { Condition::Ne };
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Cmp(R0, imm(0)));
        code.push(Line::Branch(condition, skip.clone()));
        let (rhs_code, rhs_ty) = self.gen_expr(ctx, &items[2], mem)?;
        self.expect_int(&rhs_ty, &context)?;
        code.extend(rhs_code);
        code.push(Line::Label(skip));
        Ok((code, self.int_ty()))
    }

    /// Bitwise `&`, `|`, `^`.
    pub(crate) fn gen_bitwise(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity(form, items, 2)?;
        let context = format!("'{form}' operand");
        let (mut code, lhs_ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&lhs_ty, &context)?;
        let (rhs_code, rhs_ty) = self.gen_expr(ctx, &items[2], mem + 4)?;
        self.expect_int(&rhs_ty, &context)?;
        code.extend(rhs_code);
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Ldr(R1, sp_slot(mem + 4)));
        code.push(match form {
            "&" => Line::And(R0, R0, reg(R1)),
            "|" => Line::Or(R0, R0, reg(R1)),
            _ => Line::Xor(R0, R0, reg(R1)),
        });
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, self.int_ty()))
    }

    /// `<<` and `>>>` are plain logical shifts. `>>` shifts logically and
    /// then sign-extends: with `m = 1 << (31-n)`, `((x >>> n) ^ m) - m`
    /// restores the sign bits.
    pub(crate) fn gen_shift(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
        form: &str,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity(form, items, 2)?;
        let context = format!("'{form}' operand");
        let (mut code, lhs_ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&lhs_ty, &context)?;
        let (rhs_code, rhs_ty) = self.gen_expr(ctx, &items[2], mem + 4)?;
        self.expect_int(&rhs_ty, &context)?;
        code.extend(rhs_code);
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Ldr(R1, sp_slot(mem + 4)));
        match form {
            "<<" => code.push(Line::Lsl(R0, R0, reg(R1))),
            ">>>" => code.push(Line::Lsr(R0, R0, reg(R1))),
            _ => {
                code.push(Line::Lsr(R0, R0, reg(R1)));
                code.push(Line::Mov(R2, imm(31)));
                code.push(Line::Sub(R2, R2, reg(R1)));
                code.push(Line::Mov(R3, imm(1)));
                code.push(Line::Lsl(R3, R3, reg(R2)));
                code.push(Line::Xor(R0, R0, reg(R3)));
                code.push(Line::Sub(R0, R0, reg(R3)));
            }
        }
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, self.int_ty()))
    }

    /// `[! x]`: 1 when x is 0, else 0.
    pub(crate) fn gen_not(
        &mut self,
        ctx: &LocalContext,
        items: &[Element],
        mem: i32,
    ) -> GenResult<(Vec<Line>, Ty)> {
        self.expect_arity("!", items, 1)?;
        let (mut code, ty) = self.gen_expr(ctx, &items[1], mem)?;
        self.expect_int(&ty, "'!' operand")?;
        let on_zero = Label::fresh();
        let end = Label::fresh();
        code.push(Line::Ldr(R0, sp_slot(mem)));
        code.push(Line::Cmp(R0, imm(0)));
        code.push(Line::Branch(Condition::Eq, on_zero.clone()));
        code.push(Line::Mov(R0, imm(0)));
        code.push(Line::Branch(Condition::Always, end.clone()));
        code.push(Line::Label(on_zero));
        code.push(Line::Mov(R0, imm(1)));
        code.push(Line::Label(end));
        code.push(Line::Str(R0, sp_slot(mem)));
        Ok((code, self.int_ty()))
    }
}
