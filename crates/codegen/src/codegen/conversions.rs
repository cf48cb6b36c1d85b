//! Type-directed conversion insertion.
//!
//! Small integers live in an `i32` and are re-normalized on narrowing: a
//! `shl`/`shr_s` pair sign-extends signed values, an `and` mask zero-extends
//! unsigned ones. WebAssembly MVP has no narrowing instruction; backend
//! optimizers recognize the pattern.

use crate::module::{BinaryOp, ExprId, UnaryOp};
use crate::types::Type;

use super::Codegen;

/// Class references convert like pointer-sized unsigned integers.
fn declassed(ty: &Type) -> Type {
    match ty {
        Type::Class { ptr64: true, .. } => Type::Usize64,
        Type::Class { ptr64: false, .. } => Type::Usize32,
        other => other.clone(),
    }
}

impl<'src> Codegen<'src> {
    /// Reconciles an expression of type `from` with the contextual type `to`.
    pub(crate) fn convert_expression(
        &mut self,
        expression: ExprId,
        from: &Type,
        to: &Type,
    ) -> crate::Result<ExprId> {
        let from = declassed(from);
        let to = declassed(to);
        if from == to {
            return Ok(expression);
        }
        if to == Type::Void {
            return Ok(self.module.drop_(expression));
        }
        if from == Type::Void {
            anyhow::bail!("internal: cannot convert from `void`");
        }

        if from.is_any_float() {
            if to.is_any_float() {
                // f64 to f32 is lossy.
                let op = if from == Type::F32 {
                    UnaryOp::F64PromoteF32
                } else {
                    UnaryOp::F32DemoteF64
                };
                return Ok(self.module.unary(op, expression));
            }
            // Truncate toward the target's width and signedness.
            let op = match (from == Type::F32, to.is_long_integer(), to.is_signed_integer()) {
                (true, true, true) => UnaryOp::I64TruncF32S,
                (true, true, false) => UnaryOp::I64TruncF32U,
                (true, false, true) => UnaryOp::I32TruncF32S,
                (true, false, false) => UnaryOp::I32TruncF32U,
                (false, true, true) => UnaryOp::I64TruncF64S,
                (false, true, false) => UnaryOp::I64TruncF64U,
                (false, false, true) => UnaryOp::I32TruncF64S,
                (false, false, false) => UnaryOp::I32TruncF64U,
            };
            let truncated = self.module.unary(op, expression);
            return Ok(if to.is_small_integer() {
                self.normalize_small_integer(truncated, &to)
            } else {
                truncated
            });
        }

        if to.is_any_float() {
            // Integer to float is lossy for 64-bit sources.
            let op = match (to == Type::F32, from.is_long_integer(), from.is_signed_integer()) {
                (true, true, true) => UnaryOp::F32ConvertI64S,
                (true, true, false) => UnaryOp::F32ConvertI64U,
                (true, false, true) => UnaryOp::F32ConvertI32S,
                (true, false, false) => UnaryOp::F32ConvertI32U,
                (false, true, true) => UnaryOp::F64ConvertI64S,
                (false, true, false) => UnaryOp::F64ConvertI64U,
                (false, false, true) => UnaryOp::F64ConvertI32S,
                (false, false, false) => UnaryOp::F64ConvertI32U,
            };
            return Ok(self.module.unary(op, expression));
        }

        // Integer to integer.
        if from.is_long_integer() {
            if to.is_long_integer() {
                // Same representation, signedness is a matter of reading.
                return Ok(expression);
            }
            let wrapped = self.module.unary(UnaryOp::I32WrapI64, expression);
            return Ok(if to.is_small_integer() {
                self.normalize_small_integer(wrapped, &to)
            } else {
                wrapped
            });
        }
        if to.is_long_integer() {
            let op = if from.is_signed_integer() {
                UnaryOp::I64ExtendI32S
            } else {
                UnaryOp::I64ExtendI32U
            };
            return Ok(self.module.unary(op, expression));
        }

        // Both are i32-represented; re-normalize when narrowing or when the
        // signedness changes at the same width.
        if to.is_small_integer()
            && (to.size() < from.size()
                || (to.size() == from.size()
                    && from.is_signed_integer() != to.is_signed_integer()))
        {
            return Ok(self.normalize_small_integer(expression, &to));
        }
        Ok(expression)
    }

    /// Sign-extends or zero-masks a small integer held in an `i32`.
    pub(crate) fn normalize_small_integer(&mut self, expression: ExprId, ty: &Type) -> ExprId {
        if ty.is_signed_integer() {
            let shift = self.module.i32_const(ty.small_integer_shift() as i32);
            let shifted = self.module.binary(BinaryOp::I32Shl, expression, shift);
            self.module.binary(BinaryOp::I32ShrS, shifted, shift)
        } else {
            let mask = self.module.i32_const(ty.small_integer_mask() as i32);
            self.module.binary(BinaryOp::I32And, expression, mask)
        }
    }
}
