//! Builtin intrinsic dispatch.
//!
//! Builtin prototypes carry their [`Builtin`] tag from initialization, so
//! call sites dispatch on the closed enumeration and pick the concrete
//! instruction from the operand type.

use crate::ast;
use crate::diag::DiagnosticKind;
use crate::module::{BinaryOp, ExprId, HostOp, UnaryOp};
use crate::program::Builtin;
use crate::types::{NativeType, Type};

use super::Codegen;

impl<'src> Codegen<'src> {
    pub(crate) fn compile_builtin_call(
        &mut self,
        builtin: Builtin,
        type_arguments: &[ast::TypeNode],
        arguments: &[ast::Expression],
        contextual: Type,
    ) -> crate::Result<ExprId> {
        match builtin {
            Builtin::Clz | Builtin::Ctz | Builtin::Popcnt => {
                if !self.expect_arguments(arguments, 1) {
                    return Ok(self.module.unreachable());
                }
                let effective = if contextual.is_any_integer() {
                    contextual
                } else {
                    Type::I32
                };
                let value = self.compile_expression(&arguments[0], effective, false)?;
                let ty = self.current_type.clone();
                if !ty.is_any_integer() {
                    return Ok(self.invalid_builtin_operand(builtin, &ty));
                }
                let op = match (builtin, ty.is_long_integer()) {
                    (Builtin::Clz, false) => UnaryOp::I32Clz,
                    (Builtin::Clz, true) => UnaryOp::I64Clz,
                    (Builtin::Ctz, false) => UnaryOp::I32Ctz,
                    (Builtin::Ctz, true) => UnaryOp::I64Ctz,
                    (_, false) => UnaryOp::I32Popcnt,
                    (_, true) => UnaryOp::I64Popcnt,
                };
                self.current_type = ty;
                Ok(self.module.unary(op, value))
            }
            Builtin::Rotl | Builtin::Rotr => {
                if !self.expect_arguments(arguments, 2) {
                    return Ok(self.module.unreachable());
                }
                let effective = if contextual.is_any_integer() {
                    contextual
                } else {
                    Type::I32
                };
                let left = self.compile_expression(&arguments[0], effective, false)?;
                let ty = self.current_type.clone();
                if !ty.is_any_integer() {
                    return Ok(self.invalid_builtin_operand(builtin, &ty));
                }
                let right = self.compile_expression(&arguments[1], ty.clone(), true)?;
                let op = match (builtin, ty.is_long_integer()) {
                    (Builtin::Rotl, false) => BinaryOp::I32Rotl,
                    (Builtin::Rotl, true) => BinaryOp::I64Rotl,
                    (_, false) => BinaryOp::I32Rotr,
                    (_, true) => BinaryOp::I64Rotr,
                };
                self.current_type = ty;
                Ok(self.module.binary(op, left, right))
            }
            Builtin::Abs
            | Builtin::Ceil
            | Builtin::Floor
            | Builtin::Nearest
            | Builtin::Sqrt
            | Builtin::Trunc => {
                if !self.expect_arguments(arguments, 1) {
                    return Ok(self.module.unreachable());
                }
                let (value, ty) = self.compile_float_operand(&arguments[0], &contextual)?;
                let f32_ = ty == Type::F32;
                let op = match builtin {
                    Builtin::Abs => {
                        if f32_ {
                            UnaryOp::F32Abs
                        } else {
                            UnaryOp::F64Abs
                        }
                    }
                    Builtin::Ceil => {
                        if f32_ {
                            UnaryOp::F32Ceil
                        } else {
                            UnaryOp::F64Ceil
                        }
                    }
                    Builtin::Floor => {
                        if f32_ {
                            UnaryOp::F32Floor
                        } else {
                            UnaryOp::F64Floor
                        }
                    }
                    Builtin::Nearest => {
                        if f32_ {
                            UnaryOp::F32Nearest
                        } else {
                            UnaryOp::F64Nearest
                        }
                    }
                    Builtin::Sqrt => {
                        if f32_ {
                            UnaryOp::F32Sqrt
                        } else {
                            UnaryOp::F64Sqrt
                        }
                    }
                    _ => {
                        if f32_ {
                            UnaryOp::F32Trunc
                        } else {
                            UnaryOp::F64Trunc
                        }
                    }
                };
                self.current_type = ty;
                Ok(self.module.unary(op, value))
            }
            Builtin::CopySign | Builtin::Min | Builtin::Max => {
                if !self.expect_arguments(arguments, 2) {
                    return Ok(self.module.unreachable());
                }
                let (left, ty) = self.compile_float_operand(&arguments[0], &contextual)?;
                let right = self.compile_expression(&arguments[1], ty.clone(), true)?;
                let f32_ = ty == Type::F32;
                let op = match builtin {
                    Builtin::CopySign => {
                        if f32_ {
                            BinaryOp::F32CopySign
                        } else {
                            BinaryOp::F64CopySign
                        }
                    }
                    Builtin::Min => {
                        if f32_ {
                            BinaryOp::F32Min
                        } else {
                            BinaryOp::F64Min
                        }
                    }
                    _ => {
                        if f32_ {
                            BinaryOp::F32Max
                        } else {
                            BinaryOp::F64Max
                        }
                    }
                };
                self.current_type = ty;
                Ok(self.module.binary(op, left, right))
            }
            Builtin::CurrentMemory => {
                if !self.expect_arguments(arguments, 0) {
                    return Ok(self.module.unreachable());
                }
                self.current_type = Type::I32;
                Ok(self.module.host(HostOp::CurrentMemory, Vec::new()))
            }
            Builtin::GrowMemory => {
                if !self.expect_arguments(arguments, 1) {
                    return Ok(self.module.unreachable());
                }
                self.diagnostics
                    .warning(DiagnosticKind::Unsafe, "grow_memory is an unsafe operation");
                let pages = self.compile_expression(&arguments[0], Type::I32, true)?;
                self.current_type = Type::I32;
                Ok(self.module.host(HostOp::GrowMemory, vec![pages]))
            }
            Builtin::Unreachable => Ok(self.module.unreachable()),
            Builtin::SizeOf => {
                if type_arguments.len() != 1 || !arguments.is_empty() {
                    self.diagnostics.error(
                        DiagnosticKind::Types,
                        "sizeof takes exactly one type argument and no value arguments",
                    );
                    return Ok(self.module.unreachable());
                }
                let Some(ty) =
                    self.elements
                        .resolve_type(&type_arguments[0], None, true, &mut self.diagnostics)
                else {
                    return Ok(self.module.unreachable());
                };
                let size = i64::from(ty.size().div_ceil(8));
                let usize_type = self.options.target.usize_type();
                let constant = if usize_type.is_long_integer() {
                    self.module.i64_const(size)
                } else {
                    self.module.i32_const(size as i32)
                };
                self.current_type = usize_type;
                Ok(constant)
            }
            Builtin::IsNaN => {
                if !self.expect_arguments(arguments, 1) {
                    return Ok(self.module.unreachable());
                }
                let (value, ty) = self.compile_float_operand(&arguments[0], &contextual)?;
                let native = ty.native_type();
                // A NaN is the only value that differs from itself; a fresh
                // temp evaluates the operand once.
                let temp = self.current_fn_mut()?.add_local(ty.clone(), None);
                let stored = self.module.tee_local(temp, value, native);
                let loaded = self.module.get_local(temp, native);
                let op = if native == NativeType::F32 {
                    BinaryOp::F32Ne
                } else {
                    BinaryOp::F64Ne
                };
                self.current_type = Type::Bool;
                Ok(self.module.binary(op, stored, loaded))
            }
            Builtin::IsFinite => {
                if !self.expect_arguments(arguments, 1) {
                    return Ok(self.module.unreachable());
                }
                // (x != x) ? 0 : abs(x) != Infinity
                let (value, ty) = self.compile_float_operand(&arguments[0], &contextual)?;
                let native = ty.native_type();
                let f32_ = native == NativeType::F32;
                let temp = self.current_fn_mut()?.add_local(ty.clone(), None);
                let stored = self.module.tee_local(temp, value, native);
                let loaded = self.module.get_local(temp, native);
                let ne = if f32_ { BinaryOp::F32Ne } else { BinaryOp::F64Ne };
                let is_nan = self.module.binary(ne, stored, loaded);
                let zero = self.module.i32_const(0);
                let loaded_again = self.module.get_local(temp, native);
                let magnitude = if f32_ {
                    let abs = self.module.unary(UnaryOp::F32Abs, loaded_again);
                    let infinity = self.module.f32_const(f32::INFINITY);
                    self.module.binary(BinaryOp::F32Ne, abs, infinity)
                } else {
                    let abs = self.module.unary(UnaryOp::F64Abs, loaded_again);
                    let infinity = self.module.f64_const(f64::INFINITY);
                    self.module.binary(BinaryOp::F64Ne, abs, infinity)
                };
                self.current_type = Type::Bool;
                Ok(self.module.select(is_nan, zero, magnitude))
            }
        }
    }

    fn expect_arguments(&mut self, arguments: &[ast::Expression], count: usize) -> bool {
        if arguments.len() == count {
            true
        } else {
            self.diagnostics.error(
                DiagnosticKind::Types,
                format!("expected {count} argument(s), got {}", arguments.len()),
            );
            false
        }
    }

    fn invalid_builtin_operand(&mut self, builtin: Builtin, ty: &Type) -> ExprId {
        self.diagnostics.error(
            DiagnosticKind::Types,
            format!("{builtin:?} is not valid for `{ty}`"),
        );
        self.module.unreachable()
    }

    /// Lowers a float builtin's operand, keeping the operand's own float
    /// width when it has one and converting integers to the preferred width
    /// (`f32` in an f32 context, `f64` otherwise).
    fn compile_float_operand(
        &mut self,
        expression: &ast::Expression,
        contextual: &Type,
    ) -> crate::Result<(ExprId, Type)> {
        let preferred = if *contextual == Type::F32 {
            Type::F32
        } else {
            Type::F64
        };
        let value = self.compile_expression(expression, preferred.clone(), false)?;
        let ty = self.current_type.clone();
        if ty.is_any_float() {
            Ok((value, ty))
        } else {
            let converted = self.convert_expression(value, &ty, &preferred)?;
            self.current_type = preferred.clone();
            Ok((converted, preferred))
        }
    }
}
