//! Expression lowering under a contextual type.
//!
//! `compile_expression` drives everything: each per-form compiler records the
//! type it actually produced in `current_type`, and the caller-provided
//! contextual type decides whether a conversion is appended. Binary operators
//! pick their concrete instruction from the left operand's type; comparisons
//! produce `bool`.

use crate::ast;
use crate::diag::DiagnosticKind;
use crate::module::{BinaryOp, ExprId, UnaryOp};
use crate::program::{Element, ResolvedElement};
use crate::types::{Target, Type};

use super::Codegen;

/// Selects the concrete instruction for `operator` on operands of type `ty`.
/// `None` means the operation is invalid for that type.
fn binary_op_for(operator: ast::BinaryOperator, ty: &Type) -> Option<BinaryOp> {
    use ast::BinaryOperator as Op;

    if matches!(ty, Type::Void) {
        return None;
    }
    let f32_ = matches!(ty, Type::F32);
    let float = ty.is_any_float();
    let long = ty.is_long_integer();
    let signed = ty.is_signed_integer();

    macro_rules! pick {
        ($f32_op:ident, $f64_op:ident, $i64_op:ident, $i32_op:ident) => {
            if f32_ {
                BinaryOp::$f32_op
            } else if float {
                BinaryOp::$f64_op
            } else if long {
                BinaryOp::$i64_op
            } else {
                BinaryOp::$i32_op
            }
        };
    }
    macro_rules! pick_int {
        ($i64_op:ident, $i32_op:ident) => {
            if float {
                return None;
            } else if long {
                BinaryOp::$i64_op
            } else {
                BinaryOp::$i32_op
            }
        };
    }
    macro_rules! pick_signed {
        ($i64_s:ident, $i64_u:ident, $i32_s:ident, $i32_u:ident) => {
            if long {
                if signed {
                    BinaryOp::$i64_s
                } else {
                    BinaryOp::$i64_u
                }
            } else if signed {
                BinaryOp::$i32_s
            } else {
                BinaryOp::$i32_u
            }
        };
    }

    Some(match operator {
        Op::Add => pick!(F32Add, F64Add, I64Add, I32Add),
        Op::Sub => pick!(F32Sub, F64Sub, I64Sub, I32Sub),
        Op::Mul => pick!(F32Mul, F64Mul, I64Mul, I32Mul),
        Op::Div => {
            if f32_ {
                BinaryOp::F32Div
            } else if float {
                BinaryOp::F64Div
            } else {
                pick_signed!(I64DivS, I64DivU, I32DivS, I32DivU)
            }
        }
        // Modulo has no float instruction.
        Op::Rem => {
            if float {
                return None;
            }
            pick_signed!(I64RemS, I64RemU, I32RemS, I32RemU)
        }
        Op::Shl => pick_int!(I64Shl, I32Shl),
        Op::Shr => {
            if float {
                return None;
            }
            pick_signed!(I64ShrS, I64ShrU, I32ShrS, I32ShrU)
        }
        Op::ShrU => pick_int!(I64ShrU, I32ShrU),
        Op::BitAnd => pick_int!(I64And, I32And),
        Op::BitOr => pick_int!(I64Or, I32Or),
        Op::BitXor => pick_int!(I64Xor, I32Xor),
        Op::Eq => pick!(F32Eq, F64Eq, I64Eq, I32Eq),
        Op::Ne => pick!(F32Ne, F64Ne, I64Ne, I32Ne),
        Op::Lt => {
            if f32_ {
                BinaryOp::F32Lt
            } else if float {
                BinaryOp::F64Lt
            } else {
                pick_signed!(I64LtS, I64LtU, I32LtS, I32LtU)
            }
        }
        Op::Le => {
            if f32_ {
                BinaryOp::F32Le
            } else if float {
                BinaryOp::F64Le
            } else {
                pick_signed!(I64LeS, I64LeU, I32LeS, I32LeU)
            }
        }
        Op::Gt => {
            if f32_ {
                BinaryOp::F32Gt
            } else if float {
                BinaryOp::F64Gt
            } else {
                pick_signed!(I64GtS, I64GtU, I32GtS, I32GtU)
            }
        }
        Op::Ge => {
            if f32_ {
                BinaryOp::F32Ge
            } else if float {
                BinaryOp::F64Ge
            } else {
                pick_signed!(I64GeS, I64GeU, I32GeS, I32GeU)
            }
        }
        _ => return None,
    })
}

impl<'src> Codegen<'src> {
    /// Lowers `expression` under the `contextual` type.
    ///
    /// On return `current_type` holds the produced type; with `convert` set,
    /// a differing type has been reconciled and `current_type` equals
    /// `contextual`.
    pub(crate) fn compile_expression(
        &mut self,
        expression: &ast::Expression,
        contextual: Type,
        convert: bool,
    ) -> crate::Result<ExprId> {
        self.current_type = contextual.clone();
        let compiled = match expression {
            ast::Expression::Binary {
                operator,
                left,
                right,
            } => self.compile_binary(*operator, left, right, contextual.clone())?,
            ast::Expression::Call {
                expression,
                type_arguments,
                arguments,
            } => self.compile_call(expression, type_arguments, arguments, contextual.clone())?,
            ast::Expression::False => {
                self.current_type = Type::Bool;
                self.module.i32_const(0)
            }
            ast::Expression::True => {
                self.current_type = Type::Bool;
                self.module.i32_const(1)
            }
            ast::Expression::Null => self.compile_null(&contextual),
            ast::Expression::This => self.compile_this()?,
            ast::Expression::FloatLiteral(value) => self.compile_float_literal(*value, &contextual),
            ast::Expression::IntegerLiteral(value) => {
                self.compile_integer_literal(*value, &contextual)
            }
            ast::Expression::Identifier(name) => self.compile_identifier(name, &contextual)?,
            ast::Expression::Parenthesized(inner) => {
                self.compile_expression(inner, contextual.clone(), false)?
            }
            ast::Expression::Select {
                condition,
                if_true,
                if_false,
            } => {
                let condition = self.compile_expression(condition, Type::I32, true)?;
                let if_true = self.compile_expression(if_true, contextual.clone(), true)?;
                let if_false = self.compile_expression(if_false, contextual.clone(), true)?;
                self.current_type = contextual.clone();
                self.module.select(condition, if_true, if_false)
            }
            ast::Expression::UnaryPrefix { operator, operand } => {
                self.compile_unary_prefix(*operator, operand, contextual.clone())?
            }
            ast::Expression::UnaryPostfix { operator, operand } => {
                self.compile_unary_postfix(*operator, operand, contextual.clone())?
            }
            ast::Expression::ArrayLiteral(_) => self.unsupported("array literals"),
            ast::Expression::StringLiteral(_) => self.unsupported("string literals"),
            ast::Expression::New { .. } => self.unsupported("new expressions"),
            ast::Expression::ElementAccess { .. } => self.unsupported("element access"),
            ast::Expression::PropertyAccess { .. } => self.unsupported("property access"),
        };

        if convert && self.current_type != contextual {
            let from = self.current_type.clone();
            let converted = self.convert_expression(compiled, &from, &contextual)?;
            self.current_type = contextual;
            return Ok(converted);
        }
        Ok(compiled)
    }

    fn unsupported(&mut self, what: &str) -> ExprId {
        self.diagnostics.error(
            DiagnosticKind::Unsupported,
            format!("{what} are not implemented"),
        );
        self.module.unreachable()
    }

    fn compile_binary(
        &mut self,
        operator: ast::BinaryOperator,
        left: &ast::Expression,
        right: &ast::Expression,
        contextual: Type,
    ) -> crate::Result<ExprId> {
        use ast::BinaryOperator as Op;

        if operator == Op::Assign {
            let target_type = self.determine_expression_type(left)?;
            let value = self.compile_expression(right, target_type, true)?;
            return self.compile_assignment_with_value(left, value, contextual != Type::Void);
        }
        if let Some(compound) = operator.compound_operator() {
            let target_type = self.determine_expression_type(left)?;
            let value = self.compile_binary_operation(compound, left, right, target_type)?;
            return self.compile_assignment_with_value(left, value, contextual != Type::Void);
        }
        if matches!(operator, Op::LogicalAnd | Op::LogicalOr) {
            return self.compile_logical(operator, left, right);
        }
        self.compile_binary_operation(operator, left, right, contextual)
    }

    fn compile_binary_operation(
        &mut self,
        operator: ast::BinaryOperator,
        left: &ast::Expression,
        right: &ast::Expression,
        contextual: Type,
    ) -> crate::Result<ExprId> {
        // Shifts and bitwise operators reject float contextual types.
        let contextual = if contextual.is_any_float() && operator.is_bitwise() {
            if operator == ast::BinaryOperator::ShrU {
                Type::U64
            } else {
                Type::I64
            }
        } else {
            contextual
        };

        let left = self.compile_expression(left, contextual, false)?;
        let ty = self.current_type.clone();
        let right = self.compile_expression(right, ty.clone(), true)?;

        let Some(op) = binary_op_for(operator, &ty) else {
            let kind = if operator == ast::BinaryOperator::Rem && ty.is_any_float() {
                DiagnosticKind::Unsupported
            } else {
                DiagnosticKind::Types
            };
            self.diagnostics.error(
                kind,
                format!("operator `{}` is not valid for `{ty}`", operator.symbol()),
            );
            return Ok(self.module.unreachable());
        };

        let result = self.module.binary(op, left, right);
        self.current_type = if operator.is_comparison() {
            Type::Bool
        } else {
            ty
        };
        Ok(result)
    }

    /// `&&` and `||` lower to an `if` so the right operand short-circuits.
    fn compile_logical(
        &mut self,
        operator: ast::BinaryOperator,
        left: &ast::Expression,
        right: &ast::Expression,
    ) -> crate::Result<ExprId> {
        let left = self.compile_expression(left, Type::Bool, true)?;
        let right = self.compile_expression(right, Type::Bool, true)?;
        let result = match operator {
            ast::BinaryOperator::LogicalAnd => {
                let zero = self.module.i32_const(0);
                self.module.if_(left, right, Some(zero))
            }
            _ => {
                let one = self.module.i32_const(1);
                self.module.if_(left, one, Some(right))
            }
        };
        self.current_type = Type::Bool;
        Ok(result)
    }

    /// Discovers the type `expression` would produce, without emitting: a
    /// scoped dry run behind the backend's `no_emit` toggle.
    pub(crate) fn determine_expression_type(
        &mut self,
        expression: &ast::Expression,
    ) -> crate::Result<Type> {
        let previous = self.module.set_no_emit(true);
        let result = self.compile_expression(expression, Type::I32, false);
        self.module.set_no_emit(previous);
        result?;
        Ok(self.current_type.clone())
    }

    /// Stores `value` into the target of an assignment. With `tee`, the
    /// emitted node also yields the stored value.
    pub(crate) fn compile_assignment_with_value(
        &mut self,
        target: &ast::Expression,
        value: ExprId,
        tee: bool,
    ) -> crate::Result<ExprId> {
        let resolved = match target {
            ast::Expression::Identifier(name) => {
                let function = self.elements.function(self.current_function)?;
                self.elements
                    .resolve_identifier(name, self.current_source, function)
            }
            _ => None,
        };

        match resolved {
            Some(ResolvedElement::Local { index, ty }) => {
                if tee {
                    let native = ty.native_type();
                    self.current_type = ty;
                    Ok(self.module.tee_local(index, value, native))
                } else {
                    self.current_type = Type::Void;
                    Ok(self.module.set_local(index, value))
                }
            }
            Some(ResolvedElement::Element(id))
                if matches!(self.elements.get(id), Element::Global(_)) =>
            {
                if !self.module.no_emit() {
                    self.compile_global(id)?;
                }
                let name = self.elements.global(id)?.internal_name.clone();
                let Some(ty) = self.global_type(id)? else {
                    return Ok(self.module.unreachable());
                };
                let set = self.module.set_global(&name, value);
                if tee {
                    let native = ty.native_type();
                    let get = self.module.get_global(&name, native);
                    self.current_type = ty;
                    Ok(self.module.block(None, vec![set, get], native))
                } else {
                    self.current_type = Type::Void;
                    Ok(set)
                }
            }
            _ => {
                self.diagnostics
                    .error(DiagnosticKind::Types, "target is not assignable");
                Ok(self.module.unreachable())
            }
        }
    }

    /// The declared type of a global, resolving from the declaration when the
    /// global has not been compiled yet (dry runs).
    fn global_type(&mut self, id: crate::program::ElementId) -> crate::Result<Option<Type>> {
        if let Some(ty) = self.elements.global(id)?.resolved_type.clone() {
            return Ok(Some(ty));
        }
        let declaration = self.elements.global(id)?.declaration;
        Ok(match declaration.and_then(|d| d.type_node.as_ref()) {
            Some(node) => self
                .elements
                .resolve_type(node, None, false, &mut self.diagnostics),
            None => None,
        })
    }

    fn compile_call(
        &mut self,
        callee: &ast::Expression,
        type_arguments: &[ast::TypeNode],
        arguments: &[ast::Expression],
        contextual: Type,
    ) -> crate::Result<ExprId> {
        let ast::Expression::Identifier(name) = callee else {
            self.diagnostics
                .error(DiagnosticKind::Types, "expression is not callable");
            return Ok(self.module.unreachable());
        };
        let resolved = {
            let function = self.elements.function(self.current_function)?;
            self.elements
                .resolve_identifier(name, self.current_source, function)
        };
        let Some(ResolvedElement::Element(id)) = resolved else {
            self.diagnostics.error(
                DiagnosticKind::Lookup,
                format!("cannot find function `{name}`"),
            );
            return Ok(self.module.unreachable());
        };
        if !matches!(self.elements.get(id), Element::FunctionPrototype(_)) {
            self.diagnostics.error(
                DiagnosticKind::Types,
                format!("`{name}` is not a function"),
            );
            return Ok(self.module.unreachable());
        }

        let builtin = self.elements.prototype(id)?.builtin;
        if let Some(builtin) = builtin {
            return self.compile_builtin_call(builtin, type_arguments, arguments, contextual);
        }

        let mut resolved_arguments = Vec::with_capacity(type_arguments.len());
        for node in type_arguments {
            match self
                .elements
                .resolve_type(node, None, true, &mut self.diagnostics)
            {
                Some(ty) => resolved_arguments.push(ty),
                None => return Ok(self.module.unreachable()),
            }
        }
        let Some(instance) =
            self.elements
                .resolve_function(id, resolved_arguments, &mut self.diagnostics)?
        else {
            return Ok(self.module.unreachable());
        };
        if !self.module.no_emit() {
            self.compile_function(instance)?;
        }

        let (internal_name, parameters, return_type, is_import) = {
            let function = self.elements.function(instance)?;
            (
                function.internal_name.clone(),
                function.parameters.clone(),
                function.return_type.clone(),
                function.is_import,
            )
        };

        if arguments.len() > parameters.len() {
            self.diagnostics.error(
                DiagnosticKind::Types,
                format!(
                    "expected {} argument(s) for `{name}`, got {}",
                    parameters.len(),
                    arguments.len()
                ),
            );
            return Ok(self.module.unreachable());
        }

        let mut operands = Vec::with_capacity(parameters.len());
        for (index, parameter) in parameters.iter().enumerate() {
            if let Some(argument) = arguments.get(index) {
                operands.push(self.compile_expression(argument, parameter.ty.clone(), true)?);
            } else if let Some(initializer) = parameter.initializer {
                // FIXME: evaluated in the caller's scope; synthesize
                // per-overload stubs holding the defaults instead.
                operands.push(self.compile_expression(initializer, parameter.ty.clone(), true)?);
            } else {
                self.diagnostics.error(
                    DiagnosticKind::Types,
                    format!(
                        "expected {} argument(s) for `{name}`, got {}",
                        parameters.len(),
                        arguments.len()
                    ),
                );
                return Ok(self.module.unreachable());
            }
        }

        let result = return_type.native_type();
        let call = if is_import {
            self.module.call_import(&internal_name, operands, result)
        } else {
            self.module.call(&internal_name, operands, result)
        };
        self.current_type = return_type;
        Ok(call)
    }

    fn compile_null(&mut self, contextual: &Type) -> ExprId {
        if matches!(contextual, Type::Class { .. }) {
            // A class-typed context keeps its type.
            if contextual.is_long_integer() {
                self.module.i64_const(0)
            } else {
                self.module.i32_const(0)
            }
        } else {
            let usize_type = self.options.target.usize_type();
            let zero = if usize_type.is_long_integer() {
                self.module.i64_const(0)
            } else {
                self.module.i32_const(0)
            };
            self.current_type = usize_type;
            zero
        }
    }

    fn compile_this(&mut self) -> crate::Result<ExprId> {
        let (is_instance, class) = {
            let function = self.current_fn()?;
            (function.is_instance, function.instance_method_of)
        };
        match class {
            Some(element) if is_instance => {
                let ptr64 = matches!(self.options.target, Target::Wasm64);
                let ty = Type::Class { element, ptr64 };
                let this = self.module.get_local(0, ty.native_type());
                self.current_type = ty;
                Ok(this)
            }
            _ => {
                self.diagnostics.error(
                    DiagnosticKind::Structure,
                    "`this` is only valid inside an instance method",
                );
                Ok(self.module.unreachable())
            }
        }
    }

    fn compile_integer_literal(&mut self, value: i64, contextual: &Type) -> ExprId {
        if *contextual == Type::Bool && (value == 0 || value == 1) {
            self.current_type = Type::Bool;
            return self.module.i32_const(value as i32);
        }
        if contextual.is_long_integer() {
            return self.module.i64_const(value);
        }
        match i32::try_from(value) {
            Ok(value) => {
                self.current_type = Type::I32;
                self.module.i32_const(value)
            }
            Err(_) => {
                self.current_type = Type::I64;
                self.module.i64_const(value)
            }
        }
    }

    fn compile_float_literal(&mut self, value: f64, contextual: &Type) -> ExprId {
        if *contextual == Type::F32 {
            self.current_type = Type::F32;
            self.module.f32_const(value as f32)
        } else {
            self.current_type = Type::F64;
            self.module.f64_const(value)
        }
    }

    fn compile_identifier(&mut self, name: &str, contextual: &Type) -> crate::Result<ExprId> {
        match name {
            "NaN" => {
                return Ok(if *contextual == Type::F32 {
                    self.current_type = Type::F32;
                    self.module.f32_const(f32::NAN)
                } else {
                    self.current_type = Type::F64;
                    self.module.f64_const(f64::NAN)
                })
            }
            "Infinity" => {
                return Ok(if *contextual == Type::F32 {
                    self.current_type = Type::F32;
                    self.module.f32_const(f32::INFINITY)
                } else {
                    self.current_type = Type::F64;
                    self.module.f64_const(f64::INFINITY)
                })
            }
            _ => (),
        }

        let resolved = {
            let function = self.elements.function(self.current_function)?;
            self.elements
                .resolve_identifier(name, self.current_source, function)
        };
        match resolved {
            Some(ResolvedElement::Local { index, ty }) => {
                let local = self.module.get_local(index, ty.native_type());
                self.current_type = ty;
                Ok(local)
            }
            Some(ResolvedElement::Element(id))
                if matches!(self.elements.get(id), Element::Global(_)) =>
            {
                if !self.module.no_emit() {
                    self.compile_global(id)?;
                }
                let internal_name = self.elements.global(id)?.internal_name.clone();
                let Some(ty) = self.global_type(id)? else {
                    return Ok(self.module.unreachable());
                };
                let global = self.module.get_global(&internal_name, ty.native_type());
                self.current_type = ty;
                Ok(global)
            }
            Some(ResolvedElement::Element(id)) => {
                self.diagnostics.error(
                    DiagnosticKind::Types,
                    format!(
                        "{} `{name}` cannot be used as a value",
                        self.elements.get(id).kind_name()
                    ),
                );
                Ok(self.module.unreachable())
            }
            None => {
                self.diagnostics.error(
                    DiagnosticKind::Lookup,
                    format!("cannot find name `{name}`"),
                );
                Ok(self.module.unreachable())
            }
        }
    }

    fn compile_unary_prefix(
        &mut self,
        operator: ast::UnaryPrefixOperator,
        operand: &ast::Expression,
        contextual: Type,
    ) -> crate::Result<ExprId> {
        use ast::UnaryPrefixOperator as Op;
        match operator {
            Op::Plus => self.compile_expression(operand, contextual, false),
            Op::Minus => {
                let value = self.compile_expression(operand, contextual, false)?;
                let ty = self.current_type.clone();
                let negated = match &ty {
                    Type::F32 => self.module.unary(UnaryOp::F32Neg, value),
                    Type::F64 => self.module.unary(UnaryOp::F64Neg, value),
                    ty if ty.is_long_integer() => {
                        let zero = self.module.i64_const(0);
                        self.module.binary(BinaryOp::I64Sub, zero, value)
                    }
                    ty if ty.is_any_integer() => {
                        let zero = self.module.i32_const(0);
                        self.module.binary(BinaryOp::I32Sub, zero, value)
                    }
                    _ => {
                        self.diagnostics.error(
                            DiagnosticKind::Types,
                            format!("operator `-` is not valid for `{ty}`"),
                        );
                        return Ok(self.module.unreachable());
                    }
                };
                self.current_type = ty;
                Ok(negated)
            }
            Op::Not => {
                let value = self.compile_expression(operand, contextual, false)?;
                let ty = self.current_type.clone();
                let tested = match &ty {
                    Type::F32 => {
                        let zero = self.module.f32_const(0.0);
                        self.module.binary(BinaryOp::F32Eq, value, zero)
                    }
                    Type::F64 => {
                        let zero = self.module.f64_const(0.0);
                        self.module.binary(BinaryOp::F64Eq, value, zero)
                    }
                    ty if ty.is_long_integer() => self.module.unary(UnaryOp::I64Eqz, value),
                    ty if ty.is_any_integer() => self.module.unary(UnaryOp::I32Eqz, value),
                    _ => {
                        self.diagnostics.error(
                            DiagnosticKind::Types,
                            format!("operator `!` is not valid for `{ty}`"),
                        );
                        return Ok(self.module.unreachable());
                    }
                };
                self.current_type = Type::Bool;
                Ok(tested)
            }
            Op::BitNot => {
                // Bitwise rejection of float contexts, like shifts.
                let effective = if contextual.is_any_float() {
                    Type::I64
                } else {
                    contextual
                };
                let value = self.compile_expression(operand, effective, false)?;
                let ty = self.current_type.clone();
                if !ty.is_any_integer() {
                    self.diagnostics.error(
                        DiagnosticKind::Types,
                        format!("operator `~` is not valid for `{ty}`"),
                    );
                    return Ok(self.module.unreachable());
                }
                let inverted = if ty.is_long_integer() {
                    let ones = self.module.i64_const(-1);
                    self.module.binary(BinaryOp::I64Xor, value, ones)
                } else {
                    let ones = self.module.i32_const(-1);
                    self.module.binary(BinaryOp::I32Xor, value, ones)
                };
                // Small integers re-normalize on production.
                let inverted = if ty.is_small_integer() {
                    self.normalize_small_integer(inverted, &ty)
                } else {
                    inverted
                };
                self.current_type = ty;
                Ok(inverted)
            }
            Op::Increment | Op::Decrement => {
                let target_type = self.determine_expression_type(operand)?;
                let Some(value) =
                    self.compile_increment(operand, operator == Op::Increment, target_type)?
                else {
                    return Ok(self.module.unreachable());
                };
                self.compile_assignment_with_value(operand, value, contextual != Type::Void)
            }
        }
    }

    /// Lowers `operand + 1` / `operand - 1` under `ty`, for `++` and `--`.
    fn compile_increment(
        &mut self,
        operand: &ast::Expression,
        increment: bool,
        ty: Type,
    ) -> crate::Result<Option<ExprId>> {
        let value = self.compile_expression(operand, ty, false)?;
        let ty = self.current_type.clone();
        let (op, one) = match &ty {
            Type::F32 => {
                let one = self.module.f32_const(1.0);
                (if increment { BinaryOp::F32Add } else { BinaryOp::F32Sub }, one)
            }
            Type::F64 => {
                let one = self.module.f64_const(1.0);
                (if increment { BinaryOp::F64Add } else { BinaryOp::F64Sub }, one)
            }
            ty if ty.is_long_integer() => {
                let one = self.module.i64_const(1);
                (if increment { BinaryOp::I64Add } else { BinaryOp::I64Sub }, one)
            }
            ty if ty.is_any_integer() => {
                let one = self.module.i32_const(1);
                (if increment { BinaryOp::I32Add } else { BinaryOp::I32Sub }, one)
            }
            _ => {
                self.diagnostics.error(
                    DiagnosticKind::Types,
                    format!("operator `{}` is not valid for `{ty}`", if increment { "++" } else { "--" }),
                );
                return Ok(None);
            }
        };
        let combined = self.module.binary(op, value, one);
        self.current_type = ty;
        Ok(Some(combined))
    }

    /// `x++` and `x--` produce a `{ getValue; setValue }` block of the
    /// operand's native type, valued at the pre-increment value.
    fn compile_unary_postfix(
        &mut self,
        operator: ast::UnaryPostfixOperator,
        operand: &ast::Expression,
        contextual: Type,
    ) -> crate::Result<ExprId> {
        let get = self.compile_expression(operand, contextual, false)?;
        let ty = self.current_type.clone();
        let increment = operator == ast::UnaryPostfixOperator::Increment;
        let Some(combined) = self.compile_increment(operand, increment, ty.clone())? else {
            return Ok(self.module.unreachable());
        };
        let set = self.compile_assignment_with_value(operand, combined, false)?;
        self.current_type = ty.clone();
        Ok(self
            .module
            .block(None, vec![get, set], ty.native_type()))
    }
}
