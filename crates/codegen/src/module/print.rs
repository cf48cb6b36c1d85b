//! Renders a [`Module`] as wat-flavored text.
//!
//! One node per line, children indented below their parent, closing
//! parentheses collapsed onto the last child. This is a diagnostic format for
//! tests and logs; binary serialization is the assembler's job.

use super::{BinaryOp, Expr, ExprId, HostOp, Module, UnaryOp};
use crate::types::NativeType;

impl NativeType {
    fn print(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::None => "none",
        }
    }
}

impl UnaryOp {
    fn mnemonic(self) -> &'static str {
        match self {
            Self::I32Clz => "i32.clz",
            Self::I64Clz => "i64.clz",
            Self::I32Ctz => "i32.ctz",
            Self::I64Ctz => "i64.ctz",
            Self::I32Popcnt => "i32.popcnt",
            Self::I64Popcnt => "i64.popcnt",
            Self::I32Eqz => "i32.eqz",
            Self::I64Eqz => "i64.eqz",
            Self::F32Neg => "f32.neg",
            Self::F64Neg => "f64.neg",
            Self::F32Abs => "f32.abs",
            Self::F64Abs => "f64.abs",
            Self::F32Ceil => "f32.ceil",
            Self::F64Ceil => "f64.ceil",
            Self::F32Floor => "f32.floor",
            Self::F64Floor => "f64.floor",
            Self::F32Trunc => "f32.trunc",
            Self::F64Trunc => "f64.trunc",
            Self::F32Nearest => "f32.nearest",
            Self::F64Nearest => "f64.nearest",
            Self::F32Sqrt => "f32.sqrt",
            Self::F64Sqrt => "f64.sqrt",
            Self::I32WrapI64 => "i32.wrap/i64",
            Self::I64ExtendI32S => "i64.extend_s/i32",
            Self::I64ExtendI32U => "i64.extend_u/i32",
            Self::I32TruncF32S => "i32.trunc_s/f32",
            Self::I32TruncF32U => "i32.trunc_u/f32",
            Self::I32TruncF64S => "i32.trunc_s/f64",
            Self::I32TruncF64U => "i32.trunc_u/f64",
            Self::I64TruncF32S => "i64.trunc_s/f32",
            Self::I64TruncF32U => "i64.trunc_u/f32",
            Self::I64TruncF64S => "i64.trunc_s/f64",
            Self::I64TruncF64U => "i64.trunc_u/f64",
            Self::F32ConvertI32S => "f32.convert_s/i32",
            Self::F32ConvertI32U => "f32.convert_u/i32",
            Self::F32ConvertI64S => "f32.convert_s/i64",
            Self::F32ConvertI64U => "f32.convert_u/i64",
            Self::F64ConvertI32S => "f64.convert_s/i32",
            Self::F64ConvertI32U => "f64.convert_u/i32",
            Self::F64ConvertI64S => "f64.convert_s/i64",
            Self::F64ConvertI64U => "f64.convert_u/i64",
            Self::F32DemoteF64 => "f32.demote/f64",
            Self::F64PromoteF32 => "f64.promote/f32",
        }
    }
}

impl BinaryOp {
    fn mnemonic(self) -> &'static str {
        match self {
            Self::I32Add => "i32.add",
            Self::I32Sub => "i32.sub",
            Self::I32Mul => "i32.mul",
            Self::I32DivS => "i32.div_s",
            Self::I32DivU => "i32.div_u",
            Self::I32RemS => "i32.rem_s",
            Self::I32RemU => "i32.rem_u",
            Self::I32And => "i32.and",
            Self::I32Or => "i32.or",
            Self::I32Xor => "i32.xor",
            Self::I32Shl => "i32.shl",
            Self::I32ShrS => "i32.shr_s",
            Self::I32ShrU => "i32.shr_u",
            Self::I32Rotl => "i32.rotl",
            Self::I32Rotr => "i32.rotr",
            Self::I32Eq => "i32.eq",
            Self::I32Ne => "i32.ne",
            Self::I32LtS => "i32.lt_s",
            Self::I32LtU => "i32.lt_u",
            Self::I32LeS => "i32.le_s",
            Self::I32LeU => "i32.le_u",
            Self::I32GtS => "i32.gt_s",
            Self::I32GtU => "i32.gt_u",
            Self::I32GeS => "i32.ge_s",
            Self::I32GeU => "i32.ge_u",
            Self::I64Add => "i64.add",
            Self::I64Sub => "i64.sub",
            Self::I64Mul => "i64.mul",
            Self::I64DivS => "i64.div_s",
            Self::I64DivU => "i64.div_u",
            Self::I64RemS => "i64.rem_s",
            Self::I64RemU => "i64.rem_u",
            Self::I64And => "i64.and",
            Self::I64Or => "i64.or",
            Self::I64Xor => "i64.xor",
            Self::I64Shl => "i64.shl",
            Self::I64ShrS => "i64.shr_s",
            Self::I64ShrU => "i64.shr_u",
            Self::I64Rotl => "i64.rotl",
            Self::I64Rotr => "i64.rotr",
            Self::I64Eq => "i64.eq",
            Self::I64Ne => "i64.ne",
            Self::I64LtS => "i64.lt_s",
            Self::I64LtU => "i64.lt_u",
            Self::I64LeS => "i64.le_s",
            Self::I64LeU => "i64.le_u",
            Self::I64GtS => "i64.gt_s",
            Self::I64GtU => "i64.gt_u",
            Self::I64GeS => "i64.ge_s",
            Self::I64GeU => "i64.ge_u",
            Self::F32Add => "f32.add",
            Self::F32Sub => "f32.sub",
            Self::F32Mul => "f32.mul",
            Self::F32Div => "f32.div",
            Self::F32Min => "f32.min",
            Self::F32Max => "f32.max",
            Self::F32CopySign => "f32.copysign",
            Self::F32Eq => "f32.eq",
            Self::F32Ne => "f32.ne",
            Self::F32Lt => "f32.lt",
            Self::F32Le => "f32.le",
            Self::F32Gt => "f32.gt",
            Self::F32Ge => "f32.ge",
            Self::F64Add => "f64.add",
            Self::F64Sub => "f64.sub",
            Self::F64Mul => "f64.mul",
            Self::F64Div => "f64.div",
            Self::F64Min => "f64.min",
            Self::F64Max => "f64.max",
            Self::F64CopySign => "f64.copysign",
            Self::F64Eq => "f64.eq",
            Self::F64Ne => "f64.ne",
            Self::F64Lt => "f64.lt",
            Self::F64Le => "f64.le",
            Self::F64Gt => "f64.gt",
            Self::F64Ge => "f64.ge",
        }
    }
}

impl HostOp {
    fn mnemonic(self) -> &'static str {
        match self {
            Self::CurrentMemory => "current_memory",
            Self::GrowMemory => "grow_memory",
        }
    }
}

fn write_head(f: &mut std::fmt::Formatter<'_>, expr: &Expr) -> std::fmt::Result {
    match expr {
        Expr::I32(v) => write!(f, "i32.const {v}"),
        Expr::I64(v) => write!(f, "i64.const {v}"),
        Expr::F32(v) => write!(f, "f32.const {v}"),
        Expr::F64(v) => write!(f, "f64.const {v}"),
        Expr::Unary { op, .. } => f.write_str(op.mnemonic()),
        Expr::Binary { op, .. } => f.write_str(op.mnemonic()),
        Expr::Host { op, .. } => f.write_str(op.mnemonic()),
        Expr::Block { label, result, .. } => {
            f.write_str("block")?;
            if let Some(label) = label {
                write!(f, " ${label}")?;
            }
            if !matches!(result, NativeType::None) {
                write!(f, " {}", result.print())?;
            }
            Ok(())
        }
        Expr::Loop { label, .. } => write!(f, "loop ${label}"),
        Expr::If { .. } => f.write_str("if"),
        Expr::Break {
            label,
            condition: None,
        } => write!(f, "br ${label}"),
        Expr::Break {
            label,
            condition: Some(_),
        } => write!(f, "br_if ${label}"),
        Expr::Return { .. } => f.write_str("return"),
        Expr::Nop => f.write_str("nop"),
        Expr::Unreachable => f.write_str("unreachable"),
        Expr::Drop { .. } => f.write_str("drop"),
        Expr::Select { .. } => f.write_str("select"),
        Expr::GetLocal { index, .. } => write!(f, "get_local {index}"),
        Expr::SetLocal { index, .. } => write!(f, "set_local {index}"),
        Expr::TeeLocal { index, .. } => write!(f, "tee_local {index}"),
        Expr::GetGlobal { name, .. } => write!(f, "get_global ${name}"),
        Expr::SetGlobal { name, .. } => write!(f, "set_global ${name}"),
        Expr::Call { target, .. } => write!(f, "call ${target}"),
        Expr::CallImport { target, .. } => write!(f, "call_import ${target}"),
    }
}

fn children(expr: &Expr) -> Vec<ExprId> {
    match expr {
        Expr::I32(_)
        | Expr::I64(_)
        | Expr::F32(_)
        | Expr::F64(_)
        | Expr::Nop
        | Expr::Unreachable
        | Expr::GetLocal { .. }
        | Expr::GetGlobal { .. }
        | Expr::Break {
            condition: None, ..
        } => Vec::new(),
        Expr::Unary { value, .. }
        | Expr::Drop { value }
        | Expr::SetLocal { value, .. }
        | Expr::TeeLocal { value, .. }
        | Expr::SetGlobal { value, .. } => vec![*value],
        Expr::Binary { left, right, .. } => vec![*left, *right],
        Expr::Host { operands, .. }
        | Expr::Call { operands, .. }
        | Expr::CallImport { operands, .. } => operands.to_vec(),
        Expr::Block { children, .. } => children.to_vec(),
        Expr::Loop { body, .. } => vec![*body],
        Expr::If {
            condition,
            if_true,
            if_false,
        } => {
            let mut c = vec![*condition, *if_true];
            c.extend(*if_false);
            c
        }
        Expr::Break {
            condition: Some(condition),
            ..
        } => vec![*condition],
        Expr::Return { value } => value.iter().copied().collect(),
        Expr::Select {
            condition,
            if_true,
            if_false,
        } => vec![*condition, *if_true, *if_false],
    }
}

fn write_tree(
    f: &mut std::fmt::Formatter<'_>,
    module: &Module,
    id: ExprId,
    indent: usize,
) -> std::fmt::Result {
    let expr = module.expr(id);
    write!(f, "{:indent$}(", "", indent = indent * 2)?;
    write_head(f, expr)?;
    for child in children(expr) {
        writeln!(f)?;
        write_tree(f, module, child, indent + 1)?;
    }
    f.write_str(")")
}

fn write_inline(f: &mut std::fmt::Formatter<'_>, module: &Module, id: ExprId) -> std::fmt::Result {
    let expr = module.expr(id);
    f.write_str("(")?;
    write_head(f, expr)?;
    for child in children(expr) {
        f.write_str(" ")?;
        write_inline(f, module, child)?;
    }
    f.write_str(")")
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(module\n")?;

        for (i, ty) in self.function_types.iter().enumerate() {
            write!(f, "  (type $t{i} (func")?;
            if !ty.params.is_empty() {
                f.write_str(" (param")?;
                for param in ty.params.iter() {
                    write!(f, " {}", param.print())?;
                }
                f.write_str(")")?;
            }
            if !matches!(ty.result, NativeType::None) {
                write!(f, " (result {})", ty.result.print())?;
            }
            f.write_str("))\n")?;
        }

        for import in &self.imports {
            writeln!(
                f,
                "  (import \"{}\" \"{}\" (func ${} (type $t{})))",
                import.module, import.base, import.name, import.ty.0
            )?;
        }

        if let Some(memory) = &self.memory {
            writeln!(f, "  (memory {} {})", memory.initial, memory.maximum)?;
            for segment in &memory.segments {
                write!(f, "  (data (i32.const {}) \"", segment.offset)?;
                for byte in segment.data.iter() {
                    write!(f, "\\{byte:02x}")?;
                }
                f.write_str("\")\n")?;
            }
            if let Some(export) = &memory.export_name {
                writeln!(f, "  (export \"{export}\" (memory 0))")?;
            }
        }

        for global in &self.globals {
            write!(f, "  (global ${} ", global.name)?;
            if global.mutable {
                write!(f, "(mut {})", global.ty.print())?;
            } else {
                f.write_str(global.ty.print())?;
            }
            f.write_str(" ")?;
            write_inline(f, self, global.init)?;
            f.write_str(")\n")?;
        }

        for function in &self.functions {
            write!(f, "  (func ${} (type $t{})", function.name, function.ty.0)?;
            if !function.locals.is_empty() {
                f.write_str("\n    (local")?;
                for local in function.locals.iter() {
                    write!(f, " {}", local.print())?;
                }
                f.write_str(")")?;
            }
            f.write_str("\n")?;
            write_tree(f, self, function.body, 2)?;
            f.write_str(")\n")?;
        }

        for export in &self.exports {
            writeln!(
                f,
                "  (export \"{}\" (func ${}))",
                export.external_name, export.internal_name
            )?;
        }

        if let Some(start) = self.start() {
            writeln!(f, "  (start ${})", start.name)?;
        }

        f.write_str(")")
    }
}
