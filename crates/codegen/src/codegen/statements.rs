//! Statement lowering onto WebAssembly's label-based block-and-loop form.
//!
//! Every statement lowers to a single expression of type `none`. Loops and
//! switches open a break context on the current function, yielding the fresh
//! `break$N` / `continue$N` label pair their jumps target.

use crate::ast;
use crate::diag::DiagnosticKind;
use crate::module::{BinaryOp, ExprId};
use crate::types::{NativeType, Type};

use super::Codegen;

impl<'src> Codegen<'src> {
    pub(crate) fn compile_statement(
        &mut self,
        statement: &'src ast::Statement,
    ) -> crate::Result<ExprId> {
        match statement {
            ast::Statement::Block(statements) => {
                let mut children = Vec::with_capacity(statements.len());
                for statement in statements {
                    children.push(self.compile_statement(statement)?);
                }
                Ok(self.module.block(None, children, NativeType::None))
            }
            ast::Statement::Break => self.compile_break(),
            ast::Statement::Continue => self.compile_continue(),
            ast::Statement::Do {
                statement,
                condition,
            } => self.compile_do(statement, condition),
            ast::Statement::Empty => Ok(self.module.nop()),
            ast::Statement::Expression(expression) => {
                self.compile_expression(expression, Type::Void, true)
            }
            ast::Statement::For {
                initializer,
                condition,
                incrementor,
                statement,
            } => self.compile_for(
                initializer.as_deref(),
                condition.as_ref(),
                incrementor.as_ref(),
                statement,
            ),
            ast::Statement::If {
                condition,
                if_true,
                if_false,
            } => {
                let condition = self.compile_expression(condition, Type::I32, true)?;
                let if_true = self.compile_statement(if_true)?;
                let if_false = match if_false {
                    Some(statement) => Some(self.compile_statement(statement)?),
                    None => None,
                };
                Ok(self.module.if_(condition, if_true, if_false))
            }
            ast::Statement::Return(value) => {
                let value = match value {
                    Some(expression) => {
                        let return_type = self.current_fn()?.return_type.clone();
                        Some(self.compile_expression(expression, return_type, true)?)
                    }
                    None => None,
                };
                Ok(self.module.return_(value))
            }
            ast::Statement::Switch { condition, cases } => self.compile_switch(condition, cases),
            ast::Statement::Throw(_) => Ok(self.module.unreachable()),
            ast::Statement::Try(_) => {
                self.diagnostics.error(
                    DiagnosticKind::Unsupported,
                    "try statements are not implemented",
                );
                Ok(self.module.unreachable())
            }
            ast::Statement::Variable(variable) => self.compile_variable_statement(variable),
            ast::Statement::While {
                condition,
                statement,
            } => self.compile_while(condition, statement),
            ast::Statement::Function(_)
            | ast::Statement::Class(_)
            | ast::Statement::Enum(_)
            | ast::Statement::Namespace(_)
            | ast::Statement::Import(_)
            | ast::Statement::Export(_) => {
                self.diagnostics.error(
                    DiagnosticKind::Unsupported,
                    "declarations are not supported in statement position",
                );
                Ok(self.module.unreachable())
            }
        }
    }

    fn compile_break(&mut self) -> crate::Result<ExprId> {
        match self.current_fn()?.break_context() {
            Some(stem) => Ok(self.module.break_(&format!("break${stem}"), None)),
            None => {
                self.diagnostics.error(
                    DiagnosticKind::Structure,
                    "break outside of a loop or switch",
                );
                Ok(self.module.unreachable())
            }
        }
    }

    fn compile_continue(&mut self) -> crate::Result<ExprId> {
        match self.current_fn()?.break_context() {
            Some(stem) if !self.disallow_continue => {
                Ok(self.module.break_(&format!("continue${stem}"), None))
            }
            _ => {
                self.diagnostics
                    .error(DiagnosticKind::Structure, "continue outside of a loop");
                Ok(self.module.unreachable())
            }
        }
    }

    fn compile_while(
        &mut self,
        condition: &'src ast::Expression,
        statement: &'src ast::Statement,
    ) -> crate::Result<ExprId> {
        let stem = self.current_fn_mut()?.enter_break_context();
        let break_label = format!("break${stem}");
        let continue_label = format!("continue${stem}");

        let condition = self.compile_expression(condition, Type::I32, true)?;
        let body = self.compile_statement(statement)?;
        self.current_fn_mut()?.leave_break_context();

        let back_edge = self.module.break_(&continue_label, None);
        let taken = self.module.block(None, vec![body, back_edge], NativeType::None);
        let conditional = self.module.if_(condition, taken, None);
        let looped = self.module.loop_(&continue_label, conditional);
        Ok(self
            .module
            .block(Some(&break_label), vec![looped], NativeType::None))
    }

    fn compile_do(
        &mut self,
        statement: &'src ast::Statement,
        condition: &'src ast::Expression,
    ) -> crate::Result<ExprId> {
        let stem = self.current_fn_mut()?.enter_break_context();
        let break_label = format!("break${stem}");
        let continue_label = format!("continue${stem}");

        let body = self.compile_statement(statement)?;
        let condition = self.compile_expression(condition, Type::I32, true)?;
        self.current_fn_mut()?.leave_break_context();

        let back_edge = self.module.break_(&continue_label, Some(condition));
        let inner = self.module.block(None, vec![body, back_edge], NativeType::None);
        let looped = self.module.loop_(&continue_label, inner);
        Ok(self
            .module
            .block(Some(&break_label), vec![looped], NativeType::None))
    }

    fn compile_for(
        &mut self,
        initializer: Option<&'src ast::Statement>,
        condition: Option<&'src ast::Expression>,
        incrementor: Option<&'src ast::Expression>,
        statement: &'src ast::Statement,
    ) -> crate::Result<ExprId> {
        let stem = self.current_fn_mut()?.enter_break_context();
        let break_label = format!("break${stem}");
        let continue_label = format!("continue${stem}");

        let initializer = match initializer {
            Some(statement) => self.compile_statement(statement)?,
            None => self.module.nop(),
        };
        let condition = match condition {
            Some(expression) => self.compile_expression(expression, Type::I32, true)?,
            None => self.module.i32_const(1),
        };
        let incrementor = match incrementor {
            Some(expression) => self.compile_expression(expression, Type::Void, true)?,
            None => self.module.nop(),
        };
        let body = self.compile_statement(statement)?;
        self.current_fn_mut()?.leave_break_context();

        let back_edge = self.module.break_(&continue_label, None);
        let taken = self
            .module
            .block(None, vec![body, incrementor, back_edge], NativeType::None);
        let conditional = self.module.if_(condition, taken, None);
        let looped = self.module.loop_(&continue_label, conditional);
        Ok(self
            .module
            .block(Some(&break_label), vec![initializer, looped], NativeType::None))
    }

    /// Lowers a switch into a cascade of nested blocks: the innermost block
    /// holds the dispatch chain of `br_if`s, each enclosing block appends one
    /// case's statements, and falling off a block's end is fall-through.
    fn compile_switch(
        &mut self,
        condition: &'src ast::Expression,
        cases: &'src [ast::SwitchCase],
    ) -> crate::Result<ExprId> {
        let stem = self.current_fn_mut()?.enter_break_context();
        let break_label = format!("break${stem}");

        let condition = self.compile_expression(condition, Type::I32, true)?;
        let local = self.current_fn_mut()?.add_local(Type::I32, None);

        let mut labels = Vec::with_capacity(cases.len());
        let mut default_label = None;
        let mut labelled = 0u32;
        for case in cases {
            if case.label.is_some() {
                labels.push(format!("case{labelled}${stem}"));
                labelled += 1;
            } else {
                let label = format!("case_default${stem}");
                default_label = Some(label.clone());
                labels.push(label);
            }
        }

        let mut dispatch = vec![self.module.set_local(local, condition)];
        for (case, label) in cases.iter().zip(&labels) {
            if let Some(value) = &case.label {
                let operand = self.module.get_local(local, NativeType::I32);
                let value = self.compile_expression(value, Type::I32, true)?;
                let matches = self.module.binary(BinaryOp::I32Eq, operand, value);
                dispatch.push(self.module.break_(label, Some(matches)));
            }
        }
        let fallback = default_label.as_deref().unwrap_or(&break_label);
        dispatch.push(self.module.break_(fallback, None));

        if cases.is_empty() {
            self.current_fn_mut()?.leave_break_context();
            return Ok(self
                .module
                .block(Some(&break_label), dispatch, NativeType::None));
        }

        let mut current = self.module.block(Some(&labels[0]), dispatch, NativeType::None);
        let saved_disallow = std::mem::replace(&mut self.disallow_continue, true);
        for (index, case) in cases.iter().enumerate() {
            let mut children = vec![current];
            for statement in &case.statements {
                children.push(self.compile_statement(statement)?);
            }
            let label = match labels.get(index + 1) {
                Some(next) => next.as_str(),
                None => break_label.as_str(),
            };
            current = self.module.block(Some(label), children, NativeType::None);
        }
        self.disallow_continue = saved_disallow;
        self.current_fn_mut()?.leave_break_context();
        Ok(current)
    }

    fn compile_variable_statement(
        &mut self,
        variable: &'src ast::VariableStatement,
    ) -> crate::Result<ExprId> {
        // At the top level every declaration becomes a global.
        if self.current_function == self.start_function {
            for declaration in &variable.declarations {
                self.compile_global_declaration(declaration, !variable.is_const)?;
            }
            return Ok(self.module.nop());
        }

        let mut initializers = Vec::new();
        for declaration in &variable.declarations {
            let Some(type_node) = &declaration.type_node else {
                self.diagnostics.error(
                    DiagnosticKind::Types,
                    format!("type expected for `{}`", declaration.name),
                );
                continue;
            };
            let Some(ty) =
                self.elements
                    .resolve_type(type_node, None, true, &mut self.diagnostics)
            else {
                continue;
            };
            if !crate::ident::is_valid_identifier(&declaration.name) {
                self.diagnostics.error(
                    DiagnosticKind::Structure,
                    format!("invalid identifier `{}`", declaration.name),
                );
                continue;
            }
            if self.current_fn()?.lookup_local(&declaration.name).is_some() {
                self.diagnostics.error(
                    DiagnosticKind::Structure,
                    format!("duplicate local `{}`", declaration.name),
                );
                continue;
            }
            let index = self
                .current_fn_mut()?
                .add_local(ty.clone(), Some(declaration.name.as_str()));
            if let Some(initializer) = &declaration.initializer {
                let value = self.compile_expression(initializer, ty, true)?;
                initializers.push(self.module.set_local(index, value));
            }
        }

        Ok(match initializers.len() {
            0 => self.module.nop(),
            1 => initializers[0],
            _ => self.module.block(None, initializers, NativeType::None),
        })
    }
}
