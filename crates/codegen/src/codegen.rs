//! The declaration-driven compilation driver.
//!
//! [`Compile`] holds the options; [`Codegen`] walks the entry sources,
//! decides what to emit, instantiates generic prototypes, threads the start
//! function for top-level side effects, and finalizes linear memory.

mod builtins;
mod conversions;
mod expressions;
mod statements;

use std::collections::HashSet;

use crate::ast;
use crate::diag::{DiagnosticKind, Diagnostics};
use crate::module::{BinaryOp, ExprId, FunctionTypeId, MemorySegment, Module};
use crate::program::{Element, ElementId, Elements, Function, Global, Program, Source};
use crate::types::{NativeType, Target, Type};

/// Maximum linear memory size published to the backend, in 64 KiB pages.
pub const MAX_MEMORY_PAGES: u32 = 0xFFFF;

/// Options for compiling a [`Program`] into a WebAssembly [`Module`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Compile {
    target: Target,
    no_tree_shaking: bool,
    no_emit: bool,
}

/// The result of a compilation: the module plus everything the compiler had
/// to say about the input.
///
/// A compilation that reported errors still carries a module; failed nodes
/// are `unreachable` expressions. Check
/// [`diagnostics.has_errors()`](Diagnostics::has_errors) before using it.
#[derive(Debug)]
pub struct Compilation {
    /// The emitted module.
    pub module: Module,
    /// The diagnostics, in emission order.
    pub diagnostics: Diagnostics,
}

impl Compile {
    /// Gets the default options: WASM32, tree shaking enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compilation target. Defaults to [`Target::Wasm32`].
    pub fn target(&mut self, target: Target) -> &mut Self {
        self.target = target;
        self
    }

    /// Compiles every declaration regardless of export status.
    pub fn no_tree_shaking(&mut self, no_tree_shaking: bool) -> &mut Self {
        self.no_tree_shaking = no_tree_shaking;
        self
    }

    /// Makes every backend operation inert, for callers that only want the
    /// diagnostics.
    pub fn no_emit(&mut self, no_emit: bool) -> &mut Self {
        self.no_emit = no_emit;
        self
    }

    /// Compiles `program`, returning the module and diagnostics.
    ///
    /// # Errors
    ///
    /// Recoverable problems become diagnostics; an `Err` is returned only for
    /// internal invariant violations and for a heap start that does not fit
    /// the 32-bit target.
    pub fn compile(&self, program: &Program) -> crate::Result<Compilation> {
        let mut diagnostics = Diagnostics::default();
        let mut elements = Elements::build(program, self.target, &mut diagnostics);
        let start_function = elements.add(Element::Function(Function::new("start".to_owned())));

        let mut module = Module::new();
        module.set_no_emit(self.no_emit);

        let mut codegen = Codegen {
            program,
            options: *self,
            elements,
            diagnostics,
            module,
            files: HashSet::new(),
            start_function,
            current_function: start_function,
            current_source: "",
            current_type: Type::Void,
            disallow_continue: false,
            start_body: Vec::new(),
            memory: MemoryLayout::new(self.target),
        };
        codegen.compile()?;

        Ok(Compilation {
            module: codegen.module,
            diagnostics: codegen.diagnostics,
        })
    }
}

/// Linear memory bookkeeping: the next free byte and the segments allocated
/// so far.
#[derive(Debug)]
pub(crate) struct MemoryLayout {
    /// The next free byte. Starts past the null sentinel slot and the
    /// heap-start pointer slot, and never decreases.
    offset: u64,
    segments: Vec<MemorySegment>,
}

impl MemoryLayout {
    fn new(target: Target) -> Self {
        Self {
            offset: 2 * target.pointer_size(),
            segments: Vec::new(),
        }
    }

    /// Allocates a segment at the next 8-byte-aligned offset. Alignment is
    /// uniformly conservative; the layout does not know per-type alignment.
    // TODO: string literal lowering will be the first in-compiler caller.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn add_segment(&mut self, data: bytes::Bytes) -> &MemorySegment {
        self.offset = (self.offset + 7) & !7;
        let segment = MemorySegment {
            offset: self.offset,
            data,
        };
        self.offset += segment.data.len() as u64;
        self.segments.push(segment);
        self.segments.last().expect("segment was just pushed")
    }
}

/// Builds the heap-start pointer segment: the post-allocation offset as a
/// little-endian pointer-sized integer, stored at `sizeof(usize)`.
fn heap_segment(offset: u64, target: Target) -> crate::Result<MemorySegment> {
    let data = match target {
        Target::Wasm32 => {
            let offset = u32::try_from(offset).map_err(|_| {
                anyhow::anyhow!("heap start {offset:#x} does not fit the 32-bit target")
            })?;
            bytes::Bytes::copy_from_slice(&offset.to_le_bytes())
        }
        Target::Wasm64 => bytes::Bytes::copy_from_slice(&offset.to_le_bytes()),
    };
    Ok(MemorySegment {
        data,
        offset: target.pointer_size(),
    })
}

/// The compilation driver's mutable state.
#[derive(Debug)]
pub(crate) struct Codegen<'src> {
    program: &'src Program,
    options: Compile,
    elements: Elements<'src>,
    diagnostics: Diagnostics,
    module: Module,
    /// Already-compiled sources, by normalized path.
    files: HashSet<&'src str>,
    start_function: ElementId,
    current_function: ElementId,
    /// Normalized path scoping identifier resolution.
    current_source: &'src str,
    /// The type produced by the most recently lowered expression.
    current_type: Type,
    /// Set inside switch bodies, where `continue` must not target the switch.
    disallow_continue: bool,
    /// Top-level expressions and deferred initializers, in encounter order.
    start_body: Vec<ExprId>,
    memory: MemoryLayout,
}

impl<'src> Codegen<'src> {
    fn compile(&mut self) -> crate::Result<()> {
        let program = self.program;
        for source in &program.sources {
            if source.is_entry {
                self.compile_source(source)?;
            }
        }

        if !self.start_body.is_empty() {
            let ty = self.function_type_for(&[], NativeType::None);
            let locals = self.native_locals(self.start_function)?;
            let body = std::mem::take(&mut self.start_body);
            let body = self.module.block(None, body, NativeType::None);
            let start = self.module.add_function("start", ty, locals, body);
            self.module.set_start(start);
        }

        let heap = heap_segment(self.memory.offset, self.options.target)?;
        let mut segments = std::mem::take(&mut self.memory.segments);
        segments.insert(0, heap);

        let pages = u32::try_from(self.memory.offset.div_ceil(0x10000))
            .map_err(|_| anyhow::anyhow!("memory size exceeds the addressable page count"))?;
        self.module
            .set_memory(pages, MAX_MEMORY_PAGES, segments, Some("memory"));
        Ok(())
    }

    /// Compiles one source, once; further calls for the same normalized path
    /// are no-ops.
    fn compile_source(&mut self, source: &'src Source) -> crate::Result<()> {
        if !self.files.insert(&source.normalized_path) {
            return Ok(());
        }
        log::debug!("compiling source {}", source.normalized_path);

        let saved_source = std::mem::replace(&mut self.current_source, &source.normalized_path);
        for statement in &source.statements {
            self.compile_source_statement(source, statement)?;
        }
        self.current_source = saved_source;
        Ok(())
    }

    fn compile_source_statement(
        &mut self,
        source: &'src Source,
        statement: &'src ast::Statement,
    ) -> crate::Result<()> {
        let no_tree_shaking = self.options.no_tree_shaking;
        match statement {
            ast::Statement::Function(declaration) => {
                if declaration.type_parameters.is_empty()
                    && (no_tree_shaking || (source.is_entry && declaration.modifiers.export))
                {
                    let name = format!("{}/{}", source.normalized_path, declaration.name);
                    if let Some(prototype) = self.elements.lookup(&name) {
                        if let Some(instance) = self.elements.resolve_function(
                            prototype,
                            Vec::new(),
                            &mut self.diagnostics,
                        )? {
                            if source.is_entry && declaration.modifiers.export {
                                self.elements.function_mut(instance)?.global_export_name =
                                    Some(declaration.name.clone());
                            }
                            self.compile_function(instance)?;
                        }
                    }
                }
            }
            ast::Statement::Class(declaration) => {
                if declaration.type_parameters.is_empty()
                    && (no_tree_shaking || (source.is_entry && declaration.modifiers.export))
                {
                    let name = format!("{}/{}", source.normalized_path, declaration.name);
                    if let Some(prototype) = self.elements.lookup(&name) {
                        if let Some(instance) =
                            self.elements
                                .resolve_class(prototype, Vec::new(), &mut self.diagnostics)
                        {
                            self.compile_class(instance)?;
                        }
                    }
                }
            }
            ast::Statement::Enum(declaration) => {
                if no_tree_shaking || (source.is_entry && declaration.modifiers.export) {
                    let name = format!("{}/{}", source.normalized_path, declaration.name);
                    if let Some(id) = self.elements.lookup(&name) {
                        self.compile_enum(id)?;
                    }
                }
            }
            ast::Statement::Namespace(declaration) => {
                if no_tree_shaking || (source.is_entry && declaration.modifiers.export) {
                    let name = format!("{}/{}", source.normalized_path, declaration.name);
                    if let Some(id) = self.elements.lookup(&name) {
                        self.compile_namespace(id)?;
                    }
                }
            }
            ast::Statement::Variable(variable) => {
                if no_tree_shaking || (source.is_entry && variable.modifiers.export) {
                    for declaration in &variable.declarations {
                        let name = format!("{}/{}", source.normalized_path, declaration.name);
                        if let Some(id) = self.elements.lookup(&name) {
                            self.compile_global(id)?;
                        }
                    }
                }
            }
            ast::Statement::Import(import) => match self.program.find_source(&import.path) {
                Some(imported) => self.compile_source(imported)?,
                None => self.diagnostics.error(
                    DiagnosticKind::Lookup,
                    format!("file `{}` not found", import.path),
                ),
            },
            ast::Statement::Export(export) => {
                if let Some(path) = &export.path {
                    match self.program.find_source(path) {
                        Some(foreign) => self.compile_source(foreign)?,
                        None => self
                            .diagnostics
                            .error(DiagnosticKind::Lookup, format!("file `{path}` not found")),
                    }
                }
                if no_tree_shaking || source.is_entry {
                    self.compile_export(source, export)?;
                }
            }
            other => {
                // Top-level side effects land in the start function.
                let saved = std::mem::replace(&mut self.current_function, self.start_function);
                let expression = self.compile_statement(other)?;
                self.start_body.push(expression);
                self.current_function = saved;
            }
        }
        Ok(())
    }

    /// Materializes the elements an `export` statement names.
    fn compile_export(
        &mut self,
        source: &'src Source,
        statement: &'src ast::ExportStatement,
    ) -> crate::Result<()> {
        let base = statement
            .path
            .as_deref()
            .unwrap_or(&source.normalized_path);
        for (local_name, external_name) in &statement.members {
            // A foreign re-export refers to the other source's exported
            // names, a local export to this source's declarations.
            let id = if statement.path.is_some() {
                self.elements.export(base, local_name)
            } else {
                self.elements.lookup(&format!("{base}/{local_name}"))
            };
            let Some(id) = id else {
                self.diagnostics.error(
                    DiagnosticKind::Lookup,
                    format!("cannot export unknown element `{local_name}` from `{base}`"),
                );
                continue;
            };
            enum Exported {
                Function { generic: bool },
                Class { generic: bool },
                Global,
                Enum,
                Namespace,
                Other(&'static str),
            }
            let kind = match self.elements.get(id) {
                Element::FunctionPrototype(p) => Exported::Function {
                    generic: p.is_generic(),
                },
                Element::ClassPrototype(p) => Exported::Class {
                    generic: p.is_generic(),
                },
                Element::Global(_) => Exported::Global,
                Element::Enum(_) => Exported::Enum,
                Element::Namespace(_) => Exported::Namespace,
                other => Exported::Other(other.kind_name()),
            };
            match kind {
                Exported::Function { generic: true } | Exported::Class { generic: true } => (),
                Exported::Function { generic: false } => {
                    if let Some(instance) =
                        self.elements
                            .resolve_function(id, Vec::new(), &mut self.diagnostics)?
                    {
                        let function = self.elements.function_mut(instance)?;
                        function.global_export_name = Some(external_name.clone());
                        if function.is_compiled {
                            let internal_name = function.internal_name.clone();
                            self.module.add_export(external_name, &internal_name);
                        } else {
                            self.compile_function(instance)?;
                        }
                    }
                }
                Exported::Class { generic: false } => {
                    if let Some(instance) =
                        self.elements
                            .resolve_class(id, Vec::new(), &mut self.diagnostics)
                    {
                        self.compile_class(instance)?;
                    }
                }
                Exported::Global => self.compile_global(id)?,
                Exported::Enum => self.compile_enum(id)?,
                Exported::Namespace => self.compile_namespace(id)?,
                Exported::Other(kind_name) => self.diagnostics.error(
                    DiagnosticKind::Types,
                    format!("cannot export {kind_name} `{local_name}`"),
                ),
            }
        }
        Ok(())
    }

    /// Emits a global, choosing between a literal initializer, a deferred
    /// start-function initializer behind a `-1` placeholder, and a type zero.
    pub(crate) fn compile_global(&mut self, id: ElementId) -> crate::Result<()> {
        if self.elements.global(id)?.is_compiled {
            return Ok(());
        }
        self.elements.global_mut(id)?.is_compiled = true;

        let (internal_name, source_path, declaration, mutable, constant_value) = {
            let global = self.elements.global(id)?;
            (
                global.internal_name.clone(),
                global.source_path,
                global.declaration,
                global.mutable,
                global.constant_value,
            )
        };
        log::trace!("compiling global {internal_name}");
        let saved_source = std::mem::replace(&mut self.current_source, source_path);

        let ty = match declaration.and_then(|d| d.type_node.as_ref()) {
            Some(node) => {
                match self
                    .elements
                    .resolve_type(node, None, true, &mut self.diagnostics)
                {
                    Some(ty) => ty,
                    None => {
                        self.current_source = saved_source;
                        return Ok(());
                    }
                }
            }
            None if constant_value.is_some() => Type::I32,
            None => {
                self.diagnostics.error(
                    DiagnosticKind::Types,
                    format!("type expected for `{internal_name}`"),
                );
                self.current_source = saved_source;
                return Ok(());
            }
        };
        self.elements.global_mut(id)?.resolved_type = Some(ty.clone());
        let native = ty.native_type();

        if let Some(value) = constant_value {
            // Small integers are sign-extended or mask-zero-extended to i32
            // at emit time.
            let value = if ty.is_small_integer() {
                if ty.is_signed_integer() {
                    let shift = ty.small_integer_shift();
                    (((value as i32) << shift) >> shift) as i64
                } else {
                    ((value as i32) as u32 & ty.small_integer_mask()) as i64
                }
            } else {
                value
            };
            let init = self.native_const(native, value);
            self.module.add_global(&internal_name, native, false, init);
        } else if let Some(initializer) = declaration.and_then(|d| d.initializer.as_ref()) {
            let value = self.compile_expression(initializer, ty.clone(), true)?;
            if self.is_literal(value) {
                self.module.add_global(&internal_name, native, mutable, value);
            } else {
                let placeholder = self.native_const(native, -1);
                self.module
                    .add_global(&internal_name, native, true, placeholder);
                let set = self.module.set_global(&internal_name, value);
                self.start_body.push(set);
            }
        } else {
            let zero = self.native_const(native, 0);
            self.module.add_global(&internal_name, native, mutable, zero);
        }
        self.current_source = saved_source;
        Ok(())
    }

    /// Registers and emits a global for a declaration first seen at the top
    /// level of statement lowering.
    pub(crate) fn compile_global_declaration(
        &mut self,
        declaration: &'src ast::VariableDeclaration,
        mutable: bool,
    ) -> crate::Result<()> {
        let internal_name = format!("{}/{}", self.current_source, declaration.name);
        let id = match self.elements.lookup(&internal_name) {
            Some(id) => id,
            None => self.elements.add(Element::Global(Global {
                internal_name,
                source_path: self.current_source,
                declaration: Some(declaration),
                mutable,
                resolved_type: None,
                constant_value: crate::program::literal_constant(declaration, !mutable),
                is_compiled: false,
            })),
        };
        self.compile_global(id)
    }

    /// Emits an enum's members as `i32` globals in declaration order.
    pub(crate) fn compile_enum(&mut self, id: ElementId) -> crate::Result<()> {
        if self.elements.enum_(id)?.is_compiled {
            return Ok(());
        }
        self.elements.enum_mut(id)?.is_compiled = true;

        let saved_source =
            std::mem::replace(&mut self.current_source, self.elements.enum_(id)?.source_path);
        let members = self.elements.enum_(id)?.members.clone();
        debug_assert!(members.len() <= self.elements.enum_(id)?.declaration.members.len());
        let mut previous: Option<ElementId> = None;

        for member_id in members {
            let (internal_name, declaration) = {
                let member = self.elements.enum_member(member_id)?;
                (member.internal_name.clone(), member.declaration)
            };

            let mut constant: Option<i64> = None;
            let mut deferred: Option<ExprId> = None;
            if let Some(initializer) = &declaration.initializer {
                if let ast::Expression::IntegerLiteral(value) = initializer {
                    constant = Some(*value);
                } else {
                    deferred = Some(self.compile_expression(initializer, Type::I32, true)?);
                }
            } else if let Some(previous) = previous {
                match self.elements.enum_member(previous)?.constant_value {
                    Some(value) => constant = Some(value + 1),
                    None => {
                        // previous + 1, readable only after the start function
                        // has initialized the previous member.
                        let previous_name = self.elements.enum_member(previous)?.internal_name.clone();
                        let get = self.module.get_global(&previous_name, NativeType::I32);
                        let one = self.module.i32_const(1);
                        deferred = Some(self.module.binary(BinaryOp::I32Add, get, one));
                    }
                }
            } else {
                constant = Some(0);
            }

            if let Some(value) = constant {
                let init = self.module.i32_const(value as i32);
                self.module
                    .add_global(&internal_name, NativeType::I32, false, init);
                self.elements.enum_member_mut(member_id)?.constant_value = Some(value);
            } else if let Some(value) = deferred {
                let placeholder = self.module.i32_const(-1);
                self.module
                    .add_global(&internal_name, NativeType::I32, true, placeholder);
                let set = self.module.set_global(&internal_name, value);
                self.start_body.push(set);
            }
            self.elements.enum_member_mut(member_id)?.is_compiled = true;
            previous = Some(member_id);
        }

        self.current_source = saved_source;
        Ok(())
    }

    /// Compiles a function instance: lowers its body, registers its
    /// signature (reusing the type table) and its export name, if any.
    pub(crate) fn compile_function(&mut self, id: ElementId) -> crate::Result<()> {
        if self.elements.function(id)?.is_compiled {
            return Ok(());
        }
        self.elements.function_mut(id)?.is_compiled = true;

        let (internal_name, source_path, declaration, is_import) = {
            let function = self.elements.function(id)?;
            debug_assert!(!function.is_builtin, "builtins have no function body");
            (
                function.internal_name.clone(),
                function.source_path,
                function.declaration,
                function.is_import,
            )
        };
        log::trace!("compiling function {internal_name}");

        let (params, result) = self.native_signature(id)?;
        let ty = self.function_type_for(&params, result);

        if is_import {
            let base = declaration.map(|d| d.name.as_str()).unwrap_or(&internal_name);
            self.module
                .add_function_import(&internal_name, "env", base, ty);
            return Ok(());
        }

        let Some(statements) = declaration.and_then(|d| d.statements.as_deref()) else {
            self.diagnostics.error(
                DiagnosticKind::Structure,
                format!("function `{internal_name}` has no body"),
            );
            return Ok(());
        };

        let saved_function = std::mem::replace(&mut self.current_function, id);
        let saved_source = std::mem::replace(&mut self.current_source, source_path);
        let mut body = Vec::with_capacity(statements.len());
        for statement in statements {
            body.push(self.compile_statement(statement)?);
        }
        self.current_function = saved_function;
        self.current_source = saved_source;

        let locals = self.native_locals(id)?;
        let body = self.module.block(None, body, NativeType::None);
        self.module.add_function(&internal_name, ty, locals, body);

        if let Some(export_name) = self.elements.function(id)?.global_export_name.clone() {
            self.module.add_export(&export_name, &internal_name);
        }
        Ok(())
    }

    /// Compiles a namespace's members.
    pub(crate) fn compile_namespace(&mut self, id: ElementId) -> crate::Result<()> {
        if self.elements.namespace(id)?.is_compiled {
            return Ok(());
        }
        self.elements.namespace_mut(id)?.is_compiled = true;

        let (internal_name, declaration) = {
            let namespace = self.elements.namespace(id)?;
            (namespace.internal_name.clone(), namespace.declaration)
        };
        let no_tree_shaking = self.options.no_tree_shaking;

        for member in &declaration.members {
            match member {
                ast::Statement::Function(d) => {
                    if d.type_parameters.is_empty()
                        && (no_tree_shaking || d.modifiers.export)
                    {
                        if let Some(prototype) =
                            self.elements.lookup(&format!("{internal_name}.{}", d.name))
                        {
                            if let Some(instance) = self.elements.resolve_function(
                                prototype,
                                Vec::new(),
                                &mut self.diagnostics,
                            )? {
                                self.compile_function(instance)?;
                            }
                        }
                    }
                }
                ast::Statement::Enum(d) => {
                    if no_tree_shaking || d.modifiers.export {
                        if let Some(member_id) =
                            self.elements.lookup(&format!("{internal_name}.{}", d.name))
                        {
                            self.compile_enum(member_id)?;
                        }
                    }
                }
                ast::Statement::Namespace(d) => {
                    if no_tree_shaking || d.modifiers.export {
                        if let Some(member_id) =
                            self.elements.lookup(&format!("{internal_name}.{}", d.name))
                        {
                            self.compile_namespace(member_id)?;
                        }
                    }
                }
                ast::Statement::Variable(v) => {
                    if no_tree_shaking || v.modifiers.export {
                        for declaration in &v.declarations {
                            if let Some(member_id) = self
                                .elements
                                .lookup(&format!("{internal_name}.{}", declaration.name))
                            {
                                self.compile_global(member_id)?;
                            }
                        }
                    }
                }
                ast::Statement::Class(d) => {
                    if d.type_parameters.is_empty() && (no_tree_shaking || d.modifiers.export) {
                        if let Some(prototype) =
                            self.elements.lookup(&format!("{internal_name}.{}", d.name))
                        {
                            if let Some(instance) = self.elements.resolve_class(
                                prototype,
                                Vec::new(),
                                &mut self.diagnostics,
                            ) {
                                self.compile_class(instance)?;
                            }
                        }
                    }
                }
                _ => (),
            }
        }

        // TODO: stop reporting once namespace member exports surface on the
        // module; the members above do compile.
        self.diagnostics.error(
            DiagnosticKind::Unsupported,
            format!("namespace `{internal_name}` is not implemented"),
        );
        Ok(())
    }

    /// Class layout, field offsets and method dispatch are reserved seams.
    pub(crate) fn compile_class(&mut self, id: ElementId) -> crate::Result<()> {
        if self.elements.class(id)?.is_compiled {
            return Ok(());
        }
        self.elements.class_mut(id)?.is_compiled = true;
        let internal_name = self.elements.class(id)?.internal_name.clone();
        self.diagnostics.error(
            DiagnosticKind::Unsupported,
            format!("class `{internal_name}` is not implemented"),
        );
        Ok(())
    }

    pub(crate) fn current_fn(&self) -> crate::Result<&Function<'src>> {
        self.elements.function(self.current_function)
    }

    pub(crate) fn current_fn_mut(&mut self) -> crate::Result<&mut Function<'src>> {
        self.elements.function_mut(self.current_function)
    }

    /// Looks up or registers the backend signature for `params -> result`.
    pub(crate) fn function_type_for(
        &mut self,
        params: &[NativeType],
        result: NativeType,
    ) -> FunctionTypeId {
        match self.module.function_type_by_signature(params, result) {
            Some(ty) => ty,
            None => self.module.add_function_type(params, result),
        }
    }

    fn native_signature(&self, id: ElementId) -> crate::Result<(Vec<NativeType>, NativeType)> {
        let function = self.elements.function(id)?;
        let params = function
            .parameters
            .iter()
            .map(|p| p.ty.native_type())
            .collect();
        Ok((params, function.return_type.native_type()))
    }

    fn native_locals(&self, id: ElementId) -> crate::Result<Vec<NativeType>> {
        Ok(self
            .elements
            .function(id)?
            .locals
            .iter()
            .map(|l| l.ty.native_type())
            .collect())
    }

    /// A constant of the given native type, numerically cast from `value`.
    pub(crate) fn native_const(&mut self, native: NativeType, value: i64) -> ExprId {
        match native {
            NativeType::I32 => self.module.i32_const(value as i32),
            NativeType::I64 => self.module.i64_const(value),
            NativeType::F32 => self.module.f32_const(value as f32),
            NativeType::F64 => self.module.f64_const(value as f64),
            NativeType::None => self.module.nop(),
        }
    }

    fn is_literal(&self, expression: ExprId) -> bool {
        matches!(
            self.module.expr(expression),
            crate::module::Expr::I32(_)
                | crate::module::Expr::I64(_)
                | crate::module::Expr::F32(_)
                | crate::module::Expr::F64(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_eight_byte_aligned() {
        let mut layout = MemoryLayout::new(Target::Wasm32);
        assert_eq!(layout.offset, 8);

        let first = layout.add_segment(bytes::Bytes::from_static(b"abc")).offset;
        let second = layout.add_segment(bytes::Bytes::from_static(b"defgh")).offset;
        let third = layout.add_segment(bytes::Bytes::from_static(b"i")).offset;
        assert_eq!(first, 8);
        assert_eq!(second, 16);
        assert_eq!(third, 24);
        assert_eq!(layout.offset, 25);
        assert!(layout.segments.iter().all(|s| s.offset % 8 == 0));
    }

    #[test]
    fn heap_segment_value_counts_segments_and_padding() {
        let mut layout = MemoryLayout::new(Target::Wasm32);
        layout.add_segment(bytes::Bytes::from_static(b"abc"));
        layout.add_segment(bytes::Bytes::from_static(b"d"));
        // 8 + 3 -> padded to 16, + 1 = 17
        let heap = heap_segment(layout.offset, Target::Wasm32).unwrap();
        assert_eq!(heap.offset, 4);
        assert_eq!(heap.data.as_ref(), &17u32.to_le_bytes());
    }

    #[test]
    fn heap_segment_is_pointer_sized() {
        let heap = heap_segment(16, Target::Wasm64).unwrap();
        assert_eq!(heap.offset, 8);
        assert_eq!(heap.data.as_ref(), &16u64.to_le_bytes());
    }

    #[test]
    fn heap_start_must_fit_the_32_bit_target() {
        assert!(heap_segment(u64::from(u32::MAX) + 1, Target::Wasm32).is_err());
        assert!(heap_segment(u64::from(u32::MAX) + 1, Target::Wasm64).is_ok());
    }
}
