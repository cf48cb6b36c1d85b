//! The program being compiled: sources, the element table, and resolution.
//!
//! A [`Program`] is the parser's output. Before code generation the element
//! table is built from it: every declaration becomes an [`Element`] addressed
//! by a fully-qualified internal name (`<path>/<name>`, namespace members as
//! `<path>/<namespace>.<member>`), and builtin prototypes are registered for
//! the selected target.

use std::collections::HashMap;

use crate::ast;
use crate::diag::{DiagnosticKind, Diagnostics};
use crate::types::{Target, Type};

/// A single source file, already parsed.
#[derive(Clone, Debug)]
pub struct Source {
    /// The source's path, normalized and without extension.
    pub normalized_path: String,
    /// Whether compilation starts from this source.
    pub is_entry: bool,
    /// The top-level statements in declaration order.
    pub statements: Vec<ast::Statement>,
}

/// An ordered collection of parsed sources.
#[derive(Clone, Debug, Default)]
pub struct Program {
    /// The sources, entry files first by convention.
    pub sources: Vec<Source>,
}

impl Program {
    /// Finds a source by normalized path.
    pub fn find_source(&self, normalized_path: &str) -> Option<&Source> {
        self.sources
            .iter()
            .find(|s| s.normalized_path == normalized_path)
    }
}

/// Identifies an element within the element table.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(transparent)]
pub struct ElementId(u32);

impl ElementId {
    /// The element's position in the table.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A builtin function, assigned to its prototype at initialization so call
/// sites dispatch on a closed enumeration instead of re-parsing names.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Builtin {
    Clz,
    Ctz,
    Popcnt,
    Rotl,
    Rotr,
    Abs,
    Ceil,
    Floor,
    Nearest,
    Sqrt,
    Trunc,
    CopySign,
    Min,
    Max,
    CurrentMemory,
    GrowMemory,
    Unreachable,
    SizeOf,
    IsNaN,
    IsFinite,
}

const BUILTINS: &[(&str, Builtin)] = &[
    ("clz", Builtin::Clz),
    ("ctz", Builtin::Ctz),
    ("popcnt", Builtin::Popcnt),
    ("rotl", Builtin::Rotl),
    ("rotr", Builtin::Rotr),
    ("abs", Builtin::Abs),
    ("ceil", Builtin::Ceil),
    ("floor", Builtin::Floor),
    ("nearest", Builtin::Nearest),
    ("sqrt", Builtin::Sqrt),
    ("trunc", Builtin::Trunc),
    ("copysign", Builtin::CopySign),
    ("min", Builtin::Min),
    ("max", Builtin::Max),
    ("current_memory", Builtin::CurrentMemory),
    ("grow_memory", Builtin::GrowMemory),
    ("unreachable", Builtin::Unreachable),
    ("sizeof", Builtin::SizeOf),
    ("isNaN", Builtin::IsNaN),
    ("isFinite", Builtin::IsFinite),
];

/// A local variable or parameter within a function. Parameters occupy the
/// leading indices.
#[derive(Clone, Debug)]
pub(crate) struct Local<'src> {
    pub(crate) index: u32,
    pub(crate) ty: Type,
    pub(crate) name: Option<&'src str>,
}

/// A resolved function parameter.
#[derive(Clone, Debug)]
pub(crate) struct Parameter<'src> {
    pub(crate) name: &'src str,
    pub(crate) ty: Type,
    pub(crate) initializer: Option<&'src ast::Expression>,
}

/// A function prototype, possibly generic, possibly builtin.
#[derive(Debug)]
pub(crate) struct FunctionPrototype<'src> {
    pub(crate) internal_name: String,
    /// Normalized path of the defining source; empty for builtins.
    pub(crate) source_path: &'src str,
    pub(crate) declaration: Option<&'src ast::FunctionDeclaration>,
    pub(crate) builtin: Option<Builtin>,
    pub(crate) is_import: bool,
    pub(crate) instances: HashMap<String, ElementId>,
}

impl FunctionPrototype<'_> {
    pub(crate) fn is_generic(&self) -> bool {
        self.declaration
            .is_some_and(|d| !d.type_parameters.is_empty())
    }
}

/// A concrete function instance: a prototype plus type arguments.
#[derive(Debug)]
pub(crate) struct Function<'src> {
    pub(crate) internal_name: String,
    /// Normalized path of the defining source; empty for synthetic functions.
    pub(crate) source_path: &'src str,
    pub(crate) declaration: Option<&'src ast::FunctionDeclaration>,
    pub(crate) type_arguments: Vec<Type>,
    pub(crate) parameters: Vec<Parameter<'src>>,
    pub(crate) return_type: Type,
    pub(crate) locals: Vec<Local<'src>>,
    pub(crate) is_instance: bool,
    pub(crate) instance_method_of: Option<ElementId>,
    pub(crate) global_export_name: Option<String>,
    pub(crate) is_compiled: bool,
    pub(crate) is_import: bool,
    pub(crate) is_builtin: bool,
    break_stack: Vec<u32>,
    next_break_id: u32,
}

impl<'src> Function<'src> {
    pub(crate) fn new(internal_name: String) -> Self {
        Self {
            internal_name,
            source_path: "",
            declaration: None,
            type_arguments: Vec::new(),
            parameters: Vec::new(),
            return_type: Type::Void,
            locals: Vec::new(),
            is_instance: false,
            instance_method_of: None,
            global_export_name: None,
            is_compiled: false,
            is_import: false,
            is_builtin: false,
            break_stack: Vec::new(),
            next_break_id: 0,
        }
    }

    /// Registers an additional local, returning its index. Parameters occupy
    /// indices `0..parameters.len()`.
    pub(crate) fn add_local(&mut self, ty: Type, name: Option<&'src str>) -> u32 {
        let index = (self.parameters.len() + self.locals.len()) as u32;
        self.locals.push(Local { index, ty, name });
        index
    }

    /// Looks up a parameter or named local.
    pub(crate) fn lookup_local(&self, name: &str) -> Option<(u32, Type)> {
        if let Some(position) = self.parameters.iter().position(|p| p.name == name) {
            return Some((position as u32, self.parameters[position].ty.clone()));
        }
        self.locals
            .iter()
            .find(|l| l.name == Some(name))
            .map(|l| (l.index, l.ty.clone()))
    }

    /// Opens a new break context, returning its fresh label stem.
    pub(crate) fn enter_break_context(&mut self) -> u32 {
        let id = self.next_break_id;
        self.next_break_id += 1;
        self.break_stack.push(id);
        id
    }

    /// Closes the innermost break context.
    pub(crate) fn leave_break_context(&mut self) {
        self.break_stack.pop();
    }

    /// The innermost break context's label stem, if any.
    pub(crate) fn break_context(&self) -> Option<u32> {
        self.break_stack.last().copied()
    }
}

/// A `const` declaration initialized with an integer literal carries its
/// value as a compile-time constant, like an enum member does.
pub(crate) fn literal_constant(
    declaration: &ast::VariableDeclaration,
    is_const: bool,
) -> Option<i64> {
    match &declaration.initializer {
        Some(ast::Expression::IntegerLiteral(value)) if is_const => Some(*value),
        _ => None,
    }
}

/// A global variable.
#[derive(Debug)]
pub(crate) struct Global<'src> {
    pub(crate) internal_name: String,
    pub(crate) source_path: &'src str,
    pub(crate) declaration: Option<&'src ast::VariableDeclaration>,
    pub(crate) mutable: bool,
    /// The resolved type, recorded when the global is compiled.
    pub(crate) resolved_type: Option<Type>,
    pub(crate) constant_value: Option<i64>,
    pub(crate) is_compiled: bool,
}

/// An enum declaration.
#[derive(Debug)]
pub(crate) struct Enum<'src> {
    pub(crate) internal_name: String,
    pub(crate) source_path: &'src str,
    pub(crate) declaration: &'src ast::EnumDeclaration,
    pub(crate) members: Vec<ElementId>,
    pub(crate) is_compiled: bool,
}

/// A single enum member, emitted as an `i32` global.
#[derive(Debug)]
pub(crate) struct EnumMember<'src> {
    pub(crate) internal_name: String,
    pub(crate) declaration: &'src ast::EnumValueDeclaration,
    pub(crate) constant_value: Option<i64>,
    pub(crate) is_compiled: bool,
}

/// A class prototype. Instantiation only resolves type arguments; layout and
/// member compilation are not implemented.
#[derive(Debug)]
pub(crate) struct ClassPrototype<'src> {
    pub(crate) internal_name: String,
    pub(crate) declaration: &'src ast::ClassDeclaration,
    pub(crate) instances: HashMap<String, ElementId>,
}

impl ClassPrototype<'_> {
    pub(crate) fn is_generic(&self) -> bool {
        !self.declaration.type_parameters.is_empty()
    }
}

/// A concrete class instance.
#[derive(Debug)]
pub(crate) struct Class {
    pub(crate) internal_name: String,
    pub(crate) type_arguments: Vec<Type>,
    pub(crate) is_compiled: bool,
}

/// A namespace declaration.
#[derive(Debug)]
pub(crate) struct Namespace<'src> {
    pub(crate) internal_name: String,
    pub(crate) source_path: &'src str,
    pub(crate) declaration: &'src ast::NamespaceDeclaration,
    pub(crate) is_compiled: bool,
}

/// Everything an internal name can refer to.
#[derive(Debug)]
pub(crate) enum Element<'src> {
    Global(Global<'src>),
    Enum(Enum<'src>),
    EnumMember(EnumMember<'src>),
    FunctionPrototype(FunctionPrototype<'src>),
    Function(Function<'src>),
    ClassPrototype(ClassPrototype<'src>),
    Class(Class),
    Namespace(Namespace<'src>),
}

impl Element<'_> {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Global(_) => "global",
            Self::Enum(_) => "enum",
            Self::EnumMember(_) => "enum member",
            Self::FunctionPrototype(_) => "function prototype",
            Self::Function(_) => "function",
            Self::ClassPrototype(_) => "class prototype",
            Self::Class(_) => "class",
            Self::Namespace(_) => "namespace",
        }
    }

    pub(crate) fn internal_name(&self) -> &str {
        match self {
            Self::Global(e) => &e.internal_name,
            Self::Enum(e) => &e.internal_name,
            Self::EnumMember(e) => &e.internal_name,
            Self::FunctionPrototype(e) => &e.internal_name,
            Self::Function(e) => &e.internal_name,
            Self::ClassPrototype(e) => &e.internal_name,
            Self::Class(e) => &e.internal_name,
            Self::Namespace(e) => &e.internal_name,
        }
    }
}

/// What an identifier resolved to.
#[derive(Clone, Debug)]
pub(crate) enum ResolvedElement {
    /// A parameter or local of the current function.
    Local { index: u32, ty: Type },
    /// An element of the table.
    Element(ElementId),
}

macro_rules! narrowing_accessors {
    ($($get:ident, $get_mut:ident -> $variant:ident ( $payload:ty );)*) => {$(
        pub(crate) fn $get(&self, id: ElementId) -> crate::Result<&$payload> {
            match &self.items[id.0 as usize] {
                Element::$variant(element) => Ok(element),
                other => anyhow::bail!(
                    "internal: expected {} element, found {} `{}`",
                    stringify!($variant),
                    other.kind_name(),
                    other.internal_name(),
                ),
            }
        }

        pub(crate) fn $get_mut(&mut self, id: ElementId) -> crate::Result<&mut $payload> {
            match &mut self.items[id.0 as usize] {
                Element::$variant(element) => Ok(element),
                other => anyhow::bail!(
                    "internal: expected {} element, found {} `{}`",
                    stringify!($variant),
                    other.kind_name(),
                    other.internal_name(),
                ),
            }
        }
    )*};
}

/// The element table: every named entity of the program plus the builtins,
/// addressed by fully-qualified internal name.
#[derive(Debug)]
pub(crate) struct Elements<'src> {
    target: Target,
    items: Vec<Element<'src>>,
    map: HashMap<String, ElementId>,
    /// Named exports: `<path>/<external name>` to element.
    exports: HashMap<String, ElementId>,
    /// Class prototypes by simple name, for type resolution.
    class_names: HashMap<&'src str, ElementId>,
}

impl<'src> Elements<'src> {
    /// Builds the element table: builtins for the selected target, then the
    /// declarations of every source, then export and import aliases.
    pub(crate) fn build(
        program: &'src Program,
        target: Target,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut elements = Self {
            target,
            items: Vec::new(),
            map: HashMap::new(),
            exports: HashMap::new(),
            class_names: HashMap::new(),
        };

        for (name, builtin) in BUILTINS {
            elements.add(Element::FunctionPrototype(FunctionPrototype {
                internal_name: (*name).to_owned(),
                source_path: "",
                declaration: None,
                builtin: Some(*builtin),
                is_import: false,
                instances: HashMap::new(),
            }));
        }

        for source in &program.sources {
            for statement in &source.statements {
                elements.register_statement(&source.normalized_path, "", statement, diagnostics);
            }
        }

        // Exports and import aliases can only be wired once every declaration
        // of every source is registered.
        for source in &program.sources {
            for statement in &source.statements {
                elements.register_export(&source.normalized_path, statement);
            }
        }
        for source in &program.sources {
            for statement in &source.statements {
                if let ast::Statement::Import(import) = statement {
                    for (external_name, local_name) in &import.members {
                        let key = format!("{}/{external_name}", import.path);
                        if let Some(id) = elements.exports.get(&key).copied() {
                            elements
                                .map
                                .insert(format!("{}/{local_name}", source.normalized_path), id);
                        }
                    }
                }
            }
        }

        elements
    }

    pub(crate) fn add(&mut self, element: Element<'src>) -> ElementId {
        let id = ElementId(self.items.len() as u32);
        self.map.insert(element.internal_name().to_owned(), id);
        self.items.push(element);
        id
    }

    pub(crate) fn lookup(&self, internal_name: &str) -> Option<ElementId> {
        self.map.get(internal_name).copied()
    }

    pub(crate) fn get(&self, id: ElementId) -> &Element<'src> {
        &self.items[id.0 as usize]
    }

    pub(crate) fn export(&self, path: &str, external_name: &str) -> Option<ElementId> {
        self.exports.get(&format!("{path}/{external_name}")).copied()
    }

    narrowing_accessors! {
        function, function_mut -> Function(Function<'src>);
        global, global_mut -> Global(Global<'src>);
        enum_, enum_mut -> Enum(Enum<'src>);
        enum_member, enum_member_mut -> EnumMember(EnumMember<'src>);
        prototype, prototype_mut -> FunctionPrototype(FunctionPrototype<'src>);
        class_prototype, class_prototype_mut -> ClassPrototype(ClassPrototype<'src>);
        class, class_mut -> Class(Class);
        namespace, namespace_mut -> Namespace(Namespace<'src>);
    }

    fn check_identifier(&self, name: &str, diagnostics: &mut Diagnostics) -> bool {
        if crate::ident::is_valid_identifier(name) {
            true
        } else {
            diagnostics.error(
                DiagnosticKind::Structure,
                format!("invalid identifier `{name}`"),
            );
            false
        }
    }

    fn register_named(
        &mut self,
        path: &str,
        prefix: &str,
        name: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        if !self.check_identifier(name, diagnostics) {
            return None;
        }
        let internal_name = format!("{path}/{prefix}{name}");
        if self.map.contains_key(&internal_name) {
            diagnostics.error(
                DiagnosticKind::Structure,
                format!("duplicate identifier `{name}` in `{path}`"),
            );
            return None;
        }
        Some(internal_name)
    }

    /// Registers the elements a top-level or namespace-member statement
    /// declares. `prefix` is the dotted namespace chain, empty at the top
    /// level.
    fn register_statement(
        &mut self,
        path: &'src str,
        prefix: &str,
        statement: &'src ast::Statement,
        diagnostics: &mut Diagnostics,
    ) {
        match statement {
            ast::Statement::Function(declaration) => {
                let Some(internal_name) =
                    self.register_named(path, prefix, &declaration.name, diagnostics)
                else {
                    return;
                };
                self.add(Element::FunctionPrototype(FunctionPrototype {
                    internal_name,
                    source_path: path,
                    declaration: Some(declaration),
                    builtin: None,
                    is_import: declaration.modifiers.declare,
                    instances: HashMap::new(),
                }));
            }
            ast::Statement::Class(declaration) => {
                let Some(internal_name) =
                    self.register_named(path, prefix, &declaration.name, diagnostics)
                else {
                    return;
                };
                let id = self.add(Element::ClassPrototype(ClassPrototype {
                    internal_name,
                    declaration,
                    instances: HashMap::new(),
                }));
                self.class_names
                    .entry(declaration.name.as_str())
                    .or_insert(id);
            }
            ast::Statement::Enum(declaration) => {
                let Some(internal_name) =
                    self.register_named(path, prefix, &declaration.name, diagnostics)
                else {
                    return;
                };
                let mut members = Vec::with_capacity(declaration.members.len());
                for member in &declaration.members {
                    if !self.check_identifier(&member.name, diagnostics) {
                        continue;
                    }
                    members.push(self.add(Element::EnumMember(EnumMember {
                        internal_name: format!("{internal_name}.{}", member.name),
                        declaration: member,
                        constant_value: None,
                        is_compiled: false,
                    })));
                }
                self.add(Element::Enum(Enum {
                    internal_name,
                    source_path: path,
                    declaration,
                    members,
                    is_compiled: false,
                }));
            }
            ast::Statement::Namespace(declaration) => {
                let Some(internal_name) =
                    self.register_named(path, prefix, &declaration.name, diagnostics)
                else {
                    return;
                };
                self.add(Element::Namespace(Namespace {
                    internal_name,
                    source_path: path,
                    declaration,
                    is_compiled: false,
                }));
                let nested = format!("{prefix}{}.", declaration.name);
                for member in &declaration.members {
                    self.register_statement(path, &nested, member, diagnostics);
                }
            }
            ast::Statement::Variable(variable) => {
                for declaration in &variable.declarations {
                    let Some(internal_name) =
                        self.register_named(path, prefix, &declaration.name, diagnostics)
                    else {
                        continue;
                    };
                    self.add(Element::Global(Global {
                        internal_name,
                        source_path: path,
                        declaration: Some(declaration),
                        mutable: !variable.is_const,
                        resolved_type: None,
                        constant_value: literal_constant(declaration, variable.is_const),
                        is_compiled: false,
                    }));
                }
            }
            _ => (),
        }
    }

    /// Records the named exports a statement contributes.
    fn register_export(&mut self, path: &str, statement: &'src ast::Statement) {
        match statement {
            ast::Statement::Function(d) if d.modifiers.export => {
                self.record_export(path, &d.name, &d.name);
            }
            ast::Statement::Class(d) if d.modifiers.export => {
                self.record_export(path, &d.name, &d.name);
            }
            ast::Statement::Enum(d) if d.modifiers.export => {
                self.record_export(path, &d.name, &d.name);
            }
            ast::Statement::Namespace(d) if d.modifiers.export => {
                self.record_export(path, &d.name, &d.name);
            }
            ast::Statement::Variable(s) if s.modifiers.export => {
                for declaration in &s.declarations {
                    self.record_export(path, &declaration.name, &declaration.name);
                }
            }
            ast::Statement::Export(statement) => {
                let base = statement.path.as_deref().unwrap_or(path);
                for (local_name, external_name) in &statement.members {
                    if let Some(id) = self.lookup(&format!("{base}/{local_name}")) {
                        self.exports.insert(format!("{path}/{external_name}"), id);
                    }
                }
            }
            _ => (),
        }
    }

    fn record_export(&mut self, path: &str, local_name: &str, external_name: &str) {
        if let Some(id) = self.lookup(&format!("{path}/{local_name}")) {
            self.exports.insert(format!("{path}/{external_name}"), id);
        }
    }

    /// Resolves a type reference, substituting contextual type arguments.
    /// Reports a diagnostic and returns `None` on failure when `report_errors`
    /// is set.
    pub(crate) fn resolve_type(
        &mut self,
        node: &ast::TypeNode,
        contextual_args: Option<&HashMap<&'src str, Type>>,
        report_errors: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<Type> {
        if let Some(args) = contextual_args {
            if let Some(ty) = args.get(node.name.as_str()) {
                return Some(ty.clone());
            }
        }
        let ty = match node.name.as_str() {
            "void" => Some(Type::Void),
            "bool" => Some(Type::Bool),
            "i8" => Some(Type::I8),
            "i16" => Some(Type::I16),
            "i32" => Some(Type::I32),
            "i64" => Some(Type::I64),
            "u8" => Some(Type::U8),
            "u16" => Some(Type::U16),
            "u32" => Some(Type::U32),
            "u64" => Some(Type::U64),
            "usize" => Some(self.target.usize_type()),
            "f32" => Some(Type::F32),
            "f64" => Some(Type::F64),
            _ => None,
        };
        if let Some(ty) = ty {
            return Some(ty);
        }

        if let Some(prototype) = self.class_names.get(node.name.as_str()).copied() {
            let mut arguments = Vec::with_capacity(node.arguments.len());
            for argument in &node.arguments {
                arguments.push(self.resolve_type(
                    argument,
                    contextual_args,
                    report_errors,
                    diagnostics,
                )?);
            }
            let element = self.resolve_class(prototype, arguments, diagnostics)?;
            return Some(Type::Class {
                element,
                ptr64: matches!(self.target, Target::Wasm64),
            });
        }

        if report_errors {
            diagnostics.error(
                DiagnosticKind::Types,
                format!("cannot resolve type `{}`", node.name),
            );
        }
        None
    }

    fn instance_key(internal_name: &str, type_arguments: &[Type]) -> String {
        if type_arguments.is_empty() {
            internal_name.to_owned()
        } else {
            let arguments = type_arguments
                .iter()
                .map(|ty| ty.to_string())
                .collect::<Vec<_>>()
                .join(",");
            format!("{internal_name}<{arguments}>")
        }
    }

    /// Resolves a function prototype and type arguments to a concrete
    /// instance, reusing a cached instance when present.
    pub(crate) fn resolve_function(
        &mut self,
        prototype_id: ElementId,
        type_arguments: Vec<Type>,
        diagnostics: &mut Diagnostics,
    ) -> crate::Result<Option<ElementId>> {
        let prototype = self.prototype(prototype_id)?;
        let Some(declaration) = prototype.declaration else {
            anyhow::bail!(
                "internal: builtin prototype `{}` has no declaration to instantiate",
                prototype.internal_name
            );
        };

        if declaration.type_parameters.len() != type_arguments.len() {
            diagnostics.error(
                DiagnosticKind::Types,
                format!(
                    "expected {} type argument(s) for `{}`, got {}",
                    declaration.type_parameters.len(),
                    prototype.internal_name,
                    type_arguments.len()
                ),
            );
            return Ok(None);
        }

        let instance_name = Self::instance_key(&prototype.internal_name, &type_arguments);
        if let Some(existing) = prototype.instances.get(&instance_name) {
            return Ok(Some(*existing));
        }

        let contextual: HashMap<&'src str, Type> = declaration
            .type_parameters
            .iter()
            .map(String::as_str)
            .zip(type_arguments.iter().cloned())
            .collect();

        let mut parameters = Vec::with_capacity(declaration.parameters.len());
        for parameter in &declaration.parameters {
            let Some(ty) =
                self.resolve_type(&parameter.type_node, Some(&contextual), true, diagnostics)
            else {
                return Ok(None);
            };
            parameters.push(Parameter {
                name: &parameter.name,
                ty,
                initializer: parameter.initializer.as_ref(),
            });
        }
        let return_type = match &declaration.return_type {
            Some(node) => {
                let Some(ty) = self.resolve_type(node, Some(&contextual), true, diagnostics) else {
                    return Ok(None);
                };
                ty
            }
            None => Type::Void,
        };

        let prototype = self.prototype(prototype_id)?;
        let is_import = prototype.is_import;
        let source_path = prototype.source_path;
        let mut function = Function::new(instance_name.clone());
        function.source_path = source_path;
        function.declaration = Some(declaration);
        function.type_arguments = type_arguments;
        function.parameters = parameters;
        function.return_type = return_type;
        function.is_import = is_import;
        log::trace!(
            "instantiated `{instance_name}` with {} type argument(s)",
            function.type_arguments.len()
        );
        let id = self.add(Element::Function(function));
        self.prototype_mut(prototype_id)?
            .instances
            .insert(instance_name, id);
        Ok(Some(id))
    }

    /// Resolves a class prototype and type arguments to an instance. Only the
    /// instance element is produced; layout is not implemented.
    pub(crate) fn resolve_class(
        &mut self,
        prototype_id: ElementId,
        type_arguments: Vec<Type>,
        diagnostics: &mut Diagnostics,
    ) -> Option<ElementId> {
        let prototype = self.class_prototype(prototype_id).ok()?;
        if prototype.declaration.type_parameters.len() != type_arguments.len() {
            diagnostics.error(
                DiagnosticKind::Types,
                format!(
                    "expected {} type argument(s) for `{}`, got {}",
                    prototype.declaration.type_parameters.len(),
                    prototype.internal_name,
                    type_arguments.len()
                ),
            );
            return None;
        }
        let instance_name = Self::instance_key(&prototype.internal_name, &type_arguments);
        if let Some(existing) = prototype.instances.get(&instance_name) {
            return Some(*existing);
        }
        let class = Class {
            internal_name: instance_name.clone(),
            type_arguments,
            is_compiled: false,
        };
        log::trace!(
            "instantiated `{instance_name}` with {} type argument(s)",
            class.type_arguments.len()
        );
        let id = self.add(Element::Class(class));
        self.class_prototype_mut(prototype_id)
            .ok()?
            .instances
            .insert(instance_name, id);
        Some(id)
    }

    /// Resolves an identifier: the current function's locals first, then the
    /// enclosing file's scope, then the global scope (builtins).
    pub(crate) fn resolve_identifier(
        &self,
        name: &str,
        file_scope: &str,
        current_function: &Function<'src>,
    ) -> Option<ResolvedElement> {
        if let Some((index, ty)) = current_function.lookup_local(name) {
            return Some(ResolvedElement::Local { index, ty });
        }
        if let Some(id) = self.lookup(&format!("{file_scope}/{name}")) {
            return Some(ResolvedElement::Element(id));
        }
        self.lookup(name).map(ResolvedElement::Element)
    }
}
