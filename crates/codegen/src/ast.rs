//! The resolved surface syntax tree consumed by the compiler.
//!
//! This is the shape an upstream parser hands over: declarations and
//! statements per source file, with names still textual. Lexing and parsing
//! themselves are not part of this crate.

/// A reference to a named type, possibly with type arguments.
#[derive(Clone, Debug)]
pub struct TypeNode {
    /// The type's name as written.
    pub name: String,
    /// Type arguments, empty for simple references.
    pub arguments: Vec<TypeNode>,
}

impl TypeNode {
    /// A simple named type reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }
}

/// Modifiers attached to a declaration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Modifiers {
    /// Declared with `export`.
    pub export: bool,
    /// Declared with `declare` (an import provided by the host).
    pub declare: bool,
}

/// A statement or declaration.
#[derive(Clone, Debug)]
pub enum Statement {
    /// A `{ ... }` block.
    Block(Vec<Statement>),
    /// A `break` statement.
    Break,
    /// A class declaration.
    Class(ClassDeclaration),
    /// A `continue` statement.
    Continue,
    /// A `do { ... } while (...)` loop.
    Do {
        /// The loop body.
        statement: Box<Statement>,
        /// The back-edge condition.
        condition: Expression,
    },
    /// An empty statement (`;`).
    Empty,
    /// An enum declaration.
    Enum(EnumDeclaration),
    /// An `export { ... }` statement.
    Export(ExportStatement),
    /// An expression in statement position.
    Expression(Expression),
    /// A `for (init; cond; incr)` loop.
    For {
        /// The initializer statement, if any.
        initializer: Option<Box<Statement>>,
        /// The condition, defaulting to true.
        condition: Option<Expression>,
        /// The incrementor expression, if any.
        incrementor: Option<Expression>,
        /// The loop body.
        statement: Box<Statement>,
    },
    /// A function declaration.
    Function(FunctionDeclaration),
    /// An `if` statement.
    If {
        /// The branch condition.
        condition: Expression,
        /// Taken when the condition is non-zero.
        if_true: Box<Statement>,
        /// Taken otherwise, if present.
        if_false: Option<Box<Statement>>,
    },
    /// An `import ... from "..."` statement.
    Import(ImportStatement),
    /// A namespace declaration.
    Namespace(NamespaceDeclaration),
    /// A `return` statement.
    Return(Option<Expression>),
    /// A `switch` statement.
    Switch {
        /// The value being switched over.
        condition: Expression,
        /// The cases in declaration order.
        cases: Vec<SwitchCase>,
    },
    /// A `throw` statement.
    Throw(Expression),
    /// A `try` statement. Lowering is not implemented.
    Try(Vec<Statement>),
    /// One or more variable declarations.
    Variable(VariableStatement),
    /// A `while` loop.
    While {
        /// The loop condition.
        condition: Expression,
        /// The loop body.
        statement: Box<Statement>,
    },
}

/// A single `case` or `default` within a `switch`.
#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// The case label; `None` for `default`.
    pub label: Option<Expression>,
    /// The case's statements. Fall-through is implicit.
    pub statements: Vec<Statement>,
}

/// A `let`/`const` statement holding one or more declarations.
#[derive(Clone, Debug)]
pub struct VariableStatement {
    /// The declarations, left to right.
    pub declarations: Vec<VariableDeclaration>,
    /// Whether declared with `const`.
    pub is_const: bool,
    /// Declaration modifiers.
    pub modifiers: Modifiers,
}

/// A single `name: Type = initializer` declaration.
#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    /// The declared name.
    pub name: String,
    /// The annotated type, if written.
    pub type_node: Option<TypeNode>,
    /// The initializer, if written.
    pub initializer: Option<Expression>,
}

/// A function declaration.
#[derive(Clone, Debug)]
pub struct FunctionDeclaration {
    /// The declared name.
    pub name: String,
    /// Generic type parameter names; non-empty makes the function generic.
    pub type_parameters: Vec<String>,
    /// The parameter list.
    pub parameters: Vec<ParameterDeclaration>,
    /// The return type; `None` means `void`.
    pub return_type: Option<TypeNode>,
    /// The body; `None` for ambient (`declare`) functions.
    pub statements: Option<Vec<Statement>>,
    /// Declaration modifiers.
    pub modifiers: Modifiers,
}

/// A function parameter.
#[derive(Clone, Debug)]
pub struct ParameterDeclaration {
    /// The parameter name.
    pub name: String,
    /// The annotated type.
    pub type_node: TypeNode,
    /// The default value, if written.
    pub initializer: Option<Expression>,
}

/// An enum declaration.
#[derive(Clone, Debug)]
pub struct EnumDeclaration {
    /// The declared name.
    pub name: String,
    /// The members in declaration order.
    pub members: Vec<EnumValueDeclaration>,
    /// Declaration modifiers.
    pub modifiers: Modifiers,
}

/// A single enum member.
#[derive(Clone, Debug)]
pub struct EnumValueDeclaration {
    /// The member name.
    pub name: String,
    /// The member's value; defaults to previous + 1.
    pub initializer: Option<Expression>,
}

/// A namespace declaration.
#[derive(Clone, Debug)]
pub struct NamespaceDeclaration {
    /// The declared name.
    pub name: String,
    /// The member declarations.
    pub members: Vec<Statement>,
    /// Declaration modifiers.
    pub modifiers: Modifiers,
}

/// A class declaration. Compilation is a placeholder seam.
#[derive(Clone, Debug)]
pub struct ClassDeclaration {
    /// The declared name.
    pub name: String,
    /// Generic type parameter names.
    pub type_parameters: Vec<String>,
    /// The member declarations.
    pub members: Vec<Statement>,
    /// Declaration modifiers.
    pub modifiers: Modifiers,
}

/// An `import { a, b as c } from "path"` statement.
#[derive(Clone, Debug)]
pub struct ImportStatement {
    /// Imported members as `(external name, local name)` pairs.
    pub members: Vec<(String, String)>,
    /// The normalized path of the imported source.
    pub path: String,
}

/// An `export { a, b as c }` statement, optionally re-exporting from a
/// foreign source.
#[derive(Clone, Debug)]
pub struct ExportStatement {
    /// Exported members as `(local name, external name)` pairs.
    pub members: Vec<(String, String)>,
    /// The normalized path of the re-exported source, if foreign.
    pub path: Option<String>,
}

/// An expression.
#[derive(Clone, Debug)]
pub enum Expression {
    /// An array literal. Lowering is not implemented.
    ArrayLiteral(Vec<Expression>),
    /// A binary or assignment expression.
    Binary {
        /// The operator.
        operator: BinaryOperator,
        /// The left operand (the target, for assignments).
        left: Box<Expression>,
        /// The right operand.
        right: Box<Expression>,
    },
    /// A call expression.
    Call {
        /// The callee.
        expression: Box<Expression>,
        /// Explicit type arguments for generic callees.
        type_arguments: Vec<TypeNode>,
        /// The arguments.
        arguments: Vec<Expression>,
    },
    /// An indexed access. Lowering is not implemented.
    ElementAccess {
        /// The indexed value.
        expression: Box<Expression>,
        /// The index.
        element: Box<Expression>,
    },
    /// The `false` literal.
    False,
    /// A float literal.
    FloatLiteral(f64),
    /// A plain identifier.
    Identifier(String),
    /// An integer literal, parsed into 64 bits.
    IntegerLiteral(i64),
    /// A `new` expression. Lowering is not implemented.
    New {
        /// The constructed type.
        type_node: TypeNode,
        /// The constructor arguments.
        arguments: Vec<Expression>,
    },
    /// The `null` literal.
    Null,
    /// A parenthesized expression.
    Parenthesized(Box<Expression>),
    /// A property access. Lowering is not implemented.
    PropertyAccess {
        /// The accessed value.
        expression: Box<Expression>,
        /// The property name.
        property: String,
    },
    /// A `cond ? a : b` expression.
    Select {
        /// The condition.
        condition: Box<Expression>,
        /// Value when the condition is non-zero.
        if_true: Box<Expression>,
        /// Value otherwise.
        if_false: Box<Expression>,
    },
    /// A string literal. Lowering is not implemented.
    StringLiteral(String),
    /// The `this` reference.
    This,
    /// The `true` literal.
    True,
    /// A postfix `++`/`--` expression.
    UnaryPostfix {
        /// The operator.
        operator: UnaryPostfixOperator,
        /// The mutated operand.
        operand: Box<Expression>,
    },
    /// A prefix unary expression.
    UnaryPrefix {
        /// The operator.
        operator: UnaryPrefixOperator,
        /// The operand.
        operand: Box<Expression>,
    },
}

/// Binary and assignment operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    ShrU,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    RemAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `>>>=`
    ShrUAssign,
    /// `&=`
    BitAndAssign,
    /// `|=`
    BitOrAssign,
    /// `^=`
    BitXorAssign,
}

impl BinaryOperator {
    /// For a compound assignment, the operator it combines with; `None`
    /// otherwise.
    pub(crate) fn compound_operator(self) -> Option<Self> {
        Some(match self {
            Self::AddAssign => Self::Add,
            Self::SubAssign => Self::Sub,
            Self::MulAssign => Self::Mul,
            Self::DivAssign => Self::Div,
            Self::RemAssign => Self::Rem,
            Self::ShlAssign => Self::Shl,
            Self::ShrAssign => Self::Shr,
            Self::ShrUAssign => Self::ShrU,
            Self::BitAndAssign => Self::BitAnd,
            Self::BitOrAssign => Self::BitOr,
            Self::BitXorAssign => Self::BitXor,
            _ => return None,
        })
    }

    /// Whether this operator produces a `bool`.
    pub(crate) fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    /// Whether this operator works on the operand's bit pattern.
    pub(crate) fn is_bitwise(self) -> bool {
        matches!(
            self,
            Self::Shl | Self::Shr | Self::ShrU | Self::BitAnd | Self::BitOr | Self::BitXor
        )
    }

    /// The operator as written in source.
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::ShrU => ">>>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::RemAssign => "%=",
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
            Self::ShrUAssign => ">>>=",
            Self::BitAndAssign => "&=",
            Self::BitOrAssign => "|=",
            Self::BitXorAssign => "^=",
        }
    }
}

/// Prefix unary operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryPrefixOperator {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// Postfix unary operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryPostfixOperator {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}
