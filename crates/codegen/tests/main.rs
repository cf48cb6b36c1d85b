//! End-to-end tests driving the compiler over hand-built programs and
//! asserting on the shape of the emitted module.

use tswasm_codegen::ast::{
    BinaryOperator, EnumDeclaration, EnumValueDeclaration, Expression, FunctionDeclaration,
    ImportStatement, Modifiers, NamespaceDeclaration, ParameterDeclaration, Statement, SwitchCase,
    TypeNode, UnaryPostfixOperator, UnaryPrefixOperator, VariableDeclaration, VariableStatement,
};
use tswasm_codegen::module::{Expr, ExprId, Module};
use tswasm_codegen::{Compilation, Compile, DiagnosticKind, NativeType, Program, Source, Target};

fn entry(statements: Vec<Statement>) -> Program {
    Program {
        sources: vec![Source {
            normalized_path: "src".to_owned(),
            is_entry: true,
            statements,
        }],
    }
}

fn compile(program: &Program) -> Compilation {
    Compile::new().compile(program).unwrap()
}

fn compile_all(program: &Program) -> Compilation {
    Compile::new().no_tree_shaking(true).compile(program).unwrap()
}

fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_owned())
}

fn int(value: i64) -> Expression {
    Expression::IntegerLiteral(value)
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    Expression::Call {
        expression: Box::new(ident(name)),
        type_arguments: Vec::new(),
        arguments,
    }
}

fn call_generic(name: &str, type_arguments: Vec<TypeNode>, arguments: Vec<Expression>) -> Expression {
    Expression::Call {
        expression: Box::new(ident(name)),
        type_arguments,
        arguments,
    }
}

fn param(name: &str, type_name: &str) -> ParameterDeclaration {
    ParameterDeclaration {
        name: name.to_owned(),
        type_node: TypeNode::new(type_name),
        initializer: None,
    }
}

fn function(
    name: &str,
    parameters: Vec<ParameterDeclaration>,
    return_type: Option<&str>,
    statements: Vec<Statement>,
    export: bool,
) -> Statement {
    Statement::Function(FunctionDeclaration {
        name: name.to_owned(),
        type_parameters: Vec::new(),
        parameters,
        return_type: return_type.map(TypeNode::new),
        statements: Some(statements),
        modifiers: Modifiers {
            export,
            declare: false,
        },
    })
}

fn variable(name: &str, type_name: &str, initializer: Option<Expression>, is_const: bool, export: bool) -> Statement {
    Statement::Variable(VariableStatement {
        declarations: vec![VariableDeclaration {
            name: name.to_owned(),
            type_node: Some(TypeNode::new(type_name)),
            initializer,
        }],
        is_const,
        modifiers: Modifiers {
            export,
            declare: false,
        },
    })
}

fn ret(expression: Expression) -> Statement {
    Statement::Return(Some(expression))
}

fn expr(expression: Expression) -> Statement {
    Statement::Expression(expression)
}

fn body_of<'m>(module: &'m Module, name: &str) -> &'m Expr {
    let function = module
        .function(name)
        .unwrap_or_else(|| panic!("missing function `{name}`"));
    module.expr(function.body)
}

fn block_parts<'m>(expression: &'m Expr) -> (Option<&'m str>, &'m [ExprId]) {
    match expression {
        Expr::Block {
            label, children, ..
        } => (label.as_deref(), children),
        other => panic!("expected a block, got {other:?}"),
    }
}

/// The single statement inside a compiled function's body block.
fn sole_statement<'m>(module: &'m Module, name: &str) -> &'m Expr {
    let (label, children) = block_parts(body_of(module, name));
    assert_eq!(label, None);
    assert_eq!(children.len(), 1, "expected a single statement");
    module.expr(children[0])
}

fn returned<'m>(module: &'m Module, name: &str) -> &'m Expr {
    match sole_statement(module, name) {
        Expr::Return { value: Some(value) } => module.expr(*value),
        other => panic!("expected a return, got {other:?}"),
    }
}

#[test]
fn empty_entry_source() {
    let compilation = compile(&entry(Vec::new()));
    assert!(compilation.diagnostics.is_empty());
    assert!(compilation.module.functions().is_empty());
    assert!(compilation.module.globals().is_empty());
    assert!(compilation.module.start().is_none());

    insta::assert_snapshot!(compilation.module.to_string(), @r#"
(module
  (memory 1 65535)
  (data (i32.const 4) "\08\00\00\00")
  (export "memory" (memory 0))
)
"#);
}

#[test]
fn exported_add_function() {
    let program = entry(vec![function(
        "add",
        vec![param("a", "i32"), param("b", "i32")],
        Some("i32"),
        vec![ret(binary(BinaryOperator::Add, ident("a"), ident("b")))],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    assert_eq!(compilation.module.function_types().len(), 1);
    assert_eq!(compilation.module.exports().len(), 1);
    assert_eq!(compilation.module.exports()[0].external_name, "add");

    insta::assert_snapshot!(compilation.module.to_string(), @r#"
(module
  (type $t0 (func (param i32 i32) (result i32)))
  (memory 1 65535)
  (data (i32.const 4) "\08\00\00\00")
  (export "memory" (memory 0))
  (func $src/add (type $t0)
    (block
      (return
        (i32.add
          (get_local 0)
          (get_local 1)))))
  (export "add" (func $src/add))
)
"#);
}

#[test]
fn literal_global_compiles_inline() {
    let program = entry(vec![variable("X", "i32", Some(int(42)), true, true)]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());

    let global = compilation.module.global("src/X").expect("global");
    assert!(!global.mutable);
    assert_eq!(global.ty, NativeType::I32);
    assert_eq!(compilation.module.expr(global.init), &Expr::I32(42));
    assert!(compilation.module.start().is_none());
}

#[test]
fn constant_small_integer_globals_extend_at_emit_time() {
    let program = entry(vec![
        variable("M", "u8", Some(int(300)), true, true),
        variable("S", "i8", Some(int(-1)), true, true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());

    // The constant is mask-zero-extended when emitted, not deferred.
    let masked = compilation.module.global("src/M").expect("global");
    assert!(!masked.mutable);
    assert_eq!(compilation.module.expr(masked.init), &Expr::I32(44));

    let signed = compilation.module.global("src/S").expect("global");
    assert!(!signed.mutable);
    assert_eq!(compilation.module.expr(signed.init), &Expr::I32(-1));

    assert!(compilation.module.start().is_none());
}

#[test]
fn computed_global_defers_to_start_function() {
    let program = entry(vec![
        variable("Y", "i32", Some(call("compute", Vec::new())), false, false),
        function("compute", Vec::new(), Some("i32"), vec![ret(int(42))], false),
    ]);
    let compilation = compile_all(&program);
    assert!(compilation.diagnostics.is_empty());

    let global = compilation.module.global("src/Y").expect("global");
    assert!(global.mutable);
    assert_eq!(compilation.module.expr(global.init), &Expr::I32(-1));

    let start = compilation.module.start().expect("start function");
    let (_, statements) = block_parts(compilation.module.expr(start.body));
    match compilation.module.expr(statements[0]) {
        Expr::SetGlobal { name, value } => {
            assert_eq!(&**name, "src/Y");
            match compilation.module.expr(*value) {
                Expr::Call { target, .. } => assert_eq!(&**target, "src/compute"),
                other => panic!("expected a call, got {other:?}"),
            }
        }
        other => panic!("expected set_global, got {other:?}"),
    }
}

#[test]
fn while_loop_with_break() {
    // while (x) { if (x) break; x = x + 1; }
    let body = Statement::While {
        condition: ident("x"),
        statement: Box::new(Statement::Block(vec![
            Statement::If {
                condition: ident("x"),
                if_true: Box::new(Statement::Break),
                if_false: None,
            },
            expr(binary(
                BinaryOperator::Assign,
                ident("x"),
                binary(BinaryOperator::Add, ident("x"), int(1)),
            )),
        ])),
    };
    let program = entry(vec![function(
        "f",
        vec![param("x", "i32")],
        None,
        vec![body],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let (label, children) = block_parts(sole_statement(module, "src/f"));
    assert_eq!(label, Some("break$0"));
    let Expr::Loop { label, body } = module.expr(children[0]) else {
        panic!("expected a loop");
    };
    assert_eq!(&**label, "continue$0");

    let Expr::If {
        condition, if_true, ..
    } = module.expr(*body)
    else {
        panic!("expected the loop condition");
    };
    assert_eq!(
        module.expr(*condition),
        &Expr::GetLocal {
            index: 0,
            ty: NativeType::I32
        }
    );

    // if taken: { body ; br continue$0 }
    let (label, taken) = block_parts(module.expr(*if_true));
    assert_eq!(label, None);
    assert_eq!(taken.len(), 2);
    assert_eq!(
        module.expr(taken[1]),
        &Expr::Break {
            label: "continue$0".into(),
            condition: None
        }
    );

    // the while body: { if (x) br break$0 ; set_local x (x + 1) }
    let (_, statements) = block_parts(module.expr(taken[0]));
    let Expr::If { if_true, .. } = module.expr(statements[0]) else {
        panic!("expected the inner if");
    };
    assert_eq!(
        module.expr(*if_true),
        &Expr::Break {
            label: "break$0".into(),
            condition: None
        }
    );
    let Expr::SetLocal { index: 0, value } = module.expr(statements[1]) else {
        panic!("expected the assignment");
    };
    let Expr::Binary {
        op: tswasm_codegen::module::BinaryOp::I32Add,
        right,
        ..
    } = module.expr(*value)
    else {
        panic!("expected the increment");
    };
    assert_eq!(module.expr(*right), &Expr::I32(1));
}

#[test]
fn switch_with_fall_through_and_default() {
    // switch (k) { case 1: a(); case 2: b(); break; default: c(); }
    let switch = Statement::Switch {
        condition: ident("k"),
        cases: vec![
            SwitchCase {
                label: Some(int(1)),
                statements: vec![expr(call("a", Vec::new()))],
            },
            SwitchCase {
                label: Some(int(2)),
                statements: vec![expr(call("b", Vec::new())), Statement::Break],
            },
            SwitchCase {
                label: None,
                statements: vec![expr(call("c", Vec::new()))],
            },
        ],
    };
    let program = entry(vec![
        function("f", vec![param("k", "i32")], None, vec![switch], true),
        function("a", Vec::new(), None, Vec::new(), false),
        function("b", Vec::new(), None, Vec::new(), false),
        function("c", Vec::new(), None, Vec::new(), false),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    // The switch operand lands in a fresh local.
    let f = module.function("src/f").unwrap();
    assert_eq!(&*f.locals, &[NativeType::I32]);

    let (label, outer) = block_parts(sole_statement(module, "src/f"));
    assert_eq!(label, Some("break$0"));
    assert_eq!(outer.len(), 2); // default case runs to the block's end

    let (label, middle) = block_parts(module.expr(outer[0]));
    assert_eq!(label, Some("case_default$0"));
    match module.expr(middle[2]) {
        Expr::Break { label, condition } => {
            assert_eq!(&**label, "break$0");
            assert!(condition.is_none());
        }
        other => panic!("expected the case 2 break, got {other:?}"),
    }

    let (label, inner) = block_parts(module.expr(middle[0]));
    assert_eq!(label, Some("case1$0"));

    let (label, dispatch) = block_parts(module.expr(inner[0]));
    assert_eq!(label, Some("case0$0"));
    assert_eq!(dispatch.len(), 4);
    match module.expr(dispatch[0]) {
        Expr::SetLocal { index: 1, value } => {
            assert_eq!(
                module.expr(*value),
                &Expr::GetLocal {
                    index: 0,
                    ty: NativeType::I32
                }
            );
        }
        other => panic!("expected the operand spill, got {other:?}"),
    }
    match module.expr(dispatch[1]) {
        Expr::Break {
            label,
            condition: Some(condition),
        } => {
            assert_eq!(&**label, "case0$0");
            let Expr::Binary {
                op: tswasm_codegen::module::BinaryOp::I32Eq,
                right,
                ..
            } = module.expr(*condition)
            else {
                panic!("expected an equality test");
            };
            assert_eq!(module.expr(*right), &Expr::I32(1));
        }
        other => panic!("expected the case 1 dispatch, got {other:?}"),
    }
    match module.expr(dispatch[3]) {
        Expr::Break { label, condition } => {
            assert_eq!(&**label, "case_default$0");
            assert!(condition.is_none());
        }
        other => panic!("expected the default dispatch, got {other:?}"),
    }
}

#[test]
fn importing_a_source_twice_compiles_it_once() {
    let import = |path: &str| {
        Statement::Import(ImportStatement {
            members: Vec::new(),
            path: path.to_owned(),
        })
    };
    let program = Program {
        sources: vec![
            Source {
                normalized_path: "src".to_owned(),
                is_entry: true,
                statements: vec![import("lib"), import("lib")],
            },
            Source {
                normalized_path: "lib".to_owned(),
                is_entry: false,
                statements: vec![variable("g", "i32", Some(int(1)), false, false)],
            },
        ],
    };
    let compilation = compile_all(&program);
    assert!(compilation.diagnostics.is_empty());
    let count = compilation
        .module
        .globals()
        .iter()
        .filter(|g| g.name == "lib/g")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn missing_import_is_a_diagnostic() {
    let program = entry(vec![Statement::Import(ImportStatement {
        members: Vec::new(),
        path: "nowhere".to_owned(),
    })]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.has_errors());
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.kind == DiagnosticKind::Lookup && d.message.contains("nowhere")));
}

#[test]
fn top_level_expression_populates_start_function() {
    let compilation = compile(&entry(vec![expr(int(1))]));
    assert!(compilation.diagnostics.is_empty());
    let start = compilation.module.start().expect("start function");
    let (_, statements) = block_parts(compilation.module.expr(start.body));
    match compilation.module.expr(statements[0]) {
        Expr::Drop { value } => {
            assert_eq!(compilation.module.expr(*value), &Expr::I32(1));
        }
        other => panic!("expected a dropped literal, got {other:?}"),
    }
}

#[test]
fn integer_literals_widen_at_the_i32_boundary() {
    let compilation = compile(&entry(vec![
        expr(int(i64::from(i32::MAX))),
        expr(int(i64::from(i32::MAX) + 1)),
    ]));
    let module = &compilation.module;
    let start = module.start().expect("start function");
    let (_, statements) = block_parts(module.expr(start.body));

    let Expr::Drop { value } = module.expr(statements[0]) else {
        panic!("expected a drop");
    };
    assert_eq!(module.expr(*value), &Expr::I32(i32::MAX));

    let Expr::Drop { value } = module.expr(statements[1]) else {
        panic!("expected a drop");
    };
    assert_eq!(module.expr(*value), &Expr::I64(i64::from(i32::MAX) + 1));
}

#[test]
fn break_at_top_level_is_a_diagnostic() {
    let compilation = compile(&entry(vec![Statement::Break]));
    assert!(compilation.diagnostics.has_errors());
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.message.contains("break")));
    let start = compilation.module.start().expect("start function");
    let (_, statements) = block_parts(compilation.module.expr(start.body));
    assert_eq!(compilation.module.expr(statements[0]), &Expr::Unreachable);
}

#[test]
fn continue_inside_switch_is_a_diagnostic() {
    // while (1) { switch (x) { case 1: continue; } }
    let switch = Statement::Switch {
        condition: ident("x"),
        cases: vec![SwitchCase {
            label: Some(int(1)),
            statements: vec![Statement::Continue],
        }],
    };
    let body = Statement::While {
        condition: int(1),
        statement: Box::new(switch),
    };
    let program = entry(vec![function(
        "f",
        vec![param("x", "i32")],
        None,
        vec![body],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.has_errors());
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.message.contains("continue")));
}

#[test]
fn small_integer_narrowing_inserts_extension_pairs() {
    let program = entry(vec![
        function("signed", vec![param("x", "i32")], Some("i8"), vec![ret(ident("x"))], true),
        function("unsigned", vec![param("x", "i32")], Some("u8"), vec![ret(ident("x"))], true),
        function("widen", vec![param("x", "i8")], Some("i32"), vec![ret(ident("x"))], true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    // (x << 24) >> 24
    let Expr::Binary {
        op: tswasm_codegen::module::BinaryOp::I32ShrS,
        left,
        right,
    } = returned(module, "src/signed")
    else {
        panic!("expected an arithmetic shift");
    };
    assert_eq!(module.expr(*right), &Expr::I32(24));
    let Expr::Binary {
        op: tswasm_codegen::module::BinaryOp::I32Shl,
        right,
        ..
    } = module.expr(*left)
    else {
        panic!("expected the left shift");
    };
    assert_eq!(module.expr(*right), &Expr::I32(24));

    // x & 0xFF
    let Expr::Binary {
        op: tswasm_codegen::module::BinaryOp::I32And,
        right,
        ..
    } = returned(module, "src/unsigned")
    else {
        panic!("expected a mask");
    };
    assert_eq!(module.expr(*right), &Expr::I32(0xFF));

    // Widening a small integer needs no instruction.
    assert_eq!(
        returned(module, "src/widen"),
        &Expr::GetLocal {
            index: 0,
            ty: NativeType::I32
        }
    );
}

#[test]
fn long_integer_conversions() {
    let program = entry(vec![
        function("wrap", vec![param("x", "u64")], Some("i32"), vec![ret(ident("x"))], true),
        function("extend_s", vec![param("x", "i32")], Some("i64"), vec![ret(ident("x"))], true),
        function("extend_u", vec![param("x", "u32")], Some("i64"), vec![ret(ident("x"))], true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    use tswasm_codegen::module::UnaryOp;
    assert!(matches!(
        returned(module, "src/wrap"),
        Expr::Unary {
            op: UnaryOp::I32WrapI64,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/extend_s"),
        Expr::Unary {
            op: UnaryOp::I64ExtendI32S,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/extend_u"),
        Expr::Unary {
            op: UnaryOp::I64ExtendI32U,
            ..
        }
    ));
}

#[test]
fn float_conversions() {
    let program = entry(vec![
        function("demote", vec![param("x", "f64")], Some("f32"), vec![ret(ident("x"))], true),
        function("promote", vec![param("x", "f32")], Some("f64"), vec![ret(ident("x"))], true),
        function("convert", vec![param("x", "i32")], Some("f64"), vec![ret(ident("x"))], true),
        function("convert_u", vec![param("x", "u32")], Some("f64"), vec![ret(ident("x"))], true),
        function("trunc", vec![param("x", "f32")], Some("i32"), vec![ret(ident("x"))], true),
        function("trunc_small", vec![param("x", "f64")], Some("u8"), vec![ret(ident("x"))], true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    use tswasm_codegen::module::{BinaryOp, UnaryOp};
    assert!(matches!(
        returned(module, "src/demote"),
        Expr::Unary {
            op: UnaryOp::F32DemoteF64,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/promote"),
        Expr::Unary {
            op: UnaryOp::F64PromoteF32,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/convert"),
        Expr::Unary {
            op: UnaryOp::F64ConvertI32S,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/convert_u"),
        Expr::Unary {
            op: UnaryOp::F64ConvertI32U,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/trunc"),
        Expr::Unary {
            op: UnaryOp::I32TruncF32S,
            ..
        }
    ));

    // f64 -> u8: truncate, then mask.
    let Expr::Binary {
        op: BinaryOp::I32And,
        left,
        right,
    } = returned(module, "src/trunc_small")
    else {
        panic!("expected a mask");
    };
    assert_eq!(module.expr(*right), &Expr::I32(0xFF));
    assert!(matches!(
        module.expr(*left),
        Expr::Unary {
            op: UnaryOp::I32TruncF64U,
            ..
        }
    ));
}

#[test]
fn assignment_tee_semantics() {
    let program = entry(vec![
        function(
            "local_tee",
            vec![param("x", "i32")],
            Some("i32"),
            vec![ret(binary(BinaryOperator::Assign, ident("x"), int(2)))],
            true,
        ),
        function(
            "global_tee",
            Vec::new(),
            Some("i32"),
            vec![ret(binary(BinaryOperator::Assign, ident("g"), int(2)))],
            true,
        ),
        variable("g", "i32", Some(int(0)), false, false),
    ]);
    let compilation = compile_all(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    match returned(module, "src/local_tee") {
        Expr::TeeLocal {
            index: 0,
            value,
            ty: NativeType::I32,
        } => assert_eq!(module.expr(*value), &Expr::I32(2)),
        other => panic!("expected tee_local, got {other:?}"),
    }

    // set_global followed by get_global inside an i32-valued block
    let Expr::Block {
        label: None,
        children,
        result: NativeType::I32,
    } = returned(module, "src/global_tee")
    else {
        panic!("expected a valued block");
    };
    assert!(matches!(
        module.expr(children[0]),
        Expr::SetGlobal { name, .. } if &**name == "src/g"
    ));
    assert!(matches!(
        module.expr(children[1]),
        Expr::GetGlobal { name, .. } if &**name == "src/g"
    ));
}

#[test]
fn missing_argument_uses_parameter_initializer() {
    let callee = Statement::Function(FunctionDeclaration {
        name: "two".to_owned(),
        type_parameters: Vec::new(),
        parameters: vec![
            param("a", "i32"),
            ParameterDeclaration {
                name: "b".to_owned(),
                type_node: TypeNode::new("i32"),
                initializer: Some(int(3)),
            },
        ],
        return_type: Some(TypeNode::new("i32")),
        statements: Some(vec![ret(binary(
            BinaryOperator::Add,
            ident("a"),
            ident("b"),
        ))]),
        modifiers: Modifiers::default(),
    });
    let program = entry(vec![
        function(
            "main",
            Vec::new(),
            Some("i32"),
            vec![ret(call("two", vec![int(1)]))],
            true,
        ),
        callee,
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let Expr::Call {
        target, operands, ..
    } = returned(module, "src/main")
    else {
        panic!("expected a call");
    };
    assert_eq!(&**target, "src/two");
    assert_eq!(operands.len(), 2);
    assert_eq!(module.expr(operands[0]), &Expr::I32(1));
    // The default is evaluated in the caller.
    assert_eq!(module.expr(operands[1]), &Expr::I32(3));
}

#[test]
fn argument_arity_is_checked() {
    let program = entry(vec![
        function(
            "main",
            Vec::new(),
            None,
            vec![expr(call("one", vec![int(1), int(2)]))],
            true,
        ),
        function("one", vec![param("a", "i32")], None, Vec::new(), false),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.has_errors());
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.kind == DiagnosticKind::Types && d.message.contains("argument")));
}

#[test]
fn builtin_intrinsics() {
    let program = entry(vec![
        function(
            "s",
            vec![param("x", "f64")],
            Some("f64"),
            vec![ret(call("sqrt", vec![ident("x")]))],
            true,
        ),
        function(
            "c",
            vec![param("x", "i32")],
            Some("i32"),
            vec![ret(call("clz", vec![ident("x")]))],
            true,
        ),
        function(
            "size",
            Vec::new(),
            Some("usize"),
            vec![ret(call_generic("sizeof", vec![TypeNode::new("i32")], Vec::new()))],
            true,
        ),
        function(
            "nan",
            vec![param("x", "f64")],
            Some("bool"),
            vec![ret(call("isNaN", vec![ident("x")]))],
            true,
        ),
        function(
            "fin",
            vec![param("x", "f32")],
            Some("bool"),
            vec![ret(call("isFinite", vec![ident("x")]))],
            true,
        ),
        function(
            "mem",
            Vec::new(),
            Some("i32"),
            vec![ret(call("current_memory", Vec::new()))],
            true,
        ),
        function(
            "grow",
            Vec::new(),
            None,
            vec![expr(call("grow_memory", vec![int(1)]))],
            true,
        ),
    ]);
    let compilation = compile(&program);
    assert!(!compilation.diagnostics.has_errors());
    let module = &compilation.module;

    use tswasm_codegen::module::{BinaryOp, HostOp, UnaryOp};
    assert!(matches!(
        returned(module, "src/s"),
        Expr::Unary {
            op: UnaryOp::F64Sqrt,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/c"),
        Expr::Unary {
            op: UnaryOp::I32Clz,
            ..
        }
    ));
    // ceil(4 bytes) on the 32-bit target
    assert_eq!(returned(module, "src/size"), &Expr::I32(4));

    // isNaN: temp != temp
    let nan = module.function("src/nan").unwrap();
    assert_eq!(&*nan.locals, &[NativeType::F64]);
    let Expr::Binary {
        op: BinaryOp::F64Ne,
        left,
        right,
    } = returned(module, "src/nan")
    else {
        panic!("expected a self-inequality test");
    };
    assert!(matches!(
        module.expr(*left),
        Expr::TeeLocal { index: 1, .. }
    ));
    assert!(matches!(module.expr(*right), Expr::GetLocal { index: 1, .. }));

    // isFinite is f32-typed throughout for an f32 operand.
    let fin = module.function("src/fin").unwrap();
    assert_eq!(&*fin.locals, &[NativeType::F32]);
    let Expr::Select {
        if_true, if_false, ..
    } = returned(module, "src/fin")
    else {
        panic!("expected a select");
    };
    assert_eq!(module.expr(*if_true), &Expr::I32(0));
    assert!(matches!(
        module.expr(*if_false),
        Expr::Binary {
            op: BinaryOp::F32Ne,
            ..
        }
    ));

    match returned(module, "src/mem") {
        Expr::Host {
            op: HostOp::CurrentMemory,
            operands,
        } => assert!(operands.is_empty()),
        other => panic!("expected current_memory, got {other:?}"),
    }

    // grow_memory warns but is not an error.
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.kind == DiagnosticKind::Unsafe));
    let Expr::Drop { value } = sole_statement(module, "src/grow") else {
        panic!("expected the grown page count to be dropped");
    };
    assert!(matches!(
        module.expr(*value),
        Expr::Host {
            op: HostOp::GrowMemory,
            ..
        }
    ));
}

#[test]
fn declared_functions_become_imports() {
    let program = entry(vec![
        Statement::Function(FunctionDeclaration {
            name: "log".to_owned(),
            type_parameters: Vec::new(),
            parameters: vec![param("x", "i32")],
            return_type: None,
            statements: None,
            modifiers: Modifiers {
                export: false,
                declare: true,
            },
        }),
        function(
            "main",
            Vec::new(),
            None,
            vec![expr(call("log", vec![int(1)]))],
            true,
        ),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    assert_eq!(module.imports().len(), 1);
    assert_eq!(module.imports()[0].name, "src/log");
    assert_eq!(module.imports()[0].module, "env");
    assert_eq!(module.imports()[0].base, "log");

    match sole_statement(module, "src/main") {
        Expr::CallImport { target, .. } => assert_eq!(&**target, "src/log"),
        other => panic!("expected a call_import, got {other:?}"),
    }
}

#[test]
fn enum_members_become_globals() {
    let program = entry(vec![Statement::Enum(EnumDeclaration {
        name: "E".to_owned(),
        members: vec![
            EnumValueDeclaration {
                name: "A".to_owned(),
                initializer: None,
            },
            EnumValueDeclaration {
                name: "B".to_owned(),
                initializer: None,
            },
            EnumValueDeclaration {
                name: "C".to_owned(),
                initializer: Some(int(7)),
            },
            EnumValueDeclaration {
                name: "D".to_owned(),
                initializer: None,
            },
        ],
        modifiers: Modifiers {
            export: true,
            declare: false,
        },
    })]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    for (name, value) in [("A", 0), ("B", 1), ("C", 7), ("D", 8)] {
        let global = module
            .global(&format!("src/E.{name}"))
            .unwrap_or_else(|| panic!("missing member {name}"));
        assert!(!global.mutable);
        assert_eq!(global.ty, NativeType::I32);
        assert_eq!(module.expr(global.init), &Expr::I32(value));
    }
    assert!(module.start().is_none());
}

#[test]
fn non_constant_enum_members_defer_to_start() {
    let program = entry(vec![
        Statement::Enum(EnumDeclaration {
            name: "F".to_owned(),
            members: vec![
                EnumValueDeclaration {
                    name: "A".to_owned(),
                    initializer: Some(call("compute", Vec::new())),
                },
                EnumValueDeclaration {
                    name: "B".to_owned(),
                    initializer: None,
                },
            ],
            modifiers: Modifiers {
                export: true,
                declare: false,
            },
        }),
        function("compute", Vec::new(), Some("i32"), vec![ret(int(5))], false),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let a = module.global("src/F.A").expect("member A");
    assert!(a.mutable);
    assert_eq!(module.expr(a.init), &Expr::I32(-1));
    let b = module.global("src/F.B").expect("member B");
    assert!(b.mutable);

    // Initialization preserves declaration order: A, then B = A + 1.
    let start = module.start().expect("start function");
    let (_, statements) = block_parts(module.expr(start.body));
    assert!(matches!(
        module.expr(statements[0]),
        Expr::SetGlobal { name, .. } if &**name == "src/F.A"
    ));
    let Expr::SetGlobal { name, value } = module.expr(statements[1]) else {
        panic!("expected member B's initializer");
    };
    assert_eq!(&**name, "src/F.B");
    let Expr::Binary { left, .. } = module.expr(*value) else {
        panic!("expected previous + 1");
    };
    assert!(matches!(
        module.expr(*left),
        Expr::GetGlobal { name, .. } if &**name == "src/F.A"
    ));
}

#[test]
fn wasm64_heap_start_is_pointer_sized() {
    let compilation = Compile::new()
        .target(Target::Wasm64)
        .compile(&entry(Vec::new()))
        .unwrap();
    let memory = compilation.module.memory().expect("memory");
    assert_eq!(memory.initial, 1);
    assert_eq!(memory.segments.len(), 1);
    assert_eq!(memory.segments[0].offset, 8);
    assert_eq!(memory.segments[0].data.as_ref(), &16u64.to_le_bytes());
}

#[test]
fn select_expression() {
    let program = entry(vec![function(
        "pick",
        vec![param("c", "i32"), param("a", "i32"), param("b", "i32")],
        Some("i32"),
        vec![ret(Expression::Select {
            condition: Box::new(ident("c")),
            if_true: Box::new(ident("a")),
            if_false: Box::new(ident("b")),
        })],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let Expr::Select {
        condition,
        if_true,
        if_false,
    } = returned(module, "src/pick")
    else {
        panic!("expected a select");
    };
    assert!(matches!(module.expr(*condition), Expr::GetLocal { index: 0, .. }));
    assert!(matches!(module.expr(*if_true), Expr::GetLocal { index: 1, .. }));
    assert!(matches!(module.expr(*if_false), Expr::GetLocal { index: 2, .. }));
}

#[test]
fn for_loop_defaults() {
    let program = entry(vec![function(
        "f",
        Vec::new(),
        None,
        vec![Statement::For {
            initializer: None,
            condition: None,
            incrementor: None,
            statement: Box::new(Statement::Break),
        }],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let (label, children) = block_parts(sole_statement(module, "src/f"));
    assert_eq!(label, Some("break$0"));
    assert_eq!(children.len(), 2);
    assert_eq!(module.expr(children[0]), &Expr::Nop);
    let Expr::Loop { body, .. } = module.expr(children[1]) else {
        panic!("expected the loop");
    };
    let Expr::If { condition, .. } = module.expr(*body) else {
        panic!("expected the condition");
    };
    assert_eq!(module.expr(*condition), &Expr::I32(1));
}

#[test]
fn do_loop_back_edge_is_conditional() {
    let program = entry(vec![function(
        "f",
        vec![param("x", "i32")],
        None,
        vec![Statement::Do {
            statement: Box::new(Statement::Empty),
            condition: ident("x"),
        }],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let (label, children) = block_parts(sole_statement(module, "src/f"));
    assert_eq!(label, Some("break$0"));
    let Expr::Loop { label, body } = module.expr(children[0]) else {
        panic!("expected the loop");
    };
    assert_eq!(&**label, "continue$0");
    let (_, inner) = block_parts(module.expr(*body));
    match module.expr(inner[1]) {
        Expr::Break {
            label,
            condition: Some(condition),
        } => {
            assert_eq!(&**label, "continue$0");
            assert!(matches!(
                module.expr(*condition),
                Expr::GetLocal { index: 0, .. }
            ));
        }
        other => panic!("expected a conditional back edge, got {other:?}"),
    }
}

#[test]
fn postfix_increment_yields_the_previous_value() {
    let program = entry(vec![function(
        "p",
        vec![param("x", "i32")],
        Some("i32"),
        vec![ret(Expression::UnaryPostfix {
            operator: UnaryPostfixOperator::Increment,
            operand: Box::new(ident("x")),
        })],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let Expr::Block {
        label: None,
        children,
        result: NativeType::I32,
    } = returned(module, "src/p")
    else {
        panic!("expected a valued block");
    };
    assert_eq!(children.len(), 2);
    assert!(matches!(
        module.expr(children[0]),
        Expr::GetLocal { index: 0, .. }
    ));
    let Expr::SetLocal { index: 0, value } = module.expr(children[1]) else {
        panic!("expected the write-back");
    };
    assert!(matches!(
        module.expr(*value),
        Expr::Binary {
            op: tswasm_codegen::module::BinaryOp::I32Add,
            ..
        }
    ));
}

#[test]
fn unary_prefix_operators() {
    let program = entry(vec![
        function("neg", vec![param("x", "i32")], Some("i32"), vec![ret(Expression::UnaryPrefix { operator: UnaryPrefixOperator::Minus, operand: Box::new(ident("x")) })], true),
        function("fneg", vec![param("x", "f64")], Some("f64"), vec![ret(Expression::UnaryPrefix { operator: UnaryPrefixOperator::Minus, operand: Box::new(ident("x")) })], true),
        function("not", vec![param("x", "i32")], Some("bool"), vec![ret(Expression::UnaryPrefix { operator: UnaryPrefixOperator::Not, operand: Box::new(ident("x")) })], true),
        function("inv", vec![param("x", "i32")], Some("i32"), vec![ret(Expression::UnaryPrefix { operator: UnaryPrefixOperator::BitNot, operand: Box::new(ident("x")) })], true),
        function("invu", vec![param("x", "u8")], Some("u8"), vec![ret(Expression::UnaryPrefix { operator: UnaryPrefixOperator::BitNot, operand: Box::new(ident("x")) })], true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    use tswasm_codegen::module::{BinaryOp, UnaryOp};
    let Expr::Binary {
        op: BinaryOp::I32Sub,
        left,
        ..
    } = returned(module, "src/neg")
    else {
        panic!("expected 0 - x");
    };
    assert_eq!(module.expr(*left), &Expr::I32(0));

    assert!(matches!(
        returned(module, "src/fneg"),
        Expr::Unary {
            op: UnaryOp::F64Neg,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/not"),
        Expr::Unary {
            op: UnaryOp::I32Eqz,
            ..
        }
    ));
    let Expr::Binary {
        op: BinaryOp::I32Xor,
        right,
        ..
    } = returned(module, "src/inv")
    else {
        panic!("expected x ^ -1");
    };
    assert_eq!(module.expr(*right), &Expr::I32(-1));

    // An unsigned small integer re-normalizes: (x ^ -1) & 0xFF.
    let Expr::Binary {
        op: BinaryOp::I32And,
        left,
        right,
    } = returned(module, "src/invu")
    else {
        panic!("expected the zero mask");
    };
    assert_eq!(module.expr(*right), &Expr::I32(0xFF));
    assert!(matches!(
        module.expr(*left),
        Expr::Binary {
            op: BinaryOp::I32Xor,
            ..
        }
    ));
}

#[test]
fn logical_operators_short_circuit() {
    let program = entry(vec![function(
        "and",
        vec![param("a", "bool"), param("b", "bool")],
        Some("bool"),
        vec![ret(binary(BinaryOperator::LogicalAnd, ident("a"), ident("b")))],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let Expr::If {
        condition,
        if_true,
        if_false: Some(if_false),
    } = returned(module, "src/and")
    else {
        panic!("expected a short-circuiting if");
    };
    assert!(matches!(module.expr(*condition), Expr::GetLocal { index: 0, .. }));
    assert!(matches!(module.expr(*if_true), Expr::GetLocal { index: 1, .. }));
    assert_eq!(module.expr(*if_false), &Expr::I32(0));
}

#[test]
fn duplicate_locals_are_recoverable() {
    let declare = |name: &str| {
        Statement::Variable(VariableStatement {
            declarations: vec![VariableDeclaration {
                name: name.to_owned(),
                type_node: Some(TypeNode::new("i32")),
                initializer: None,
            }],
            is_const: false,
            modifiers: Modifiers::default(),
        })
    };
    let program = entry(vec![function(
        "f",
        Vec::new(),
        None,
        vec![declare("x"), declare("x")],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.has_errors());
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.message.contains("duplicate local")));
    // The function still compiles, with a single local.
    let f = compilation.module.function("src/f").expect("function");
    assert_eq!(f.locals.len(), 1);
}

#[test]
fn unsupported_expressions_diagnose_and_stay_well_formed() {
    let program = entry(vec![function(
        "f",
        Vec::new(),
        None,
        vec![expr(Expression::PropertyAccess {
            expression: Box::new(ident("a")),
            property: "b".to_owned(),
        })],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.has_errors());
    assert_eq!(sole_statement(&compilation.module, "src/f"), &Expr::Unreachable);
}

#[test]
fn namespace_members_compile_but_namespaces_stay_unimplemented() {
    let program = entry(vec![Statement::Namespace(NamespaceDeclaration {
        name: "N".to_owned(),
        members: vec![function("g", Vec::new(), None, Vec::new(), true)],
        modifiers: Modifiers {
            export: true,
            declare: false,
        },
    })]);
    let compilation = compile(&program);
    assert!(compilation.module.function("src/N.g").is_some());
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.kind == DiagnosticKind::Unsupported && d.message.contains("namespace")));
}

#[test]
fn null_and_bool_literals() {
    let program = entry(vec![
        function("z", Vec::new(), Some("usize"), vec![ret(Expression::Null)], true),
        function("t", Vec::new(), Some("bool"), vec![ret(Expression::True)], true),
        function("one", Vec::new(), Some("bool"), vec![ret(int(1))], true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    assert_eq!(returned(module, "src/z"), &Expr::I32(0));
    assert_eq!(returned(module, "src/t"), &Expr::I32(1));
    assert_eq!(returned(module, "src/one"), &Expr::I32(1));
}

#[test]
fn this_outside_an_instance_method_diagnoses() {
    let program = entry(vec![function(
        "f",
        Vec::new(),
        None,
        vec![expr(Expression::This)],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.has_errors());
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.message.contains("this")));
}

#[test]
fn float_literals_round_to_the_contextual_width() {
    let program = entry(vec![
        function("f", Vec::new(), Some("f32"), vec![ret(Expression::FloatLiteral(1.5))], true),
        function("d", Vec::new(), Some("f64"), vec![ret(Expression::FloatLiteral(1.5))], true),
        function("nan", Vec::new(), Some("f64"), vec![ret(ident("NaN"))], true),
        function("inf", Vec::new(), Some("f32"), vec![ret(ident("Infinity"))], true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    assert_eq!(returned(module, "src/f"), &Expr::F32(1.5));
    assert_eq!(returned(module, "src/d"), &Expr::F64(1.5));
    assert!(matches!(returned(module, "src/nan"), Expr::F64(v) if v.is_nan()));
    assert_eq!(returned(module, "src/inf"), &Expr::F32(f32::INFINITY));
}

#[test]
fn float_modulo_is_unsupported() {
    let program = entry(vec![function(
        "m",
        vec![param("a", "f64"), param("b", "f64")],
        Some("f64"),
        vec![ret(binary(BinaryOperator::Rem, ident("a"), ident("b")))],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation
        .diagnostics
        .items()
        .iter()
        .any(|d| d.kind == DiagnosticKind::Unsupported && d.message.contains("%")));
}

#[test]
fn operator_selection_follows_the_left_operand() {
    let program = entry(vec![
        function(
            "udiv",
            vec![param("a", "u32"), param("b", "u32")],
            Some("u32"),
            vec![ret(binary(BinaryOperator::Div, ident("a"), ident("b")))],
            true,
        ),
        function(
            "fcmp",
            vec![param("a", "f64"), param("b", "f64")],
            Some("bool"),
            vec![ret(binary(BinaryOperator::Lt, ident("a"), ident("b")))],
            true,
        ),
        function(
            "lmul",
            vec![param("a", "i64"), param("b", "i64")],
            Some("i64"),
            vec![ret(binary(BinaryOperator::Mul, ident("a"), ident("b")))],
            true,
        ),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    use tswasm_codegen::module::BinaryOp;
    assert!(matches!(
        returned(module, "src/udiv"),
        Expr::Binary {
            op: BinaryOp::I32DivU,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/fcmp"),
        Expr::Binary {
            op: BinaryOp::F64Lt,
            ..
        }
    ));
    assert!(matches!(
        returned(module, "src/lmul"),
        Expr::Binary {
            op: BinaryOp::I64Mul,
            ..
        }
    ));
}

#[test]
fn generic_functions_instantiate_per_type_argument_list() {
    let identity = Statement::Function(FunctionDeclaration {
        name: "identity".to_owned(),
        type_parameters: vec!["T".to_owned()],
        parameters: vec![param("x", "T")],
        return_type: Some(TypeNode::new("T")),
        statements: Some(vec![ret(ident("x"))]),
        modifiers: Modifiers::default(),
    });
    let program = entry(vec![
        function(
            "main",
            Vec::new(),
            Some("i64"),
            vec![ret(binary(
                BinaryOperator::Add,
                call_generic("identity", vec![TypeNode::new("i64")], vec![int(1)]),
                call_generic("identity", vec![TypeNode::new("i64")], vec![int(2)]),
            ))],
            true,
        ),
        identity,
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    // Two calls with the same type arguments share one instance.
    assert_eq!(module.functions().len(), 2);
    let instance = module
        .function("src/identity<i64>")
        .expect("the i64 instance");
    assert_eq!(module.function_types()[instance.ty.index() as usize].result, NativeType::I64);

    let Expr::Binary { left, .. } = returned(module, "src/main") else {
        panic!("expected the sum of both calls");
    };
    match module.expr(*left) {
        Expr::Call {
            target, operands, ..
        } => {
            assert_eq!(&**target, "src/identity<i64>");
            assert_eq!(module.expr(operands[0]), &Expr::I64(1));
        }
        other => panic!("expected a call, got {other:?}"),
    }
}

#[test]
fn tree_shaking_skips_unexported_declarations() {
    let program = entry(vec![
        function("unused", Vec::new(), None, Vec::new(), false),
        function("used", Vec::new(), None, Vec::new(), true),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    assert!(compilation.module.function("src/unused").is_none());
    assert!(compilation.module.function("src/used").is_some());

    // Everything compiles once tree shaking is off.
    let compilation = compile_all(&program);
    assert!(compilation.module.function("src/unused").is_some());
}

#[test]
fn compound_assignment_combines_and_stores() {
    let program = entry(vec![function(
        "f",
        vec![param("x", "i32")],
        None,
        vec![expr(binary(BinaryOperator::AddAssign, ident("x"), int(2)))],
        true,
    )]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    let Expr::SetLocal { index: 0, value } = sole_statement(module, "src/f") else {
        panic!("expected the combined store");
    };
    let Expr::Binary {
        op: tswasm_codegen::module::BinaryOp::I32Add,
        left,
        right,
    } = module.expr(*value)
    else {
        panic!("expected the combined operation");
    };
    assert!(matches!(
        module.expr(*left),
        Expr::GetLocal { index: 0, .. }
    ));
    assert_eq!(module.expr(*right), &Expr::I32(2));
}

#[test]
fn export_statements_materialize_under_the_external_name() {
    let program = entry(vec![
        function("f", Vec::new(), None, Vec::new(), false),
        Statement::Export(tswasm_codegen::ast::ExportStatement {
            members: vec![("f".to_owned(), "g".to_owned())],
            path: None,
        }),
    ]);
    let compilation = compile(&program);
    assert!(compilation.diagnostics.is_empty());
    let module = &compilation.module;

    assert!(module.function("src/f").is_some());
    assert_eq!(module.exports().len(), 1);
    assert_eq!(module.exports()[0].external_name, "g");
    assert_eq!(module.exports()[0].internal_name, "src/f");
}
