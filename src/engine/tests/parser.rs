//! Parser tests

use crate::engine::error::SyntaxErrorKind;
use crate::engine::parser::{
    is_complete_statement, parse_expression, parse_program, BinOp, CmpOp, Expr, Literal, StmtKind,
    Target, UnOp,
};

fn int(expr: &Expr) -> i64 {
    match expr {
        Expr::Lit(Literal::Int(n), _) => *n,
        other => panic!("expected int literal, got {:?}", other),
    }
}

#[test]
fn test_precedence_of_multiplication() {
    let expr = parse_expression("1 + 2 * 3").unwrap();
    match expr {
        Expr::BinOp {
            op: BinOp::Add,
            left,
            right,
            ..
        } => {
            assert_eq!(int(&left), 1);
            assert!(matches!(*right, Expr::BinOp { op: BinOp::Mul, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_power_is_right_associative() {
    let expr = parse_expression("2 ** 3 ** 2").unwrap();
    match expr {
        Expr::BinOp {
            op: BinOp::Pow,
            left,
            right,
            ..
        } => {
            assert_eq!(int(&left), 2);
            assert!(matches!(*right, Expr::BinOp { op: BinOp::Pow, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unary_minus_binds_looser_than_power() {
    let expr = parse_expression("-2 ** 2").unwrap();
    match expr {
        Expr::UnOp {
            op: UnOp::Neg,
            operand,
            ..
        } => assert!(matches!(*operand, Expr::BinOp { op: BinOp::Pow, .. })),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_chained_comparison() {
    match parse_expression("a < b <= c").unwrap() {
        Expr::Compare { ops, .. } => {
            let kinds: Vec<CmpOp> = ops.iter().map(|(op, _)| *op).collect();
            assert_eq!(kinds, vec![CmpOp::Lt, CmpOp::Le]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_not_in_and_not() {
    match parse_expression("a not in b").unwrap() {
        Expr::Compare { ops, .. } => assert_eq!(ops[0].0, CmpOp::NotIn),
        other => panic!("unexpected {:?}", other),
    }
    match parse_expression("not a in b").unwrap() {
        Expr::UnOp {
            op: UnOp::Not,
            operand,
            ..
        } => assert!(matches!(*operand, Expr::Compare { .. })),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_conditional_expression() {
    assert!(matches!(
        parse_expression("x if c else y").unwrap(),
        Expr::Conditional { .. }
    ));
}

#[test]
fn test_bare_tuple() {
    match parse_expression("1, 2").unwrap() {
        Expr::Tuple(items, _) => assert_eq!(items.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_postfix_chain() {
    let expr = parse_expression("a.b(1, k=2)[0][1:]").unwrap();
    match expr {
        Expr::Slice { object, start, stop, .. } => {
            assert!(start.is_some());
            assert!(stop.is_none());
            assert!(matches!(*object, Expr::Index { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_expression_mode_rejects_statements() {
    assert!(parse_expression("x = 1").is_err());
    assert!(parse_expression("def f():").is_err());
    assert!(parse_expression("").is_err());
    assert!(parse_expression("[].").is_err());
    assert!(parse_expression("1\n2").is_err());
}

#[test]
fn test_expression_mode_skips_surrounding_newlines() {
    assert!(parse_expression("\n[]").is_ok());
    assert!(parse_expression("\nf(\n1)").is_ok());
}

#[test]
fn test_function_definition() {
    let program = parse_program("def f(a, b=2):\n    return a + b\n").unwrap();
    assert_eq!(program.len(), 1);
    match &program[0].kind {
        StmtKind::FunctionDef(def) => {
            assert_eq!(def.name, "f");
            assert_eq!(def.params.len(), 2);
            assert!(def.params[1].default.is_some());
            assert_eq!(def.body.len(), 1);
            assert_eq!(def.body[0].line, 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_inline_suite() {
    let program = parse_program("\ndef f():    return 1").unwrap();
    assert_eq!(program.len(), 1);
    assert_eq!(program[0].line, 2);
}

#[test]
fn test_misplaced_control_flow() {
    let err = parse_program("return 1").unwrap_err();
    assert!(err.message.contains("'return' outside function"));
    assert!(parse_program("break").is_err());
    assert!(parse_program("continue").is_err());
    assert!(parse_program("while x:\n    break\n").is_ok());
    assert!(parse_program("def f():\n    while x:\n        pass\n    break\n").is_err());
    assert!(parse_program("while x:\n    def f():\n        break\n").is_err());
}

#[test]
fn test_assignment_targets() {
    let program = parse_program("a, b = 1, 2").unwrap();
    match &program[0].kind {
        StmtKind::Assign {
            target: Target::Unpack(targets),
            ..
        } => assert_eq!(targets.len(), 2),
        other => panic!("unexpected {:?}", other),
    }

    let err = parse_program("f() = 1").unwrap_err();
    assert!(err.message.contains("cannot assign to function call"));
    assert!(parse_program("x.y = 1\nx[0] = 2").is_ok());
}

#[test]
fn test_augmented_assignment() {
    let program = parse_program("x += 1").unwrap();
    assert!(matches!(
        program[0].kind,
        StmtKind::AugAssign { op: BinOp::Add, .. }
    ));
    assert!(parse_program("a, b += 1").is_err());
}

#[test]
fn test_if_elif_else() {
    let program = parse_program("if a:\n    x\nelif b:\n    y\nelse:\n    z\n").unwrap();
    match &program[0].kind {
        StmtKind::If { branches, orelse } => {
            assert_eq!(branches.len(), 2);
            assert!(orelse.is_some());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_for_with_unpacking() {
    let program = parse_program("for i, j in pairs:\n    pass\n").unwrap();
    match &program[0].kind {
        StmtKind::For { target, .. } => assert!(matches!(target, Target::Unpack(t) if t.len() == 2)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_missing_block() {
    let err = parse_program("def f():\n").unwrap_err();
    assert!(err.message.contains("expected an indented block"));
}

#[test]
fn test_parameter_rules() {
    assert!(parse_program("def f(a=1, b):\n    pass\n").is_err());
    assert!(parse_program("def f(a, a):\n    pass\n").is_err());
    assert!(parse_expression("f(a=1, 2)").is_err());
}

#[test]
fn test_complete_statement_detection() {
    assert!(is_complete_statement("x = 5"));
    assert!(is_complete_statement("print(1)"));
    assert!(!is_complete_statement("def f():"));
    assert!(!is_complete_statement("if x: y"));
    assert!(!is_complete_statement("x = ("));
    assert!(!is_complete_statement(""));
    assert!(!is_complete_statement("   "));
}

#[test]
fn test_nesting_limit() {
    let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = parse_expression(&parens).unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::TooDeep);

    let negations = format!("{}1", "-".repeat(10_000));
    assert_eq!(parse_expression(&negations).unwrap_err().kind, SyntaxErrorKind::TooDeep);

    let calls = format!("f{}", "()".repeat(5_000));
    assert_eq!(parse_expression(&calls).unwrap_err().kind, SyntaxErrorKind::TooDeep);

    let mut blocks = String::new();
    for level in 0..1_500 {
        blocks.push_str(&" ".repeat(level));
        blocks.push_str("if x:\n");
    }
    blocks.push_str(&" ".repeat(1_500));
    blocks.push_str("pass\n");
    assert_eq!(parse_program(&blocks).unwrap_err().kind, SyntaxErrorKind::TooDeep);
    assert!(!is_complete_statement(&parens));
}

#[test]
fn test_nesting_below_limit() {
    let parens = format!("{}1{}", "(".repeat(300), ")".repeat(300));
    assert_eq!(int(&parse_expression(&parens).unwrap()), 1);

    let terms = vec!["1"; 500].join(" + ");
    assert!(matches!(parse_expression(&terms).unwrap(), Expr::BinOp { op: BinOp::Add, .. }));

    let negations = format!("{}1", "-".repeat(400));
    assert!(parse_expression(&negations).is_ok());
}

#[test]
fn test_oversized_int_literal() {
    match parse_expression("9223372036854775808").unwrap() {
        Expr::Lit(Literal::BigInt(digits), _) => assert_eq!(digits, "9223372036854775808"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(int(&parse_expression("-9223372036854775808").unwrap()), i64::MIN);
    assert!(matches!(
        parse_expression("-9223372036854775809").unwrap(),
        Expr::UnOp { op: UnOp::Neg, .. }
    ));
}
