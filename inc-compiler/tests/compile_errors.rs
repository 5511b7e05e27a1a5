// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

use inc_compiler::{Compiler, Env, Error, Expr, compile_program, compile_str};

#[test]
fn unknown_primitive_errors() {
    let err = compile_str("(vector-ref 1 2)").expect_err("compile must fail");
    assert!(matches!(err, Error::UnknownPrimitive(ref op) if op == "vector-ref"));
    assert!(err.to_string().contains("unknown primitive"));
}

#[test]
fn unbound_variable_errors() {
    let err = compile_str("(let ((x 1)) (+ x y))").expect_err("compile must fail");
    assert!(matches!(err, Error::UnboundVariable(ref name) if name == "y"));
}

#[test]
fn let_binding_is_not_visible_to_sibling_branch() {
    // x is bound only inside the consequent
    let err = compile_str("(if #t (let ((x 1)) x) x)").expect_err("compile must fail");
    assert!(matches!(err, Error::UnboundVariable(ref name) if name == "x"));
}

#[test]
fn wrong_arity_errors() {
    for src in ["(add1)", "(add1 1 2)", "(cons 1)", "(- 1 2 3)"] {
        let err = compile_str(src).expect_err("compile must fail");
        assert!(
            matches!(err, Error::UnsupportedExpression(_)),
            "{src}: unexpected {err}"
        );
    }
}

#[test]
fn malformed_forms_error() {
    for src in ["(if 1 2)", "(let ((x)) x)", "((car 1) 2)"] {
        let err = compile_str(src).expect_err("compile must fail");
        assert!(
            matches!(err, Error::UnsupportedExpression(_)),
            "{src}: unexpected {err}"
        );
    }
}

#[test]
fn unsupported_literal_errors() {
    let err = compile_str("\"hello\"").expect_err("compile must fail");
    assert!(matches!(err, Error::UnsupportedLiteral(_)));
}

#[test]
fn failure_keeps_already_emitted_code() {
    // compilation stops at the first error without rollback
    let mut cx = Compiler::new();
    let e = Expr::prim("+", vec![Expr::var("missing"), Expr::int(2)]);
    let err = cx.compile_expr(&e, 0, &Env::new()).unwrap_err();

    assert!(matches!(err, Error::UnboundVariable(_)));
    assert_eq!(cx.instrs().len(), 2);
}

#[test]
fn programs_built_in_code_report_the_same_errors() {
    let e = Expr::if_else(Expr::var("c"), Expr::int(1), Expr::int(2));
    assert!(matches!(
        compile_program(&e),
        Err(Error::UnboundVariable(ref name)) if name == "c"
    ));
}
