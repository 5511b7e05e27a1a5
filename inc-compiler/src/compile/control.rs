// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

use crate::Error;
use crate::asm::{Instr, Mem, Operand};
use crate::compile::{Compiler, Env, RAX, compile_expr};
use crate::expr::Expr;
use crate::value::{Immediate, WORD_SIZE};

/// Sequential `let`: each right-hand side sees only the
/// bindings before it, then lands in the next stack slot.
pub fn compile_let(
    cx: &mut Compiler,
    bindings: &[(String, Expr)],
    body: &Expr,
    si: u32,
    env: &Env,
) -> Result<(), Error> {
    let Some(((name, value), rest)) = bindings.split_first() else {
        return compile_expr(cx, body, si, env);
    };

    compile_expr(cx, value, si, env)?;
    cx.emit(Instr::Mov(Operand::Mem(Mem::Stack(si)), RAX));

    let env = env.bind(name, si);

    compile_let(cx, rest, body, si + WORD_SIZE, &env)
}

pub fn compile_if(
    cx: &mut Compiler,
    cond: &Expr,
    then: &Expr,
    alt: &Expr,
    si: u32,
    env: &Env,
) -> Result<(), Error> {
    let else_label = cx.fresh_label();
    let end_label = cx.fresh_label();

    compile_expr(cx, cond, si, env)?;
    // anything but #f takes the consequent
    cx.emit(Instr::Cmp(RAX, Operand::Imm(Immediate::Bool(false).encode())));
    cx.emit(Instr::Je(else_label));
    compile_expr(cx, then, si, env)?;
    cx.emit(Instr::Jmp(end_label));
    cx.emit(Instr::Label(else_label));
    compile_expr(cx, alt, si, env)?;
    cx.emit(Instr::Label(end_label));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_let(bindings: Vec<(&str, Expr)>, body: Expr) -> Result<String, Error> {
        let mut cx = Compiler::new();
        let e = Expr::let_in(bindings, body);
        compile_expr(&mut cx, &e, 0, &Env::new())?;

        Ok(cx.finish().to_string())
    }

    #[test]
    fn let_slots_grow_per_binding() {
        let asm = render_let(
            vec![("x", Expr::int(1)), ("y", Expr::int(2))],
            Expr::var("x"),
        )
        .unwrap();

        assert_eq!(
            asm,
            "mov rax, 0x4\n\
             mov [rsp-0], rax\n\
             mov rax, 0x8\n\
             mov [rsp-4], rax\n\
             mov rax, [rsp-0]\n"
        );
    }

    #[test]
    fn let_rhs_cannot_see_itself() {
        let err = render_let(vec![("x", Expr::var("x"))], Expr::var("x")).unwrap_err();
        assert!(matches!(err, Error::UnboundVariable(name) if name == "x"));
    }

    #[test]
    fn later_binding_shadows_earlier() {
        let asm = render_let(
            vec![("x", Expr::int(1)), ("x", Expr::int(2))],
            Expr::var("x"),
        )
        .unwrap();

        assert!(asm.ends_with("mov rax, [rsp-4]\n"));
    }

    #[test]
    fn empty_bindings_compile_body_directly() {
        let asm = render_let(vec![], Expr::int(7)).unwrap();
        assert_eq!(asm, "mov rax, 0x1c\n");
    }

    #[test]
    fn if_allocates_two_labels() {
        let mut cx = Compiler::new();
        compile_if(
            &mut cx,
            &Expr::bool(false),
            &Expr::int(1),
            &Expr::int(2),
            0,
            &Env::new(),
        )
        .unwrap();

        assert_eq!(cx.metrics().labels, 2);
        assert_eq!(
            cx.finish().to_string(),
            "mov rax, 0x1f\n\
             cmp rax, 0x1f\n\
             je L0\n\
             mov rax, 0x4\n\
             jmp L1\n\
             L0:\n\
             mov rax, 0x8\n\
             L1:\n"
        );
    }
}
