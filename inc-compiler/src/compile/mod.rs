// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Expression compiler.
//!
//! Walks an [`Expr`] and appends instructions to the run's
//! emitter. Each form leaves its value in `rax`. `si` is the
//! next free stack byte below `rsp`; it only grows while
//! descending and is passed by value, so siblings never
//! share mutable state.

pub mod ctx;

mod control;
mod prims;

pub use ctx::{Compiler, Env};
pub use prims::{Arity, PRIMITIVES, Primitive};

use crate::Error;
use crate::asm::{ENTRY_SYMBOL, Instr, Mem, Operand, Reg};
use crate::expr::Expr;
use crate::value::WORD_SIZE;
use tracing::{instrument, trace};

// accumulator
pub(crate) const RAX: Operand = Operand::Reg(Reg::Rax);
// bump allocation pointer
pub(crate) const HEAP_PTR: Reg = Reg::Rsi;

pub fn compile_expr(cx: &mut Compiler, expr: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    cx.metrics.observe_si(si);
    trace!(si, expr = %expr, "compile");

    match expr {
        Expr::Imm(imm) => {
            cx.emit(Instr::Mov(RAX, Operand::Imm(imm.encode())));
            Ok(())
        }
        Expr::PrimCall { op, args } => prims::emit_primcall(cx, op, args, si, env),
        Expr::Var(name) => {
            let offset = env
                .lookup(name)
                .ok_or_else(|| Error::UnboundVariable(name.clone()))?;

            cx.emit(Instr::Mov(RAX, Operand::Mem(Mem::Stack(offset))));
            Ok(())
        }
        Expr::Let { bindings, body } => control::compile_let(cx, bindings, body, si, env),
        Expr::If { cond, then, alt } => control::compile_if(cx, cond, then, alt, si, env),
    }
}

#[instrument(level = "debug", skip_all)]
pub(crate) fn emit_program(cx: &mut Compiler, expr: &Expr) -> Result<(), Error> {
    cx.emit(Instr::Section(".text"));
    cx.emit(Instr::Global(ENTRY_SYMBOL));
    cx.emit(Instr::Symbol(ENTRY_SYMBOL));
    // heap base arrives as the first argument
    cx.emit(Instr::Mov(Operand::Reg(HEAP_PTR), Operand::Reg(Reg::Rdi)));

    // [rsp-0] holds the return address
    compile_expr(cx, expr, WORD_SIZE, &Env::new())?;

    cx.emit(Instr::Ret);

    Ok(())
}
