// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Primitive operation table.
//!
//! Each entry compiles its operands through the dispatcher
//! and then emits the operation itself on `rax`.

use crate::Error;
use crate::asm::{Instr, Mem, Operand, Reg};
use crate::compile::{Compiler, Env, HEAP_PTR, RAX, compile_expr};
use crate::expr::Expr;
use crate::value::{
    BOOL_MASK, BOOL_SHIFT, BOOL_TAG, CHAR_SHIFT, CHAR_TAG, FIXNUM_MASK, FIXNUM_SHIFT, Immediate,
    NIL_TAG, PAIR_SIZE, PAIR_TAG, WORD_SIZE,
};
use std::fmt;

type UnaryFn = fn(&mut Compiler, &Expr, u32, &Env) -> Result<(), Error>;
type BinaryFn = fn(&mut Compiler, &Expr, &Expr, u32, &Env) -> Result<(), Error>;

#[derive(Clone, Copy)]
pub enum Arity {
    Unary(UnaryFn),
    Binary(BinaryFn),
}

impl Arity {
    pub fn count(&self) -> usize {
        match self {
            Arity::Unary(_) => 1,
            Arity::Binary(_) => 2,
        }
    }
}

impl fmt::Debug for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Unary(_) => f.write_str("Unary"),
            Arity::Binary(_) => f.write_str("Binary"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Primitive {
    pub name: &'static str,
    pub arity: Arity,
}

pub static PRIMITIVES: &[Primitive] = &[
    Primitive { name: "add1", arity: Arity::Unary(prim_add1) },
    Primitive { name: "sub1", arity: Arity::Unary(prim_sub1) },
    Primitive { name: "integer->char", arity: Arity::Unary(prim_int_to_char) },
    Primitive { name: "char->integer", arity: Arity::Unary(prim_char_to_int) },
    Primitive { name: "zero?", arity: Arity::Unary(prim_zerop) },
    Primitive { name: "null?", arity: Arity::Unary(prim_nullp) },
    Primitive { name: "not", arity: Arity::Unary(prim_not) },
    Primitive { name: "integer?", arity: Arity::Unary(prim_integerp) },
    Primitive { name: "boolean?", arity: Arity::Unary(prim_booleanp) },
    Primitive { name: "+", arity: Arity::Binary(prim_plus) },
    Primitive { name: "-", arity: Arity::Binary(prim_minus) },
    Primitive { name: "cons", arity: Arity::Binary(prim_cons) },
    Primitive { name: "car", arity: Arity::Unary(prim_car) },
    Primitive { name: "cdr", arity: Arity::Unary(prim_cdr) },
];

pub fn lookup(name: &str) -> Option<&'static Primitive> {
    PRIMITIVES.iter().find(|p| p.name == name)
}

pub fn emit_primcall(
    cx: &mut Compiler,
    op: &str,
    args: &[Expr],
    si: u32,
    env: &Env,
) -> Result<(), Error> {
    let prim = lookup(op).ok_or_else(|| Error::UnknownPrimitive(op.to_string()))?;

    match (prim.arity, args) {
        (Arity::Unary(f), [arg]) => f(cx, arg, si, env),
        (Arity::Binary(f), [lhs, rhs]) => f(cx, lhs, rhs, si, env),
        (arity, _) => Err(Error::UnsupportedExpression(format!(
            "{op}: expects {} args, got {}",
            arity.count(),
            args.len()
        ))),
    }
}

fn imm(v: i64) -> Operand {
    Operand::Imm(v)
}

fn fixnum(n: i64) -> Operand {
    Operand::Imm(Immediate::Int(n).encode())
}

fn slot(si: u32) -> Operand {
    Operand::Mem(Mem::Stack(si))
}

// ZF -> #t / #f in rax
fn emit_bool_from_zf(cx: &mut Compiler) {
    cx.emit(Instr::Mov(RAX, imm(0)));
    cx.emit(Instr::Sete(Reg::Al));
    cx.emit(Instr::Shl(Reg::Rax, BOOL_SHIFT));
    cx.emit(Instr::Or(RAX, imm(BOOL_TAG)));
}

fn prim_add1(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::Add(RAX, fixnum(1)));

    Ok(())
}

fn prim_sub1(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::Sub(RAX, fixnum(1)));

    Ok(())
}

fn prim_int_to_char(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    // fixnums already carry a 2-bit shift
    cx.emit(Instr::Shl(Reg::Rax, CHAR_SHIFT - FIXNUM_SHIFT));
    cx.emit(Instr::Add(RAX, imm(CHAR_TAG)));

    Ok(())
}

fn prim_char_to_int(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::Shr(Reg::Rax, CHAR_SHIFT - FIXNUM_SHIFT));

    Ok(())
}

fn prim_zerop(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::Cmp(RAX, fixnum(0)));
    emit_bool_from_zf(cx);

    Ok(())
}

fn prim_nullp(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::Cmp(RAX, imm(NIL_TAG)));
    emit_bool_from_zf(cx);

    Ok(())
}

fn prim_not(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    // zero only for #f
    cx.emit(Instr::Xor(RAX, imm(BOOL_TAG)));
    emit_bool_from_zf(cx);

    Ok(())
}

fn prim_integerp(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::And(RAX, imm(FIXNUM_MASK)));
    cx.emit(Instr::Cmp(RAX, imm(0)));
    emit_bool_from_zf(cx);

    Ok(())
}

fn prim_booleanp(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::And(RAX, imm(BOOL_MASK)));
    cx.emit(Instr::Cmp(RAX, imm(BOOL_TAG)));
    emit_bool_from_zf(cx);

    Ok(())
}

// Right operand first into [rsp-si], then left one slot deeper.
fn emit_binop(
    cx: &mut Compiler,
    lhs: &Expr,
    rhs: &Expr,
    si: u32,
    env: &Env,
    op: fn(Operand, Operand) -> Instr,
) -> Result<(), Error> {
    compile_expr(cx, rhs, si, env)?;
    cx.emit(Instr::Mov(slot(si), RAX));
    compile_expr(cx, lhs, si + WORD_SIZE, env)?;
    cx.emit(op(RAX, slot(si)));

    Ok(())
}

fn prim_plus(cx: &mut Compiler, lhs: &Expr, rhs: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    emit_binop(cx, lhs, rhs, si, env, Instr::Add)
}

fn prim_minus(cx: &mut Compiler, lhs: &Expr, rhs: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    emit_binop(cx, lhs, rhs, si, env, Instr::Sub)
}

fn prim_cons(cx: &mut Compiler, car: &Expr, cdr: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    cx.metrics.inc_cons_sites();

    compile_expr(cx, car, si, env)?;
    cx.emit(Instr::Mov(Operand::Mem(Mem::Base(HEAP_PTR, 0)), RAX));
    compile_expr(cx, cdr, si, env)?;
    cx.emit(Instr::Mov(
        Operand::Mem(Mem::Base(HEAP_PTR, WORD_SIZE as i32)),
        RAX,
    ));
    cx.emit(Instr::Mov(RAX, Operand::Reg(HEAP_PTR)));
    cx.emit(Instr::Or(RAX, Operand::Lit(PAIR_TAG)));
    cx.emit(Instr::Add(Operand::Reg(HEAP_PTR), Operand::Lit(PAIR_SIZE)));

    Ok(())
}

// Field offsets are relative to the tagged pointer.
fn prim_car(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::Mov(
        RAX,
        Operand::Mem(Mem::Base(Reg::Rax, -(PAIR_TAG as i32))),
    ));

    Ok(())
}

fn prim_cdr(cx: &mut Compiler, arg: &Expr, si: u32, env: &Env) -> Result<(), Error> {
    compile_expr(cx, arg, si, env)?;
    cx.emit(Instr::Mov(
        RAX,
        Operand::Mem(Mem::Base(Reg::Rax, WORD_SIZE as i32 - PAIR_TAG as i32)),
    ));

    Ok(())
}
