// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! x86-64 instruction set and emitter for inc.
//!
//! This module defines the small [`Instr`] enum the compiler
//! emits, its NASM text rendering, the append-only [`Emitter`]
//! sink and the [`LabelGen`] used for branch targets.
//!
//! Encoded words and tag masks render in hex (`0x1f`);
//! shift counts and pointer arithmetic render in decimal.

use std::fmt;

pub const ENTRY_SYMBOL: &str = "scheme_entry";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    Rax,
    Rsi,
    Rdi,
    Rsp,
    Al,
}

/// Memory operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mem {
    // [rsp-N], always written with the minus sign
    Stack(u32),
    // [reg], [reg+N] or [reg-N]
    Base(Reg, i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Mem(Mem),
    // tagged word or mask
    Imm(i64),
    // byte count or raw bit
    Lit(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(u32);

impl Label {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    Section(&'static str),
    Global(&'static str),
    Symbol(&'static str),
    Label(Label),
    Mov(Operand, Operand),
    Add(Operand, Operand),
    Sub(Operand, Operand),
    And(Operand, Operand),
    Or(Operand, Operand),
    Xor(Operand, Operand),
    Cmp(Operand, Operand),
    Shl(Reg, u8),
    Shr(Reg, u8),
    // sets the byte register from ZF
    Sete(Reg),
    Je(Label),
    Jmp(Label),
    Ret,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reg::Rax => "rax",
            Reg::Rsi => "rsi",
            Reg::Rdi => "rdi",
            Reg::Rsp => "rsp",
            Reg::Al => "al",
        })
    }
}

impl fmt::Display for Mem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Mem::Stack(si) => write!(f, "[{}-{si}]", Reg::Rsp),
            Mem::Base(r, 0) => write!(f, "[{r}]"),
            Mem::Base(r, d) if d > 0 => write!(f, "[{r}+{d}]"),
            Mem::Base(r, d) => write!(f, "[{r}-{}]", d.unsigned_abs()),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operand::Reg(r) => write!(f, "{r}"),
            Operand::Mem(m) => write!(f, "{m}"),
            Operand::Imm(v) if v < 0 => write!(f, "-{:#x}", v.unsigned_abs()),
            Operand::Imm(v) => write!(f, "{v:#x}"),
            Operand::Lit(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Section(name) => write!(f, "section {name}"),
            Instr::Global(name) => write!(f, "global {name}"),
            Instr::Symbol(name) => write!(f, "{name}:"),
            Instr::Label(l) => write!(f, "{l}:"),
            Instr::Mov(dst, src) => write!(f, "mov {dst}, {src}"),
            Instr::Add(dst, src) => write!(f, "add {dst}, {src}"),
            Instr::Sub(dst, src) => write!(f, "sub {dst}, {src}"),
            Instr::And(dst, src) => write!(f, "and {dst}, {src}"),
            Instr::Or(dst, src) => write!(f, "or {dst}, {src}"),
            Instr::Xor(dst, src) => write!(f, "xor {dst}, {src}"),
            Instr::Cmp(a, b) => write!(f, "cmp {a}, {b}"),
            Instr::Shl(r, bits) => write!(f, "shl {r}, {bits}"),
            Instr::Shr(r, bits) => write!(f, "shr {r}, {bits}"),
            Instr::Sete(r) => write!(f, "sete {r}"),
            Instr::Je(l) => write!(f, "je {l}"),
            Instr::Jmp(l) => write!(f, "jmp {l}"),
            Instr::Ret => f.write_str("ret"),
        }
    }
}

/// Append-only instruction sink.
#[derive(Debug, Default)]
pub struct Emitter {
    instrs: Vec<Instr>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    pub fn finalize(self) -> Vec<Instr> {
        self.instrs
    }
}

/// Source of branch labels unique within one run.
#[derive(Debug, Default)]
pub struct LabelGen {
    next: u32,
}

impl LabelGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> Label {
        let l = Label(self.next);
        self.next += 1;

        l
    }

    /// Number of labels handed out since the last reset.
    pub fn issued(&self) -> u32 {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_operands() {
        assert_eq!(Operand::Imm(0x9f).to_string(), "0x9f");
        assert_eq!(Operand::Imm(0).to_string(), "0x0");
        assert_eq!(Operand::Imm(-4).to_string(), "-0x4");
        assert_eq!(Operand::Lit(8).to_string(), "8");
        assert_eq!(Operand::Mem(Mem::Stack(0)).to_string(), "[rsp-0]");
        assert_eq!(Operand::Mem(Mem::Stack(12)).to_string(), "[rsp-12]");
        assert_eq!(Operand::Mem(Mem::Base(Reg::Rsi, 0)).to_string(), "[rsi]");
        assert_eq!(Operand::Mem(Mem::Base(Reg::Rsi, 4)).to_string(), "[rsi+4]");
        assert_eq!(Operand::Mem(Mem::Base(Reg::Rax, -1)).to_string(), "[rax-1]");
    }

    #[test]
    fn render_instrs() {
        let l = Label(3);
        assert_eq!(Instr::Label(l).to_string(), "L3:");
        assert_eq!(Instr::Je(l).to_string(), "je L3");
        assert_eq!(Instr::Sete(Reg::Al).to_string(), "sete al");
        assert_eq!(Instr::Shl(Reg::Rax, 7).to_string(), "shl rax, 7");
        assert_eq!(Instr::Symbol(ENTRY_SYMBOL).to_string(), "scheme_entry:");
        assert_eq!(
            Instr::Add(Operand::Reg(Reg::Rax), Operand::Mem(Mem::Stack(4))).to_string(),
            "add rax, [rsp-4]"
        );
    }

    #[test]
    fn labels_are_unique_until_reset() {
        let mut g = LabelGen::new();
        let a = g.fresh();
        let b = g.fresh();

        assert_ne!(a, b);
        assert_eq!(a.to_string(), "L0");
        assert_eq!(b.to_string(), "L1");
        assert_eq!(g.issued(), 2);

        g.reset();
        assert_eq!(g.fresh().to_string(), "L0");
    }

    #[test]
    fn emitter_appends_in_order() {
        let mut e = Emitter::new();
        assert!(e.is_empty());

        e.push(Instr::Ret);
        e.push(Instr::Section(".text"));

        assert_eq!(e.len(), 2);
        assert_eq!(e.finalize(), vec![Instr::Ret, Instr::Section(".text")]);
    }
}
