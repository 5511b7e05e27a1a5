// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Incremental compiler from a tiny tagged s-expression
//! language to x86-64 assembly text.
//!
//! Every runtime value lives in one machine word with a
//! low-bit type tag (see [`value`]). Compilation is a direct
//! recursive walk from [`Expr`] to [`asm::Instr`]: no IR, no
//! optimization pass and no type checking. The result of each
//! expression is left in `rax`, locals live at negative
//! offsets from `rsp` and pairs are bump-allocated from `rsi`.

pub mod asm;
pub mod compile;
pub mod expr;
pub mod reader;
pub mod value;

mod metrics;

pub use compile::{Compiler, Env};
pub use expr::Expr;
pub use metrics::CompilerMetrics;
pub use value::Immediate;

use asm::Instr;
use std::fmt;
use std::io;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum Error {
    #[error("lex: invalid char '{0}' at {1}")]
    Lex(char, usize),
    #[error("parse: unexpected EOF")]
    Eof,
    #[error("parse: unmatched ')'")]
    Unmatched,
    #[error("parse: trailing input after '{0}'")]
    Trailing(String),
    #[error("limit: {0}")]
    Limit(&'static str),
    #[error("encode: unsupported literal '{0}'")]
    UnsupportedLiteral(String),
    #[error("compile: unsupported expression '{0}'")]
    UnsupportedExpression(String),
    #[error("compile: unknown primitive '{0}'")]
    UnknownPrimitive(String),
    #[error("compile: unbound variable '{0}'")]
    UnboundVariable(String),
}

/// Assembly produced by one compilation run.
#[derive(Clone, Debug)]
pub struct Program {
    pub instrs: Vec<Instr>,
    pub metrics: CompilerMetrics,
}

impl Program {
    pub fn to_asm(&self) -> String {
        self.to_string()
    }

    pub fn write_to<W: io::Write>(&self, mut w: W) -> io::Result<()> {
        for instr in &self.instrs {
            writeln!(w, "{instr}")?;
        }

        w.flush()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instrs {
            writeln!(f, "{instr}")?;
        }

        Ok(())
    }
}

/// Compile `expr` as a whole program: entry prologue,
/// body at the first stack slot, `ret`.
pub fn compile_program(expr: &Expr) -> Result<Program, Error> {
    let mut compiler = Compiler::new();
    compiler.compile_program(expr)?;

    Ok(compiler.finish())
}

/// Read one datum from `src` and compile it as a program.
#[instrument(level = "info", skip(src))]
pub fn compile_str(src: &str) -> Result<Program, Error> {
    let ast = reader::read(src)?;
    debug!(datum = %ast, "read");

    let expr = Expr::from_ast(&ast)?;
    debug!("classified");

    let program = compile_program(&expr)?;

    debug!(
        instrs = program.metrics.instrs,
        labels = program.metrics.labels,
        peak_si = program.metrics.peak_si,
        "compiled"
    );

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_str_wraps_body_in_entry() {
        let p = compile_str("(add1 41)").unwrap();
        let asm = p.to_asm();

        assert!(asm.starts_with("section .text\nglobal scheme_entry\nscheme_entry:\nmov rsi, rdi\n"));
        assert!(asm.ends_with("add rax, 0x4\nret\n"));
    }

    #[test]
    fn write_to_matches_display() {
        let p = compile_str("(cons 1 ())").unwrap();
        let mut buf = Vec::new();
        p.write_to(&mut buf).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), p.to_string());
    }

    #[test]
    fn compile_str_surfaces_reader_errors() {
        assert!(matches!(compile_str("(add1 1"), Err(Error::Eof)));
        assert!(matches!(compile_str(")"), Err(Error::Unmatched)));
        assert!(matches!(compile_str("1 2"), Err(Error::Trailing(_))));
    }

    #[test]
    fn error_messages_name_the_phase() {
        let err = compile_str("(frobnicate 1)").unwrap_err();
        assert_eq!(err.to_string(), "compile: unknown primitive 'frobnicate'");

        let err = compile_str("y").unwrap_err();
        assert_eq!(err.to_string(), "compile: unbound variable 'y'");
    }
}
