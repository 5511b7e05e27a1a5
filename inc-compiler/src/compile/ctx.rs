// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

use crate::asm::{Emitter, Instr, Label, LabelGen};
use crate::expr::Expr;
use crate::{CompilerMetrics, Error, Program};

/// Lexical environment: variable name -> stack offset.
///
/// Extending never touches the parent, so sibling branches
/// cannot see each other's bindings.
#[derive(Clone, Debug, Default)]
pub struct Env {
    vars: im::HashMap<String, u32>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of `self` with `name` bound to `offset`,
    /// shadowing any earlier binding of the same name.
    #[must_use]
    pub fn bind(&self, name: &str, offset: u32) -> Env {
        Env {
            vars: self.vars.update(name.to_string(), offset),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.vars.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// State of one compilation run.
#[derive(Debug, Default)]
pub struct Compiler {
    emitter: Emitter,
    labels: LabelGen,
    pub(crate) metrics: CompilerMetrics,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `expr` with its value left in `rax`, taking
    /// stack slots from `si` upward.
    pub fn compile_expr(&mut self, expr: &Expr, si: u32, env: &Env) -> Result<(), Error> {
        super::compile_expr(self, expr, si, env)
    }

    pub fn compile_program(&mut self, expr: &Expr) -> Result<(), Error> {
        super::emit_program(self, expr)
    }

    /// Restart label numbering at `L0`.
    pub fn reset_labels(&mut self) {
        self.labels.reset();
    }

    pub fn instrs(&self) -> &[Instr] {
        self.emitter.instrs()
    }

    pub fn metrics(&self) -> &CompilerMetrics {
        &self.metrics
    }

    pub fn finish(self) -> Program {
        Program {
            instrs: self.emitter.finalize(),
            metrics: self.metrics,
        }
    }

    pub(crate) fn emit(&mut self, instr: Instr) {
        self.metrics.inc_instrs();
        self.emitter.push(instr);
    }

    pub(crate) fn fresh_label(&mut self) -> Label {
        self.metrics.inc_labels();
        self.labels.fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_does_not_touch_parent() {
        let root = Env::new().bind("x", 4);
        let left = root.bind("y", 8);
        let right = root.bind("x", 12);

        assert_eq!(root.lookup("x"), Some(4));
        assert_eq!(root.lookup("y"), None);
        assert_eq!(left.lookup("x"), Some(4));
        assert_eq!(left.lookup("y"), Some(8));
        assert_eq!(right.lookup("x"), Some(12));
        assert_eq!(right.lookup("y"), None);
        assert_eq!((root.len(), left.len(), right.len()), (1, 2, 1));
    }

    #[test]
    fn new_compiler_is_empty() {
        let c = Compiler::new();
        assert!(c.instrs().is_empty());
        assert_eq!(*c.metrics(), CompilerMetrics::default());
        assert!(Env::new().is_empty());
    }
}
