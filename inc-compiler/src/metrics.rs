// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Lightweight metrics collected during compilation.
//!
//! [`CompilerMetrics`] tracks emitted code size, label and
//! stack usage, and heap allocation sites so tooling can
//! inspect compilation cost without internal state.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilerMetrics {
    pub instrs: u32,
    pub labels: u32,
    // highest stack index any sub-expression was compiled at
    pub peak_si: u32,
    pub cons_sites: u32,
}

impl CompilerMetrics {
    pub(crate) fn inc_instrs(&mut self) {
        self.instrs += 1;
    }

    pub(crate) fn inc_labels(&mut self) {
        self.labels += 1;
    }

    pub(crate) fn observe_si(&mut self, si: u32) {
        if si > self.peak_si {
            self.peak_si = si;
        }
    }

    pub(crate) fn inc_cons_sites(&mut self) {
        self.cons_sites += 1;
    }
}
