// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Tagged machine-word encoding of immediate values.
//!
//! ```text
//! fixnum   nnnn...nn00            n << 2
//! char     cccc...cccc 0000_1111  c << 8 | 0x0f
//! boolean  b000_0000 | 001_1111   b << 7 | 0x1f
//! nil      0010_1111              0x2f
//! pair     pppp...p001            heap address | 1
//! ```
//!
//! The masks are chosen so no two classes share a pattern;
//! every primitive that branches on type relies on that.

use crate::Error;
use crate::reader::{Ast, Atom};
use std::fmt;

pub const FIXNUM_SHIFT: u8 = 2;
pub const FIXNUM_MASK: i64 = 0b11;

pub const CHAR_SHIFT: u8 = 8;
pub const CHAR_TAG: i64 = 0b0000_1111;
pub const CHAR_MASK: i64 = 0b1111_1111;

pub const BOOL_SHIFT: u8 = 7;
pub const BOOL_TAG: i64 = 0b001_1111;
pub const BOOL_MASK: i64 = 0b111_1111;

pub const NIL_TAG: i64 = 0b0010_1111;

pub const PAIR_TAG: i64 = 0b1;
pub const HEAP_OBJECT_MASK: i64 = 0b111;

/// Byte spacing of stack slots and pair fields.
pub const WORD_SIZE: u32 = 4;

/// Heap bytes consumed by one `cons`.
///
/// Twice the 4-byte field unit while registers are 8 bytes
/// wide; kept as is because emitted code depends on it.
pub const PAIR_SIZE: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    Int(i64),
    Bool(bool),
    Char(char),
    Nil,
}

/// Value class recovered from a tagged word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Fixnum,
    Boolean,
    Char,
    Nil,
    Pair,
}

impl Immediate {
    /// Integers wider than 62 bits lose their top bits.
    pub fn encode(self) -> i64 {
        match self {
            Immediate::Int(n) => n << FIXNUM_SHIFT,
            Immediate::Bool(b) => (i64::from(b) << BOOL_SHIFT) | BOOL_TAG,
            Immediate::Char(c) => (i64::from(u32::from(c)) << CHAR_SHIFT) | CHAR_TAG,
            Immediate::Nil => NIL_TAG,
        }
    }
}

impl TryFrom<&Ast> for Immediate {
    type Error = Error;

    fn try_from(ast: &Ast) -> Result<Self, Error> {
        match ast {
            Ast::Atom(Atom::Int(n)) => Ok(Immediate::Int(*n)),
            Ast::Atom(Atom::Bool(b)) => Ok(Immediate::Bool(*b)),
            Ast::Atom(Atom::Char(c)) => Ok(Immediate::Char(*c)),
            Ast::Atom(Atom::Str(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Immediate::Char(c)),
                    _ => Err(Error::UnsupportedLiteral(ast.to_string())),
                }
            }
            Ast::List(items) if items.is_empty() => Ok(Immediate::Nil),
            _ => Err(Error::UnsupportedLiteral(ast.to_string())),
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int(n) => write!(f, "{n}"),
            Immediate::Bool(true) => f.write_str("#t"),
            Immediate::Bool(false) => f.write_str("#f"),
            Immediate::Char(c) => write!(f, "#\\{c}"),
            Immediate::Nil => f.write_str("()"),
        }
    }
}

/// Encode a literal datum.
pub fn encode(ast: &Ast) -> Result<i64, Error> {
    Immediate::try_from(ast).map(Immediate::encode)
}

/// Classify a tagged word by the masks above.
pub fn classify(word: i64) -> Option<ValueClass> {
    if word & FIXNUM_MASK == 0 {
        Some(ValueClass::Fixnum)
    } else if word & BOOL_MASK == BOOL_TAG {
        Some(ValueClass::Boolean)
    } else if word & CHAR_MASK == CHAR_TAG {
        Some(ValueClass::Char)
    } else if word == NIL_TAG {
        Some(ValueClass::Nil)
    } else if word & HEAP_OBJECT_MASK == PAIR_TAG {
        Some(ValueClass::Pair)
    } else {
        None
    }
}
