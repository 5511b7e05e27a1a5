// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Source expressions accepted by the compiler.

use crate::Error;
use crate::reader::{Ast, Atom};
use crate::value::Immediate;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Imm(Immediate),
    PrimCall {
        op: String,
        args: Vec<Expr>,
    },
    Var(String),
    // bindings are sequential, left to right
    Let {
        bindings: Vec<(String, Expr)>,
        body: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        alt: Box<Expr>,
    },
}

impl Expr {
    pub fn int(n: i64) -> Self {
        Expr::Imm(Immediate::Int(n))
    }

    pub fn bool(b: bool) -> Self {
        Expr::Imm(Immediate::Bool(b))
    }

    pub fn char(c: char) -> Self {
        Expr::Imm(Immediate::Char(c))
    }

    pub fn nil() -> Self {
        Expr::Imm(Immediate::Nil)
    }

    pub fn var(name: &str) -> Self {
        Expr::Var(name.to_string())
    }

    pub fn prim(op: &str, args: Vec<Expr>) -> Self {
        Expr::PrimCall {
            op: op.to_string(),
            args,
        }
    }

    pub fn let_in(bindings: Vec<(&str, Expr)>, body: Expr) -> Self {
        Expr::Let {
            bindings: bindings
                .into_iter()
                .map(|(name, e)| (name.to_string(), e))
                .collect(),
            body: Box::new(body),
        }
    }

    pub fn if_else(cond: Expr, then: Expr, alt: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            alt: Box::new(alt),
        }
    }

    /// Classify a datum into one of the five expression shapes.
    ///
    /// Operator names are not checked here; an unknown head
    /// surfaces as `UnknownPrimitive` once compiled.
    pub fn from_ast(ast: &Ast) -> Result<Self, Error> {
        match ast {
            Ast::Atom(Atom::Sym(s)) => Ok(Expr::Var(s.clone())),
            Ast::Atom(_) => Immediate::try_from(ast).map(Expr::Imm),
            Ast::List(items) if items.is_empty() => Ok(Expr::Imm(Immediate::Nil)),
            Ast::List(items) => match items.as_slice() {
                [Ast::Atom(Atom::Sym(head)), rest @ ..] => match head.as_str() {
                    "let" => let_from_ast(ast, rest),
                    "if" => if_from_ast(ast, rest),
                    _ => {
                        let args = rest
                            .iter()
                            .map(Expr::from_ast)
                            .collect::<Result<Vec<_>, _>>()?;

                        Ok(Expr::PrimCall {
                            op: head.clone(),
                            args,
                        })
                    }
                },
                _ => Err(Error::UnsupportedExpression(ast.to_string())),
            },
        }
    }
}

fn let_from_ast(ast: &Ast, rest: &[Ast]) -> Result<Expr, Error> {
    // (let ((x expr) (y expr)) body)
    let [Ast::List(pairs), body] = rest else {
        return Err(Error::UnsupportedExpression(ast.to_string()));
    };

    let mut bindings = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match pair {
            Ast::List(kv) => match kv.as_slice() {
                [Ast::Atom(Atom::Sym(name)), value] => {
                    bindings.push((name.clone(), Expr::from_ast(value)?));
                }
                _ => return Err(Error::UnsupportedExpression(ast.to_string())),
            },
            _ => return Err(Error::UnsupportedExpression(ast.to_string())),
        }
    }

    Ok(Expr::Let {
        bindings,
        body: Box::new(Expr::from_ast(body)?),
    })
}

fn if_from_ast(ast: &Ast, rest: &[Ast]) -> Result<Expr, Error> {
    let [cond, then, alt] = rest else {
        return Err(Error::UnsupportedExpression(ast.to_string()));
    };

    Ok(Expr::if_else(
        Expr::from_ast(cond)?,
        Expr::from_ast(then)?,
        Expr::from_ast(alt)?,
    ))
}

impl TryFrom<&Ast> for Expr {
    type Error = Error;

    fn try_from(ast: &Ast) -> Result<Self, Error> {
        Expr::from_ast(ast)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Imm(imm) => write!(f, "{imm}"),
            Expr::Var(name) => f.write_str(name),
            Expr::PrimCall { op, args } => {
                write!(f, "({op}")?;
                for a in args {
                    write!(f, " {a}")?;
                }
                f.write_str(")")
            }
            Expr::Let { bindings, body } => {
                f.write_str("(let (")?;
                for (i, (name, e)) in bindings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "({name} {e})")?;
                }
                write!(f, ") {body})")
            }
            Expr::If { cond, then, alt } => write!(f, "(if {cond} {then} {alt})"),
        }
    }
}
