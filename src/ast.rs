//! Abstract syntax tree for the expression language (component B).
//!
//! Node kinds follow §4.B exactly: `NumberLit`, `Name`, `QualifiedName`,
//! `Unary`, `Binary`, `NotOp`, `Call`, `Assign`. Every node carries a `Loc`
//! byte span into the original source so parse/eval errors can point back
//! at the offending text.

/// A byte-offset span into the source text an expression was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub start: usize,
    pub end: usize,
}

impl Loc {
    pub fn new(start: usize, end: usize) -> Self {
        Loc { start, end }
    }

    /// Spans from the start of `self` to the end of `other`.
    pub fn merge(self, other: Loc) -> Loc {
        Loc {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Arithmetic, comparison, and logical binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal, e.g. `1e-8`.
    NumberLit { value: f64, loc: Loc },

    /// A bare identifier resolved against the innermost scope layers.
    Name { name: String, loc: Loc },

    /// A dotted qualified name, currently only `global.X`, resolved
    /// against the segregated globals layer.
    QualifiedName {
        qualifier: String,
        name: String,
        loc: Loc,
    },

    /// A unary-prefixed expression (`-x`, `+x`).
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        loc: Loc,
    },

    /// A binary expression: arithmetic, comparison, or logical.
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        loc: Loc,
    },

    /// `not expr`.
    NotOp { operand: Box<Expr>, loc: Loc },

    /// `$ident(args...)`. The only recognised callee name is `random`.
    Call {
        name: String,
        args: Vec<Expr>,
        loc: Loc,
    },

    /// A parenthesised sub-expression, kept as its own node so the parser
    /// doesn't need to track precedence-reset context elsewhere.
    Paren { inner: Box<Expr>, loc: Loc },
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::NumberLit { loc, .. }
            | Expr::Name { loc, .. }
            | Expr::QualifiedName { loc, .. }
            | Expr::Unary { loc, .. }
            | Expr::Binary { loc, .. }
            | Expr::NotOp { loc, .. }
            | Expr::Call { loc, .. }
            | Expr::Paren { loc, .. } => *loc,
        }
    }
}

/// A statement, as accepted in exec/for-loop bodies (§4.B "Source forms
/// accepted as statements").
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A bare expression; its value is discarded.
    Expr(Expr),
    /// `IDENT = expr`; stores into the innermost scope layer.
    Assign {
        name: String,
        value: Expr,
        loc: Loc,
    },
}
