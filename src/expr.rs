//! Expression data model: the evaluated, stateful counterpart of the AST.
//! Every value-producing AST node has a mirror here that records every
//! roll, drop, reroll, and operator application performed against it.

use crate::ast::{BinaryOp, SetOperator, UnaryOp};
use crate::error::RollError;

/// One node of the evaluated expression tree. `kept` and `annotation` are
/// carried on every variant uniformly. A node with `kept = false`
/// contributes `0` to its parent's total but stays in the tree so the
/// stringifier can still render it (struck through).
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kept: bool,
    pub annotation: Option<String>,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Root.
    Expression {
        roll: Box<Expr>,
        comment: Option<String>,
    },
    /// A history of values; `mi`/`ma` clamps append without erasing prior
    /// ones. `number = values.last()`.
    Literal { values: Vec<f64>, exploded: bool },
    UnOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Parenthetical {
        value: Box<Expr>,
    },
    Set {
        values: Vec<Expr>,
        operations: Vec<SetOperator>,
    },
    Dice {
        num: usize,
        face: DiceFace,
        values: Vec<Expr>,
        operations: Vec<SetOperator>,
    },
    /// One die: a nonempty history of roll events. Each element is itself a
    /// `Literal` node; `reroll` appends a new one and marks the previous
    /// `kept = false`.
    Die {
        face: DiceFace,
        values: Vec<Expr>,
    },
}

/// A die's face: its display size, and whether it's the `%` sentinel (draws
/// uniformly from `{0, 10, ..., 90}` rather than `1..=size`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiceFace {
    pub size: f64,
    pub percent: bool,
}

impl DiceFace {
    pub fn ordinary(size: f64) -> Self {
        DiceFace { size, percent: false }
    }

    pub fn percent() -> Self {
        DiceFace { size: 100.0, percent: true }
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kept: true,
            annotation: None,
            kind,
        }
    }

    pub fn literal(value: f64) -> Self {
        Expr::new(ExprKind::Literal {
            values: vec![value],
            exploded: false,
        })
    }

    /// The raw numeric value of this node, ignoring *its own* `kept` flag
    /// but respecting every descendant's `kept` flag through their `total`.
    pub fn number(&self) -> Result<f64, RollError> {
        match &self.kind {
            ExprKind::Expression { roll, .. } => roll.total(),
            ExprKind::Literal { values, .. } => Ok(*values.last().expect("Literal never empty")),
            ExprKind::Die { values, .. } => values.last().expect("Die never empty").total(),
            ExprKind::Set { values, .. } | ExprKind::Dice { values, .. } => {
                let mut sum = 0.0;
                for v in values.iter().filter(|v| v.kept) {
                    sum += v.total()?;
                }
                Ok(sum)
            }
            ExprKind::Parenthetical { value } => value.total(),
            ExprKind::UnOp { op, operand } => {
                let v = operand.total()?;
                Ok(match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => -v,
                })
            }
            ExprKind::BinOp { left, op, right } => {
                let l = left.total()?;
                let r = right.total()?;
                apply_binop(l, *op, r)
            }
        }
    }

    /// `number()` if `kept`, else `0`.
    pub fn total(&self) -> Result<f64, RollError> {
        if !self.kept {
            return Ok(0.0);
        }
        self.number()
    }

    /// The child list a `SetOperator` selects from.
    pub fn set(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Expression { roll, .. } => roll.set(),
            ExprKind::Parenthetical { value } => value.set(),
            ExprKind::Set { values, .. } | ExprKind::Dice { values, .. } => values.iter().collect(),
            ExprKind::Die { values, .. } => vec![values.last().expect("Die never empty")],
            ExprKind::Literal { .. } | ExprKind::UnOp { .. } | ExprKind::BinOp { .. } => vec![self],
        }
    }

    pub fn keptset(&self) -> Vec<&Expr> {
        self.set().into_iter().filter(|c| c.kept).collect()
    }

    pub fn is_exploded(&self) -> bool {
        matches!(&self.kind, ExprKind::Literal { exploded, .. } if *exploded)
    }
}

pub(crate) fn apply_binop(l: f64, op: BinaryOp, r: f64) -> Result<f64, RollError> {
    use BinaryOp::*;
    Ok(match op {
        Add => l + r,
        Subtract => l - r,
        Multiply => l * r,
        Divide => {
            if r == 0.0 {
                return Err(RollError::value("Cannot divide by zero."));
            }
            l / r
        }
        IntDivide => {
            if r == 0.0 {
                return Err(RollError::value("Cannot divide by zero."));
            }
            (l / r).floor()
        }
        Modulo => {
            if r == 0.0 {
                return Err(RollError::value("Cannot modulo by zero."));
            }
            l.rem_euclid(r)
        }
        Equal => bool_to_f64(l == r),
        NotEqual => bool_to_f64(l != r),
        Greater => bool_to_f64(l > r),
        GreaterEqual => bool_to_f64(l >= r),
        Less => bool_to_f64(l < r),
        LessEqual => bool_to_f64(l <= r),
    })
}

fn bool_to_f64(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
