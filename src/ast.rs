//! AST data model: the pure syntactic tree produced by the parser.
//! Numeric values are not yet realized here, that happens in `expr`/`eval`.

use std::fmt;

/// A node in the dice-expression abstract syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Root: a roll plus an optional trailing free-text comment.
    Expression {
        roll: Box<Node>,
        comment: Option<String>,
    },
    /// A numeric literal.
    Literal(f64),
    /// `(e)`, always wraps exactly one inner node.
    Parenthetical(Box<Node>),
    /// A unary operation such as negation.
    UnOp { op: UnaryOp, operand: Box<Node> },
    /// A binary arithmetic or comparison operation.
    BinOp {
        left: Box<Node>,
        op: BinaryOp,
        right: Box<Node>,
    },
    /// `e [tag1][tag2]`, one or more bracketed free-text tags.
    Annotated {
        expr: Box<Node>,
        annotations: Vec<String>,
    },
    /// A comma-separated tuple `(a, b, c)`. A single-element tuple without a
    /// trailing comma is represented as `Parenthetical` instead (collapsed at
    /// parse time), so a bare `NumberSet` of length 1 only ever arises from
    /// an explicit trailing comma, e.g. `(1,)`.
    NumberSet(Vec<Node>),
    /// A `NumberSet` with keep/drop operations applied.
    OperatedSet {
        set: Box<Node>,
        operations: Vec<SetOperator>,
    },
    /// `NdS`. `num` is `None` for the implicit-one form (`d6`); `%` is a
    /// sentinel size yielding multiples of 10 in `[0, 90]` per die.
    Dice {
        num: Option<Box<Node>>,
        size: DiceSize,
    },
    /// A `Dice` with keep/drop/reroll/explode/clamp operations applied.
    OperatedDice {
        dice: Box<Node>,
        operations: Vec<SetOperator>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiceSize {
    Value(Box<Node>),
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    IntDivide,
    Modulo,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::IntDivide => "//",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
        }
    }

    /// True for `*`, `/`, `//`, `%`, the multiplicative tier, which
    /// `simplify_expr_annotations` skips when bubbling annotations into the
    /// right operand (doing so would change arithmetic semantics).
    pub fn is_multiplicative(self) -> bool {
        matches!(
            self,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::IntDivide | BinaryOp::Modulo
        )
    }
}

/// A selector chooses a subset of a target's `keptset` by comparing each
/// element's `total` against `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub kind: SelectorKind,
    pub n: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// *none* in the grammar: exact match (`total == n`).
    Literal,
    Highest,
    Lowest,
    GreaterThan,
    LessThan,
}

impl SelectorKind {
    pub(crate) fn prefix(self) -> &'static str {
        match self {
            SelectorKind::Literal => "",
            SelectorKind::Highest => "h",
            SelectorKind::Lowest => "l",
            SelectorKind::GreaterThan => ">",
            SelectorKind::LessThan => "<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Keep,
    Drop,
    RerollWhile,
    RerollOnce,
    ExplodeOnce,
    ExplodeWhile,
    Minimum,
    Maximum,
}

impl SetOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            SetOp::Keep => "k",
            SetOp::Drop => "p",
            SetOp::RerollWhile => "rr",
            SetOp::RerollOnce => "ro",
            SetOp::ExplodeOnce => "ra",
            SetOp::ExplodeWhile => "e",
            SetOp::Minimum => "mi",
            SetOp::Maximum => "ma",
        }
    }

    /// `mi`/`ma` never merge with an adjacent instance of themselves; every
    /// other operator does (`k1k2k3` simplifies to a single `k` carrying all
    /// three selectors).
    fn mergeable(self) -> bool {
        !matches!(self, SetOp::Minimum | SetOp::Maximum)
    }
}

/// One operator application with its (possibly merged) selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperator {
    pub op: SetOp,
    pub selectors: Vec<Selector>,
}

/// Appends `op` to `ops`, merging into the previous entry when both name the
/// same mergeable operator (`k1k2k3 ≡ k(1,2,3)`). This is the "simplified on
/// construction" invariant the parser relies on for every `set_op`/`dice_op`
/// list it builds.
pub fn push_operation(ops: &mut Vec<SetOperator>, op: SetOperator) {
    if op.op.mergeable() {
        if let Some(last) = ops.last_mut() {
            if last.op == op.op {
                last.selectors.extend(op.selectors);
                return;
            }
        }
    }
    ops.push(op);
}

fn fmt_ops(ops: &[SetOperator], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for op in ops {
        for sel in &op.selectors {
            write!(f, "{}{}{}", op.op.symbol(), sel.kind.prefix(), sel.n)?;
        }
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Expression { roll, comment } => {
                write!(f, "{roll}")?;
                if let Some(c) = comment {
                    write!(f, " {c}")?;
                }
                Ok(())
            }
            Node::Literal(v) => write!(f, "{v}"),
            Node::Parenthetical(inner) => write!(f, "({inner})"),
            Node::UnOp { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Node::BinOp { left, op, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Node::Annotated { expr, annotations } => {
                write!(f, "{expr}")?;
                for a in annotations {
                    write!(f, " [{a}]")?;
                }
                Ok(())
            }
            Node::NumberSet(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                if values.len() == 1 {
                    write!(f, "({},)", parts[0])
                } else {
                    write!(f, "({})", parts.join(", "))
                }
            }
            Node::OperatedSet { set, operations } => {
                write!(f, "{set}")?;
                fmt_ops(operations, f)
            }
            Node::Dice { num, size } => {
                if let Some(n) = num {
                    write!(f, "{n}")?;
                }
                write!(f, "d")?;
                match size {
                    DiceSize::Value(n) => write!(f, "{n}"),
                    DiceSize::Percent => write!(f, "%"),
                }
            }
            Node::OperatedDice { dice, operations } => {
                write!(f, "{dice}")?;
                fmt_ops(operations, f)
            }
        }
    }
}
