use rand::RngCore;

use crate::ast::{DiceSize, Node};
use crate::context::RollContext;
use crate::error::RollError;
use crate::expr::{DiceFace, Expr, ExprKind};
use crate::ops;

pub(crate) struct Evaluator<'a, R: RngCore> {
    rng: &'a mut R,
    ctx: &'a mut RollContext,
}

impl<'a, R: RngCore> Evaluator<'a, R> {
    pub fn new(rng: &'a mut R, ctx: &'a mut RollContext) -> Self {
        Evaluator { rng, ctx }
    }

    pub fn eval(&mut self, node: &Node) -> Result<Expr, RollError> {
        match node {
            Node::Expression { roll, comment } => {
                let roll = self.eval(roll)?;
                Ok(Expr::new(ExprKind::Expression {
                    roll: Box::new(roll),
                    comment: comment.clone(),
                }))
            }
            Node::Literal(v) => Ok(Expr::literal(*v)),
            Node::Parenthetical(inner) => {
                let value = self.eval(inner)?;
                Ok(Expr::new(ExprKind::Parenthetical {
                    value: Box::new(value),
                }))
            }
            Node::UnOp { op, operand } => {
                let operand = self.eval(operand)?;
                Ok(Expr::new(ExprKind::UnOp {
                    op: *op,
                    operand: Box::new(operand),
                }))
            }
            Node::BinOp { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(Expr::new(ExprKind::BinOp {
                    left: Box::new(left),
                    op: *op,
                    right: Box::new(right),
                }))
            }
            Node::Annotated { expr, annotations } => {
                let mut value = self.eval(expr)?;
                let tag: String = annotations.iter().map(|a| format!("[{a}]")).collect();
                value.annotation = Some(tag);
                Ok(value)
            }
            Node::NumberSet(values) => {
                let values = values.iter().map(|v| self.eval(v)).collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::new(ExprKind::Set {
                    values,
                    operations: Vec::new(),
                }))
            }
            Node::OperatedSet { set, operations } => self.eval_operated(set, operations),
            Node::Dice { num, size } => self.eval_dice(num.as_deref(), size),
            Node::OperatedDice { dice, operations } => self.eval_operated(dice, operations),
        }
    }

    fn eval_operated(
        &mut self,
        inner: &Node,
        operations: &[crate::ast::SetOperator],
    ) -> Result<Expr, RollError> {
        let mut target = self.eval(inner)?;
        let mut applied = Vec::with_capacity(operations.len());
        for op in operations {
            ops::apply_operation(&mut target, op, self.rng, self.ctx)?;
            applied.push(op.clone());
        }
        match &mut target.kind {
            ExprKind::Set { operations: field, .. } | ExprKind::Dice { operations: field, .. } => {
                *field = applied;
            }
            _ => unreachable!("eval() of a Set/Dice AST node always yields a Set/Dice expr node"),
        }
        Ok(target)
    }

    fn eval_dice(&mut self, num: Option<&Node>, size: &DiceSize) -> Result<Expr, RollError> {
        let count = match num {
            Some(n) => {
                let evaluated = self.eval(n)?;
                as_count(evaluated.total()?, "dice quantity")?
            }
            None => 1,
        };

        let face = match size {
            DiceSize::Percent => DiceFace::percent(),
            DiceSize::Value(n) => {
                let evaluated = self.eval(n)?;
                let size = evaluated.total()?;
                if size < 1.0 {
                    return Err(RollError::value("Cannot roll a 0-sided die."));
                }
                DiceFace::ordinary(size)
            }
        };

        let mut dice = Vec::with_capacity(count);
        for _ in 0..count {
            let v = ops::roll_die(&face, self.rng, self.ctx)?;
            dice.push(Expr::new(ExprKind::Die {
                face,
                values: vec![Expr::literal(v)],
            }));
        }

        Ok(Expr::new(ExprKind::Dice {
            num: count,
            face,
            values: dice,
            operations: Vec::new(),
        }))
    }
}

fn as_count(v: f64, what: &str) -> Result<usize, RollError> {
    if v < 0.0 {
        return Err(RollError::value(format!("{what} must be non-negative")));
    }
    Ok(v.round() as usize)
}

pub fn evaluate<R: RngCore>(ast: &Node, rng: &mut R, ctx: &mut RollContext) -> Result<Expr, RollError> {
    Evaluator::new(rng, ctx).eval(ast)
}
