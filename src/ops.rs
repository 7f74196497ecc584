use std::collections::HashSet;

use rand::RngCore;
use rand::distr::{Distribution, Uniform};

use crate::ast::{Selector, SelectorKind, SetOp, SetOperator};
use crate::context::RollContext;
use crate::error::RollError;
use crate::expr::{DiceFace, Expr, ExprKind};

pub(crate) fn roll_die<R: RngCore>(
    face: &DiceFace,
    rng: &mut R,
    ctx: &mut RollContext,
) -> Result<f64, RollError> {
    ctx.count_roll(1)?;
    if face.percent {
        let dist = Uniform::new_inclusive(0u32, 9).expect("0..=9 is a valid range");
        Ok(dist.sample(rng) as f64 * 10.0)
    } else {
        if face.size < 1.0 {
            return Err(RollError::value("Cannot roll a 0-sided die."));
        }
        let dist = Uniform::new_inclusive(1u32, face.size as u32).expect("1..=size is valid");
        Ok(dist.sample(rng) as f64)
    }
}

fn select(target: &Expr, selectors: &[Selector], max: Option<usize>) -> Result<Vec<usize>, RollError> {
    let set = target.set();
    let mut chosen: Vec<usize> = Vec::new();
    for sel in selectors {
        let mut candidates: Vec<(usize, f64)> = Vec::new();
        for (i, c) in set.iter().enumerate() {
            if !c.kept {
                continue;
            }
            candidates.push((i, c.total()?));
        }
        let n = sel.n as f64;
        let mut batch: Vec<usize> = match sel.kind {
            SelectorKind::Highest => {
                let mut v = candidates.clone();
                v.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
                v.into_iter().take(sel.n.max(0) as usize).map(|(i, _)| i).collect()
            }
            SelectorKind::Lowest => {
                let mut v = candidates.clone();
                v.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
                v.into_iter().take(sel.n.max(0) as usize).map(|(i, _)| i).collect()
            }
            SelectorKind::GreaterThan => candidates.iter().filter(|(_, t)| *t > n).map(|(i, _)| *i).collect(),
            SelectorKind::LessThan => candidates.iter().filter(|(_, t)| *t < n).map(|(i, _)| *i).collect(),
            SelectorKind::Literal => candidates.iter().filter(|(_, t)| *t == n).map(|(i, _)| *i).collect(),
        };
        if let Some(m) = max {
            batch.truncate(m);
        }
        for i in batch {
            if !chosen.contains(&i) {
                chosen.push(i);
            }
        }
    }
    Ok(chosen)
}

fn values_ref(target: &Expr) -> &Vec<Expr> {
    match &target.kind {
        ExprKind::Set { values, .. } | ExprKind::Dice { values, .. } => values,
        _ => unreachable!("operators only ever apply to Set/Dice nodes"),
    }
}

fn values_mut(target: &mut Expr) -> &mut Vec<Expr> {
    match &mut target.kind {
        ExprKind::Set { values, .. } | ExprKind::Dice { values, .. } => values,
        _ => unreachable!("operators only ever apply to Set/Dice nodes"),
    }
}

fn ensure_dice(target: &Expr, op: &str) -> Result<(), RollError> {
    match &target.kind {
        ExprKind::Dice { .. } => Ok(()),
        _ => Err(RollError::value(format!("{op} can only be applied to dice"))),
    }
}

fn dice_face(target: &Expr) -> DiceFace {
    match &target.kind {
        ExprKind::Dice { face, .. } => *face,
        _ => unreachable!("caller already checked ensure_dice"),
    }
}

fn reroll_die<R: RngCore>(die: &mut Expr, rng: &mut R, ctx: &mut RollContext) -> Result<(), RollError> {
    let ExprKind::Die { face, values } = &mut die.kind else {
        unreachable!("select() only ever returns indices of Die children for dice operators");
    };
    values.last_mut().expect("Die never empty").kept = false;
    let v = roll_die(face, rng, ctx)?;
    values.push(Expr::literal(v));
    Ok(())
}

fn mark_exploded(die: &mut Expr) {
    if let ExprKind::Die { values, .. } = &mut die.kind {
        if let ExprKind::Literal { exploded, .. } = &mut values.last_mut().expect("Die never empty").kind {
            *exploded = true;
        }
    }
}

fn force_value(die: &mut Expr, n: f64) {
    if let ExprKind::Die { values, .. } = &mut die.kind {
        if let ExprKind::Literal { values: hist, .. } = &mut values.last_mut().expect("Die never empty").kind {
            hist.push(n);
        }
    }
}

fn push_die(target: &mut Expr, face: DiceFace, value: f64) {
    values_mut(target).push(Expr::new(ExprKind::Die {
        face,
        values: vec![Expr::literal(value)],
    }));
}

pub(crate) fn apply_operation<R: RngCore>(
    target: &mut Expr,
    op: &SetOperator,
    rng: &mut R,
    ctx: &mut RollContext,
) -> Result<(), RollError> {
    match op.op {
        SetOp::Keep => {
            let selected = select(target, &op.selectors, None)?;
            for (i, v) in values_mut(target).iter_mut().enumerate() {
                if v.kept {
                    v.kept = selected.contains(&i);
                }
            }
        }
        SetOp::Drop => {
            let selected = select(target, &op.selectors, None)?;
            for i in selected {
                values_mut(target)[i].kept = false;
            }
        }
        SetOp::RerollWhile => {
            ensure_dice(target, "rr")?;
            loop {
                let selected = select(target, &op.selectors, None)?;
                if selected.is_empty() {
                    break;
                }
                for i in selected {
                    reroll_die(&mut values_mut(target)[i], rng, ctx)?;
                }
            }
        }
        SetOp::RerollOnce => {
            ensure_dice(target, "ro")?;
            let selected = select(target, &op.selectors, None)?;
            for i in selected {
                reroll_die(&mut values_mut(target)[i], rng, ctx)?;
            }
        }
        SetOp::ExplodeOnce => {
            ensure_dice(target, "ra")?;
            let face = dice_face(target);
            let first_selector = std::slice::from_ref(&op.selectors[0]);
            let selected = select(target, first_selector, Some(1))?;
            for &i in &selected {
                mark_exploded(&mut values_mut(target)[i]);
            }
            for _ in 0..selected.len() {
                let v = roll_die(&face, rng, ctx)?;
                push_die(target, face, v);
            }
        }
        SetOp::ExplodeWhile => {
            ensure_dice(target, "e")?;
            let face = dice_face(target);
            let mut already = HashSet::new();
            loop {
                let selected = select(target, &op.selectors, None)?;
                let fresh: Vec<usize> = selected.into_iter().filter(|i| !already.contains(i)).collect();
                if fresh.is_empty() {
                    break;
                }
                for &i in &fresh {
                    mark_exploded(&mut values_mut(target)[i]);
                    already.insert(i);
                }
                for _ in 0..fresh.len() {
                    let v = roll_die(&face, rng, ctx)?;
                    push_die(target, face, v);
                }
            }
        }
        SetOp::Minimum | SetOp::Maximum => {
            ensure_dice(target, if op.op == SetOp::Minimum { "mi" } else { "ma" })?;
            let last = op
                .selectors
                .last()
                .ok_or_else(|| RollError::value("mi/ma requires a selector"))?;
            if last.kind != SelectorKind::Literal {
                return Err(RollError::value(
                    "mi/ma's selector must be a plain number, not a category",
                ));
            }
            let n = last.n as f64;
            let is_min = op.op == SetOp::Minimum;
            let indices: Vec<usize> = values_ref(target)
                .iter()
                .enumerate()
                .filter(|(_, v)| v.kept)
                .map(|(i, _)| i)
                .collect();
            for i in indices {
                let num = values_ref(target)[i].number()?;
                let should_clamp = if is_min { num < n } else { num > n };
                if should_clamp {
                    force_value(&mut values_mut(target)[i], n);
                }
            }
        }
    }
    Ok(())
}
