//! Tree utilities: advantage/disadvantage rewrite, generic tree
//! traversal, and annotation-aware simplification.

use crate::AdvType;
use crate::ast::{DiceSize, Node, Selector, SelectorKind, SetOp, SetOperator};
use crate::expr::{Expr, ExprKind};

// ---------------------------------------------------------------------
// Advantage / disadvantage rewrite. Operates on the AST, before evaluation.
// A shared-reference "copy the spine, alias the rest" scheme is implemented
// here simply as "copy the whole tree"; `Node` is small and has no interior
// mutability, so a full clone is equivalent to an aliased copy from the
// caller's point of view and far simpler in owned Rust than reference-
// counted copy-on-write.
pub fn ast_adv_copy(root: &Node, adv: AdvType) -> Node {
    if adv == AdvType::None {
        return root.clone();
    }
    rewrite_leftmost(root, adv)
}

fn is_1d20(num: &Option<Box<Node>>, size: &DiceSize) -> bool {
    let num_is_one = match num {
        None => true,
        Some(n) => matches!(n.as_ref(), Node::Literal(v) if *v == 1.0),
    };
    let size_is_20 = matches!(size, DiceSize::Value(s) if matches!(s.as_ref(), Node::Literal(v) if *v == 20.0));
    num_is_one && size_is_20
}

fn keep_one(adv: AdvType) -> SetOperator {
    let kind = if adv == AdvType::Adv {
        SelectorKind::Highest
    } else {
        SelectorKind::Lowest
    };
    SetOperator {
        op: SetOp::Keep,
        selectors: vec![Selector { kind, n: 1 }],
    }
}

fn rewrite_leftmost(node: &Node, adv: AdvType) -> Node {
    match node {
        Node::Expression { roll, comment } => Node::Expression {
            roll: Box::new(rewrite_leftmost(roll, adv)),
            comment: comment.clone(),
        },
        Node::Parenthetical(inner) => Node::Parenthetical(Box::new(rewrite_leftmost(inner, adv))),
        Node::UnOp { op, operand } => Node::UnOp {
            op: *op,
            operand: Box::new(rewrite_leftmost(operand, adv)),
        },
        Node::BinOp { left, op, right } => Node::BinOp {
            left: Box::new(rewrite_leftmost(left, adv)),
            op: *op,
            right: right.clone(),
        },
        Node::Annotated { expr, annotations } => Node::Annotated {
            expr: Box::new(rewrite_leftmost(expr, adv)),
            annotations: annotations.clone(),
        },
        Node::NumberSet(values) => {
            let mut values = values.clone();
            if let Some(first) = values.first().cloned() {
                values[0] = rewrite_leftmost(&first, adv);
            }
            Node::NumberSet(values)
        }
        Node::OperatedSet { set, operations } => Node::OperatedSet {
            set: Box::new(rewrite_leftmost(set, adv)),
            operations: operations.clone(),
        },
        Node::OperatedDice { dice, operations } => {
            if let Node::Dice { num, size } = dice.as_ref() {
                if is_1d20(num, size) {
                    let mut ops = operations.clone();
                    ops.insert(0, keep_one(adv));
                    return Node::OperatedDice {
                        dice: Box::new(Node::Dice {
                            num: Some(Box::new(Node::Literal(2.0))),
                            size: size.clone(),
                        }),
                        operations: ops,
                    };
                }
            }
            node.clone()
        }
        Node::Dice { num, size } => {
            if is_1d20(num, size) {
                Node::OperatedDice {
                    dice: Box::new(Node::Dice {
                        num: Some(Box::new(Node::Literal(2.0))),
                        size: size.clone(),
                    }),
                    operations: vec![keep_one(adv)],
                }
            } else {
                node.clone()
            }
        }
        Node::Literal(_) => node.clone(),
    }
}

// ---------------------------------------------------------------------
// Generic expression-tree utilities.

pub trait ChildMixin: Clone {
    fn children(&self) -> Vec<&Self>;
    fn with_children(&self, children: Vec<Self>) -> Self;
}

impl ChildMixin for Expr {
    fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Expression { roll, .. } => vec![roll],
            ExprKind::Literal { .. } => vec![],
            ExprKind::UnOp { operand, .. } => vec![operand],
            ExprKind::BinOp { left, right, .. } => vec![left, right],
            ExprKind::Parenthetical { value } => vec![value],
            ExprKind::Set { values, .. } | ExprKind::Dice { values, .. } | ExprKind::Die { values, .. } => {
                values.iter().collect()
            }
        }
    }

    fn with_children(&self, children: Vec<Expr>) -> Expr {
        let mut new = self.clone();
        let mut it = children.into_iter();
        match &mut new.kind {
            ExprKind::Expression { roll, .. } => *roll = Box::new(it.next().expect("1 child")),
            ExprKind::Literal { .. } => {}
            ExprKind::UnOp { operand, .. } => *operand = Box::new(it.next().expect("1 child")),
            ExprKind::BinOp { left, right, .. } => {
                *left = Box::new(it.next().expect("2 children"));
                *right = Box::new(it.next().expect("2 children"));
            }
            ExprKind::Parenthetical { value } => *value = Box::new(it.next().expect("1 child")),
            ExprKind::Set { values, .. } | ExprKind::Dice { values, .. } | ExprKind::Die { values, .. } => {
                *values = it.collect();
            }
        }
        new
    }
}

/// Returns a deep-mapped copy: every node is copy-then-recurse-then-apply
/// `f`, bottom-up. `node` is never mutated.
pub fn tree_map<T, F>(f: &mut F, node: &T) -> T
where
    T: ChildMixin,
    F: FnMut(T) -> T,
{
    let mapped: Vec<T> = node.children().into_iter().map(|c| tree_map(f, c)).collect();
    let rebuilt = node.with_children(mapped);
    f(rebuilt)
}

pub fn leftmost<T: ChildMixin>(root: &T) -> &T {
    match root.children().into_iter().next() {
        Some(first) => leftmost(first),
        None => root,
    }
}

pub fn rightmost<T: ChildMixin>(root: &T) -> &T {
    match root.children().into_iter().last() {
        Some(last) => rightmost(last),
        None => root,
    }
}

/// Depth-first, left-to-right; the first node satisfying `pred`, or `None`.
pub fn dfs<'a, T, P>(node: &'a T, pred: &P) -> Option<&'a T>
where
    T: ChildMixin,
    P: Fn(&T) -> bool,
{
    if pred(node) {
        return Some(node);
    }
    for child in node.children() {
        if let Some(found) = dfs(child, pred) {
            return Some(found);
        }
    }
    None
}

// ---------------------------------------------------------------------
// Annotation simplification

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbigInherit {
    None,
    Left,
    Right,
}

pub fn simplify_expr_annotations(expr: &Expr, ambig_inherit: AmbigInherit) -> Expr {
    let mut f = |node: Expr| bubble_annotations(node, ambig_inherit);
    tree_map(&mut f, expr)
}

fn child_annotation_slots(node: &mut Expr) -> Vec<&mut Option<String>> {
    match &mut node.kind {
        ExprKind::Expression { roll, .. } => vec![&mut roll.annotation],
        ExprKind::Literal { .. } => vec![],
        ExprKind::UnOp { operand, .. } => vec![&mut operand.annotation],
        ExprKind::BinOp { left, right, .. } => vec![&mut left.annotation, &mut right.annotation],
        ExprKind::Parenthetical { value } => vec![&mut value.annotation],
        ExprKind::Set { values, .. } | ExprKind::Dice { values, .. } | ExprKind::Die { values, .. } => {
            values.iter_mut().map(|v| &mut v.annotation).collect()
        }
    }
}

fn bubble_annotations(mut node: Expr, ambig_inherit: AmbigInherit) -> Expr {
    let mut seen: Vec<String> = Vec::new();
    for child in node.children() {
        if let Some(a) = &child.annotation {
            if !seen.contains(a) {
                seen.push(a.clone());
            }
        }
    }
    if let Some(a) = &node.annotation {
        if !seen.contains(a) {
            seen.push(a.clone());
        }
    }

    if seen.len() == 1 {
        node.annotation = Some(seen[0].clone());
        for slot in child_annotation_slots(&mut node) {
            *slot = None;
        }
    } else if seen.len() > 1 && ambig_inherit != AmbigInherit::None {
        let candidate = if ambig_inherit == AmbigInherit::Left {
            seen.first().cloned()
        } else {
            seen.last().cloned()
        };
        let skip_right = matches!(&node.kind, ExprKind::BinOp { op, .. } if op.is_multiplicative());
        let slots = child_annotation_slots(&mut node);
        let last_idx = slots.len().saturating_sub(1);
        for (i, slot) in slots.into_iter().enumerate() {
            if skip_right && i == last_idx && last_idx > 0 {
                continue;
            }
            if slot.is_none() {
                *slot = candidate.clone();
            }
        }
    }
    node
}

fn contains_annotation(node: &Expr) -> bool {
    node.annotation.is_some() || node.children().into_iter().any(contains_annotation)
}

fn collapse(node: &Expr, annotation: Option<String>) -> Expr {
    let total = node.total().unwrap_or(0.0);
    Expr {
        kept: node.kept,
        annotation,
        kind: ExprKind::Literal {
            values: vec![total],
            exploded: false,
        },
    }
}

fn do_simplify(node: &Expr, force: bool) -> Expr {
    if node.annotation.is_some() {
        return collapse(node, node.annotation.clone());
    }
    if force && !contains_annotation(node) {
        return collapse(node, None);
    }
    let children = node.children();
    if children.is_empty() {
        return node.clone();
    }
    let any_child_annotated = children.iter().any(|c| contains_annotation(c));
    let new_children: Vec<Expr> = children
        .iter()
        .map(|c| do_simplify(c, any_child_annotated))
        .collect();
    node.with_children(new_children)
}

/// Runs annotation simplification, then collapses every annotated subtree
/// into a bare `Literal(total, annotation)`; untagged sibling branches
/// collapse to `Literal(total)` too once any sibling has been replaced (or
/// at the root), so dice don't linger half-exploded next to a tag.
pub fn simplify_expr(expr: &Expr) -> Expr {
    let annotated = simplify_expr_annotations(expr, AmbigInherit::None);
    do_simplify(&annotated, true)
}
