//! Stringifiers: render an evaluated expression tree bottom-up.

use crate::expr::{Expr, ExprKind};

fn fmt_ops(operations: &[crate::ast::SetOperator]) -> String {
    let mut out = String::new();
    for op in operations {
        for sel in &op.selectors {
            out.push_str(op.op.symbol());
            out.push_str(sel.kind.prefix());
            out.push_str(&sel.n.to_string());
        }
    }
    out
}

/// Shared contract: every implementor supplies `_str_*` per variant;
/// `stringify`/`_stringify` handle dispatch and annotation suffixing.
pub trait Stringifier {
    fn stringify(&mut self, node: &Expr) -> String {
        self.render(node)
    }

    fn render(&mut self, node: &Expr) -> String {
        let inside = self.render_inner(node);
        match &node.annotation {
            Some(a) => format!("{inside} {a}"),
            None => inside,
        }
    }

    fn render_inner(&mut self, node: &Expr) -> String {
        match &node.kind {
            ExprKind::Expression { .. } => self.str_expression(node),
            ExprKind::Literal { .. } => self.str_literal(node),
            ExprKind::UnOp { .. } => self.str_unop(node),
            ExprKind::BinOp { .. } => self.str_binop(node),
            ExprKind::Parenthetical { .. } => self.str_parenthetical(node),
            ExprKind::Set { .. } => self.str_set(node),
            ExprKind::Dice { .. } => self.str_dice(node),
            ExprKind::Die { .. } => self.str_die(node),
        }
    }

    fn str_expression(&mut self, node: &Expr) -> String;
    fn str_literal(&mut self, node: &Expr) -> String;
    fn str_unop(&mut self, node: &Expr) -> String;
    fn str_binop(&mut self, node: &Expr) -> String;
    fn str_parenthetical(&mut self, node: &Expr) -> String;
    fn str_set(&mut self, node: &Expr) -> String;
    fn str_dice(&mut self, node: &Expr) -> String;
    fn str_die(&mut self, node: &Expr) -> String;
}

/// Plain-text renderer: no markup, just the arithmetic trace.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleStringifier;

impl Stringifier for SimpleStringifier {
    fn str_expression(&mut self, node: &Expr) -> String {
        let ExprKind::Expression { roll, .. } = &node.kind else { unreachable!() };
        format!("{} = {}", self.render(roll), roll.total().unwrap_or(0.0) as i64)
    }

    fn str_literal(&mut self, node: &Expr) -> String {
        let ExprKind::Literal { values, exploded } = &node.kind else { unreachable!() };
        let history = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" -> ");
        if *exploded { format!("{history}!") } else { history }
    }

    fn str_unop(&mut self, node: &Expr) -> String {
        let ExprKind::UnOp { op, operand } = &node.kind else { unreachable!() };
        format!("{}{}", op.symbol(), self.render(operand))
    }

    fn str_binop(&mut self, node: &Expr) -> String {
        let ExprKind::BinOp { left, op, right } = &node.kind else { unreachable!() };
        format!("{} {} {}", self.render(left), op.symbol(), self.render(right))
    }

    fn str_parenthetical(&mut self, node: &Expr) -> String {
        let ExprKind::Parenthetical { value } = &node.kind else { unreachable!() };
        format!("({})", self.render(value))
    }

    fn str_set(&mut self, node: &Expr) -> String {
        let ExprKind::Set { values, operations } = &node.kind else { unreachable!() };
        let inner: Vec<String> = values.iter().map(|v| self.render(v)).collect();
        if values.len() == 1 {
            format!("({},){}", inner[0], fmt_ops(operations))
        } else {
            format!("({}){}", inner.join(", "), fmt_ops(operations))
        }
    }

    fn str_dice(&mut self, node: &Expr) -> String {
        let ExprKind::Dice { num, face, values, operations } = &node.kind else { unreachable!() };
        let size = if face.percent { "%".to_string() } else { (face.size as i64).to_string() };
        let dice: Vec<String> = values.iter().map(|d| self.render(d)).collect();
        format!("{num}d{size}{} ({})", fmt_ops(operations), dice.join(", "))
    }

    fn str_die(&mut self, node: &Expr) -> String {
        let ExprKind::Die { values, .. } = &node.kind else { unreachable!() };
        values.iter().map(|v| self.render(v)).collect::<Vec<_>>().join(", ")
    }
}

/// Markdown renderer: strikes through dropped subtrees, backticks the
/// total, and bolds natural min/max die faces.
#[derive(Debug, Default)]
pub struct MarkdownStringifier {
    in_dropped: bool,
}

impl MarkdownStringifier {
    pub fn new() -> Self {
        MarkdownStringifier { in_dropped: false }
    }
}

impl Stringifier for MarkdownStringifier {
    fn stringify(&mut self, node: &Expr) -> String {
        self.in_dropped = false;
        self.render(node)
    }

    fn render(&mut self, node: &Expr) -> String {
        if !node.kept && !self.in_dropped {
            self.in_dropped = true;
            let inside = self.render_plain(node);
            self.in_dropped = false;
            format!("~~{inside}~~")
        } else {
            self.render_plain(node)
        }
    }

    fn str_expression(&mut self, node: &Expr) -> String {
        let ExprKind::Expression { roll, .. } = &node.kind else { unreachable!() };
        format!("{} = `{}`", self.render(roll), roll.total().unwrap_or(0.0) as i64)
    }

    fn str_literal(&mut self, node: &Expr) -> String {
        SimpleStringifier.str_literal(node)
    }

    fn str_unop(&mut self, node: &Expr) -> String {
        let ExprKind::UnOp { op, operand } = &node.kind else { unreachable!() };
        format!("{}{}", op.symbol(), self.render(operand))
    }

    fn str_binop(&mut self, node: &Expr) -> String {
        let ExprKind::BinOp { left, op, right } = &node.kind else { unreachable!() };
        format!("{} {} {}", self.render(left), op.symbol(), self.render(right))
    }

    fn str_parenthetical(&mut self, node: &Expr) -> String {
        let ExprKind::Parenthetical { value } = &node.kind else { unreachable!() };
        format!("({})", self.render(value))
    }

    fn str_set(&mut self, node: &Expr) -> String {
        let ExprKind::Set { values, operations } = &node.kind else { unreachable!() };
        let inner: Vec<String> = values.iter().map(|v| self.render(v)).collect();
        if values.len() == 1 {
            format!("({},){}", inner[0], fmt_ops(operations))
        } else {
            format!("({}){}", inner.join(", "), fmt_ops(operations))
        }
    }

    fn str_dice(&mut self, node: &Expr) -> String {
        let ExprKind::Dice { num, face, values, operations } = &node.kind else { unreachable!() };
        let size = if face.percent { "%".to_string() } else { (face.size as i64).to_string() };
        let dice: Vec<String> = values.iter().map(|d| self.render(d)).collect();
        format!("{num}d{size}{} ({})", fmt_ops(operations), dice.join(", "))
    }

    fn str_die(&mut self, node: &Expr) -> String {
        let ExprKind::Die { values, face } = &node.kind else { unreachable!() };
        values
            .iter()
            .map(|v| {
                let inside = self.render(v);
                let number = v.number().unwrap_or(f64::NAN);
                if number == 1.0 || number == face.size {
                    format!("**{inside}**")
                } else {
                    inside
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl MarkdownStringifier {
    fn render_plain(&mut self, node: &Expr) -> String {
        let inside = self.render_inner(node);
        match &node.annotation {
            Some(a) => format!("{inside} {a}"),
            None => inside,
        }
    }
}
