#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![forbid(unsafe_code)]

mod ast;
mod cache;
mod context;
mod error;
mod eval;
mod expr;
mod lexer;
mod ops;
mod parser;
mod stringify;
mod token;
mod util;

use std::cell::RefCell;

pub use crate::ast::{BinaryOp, Node, Selector, SelectorKind, SetOp, SetOperator, UnaryOp};
pub use crate::context::RollContext;
pub use crate::error::RollError;
pub use crate::eval::evaluate;
pub use crate::expr::{DiceFace, Expr, ExprKind};
pub use crate::stringify::{MarkdownStringifier, SimpleStringifier, Stringifier};
pub use crate::util::{
    ast_adv_copy, dfs, leftmost, rightmost, simplify_expr, simplify_expr_annotations, tree_map,
    AmbigInherit, ChildMixin,
};

/// Which side of an advantage/disadvantage rewrite to apply: a bare
/// leftmost `1d20` becomes `2d20kh1` or `2d20kl1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvType {
    None,
    Adv,
    Dis,
}

/// Crit/fail detection on the leftmost `1d20` in a rolled expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CritType {
    None,
    Crit,
    Fail,
}

/// What a `roll()` call starts from: raw text (parsed fresh, through the
/// parse cache when comments aren't requested) or an already-built AST, for
/// example the result of a prior `.parse()` or a hand-rolled `ast_adv_copy`.
pub enum RollSource {
    Text(String),
    Ast(Node),
}

impl From<&str> for RollSource {
    fn from(s: &str) -> Self {
        RollSource::Text(s.to_string())
    }
}

impl From<String> for RollSource {
    fn from(s: String) -> Self {
        RollSource::Text(s)
    }
}

impl From<Node> for RollSource {
    fn from(n: Node) -> Self {
        RollSource::Ast(n)
    }
}

/// Defaults a `Roller` falls back on when `roll()` is called without an
/// explicit override.
#[derive(Debug, Clone, Copy)]
pub struct RollConfig {
    pub max_rolls: usize,
    pub allow_comments: bool,
    pub advantage: AdvType,
}

impl Default for RollConfig {
    fn default() -> Self {
        RollConfig {
            max_rolls: RollContext::DEFAULT_MAX_ROLLS,
            allow_comments: false,
            advantage: AdvType::None,
        }
    }
}

impl RollConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The outcome of a single `roll()` call: the parsed AST, the evaluated
/// expression tree, the rendered string, the numeric total, any trailing
/// comment, and crit/fail detection on a natural `1d20`.
#[derive(Debug, Clone)]
pub struct RollResult {
    pub ast: Node,
    pub expr: Expr,
    pub comment: Option<String>,
    pub total: i64,
    pub result: String,
    pub crit: CritType,
}

/// Parses and rolls dice expressions. Owns a roll-budget counter and a parse
/// cache, so a `Roller` is not safe to share across threads; keep one per
/// thread (the package-level `roll`/`parse` functions do exactly this).
pub struct Roller {
    config: RollConfig,
    ctx: RollContext,
    cache: cache::ParseCache,
}

impl Roller {
    pub fn new(config: RollConfig) -> Self {
        Roller {
            ctx: RollContext::new(config.max_rolls),
            cache: cache::ParseCache::new(),
            config,
        }
    }

    /// Parses `expr` into an AST. Non-comment parses go through the LFU
    /// cache; `allow_comments` parses always run fresh, since a trailing
    /// comment is free text that defeats normalization.
    pub fn parse(&mut self, expr: &str, allow_comments: bool) -> Result<Node, RollError> {
        if allow_comments {
            return parser::parse(expr, true);
        }
        if let Some(cached) = self.cache.get(expr) {
            return Ok(cached);
        }
        let ast = parser::parse(expr, false)?;
        self.cache.insert(expr, ast.clone());
        Ok(ast)
    }

    /// Rolls `source`, using this `Roller`'s configured defaults for
    /// comments, advantage, and a Markdown rendering.
    pub fn roll(&mut self, source: impl Into<RollSource>) -> Result<RollResult, RollError> {
        let allow_comments = self.config.allow_comments;
        let advantage = self.config.advantage;
        self.roll_with(source, &mut MarkdownStringifier::new(), allow_comments, advantage)
    }

    /// Rolls `source` with every knob spelled out explicitly, overriding
    /// this `Roller`'s configured defaults, drawing from the thread's
    /// default RNG.
    pub fn roll_with(
        &mut self,
        source: impl Into<RollSource>,
        stringifier: &mut dyn Stringifier,
        allow_comments: bool,
        advantage: AdvType,
    ) -> Result<RollResult, RollError> {
        let mut rng = rand::rng();
        self.roll_with_rng(source, stringifier, allow_comments, advantage, &mut rng)
    }

    /// As [`Roller::roll_with`], but draws from the caller-supplied `rng`
    /// rather than the thread's default. This is the seam tests and
    /// reproducible replays hang off, since the RNG is meant to be an
    /// injectable, substitutable source.
    pub fn roll_with_rng<R: rand::RngCore>(
        &mut self,
        source: impl Into<RollSource>,
        stringifier: &mut dyn Stringifier,
        allow_comments: bool,
        advantage: AdvType,
        rng: &mut R,
    ) -> Result<RollResult, RollError> {
        self.ctx.reset();
        let ast = match source.into() {
            RollSource::Text(text) => self.parse(&text, allow_comments)?,
            RollSource::Ast(node) => node,
        };
        let ast = ast_adv_copy(&ast, advantage);
        let expr = eval::evaluate(&ast, rng, &mut self.ctx)?;
        let comment = match &expr.kind {
            ExprKind::Expression { comment, .. } => comment.clone(),
            _ => None,
        };
        let total = expr.total()? as i64;
        let result = stringifier.stringify(&expr);
        let crit = compute_crit(&expr);
        Ok(RollResult { ast, expr, comment, total, result, crit })
    }
}

impl Default for Roller {
    fn default() -> Self {
        Roller::new(RollConfig::default())
    }
}

/// Follows the same leftmost spine `ast_adv_copy` rewrites, but over the
/// evaluated tree: root, parens, unary, the left side of a binop, and a
/// set's first element. Stops at a `Dice`/`Literal` node rather than
/// descending into its own values, since `Dice`'s `children()` under
/// `ChildMixin` means something different (the individual dice).
fn leftmost_chain(expr: &Expr) -> &Expr {
    match &expr.kind {
        ExprKind::Expression { roll, .. } => leftmost_chain(roll),
        ExprKind::Parenthetical { value } => leftmost_chain(value),
        ExprKind::UnOp { operand, .. } => leftmost_chain(operand),
        ExprKind::BinOp { left, .. } => leftmost_chain(left),
        ExprKind::Set { values, .. } => values.first().map(leftmost_chain).unwrap_or(expr),
        _ => expr,
    }
}

fn compute_crit(expr: &Expr) -> CritType {
    if let ExprKind::Dice { face, values, .. } = &leftmost_chain(expr).kind {
        if !face.percent && face.size == 20.0 {
            let kept: Vec<&Expr> = values.iter().filter(|d| d.kept).collect();
            if let [only] = kept.as_slice() {
                if let Ok(n) = only.number() {
                    if n == 20.0 {
                        return CritType::Crit;
                    }
                    if n == 1.0 {
                        return CritType::Fail;
                    }
                }
            }
        }
    }
    CritType::None
}

thread_local! {
    static DEFAULT_ROLLER: RefCell<Roller> = RefCell::new(Roller::default());
}

/// Parses and rolls `expr` against a default, per-thread `Roller`.
pub fn roll(expr: &str) -> Result<RollResult, RollError> {
    DEFAULT_ROLLER.with(|r| r.borrow_mut().roll(expr))
}

/// Parses `expr` against a default, per-thread `Roller`, without rolling it.
pub fn parse(expr: &str) -> Result<Node, RollError> {
    DEFAULT_ROLLER.with(|r| r.borrow_mut().parse(expr, false))
}
