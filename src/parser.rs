use crate::ast::{BinaryOp, DiceSize, Node, Selector, SelectorKind, SetOp, SetOperator, UnaryOp, push_operation};
use crate::error::RollError;
use crate::lexer::Lexer;
use crate::token::{Spanned, Token};

/// Operator spellings assumed to have actually begun a comment when they
/// turn out to be the last token consumed before a hard syntax error.
const AMBIGUITY_SUFFIXES: &[&str] = &["*", "k", "p", "rr", "ro", "ra", "e", "mi", "ma"];

struct Parser {
    lexer: Lexer,
    buf: Vec<Spanned>,
    last_token: Option<Spanned>,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            buf: Vec::new(),
            last_token: None,
        }
    }

    fn fill(&mut self, upto: usize) -> Result<(), RollError> {
        while self.buf.len() <= upto {
            let next = self.lexer.next_token()?;
            self.buf.push(next);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<Token, RollError> {
        self.fill(0)?;
        Ok(self.buf[0].token.clone())
    }

    fn peek2(&mut self) -> Result<Token, RollError> {
        self.fill(1)?;
        Ok(self.buf[1].token.clone())
    }

    fn peek_spanned(&mut self) -> Result<Spanned, RollError> {
        self.fill(0)?;
        Ok(self.buf[0].clone())
    }

    fn advance(&mut self) -> Result<Spanned, RollError> {
        self.fill(0)?;
        let tok = self.buf.remove(0);
        self.last_token = Some(tok.clone());
        Ok(tok)
    }

    fn syntax_error(&self, got: &Spanned, expected: impl Into<String>) -> RollError {
        let (line, col) = self.lexer.line_col(got.start);
        RollError::syntax(line, col, got.token.to_string(), expected.into())
    }

    fn expect(&mut self, expected: Token) -> Result<Spanned, RollError> {
        let tok = self.advance()?;
        if tok.token == expected {
            Ok(tok)
        } else {
            let msg = expected.to_string();
            Err(self.syntax_error(&tok, msg))
        }
    }

    fn parse_num(&mut self) -> Result<Node, RollError> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, RollError> {
        let mut left = self.parse_a_num()?;
        loop {
            let op = match self.peek()? {
                Token::Greater => BinaryOp::Greater,
                Token::GreaterEqual => BinaryOp::GreaterEqual,
                Token::Less => BinaryOp::Less,
                Token::LessEqual => BinaryOp::LessEqual,
                Token::EqualEqual => BinaryOp::Equal,
                Token::NotEqual => BinaryOp::NotEqual,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_a_num()?;
            left = Node::BinOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_a_num(&mut self) -> Result<Node, RollError> {
        let mut left = self.parse_m_num()?;
        loop {
            let op = match self.peek()? {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_m_num()?;
            left = Node::BinOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_m_num(&mut self) -> Result<Node, RollError> {
        let mut left = self.parse_u_num()?;
        loop {
            let op = match self.peek()? {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                Token::DoubleSlash => BinaryOp::IntDivide,
                Token::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_u_num()?;
            left = Node::BinOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_u_num(&mut self) -> Result<Node, RollError> {
        match self.peek()? {
            Token::Plus => {
                self.advance()?;
                Ok(Node::UnOp { op: UnaryOp::Plus, operand: Box::new(self.parse_u_num()?) })
            }
            Token::Minus => {
                self.advance()?;
                Ok(Node::UnOp { op: UnaryOp::Minus, operand: Box::new(self.parse_u_num()?) })
            }
            _ => self.parse_numexpr(),
        }
    }

    fn parse_numexpr(&mut self) -> Result<Node, RollError> {
        let base = match self.peek()? {
            Token::LParen => self.parse_set()?,
            Token::Number(_) | Token::D => self.parse_dice_or_literal()?,
            _ => {
                let got = self.peek_spanned()?;
                return Err(self.syntax_error(&got, "a number, dice expression, or '('"));
            }
        };
        self.parse_annotations(base)
    }

    fn parse_annotations(&mut self, base: Node) -> Result<Node, RollError> {
        let mut annotations = Vec::new();
        while matches!(self.peek()?, Token::AnnotationStart) {
            self.advance()?;
            let text_tok = self.advance()?;
            let text = match text_tok.token {
                Token::AnnotationText(t) => t,
                other => {
                    let sp = Spanned { token: other, start: text_tok.start, end: text_tok.end };
                    return Err(self.syntax_error(&sp, "annotation text"));
                }
            };
            self.expect(Token::AnnotationEnd)?;
            annotations.push(text);
        }
        if annotations.is_empty() {
            Ok(base)
        } else {
            Ok(Node::Annotated { expr: Box::new(base), annotations })
        }
    }

    fn parse_dice_or_literal(&mut self) -> Result<Node, RollError> {
        if matches!(self.peek()?, Token::D) {
            self.advance()?;
            let size = self.parse_dice_size()?;
            return self.parse_dice_ops(Node::Dice { num: None, size });
        }
        if let Token::Number(n) = self.peek()? {
            if matches!(self.peek2()?, Token::D) {
                self.advance()?;
                self.advance()?;
                let size = self.parse_dice_size()?;
                return self.parse_dice_ops(Node::Dice {
                    num: Some(Box::new(Node::Literal(n))),
                    size,
                });
            }
            self.advance()?;
            return Ok(Node::Literal(n));
        }
        let got = self.peek_spanned()?;
        Err(self.syntax_error(&got, "a number or dice expression"))
    }

    fn parse_dice_size(&mut self) -> Result<DiceSize, RollError> {
        match self.peek()? {
            Token::Percent => {
                self.advance()?;
                Ok(DiceSize::Percent)
            }
            Token::Number(n) => {
                self.advance()?;
                Ok(DiceSize::Value(Box::new(Node::Literal(n))))
            }
            _ => {
                let got = self.peek_spanned()?;
                Err(self.syntax_error(&got, "a dice size or '%'"))
            }
        }
    }

    fn parse_dice_ops(&mut self, dice: Node) -> Result<Node, RollError> {
        let mut operations: Vec<SetOperator> = Vec::new();
        loop {
            let op = match self.peek()? {
                Token::RerollWhile => SetOp::RerollWhile,
                Token::RerollOnce => SetOp::RerollOnce,
                Token::ExplodeOnce => SetOp::ExplodeOnce,
                Token::ExplodeWhile => SetOp::ExplodeWhile,
                Token::Minimum => SetOp::Minimum,
                Token::Maximum => SetOp::Maximum,
                Token::Keep => SetOp::Keep,
                Token::Drop => SetOp::Drop,
                _ => break,
            };
            self.advance()?;
            let selector = self.parse_selector()?;
            push_operation(&mut operations, SetOperator { op, selectors: vec![selector] });
        }
        if operations.is_empty() {
            Ok(dice)
        } else {
            Ok(Node::OperatedDice { dice: Box::new(dice), operations })
        }
    }

    fn parse_set(&mut self) -> Result<Node, RollError> {
        let (values, saw_trailing_comma) = self.parse_group()?;
        let mut operations: Vec<SetOperator> = Vec::new();
        loop {
            let op = match self.peek()? {
                Token::Keep => SetOp::Keep,
                Token::Drop => SetOp::Drop,
                _ => break,
            };
            self.advance()?;
            let selector = self.parse_selector()?;
            push_operation(&mut operations, SetOperator { op, selectors: vec![selector] });
        }
        // Collapses to a bare parenthesized expression only when no set_op
        // follows; `(1+2)kh1` needs a one-element NumberSet underneath.
        let set = if values.len() == 1 && !saw_trailing_comma && operations.is_empty() {
            Node::Parenthetical(Box::new(values.into_iter().next().unwrap()))
        } else {
            Node::NumberSet(values)
        };
        if operations.is_empty() {
            Ok(set)
        } else {
            Ok(Node::OperatedSet { set: Box::new(set), operations })
        }
    }

    fn parse_group(&mut self) -> Result<(Vec<Node>, bool), RollError> {
        self.expect(Token::LParen)?;
        let mut values = Vec::new();
        let mut saw_trailing_comma = false;
        if !matches!(self.peek()?, Token::RParen) {
            values.push(self.parse_num()?);
            while matches!(self.peek()?, Token::Comma) {
                self.advance()?;
                saw_trailing_comma = true;
                if matches!(self.peek()?, Token::RParen) {
                    break;
                }
                values.push(self.parse_num()?);
                saw_trailing_comma = false;
            }
        }
        self.expect(Token::RParen)?;
        Ok((values, saw_trailing_comma))
    }

    fn parse_selector(&mut self) -> Result<Selector, RollError> {
        let kind = match self.peek()? {
            Token::SelectorHigh => {
                self.advance()?;
                SelectorKind::Highest
            }
            Token::SelectorLow => {
                self.advance()?;
                SelectorKind::Lowest
            }
            Token::Greater => {
                self.advance()?;
                SelectorKind::GreaterThan
            }
            Token::Less => {
                self.advance()?;
                SelectorKind::LessThan
            }
            _ => SelectorKind::Literal,
        };
        let n = self.parse_selector_number()?;
        Ok(Selector { kind, n })
    }

    fn parse_selector_number(&mut self) -> Result<i64, RollError> {
        let tok = self.advance()?;
        let start = tok.start;
        let end = tok.end;
        match tok.token {
            Token::Number(n) => Ok(n.round() as i64),
            other => {
                let sp = Spanned { token: other, start, end };
                Err(self.syntax_error(&sp, "a number"))
            }
        }
    }
}

fn try_parse(input: &str, lenient: bool) -> (Result<Node, RollError>, Option<Spanned>, usize) {
    let mut parser = Parser::new(input);
    parser.lexer.set_lenient(lenient);
    let result = parser.parse_num().and_then(|n| parser.expect(Token::Eof).map(|_| n));
    (result, parser.last_token.clone(), parser.lexer.pos())
}

fn wrap(roll: Node, comment: Option<String>) -> Node {
    Node::Expression { roll: Box::new(roll), comment }
}

fn parse_toplevel(input: &str, allow_comments: bool) -> Result<Node, RollError> {
    let (strict_result, _last, _pos) = try_parse(input, false);
    match strict_result {
        Ok(num) => Ok(wrap(num, None)),
        Err(strict_err) if allow_comments => rescue(input, strict_err),
        Err(strict_err) => Err(strict_err),
    }
}

/// A lenient re-parse first, then an ambiguity-suffix backtrack over the
/// last token consumed if that still hard-errors.
fn rescue(input: &str, original_err: RollError) -> Result<Node, RollError> {
    let chars: Vec<char> = input.chars().collect();
    let (lenient_result, last_token, lenient_pos) = try_parse(input, true);
    match lenient_result {
        Ok(num) => {
            if lenient_pos >= chars.len() {
                return Ok(wrap(num, None));
            }
            tracing::debug!("comment rescue engaged");
            let comment: String = chars[lenient_pos..].iter().collect();
            Ok(wrap(num, non_empty(comment)))
        }
        Err(_) => {
            let Some(tok) = last_token else {
                return Err(original_err);
            };
            let text: String = chars[tok.start..tok.end.min(chars.len())].iter().collect();
            if !AMBIGUITY_SUFFIXES.contains(&text.as_str()) {
                return Err(original_err);
            }
            let prefix: String = chars[..tok.start].iter().collect();
            let rescued = parse_toplevel(&prefix, true)?;
            let Node::Expression { roll, .. } = rescued else {
                unreachable!("parse_toplevel always wraps in Expression")
            };
            tracing::debug!("comment rescue engaged");
            let comment: String = chars[tok.start..].iter().collect();
            Ok(wrap(*roll, non_empty(comment)))
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

pub(crate) fn parse(input: &str, allow_comments: bool) -> Result<Node, RollError> {
    tracing::debug!(len = input.chars().count(), allow_comments, "parsing expression");
    parse_toplevel(input, allow_comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(s: &str) -> Node {
        parse(s, false).unwrap_or_else(|e| panic!("failed to parse {s:?}: {e}"))
    }

    #[test]
    fn pemdas() {
        assert_eq!(parse_ok("1 + 3 * 6").to_string(), "1 + 3 * 6");
    }

    #[test]
    fn dice_quantity_vs_literal() {
        let Node::Expression { roll, .. } = parse_ok("3d6") else { panic!() };
        assert!(matches!(*roll, Node::Dice { num: Some(_), .. }));
        let Node::Expression { roll, .. } = parse_ok("3") else { panic!() };
        assert!(matches!(*roll, Node::Literal(v) if v == 3.0));
    }

    #[test]
    fn implicit_one_die() {
        let Node::Expression { roll, .. } = parse_ok("d6") else { panic!() };
        assert!(matches!(*roll, Node::Dice { num: None, .. }));
    }

    #[test]
    fn keep_operator_merges_selectors() {
        let Node::Expression { roll, .. } = parse_ok("4d6k1k2k3") else { panic!() };
        let Node::OperatedDice { operations, .. } = *roll else { panic!() };
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].selectors.len(), 3);
    }

    #[test]
    fn single_element_paren_is_parenthetical_not_set() {
        let Node::Expression { roll, .. } = parse_ok("(1+2)") else { panic!() };
        assert!(matches!(*roll, Node::Parenthetical(_)));
        let Node::Expression { roll, .. } = parse_ok("(1,)") else { panic!() };
        assert!(matches!(*roll, Node::NumberSet(v) if v.len() == 1));
    }

    #[test]
    fn single_element_paren_with_set_op_is_operated_set() {
        let Node::Expression { roll, .. } = parse_ok("(1+2)kh1") else { panic!() };
        let Node::OperatedSet { set, .. } = *roll else { panic!() };
        assert!(matches!(*set, Node::NumberSet(v) if v.len() == 1));
    }

    #[test]
    fn annotation_is_attached() {
        let Node::Expression { roll, .. } = parse_ok("1d20 [foo]") else { panic!() };
        assert!(matches!(*roll, Node::Annotated { .. }));
    }

    #[test]
    fn comment_rescue_on_unknown_word() {
        let result = parse("1d20 keep something", true).unwrap();
        let Node::Expression { comment, .. } = result else { panic!() };
        assert_eq!(comment.as_deref(), Some("keep something"));
    }

    #[test]
    fn comment_rescue_on_bold_markdown() {
        let result = parse("1d20 **bold**", true).unwrap();
        let Node::Expression { comment, .. } = result else { panic!() };
        assert_eq!(comment.as_deref(), Some("**bold**"));
    }

    #[test]
    fn comment_rescue_on_unrecognized_char() {
        let result = parse("1d20 foo bar", true).unwrap();
        let Node::Expression { comment, .. } = result else { panic!() };
        assert_eq!(comment.as_deref(), Some("foo bar"));
    }

    #[test]
    fn comments_disabled_surface_syntax_error() {
        assert!(parse("1d20 keep something", false).is_err());
    }
}
