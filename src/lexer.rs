use crate::error::RollError;
use crate::token::{Spanned, Token};

/// In `lenient` mode, a character that cannot start any known token is not a
/// hard error: `next_token` returns `Token::Eof` without consuming it, so the
/// caller can treat everything from the current position onward as a
/// comment.
pub(crate) struct Lexer {
    chars: Vec<char>,
    pos: usize,
    annotation_mode: bool,
    lenient: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            annotation_mode: false,
            lenient: false,
        }
    }

    pub fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.chars.len());
        let mut line = 1;
        let mut col = 1;
        for &c in &self.chars[..offset] {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.peek_offset(0)
    }

    fn peek_offset(&self, offset: usize) -> char {
        let idx = self.pos + offset;
        *self.chars.get(idx).unwrap_or(&'\0')
    }

    fn advance(&mut self) {
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn skip_ws(&mut self) {
        while !self.is_at_end() && (self.peek() == ' ' || self.peek() == '\t') {
            self.advance();
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(idx, ch)| self.peek_offset(idx) == ch)
    }

    fn number(&mut self) -> Result<Token, RollError> {
        let start = self.pos;
        let mut seen_digit = false;
        let mut seen_dot = false;

        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_digit() {
                seen_digit = true;
                self.advance();
            } else if c == '.' && !seen_dot {
                let next = self.peek_offset(1);
                if !next.is_ascii_digit() {
                    break;
                }
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if !seen_digit {
            return Err(RollError::Lexer(format!(
                "number literal missing digits at position {start}"
            )));
        }

        let num_str: String = self.chars[start..self.pos].iter().collect();
        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| RollError::Lexer(format!("failed to parse number literal '{num_str}'")))
    }

    pub fn next_token(&mut self) -> Result<Spanned, RollError> {
        if !self.annotation_mode {
            self.skip_ws();
        }
        let start = self.pos;

        if self.is_at_end() {
            return Ok(self.spanned(Token::Eof, start));
        }

        if self.annotation_mode {
            let text_start = self.pos;
            while !self.is_at_end() && self.peek() != ']' {
                self.advance();
            }
            if self.is_at_end() {
                return Err(RollError::Lexer(
                    "unterminated annotation; missing closing ']'".into(),
                ));
            }
            let text: String = self.chars[text_start..self.pos].iter().collect();
            self.annotation_mode = false;
            return Ok(self.spanned(Token::AnnotationText(text.trim().to_string()), start));
        }

        if self.starts_with("//") {
            self.advance_by(2);
            return Ok(self.spanned(Token::DoubleSlash, start));
        }
        if self.starts_with("==") {
            self.advance_by(2);
            return Ok(self.spanned(Token::EqualEqual, start));
        }
        if self.starts_with("!=") {
            self.advance_by(2);
            return Ok(self.spanned(Token::NotEqual, start));
        }
        if self.starts_with(">=") {
            self.advance_by(2);
            return Ok(self.spanned(Token::GreaterEqual, start));
        }
        if self.starts_with("<=") {
            self.advance_by(2);
            return Ok(self.spanned(Token::LessEqual, start));
        }
        if self.starts_with("rr") {
            self.advance_by(2);
            return Ok(self.spanned(Token::RerollWhile, start));
        }
        if self.starts_with("ro") {
            self.advance_by(2);
            return Ok(self.spanned(Token::RerollOnce, start));
        }
        if self.starts_with("ra") {
            self.advance_by(2);
            return Ok(self.spanned(Token::ExplodeOnce, start));
        }
        if self.starts_with("mi") {
            self.advance_by(2);
            return Ok(self.spanned(Token::Minimum, start));
        }
        if self.starts_with("ma") {
            self.advance_by(2);
            return Ok(self.spanned(Token::Maximum, start));
        }

        let c = self.peek();
        let tok = match c {
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                self.advance();
                Token::Minus
            }
            '*' => {
                self.advance();
                Token::Star
            }
            '/' => {
                self.advance();
                Token::Slash
            }
            '%' => {
                self.advance();
                Token::Percent
            }
            '>' => {
                self.advance();
                Token::Greater
            }
            '<' => {
                self.advance();
                Token::Less
            }
            '(' => {
                self.advance();
                Token::LParen
            }
            ')' => {
                self.advance();
                Token::RParen
            }
            '[' => {
                self.advance();
                self.annotation_mode = true;
                Token::AnnotationStart
            }
            ']' => {
                self.advance();
                Token::AnnotationEnd
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            'd' => {
                self.advance();
                Token::D
            }
            'k' => {
                self.advance();
                Token::Keep
            }
            'p' => {
                self.advance();
                Token::Drop
            }
            'e' => {
                self.advance();
                Token::ExplodeWhile
            }
            'h' => {
                self.advance();
                Token::SelectorHigh
            }
            'l' => {
                self.advance();
                Token::SelectorLow
            }
            c if c.is_ascii_digit() || (c == '.' && self.peek_offset(1).is_ascii_digit()) => {
                self.number()?
            }
            _ if self.lenient => {
                return Ok(self.spanned(Token::Eof, start));
            }
            _ => {
                return Err(RollError::Lexer(format!(
                    "unexpected character '{c}' at position {}",
                    self.pos
                )));
            }
        };
        Ok(self.spanned(tok, start))
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            start,
            end: self.pos,
        }
    }
}
