use thiserror::Error;

/// A single failure kind raised anywhere in the engine. `parse`/`roll` never
/// recover internally; every variant propagates straight to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RollError {
    #[error("Lexer error: {0}")]
    Lexer(String),

    #[error("Syntax error at line {line}, column {col}: got {got}, expected {expected}")]
    Syntax {
        line: usize,
        col: usize,
        got: String,
        expected: String,
    },

    #[error("{0}")]
    Value(String),

    #[error("Exceeded maximum number of rolls")]
    TooManyRolls,
}

impl RollError {
    pub(crate) fn syntax(
        line: usize,
        col: usize,
        got: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        RollError::Syntax {
            line,
            col,
            got: got.into(),
            expected: expected.into(),
        }
    }

    pub(crate) fn value(msg: impl Into<String>) -> Self {
        RollError::Value(msg.into())
    }
}
