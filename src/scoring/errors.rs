use thiserror::Error;

/// Syntax error inside a single formula string
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Failures of the score formula evaluator. A failed column has no value;
/// callers must never substitute zero for it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("Formula for column '{column}' is invalid: {source}")]
    Parse { column: String, source: ParseError },

    #[error("Calculated column '{column}' has no formula")]
    MissingFormula { column: String },

    #[error("Column '{column}' is defined more than once")]
    DuplicateColumn { column: String },

    #[error("Column '{column}' references unknown column '{reference}'")]
    UnknownColumn { column: String, reference: String },

    #[error("Cyclic column reference: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Column '{column}' divides by zero")]
    DivisionByZero { column: String },

    #[error("Column '{column}' did not produce a finite number")]
    NonFinite { column: String },

    #[error("Column '{column}' depends on '{dependency}', which failed")]
    DependencyFailed { column: String, dependency: String },
}

impl FormulaError {
    /// Structural errors are properties of the column set itself and are
    /// reported before any value is computed.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FormulaError::Parse { .. }
                | FormulaError::MissingFormula { .. }
                | FormulaError::DuplicateColumn { .. }
                | FormulaError::UnknownColumn { .. }
                | FormulaError::Cycle { .. }
        )
    }
}
