use thiserror::Error;

use crate::expressions::ExpressionError;

/// Reasons a translation can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    /// An unsupported feature was found while translating in strict mode.
    #[error("unsupported feature: {0}")]
    Unsupported(String),
    /// A piecewise progress expression could not be built.
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    /// The document or the translator broke an internal invariant.
    #[error("invariant violated: {0}")]
    Invariant(String),
}
