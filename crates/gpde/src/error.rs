use std::fmt::Display;

use crate::sym::SymError;

/// Crate-wide error taxonomy. Symbolic-engine failures keep their own
/// [`SymError`] detail and surface here through the `Symbolic` variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Syntax {
        message: String,
        start: usize,
        end: usize,
    },
    NonlinearOperator {
        exp: String,
    },
    InvalidDifferentialDenominator {
        den: String,
    },
    DimensionMismatch {
        expected: usize,
        got: usize,
    },
    Symbolic(SymError),
    NotPositiveDefinite,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Error::*;
        let s = match self {
            Syntax {
                message,
                start,
                end,
            } => format!("syntax error at {start}..{end}: {message}"),
            NonlinearOperator { exp } => {
                format!("not a linear operator: {exp} multiplies or divides two non-constant expressions")
            }
            InvalidDifferentialDenominator { den } => {
                format!("expected differential of an input variable, got {den}")
            }
            DimensionMismatch { expected, got } => {
                format!("dimension mismatch: expected {expected}, got {got}")
            }
            Symbolic(err) => err.to_string(),
            NotPositiveDefinite => "training matrix is not positive definite".to_owned(),
        };
        write!(f, "{s}")
    }
}

impl std::error::Error for Error {}

impl From<SymError> for Error {
    fn from(err: SymError) -> Self {
        Self::Symbolic(err)
    }
}
