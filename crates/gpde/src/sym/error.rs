use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum SymError {
    DivisionByZero,
    NonRealPower {
        base: f64,
        exponent: f64,
    },
    LogNonpositive {
        arg: f64,
    },
    UnboundVariable {
        name: String,
    },
}

pub type SymResult<T> = Result<T, SymError>;

impl Display for SymError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SymError::*;
        let s = match self {
            DivisionByZero => "division by zero".to_owned(),
            NonRealPower { base, exponent } => {
                format!("power {base}^{exponent} has no real value")
            }
            LogNonpositive { arg } => {
                format!("logarithm of non-positive number {arg}")
            }
            UnboundVariable { name } => {
                format!("no value bound for variable {name}")
            }
        };
        write!(f, "{s}")
    }
}

impl std::error::Error for SymError {}
