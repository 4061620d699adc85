use std::cell::LazyCell;
use std::collections::HashMap;
use std::fmt::Display;

use strum::{EnumIter, IntoEnumIterator};

pub mod parse;
pub use parse::parse;

/// Function name of the differentiation construct in operator text.
pub const DIFFERENTIAL_TOKEN: &str = "d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ArithOp {
    Plus,
    Minus,
    Times,
    Div,
}

impl ArithOp {
    pub fn symbol(self) -> char {
        use ArithOp::*;
        match self {
            Plus => '+',
            Minus => '-',
            Times => '*',
            Div => '/',
        }
    }

    pub fn precedence(self) -> u8 {
        use ArithOp::*;
        match self {
            Plus | Minus => 1,
            Times | Div => 2,
        }
    }

    pub fn apply(self, left: f64, right: f64) -> f64 {
        use ArithOp::*;
        match self {
            Plus => left + right,
            Minus => left - right,
            Times => left * right,
            Div => left / right,
        }
    }
}

thread_local! {
    static CHAR_OP_MAP: LazyCell<HashMap<char, ArithOp>> = LazyCell::new(|| {
        ArithOp::iter().map(|op| (op.symbol(), op)).collect()
    });
}

pub fn arith_op_from_char(c: char) -> Option<ArithOp> {
    CHAR_OP_MAP.with(|map| map.get(&c).copied())
}

/// A parsed linear PDE operator expression.
///
/// The tree is immutable once parsed and owns its children outright. The
/// parser guarantees that every `Differential` denominator is an
/// `InputVar` and that every `Times`/`Div` node has at least one
/// `Constant` operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdeExp {
    /// Input coordinate `x<id>`
    InputVar(usize),
    /// The target function `u`
    TargetVar,
    Constant(f64),
    Binary {
        op: ArithOp,
        left: Box<PdeExp>,
        right: Box<PdeExp>,
    },
    Differential {
        num: Box<PdeExp>,
        den: Box<PdeExp>,
    },
}

impl PdeExp {
    fn precedence(&self) -> Option<u8> {
        match self {
            Self::Binary { op, .. } => Some(op.precedence()),
            // Negative constants render with a leading minus, which the
            // parser only accepts as part of a standalone literal token
            Self::Constant(val) if *val < 0.0 => Some(ArithOp::Plus.precedence()),
            _ => None,
        }
    }
}

fn wrap_if(s: &str, wrap: bool) -> String {
    if wrap {
        format!("({s})")
    } else {
        s.to_string()
    }
}

/// Canonical text form. Parentheses are minimal: re-parsing the rendered
/// text yields a structurally identical tree under the parser's
/// left-associative grammar.
impl Display for PdeExp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use PdeExp::*;
        let s = match self {
            InputVar(id) => format!("x{id}"),
            TargetVar => "u".to_owned(),
            Constant(val) => val.to_string(),
            Binary { op, left, right } => {
                let prec = op.precedence();
                let left_str = wrap_if(
                    &left.to_string(),
                    left.precedence().is_some_and(|sub_prec| sub_prec < prec),
                );
                let right_str = wrap_if(
                    &right.to_string(),
                    right.precedence().is_some_and(|sub_prec| sub_prec <= prec),
                );
                format!("{left_str} {} {right_str}", op.symbol())
            }
            Differential { num, den } => {
                format!("{DIFFERENTIAL_TOKEN}({num}, {den})")
            }
        };
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_symbols_map_back() {
        for op in ArithOp::iter() {
            assert_eq!(arith_op_from_char(op.symbol()), Some(op));
        }
        assert_eq!(arith_op_from_char('^'), None);
    }

    #[test]
    fn rendering_uses_minimal_parentheses() {
        let laplacian = PdeExp::Binary {
            op: ArithOp::Plus,
            left: PdeExp::Differential {
                num: PdeExp::Differential {
                    num: PdeExp::TargetVar.into(),
                    den: PdeExp::InputVar(0).into(),
                }
                .into(),
                den: PdeExp::InputVar(0).into(),
            }
            .into(),
            right: PdeExp::Differential {
                num: PdeExp::Differential {
                    num: PdeExp::TargetVar.into(),
                    den: PdeExp::InputVar(1).into(),
                }
                .into(),
                den: PdeExp::InputVar(1).into(),
            }
            .into(),
        };
        assert_eq!(laplacian.to_string(), "d(d(u, x0), x0) + d(d(u, x1), x1)");

        let scaled_sum = PdeExp::Binary {
            op: ArithOp::Times,
            left: PdeExp::Constant(2.0).into(),
            right: PdeExp::Binary {
                op: ArithOp::Plus,
                left: PdeExp::TargetVar.into(),
                right: PdeExp::Differential {
                    num: PdeExp::TargetVar.into(),
                    den: PdeExp::InputVar(0).into(),
                }
                .into(),
            }
            .into(),
        };
        assert_eq!(scaled_sum.to_string(), "2 * (u + d(u, x0))");
    }
}
