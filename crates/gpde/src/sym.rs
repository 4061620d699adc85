use std::collections::HashSet;

use itertools::Itertools;

pub mod operators;
pub use operators::*;

pub mod numeric;
pub use numeric::*;

pub mod error;
pub use error::*;

pub mod fold;
pub mod substitute;

/// A symbolic scalar expression.
///
/// Subtraction and division are represented canonically: `a - b` is
/// `a + (-1) * b` and `a / b` is `a * b^-1`. Expressions are immutable;
/// every operation builds a new tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sym {
    Num(Num),
    Var {
        name: String,
    },
    Pool {
        op: AssocOp,
        terms: Vec<Sym>,
    },
    Pow {
        base: Box<Sym>,
        exponent: Box<Sym>,
    },
    Apply {
        func: Func,
        arg: Box<Sym>,
    },
}

impl Sym {
    pub const ZERO: Self = Self::Num(Num::ZERO);
    pub const ONE: Self = Self::Num(Num::ONE);
    pub const NEGATIVE_ONE: Self = Self::Num(Num::NEGATIVE_ONE);

    pub fn num(val: f64) -> Self {
        Self::Num(Num(val))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var { name: name.into() }
    }

    /// No fields are Syms
    pub fn is_atomic(&self) -> bool {
        matches!(self, Self::Num(..) | Self::Var { .. })
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Num(..))
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Self::Num(num) = self {
            Some(num.0)
        } else {
            None
        }
    }

    pub fn assoc_combine(op: AssocOp, first: Self, second: Self) -> Self {
        let mut terms = Vec::new();

        match first {
            Self::Pool {
                op: first_op,
                terms: mut first_terms,
            } if first_op == op => terms.append(&mut first_terms),
            _ => terms.push(first),
        }

        match second {
            Self::Pool {
                op: second_op,
                terms: mut second_terms,
            } if second_op == op => terms.append(&mut second_terms),
            _ => terms.push(second),
        }

        Self::Pool { op, terms }
    }

    pub fn pow(self, exponent: Self) -> Self {
        Self::Pow {
            base: self.into(),
            exponent: exponent.into(),
        }
    }

    pub fn exp(self) -> Self {
        Self::Apply {
            func: Func::Exp,
            arg: self.into(),
        }
    }

    pub fn ln(self) -> Self {
        Self::Apply {
            func: Func::Ln,
            arg: self.into(),
        }
    }

    pub fn map<F>(&self, mut f: F) -> Sym
    where
        F: FnMut(&Sym) -> Sym,
    {
        use Sym::*;
        match self {
            Num(..) | Var { .. } => self.clone(),
            Pool { op, terms } => Pool {
                op: *op,
                terms: terms.iter().map(f).collect_vec(),
            },
            Pow { base, exponent } => Pow {
                base: f(base).into(),
                exponent: f(exponent).into(),
            },
            Apply { func, arg } => Apply {
                func: *func,
                arg: f(arg).into(),
            },
        }
    }

    pub fn try_map<F, E>(&self, mut f: F) -> Result<Sym, E>
    where
        F: FnMut(&Sym) -> Result<Sym, E>,
    {
        use Sym::*;
        Ok(match self {
            Num(..) | Var { .. } => self.clone(),
            Pool { op, terms } => Pool {
                op: *op,
                terms: terms.iter().map(f).try_collect()?,
            },
            Pow { base, exponent } => Pow {
                base: f(base)?.into(),
                exponent: f(exponent)?.into(),
            },
            Apply { func, arg } => Apply {
                func: *func,
                arg: f(arg)?.into(),
            },
        })
    }

    pub fn reduce<T, F, J, D>(&self, f: F, joiner: J, def: D) -> T
    where
        F: Fn(&Self) -> T,
        J: Fn(T, T) -> T,
        D: Fn() -> T,
    {
        use Sym::*;
        match self {
            Num(..) | Var { .. } => def(),
            Pool { terms, .. } => terms.iter().map(f).reduce(joiner).unwrap_or_else(def),
            Pow { base, exponent } => joiner(f(base), f(exponent)),
            Apply { arg, .. } => f(arg),
        }
    }

    pub fn contains(&self, sub_exp: &Sym) -> bool {
        if self == sub_exp {
            true
        } else {
            self.reduce(|exp| exp.contains(sub_exp), |a, b| a || b, || false)
        }
    }

    pub fn all_vars(&self) -> HashSet<String> {
        if let Self::Var { name } = self {
            HashSet::from([name.clone()])
        } else {
            self.reduce(Self::all_vars, |a, b| &a | &b, HashSet::new)
        }
    }

    /// Algebraic simplification: flattens pools, folds numeric heads,
    /// collects like terms and like powers, and reduces trivial powers and
    /// function applications. Idempotent; memoized on the structurally
    /// equal tree.
    pub fn simplify(&self) -> SymResult<Sym> {
        fold::simplify_tree(self.clone())
    }
}

impl std::ops::Add for Sym {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::assoc_combine(AssocOp::Add, self, rhs)
    }
}

impl std::ops::Neg for Sym {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::assoc_combine(AssocOp::Mul, Self::NEGATIVE_ONE, self)
    }
}

impl std::ops::Sub for Sym {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl std::ops::Mul for Sym {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::assoc_combine(AssocOp::Mul, self, rhs)
    }
}

impl std::ops::Div for Sym {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        Self::assoc_combine(AssocOp::Mul, self, rhs.pow(Self::NEGATIVE_ONE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms() {
        let x = Sym::var("x");
        let y = Sym::var("y");

        assert_eq!(
            x.clone() - y.clone(),
            Sym::Pool {
                op: AssocOp::Add,
                terms: vec![
                    x.clone(),
                    Sym::Pool {
                        op: AssocOp::Mul,
                        terms: vec![Sym::NEGATIVE_ONE, y.clone()],
                    },
                ],
            }
        );

        assert_eq!(
            x.clone() / y.clone(),
            Sym::Pool {
                op: AssocOp::Mul,
                terms: vec![x, y.pow(Sym::NEGATIVE_ONE)],
            }
        );
    }

    #[test]
    fn pools_flatten_on_combine() {
        let sum = Sym::var("a") + Sym::var("b") + Sym::var("c");
        let Sym::Pool { op, terms } = sum else {
            panic!("expected pool");
        };
        assert_eq!(op, AssocOp::Add);
        assert_eq!(terms.len(), 3);
    }

    #[test]
    fn contains_and_vars() {
        let exp = (Sym::var("x") - Sym::var("y")).pow(Sym::num(2.0)).exp();
        assert!(exp.contains(&Sym::var("x")));
        assert!(!exp.contains(&Sym::var("z")));
        assert_eq!(
            exp.all_vars(),
            HashSet::from(["x".to_owned(), "y".to_owned()])
        );
    }
}
