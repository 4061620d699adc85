use std::collections::HashMap;

use itertools::Itertools;

use super::{AssocOp, Func, Sym, SymError, SymResult};

impl Sym {
    #[must_use]
    pub fn replace(&self, pat: &Sym, with: &Sym) -> Self {
        if self == pat {
            with.clone()
        } else {
            self.map(|e| e.replace(pat, with))
        }
    }

    #[must_use]
    pub fn substitute(&self, map: &HashMap<Sym, Sym>) -> Self {
        if let Some(replacement) = map.get(self) {
            replacement.clone()
        } else {
            self.map(|e| e.substitute(map))
        }
    }

    /// Evaluates the expression to a number under the given variable
    /// bindings. Every variable occurring in the expression must be bound.
    pub fn eval(&self, bindings: &HashMap<String, f64>) -> SymResult<f64> {
        use Sym::*;
        match self {
            Num(num) => Ok(num.0),
            Var { name } => {
                bindings
                    .get(name)
                    .copied()
                    .ok_or_else(|| SymError::UnboundVariable { name: name.clone() })
            }
            Pool {
                op: AssocOp::Add,
                terms,
            } => {
                let vals: Vec<f64> = terms.iter().map(|term| term.eval(bindings)).try_collect()?;
                Ok(vals.into_iter().sum())
            }
            Pool {
                op: AssocOp::Mul,
                terms,
            } => {
                let vals: Vec<f64> = terms.iter().map(|term| term.eval(bindings)).try_collect()?;
                Ok(vals.into_iter().product())
            }
            Pow { base, exponent } => {
                let base = base.eval(bindings)?;
                let exponent = exponent.eval(bindings)?;
                if base == 0.0 && exponent < 0.0 {
                    return Err(SymError::DivisionByZero);
                }
                let val = base.powf(exponent);
                if val.is_nan() {
                    return Err(SymError::NonRealPower { base, exponent });
                }
                Ok(val)
            }
            Apply { func, arg } => {
                let arg = arg.eval(bindings)?;
                match func {
                    Func::Exp => Ok(arg.exp()),
                    Func::Ln => {
                        if arg <= 0.0 {
                            Err(SymError::LogNonpositive { arg })
                        } else {
                            Ok(arg.ln())
                        }
                    }
                }
            }
        }
    }
}
