use itertools::Itertools;

use crate::sym::{AssocOp, Func, Sym, SymResult};

/// Symbolic derivative of `exp` with respect to `diff_exp`.
///
/// `diff_exp` is matched structurally, so differentiating with respect to a
/// compound expression treats that exact subtree as the variable.
pub fn derivative(exp: &Sym, diff_exp: &Sym) -> SymResult<Sym> {
    use Sym::*;
    if exp == diff_exp {
        return Ok(Sym::ONE);
    }
    if !exp.contains(diff_exp) {
        return Ok(Sym::ZERO);
    }
    match exp {
        // Handled by the equality and containment checks above; kept
        // explicit so the match stays exhaustive over the node shapes.
        Num(..) | Var { .. } => Ok(Sym::ZERO),
        Pool {
            op: AssocOp::Add,
            terms,
        } => Ok(Pool {
            op: AssocOp::Add,
            terms: terms
                .iter()
                .map(|term| derivative(term, diff_exp))
                .try_collect()?,
        }),
        Pool {
            op: AssocOp::Mul,
            terms,
        } => product_rule(terms, diff_exp),
        Pow { base, exponent } => {
            let base_depends = base.contains(diff_exp);
            let exponent_depends = exponent.contains(diff_exp);
            if !exponent_depends {
                let dbase = derivative(base, diff_exp)?;
                Ok((**exponent).clone()
                    * (**base).clone().pow((**exponent).clone() - Sym::ONE)
                    * dbase)
            } else if !base_depends {
                let dexponent = derivative(exponent, diff_exp)?;
                Ok((**base).clone().ln() * exp.clone() * dexponent)
            } else {
                let dbase = derivative(base, diff_exp)?;
                let dexponent = derivative(exponent, diff_exp)?;
                Ok((**base).clone().pow((**exponent).clone() - Sym::ONE)
                    * ((**exponent).clone() * dbase
                        + (**base).clone() * (**base).clone().ln() * dexponent))
            }
        }
        Apply { func, arg } => {
            let darg = derivative(arg, diff_exp)?;
            let partial = match func {
                Func::Exp => (**arg).clone().exp(),
                Func::Ln => (**arg).clone().pow(Sym::NEGATIVE_ONE),
            };
            Ok(partial * darg)
        }
    }
}

fn product_rule(terms: &[Sym], diff_exp: &Sym) -> SymResult<Sym> {
    let mut add_terms = Vec::with_capacity(terms.len());
    for (i, term) in terms.iter().enumerate() {
        let mut prod_terms = Vec::with_capacity(terms.len());
        for (j, other_term) in terms.iter().enumerate() {
            if i == j {
                prod_terms.push(derivative(term, diff_exp)?);
            } else {
                prod_terms.push(other_term.clone());
            }
        }

        add_terms.push(Sym::Pool {
            op: AssocOp::Mul,
            terms: prod_terms,
        });
    }

    Ok(Sym::Pool {
        op: AssocOp::Add,
        terms: add_terms,
    })
}
