use memoize::memoize;
use ordermap::OrderMap;

use crate::sym::{AssocOp, Func, Sym, SymError, SymResult};

pub fn flatten_pool(op: AssocOp, terms: Vec<Sym>) -> Vec<Sym> {
    terms
        .into_iter()
        .flat_map(|term| match term {
            Sym::Pool {
                op: sub_op,
                terms: sub_terms,
            } if sub_op == op => sub_terms,
            _ => vec![term],
        })
        .collect()
}

/// Bottom-up simplification of a whole tree. Children are simplified first,
/// so every fold below sees already-reduced operands. Memoized on the
/// structurally equal tree.
#[memoize]
pub fn simplify_tree(exp: Sym) -> SymResult<Sym> {
    let exp = exp.try_map(|sub| simplify_tree(sub.clone()))?;
    match exp {
        Sym::Pool { op, terms } => {
            let flattened = flatten_pool(op, terms);
            let mut new_terms = match op {
                AssocOp::Add => add_fold(flattened),
                AssocOp::Mul => mul_fold(flattened),
            };
            Ok(if new_terms.len() == 1 {
                new_terms.pop().unwrap()
            } else {
                Sym::Pool {
                    op,
                    terms: new_terms,
                }
            })
        }
        Sym::Pow { base, exponent } => pow_fold(*base, *exponent),
        Sym::Apply { func, arg } => apply_fold(func, *arg),
        atomic => Ok(atomic),
    }
}

/// Collects numeric terms into a single head and like residual terms into
/// coefficient-weighted entries, preserving first-seen order.
pub fn add_fold(terms: Vec<Sym>) -> Vec<Sym> {
    let mut head = 0.0_f64;
    let mut leftovers: OrderMap<Sym, f64> = OrderMap::new();

    for term in terms {
        match term {
            Sym::Num(num) => head += num.0,
            Sym::Pool {
                op: AssocOp::Mul,
                terms: mut mul_terms,
            } if mul_terms.first().is_some_and(Sym::is_number) => {
                let coef = match mul_terms.remove(0) {
                    Sym::Num(num) => num.0,
                    _ => unreachable!(),
                };
                let rest = if mul_terms.len() == 1 {
                    mul_terms.pop().unwrap()
                } else {
                    Sym::Pool {
                        op: AssocOp::Mul,
                        terms: mul_terms,
                    }
                };
                *leftovers.entry(rest).or_insert(0.0) += coef;
            }
            exp => {
                *leftovers.entry(exp).or_insert(0.0) += 1.0;
            }
        }
    }

    let mut new_terms = Vec::new();

    if head != 0.0 {
        new_terms.push(Sym::num(head));
    }

    for (term, coef) in leftovers {
        if coef == 0.0 {
            continue;
        }
        new_terms.push(if coef == 1.0 {
            term
        } else {
            Sym::assoc_combine(AssocOp::Mul, Sym::num(coef), term)
        });
    }

    if new_terms.is_empty() {
        new_terms.push(Sym::ZERO);
    }

    new_terms
}

/// Collects numeric factors into a single head and like bases into
/// exponent-weighted entries. A zero head annihilates the whole pool.
pub fn mul_fold(terms: Vec<Sym>) -> Vec<Sym> {
    let mut head = 1.0_f64;
    let mut leftovers: OrderMap<Sym, f64> = OrderMap::new();

    for term in terms {
        match term {
            Sym::Num(num) => head *= num.0,
            Sym::Pow { base, exponent } if exponent.is_number() => {
                let pow = match *exponent {
                    Sym::Num(num) => num.0,
                    _ => unreachable!(),
                };
                *leftovers.entry(*base).or_insert(0.0) += pow;
            }
            exp => {
                *leftovers.entry(exp).or_insert(0.0) += 1.0;
            }
        }
    }

    if head == 0.0 {
        return vec![Sym::ZERO];
    }

    let mut new_terms = Vec::new();

    if head != 1.0 {
        new_terms.push(Sym::num(head));
    }

    for (base, pow) in leftovers {
        if pow == 0.0 {
            continue;
        }
        new_terms.push(if pow == 1.0 {
            base
        } else {
            Sym::Pow {
                base: base.into(),
                exponent: Sym::num(pow).into(),
            }
        });
    }

    if new_terms.is_empty() {
        new_terms.push(Sym::ONE);
    }

    new_terms
}

pub fn pow_fold(base: Sym, exponent: Sym) -> SymResult<Sym> {
    match (base, exponent) {
        (Sym::Num(b), Sym::Num(e)) => {
            if b.is_zero() && e.0 < 0.0 {
                return Err(SymError::DivisionByZero);
            }
            let val = b.0.powf(e.0);
            if val.is_nan() {
                return Err(SymError::NonRealPower {
                    base: b.0,
                    exponent: e.0,
                });
            }
            Ok(Sym::num(val))
        }
        (_, Sym::Num(e)) if e.is_zero() => Ok(Sym::ONE),
        (base, Sym::Num(e)) if e.is_one() => Ok(base),
        // Nested numeric exponents combine: (b^m)^n = b^(m*n)
        (
            Sym::Pow {
                base: inner,
                exponent: inner_exp,
            },
            Sym::Num(e),
        ) => {
            if let Sym::Num(inner_e) = inner_exp.as_ref() {
                pow_fold(*inner, Sym::num(inner_e.0 * e.0))
            } else {
                Ok(Sym::Pow {
                    base: Sym::Pow {
                        base: inner,
                        exponent: inner_exp,
                    }
                    .into(),
                    exponent: Sym::Num(e).into(),
                })
            }
        }
        (Sym::Num(b), _) if b.is_one() => Ok(Sym::ONE),
        (base, exponent) => Ok(Sym::Pow {
            base: base.into(),
            exponent: exponent.into(),
        }),
    }
}

pub fn apply_fold(func: Func, arg: Sym) -> SymResult<Sym> {
    match (func, arg) {
        (Func::Exp, Sym::Num(num)) => Ok(Sym::num(num.0.exp())),
        (
            Func::Exp,
            Sym::Apply {
                func: Func::Ln,
                arg,
            },
        ) => Ok(*arg),
        (Func::Ln, Sym::Num(num)) => {
            if num.0 <= 0.0 {
                Err(SymError::LogNonpositive { arg: num.0 })
            } else {
                Ok(Sym::num(num.0.ln()))
            }
        }
        (
            Func::Ln,
            Sym::Apply {
                func: Func::Exp,
                arg,
            },
        ) => Ok(*arg),
        (func, arg) => Ok(Sym::Apply {
            func,
            arg: arg.into(),
        }),
    }
}
