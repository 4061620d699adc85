use std::fmt::Display;

use crate::sym::{AssocOp, Num, POW_PRECEDENCE, Sym};

impl Display for Num {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn infix_precedence(exp: &Sym) -> Option<u8> {
    match exp {
        // Negative numbers render with a leading minus, binding like a sum
        Sym::Num(num) if num.is_negative() => Some(AssocOp::Add.precedence()),
        Sym::Pool { op, .. } => Some(op.precedence()),
        Sym::Pow { .. } => Some(POW_PRECEDENCE),
        _ => None,
    }
}

fn wrap_if(s: &str, wrap: bool) -> String {
    if wrap {
        format!("({s})")
    } else {
        s.to_string()
    }
}

impl Display for Sym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sym::Num(num) => num.to_string(),
            Sym::Var { name } => name.clone(),
            Sym::Pool { op, terms } => {
                let prec = op.precedence();

                let mut terms_iter = terms.iter();

                let mut s = match terms_iter.next() {
                    None => String::new(),
                    Some(num) if *num == Sym::NEGATIVE_ONE && *op == AssocOp::Mul => {
                        "-".to_owned()
                    }
                    Some(exp) => wrap_if(
                        &exp.to_string(),
                        infix_precedence(exp).is_some_and(|sub_prec| sub_prec <= prec),
                    ),
                };

                for term in terms_iter {
                    let term_str = wrap_if(
                        &term.to_string(),
                        infix_precedence(term).is_some_and(|sub_prec| sub_prec <= prec),
                    );

                    let prefixed_str = if let Some(rest) = term_str.strip_prefix('-')
                        && *op == AssocOp::Add
                    {
                        format!(" - {rest}")
                    } else if let Sym::Pow { base, exponent } = term
                        && **exponent == Sym::NEGATIVE_ONE
                        && *op == AssocOp::Mul
                    {
                        let base_str = wrap_if(
                            &base.to_string(),
                            infix_precedence(base).is_some_and(|sub_prec| sub_prec <= prec),
                        );
                        format!(" / {base_str}")
                    } else if s == "-" && *op == AssocOp::Mul {
                        term_str
                    } else {
                        format!(" {} {}", op.symbol(), term_str)
                    };

                    s.push_str(&prefixed_str);
                }

                s
            }
            Sym::Pow { base, exponent } => {
                let base_str = wrap_if(
                    &base.to_string(),
                    infix_precedence(base).is_some_and(|sub_prec| sub_prec <= POW_PRECEDENCE),
                );
                let exponent_str = exponent.to_string();
                let wrap_exponent =
                    infix_precedence(exponent).is_some() || exponent_str.starts_with('-');
                format!("{base_str}^{}", wrap_if(&exponent_str, wrap_exponent))
            }
            Sym::Apply { func, arg } => format!("{}({})", func.name(), arg),
        };
        f.write_str(&s)
    }
}
