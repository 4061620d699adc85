use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;
use lazy_regex::{regex_captures, regex_is_match};

use super::{ArithOp, DIFFERENTIAL_TOKEN, PdeExp, arith_op_from_char};
use crate::error::{Error, Result};

/// Strips whitespace so that spans index directly into the scanned text.
pub fn preparse(subject: &str) -> String {
    subject.replace([' ', '\t', '\n'], "")
}

type Span = (usize, usize);

fn syntax(message: impl Into<String>, span: Span) -> Error {
    Error::Syntax {
        message: message.into(),
        start: span.0,
        end: span.1,
    }
}

/// General expression tree built in the first parse phase, before the
/// grammar of linear PDE operators is enforced.
#[derive(Debug, Clone, PartialEq)]
enum RawExp {
    Num {
        val: f64,
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<RawExp>,
        span: Span,
    },
    Binary {
        op: ArithOp,
        left: Box<RawExp>,
        right: Box<RawExp>,
        span: Span,
    },
}

impl RawExp {
    fn span(&self) -> Span {
        match self {
            Self::Num { span, .. }
            | Self::Ident { span, .. }
            | Self::Call { span, .. }
            | Self::Binary { span, .. } => *span,
        }
    }
}

impl Display for RawExp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn wrap(exp: &RawExp) -> String {
            if matches!(exp, RawExp::Binary { .. }) {
                format!("({exp})")
            } else {
                exp.to_string()
            }
        }
        match self {
            Self::Num { val, .. } => write!(f, "{val}"),
            Self::Ident { name, .. } => f.write_str(name),
            Self::Call { name, args, .. } => {
                write!(f, "{name}({})", args.iter().map(RawExp::to_string).join(", "))
            }
            Self::Binary {
                op, left, right, ..
            } => write!(f, "{} {} {}", wrap(left), op.symbol(), wrap(right)),
        }
    }
}

/// Splits the subject at every top-level operator of lowest precedence,
/// returning the separated terms and the operators between them.
fn split_at_least_precedent(subject: &str) -> (Vec<&str>, Vec<ArithOp>) {
    let mut terms = Vec::new();
    let mut ops = Vec::new();

    let mut depth = 0_usize;
    let mut lowest_precedence = u8::MAX;
    let mut next_term_start = 0;

    for (index, c) in subject.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && index > 0 => {
                if let Some(op) = arith_op_from_char(c) {
                    let prec = op.precedence();
                    match prec.cmp(&lowest_precedence) {
                        Ordering::Less => {
                            terms.clear();
                            ops.clear();
                            lowest_precedence = prec;

                            terms.push(&subject[..index]);
                        }
                        Ordering::Equal => {
                            terms.push(&subject[next_term_start..index]);
                        }
                        Ordering::Greater => continue,
                    }
                    ops.push(op);
                    next_term_start = index + c.len_utf8();
                }
            }
            _ => (),
        }
    }

    terms.push(&subject[next_term_start..]);
    (terms, ops)
}

fn parse_arguments(args_string: &str, start: usize) -> Result<Vec<RawExp>> {
    let mut args = Vec::new();

    let mut depth = 0_usize;
    let mut next_term_start = 0;

    for (index, c) in args_string.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                let sub = &args_string[next_term_start..index];
                args.push(parse_bounded(sub, start + next_term_start)?);
                next_term_start = index + 1;
            }
            _ => (),
        }
    }

    if next_term_start < args_string.len() {
        let tail = &args_string[next_term_start..];
        args.push(parse_bounded(tail, start + next_term_start)?);
    }

    Ok(args)
}

fn parse_bounded(subject: &str, start: usize) -> Result<RawExp> {
    if subject.is_empty() {
        return Err(syntax("cannot parse empty expression", (start, start)));
    }

    let span = (start, start + subject.len());

    // Binary operators, lowest precedence first, folded left-associatively
    let (terms, ops) = split_at_least_precedent(subject);
    if !ops.is_empty() {
        let mut start_indices = vec![start];
        let mut index = start;
        for term in terms.iter().take(ops.len()) {
            // Operator symbols are single ASCII characters
            index += term.len() + 1;
            start_indices.push(index);
        }

        let mut terms_iter = terms.into_iter().zip(start_indices);
        let (first_term, first_start) = terms_iter.next().unwrap();
        let mut exp = parse_bounded(first_term, first_start)?;

        for ((term, term_start), op) in terms_iter.zip(ops) {
            let right = parse_bounded(term, term_start)?;
            let span = (exp.span().0, term_start + term.len());
            exp = RawExp::Binary {
                op,
                left: exp.into(),
                right: right.into(),
                span,
            };
        }

        return Ok(exp);
    }

    // Function calls
    if let Some((_, name, insides)) =
        regex_captures!(r"^(\p{L}[\p{L}_0-9]*)\((.*)\)$", subject)
    {
        let args = parse_arguments(insides, start + name.len() + 1)?;
        return Ok(RawExp::Call {
            name: name.to_owned(),
            args,
            span,
        });
    }

    // Parenthesized sub-expressions
    if let Some(inner) = subject.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        return parse_bounded(inner, start + 1);
    }

    // Numeric literals
    if regex_is_match!(r"^-?[0-9]+(?:\.[0-9]+)?(?:[eE]-?[0-9]+)?$", subject) {
        let val = f64::from_str(subject).expect("failed parsing numeric literal");
        return Ok(RawExp::Num { val, span });
    }

    // Identifiers
    if regex_is_match!(r"^\p{L}[\p{L}0-9_]*$", subject) {
        return Ok(RawExp::Ident {
            name: subject.to_owned(),
            span,
        });
    }

    Err(syntax(format!("unparsable expression '{subject}'"), span))
}

/// Bottom-up constant folding: any binary node whose operands are both
/// numeric literals is replaced by its value. A single pass reaches a
/// fixpoint because children are folded before their parents.
fn fold_constants(exp: RawExp) -> RawExp {
    match exp {
        RawExp::Binary {
            op,
            left,
            right,
            span,
        } => {
            let left = fold_constants(*left);
            let right = fold_constants(*right);
            if let (RawExp::Num { val: a, .. }, RawExp::Num { val: b, .. }) = (&left, &right) {
                RawExp::Num {
                    val: op.apply(*a, *b),
                    span,
                }
            } else {
                RawExp::Binary {
                    op,
                    left: left.into(),
                    right: right.into(),
                    span,
                }
            }
        }
        RawExp::Call { name, args, span } => RawExp::Call {
            name,
            args: args.into_iter().map(fold_constants).collect(),
            span,
        },
        atom => atom,
    }
}

fn convert_ident(name: &str, span: Span) -> Result<PdeExp> {
    if name == "u" {
        return Ok(PdeExp::TargetVar);
    }
    if let Some(rest) = name.strip_prefix('x') {
        let Ok(id) = rest.parse::<usize>() else {
            return Err(syntax(
                format!("expected variable 'x' to be followed by an integer, got '{name}'"),
                span,
            ));
        };
        return Ok(PdeExp::InputVar(id));
    }
    Err(syntax(format!("unknown variable name '{name}'"), span))
}

/// Validates the folded tree against the linear PDE operator grammar.
fn convert(exp: &RawExp) -> Result<PdeExp> {
    match exp {
        RawExp::Num { val, .. } => Ok(PdeExp::Constant(*val)),
        RawExp::Ident { name, span } => convert_ident(name, *span),
        RawExp::Call { name, args, span } => {
            if name != DIFFERENTIAL_TOKEN {
                return Err(syntax(
                    format!("expected differential operator '{DIFFERENTIAL_TOKEN}' as function, got '{name}'"),
                    *span,
                ));
            }
            if args.len() != 2 {
                return Err(syntax(
                    "expected differential operator to have exactly two arguments",
                    *span,
                ));
            }
            let num = convert(&args[0])?;
            let den = convert(&args[1])?;
            if !matches!(den, PdeExp::InputVar(..)) {
                return Err(Error::InvalidDifferentialDenominator {
                    den: args[1].to_string(),
                });
            }
            Ok(PdeExp::Differential {
                num: num.into(),
                den: den.into(),
            })
        }
        RawExp::Binary { op, left, right, .. } => {
            if matches!(op, ArithOp::Times | ArithOp::Div)
                && !matches!(**left, RawExp::Num { .. })
                && !matches!(**right, RawExp::Num { .. })
            {
                return Err(Error::NonlinearOperator {
                    exp: exp.to_string(),
                });
            }
            Ok(PdeExp::Binary {
                op: *op,
                left: convert(left)?.into(),
                right: convert(right)?.into(),
            })
        }
    }
}

/// Parses a linear PDE operator expression.
///
/// Parsing runs in three phases: a general expression tree is built first,
/// constants are folded bottom-up, and the folded tree is then validated
/// against the operator grammar.
pub fn parse(pde_expression: &str) -> Result<PdeExp> {
    let subject = preparse(pde_expression);
    let raw = parse_bounded(&subject, 0)?;
    let folded = fold_constants(raw);
    convert(&folded)
}

impl FromStr for PdeExp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}
