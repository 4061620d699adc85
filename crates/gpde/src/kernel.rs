use std::collections::HashMap;

use itertools::Itertools;
use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::sym::{AssocOp, Func, Sym, SymError};
use crate::vector::SymVector;

/// Kernel expression lowered to positional slots: every variable is
/// resolved to an index into the evaluation buffer once, at construction,
/// so batched evaluation performs no name lookups.
#[derive(Debug, Clone)]
enum Program {
    Num(f64),
    Slot(usize),
    Add(Vec<Program>),
    Mul(Vec<Program>),
    Pow(Box<Program>, Box<Program>),
    Apply(Func, Box<Program>),
}

impl Program {
    fn compile(exp: &Sym, slots: &HashMap<&str, usize>) -> Result<Self> {
        match exp {
            Sym::Num(num) => Ok(Self::Num(num.0)),
            Sym::Var { name } => slots
                .get(name.as_str())
                .map(|slot| Self::Slot(*slot))
                .ok_or_else(|| {
                    Error::Symbolic(SymError::UnboundVariable { name: name.clone() })
                }),
            Sym::Pool { op, terms } => {
                let programs: Vec<Self> = terms
                    .iter()
                    .map(|term| Self::compile(term, slots))
                    .try_collect()?;
                Ok(match op {
                    AssocOp::Add => Self::Add(programs),
                    AssocOp::Mul => Self::Mul(programs),
                })
            }
            Sym::Pow { base, exponent } => Ok(Self::Pow(
                Self::compile(base, slots)?.into(),
                Self::compile(exponent, slots)?.into(),
            )),
            Sym::Apply { func, arg } => {
                Ok(Self::Apply(*func, Self::compile(arg, slots)?.into()))
            }
        }
    }

    fn eval(&self, slots: &[f64]) -> f64 {
        match self {
            Self::Num(val) => *val,
            Self::Slot(slot) => slots[*slot],
            Self::Add(terms) => terms.iter().map(|term| term.eval(slots)).sum(),
            Self::Mul(terms) => terms.iter().map(|term| term.eval(slots)).product(),
            Self::Pow(base, exponent) => base.eval(slots).powf(exponent.eval(slots)),
            Self::Apply(Func::Exp, arg) => arg.eval(slots).exp(),
            Self::Apply(Func::Ln, arg) => arg.eval(slots).ln(),
        }
    }
}

/// A symbolic kernel expression bound to its two operand vectors, callable
/// densely over numeric point batches.
///
/// Evaluation is a pure function of its inputs; a `SymKernel` holds no
/// mutable state and may be invoked repeatedly and concurrently.
#[derive(Debug, Clone)]
pub struct SymKernel {
    exp: Sym,
    program: Program,
    n_dims: usize,
}

impl SymKernel {
    /// Binds `exp` to the operand vectors. The vectors must have equal
    /// length, and every variable in `exp` must belong to one of them.
    pub fn new(exp: Sym, x_var: &SymVector, y_var: &SymVector) -> Result<Self> {
        if x_var.len() != y_var.len() {
            return Err(Error::DimensionMismatch {
                expected: x_var.len(),
                got: y_var.len(),
            });
        }
        let n_dims = x_var.len();

        let mut slots = HashMap::new();
        for (i, sym) in x_var.iter().enumerate() {
            if let Sym::Var { name } = sym {
                slots.insert(name.as_str(), i);
            }
        }
        for (i, sym) in y_var.iter().enumerate() {
            if let Sym::Var { name } = sym {
                slots.insert(name.as_str(), n_dims + i);
            }
        }

        let program = Program::compile(&exp, &slots)?;
        Ok(Self {
            exp,
            program,
            n_dims,
        })
    }

    pub fn exp(&self) -> &Sym {
        &self.exp
    }

    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    /// Evaluates the kernel over the full cross product of the two point
    /// batches (one point per row), returning the dense
    /// `x.nrows() × y.nrows()` matrix.
    pub fn evaluate(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if x.ncols() != self.n_dims {
            return Err(Error::DimensionMismatch {
                expected: self.n_dims,
                got: x.ncols(),
            });
        }
        if y.ncols() != self.n_dims {
            return Err(Error::DimensionMismatch {
                expected: self.n_dims,
                got: y.ncols(),
            });
        }

        let n_row = x.nrows();
        let n_col = y.nrows();
        let mut slots = vec![0.0; 2 * self.n_dims];
        let mut out = DMatrix::zeros(n_row, n_col);

        for i in 0..n_row {
            for d in 0..self.n_dims {
                slots[d] = x[(i, d)];
            }
            for j in 0..n_col {
                for d in 0..self.n_dims {
                    slots[self.n_dims + d] = y[(j, d)];
                }
                out[(i, j)] = self.program.eval(&slots);
            }
        }

        Ok(out)
    }
}

/// The squared-exponential kernel `a^2 * exp(-|x - y|^2 / (2 l^2))` over
/// fresh operand vectors of the given dimension.
pub fn rbf_kernel(
    n_dims: usize,
    amplitude: f64,
    length_scale: f64,
) -> Result<(Sym, SymVector, SymVector)> {
    let x = SymVector::new("x", n_dims);
    let y = SymVector::new("y", n_dims);
    let delta = (&x - &y)?;
    let sq_norm = delta.dot(&delta)?;
    let kernel = Sym::num(amplitude).pow(Sym::num(2.0))
        * (-(sq_norm / Sym::num(2.0) / Sym::num(length_scale).pow(Sym::num(2.0)))).exp();
    Ok((kernel, x, y))
}
