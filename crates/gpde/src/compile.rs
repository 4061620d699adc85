use crate::calculus::derivative;
use crate::error::{Error, Result};
use crate::pde::{ArithOp, PdeExp};
use crate::sym::Sym;
use crate::vector::SymVector;

/// The compiled meaning of a PDE operator node: a pure function of a kernel
/// expression and a coordinate vector, returning a new kernel expression.
pub type LinOp = Box<dyn Fn(&Sym, &SymVector) -> Result<Sym>>;

/// Compiles an operator tree into a composable linear-operator function.
pub fn compile(node: &PdeExp) -> LinOp {
    match node {
        PdeExp::InputVar(id) => {
            let id = *id;
            Box::new(move |_, x| {
                x.get(id).cloned().ok_or(Error::DimensionMismatch {
                    expected: id + 1,
                    got: x.len(),
                })
            })
        }
        PdeExp::TargetVar => Box::new(|kernel, _| Ok(kernel.clone())),
        PdeExp::Constant(val) => {
            let val = *val;
            Box::new(move |_, _| Ok(Sym::num(val)))
        }
        PdeExp::Binary { op, left, right } => {
            let left_fn = compile(left);
            let right_fn = compile(right);
            let op = *op;
            Box::new(move |kernel, x| {
                let left = left_fn(kernel, x)?;
                let right = right_fn(kernel, x)?;
                Ok(match op {
                    ArithOp::Plus => left + right,
                    ArithOp::Minus => left - right,
                    ArithOp::Times => left * right,
                    ArithOp::Div => left / right,
                })
            })
        }
        PdeExp::Differential { num, den } => {
            let num_fn = compile(num);
            let den_fn = compile(den);
            Box::new(move |kernel, x| {
                let num = num_fn(kernel, x)?;
                let den = den_fn(kernel, x)?;
                Ok(derivative(&num, &den)?)
            })
        }
    }
}

/// The three kernel transformations needed to regress on PDE-operator
/// observations: the operator applied to the kernel's first argument, its
/// second argument, and both arguments in turn.
#[derive(Debug, Clone)]
pub struct CompiledOperator {
    pub lxy: Sym,
    pub lx: Sym,
    pub ly: Sym,
}

/// Applies the compiled operator to the base kernel with respect to each
/// operand vector, simplifying every derived expression.
pub fn compile_operator(
    node: &PdeExp,
    kernel: &Sym,
    sym_x: &SymVector,
    sym_y: &SymVector,
) -> Result<CompiledOperator> {
    let linop = compile(node);
    let lx = linop(kernel, sym_x)?.simplify()?;
    let ly = linop(kernel, sym_y)?.simplify()?;
    let lxy = linop(&lx, sym_y)?.simplify()?;
    Ok(CompiledOperator { lxy, lx, ly })
}
