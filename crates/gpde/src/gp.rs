use nalgebra::{Cholesky, DMatrix};

use crate::error::{Error, Result};
use crate::kernel::SymKernel;

/// Builds the joint training covariance matrix
///
/// ```text
/// [ lxy(domain, domain)    lx(domain, boundary)     ]
/// [ lx(domain, boundary)^T kernel(boundary, boundary) ]
/// ```
///
/// Joint kernel matrices are often poorly conditioned, so `condition`
/// scales an additive diagonal term: the domain block receives
/// `condition * trace(A) / trace(C)` and the boundary block `condition`.
/// Set `condition` to zero to disable. Definiteness is not validated here;
/// a non-positive-definite result surfaces from the factorization in
/// [`infer`].
pub fn assemble_joint(
    lxy: &SymKernel,
    lx: &SymKernel,
    kernel: &SymKernel,
    x_domain: &DMatrix<f64>,
    x_boundary: &DMatrix<f64>,
    condition: f64,
) -> Result<DMatrix<f64>> {
    let top_left = lxy.evaluate(x_domain, x_domain)?;
    let top_right = lx.evaluate(x_domain, x_boundary)?;
    let bottom_right = kernel.evaluate(x_boundary, x_boundary)?;

    let n_domain = top_left.nrows();
    let n_boundary = bottom_right.nrows();
    let ratio = top_left.trace() / bottom_right.trace();

    let mut theta = DMatrix::zeros(n_domain + n_boundary, n_domain + n_boundary);
    theta.view_mut((0, 0), (n_domain, n_domain)).copy_from(&top_left);
    theta
        .view_mut((0, n_domain), (n_domain, n_boundary))
        .copy_from(&top_right);
    theta
        .view_mut((n_domain, 0), (n_boundary, n_domain))
        .copy_from(&top_right.transpose());
    theta
        .view_mut((n_domain, n_domain), (n_boundary, n_boundary))
        .copy_from(&bottom_right);

    for i in 0..n_domain {
        theta[(i, i)] += condition * ratio;
    }
    for i in 0..n_boundary {
        theta[(n_domain + i, n_domain + i)] += condition;
    }

    Ok(theta)
}

/// Posterior mean of the target function at `x_test`, given the factored
/// training system.
///
/// `u_train` stacks the operator observations at `x_domain` over the
/// function observations at `x_boundary`, one column per output dimension.
pub fn infer(
    theta: &DMatrix<f64>,
    ly: &SymKernel,
    kernel: &SymKernel,
    x_domain: &DMatrix<f64>,
    x_boundary: &DMatrix<f64>,
    u_train: &DMatrix<f64>,
    x_test: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    if u_train.nrows() != theta.nrows() {
        return Err(Error::DimensionMismatch {
            expected: theta.nrows(),
            got: u_train.nrows(),
        });
    }

    let factor = Cholesky::new(theta.clone()).ok_or(Error::NotPositiveDefinite)?;

    let k_test_domain = ly.evaluate(x_test, x_domain)?;
    let k_test_boundary = kernel.evaluate(x_test, x_boundary)?;

    let n_test = x_test.nrows();
    let n_domain = k_test_domain.ncols();
    let n_boundary = k_test_boundary.ncols();
    let mut k_test_train = DMatrix::zeros(n_test, n_domain + n_boundary);
    k_test_train
        .view_mut((0, 0), (n_test, n_domain))
        .copy_from(&k_test_domain);
    k_test_train
        .view_mut((0, n_domain), (n_test, n_boundary))
        .copy_from(&k_test_boundary);

    let alpha = factor.solve(u_train);
    Ok(&k_test_train * alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_operator;
    use crate::kernel::rbf_kernel;
    use crate::pde::parse;

    fn second_derivative_kernels() -> (SymKernel, SymKernel, SymKernel, SymKernel) {
        let node = parse("d(d(u, x0), x0)").unwrap();
        let (kernel, x, y) = rbf_kernel(1, 1.0, 1.0).unwrap();
        let compiled = compile_operator(&node, &kernel, &x, &y).unwrap();
        (
            SymKernel::new(compiled.lxy, &x, &y).unwrap(),
            SymKernel::new(compiled.lx, &x, &y).unwrap(),
            SymKernel::new(compiled.ly, &x, &y).unwrap(),
            SymKernel::new(kernel, &x, &y).unwrap(),
        )
    }

    fn column(vals: &[f64]) -> DMatrix<f64> {
        DMatrix::from_column_slice(vals.len(), 1, vals)
    }

    #[test]
    fn joint_matrix_is_symmetric() {
        let (lxy, lx, _, kernel) = second_derivative_kernels();
        let x_domain = column(&[0.25, 0.5, 0.75]);
        let x_boundary = column(&[0.0, 1.0]);

        let theta = assemble_joint(&lxy, &lx, &kernel, &x_domain, &x_boundary, 0.0).unwrap();
        assert_eq!(theta.nrows(), 5);
        for i in 0..5 {
            for j in 0..5 {
                assert!((theta[(i, j)] - theta[(j, i)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn conditioning_raises_the_diagonal_by_the_stated_amount() {
        let (lxy, lx, _, kernel) = second_derivative_kernels();
        let x_domain = column(&[0.2, 0.6]);
        let x_boundary = column(&[0.0, 1.0]);

        let plain = assemble_joint(&lxy, &lx, &kernel, &x_domain, &x_boundary, 0.0).unwrap();
        let condition = 1e-3;
        let conditioned =
            assemble_joint(&lxy, &lx, &kernel, &x_domain, &x_boundary, condition).unwrap();

        let ratio = plain.view((0, 0), (2, 2)).trace() / plain.view((2, 2), (2, 2)).trace();
        for i in 0..2 {
            let increase = conditioned[(i, i)] - plain[(i, i)];
            assert!((increase - condition * ratio).abs() < 1e-12);
        }
        for i in 2..4 {
            let increase = conditioned[(i, i)] - plain[(i, i)];
            assert!((increase - condition).abs() < 1e-12);
        }

        // off-diagonal entries are untouched and symmetry is preserved
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    assert_eq!(conditioned[(i, j)], plain[(i, j)]);
                }
                assert!((conditioned[(i, j)] - conditioned[(j, i)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn boundary_observations_interpolate() {
        // Rows of the cross block at boundary training points coincide with
        // rows of theta, so the posterior mean there reproduces the
        // observations up to factorization tolerance
        let (lxy, lx, ly, kernel) = second_derivative_kernels();
        let x_domain = column(&[0.25, 0.5, 0.75]);
        let x_boundary = column(&[0.0, 1.0]);

        let theta = assemble_joint(&lxy, &lx, &kernel, &x_domain, &x_boundary, 0.0).unwrap();
        let u_train = column(&[2.0, 2.0, 2.0, 0.0, 1.0]);

        let mean = infer(
            &theta, &ly, &kernel, &x_domain, &x_boundary, &u_train, &x_boundary,
        )
        .unwrap();
        assert_eq!((mean.nrows(), mean.ncols()), (2, 1));
        assert!((mean[(0, 0)] - 0.0).abs() < 1e-6);
        assert!((mean[(1, 0)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn non_positive_definite_matrices_are_reported() {
        let (_, _, ly, kernel) = second_derivative_kernels();
        let x_domain = column(&[0.25, 0.5]);
        let x_boundary = column(&[0.0, 1.0]);
        let theta = DMatrix::from_diagonal_element(4, 4, -1.0);
        let u_train = column(&[0.0, 0.0, 0.0, 0.0]);

        let result = infer(
            &theta, &ly, &kernel, &x_domain, &x_boundary, &u_train, &x_boundary,
        );
        assert_eq!(result, Err(Error::NotPositiveDefinite));
    }

    #[test]
    fn observation_count_must_match_training_matrix() {
        let (lxy, lx, ly, kernel) = second_derivative_kernels();
        let x_domain = column(&[0.25, 0.5]);
        let x_boundary = column(&[0.0, 1.0]);
        let theta = assemble_joint(&lxy, &lx, &kernel, &x_domain, &x_boundary, 1e-6).unwrap();
        let u_train = column(&[1.0, 2.0]);

        let result = infer(
            &theta, &ly, &kernel, &x_domain, &x_boundary, &u_train, &x_boundary,
        );
        assert_eq!(
            result,
            Err(Error::DimensionMismatch {
                expected: 4,
                got: 2
            })
        );
    }
}
