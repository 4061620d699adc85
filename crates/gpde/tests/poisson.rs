//! End-to-end check on a 1-D Poisson problem: u'' = 2 on (0, 1) with
//! u(0) = 0 and u(1) = 1, whose solution is u(x) = x^2.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;

use gpde::compile::compile_operator;
use gpde::gp::{assemble_joint, infer};
use gpde::kernel::{SymKernel, rbf_kernel};
use gpde::pde::parse;
use gpde::sample::{BoundarySpec, gen_grid_points, sample_uniform_grid};

fn column(vals: &[f64]) -> DMatrix<f64> {
    DMatrix::from_column_slice(vals.len(), 1, vals)
}

#[test]
fn posterior_mean_solves_the_poisson_problem() {
    let node = parse("d(d(u, x0), x0)").unwrap();
    let (kernel_exp, x, y) = rbf_kernel(1, 1.0, 1.0).unwrap();
    let compiled = compile_operator(&node, &kernel_exp, &x, &y).unwrap();

    let lxy = SymKernel::new(compiled.lxy, &x, &y).unwrap();
    let lx = SymKernel::new(compiled.lx, &x, &y).unwrap();
    let ly = SymKernel::new(compiled.ly, &x, &y).unwrap();
    let kernel = SymKernel::new(kernel_exp, &x, &y).unwrap();

    // interior collocation points and the two boundary points
    let interior_ranges = DMatrix::from_row_slice(2, 1, &[0.1, 0.9]);
    let x_domain = gen_grid_points(&interior_ranges, 5).unwrap();
    let x_boundary = column(&[0.0, 1.0]);

    // observations: u'' = 2 at every interior point, u at the boundary
    let u_train = column(&[2.0, 2.0, 2.0, 2.0, 2.0, 0.0, 1.0]);

    let theta = assemble_joint(&lxy, &lx, &kernel, &x_domain, &x_boundary, 1e-9).unwrap();
    let mean = infer(
        &theta, &ly, &kernel, &x_domain, &x_boundary, &u_train, &x_boundary,
    )
    .unwrap();

    // boundary conditions are reproduced nearly exactly
    assert!((mean[(0, 0)] - 0.0).abs() < 1e-3);
    assert!((mean[(1, 0)] - 1.0).abs() < 1e-3);

    // the posterior tracks the analytic solution across the domain
    let full_ranges = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
    let x_test = gen_grid_points(&full_ranges, 9).unwrap();
    let mean = infer(
        &theta, &ly, &kernel, &x_domain, &x_boundary, &u_train, &x_test,
    )
    .unwrap();
    assert_eq!((mean.nrows(), mean.ncols()), (9, 1));
    for i in 0..9 {
        let t = x_test[(i, 0)];
        assert!(
            (mean[(i, 0)] - t * t).abs() < 0.05,
            "posterior mean {} at {} too far from {}",
            mean[(i, 0)],
            t,
            t * t
        );
    }
}

#[test]
fn sampled_training_sets_assemble_and_factor() {
    let node = parse("d(d(u, x0), x0) + d(d(u, x1), x1)").unwrap();
    let (kernel_exp, x, y) = rbf_kernel(2, 1.0, 1.0).unwrap();
    let compiled = compile_operator(&node, &kernel_exp, &x, &y).unwrap();

    let lxy = SymKernel::new(compiled.lxy, &x, &y).unwrap();
    let lx = SymKernel::new(compiled.lx, &x, &y).unwrap();
    let ly = SymKernel::new(compiled.ly, &x, &y).unwrap();
    let kernel = SymKernel::new(kernel_exp, &x, &y).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let ranges = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
    let specs = [
        BoundarySpec::new(3, vec![Some(0.0), None]),
        BoundarySpec::new(3, vec![Some(1.0), None]),
        BoundarySpec::new(3, vec![None, Some(0.0)]),
        BoundarySpec::new(3, vec![None, Some(1.0)]),
    ];
    let (x_domain, x_boundary) = sample_uniform_grid(&ranges, 8, &specs, &mut rng).unwrap();

    let theta = assemble_joint(&lxy, &lx, &kernel, &x_domain, &x_boundary, 1e-6).unwrap();
    assert_eq!(theta.nrows(), 8 + 12);
    for i in 0..20 {
        for j in 0..20 {
            assert!((theta[(i, j)] - theta[(j, i)]).abs() < 1e-9);
        }
    }

    // harmonic observations: the laplacian of u(x) = x0 - x1 is zero
    let mut u_train = DMatrix::zeros(20, 1);
    for i in 0..12 {
        u_train[(8 + i, 0)] = x_boundary[(i, 0)] - x_boundary[(i, 1)];
    }

    let x_test = gen_grid_points(&ranges, 3).unwrap();
    let mean = infer(
        &theta, &ly, &kernel, &x_domain, &x_boundary, &u_train, &x_test,
    )
    .unwrap();
    assert_eq!((mean.nrows(), mean.ncols()), (9, 1));

    // the posterior is finite and stays in the range of the training data
    for i in 0..9 {
        assert!(mean[(i, 0)].is_finite());
        assert!(mean[(i, 0)].abs() <= 2.0);
    }
}
