use nalgebra::DMatrix;
use rand::Rng;

use crate::error::{Error, Result};

/// One boundary face: how many points to draw and, per dimension, either a
/// fixed coordinate value or `None` to sample the dimension freely.
#[derive(Debug, Clone)]
pub struct BoundarySpec {
    pub n_samples: usize,
    pub fixed: Vec<Option<f64>>,
}

impl BoundarySpec {
    pub fn new(n_samples: usize, fixed: Vec<Option<f64>>) -> Self {
        Self { n_samples, fixed }
    }
}

fn check_two_rows(dim_ranges: &DMatrix<f64>) -> Result<()> {
    if dim_ranges.nrows() == 2 {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: 2,
            got: dim_ranges.nrows(),
        })
    }
}

/// Samples `n_domain` interior points uniformly from the box described by
/// `dim_ranges` (row 0 holds the per-dimension minima, row 1 the maxima)
/// and one batch of boundary points per spec, stacked vertically.
///
/// Returns `(domain, boundary)`, each with one point per row.
pub fn sample_uniform_grid(
    dim_ranges: &DMatrix<f64>,
    n_domain: usize,
    boundary_spec: &[BoundarySpec],
    rng: &mut impl Rng,
) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    check_two_rows(dim_ranges)?;
    let n_dims = dim_ranges.ncols();

    let mut uniform = |d: usize| {
        let a = dim_ranges[(0, d)];
        let b = dim_ranges[(1, d)];
        a + (b - a) * rng.gen_range(0.0..1.0)
    };

    let mut x_domain = DMatrix::zeros(n_domain, n_dims);
    for i in 0..n_domain {
        for d in 0..n_dims {
            x_domain[(i, d)] = uniform(d);
        }
    }

    let n_boundary: usize = boundary_spec.iter().map(|spec| spec.n_samples).sum();
    let mut x_boundary = DMatrix::zeros(n_boundary, n_dims);
    let mut row = 0;
    for spec in boundary_spec {
        if spec.fixed.len() != n_dims {
            return Err(Error::DimensionMismatch {
                expected: n_dims,
                got: spec.fixed.len(),
            });
        }
        for _ in 0..spec.n_samples {
            for d in 0..n_dims {
                x_boundary[(row, d)] = match spec.fixed[d] {
                    Some(val) => val,
                    None => uniform(d),
                };
            }
            row += 1;
        }
    }

    Ok((x_domain, x_boundary))
}

/// Dense evaluation grid: `n_points` evenly spaced values per dimension,
/// crossed over all dimensions into an `n_points^D × D` point batch.
pub fn gen_grid_points(dim_ranges: &DMatrix<f64>, n_points: usize) -> Result<DMatrix<f64>> {
    check_two_rows(dim_ranges)?;
    let n_dims = dim_ranges.ncols();
    let total = n_points.pow(n_dims as u32);

    let mut out = DMatrix::zeros(total, n_dims);
    for row in 0..total {
        let mut rem = row;
        for d in 0..n_dims {
            let step = rem % n_points;
            rem /= n_points;
            let a = dim_ranges[(0, d)];
            let b = dim_ranges[(1, d)];
            let t = if n_points > 1 {
                step as f64 / (n_points - 1) as f64
            } else {
                0.0
            };
            out[(row, d)] = a + (b - a) * t;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn unit_square() -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 2, &[0.0, -1.0, 1.0, 1.0])
    }

    #[test]
    fn domain_samples_stay_inside_the_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let ranges = unit_square();
        let (domain, _) =
            sample_uniform_grid(&ranges, 40, &[BoundarySpec::new(1, vec![Some(0.0); 2])], &mut rng)
                .unwrap();

        assert_eq!((domain.nrows(), domain.ncols()), (40, 2));
        for i in 0..40 {
            assert!(domain[(i, 0)] >= 0.0 && domain[(i, 0)] <= 1.0);
            assert!(domain[(i, 1)] >= -1.0 && domain[(i, 1)] <= 1.0);
        }
    }

    #[test]
    fn boundary_samples_respect_fixed_dimensions() {
        let mut rng = StdRng::seed_from_u64(7);
        let ranges = unit_square();
        let specs = [
            BoundarySpec::new(3, vec![Some(0.0), None]),
            BoundarySpec::new(2, vec![None, Some(1.0)]),
        ];
        let (_, boundary) = sample_uniform_grid(&ranges, 1, &specs, &mut rng).unwrap();

        assert_eq!((boundary.nrows(), boundary.ncols()), (5, 2));
        for i in 0..3 {
            assert_eq!(boundary[(i, 0)], 0.0);
            assert!(boundary[(i, 1)] >= -1.0 && boundary[(i, 1)] <= 1.0);
        }
        for i in 3..5 {
            assert!(boundary[(i, 0)] >= 0.0 && boundary[(i, 0)] <= 1.0);
            assert_eq!(boundary[(i, 1)], 1.0);
        }
    }

    #[test]
    fn boundary_spec_dimension_must_match() {
        let mut rng = StdRng::seed_from_u64(7);
        let ranges = unit_square();
        let result = sample_uniform_grid(
            &ranges,
            1,
            &[BoundarySpec::new(2, vec![Some(0.0)])],
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn grid_points_cover_the_box() {
        let ranges = unit_square();
        let grid = gen_grid_points(&ranges, 3).unwrap();
        assert_eq!((grid.nrows(), grid.ncols()), (9, 2));

        // first dimension cycles fastest
        assert_eq!(grid[(0, 0)], 0.0);
        assert_eq!(grid[(1, 0)], 0.5);
        assert_eq!(grid[(2, 0)], 1.0);
        assert_eq!(grid[(0, 1)], -1.0);
        assert_eq!(grid[(4, 1)], 0.0);
        assert_eq!(grid[(8, 0)], 1.0);
        assert_eq!(grid[(8, 1)], 1.0);
    }
}
