//! Parallel evaluation of fitting functions over many sample points.
//!
//! Each point is independent, so both the model values and the Jacobian rows
//! are computed with Rayon.

use ndarray::{Array1, Array2, Zip};
use rayon::prelude::*;

use crate::error::Result;
use crate::fit_function::FittingFunction;

/// Evaluate `func` at every point of `x` in parallel.
pub fn eval_parallel(func: &FittingFunction, a: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
    func.check_parameters(a)?;

    let model = func.model();
    let mut values = Array1::zeros(x.len());
    Zip::from(&mut values)
        .and(x)
        .par_for_each(|value, &xi| *value = model(a, xi));

    Ok(values)
}

/// Compute the Jacobian `J[i, j] = df(x_i)/da_j` with rows in parallel.
pub fn jacobian_parallel(
    func: &FittingFunction,
    a: &[f64],
    x: &Array1<f64>,
) -> Result<Array2<f64>> {
    func.check_parameters(a)?;

    let points = x.to_vec();
    let rows: Result<Vec<Array1<f64>>> = points
        .par_iter()
        .map(|&xi| func.eval_a_derivative(a, xi))
        .collect();

    let mut jac = Array2::zeros((x.len(), func.parameter_count()));
    for (mut row, values) in jac.rows_mut().into_iter().zip(rows?) {
        row.assign(&values);
    }
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions;
    use approx::assert_relative_eq;

    #[test]
    fn test_parallel_matches_sequential() {
        let func = functions::normal().unwrap();
        let a = [2.0, 0.5, 1.5, 0.1];
        let x = Array1::linspace(-5.0, 5.0, 2001);

        let sequential = func.eval_array(&a, &x).unwrap();
        let parallel = eval_parallel(&func, &a, &x).unwrap();
        for (s, p) in sequential.iter().zip(parallel.iter()) {
            assert_relative_eq!(*s, *p);
        }

        let sequential = func.jacobian(&a, &x).unwrap();
        let parallel = jacobian_parallel(&func, &a, &x).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_parallel_checks_parameters() {
        let func = functions::linear().unwrap();
        let x = Array1::linspace(0.0, 1.0, 4);
        assert!(eval_parallel(&func, &[1.0], &x).is_err());
        assert!(jacobian_parallel(&func, &[1.0, 2.0, 3.0], &x).is_err());
    }
}
