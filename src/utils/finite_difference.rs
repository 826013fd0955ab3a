//! Finite difference methods for numerical differentiation.
//!
//! This module provides the fallbacks used when a fitting function is
//! built without an analytic derivative, and the default Jacobian of the
//! [`Problem`] trait.

use crate::error::{FitFuncError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default step size for forward differences.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Default relative step size for central differences.
pub const DEFAULT_CENTRAL_EPSILON: f64 = 1e-6;

/// Scale the step to the magnitude of the point being perturbed.
fn scaled_step(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The step size for finite differences (optional)
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    // Evaluate residuals at the initial point
    let residuals = problem.eval(params)?;

    // Check residual dimensions
    if residuals.len() != n_residuals {
        return Err(FitFuncError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    // Compute Jacobian using forward differences
    for j in 0..n_params {
        // Perturb j-th parameter, adapting epsilon to its scale
        let mut params_perturbed = params.clone();
        let eps_j = scaled_step(params[j], eps);
        params_perturbed[j] += eps_j;

        // Evaluate residuals at perturbed point
        let residuals_perturbed = problem.eval(&params_perturbed)?;

        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

/// Derivative of a scalar function of one variable by central differences.
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `x` - The point at which to evaluate the derivative
/// * `epsilon` - The relative step size (optional)
pub fn derivative<F>(f: F, x: f64, epsilon: Option<f64>) -> f64
where
    F: Fn(f64) -> f64,
{
    let h = scaled_step(x, epsilon.unwrap_or(DEFAULT_CENTRAL_EPSILON));
    (f(x + h) - f(x - h)) / (2.0 * h)
}

/// Compute the gradient of a scalar function using central finite differences.
///
/// The gradient is the vector of partial derivatives of the function with
/// respect to the parameters: grad[j] = ∂f/∂param[j].
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The parameter values at which to evaluate the gradient
/// * `epsilon` - The relative step size (optional)
pub fn gradient<F>(f: F, params: &[f64], epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&[f64]) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_CENTRAL_EPSILON);
    let mut grad = Array1::zeros(params.len());
    let mut perturbed = params.to_vec();

    for j in 0..params.len() {
        let eps_j = scaled_step(params[j], eps);

        perturbed[j] = params[j] + eps_j;
        let f_forward = f(&perturbed)?;
        perturbed[j] = params[j] - eps_j;
        let f_backward = f(&perturbed)?;
        perturbed[j] = params[j];

        grad[j] = (f_forward - f_backward) / (2.0 * eps_j);
    }

    Ok(grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // Test problem: r1 = x^2 - 1, r2 = y^2 - 2
    struct TestProblem;

    impl Problem for TestProblem {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let x = params[0];
            let y = params[1];
            Ok(array![x.powi(2) - 1.0, y.powi(2) - 2.0])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_derivative() {
        // d/dx sin(x) at 0.5
        let d = derivative(f64::sin, 0.5, None);
        assert_relative_eq!(d, 0.5f64.cos(), epsilon = 1e-8);

        // Near zero the step falls back to an absolute one
        let d = derivative(|x| x * x, 0.0, None);
        assert_relative_eq!(d, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_gradient() {
        // f(x, y) = x^2 + 2*y^2 + x*y at (2, 3) has gradient [7, 14]
        let f = |p: &[f64]| -> Result<f64> { Ok(p[0].powi(2) + 2.0 * p[1].powi(2) + p[0] * p[1]) };
        let grad = gradient(f, &[2.0, 3.0], None).unwrap();

        assert_eq!(grad.len(), 2);
        assert_relative_eq!(grad[0], 7.0, epsilon = 1e-6);
        assert_relative_eq!(grad[1], 14.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gradient_propagates_errors() {
        let f = |_: &[f64]| -> Result<f64> { Err(FitFuncError::FunctionEvaluation("boom".into())) };
        assert!(matches!(
            gradient(f, &[1.0], None),
            Err(FitFuncError::FunctionEvaluation(_))
        ));
    }

    #[test]
    fn test_jacobian() {
        // Analytical Jacobian at (2, 3): [[4, 0], [0, 6]]
        let params = array![2.0, 3.0];
        let jac = jacobian(&TestProblem, &params, None).unwrap();

        assert_eq!(jac.shape(), &[2, 2]);
        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 0]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 6.0, epsilon = 1e-5);
    }
}
