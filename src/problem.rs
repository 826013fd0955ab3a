//! Problem definition trait and the fitting-function adapter.
//!
//! This module defines the `Problem` trait, which is what a nonlinear least
//! squares routine consumes: residuals and their Jacobian as functions of the
//! parameter vector. [`FitProblem`] builds such a problem from a
//! [`FittingFunction`] and [`FittingData`].

use crate::data::FittingData;
use crate::error::{FitFuncError, Result};
use crate::fit_function::FittingFunction;
use crate::utils::parallel;
use ndarray::{Array1, Array2, Axis};
use std::sync::Arc;

/// Data sets at least this large are evaluated with Rayon.
const PARALLEL_THRESHOLD: usize = 4096;

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix of the residuals at the given parameters.
    ///
    /// # Default Implementation
    ///
    /// Forward finite differences of [`eval`](Problem::eval).
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Check if this problem provides a custom Jacobian implementation.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

/// A fitting function paired with the data it should describe.
///
/// Residuals are `(f(a, x_i) - y_i) / yerr_i`, with unit weights when the
/// data carries no `yerr`. The Jacobian rows are the parameter derivatives of
/// the fitting function scaled the same way.
#[derive(Debug, Clone)]
pub struct FitProblem {
    func: Arc<FittingFunction>,
    data: FittingData,
    weights: Array1<f64>,
}

impl FitProblem {
    /// Create a problem for `func` over `data`.
    pub fn new(func: Arc<FittingFunction>, data: FittingData) -> Self {
        let weights = data.weights();
        Self {
            func,
            data,
            weights,
        }
    }

    /// The fitting function.
    pub fn function(&self) -> &Arc<FittingFunction> {
        &self.func
    }

    /// The data being fitted.
    pub fn data(&self) -> &FittingData {
        &self.data
    }

    /// Degrees of freedom: data points minus parameters.
    pub fn degrees_of_freedom(&self) -> isize {
        self.data.len() as isize - self.func.parameter_count() as isize
    }

    /// Weighted sum of squared residuals.
    pub fn chi_squared(&self, params: &Array1<f64>) -> Result<f64> {
        self.eval_cost(params)
    }

    /// Chi squared divided by the degrees of freedom.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` if there are no more data points than parameters.
    pub fn reduced_chi_squared(&self, params: &Array1<f64>) -> Result<f64> {
        let dof = self.degrees_of_freedom();
        if dof <= 0 {
            return Err(FitFuncError::InvalidInput(format!(
                "{} data points cannot constrain {} parameters",
                self.data.len(),
                self.func.parameter_count()
            )));
        }
        Ok(self.chi_squared(params)? / dof as f64)
    }
}

impl Problem for FitProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let a = params.to_vec();
        let predicted = if self.data.len() >= PARALLEL_THRESHOLD {
            parallel::eval_parallel(&self.func, &a, self.data.x())?
        } else {
            self.func.eval_array(&a, self.data.x())?
        };

        Ok((predicted - self.data.y()) / &self.weights)
    }

    fn parameter_count(&self) -> usize {
        self.func.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.data.len()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        let a = params.to_vec();
        let mut jac = if self.data.len() >= PARALLEL_THRESHOLD {
            parallel::jacobian_parallel(&self.func, &a, self.data.x())?
        } else {
            self.func.jacobian(&a, self.data.x())?
        };

        for (mut row, &w) in jac.axis_iter_mut(Axis(0)).zip(self.weights.iter()) {
            row /= w;
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// Adapter for using our `Problem` trait with the `levenberg-marquardt` crate.
///
/// The adapter owns the problem and the current parameter vector, which the
/// solver updates through `set_params`.
#[cfg(feature = "lm-compat")]
pub mod lm_adapter {
    use super::*;
    use levenberg_marquardt::LeastSquaresProblem;
    use nalgebra::{DMatrix, DVector, Dyn, Owned};

    /// Adapter to use our problem with the `levenberg-marquardt` crate.
    pub struct LmAdapter<P: Problem> {
        problem: P,
        params: Array1<f64>,
    }

    impl<P: Problem> LmAdapter<P> {
        /// Wrap `problem`, starting from `initial` parameters.
        pub fn new(problem: P, initial: Array1<f64>) -> Result<Self> {
            if initial.len() != problem.parameter_count() {
                return Err(FitFuncError::DimensionMismatch(format!(
                    "Expected {} initial parameters, got {}",
                    problem.parameter_count(),
                    initial.len()
                )));
            }
            Ok(Self {
                problem,
                params: initial,
            })
        }

        /// The current parameter vector.
        pub fn parameters(&self) -> &Array1<f64> {
            &self.params
        }

        /// The wrapped problem.
        pub fn problem(&self) -> &P {
            &self.problem
        }
    }

    impl<P: Problem> LeastSquaresProblem<f64, Dyn, Dyn> for LmAdapter<P> {
        type ResidualStorage = Owned<f64, Dyn>;
        type JacobianStorage = Owned<f64, Dyn, Dyn>;
        type ParameterStorage = Owned<f64, Dyn>;

        fn set_params(&mut self, x: &DVector<f64>) {
            self.params = x.iter().copied().collect();
        }

        fn params(&self) -> DVector<f64> {
            DVector::from_iterator(self.params.len(), self.params.iter().copied())
        }

        fn residuals(&self) -> Option<DVector<f64>> {
            match self.problem.eval(&self.params) {
                Ok(r) => Some(DVector::from_iterator(r.len(), r.iter().copied())),
                Err(e) => {
                    log::debug!("residual evaluation failed: {}", e);
                    None
                }
            }
        }

        fn jacobian(&self) -> Option<DMatrix<f64>> {
            match self.problem.jacobian(&self.params) {
                Ok(j) => Some(DMatrix::from_fn(j.nrows(), j.ncols(), |r, c| j[[r, c]])),
                Err(e) => {
                    log::debug!("jacobian evaluation failed: {}", e);
                    None
                }
            }
        }
    }
}
