//! In-memory fitting data.
//!
//! [`FittingData`] holds the sample points a fit runs on: the free variable
//! `x`, the measurements `y`, and optional per-point uncertainties. Reading
//! data from files is left to the caller.

use crate::error::{FitFuncError, Result};
use crate::fit_function::FittingFunction;
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Sample points with optional uncertainties.
#[derive(Debug, Clone, PartialEq)]
pub struct FittingData {
    x: Array1<f64>,
    y: Array1<f64>,
    xerr: Option<Array1<f64>>,
    yerr: Option<Array1<f64>>,
}

impl FittingData {
    /// Create data from matching `x` and `y` columns.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` if the columns are empty.
    /// * `DimensionMismatch` if their lengths differ.
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        if x.is_empty() {
            return Err(FitFuncError::InvalidInput(
                "fitting data needs at least one point".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(FitFuncError::DimensionMismatch(format!(
                "Expected x and y data to have the same length, got {} and {}",
                x.len(),
                y.len()
            )));
        }

        Ok(Self {
            x,
            y,
            xerr: None,
            yerr: None,
        })
    }

    /// Attach uncertainties on `x`. Entries must be finite and non-negative.
    pub fn with_xerr(mut self, xerr: Array1<f64>) -> Result<Self> {
        self.check_column("xerr", &xerr)?;
        if xerr.iter().any(|&e| !e.is_finite() || e < 0.0) {
            return Err(FitFuncError::InvalidInput(
                "xerr entries must be finite and non-negative".to_string(),
            ));
        }
        self.xerr = Some(xerr);
        Ok(self)
    }

    /// Attach uncertainties on `y`. Entries must be finite and positive,
    /// since residuals are divided by them.
    pub fn with_yerr(mut self, yerr: Array1<f64>) -> Result<Self> {
        self.check_column("yerr", &yerr)?;
        if yerr.iter().any(|&e| !e.is_finite() || e <= 0.0) {
            return Err(FitFuncError::InvalidInput(
                "yerr entries must be finite and positive".to_string(),
            ));
        }
        self.yerr = Some(yerr);
        Ok(self)
    }

    fn check_column(&self, label: &str, column: &Array1<f64>) -> Result<()> {
        if column.len() != self.x.len() {
            return Err(FitFuncError::DimensionMismatch(format!(
                "{} has {} entries, expected {}",
                label,
                column.len(),
                self.x.len()
            )));
        }
        Ok(())
    }

    /// Generate noisy measurements of `func` at `x`.
    ///
    /// Each `y` is `func(a, x) + N(0, sigma)`, and both `xerr` and `yerr` are
    /// set to `sigma`. The result is reproducible for a seeded `rng`.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` if `sigma` is not positive and finite, or `x` is empty.
    /// * `DimensionMismatch` if `a` does not fit `func`.
    /// * `FunctionEvaluation` if `func` is not finite at some point of `x`.
    pub fn random<R: Rng + ?Sized>(
        func: &FittingFunction,
        x: Array1<f64>,
        a: &[f64],
        sigma: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(FitFuncError::InvalidInput(format!(
                "noise level must be positive and finite, got {}",
                sigma
            )));
        }
        let noise = Normal::new(0.0, sigma).map_err(|e| {
            FitFuncError::InvalidInput(format!("invalid noise level {}: {}", sigma, e))
        })?;

        let mut y = func.eval_array(a, &x)?;
        if let Some((xi, yi)) = x.iter().zip(y.iter()).find(|(_, yi)| !yi.is_finite()) {
            return Err(FitFuncError::FunctionEvaluation(format!(
                "'{}' evaluates to {} at x = {}",
                func.name(),
                yi,
                xi
            )));
        }
        y.mapv_inplace(|yi| yi + noise.sample(rng));

        let errors = Array1::from_elem(x.len(), sigma);
        Self::new(x, y)?
            .with_xerr(errors.clone())?
            .with_yerr(errors)
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false; data holds at least one point.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Free-variable values.
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    /// Measured values.
    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    /// Uncertainties on `x`, if any.
    pub fn xerr(&self) -> Option<&Array1<f64>> {
        self.xerr.as_ref()
    }

    /// Uncertainties on `y`, if any.
    pub fn yerr(&self) -> Option<&Array1<f64>> {
        self.yerr.as_ref()
    }

    /// Per-point residual scale: `yerr`, or ones when absent.
    pub fn weights(&self) -> Array1<f64> {
        match &self.yerr {
            Some(yerr) => yerr.clone(),
            None => Array1::ones(self.x.len()),
        }
    }
}
