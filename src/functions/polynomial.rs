//! Polynomial fitting functions.
//!
//! This module provides the constant, linear and parabolic functions, and a
//! factory for polynomials of arbitrary degree.

use crate::error::{FitFuncError, Result};
use crate::fit_function::{FitFunctionConfig, FittingFunction};
use ndarray::{array, Array1};

/// `a[0]`
pub fn constant() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, _x| a[0],
        FitFunctionConfig::new(1)
            .with_name("constant")
            .with_syntax("a[0]")
            .with_x_derivative(|_a, _x| 0.0)
            .with_a_derivative(|_a, _x| array![1.0]),
    )
}

/// `a[0] + a[1] * x`
pub fn linear() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] + a[1] * x,
        FitFunctionConfig::new(2)
            .with_name("linear")
            .with_syntax("a[0] + a[1] * x")
            .with_x_derivative(|a, _x| a[1])
            .with_a_derivative(|_a, x| array![1.0, x]),
    )
}

/// `a[0] + a[1] * x + a[2] * x ^ 2`
pub fn parabolic() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] + a[1] * x + a[2] * x * x,
        FitFunctionConfig::new(3)
            .with_name("parabolic")
            .with_syntax("a[0] + a[1] * x + a[2] * x ^ 2")
            .with_x_derivative(|a, x| a[1] + 2.0 * a[2] * x)
            .with_a_derivative(|_a, x| array![1.0, x, x * x]),
    )
}

/// A polynomial of the given degree, named `polynomial_{degree}`.
///
/// The function has `degree + 1` parameters, `a[i]` being the coefficient
/// of `x ^ i`.
///
/// # Errors
///
/// * `InvalidConfiguration` if `degree` is zero; use [`constant`] instead.
pub fn polynomial(degree: usize) -> Result<FittingFunction> {
    if degree == 0 {
        return Err(FitFuncError::InvalidConfiguration(
            "polynomial degree must be at least 1".to_string(),
        ));
    }

    FittingFunction::new(
        horner,
        FitFunctionConfig::new(degree + 1)
            .with_name(format!("polynomial_{}", degree))
            .with_syntax(polynomial_syntax(degree))
            .with_x_derivative(|a, x| {
                // Horner on the coefficients of the derivative
                a.iter()
                    .enumerate()
                    .skip(1)
                    .rev()
                    .fold(0.0, |acc, (i, &c)| acc * x + i as f64 * c)
            })
            .with_a_derivative(|a, x| powers(a.len(), x)),
    )
}

fn horner(a: &[f64], x: f64) -> f64 {
    a.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// `[1, x, x^2, ..., x^(n-1)]`
fn powers(n: usize, x: f64) -> Array1<f64> {
    let mut power = 1.0;
    Array1::from_shape_fn(n, |_| {
        let current = power;
        power *= x;
        current
    })
}

fn polynomial_syntax(degree: usize) -> String {
    (0..=degree)
        .map(|i| match i {
            0 => "a[0]".to_string(),
            1 => "a[1] * x".to_string(),
            _ => format!("a[{}] * x ^ {}", i, i),
        })
        .collect::<Vec<_>>()
        .join(" + ")
}
