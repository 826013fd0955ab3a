//! Sinusoidal fitting functions.

use crate::error::Result;
use crate::fit_function::{FitFunctionConfig, FittingFunction};
use ndarray::array;

/// `a[0] * cos(a[1] * x + a[2]) + a[3]`
pub fn cos() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] * (a[1] * x + a[2]).cos() + a[3],
        FitFunctionConfig::new(4)
            .with_name("cos")
            .with_syntax("a[0] * cos(a[1] * x + a[2]) + a[3]")
            .with_x_derivative(|a, x| -a[0] * a[1] * (a[1] * x + a[2]).sin())
            .with_a_derivative(|a, x| {
                let (sin, cos) = (a[1] * x + a[2]).sin_cos();
                array![cos, -a[0] * x * sin, -a[0] * sin, 1.0]
            }),
    )
}

/// `a[0] * sin(a[1] * x + a[2]) + a[3]`
pub fn sin() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] * (a[1] * x + a[2]).sin() + a[3],
        FitFunctionConfig::new(4)
            .with_name("sin")
            .with_syntax("a[0] * sin(a[1] * x + a[2]) + a[3]")
            .with_x_derivative(|a, x| a[0] * a[1] * (a[1] * x + a[2]).cos())
            .with_a_derivative(|a, x| {
                let (sin, cos) = (a[1] * x + a[2]).sin_cos();
                array![sin, a[0] * x * cos, a[0] * cos, 1.0]
            }),
    )
}
