//! Peak-shaped fitting functions.

use crate::error::Result;
use crate::fit_function::{FitFunctionConfig, FittingFunction};
use ndarray::array;

/// `a[0] * exp(-((x - a[1]) / a[2]) ^ 2 / 2) + a[3]`
pub fn normal() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| {
            let z = (x - a[1]) / a[2];
            a[0] * (-0.5 * z * z).exp() + a[3]
        },
        FitFunctionConfig::new(4)
            .with_name("normal")
            .with_syntax("a[0] * exp( - ((x - a[1]) / a[2]) ^ 2 / 2) + a[3]")
            .with_x_derivative(|a, x| {
                let z = (x - a[1]) / a[2];
                -a[0] * z / a[2] * (-0.5 * z * z).exp()
            })
            .with_a_derivative(|a, x| {
                let z = (x - a[1]) / a[2];
                let e = (-0.5 * z * z).exp();
                array![e, a[0] * e * z / a[2], a[0] * e * z * z / a[2], 1.0]
            }),
    )
}

/// `a[0] * (a[1] ^ x) * exp(-a[1]) / x!`
///
/// The factorial is extended to real `x` through the gamma function. No
/// closed-form x derivative is supplied, so it is computed numerically.
pub fn poisson() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] * poisson_density(a[1], x),
        FitFunctionConfig::new(2)
            .with_name("poisson")
            .with_syntax("a[0] * (a[1] ^ x) * exp(-a[1]) / x!")
            .with_a_derivative(|a, x| {
                let p = poisson_density(a[1], x);
                array![p, a[0] * p * (x / a[1] - 1.0)]
            }),
    )
}

/// `lambda^x * exp(-lambda) / Γ(x + 1)`, computed in log space.
fn poisson_density(lambda: f64, x: f64) -> f64 {
    (x * lambda.ln() - lambda - libm::lgamma(x + 1.0)).exp()
}
