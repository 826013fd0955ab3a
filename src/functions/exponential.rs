//! Exponential, hyperbolic and power-law fitting functions.

use crate::error::Result;
use crate::fit_function::{FitFunctionConfig, FittingFunction};
use ndarray::array;

/// `a[0] / (x + a[1]) + a[2]`
pub fn hyperbolic() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] / (x + a[1]) + a[2],
        FitFunctionConfig::new(3)
            .with_name("hyperbolic")
            .with_syntax("a[0] / (x + a[1]) + a[2]")
            .with_x_derivative(|a, x| -a[0] / ((x + a[1]) * (x + a[1])))
            .with_a_derivative(|a, x| {
                let shifted = x + a[1];
                array![1.0 / shifted, -a[0] / (shifted * shifted), 1.0]
            }),
    )
}

/// `a[0] * exp(a[1] * x) + a[2]`
pub fn exponential() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] * (a[1] * x).exp() + a[2],
        FitFunctionConfig::new(3)
            .with_name("exponential")
            .with_syntax("a[0] * exp(a[1] * x) + a[2]")
            .with_x_derivative(|a, x| a[0] * a[1] * (a[1] * x).exp())
            .with_a_derivative(|a, x| {
                let e = (a[1] * x).exp();
                array![e, a[0] * x * e, 1.0]
            }),
    )
}

/// `a[0] * (x + a[1]) ^ a[2] + a[3]`
pub fn straight_power() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] * (x + a[1]).powf(a[2]) + a[3],
        FitFunctionConfig::new(4)
            .with_name("straight_power")
            .with_syntax("a[0] * (x + a[1]) ^ a[2] + a[3]")
            .with_x_derivative(|a, x| a[0] * a[2] * (x + a[1]).powf(a[2] - 1.0))
            .with_a_derivative(|a, x| {
                let shifted = x + a[1];
                let power = shifted.powf(a[2]);
                array![
                    power,
                    a[0] * a[2] * shifted.powf(a[2] - 1.0),
                    a[0] * power * shifted.ln(),
                    1.0
                ]
            }),
    )
}

/// `a[0] / (x + a[1]) ^ a[2] + a[3]`
pub fn inverse_power() -> Result<FittingFunction> {
    FittingFunction::new(
        |a, x| a[0] / (x + a[1]).powf(a[2]) + a[3],
        FitFunctionConfig::new(4)
            .with_name("inverse_power")
            .with_syntax("a[0] / (x + a[1]) ^ a[2] + a[3]")
            .with_x_derivative(|a, x| -a[0] * a[2] * (x + a[1]).powf(-a[2] - 1.0))
            .with_a_derivative(|a, x| {
                let shifted = x + a[1];
                let power = shifted.powf(-a[2]);
                array![
                    power,
                    -a[0] * a[2] * shifted.powf(-a[2] - 1.0),
                    -a[0] * power * shifted.ln(),
                    1.0
                ]
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hyperbolic() {
        let func = hyperbolic().unwrap();
        // 6 / (1 + 2) + 1
        assert_relative_eq!(func.eval(&[6.0, 2.0, 1.0], 1.0).unwrap(), 3.0);
        assert_relative_eq!(func.eval_x_derivative(&[6.0, 2.0, 1.0], 1.0).unwrap(), -6.0 / 9.0);
    }

    #[test]
    fn test_exponential() {
        let func = exponential().unwrap();
        let a = [2.0, -0.5, 1.0];
        assert_relative_eq!(func.eval(&a, 0.0).unwrap(), 3.0);
        assert_relative_eq!(func.eval(&a, 2.0).unwrap(), 2.0 * (-1.0f64).exp() + 1.0);

        let grad = func.eval_a_derivative(&a, 2.0).unwrap();
        assert_relative_eq!(grad[0], (-1.0f64).exp());
        assert_relative_eq!(grad[1], 4.0 * (-1.0f64).exp());
        assert_relative_eq!(grad[2], 1.0);
    }

    #[test]
    fn test_power_laws_are_reciprocal() {
        let straight = straight_power().unwrap();
        let inverse = inverse_power().unwrap();

        // (x + 1)^2 and 1 / (x + 1)^-2 agree
        assert_relative_eq!(
            straight.eval(&[1.0, 1.0, 2.0, 0.0], 3.0).unwrap(),
            inverse.eval(&[1.0, 1.0, -2.0, 0.0], 3.0).unwrap()
        );
        assert_relative_eq!(straight.eval(&[1.0, 1.0, 2.0, 0.0], 3.0).unwrap(), 16.0);
    }
}
