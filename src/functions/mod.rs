//! Built-in fitting functions for common fitting problems.
//!
//! Every function here supplies analytic derivatives where a closed form
//! exists. [`all`] builds the whole catalogue, which is what
//! [`FittingFunctionsRegistry::with_builtins`](crate::FittingFunctionsRegistry::with_builtins)
//! registers.

use crate::error::Result;
use crate::fit_function::FittingFunction;

mod exponential;
mod peak;
mod periodic;
mod polynomial;

pub use exponential::{exponential, hyperbolic, inverse_power, straight_power};
pub use peak::{normal, poisson};
pub use periodic::{cos, sin};
pub use polynomial::{constant, linear, parabolic, polynomial};

/// Build every built-in fitting function.
///
/// Polynomials are included for degrees 3 and 4 only; other degrees are
/// available through [`polynomial`].
pub fn all() -> Result<Vec<FittingFunction>> {
    Ok(vec![
        constant()?,
        linear()?,
        parabolic()?,
        polynomial(3)?,
        polynomial(4)?,
        hyperbolic()?,
        exponential()?,
        cos()?,
        sin()?,
        straight_power()?,
        inverse_power()?,
        normal()?,
        poisson()?,
    ])
}
