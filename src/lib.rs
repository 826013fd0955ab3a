//! # fitfunc-rs
//!
//! `fitfunc-rs` provides the fitting functions a least-squares curve fit runs
//! on, and a registry to look them up by name.
//!
//! The library provides:
//! - [`FittingFunction`]: a parametrized model `f(a, x)` with optional
//!   analytic derivatives, a parameter count and display metadata
//! - [`FittingFunctionsRegistry`]: name-to-function lookup with
//!   last-write-wins registration and per-function opt-out
//! - A catalogue of built-in functions in [`functions`]
//! - [`FittingData`] and the [`Problem`] interface consumed by solvers
//!
//! ## Basic Usage
//!
//! ```
//! use fitfunc::{FitFunctionConfig, FittingFunctionsRegistry};
//!
//! fn lens(a: &[f64], x: f64) -> f64 {
//!     a[0] * x / (x - a[0]) + a[1]
//! }
//!
//! let registry = FittingFunctionsRegistry::with_builtins().unwrap();
//! registry.add(lens, FitFunctionConfig::new(2)).unwrap();
//!
//! let func = registry.load("lens").unwrap();
//! assert_eq!(func.eval(&[2.0, 0.5], 4.0).unwrap(), 4.5);
//! assert_eq!(registry.load("linear").unwrap().parameter_count(), 2);
//! ```

// Public modules
pub mod data;
pub mod error;
pub mod fit_function;
pub mod functions;
pub mod problem;
pub mod registry;

mod utils;

// Re-exports for convenience
pub use data::FittingData;
pub use error::{FitFuncError, Result};
pub use fit_function::{
    DerivativeSource, FitFunctionConfig, FittingFunction, FittingFunctionInfo, GradientFn, ModelFn,
};
pub use problem::{FitProblem, Problem};
pub use registry::FittingFunctionsRegistry;

#[cfg(feature = "lm-compat")]
pub use problem::lm_adapter::LmAdapter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
