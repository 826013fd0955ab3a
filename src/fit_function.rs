//! The fitting-function wrapper.
//!
//! A [`FittingFunction`] bundles a parametrized model `f(a, x)` with optional
//! analytic derivatives and the metadata a least-squares routine needs: the
//! number of parameters, a display formula and a registry name. Derivatives
//! that were not supplied are approximated with finite differences, so every
//! wrapper can produce a Jacobian.

use crate::error::{FitFuncError, Result};
use crate::utils::finite_difference;
use ndarray::{Array, Array1, Array2, ArrayBase, ArrayD, Data, Dimension, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar model signature: `(parameters, x) -> value`.
///
/// Also used for the derivative with respect to the free variable.
pub type ModelFn = dyn Fn(&[f64], f64) -> f64 + Send + Sync;

/// Parameter gradient signature: `(parameters, x) -> [df/da_0, ..., df/da_{n-1}]`.
pub type GradientFn = dyn Fn(&[f64], f64) -> Array1<f64> + Send + Sync;

/// Where the values of a derivative come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeSource {
    /// Closed-form derivative supplied at construction
    Analytical,

    /// Central finite differences of the model
    Numerical,
}

/// Configuration for building a [`FittingFunction`].
///
/// Only `parameter_count` is required; everything else has a default:
/// no derivatives, no syntax, the model's own identifier as the name, and
/// `registered = true`.
pub struct FitFunctionConfig {
    /// Number of parameters the model consumes. Must be positive.
    pub parameter_count: usize,

    /// Derivative with respect to the free variable. Default: numerical
    pub x_derivative: Option<Box<ModelFn>>,

    /// Derivatives with respect to each parameter. Default: numerical
    pub a_derivative: Option<Box<GradientFn>>,

    /// Human-readable formula, e.g. `a[0] + a[1] * x`. Default: None
    pub syntax: Option<String>,

    /// Registry name. Default: the identifier of the model function
    pub name: Option<String>,

    /// Whether the registry accepts this function. Default: true
    pub registered: bool,

    /// Relative step for numerical derivatives. Default: 1e-6
    pub numeric_step: Option<f64>,
}

impl FitFunctionConfig {
    /// Create a configuration for a model with `parameter_count` parameters.
    pub fn new(parameter_count: usize) -> Self {
        Self {
            parameter_count,
            x_derivative: None,
            a_derivative: None,
            syntax: None,
            name: None,
            registered: true,
            numeric_step: None,
        }
    }

    /// Supply the derivative with respect to the free variable.
    pub fn with_x_derivative<F>(mut self, x_derivative: F) -> Self
    where
        F: Fn(&[f64], f64) -> f64 + Send + Sync + 'static,
    {
        self.x_derivative = Some(Box::new(x_derivative));
        self
    }

    /// Supply the derivatives with respect to the parameters.
    ///
    /// The returned array must have one entry per parameter, entry `i`
    /// being `df/da_i`.
    pub fn with_a_derivative<F>(mut self, a_derivative: F) -> Self
    where
        F: Fn(&[f64], f64) -> Array1<f64> + Send + Sync + 'static,
    {
        self.a_derivative = Some(Box::new(a_derivative));
        self
    }

    /// Set the display formula.
    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    /// Override the registry name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set whether the registry should accept this function.
    pub fn with_registered(mut self, registered: bool) -> Self {
        self.registered = registered;
        self
    }

    /// Set the relative step used for numerical derivatives.
    pub fn with_numeric_step(mut self, step: f64) -> Self {
        self.numeric_step = Some(step);
        self
    }
}

impl fmt::Debug for FitFunctionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitFunctionConfig")
            .field("parameter_count", &self.parameter_count)
            .field("x_derivative", &self.x_derivative.is_some())
            .field("a_derivative", &self.a_derivative.is_some())
            .field("syntax", &self.syntax)
            .field("name", &self.name)
            .field("registered", &self.registered)
            .field("numeric_step", &self.numeric_step)
            .finish()
    }
}

/// Serializable description of a fitting function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittingFunctionInfo {
    /// Registry name
    pub name: String,
    /// Display formula, if any
    pub syntax: Option<String>,
    /// Number of parameters
    pub parameter_count: usize,
    /// Source of the free-variable derivative
    pub x_derivative: DerivativeSource,
    /// Source of the parameter derivatives
    pub a_derivative: DerivativeSource,
    /// Whether the registry accepts this function
    pub registered: bool,
}

/// A parametrized model with derivatives and metadata.
///
/// All fields are fixed at construction. Share it as
/// `Arc<FittingFunction>`; the registry hands out clones of that `Arc`.
pub struct FittingFunction {
    name: String,
    parameter_count: usize,
    model: Box<ModelFn>,
    x_derivative: Option<Box<ModelFn>>,
    a_derivative: Option<Box<GradientFn>>,
    syntax: Option<String>,
    registered: bool,
    numeric_step: f64,
}

impl FittingFunction {
    /// Wrap `model` using `config`.
    ///
    /// When `config.name` is `None`, the name is taken from the identifier of
    /// `model`, which only works for named `fn` items; closures need an
    /// explicit name.
    ///
    /// # Errors
    ///
    /// * `InvalidConfiguration` if `parameter_count` is zero, the name is
    ///   empty or cannot be derived, or `numeric_step` is not a positive
    ///   finite number.
    ///
    /// # Example
    ///
    /// ```
    /// use fitfunc::{FitFunctionConfig, FittingFunction};
    ///
    /// fn lens(a: &[f64], x: f64) -> f64 {
    ///     a[0] * x / (x - a[0]) + a[1]
    /// }
    ///
    /// let func = FittingFunction::new(lens, FitFunctionConfig::new(2)).unwrap();
    /// assert_eq!(func.name(), "lens");
    /// assert_eq!(func.eval(&[2.0, 0.5], 4.0).unwrap(), 4.5);
    /// ```
    pub fn new<F>(model: F, config: FitFunctionConfig) -> Result<Self>
    where
        F: Fn(&[f64], f64) -> f64 + Send + Sync + 'static,
    {
        if config.parameter_count == 0 {
            return Err(FitFuncError::InvalidConfiguration(
                "parameter count must be a positive integer".to_string(),
            ));
        }

        let name = match config.name {
            Some(name) => name,
            None => callable_identifier::<F>().ok_or_else(|| {
                FitFuncError::InvalidConfiguration(format!(
                    "cannot derive a name from `{}`; set one explicitly",
                    std::any::type_name::<F>()
                ))
            })?,
        };
        if name.trim().is_empty() {
            return Err(FitFuncError::InvalidConfiguration(
                "name must not be empty".to_string(),
            ));
        }

        let numeric_step = config
            .numeric_step
            .unwrap_or(finite_difference::DEFAULT_CENTRAL_EPSILON);
        if !numeric_step.is_finite() || numeric_step <= 0.0 {
            return Err(FitFuncError::InvalidConfiguration(format!(
                "numeric step must be positive and finite, got {}",
                numeric_step
            )));
        }

        if config.x_derivative.is_none() {
            log::debug!("'{}': no x derivative supplied, using central differences", name);
        }
        if config.a_derivative.is_none() {
            log::debug!("'{}': no a derivative supplied, using central differences", name);
        }

        Ok(Self {
            name,
            parameter_count: config.parameter_count,
            model: Box::new(model),
            x_derivative: config.x_derivative,
            a_derivative: config.a_derivative,
            syntax: config.syntax,
            registered: config.registered,
            numeric_step,
        })
    }

    /// The registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters the model consumes.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// The display formula, if one was given.
    pub fn syntax(&self) -> Option<&str> {
        self.syntax.as_deref()
    }

    /// Whether the registry accepts this function.
    pub fn registered(&self) -> bool {
        self.registered
    }

    /// The raw model callable. No parameter-length check is applied.
    pub fn model(&self) -> &ModelFn {
        self.model.as_ref()
    }

    /// The raw analytic x derivative, if supplied.
    pub fn x_derivative(&self) -> Option<&ModelFn> {
        self.x_derivative.as_deref()
    }

    /// The raw analytic parameter gradient, if supplied.
    pub fn a_derivative(&self) -> Option<&GradientFn> {
        self.a_derivative.as_deref()
    }

    /// Where free-variable derivatives come from.
    pub fn x_derivative_source(&self) -> DerivativeSource {
        match self.x_derivative {
            Some(_) => DerivativeSource::Analytical,
            None => DerivativeSource::Numerical,
        }
    }

    /// Where parameter derivatives come from.
    pub fn a_derivative_source(&self) -> DerivativeSource {
        match self.a_derivative {
            Some(_) => DerivativeSource::Analytical,
            None => DerivativeSource::Numerical,
        }
    }

    /// Describe this function.
    pub fn info(&self) -> FittingFunctionInfo {
        FittingFunctionInfo {
            name: self.name.clone(),
            syntax: self.syntax.clone(),
            parameter_count: self.parameter_count,
            x_derivative: self.x_derivative_source(),
            a_derivative: self.a_derivative_source(),
            registered: self.registered,
        }
    }

    /// Fail unless `a` has exactly `parameter_count` entries.
    pub fn check_parameters(&self, a: &[f64]) -> Result<()> {
        if a.len() != self.parameter_count {
            return Err(FitFuncError::DimensionMismatch(format!(
                "'{}' expects {} parameters, got {}",
                self.name,
                self.parameter_count,
                a.len()
            )));
        }
        Ok(())
    }

    /// Evaluate the model at a single point.
    pub fn eval(&self, a: &[f64], x: f64) -> Result<f64> {
        self.check_parameters(a)?;
        Ok((self.model)(a, x))
    }

    /// Evaluate the model element-wise. The output has the shape of `x`.
    pub fn eval_array<S, D>(&self, a: &[f64], x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.check_parameters(a)?;
        Ok(x.mapv(|xi| (self.model)(a, xi)))
    }

    /// Derivative with respect to the free variable at a single point.
    pub fn eval_x_derivative(&self, a: &[f64], x: f64) -> Result<f64> {
        self.check_parameters(a)?;
        Ok(self.x_derivative_unchecked(a, x))
    }

    /// Element-wise derivative with respect to the free variable.
    pub fn x_derivative_array<S, D>(&self, a: &[f64], x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.check_parameters(a)?;
        Ok(x.mapv(|xi| self.x_derivative_unchecked(a, xi)))
    }

    /// Derivatives with respect to every parameter at a single point.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` if `a` has the wrong length, or if the analytic
    ///   derivative returns a gradient of the wrong length.
    pub fn eval_a_derivative(&self, a: &[f64], x: f64) -> Result<Array1<f64>> {
        self.check_parameters(a)?;
        self.a_derivative_unchecked(a, x)
    }

    /// Parameter derivatives over an array of any shape.
    ///
    /// The result has the shape of `x` extended by a trailing axis of length
    /// `parameter_count`; slice `i` along that axis is `df/da_i`.
    pub fn a_derivative_array<S, D>(&self, a: &[f64], x: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.check_parameters(a)?;

        let mut shape = x.shape().to_vec();
        shape.push(self.parameter_count);

        let mut values = Vec::with_capacity(x.len() * self.parameter_count);
        for &xi in x.iter() {
            values.extend(self.a_derivative_unchecked(a, xi)?.iter().copied());
        }

        ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| FitFuncError::DimensionMismatch(e.to_string()))
    }

    /// Jacobian of the model over sample points: `J[i, j] = df(x_i)/da_j`.
    pub fn jacobian<S>(&self, a: &[f64], x: &ArrayBase<S, ndarray::Ix1>) -> Result<Array2<f64>>
    where
        S: Data<Elem = f64>,
    {
        self.check_parameters(a)?;

        let mut jac = Array2::zeros((x.len(), self.parameter_count));
        for (mut row, &xi) in jac.rows_mut().into_iter().zip(x.iter()) {
            row.assign(&self.a_derivative_unchecked(a, xi)?);
        }
        Ok(jac)
    }

    fn x_derivative_unchecked(&self, a: &[f64], x: f64) -> f64 {
        match &self.x_derivative {
            Some(derivative) => derivative(a, x),
            None => finite_difference::derivative(
                |xi| (self.model)(a, xi),
                x,
                Some(self.numeric_step),
            ),
        }
    }

    fn a_derivative_unchecked(&self, a: &[f64], x: f64) -> Result<Array1<f64>> {
        let grad = match &self.a_derivative {
            Some(derivative) => derivative(a, x),
            None => {
                log::trace!("'{}': numerical a derivative at x = {}", self.name, x);
                finite_difference::gradient(
                    |p| Ok((self.model)(p, x)),
                    a,
                    Some(self.numeric_step),
                )?
            }
        };

        if grad.len() != self.parameter_count {
            return Err(FitFuncError::DimensionMismatch(format!(
                "'{}' a derivative returned {} entries, expected {}",
                self.name,
                grad.len(),
                self.parameter_count
            )));
        }
        Ok(grad)
    }
}

impl fmt::Debug for FittingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittingFunction")
            .field("name", &self.name)
            .field("parameter_count", &self.parameter_count)
            .field("syntax", &self.syntax)
            .field("x_derivative", &self.x_derivative_source())
            .field("a_derivative", &self.a_derivative_source())
            .field("registered", &self.registered)
            .finish()
    }
}

impl fmt::Display for FittingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.syntax {
            Some(syntax) => write!(f, "{}(a, x) = {}", self.name, syntax),
            None => write!(f, "{}(a, x)", self.name),
        }
    }
}

/// Identifier of a named function item, e.g. `linear` for `my_crate::linear`.
///
/// Closures, function pointers and boxed or borrowed trait objects have no
/// identifier of their own and yield `None`.
fn callable_identifier<F>() -> Option<String> {
    const WRAPPERS: [&str; 3] = ["Box", "Arc", "Rc"];

    let full = std::any::type_name::<F>();
    if full.contains('{')
        || ["fn(", "for<", "dyn ", "&"]
            .iter()
            .any(|prefix| full.starts_with(prefix))
    {
        return None;
    }

    let path = full.split('<').next().unwrap_or(full);
    let ident = path.rsplit("::").next()?;
    let is_plain = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && ident.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !is_plain || WRAPPERS.contains(&ident) {
        return None;
    }
    Some(ident.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn lens(a: &[f64], x: f64) -> f64 {
        a[0] * x / (x - a[0]) + a[1]
    }

    fn linear_config() -> FitFunctionConfig {
        FitFunctionConfig::new(2)
            .with_name("line")
            .with_syntax("a[0] + a[1] * x")
            .with_x_derivative(|a, _x| a[1])
            .with_a_derivative(|_a, x| array![1.0, x])
    }

    #[test]
    fn test_name_defaults_to_fn_identifier() {
        let func = FittingFunction::new(lens, FitFunctionConfig::new(2)).unwrap();
        assert_eq!(func.name(), "lens");
        assert_eq!(func.parameter_count(), 2);
        assert!(func.registered());
        assert_eq!(func.syntax(), None);
    }

    #[test]
    fn test_closure_requires_name() {
        let err = FittingFunction::new(|a: &[f64], x: f64| a[0] * x, FitFunctionConfig::new(1))
            .unwrap_err();
        assert!(matches!(err, FitFuncError::InvalidConfiguration(_)));

        let func = FittingFunction::new(
            |a: &[f64], x: f64| a[0] * x,
            FitFunctionConfig::new(1).with_name("scale"),
        )
        .unwrap();
        assert_eq!(func.name(), "scale");
    }

    #[test]
    fn test_fn_pointer_and_boxed_model_require_name() {
        let pointer: fn(&[f64], f64) -> f64 = lens;
        assert!(matches!(
            FittingFunction::new(pointer, FitFunctionConfig::new(2)),
            Err(FitFuncError::InvalidConfiguration(_))
        ));

        let boxed: Box<dyn Fn(&[f64], f64) -> f64 + Send + Sync> = Box::new(lens);
        assert!(matches!(
            FittingFunction::new(boxed, FitFunctionConfig::new(2)),
            Err(FitFuncError::InvalidConfiguration(_))
        ));

        let func = FittingFunction::new(pointer, FitFunctionConfig::new(2).with_name("lens"))
            .unwrap();
        assert_eq!(func.name(), "lens");
        assert_relative_eq!(func.eval(&[2.0, 0.5], 4.0).unwrap(), 4.5);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            FittingFunction::new(lens, FitFunctionConfig::new(0)),
            Err(FitFuncError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            FittingFunction::new(lens, FitFunctionConfig::new(2).with_name("  ")),
            Err(FitFuncError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            FittingFunction::new(lens, FitFunctionConfig::new(2).with_numeric_step(0.0)),
            Err(FitFuncError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_lens_evaluation() {
        let func = FittingFunction::new(lens, FitFunctionConfig::new(2)).unwrap();
        assert_relative_eq!(func.eval(&[2.0, 0.5], 4.0).unwrap(), 4.5);
        assert_relative_eq!((func.model())(&[2.0, 0.5], 4.0), 4.5);
    }

    #[test]
    fn test_parameter_length_checked_at_evaluation() {
        let func = FittingFunction::new(lens, FitFunctionConfig::new(2)).unwrap();
        assert!(matches!(
            func.eval(&[2.0], 4.0),
            Err(FitFuncError::DimensionMismatch(_))
        ));
        assert!(matches!(
            func.jacobian(&[2.0, 0.5, 1.0], &array![1.0]),
            Err(FitFuncError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_array_evaluation_keeps_shape() {
        let func =
            FittingFunction::new(|a: &[f64], x: f64| a[0] + a[1] * x, linear_config()).unwrap();
        let x = Array2::from_shape_vec((2, 3), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let y = func.eval_array(&[1.0, 2.0], &x).unwrap();
        assert_eq!(y.shape(), &[2, 3]);
        assert_relative_eq!(y[[1, 2]], 11.0);

        let dx = func.x_derivative_array(&[1.0, 2.0], &x).unwrap();
        assert_eq!(dx.shape(), &[2, 3]);
        assert!(dx.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_a_derivative_array_shape() {
        let func =
            FittingFunction::new(|a: &[f64], x: f64| a[0] + a[1] * x, linear_config()).unwrap();
        let x = Array2::from_shape_vec((2, 3), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let da = func.a_derivative_array(&[1.0, 2.0], &x).unwrap();
        assert_eq!(da.shape(), &[2, 3, 2]);
        assert_relative_eq!(da[[1, 1, 0]], 1.0);
        assert_relative_eq!(da[[1, 1, 1]], 4.0);
    }

    #[test]
    fn test_numerical_fallback_matches_analytic() {
        let config = FitFunctionConfig::new(2)
            .with_x_derivative(|a, x| -a[0] * a[0] / ((x - a[0]) * (x - a[0])))
            .with_a_derivative(|a, x| array![x * x / ((x - a[0]) * (x - a[0])), 1.0]);
        let analytic = FittingFunction::new(lens, config).unwrap();
        let numeric = FittingFunction::new(lens, FitFunctionConfig::new(2)).unwrap();

        assert_eq!(analytic.x_derivative_source(), DerivativeSource::Analytical);
        assert_eq!(numeric.a_derivative_source(), DerivativeSource::Numerical);

        let a = [2.0, 0.5];
        for &x in &[3.0, 4.0, 7.5] {
            assert_relative_eq!(
                numeric.eval_x_derivative(&a, x).unwrap(),
                analytic.eval_x_derivative(&a, x).unwrap(),
                epsilon = 1e-6
            );
            let n = numeric.eval_a_derivative(&a, x).unwrap();
            let e = analytic.eval_a_derivative(&a, x).unwrap();
            for j in 0..2 {
                assert_relative_eq!(n[j], e[j], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_partial_derivatives() {
        // Only the x derivative is supplied; the a derivative falls back
        let func = FittingFunction::new(
            |a: &[f64], x: f64| a[0] * x * x,
            FitFunctionConfig::new(1)
                .with_name("square")
                .with_x_derivative(|a, x| 2.0 * a[0] * x),
        )
        .unwrap();

        assert_eq!(func.x_derivative_source(), DerivativeSource::Analytical);
        assert_eq!(func.a_derivative_source(), DerivativeSource::Numerical);
        assert_relative_eq!(func.eval_x_derivative(&[3.0], 2.0).unwrap(), 12.0);
        assert_relative_eq!(func.eval_a_derivative(&[3.0], 2.0).unwrap()[0], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wrong_gradient_length() {
        let func = FittingFunction::new(
            |a: &[f64], x: f64| a[0] + a[1] * x,
            FitFunctionConfig::new(2)
                .with_name("broken")
                .with_a_derivative(|_a, _x| array![1.0]),
        )
        .unwrap();

        assert!(matches!(
            func.eval_a_derivative(&[1.0, 1.0], 0.0),
            Err(FitFuncError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_jacobian() {
        let func =
            FittingFunction::new(|a: &[f64], x: f64| a[0] + a[1] * x, linear_config()).unwrap();
        let x = array![1.0, 2.0, 3.0];

        let jac = func.jacobian(&[0.0, 0.0], &x).unwrap();

        assert_eq!(jac.shape(), &[3, 2]);
        for i in 0..3 {
            assert_relative_eq!(jac[[i, 0]], 1.0);
            assert_relative_eq!(jac[[i, 1]], x[i]);
        }
    }

    #[test]
    fn test_info_and_display() {
        let func =
            FittingFunction::new(|a: &[f64], x: f64| a[0] + a[1] * x, linear_config()).unwrap();
        let info = func.info();

        assert_eq!(info.name, "line");
        assert_eq!(info.parameter_count, 2);
        assert_eq!(info.x_derivative, DerivativeSource::Analytical);
        assert_eq!(format!("{}", func), "line(a, x) = a[0] + a[1] * x");

        let unnamed = FittingFunction::new(lens, FitFunctionConfig::new(2)).unwrap();
        assert_eq!(format!("{}", unnamed), "lens(a, x)");
    }
}
