//! Name-to-function registry.
//!
//! [`FittingFunctionsRegistry`] maps names to shared [`FittingFunction`]s.
//! Registration is explicit and follows "last write wins": inserting a name
//! that is already present replaces the previous entry. Functions built with
//! `registered = false` are never inserted.
//!
//! Pass a registry to whichever component needs lookup. For code that wants
//! a single process-wide table, [`FittingFunctionsRegistry::global`] returns
//! a lazily created instance holding the built-in functions.

use crate::error::{FitFuncError, Result};
use crate::fit_function::{FitFunctionConfig, FittingFunction, FittingFunctionInfo};
use crate::functions;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Process-wide registry, created on first use.
static GLOBAL: OnceLock<FittingFunctionsRegistry> = OnceLock::new();

/// A thread-safe mapping from name to fitting function.
///
/// Each insert or lookup takes the single inner lock for its own duration.
#[derive(Default)]
pub struct FittingFunctionsRegistry {
    functions: Mutex<HashMap<String, Arc<FittingFunction>>>,
}

impl FittingFunctionsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in fitting function.
    pub fn with_builtins() -> Result<Self> {
        let registry = Self::new();
        for func in functions::all()? {
            registry.register(func);
        }
        Ok(registry)
    }

    /// The process-wide registry, populated with the built-ins.
    pub fn global() -> &'static FittingFunctionsRegistry {
        GLOBAL.get_or_init(|| {
            let registry = Self::new();
            match functions::all() {
                Ok(builtins) => {
                    for func in builtins {
                        registry.register(func);
                    }
                }
                Err(e) => log::error!("failed to build the built-in fitting functions: {}", e),
            }
            registry
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<FittingFunction>>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.functions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `func` under its name.
    ///
    /// Returns the entry it replaced, if any. A function whose `registered`
    /// flag is false is not inserted, and any existing entry under its name
    /// is left untouched.
    pub fn register(&self, func: impl Into<Arc<FittingFunction>>) -> Option<Arc<FittingFunction>> {
        let func = func.into();
        if !func.registered() {
            log::debug!("'{}' opted out of registration", func.name());
            return None;
        }

        let name = func.name().to_string();
        let previous = self.lock().insert(name.clone(), func);
        match &previous {
            Some(_) => log::debug!("replaced fitting function '{}'", name),
            None => log::debug!("registered fitting function '{}'", name),
        }
        previous
    }

    /// Build a fitting function and register it according to its flag.
    ///
    /// # Example
    ///
    /// ```
    /// use fitfunc::{FitFunctionConfig, FittingFunctionsRegistry};
    ///
    /// let registry = FittingFunctionsRegistry::new();
    /// registry
    ///     .add(|a: &[f64], x: f64| a[0] * x.sqrt(), FitFunctionConfig::new(1).with_name("root"))
    ///     .unwrap();
    ///
    /// assert_eq!(registry.load("root").unwrap().eval(&[3.0], 4.0).unwrap(), 6.0);
    /// ```
    pub fn add<F>(&self, model: F, config: FitFunctionConfig) -> Result<Arc<FittingFunction>>
    where
        F: Fn(&[f64], f64) -> f64 + Send + Sync + 'static,
    {
        let func = Arc::new(FittingFunction::new(model, config)?);
        self.register(Arc::clone(&func));
        Ok(func)
    }

    /// The function currently stored under `name`.
    ///
    /// # Errors
    ///
    /// * `NotFound` if nothing is registered under `name`.
    pub fn load(&self, name: &str) -> Result<Arc<FittingFunction>> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| FitFuncError::NotFound(name.to_string()))
    }

    /// Whether a function is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Descriptions of every registered function, sorted by name.
    pub fn describe(&self) -> Vec<FittingFunctionInfo> {
        let mut infos: Vec<FittingFunctionInfo> =
            self.lock().values().map(|func| func.info()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// [`describe`](Self::describe) serialized as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.describe())?)
    }
}

impl std::fmt::Debug for FittingFunctionsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FittingFunctionsRegistry")
            .field("names", &self.names())
            .finish()
    }
}
