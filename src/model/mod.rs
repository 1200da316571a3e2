//! # Functional Models
//!
//! A [`FunctionalModel`] is a symbolic equation over named parameters and
//! variables, together with a compiled numeric function for evaluating it.
//! Models can be called, fitted to data, combined with arithmetic operators
//! and transformed by differentiation, integration and limits.
//!
//! ## Example Usage
//!
//! ```rust
//! use symfit_rs::FunctionalModel;
//!
//! let mut line = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
//!
//! // Unbound: parameters first, then variables
//! assert_eq!(line.call(&[2.0, 5.0, 3.0]).unwrap(), 11.0);
//!
//! // Bound: only the variables remain
//! line.set_parameters([("m", 2.0), ("b", 5.0)]).unwrap();
//! assert_eq!(line.call(&[3.0]).unwrap(), 11.0);
//! assert_eq!(line.to_string(), "2*x + 5");
//! ```

pub mod definition;
pub mod ops;

use std::collections::HashMap;
use std::fmt;

use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;

use crate::compile::{Backend, NumericFunction};
use crate::error::{Result, SymFitError};
use crate::fit::{self, FitOptions, FitResult};
use crate::symbolic::Expr;

pub use definition::ModelDefinition;
pub use ops::Operand;

/// Function names that mark an equation as needing the special-function backend.
pub const SPECIAL_FUNCTION_NAMES: [&str; 6] = [
    "besselj", "bessely", "besseli", "besselk", "hankel1", "hankel2",
];

/// Conversion of a name list into ordered symbol names.
///
/// Strings are split on whitespace and commas, so `"m b"`, `"m, b"` and
/// `["m", "b"]` all declare the same two names.
pub trait IntoSymbols {
    fn into_symbols(self) -> Vec<String>;
}

impl IntoSymbols for &str {
    fn into_symbols(self) -> Vec<String> {
        self.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl IntoSymbols for String {
    fn into_symbols(self) -> Vec<String> {
        self.as_str().into_symbols()
    }
}

impl IntoSymbols for &String {
    fn into_symbols(self) -> Vec<String> {
        self.as_str().into_symbols()
    }
}

impl IntoSymbols for Vec<String> {
    fn into_symbols(self) -> Vec<String> {
        self
    }
}

impl IntoSymbols for &[String] {
    fn into_symbols(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoSymbols for Vec<&str> {
    fn into_symbols(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoSymbols for &[&str] {
    fn into_symbols(self) -> Vec<String> {
        self.iter().map(|name| name.to_string()).collect()
    }
}

impl<const N: usize> IntoSymbols for [&str; N] {
    fn into_symbols(self) -> Vec<String> {
        self.iter().map(|name| name.to_string()).collect()
    }
}

/// A symbolic model `f(parameters, variables)` that is also callable.
///
/// The equation, parameters and variables never change after construction.
/// Binding parameter values with [`set_parameters`](Self::set_parameters)
/// substitutes them into the equation and recompiles the numeric function
/// so that only the variables remain as arguments.
#[derive(Debug, Clone)]
pub struct FunctionalModel {
    parameters: Vec<String>,
    variables: Vec<String>,
    equation: Expr,
    parameter_values: HashMap<String, f64>,
    special_function: bool,
    function: NumericFunction,
}

impl FunctionalModel {
    /// Create a model from an equation string.
    ///
    /// # Arguments
    ///
    /// * `parameters` - Parameter names, e.g. `"m b"` or `["m", "b"]`
    /// * `variables` - Variable names, e.g. `"x"`
    /// * `equation` - The equation text, e.g. `"m*x + b"`
    ///
    /// # Errors
    ///
    /// Fails when the equation cannot be parsed, when a name is declared both
    /// as a parameter and as a variable, or when the equation uses a symbol
    /// that is neither.
    pub fn new(
        parameters: impl IntoSymbols,
        variables: impl IntoSymbols,
        equation: &str,
    ) -> Result<Self> {
        let expr = Expr::parse(equation)?;
        let special_function = SPECIAL_FUNCTION_NAMES
            .iter()
            .any(|name| equation.contains(name))
            || expr.contains_special();
        Self::build(
            parameters.into_symbols(),
            variables.into_symbols(),
            expr,
            special_function,
            HashMap::new(),
        )
    }

    /// Create a model from an already built expression.
    pub fn from_expr(
        parameters: impl IntoSymbols,
        variables: impl IntoSymbols,
        equation: Expr,
    ) -> Result<Self> {
        let special_function = equation.contains_special();
        Self::build(
            parameters.into_symbols(),
            variables.into_symbols(),
            equation,
            special_function,
            HashMap::new(),
        )
    }

    pub(crate) fn build(
        parameters: Vec<String>,
        variables: Vec<String>,
        equation: Expr,
        special_function: bool,
        mut parameter_values: HashMap<String, f64>,
    ) -> Result<Self> {
        let parameters = dedup(parameters);
        let variables = dedup(variables);

        if let Some(name) = parameters.iter().find(|name| variables.contains(name)) {
            return Err(SymFitError::SymbolConflict(name.clone()));
        }
        if let Some(name) = equation
            .symbols()
            .into_iter()
            .find(|name| !parameters.contains(name) && !variables.contains(name))
        {
            return Err(SymFitError::UndeclaredSymbol(name));
        }
        parameter_values.retain(|name, _| parameters.contains(name));

        let function = compile_function(
            &equation,
            &parameters,
            &variables,
            &parameter_values,
            special_function,
        );
        Ok(Self {
            parameters,
            variables,
            equation,
            parameter_values,
            special_function,
            function,
        })
    }

    /// A model over the same names and bound values with a new equation.
    ///
    /// The equation must not introduce symbols beyond the declared ones.
    pub(crate) fn with_equation(&self, equation: Expr) -> Self {
        let special_function = self.special_function || equation.contains_special();
        let function = compile_function(
            &equation,
            &self.parameters,
            &self.variables,
            &self.parameter_values,
            special_function,
        );
        Self {
            parameters: self.parameters.clone(),
            variables: self.variables.clone(),
            equation,
            parameter_values: self.parameter_values.clone(),
            special_function,
            function,
        }
    }

    fn recompile(&mut self) {
        self.function = compile_function(
            &self.equation,
            &self.parameters,
            &self.variables,
            &self.parameter_values,
            self.special_function,
        );
    }

    /// Declared parameter names, in order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Declared variable names, in order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The symbolic equation, without bound values.
    pub fn equation(&self) -> &Expr {
        &self.equation
    }

    /// The equation with the bound parameter values substituted.
    pub fn bound_equation(&self) -> Expr {
        if self.parameter_values.is_empty() {
            self.equation.clone()
        } else {
            self.equation
                .substitute_values(&self.parameter_values)
                .simplify()
        }
    }

    /// Currently bound parameter values.
    pub fn parameter_values(&self) -> &HashMap<String, f64> {
        &self.parameter_values
    }

    /// The bound value of one parameter.
    pub fn parameter_value(&self, name: &str) -> Option<f64> {
        self.parameter_values.get(name).copied()
    }

    /// Parameters without a bound value, in declaration order.
    pub fn unbound_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|name| !self.parameter_values.contains_key(*name))
            .map(String::as_str)
            .collect()
    }

    /// Argument names expected by [`call`](Self::call).
    pub fn signature(&self) -> &[String] {
        self.function.signature()
    }

    /// Whether the equation uses Bessel-family functions.
    pub fn is_special_function(&self) -> bool {
        self.special_function
    }

    /// Evaluation backend of the compiled function.
    pub fn backend(&self) -> Backend {
        self.function.backend()
    }

    /// Evaluate at one point with positional arguments in
    /// [`signature`](Self::signature) order.
    pub fn call(&self, args: &[f64]) -> Result<f64> {
        self.function.call(args)
    }

    /// Evaluate at one point with named arguments.
    ///
    /// ```rust
    /// use symfit_rs::FunctionalModel;
    ///
    /// let line = FunctionalModel::new("m b", "x", "m*x+b").unwrap();
    /// let y = line.call_named(&[("m", 2.0), ("b", 5.0), ("x", 3.0)]).unwrap();
    /// assert_eq!(y, 11.0);
    /// ```
    pub fn call_named(&self, args: &[(&str, f64)]) -> Result<f64> {
        let signature = self.function.signature();
        if let Some((name, _)) = args
            .iter()
            .find(|(name, _)| !signature.iter().any(|s| s == name))
        {
            return Err(SymFitError::InvalidInput(format!(
                "'{}' is not an argument of this model, expected ({})",
                name,
                signature.join(", ")
            )));
        }

        let values = signature
            .iter()
            .map(|name| {
                args.iter()
                    .find(|(arg, _)| *arg == name.as_str())
                    .map(|(_, value)| *value)
                    .ok_or_else(|| SymFitError::UnboundSymbol(name.clone()))
            })
            .collect::<Result<Vec<f64>>>()?;
        self.function.call(&values)
    }

    /// Evaluate over columns of arguments, one column per signature entry.
    ///
    /// Length-1 columns broadcast against longer ones.
    pub fn call_arrays(&self, columns: &[ArrayView1<'_, f64>]) -> Result<Array1<f64>> {
        self.function.call_arrays(columns)
    }

    /// Evaluate a model with a single remaining argument over `x`.
    pub fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        if self.function.signature().len() != 1 {
            return Err(SymFitError::DimensionMismatch(format!(
                "eval takes one argument column, this model expects ({})",
                self.function.signature().join(", ")
            )));
        }
        self.function.call_arrays(&[x.view()])
    }

    /// Evaluate at one point in complex arithmetic.
    pub fn call_complex(&self, args: &[f64]) -> Result<Complex64> {
        self.function.call_complex(args)
    }

    /// Bind parameter values and recompile over the variables.
    ///
    /// Values are merged into the existing bindings. Nothing changes when a
    /// name is not a declared parameter.
    pub fn set_parameters<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let values: Vec<(String, f64)> = values
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_string(), value))
            .collect();
        if let Some((name, _)) = values
            .iter()
            .find(|(name, _)| !self.parameters.contains(name))
        {
            return Err(SymFitError::ParameterNotFound(name.clone()));
        }

        self.parameter_values.extend(values);
        self.recompile();
        Ok(())
    }

    /// Discard bound values; parameters become arguments again.
    pub fn clear_parameters(&mut self) {
        self.parameter_values.clear();
        self.recompile();
    }

    /// Fit the parameters to `(x, y)` data by least squares and bind the result.
    ///
    /// The parameters are bound even when the solver did not converge; check
    /// [`FitResult::success`].
    pub fn fit_data(
        &mut self,
        x: &Array1<f64>,
        y: &Array1<f64>,
        options: &FitOptions,
    ) -> Result<FitResult> {
        let result = fit::fit_model(self, x, y, options)?;
        self.set_parameters(result.parameter_values())?;
        Ok(result)
    }

    fn resolve_symbol(&self, respect_to: Option<&str>) -> Result<String> {
        match respect_to {
            Some(name) if self.parameters.iter().chain(&self.variables).any(|s| s == name) => {
                Ok(name.to_string())
            }
            Some(name) => Err(SymFitError::UndeclaredSymbol(name.to_string())),
            None => self.variables.first().cloned().ok_or_else(|| {
                SymFitError::UnsupportedOperation(
                    "the model has no variables to default to".to_string(),
                )
            }),
        }
    }

    /// The `order`-th derivative with respect to a variable or parameter
    /// (default: the first variable).
    pub fn d(&self, respect_to: Option<&str>, order: usize) -> Result<Self> {
        let name = self.resolve_symbol(respect_to)?;
        let mut equation = self.equation.clone();
        for _ in 0..order {
            equation = equation.diff(&name)?;
        }
        Ok(self.with_equation(equation))
    }

    /// The `order`-fold antiderivative with respect to a variable or
    /// parameter (default: the first variable). No constant is added.
    pub fn integrate(&self, respect_to: Option<&str>, order: usize) -> Result<Self> {
        let name = self.resolve_symbol(respect_to)?;
        let mut equation = self.equation.clone();
        for _ in 0..order {
            equation = equation.integrate(&name)?;
        }
        Ok(self.with_equation(equation))
    }

    /// The limit as `respect_to` approaches `point` (which may be infinite).
    pub fn limit(&self, respect_to: &str, point: f64) -> Result<Self> {
        let name = self.resolve_symbol(Some(respect_to))?;
        let equation = self.equation.limit(&name, point)?;
        Ok(self.with_equation(equation))
    }

    /// Substitute `inner` for this model's only variable.
    ///
    /// The result has `inner`'s variables and the ordered union of both
    /// models' parameters.
    ///
    /// # Errors
    ///
    /// [`SymFitError::UnsupportedOperation`] when this model does not have
    /// exactly one variable.
    pub fn compose(&self, inner: &FunctionalModel) -> Result<Self> {
        let [variable] = self.variables.as_slice() else {
            return Err(SymFitError::UnsupportedOperation(format!(
                "compose needs a single-variable model, this one has variables ({})",
                self.variables.join(", ")
            )));
        };

        let equation = self.equation.substitute(variable, &inner.equation);
        Self::build(
            ops::ordered_union(&self.parameters, &inner.parameters),
            inner.variables.clone(),
            equation,
            self.special_function || inner.special_function,
            ops::merge_values(&self.parameter_values, &inner.parameter_values),
        )
    }

    /// LaTeX rendering of the equation with bound values substituted.
    pub fn to_latex(&self) -> String {
        self.bound_equation().to_latex()
    }
}

impl fmt::Display for FunctionalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bound_equation())
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

fn compile_function(
    equation: &Expr,
    parameters: &[String],
    variables: &[String],
    parameter_values: &HashMap<String, f64>,
    special_function: bool,
) -> NumericFunction {
    let backend = if special_function {
        Backend::Elementwise
    } else {
        Backend::Vectorized
    };

    let function = if parameter_values.is_empty() {
        let signature: Vec<String> = parameters.iter().chain(variables).cloned().collect();
        NumericFunction::compile(equation, &signature, backend)
    } else {
        let bound = equation.substitute_values(parameter_values).simplify();
        NumericFunction::compile(&bound, variables, backend)
    };
    log::debug!(
        "compiled model over ({}) with the {:?} backend",
        function.signature().join(", "),
        backend
    );
    function
}
