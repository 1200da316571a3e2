//! Expression tree for symbolic equations.
//!
//! An [`Expr`] is an immutable tree over named symbols, numeric literals,
//! the constants `pi` and `E`, the arithmetic operators and a fixed set of
//! named functions. Bessel-family functions take the order as their first
//! argument, matching the `besselj(n, x)` calling convention.

use std::collections::HashMap;

use crate::special;

use super::SymbolicError;

/// Named mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    /// Archimedes' constant
    Pi,

    /// Euler's number
    E,
}

impl Constant {
    /// Numeric value of the constant.
    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }

    /// Name used by the parser and the plain-text printer.
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "E",
        }
    }
}

/// Functions understood by the parser, the calculus routines and the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
    /// Bessel function of the first kind, `besselj(n, x)`
    BesselJ,
    /// Bessel function of the second kind, `bessely(n, x)`
    BesselY,
    /// Modified Bessel function of the first kind, `besseli(n, x)`
    BesselI,
    /// Modified Bessel function of the second kind, `besselk(n, x)`
    BesselK,
    /// Hankel function of the first kind, `hankel1(n, x)`
    Hankel1,
    /// Hankel function of the second kind, `hankel2(n, x)`
    Hankel2,
}

impl Function {
    /// Look up a function by the name used in equation text.
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "exp" => Function::Exp,
            "ln" | "log" => Function::Ln,
            "log10" => Function::Log10,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "besselj" => Function::BesselJ,
            "bessely" => Function::BesselY,
            "besseli" => Function::BesselI,
            "besselk" => Function::BesselK,
            "hankel1" => Function::Hankel1,
            "hankel2" => Function::Hankel2,
            _ => return None,
        };
        Some(function)
    }

    /// Canonical name of the function.
    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Exp => "exp",
            Function::Ln => "log",
            Function::Log10 => "log10",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::BesselJ => "besselj",
            Function::BesselY => "bessely",
            Function::BesselI => "besseli",
            Function::BesselK => "besselk",
            Function::Hankel1 => "hankel1",
            Function::Hankel2 => "hankel2",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        if self.is_special() {
            2
        } else {
            1
        }
    }

    /// Whether this is a Bessel-family function.
    pub fn is_special(self) -> bool {
        matches!(
            self,
            Function::BesselJ
                | Function::BesselY
                | Function::BesselI
                | Function::BesselK
                | Function::Hankel1
                | Function::Hankel2
        )
    }

    /// Whether the function is complex-valued for real arguments.
    pub fn is_complex_valued(self) -> bool {
        matches!(self, Function::Hankel1 | Function::Hankel2)
    }

    /// Apply the function to real arguments.
    ///
    /// Bessel orders must be integral. Hankel functions have no real value
    /// and report [`SymbolicError::ComplexValued`].
    pub fn apply(self, args: &[f64]) -> Result<f64, SymbolicError> {
        if args.len() != self.arity() {
            return Err(SymbolicError::ArityMismatch {
                name: self.name().to_string(),
                expected: self.arity(),
                found: args.len(),
            });
        }

        let x = args[args.len() - 1];
        let value = match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Sqrt => x.sqrt(),
            Function::Abs => x.abs(),
            Function::BesselJ => special::bessel_j(self.order(args[0])?, x),
            Function::BesselY => special::bessel_y(self.order(args[0])?, x),
            Function::BesselI => special::bessel_i(self.order(args[0])?, x),
            Function::BesselK => special::bessel_k(self.order(args[0])?, x),
            Function::Hankel1 | Function::Hankel2 => {
                return Err(SymbolicError::ComplexValued {
                    name: self.name().to_string(),
                })
            }
        };
        Ok(value)
    }

    /// Convert a numeric order argument to an integer order.
    pub(crate) fn order(self, order: f64) -> Result<i32, SymbolicError> {
        let rounded = order.round();
        if !order.is_finite() || (order - rounded).abs() > 1e-9 || rounded.abs() > 10_000.0 {
            return Err(SymbolicError::InvalidOrder {
                name: self.name().to_string(),
                order,
            });
        }
        Ok(rounded as i32)
    }
}

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),

    /// Named symbol (variable or parameter)
    Symbol(String),

    /// Named constant
    Constant(Constant),

    /// Negation
    Neg(Box<Expr>),

    /// Addition
    Add(Box<Expr>, Box<Expr>),

    /// Subtraction
    Sub(Box<Expr>, Box<Expr>),

    /// Multiplication
    Mul(Box<Expr>, Box<Expr>),

    /// Division
    Div(Box<Expr>, Box<Expr>),

    /// Exponentiation
    Pow(Box<Expr>, Box<Expr>),

    /// Function call
    Call(Function, Vec<Expr>),
}

impl Expr {
    /// Numeric literal.
    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    /// Named symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Function call.
    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Call(function, args)
    }

    /// Single-argument function call.
    pub fn apply(function: Function, arg: Expr) -> Self {
        Expr::Call(function, vec![arg])
    }

    /// `self ^ exponent`.
    pub fn pow(self, exponent: Expr) -> Self {
        Expr::Pow(Box::new(self), Box::new(exponent))
    }

    /// The literal value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this is the literal zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Number(v) if *v == 0.0)
    }

    /// Whether this is the literal one.
    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Number(v) if *v == 1.0)
    }

    /// Free symbols in order of first appearance.
    pub fn symbols(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_symbols(&mut names);
        names
    }

    fn collect_symbols(&self, names: &mut Vec<String>) {
        match self {
            Expr::Number(_) | Expr::Constant(_) => {}
            Expr::Symbol(name) => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
            Expr::Neg(inner) => inner.collect_symbols(names),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.collect_symbols(names);
                rhs.collect_symbols(names);
            }
            Expr::Call(_, args) => {
                for arg in args {
                    arg.collect_symbols(names);
                }
            }
        }
    }

    /// Whether the expression mentions `name`.
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Expr::Number(_) | Expr::Constant(_) => false,
            Expr::Symbol(s) => s == name,
            Expr::Neg(inner) => inner.depends_on(name),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => lhs.depends_on(name) || rhs.depends_on(name),
            Expr::Call(_, args) => args.iter().any(|arg| arg.depends_on(name)),
        }
    }

    /// Whether any Bessel-family function appears in the expression.
    pub fn contains_special(&self) -> bool {
        match self {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => false,
            Expr::Neg(inner) => inner.contains_special(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => lhs.contains_special() || rhs.contains_special(),
            Expr::Call(function, args) => {
                function.is_special() || args.iter().any(Expr::contains_special)
            }
        }
    }

    /// Replace every occurrence of the symbol `name` with `replacement`.
    pub fn substitute(&self, name: &str, replacement: &Expr) -> Expr {
        self.map_symbols(&|symbol| {
            if symbol == name {
                Some(replacement.clone())
            } else {
                None
            }
        })
    }

    /// Replace symbols with the numeric values found in `values`.
    pub fn substitute_values(&self, values: &HashMap<String, f64>) -> Expr {
        self.map_symbols(&|symbol| values.get(symbol).map(|v| Expr::Number(*v)))
    }

    fn map_symbols(&self, replace: &dyn Fn(&str) -> Option<Expr>) -> Expr {
        match self {
            Expr::Number(_) | Expr::Constant(_) => self.clone(),
            Expr::Symbol(name) => replace(name).unwrap_or_else(|| self.clone()),
            Expr::Neg(inner) => Expr::Neg(Box::new(inner.map_symbols(replace))),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.map_symbols(replace)),
                Box::new(rhs.map_symbols(replace)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.map_symbols(replace)),
                Box::new(rhs.map_symbols(replace)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.map_symbols(replace)),
                Box::new(rhs.map_symbols(replace)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.map_symbols(replace)),
                Box::new(rhs.map_symbols(replace)),
            ),
            Expr::Pow(lhs, rhs) => Expr::Pow(
                Box::new(lhs.map_symbols(replace)),
                Box::new(rhs.map_symbols(replace)),
            ),
            Expr::Call(function, args) => Expr::Call(
                *function,
                args.iter().map(|arg| arg.map_symbols(replace)).collect(),
            ),
        }
    }

    /// Evaluate an expression that contains no symbols.
    ///
    /// Returns `None` when a symbol is present or a function has no real value.
    pub fn eval_constant(&self) -> Option<f64> {
        match self {
            Expr::Number(v) => Some(*v),
            Expr::Constant(c) => Some(c.value()),
            Expr::Symbol(_) => None,
            Expr::Neg(inner) => inner.eval_constant().map(|v| -v),
            Expr::Add(lhs, rhs) => Some(lhs.eval_constant()? + rhs.eval_constant()?),
            Expr::Sub(lhs, rhs) => Some(lhs.eval_constant()? - rhs.eval_constant()?),
            Expr::Mul(lhs, rhs) => Some(lhs.eval_constant()? * rhs.eval_constant()?),
            Expr::Div(lhs, rhs) => Some(lhs.eval_constant()? / rhs.eval_constant()?),
            Expr::Pow(lhs, rhs) => Some(lhs.eval_constant()?.powf(rhs.eval_constant()?)),
            Expr::Call(function, args) => {
                let values = args
                    .iter()
                    .map(Expr::eval_constant)
                    .collect::<Option<Vec<f64>>>()?;
                function.apply(&values).ok()
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}
