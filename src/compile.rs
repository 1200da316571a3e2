//! Numeric evaluation of symbolic expressions.
//!
//! A [`NumericFunction`] is an expression lowered to a tree of slot references
//! and operations, together with the ordered argument names (its signature).
//! Arguments may be scalars or equal-length columns; length-1 columns broadcast
//! against longer ones.
//!
//! Two backends exist. [`Backend::Vectorized`] evaluates whole columns per
//! node with ndarray arithmetic. [`Backend::Elementwise`] evaluates the scalar
//! tree row by row and is used for equations containing Bessel-family
//! functions, whose evaluation is inherently per point.

use ndarray::{Array1, ArrayView1, Zip};
use num_complex::Complex64;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, SymFitError};
use crate::special;
use crate::symbolic::{Expr, Function, SymbolicError};

/// Row count above which elementwise evaluation is spread over threads.
#[cfg(feature = "parallel")]
const PARALLEL_ROWS: usize = 2048;

/// Evaluation strategy of a compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Column-at-a-time evaluation
    Vectorized,

    /// Row-at-a-time evaluation
    Elementwise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
        }
    }

    fn apply_complex(self, a: Complex64, b: Complex64) -> Complex64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => {
                if b.im == 0.0 && a.im == 0.0 && (a.re >= 0.0 || b.re.fract() == 0.0) {
                    Complex64::new(a.re.powf(b.re), 0.0)
                } else {
                    a.powc(b)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Const(f64),
    Slot(usize),
    Unbound(String),
    Neg(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Call(Function, Vec<Node>),
}

impl Node {
    fn lower(expr: &Expr, signature: &[String]) -> Node {
        let binary = |op, lhs: &Expr, rhs: &Expr| {
            Node::Binary(
                op,
                Box::new(Node::lower(lhs, signature)),
                Box::new(Node::lower(rhs, signature)),
            )
        };
        match expr {
            Expr::Number(v) => Node::Const(*v),
            Expr::Constant(c) => Node::Const(c.value()),
            Expr::Symbol(name) => match signature.iter().position(|s| s == name) {
                Some(index) => Node::Slot(index),
                None => Node::Unbound(name.clone()),
            },
            Expr::Neg(inner) => Node::Neg(Box::new(Node::lower(inner, signature))),
            Expr::Add(lhs, rhs) => binary(BinaryOp::Add, lhs, rhs),
            Expr::Sub(lhs, rhs) => binary(BinaryOp::Sub, lhs, rhs),
            Expr::Mul(lhs, rhs) => binary(BinaryOp::Mul, lhs, rhs),
            Expr::Div(lhs, rhs) => binary(BinaryOp::Div, lhs, rhs),
            Expr::Pow(lhs, rhs) => binary(BinaryOp::Pow, lhs, rhs),
            Expr::Call(function, args) => Node::Call(
                *function,
                args.iter().map(|arg| Node::lower(arg, signature)).collect(),
            ),
        }
    }

    fn eval(&self, args: &[f64]) -> Result<f64> {
        match self {
            Node::Const(v) => Ok(*v),
            Node::Slot(index) => Ok(args[*index]),
            Node::Unbound(name) => Err(SymFitError::UnboundSymbol(name.clone())),
            Node::Neg(inner) => Ok(-inner.eval(args)?),
            Node::Binary(op, lhs, rhs) => Ok(op.apply(lhs.eval(args)?, rhs.eval(args)?)),
            Node::Call(function, call_args) => {
                let values = call_args
                    .iter()
                    .map(|arg| arg.eval(args))
                    .collect::<Result<Vec<f64>>>()?;
                Ok(function.apply(&values)?)
            }
        }
    }

    fn eval_complex(&self, args: &[f64]) -> Result<Complex64> {
        match self {
            Node::Const(v) => Ok(Complex64::new(*v, 0.0)),
            Node::Slot(index) => Ok(Complex64::new(args[*index], 0.0)),
            Node::Unbound(name) => Err(SymFitError::UnboundSymbol(name.clone())),
            Node::Neg(inner) => Ok(-inner.eval_complex(args)?),
            Node::Binary(op, lhs, rhs) => {
                Ok(op.apply_complex(lhs.eval_complex(args)?, rhs.eval_complex(args)?))
            }
            Node::Call(function, call_args) => {
                let values = call_args
                    .iter()
                    .map(|arg| arg.eval_complex(args))
                    .collect::<Result<Vec<Complex64>>>()?;
                apply_complex(*function, &values)
            }
        }
    }

    fn eval_columns(&self, columns: &[Column<'_>]) -> Result<Value> {
        match self {
            Node::Const(v) => Ok(Value::Scalar(*v)),
            Node::Slot(index) => Ok(match &columns[*index] {
                Column::Scalar(v) => Value::Scalar(*v),
                Column::Array(view) => Value::Array(view.to_owned()),
            }),
            Node::Unbound(name) => Err(SymFitError::UnboundSymbol(name.clone())),
            Node::Neg(inner) => Ok(inner.eval_columns(columns)?.map(|v| -v)),
            Node::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval_columns(columns)?;
                let rhs = rhs.eval_columns(columns)?;
                Value::combine(lhs, rhs, |a, b| op.apply(a, b))
            }
            Node::Call(function, call_args) => {
                if call_args.len() != function.arity() {
                    return Err(SymbolicError::ArityMismatch {
                        name: function.name().to_string(),
                        expected: function.arity(),
                        found: call_args.len(),
                    }
                    .into());
                }
                let mut values = call_args
                    .iter()
                    .map(|arg| arg.eval_columns(columns))
                    .collect::<Result<Vec<Value>>>()?;
                let argument = values.pop().ok_or_else(|| {
                    SymFitError::FunctionEvaluation(format!("{}() called without arguments", function.name()))
                })?;
                if function.is_complex_valued() {
                    return Err(complex_valued(*function));
                }
                if function.is_special() {
                    let order = match values.first() {
                        Some(Value::Scalar(order)) => function.order(*order)?,
                        _ => {
                            return Err(SymFitError::FunctionEvaluation(format!(
                                "{}() order must be a scalar",
                                function.name()
                            )))
                        }
                    };
                    let kernel: fn(i32, f64) -> f64 = match function {
                        Function::BesselJ => special::bessel_j,
                        Function::BesselY => special::bessel_y,
                        Function::BesselI => special::bessel_i,
                        _ => special::bessel_k,
                    };
                    return Ok(argument.map(|x| kernel(order, x)));
                }
                let function = *function;
                argument.try_map(|x| Ok(function.apply(&[x])?))
            }
        }
    }
}

fn complex_valued(function: Function) -> SymFitError {
    SymFitError::ComplexResult(format!(
        "{}() is complex-valued; use call_complex",
        function.name()
    ))
}

fn apply_complex(function: Function, args: &[Complex64]) -> Result<Complex64> {
    if args.len() != function.arity() {
        return Err(SymFitError::FunctionEvaluation(format!(
            "{}() takes {} argument(s), got {}",
            function.name(),
            function.arity(),
            args.len()
        )));
    }

    if function.is_special() {
        if args.iter().any(|z| z.im != 0.0) {
            return Err(SymFitError::UnsupportedOperation(format!(
                "{}() of a complex argument",
                function.name()
            )));
        }
        let order = function.order(args[0].re)?;
        let x = args[1].re;
        return Ok(match function {
            Function::Hankel1 => special::hankel1(order, x),
            Function::Hankel2 => special::hankel2(order, x),
            _ => Complex64::new(function.apply(&[args[0].re, x])?, 0.0),
        });
    }

    let z = args[0];
    let value = match function {
        Function::Sin => z.sin(),
        Function::Cos => z.cos(),
        Function::Tan => z.tan(),
        Function::Asin => z.asin(),
        Function::Acos => z.acos(),
        Function::Atan => z.atan(),
        Function::Sinh => z.sinh(),
        Function::Cosh => z.cosh(),
        Function::Tanh => z.tanh(),
        Function::Exp => z.exp(),
        Function::Ln => z.ln(),
        Function::Log10 => z.log10(),
        Function::Sqrt => z.sqrt(),
        Function::Abs => Complex64::new(z.norm(), 0.0),
        _ => {
            return Err(SymFitError::UnsupportedOperation(format!(
                "complex evaluation of {}()",
                function.name()
            )))
        }
    };
    Ok(value)
}

/// An argument column after broadcasting checks.
enum Column<'a> {
    Scalar(f64),
    Array(ArrayView1<'a, f64>),
}

/// Intermediate result of column evaluation.
enum Value {
    Scalar(f64),
    Array(Array1<f64>),
}

impl Value {
    fn map(self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(v) => Value::Scalar(f(v)),
            Value::Array(mut values) => {
                values.mapv_inplace(f);
                Value::Array(values)
            }
        }
    }

    fn try_map(self, f: impl Fn(f64) -> Result<f64>) -> Result<Value> {
        Ok(match self {
            Value::Scalar(v) => Value::Scalar(f(v)?),
            Value::Array(values) => Value::Array(
                values
                    .iter()
                    .map(|&v| f(v))
                    .collect::<Result<Array1<f64>>>()?,
            ),
        })
    }

    fn combine(lhs: Value, rhs: Value, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
        Ok(match (lhs, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(f(a, b)),
            (Value::Array(mut a), Value::Scalar(b)) => {
                a.mapv_inplace(|x| f(x, b));
                Value::Array(a)
            }
            (Value::Scalar(a), Value::Array(mut b)) => {
                b.mapv_inplace(|y| f(a, y));
                Value::Array(b)
            }
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return Err(SymFitError::DimensionMismatch(format!(
                        "cannot broadcast columns of length {} and {}",
                        a.len(),
                        b.len()
                    )));
                }
                Value::Array(Zip::from(&a).and(&b).map_collect(|&x, &y| f(x, y)))
            }
        })
    }

    fn into_array(self, rows: usize) -> Array1<f64> {
        match self {
            Value::Scalar(v) => Array1::from_elem(rows, v),
            Value::Array(values) => values,
        }
    }
}

/// A compiled, callable form of an expression.
#[derive(Debug, Clone)]
pub struct NumericFunction {
    root: Node,
    signature: Vec<String>,
    backend: Backend,
}

impl NumericFunction {
    /// Compile `expr` so that the symbols in `signature` become positional
    /// arguments.
    ///
    /// Symbols outside the signature are not an error here; evaluating them
    /// reports [`SymFitError::UnboundSymbol`].
    pub fn compile(expr: &Expr, signature: &[String], backend: Backend) -> Self {
        log::trace!(
            "compiling '{}' with signature {:?} ({:?})",
            expr,
            signature,
            backend
        );
        Self {
            root: Node::lower(expr, signature),
            signature: signature.to_vec(),
            backend,
        }
    }

    /// Ordered argument names.
    pub fn signature(&self) -> &[String] {
        &self.signature
    }

    /// Evaluation backend in use.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    fn check_arity(&self, found: usize) -> Result<()> {
        if found != self.signature.len() {
            return Err(SymFitError::DimensionMismatch(format!(
                "expected {} argument(s) ({}), got {}",
                self.signature.len(),
                self.signature.join(", "),
                found
            )));
        }
        Ok(())
    }

    /// Evaluate at a single point.
    pub fn call(&self, args: &[f64]) -> Result<f64> {
        self.check_arity(args.len())?;
        self.root.eval(args)
    }

    /// Evaluate at a single point in complex arithmetic.
    pub fn call_complex(&self, args: &[f64]) -> Result<Complex64> {
        self.check_arity(args.len())?;
        self.root.eval_complex(args)
    }

    /// Evaluate over columns of argument values.
    ///
    /// Every column has either length 1 or a common length `n`; the result has
    /// length `n` (1 when every column is length 1).
    pub fn call_arrays(&self, columns: &[ArrayView1<'_, f64>]) -> Result<Array1<f64>> {
        self.check_arity(columns.len())?;

        let mut rows = 1;
        for (name, column) in self.signature.iter().zip(columns) {
            match (rows, column.len()) {
                (_, 0) => {
                    return Err(SymFitError::DimensionMismatch(format!(
                        "argument '{}' is empty",
                        name
                    )))
                }
                (_, 1) => {}
                (1, n) => rows = n,
                (r, n) if r == n => {}
                (r, n) => {
                    return Err(SymFitError::DimensionMismatch(format!(
                        "argument '{}' has length {}, expected {} or 1",
                        name, n, r
                    )))
                }
            }
        }

        match self.backend {
            Backend::Vectorized => {
                let columns: Vec<Column<'_>> = columns
                    .iter()
                    .map(|view| {
                        if view.len() == 1 {
                            Column::Scalar(view[0])
                        } else {
                            Column::Array(view.view())
                        }
                    })
                    .collect();
                Ok(self.root.eval_columns(&columns)?.into_array(rows))
            }
            Backend::Elementwise => self.call_rows(columns, rows),
        }
    }

    fn row(&self, columns: &[ArrayView1<'_, f64>], i: usize) -> Result<f64> {
        let args: Vec<f64> = columns
            .iter()
            .map(|column| if column.len() == 1 { column[0] } else { column[i] })
            .collect();
        self.root.eval(&args)
    }

    #[cfg(feature = "parallel")]
    fn call_rows(&self, columns: &[ArrayView1<'_, f64>], rows: usize) -> Result<Array1<f64>> {
        let values: Result<Vec<f64>> = if rows >= PARALLEL_ROWS {
            (0..rows)
                .into_par_iter()
                .map(|i| self.row(columns, i))
                .collect()
        } else {
            (0..rows).map(|i| self.row(columns, i)).collect()
        };
        Ok(Array1::from(values?))
    }

    #[cfg(not(feature = "parallel"))]
    fn call_rows(&self, columns: &[ArrayView1<'_, f64>], rows: usize) -> Result<Array1<f64>> {
        let values: Result<Vec<f64>> = (0..rows).map(|i| self.row(columns, i)).collect();
        Ok(Array1::from(values?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scalar_call() {
        let expr = Expr::parse("m*x + b").unwrap();
        let f = NumericFunction::compile(&expr, &names(&["m", "b", "x"]), Backend::Vectorized);
        assert_relative_eq!(f.call(&[2.0, 1.0, 3.0]).unwrap(), 7.0);
        assert!(matches!(
            f.call(&[2.0, 1.0]),
            Err(SymFitError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_unbound_symbol_fails_at_call_time() {
        let expr = Expr::parse("m*x + b").unwrap();
        let f = NumericFunction::compile(&expr, &names(&["x"]), Backend::Vectorized);
        match f.call(&[1.0]) {
            Err(SymFitError::UnboundSymbol(name)) => assert_eq!(name, "m"),
            other => panic!("expected UnboundSymbol, got {:?}", other),
        }
    }

    #[test]
    fn test_broadcasting() {
        let expr = Expr::parse("m*x + b").unwrap();
        let f = NumericFunction::compile(&expr, &names(&["m", "b", "x"]), Backend::Vectorized);
        let m = array![2.0];
        let b = array![1.0];
        let x = array![0.0, 1.0, 2.0];
        let y = f.call_arrays(&[m.view(), b.view(), x.view()]).unwrap();
        assert_eq!(y, array![1.0, 3.0, 5.0]);

        let short = array![1.0, 2.0];
        assert!(f
            .call_arrays(&[m.view(), b.view(), short.view()])
            .is_ok());
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            f.call_arrays(&[m.view(), short.view(), y.view()]),
            Err(SymFitError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_constant_expression_broadcasts_to_rows() {
        let expr = Expr::parse("2*pi").unwrap();
        let f = NumericFunction::compile(&expr, &names(&["x"]), Backend::Vectorized);
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = f.call_arrays(&[x.view()]).unwrap();
        assert_eq!(y.len(), 4);
        assert_relative_eq!(y[3], 2.0 * std::f64::consts::PI);
    }

    #[test]
    fn test_backends_agree_on_special_functions() {
        let expr = Expr::parse("A*besselj(1, k*x) + besselk(0, x)").unwrap();
        let signature = names(&["A", "k", "x"]);
        let vectorized = NumericFunction::compile(&expr, &signature, Backend::Vectorized);
        let elementwise = NumericFunction::compile(&expr, &signature, Backend::Elementwise);
        let a = array![1.5];
        let k = array![0.7];
        let x = Array1::linspace(0.5, 10.0, 40);
        let lhs = vectorized.call_arrays(&[a.view(), k.view(), x.view()]).unwrap();
        let rhs = elementwise.call_arrays(&[a.view(), k.view(), x.view()]).unwrap();
        for (l, r) in lhs.iter().zip(rhs.iter()) {
            assert_relative_eq!(*l, *r, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_backends_agree_on_call_errors() {
        // Built directly, bypassing the parser's arity check
        let expr = Expr::call(Function::Sin, vec![Expr::symbol("x"), Expr::symbol("x")]);
        let signature = names(&["x"]);
        let x = array![0.5, 1.0];
        for backend in [Backend::Vectorized, Backend::Elementwise] {
            let f = NumericFunction::compile(&expr, &signature, backend);
            assert!(matches!(f.call(&[0.5]), Err(SymFitError::ParseError(_))));
            assert!(matches!(
                f.call_arrays(&[x.view()]),
                Err(SymFitError::ParseError(_))
            ));
        }

        // Domain errors stay NaN on both paths
        let log = NumericFunction::compile(&Expr::parse("log(x)").unwrap(), &signature, Backend::Vectorized);
        let negative = array![-1.0, 1.0];
        let values = log.call_arrays(&[negative.view()]).unwrap();
        assert!(values[0].is_nan());
        assert!(log.call(&[-1.0]).unwrap().is_nan());
    }

    #[test]
    fn test_complex_valued_functions() {
        let expr = Expr::parse("hankel1(0, x)").unwrap();
        let f = NumericFunction::compile(&expr, &names(&["x"]), Backend::Elementwise);
        assert!(matches!(f.call(&[1.0]), Err(SymFitError::ComplexResult(_))));
        let x = array![1.0, 2.0];
        assert!(matches!(
            f.call_arrays(&[x.view()]),
            Err(SymFitError::ComplexResult(_))
        ));

        let z = f.call_complex(&[1.0]).unwrap();
        assert_relative_eq!(z.re, special::bessel_j(0, 1.0));
        assert_relative_eq!(z.im, special::bessel_y(0, 1.0));

        let root = NumericFunction::compile(&Expr::parse("sqrt(x)").unwrap(), &names(&["x"]), Backend::Vectorized);
        let z = root.call_complex(&[-4.0]).unwrap();
        assert_relative_eq!(z.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(z.im, 2.0, epsilon = 1e-12);
    }
}
