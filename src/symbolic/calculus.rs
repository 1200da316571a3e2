//! Differentiation, integration and limits.

use super::expr::{Constant, Expr, Function};
use super::simplify::{add, call, div, mul, neg, pow, sub};
use super::SymbolicError;

/// Maximum number of L'Hôpital rounds attempted by [`Expr::limit`].
const MAX_LHOPITAL_STEPS: usize = 8;

impl Expr {
    /// Derivative with respect to `var`, simplified.
    pub fn diff(&self, var: &str) -> Result<Expr, SymbolicError> {
        Ok(derivative(self, var)?.simplify())
    }

    /// Indefinite integral with respect to `var`, without integration constant.
    ///
    /// Covers polynomials, linear combinations and the elementary functions of a
    /// linear argument. Anything else reports [`SymbolicError::Unsupported`].
    pub fn integrate(&self, var: &str) -> Result<Expr, SymbolicError> {
        Ok(antiderivative(&self.simplify(), var)?.simplify())
    }

    /// Limit of the expression as `var` approaches `point`.
    ///
    /// `point` may be infinite. Indeterminate quotients are resolved with
    /// L'Hôpital's rule; if the limit cannot be determined the operation is
    /// reported as unsupported.
    pub fn limit(&self, var: &str, point: f64) -> Result<Expr, SymbolicError> {
        let expr = self.simplify();
        if !expr.depends_on(var) {
            return Ok(expr);
        }
        limit_of(&expr, var, point, MAX_LHOPITAL_STEPS)
    }
}

fn derivative(expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
    if !expr.depends_on(var) {
        return Ok(Expr::Number(0.0));
    }

    let result = match expr {
        Expr::Number(_) | Expr::Constant(_) => Expr::Number(0.0),
        Expr::Symbol(name) => Expr::Number(if name == var { 1.0 } else { 0.0 }),
        Expr::Neg(inner) => neg(derivative(inner, var)?),
        Expr::Add(u, v) => add(derivative(u, var)?, derivative(v, var)?),
        Expr::Sub(u, v) => sub(derivative(u, var)?, derivative(v, var)?),
        Expr::Mul(u, v) => add(
            mul(derivative(u, var)?, (**v).clone()),
            mul((**u).clone(), derivative(v, var)?),
        ),
        Expr::Div(u, v) => {
            if !v.depends_on(var) {
                div(derivative(u, var)?, (**v).clone())
            } else {
                let numerator = sub(
                    mul(derivative(u, var)?, (**v).clone()),
                    mul((**u).clone(), derivative(v, var)?),
                );
                div(numerator, pow((**v).clone(), Expr::Number(2.0)))
            }
        }
        Expr::Pow(base, exponent) => {
            let (base, exponent) = (&**base, &**exponent);
            if !exponent.depends_on(var) {
                // n * u^(n-1) * u'
                let reduced = sub(exponent.clone(), Expr::Number(1.0));
                mul(
                    mul(exponent.clone(), pow(base.clone(), reduced)),
                    derivative(base, var)?,
                )
            } else if !base.depends_on(var) {
                // c^v * ln(c) * v'
                mul(
                    mul(expr.clone(), call(Function::Ln, vec![base.clone()])),
                    derivative(exponent, var)?,
                )
            } else {
                // u^v * (v' ln u + v u'/u)
                let log_term = mul(
                    derivative(exponent, var)?,
                    call(Function::Ln, vec![base.clone()]),
                );
                let ratio_term = div(
                    mul(exponent.clone(), derivative(base, var)?),
                    base.clone(),
                );
                mul(expr.clone(), add(log_term, ratio_term))
            }
        }
        Expr::Call(function, args) => call_derivative(*function, args, var)?,
    };
    Ok(result)
}

fn call_derivative(function: Function, args: &[Expr], var: &str) -> Result<Expr, SymbolicError> {
    if function.is_special() {
        let (order, arg) = match args {
            [order, arg] => (order, arg),
            _ => {
                return Err(SymbolicError::ArityMismatch {
                    name: function.name().to_string(),
                    expected: 2,
                    found: args.len(),
                })
            }
        };
        if order.depends_on(var) {
            return Err(SymbolicError::Unsupported {
                message: format!(
                    "derivative of {}() with respect to its order",
                    function.name()
                ),
            });
        }
        let lower = Expr::Call(function, vec![sub(order.clone(), Expr::Number(1.0)), arg.clone()]);
        let upper = Expr::Call(function, vec![add(order.clone(), Expr::Number(1.0)), arg.clone()]);
        let outer = match function {
            Function::BesselI => div(add(lower, upper), Expr::Number(2.0)),
            Function::BesselK => neg(div(add(lower, upper), Expr::Number(2.0))),
            _ => div(sub(lower, upper), Expr::Number(2.0)),
        };
        return Ok(mul(outer, derivative(arg, var)?));
    }

    let u = match args {
        [u] => u,
        _ => {
            return Err(SymbolicError::ArityMismatch {
                name: function.name().to_string(),
                expected: 1,
                found: args.len(),
            })
        }
    };
    let one = || Expr::Number(1.0);
    let two = || Expr::Number(2.0);
    let square = || pow(u.clone(), two());
    let outer = match function {
        Function::Sin => call(Function::Cos, vec![u.clone()]),
        Function::Cos => neg(call(Function::Sin, vec![u.clone()])),
        Function::Tan => div(one(), pow(call(Function::Cos, vec![u.clone()]), two())),
        Function::Asin => div(one(), call(Function::Sqrt, vec![sub(one(), square())])),
        Function::Acos => neg(div(one(), call(Function::Sqrt, vec![sub(one(), square())]))),
        Function::Atan => div(one(), add(one(), square())),
        Function::Sinh => call(Function::Cosh, vec![u.clone()]),
        Function::Cosh => call(Function::Sinh, vec![u.clone()]),
        Function::Tanh => div(one(), pow(call(Function::Cosh, vec![u.clone()]), two())),
        Function::Exp => call(Function::Exp, vec![u.clone()]),
        Function::Ln => div(one(), u.clone()),
        Function::Log10 => div(
            one(),
            mul(u.clone(), call(Function::Ln, vec![Expr::Number(10.0)])),
        ),
        Function::Sqrt => div(one(), mul(two(), call(Function::Sqrt, vec![u.clone()]))),
        Function::Abs => div(u.clone(), call(Function::Abs, vec![u.clone()])),
        _ => {
            return Err(SymbolicError::Unsupported {
                message: format!("derivative of {}()", function.name()),
            })
        }
    };
    Ok(mul(outer, derivative(u, var)?))
}

fn unsupported_integral(expr: &Expr, var: &str) -> SymbolicError {
    SymbolicError::Unsupported {
        message: format!("no closed-form antiderivative of {} with respect to {}", expr, var),
    }
}

/// Split `expr` into `(constant factor, remainder)` with respect to `var`.
fn split_constant_factor(expr: &Expr, var: &str) -> (Expr, Expr) {
    match expr {
        Expr::Mul(u, v) if !u.depends_on(var) => {
            let (c, rest) = split_constant_factor(v, var);
            (mul((**u).clone(), c), rest)
        }
        Expr::Mul(u, v) if !v.depends_on(var) => {
            let (c, rest) = split_constant_factor(u, var);
            (mul(c, (**v).clone()), rest)
        }
        Expr::Div(u, v) if !v.depends_on(var) => {
            let (c, rest) = split_constant_factor(u, var);
            (div(c, (**v).clone()), rest)
        }
        Expr::Neg(inner) => {
            let (c, rest) = split_constant_factor(inner, var);
            (neg(c), rest)
        }
        _ => (Expr::Number(1.0), expr.clone()),
    }
}

/// Slope of `arg` in `var` when `arg` is linear in `var`.
fn linear_slope(arg: &Expr, var: &str) -> Option<Expr> {
    let slope = derivative(arg, var).ok()?.simplify();
    if slope.depends_on(var) || slope.is_zero() {
        None
    } else {
        Some(slope)
    }
}

fn antiderivative(expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
    if !expr.depends_on(var) {
        return Ok(mul(expr.clone(), Expr::Symbol(var.to_string())));
    }

    match expr {
        Expr::Symbol(_) => {
            return Ok(div(
                pow(expr.clone(), Expr::Number(2.0)),
                Expr::Number(2.0),
            ))
        }
        Expr::Add(u, v) => return Ok(add(antiderivative(u, var)?, antiderivative(v, var)?)),
        Expr::Sub(u, v) => return Ok(sub(antiderivative(u, var)?, antiderivative(v, var)?)),
        Expr::Neg(inner) => return Ok(neg(antiderivative(inner, var)?)),
        _ => {}
    }

    let (factor, rest) = split_constant_factor(expr, var);
    if !factor.is_one() {
        return Ok(mul(factor, antiderivative(&rest, var)?));
    }

    match expr {
        Expr::Pow(base, exponent) if !exponent.depends_on(var) => {
            let Some(slope) = linear_slope(base, var) else {
                // Integer powers of a polynomial
                return expand_polynomial(expr, var);
            };
            if exponent.as_number() == Some(-1.0) {
                return Ok(div(call(Function::Ln, vec![(**base).clone()]), slope));
            }
            let raised = add((**exponent).clone(), Expr::Number(1.0));
            Ok(div(
                pow((**base).clone(), raised.clone()),
                mul(raised, slope),
            ))
        }
        Expr::Pow(base, exponent) if !base.depends_on(var) => {
            let slope = linear_slope(exponent, var).ok_or_else(|| unsupported_integral(expr, var))?;
            let log_base = match **base {
                Expr::Constant(Constant::E) => Expr::Number(1.0),
                _ => call(Function::Ln, vec![(**base).clone()]),
            };
            Ok(div(expr.clone(), mul(log_base, slope)))
        }
        Expr::Div(u, v) if !u.depends_on(var) => {
            let slope = linear_slope(v, var).ok_or_else(|| unsupported_integral(expr, var))?;
            Ok(div(
                mul((**u).clone(), call(Function::Ln, vec![(**v).clone()])),
                slope,
            ))
        }
        Expr::Call(function, args) if args.len() == 1 => {
            let u = &args[0];
            let slope = linear_slope(u, var).ok_or_else(|| unsupported_integral(expr, var))?;
            let primitive = match function {
                Function::Sin => neg(call(Function::Cos, vec![u.clone()])),
                Function::Cos => call(Function::Sin, vec![u.clone()]),
                Function::Tan => neg(call(
                    Function::Ln,
                    vec![call(Function::Cos, vec![u.clone()])],
                )),
                Function::Exp => expr.clone(),
                Function::Sinh => call(Function::Cosh, vec![u.clone()]),
                Function::Cosh => call(Function::Sinh, vec![u.clone()]),
                Function::Ln => sub(
                    mul(u.clone(), call(Function::Ln, vec![u.clone()])),
                    u.clone(),
                ),
                Function::Sqrt => mul(
                    Expr::Number(2.0 / 3.0),
                    pow(u.clone(), Expr::Number(1.5)),
                ),
                _ => return Err(unsupported_integral(expr, var)),
            };
            Ok(div(primitive, slope))
        }
        Expr::Mul(_, _) => expand_polynomial(expr, var),
        _ => Err(unsupported_integral(expr, var)),
    }
}

/// Integrate a polynomial (a product or integer power of polynomial factors)
/// by expanding it into coefficient form.
fn expand_polynomial(expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
    let coefficients = polynomial_coefficients(expr, var).ok_or_else(|| unsupported_integral(expr, var))?;
    let x = Expr::Symbol(var.to_string());
    let mut result = Expr::Number(0.0);
    for (power, coefficient) in coefficients.into_iter().enumerate() {
        if coefficient.is_zero() {
            continue;
        }
        let raised = (power + 1) as f64;
        let term = div(
            mul(coefficient, pow(x.clone(), Expr::Number(raised))),
            Expr::Number(raised),
        );
        result = add(result, term);
    }
    Ok(result)
}

/// Coefficients of `expr` as a polynomial in `var`, lowest power first.
fn polynomial_coefficients(expr: &Expr, var: &str) -> Option<Vec<Expr>> {
    if !expr.depends_on(var) {
        return Some(vec![expr.clone()]);
    }
    match expr {
        Expr::Symbol(_) => Some(vec![Expr::Number(0.0), Expr::Number(1.0)]),
        Expr::Neg(inner) => Some(
            polynomial_coefficients(inner, var)?
                .into_iter()
                .map(neg)
                .collect(),
        ),
        Expr::Add(u, v) | Expr::Sub(u, v) => {
            let lhs = polynomial_coefficients(u, var)?;
            let rhs = polynomial_coefficients(v, var)?;
            let subtract = matches!(expr, Expr::Sub(_, _));
            let len = lhs.len().max(rhs.len());
            Some(
                (0..len)
                    .map(|i| {
                        let a = lhs.get(i).cloned().unwrap_or(Expr::Number(0.0));
                        let b = rhs.get(i).cloned().unwrap_or(Expr::Number(0.0));
                        if subtract {
                            sub(a, b)
                        } else {
                            add(a, b)
                        }
                    })
                    .collect(),
            )
        }
        Expr::Mul(u, v) => {
            let lhs = polynomial_coefficients(u, var)?;
            let rhs = polynomial_coefficients(v, var)?;
            let mut product = vec![Expr::Number(0.0); lhs.len() + rhs.len() - 1];
            for (i, a) in lhs.iter().enumerate() {
                for (j, b) in rhs.iter().enumerate() {
                    let term = mul(a.clone(), b.clone());
                    product[i + j] = add(product[i + j].clone(), term);
                }
            }
            Some(product)
        }
        Expr::Div(u, v) if !v.depends_on(var) => Some(
            polynomial_coefficients(u, var)?
                .into_iter()
                .map(|c| div(c, (**v).clone()))
                .collect(),
        ),
        Expr::Pow(base, exponent) => {
            let n = exponent.as_number()?;
            if n < 0.0 || n.fract() != 0.0 || n > 64.0 {
                return None;
            }
            let base = polynomial_coefficients(base, var)?;
            let mut result = vec![Expr::Number(1.0)];
            for _ in 0..n as usize {
                let mut next = vec![Expr::Number(0.0); result.len() + base.len() - 1];
                for (i, a) in result.iter().enumerate() {
                    for (j, b) in base.iter().enumerate() {
                        next[i + j] = add(next[i + j].clone(), mul(a.clone(), b.clone()));
                    }
                }
                result = next;
            }
            Some(result)
        }
        _ => None,
    }
}

fn is_indeterminate_pair(numerator: f64, denominator: f64) -> bool {
    (numerator == 0.0 && denominator == 0.0)
        || (numerator.is_infinite() && denominator.is_infinite())
}

/// Numeric value of `expr` at `var = point`, if it evaluates cleanly.
fn value_at(expr: &Expr, var: &str, point: f64) -> Option<f64> {
    expr.substitute(var, &Expr::Number(point))
        .simplify()
        .eval_constant()
        .filter(|v| !v.is_nan())
}

fn limit_of(expr: &Expr, var: &str, point: f64, budget: usize) -> Result<Expr, SymbolicError> {
    let substituted = expr.substitute(var, &Expr::Number(point)).simplify();
    if let Some(value) = substituted.eval_constant() {
        if !value.is_nan() {
            return Ok(Expr::Number(value));
        }
    } else if !contains_non_finite(&substituted) {
        // Other symbols remain but the point itself is regular
        return Ok(substituted);
    }

    let undetermined = || SymbolicError::Unsupported {
        message: format!("could not determine the limit of {} as {} -> {}", expr, var, point),
    };

    if budget == 0 {
        return Err(undetermined());
    }

    let (numerator, denominator) = match expr {
        Expr::Div(u, v) => ((**u).clone(), (**v).clone()),
        Expr::Mul(u, v) => {
            // 0 * oo becomes u / (1/v)
            let (a, b) = (value_at(u, var, point), value_at(v, var, point));
            match (a, b) {
                (Some(a), Some(b)) if a == 0.0 && b.is_infinite() => {
                    ((**u).clone(), div(Expr::Number(1.0), (**v).clone()))
                }
                (Some(a), Some(b)) if a.is_infinite() && b == 0.0 => {
                    ((**v).clone(), div(Expr::Number(1.0), (**u).clone()))
                }
                _ => return Err(undetermined()),
            }
        }
        _ => return Err(undetermined()),
    };

    match (
        value_at(&numerator, var, point),
        value_at(&denominator, var, point),
    ) {
        (Some(n), Some(d)) if is_indeterminate_pair(n, d) => {
            let next = div(derivative(&numerator, var)?, derivative(&denominator, var)?).simplify();
            limit_of(&next, var, point, budget - 1)
        }
        _ => Err(undetermined()),
    }
}

fn contains_non_finite(expr: &Expr) -> bool {
    match expr {
        Expr::Number(v) => !v.is_finite(),
        Expr::Symbol(_) | Expr::Constant(_) => false,
        Expr::Neg(inner) => contains_non_finite(inner),
        Expr::Add(lhs, rhs)
        | Expr::Sub(lhs, rhs)
        | Expr::Mul(lhs, rhs)
        | Expr::Div(lhs, rhs)
        | Expr::Pow(lhs, rhs) => contains_non_finite(lhs) || contains_non_finite(rhs),
        Expr::Call(_, args) => args.iter().any(contains_non_finite),
    }
}
