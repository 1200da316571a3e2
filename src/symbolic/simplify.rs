//! Expression simplification.
//!
//! Bottom-up rewriting with constant folding and a handful of algebraic
//! identities. The rules keep numeric coefficients on the left of products so
//! derivatives print the way they are written by hand (`2*a*x`).

use super::expr::{Expr, Function};

impl Expr {
    /// Return a simplified copy of the expression.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => self.clone(),
            Expr::Neg(inner) => neg(inner.simplify()),
            Expr::Add(lhs, rhs) => add(lhs.simplify(), rhs.simplify()),
            Expr::Sub(lhs, rhs) => sub(lhs.simplify(), rhs.simplify()),
            Expr::Mul(lhs, rhs) => mul(lhs.simplify(), rhs.simplify()),
            Expr::Div(lhs, rhs) => div(lhs.simplify(), rhs.simplify()),
            Expr::Pow(lhs, rhs) => pow(lhs.simplify(), rhs.simplify()),
            Expr::Call(function, args) => call(*function, args.iter().map(Expr::simplify).collect()),
        }
    }
}

pub(crate) fn neg(a: Expr) -> Expr {
    match a {
        Expr::Number(v) => Expr::Number(-v),
        Expr::Neg(inner) => *inner,
        Expr::Sub(lhs, rhs) => Expr::Sub(rhs, lhs),
        Expr::Mul(lhs, rhs) if lhs.as_number().is_some() => {
            mul(Expr::Number(-lhs.as_number().unwrap_or(0.0)), *rhs)
        }
        other => Expr::Neg(Box::new(other)),
    }
}

pub(crate) fn add(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x + y),
        (Expr::Number(z), b) if z == 0.0 => b,
        (a, Expr::Number(z)) if z == 0.0 => a,
        (a, Expr::Number(y)) if y < 0.0 => sub(a, Expr::Number(-y)),
        (a, Expr::Neg(inner)) => sub(a, *inner),
        (Expr::Neg(inner), b) => sub(b, *inner),
        (a, Expr::Mul(c, rest)) if matches!(*c, Expr::Number(v) if v < 0.0) => {
            let coefficient = c.as_number().unwrap_or(0.0);
            sub(a, mul(Expr::Number(-coefficient), *rest))
        }
        (a, b) if a == b => mul(Expr::Number(2.0), a),
        (a, b) => Expr::Add(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn sub(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x - y),
        (a, Expr::Number(z)) if z == 0.0 => a,
        (Expr::Number(z), b) if z == 0.0 => neg(b),
        (a, Expr::Number(y)) if y < 0.0 => add(a, Expr::Number(-y)),
        (a, Expr::Neg(inner)) => add(a, *inner),
        (a, b) if a == b => Expr::Number(0.0),
        (a, b) => Expr::Sub(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn mul(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x * y),
        (Expr::Number(z), _) | (_, Expr::Number(z)) if z == 0.0 => Expr::Number(0.0),
        (Expr::Number(o), b) if o == 1.0 => b,
        (a, Expr::Number(o)) if o == 1.0 => a,
        (Expr::Number(m), b) if m == -1.0 => neg(b),
        (a, Expr::Number(m)) if m == -1.0 => neg(a),
        (Expr::Number(x), Expr::Mul(c, rest)) if c.as_number().is_some() => {
            mul(Expr::Number(x * c.as_number().unwrap_or(1.0)), *rest)
        }
        (a, Expr::Number(y)) => mul(Expr::Number(y), a),
        (a, Expr::Mul(c, rest)) if c.as_number().is_some() => {
            mul(*c, mul(a, *rest))
        }
        (Expr::Neg(a), b) => neg(mul(*a, b)),
        (a, Expr::Neg(b)) => neg(mul(a, *b)),
        (a, Expr::Div(n, d)) if n.is_one() => div(a, *d),
        (Expr::Pow(base, e1), Expr::Pow(other, e2)) if base == other => {
            pow(*base, add(*e1, *e2))
        }
        (Expr::Pow(base, e), b) if *base == b => pow(b, add(*e, Expr::Number(1.0))),
        (a, Expr::Pow(base, e)) if *base == a => pow(a, add(*e, Expr::Number(1.0))),
        (a, b) if a == b => pow(a, Expr::Number(2.0)),
        (a, b) => Expr::Mul(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn div(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x / y),
        (Expr::Number(z), _) if z == 0.0 => Expr::Number(0.0),
        (a, Expr::Number(o)) if o == 1.0 => a,
        (a, Expr::Number(m)) if m == -1.0 => neg(a),
        (Expr::Mul(c, rest), Expr::Number(d)) if c.as_number().is_some() => {
            mul(Expr::Number(c.as_number().unwrap_or(0.0) / d), *rest)
        }
        (Expr::Neg(a), b) => neg(div(*a, b)),
        (a, Expr::Div(n, d)) => mul(a, div(*d, *n)),
        (Expr::Div(n, d), b) => div(*n, mul(*d, b)),
        (Expr::Number(o), Expr::Call(Function::Exp, mut args)) if o == 1.0 && args.len() == 1 => {
            call(Function::Exp, vec![neg(args.remove(0))])
        }
        (a, b) if a == b => Expr::Number(1.0),
        (a, b) => Expr::Div(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn pow(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => Expr::Number(x.powf(y)),
        (_, Expr::Number(z)) if z == 0.0 => Expr::Number(1.0),
        (a, Expr::Number(o)) if o == 1.0 => a,
        (Expr::Number(o), _) if o == 1.0 => Expr::Number(1.0),
        (Expr::Pow(base, inner), Expr::Number(outer))
            if outer.fract() == 0.0 && inner.as_number().is_some() =>
        {
            Expr::Pow(
                base,
                Box::new(Expr::Number(inner.as_number().unwrap_or(1.0) * outer)),
            )
        }
        (Expr::Call(Function::Sqrt, mut args), Expr::Number(t)) if t == 2.0 && args.len() == 1 => {
            args.remove(0)
        }
        (a, b) => Expr::Pow(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn call(function: Function, mut args: Vec<Expr>) -> Expr {
    if let Some(values) = args.iter().map(Expr::as_number).collect::<Option<Vec<f64>>>() {
        if let Ok(value) = function.apply(&values) {
            if value.is_finite() {
                return Expr::Number(value);
            }
        }
    }

    if args.len() == 1 {
        match (function, &args[0]) {
            (Function::Ln, Expr::Call(Function::Exp, inner)) if inner.len() == 1 => {
                return inner[0].clone();
            }
            (Function::Exp, Expr::Call(Function::Ln, inner)) if inner.len() == 1 => {
                return inner[0].clone();
            }
            (Function::Ln, Expr::Constant(super::Constant::E)) => return Expr::Number(1.0),
            _ => {}
        }
        if let Expr::Neg(inner) = &args[0] {
            // Odd functions pull the sign out, even ones drop it
            match function {
                Function::Sin | Function::Tan | Function::Sinh | Function::Tanh | Function::Asin
                | Function::Atan => {
                    return neg(call(function, vec![(**inner).clone()]));
                }
                Function::Cos | Function::Cosh | Function::Abs => {
                    args = vec![(**inner).clone()];
                }
                _ => {}
            }
        }
    }

    Expr::Call(function, args)
}
