//! Integration tests for the symbolic engine through the public API.

use std::collections::HashMap;

use approx::assert_relative_eq;
use symfit_rs::symbolic::Expr;
use symfit_rs::{FunctionalModel, SymFitError};

fn value_at(expr: &Expr, values: &[(&str, f64)]) -> f64 {
    let values: HashMap<String, f64> = values
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect();
    expr.substitute_values(&values).eval_constant().unwrap()
}

#[test]
fn test_parse_and_print() {
    let expr = Expr::parse("a*x^2 + b").unwrap();
    let reparsed = Expr::parse(&expr.to_string()).unwrap();
    assert_eq!(reparsed, expr);
    assert_relative_eq!(value_at(&expr, &[("a", 2.0), ("x", 3.0), ("b", 1.0)]), 19.0);

    assert!(Expr::parse("a*(x + 1").is_err());
    assert!(Expr::parse("besselj(1)").is_err());
}

#[test]
fn test_derivative_matches_finite_difference() {
    let expr = Expr::parse("sin(a*x)*exp(-x/2)").unwrap();
    let derivative = expr.diff("x").unwrap();

    let (a, x, h) = (1.7, 0.4, 1e-6);
    let numeric = (value_at(&expr, &[("a", a), ("x", x + h)])
        - value_at(&expr, &[("a", a), ("x", x - h)]))
        / (2.0 * h);
    assert_relative_eq!(value_at(&derivative, &[("a", a), ("x", x)]), numeric, epsilon = 1e-6);
}

#[test]
fn test_integral_differentiates_back() {
    let expr = Expr::parse("3*x^2 + cos(2*x)").unwrap();
    let integral = expr.integrate("x").unwrap();
    let back = integral.diff("x").unwrap();

    for &x in &[-1.0, 0.3, 2.0] {
        assert_relative_eq!(
            value_at(&back, &[("x", x)]),
            value_at(&expr, &[("x", x)]),
            epsilon = 1e-10
        );
    }
}

#[test]
fn test_limits() {
    let sinc = Expr::parse("sin(x)/x").unwrap();
    assert_relative_eq!(sinc.limit("x", 0.0).unwrap().eval_constant().unwrap(), 1.0);

    let decay = Expr::parse("exp(-x)").unwrap();
    assert_relative_eq!(decay.limit("x", f64::INFINITY).unwrap().eval_constant().unwrap(), 0.0);
}

#[test]
fn test_model_calculus() {
    let model = FunctionalModel::new("A k", "x", "A*sin(k*x)").unwrap();

    let second = model.d(Some("x"), 2).unwrap();
    assert_eq!(second.parameters(), model.parameters());
    let (a, k, x) = (2.0, 3.0, 0.2);
    assert_relative_eq!(
        second.call(&[a, k, x]).unwrap(),
        -a * k * k * (k * x).sin(),
        epsilon = 1e-12
    );

    let area = model.integrate(None, 1).unwrap();
    assert_relative_eq!(
        area.call(&[a, k, x]).unwrap(),
        -a / k * (k * x).cos(),
        epsilon = 1e-12
    );

    let at_zero = model.limit("x", 0.0).unwrap();
    assert_relative_eq!(at_zero.call(&[a, k, 1.0]).unwrap(), 0.0);
}

#[test]
fn test_latex_output() {
    let model = FunctionalModel::new("A omega", "t", "A*sin(omega*t)").unwrap();
    assert_eq!(model.to_latex(), "A \\sin{\\left(\\omega t \\right)}");
}

#[test]
fn test_undeclared_symbol() {
    assert!(matches!(
        FunctionalModel::new("a", "x", "a*x + c"),
        Err(SymFitError::UndeclaredSymbol(name)) if name == "c"
    ));
}

#[test]
fn test_model_integral_of_polynomial_power() {
    let x = 2.0f64;
    let expected = x.powi(5) / 5.0 + 2.0 * x.powi(3) / 3.0 + x;

    for text in ["(x^2+1)^2", "(x^2+1)*(x^2+1)"] {
        let model = FunctionalModel::new("", "x", text).unwrap();
        let area = model.integrate(None, 1).unwrap();
        assert_relative_eq!(area.call(&[x]).unwrap(), expected, epsilon = 1e-12);

        let back = area.d(None, 1).unwrap();
        assert_relative_eq!(back.call(&[x]).unwrap(), model.call(&[x]).unwrap(), epsilon = 1e-12);
    }
}
