//! Integration tests for FunctionalModel evaluation, binding and algebra.

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use symfit_rs::compile::Backend;
use symfit_rs::special;
use symfit_rs::{FunctionalModel, SymFitError};

use crate::test_helpers::{array_approx_eq, line};

#[test]
fn test_round_trip_evaluation() {
    let line = line();
    assert_eq!(line.call_named(&[("m", 2.0), ("b", 5.0), ("x", 3.0)]).unwrap(), 11.0);
    assert_eq!(line.call(&[2.0, 5.0, 3.0]).unwrap(), 11.0);
}

#[test]
fn test_parameter_binding_idempotence() {
    let mut direct = line();
    direct.set_parameters([("m", -1.5), ("b", 4.0)]).unwrap();

    let mut cycled = line();
    cycled.set_parameters([("m", -1.5), ("b", 4.0)]).unwrap();
    cycled.clear_parameters();
    assert_eq!(cycled.signature(), &["m", "b", "x"]);
    cycled.set_parameters([("m", -1.5), ("b", 4.0)]).unwrap();

    assert_eq!(cycled.signature(), direct.signature());
    let x = Array1::linspace(-3.0, 3.0, 13);
    assert_eq!(cycled.eval(&x).unwrap(), direct.eval(&x).unwrap());
    assert_eq!(cycled.to_string(), direct.to_string());
}

#[test]
fn test_operator_algebra_consistency() {
    let f = line();
    let g = FunctionalModel::new("a w", "x", "a*sin(w*x)").unwrap();
    let (m, b, a, w) = (2.0, 5.0, 0.7, 1.3);

    for &x in &[-1.0, 0.0, 0.4, 2.5] {
        let fx = f.call(&[m, b, x]).unwrap();
        let gx = g.call(&[a, w, x]).unwrap();
        let args = [m, b, a, w, x];

        assert_relative_eq!((&f + &g).unwrap().call(&args).unwrap(), fx + gx, epsilon = 1e-12);
        assert_relative_eq!((&f - &g).unwrap().call(&args).unwrap(), fx - gx, epsilon = 1e-12);
        assert_relative_eq!((&f * &g).unwrap().call(&args).unwrap(), fx * gx, epsilon = 1e-12);
    }
}

#[test]
fn test_algebra_over_distinct_variables() {
    let f = FunctionalModel::new("a", "x", "a*x").unwrap();
    let g = FunctionalModel::new("c", "y", "c*y^2").unwrap();

    let sum = (f + g).unwrap();
    assert_eq!(sum.parameters(), &["a", "c"]);
    assert_eq!(sum.variables(), &["x", "y"]);
    assert_relative_eq!(sum.call(&[2.0, 3.0, 1.5, 2.0]).unwrap(), 3.0 + 12.0);
}

#[test]
fn test_special_function_scalar_and_array_agree() {
    let mut model = FunctionalModel::new("a", "x", "a*besselj(1, x)").unwrap();
    assert!(model.is_special_function());
    assert_eq!(model.backend(), Backend::Elementwise);
    model.set_parameters([("a", 2.0)]).unwrap();

    let x = array![0.5, 1.0, 2.5, 7.0];
    let from_array = model.eval(&x).unwrap();
    let from_scalars: Array1<f64> = x.iter().map(|v| model.call(&[*v]).unwrap()).collect();
    assert!(array_approx_eq(&from_array, &from_scalars, 1e-15));

    for (xi, yi) in x.iter().zip(from_array.iter()) {
        assert_relative_eq!(*yi, 2.0 * special::bessel_j(1, *xi), epsilon = 1e-12);
    }
}

#[test]
fn test_hankel_model_evaluates_in_complex_arithmetic() {
    let model = FunctionalModel::new("", "x", "hankel1(0, x)").unwrap();
    assert!(model.is_special_function());
    assert!(matches!(model.call(&[1.0]), Err(SymFitError::ComplexResult(_))));

    let value = model.call_complex(&[1.0]).unwrap();
    assert_relative_eq!(value.re, special::bessel_j(0, 1.0), epsilon = 1e-12);
    assert_relative_eq!(value.im, special::bessel_y(0, 1.0), epsilon = 1e-12);
}

#[test]
fn test_unbound_symbols_fail_at_call_time() {
    let mut model = line();
    model.set_parameters([("b", 1.0)]).unwrap();
    match model.call(&[2.0]) {
        Err(SymFitError::UnboundSymbol(name)) => assert_eq!(name, "m"),
        other => panic!("expected an unbound symbol error, got {:?}", other),
    }
}

#[test]
fn test_derivative_of_bound_model_prints_substituted() {
    let mut model = FunctionalModel::new("a b c", "x", "a*x^2 + b*x + c").unwrap();
    model.set_parameters([("a", 3.0), ("b", -2.0), ("c", 7.0)]).unwrap();

    let slope = model.d(None, 1).unwrap();
    assert_eq!(slope.to_string(), "6*x - 2");
    assert_relative_eq!(slope.call(&[1.0]).unwrap(), 4.0);
}

#[test]
fn test_json_persistence_of_combined_model() {
    let combined = (line() * 2.0 + 1.0).pow(2.0).unwrap();
    let restored = FunctionalModel::from_json(&combined.to_json().unwrap()).unwrap();

    assert_eq!(restored.parameters(), combined.parameters());
    assert_relative_eq!(
        restored.call(&[1.0, 2.0, 3.0]).unwrap(),
        combined.call(&[1.0, 2.0, 3.0]).unwrap(),
        epsilon = 1e-12
    );
}
