//! Integration tests for the multicosine model.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use symfit_rs::{DataSimulator, FunctionalModel, GridSpec, Multicosine};

#[test]
fn test_declaration_order() {
    let signal = Multicosine::new(&[1.0, 2.0]).unwrap();
    assert_eq!(signal.parameters(), &["A_1", "A_2", "phi_1", "phi_2"]);
    assert_eq!(signal.variables(), &["t"]);
    assert_eq!(signal.signature(), &["A_1", "A_2", "phi_1", "phi_2", "t"]);
}

#[test]
fn test_call_with_all_arguments() {
    let signal = Multicosine::new(&[0.5]).unwrap();
    let value = signal.call(&[3.0, PI / 4.0, 0.25]).unwrap();
    assert_relative_eq!(value, 3.0 * (PI * 0.25 + PI / 4.0).cos(), epsilon = 1e-12);
}

#[test]
fn test_combines_with_other_models() {
    let signal = Multicosine::new(&[1.0]).unwrap();
    let offset = FunctionalModel::new("c", "t", "c").unwrap();

    let shifted = (&*signal + &offset).unwrap();
    assert_eq!(shifted.parameters(), &["A_1", "phi_1", "c"]);
    assert_relative_eq!(shifted.call(&[2.0, 0.0, 1.0, 0.0]).unwrap(), 3.0, epsilon = 1e-12);
}

#[test]
fn test_simulated_signal() {
    let mut signal = Multicosine::new(&[1.0, 4.0]).unwrap();
    signal
        .set_parameters([("A_1", 1.0), ("A_2", 0.25), ("phi_1", 0.0), ("phi_2", PI)])
        .unwrap();

    let mut simulator = DataSimulator::new(signal.into_model()).unwrap();
    simulator.set_x(GridSpec::linear(0.0, 1.0, 101)).unwrap();

    for (t, value) in simulator.x().iter().zip(simulator.data().iter()) {
        let expected = (2.0 * PI * t).cos() + 0.25 * (8.0 * PI * t + PI).cos();
        assert_relative_eq!(*value, expected, epsilon = 1e-12);
    }
}
