//! End-to-end scenarios: vectors feeding expressions, resize cycles, and
//! identity-preserving round-trips through JSON.

use approx::assert_relative_eq;
use std::collections::HashMap;
use symparam::parameters::expression::Expression;
use symparam::parameters::vector::VectorError;
use symparam::{Parameter, ParameterVector};

#[test]
fn test_resize_scenario() {
    let v = ParameterVector::new("a", 20);
    let e19 = v.get(19).unwrap();

    v.resize(10);
    v.resize(20);

    assert_eq!(v.get(19).unwrap(), e19);
}

#[test]
fn test_out_of_range_scenario() {
    let v = ParameterVector::new("a", 3);
    assert!(matches!(v.get(5), Err(VectorError::OutOfRange { .. })));
}

#[test]
fn test_ansatz_coefficients_survive_resize() {
    // A consumer builds a weighted sum whose coefficients are expressions
    // over vector elements, the way an operator-algebra layer attaches
    // parametric weights to its terms.
    let theta = ParameterVector::new("theta", 8);
    let coefficients: Vec<Expression> = theta
        .iter()
        .map(|p| Expression::from(p).sin() * 0.5)
        .collect();

    // The vector shrinks under the consumer's feet...
    theta.resize(4);

    // ...but every coefficient stays a valid, bindable operand.
    let values: HashMap<_, _> = coefficients
        .iter()
        .flat_map(|c| c.parameters())
        .map(|p| (p.id(), 0.0))
        .collect();
    for coefficient in &coefficients {
        assert_relative_eq!(coefficient.evaluate(&values).unwrap(), 0.0);
    }

    // Regrowing the vector reproduces the original leaves, so freshly
    // built coefficients match the old ones term for term.
    theta.resize(8);
    let rebuilt: Vec<Expression> = theta
        .iter()
        .map(|p| Expression::from(p).sin() * 0.5)
        .collect();
    assert_eq!(coefficients, rebuilt);
}

#[test]
fn test_full_round_trip_through_json() {
    let theta = ParameterVector::new("theta", 5);
    let gamma = Parameter::new("gamma");
    let expr = theta.get(4).unwrap() * 2.0 + gamma.clone();

    // Persist the vector and the standalone parameter separately.
    let vector_json = serde_json::to_string(&theta).unwrap();
    let param_json = serde_json::to_string(&gamma).unwrap();

    // A later process restores them and rebuilds the same expression.
    let restored_vector: ParameterVector = serde_json::from_str(&vector_json).unwrap();
    let restored_gamma: Parameter = serde_json::from_str(&param_json).unwrap();
    let rebuilt = restored_vector.get(4).unwrap() * 2.0 + restored_gamma.clone();

    assert_eq!(rebuilt, expr);

    // Binding through the restored objects drives the original expression.
    let values = HashMap::from([
        (restored_vector.get(4).unwrap().id(), 1.5),
        (restored_gamma.id(), 0.5),
    ]);
    assert_relative_eq!(expr.evaluate(&values).unwrap(), 3.5);
}

#[test]
fn test_parse_reproduces_programmatic_expression() {
    let theta = ParameterVector::new("theta", 3);
    let built = theta.get(0).unwrap() * 2.0 + theta.get(1).unwrap() * theta.get(2).unwrap();

    let parsed = Expression::parse("theta[0] * 2 + theta[1] * theta[2]", &theta).unwrap();
    assert_eq!(parsed, built);
}

#[test]
fn test_index_of_round_trips_with_get() {
    let v = ParameterVector::new("p", 30);
    for i in (0..30).step_by(7) {
        let element = v.get(i).unwrap();
        assert_eq!(v.index_of(&element).unwrap(), i);
        assert_eq!(element.index(), Some(i));
    }
}
