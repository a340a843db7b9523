//! Tests for the Parameter implementation

use std::cmp::Ordering;
use std::collections::HashSet;
use symparam::parameters::identity::ParameterId;
use symparam::parameters::parameter::{Parameter, ParameterError};
use symparam::parameters::vector::ParameterVector;

#[test]
fn test_standalone_creation() {
    let param = Parameter::new("amplitude");
    assert_eq!(param.name(), "amplitude");
    assert_eq!(param.to_string(), "amplitude");
    assert!(param.index().is_none());
    assert!(param.vector().is_none());
    assert!(!param.is_vector_element());
}

#[test]
fn test_identity_drives_equality_and_hash() {
    let a = Parameter::new("x");
    let b = Parameter::new("x");
    let c = Parameter::with_id("x", a.id());

    // Same name is not enough...
    assert_ne!(a, b);
    // ...same identity is, even across distinct objects.
    assert_eq!(a, c);

    let mut set = HashSet::new();
    set.insert(a.clone());
    set.insert(b.clone());
    set.insert(c.clone());
    assert_eq!(set.len(), 2);
    assert!(set.contains(&a));
    assert!(set.contains(&b));
}

#[test]
fn test_vector_element_accessors() {
    let v = ParameterVector::new("theta", 3);
    let element = v.get(1).unwrap();

    assert_eq!(element.name(), "theta[1]");
    assert_eq!(element.index(), Some(1));
    assert!(element.is_vector_element());
    assert_eq!(element.vector().unwrap(), v);
    assert_eq!(element.id(), ParameterId::derive(v.root_id(), 1));
}

#[test]
fn test_checked_reconstruction() {
    let v = ParameterVector::new("theta", 3);

    // Consistent identity: accepted, and indistinguishable from the
    // vector's own element.
    let good = Parameter::vector_element(&v, 2, ParameterId::derive(v.root_id(), 2)).unwrap();
    assert_eq!(good, v.get(2).unwrap());

    // Inconsistent identity: rejected.
    let err = Parameter::vector_element(&v, 2, ParameterId::fresh()).unwrap_err();
    match err {
        ParameterError::InvalidIdentityDerivation { vector, index, .. } => {
            assert_eq!(vector, "theta");
            assert_eq!(index, 2);
        }
    }
}

#[test]
fn test_canonical_order_is_numeric_not_lexicographic() {
    let v = ParameterVector::new("theta", 11);
    let mut elements = vec![
        v.get(10).unwrap(),
        v.get(2).unwrap(),
        v.get(9).unwrap(),
    ];
    elements.sort_by(Parameter::canonical_cmp);

    let names: Vec<&str> = elements.iter().map(|p| p.name()).collect();
    assert_eq!(names, ["theta[2]", "theta[9]", "theta[10]"]);
}

#[test]
fn test_canonical_order_across_vectors() {
    let alpha = ParameterVector::new("alpha", 2);
    let beta = ParameterVector::new("beta", 2);

    assert_eq!(
        alpha.get(1).unwrap().canonical_cmp(&beta.get(0).unwrap()),
        Ordering::Less
    );
}

#[test]
fn test_serde_round_trip() {
    let original = Parameter::new("phi");
    let json = serde_json::to_string(&original).unwrap();
    let rebuilt: Parameter = serde_json::from_str(&json).unwrap();

    assert_eq!(rebuilt, original);
    assert_eq!(rebuilt.name(), original.name());
    assert_eq!(rebuilt.id(), original.id());
}

#[test]
fn test_deserialized_element_sorts_like_the_original() {
    // Elements that lost their membership record still order numerically,
    // because ordering only consults the display name.
    let v = ParameterVector::new("theta", 11);
    let detached_10: Parameter =
        serde_json::from_str(&serde_json::to_string(&v.get(10).unwrap()).unwrap()).unwrap();

    let mut elements = vec![detached_10, v.get(9).unwrap(), v.get(2).unwrap()];
    elements.sort_by(Parameter::canonical_cmp);

    let names: Vec<&str> = elements.iter().map(|p| p.name()).collect();
    assert_eq!(names, ["theta[2]", "theta[9]", "theta[10]"]);
}

#[test]
fn test_clones_share_the_record() {
    let param = Parameter::new("x");
    let clone = param.clone();
    assert_eq!(param, clone);
    assert_eq!(param.id(), clone.id());
    assert_eq!(param.name(), clone.name());
}
