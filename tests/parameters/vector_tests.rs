//! Tests for the ParameterVector implementation

use std::collections::HashSet;
use std::thread;
use symparam::parameters::identity::ParameterId;
use symparam::parameters::vector::{ParameterVector, VectorError};

#[test]
fn test_eager_construction() {
    let v = ParameterVector::new("theta", 5);
    assert_eq!(v.name(), "theta");
    assert_eq!(v.len(), 5);

    for i in 0..5 {
        let element = v.get(i).unwrap();
        assert_eq!(element.name(), format!("theta[{}]", i));
        assert_eq!(element.index(), Some(i));
        assert_eq!(element.id(), ParameterId::derive(v.root_id(), i));
    }
}

#[test]
fn test_default_length_is_zero_support() {
    let v = ParameterVector::new("phi", 0);
    assert!(v.is_empty());
    assert_eq!(v.iter().count(), 0);
}

#[test]
fn test_get_out_of_range() {
    let v = ParameterVector::new("a", 3);
    match v.get(5) {
        Err(VectorError::OutOfRange { name, index, len }) => {
            assert_eq!(name, "a");
            assert_eq!(index, 5);
            assert_eq!(len, 3);
        }
        _ => panic!("expected OutOfRange"),
    }
}

#[test]
fn test_slice_access() {
    let v = ParameterVector::new("a", 6);
    let run = v.slice(2..5).unwrap();
    assert_eq!(run.len(), 3);
    assert_eq!(run[0].name(), "a[2]");
    assert_eq!(run[2].name(), "a[4]");

    assert!(matches!(
        v.slice(4..7),
        Err(VectorError::OutOfRange { .. })
    ));
}

#[test]
fn test_index_of_prefers_identity() {
    let v = ParameterVector::new("a", 4);
    let e1 = v.get(1).unwrap();

    // A reconstructed copy is found at the same slot.
    let copy: symparam::Parameter =
        serde_json::from_str(&serde_json::to_string(&e1).unwrap()).unwrap();
    assert_eq!(v.index_of(&copy).unwrap(), 1);

    let foreign = symparam::Parameter::new("a[1]");
    assert!(matches!(
        v.index_of(&foreign),
        Err(VectorError::NotFound { .. })
    ));
}

#[test]
fn test_resize_shrink_then_regrow_reproduces_elements() {
    let v = ParameterVector::new("a", 20);
    let originals = v.elements();

    v.resize(10);
    assert_eq!(v.len(), 10);
    v.resize(20);
    assert_eq!(v.len(), 20);

    for (i, original) in originals.iter().enumerate() {
        assert_eq!(&v.get(i).unwrap(), original);
    }
}

#[test]
fn test_resize_grow_shrink_restore_cycles() {
    // resize(k); resize(m); resize(k) reproduces the elements at every
    // index still in range, for shrink and grow alike.
    let v = ParameterVector::new("a", 8);
    let originals = v.elements();

    for target in [3, 12, 8, 1, 8] {
        v.resize(target);
    }

    assert_eq!(v.len(), 8);
    for (i, original) in originals.iter().enumerate() {
        assert_eq!(&v.get(i).unwrap(), original);
    }
}

#[test]
fn test_truncated_elements_remain_valid() {
    let v = ParameterVector::new("a", 6);
    let e5 = v.get(5).unwrap();

    v.resize(2);

    // The vector no longer lists it, but the element itself is untouched.
    assert!(!v.contains(&e5));
    assert_eq!(e5.name(), "a[5]");
    assert_eq!(e5.index(), Some(5));
    assert_eq!(e5.vector().unwrap(), v);
}

#[test]
fn test_roots_differ_across_vectors() {
    let a = ParameterVector::new("v", 10);
    let b = ParameterVector::new("v", 10);

    assert_ne!(a.root_id(), b.root_id());
    let ids: HashSet<_> = a.iter().chain(b.iter()).map(|p| p.id()).collect();
    assert_eq!(ids.len(), 20);
}

#[test]
fn test_iteration_in_index_order() {
    let v = ParameterVector::new("a", 5);
    let indices: Vec<_> = v.iter().map(|p| p.index().unwrap()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);

    // `for` loops over a borrowed vector work too.
    let mut count = 0;
    for element in &v {
        assert_eq!(element.index(), Some(count));
        count += 1;
    }
    assert_eq!(count, 5);
}

#[test]
fn test_with_root_reconstruction() {
    let v = ParameterVector::new("theta", 7);
    let rebuilt = ParameterVector::with_root("theta", v.root_id(), 7);

    assert_eq!(rebuilt, v);
    for i in 0..7 {
        assert_eq!(rebuilt.get(i).unwrap(), v.get(i).unwrap());
    }
}

#[test]
fn test_json_round_trip() {
    let v = ParameterVector::new("theta", 7);
    v.resize(3);

    let json = serde_json::to_string(&v).unwrap();
    let rebuilt: ParameterVector = serde_json::from_str(&json).unwrap();

    assert_eq!(rebuilt.len(), 3);
    assert_eq!(rebuilt, v);

    // Regrowing the rebuilt vector reproduces elements the original handed
    // out before it was serialized.
    let original_6 = {
        v.resize(7);
        v.get(6).unwrap()
    };
    rebuilt.resize(7);
    assert_eq!(rebuilt.get(6).unwrap(), original_6);
}

#[test]
fn test_concurrent_reads_and_resizes() {
    let v = ParameterVector::new("t", 64);
    let expected = v.elements();

    let mut handles = Vec::new();
    for worker in 0..4 {
        let v = v.clone();
        let expected = expected.clone();
        handles.push(thread::spawn(move || {
            for round in 0..100 {
                if worker % 2 == 0 {
                    v.resize(if round % 2 == 0 { 16 } else { 64 });
                } else {
                    // Snapshots are always a consistent prefix of the
                    // derived element sequence, never a partial state.
                    let snapshot = v.elements();
                    assert!(snapshot.len() == 16 || snapshot.len() == 64);
                    for (i, element) in snapshot.iter().enumerate() {
                        assert_eq!(element.index(), Some(i));
                        assert_eq!(element, &expected[i]);
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    v.resize(64);
    assert_eq!(v.elements(), expected);
}
