//! Parameter vector implementation
//!
//! This module provides the ParameterVector struct, an ordered, named,
//! growable collection of related parameters sharing one root identity.
//! Element identities are derived from the root, so shrinking and regrowing
//! a vector reproduces the exact parameters that previously occupied the
//! restored slots.

use crate::parameters::identity::ParameterId;
use crate::parameters::parameter::Parameter;
use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Errors that can occur when accessing a parameter vector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("index {index} is out of range for parameter vector '{name}' of length {len}")]
    OutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("parameter '{param}' is not an element of vector '{name}'")]
    NotFound { name: String, param: String },
}

/// Shared state behind a vector handle. Elements hold a weak reference to
/// this record; the name and root identity never change after construction.
pub(crate) struct VectorInner {
    pub(crate) name: String,
    pub(crate) root: ParameterId,
    pub(crate) elements: RwLock<Vec<Parameter>>,
}

/// A container of many related [`Parameter`] objects.
///
/// A vector is faster to construct than the same number of standalone
/// parameters: the root identity is chosen once and each element's identity
/// is derived from it by its index, skipping the per-parameter entropy
/// draw. Element names share the vector's name as a common stem, so a
/// vector called `v` with length 3 contains `v[0]`, `v[1]` and `v[2]`.
///
/// The handle is cheap to clone and clones share the same underlying
/// storage; all mutation goes through [`resize`](Self::resize), which takes
/// effect atomically. Elements are immutable and remain valid after being
/// truncated away, for as long as anything still holds them.
///
/// # Examples
///
/// ```
/// use symparam::parameters::vector::ParameterVector;
///
/// let v = ParameterVector::new("theta", 3);
/// assert_eq!(v.len(), 3);
/// assert_eq!(v.get(1).unwrap().name(), "theta[1]");
/// ```
#[derive(Clone)]
pub struct ParameterVector {
    inner: Arc<VectorInner>,
}

impl ParameterVector {
    /// Create a vector with a fresh random root identity and `length`
    /// eagerly constructed elements at indices `0..length`.
    pub fn new(name: &str, length: usize) -> Self {
        Self::with_root(name, ParameterId::fresh(), length)
    }

    /// Create a vector with an explicit root identity.
    ///
    /// This is the reconstruction path: rebuilding a vector from a
    /// serialized `{name, root, len}` triple reproduces elements that
    /// compare equal to the originals, because derivation from the root is
    /// pure.
    ///
    /// # Examples
    ///
    /// ```
    /// use symparam::parameters::vector::ParameterVector;
    ///
    /// let v = ParameterVector::new("theta", 4);
    /// let rebuilt = ParameterVector::with_root("theta", v.root_id(), 4);
    /// assert_eq!(rebuilt.get(2).unwrap(), v.get(2).unwrap());
    /// ```
    pub fn with_root(name: &str, root: ParameterId, length: usize) -> Self {
        let inner = Arc::new(VectorInner {
            name: name.to_string(),
            root,
            elements: RwLock::new(Vec::with_capacity(length)),
        });
        {
            let mut elements = inner
                .elements
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            elements.extend((0..length).map(|index| Parameter::element_of(&inner, index)));
        }
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<VectorInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<VectorInner> {
        &self.inner
    }

    fn read_elements(&self) -> RwLockReadGuard<'_, Vec<Parameter>> {
        self.inner
            .elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_elements(&self) -> RwLockWriteGuard<'_, Vec<Parameter>> {
        self.inner
            .elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The name of the vector.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The root identity all element identities are derived from.
    pub fn root_id(&self) -> ParameterId {
        self.inner.root
    }

    /// The current number of elements.
    pub fn len(&self) -> usize {
        self.read_elements().len()
    }

    /// Whether the vector currently holds no elements.
    pub fn is_empty(&self) -> bool {
        self.read_elements().is_empty()
    }

    /// Get the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::OutOfRange`] when `index` is not below the
    /// current length.
    ///
    /// # Examples
    ///
    /// ```
    /// use symparam::parameters::vector::ParameterVector;
    ///
    /// let v = ParameterVector::new("a", 3);
    /// assert_eq!(v.get(2).unwrap().name(), "a[2]");
    /// assert!(v.get(5).is_err());
    /// ```
    pub fn get(&self, index: usize) -> Result<Parameter, VectorError> {
        let elements = self.read_elements();
        elements.get(index).cloned().ok_or_else(|| VectorError::OutOfRange {
            name: self.inner.name.clone(),
            index,
            len: elements.len(),
        })
    }

    /// Get the contiguous run of elements at `range`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::OutOfRange`] when the range does not lie
    /// within `0..len`.
    pub fn slice(&self, range: Range<usize>) -> Result<Vec<Parameter>, VectorError> {
        let elements = self.read_elements();
        elements
            .get(range.clone())
            .map(<[Parameter]>::to_vec)
            .ok_or_else(|| VectorError::OutOfRange {
                name: self.inner.name.clone(),
                index: range.end,
                len: elements.len(),
            })
    }

    /// A snapshot of the contained elements, in index order.
    ///
    /// The snapshot is decoupled from the vector: a later `resize` does not
    /// change it, and mutating the returned `Vec` does not touch the
    /// vector. All mutation goes through [`resize`](Self::resize).
    pub fn elements(&self) -> Vec<Parameter> {
        self.read_elements().clone()
    }

    /// Iterate over a snapshot of the elements in index order.
    ///
    /// Each call takes a fresh snapshot, so iteration is restartable.
    pub fn iter(&self) -> impl Iterator<Item = Parameter> {
        self.elements().into_iter()
    }

    /// Find the index of an element within the vector.
    ///
    /// Lookup is by equality, i.e. by identity, so a reconstructed copy of
    /// an element is found at its slot. This is a linear search kept for
    /// when only a bare parameter value is at hand; callers holding a
    /// vector element should prefer its own [`Parameter::index`], which is
    /// O(1).
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::NotFound`] when the parameter is not among
    /// the live elements (including elements truncated away by a shrink).
    pub fn index_of(&self, param: &Parameter) -> Result<usize, VectorError> {
        self.read_elements()
            .iter()
            .position(|element| element == param)
            .ok_or_else(|| VectorError::NotFound {
                name: self.inner.name.clone(),
                param: param.name().to_string(),
            })
    }

    /// Whether `param` is among the live elements.
    pub fn contains(&self, param: &Parameter) -> bool {
        self.read_elements().iter().any(|element| element == param)
    }

    /// Resize the vector. If necessary, new elements are generated.
    ///
    /// Element identities are derived from the vector's root identity and
    /// the element index, so if a vector is resized to be smaller and later
    /// resized to be larger again, the regenerated element at a given index
    /// carries the same identity as the element that previously occupied
    /// it, and compares equal to it. Elements already handed out stay valid
    /// across a shrink; only the vector's own slots are truncated.
    ///
    /// The whole resize takes effect as a single atomic step: concurrent
    /// readers observe either the old or the new sequence, never a partial
    /// one.
    ///
    /// # Examples
    ///
    /// ```
    /// use symparam::parameters::vector::ParameterVector;
    ///
    /// let v = ParameterVector::new("theta", 20);
    /// let elt_19 = v.get(19).unwrap();
    /// v.resize(10);
    /// v.resize(20);
    /// assert_eq!(v.get(19).unwrap(), elt_19);
    /// ```
    pub fn resize(&self, new_length: usize) {
        let mut elements = self.write_elements();
        let current = elements.len();
        if new_length > current {
            let inner = Arc::clone(&self.inner);
            elements.extend((current..new_length).map(|index| Parameter::element_of(&inner, index)));
        } else {
            elements.truncate(new_length);
        }
    }
}

impl PartialEq for ParameterVector {
    /// Two vectors are equal when they agree on root identity, name and
    /// length; root equality already forces element-wise identity equality.
    fn eq(&self, other: &Self) -> bool {
        self.inner.root == other.inner.root
            && self.inner.name == other.inner.name
            && self.len() == other.len()
    }
}

impl Eq for ParameterVector {}

impl IntoIterator for &ParameterVector {
    type Item = Parameter;
    type IntoIter = std::vec::IntoIter<Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements().into_iter()
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, [", self.inner.name)?;
        for (i, element) in self.read_elements().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(element.name())?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterVector")
            .field("name", &self.inner.name)
            .field("root", &self.inner.root)
            .field("len", &self.len())
            .finish()
    }
}

/// Wire form of a vector: elements are not written out, they are rebuilt
/// deterministically from `{name, root, len}` on deserialization.
#[derive(Deserialize)]
#[serde(rename = "ParameterVector")]
struct VectorWire {
    name: String,
    root: u128,
    len: usize,
}

impl Serialize for ParameterVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParameterVector", 3)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("root", &self.root_id().as_u128())?;
        state.serialize_field("len", &self.len())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ParameterVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = VectorWire::deserialize(deserializer)?;
        Ok(ParameterVector::with_root(
            &wire.name,
            ParameterId::from_u128(wire.root),
            wire.len,
        ))
    }
}
