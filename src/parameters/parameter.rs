//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, the symbolic leaf of the
//! expression layer. A parameter is an immutable pair of display name and
//! 128-bit identity, optionally tagged with the vector it belongs to and its
//! position in that vector. Equality and hashing go through the identity
//! alone; names exist for display.

use crate::parameters::identity::ParameterId;
use crate::parameters::vector::{ParameterVector, VectorInner};
use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Errors that can occur when constructing parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error(
        "identity {found} does not match the identity derived for element {index} \
         of vector '{vector}' (expected {expected})"
    )]
    InvalidIdentityDerivation {
        vector: String,
        index: usize,
        found: ParameterId,
        expected: ParameterId,
    },
}

/// Membership record attaching an element to its owning vector.
///
/// The back-reference is weak: an element never keeps its vector alive.
struct Membership {
    vector: Weak<VectorInner>,
    index: usize,
}

struct Inner {
    name: String,
    id: ParameterId,
    membership: Option<Membership>,
}

/// A symbolic parameter usable as a leaf inside arithmetic expressions.
///
/// Parameters are immutable once constructed and cheap to clone; clones
/// share the same underlying record, and independently constructed
/// parameters carrying the same identity compare equal. This is what lets a
/// deserialized parameter stand in for the original inside any expression.
///
/// # Examples
///
/// ```
/// use symparam::parameters::parameter::Parameter;
///
/// let theta = Parameter::new("theta");
/// assert_eq!(theta.name(), "theta");
/// assert_eq!(theta, theta.clone());
///
/// // Same name, different identity: a different symbol.
/// let other = Parameter::new("theta");
/// assert_ne!(theta, other);
/// ```
#[derive(Clone)]
pub struct Parameter {
    inner: Arc<Inner>,
}

impl Parameter {
    /// Create a standalone parameter with a fresh random identity.
    pub fn new(name: &str) -> Self {
        Self::with_id(name, ParameterId::fresh())
    }

    /// Create a standalone parameter with an explicit identity.
    ///
    /// This is the reconstruction path: a parameter rebuilt from a
    /// previously serialized identity compares equal (and hashes equal) to
    /// the original object.
    ///
    /// # Examples
    ///
    /// ```
    /// use symparam::parameters::parameter::Parameter;
    ///
    /// let original = Parameter::new("alpha");
    /// let rebuilt = Parameter::with_id("alpha", original.id());
    /// assert_eq!(original, rebuilt);
    /// ```
    pub fn with_id(name: &str, id: ParameterId) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                id,
                membership: None,
            }),
        }
    }

    /// Reconstruct a vector element from its parts, checking the identity.
    ///
    /// The bulk construction path inside [`ParameterVector`] derives element
    /// identities itself and is the normal way elements come into being.
    /// This constructor exists for reattaching a deserialized element to a
    /// live vector; it rejects an identity inconsistent with the vector's
    /// root so the determinism invariant cannot be violated from outside.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::InvalidIdentityDerivation`] when `id` is
    /// not the value derived from the vector's root identity and `index`.
    pub fn vector_element(
        vector: &ParameterVector,
        index: usize,
        id: ParameterId,
    ) -> Result<Self, ParameterError> {
        let expected = ParameterId::derive(vector.root_id(), index);
        if id != expected {
            return Err(ParameterError::InvalidIdentityDerivation {
                vector: vector.name().to_string(),
                index,
                found: id,
                expected,
            });
        }
        Ok(Self::element_of(vector.inner(), index))
    }

    /// Construct the element at `index` of `vector`, deriving its identity.
    ///
    /// Only the vector's own construction/resize path calls this; the name
    /// is synthesized as `"{vector.name}[{index}]"`.
    pub(crate) fn element_of(vector: &Arc<VectorInner>, index: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: format!("{}[{}]", vector.name, index),
                id: ParameterId::derive(vector.root, index),
                membership: Some(Membership {
                    vector: Arc::downgrade(vector),
                    index,
                }),
            }),
        }
    }

    /// The display name of the parameter.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The identity of the parameter.
    pub fn id(&self) -> ParameterId {
        self.inner.id
    }

    /// The element's position in its owning vector, or `None` for a
    /// standalone parameter.
    pub fn index(&self) -> Option<usize> {
        self.inner.membership.as_ref().map(|m| m.index)
    }

    /// A handle to the owning vector.
    ///
    /// Returns `None` for standalone parameters, and also when the vector
    /// has been dropped: the back-reference never extends the vector's
    /// lifetime, and an orphaned element remains a fully valid symbol.
    pub fn vector(&self) -> Option<ParameterVector> {
        self.inner
            .membership
            .as_ref()
            .and_then(|m| m.vector.upgrade())
            .map(ParameterVector::from_inner)
    }

    /// Whether this parameter was created as part of a vector.
    pub fn is_vector_element(&self) -> bool {
        self.inner.membership.is_some()
    }

    /// Canonical ordering: vector name, then numeric index.
    ///
    /// Names of the form `stem[i]` compare by `(stem, i)`, so `theta[10]`
    /// sorts after `theta[9]` rather than between `theta[1]` and `theta[2]`.
    /// Standalone parameters compare by full name and sort before any
    /// element sharing that name as a stem. Identity breaks the remaining
    /// ties, keeping the order total.
    ///
    /// Equality is keyed by identity while this order is keyed by name, so
    /// it is a method rather than an `Ord` impl; use it with `sort_by`.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        let (stem_a, index_a) = self.sort_key();
        let (stem_b, index_b) = other.sort_key();
        stem_a
            .cmp(stem_b)
            .then(index_a.cmp(&index_b))
            .then(self.inner.id.cmp(&other.inner.id))
    }

    /// Split `stem[i]` display names into `(stem, Some(i))`; everything else
    /// keys as `(name, None)`. Only the name is consulted, so reconstructed
    /// elements that lost their membership record sort identically.
    fn sort_key(&self) -> (&str, Option<usize>) {
        let name = self.inner.name.as_str();
        if let Some(pos) = name.rfind('[') {
            if let Some(digits) = name[pos + 1..].strip_suffix(']') {
                if let Ok(index) = digits.parse::<usize>() {
                    return (&name[..pos], Some(index));
                }
            }
        }
        (name, None)
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Parameter");
        debug
            .field("name", &self.inner.name)
            .field("id", &self.inner.id);
        if let Some(index) = self.index() {
            debug.field("index", &index);
        }
        debug.finish()
    }
}

/// Wire form of a parameter: the vector back-reference is dropped and must
/// be reattached separately (see [`Parameter::vector_element`]).
#[derive(Deserialize)]
#[serde(rename = "Parameter")]
struct ParameterWire {
    name: String,
    id: u128,
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Parameter", 2)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("id", &self.id().as_u128())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Parameter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = ParameterWire::deserialize(deserializer)?;
        Ok(Parameter::with_id(&wire.name, ParameterId::from_u128(wire.id)))
    }
}
