//! Parameter identity values
//!
//! This module provides the ParameterId type, the 128-bit value that uniquely
//! names a symbolic parameter. Identities come from three places: fresh
//! randomness (standalone parameters), deterministic derivation from a
//! vector's root identity (vector elements), or an explicit raw value
//! (reconstructing a previously serialized parameter).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit identifier that uniquely names a symbolic parameter.
///
/// Two parameters are the same symbol if and only if their identities are
/// equal; display names are informative only and never participate in
/// equality or hashing. 128 bits of entropy makes an accidental collision
/// between independently created parameters negligible over any realistic
/// program lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterId(u128);

impl ParameterId {
    /// Generate a fresh random identity from the thread-local generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use symparam::parameters::identity::ParameterId;
    ///
    /// let a = ParameterId::fresh();
    /// let b = ParameterId::fresh();
    /// assert_ne!(a, b);
    /// ```
    pub fn fresh() -> Self {
        Self::fresh_with(&mut rand::thread_rng())
    }

    /// Generate a fresh identity from the supplied generator.
    ///
    /// Callers that need reproducible identity streams (tests, replay) can
    /// pass a seeded generator instead of relying on process-wide
    /// randomness.
    pub fn fresh_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen())
    }

    /// Derive the identity for position `offset` under a root identity.
    ///
    /// Derivation is plain unsigned addition on the raw 128-bit value, so
    /// for a fixed root the result at a given offset never changes. Overflow
    /// wraps silently; derivation stays total and replayable even for
    /// pathological offsets.
    pub const fn derive(root: Self, offset: usize) -> Self {
        Self(root.0.wrapping_add(offset as u128))
    }

    /// Reconstruct an identity from a previously observed raw value.
    ///
    /// Used when deserializing, so the in-memory parameter compares equal to
    /// the one that was written out.
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// The raw 128-bit value.
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl From<u128> for ParameterId {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterId({:032x})", self.0)
    }
}
