//! # symparam
//!
//! `symparam` provides symbolic parameters with stable, globally unique
//! identities for circuit-construction and operator-algebra libraries.
//!
//! The library provides:
//! - 128-bit parameter identities: random for standalone parameters,
//!   deterministically derived for vector elements, explicit for
//!   reconstruction from serialized state
//! - Parameter vectors whose elements survive shrink/regrow cycles with
//!   their identities intact
//! - An expression layer over parameter leaves, with operator overloading,
//!   parsing, substitution and binding
//!
//! ## Basic Usage
//!
//! ```
//! use symparam::ParameterVector;
//!
//! let theta = ParameterVector::new("theta", 20);
//! let elt_19 = theta.get(19).unwrap();
//!
//! theta.resize(10);
//! theta.resize(20);
//! assert_eq!(theta.get(19).unwrap(), elt_19);
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

// Re-exports for convenience
pub use error::{Result, SymParamError};
pub use parameters::{Expression, Parameter, ParameterId, ParameterVector};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
