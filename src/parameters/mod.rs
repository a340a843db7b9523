//! # Parameter System
//!
//! This module provides symbolic parameters with stable identities, for use
//! as placeholders inside circuit-construction and operator-algebra code.
//! A parameter is a named leaf that can be combined into arithmetic
//! expressions, substituted, and later bound to a concrete number; its
//! identity, not its name, decides equality and hashing, so two
//! independently reconstructed copies of the same parameter are
//! interchangeable.
//!
//! ## Key Features
//!
//! - **Stable Identities**: Every parameter carries a 128-bit identity;
//!   equality and hashing go through it alone
//! - **Parameter Vectors**: Bulk-construct families of related parameters
//!   whose identities are derived deterministically from one root, so
//!   shrinking and regrowing a vector reproduces the same elements
//! - **Expressions**: Combine parameters with `+ - * / ^` and elementary
//!   functions, then bind or substitute to evaluate
//! - **Serialization Support**: Identity-preserving round-trips with serde
//!
//! ## Core Components
//!
//! - [`ParameterId`]: The 128-bit identity value and its construction modes
//! - [`Parameter`]: An individual symbolic leaf, standalone or owned by a
//!   vector
//! - [`ParameterVector`]: An ordered, named, resizable collection of
//!   related parameters
//! - [`Expression`]: Arithmetic over parameter leaves, with parsing and
//!   binding
//!
//! ## Example Usage
//!
//! ```rust
//! use std::collections::HashMap;
//! use symparam::parameters::{Expression, ParameterVector};
//!
//! // A vector of three related parameters: theta[0], theta[1], theta[2].
//! let theta = ParameterVector::new("theta", 3);
//!
//! // Combine elements into an expression.
//! let expr = theta.get(0).unwrap() * 2.0 + theta.get(1).unwrap();
//!
//! // Resizing down and back up reproduces identical elements.
//! let last = theta.get(2).unwrap();
//! theta.resize(1);
//! theta.resize(3);
//! assert_eq!(theta.get(2).unwrap(), last);
//!
//! // Bind the parameters to numbers and evaluate.
//! let values = HashMap::from([
//!     (theta.get(0).unwrap().id(), 0.5),
//!     (theta.get(1).unwrap().id(), 1.0),
//! ]);
//! assert_eq!(expr.evaluate(&values).unwrap(), 2.0);
//! ```

pub mod expression;
pub mod identity;
pub mod parameter;
pub mod vector;


// Re-export key types
pub use expression::{BinaryOp, Expression, ExpressionError, SymbolResolver, UnaryOp};
pub use identity::ParameterId;
pub use parameter::{Parameter, ParameterError};
pub use vector::{ParameterVector, VectorError};
