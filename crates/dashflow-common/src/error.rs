//! Error taxonomy for the reactive engine.
//!
//! - **`InvalidValue`**      : a write outside the parameter's domain; the
//!   prior value stays in place
//! - **`Unknown*`**          : lookups of names that were never registered
//! - **`CyclicDependency`**  : a computation re-entered while evaluating
//! - **`ComputationFailure`**: the computation's own function failed; nothing
//!   is cached and the next evaluation retries

use thiserror::Error;

pub type DashResult<T> = Result<T, DashError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashError {
    #[error("invalid value for parameter '{parameter}': {reason}")]
    InvalidValue { parameter: String, reason: String },

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("unknown computation '{0}'")]
    UnknownComputation(String),

    #[error("name '{0}' is already registered")]
    DuplicateName(String),

    #[error("'{name}' does not hold a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("computation '{computation}' failed: {message}")]
    ComputationFailure { computation: String, message: String },

    #[error("session is full ({limit} nodes)")]
    CapacityExceeded { limit: usize },
}

impl DashError {
    pub fn invalid_value<P: Into<String>, R: Into<String>>(parameter: P, reason: R) -> Self {
        Self::InvalidValue {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn failure<C: Into<String>, M: Into<String>>(computation: C, message: M) -> Self {
        Self::ComputationFailure {
            computation: computation.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch<N: Into<String>>(name: N, expected: &'static str) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
        }
    }

    /// Configuration errors cannot be fixed by retrying with other inputs.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownParameter(_)
                | Self::UnknownComputation(_)
                | Self::DuplicateName(_)
                | Self::TypeMismatch { .. }
                | Self::CyclicDependency { .. }
                | Self::CapacityExceeded { .. }
        )
    }
}
