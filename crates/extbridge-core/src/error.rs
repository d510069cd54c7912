//! Unified error types for the extension bridge.
//!
//! Two layers exist:
//!
//! - [`BridgeError`] — failures raised by bridge operations themselves
//!   (classification, registration, dispatch).
//! - [`ForeignError`] — failures signalled on the native side of the
//!   foreign-call boundary. These cross back unmodified and are wrapped in
//!   [`BridgeError::Foreign`] at the host-facing surface.
//!
//! Every error surfaces synchronously at the call site that requested the
//! operation; there is no deferred error channel and no retry logic.
//! Registration failures are not rolled back: a class created before a later
//! method binding fails stays created.

use thiserror::Error;

use crate::tag::TypeTag;

/// Result alias used across the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised by bridge operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// A value's classified tag disagreed with the caller's expectation.
    #[error("type mismatch: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        /// The tag the caller required.
        expected: TypeTag,
        /// The tag the value actually classifies to.
        actual: TypeTag,
    },

    /// A membership test was requested for a tag outside the supported
    /// subset.
    #[error("membership test not supported for tag {0:?}")]
    UnsupportedTag(TypeTag),

    /// A raw tag byte decoded to an unassigned code. This is a programming
    /// defect on the native side, not a recoverable condition.
    #[error("unassigned type tag code 0x{0:02x}")]
    InternalClassification(u8),

    /// A constant already bound under the scope is not the requested kind
    /// of entity.
    #[error("{path} is not a {expected}")]
    RedefinitionKind {
        /// Qualified path of the existing binding.
        path: String,
        /// The kind that was requested ("class" or "module").
        expected: &'static str,
    },

    /// A class is being redefined with a different superclass.
    #[error("superclass mismatch for class {name}")]
    SuperclassMismatch {
        /// Simple name of the class.
        name: String,
    },

    /// A declared arity outside the ABI's domain (-1 or 0..=15).
    #[error("invalid declared arity {0}")]
    InvalidArity(i32),

    /// Dispatch found no method of this name anywhere on the receiver.
    #[error("undefined method '{name}' for {owner}")]
    MethodNotFound {
        /// The requested method name.
        name: String,
        /// Description of the receiver's type.
        owner: String,
    },

    /// Dispatch hit an explicit undef marker.
    #[error("method '{name}' has been undefined on {owner}")]
    MethodUndefined {
        /// The requested method name.
        name: String,
        /// Description of the receiver's type.
        owner: String,
    },

    /// A mutation was attempted on a frozen class or module.
    #[error("can't modify frozen {name}")]
    FrozenTarget {
        /// Name of the frozen target.
        name: String,
    },

    /// A singleton method was requested on a value that has no singleton.
    #[error("can't define singleton method on {0:?} value")]
    NoSingleton(TypeTag),

    /// A failure signalled across the foreign-call boundary.
    #[error("foreign call failed: {0}")]
    Foreign(#[from] ForeignError),
}

/// Failures signalled by the native side of a foreign call.
///
/// The bridge performs no interpretation: whatever the native entry point
/// raises crosses back as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForeignError {
    /// The native side raised; the message is opaque to the bridge.
    #[error("{0}")]
    Raised(String),

    /// Native code re-entered the bridge and the nested operation failed.
    #[error(transparent)]
    Bridge(Box<BridgeError>),
}

impl From<BridgeError> for ForeignError {
    fn from(err: BridgeError) -> Self {
        ForeignError::Bridge(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_display() {
        let err = BridgeError::TypeMismatch {
            expected: TypeTag::Array,
            actual: TypeTag::Fixnum,
        };
        assert_eq!(
            format!("{err}"),
            "type mismatch: expected Array, got Fixnum"
        );
    }

    #[test]
    fn redefinition_display() {
        let err = BridgeError::RedefinitionKind {
            path: "Geo::Point".to_string(),
            expected: "class",
        };
        assert_eq!(format!("{err}"), "Geo::Point is not a class");

        let err = BridgeError::SuperclassMismatch {
            name: "Point".to_string(),
        };
        assert_eq!(format!("{err}"), "superclass mismatch for class Point");
    }

    #[test]
    fn internal_classification_display() {
        let err = BridgeError::InternalClassification(0x17);
        assert_eq!(format!("{err}"), "unassigned type tag code 0x17");
    }

    #[test]
    fn foreign_error_crosses_back_unmodified() {
        let raised = ForeignError::Raised("wrong number of arguments".to_string());
        let err: BridgeError = raised.into();
        assert_eq!(
            format!("{err}"),
            "foreign call failed: wrong number of arguments"
        );
    }

    #[test]
    fn nested_bridge_error_is_transparent() {
        let inner = BridgeError::InvalidArity(-2);
        let foreign: ForeignError = inner.into();
        assert_eq!(format!("{foreign}"), "invalid declared arity -2");
    }
}
