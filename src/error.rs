//! Crate-level error types.

use std::fmt;

/// Errors produced while validating or decoding a scene record.
///
/// Every variant names the offending field by its dotted path from the scene
/// root (e.g. `camera.aspect`, `representations[1].options.radii`) so callers
/// can surface precise diagnostics. Normalization never recovers internally:
/// the first failing field aborts the whole call with one of these.
#[derive(Debug)]
pub enum SceneError {
    /// A required field with no usable default is absent.
    MissingField {
        /// Dotted path of the missing field.
        path: String,
    },
    /// A present value cannot be coerced to the field's declared type.
    Cast {
        /// Dotted path of the offending field.
        path: String,
        /// The raw value, rendered as JSON.
        value: String,
        /// Name of the type the cast targeted.
        expected: &'static str,
    },
    /// A successfully cast value fails its semantic constraint.
    Validation {
        /// Dotted path of the offending field.
        path: String,
        /// The cast value, rendered as JSON.
        value: String,
        /// Human-readable constraint that was violated.
        reason: String,
    },
    /// A representation record's `rep_type` matches no known kind.
    UnknownRepresentation {
        /// Dotted path of the representation record.
        path: String,
        /// The unrecognized keyword.
        found: String,
    },
    /// A normalized record failed to decode into the typed scene model.
    Decode(serde_json::Error),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { path } => {
                write!(f, "missing required field \"{path}\"")
            }
            Self::Cast {
                path,
                value,
                expected,
            } => {
                write!(f, "\"{path}\" is {value}, cannot cast to {expected}")
            }
            Self::Validation {
                path,
                value,
                reason,
            } => {
                write!(f, "\"{path}\" is {value} but {reason}")
            }
            Self::UnknownRepresentation { path, found } => {
                write!(f, "\"{path}\": unknown representation type \"{found}\"")
            }
            Self::Decode(e) => write!(f, "scene decode error: {e}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}
