//! Error handling for the navigation engine.
//!
//! Only a handful of conditions are surfaced to callers:
//!
//! - a path whose percent-encoding cannot be decoded
//!   ([`NavigationError::MalformedPath`]); the action is not applied,
//! - a route table that cannot be compiled ([`NavigationError::InvalidRoute`]),
//! - a restored snapshot that breaks a tree invariant
//!   ([`NavigationError::InvalidState`]).
//!
//! An unmatched path is **not** an error: it resolves to the not-found route.
//! Reducer anomalies are never returned either; they degrade to no-ops.
//!
//! # Examples
//!
//! ```
//! use navstate::{resolve, NavigationError};
//!
//! let err = resolve("/users/%zz").unwrap_err();
//! assert!(err.is_malformed_path());
//! assert!(err.to_string().starts_with("Malformed path '/users/%zz'"));
//! ```

use std::fmt;

/// Errors surfaced by the path resolver, the route table compiler, and
/// snapshot restoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The input path contains percent-encoding that cannot be decoded.
    MalformedPath {
        /// The path as given by the caller.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A route in the table could not be compiled.
    InvalidRoute {
        /// Route name as registered.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A navigation state tree violates an invariant.
    InvalidState {
        /// Which invariant was violated.
        reason: String,
    },
}

impl NavigationError {
    pub(crate) fn malformed_path(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_route(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRoute {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Check if this is a path decoding failure
    pub fn is_malformed_path(&self) -> bool {
        matches!(self, Self::MalformedPath { .. })
    }

    /// Check if this is a route table configuration error
    pub fn is_invalid_route(&self) -> bool {
        matches!(self, Self::InvalidRoute { .. })
    }

    /// Check if this is a state invariant violation
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::MalformedPath { path, reason } => {
                write!(f, "Malformed path '{}': {}", path, reason)
            }
            NavigationError::InvalidRoute { name, reason } => {
                write!(f, "Invalid route '{}': {}", name, reason)
            }
            NavigationError::InvalidState { reason } => {
                write!(f, "Invalid navigation state: {}", reason)
            }
        }
    }
}

impl std::error::Error for NavigationError {}

// ============================================================================
// Tests
// ============================================================================
