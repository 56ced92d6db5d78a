//! Error types for `groupsearch`.
//!
//! A single error type covers request validation, candidate source failures
//! and configuration problems. Soft exclusions (points without a usable group
//! key) and source exhaustion are not errors and never surface here.

use thiserror::Error;

use crate::point::PointId;

/// Result type alias for `groupsearch` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while grouping search results.
///
/// Each variant renders a stable code (`GRP-XXX`) followed by a message.
/// [`Error::kind`] exposes a machine-readable kind for API clients.
#[derive(Error, Debug)]
pub enum Error {
    /// `group_by` uses array index / bracket notation (GRP-001).
    #[error("[GRP-001] Bad request: no_bracket_syntax: group_by path '{0}' must not use bracket notation")]
    NoBracketSyntax(String),

    /// `group_by` path is malformed (GRP-002).
    #[error("[GRP-002] Invalid group_by path '{path}': {reason}")]
    InvalidGroupBy {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Request parameters are out of range or inconsistent (GRP-003).
    #[error("[GRP-003] Invalid request: {0}")]
    InvalidRequest(String),

    /// An example point referenced by the request does not exist (GRP-004).
    #[error("[GRP-004] Point with ID '{0}' not found")]
    PointNotFound(PointId),

    /// Query vector dimension does not match the source (GRP-005).
    #[error("[GRP-005] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// The candidate source failed (GRP-006).
    ///
    /// Propagated as-is, the grouping engine never retries.
    #[error("[GRP-006] Candidate source error: {0}")]
    Source(String),

    /// Configuration error (GRP-007).
    #[error("[GRP-007] Configuration error: {0}")]
    Config(String),

    /// Internal invariant violation (GRP-008). Please report if encountered.
    #[error("[GRP-008] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "GRP-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoBracketSyntax(_) => "GRP-001",
            Self::InvalidGroupBy { .. } => "GRP-002",
            Self::InvalidRequest(_) => "GRP-003",
            Self::PointNotFound(_) => "GRP-004",
            Self::DimensionMismatch { .. } => "GRP-005",
            Self::Source(_) => "GRP-006",
            Self::Config(_) => "GRP-007",
            Self::Internal(_) => "GRP-008",
        }
    }

    /// Returns the machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoBracketSyntax(_) => "no_bracket_syntax",
            Self::InvalidGroupBy { .. } => "invalid_group_by",
            Self::InvalidRequest(_) => "invalid_request",
            Self::PointNotFound(_) => "point_not_found",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::Source(_) => "source_failure",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns true if the caller can fix the request and retry.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Source(_) | Self::Internal(_))
    }

    /// Returns true if the error was raised while validating the request,
    /// before any candidate was fetched.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoBracketSyntax(_) | Self::InvalidGroupBy { .. } | Self::InvalidRequest(_)
        )
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
