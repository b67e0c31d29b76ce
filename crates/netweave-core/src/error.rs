// ── Core error types ──
//
// Every rejection the consistency rules can produce. Nothing in this crate
// panics on bad input: validation and planning functions return one of
// these variants and leave translation into user-facing messages to the
// caller.

use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Structural validation ────────────────────────────────────────
    /// Self-loop, missing required field, unknown device reference, or a
    /// field whose value breaks an entity invariant.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Address allocation ───────────────────────────────────────────
    #[error("unknown subnet mask '{value}' (expected a prefix length 8-30 or its dotted form)")]
    UnknownMask { value: String },

    #[error("a router interface needs at least one IP address")]
    EmptyInterface,

    #[error("interface allocation failed: {reason}")]
    Allocation { reason: String },

    // ── Path resolution ──────────────────────────────────────────────
    #[error("path needs at least a source and a destination (got {len} node(s))")]
    EmptyChain { len: usize },

    #[error("node '{node}' appears more than once in the path")]
    DuplicateNode { node: String },

    #[error("no link from '{from}' to '{to}' in the current topology")]
    UnreachableHop { from: String, to: String },

    // ── Persistence collaborator ─────────────────────────────────────
    #[error("backend rejected the operation: {message}")]
    Backend { message: String },
}

/// Discriminant of a [`CoreError`], for callers that branch on the kind of
/// rejection without caring about its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    UnknownMask,
    EmptyInterface,
    Allocation,
    EmptyChain,
    DuplicateNode,
    UnreachableHop,
    Backend,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::UnknownMask { .. } => ErrorKind::UnknownMask,
            Self::EmptyInterface => ErrorKind::EmptyInterface,
            Self::Allocation { .. } => ErrorKind::Allocation,
            Self::EmptyChain { .. } => ErrorKind::EmptyChain,
            Self::DuplicateNode { .. } => ErrorKind::DuplicateNode,
            Self::UnreachableHop { .. } => ErrorKind::UnreachableHop,
            Self::Backend { .. } => ErrorKind::Backend,
        }
    }

    /// Shorthand for building a [`CoreError::Validation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_mask(value: impl Into<String>) -> Self {
        Self::UnknownMask {
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = CoreError::UnreachableHop {
            from: "R1".into(),
            to: "SW2".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UnreachableHop);
        assert_eq!(err.kind().to_string(), "unreachable_hop");
    }

    #[test]
    fn display_names_both_hop_endpoints() {
        let err = CoreError::UnreachableHop {
            from: "R1".into(),
            to: "SW2".into(),
        };
        assert_eq!(
            err.to_string(),
            "no link from 'R1' to 'SW2' in the current topology"
        );
    }

    #[test]
    fn validation_shorthand() {
        let err = CoreError::validation("switchid_dst", "self-loop");
        assert_eq!(err.to_string(), "invalid switchid_dst: self-loop");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
