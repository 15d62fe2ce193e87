//! Core error types for mixdef-core.
//!
//! Every variant is a construction-time error: it signals a malformed
//! configuration or a builder bug and aborts the build that raised it.

use thiserror::Error;

use crate::collection::CollectionError;
use crate::id::{NodeId, TypeId};
use crate::node::NodeKind;

/// Core errors produced by the type universe and the definition graph.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Attempting to register a type name that already exists in the universe.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },

    /// A type was referenced by name but never registered.
    #[error("unknown type: '{name}'")]
    UnknownType { name: String },

    /// A TypeId was not found in the universe.
    #[error("type not found: {id}")]
    TypeNotFound { id: TypeId },

    /// A type was used in a position that requires a different kind.
    #[error("type '{name}' is not {expected}")]
    WrongTypeKind { name: String, expected: &'static str },

    /// A node handle does not belong to the graph.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// A node handle refers to a node of another kind.
    #[error("node {id} is a {actual} node, expected {expected}")]
    UnexpectedNodeKind {
        id: NodeId,
        expected: &'static str,
        actual: NodeKind,
    },

    /// Insertion into a keyed collection failed.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// An override was registered between members of different kinds.
    #[error("member kind mismatch: '{base}' is a {base_kind}, '{candidate}' is a {candidate_kind}")]
    MemberKindMismatch {
        base: String,
        base_kind: NodeKind,
        candidate: String,
        candidate_kind: NodeKind,
    },

    /// A nested dependency does not match the dependency it is aggregated under.
    #[error("invalid aggregator for dependency on '{required}': {reason}")]
    InvalidAggregator { required: String, reason: String },

    /// A node constructor received an argument that violates its contract.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
}
