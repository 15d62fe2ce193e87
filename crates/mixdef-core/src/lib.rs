//! Definition model for mixin composition.
//!
//! A [`CompositionGraph`] describes how an ordered set of mixins composes
//! onto one target class: members, overrides, introduced and suppressed
//! interfaces, attributes, and the requirements mixins place on the
//! composition together with the dependencies that created them.

pub mod collection;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod overrides;
pub mod render;
pub mod resolve;
pub mod signature;
pub mod types;
pub mod visitor;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use collection::{CollectionError, KeyedCollection, MultiCollection, UniqueCollection};
pub use error::CoreError;
pub use graph::CompositionGraph;
pub use id::{NodeId, TypeId};
pub use node::{DefinitionNode, DependencyKind, NodeKind, RequirementKind, SuppressionReason};
pub use render::render_tree;
pub use signature::{MemberKind, MemberSignature, MethodSignature, SignatureChecker, StructuralSignatures};
pub use types::{OverrideDirective, TypeDecl, TypeUniverse};
pub use visitor::DefinitionVisitor;
