//! Stable ID newtypes for the definition arena and the type universe.
//!
//! Both IDs are distinct newtype wrappers over `u32`, so that a `NodeId`
//! cannot be accidentally used where a `TypeId` is expected.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Stable handle of a node inside a [`CompositionGraph`](crate::graph::CompositionGraph).
///
/// Handles are only meaningful for the graph that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The composition unit always occupies the first arena slot.
    pub const ROOT: NodeId = NodeId(0);

    /// Returns the arena position of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a type registered in a [`TypeUniverse`](crate::types::TypeUniverse).
///
/// The inner value is the index of the type in the universe's inheritance graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

// Bridge between TypeId and petgraph's NodeIndex<u32>.

impl From<NodeIndex<u32>> for TypeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        TypeId(idx.index() as u32)
    }
}

impl From<TypeId> for NodeIndex<u32> {
    fn from(id: TypeId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}
