//! JSON input document: a type universe and the class contexts to compose.

use serde::{Deserialize, Serialize};

use mixdef_core::error::CoreError;
use mixdef_core::types::{TypeDecl, TypeUniverse};

use crate::context::ClassContext;

/// Types are registered in document order, so every type must follow the
/// types it references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub contexts: Vec<ClassContext>,
}

impl Document {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn universe(&self) -> Result<TypeUniverse, CoreError> {
        TypeUniverse::from_decls(self.types.iter().cloned())
    }

    /// The context for `target`, if the document configures one.
    pub fn context(&self, target: &str) -> Option<&ClassContext> {
        self.contexts.iter().find(|c| c.target == target)
    }
}
