//! Building and caching mixin composition definitions.
//!
//! [`DefinitionBuilder`] turns a [`ClassContext`] into a
//! [`CompositionGraph`](mixdef_core::CompositionGraph) over a type universe.
//! [`DefinitionCache`] wraps a builder and a validator and hands out one
//! shared, validated graph per context.

pub mod builder;
pub mod cache;
pub mod context;
pub mod document;
pub mod error;

pub use builder::DefinitionBuilder;
pub use cache::{CacheOptions, CacheStats, DefinitionCache};
pub use context::{ClassContext, MixinContext};
pub use document::Document;
pub use error::{BuildError, CacheError};
