//! Builds a [`CompositionGraph`] from a [`ClassContext`].
//!
//! Building is pure: the same universe and context always produce the same
//! graph, and nothing is shared between builds. Phases run in a fixed order,
//! each in its own module:
//!
//! 1. target unit: members (declared, then inherited) and attributes
//! 2. mixin units in configuration order, with their members, attributes,
//!    interface introductions and attribute introductions
//! 3. this, base and mixin dependencies, creating requirements on demand
//! 4. override wiring between target and mixin members
//! 5. required methods of interface requirements
//!
//! Any error aborts the build; no partial graph is returned.

mod dependencies;
mod introductions;
mod members;
mod overrides;
mod requirements;

use std::sync::Arc;

use mixdef_core::graph::CompositionGraph;
use mixdef_core::id::{NodeId, TypeId};
use mixdef_core::signature::{SignatureChecker, StructuralSignatures};
use mixdef_core::types::TypeUniverse;

use crate::context::{ClassContext, MixinContext};
use crate::error::BuildError;

/// Turns class contexts into definition graphs over one type universe.
#[derive(Clone)]
pub struct DefinitionBuilder {
    universe: Arc<TypeUniverse>,
    signatures: Arc<dyn SignatureChecker>,
}

impl DefinitionBuilder {
    /// A builder comparing signatures structurally.
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self::with_signatures(universe, Arc::new(StructuralSignatures))
    }

    pub fn with_signatures(universe: Arc<TypeUniverse>, signatures: Arc<dyn SignatureChecker>) -> Self {
        DefinitionBuilder {
            universe,
            signatures,
        }
    }

    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    pub fn build(&self, context: &ClassContext) -> Result<CompositionGraph, BuildError> {
        let mut run = BuildRun::start(self, context)?;
        run.add_target()?;
        run.add_mixins()?;
        run.add_dependencies()?;
        run.wire_overrides()?;
        run.add_required_methods()?;

        tracing::debug!(
            target = %context.target,
            mixins = run.mixins.len(),
            nodes = run.graph.len(),
            "definition built"
        );
        Ok(run.graph)
    }
}

impl std::fmt::Debug for DefinitionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionBuilder")
            .field("types", &self.universe.len())
            .finish_non_exhaustive()
    }
}

/// A mixin unit created during this build.
#[derive(Debug, Clone, Copy)]
struct AppliedMixin<'a> {
    unit: NodeId,
    type_id: TypeId,
    context: &'a MixinContext,
}

/// State of one build.
struct BuildRun<'a> {
    universe: &'a TypeUniverse,
    checker: &'a dyn SignatureChecker,
    context: &'a ClassContext,
    graph: CompositionGraph,
    mixins: Vec<AppliedMixin<'a>>,
}

impl<'a> BuildRun<'a> {
    fn start(builder: &'a DefinitionBuilder, context: &'a ClassContext) -> Result<Self, BuildError> {
        let universe: &'a TypeUniverse = &builder.universe;
        let target = universe
            .lookup(&context.target)
            .ok_or_else(|| BuildError::UnknownType {
                target: context.target.clone(),
                name: context.target.clone(),
            })?;
        let info = universe.info(target)?;
        if !info.is_class() {
            return Err(BuildError::NotAClass {
                name: info.name.clone(),
                role: "a target class",
            });
        }
        Ok(BuildRun {
            universe,
            checker: builder.signatures.as_ref(),
            context,
            graph: CompositionGraph::new(Arc::clone(&builder.universe), target)?,
            mixins: Vec::new(),
        })
    }

    /// Resolves a configured type name.
    fn resolve(&self, name: &str) -> Result<TypeId, BuildError> {
        self.universe
            .lookup(name)
            .ok_or_else(|| BuildError::UnknownType {
                target: self.context.target.clone(),
                name: name.to_string(),
            })
    }

    fn expect_class(&self, type_id: TypeId, role: &'static str) -> Result<(), BuildError> {
        let info = self.universe.info(type_id)?;
        if info.is_class() {
            Ok(())
        } else {
            Err(BuildError::NotAClass {
                name: info.name.clone(),
                role,
            })
        }
    }

    fn target_name(&self) -> String {
        self.graph.target().name.clone()
    }
}
