//! Phase 3: dependencies of each mixin on the composition.

use mixdef_core::collection::KeyedCollection;
use mixdef_core::id::{NodeId, TypeId};
use mixdef_core::node::DependencyKind;

use super::BuildRun;
use crate::error::BuildError;

impl<'a> BuildRun<'a> {
    /// A mixin's face type becomes a this-dependency, its base-call type a
    /// base-dependency, and every explicitly configured dependency a
    /// mixin-dependency.
    pub(super) fn add_dependencies(&mut self) -> Result<(), BuildError> {
        let universe = self.universe;
        for applied in self.mixins.clone() {
            let info = universe.info(applied.type_id)?;
            if let Some(mixin) = &info.mixin {
                if let Some(face) = mixin.face {
                    self.add_dependency(DependencyKind::This, applied.unit, face, None)?;
                }
                if let Some(base_call) = mixin.base_call {
                    self.add_dependency(DependencyKind::Base, applied.unit, base_call, None)?;
                }
            }
            for name in &applied.context.explicit_dependencies {
                let required = self.resolve(name)?;
                self.add_dependency(DependencyKind::Mixin, applied.unit, required, None)?;
            }
        }
        tracing::debug!(
            target = %self.target_name(),
            face = self.graph.target().face_requirements.len(),
            base_call = self.graph.target().base_call_requirements.len(),
            mixin = self.graph.target().mixin_requirements.len(),
            "requirements collected"
        );
        Ok(())
    }

    /// Adds one dependency, creating its requirement on first use. An
    /// aggregator interface gets a nested dependency per interface it
    /// combines.
    fn add_dependency(
        &mut self,
        kind: DependencyKind,
        depender: NodeId,
        required: TypeId,
        aggregator: Option<NodeId>,
    ) -> Result<NodeId, BuildError> {
        let requirement_kind = kind.requirement_kind();
        let requirement = match self.graph.requirement_for(requirement_kind, required) {
            Some(existing) => existing,
            None => self.graph.add_requirement(requirement_kind, required)?,
        };
        let dependency = self
            .graph
            .add_dependency(kind, depender, requirement, aggregator)?;

        if self.universe.is_aggregator_interface(required) {
            let universe = self.universe;
            for &nested in &universe.info(required)?.interfaces {
                self.add_dependency(kind, depender, nested, Some(dependency))?;
            }
        }
        Ok(dependency)
    }
}
