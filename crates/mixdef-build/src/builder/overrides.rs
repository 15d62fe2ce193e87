//! Phase 4: override wiring.
//!
//! A mixin member marked [`OverrideDirective::Target`] overrides the target
//! member of the same name with a compatible signature. A target member
//! marked [`OverrideDirective::Mixin`] overrides exactly one such member
//! across all applied mixins.

use mixdef_core::id::NodeId;
use mixdef_core::types::OverrideDirective;

use super::BuildRun;
use crate::error::BuildError;

impl<'a> BuildRun<'a> {
    pub(super) fn wire_overrides(&mut self) -> Result<(), BuildError> {
        for applied in self.mixins.clone() {
            for member in self.members_with(applied.unit, OverrideDirective::Target)? {
                self.override_target_member(member)?;
            }
        }
        for member in self.members_with(NodeId::ROOT, OverrideDirective::Mixin)? {
            self.override_mixin_member(member)?;
        }
        Ok(())
    }

    fn members_with(&self, unit: NodeId, directive: OverrideDirective) -> Result<Vec<NodeId>, BuildError> {
        let mut marked = Vec::new();
        for id in self.graph.unit_members(unit)?.all() {
            if self.graph.member(id)?.directive == Some(directive) {
                marked.push(id);
            }
        }
        Ok(marked)
    }

    /// Members of `unit` that `overrider` can override.
    fn overridable_in(&self, unit: NodeId, overrider: NodeId) -> Result<Vec<NodeId>, BuildError> {
        let name = self.graph.member(overrider)?.name().to_string();
        let mut found = Vec::new();
        for id in self.graph.unit_members(unit)?.all() {
            if self.graph.member(id)?.name() == name
                && self.graph.can_be_overridden_by(self.checker, id, overrider)?
            {
                found.push(id);
            }
        }
        Ok(found)
    }

    fn override_target_member(&mut self, overrider: NodeId) -> Result<(), BuildError> {
        let base = self
            .overridable_in(NodeId::ROOT, overrider)?
            .into_iter()
            .next()
            .ok_or_else(|| BuildError::OverriddenMemberNotFound {
                member: self.display_name(overrider),
                searched: format!("target class '{}'", self.target_name()),
            })?;

        self.graph.set_base(overrider, Some(base))?;
        self.graph.add_override(base, overrider)?;
        self.introduce_member_attributes(overrider, base)?;
        tracing::debug!(
            overrider = %self.display_name(overrider),
            base = %self.display_name(base),
            "mixin member overrides target member"
        );
        Ok(())
    }

    fn override_mixin_member(&mut self, overrider: NodeId) -> Result<(), BuildError> {
        let mut candidates = Vec::new();
        for applied in &self.mixins {
            candidates.extend(self.overridable_in(applied.unit, overrider)?);
        }

        let base = match candidates.as_slice() {
            [] => {
                return Err(BuildError::OverriddenMemberNotFound {
                    member: self.display_name(overrider),
                    searched: "the applied mixins".to_string(),
                })
            }
            [single] => *single,
            _ => {
                return Err(BuildError::AmbiguousOverride {
                    member: self.display_name(overrider),
                    candidates: candidates.iter().map(|&c| self.display_name(c)).collect(),
                })
            }
        };

        self.graph.set_base(overrider, Some(base))?;
        self.graph.add_override(base, overrider)?;
        tracing::debug!(
            overrider = %self.display_name(overrider),
            base = %self.display_name(base),
            "target member overrides mixin member"
        );
        Ok(())
    }

    fn display_name(&self, id: NodeId) -> String {
        self.graph.full_name(id).unwrap_or_default().to_string()
    }
}
