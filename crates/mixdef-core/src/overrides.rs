//! Override wiring between members of different units.
//!
//! An override relation is stored on both sides: the overridden member keeps
//! its overriders keyed by declaring unit, the overrider points back through
//! `base`. Property and event overrides carry over to their accessors.

use crate::error::CoreError;
use crate::graph::CompositionGraph;
use crate::id::NodeId;
use crate::node::{ChildRef, DefinitionNode};
use crate::signature::SignatureChecker;

impl CompositionGraph {
    /// True when `candidate` is of the same member kind as `base` and its
    /// signature is compatible under `checker`.
    pub fn can_be_overridden_by(
        &self,
        checker: &dyn SignatureChecker,
        base: NodeId,
        candidate: NodeId,
    ) -> Result<bool, CoreError> {
        let base = self.member(base)?;
        let candidate = self.member(candidate)?;
        Ok(base.kind() == candidate.kind() && checker.compatible(&base.signature, &candidate.signature))
    }

    /// Registers `overrider` as overriding `base`, keyed by the overrider's
    /// declaring unit. Accessors present on both sides are paired up.
    ///
    /// Fails with [`CoreError::MemberKindMismatch`] across member kinds and
    /// with a duplicate-key error if the overrider's unit already overrides
    /// `base`.
    pub fn add_override(&mut self, base: NodeId, overrider: NodeId) -> Result<(), CoreError> {
        self.check_same_kind(base, overrider)?;
        let base_accessors = self.member(base)?.accessors;
        let (unit, overrider_accessors) = {
            let member = self.member(overrider)?;
            (member.declaring_unit, member.accessors)
        };

        self.member_mut(base)?
            .overrides
            .add(ChildRef::new(unit, overrider, unit))?;

        for (base_accessor, overriding_accessor) in base_accessors.into_iter().zip(overrider_accessors) {
            if let (Some(b), Some(o)) = (base_accessor, overriding_accessor) {
                self.add_override(b, o)?;
            }
        }
        Ok(())
    }

    /// Sets (or clears) the member `member` overrides. Accessors follow:
    /// each gets the matching accessor of the new base, or none.
    pub fn set_base(&mut self, member: NodeId, base: Option<NodeId>) -> Result<(), CoreError> {
        let base_accessors = match base {
            Some(b) => {
                self.check_same_kind(b, member)?;
                self.member(b)?.accessors
            }
            None => [None, None],
        };
        let accessors = self.member(member)?.accessors;
        self.member_mut(member)?.base = base;

        for (accessor, accessor_base) in accessors.into_iter().zip(base_accessors) {
            if let Some(accessor) = accessor {
                self.set_base(accessor, accessor_base)?;
            }
        }
        Ok(())
    }

    fn check_same_kind(&self, base: NodeId, candidate: NodeId) -> Result<(), CoreError> {
        let base_kind = self.member(base)?.kind();
        let candidate_kind = self.member(candidate)?.kind();
        if base_kind == candidate_kind {
            return Ok(());
        }
        let kind_of = |id| {
            self.node(id)
                .map(DefinitionNode::kind)
                .ok_or(CoreError::NodeNotFound { id })
        };
        Err(CoreError::MemberKindMismatch {
            base: self.full_name(base).unwrap_or_default().to_string(),
            base_kind: kind_of(base)?,
            candidate: self.full_name(candidate).unwrap_or_default().to_string(),
            candidate_kind: kind_of(candidate)?,
        })
    }
}
