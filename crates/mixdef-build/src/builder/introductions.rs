//! Phase 2 continued: interface and attribute introductions of a mixin.

use mixdef_core::collection::KeyedCollection;
use mixdef_core::id::{NodeId, TypeId};
use mixdef_core::node::SuppressionReason;

use super::BuildRun;
use crate::error::BuildError;

impl<'a> BuildRun<'a> {
    /// Introduces every interface the mixin implements onto the target,
    /// unless the mixin opts out, the target already implements it, or an
    /// earlier mixin introduces it. Suppressed interfaces are recorded with
    /// their reason.
    pub(super) fn introduce_interfaces(&mut self, unit: NodeId, mixin_type: TypeId) -> Result<(), BuildError> {
        let universe = self.universe;
        let info = universe.info(mixin_type)?;
        let non_introduced = info
            .mixin
            .as_ref()
            .map(|m| m.non_introduced.as_slice())
            .unwrap_or_default();
        let target_type = self.graph.target().type_id;

        for interface in universe.all_interfaces(mixin_type) {
            let suppression = if non_introduced.contains(&interface) {
                Some(SuppressionReason::Explicit)
            } else if universe.is_assignable_from(interface, target_type) {
                Some(SuppressionReason::ImplementedByTarget)
            } else {
                self.graph
                    .target()
                    .received_interfaces
                    .get(&interface)
                    .map(|earlier| SuppressionReason::IntroducedBy(earlier.unit))
            };

            match suppression {
                Some(reason) => {
                    self.graph.add_suppressed_interface(unit, interface, reason)?;
                }
                None => {
                    let introduction = self.graph.add_interface_introduction(unit, interface)?;
                    self.introduce_members(unit, introduction, interface)?;
                }
            }
        }
        Ok(())
    }

    /// Pairs each member the interface itself declares with the mixin member
    /// of the same name and a compatible signature.
    fn introduce_members(&mut self, unit: NodeId, introduction: NodeId, interface: TypeId) -> Result<(), BuildError> {
        let universe = self.universe;
        for member in &universe.info(interface)?.members {
            let implementing = self
                .graph
                .find_member(unit, &member.signature, self.checker)?
                .ok_or_else(|| BuildError::InterfaceMemberNotImplemented {
                    mixin: self.graph.mixin(unit).map(|m| m.name.clone()).unwrap_or_default(),
                    interface: universe.name_of(interface).to_string(),
                    member: member.signature.to_string(),
                })?;
            self.graph
                .add_member_introduction(introduction, member.signature.clone(), implementing)?;
        }
        Ok(())
    }

    /// Carries the mixin's inherited and copy-template attributes onto the
    /// composition unit.
    pub(super) fn introduce_unit_attributes(&mut self, unit: NodeId) -> Result<(), BuildError> {
        let attributes: Vec<_> = self
            .graph
            .mixin(unit)?
            .attributes
            .iter()
            .map(|c| (c.node, c.key))
            .collect();
        self.introduce_attributes(attributes, NodeId::ROOT)
    }

    /// Carries a mixin member's introducible attributes onto the target
    /// member it overrides.
    pub(super) fn introduce_member_attributes(&mut self, member: NodeId, receiver: NodeId) -> Result<(), BuildError> {
        let attributes: Vec<_> = self
            .graph
            .member(member)?
            .attributes
            .iter()
            .map(|c| (c.node, c.key))
            .collect();
        self.introduce_attributes(attributes, receiver)
    }

    /// An attribute is introduced when it is a copy template or its type is
    /// inherited. Single-use types the receiver already carries are skipped.
    fn introduce_attributes(&mut self, attributes: Vec<(NodeId, TypeId)>, receiver: NodeId) -> Result<(), BuildError> {
        for (attribute, attribute_type) in attributes {
            let usage = self.universe.attribute_usage(attribute_type);
            let copy_template = self.graph.attribute(attribute)?.copy_template;
            if !(copy_template || usage.inherited) {
                continue;
            }
            if !usage.allow_multiple && self.carries(receiver, attribute_type)? {
                tracing::debug!(
                    attribute = %self.universe.name_of(attribute_type),
                    receiver = self.graph.full_name(receiver).unwrap_or_default(),
                    "single-use attribute already present, not introduced"
                );
                continue;
            }
            self.graph.add_attribute_introduction(attribute, receiver)?;
        }
        Ok(())
    }
}
