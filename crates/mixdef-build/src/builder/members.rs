//! Phases 1 and 2: the target unit and the mixin units with their members
//! and attributes.

use mixdef_core::collection::KeyedCollection;
use mixdef_core::error::CoreError;
use mixdef_core::id::{NodeId, TypeId};
use mixdef_core::node::DefinitionNode;
use mixdef_core::types::{AttributeDecl, MemberDecl};

use super::{AppliedMixin, BuildRun};
use crate::error::BuildError;

impl<'a> BuildRun<'a> {
    pub(super) fn add_target(&mut self) -> Result<(), BuildError> {
        let target = self.graph.target().type_id;
        self.add_declared_and_inherited(NodeId::ROOT, target)?;
        tracing::debug!(
            target = %self.universe.name_of(target),
            nodes = self.graph.len(),
            "target unit added"
        );
        Ok(())
    }

    /// Declared members first, then members inherited from base classes
    /// unless a more-derived compatible member of the same name hides them.
    /// Attributes follow the same order; a base attribute is inherited only
    /// when its usage says so, and a single-use one only when the unit does
    /// not carry it yet.
    fn add_declared_and_inherited(&mut self, unit: NodeId, type_id: TypeId) -> Result<(), BuildError> {
        let universe = self.universe;
        let info = universe.info(type_id)?;
        self.add_members(unit, &info.members)?;

        let bases = universe.base_chain(type_id);
        for &base in &bases {
            for member in &universe.info(base)?.members {
                if self
                    .graph
                    .find_member(unit, &member.signature, self.checker)?
                    .is_some()
                {
                    continue;
                }
                self.add_member(unit, member)?;
            }
        }

        self.add_attributes(unit, &info.attributes)?;
        for &base in &bases {
            for attribute in &universe.info(base)?.attributes {
                let attribute_type = universe.resolve(&attribute.attribute_type)?;
                let usage = universe.attribute_usage(attribute_type);
                if usage.inherited && (usage.allow_multiple || !self.carries(unit, attribute_type)?) {
                    self.add_attribute(unit, attribute)?;
                }
            }
        }
        Ok(())
    }

    /// Creates a mixin unit per configured mixin, in configuration order.
    pub(super) fn add_mixins(&mut self) -> Result<(), BuildError> {
        let context = self.context;
        for mixin_context in &context.mixins {
            let type_id = self.resolve(&mixin_context.mixin_type)?;
            self.expect_class(type_id, "a mixin")?;

            let unit = self.graph.add_mixin(type_id)?;
            self.add_declared_and_inherited(unit, type_id)?;
            self.introduce_interfaces(unit, type_id)?;
            self.introduce_unit_attributes(unit)?;

            self.mixins.push(AppliedMixin {
                unit,
                type_id,
                context: mixin_context,
            });
        }
        tracing::debug!(target = %context.target, mixins = self.mixins.len(), "mixin units added");
        Ok(())
    }

    fn add_members(&mut self, unit: NodeId, members: &[MemberDecl]) -> Result<(), BuildError> {
        for member in members {
            self.add_member(unit, member)?;
        }
        Ok(())
    }

    fn add_member(&mut self, unit: NodeId, member: &MemberDecl) -> Result<NodeId, BuildError> {
        let id = self
            .graph
            .add_member(unit, member.signature.clone(), member.overrides)?;
        self.add_attributes(id, &member.attributes)?;
        Ok(id)
    }

    fn add_attributes(&mut self, declaring: NodeId, attributes: &[AttributeDecl]) -> Result<(), BuildError> {
        for attribute in attributes {
            self.add_attribute(declaring, attribute)?;
        }
        Ok(())
    }

    fn add_attribute(&mut self, declaring: NodeId, attribute: &AttributeDecl) -> Result<NodeId, BuildError> {
        let attribute_type = self.universe.resolve(&attribute.attribute_type)?;
        let id = self.graph.add_attribute(
            declaring,
            attribute_type,
            attribute.arguments.clone(),
            attribute.copy_template,
        )?;
        Ok(id)
    }

    /// Whether `receiver` (a unit or a member) already has an attribute of
    /// `attribute_type`, declared or introduced.
    pub(super) fn carries(&self, receiver: NodeId, attribute_type: TypeId) -> Result<bool, BuildError> {
        let carried = match self.graph.node(receiver) {
            Some(DefinitionNode::Target(unit)) => {
                unit.attributes.contains_key(&attribute_type)
                    || unit.received_attributes.contains_key(&attribute_type)
            }
            Some(DefinitionNode::Mixin(unit)) => unit.attributes.contains_key(&attribute_type),
            Some(DefinitionNode::Member(member)) => {
                member.attributes.contains_key(&attribute_type)
                    || member.received_attributes.contains_key(&attribute_type)
            }
            Some(other) => {
                return Err(CoreError::UnexpectedNodeKind {
                    id: receiver,
                    expected: "unit or member",
                    actual: other.kind(),
                }
                .into())
            }
            None => return Err(CoreError::NodeNotFound { id: receiver }.into()),
        };
        Ok(carried)
    }
}
