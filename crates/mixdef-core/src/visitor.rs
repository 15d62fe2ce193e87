//! Double-dispatch traversal over a [`CompositionGraph`].
//!
//! [`CompositionGraph::accept`] walks the ownership tree in a fixed order and
//! calls the visitor method matching each node's kind:
//!
//! - composition unit: members (methods, properties, events), attributes,
//!   mixins, face requirements, base-call requirements, mixin requirements
//! - mixin: members, attributes, interface introductions (each followed by
//!   its method, property and event introductions), suppressed interfaces,
//!   attribute introductions, this/base/mixin dependencies
//! - member: the member, its accessors, attributes, attribute introductions
//! - requirement: the requirement, then its required methods
//! - dependency: the dependency, then its nested dependencies
//!
//! Non-owning collections (`received_interfaces`, `received_attributes`) are
//! not traversed, so each node is visited exactly once.

use crate::collection::KeyedCollection;
use crate::graph::CompositionGraph;
use crate::id::NodeId;
use crate::node::{
    AttributeIntroductionNode, AttributeNode, CompositionUnit, DefinitionNode, DependencyKind,
    DependencyNode, InterfaceIntroductionNode, MemberIntroductionNode, MemberNode, MixinUnit,
    RequiredMethodNode, RequirementKind, RequirementNode, SuppressedInterfaceNode,
};
use crate::signature::MemberKind;

/// One operation per node kind. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait DefinitionVisitor {
    fn visit_target(&mut self, graph: &CompositionGraph, id: NodeId, node: &CompositionUnit) {}
    fn visit_mixin(&mut self, graph: &CompositionGraph, id: NodeId, node: &MixinUnit) {}
    fn visit_interface_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &InterfaceIntroductionNode,
    ) {
    }
    fn visit_suppressed_interface_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &SuppressedInterfaceNode,
    ) {
    }
    fn visit_method_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &MemberIntroductionNode,
    ) {
    }
    fn visit_property_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &MemberIntroductionNode,
    ) {
    }
    fn visit_event_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &MemberIntroductionNode,
    ) {
    }
    fn visit_method(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberNode) {}
    fn visit_property(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberNode) {}
    fn visit_event(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberNode) {}
    fn visit_face_requirement(&mut self, graph: &CompositionGraph, id: NodeId, node: &RequirementNode) {}
    fn visit_base_call_requirement(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &RequirementNode,
    ) {
    }
    fn visit_mixin_requirement(&mut self, graph: &CompositionGraph, id: NodeId, node: &RequirementNode) {}
    fn visit_required_method(&mut self, graph: &CompositionGraph, id: NodeId, node: &RequiredMethodNode) {}
    fn visit_this_dependency(&mut self, graph: &CompositionGraph, id: NodeId, node: &DependencyNode) {}
    fn visit_base_dependency(&mut self, graph: &CompositionGraph, id: NodeId, node: &DependencyNode) {}
    fn visit_mixin_dependency(&mut self, graph: &CompositionGraph, id: NodeId, node: &DependencyNode) {}
    fn visit_attribute(&mut self, graph: &CompositionGraph, id: NodeId, node: &AttributeNode) {}
    fn visit_attribute_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &AttributeIntroductionNode,
    ) {
    }
}

impl CompositionGraph {
    /// Visits every node of the graph, starting at the composition unit.
    pub fn accept<V: DefinitionVisitor + ?Sized>(&self, visitor: &mut V) {
        self.accept_from(NodeId::ROOT, visitor);
    }

    /// Visits `start` and everything it owns. Foreign ids visit nothing.
    pub fn accept_from<V: DefinitionVisitor + ?Sized>(&self, start: NodeId, visitor: &mut V) {
        let Some(node) = self.node(start) else {
            return;
        };
        self.dispatch(start, node, visitor);

        match node {
            DefinitionNode::Target(unit) => {
                for member in unit.members.all() {
                    self.accept_from(member, visitor);
                }
                self.accept_all(unit.attributes.iter().map(|c| c.node), visitor);
                self.accept_all(unit.mixins.iter().map(|c| c.node), visitor);
                self.accept_all(unit.face_requirements.iter().map(|c| c.node), visitor);
                self.accept_all(unit.base_call_requirements.iter().map(|c| c.node), visitor);
                self.accept_all(unit.mixin_requirements.iter().map(|c| c.node), visitor);
            }
            DefinitionNode::Mixin(mixin) => {
                for member in mixin.members.all() {
                    self.accept_from(member, visitor);
                }
                self.accept_all(mixin.attributes.iter().map(|c| c.node), visitor);
                self.accept_all(mixin.interface_introductions.iter().map(|c| c.node), visitor);
                self.accept_all(mixin.suppressed_interfaces.iter().map(|c| c.node), visitor);
                self.accept_all(mixin.attribute_introductions.iter().map(|c| c.node), visitor);
                self.accept_all(mixin.this_dependencies.iter().map(|c| c.node), visitor);
                self.accept_all(mixin.base_dependencies.iter().map(|c| c.node), visitor);
                self.accept_all(mixin.mixin_dependencies.iter().map(|c| c.node), visitor);
            }
            DefinitionNode::Member(member) => {
                self.accept_all(member.accessors.into_iter().flatten(), visitor);
                self.accept_all(member.attributes.iter().map(|c| c.node), visitor);
                self.accept_all(member.attribute_introductions.iter().map(|c| c.node), visitor);
            }
            DefinitionNode::InterfaceIntroduction(intro) => {
                self.accept_all(intro.methods.iter().map(|c| c.node), visitor);
                self.accept_all(intro.properties.iter().map(|c| c.node), visitor);
                self.accept_all(intro.events.iter().map(|c| c.node), visitor);
            }
            DefinitionNode::Requirement(requirement) => {
                self.accept_all(requirement.methods.iter().map(|c| c.node), visitor);
            }
            DefinitionNode::Dependency(dependency) => {
                self.accept_all(dependency.aggregated.iter().map(|c| c.node), visitor);
            }
            DefinitionNode::RequiredMethod(_)
            | DefinitionNode::MemberIntroduction(_)
            | DefinitionNode::SuppressedInterface(_)
            | DefinitionNode::Attribute(_)
            | DefinitionNode::AttributeIntroduction(_) => {}
        }
    }

    fn accept_all<V, I>(&self, ids: I, visitor: &mut V)
    where
        V: DefinitionVisitor + ?Sized,
        I: IntoIterator<Item = NodeId>,
    {
        for id in ids {
            self.accept_from(id, visitor);
        }
    }

    fn dispatch<V: DefinitionVisitor + ?Sized>(&self, id: NodeId, node: &DefinitionNode, visitor: &mut V) {
        match node {
            DefinitionNode::Target(n) => visitor.visit_target(self, id, n),
            DefinitionNode::Mixin(n) => visitor.visit_mixin(self, id, n),
            DefinitionNode::Member(n) => match n.kind() {
                MemberKind::Method => visitor.visit_method(self, id, n),
                MemberKind::Property => visitor.visit_property(self, id, n),
                MemberKind::Event => visitor.visit_event(self, id, n),
            },
            DefinitionNode::Requirement(n) => match n.kind {
                RequirementKind::Face => visitor.visit_face_requirement(self, id, n),
                RequirementKind::BaseCall => visitor.visit_base_call_requirement(self, id, n),
                RequirementKind::Mixin => visitor.visit_mixin_requirement(self, id, n),
            },
            DefinitionNode::RequiredMethod(n) => visitor.visit_required_method(self, id, n),
            DefinitionNode::Dependency(n) => match n.kind {
                DependencyKind::This => visitor.visit_this_dependency(self, id, n),
                DependencyKind::Base => visitor.visit_base_dependency(self, id, n),
                DependencyKind::Mixin => visitor.visit_mixin_dependency(self, id, n),
            },
            DefinitionNode::InterfaceIntroduction(n) => {
                visitor.visit_interface_introduction(self, id, n)
            }
            DefinitionNode::MemberIntroduction(n) => match n.kind() {
                MemberKind::Method => visitor.visit_method_introduction(self, id, n),
                MemberKind::Property => visitor.visit_property_introduction(self, id, n),
                MemberKind::Event => visitor.visit_event_introduction(self, id, n),
            },
            DefinitionNode::SuppressedInterface(n) => {
                visitor.visit_suppressed_interface_introduction(self, id, n)
            }
            DefinitionNode::Attribute(n) => visitor.visit_attribute(self, id, n),
            DefinitionNode::AttributeIntroduction(n) => {
                visitor.visit_attribute_introduction(self, id, n)
            }
        }
    }
}
