//! CompositionGraph: the arena holding every definition node of one
//! composition.
//!
//! [`CompositionGraph`] is the single entry point for constructing and
//! querying a composition. Nodes are stored in slots addressed by
//! [`NodeId`]; the composition unit always occupies slot 0. Each slot records
//! its parent and full name, so the ownership tree and error locations can be
//! recovered without walking owning references in both directions.
//!
//! All mutations go through `CompositionGraph` methods, which check the
//! construction-time invariants (unique keys, aggregator/depender agreement,
//! node kinds) and fail with [`CoreError`] instead of producing a partial
//! graph. Once the builder hands the graph out behind an `Arc`, it is
//! read-only.

use std::sync::Arc;

use serde::Serialize;

use crate::collection::KeyedCollection;
use crate::error::CoreError;
use crate::id::{NodeId, TypeId};
use crate::node::{
    AttributeIntroductionNode, AttributeNode, ChildRef, CompositionUnit, DefinitionNode,
    DependencyKind, DependencyNode, InterfaceIntroductionNode, MemberIntroductionNode,
    MemberNode, MemberSet, MixinUnit, MultiChildren, NodeKind, RequiredMethodNode,
    RequirementKind, RequirementNode, SuppressedInterfaceNode, SuppressionReason,
};
use crate::signature::{MemberSignature, MethodSignature, SignatureChecker};
use crate::types::{OverrideDirective, TypeUniverse};

/// One arena slot: the node, its parent edge and its full name.
#[derive(Debug, Serialize)]
pub struct Slot {
    pub parent: Option<NodeId>,
    pub full_name: String,
    #[serde(flatten)]
    pub node: DefinitionNode,
}

/// Arena of all nodes describing how a set of mixins composes onto one
/// target class.
#[derive(Debug, Serialize)]
pub struct CompositionGraph {
    #[serde(skip)]
    universe: Arc<TypeUniverse>,
    nodes: Vec<Slot>,
}

fn unexpected(id: NodeId, expected: &'static str, actual: NodeKind) -> CoreError {
    CoreError::UnexpectedNodeKind {
        id,
        expected,
        actual,
    }
}

/// Generates a shared and a mutable typed accessor for one node variant.
macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty, $expected:literal) => {
        pub fn $get(&self, id: NodeId) -> Result<&$ty, CoreError> {
            match &self.slot(id)?.node {
                DefinitionNode::$variant(node) => Ok(node),
                other => Err(unexpected(id, $expected, other.kind())),
            }
        }

        #[allow(dead_code)]
        pub(crate) fn $get_mut(&mut self, id: NodeId) -> Result<&mut $ty, CoreError> {
            let slot = self
                .nodes
                .get_mut(id.index())
                .ok_or(CoreError::NodeNotFound { id })?;
            match &mut slot.node {
                DefinitionNode::$variant(node) => Ok(node),
                other => Err(unexpected(id, $expected, other.kind())),
            }
        }
    };
}

impl CompositionGraph {
    /// Creates a graph whose root composition unit represents `target`.
    ///
    /// Returns [`CoreError::WrongTypeKind`] if `target` is an interface.
    pub fn new(universe: Arc<TypeUniverse>, target: TypeId) -> Result<Self, CoreError> {
        let info = universe.info(target)?;
        if !info.is_class() {
            return Err(CoreError::WrongTypeKind {
                name: info.name.clone(),
                expected: "a class",
            });
        }
        let name = info.name.clone();
        let root = Slot {
            parent: None,
            full_name: name.clone(),
            node: DefinitionNode::Target(CompositionUnit::new(target, name)),
        };
        Ok(CompositionGraph {
            universe,
            nodes: vec![root],
        })
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// The type universe this graph was built against.
    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The root composition unit.
    pub fn target(&self) -> &CompositionUnit {
        match &self.nodes[0].node {
            DefinitionNode::Target(unit) => unit,
            _ => unreachable!("slot 0 always holds the composition unit"),
        }
    }

    fn target_mut(&mut self) -> &mut CompositionUnit {
        match &mut self.nodes[0].node {
            DefinitionNode::Target(unit) => unit,
            _ => unreachable!("slot 0 always holds the composition unit"),
        }
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, CoreError> {
        self.nodes
            .get(id.index())
            .ok_or(CoreError::NodeNotFound { id })
    }

    pub fn node(&self, id: NodeId) -> Option<&DefinitionNode> {
        self.nodes.get(id.index()).map(|s| &s.node)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(DefinitionNode::kind)
    }

    /// Parent edge of a node; `None` for the root and for foreign ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|s| s.parent)
    }

    pub fn full_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.index()).map(|s| s.full_name.as_str())
    }

    /// Full names from the root down to `id`.
    ///
    /// Returns an empty vec if the node does not exist.
    pub fn path(&self, id: NodeId) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            match self.nodes.get(node.index()) {
                Some(slot) => {
                    parts.push(slot.full_name.clone());
                    current = slot.parent;
                }
                None => return Vec::new(),
            }
        }
        parts.reverse();
        parts
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DefinitionNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, slot)| (NodeId(i as u32), &slot.node))
    }

    typed_access!(mixin, mixin_mut, Mixin, MixinUnit, "mixin");
    typed_access!(member, member_mut, Member, MemberNode, "member");
    typed_access!(requirement, requirement_mut, Requirement, RequirementNode, "requirement");
    typed_access!(required_method, required_method_mut, RequiredMethod, RequiredMethodNode, "required method");
    typed_access!(dependency, dependency_mut, Dependency, DependencyNode, "dependency");
    typed_access!(
        interface_introduction,
        interface_introduction_mut,
        InterfaceIntroduction,
        InterfaceIntroductionNode,
        "interface introduction"
    );
    typed_access!(
        member_introduction,
        member_introduction_mut,
        MemberIntroduction,
        MemberIntroductionNode,
        "member introduction"
    );
    typed_access!(
        suppressed_interface,
        suppressed_interface_mut,
        SuppressedInterface,
        SuppressedInterfaceNode,
        "suppressed interface introduction"
    );
    typed_access!(attribute, attribute_mut, Attribute, AttributeNode, "attribute");
    typed_access!(
        attribute_introduction,
        attribute_introduction_mut,
        AttributeIntroduction,
        AttributeIntroductionNode,
        "attribute introduction"
    );

    /// Members declared by a unit (the composition unit or a mixin).
    pub fn unit_members(&self, unit: NodeId) -> Result<&MemberSet, CoreError> {
        match &self.slot(unit)?.node {
            DefinitionNode::Target(t) => Ok(&t.members),
            DefinitionNode::Mixin(m) => Ok(&m.members),
            other => Err(unexpected(unit, "unit", other.kind())),
        }
    }

    fn unit_members_mut(&mut self, unit: NodeId) -> Result<&mut MemberSet, CoreError> {
        let slot = self
            .nodes
            .get_mut(unit.index())
            .ok_or(CoreError::NodeNotFound { id: unit })?;
        match &mut slot.node {
            DefinitionNode::Target(t) => Ok(&mut t.members),
            DefinitionNode::Mixin(m) => Ok(&mut m.members),
            other => Err(unexpected(unit, "unit", other.kind())),
        }
    }

    /// Attribute collection of a unit or member, with the owning unit.
    fn attributes_mut(
        &mut self,
        id: NodeId,
    ) -> Result<(&mut MultiChildren<TypeId>, NodeId), CoreError> {
        let slot = self
            .nodes
            .get_mut(id.index())
            .ok_or(CoreError::NodeNotFound { id })?;
        match &mut slot.node {
            DefinitionNode::Target(t) => Ok((&mut t.attributes, id)),
            DefinitionNode::Mixin(m) => Ok((&mut m.attributes, id)),
            DefinitionNode::Member(m) => {
                let unit = m.declaring_unit;
                Ok((&mut m.attributes, unit))
            }
            other => Err(unexpected(id, "unit or member", other.kind())),
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    fn push(&mut self, parent: NodeId, full_name: String, node: DefinitionNode) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Slot {
            parent: Some(parent),
            full_name,
            node,
        });
        id
    }

    fn name_of(&self, id: NodeId) -> Result<String, CoreError> {
        Ok(self.slot(id)?.full_name.clone())
    }

    /// Adds a mixin unit for `mixin_type`, positioned after the mixins
    /// already present.
    ///
    /// Returns [`CoreError::Collection`] if the mixin type is already applied.
    pub fn add_mixin(&mut self, mixin_type: TypeId) -> Result<NodeId, CoreError> {
        let info = self.universe.info(mixin_type)?;
        if !info.is_class() {
            return Err(CoreError::WrongTypeKind {
                name: info.name.clone(),
                expected: "a class",
            });
        }
        let name = info.name.clone();

        let id = self.next_id();
        let target = self.target_mut();
        let index = target.mixins.len();
        target.mixins.add(ChildRef::new(mixin_type, id, id))?;

        let unit = MixinUnit::new(mixin_type, name.clone(), index);
        Ok(self.push(NodeId::ROOT, name, DefinitionNode::Mixin(unit)))
    }

    /// Adds a member to a unit. Properties and events get their accessor
    /// methods as children of the member node.
    pub fn add_member(
        &mut self,
        unit: NodeId,
        signature: MemberSignature,
        directive: Option<OverrideDirective>,
    ) -> Result<NodeId, CoreError> {
        let unit_name = self.name_of(unit)?;
        let id = self.next_id();
        {
            let members = self.unit_members_mut(unit)?;
            match &signature {
                MemberSignature::Method(m) => members.methods.add(ChildRef::new(m.clone(), id, unit))?,
                MemberSignature::Property(p) => {
                    members.properties.add(ChildRef::new(p.clone(), id, unit))?
                }
                MemberSignature::Event(e) => members.events.add(ChildRef::new(e.clone(), id, unit))?,
            }
        }

        let accessor_signatures = signature.accessors();
        let full_name = format!("{}.{}", unit_name, signature.name());
        self.push(
            unit,
            full_name,
            DefinitionNode::Member(MemberNode::new(unit, signature, directive)),
        );

        let mut accessors = [None, None];
        for (position, accessor) in accessor_signatures.into_iter().enumerate() {
            if let Some(accessor) = accessor {
                let name = format!("{}.{}", unit_name, accessor.name);
                let node = MemberNode::new(unit, MemberSignature::Method(accessor), None);
                accessors[position] = Some(self.push(id, name, DefinitionNode::Member(node)));
            }
        }
        self.member_mut(id)?.accessors = accessors;
        Ok(id)
    }

    /// Attaches a custom attribute to a unit or member.
    pub fn add_attribute(
        &mut self,
        declaring: NodeId,
        attribute_type: TypeId,
        arguments: Vec<String>,
        copy_template: bool,
    ) -> Result<NodeId, CoreError> {
        let name = self.universe.info(attribute_type)?.name.clone();
        let id = self.next_id();
        let (attributes, unit) = self.attributes_mut(declaring)?;
        attributes.add(ChildRef::new(attribute_type, id, unit))?;

        let node = AttributeNode {
            attribute_type,
            name: name.clone(),
            declaring,
            arguments,
            copy_template,
        };
        Ok(self.push(declaring, name, DefinitionNode::Attribute(node)))
    }

    /// The requirement of `kind` on `required_type`, if already created.
    pub fn requirement_for(&self, kind: RequirementKind, required_type: TypeId) -> Option<NodeId> {
        self.target()
            .requirements(kind)
            .get(&required_type)
            .map(|c| c.node)
    }

    /// Adds a requirement to the composition unit. Emptiness and aggregation
    /// flags are derived from the universe.
    pub fn add_requirement(
        &mut self,
        kind: RequirementKind,
        required_type: TypeId,
    ) -> Result<NodeId, CoreError> {
        let name = self.universe.info(required_type)?.name.clone();
        let is_empty = self.universe.is_empty_interface(required_type);
        let is_aggregator = self.universe.is_aggregator_interface(required_type);

        let id = self.next_id();
        self.target_mut()
            .requirements_mut(kind)
            .add(ChildRef::new(required_type, id, NodeId::ROOT))?;

        let node = RequirementNode::new(kind, required_type, name.clone(), is_empty, is_aggregator);
        Ok(self.push(NodeId::ROOT, name, DefinitionNode::Requirement(node)))
    }

    /// Records a method the implementer of `requirement` must provide.
    pub fn add_required_method(
        &mut self,
        requirement: NodeId,
        signature: MethodSignature,
        implementer: Option<NodeId>,
    ) -> Result<NodeId, CoreError> {
        if let Some(member) = implementer {
            self.member(member)?;
        }
        let full_name = format!("{}.{}", self.name_of(requirement)?, signature.name);
        let id = self.next_id();
        self.requirement_mut(requirement)?
            .methods
            .add(ChildRef::new(signature.clone(), id, NodeId::ROOT))?;

        let node = RequiredMethodNode {
            requirement,
            signature,
            implementer,
        };
        Ok(self.push(requirement, full_name, DefinitionNode::RequiredMethod(node)))
    }

    /// Adds a dependency of `depender` on `requirement`.
    ///
    /// Without an aggregator the dependency joins the depender's collection
    /// for `kind`; with one it is nested under the aggregator, which must be
    /// a dependency of the same kind and depender
    /// ([`CoreError::InvalidAggregator`] otherwise). Either way the
    /// requirement gains a back-reference.
    pub fn add_dependency(
        &mut self,
        kind: DependencyKind,
        depender: NodeId,
        requirement: NodeId,
        aggregator: Option<NodeId>,
    ) -> Result<NodeId, CoreError> {
        self.mixin(depender)?;
        let required = self.requirement(requirement)?;
        if required.kind != kind.requirement_kind() {
            return Err(CoreError::InvalidArgument {
                reason: format!(
                    "a {:?} dependency cannot target the {:?} requirement '{}'",
                    kind, required.kind, required.name
                ),
            });
        }
        let required_type = required.type_id;
        let name = required.name.clone();

        let id = self.next_id();
        let child = ChildRef::new(required_type, id, depender);
        let parent = match aggregator {
            Some(outer) => {
                let container = self.dependency(outer)?;
                if container.kind != kind {
                    return Err(CoreError::InvalidAggregator {
                        required: name,
                        reason: format!(
                            "aggregator is a {:?} dependency, nested dependency is {:?}",
                            container.kind, kind
                        ),
                    });
                }
                if container.depender != depender {
                    return Err(CoreError::InvalidAggregator {
                        required: name,
                        reason: "aggregator belongs to another mixin".to_string(),
                    });
                }
                self.dependency_mut(outer)?.aggregated.add(child)?;
                outer
            }
            None => {
                self.mixin_mut(depender)?.dependencies_mut(kind).add(child)?;
                depender
            }
        };

        self.requirement_mut(requirement)?
            .requiring_dependencies
            .add(ChildRef::new(id, id, depender))?;

        let node = DependencyNode::new(kind, required_type, requirement, depender, aggregator);
        Ok(self.push(parent, name, DefinitionNode::Dependency(node)))
    }

    /// Records that `implementer` introduces `interface` onto the
    /// composition unit.
    ///
    /// Fails with a duplicate-key error if any mixin already introduces it.
    pub fn add_interface_introduction(
        &mut self,
        implementer: NodeId,
        interface: TypeId,
    ) -> Result<NodeId, CoreError> {
        let name = self.interface_name(interface)?;
        if self.target().received_interfaces.contains_key(&interface) {
            return Err(crate::collection::CollectionError::DuplicateKey {
                key: format!("{interface:?}"),
            }
            .into());
        }

        let id = self.next_id();
        let child = ChildRef::new(interface, id, implementer);
        self.mixin_mut(implementer)?
            .interface_introductions
            .add(child.clone())?;
        self.target_mut().received_interfaces.add(child)?;

        let node = InterfaceIntroductionNode::new(interface, name.clone(), implementer);
        Ok(self.push(implementer, name, DefinitionNode::InterfaceIntroduction(node)))
    }

    /// Records an interface member introduced by `introduction`, implemented
    /// by `implementing_member` of the introducing mixin.
    pub fn add_member_introduction(
        &mut self,
        introduction: NodeId,
        interface_member: MemberSignature,
        implementing_member: NodeId,
    ) -> Result<NodeId, CoreError> {
        let implementing_kind = self.member(implementing_member)?.kind();
        if implementing_kind != interface_member.kind() {
            return Err(CoreError::InvalidArgument {
                reason: format!(
                    "{} '{}' cannot be implemented by a {}",
                    interface_member.kind(),
                    interface_member.name(),
                    implementing_kind
                ),
            });
        }
        let full_name = format!("{}.{}", self.name_of(introduction)?, interface_member.name());
        let id = self.next_id();
        {
            let intro = self.interface_introduction_mut(introduction)?;
            let unit = intro.implementer;
            match &interface_member {
                MemberSignature::Method(m) => intro.methods.add(ChildRef::new(m.clone(), id, unit))?,
                MemberSignature::Property(p) => {
                    intro.properties.add(ChildRef::new(p.clone(), id, unit))?
                }
                MemberSignature::Event(e) => intro.events.add(ChildRef::new(e.clone(), id, unit))?,
            }
        }

        let node = MemberIntroductionNode {
            introduction,
            interface_member,
            implementing_member,
        };
        Ok(self.push(introduction, full_name, DefinitionNode::MemberIntroduction(node)))
    }

    /// Records an interface implemented by `implementer` that is not
    /// introduced onto the composition unit.
    pub fn add_suppressed_interface(
        &mut self,
        implementer: NodeId,
        interface: TypeId,
        reason: SuppressionReason,
    ) -> Result<NodeId, CoreError> {
        let name = self.interface_name(interface)?;
        let id = self.next_id();
        self.mixin_mut(implementer)?
            .suppressed_interfaces
            .add(ChildRef::new(interface, id, implementer))?;

        let node = SuppressedInterfaceNode {
            interface,
            name: name.clone(),
            implementer,
            reason,
        };
        Ok(self.push(implementer, name, DefinitionNode::SuppressedInterface(node)))
    }

    /// Carries `attribute` (declared on a mixin or a mixin member) onto
    /// `receiver` (the composition unit or a member).
    pub fn add_attribute_introduction(
        &mut self,
        attribute: NodeId,
        receiver: NodeId,
    ) -> Result<NodeId, CoreError> {
        let (attribute_type, declaring, name) = {
            let attr = self.attribute(attribute)?;
            (attr.attribute_type, attr.declaring, attr.name.clone())
        };
        match self.kind(receiver) {
            Some(NodeKind::Target | NodeKind::Method | NodeKind::Property | NodeKind::Event) => {}
            Some(other) => return Err(unexpected(receiver, "unit or member", other)),
            None => return Err(CoreError::NodeNotFound { id: receiver }),
        }

        let id = self.next_id();
        let slot = self
            .nodes
            .get_mut(declaring.index())
            .ok_or(CoreError::NodeNotFound { id: declaring })?;
        let unit = match &mut slot.node {
            DefinitionNode::Mixin(m) => {
                m.attribute_introductions
                    .add(ChildRef::new(attribute_type, id, declaring))?;
                declaring
            }
            DefinitionNode::Member(m) => {
                let unit = m.declaring_unit;
                m.attribute_introductions
                    .add(ChildRef::new(attribute_type, id, unit))?;
                unit
            }
            other => return Err(unexpected(declaring, "mixin or member", other.kind())),
        };

        let received = ChildRef::new(attribute_type, id, unit);
        match &mut self.nodes[receiver.index()].node {
            DefinitionNode::Target(t) => t.received_attributes.add(received)?,
            DefinitionNode::Member(m) => m.received_attributes.add(received)?,
            other => return Err(unexpected(receiver, "unit or member", other.kind())),
        }

        let node = AttributeIntroductionNode {
            attribute,
            attribute_type,
            receiver,
        };
        Ok(self.push(declaring, name, DefinitionNode::AttributeIntroduction(node)))
    }

    fn interface_name(&self, interface: TypeId) -> Result<String, CoreError> {
        let info = self.universe.info(interface)?;
        if !info.is_interface() {
            return Err(CoreError::WrongTypeKind {
                name: info.name.clone(),
                expected: "an interface",
            });
        }
        Ok(info.name.clone())
    }

    // -----------------------------------------------------------------------
    // Member queries
    // -----------------------------------------------------------------------

    /// Finds the top-level member of `unit` with the same kind and name as
    /// `signature` whose signature `checker` accepts.
    pub fn find_member(
        &self,
        unit: NodeId,
        signature: &MemberSignature,
        checker: &dyn SignatureChecker,
    ) -> Result<Option<NodeId>, CoreError> {
        for id in self.unit_members(unit)?.all() {
            let member = self.member(id)?;
            if member.name() == signature.name() && checker.compatible(signature, &member.signature) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Finds a method of `unit` matching `signature`, including property and
    /// event accessors.
    pub fn find_method(
        &self,
        unit: NodeId,
        signature: &MethodSignature,
        checker: &dyn SignatureChecker,
    ) -> Result<Option<NodeId>, CoreError> {
        let wanted = MemberSignature::Method(signature.clone());
        if let Some(found) = self.find_member(unit, &wanted, checker)? {
            return Ok(Some(found));
        }
        for id in self.unit_members(unit)?.all() {
            for accessor in self.member(id)?.accessors.into_iter().flatten() {
                let method = self.member(accessor)?;
                if method.name() == signature.name && checker.compatible(&wanted, &method.signature) {
                    return Ok(Some(accessor));
                }
            }
        }
        Ok(None)
    }
}
