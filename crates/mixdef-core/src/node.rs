//! Node payloads of the definition arena.
//!
//! Every node lives in one [`CompositionGraph`](crate::graph::CompositionGraph)
//! slot. Ownership is expressed through keyed collections of [`ChildRef`]
//! handles; references back up the tree (parent, depender, aggregator,
//! overridden member, requirement) are plain [`NodeId`]s.

use std::fmt;

use serde::Serialize;

use crate::collection::{KeyedCollection, MultiCollection, UniqueCollection};
use crate::id::{NodeId, TypeId};
use crate::signature::{EventSignature, MemberKind, MemberSignature, MethodSignature, PropertySignature};
use crate::types::OverrideDirective;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The closed set of node kinds, one per visitor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Target,
    Mixin,
    InterfaceIntroduction,
    SuppressedInterfaceIntroduction,
    MethodIntroduction,
    PropertyIntroduction,
    EventIntroduction,
    Method,
    Property,
    Event,
    FaceRequirement,
    BaseCallRequirement,
    MixinRequirement,
    RequiredMethod,
    ThisDependency,
    BaseDependency,
    MixinDependency,
    Attribute,
    AttributeIntroduction,
}

impl NodeKind {
    pub const ALL: [NodeKind; 19] = [
        NodeKind::Target,
        NodeKind::Mixin,
        NodeKind::InterfaceIntroduction,
        NodeKind::SuppressedInterfaceIntroduction,
        NodeKind::MethodIntroduction,
        NodeKind::PropertyIntroduction,
        NodeKind::EventIntroduction,
        NodeKind::Method,
        NodeKind::Property,
        NodeKind::Event,
        NodeKind::FaceRequirement,
        NodeKind::BaseCallRequirement,
        NodeKind::MixinRequirement,
        NodeKind::RequiredMethod,
        NodeKind::ThisDependency,
        NodeKind::BaseDependency,
        NodeKind::MixinDependency,
        NodeKind::Attribute,
        NodeKind::AttributeIntroduction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Target => "target",
            NodeKind::Mixin => "mixin",
            NodeKind::InterfaceIntroduction => "interface-introduction",
            NodeKind::SuppressedInterfaceIntroduction => "suppressed-interface-introduction",
            NodeKind::MethodIntroduction => "method-introduction",
            NodeKind::PropertyIntroduction => "property-introduction",
            NodeKind::EventIntroduction => "event-introduction",
            NodeKind::Method => "method",
            NodeKind::Property => "property",
            NodeKind::Event => "event",
            NodeKind::FaceRequirement => "face-requirement",
            NodeKind::BaseCallRequirement => "base-call-requirement",
            NodeKind::MixinRequirement => "mixin-requirement",
            NodeKind::RequiredMethod => "required-method",
            NodeKind::ThisDependency => "this-dependency",
            NodeKind::BaseDependency => "base-dependency",
            NodeKind::MixinDependency => "mixin-dependency",
            NodeKind::Attribute => "attribute",
            NodeKind::AttributeIntroduction => "attribute-introduction",
        }
    }

    fn member(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Method => NodeKind::Method,
            MemberKind::Property => NodeKind::Property,
            MemberKind::Event => NodeKind::Event,
        }
    }

    fn member_introduction(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Method => NodeKind::MethodIntroduction,
            MemberKind::Property => NodeKind::PropertyIntroduction,
            MemberKind::Event => NodeKind::EventIntroduction,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the three requirement collections a requirement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Face,
    BaseCall,
    Mixin,
}

/// Which of the three dependency collections a dependency belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    This,
    Base,
    Mixin,
}

impl DependencyKind {
    /// The requirement kind a dependency of this kind targets.
    pub fn requirement_kind(self) -> RequirementKind {
        match self {
            DependencyKind::This => RequirementKind::Face,
            DependencyKind::Base => RequirementKind::BaseCall,
            DependencyKind::Mixin => RequirementKind::Mixin,
        }
    }
}

// ---------------------------------------------------------------------------
// Child handles
// ---------------------------------------------------------------------------

/// Handle stored in keyed collections: the key, the node, and the unit the
/// node belongs to (declaring unit, depender or implementer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChildRef<K> {
    pub key: K,
    pub node: NodeId,
    pub unit: NodeId,
}

impl<K: Clone> ChildRef<K> {
    pub fn new(key: K, node: NodeId, unit: NodeId) -> Self {
        ChildRef { key, node, unit }
    }

    /// Key extraction strategy used by every graph collection.
    pub fn key_of(child: &ChildRef<K>) -> K {
        child.key.clone()
    }
}

/// Unique-per-key collection of child handles.
pub type Children<K> = UniqueCollection<K, ChildRef<K>>;

/// Multi-valued collection of child handles.
pub type MultiChildren<K> = MultiCollection<K, ChildRef<K>>;

pub(crate) fn children<K>() -> Children<K>
where
    K: Clone + std::hash::Hash + Eq + fmt::Debug,
{
    UniqueCollection::new(ChildRef::key_of)
}

pub(crate) fn multi_children<K>() -> MultiChildren<K>
where
    K: Clone + std::hash::Hash + Eq + fmt::Debug,
{
    MultiCollection::new(ChildRef::key_of)
}

/// Members a unit declares, split per kind and keyed by signature.
#[derive(Debug, Serialize)]
pub struct MemberSet {
    pub methods: Children<MethodSignature>,
    pub properties: Children<PropertySignature>,
    pub events: Children<EventSignature>,
}

impl MemberSet {
    pub(crate) fn new() -> Self {
        MemberSet {
            methods: children(),
            properties: children(),
            events: children(),
        }
    }

    /// Top-level member nodes in visiting order: methods, properties, events.
    pub fn all(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.methods
            .iter()
            .map(|c| c.node)
            .chain(self.properties.iter().map(|c| c.node))
            .chain(self.events.iter().map(|c| c.node))
    }
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// The root: the target class being composed.
#[derive(Debug, Serialize)]
pub struct CompositionUnit {
    pub type_id: TypeId,
    pub name: String,
    pub members: MemberSet,
    pub attributes: MultiChildren<TypeId>,
    pub mixins: Children<TypeId>,
    pub face_requirements: Children<TypeId>,
    pub base_call_requirements: Children<TypeId>,
    pub mixin_requirements: Children<TypeId>,
    /// Interface introductions received from mixins. Non-owning: the
    /// introductions are children of their implementing mixin.
    pub received_interfaces: Children<TypeId>,
    /// Attribute introductions landing on the unit itself. Non-owning.
    pub received_attributes: MultiChildren<TypeId>,
}

impl CompositionUnit {
    pub(crate) fn new(type_id: TypeId, name: String) -> Self {
        CompositionUnit {
            type_id,
            name,
            members: MemberSet::new(),
            attributes: multi_children(),
            mixins: children(),
            face_requirements: children(),
            base_call_requirements: children(),
            mixin_requirements: children(),
            received_interfaces: children(),
            received_attributes: multi_children(),
        }
    }

    pub fn requirements(&self, kind: RequirementKind) -> &Children<TypeId> {
        match kind {
            RequirementKind::Face => &self.face_requirements,
            RequirementKind::BaseCall => &self.base_call_requirements,
            RequirementKind::Mixin => &self.mixin_requirements,
        }
    }

    pub(crate) fn requirements_mut(&mut self, kind: RequirementKind) -> &mut Children<TypeId> {
        match kind {
            RequirementKind::Face => &mut self.face_requirements,
            RequirementKind::BaseCall => &mut self.base_call_requirements,
            RequirementKind::Mixin => &mut self.mixin_requirements,
        }
    }
}

/// One mixin applied to the composition unit.
#[derive(Debug, Serialize)]
pub struct MixinUnit {
    pub type_id: TypeId,
    pub name: String,
    /// Position of the mixin in the configuration.
    pub index: usize,
    pub members: MemberSet,
    pub attributes: MultiChildren<TypeId>,
    pub interface_introductions: Children<TypeId>,
    pub suppressed_interfaces: Children<TypeId>,
    pub attribute_introductions: MultiChildren<TypeId>,
    pub this_dependencies: Children<TypeId>,
    pub base_dependencies: Children<TypeId>,
    pub mixin_dependencies: Children<TypeId>,
}

impl MixinUnit {
    pub(crate) fn new(type_id: TypeId, name: String, index: usize) -> Self {
        MixinUnit {
            type_id,
            name,
            index,
            members: MemberSet::new(),
            attributes: multi_children(),
            interface_introductions: children(),
            suppressed_interfaces: children(),
            attribute_introductions: multi_children(),
            this_dependencies: children(),
            base_dependencies: children(),
            mixin_dependencies: children(),
        }
    }

    pub fn dependencies(&self, kind: DependencyKind) -> &Children<TypeId> {
        match kind {
            DependencyKind::This => &self.this_dependencies,
            DependencyKind::Base => &self.base_dependencies,
            DependencyKind::Mixin => &self.mixin_dependencies,
        }
    }

    pub(crate) fn dependencies_mut(&mut self, kind: DependencyKind) -> &mut Children<TypeId> {
        match kind {
            DependencyKind::This => &mut self.this_dependencies,
            DependencyKind::Base => &mut self.base_dependencies,
            DependencyKind::Mixin => &mut self.mixin_dependencies,
        }
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// A method, property or event declared by a unit.
///
/// Properties and events own up to two accessor methods:
/// `[get, set]` for properties, `[add, remove]` for events.
#[derive(Debug, Serialize)]
pub struct MemberNode {
    pub declaring_unit: NodeId,
    pub signature: MemberSignature,
    pub directive: Option<OverrideDirective>,
    pub accessors: [Option<NodeId>; 2],
    /// The member this one overrides.
    pub base: Option<NodeId>,
    /// Members overriding this one, keyed by their declaring unit.
    pub overrides: Children<NodeId>,
    pub attributes: MultiChildren<TypeId>,
    pub attribute_introductions: MultiChildren<TypeId>,
    /// Attribute introductions landing on this member. Non-owning.
    pub received_attributes: MultiChildren<TypeId>,
}

impl MemberNode {
    pub(crate) fn new(
        declaring_unit: NodeId,
        signature: MemberSignature,
        directive: Option<OverrideDirective>,
    ) -> Self {
        MemberNode {
            declaring_unit,
            signature,
            directive,
            accessors: [None, None],
            base: None,
            overrides: children(),
            attributes: multi_children(),
            attribute_introductions: multi_children(),
            received_attributes: multi_children(),
        }
    }

    pub fn kind(&self) -> MemberKind {
        self.signature.kind()
    }

    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn getter(&self) -> Option<NodeId> {
        match self.kind() {
            MemberKind::Property => self.accessors[0],
            _ => None,
        }
    }

    pub fn setter(&self) -> Option<NodeId> {
        match self.kind() {
            MemberKind::Property => self.accessors[1],
            _ => None,
        }
    }

    pub fn adder(&self) -> Option<NodeId> {
        match self.kind() {
            MemberKind::Event => self.accessors[0],
            _ => None,
        }
    }

    pub fn remover(&self) -> Option<NodeId> {
        match self.kind() {
            MemberKind::Event => self.accessors[1],
            _ => None,
        }
    }

    /// The override registered by `unit`, if any.
    pub fn override_by(&self, unit: NodeId) -> Option<NodeId> {
        self.overrides.get(&unit).map(|c| c.node)
    }
}

// ---------------------------------------------------------------------------
// Requirements and dependencies
// ---------------------------------------------------------------------------

/// A type some mixin requires, attached to the composition unit.
#[derive(Debug, Serialize)]
pub struct RequirementNode {
    pub kind: RequirementKind,
    pub type_id: TypeId,
    pub name: String,
    /// The required type is an interface without members.
    pub is_empty: bool,
    /// Empty, but composed of other interfaces.
    pub is_aggregator: bool,
    /// Every dependency targeting this requirement, keyed by dependency node.
    pub requiring_dependencies: Children<NodeId>,
    pub methods: Children<MethodSignature>,
}

impl RequirementNode {
    pub(crate) fn new(
        kind: RequirementKind,
        type_id: TypeId,
        name: String,
        is_empty: bool,
        is_aggregator: bool,
    ) -> Self {
        RequirementNode {
            kind,
            type_id,
            name,
            is_empty,
            is_aggregator,
            requiring_dependencies: children(),
            methods: children(),
        }
    }
}

/// A method the implementer of a requirement must provide.
#[derive(Debug, Serialize)]
pub struct RequiredMethodNode {
    pub requirement: NodeId,
    pub signature: MethodSignature,
    /// The member found to implement it, if any.
    pub implementer: Option<NodeId>,
}

/// A mixin's claim on a requirement.
#[derive(Debug, Serialize)]
pub struct DependencyNode {
    pub kind: DependencyKind,
    pub required_type: TypeId,
    pub requirement: NodeId,
    pub depender: NodeId,
    pub aggregator: Option<NodeId>,
    /// Nested dependencies; every entry shares this dependency's depender.
    pub aggregated: Children<TypeId>,
}

impl DependencyNode {
    pub(crate) fn new(
        kind: DependencyKind,
        required_type: TypeId,
        requirement: NodeId,
        depender: NodeId,
        aggregator: Option<NodeId>,
    ) -> Self {
        DependencyNode {
            kind,
            required_type,
            requirement,
            depender,
            aggregator,
            aggregated: children::<TypeId>().with_guardian(move |child| child.unit == depender),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        !self.aggregated.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Introductions
// ---------------------------------------------------------------------------

/// An interface a mixin introduces onto the composition unit.
#[derive(Debug, Serialize)]
pub struct InterfaceIntroductionNode {
    pub interface: TypeId,
    pub name: String,
    pub implementer: NodeId,
    pub methods: Children<MethodSignature>,
    pub properties: Children<PropertySignature>,
    pub events: Children<EventSignature>,
}

impl InterfaceIntroductionNode {
    pub(crate) fn new(interface: TypeId, name: String, implementer: NodeId) -> Self {
        InterfaceIntroductionNode {
            interface,
            name,
            implementer,
            methods: children(),
            properties: children(),
            events: children(),
        }
    }
}

/// An interface member introduced together with its interface.
#[derive(Debug, Serialize)]
pub struct MemberIntroductionNode {
    pub introduction: NodeId,
    pub interface_member: MemberSignature,
    pub implementing_member: NodeId,
}

impl MemberIntroductionNode {
    pub fn kind(&self) -> MemberKind {
        self.interface_member.kind()
    }
}

/// Why an implemented interface was not introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "by")]
pub enum SuppressionReason {
    /// The mixin declares the interface as not introduced.
    Explicit,
    /// The target class already implements the interface.
    ImplementedByTarget,
    /// A mixin earlier in the configuration already introduces it.
    IntroducedBy(NodeId),
}

/// An implemented interface that does not reach the composition unit.
#[derive(Debug, Serialize)]
pub struct SuppressedInterfaceNode {
    pub interface: TypeId,
    pub name: String,
    pub implementer: NodeId,
    pub reason: SuppressionReason,
}

impl SuppressedInterfaceNode {
    /// True for explicit suppression, false when shadowed by the target or
    /// by composition order.
    pub fn is_explicit(&self) -> bool {
        self.reason == SuppressionReason::Explicit
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// A custom attribute declared on a unit or member.
#[derive(Debug, Serialize)]
pub struct AttributeNode {
    pub attribute_type: TypeId,
    pub name: String,
    pub declaring: NodeId,
    pub arguments: Vec<String>,
    pub copy_template: bool,
}

/// An attribute carried from a mixin (or mixin member) onto its receiver.
#[derive(Debug, Serialize)]
pub struct AttributeIntroductionNode {
    pub attribute: NodeId,
    pub attribute_type: TypeId,
    pub receiver: NodeId,
}

// ---------------------------------------------------------------------------
// Node sum type
// ---------------------------------------------------------------------------

/// Payload of one arena slot.
#[derive(Debug, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum DefinitionNode {
    Target(CompositionUnit),
    Mixin(MixinUnit),
    Member(MemberNode),
    Requirement(RequirementNode),
    RequiredMethod(RequiredMethodNode),
    Dependency(DependencyNode),
    InterfaceIntroduction(InterfaceIntroductionNode),
    MemberIntroduction(MemberIntroductionNode),
    SuppressedInterface(SuppressedInterfaceNode),
    Attribute(AttributeNode),
    AttributeIntroduction(AttributeIntroductionNode),
}

impl DefinitionNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            DefinitionNode::Target(_) => NodeKind::Target,
            DefinitionNode::Mixin(_) => NodeKind::Mixin,
            DefinitionNode::Member(m) => NodeKind::member(m.kind()),
            DefinitionNode::Requirement(r) => match r.kind {
                RequirementKind::Face => NodeKind::FaceRequirement,
                RequirementKind::BaseCall => NodeKind::BaseCallRequirement,
                RequirementKind::Mixin => NodeKind::MixinRequirement,
            },
            DefinitionNode::RequiredMethod(_) => NodeKind::RequiredMethod,
            DefinitionNode::Dependency(d) => match d.kind {
                DependencyKind::This => NodeKind::ThisDependency,
                DependencyKind::Base => NodeKind::BaseDependency,
                DependencyKind::Mixin => NodeKind::MixinDependency,
            },
            DefinitionNode::InterfaceIntroduction(_) => NodeKind::InterfaceIntroduction,
            DefinitionNode::MemberIntroduction(m) => NodeKind::member_introduction(m.kind()),
            DefinitionNode::SuppressedInterface(_) => NodeKind::SuppressedInterfaceIntroduction,
            DefinitionNode::Attribute(_) => NodeKind::Attribute,
            DefinitionNode::AttributeIntroduction(_) => NodeKind::AttributeIntroduction,
        }
    }
}
