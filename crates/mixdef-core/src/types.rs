//! The type universe: classes, interfaces, mixins and attribute types the
//! composition model is built from.
//!
//! [`TypeDecl`] is the declarative input form (references other types by
//! name, deserializable from JSON). [`TypeUniverse::register`] resolves those
//! names into [`TypeId`]s and records inheritance in a `petgraph` graph
//! (derived → base class, implementer → interface), which answers
//! assignability queries.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use indexmap::IndexSet;
use petgraph::algo::has_path_connecting;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::TypeId;
use crate::signature::{EventSignature, MemberSignature, MethodSignature, PropertySignature};

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Whether a type is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Class => f.write_str("class"),
            TypeKind::Interface => f.write_str("interface"),
        }
    }
}

/// Marks a member as overriding a member of another unit in the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideDirective {
    /// A mixin member that overrides the target class member of the same name.
    Target,
    /// A target class member that overrides the mixin member of the same name.
    Mixin,
}

/// A custom attribute attached to a type or member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// Name of the attribute type.
    #[serde(rename = "type")]
    pub attribute_type: String,
    /// Constructor arguments, kept verbatim.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Template attribute that is copied onto the target rather than
    /// applying to the declaring unit itself.
    #[serde(default)]
    pub copy_template: bool,
}

impl AttributeDecl {
    pub fn new(attribute_type: &str) -> Self {
        AttributeDecl {
            attribute_type: attribute_type.to_string(),
            arguments: Vec::new(),
            copy_template: false,
        }
    }

    pub fn with_argument(mut self, argument: &str) -> Self {
        self.arguments.push(argument.to_string());
        self
    }

    pub fn copied(mut self) -> Self {
        self.copy_template = true;
        self
    }
}

/// Usage constraints declared by an attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeUsage {
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default = "inherited_default")]
    pub inherited: bool,
}

fn inherited_default() -> bool {
    true
}

impl Default for AttributeUsage {
    fn default() -> Self {
        AttributeUsage {
            allow_multiple: false,
            inherited: true,
        }
    }
}

/// A declared member: its signature, override directive and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    #[serde(flatten)]
    pub signature: MemberSignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OverrideDirective>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDecl>,
}

impl MemberDecl {
    pub fn method(signature: MethodSignature) -> Self {
        Self::from_signature(MemberSignature::Method(signature))
    }

    pub fn property(signature: PropertySignature) -> Self {
        Self::from_signature(MemberSignature::Property(signature))
    }

    pub fn event(signature: EventSignature) -> Self {
        Self::from_signature(MemberSignature::Event(signature))
    }

    fn from_signature(signature: MemberSignature) -> Self {
        MemberDecl {
            signature,
            overrides: None,
            attributes: Vec::new(),
        }
    }

    pub fn overriding(mut self, directive: OverrideDirective) -> Self {
        self.overrides = Some(directive);
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Mixin-specific declaration: the face and base-call types the mixin
/// requires, and interfaces it implements without introducing them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinDecl {
    /// Type the mixin expects its target to expose (its "this" view).
    #[serde(default)]
    pub face: Option<String>,
    /// Type the mixin calls into for base implementations.
    #[serde(default)]
    pub base_call: Option<String>,
    /// Implemented interfaces that must not be introduced onto the target.
    #[serde(default)]
    pub non_introduced: Vec<String>,
}

/// Declarative form of a type, referencing other types by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    #[serde(default)]
    pub mixin: Option<MixinDecl>,
    #[serde(default)]
    pub attribute_usage: Option<AttributeUsage>,
}

impl TypeDecl {
    fn new(name: &str, kind: TypeKind) -> Self {
        TypeDecl {
            name: name.to_string(),
            kind,
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            attributes: Vec::new(),
            mixin: None,
            attribute_usage: None,
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// An attribute class with the given usage.
    pub fn attribute(name: &str, usage: AttributeUsage) -> Self {
        TypeDecl {
            attribute_usage: Some(usage),
            ..Self::class(name)
        }
    }

    pub fn extending(mut self, base: &str) -> Self {
        self.base = Some(base.to_string());
        self
    }

    pub fn implementing(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_method(self, signature: MethodSignature) -> Self {
        self.with_member(MemberDecl::method(signature))
    }

    pub fn with_property(self, signature: PropertySignature) -> Self {
        self.with_member(MemberDecl::property(signature))
    }

    pub fn with_event(self, signature: EventSignature) -> Self {
        self.with_member(MemberDecl::event(signature))
    }

    pub fn with_attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn as_mixin(mut self, mixin: MixinDecl) -> Self {
        self.mixin = Some(mixin);
        self
    }
}

// ---------------------------------------------------------------------------
// Resolved types
// ---------------------------------------------------------------------------

/// Mixin declaration with resolved type references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixinInfo {
    pub face: Option<TypeId>,
    pub base_call: Option<TypeId>,
    pub non_introduced: Vec<TypeId>,
}

/// A registered type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub base: Option<TypeId>,
    /// Directly implemented (classes) or extended (interfaces) interfaces,
    /// in declaration order.
    pub interfaces: Vec<TypeId>,
    pub members: Vec<MemberDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub mixin: Option<MixinInfo>,
    pub attribute_usage: Option<AttributeUsage>,
}

impl TypeInfo {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }
}

/// Edge weight of the inheritance graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inheritance {
    /// Class to base class.
    Extends,
    /// Class or interface to an implemented/extended interface.
    Implements,
}

/// Registry of all types a configuration may reference.
///
/// Types must be registered after every type they reference.
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    hierarchy: DiGraph<TypeInfo, Inheritance>,
    names: HashMap<String, TypeId>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every declaration in order, stopping at the first error.
    pub fn from_decls<I>(decls: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = TypeDecl>,
    {
        let mut universe = TypeUniverse::new();
        for decl in decls {
            universe.register(decl)?;
        }
        Ok(universe)
    }

    /// Registers a type, resolving its references, and returns its [`TypeId`].
    ///
    /// Returns [`CoreError::DuplicateTypeName`] for a name already in use,
    /// [`CoreError::UnknownType`] for unresolved references and
    /// [`CoreError::WrongTypeKind`] when a base is not a class (or is given
    /// to an interface) or an implemented type is not an interface.
    pub fn register(&mut self, decl: TypeDecl) -> Result<TypeId, CoreError> {
        if self.names.contains_key(&decl.name) {
            return Err(CoreError::DuplicateTypeName { name: decl.name });
        }

        let base = match &decl.base {
            Some(name) => {
                if decl.kind == TypeKind::Interface {
                    return Err(CoreError::WrongTypeKind {
                        name: decl.name.clone(),
                        expected: "a class (only classes have base classes)",
                    });
                }
                Some(self.resolve_kind(name, TypeKind::Class)?)
            }
            None => None,
        };

        let interfaces = decl
            .interfaces
            .iter()
            .map(|name| self.resolve_kind(name, TypeKind::Interface))
            .collect::<Result<Vec<_>, _>>()?;
        for (i, interface) in interfaces.iter().enumerate() {
            if interfaces[..i].contains(interface) {
                return Err(CoreError::InvalidArgument {
                    reason: format!(
                        "'{}' lists interface '{}' more than once",
                        decl.name,
                        self.name_of(*interface)
                    ),
                });
            }
        }

        let attribute_refs = decl
            .attributes
            .iter()
            .chain(decl.members.iter().flat_map(|m| m.attributes.iter()));
        for attribute in attribute_refs {
            self.resolve_kind(&attribute.attribute_type, TypeKind::Class)?;
        }

        let mixin = match &decl.mixin {
            Some(m) => Some(MixinInfo {
                face: m.face.as_deref().map(|n| self.resolve(n)).transpose()?,
                base_call: m.base_call.as_deref().map(|n| self.resolve(n)).transpose()?,
                non_introduced: m
                    .non_introduced
                    .iter()
                    .map(|n| self.resolve_kind(n, TypeKind::Interface))
                    .collect::<Result<Vec<_>, _>>()?,
            }),
            None => None,
        };

        let id = TypeId(self.hierarchy.node_count() as u32);
        let info = TypeInfo {
            id,
            name: decl.name.clone(),
            kind: decl.kind,
            base,
            interfaces: interfaces.clone(),
            members: decl.members,
            attributes: decl.attributes,
            mixin,
            attribute_usage: decl.attribute_usage,
        };

        let idx = self.hierarchy.add_node(info);
        debug_assert_eq!(TypeId::from(idx), id);

        if let Some(base) = base {
            self.hierarchy.add_edge(idx, base.into(), Inheritance::Extends);
        }
        for interface in interfaces {
            self.hierarchy
                .add_edge(idx, interface.into(), Inheritance::Implements);
        }

        self.names.insert(decl.name, id);
        Ok(id)
    }

    /// Looks up a type by name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Looks up a type by name, failing with [`CoreError::UnknownType`].
    pub fn resolve(&self, name: &str) -> Result<TypeId, CoreError> {
        self.lookup(name).ok_or_else(|| CoreError::UnknownType {
            name: name.to_string(),
        })
    }

    fn resolve_kind(&self, name: &str, kind: TypeKind) -> Result<TypeId, CoreError> {
        let id = self.resolve(name)?;
        match self.get(id) {
            Some(info) if info.kind == kind => Ok(id),
            _ => Err(CoreError::WrongTypeKind {
                name: name.to_string(),
                expected: match kind {
                    TypeKind::Class => "a class",
                    TypeKind::Interface => "an interface",
                },
            }),
        }
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.hierarchy.node_weight(id.into())
    }

    /// Like [`get`](Self::get), failing with [`CoreError::TypeNotFound`].
    pub fn info(&self, id: TypeId) -> Result<&TypeInfo, CoreError> {
        self.get(id).ok_or(CoreError::TypeNotFound { id })
    }

    /// Returns the name of a type, or `"?"` for foreign ids.
    pub fn name_of(&self, id: TypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.hierarchy.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.hierarchy.node_count() == 0
    }

    /// Iterates over all registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.hierarchy.node_weights()
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        self.get(id).is_some_and(TypeInfo::is_interface)
    }

    /// True when a value of type `from` can be used where `to` is expected:
    /// the types are equal or `to` is reachable through base classes and
    /// implemented interfaces.
    pub fn is_assignable_from(&self, to: TypeId, from: TypeId) -> bool {
        if to == from {
            return true;
        }
        if self.get(to).is_none() || self.get(from).is_none() {
            return false;
        }
        has_path_connecting(&self.hierarchy, from.into(), to.into(), None)
    }

    /// Base classes of `id`, nearest first.
    pub fn base_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|t| t.base);
        while let Some(base) = current {
            if chain.contains(&base) {
                break;
            }
            chain.push(base);
            current = self.get(base).and_then(|t| t.base);
        }
        chain
    }

    /// All interfaces implemented or extended by `id`, transitively, in
    /// breadth-first declaration order without duplicates. Does not include
    /// `id` itself.
    pub fn all_interfaces(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = IndexSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let Some(info) = self.get(current) else {
                continue;
            };
            for next in info.base.iter().chain(info.interfaces.iter()).copied() {
                if next != id && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen.into_iter().filter(|t| self.is_interface(*t)).collect()
    }

    /// An interface that declares no members of its own.
    pub fn is_empty_interface(&self, id: TypeId) -> bool {
        self.get(id)
            .is_some_and(|t| t.is_interface() && t.members.is_empty())
    }

    /// An empty interface composed of other interfaces.
    pub fn is_aggregator_interface(&self, id: TypeId) -> bool {
        self.get(id)
            .is_some_and(|t| t.is_interface() && t.members.is_empty() && !t.interfaces.is_empty())
    }

    /// Members of an interface followed by those of every interface it
    /// extends, each paired with its declaring interface. Signatures already
    /// seen are skipped.
    pub fn interface_members(&self, id: TypeId) -> Vec<(TypeId, &MemberDecl)> {
        let mut seen = IndexSet::new();
        let mut members = Vec::new();
        let declaring = std::iter::once(id).chain(self.all_interfaces(id));
        for interface in declaring {
            let Some(info) = self.get(interface) else {
                continue;
            };
            for member in &info.members {
                if seen.insert(&member.signature) {
                    members.push((interface, member));
                }
            }
        }
        members
    }

    /// Attribute usage of an attribute type, defaulting to single-use and inherited.
    pub fn attribute_usage(&self, id: TypeId) -> AttributeUsage {
        self.get(id)
            .and_then(|t| t.attribute_usage)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> TypeUniverse {
        TypeUniverse::from_decls([
            TypeDecl::interface("IOrderSink").with_method(MethodSignature::action("Accept")),
            TypeDecl::interface("IMarker"),
            TypeDecl::interface("IAudited").with_method(MethodSignature::action("Audit")),
            TypeDecl::interface("IAuditedSink")
                .implementing("IOrderSink")
                .implementing("IAudited"),
            TypeDecl::class("ProcessorBase").implementing("IMarker"),
            TypeDecl::class("OrderProcessor")
                .extending("ProcessorBase")
                .implementing("IOrderSink"),
        ])
        .unwrap()
    }

    #[test]
    fn register_assigns_sequential_ids() {
        let universe = shop();
        assert_eq!(universe.len(), 6);
        assert_eq!(universe.lookup("IOrderSink"), Some(TypeId(0)));
        assert_eq!(universe.lookup("OrderProcessor"), Some(TypeId(5)));
        assert_eq!(universe.name_of(TypeId(1)), "IMarker");
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut universe = shop();
        let err = universe.register(TypeDecl::class("OrderProcessor")).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTypeName { name } if name == "OrderProcessor"));
    }

    #[test]
    fn unknown_reference_rejected() {
        let mut universe = TypeUniverse::new();
        let err = universe
            .register(TypeDecl::class("Orphan").implementing("IMissing"))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownType { name } if name == "IMissing"));
        assert!(universe.is_empty());
    }

    #[test]
    fn repeated_interface_rejected() {
        let mut universe = shop();
        let err = universe
            .register(
                TypeDecl::interface("IDoubleSink")
                    .implementing("IOrderSink")
                    .implementing("IOrderSink"),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: 'IDoubleSink' lists interface 'IOrderSink' more than once");
        assert!(universe.lookup("IDoubleSink").is_none());
    }

    #[test]
    fn implementing_a_class_rejected() {
        let mut universe = shop();
        let err = universe
            .register(TypeDecl::class("Broken").implementing("OrderProcessor"))
            .unwrap_err();
        assert!(matches!(err, CoreError::WrongTypeKind { .. }));
    }

    #[test]
    fn assignability_follows_inheritance() {
        let universe = shop();
        let processor = universe.lookup("OrderProcessor").unwrap();
        let sink = universe.lookup("IOrderSink").unwrap();
        let marker = universe.lookup("IMarker").unwrap();
        let audited = universe.lookup("IAudited").unwrap();

        assert!(universe.is_assignable_from(sink, processor));
        assert!(universe.is_assignable_from(marker, processor));
        assert!(universe.is_assignable_from(processor, processor));
        assert!(!universe.is_assignable_from(audited, processor));
        assert!(!universe.is_assignable_from(processor, sink));
    }

    #[test]
    fn all_interfaces_is_transitive_and_ordered() {
        let universe = shop();
        let processor = universe.lookup("OrderProcessor").unwrap();
        let names: Vec<_> = universe
            .all_interfaces(processor)
            .into_iter()
            .map(|t| universe.name_of(t).to_string())
            .collect();
        assert_eq!(names, vec!["IOrderSink", "IMarker"]);
    }

    #[test]
    fn empty_and_aggregator_interfaces() {
        let universe = shop();
        let marker = universe.lookup("IMarker").unwrap();
        let composite = universe.lookup("IAuditedSink").unwrap();
        let sink = universe.lookup("IOrderSink").unwrap();

        assert!(universe.is_empty_interface(marker));
        assert!(!universe.is_aggregator_interface(marker));
        assert!(universe.is_empty_interface(composite));
        assert!(universe.is_aggregator_interface(composite));
        assert!(!universe.is_empty_interface(sink));
    }

    #[test]
    fn interface_members_include_extended_interfaces() {
        let universe = shop();
        let composite = universe.lookup("IAuditedSink").unwrap();
        let names: Vec<_> = universe
            .interface_members(composite)
            .into_iter()
            .map(|(declaring, m)| format!("{}.{}", universe.name_of(declaring), m.signature.name()))
            .collect();
        assert_eq!(names, vec!["IOrderSink.Accept", "IAudited.Audit"]);
    }

    #[test]
    fn base_chain_nearest_first() {
        let mut universe = shop();
        universe
            .register(TypeDecl::class("SpecialProcessor").extending("OrderProcessor"))
            .unwrap();
        let special = universe.lookup("SpecialProcessor").unwrap();
        let chain: Vec<_> = universe
            .base_chain(special)
            .into_iter()
            .map(|t| universe.name_of(t).to_string())
            .collect();
        assert_eq!(chain, vec!["OrderProcessor", "ProcessorBase"]);
    }

    #[test]
    fn type_decl_from_json() {
        let decl: TypeDecl = serde_json::from_str(
            r#"{
                "name": "AuditMixin",
                "kind": "class",
                "interfaces": [],
                "members": [
                    {"kind": "method", "name": "Save", "overrides": "target"},
                    {"kind": "property", "name": "Total", "type": "decimal"}
                ],
                "mixin": {"face": "IOrderSink"}
            }"#,
        )
        .unwrap();
        assert_eq!(decl.members.len(), 2);
        assert_eq!(decl.members[0].overrides, Some(OverrideDirective::Target));
        assert_eq!(decl.mixin.unwrap().face.as_deref(), Some("IOrderSink"));
    }
}
