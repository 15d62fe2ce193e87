//! Shared test fixtures: a small order-processing universe and a
//! hand-assembled composition over it.

use std::sync::Arc;

use crate::graph::CompositionGraph;
use crate::id::NodeId;
use crate::node::{DependencyKind, RequirementKind};
use crate::signature::{MemberSignature, MethodSignature, PropertySignature};
use crate::types::{MixinDecl, OverrideDirective, TypeDecl, TypeUniverse};

pub fn shop_universe() -> TypeUniverse {
    TypeUniverse::from_decls([
        TypeDecl::interface("IOrderSink").with_method(MethodSignature::action("Accept")),
        TypeDecl::interface("ILogger").with_method(MethodSignature::new("Log", ["string"], "void")),
        TypeDecl::interface("IHasTotal").with_property(PropertySignature::read_only("Total", "decimal")),
        TypeDecl::interface("IMarker"),
        TypeDecl::interface("IAuditable")
            .implementing("ILogger")
            .implementing("IHasTotal"),
        TypeDecl::class("Auditor").with_method(MethodSignature::action("Check")),
        TypeDecl::class("OrderProcessor")
            .implementing("IOrderSink")
            .implementing("IHasTotal")
            .with_method(MethodSignature::action("Save"))
            .with_method(MethodSignature::action("Accept"))
            .with_property(PropertySignature::read_only("Total", "decimal")),
        TypeDecl::class("LoggingMixin")
            .implementing("ILogger")
            .with_method(MethodSignature::new("Log", ["string"], "void"))
            .as_mixin(MixinDecl {
                face: Some("IOrderSink".to_string()),
                ..MixinDecl::default()
            }),
        TypeDecl::class("AuditMixin")
            .with_member(
                crate::types::MemberDecl::method(MethodSignature::action("Save"))
                    .overriding(OverrideDirective::Target),
            )
            .as_mixin(MixinDecl {
                face: Some("ILogger".to_string()),
                base_call: Some("IOrderSink".to_string()),
                ..MixinDecl::default()
            }),
    ])
    .expect("fixture universe is well formed")
}

/// Unit of the mixin at `index` in configuration order.
pub fn mixin_at(graph: &CompositionGraph, index: usize) -> NodeId {
    use crate::collection::KeyedCollection;
    graph.target().mixins.get_at(index).expect("fixture mixin").node
}

/// Adds a dependency of `kind` from `depender` on the named type, creating
/// the requirement on demand.
pub fn depend(
    graph: &mut CompositionGraph,
    kind: DependencyKind,
    depender: NodeId,
    type_name: &str,
    aggregator: Option<NodeId>,
) -> NodeId {
    let required = graph.universe().lookup(type_name).expect("fixture type");
    let requirement_kind = kind.requirement_kind();
    let requirement = match graph.requirement_for(requirement_kind, required) {
        Some(existing) => existing,
        None => graph.add_requirement(requirement_kind, required).unwrap(),
    };
    graph
        .add_dependency(kind, depender, requirement, aggregator)
        .unwrap()
}

/// `OrderProcessor` with `LoggingMixin` (introducing `ILogger`) and
/// `AuditMixin` (face `ILogger`, base call `IOrderSink`).
pub fn shop_graph() -> CompositionGraph {
    let universe = Arc::new(shop_universe());
    let target = universe.lookup("OrderProcessor").unwrap();
    let logging_type = universe.lookup("LoggingMixin").unwrap();
    let audit_type = universe.lookup("AuditMixin").unwrap();
    let logger = universe.lookup("ILogger").unwrap();

    let mut graph = CompositionGraph::new(Arc::clone(&universe), target).unwrap();
    graph
        .add_member(NodeId::ROOT, MemberSignature::Method(MethodSignature::action("Save")), None)
        .unwrap();
    graph
        .add_member(NodeId::ROOT, MemberSignature::Method(MethodSignature::action("Accept")), None)
        .unwrap();
    graph
        .add_member(
            NodeId::ROOT,
            MemberSignature::Property(PropertySignature::read_only("Total", "decimal")),
            None,
        )
        .unwrap();

    let logging = graph.add_mixin(logging_type).unwrap();
    let log = MemberSignature::Method(MethodSignature::new("Log", ["string"], "void"));
    let log_member = graph.add_member(logging, log.clone(), None).unwrap();
    let introduction = graph.add_interface_introduction(logging, logger).unwrap();
    graph
        .add_member_introduction(introduction, log, log_member)
        .unwrap();

    let audit = graph.add_mixin(audit_type).unwrap();
    graph
        .add_member(
            audit,
            MemberSignature::Method(MethodSignature::action("Save")),
            Some(OverrideDirective::Target),
        )
        .unwrap();

    depend(&mut graph, DependencyKind::This, logging, "IOrderSink", None);
    depend(&mut graph, DependencyKind::This, audit, "ILogger", None);
    depend(&mut graph, DependencyKind::Base, audit, "IOrderSink", None);
    debug_assert!(graph.requirement_for(RequirementKind::Face, logger).is_some());
    graph
}
